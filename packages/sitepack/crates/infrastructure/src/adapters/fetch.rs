use async_trait::async_trait;
use domain::ports::{ArtifactFetcher, FetchError};
use futures_util::StreamExt;
use reqwest::Client;
use sitepack_lock::ArtifactLocation;
use std::path::Path;
use tokio::io::AsyncWriteExt;
use tracing::debug;
use url::Url;

/// Fetches artifacts over HTTP(S), or copies them from the local filesystem.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self, FetchError> {
        let client = Client::builder()
            .user_agent(concat!("sitepack/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| FetchError::Http {
                url: String::new(),
                message: e.to_string(),
            })?;
        Ok(Self { client })
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    async fn download(&self, url: &Url, dest: &Path) -> Result<u64, FetchError> {
        let http_err = |e: reqwest::Error| FetchError::Http {
            url: url.to_string(),
            message: e.to_string(),
        };

        let resp = self.client.get(url.clone()).send().await.map_err(http_err)?;
        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let mut file = tokio::fs::File::create(dest).await?;
        let mut stream = resp.bytes_stream();
        let mut written = 0u64;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(http_err)?;
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }

        file.flush().await?;
        Ok(written)
    }
}

#[async_trait]
impl ArtifactFetcher for HttpFetcher {
    async fn fetch(&self, location: &ArtifactLocation, dest: &Path) -> Result<u64, FetchError> {
        match location {
            ArtifactLocation::Remote(url) => {
                debug!("Downloading {} to {:?}", url, dest);
                self.download(url, dest).await
            }
            ArtifactLocation::Local(path) => {
                debug!("Copying {:?} to {:?}", path, dest);
                Ok(tokio::fs::copy(path, dest).await?)
            }
        }
    }
}
