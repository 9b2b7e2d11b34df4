use async_trait::async_trait;
use sitepack_lock::ArtifactLocation;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("request to {url} failed: {message}")]
    Http { url: String, message: String },

    #[error("{url} returned status {status}")]
    Status { url: String, status: u16 },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Copies an artifact's bytes to `dest`, creating or truncating it.
#[async_trait]
pub trait ArtifactFetcher: Send + Sync {
    /// Returns the number of bytes written.
    async fn fetch(&self, location: &ArtifactLocation, dest: &Path) -> Result<u64, FetchError>;
}
