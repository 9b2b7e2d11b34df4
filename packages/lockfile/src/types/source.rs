use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use toml::value::Datetime;
use url::Url;

/// Hash algorithm used as the cache key for every artifact.
pub const SHA256: &str = "sha256";

/// Where a package comes from. Exactly one variant per package.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub enum PackageSource {
    Vcs(Vcs),
    Directory(Directory),
    Archive(Archive),
    Sdist(Artifact),
    Wheels(Vec<Artifact>),
}

impl PackageSource {
    pub fn kind(&self) -> &'static str {
        match self {
            PackageSource::Vcs(_) => "vcs",
            PackageSource::Directory(_) => "directory",
            PackageSource::Archive(_) => "archive",
            PackageSource::Sdist(_) => "sdist",
            PackageSource::Wheels(_) => "wheels",
        }
    }

    /// Candidate wheels, empty for every other source kind.
    pub fn wheels(&self) -> &[Artifact] {
        match self {
            PackageSource::Wheels(wheels) => wheels,
            _ => &[],
        }
    }

    pub(crate) fn derive_names(&mut self) {
        match self {
            PackageSource::Sdist(sdist) => sdist.derive_name(),
            PackageSource::Wheels(wheels) => wheels.iter_mut().for_each(Artifact::derive_name),
            _ => {}
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Vcs {
    pub kind: String,
    pub url: Option<String>,
    pub path: Option<String>,
    pub requested_revision: Option<String>,
    pub commit_id: String,
    pub subdirectory: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Directory {
    pub path: String,
    pub editable: bool,
    pub subdirectory: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Archive {
    pub url: Option<String>,
    pub path: Option<String>,
    pub size: Option<u64>,
    pub upload_time: Option<Datetime>,
    pub hashes: BTreeMap<String, String>,
    pub subdirectory: Option<String>,
}

/// A single distribution file (wheel or sdist).
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Artifact {
    /// File name, e.g. `numpy-2.1.0-cp311-cp311-manylinux_2_17_x86_64.whl`.
    pub name: String,
    pub url: Option<String>,
    pub path: Option<String>,
    pub size: Option<u64>,
    pub upload_time: Option<Datetime>,
    pub hashes: BTreeMap<String, String>,
}

/// Resolved location of an artifact's bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtifactLocation {
    Remote(Url),
    Local(PathBuf),
}

#[derive(Error, Debug)]
pub enum LocationError {
    #[error("artifact '{0}' has neither a url nor a path")]
    Missing(String),

    #[error("artifact '{name}' has an invalid url '{url}': {source}")]
    InvalidUrl {
        name: String,
        url: String,
        #[source]
        source: url::ParseError,
    },
}

impl Artifact {
    /// The declared sha256 digest, if any.
    pub fn sha256(&self) -> Option<&str> {
        self.hashes.get(SHA256).map(String::as_str)
    }

    /// File name with the `.whl` suffix removed.
    pub fn base_name(&self) -> &str {
        self.name.strip_suffix(".whl").unwrap_or(&self.name)
    }

    /// Where to fetch the artifact from. Relative paths are resolved against
    /// `base_dir`, the directory containing the lockfile.
    pub fn location(&self, base_dir: Option<&Path>) -> Result<ArtifactLocation, LocationError> {
        if let Some(raw) = &self.url {
            let url = Url::parse(raw).map_err(|source| LocationError::InvalidUrl {
                name: self.name.clone(),
                url: raw.clone(),
                source,
            })?;
            if url.scheme() == "file" {
                if let Ok(path) = url.to_file_path() {
                    return Ok(ArtifactLocation::Local(path));
                }
            }
            return Ok(ArtifactLocation::Remote(url));
        }

        match &self.path {
            Some(path) => {
                let path = PathBuf::from(path);
                let resolved = match base_dir {
                    Some(base) if path.is_relative() => base.join(path),
                    _ => path,
                };
                Ok(ArtifactLocation::Local(resolved))
            }
            None => Err(LocationError::Missing(self.name.clone())),
        }
    }

    fn derive_name(&mut self) {
        if !self.name.is_empty() {
            return;
        }
        let derived = self
            .url
            .as_deref()
            .filter(|u| !u.is_empty())
            .map(last_segment)
            .or_else(|| self.path.as_deref().filter(|p| !p.is_empty()).map(last_segment));
        if let Some(name) = derived {
            self.name = name.to_string();
        }
    }
}

fn last_segment(raw: &str) -> &str {
    let trimmed = raw.trim_end_matches('/');
    trimmed.rsplit('/').next().unwrap_or(trimmed)
}
