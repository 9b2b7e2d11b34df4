use domain::markers::MarkerError;
use domain::ports::{FetchError, InstallError};
use domain::security::IntegrityError;
use domain::selection::SelectionError;
use domain::system::PlatformError;
use infrastructure::system::MountError;
use sitepack_lock::{DocumentError, LocationError};
use std::path::PathBuf;
use thiserror::Error;

/// Anything that stops a lockfile from becoming a mounted site-packages tree.
#[derive(Error, Debug)]
pub enum ResolveError {
    #[error(transparent)]
    Document(#[from] DocumentError),

    #[error(transparent)]
    Platform(#[from] PlatformError),

    #[error("invalid marker on package {package:?}: {source}")]
    Marker {
        package: String,
        #[source]
        source: MarkerError,
    },

    #[error(transparent)]
    Selection(#[from] SelectionError),

    #[error("wheel {wheel:?} of package {package:?} has no sha256 hash")]
    MissingSha256 { package: String, wheel: String },

    #[error("wheel {wheel:?} of package {package:?} has a malformed sha256 {value:?}")]
    InvalidSha256 {
        package: String,
        wheel: String,
        value: String,
    },

    #[error("wheel name {wheel:?} of package {package:?} is not a plain file name")]
    InvalidWheelName { package: String, wheel: String },

    #[error(transparent)]
    Location(#[from] LocationError),

    #[error("failed to fetch {wheel:?}: {source}")]
    Fetch {
        wheel: String,
        #[source]
        source: FetchError,
    },

    #[error("integrity check failed for {wheel:?}: {source}")]
    Integrity {
        wheel: String,
        #[source]
        source: IntegrityError,
    },

    #[error("failed to install {wheel:?}: {source}")]
    Install {
        wheel: String,
        #[source]
        source: InstallError,
    },

    #[error("I/O error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Mount(#[from] MountError),

    #[error("install worker failed: {0}")]
    Worker(String),
}

impl ResolveError {
    pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| ResolveError::Io { path, source }
    }
}
