use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum InstallError {
    #[error("failed to launch installer: {0}")]
    Launch(#[from] std::io::Error),

    #[error("installer exited with {status:?} for {wheel:?}: {stderr}")]
    Failed {
        wheel: PathBuf,
        status: Option<i32>,
        stderr: String,
    },
}

/// Unpacks a verified wheel into a directory. Blocking.
pub trait WheelInstaller: Send + Sync {
    fn install(&self, wheel: &Path, dest: &Path) -> Result<(), InstallError>;
}
