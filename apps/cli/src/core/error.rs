use sitepack::application::{ConfigError, ResolveError};
use sitepack::domain::markers::MarkerError;
use sitepack::domain::system::PlatformError;
use sitepack::infrastructure::MountError;
use sitepack::lock::DocumentError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Config(ConfigError),

    #[error("Lockfile error: {0}")]
    Lockfile(DocumentError),

    #[error("Marker error: {0}")]
    Marker(MarkerError),

    #[error("{0}")]
    Resolve(ResolveError),

    #[error("{0:#}")]
    Other(anyhow::Error),
}

impl From<anyhow::Error> for CliError {
    fn from(err: anyhow::Error) -> Self {
        let err = match err.downcast::<ResolveError>() {
            Ok(ResolveError::Document(e)) => return CliError::Lockfile(e),
            Ok(e) => return CliError::Resolve(e),
            Err(err) => err,
        };
        let err = match err.downcast::<ConfigError>() {
            Ok(e) => return CliError::Config(e),
            Err(err) => err,
        };
        let err = match err.downcast::<DocumentError>() {
            Ok(e) => return CliError::Lockfile(e),
            Err(err) => err,
        };
        match err.downcast::<MarkerError>() {
            Ok(e) => CliError::Marker(e),
            Err(err) => CliError::Other(err),
        }
    }
}

impl CliError {
    /// Returns a themed, actionable suggestion for the error.
    pub fn suggestion(&self) -> Option<String> {
        match self {
            CliError::Config(_) => Some(
                "Check ~/.sitepack/config.toml or the file passed with --config; keys are kebab-case."
                    .to_string(),
            ),
            CliError::Lockfile(_) => Some(
                "Lockfiles need lock-version = \"1.0\", created-by and exactly one source per package."
                    .to_string(),
            ),
            CliError::Resolve(ResolveError::Platform(PlatformError::Read { .. })) => Some(
                "Point tags-file and markers-file at files captured from the target interpreter."
                    .to_string(),
            ),
            CliError::Resolve(ResolveError::Mount(MountError::Launch { .. })) => {
                Some("Install fuse-overlayfs or set overlay-program in the config.".to_string())
            }
            CliError::Resolve(ResolveError::Integrity { .. }) => Some(
                "The artifact does not match its lockfile hash; regenerate the lockfile or check the index."
                    .to_string(),
            ),
            _ => None,
        }
    }

    pub fn render(&self) {
        eprintln!("\n{} {}", console::style("Error:").red().bold(), self);
        if let Some(s) = self.suggestion() {
            eprintln!("{} {}", console::style("  help:").dim(), s);
        }
    }
}
