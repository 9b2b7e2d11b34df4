pub mod command;
pub mod fetcher;
pub mod installer;

pub use command::{CommandOutput, CommandRunner, CommandSpec};
pub use fetcher::{ArtifactFetcher, FetchError};
pub use installer::{InstallError, WheelInstaller};
