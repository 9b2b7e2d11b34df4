pub mod adapters;
pub mod system;

pub use adapters::{HttpFetcher, ScriptInstaller, SystemRunner};
pub use system::{MountError, OverlayAssembler};
