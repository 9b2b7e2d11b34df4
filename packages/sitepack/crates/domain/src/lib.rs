pub mod markers;
pub mod ports;
pub mod security;
pub mod selection;
pub mod system;

pub use markers::{Marker, MarkerEnvironment, MarkerError, MarkerSyntaxError};
pub use ports::{ArtifactFetcher, CommandRunner, WheelInstaller};
pub use selection::{select_best, CompatibilityTags, SelectionError};
pub use system::{PlatformCache, PlatformContext, StoreManager};
