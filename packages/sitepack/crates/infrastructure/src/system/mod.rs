pub mod overlay;

pub use overlay::{MountError, OverlayAssembler};
