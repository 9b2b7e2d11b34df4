pub mod document;
pub mod lockfile;
pub mod source;
pub mod validation;

pub use document::*;
pub use lockfile::{Lockfile, Package};
pub use source::{
    Archive, Artifact, ArtifactLocation, Directory, LocationError, PackageSource, Vcs, SHA256,
};
pub use validation::{DocumentError, SUPPORTED_LOCK_VERSION};
