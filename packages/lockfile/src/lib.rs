//! The `pylock.toml` lockfile format as consumed by sitepack.
//!
//! [`Lockfile::parse_file`] decodes and validates a lockfile in one step.
//! Validation is fail-fast: the first structural problem aborts the load.

pub mod discover;
pub mod types;

pub use discover::{discover_lockfile, LOCKFILE_NAMES};
pub use types::*;
