//! Lockfile-driven assembly of isolated Python `site-packages` trees.
//!
//! Re-exports the layers so binaries depend on a single crate.

pub use application;
pub use domain;
pub use infrastructure;
pub use sitepack_lock as lock;
