pub mod tags;

pub use tags::{CompatibilityTags, WheelTags};

use sitepack_lock::{Artifact, Package};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SelectionError {
    #[error("package {0:?} has no wheels")]
    NoWheels(String),

    #[error("no compatible wheel found for {0:?}")]
    NoCompatibleWheel(String),
}

/// Pick the wheel whose best tag triple ranks highest in `tags`.
///
/// Ties go to the wheel listed first in the lockfile.
pub fn select_best<'p>(
    package: &'p Package,
    tags: &CompatibilityTags,
) -> Result<&'p Artifact, SelectionError> {
    let wheels = package.source.wheels();
    if wheels.is_empty() {
        return Err(SelectionError::NoWheels(package.name.clone()));
    }

    let mut best: Option<(&Artifact, usize)> = None;
    for wheel in wheels {
        let Some(wheel_tags) = WheelTags::from_filename(&wheel.name) else {
            continue;
        };
        for triple in wheel_tags.triples() {
            if let Some(rank) = tags.rank(&triple) {
                if best.map_or(true, |(_, best_rank)| rank < best_rank) {
                    best = Some((wheel, rank));
                }
            }
        }
    }

    best.map(|(wheel, _)| wheel)
        .ok_or_else(|| SelectionError::NoCompatibleWheel(package.name.clone()))
}
