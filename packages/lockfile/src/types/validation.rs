use crate::types::document::{ArchiveEntry, ArtifactEntry, LockDocument, PackageEntry};
use crate::types::source::{Archive, Artifact, Directory, PackageSource, Vcs};
use std::path::PathBuf;
use thiserror::Error;

/// The only lock format version this crate understands.
pub const SUPPORTED_LOCK_VERSION: &str = "1.0";

/// Any reason a lockfile could not be loaded. Always fatal for the whole document.
#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("failed to read lockfile {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("toml decode error: {0}")]
    Decode(#[from] toml::de::Error),

    #[error("missing required key \"{0}\"")]
    MissingKey(&'static str),

    #[error("unsupported lock-version \"{0}\" (only \"1.0\" supported)")]
    UnsupportedVersion(String),

    #[error("package entry {index} missing required field: name")]
    MissingPackageName { index: usize },

    #[error("packages[{index}] (name={name}): {reason}")]
    InvalidPackage {
        index: usize,
        name: String,
        reason: String,
    },

    #[error("packages[{index}].wheels[{wheel}] (name={name}): wheels.hashes must contain at least one entry")]
    MissingWheelHash {
        index: usize,
        wheel: usize,
        name: String,
    },
}

/// Document-level checks, in order: version present, version supported,
/// creator present, at least one package.
pub(crate) fn validate_header(doc: &LockDocument) -> Result<(String, String), DocumentError> {
    let version = doc
        .lock_version
        .as_deref()
        .filter(|v| !v.is_empty())
        .ok_or(DocumentError::MissingKey("lock-version"))?;
    if version != SUPPORTED_LOCK_VERSION {
        return Err(DocumentError::UnsupportedVersion(version.to_string()));
    }

    let created_by = doc
        .created_by
        .as_deref()
        .filter(|c| !c.trim().is_empty())
        .ok_or(DocumentError::MissingKey("created-by"))?;

    if doc.packages.is_empty() {
        return Err(DocumentError::MissingKey("packages"));
    }

    Ok((version.to_string(), created_by.to_string()))
}

/// Builds the single source of a package, rejecting zero or several.
pub(crate) fn build_source(index: usize, entry: &PackageEntry) -> Result<PackageSource, DocumentError> {
    let name = entry.name.as_deref().unwrap_or_default();
    let invalid = |reason: String| DocumentError::InvalidPackage {
        index,
        name: name.to_string(),
        reason,
    };

    let mut present = Vec::new();
    if entry.vcs.is_some() {
        present.push("vcs");
    }
    if entry.directory.is_some() {
        present.push("directory");
    }
    if entry.archive.is_some() {
        present.push("archive");
    }
    if entry.sdist.is_some() {
        present.push("sdist");
    }
    if !entry.wheels.is_empty() {
        present.push("wheels");
    }

    match present.len() {
        0 => {
            return Err(invalid(
                "one of vcs/directory/archive/sdist/wheels must be present".to_string(),
            ))
        }
        1 => {}
        _ => {
            return Err(invalid(format!(
                "{} are mutually exclusive; exactly one source is allowed",
                present.join("/")
            )))
        }
    }

    if let Some(vcs) = &entry.vcs {
        let commit_id = non_blank(&vcs.commit_id)
            .ok_or_else(|| invalid("vcs.commit-id is required when vcs is used".to_string()))?;
        let kind = non_blank(&vcs.kind)
            .ok_or_else(|| invalid("vcs.type is required when vcs is used".to_string()))?;
        return Ok(PackageSource::Vcs(Vcs {
            kind,
            url: vcs.url.clone(),
            path: vcs.path.clone(),
            requested_revision: vcs.requested_revision.clone(),
            commit_id,
            subdirectory: vcs.subdirectory.clone(),
        }));
    }

    if let Some(dir) = &entry.directory {
        let path = non_blank(&dir.path)
            .ok_or_else(|| invalid("directory.path required".to_string()))?;
        return Ok(PackageSource::Directory(Directory {
            path,
            editable: dir.editable,
            subdirectory: dir.subdirectory.clone(),
        }));
    }

    if let Some(archive) = &entry.archive {
        if archive.hashes.is_empty() {
            return Err(invalid(
                "archive.hashes must contain at least one entry".to_string(),
            ));
        }
        return Ok(PackageSource::Archive(archive_from(archive)));
    }

    if let Some(sdist) = &entry.sdist {
        if sdist.hashes.is_empty() {
            return Err(invalid(
                "sdist.hashes must contain at least one entry".to_string(),
            ));
        }
        return Ok(PackageSource::Sdist(artifact_from(sdist)));
    }

    let mut wheels = Vec::with_capacity(entry.wheels.len());
    for (j, wheel) in entry.wheels.iter().enumerate() {
        if wheel.hashes.is_empty() {
            return Err(DocumentError::MissingWheelHash {
                index,
                wheel: j,
                name: name.to_string(),
            });
        }
        wheels.push(artifact_from(wheel));
    }
    Ok(PackageSource::Wheels(wheels))
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn archive_from(entry: &ArchiveEntry) -> Archive {
    Archive {
        url: entry.url.clone(),
        path: entry.path.clone(),
        size: entry.size,
        upload_time: entry.upload_time.clone(),
        hashes: entry.hashes.clone(),
        subdirectory: entry.subdirectory.clone(),
    }
}

fn artifact_from(entry: &ArtifactEntry) -> Artifact {
    Artifact {
        name: entry.name.clone().unwrap_or_default(),
        url: entry.url.clone(),
        path: entry.path.clone(),
        size: entry.size,
        upload_time: entry.upload_time.clone(),
        hashes: entry.hashes.clone(),
    }
}
