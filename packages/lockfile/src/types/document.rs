use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use toml::value::Datetime;

/// The raw `pylock.toml` document, exactly as it appears on disk.
///
/// Every field the format marks as required is still optional here so that
/// a missing key surfaces as a validation error naming the key, rather than
/// as an opaque decode failure. [`crate::Lockfile`] is the validated form.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub struct LockDocument {
    /// Format version. Only `"1.0"` is accepted.
    pub lock_version: Option<String>,

    /// Environment markers the lock was generated for.
    #[serde(default)]
    pub environments: Vec<String>,

    /// Interpreter constraint for the whole lock.
    pub requires_python: Option<String>,

    #[serde(default)]
    pub extras: Vec<String>,

    #[serde(default)]
    pub dependency_groups: Vec<String>,

    #[serde(default)]
    pub default_groups: Vec<String>,

    /// Name of the tool that produced the lock.
    pub created_by: Option<String>,

    /// One entry per `[[packages]]` table.
    #[serde(default)]
    pub packages: Vec<PackageEntry>,

    /// Tool-specific tables, carried through untouched.
    #[serde(default)]
    #[schemars(with = "BTreeMap<String, serde_json::Value>")]
    pub tool: BTreeMap<String, toml::Value>,
}

/// A single `[[packages]]` table.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub struct PackageEntry {
    pub name: Option<String>,

    pub version: Option<String>,

    /// Environment marker deciding whether the package applies.
    pub marker: Option<String>,

    pub requires_python: Option<String>,

    /// Index the package was resolved from.
    pub index: Option<String>,

    pub vcs: Option<VcsEntry>,

    pub directory: Option<DirectoryEntry>,

    pub archive: Option<ArchiveEntry>,

    pub sdist: Option<ArtifactEntry>,

    #[serde(default)]
    pub wheels: Vec<ArtifactEntry>,
}

/// Version-control source (`[packages.vcs]`).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub struct VcsEntry {
    /// VCS kind, e.g. `git`.
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub url: Option<String>,
    pub path: Option<String>,
    pub requested_revision: Option<String>,
    pub commit_id: Option<String>,
    pub subdirectory: Option<String>,
}

/// Local directory source (`[packages.directory]`).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub struct DirectoryEntry {
    pub path: Option<String>,
    #[serde(default)]
    pub editable: bool,
    pub subdirectory: Option<String>,
}

/// Single archive source (`[packages.archive]`).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub struct ArchiveEntry {
    pub url: Option<String>,
    pub path: Option<String>,
    pub size: Option<u64>,
    #[schemars(with = "Option<String>")]
    pub upload_time: Option<Datetime>,
    #[serde(default)]
    pub hashes: BTreeMap<String, String>,
    pub subdirectory: Option<String>,
}

/// A downloadable distribution file: `[packages.sdist]` or one of `[[packages.wheels]]`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub struct ArtifactEntry {
    pub name: Option<String>,
    pub url: Option<String>,
    pub path: Option<String>,
    pub size: Option<u64>,
    #[schemars(with = "Option<String>")]
    pub upload_time: Option<Datetime>,
    #[serde(default)]
    pub hashes: BTreeMap<String, String>,
}
