use crate::types::document::LockDocument;
use crate::types::source::PackageSource;
use crate::types::validation::{build_source, validate_header, DocumentError};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// A validated lockfile: at least one package, each with exactly one source.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Lockfile {
    pub lock_version: String,
    pub created_by: String,
    pub environments: Vec<String>,
    pub requires_python: Option<String>,
    pub extras: Vec<String>,
    pub dependency_groups: Vec<String>,
    pub default_groups: Vec<String>,
    pub tool: BTreeMap<String, toml::Value>,
    pub packages: Vec<Package>,

    /// Directory the lockfile was read from, for resolving relative artifact paths.
    #[serde(skip)]
    base_dir: Option<PathBuf>,
}

/// One pinned dependency.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Package {
    pub name: String,
    pub version: Option<String>,
    pub marker: Option<String>,
    pub requires_python: Option<String>,
    pub index: Option<String>,
    pub source: PackageSource,
}

impl Package {
    /// Marker expression, empty when the package always applies.
    pub fn marker(&self) -> &str {
        self.marker.as_deref().unwrap_or_default()
    }
}

impl Lockfile {
    /// Read, decode and validate a lockfile from disk.
    pub fn parse_file(path: &Path) -> Result<Self, DocumentError> {
        let content = std::fs::read_to_string(path).map_err(|source| DocumentError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let mut lockfile: Lockfile = content.parse()?;
        lockfile.base_dir = path.parent().map(Path::to_path_buf);
        Ok(lockfile)
    }

    /// Validate an already-decoded document.
    pub fn from_document(doc: LockDocument) -> Result<Self, DocumentError> {
        let (lock_version, created_by) = validate_header(&doc)?;

        let mut packages = Vec::with_capacity(doc.packages.len());
        for (index, entry) in doc.packages.iter().enumerate() {
            let name = entry
                .name
                .as_deref()
                .map(str::trim)
                .filter(|n| !n.is_empty())
                .ok_or(DocumentError::MissingPackageName { index })?;

            let source = build_source(index, entry)?;
            packages.push(Package {
                name: name.to_string(),
                version: entry.version.clone(),
                marker: entry.marker.clone(),
                requires_python: entry.requires_python.clone(),
                index: entry.index.clone(),
                source,
            });
        }

        for package in &mut packages {
            package.source.derive_names();
        }

        Ok(Self {
            lock_version,
            created_by,
            environments: doc.environments,
            requires_python: doc.requires_python,
            extras: doc.extras,
            dependency_groups: doc.dependency_groups,
            default_groups: doc.default_groups,
            tool: doc.tool,
            packages,
            base_dir: None,
        })
    }

    pub fn base_dir(&self) -> Option<&Path> {
        self.base_dir.as_deref()
    }

    pub fn with_base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.base_dir = Some(dir.into());
        self
    }
}

impl FromStr for Lockfile {
    type Err = DocumentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let doc: LockDocument = toml::from_str(s)?;
        Self::from_document(doc)
    }
}
