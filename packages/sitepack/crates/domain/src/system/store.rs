use sitepack_lock::Artifact;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Layout of the shared, content-addressed package caches.
///
/// Installed wheels live at `<install_root>/<interpreter>/<base>-<sha256>`,
/// downloads at `<download_root>/<sha256>/<file name>`. Both are keyed by the
/// wheel's sha256 so concurrent processes agree on every path. Callers check
/// digests and names with [`is_sha256_hex`](crate::security::is_sha256_hex)
/// and [`is_plain_file_name`] before asking for a path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreManager {
    install_root: PathBuf,
    download_root: PathBuf,
}

/// True when `name` is usable as one path component below a cache root.
pub fn is_plain_file_name(name: &str) -> bool {
    !name.is_empty()
        && !name.contains("..")
        && !name.contains(|c: char| c == '/' || c == '\\' || c == '\0')
}

impl StoreManager {
    pub fn new(install_root: impl Into<PathBuf>, download_root: impl Into<PathBuf>) -> Self {
        Self {
            install_root: install_root.into(),
            download_root: download_root.into(),
        }
    }

    pub fn install_root(&self) -> &Path {
        &self.install_root
    }

    pub fn download_root(&self) -> &Path {
        &self.download_root
    }

    /// Final install directory for a wheel with the given digest, built for
    /// `interpreter`.
    pub fn install_path(&self, interpreter: &str, artifact: &Artifact, sha256: &str) -> PathBuf {
        self.install_root
            .join(interpreter)
            .join(format!("{}-{}", artifact.base_name(), sha256))
    }

    /// Where the verified wheel file is kept.
    pub fn download_path(&self, artifact: &Artifact, sha256: &str) -> PathBuf {
        self.download_root.join(sha256).join(&artifact.name)
    }

    /// Fresh scratch directory for one installer run. Not created here.
    pub fn tmp_install_dir(&self) -> PathBuf {
        self.install_root.join("tmp").join(Uuid::new_v4().to_string())
    }

    /// Unique sibling of `dest` for an in-flight download.
    pub fn partial_path(dest: &Path) -> PathBuf {
        let mut name = dest
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(format!(".{}.part", Uuid::new_v4().simple()));
        dest.with_file_name(name)
    }
}
