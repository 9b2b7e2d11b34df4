use crate::markers::MarkerEnvironment;
use crate::selection::CompatibilityTags;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tracing::debug;

/// Operating system type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OsType {
    MacOS,
    Linux,
    Windows,
    FreeBSD,
    OpenBSD,
    Unknown,
}

impl OsType {
    /// Value of Python's `sys.platform`.
    pub fn sys_platform(&self) -> &'static str {
        match self {
            OsType::MacOS => "darwin",
            OsType::Linux => "linux",
            OsType::Windows => "win32",
            OsType::FreeBSD => "freebsd",
            OsType::OpenBSD => "openbsd",
            OsType::Unknown => "",
        }
    }

    /// Value of Python's `platform.system()`.
    pub fn platform_system(&self) -> &'static str {
        match self {
            OsType::MacOS => "Darwin",
            OsType::Linux => "Linux",
            OsType::Windows => "Windows",
            OsType::FreeBSD => "FreeBSD",
            OsType::OpenBSD => "OpenBSD",
            OsType::Unknown => "",
        }
    }

    pub fn os_name(&self) -> &'static str {
        match self {
            OsType::Windows => "nt",
            _ => "posix",
        }
    }
}

impl fmt::Display for OsType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OsType::MacOS => write!(f, "macOS"),
            OsType::Linux => write!(f, "Linux"),
            OsType::Windows => write!(f, "Windows"),
            OsType::FreeBSD => write!(f, "FreeBSD"),
            OsType::OpenBSD => write!(f, "OpenBSD"),
            OsType::Unknown => write!(f, "Unknown"),
        }
    }
}

/// Host platform as seen by marker evaluation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformInfo {
    pub os_type: OsType,
    pub os_version: String,
    /// `std::env::consts::ARCH`, which matches `platform.machine()` on Linux.
    pub machine: String,
    pub kernel_version: Option<String>,
}

impl fmt::Display for PlatformInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} ({})", self.os_type, self.os_version, self.machine)?;
        if let Some(kernel) = &self.kernel_version {
            write!(f, " [kernel {}]", kernel)?;
        }
        Ok(())
    }
}

/// Platform detection service
pub struct PlatformDetector;

impl PlatformDetector {
    /// Detect the current platform information
    pub fn detect() -> PlatformInfo {
        let info = os_info::get();

        PlatformInfo {
            os_type: Self::detect_os_type(&info),
            os_version: info.version().to_string(),
            machine: std::env::consts::ARCH.to_string(),
            kernel_version: sysinfo::System::kernel_version(),
        }
    }

    fn detect_os_type(info: &os_info::Info) -> OsType {
        match info.os_type() {
            os_info::Type::Macos => OsType::MacOS,
            os_info::Type::Windows => OsType::Windows,
            os_info::Type::FreeBSD => OsType::FreeBSD,
            os_info::Type::OpenBSD => OsType::OpenBSD,
            // os_info names distributions individually; fall back to the
            // compile target for everything it does not map above.
            _ if cfg!(target_os = "linux") => OsType::Linux,
            _ => OsType::Unknown,
        }
    }

    /// Marker variables for `interpreter` (e.g. `cpython3.11`) on this host.
    ///
    /// Used when no environment file captured from the real interpreter is
    /// available.
    pub fn marker_environment(interpreter: &str) -> MarkerEnvironment {
        Self::marker_environment_for(&Self::detect(), interpreter)
    }

    pub fn marker_environment_for(info: &PlatformInfo, interpreter: &str) -> MarkerEnvironment {
        let split = interpreter
            .find(|c: char| c.is_ascii_digit())
            .unwrap_or(interpreter.len());
        let (implementation, version) = interpreter.split_at(split);
        let python_version = version.split('.').take(2).collect::<Vec<_>>().join(".");

        let mut env = MarkerEnvironment::default();
        env.insert("os_name", info.os_type.os_name());
        env.insert("sys_platform", info.os_type.sys_platform());
        env.insert("platform_system", info.os_type.platform_system());
        env.insert("platform_machine", info.machine.as_str());
        env.insert(
            "platform_release",
            info.kernel_version.clone().unwrap_or_default(),
        );
        env.insert("implementation_name", implementation);
        env.insert(
            "platform_python_implementation",
            python_implementation(implementation),
        );
        env.insert("python_version", python_version);
        env.insert("python_full_version", version);
        env.insert("implementation_version", version);
        env
    }
}

fn python_implementation(name: &str) -> &str {
    match name {
        "cpython" => "CPython",
        "pypy" => "PyPy",
        "graalpy" => "GraalVM",
        other => other,
    }
}

#[derive(Error, Debug)]
pub enum PlatformError {
    #[error("failed to read {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid marker environment in {path:?}: {source}")]
    Markers {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Everything wheel selection and marker evaluation need about the target
/// interpreter.
#[derive(Debug, Clone)]
pub struct PlatformContext {
    pub interpreter: String,
    pub tags: Arc<CompatibilityTags>,
    pub markers: Arc<MarkerEnvironment>,
}

/// Parsed tag lists and marker environments keyed by file path.
///
/// Each file is read at most once for the lifetime of the cache. The owner
/// decides how long that is.
#[derive(Debug, Default)]
pub struct PlatformCache {
    tags: Mutex<HashMap<PathBuf, Arc<CompatibilityTags>>>,
    markers: Mutex<HashMap<PathBuf, Arc<MarkerEnvironment>>>,
}

impl PlatformCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tags(&self, path: &Path) -> Result<Arc<CompatibilityTags>, PlatformError> {
        get_or_load(&self.tags, path, |text| Ok(CompatibilityTags::parse(text)))
    }

    pub fn markers(&self, path: &Path) -> Result<Arc<MarkerEnvironment>, PlatformError> {
        get_or_load(&self.markers, path, |text| {
            MarkerEnvironment::from_json(text).map_err(|source| PlatformError::Markers {
                path: path.to_path_buf(),
                source,
            })
        })
    }

    pub fn context(
        &self,
        interpreter: &str,
        tags_path: &Path,
        markers_path: &Path,
    ) -> Result<PlatformContext, PlatformError> {
        Ok(PlatformContext {
            interpreter: interpreter.to_string(),
            tags: self.tags(tags_path)?,
            markers: self.markers(markers_path)?,
        })
    }
}

fn get_or_load<T>(
    cache: &Mutex<HashMap<PathBuf, Arc<T>>>,
    path: &Path,
    parse: impl FnOnce(&str) -> Result<T, PlatformError>,
) -> Result<Arc<T>, PlatformError> {
    // Held across the read so a path is never loaded twice.
    let mut entries = cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    if let Some(hit) = entries.get(path) {
        return Ok(Arc::clone(hit));
    }

    debug!("Loading platform data from {:?}", path);
    let text = fs::read_to_string(path).map_err(|source| PlatformError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let value = Arc::new(parse(&text)?);
    entries.insert(path.to_path_buf(), Arc::clone(&value));
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_platform_detection() {
        let info = PlatformDetector::detect();
        assert!(!info.machine.is_empty());
        println!("Detected platform: {}", info);
    }

    #[test]
    fn test_marker_environment_for_cpython() {
        let info = PlatformInfo {
            os_type: OsType::Linux,
            os_version: "6.8".to_string(),
            machine: "x86_64".to_string(),
            kernel_version: Some("6.8.0".to_string()),
        };
        let env = PlatformDetector::marker_environment_for(&info, "cpython3.11");

        assert_eq!(env.get("sys_platform"), "linux");
        assert_eq!(env.get("os_name"), "posix");
        assert_eq!(env.get("platform_system"), "Linux");
        assert_eq!(env.get("platform_machine"), "x86_64");
        assert_eq!(env.get("implementation_name"), "cpython");
        assert_eq!(env.get("platform_python_implementation"), "CPython");
        assert_eq!(env.get("python_version"), "3.11");
        assert_eq!(env.get("python_full_version"), "3.11");
    }

    #[test]
    fn test_full_version_is_truncated_for_python_version() {
        let info = PlatformInfo {
            os_type: OsType::MacOS,
            os_version: "14".to_string(),
            machine: "aarch64".to_string(),
            kernel_version: None,
        };
        let env = PlatformDetector::marker_environment_for(&info, "cpython3.12.4");
        assert_eq!(env.get("python_version"), "3.12");
        assert_eq!(env.get("python_full_version"), "3.12.4");
        assert_eq!(env.get("sys_platform"), "darwin");
    }

    #[test]
    fn test_cache_reads_each_file_once() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let tags_path = dir.path().join("sys_tags");
        let markers_path = dir.path().join("env_markers.json");
        fs::write(&tags_path, "cp311-cp311-linux_x86_64\npy3-none-any\n")?;
        fs::write(&markers_path, r#"{"sys_platform": "linux"}"#)?;

        let cache = PlatformCache::new();
        let first = cache.context("cpython3.11", &tags_path, &markers_path)?;

        // Later edits are not observed: the parsed values are reused.
        fs::write(&tags_path, "py2-none-any\n")?;
        fs::remove_file(&markers_path)?;
        let second = cache.context("cpython3.11", &tags_path, &markers_path)?;

        assert!(Arc::ptr_eq(&first.tags, &second.tags));
        assert!(Arc::ptr_eq(&first.markers, &second.markers));
        assert_eq!(second.tags.rank("py3-none-any"), Some(1));
        Ok(())
    }

    #[test]
    fn test_cache_reports_missing_and_invalid_files() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let cache = PlatformCache::new();

        let missing = cache.tags(&dir.path().join("absent"));
        assert!(matches!(missing, Err(PlatformError::Read { .. })));

        let bad = dir.path().join("markers.json");
        fs::write(&bad, "[1, 2]")?;
        assert!(matches!(cache.markers(&bad), Err(PlatformError::Markers { .. })));
        Ok(())
    }
}
