use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("max-concurrent-installs must be at least 1")]
    ZeroConcurrency,
}

/// Paths and limits for one host. Every key is optional in the file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct SitepackConfig {
    /// Root of the install cache; the interpreter name is appended.
    pub cache_root: PathBuf,
    pub download_root: PathBuf,
    /// Interpreter key, e.g. `cpython3.11`.
    pub interpreter: String,
    pub python: PathBuf,
    pub install_script: PathBuf,
    pub installer_pythonpath: Option<PathBuf>,
    pub tags_file: PathBuf,
    pub markers_file: PathBuf,
    pub max_concurrent_installs: usize,
    pub overlay_program: PathBuf,
}

impl Default for SitepackConfig {
    fn default() -> Self {
        Self {
            cache_root: PathBuf::from("/tmp/python-package-cache"),
            download_root: PathBuf::from("/tmp/python-wheels"),
            interpreter: "cpython3.11".to_string(),
            python: PathBuf::from("/tmp/python/python"),
            install_script: PathBuf::from("/tmp/python/sitepack/install_wheel.py"),
            installer_pythonpath: Some(PathBuf::from("/tmp/python/sitepack/site-packages")),
            tags_file: PathBuf::from("/tmp/python/sitepack/sys_tags"),
            markers_file: PathBuf::from("/tmp/python/sitepack/env_markers.json"),
            max_concurrent_installs: 4,
            overlay_program: PathBuf::from("fuse-overlayfs"),
        }
    }
}

impl SitepackConfig {
    /// `~/.sitepack/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".sitepack").join("config.toml"))
    }

    /// Load `path` if given, else the per-user file when it exists, else defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::from_file(path),
            None => match Self::default_path().filter(|p| p.is_file()) {
                Some(path) => Self::from_file(&path),
                None => {
                    debug!("No config file found, using defaults");
                    Ok(Self::default())
                }
            },
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        debug!("Loaded config from {:?}", path);
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_concurrent_installs == 0 {
            return Err(ConfigError::ZeroConcurrency);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_keeps_defaults() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "cache-root = \"/srv/cache\"\nmax-concurrent-installs = 8\n",
        )?;

        let config = SitepackConfig::load(Some(&path))?;
        assert_eq!(config.cache_root, PathBuf::from("/srv/cache"));
        assert_eq!(config.max_concurrent_installs, 8);
        assert_eq!(config.interpreter, "cpython3.11");
        assert_eq!(config.download_root, PathBuf::from("/tmp/python-wheels"));
        Ok(())
    }

    #[test]
    fn test_unknown_keys_are_rejected() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("config.toml");
        fs::write(&path, "cache_dir = \"/srv/cache\"\n")?;

        assert!(matches!(
            SitepackConfig::load(Some(&path)),
            Err(ConfigError::Parse { .. })
        ));
        Ok(())
    }

    #[test]
    fn test_zero_concurrency_is_rejected() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("config.toml");
        fs::write(&path, "max-concurrent-installs = 0\n")?;

        assert!(matches!(
            SitepackConfig::load(Some(&path)),
            Err(ConfigError::ZeroConcurrency)
        ));
        Ok(())
    }

    #[test]
    fn test_missing_explicit_file() {
        assert!(matches!(
            SitepackConfig::load(Some(Path::new("/nonexistent/sitepack.toml"))),
            Err(ConfigError::Read { .. })
        ));
    }
}
