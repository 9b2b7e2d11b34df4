use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use tracing::info;

use domain::system::{PlatformCache, StoreManager};
use infrastructure::{HttpFetcher, OverlayAssembler, ScriptInstaller, SystemRunner};
use sitepack_lock::{discover_lockfile, Lockfile};

use crate::config::SitepackConfig;
use crate::error::ResolveError;
use crate::install_service::InstallService;

/// A script found on a command line together with the lockfile that governs it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Located {
    pub script: PathBuf,
    pub lockfile: PathBuf,
}

/// Builds and tears down the merged `site-packages` view for one process.
pub struct SitePackages {
    config: SitepackConfig,
    service: InstallService,
    overlay: Arc<OverlayAssembler>,
}

impl SitePackages {
    pub fn new(config: SitepackConfig, service: InstallService, overlay: OverlayAssembler) -> Self {
        Self {
            config,
            service,
            overlay: Arc::new(overlay),
        }
    }

    /// Wire the host adapters described by `config`.
    pub fn from_config(config: SitepackConfig) -> anyhow::Result<Self> {
        let runner = Arc::new(SystemRunner::new());

        let mut installer = ScriptInstaller::new(
            runner.clone(),
            config.python.clone(),
            config.install_script.clone(),
        );
        if let Some(path) = &config.installer_pythonpath {
            installer = installer.with_pythonpath(path.clone());
        }

        let fetcher = HttpFetcher::new().context("Failed to build HTTP client")?;
        let store = StoreManager::new(&config.cache_root, &config.download_root);
        let service = InstallService::new(store, Arc::new(fetcher), Arc::new(installer))
            .with_max_concurrent(config.max_concurrent_installs);
        let overlay = OverlayAssembler::with_program(runner, config.overlay_program.clone());

        Ok(Self::new(config, service, overlay))
    }

    pub fn config(&self) -> &SitepackConfig {
        &self.config
    }

    pub fn service(&self) -> &InstallService {
        &self.service
    }

    /// Resolve `lockfile_path`, mount the result under `working_dir` and
    /// return the path to hand the interpreter as its package directory.
    pub async fn setup(
        &self,
        cache: &PlatformCache,
        working_dir: &Path,
        lockfile_path: &Path,
    ) -> Result<PathBuf, ResolveError> {
        let lockfile = Lockfile::parse_file(lockfile_path)?;
        let ctx = cache.context(
            &self.config.interpreter,
            &self.config.tags_file,
            &self.config.markers_file,
        )?;

        let lowers = self.service.resolve(&lockfile, &ctx).await?;
        info!(
            "Resolved {} packages from {:?}",
            lowers.len(),
            lockfile_path
        );

        let overlay = Arc::clone(&self.overlay);
        let workdir = working_dir.to_path_buf();
        let merged = tokio::task::spawn_blocking(move || overlay.mount(&workdir, &lowers))
            .await
            .map_err(|e| ResolveError::Worker(e.to_string()))??;

        Ok(merged.join("site-packages"))
    }

    /// Unmount the view created by [`SitePackages::setup`].
    pub fn teardown(&self, working_dir: &Path) -> Result<(), ResolveError> {
        Ok(self.overlay.unmount(working_dir)?)
    }

    /// Find the first `*.py` argument that is not a flag and the lockfile
    /// nearest to it. Relative scripts are taken from the current directory.
    pub fn locate<I, S>(args: I) -> Option<Located>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let script = args.into_iter().find_map(|arg| {
            let arg = arg.as_ref().to_str()?;
            (!arg.starts_with('-') && arg.ends_with(".py")).then(|| PathBuf::from(arg))
        })?;

        let script = if script.is_relative() {
            std::env::current_dir().ok()?.join(script)
        } else {
            script
        };
        let lockfile = discover_lockfile(&script)?;
        Some(Located { script, lockfile })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_locate_skips_flags_and_finds_lockfile() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let app = dir.path().join("app");
        fs::create_dir_all(app.join("src"))?;
        fs::write(app.join("pylock.toml"), "")?;
        let script = app.join("src").join("main.py");

        let located = SitePackages::locate([
            OsStr::new("python"),
            OsStr::new("-X.py"),
            OsStr::new("-u"),
            script.as_os_str(),
            OsStr::new("other.py"),
        ])
        .expect("script located");

        assert_eq!(located.script, script);
        assert_eq!(located.lockfile, app.join("pylock.toml"));
        Ok(())
    }

    #[test]
    fn test_locate_without_script() {
        assert_eq!(SitePackages::locate(["python", "-c", "print(1)"]), None);
    }
}
