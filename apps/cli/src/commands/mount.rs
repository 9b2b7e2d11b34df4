use anyhow::Result;
use clap::Parser;
use sitepack::application::{SitePackages, SitepackConfig};
use sitepack::domain::system::PlatformCache;
use std::path::PathBuf;

#[derive(Parser, Debug)]
pub struct MountCommand {
    /// Per-process working directory; the view is mounted at <workdir>/overlay
    #[arg(long)]
    pub workdir: PathBuf,

    pub lockfile: PathBuf,
}

impl MountCommand {
    pub async fn execute(self, config: SitepackConfig) -> Result<()> {
        let site = SitePackages::from_config(config)?;
        let cache = PlatformCache::new();
        let path = site.setup(&cache, &self.workdir, &self.lockfile).await?;
        println!("{}", path.display());
        Ok(())
    }
}

#[derive(Parser, Debug)]
pub struct UnmountCommand {
    #[arg(long)]
    pub workdir: PathBuf,
}

impl UnmountCommand {
    pub fn execute(self, config: SitepackConfig) -> Result<()> {
        SitePackages::from_config(config)?.teardown(&self.workdir)?;
        Ok(())
    }
}
