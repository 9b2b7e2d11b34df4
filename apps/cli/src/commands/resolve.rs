use anyhow::Result;
use clap::Parser;
use sitepack::application::{SitePackages, SitepackConfig};
use sitepack::domain::system::PlatformCache;
use sitepack::lock::Lockfile;
use std::path::PathBuf;

#[derive(Parser, Debug)]
pub struct ResolveCommand {
    pub lockfile: PathBuf,
}

impl ResolveCommand {
    pub async fn execute(self, config: SitepackConfig) -> Result<()> {
        let lock = Lockfile::parse_file(&self.lockfile)?;
        let cache = PlatformCache::new();
        let ctx = cache.context(&config.interpreter, &config.tags_file, &config.markers_file)?;

        let site = SitePackages::from_config(config)?;
        for path in site.service().resolve(&lock, &ctx).await? {
            println!("{}", path.display());
        }
        Ok(())
    }
}
