use anyhow::Result;
use clap::Parser;
use sitepack::application::{InstallService, SitepackConfig};
use sitepack::domain::system::PlatformCache;
use sitepack::lock::Lockfile;
use std::path::PathBuf;

#[derive(Parser, Debug)]
pub struct SelectCommand {
    pub lockfile: PathBuf,

    /// Compatibility tag file, most preferred tag first
    #[arg(long)]
    pub tags: Option<PathBuf>,

    /// Marker environment JSON file
    #[arg(long)]
    pub env: Option<PathBuf>,
}

impl SelectCommand {
    pub fn execute(self, config: &SitepackConfig) -> Result<()> {
        let lock = Lockfile::parse_file(&self.lockfile)?;
        let cache = PlatformCache::new();
        let ctx = cache.context(
            &config.interpreter,
            self.tags.as_deref().unwrap_or(&config.tags_file),
            self.env.as_deref().unwrap_or(&config.markers_file),
        )?;

        let selected = InstallService::select(&lock, &ctx)?;
        for (package, wheel) in &selected {
            println!(
                "{} {} {}",
                console::style(&package.name).bold(),
                console::style("->").dim(),
                wheel.name
            );
        }

        let skipped = lock.packages.len() - selected.len();
        if skipped > 0 {
            println!("{} packages skipped by markers", skipped);
        }
        Ok(())
    }
}
