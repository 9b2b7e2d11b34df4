use anyhow::{Context, Result};
use clap::Parser;
use sitepack::application::SitepackConfig;
use sitepack::domain::markers::{self, MarkerEnvironment};
use sitepack::domain::system::PlatformDetector;
use std::path::PathBuf;

#[derive(Parser, Debug)]
pub struct MarkerCommand {
    /// Marker expression, e.g. "sys_platform == 'linux'"
    pub expression: String,

    /// JSON file with marker variables; defaults to values detected on this host
    #[arg(long)]
    pub env: Option<PathBuf>,
}

impl MarkerCommand {
    pub fn execute(self, config: &SitepackConfig) -> Result<()> {
        let env = match &self.env {
            Some(path) => {
                let text = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read {}", path.display()))?;
                MarkerEnvironment::from_json(&text)
                    .with_context(|| format!("Invalid marker environment in {}", path.display()))?
            }
            None => PlatformDetector::marker_environment(&config.interpreter),
        };

        let result = markers::evaluate(&self.expression, &env)?;
        println!("{}", result);
        Ok(())
    }
}
