use anyhow::Result;
use clap::Parser;
use sitepack::lock::Lockfile;
use std::path::PathBuf;

#[derive(Parser, Debug)]
pub struct CheckCommand {
    /// Path to the pylock.toml to validate
    pub lockfile: PathBuf,
}

impl CheckCommand {
    pub fn execute(self) -> Result<()> {
        let lock = Lockfile::parse_file(&self.lockfile)?;

        println!(
            "{} {} (lock-version {}, created by {})",
            console::style("✔").green().bold(),
            self.lockfile.display(),
            lock.lock_version,
            lock.created_by
        );

        for package in &lock.packages {
            let version = package.version.as_deref().unwrap_or("-");
            let mut line = format!(
                "  {} {} [{}]",
                console::style(&package.name).bold(),
                version,
                package.source.kind()
            );
            let wheels = package.source.wheels().len();
            if wheels > 0 {
                line.push_str(&format!(" {} wheels", wheels));
            }
            if !package.marker().is_empty() {
                line.push_str(&format!(" ; {}", console::style(package.marker()).dim()));
            }
            println!("{}", line);
        }

        println!("{} packages", lock.packages.len());
        Ok(())
    }
}
