use anyhow::{bail, Result};
use clap::Parser;
use sitepack::application::SitePackages;

#[derive(Parser, Debug)]
pub struct LocateCommand {
    /// Command line of the Python process, e.g. `-- python -u app.py`
    #[arg(trailing_var_arg = true, allow_hyphen_values = true, required = true)]
    pub args: Vec<String>,
}

impl LocateCommand {
    pub fn execute(self) -> Result<()> {
        match SitePackages::locate(&self.args) {
            Some(found) => {
                println!("script   {}", found.script.display());
                println!("lockfile {}", found.lockfile.display());
                Ok(())
            }
            None => bail!("No *.py script with a pylock.toml above it in: {}", self.args.join(" ")),
        }
    }
}
