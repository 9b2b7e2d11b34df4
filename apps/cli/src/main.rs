mod commands;
mod core;

use clap::{Parser, Subcommand};
use sitepack::application::SitepackConfig;
use std::path::PathBuf;
use tracing::Level;

use crate::commands::check::CheckCommand;
use crate::commands::locate::LocateCommand;
use crate::commands::marker::MarkerCommand;
use crate::commands::mount::{MountCommand, UnmountCommand};
use crate::commands::resolve::ResolveCommand;
use crate::commands::schema::SchemaCommand;
use crate::commands::select::SelectCommand;
use crate::core::error::CliError;

#[derive(Parser)]
#[command(name = "sitepack", version)]
#[command(about = "Assemble isolated Python site-packages from pylock.toml lockfiles", long_about = None)]
struct Cli {
    /// Config file; defaults to ~/.sitepack/config.toml when present
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a lockfile and list its packages
    Check(CheckCommand),
    /// Evaluate an environment marker
    Marker(MarkerCommand),
    /// Show the wheel chosen for each applicable package
    Select(SelectCommand),
    /// Fetch, verify and install every applicable package
    Resolve(ResolveCommand),
    /// Resolve a lockfile and mount the merged site-packages view
    Mount(MountCommand),
    /// Unmount a view created by `mount`
    Unmount(UnmountCommand),
    /// Find the script and lockfile for a Python command line
    Locate(LocateCommand),
    /// Print the JSON schema of the lockfile format
    Schema(SchemaCommand),
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(if cli.verbose { Level::DEBUG } else { Level::INFO })
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = run(cli).await {
        CliError::from(err).render();
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = SitepackConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Check(cmd) => cmd.execute(),
        Commands::Marker(cmd) => cmd.execute(&config),
        Commands::Select(cmd) => cmd.execute(&config),
        Commands::Resolve(cmd) => cmd.execute(config).await,
        Commands::Mount(cmd) => cmd.execute(config).await,
        Commands::Unmount(cmd) => cmd.execute(config),
        Commands::Locate(cmd) => cmd.execute(),
        Commands::Schema(cmd) => cmd.execute(),
    }
}
