use domain::ports::{CommandOutput, CommandRunner, CommandSpec};
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::debug;

/// Runs commands on the host with `std::process`.
///
/// Bare program names are looked up on `PATH` first so a missing tool is
/// reported by name.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl SystemRunner {
    pub fn new() -> Self {
        Self
    }

    fn resolve(program: &Path) -> io::Result<PathBuf> {
        if program.components().count() > 1 {
            return Ok(program.to_path_buf());
        }
        which::which(program).map_err(|e| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("{}: {}", program.display(), e),
            )
        })
    }
}

impl CommandRunner for SystemRunner {
    fn run(&self, spec: &CommandSpec) -> io::Result<CommandOutput> {
        let program = Self::resolve(&spec.program)?;
        debug!("Running {}", spec.display());

        let output = Command::new(program)
            .args(&spec.args)
            .envs(spec.env.iter().map(|(k, v)| (k, v)))
            .output()?;

        Ok(CommandOutput {
            status: output.status.code(),
            stdout: output.stdout,
            stderr: output.stderr,
        })
    }
}
