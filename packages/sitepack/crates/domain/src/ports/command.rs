use std::ffi::OsString;
use std::io;
use std::path::PathBuf;

/// A program invocation: argv plus extra environment variables.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: PathBuf,
    pub args: Vec<OsString>,
    pub env: Vec<(OsString, OsString)>,
}

impl CommandSpec {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            ..Default::default()
        }
    }

    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn env(mut self, key: impl Into<OsString>, value: impl Into<OsString>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    /// Shell-like rendering for logs and error messages.
    pub fn display(&self) -> String {
        std::iter::once(self.program.as_os_str())
            .chain(self.args.iter().map(OsString::as_os_str))
            .map(|part| part.to_string_lossy())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code, `None` when the process was killed by a signal.
    pub status: Option<i32>,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.status == Some(0)
    }

    pub fn stdout_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }

    pub fn stderr_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stderr).into_owned()
    }
}

/// Runs external programs to completion. Blocking.
pub trait CommandRunner: Send + Sync {
    fn run(&self, spec: &CommandSpec) -> io::Result<CommandOutput>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let spec = CommandSpec::new("/usr/bin/findmnt")
            .arg("-n")
            .arg("-T")
            .arg("/tmp/overlay")
            .env("LC_ALL", "C");
        assert_eq!(spec.display(), "/usr/bin/findmnt -n -T /tmp/overlay");
        assert_eq!(spec.env.len(), 1);
    }

    #[test]
    fn test_signal_is_not_success() {
        let output = CommandOutput {
            status: None,
            ..Default::default()
        };
        assert!(!output.success());
    }
}
