use domain::ports::{CommandRunner, CommandSpec, InstallError, WheelInstaller};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// Installs wheels by running `<python> <script> <wheel> <dest>`.
pub struct ScriptInstaller {
    runner: Arc<dyn CommandRunner>,
    python: PathBuf,
    script: PathBuf,
    pythonpath: Option<PathBuf>,
}

impl ScriptInstaller {
    pub fn new(runner: Arc<dyn CommandRunner>, python: PathBuf, script: PathBuf) -> Self {
        Self {
            runner,
            python,
            script,
            pythonpath: None,
        }
    }

    /// Extra import path for the install script's own dependencies.
    pub fn with_pythonpath(mut self, path: PathBuf) -> Self {
        self.pythonpath = Some(path);
        self
    }

    fn command(&self, wheel: &Path, dest: &Path) -> CommandSpec {
        let mut spec = CommandSpec::new(&self.python)
            .arg(self.script.as_os_str())
            .arg(wheel.as_os_str())
            .arg(dest.as_os_str());
        if let Some(path) = &self.pythonpath {
            spec = spec.env("PYTHONPATH", path.as_os_str());
        }
        spec
    }
}

impl WheelInstaller for ScriptInstaller {
    fn install(&self, wheel: &Path, dest: &Path) -> Result<(), InstallError> {
        let spec = self.command(wheel, dest);
        debug!("Installing {:?} into {:?}", wheel, dest);

        let output = self.runner.run(&spec)?;
        if output.success() {
            return Ok(());
        }

        Err(InstallError::Failed {
            wheel: wheel.to_path_buf(),
            status: output.status,
            stderr: output.stderr_lossy().trim().to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::ports::CommandOutput;
    use std::io;
    use std::sync::Mutex;

    struct Recorder {
        calls: Mutex<Vec<CommandSpec>>,
        status: i32,
    }

    impl CommandRunner for Recorder {
        fn run(&self, spec: &CommandSpec) -> io::Result<CommandOutput> {
            self.calls.lock().unwrap().push(spec.clone());
            Ok(CommandOutput {
                status: Some(self.status),
                stdout: Vec::new(),
                stderr: b"bad wheel\n".to_vec(),
            })
        }
    }

    fn recorder(status: i32) -> Arc<Recorder> {
        Arc::new(Recorder {
            calls: Mutex::new(Vec::new()),
            status,
        })
    }

    #[test]
    fn test_builds_installer_command() {
        let runner = recorder(0);
        let installer = ScriptInstaller::new(
            runner.clone(),
            PathBuf::from("/opt/python/python"),
            PathBuf::from("/opt/python/install_wheel.py"),
        )
        .with_pythonpath(PathBuf::from("/opt/python/site-packages"));

        installer
            .install(Path::new("/w/pkg.whl"), Path::new("/cache/tmp/1"))
            .unwrap();

        let calls = runner.calls.lock().unwrap();
        assert_eq!(
            calls[0].display(),
            "/opt/python/python /opt/python/install_wheel.py /w/pkg.whl /cache/tmp/1"
        );
        assert_eq!(calls[0].env[0].0, "PYTHONPATH");
    }

    #[test]
    fn test_non_zero_exit_is_an_error() {
        let installer = ScriptInstaller::new(
            recorder(1),
            PathBuf::from("python"),
            PathBuf::from("install_wheel.py"),
        );
        let err = installer
            .install(Path::new("pkg.whl"), Path::new("dest"))
            .unwrap_err();
        match err {
            InstallError::Failed { status, stderr, .. } => {
                assert_eq!(status, Some(1));
                assert_eq!(stderr, "bad wheel");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
