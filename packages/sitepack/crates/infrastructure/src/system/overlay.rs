//! Union mount of installed packages into one read-mostly tree.
//!
//! Layout under the working directory:
//!
//! ```text
//! <workdir>/upper     writable layer
//! <workdir>/work      scratch space required by the overlay driver
//! <workdir>/overlay   merged view
//! ```

use domain::ports::{CommandOutput, CommandRunner, CommandSpec};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

pub const DEFAULT_OVERLAY_PROGRAM: &str = "fuse-overlayfs";

#[derive(Error, Debug)]
pub enum MountError {
    #[error("failed to create {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to launch {program}: {source}")]
    Launch {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("layer path {0:?} contains a ':' or ',' and cannot be passed to the overlay driver")]
    InvalidLayer(PathBuf),

    #[error("overlay mount at {target:?} failed with {status:?}: {stderr}")]
    NotMounted {
        target: PathBuf,
        status: Option<i32>,
        stderr: String,
    },

    #[cfg(target_os = "linux")]
    #[error("failed to unmount {target:?}: {source}")]
    Unmount {
        target: PathBuf,
        #[source]
        source: nix::Error,
    },

    #[error("unmounting is only supported on Linux")]
    Unsupported,
}

pub struct OverlayAssembler {
    runner: Arc<dyn CommandRunner>,
    program: PathBuf,
}

impl OverlayAssembler {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self::with_program(runner, DEFAULT_OVERLAY_PROGRAM)
    }

    pub fn with_program(runner: Arc<dyn CommandRunner>, program: impl Into<PathBuf>) -> Self {
        Self {
            runner,
            program: program.into(),
        }
    }

    /// Mount `lower_dirs` (highest priority first) under `working_dir` and
    /// return the merged view.
    ///
    /// A failing exit status is tolerated when the mount table shows the
    /// target mounted anyway.
    pub fn mount(&self, working_dir: &Path, lower_dirs: &[PathBuf]) -> Result<PathBuf, MountError> {
        let upper = working_dir.join("upper");
        let work = working_dir.join("work");
        let target = working_dir.join("overlay");
        for dir in [&upper, &work, &target] {
            create_dir(dir)?;
        }

        let fallback;
        let lowers: &[PathBuf] = if lower_dirs.is_empty() {
            fallback = [working_dir.join("lower").join("0")];
            &fallback
        } else {
            lower_dirs
        };
        for dir in lowers {
            create_dir(dir)?;
        }

        let options = mount_options(lowers, &upper, &work)?;
        let spec = CommandSpec::new(&self.program)
            .arg("-o")
            .arg(options)
            .arg(target.as_os_str());
        info!("Mounting {} layers at {:?}", lowers.len(), target);

        let output = self
            .runner
            .run(&spec)
            .map_err(|source| MountError::Launch {
                program: self.program.display().to_string(),
                source,
            })?;
        if output.success() {
            return Ok(target);
        }

        if self.is_mounted(&target) {
            warn!(
                "{} exited with {:?} but {:?} is mounted: {}",
                self.program.display(),
                output.status,
                target,
                output.stderr_lossy().trim()
            );
            return Ok(target);
        }

        Err(MountError::NotMounted {
            target,
            status: output.status,
            stderr: output.stderr_lossy().trim().to_string(),
        })
    }

    /// Ask the live mount table whether an overlay is mounted at `target`.
    pub fn is_mounted(&self, target: &Path) -> bool {
        let spec = CommandSpec::new("findmnt")
            .arg("-n")
            .arg("-t")
            .arg("fuse.fuse-overlayfs")
            .arg("-T")
            .arg(target.as_os_str());

        match self.runner.run(&spec) {
            Ok(CommandOutput { status, stdout, .. }) => {
                status == Some(0) && !stdout.iter().all(u8::is_ascii_whitespace)
            }
            Err(e) => {
                debug!("findmnt unavailable: {}", e);
                false
            }
        }
    }

    /// Unmount `<working_dir>/overlay`.
    pub fn unmount(&self, working_dir: &Path) -> Result<(), MountError> {
        let target = working_dir.join("overlay");
        info!("Unmounting {:?}", target);
        unmount_target(&target)
    }
}

#[cfg(target_os = "linux")]
fn unmount_target(target: &Path) -> Result<(), MountError> {
    nix::mount::umount(target).map_err(|source| MountError::Unmount {
        target: target.to_path_buf(),
        source,
    })
}

#[cfg(not(target_os = "linux"))]
fn unmount_target(_target: &Path) -> Result<(), MountError> {
    Err(MountError::Unsupported)
}

fn create_dir(path: &Path) -> Result<(), MountError> {
    fs::create_dir_all(path).map_err(|source| MountError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn mount_options(lowers: &[PathBuf], upper: &Path, work: &Path) -> Result<String, MountError> {
    let mut parts = Vec::with_capacity(lowers.len());
    for path in lowers.iter().map(PathBuf::as_path).chain([upper, work]) {
        let text = path.to_string_lossy();
        if text.contains(|c: char| c == ':' || c == ',') {
            return Err(MountError::InvalidLayer(path.to_path_buf()));
        }
        parts.push(text.into_owned());
    }

    let (dirs, rest) = parts.split_at(lowers.len());
    Ok(format!(
        "lowerdir={},upperdir={},workdir={}",
        dirs.join(":"),
        rest[0],
        rest[1]
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Replays canned outputs and records every invocation.
    #[derive(Default)]
    struct FakeRunner {
        calls: Mutex<Vec<CommandSpec>>,
        replies: Mutex<VecDeque<CommandOutput>>,
    }

    impl FakeRunner {
        fn with_replies(replies: Vec<CommandOutput>) -> Arc<Self> {
            Arc::new(Self {
                calls: Mutex::new(Vec::new()),
                replies: Mutex::new(replies.into()),
            })
        }

        fn programs(&self) -> Vec<String> {
            self.calls
                .lock()
                .unwrap()
                .iter()
                .map(|c| c.program.display().to_string())
                .collect()
        }
    }

    impl CommandRunner for FakeRunner {
        fn run(&self, spec: &CommandSpec) -> io::Result<CommandOutput> {
            self.calls.lock().unwrap().push(spec.clone());
            Ok(self.replies.lock().unwrap().pop_front().unwrap_or_default())
        }
    }

    fn exit(status: i32, stdout: &str) -> CommandOutput {
        CommandOutput {
            status: Some(status),
            stdout: stdout.as_bytes().to_vec(),
            stderr: b"fuse: device busy".to_vec(),
        }
    }

    #[test]
    fn test_mount_creates_layout_and_passes_layers() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let lowers = vec![dir.path().join("a"), dir.path().join("b")];
        let runner = FakeRunner::with_replies(vec![exit(0, "")]);
        let assembler = OverlayAssembler::new(runner.clone());

        let target = assembler.mount(dir.path(), &lowers)?;

        assert_eq!(target, dir.path().join("overlay"));
        for sub in ["upper", "work", "overlay", "a", "b"] {
            assert!(dir.path().join(sub).is_dir(), "{sub} missing");
        }

        let calls = runner.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        let expected = format!(
            "lowerdir={}:{},upperdir={},workdir={}",
            lowers[0].display(),
            lowers[1].display(),
            dir.path().join("upper").display(),
            dir.path().join("work").display()
        );
        assert_eq!(calls[0].program, PathBuf::from("fuse-overlayfs"));
        assert_eq!(calls[0].args[1], std::ffi::OsString::from(expected));
        Ok(())
    }

    #[test]
    fn test_empty_lower_set_uses_placeholder_layer() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let runner = FakeRunner::with_replies(vec![exit(0, "")]);
        OverlayAssembler::new(runner.clone()).mount(dir.path(), &[])?;

        assert!(dir.path().join("lower/0").is_dir());
        let calls = runner.calls.lock().unwrap();
        let options = calls[0].args[1].to_string_lossy().into_owned();
        assert!(options.starts_with(&format!("lowerdir={},", dir.path().join("lower/0").display())));
        Ok(())
    }

    #[test]
    fn test_failed_exit_confirmed_by_mount_table() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let runner = FakeRunner::with_replies(vec![
            exit(1, ""),
            exit(0, "/w/overlay fuse-overlayfs fuse.fuse-overlayfs rw\n"),
        ]);
        let target = OverlayAssembler::new(runner.clone()).mount(dir.path(), &[])?;

        assert_eq!(target, dir.path().join("overlay"));
        assert_eq!(runner.programs(), vec!["fuse-overlayfs", "findmnt"]);
        Ok(())
    }

    #[test]
    fn test_failed_exit_not_confirmed() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let runner = FakeRunner::with_replies(vec![exit(1, ""), exit(1, "")]);
        let err = OverlayAssembler::new(runner)
            .mount(dir.path(), &[])
            .unwrap_err();

        match err {
            MountError::NotMounted { status, stderr, .. } => {
                assert_eq!(status, Some(1));
                assert_eq!(stderr, "fuse: device busy");
            }
            other => panic!("unexpected error: {other}"),
        }
        Ok(())
    }

    #[test]
    fn test_layer_paths_with_separators_are_rejected() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let runner = FakeRunner::with_replies(vec![]);
        let err = OverlayAssembler::new(runner.clone())
            .mount(dir.path(), &[dir.path().join("a:b")])
            .unwrap_err();

        assert!(matches!(err, MountError::InvalidLayer(_)));
        assert!(runner.programs().is_empty());
        Ok(())
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_unmount_of_unmounted_dir_fails() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        fs::create_dir(dir.path().join("overlay"))?;
        let assembler = OverlayAssembler::new(FakeRunner::with_replies(vec![]));
        assert!(matches!(
            assembler.unmount(dir.path()),
            Err(MountError::Unmount { .. })
        ));
        Ok(())
    }
}
