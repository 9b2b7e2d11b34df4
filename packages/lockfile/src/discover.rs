use std::path::{Path, PathBuf};

/// Lockfile names searched in each directory, highest priority first.
pub const LOCKFILE_NAMES: [&str; 2] = ["pylock.sitepack.toml", "pylock.toml"];

/// Find the lockfile governing `script`, searching its directory and then
/// each ancestor up to the filesystem root.
pub fn discover_lockfile(script: &Path) -> Option<PathBuf> {
    let start = script.parent()?;

    for dir in start.ancestors() {
        if dir.as_os_str().is_empty() {
            break;
        }
        for name in LOCKFILE_NAMES {
            let candidate = dir.join(name);
            if candidate.is_file() {
                return Some(candidate);
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_nearest_lockfile_wins() {
        let root = tempfile::tempdir().unwrap();
        let nested = root.path().join("app").join("jobs");
        fs::create_dir_all(&nested).unwrap();

        fs::write(root.path().join("pylock.toml"), "").unwrap();
        let script = nested.join("main.py");
        assert_eq!(
            discover_lockfile(&script),
            Some(root.path().join("pylock.toml"))
        );

        fs::write(root.path().join("app").join("pylock.toml"), "").unwrap();
        assert_eq!(
            discover_lockfile(&script),
            Some(root.path().join("app").join("pylock.toml"))
        );
    }

    #[test]
    fn test_sitepack_name_preferred() {
        let root = tempfile::tempdir().unwrap();
        fs::write(root.path().join("pylock.toml"), "").unwrap();
        fs::write(root.path().join("pylock.sitepack.toml"), "").unwrap();

        let found = discover_lockfile(&root.path().join("main.py")).unwrap();
        assert_eq!(found.file_name().unwrap(), "pylock.sitepack.toml");
    }

    #[test]
    fn test_relative_script_without_lockfile() {
        assert_eq!(discover_lockfile(Path::new("main.py")), None);
    }
}
