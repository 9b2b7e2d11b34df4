use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum IntegrityError {
    #[error("sha256 mismatch for {path:?}: expected {expected}, got {actual}")]
    Mismatch {
        path: PathBuf,
        expected: String,
        actual: String,
    },

    #[error("failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// True for a 64 character hex string, the only form accepted as a cache key.
pub fn is_sha256_hex(value: &str) -> bool {
    value.len() == 64 && value.bytes().all(|b| b.is_ascii_hexdigit())
}

/// Lowercase hex sha256 of an in-memory buffer.
pub fn sha256_hex(data: &[u8]) -> String {
    format!("{:x}", Sha256::digest(data))
}

/// Lowercase hex sha256 of a file, streamed in fixed-size chunks.
pub fn file_sha256(path: &Path) -> io::Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buf = [0u8; 64 * 1024];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(format!("{:x}", hasher.finalize()))
}

/// Check `path` against an expected hex digest. Comparison ignores case.
pub fn verify_file(path: &Path, expected: &str) -> Result<(), IntegrityError> {
    let actual = file_sha256(path).map_err(|source| IntegrityError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    if actual.eq_ignore_ascii_case(expected.trim()) {
        Ok(())
    } else {
        Err(IntegrityError::Mismatch {
            path: path.to_path_buf(),
            expected: expected.to_string(),
            actual,
        })
    }
}
