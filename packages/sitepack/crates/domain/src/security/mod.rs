pub mod verification;

pub use verification::{file_sha256, is_sha256_hex, sha256_hex, verify_file, IntegrityError};
