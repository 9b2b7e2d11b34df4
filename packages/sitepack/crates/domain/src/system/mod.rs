pub mod platform;
pub mod store;

pub use platform::{
    OsType, PlatformCache, PlatformContext, PlatformDetector, PlatformError, PlatformInfo,
};
pub use store::{is_plain_file_name, StoreManager};
