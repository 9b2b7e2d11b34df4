pub mod config;
pub mod error;
pub mod install_service;
pub mod site_packages;

pub use config::{ConfigError, SitepackConfig};
pub use error::ResolveError;
pub use install_service::InstallService;
pub use site_packages::{Located, SitePackages};
