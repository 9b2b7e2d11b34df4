pub mod fetch;
pub mod installer;
pub mod process;

pub use fetch::HttpFetcher;
pub use installer::ScriptInstaller;
pub use process::SystemRunner;
