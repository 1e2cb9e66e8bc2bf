//! Process-global resources: environment variables and transient files.

pub use env::EnvOverride;
pub use file::TransientFile;

mod env;
mod file;
