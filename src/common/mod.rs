pub use config::HarnessConfig;
pub use error::{Error, Result};

pub mod config;
pub mod error;
