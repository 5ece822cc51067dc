pub mod cli;
pub mod error;
pub mod protocol;
pub mod remote;
pub mod repo;
pub mod storage;
pub mod url;

pub use error::{GrsError, Result};

/// Package version from Cargo.toml.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
