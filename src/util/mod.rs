//! Utility modules for hermesjs

pub mod fs;
pub mod logging;

pub use fs::write_atomic;
pub use logging::{init_default, init_from_env, init_logging, LoggingConfig};
