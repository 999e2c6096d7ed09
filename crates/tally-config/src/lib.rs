//! tally-config
//!
//! Settings for the bookkeeping backend and their JSON persistence.

pub mod error;
pub mod manager;
pub mod model;

pub use error::ConfigError;
pub use manager::ConfigManager;
pub use model::{Config, DATA_ROOT_ENV, DEFAULT_LOG_FILE_MAX_BYTES};
