mod log_file;

use std::sync::Mutex;

use tracing_subscriber::{fmt, EnvFilter};

pub use log_file::{rotated_path, CappedLogFile};

pub const DEFAULT_LOG_FILTER: &str = "ledger_core=info";

/// Installs the global `fmt` subscriber, writing to `log_file` when given and
/// to stdout otherwise. `RUST_LOG` wins over `directive`, which wins over
/// [`DEFAULT_LOG_FILTER`]. A subscriber installed elsewhere is left in place.
pub fn init_tracing(directive: Option<&str>, log_file: Option<CappedLogFile>) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(directive.unwrap_or(DEFAULT_LOG_FILTER)))
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let _ = match log_file {
        Some(file) => fmt()
            .with_env_filter(filter)
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .try_init(),
        None => fmt().with_env_filter(filter).try_init(),
    };
}
