#![doc(test(attr(deny(warnings))))]

//! Multi-tenant double-entry bookkeeping: companies with isolated ledgers and
//! charts of accounts, reconciled edits, financial reports and year-end
//! carry-forward, persisted as JSON documents.

pub mod books;
pub mod errors;
pub mod utils;

use std::sync::Once;

pub use books::Books;
pub use errors::BooksError;
pub use tally_config::{Config, ConfigManager};
pub use tally_core as engine;
pub use tally_domain as domain;
pub use tally_storage_json as storage;

static INIT_TRACING: Once = Once::new();

/// Initializes global tracing to stdout with the default filter.
pub fn init() {
    INIT_TRACING.call_once(|| {
        utils::init_tracing(None, None);
        tracing::info!("Ledger core tracing initialized.");
    });
}

/// Initializes global tracing using the configuration's `log_filter` and
/// optional `log_file`. A log file that cannot be opened falls back to stdout.
pub fn init_from_config(config: &Config) {
    INIT_TRACING.call_once(|| {
        let opened = config
            .log_file
            .as_ref()
            .map(|path| utils::CappedLogFile::open(path, config.log_file_max_bytes));
        let (log_file, open_error) = match opened {
            Some(Ok(file)) => (Some(file), None),
            Some(Err(err)) => (None, Some(err)),
            None => (None, None),
        };
        utils::init_tracing(config.log_filter.as_deref(), log_file);
        if let (Some(path), Some(err)) = (&config.log_file, open_error) {
            tracing::warn!(
                path = %path.display(),
                error = %err,
                "Log file unavailable, logging to stdout"
            );
        }
        tracing::info!("Ledger core tracing initialized.");
    });
}
