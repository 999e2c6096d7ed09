//! JSON-file stores for one company's ledger and chart of accounts.
//!
//! Both stores of a company share one lock, so writes to a tenant are
//! serialized while other tenants proceed independently.

use std::{
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};

use serde::{Deserialize, Serialize};
use tally_core::{
    storage::{plan_account_batch, plan_line_batch},
    AccountBatch, AccountStore, BatchOutcome, CoreError, LedgerStore, LineBatch,
};
use tally_domain::{Account, LedgerLine};
use tracing::debug;

use crate::files::{read_document, write_document, Versioned, SCHEMA_VERSION};

#[derive(Debug, Serialize, Deserialize)]
struct LedgerDocument {
    schema_version: u32,
    next_line_id: u64,
    #[serde(default)]
    lines: Vec<LedgerLine>,
}

impl Versioned for LedgerDocument {
    fn schema_version(&self) -> u32 {
        self.schema_version
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct AccountsDocument {
    schema_version: u32,
    #[serde(default)]
    accounts: Vec<Account>,
}

impl Versioned for AccountsDocument {
    fn schema_version(&self) -> u32 {
        self.schema_version
    }
}

/// Writes empty ledger and account documents for a new company.
pub(crate) fn initialize_stores(ledger: &Path, accounts: &Path) -> Result<(), CoreError> {
    write_document(
        ledger,
        &LedgerDocument {
            schema_version: SCHEMA_VERSION,
            next_line_id: 1,
            lines: Vec::new(),
        },
    )?;
    write_document(
        accounts,
        &AccountsDocument {
            schema_version: SCHEMA_VERSION,
            accounts: Vec::new(),
        },
    )
}

pub struct JsonLedgerStore {
    path: PathBuf,
    lock: Arc<Mutex<()>>,
}

impl JsonLedgerStore {
    pub(crate) fn new(path: PathBuf, lock: Arc<Mutex<()>>) -> Self {
        Self { path, lock }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl LedgerStore for JsonLedgerStore {
    fn list_lines(&self) -> Result<Vec<LedgerLine>, CoreError> {
        let _guard = self.lock.lock()?;
        let document: LedgerDocument = read_document(&self.path)?;
        Ok(document.lines)
    }

    fn apply_batch(&self, batch: LineBatch) -> Result<BatchOutcome, CoreError> {
        if batch.is_empty() {
            return Ok(BatchOutcome::default());
        }
        let _guard = self.lock.lock()?;
        let document: LedgerDocument = read_document(&self.path)?;
        let planned = plan_line_batch(&document.lines, document.next_line_id, batch)?;
        write_document(
            &self.path,
            &LedgerDocument {
                schema_version: SCHEMA_VERSION,
                next_line_id: planned.next_line_id,
                lines: planned.lines,
            },
        )?;
        debug!(
            path = %self.path.display(),
            inserted = planned.outcome.inserted.len(),
            updated = planned.outcome.updated,
            deleted = planned.outcome.deleted,
            "Ledger batch applied"
        );
        Ok(planned.outcome)
    }
}

pub struct JsonAccountStore {
    path: PathBuf,
    lock: Arc<Mutex<()>>,
}

impl JsonAccountStore {
    pub(crate) fn new(path: PathBuf, lock: Arc<Mutex<()>>) -> Self {
        Self { path, lock }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl AccountStore for JsonAccountStore {
    fn list_accounts(&self) -> Result<Vec<Account>, CoreError> {
        let _guard = self.lock.lock()?;
        let document: AccountsDocument = read_document(&self.path)?;
        let mut accounts = document.accounts;
        accounts.sort_by(|left, right| left.code.cmp(&right.code));
        Ok(accounts)
    }

    fn apply_batch(&self, batch: AccountBatch) -> Result<(), CoreError> {
        if batch.is_empty() {
            return Ok(());
        }
        let _guard = self.lock.lock()?;
        let document: AccountsDocument = read_document(&self.path)?;
        let counts = (batch.insert.len(), batch.update.len(), batch.delete.len());
        let accounts = plan_account_batch(&document.accounts, batch)?;
        write_document(
            &self.path,
            &AccountsDocument {
                schema_version: SCHEMA_VERSION,
                accounts,
            },
        )?;
        debug!(
            path = %self.path.display(),
            inserted = counts.0,
            updated = counts.1,
            deleted = counts.2,
            "Account batch applied"
        );
        Ok(())
    }
}

