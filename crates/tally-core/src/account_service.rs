use serde::{Deserialize, Serialize};
use tally_domain::{Account, AccountChange, AccountDraft};
use tracing::{debug, info};

use crate::{
    error::{CoreError, CoreResult},
    reconcile,
    storage::{AccountBatch, AccountStore},
    validation,
};

/// Counts of what a chart-of-accounts reconciliation wrote.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountReconcileSummary {
    pub inserted: usize,
    pub updated: usize,
    pub deleted: usize,
}

/// Maintains a tenant's chart of accounts.
pub struct AccountService;

impl AccountService {
    pub fn add(accounts: &dyn AccountStore, account: Account) -> CoreResult<()> {
        validation::validate_account(&account)?;
        let code = account.code.clone();
        accounts.insert_account(account)?;
        info!(code = %code, "Account added");
        Ok(())
    }

    /// Deleting an account that ledger lines still reference is allowed;
    /// those lines surface as orphans in ledger warnings.
    pub fn delete(accounts: &dyn AccountStore, code: &str) -> CoreResult<()> {
        accounts.delete_account(code)?;
        info!(code, "Account deleted");
        Ok(())
    }

    pub fn update(accounts: &dyn AccountStore, changes: Vec<AccountChange>) -> CoreResult<()> {
        for change in &changes {
            validation::validate_account(&change.account)?;
        }
        let count = changes.len();
        accounts.update_accounts(changes)?;
        debug!(count, "Accounts updated");
        Ok(())
    }

    /// Brings the chart from `previous` to `desired` in a single batch.
    /// Rows are matched on the code they were loaded under.
    pub fn reconcile(
        accounts: &dyn AccountStore,
        previous: &[Account],
        desired: Vec<AccountDraft>,
    ) -> CoreResult<AccountReconcileSummary> {
        for draft in &desired {
            if draft.code.trim().is_empty() {
                return Err(CoreError::MissingRequiredField("code"));
            }
            if draft.name.trim().is_empty() {
                return Err(CoreError::MissingRequiredField("name"));
            }
        }
        validation::ensure_unique_codes(desired.iter().map(|draft| draft.code.as_str()))?;

        let changes = reconcile::diff(previous, desired);
        if changes.is_noop() {
            return Err(CoreError::NoChange);
        }

        let summary = AccountReconcileSummary {
            inserted: changes.added.len(),
            updated: changes.modified.len(),
            deleted: changes.deleted.len(),
        };
        let update = changes
            .modified
            .into_iter()
            .map(|(code, draft)| AccountChange {
                code,
                account: draft.into_account(),
            })
            .collect();
        let insert = changes
            .added
            .into_iter()
            .map(AccountDraft::into_account)
            .collect();
        accounts.apply_batch(AccountBatch {
            delete: changes.deleted,
            update,
            insert,
        })?;

        info!(
            inserted = summary.inserted,
            updated = summary.updated,
            deleted = summary.deleted,
            "Chart of accounts reconciled"
        );
        Ok(summary)
    }
}
