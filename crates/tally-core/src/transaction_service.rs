use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tally_domain::{LedgerLine, LineDraft, LineId, NewLine};
use tracing::{debug, info};

use crate::{
    error::{CoreError, CoreResult},
    policy::LedgerPolicy,
    reconcile,
    storage::{AccountStore, GroupSnapshot, LedgerStore, LineBatch},
    validation,
};

/// Counts of what a group reconciliation wrote.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcileSummary {
    pub inserted: Vec<LineId>,
    pub updated: usize,
    pub deleted: usize,
}

/// Writes transaction groups to a tenant's ledger store.
pub struct TransactionService;

impl TransactionService {
    /// Number to propose for the next transaction group.
    pub fn next_group(ledger: &dyn LedgerStore) -> CoreResult<u64> {
        Ok(ledger
            .last_transaction_group()?
            .map(|line| line.group + 1)
            .unwrap_or(1))
    }

    /// Validates and inserts a new balanced group of lines.
    pub fn add_group(
        ledger: &dyn LedgerStore,
        accounts: &dyn AccountStore,
        policy: &LedgerPolicy,
        lines: Vec<NewLine>,
    ) -> CoreResult<Vec<LineId>> {
        let group = match lines.first() {
            Some(line) => line.group,
            None => return Err(CoreError::MissingRequiredField("lines")),
        };
        if group == 0 {
            return Err(CoreError::InvalidOperation(
                "transaction groups are numbered from 1".into(),
            ));
        }
        if lines.iter().any(|line| line.group != group) {
            return Err(CoreError::InvalidOperation(
                "all lines of a transaction must share one group".into(),
            ));
        }

        let chart = accounts.list_accounts()?;
        let known: HashSet<&str> = chart.iter().map(|account| account.code.as_str()).collect();
        validation::validate_entries(&lines, &known, policy)?;

        let count = lines.len();
        let outcome = ledger.apply_batch(LineBatch {
            insert: lines,
            ..LineBatch::default()
        })?;
        info!(group, lines = count, "Transaction recorded");
        Ok(outcome.inserted)
    }

    /// Brings one stored group from `previous` to `desired` in a single batch.
    ///
    /// `previous` is the group as the caller loaded it; rows in `desired`
    /// carry the id they were loaded with, or none when newly added. The
    /// batch fails with `StaleGroup` if the stored group no longer matches
    /// `previous`.
    pub fn reconcile_group(
        ledger: &dyn LedgerStore,
        accounts: &dyn AccountStore,
        policy: &LedgerPolicy,
        group: u64,
        previous: &[LedgerLine],
        desired: Vec<LineDraft>,
    ) -> CoreResult<ReconcileSummary> {
        if let Some(stray) = previous.iter().find(|line| line.group != group) {
            return Err(CoreError::InvalidOperation(format!(
                "line {} belongs to group {}, not {group}",
                stray.id, stray.group
            )));
        }
        if previous.is_empty() && desired.is_empty() {
            return Err(CoreError::NoChange);
        }

        let chart = accounts.list_accounts()?;
        let known: HashSet<&str> = chart.iter().map(|account| account.code.as_str()).collect();
        validation::validate_entries(&desired, &known, policy)?;

        let changes = reconcile::diff(previous, desired);
        if changes.is_noop() {
            return Err(CoreError::NoChange);
        }
        debug!(
            group,
            added = changes.added.len(),
            modified = changes.modified.len(),
            deleted = changes.deleted.len(),
            "Reconciling transaction group"
        );

        let update = changes
            .modified
            .into_iter()
            .map(|(id, draft)| LedgerLine {
                id,
                group,
                date: draft.date,
                account_code: draft.account_code,
                description: draft.description,
                debit: draft.debit,
                credit: draft.credit,
            })
            .collect();
        let insert = changes
            .added
            .into_iter()
            .map(|draft| draft.into_new(group))
            .collect();
        let outcome = ledger.apply_batch(LineBatch {
            delete: changes.deleted,
            update,
            insert,
            expect: Some(GroupSnapshot {
                group,
                lines: previous.to_vec(),
            }),
        })?;

        info!(
            group,
            inserted = outcome.inserted.len(),
            updated = outcome.updated,
            deleted = outcome.deleted,
            "Transaction group reconciled"
        );
        Ok(ReconcileSummary {
            inserted: outcome.inserted,
            updated: outcome.updated,
            deleted: outcome.deleted,
        })
    }
}
