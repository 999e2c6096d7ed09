//! Starting a new company from an existing company's chart and P&L balances.
//!
//! The account clone and the opening balance are two separate writes to the
//! destination. When the second fails the destination is left with the
//! cloned chart and [`CarryForward::seed_opening_balance`] can retry it.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tally_domain::{to_cents, NewLine};
use tracing::{debug, info, warn};

use crate::{
    error::{CoreError, CoreResult},
    policy::LedgerPolicy,
    report_service::{LedgerSnapshot, ReportService},
    storage::{AccountBatch, TenantStores},
};

/// Group number reserved for the opening balance of a carried-forward company.
pub const OPENING_GROUP: u64 = 1;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CarryForwardOutcome {
    pub accounts_cloned: usize,
    pub opening_lines: usize,
}

pub struct CarryForward;

impl CarryForward {
    /// Clones every account of `source` into `destination`, then records the
    /// source's non-zero Profit & Loss balances as group 1 of `destination`.
    pub fn run(
        source: &TenantStores,
        destination: &TenantStores,
        policy: &LedgerPolicy,
        today: NaiveDate,
    ) -> CoreResult<CarryForwardOutcome> {
        ensure_distinct(source, destination)?;
        let snapshot = LedgerSnapshot::capture(&*source.ledger, &*source.accounts)?;

        let accounts_cloned = snapshot.accounts.len();
        destination.accounts.apply_batch(AccountBatch {
            insert: snapshot.accounts.clone(),
            ..AccountBatch::default()
        })?;
        info!(
            from = %source.company.name,
            to = %destination.company.name,
            accounts = accounts_cloned,
            "Chart of accounts cloned"
        );

        let lines = Self::opening_lines(&snapshot, policy, today);
        match record_opening(destination, lines) {
            Ok(opening_lines) => {
                info!(
                    to = %destination.company.name,
                    lines = opening_lines,
                    "Opening balance recorded"
                );
                Ok(CarryForwardOutcome {
                    accounts_cloned,
                    opening_lines,
                })
            }
            Err(reason) => {
                warn!(
                    to = %destination.company.name,
                    error = %reason,
                    "Opening balance not recorded after account clone"
                );
                Err(CoreError::PartialCarryForward {
                    accounts_cloned,
                    reason: Box::new(reason),
                })
            }
        }
    }

    /// Records the opening balance alone, for a destination whose chart is
    /// already in place. Refuses when group 1 already has lines.
    pub fn seed_opening_balance(
        source: &TenantStores,
        destination: &TenantStores,
        policy: &LedgerPolicy,
        today: NaiveDate,
    ) -> CoreResult<usize> {
        ensure_distinct(source, destination)?;
        let snapshot = LedgerSnapshot::capture(&*source.ledger, &*source.accounts)?;
        let lines = Self::opening_lines(&snapshot, policy, today);
        let recorded = record_opening(destination, lines)?;
        info!(to = %destination.company.name, lines = recorded, "Opening balance recorded");
        Ok(recorded)
    }

    /// One line per Profit & Loss account with a non-zero balance, on the
    /// side of that balance.
    pub fn opening_lines(
        snapshot: &LedgerSnapshot,
        policy: &LedgerPolicy,
        today: NaiveDate,
    ) -> Vec<NewLine> {
        let report = ReportService::profit_and_loss(snapshot);
        let mut carried: Vec<(String, f64)> = report
            .brought_down
            .rows
            .into_iter()
            .map(|row| (row.code, row.amount))
            .collect();
        if policy.roll_profit_into_carry_forward {
            match carried.first_mut() {
                Some((_, amount)) => *amount += report.final_profit,
                None => debug!("No Profit & Loss account to roll the period profit into"),
            }
        }

        let description = policy.carry_forward_description.as_str();
        carried
            .into_iter()
            .filter(|(_, amount)| to_cents(*amount) != 0)
            .map(|(code, amount)| {
                if amount > 0.0 {
                    NewLine::credit_entry(OPENING_GROUP, today, code, description, amount)
                } else {
                    NewLine::debit_entry(OPENING_GROUP, today, code, description, -amount)
                }
            })
            .collect()
    }
}

fn ensure_distinct(source: &TenantStores, destination: &TenantStores) -> CoreResult<()> {
    if source.company.id == destination.company.id {
        return Err(CoreError::InvalidOperation(
            "cannot carry a company forward into itself".into(),
        ));
    }
    Ok(())
}

/// Opening lines are a single-sided entry and skip the balance check.
fn record_opening(destination: &TenantStores, lines: Vec<NewLine>) -> CoreResult<usize> {
    if !destination.ledger.find_by_group(OPENING_GROUP)?.is_empty() {
        return Err(CoreError::GroupExists(OPENING_GROUP));
    }
    let chart = destination.accounts.list_accounts()?;
    if let Some(line) = lines
        .iter()
        .find(|line| !chart.iter().any(|account| account.code == line.account_code))
    {
        return Err(CoreError::UnknownAccount(line.account_code.clone()));
    }
    let count = lines.len();
    if count > 0 {
        destination.ledger.insert_lines(lines)?;
    }
    Ok(count)
}
