//! Storage contracts for the tenant registry and the per-tenant stores.
//!
//! Backends implement `list_*` and `apply_batch`; the remaining operations
//! have default implementations expressed as single-purpose batches. The
//! `plan_*` helpers compute a batch result in memory so every backend
//! shares the same all-or-nothing semantics.

use std::collections::HashSet;
use std::sync::Arc;

use tally_domain::{
    to_cents, Account, AccountChange, Company, CompanyId, LedgerLine, LineId, NewLine,
};

use crate::{
    error::{CoreError, CoreResult},
    validation,
};

/// Line mutations applied as one unit, in the order delete, update, insert.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LineBatch {
    pub delete: Vec<LineId>,
    /// Only date, account code, description and amounts are overwritten.
    pub update: Vec<LedgerLine>,
    pub insert: Vec<NewLine>,
    /// Checked against the stored ledger before anything is applied.
    pub expect: Option<GroupSnapshot>,
}

/// A transaction group as the caller last read it. A batch carrying one
/// is refused when the stored group differs, and must leave the group
/// balanced.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupSnapshot {
    pub group: u64,
    pub lines: Vec<LedgerLine>,
}

impl GroupSnapshot {
    fn matches(&self, stored: &[LedgerLine]) -> bool {
        let mut current: Vec<&LedgerLine> = stored
            .iter()
            .filter(|line| line.group == self.group)
            .collect();
        let mut expected: Vec<&LedgerLine> = self.lines.iter().collect();
        if current.len() != expected.len() {
            return false;
        }
        current.sort_by_key(|line| line.id);
        expected.sort_by_key(|line| line.id);
        current
            .iter()
            .zip(expected)
            .all(|(left, right)| same_line(left, right))
    }
}

fn same_line(left: &LedgerLine, right: &LedgerLine) -> bool {
    left.id == right.id
        && left.group == right.group
        && left.date == right.date
        && left.account_code == right.account_code
        && left.description == right.description
        && to_cents(left.debit) == to_cents(right.debit)
        && to_cents(left.credit) == to_cents(right.credit)
}

impl LineBatch {
    pub fn is_empty(&self) -> bool {
        self.delete.is_empty() && self.update.is_empty() && self.insert.is_empty()
    }
}

/// What a line batch actually did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchOutcome {
    pub inserted: Vec<LineId>,
    pub updated: usize,
    pub deleted: usize,
}

/// Account mutations applied as one unit, in the order delete, update, insert.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AccountBatch {
    pub delete: Vec<String>,
    pub update: Vec<AccountChange>,
    pub insert: Vec<Account>,
}

impl AccountBatch {
    pub fn is_empty(&self) -> bool {
        self.delete.is_empty() && self.update.is_empty() && self.insert.is_empty()
    }
}

pub trait LedgerStore: Send + Sync {
    /// Every line, ordered by id.
    fn list_lines(&self) -> CoreResult<Vec<LedgerLine>>;

    /// Applies the whole batch or nothing.
    fn apply_batch(&self, batch: LineBatch) -> CoreResult<BatchOutcome>;

    fn insert_lines(&self, lines: Vec<NewLine>) -> CoreResult<()> {
        self.apply_batch(LineBatch {
            insert: lines,
            ..LineBatch::default()
        })
        .map(|_| ())
    }

    fn update_lines(&self, lines: Vec<LedgerLine>) -> CoreResult<()> {
        self.apply_batch(LineBatch {
            update: lines,
            ..LineBatch::default()
        })
        .map(|_| ())
    }

    /// Unknown ids are ignored.
    fn delete_lines(&self, ids: &[LineId]) -> CoreResult<()> {
        self.apply_batch(LineBatch {
            delete: ids.to_vec(),
            ..LineBatch::default()
        })
        .map(|_| ())
    }

    /// A line of the highest-numbered transaction group, if any.
    fn last_transaction_group(&self) -> CoreResult<Option<LedgerLine>> {
        Ok(self
            .list_lines()?
            .into_iter()
            .max_by_key(|line| (line.group, line.id)))
    }

    /// All lines of one group, ordered by id.
    fn find_by_group(&self, group: u64) -> CoreResult<Vec<LedgerLine>> {
        Ok(self
            .list_lines()?
            .into_iter()
            .filter(|line| line.group == group)
            .collect())
    }

    /// Lines whose group, account code, description or date match `query`.
    /// A blank query matches nothing.
    fn find_by_code_or_text(&self, query: &str) -> CoreResult<Vec<LedgerLine>> {
        if query.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(self
            .list_lines()?
            .into_iter()
            .filter(|line| line.matches_search(query))
            .collect())
    }
}

pub trait AccountStore: Send + Sync {
    /// Every account, ordered by code.
    fn list_accounts(&self) -> CoreResult<Vec<Account>>;

    /// Applies the whole batch or nothing.
    fn apply_batch(&self, batch: AccountBatch) -> CoreResult<()>;

    fn insert_account(&self, account: Account) -> CoreResult<()> {
        self.apply_batch(AccountBatch {
            insert: vec![account],
            ..AccountBatch::default()
        })
    }

    fn update_accounts(&self, changes: Vec<AccountChange>) -> CoreResult<()> {
        self.apply_batch(AccountBatch {
            update: changes,
            ..AccountBatch::default()
        })
    }

    fn delete_account(&self, code: &str) -> CoreResult<()> {
        self.apply_batch(AccountBatch {
            delete: vec![code.to_string()],
            ..AccountBatch::default()
        })
    }
}

/// The two store handles of one tenant.
#[derive(Clone)]
pub struct TenantStores {
    pub company: Company,
    pub ledger: Arc<dyn LedgerStore>,
    pub accounts: Arc<dyn AccountStore>,
}

impl std::fmt::Debug for TenantStores {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TenantStores")
            .field("company", &self.company)
            .finish_non_exhaustive()
    }
}

pub trait TenantRegistry: Send + Sync {
    /// Registers a company and initializes both of its stores.
    fn create_company(&self, name: &str) -> CoreResult<CompanyId>;

    /// Every company, ordered by name.
    fn list_companies(&self) -> CoreResult<Vec<Company>>;

    fn find_company(&self, id: CompanyId) -> CoreResult<Company>;

    /// Opens (or returns cached) store handles for a company.
    fn resolve_stores(&self, id: CompanyId) -> CoreResult<TenantStores>;

    /// Removes the company from the registry, then its stores best-effort.
    fn delete_company(&self, id: CompanyId) -> CoreResult<()>;
}

/// Result of applying a line batch to an in-memory copy of a ledger.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedLines {
    pub lines: Vec<LedgerLine>,
    pub next_line_id: u64,
    pub outcome: BatchOutcome,
}

/// Applies `batch` to a copy of `lines`. Ids are taken from `next_line_id`
/// upwards and are never reused.
pub fn plan_line_batch(
    lines: &[LedgerLine],
    next_line_id: u64,
    batch: LineBatch,
) -> CoreResult<PlannedLines> {
    if let Some(expected) = &batch.expect {
        if !expected.matches(lines) {
            return Err(CoreError::StaleGroup(expected.group));
        }
    }
    let mut next_line_id = next_line_id.max(
        lines
            .iter()
            .map(|line| line.id.0 + 1)
            .max()
            .unwrap_or(1),
    );
    let delete: HashSet<LineId> = batch.delete.into_iter().collect();
    let mut working: Vec<LedgerLine> = lines
        .iter()
        .filter(|line| !delete.contains(&line.id))
        .cloned()
        .collect();
    let deleted = lines.len() - working.len();

    let updated = batch.update.len();
    for replacement in batch.update {
        let slot = working
            .iter_mut()
            .find(|line| line.id == replacement.id)
            .ok_or(CoreError::LineNotFound(replacement.id))?;
        slot.overwrite_with(&replacement);
    }

    let mut inserted = Vec::with_capacity(batch.insert.len());
    for line in batch.insert {
        let id = LineId(next_line_id);
        next_line_id += 1;
        inserted.push(id);
        working.push(LedgerLine::from_new(id, line));
    }

    if let Some(expected) = &batch.expect {
        let group: Vec<LedgerLine> = working
            .iter()
            .filter(|line| line.group == expected.group)
            .cloned()
            .collect();
        validation::ensure_balanced(&group)?;
    }

    Ok(PlannedLines {
        lines: working,
        next_line_id,
        outcome: BatchOutcome {
            inserted,
            updated,
            deleted,
        },
    })
}

/// Applies `batch` to a copy of `accounts`, keeping codes unique.
pub fn plan_account_batch(accounts: &[Account], batch: AccountBatch) -> CoreResult<Vec<Account>> {
    let mut working = accounts.to_vec();
    for code in &batch.delete {
        let index = working
            .iter()
            .position(|account| &account.code == code)
            .ok_or_else(|| CoreError::AccountNotFound(code.clone()))?;
        working.remove(index);
    }

    let mut touched = HashSet::new();
    for change in batch.update {
        if !touched.insert(change.code.clone()) {
            return Err(CoreError::InvalidOperation(format!(
                "account `{}` updated twice in one batch",
                change.code
            )));
        }
        let slot = working
            .iter_mut()
            .find(|account| account.code == change.code)
            .ok_or_else(|| CoreError::AccountNotFound(change.code.clone()))?;
        *slot = change.account;
    }
    working.extend(batch.insert);

    let mut seen = HashSet::new();
    for account in &working {
        if !seen.insert(account.code.as_str()) {
            return Err(CoreError::DuplicateAccountCode(account.code.clone()));
        }
    }
    working.sort_by(|left, right| left.code.cmp(&right.code));
    Ok(working)
}
