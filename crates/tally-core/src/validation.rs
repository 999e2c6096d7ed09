use std::collections::HashSet;

use tally_domain::{is_balanced, side_totals, to_cents, Account, LineDraft, NewLine, Sided};

use crate::{
    error::{CoreError, CoreResult},
    policy::LedgerPolicy,
};

/// A line-shaped value that references an account.
pub trait Entry: Sided {
    fn account_code(&self) -> &str;
}

impl Entry for NewLine {
    fn account_code(&self) -> &str {
        &self.account_code
    }
}

impl Entry for LineDraft {
    fn account_code(&self) -> &str {
        &self.account_code
    }
}

/// Checks required fields, amounts and account references of every entry,
/// then that the set balances. Line numbers in errors are 1-based.
pub fn validate_entries<T: Entry>(
    entries: &[T],
    known_codes: &HashSet<&str>,
    policy: &LedgerPolicy,
) -> CoreResult<()> {
    for (index, entry) in entries.iter().enumerate() {
        let line = index + 1;
        let code = entry.account_code();
        if code.trim().is_empty() {
            return Err(CoreError::MissingRequiredField("account_code"));
        }
        validate_amounts(line, entry.debit(), entry.credit(), policy)?;
        if !known_codes.contains(code) {
            return Err(CoreError::UnknownAccount(code.to_string()));
        }
    }
    ensure_balanced(entries)
}

fn validate_amounts(line: usize, debit: f64, credit: f64, policy: &LedgerPolicy) -> CoreResult<()> {
    for (side, amount) in [("debit", debit), ("credit", credit)] {
        if !amount.is_finite() {
            return Err(CoreError::InvalidAmount {
                line,
                reason: format!("{side} is not a finite number"),
            });
        }
        if amount < 0.0 {
            return Err(CoreError::InvalidAmount {
                line,
                reason: format!("{side} is negative"),
            });
        }
    }
    if policy.reject_two_sided_lines && (to_cents(debit) == 0) == (to_cents(credit) == 0) {
        return Err(CoreError::InvalidAmount {
            line,
            reason: "exactly one of debit or credit must be non-zero".into(),
        });
    }
    Ok(())
}

pub fn ensure_balanced<T: Sided>(entries: &[T]) -> CoreResult<()> {
    if is_balanced(entries) {
        return Ok(());
    }
    let (debit, credit) = side_totals(entries);
    Err(CoreError::UnbalancedEntry { debit, credit })
}

pub fn validate_account(account: &Account) -> CoreResult<()> {
    if account.code.trim().is_empty() {
        return Err(CoreError::MissingRequiredField("code"));
    }
    if account.name.trim().is_empty() {
        return Err(CoreError::MissingRequiredField("name"));
    }
    Ok(())
}

/// Fails on the first code that appears twice.
pub fn ensure_unique_codes<'a>(codes: impl IntoIterator<Item = &'a str>) -> CoreResult<()> {
    let mut seen = HashSet::new();
    for code in codes {
        if !seen.insert(code) {
            return Err(CoreError::DuplicateAccountCode(code.to_string()));
        }
    }
    Ok(())
}

/// Trimmed company name, rejecting blanks.
pub fn company_name(name: &str) -> CoreResult<&str> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(CoreError::MissingRequiredField("name"));
    }
    Ok(trimmed)
}
