use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::common::Sided;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Per-tenant sequence id assigned by the ledger store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LineId(pub u64);

impl fmt::Display for LineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A persisted debit-or-credit entry belonging to a transaction group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerLine {
    pub id: LineId,
    pub group: u64,
    pub date: NaiveDate,
    pub account_code: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub debit: f64,
    #[serde(default)]
    pub credit: f64,
}

impl LedgerLine {
    pub fn from_new(id: LineId, line: NewLine) -> Self {
        Self {
            id,
            group: line.group,
            date: line.date,
            account_code: line.account_code,
            description: line.description,
            debit: line.debit,
            credit: line.credit,
        }
    }

    /// Strips the id, e.g. to compare against what was inserted.
    pub fn to_new(&self) -> NewLine {
        NewLine {
            group: self.group,
            date: self.date,
            account_code: self.account_code.clone(),
            description: self.description.clone(),
            debit: self.debit,
            credit: self.credit,
        }
    }

    /// Copies every mutable field from `other`; id and group are kept.
    pub fn overwrite_with(&mut self, other: &LedgerLine) {
        self.date = other.date;
        self.account_code.clone_from(&other.account_code);
        self.description.clone_from(&other.description);
        self.debit = other.debit;
        self.credit = other.credit;
    }

    /// Exact match on group number and account code, substring match on
    /// description and ISO date. Case-insensitive.
    pub fn matches_search(&self, query: &str) -> bool {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return false;
        }
        if needle.parse::<u64>().ok() == Some(self.group) {
            return true;
        }
        if self.account_code.to_lowercase() == needle {
            return true;
        }
        self.description.to_lowercase().contains(&needle)
            || self.date.format(DATE_FORMAT).to_string().contains(&needle)
    }
}

impl Sided for LedgerLine {
    fn debit(&self) -> f64 {
        self.debit
    }

    fn credit(&self) -> f64 {
        self.credit
    }
}

/// A line that has not been persisted yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewLine {
    pub group: u64,
    pub date: NaiveDate,
    pub account_code: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub debit: f64,
    #[serde(default)]
    pub credit: f64,
}

impl NewLine {
    pub fn debit_entry(
        group: u64,
        date: NaiveDate,
        account_code: impl Into<String>,
        description: impl Into<String>,
        amount: f64,
    ) -> Self {
        Self {
            group,
            date,
            account_code: account_code.into(),
            description: description.into(),
            debit: amount,
            credit: 0.0,
        }
    }

    pub fn credit_entry(
        group: u64,
        date: NaiveDate,
        account_code: impl Into<String>,
        description: impl Into<String>,
        amount: f64,
    ) -> Self {
        Self {
            group,
            date,
            account_code: account_code.into(),
            description: description.into(),
            debit: 0.0,
            credit: amount,
        }
    }
}

impl Sided for NewLine {
    fn debit(&self) -> f64 {
        self.debit
    }

    fn credit(&self) -> f64 {
        self.credit
    }
}

/// One row of a user's desired state for a transaction group.
///
/// `id` is the persisted id for rows that were loaded from the store and
/// `None` for rows added during the edit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineDraft {
    #[serde(default)]
    pub id: Option<LineId>,
    pub date: NaiveDate,
    pub account_code: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub debit: f64,
    #[serde(default)]
    pub credit: f64,
}

impl LineDraft {
    pub fn new(
        date: NaiveDate,
        account_code: impl Into<String>,
        description: impl Into<String>,
        debit: f64,
        credit: f64,
    ) -> Self {
        Self {
            id: None,
            date,
            account_code: account_code.into(),
            description: description.into(),
            debit,
            credit,
        }
    }

    pub fn into_new(self, group: u64) -> NewLine {
        NewLine {
            group,
            date: self.date,
            account_code: self.account_code,
            description: self.description,
            debit: self.debit,
            credit: self.credit,
        }
    }

    /// Field-by-field comparison of everything a user can edit.
    pub fn same_content(&self, line: &LedgerLine) -> bool {
        self.date == line.date
            && self.account_code == line.account_code
            && self.description == line.description
            && self.debit == line.debit
            && self.credit == line.credit
    }
}

impl From<&LedgerLine> for LineDraft {
    fn from(line: &LedgerLine) -> Self {
        Self {
            id: Some(line.id),
            date: line.date,
            account_code: line.account_code.clone(),
            description: line.description.clone(),
            debit: line.debit,
            credit: line.credit,
        }
    }
}

impl Sided for LineDraft {
    fn debit(&self) -> f64 {
        self.debit
    }

    fn credit(&self) -> f64 {
        self.credit
    }
}
