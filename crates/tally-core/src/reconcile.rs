//! Diffing a previously loaded snapshot against a desired state.
//!
//! Used by both transaction-group edits and chart-of-accounts edits.

use std::collections::{HashMap, HashSet};
use std::hash::Hash;

use tally_domain::{Account, AccountDraft, LedgerLine, LineDraft, LineId};

/// A desired-state row that can be matched against a stored row.
pub trait Reconcilable {
    type Key: Eq + Hash + Clone;
    type Stored;

    /// The stored row this desired row was loaded from, if any.
    fn key(&self) -> Option<Self::Key>;
    fn stored_key(stored: &Self::Stored) -> Self::Key;
    fn differs_from(&self, stored: &Self::Stored) -> bool;
}

/// Partition of a desired state relative to a snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeSet<D, K> {
    pub added: Vec<D>,
    pub modified: Vec<(K, D)>,
    pub unchanged: Vec<(K, D)>,
    pub deleted: Vec<K>,
}

impl<D, K> ChangeSet<D, K> {
    pub fn is_noop(&self) -> bool {
        self.added.is_empty() && self.modified.is_empty() && self.deleted.is_empty()
    }
}

/// Rows without a key, or whose key is not in `previous`, are added. A key
/// that appears twice in `desired` only matches once; later copies are added.
/// Deleted keys keep the order of `previous`.
pub fn diff<D: Reconcilable>(previous: &[D::Stored], desired: Vec<D>) -> ChangeSet<D, D::Key> {
    let stored: HashMap<D::Key, &D::Stored> = previous
        .iter()
        .map(|row| (D::stored_key(row), row))
        .collect();
    let mut matched = HashSet::new();
    let mut changes = ChangeSet {
        added: Vec::new(),
        modified: Vec::new(),
        unchanged: Vec::new(),
        deleted: Vec::new(),
    };

    for row in desired {
        let found = row
            .key()
            .filter(|key| !matched.contains(key))
            .and_then(|key| stored.get(&key).map(|stored| (key, *stored)));
        match found {
            Some((key, stored)) => {
                matched.insert(key.clone());
                if row.differs_from(stored) {
                    changes.modified.push((key, row));
                } else {
                    changes.unchanged.push((key, row));
                }
            }
            None => changes.added.push(row),
        }
    }

    changes.deleted = previous
        .iter()
        .map(D::stored_key)
        .filter(|key| !matched.contains(key))
        .collect();
    changes
}

impl Reconcilable for LineDraft {
    type Key = LineId;
    type Stored = LedgerLine;

    fn key(&self) -> Option<LineId> {
        self.id
    }

    fn stored_key(stored: &LedgerLine) -> LineId {
        stored.id
    }

    fn differs_from(&self, stored: &LedgerLine) -> bool {
        !self.same_content(stored)
    }
}

impl Reconcilable for AccountDraft {
    type Key = String;
    type Stored = Account;

    fn key(&self) -> Option<String> {
        self.original_code.clone()
    }

    fn stored_key(stored: &Account) -> String {
        stored.code.clone()
    }

    fn differs_from(&self, stored: &Account) -> bool {
        self.code != stored.code || self.name != stored.name || self.category != stored.category
    }
}
