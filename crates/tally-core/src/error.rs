use tally_domain::{CompanyId, LineId};
use thiserror::Error;

pub type CoreResult<T> = Result<T, CoreError>;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Company `{0}` already exists")]
    DuplicateName(String),
    #[error("Company not found: {0}")]
    CompanyNotFound(CompanyId),
    #[error("Account code `{0}` already exists")]
    DuplicateAccountCode(String),
    #[error("Account not found: {0}")]
    AccountNotFound(String),
    #[error("Unknown account code `{0}`")]
    UnknownAccount(String),
    #[error("Unbalanced entry: total debit {debit:.2} does not equal total credit {credit:.2}")]
    UnbalancedEntry { debit: f64, credit: f64 },
    #[error("No changes detected")]
    NoChange,
    #[error("Missing required field: {0}")]
    MissingRequiredField(&'static str),
    #[error("Invalid amount on line {line}: {reason}")]
    InvalidAmount { line: usize, reason: String },
    #[error("Ledger line not found: {0}")]
    LineNotFound(LineId),
    #[error("Transaction group {0} already exists")]
    GroupExists(u64),
    #[error("Transaction group {0} changed since it was loaded")]
    StaleGroup(u64),
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),
    #[error("Carry-forward incomplete: {accounts_cloned} accounts cloned, opening balance not recorded: {reason}")]
    PartialCarryForward {
        accounts_cloned: usize,
        reason: Box<CoreError>,
    },
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("Serialization error: {0}")]
    Serde(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CoreError {
    /// Input problems detected before any write; the caller can fix and retry.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            CoreError::DuplicateName(_)
                | CoreError::DuplicateAccountCode(_)
                | CoreError::UnknownAccount(_)
                | CoreError::UnbalancedEntry { .. }
                | CoreError::MissingRequiredField(_)
                | CoreError::InvalidAmount { .. }
        )
    }

    /// The informational "nothing to do" signal from reconciliation.
    pub fn is_no_change(&self) -> bool {
        matches!(self, CoreError::NoChange)
    }

    /// The stored data moved on under the caller; reload and retry.
    pub fn is_conflict(&self) -> bool {
        matches!(self, CoreError::StaleGroup(_))
    }

    /// Underlying persistence failures.
    pub fn is_storage(&self) -> bool {
        matches!(
            self,
            CoreError::Storage(_) | CoreError::Serde(_) | CoreError::Io(_)
        )
    }
}

impl<T> From<std::sync::PoisonError<T>> for CoreError {
    fn from(err: std::sync::PoisonError<T>) -> Self {
        CoreError::Storage(format!("lock poisoned: {err}"))
    }
}
