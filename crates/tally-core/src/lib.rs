//! tally-core
//!
//! Business rules for the multi-tenant ledger: storage contracts, the
//! reconciliation primitive, validation, reports and carry-forward.
//! Depends on tally-domain. No filesystem access of its own.

pub mod account_service;
pub mod carry_forward;
pub mod error;
pub mod policy;
pub mod reconcile;
pub mod report_service;
pub mod storage;
pub mod transaction_service;
pub mod validation;

pub use account_service::{AccountReconcileSummary, AccountService};
pub use carry_forward::{CarryForward, CarryForwardOutcome, OPENING_GROUP};
pub use error::{CoreError, CoreResult};
pub use policy::LedgerPolicy;
pub use reconcile::{diff, ChangeSet, Reconcilable};
pub use report_service::{LedgerSnapshot, ReportService};
pub use storage::{
    AccountBatch, AccountStore, BatchOutcome, GroupSnapshot, LedgerStore, LineBatch,
    TenantRegistry, TenantStores,
};
pub use transaction_service::{ReconcileSummary, TransactionService};

#[cfg(test)]
mod memory;
#[cfg(test)]
mod tests;
