//! tally-domain
//!
//! Pure bookkeeping models (Company, Account, LedgerLine, report shapes).
//! No I/O, no storage. Only data types and core enums.

pub mod account;
pub mod common;
pub mod company;
pub mod line;
pub mod report;

pub use account::*;
pub use common::*;
pub use company::*;
pub use line::*;
pub use report::*;
