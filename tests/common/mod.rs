#![allow(dead_code)]

use std::{path::PathBuf, sync::Mutex};

use chrono::NaiveDate;
use ledger_core::{
    domain::{Account, AccountCategory, CompanyId, NewLine},
    Books, Config,
};
use once_cell::sync::Lazy;
use tempfile::TempDir;

/// Holds TempDir guards so temporary folders live for the duration of the test run.
static TEST_DIRS: Lazy<Mutex<Vec<TempDir>>> = Lazy::new(|| Mutex::new(Vec::new()));

/// A fresh data root that outlives the test.
pub fn data_root() -> PathBuf {
    let temp = TempDir::new().expect("create temp dir");
    let base = temp.path().join("books");
    TEST_DIRS.lock().expect("lock temp dir registry").push(temp);
    base
}

/// Books backed by an isolated data root.
pub fn setup_books() -> (Books, Config) {
    let config = Config::with_data_root(data_root());
    let books = Books::open(&config).expect("open books");
    (books, config)
}

pub fn date(month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, month, day).expect("valid date")
}

pub fn add_accounts(books: &Books, id: CompanyId, accounts: &[(&str, &str, AccountCategory)]) {
    for (code, name, category) in accounts {
        books
            .add_account(id, Account::new(*code, *name, *category))
            .expect("add account");
    }
}

/// Posts a two-line group: `debit` account debited, `credit` account credited.
pub fn post(books: &Books, id: CompanyId, debit: &str, credit: &str, amount: f64) -> u64 {
    let group = books.next_transaction_group(id).expect("next group");
    books
        .add_transaction_group(
            id,
            vec![
                NewLine::debit_entry(group, date(1, 15), debit, "", amount),
                NewLine::credit_entry(group, date(1, 15), credit, "", amount),
            ],
        )
        .expect("post transaction");
    group
}

/// The Acme company: CA101 credited and CL101 debited by 100 in group 1.
pub fn seed_acme(books: &Books) -> CompanyId {
    let id = books.create_company("Acme").expect("create Acme");
    add_accounts(
        books,
        id,
        &[
            ("CA101", "Cash", AccountCategory::Asset),
            ("CL101", "Loan", AccountCategory::Liabilities),
            ("CL102", "Overdraft", AccountCategory::Liabilities),
        ],
    );
    books
        .add_transaction_group(
            id,
            vec![
                NewLine::credit_entry(1, date(1, 2), "CA101", "Opening loan", 100.0),
                NewLine::debit_entry(1, date(1, 2), "CL101", "Opening loan", 100.0),
            ],
        )
        .expect("post Acme group 1");
    id
}
