use chrono::NaiveDate;
use tally_domain::{
    Account, AccountCategory, AccountChange, AccountDraft, LineDraft, LineId, NewLine,
};

use crate::{
    memory::{tenant, MemoryTenant},
    storage::{AccountStore, LedgerStore},
    AccountService, CarryForward, CoreError, LedgerPolicy, LedgerSnapshot, ReportService,
    TransactionService,
};

fn date(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 4, day).unwrap()
}

fn snapshot(tenant: &MemoryTenant) -> LedgerSnapshot {
    LedgerSnapshot::capture(&*tenant.stores.ledger, &*tenant.stores.accounts).unwrap()
}

fn open_accounts(tenant: &MemoryTenant, accounts: &[(&str, &str, AccountCategory)]) {
    for (code, name, category) in accounts {
        AccountService::add(&*tenant.stores.accounts, Account::new(*code, *name, *category))
            .unwrap();
    }
}

fn post(tenant: &MemoryTenant, group: u64, debit: (&str, f64), credit: (&str, f64)) {
    TransactionService::add_group(
        &*tenant.stores.ledger,
        &*tenant.stores.accounts,
        &LedgerPolicy::default(),
        vec![
            NewLine::debit_entry(group, date(group as u32), debit.0, "", debit.1),
            NewLine::credit_entry(group, date(group as u32), credit.0, "", credit.1),
        ],
    )
    .unwrap();
}

fn acme() -> MemoryTenant {
    let acme = tenant("Acme");
    open_accounts(
        &acme,
        &[
            ("CA101", "Cash", AccountCategory::Asset),
            ("CL101", "Loan", AccountCategory::Liabilities),
            ("CL102", "Overdraft", AccountCategory::Liabilities),
        ],
    );
    TransactionService::add_group(
        &*acme.stores.ledger,
        &*acme.stores.accounts,
        &LedgerPolicy::default(),
        vec![
            NewLine::credit_entry(1, date(1), "CA101", "", 100.0),
            NewLine::debit_entry(1, date(1), "CL101", "", 100.0),
        ],
    )
    .unwrap();
    acme
}

/// A trading company with capital, a depreciating asset and a P&L balance.
fn trading_company() -> MemoryTenant {
    let company = tenant("Trading");
    open_accounts(
        &company,
        &[
            ("EQ1", "Share capital", AccountCategory::Equity),
            ("BANK", "Bank", AccountCategory::Asset),
            ("FA101", "Van", AccountCategory::FixedAsset),
            ("DEPFA101", "Van depreciation", AccountCategory::AccumulatedDepreciation),
            ("S1", "Sales", AccountCategory::Sales),
            ("COS1", "Purchases", AccountCategory::CostOfSale),
            ("EX1", "Running costs", AccountCategory::Expense),
            ("PL1", "Retained profit", AccountCategory::ProfitAndLoss),
            ("CR1", "Supplier", AccountCategory::Creditor),
        ],
    );
    post(&company, 1, ("BANK", 10_000.0), ("EQ1", 10_000.0));
    post(&company, 2, ("FA101", 3_000.0), ("BANK", 3_000.0));
    post(&company, 3, ("BANK", 5_000.0), ("S1", 5_000.0));
    post(&company, 4, ("COS1", 2_000.0), ("BANK", 2_000.0));
    post(&company, 5, ("EX1", 500.0), ("CR1", 500.0));
    post(&company, 6, ("EX1", 600.0), ("DEPFA101", 600.0));
    post(&company, 7, ("EQ1", 1_000.0), ("PL1", 1_000.0));
    company
}

#[test]
fn acme_balances_follow_credit_positive_convention() {
    let acme = acme();
    let snapshot = snapshot(&acme);
    assert_eq!(ReportService::account_balance(&snapshot, "CA101"), 100.0);
    assert_eq!(ReportService::account_balance(&snapshot, "CL101"), -100.0);
    assert_eq!(ReportService::account_balance(&snapshot, "NOPE"), 0.0);

    let trial = ReportService::trial_balance(&snapshot);
    assert_eq!(trial.difference(), 0.0);
    assert_eq!(trial.total_debit, 100.0);
    assert_eq!(trial.sections[0].category, AccountCategory::Asset);
    assert_eq!(trial.sections[0].rows[0].credit, 100.0);
    assert!(ReportService::balance_sheet(&snapshot, &Default::default()).is_balanced());
}

#[test]
fn acme_reconcile_swaps_one_line() {
    let acme = acme();
    let previous = acme.stores.ledger.find_by_group(1).unwrap();
    let mut desired: Vec<LineDraft> = previous
        .iter()
        .filter(|line| line.account_code != "CL101")
        .map(LineDraft::from)
        .collect();
    desired.push(LineDraft::new(date(2), "CL102", "Moved", 100.0, 0.0));

    let summary = TransactionService::reconcile_group(
        &*acme.stores.ledger,
        &*acme.stores.accounts,
        &LedgerPolicy::default(),
        1,
        &previous,
        desired,
    )
    .unwrap();
    assert_eq!(summary.deleted, 1);
    assert_eq!(summary.inserted.len(), 1);
    assert_eq!(summary.updated, 0);

    let group = acme.stores.ledger.find_by_group(1).unwrap();
    assert_eq!(group.len(), 2);
    assert!(tally_domain::is_balanced(&group));
    assert!(group.iter().all(|line| line.account_code != "CL101"));
}

#[test]
fn reconcile_twice_reports_no_change() {
    let acme = acme();
    let previous = acme.stores.ledger.find_by_group(1).unwrap();
    let mut desired: Vec<LineDraft> = previous.iter().map(LineDraft::from).collect();
    desired[0].description = "Corrected".into();

    let policy = LedgerPolicy::default();
    let summary = TransactionService::reconcile_group(
        &*acme.stores.ledger,
        &*acme.stores.accounts,
        &policy,
        1,
        &previous,
        desired.clone(),
    )
    .unwrap();
    assert_eq!(summary.updated, 1);

    let refreshed = acme.stores.ledger.find_by_group(1).unwrap();
    let err = TransactionService::reconcile_group(
        &*acme.stores.ledger,
        &*acme.stores.accounts,
        &policy,
        1,
        &refreshed,
        desired,
    )
    .unwrap_err();
    assert!(err.is_no_change());
}

#[test]
fn unbalanced_reconcile_writes_nothing() {
    let acme = acme();
    let before = acme.stores.ledger.list_lines().unwrap();
    let mut desired: Vec<LineDraft> = before.iter().map(LineDraft::from).collect();
    desired[0].credit = 90.0;

    let err = TransactionService::reconcile_group(
        &*acme.stores.ledger,
        &*acme.stores.accounts,
        &LedgerPolicy::default(),
        1,
        &before,
        desired,
    )
    .unwrap_err();
    assert!(matches!(err, CoreError::UnbalancedEntry { .. }));
    assert!(err.is_validation());
    assert_eq!(acme.stores.ledger.list_lines().unwrap(), before);
}

#[test]
fn reconcile_to_empty_deletes_the_group() {
    let acme = acme();
    let previous = acme.stores.ledger.find_by_group(1).unwrap();
    let summary = TransactionService::reconcile_group(
        &*acme.stores.ledger,
        &*acme.stores.accounts,
        &LedgerPolicy::default(),
        1,
        &previous,
        Vec::new(),
    )
    .unwrap();
    assert_eq!(summary.deleted, 2);
    assert!(acme.stores.ledger.list_lines().unwrap().is_empty());
    assert_eq!(TransactionService::next_group(&*acme.stores.ledger).unwrap(), 1);
}

#[test]
fn reconcile_rejects_snapshot_from_another_group() {
    let acme = acme();
    let previous = acme.stores.ledger.find_by_group(1).unwrap();
    let err = TransactionService::reconcile_group(
        &*acme.stores.ledger,
        &*acme.stores.accounts,
        &LedgerPolicy::default(),
        2,
        &previous,
        Vec::new(),
    )
    .unwrap_err();
    assert!(matches!(err, CoreError::InvalidOperation(_)));
}

#[test]
fn reconcile_from_outdated_lines_is_refused() {
    let acme = acme();
    let policy = LedgerPolicy::default();
    let loaded = acme.stores.ledger.find_by_group(1).unwrap();

    let doubled: Vec<LineDraft> = loaded
        .iter()
        .map(|line| {
            let mut draft = LineDraft::from(line);
            draft.debit *= 2.0;
            draft.credit *= 2.0;
            draft
        })
        .collect();
    TransactionService::reconcile_group(
        &*acme.stores.ledger,
        &*acme.stores.accounts,
        &policy,
        1,
        &loaded,
        doubled,
    )
    .unwrap();
    let current = acme.stores.ledger.find_by_group(1).unwrap();

    let mut swapped: Vec<LineDraft> = loaded
        .iter()
        .filter(|line| line.account_code != "CL101")
        .map(LineDraft::from)
        .collect();
    swapped.push(LineDraft::new(date(2), "CL102", "", 100.0, 0.0));
    let err = TransactionService::reconcile_group(
        &*acme.stores.ledger,
        &*acme.stores.accounts,
        &policy,
        1,
        &loaded,
        swapped,
    )
    .unwrap_err();
    assert!(matches!(err, CoreError::StaleGroup(1)));
    assert!(err.is_conflict());

    let stored = acme.stores.ledger.find_by_group(1).unwrap();
    assert_eq!(stored, current);
    assert!(tally_domain::is_balanced(&stored));
    assert_eq!(tally_domain::side_totals(&stored), (200.0, 200.0));
}

#[test]
fn reconcile_from_partial_lines_is_refused() {
    let acme = acme();
    let loaded = acme.stores.ledger.find_by_group(1).unwrap();
    let partial: Vec<_> = loaded
        .iter()
        .filter(|line| line.account_code == "CA101")
        .cloned()
        .collect();
    let mut desired = vec![LineDraft::from(&partial[0])];
    desired[0].description = "Only half".into();
    desired.push(LineDraft::new(date(1), "CL102", "", 100.0, 0.0));

    let err = TransactionService::reconcile_group(
        &*acme.stores.ledger,
        &*acme.stores.accounts,
        &LedgerPolicy::default(),
        1,
        &partial,
        desired,
    )
    .unwrap_err();
    assert!(matches!(err, CoreError::StaleGroup(1)));
    assert_eq!(acme.stores.ledger.find_by_group(1).unwrap(), loaded);
}

#[test]
fn update_lines_rewrites_several_lines_at_once() {
    let acme = acme();
    let mut lines = acme.stores.ledger.find_by_group(1).unwrap();
    for line in &mut lines {
        line.date = date(9);
        line.description = "Revised".into();
        line.group = 42;
    }
    lines[1].account_code = "CL102".into();

    acme.stores.ledger.update_lines(lines.clone()).unwrap();

    let stored = acme.stores.ledger.list_lines().unwrap();
    assert_eq!(stored.len(), 2);
    assert!(stored.iter().all(|line| line.group == 1));
    assert!(stored.iter().all(|line| line.date == date(9)));
    assert!(stored.iter().all(|line| line.description == "Revised"));
    assert_eq!(stored[1].account_code, "CL102");
    assert!(acme.stores.ledger.find_by_group(42).unwrap().is_empty());
}

#[test]
fn update_lines_with_unknown_id_changes_nothing() {
    let acme = acme();
    let before = acme.stores.ledger.list_lines().unwrap();
    let mut edited = before[0].clone();
    edited.description = "Should not land".into();
    let mut missing = before[1].clone();
    missing.id = LineId(99);

    let err = acme
        .stores
        .ledger
        .update_lines(vec![edited, missing])
        .unwrap_err();
    assert!(matches!(err, CoreError::LineNotFound(LineId(99))));
    assert_eq!(acme.stores.ledger.list_lines().unwrap(), before);
}

#[test]
fn update_accounts_renames_and_recategorizes_by_code() {
    let acme = acme();
    AccountService::update(
        &*acme.stores.accounts,
        vec![
            AccountChange {
                code: "CL101".into(),
                account: Account::new("CL101", "Bank loan", AccountCategory::Creditor),
            },
            AccountChange {
                code: "CL102".into(),
                account: Account::new("CL102", "Overdraft facility", AccountCategory::Liabilities),
            },
        ],
    )
    .unwrap();

    let chart = acme.stores.accounts.list_accounts().unwrap();
    assert_eq!(chart[1], Account::new("CL101", "Bank loan", AccountCategory::Creditor));
    assert_eq!(chart[2].name, "Overdraft facility");
    assert_eq!(chart[0].name, "Cash");

    let err = AccountService::update(
        &*acme.stores.accounts,
        vec![
            AccountChange {
                code: "CA101".into(),
                account: Account::new("CA101", "Petty cash", AccountCategory::Asset),
            },
            AccountChange {
                code: "XX1".into(),
                account: Account::new("XX1", "Ghost", AccountCategory::Asset),
            },
        ],
    )
    .unwrap_err();
    assert!(matches!(err, CoreError::AccountNotFound(code) if code == "XX1"));
    assert_eq!(acme.stores.accounts.list_accounts().unwrap(), chart);

    let err = AccountService::update(
        &*acme.stores.accounts,
        vec![AccountChange {
            code: "CA101".into(),
            account: Account::new("CA101", " ", AccountCategory::Asset),
        }],
    )
    .unwrap_err();
    assert!(matches!(err, CoreError::MissingRequiredField("name")));
}

#[test]
fn add_group_rejects_unknown_account_without_writing() {
    let acme = acme();
    let err = TransactionService::add_group(
        &*acme.stores.ledger,
        &*acme.stores.accounts,
        &LedgerPolicy::default(),
        vec![
            NewLine::debit_entry(2, date(3), "CA101", "", 5.0),
            NewLine::credit_entry(2, date(3), "ZZZ", "", 5.0),
        ],
    )
    .unwrap_err();
    assert!(matches!(err, CoreError::UnknownAccount(code) if code == "ZZZ"));
    assert_eq!(acme.stores.ledger.list_lines().unwrap().len(), 2);
    assert_eq!(TransactionService::next_group(&*acme.stores.ledger).unwrap(), 2);

    let err = TransactionService::add_group(
        &*acme.stores.ledger,
        &*acme.stores.accounts,
        &LedgerPolicy::default(),
        Vec::new(),
    )
    .unwrap_err();
    assert!(matches!(err, CoreError::MissingRequiredField("lines")));
}

#[test]
fn profit_and_loss_of_trading_company() {
    let company = trading_company();
    let report = ReportService::profit_and_loss(&snapshot(&company));
    assert_eq!(report.sales.total, 5_000.0);
    assert_eq!(report.cost_of_sales.total, -2_000.0);
    assert_eq!(report.gross_profit, 3_000.0);
    assert_eq!(report.expenses.total, -1_100.0);
    assert_eq!(report.final_profit, 1_900.0);
    assert_eq!(report.brought_down.total, 1_000.0);
    assert_eq!(report.carried_forward, 2_900.0);
}

#[test]
fn balance_sheet_of_trading_company_balances() {
    let company = trading_company();
    let sheet = ReportService::balance_sheet(&snapshot(&company), &Default::default());
    assert_eq!(sheet.fixed_assets.rows.len(), 1);
    assert_eq!(sheet.net_fixed_assets, 2_400.0);
    assert_eq!(sheet.current_assets.total, 10_000.0);
    assert_eq!(sheet.current_liabilities.total, 500.0);
    assert_eq!(sheet.net_current_assets, 9_500.0);
    assert_eq!(sheet.share_capital.total, 9_000.0);
    assert_eq!(sheet.profit_and_loss.total, 2_900.0);
    assert_eq!(sheet.capital, 11_900.0);
    assert!(sheet.is_balanced());

    let trial = ReportService::trial_balance(&snapshot(&company));
    assert_eq!(trial.total_debit, 16_100.0);
    assert!(trial.is_balanced());
}

#[test]
fn unmatched_depreciation_is_still_deducted() {
    let company = trading_company();
    AccountService::add(
        &*company.stores.accounts,
        Account::new("ADMISC", "Misc depreciation", AccountCategory::AccumulatedDepreciation),
    )
    .unwrap();
    post(&company, 8, ("EX1", 100.0), ("ADMISC", 100.0));

    let sheet = ReportService::balance_sheet(&snapshot(&company), &Default::default());
    assert_eq!(sheet.fixed_assets.rows.len(), 2);
    assert_eq!(sheet.fixed_assets.rows[1].amount, -100.0);
    assert_eq!(sheet.net_fixed_assets, 2_300.0);
    assert!(sheet.is_balanced());
}

#[test]
fn warnings_flag_orphans_and_unbalanced_groups() {
    let acme = acme();
    assert!(ReportService::ledger_warnings(&snapshot(&acme)).is_empty());

    AccountService::delete(&*acme.stores.accounts, "CL101").unwrap();
    acme.stores
        .ledger
        .insert_lines(vec![NewLine::debit_entry(2, date(4), "CA101", "", 1.0)])
        .unwrap();

    let warnings = ReportService::ledger_warnings(&snapshot(&acme));
    assert!(warnings.iter().any(|w| w.contains("unknown account `CL101`")));
    assert!(warnings.iter().any(|w| w.contains("Transaction 2 is unbalanced")));
    assert!(warnings.iter().any(|w| w.starts_with("Trial balance is off")));
}

#[test]
fn chart_reconcile_renames_rekeys_and_deletes() {
    let acme = acme();
    let previous = acme.stores.accounts.list_accounts().unwrap();
    let mut desired: Vec<AccountDraft> = previous
        .iter()
        .filter(|account| account.code != "CL102")
        .map(AccountDraft::from)
        .collect();
    desired[0].name = "Petty cash".into();
    desired[1].code = "CL200".into();
    desired.push(AccountDraft::new("EQ1", "Capital", AccountCategory::Equity));

    let summary =
        AccountService::reconcile(&*acme.stores.accounts, &previous, desired).unwrap();
    assert_eq!(summary.inserted, 1);
    assert_eq!(summary.updated, 2);
    assert_eq!(summary.deleted, 1);

    let codes: Vec<String> = acme
        .stores
        .accounts
        .list_accounts()
        .unwrap()
        .into_iter()
        .map(|account| account.code)
        .collect();
    assert_eq!(codes, vec!["CA101", "CL200", "EQ1"]);
}

#[test]
fn chart_reconcile_rejects_duplicates_and_reports_no_change() {
    let acme = acme();
    let previous = acme.stores.accounts.list_accounts().unwrap();
    let mut desired: Vec<AccountDraft> = previous.iter().map(AccountDraft::from).collect();
    assert!(
        AccountService::reconcile(&*acme.stores.accounts, &previous, desired.clone())
            .unwrap_err()
            .is_no_change()
    );

    desired.push(AccountDraft::new("CA101", "Second cash", AccountCategory::Asset));
    let err = AccountService::reconcile(&*acme.stores.accounts, &previous, desired).unwrap_err();
    assert!(matches!(err, CoreError::DuplicateAccountCode(code) if code == "CA101"));
    assert_eq!(acme.stores.accounts.list_accounts().unwrap(), previous);
}

#[test]
fn carry_forward_clones_chart_and_pl_balance() {
    let source = trading_company();
    let destination = tenant("Trading 2025");
    let outcome = CarryForward::run(
        &source.stores,
        &destination.stores,
        &LedgerPolicy::default(),
        date(30),
    )
    .unwrap();
    assert_eq!(outcome.accounts_cloned, 9);
    assert_eq!(outcome.opening_lines, 1);

    let lines = destination.stores.ledger.find_by_group(1).unwrap();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].account_code, "PL1");
    assert_eq!(lines[0].credit, 1_000.0);
    assert_eq!(lines[0].date, date(30));
    assert_eq!(lines[0].description, "Balance brought forward");
    assert_eq!(
        destination.stores.accounts.list_accounts().unwrap(),
        source.stores.accounts.list_accounts().unwrap()
    );
}

#[test]
fn carry_forward_can_roll_period_profit() {
    let source = trading_company();
    let destination = tenant("Trading 2025");
    let policy = LedgerPolicy {
        roll_profit_into_carry_forward: true,
        ..LedgerPolicy::default()
    };
    CarryForward::run(&source.stores, &destination.stores, &policy, date(30)).unwrap();
    let lines = destination.stores.ledger.list_lines().unwrap();
    assert_eq!(lines[0].credit, 2_900.0);
}

#[test]
fn carry_forward_without_activity_records_no_lines() {
    let source = tenant("Dormant");
    open_accounts(&source, &[("PL1", "Retained", AccountCategory::ProfitAndLoss)]);
    let destination = tenant("Dormant 2025");
    let outcome = CarryForward::run(
        &source.stores,
        &destination.stores,
        &LedgerPolicy::default(),
        date(30),
    )
    .unwrap();
    assert_eq!(outcome.accounts_cloned, 1);
    assert_eq!(outcome.opening_lines, 0);
    assert!(destination.stores.ledger.list_lines().unwrap().is_empty());
}

#[test]
fn carry_forward_into_itself_is_refused() {
    let source = trading_company();
    let err = CarryForward::run(
        &source.stores,
        &source.stores,
        &LedgerPolicy::default(),
        date(30),
    )
    .unwrap_err();
    assert!(matches!(err, CoreError::InvalidOperation(_)));
}

#[test]
fn carry_forward_aborts_when_a_code_already_exists() {
    let source = trading_company();
    let destination = tenant("Trading 2025");
    open_accounts(&destination, &[("BANK", "Other bank", AccountCategory::Asset)]);

    let err = CarryForward::run(
        &source.stores,
        &destination.stores,
        &LedgerPolicy::default(),
        date(30),
    )
    .unwrap_err();
    assert!(matches!(err, CoreError::DuplicateAccountCode(code) if code == "BANK"));
    assert_eq!(destination.stores.accounts.list_accounts().unwrap().len(), 1);
    assert!(destination.stores.ledger.list_lines().unwrap().is_empty());
}

#[test]
fn partial_carry_forward_can_be_completed() {
    let source = trading_company();
    let destination = tenant("Trading 2025");
    *destination.ledger.fail_writes.lock().unwrap() = true;

    let err = CarryForward::run(
        &source.stores,
        &destination.stores,
        &LedgerPolicy::default(),
        date(30),
    )
    .unwrap_err();
    match err {
        CoreError::PartialCarryForward {
            accounts_cloned,
            reason,
        } => {
            assert_eq!(accounts_cloned, 9);
            assert!(reason.is_storage());
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(destination.accounts.list_accounts().unwrap().len(), 9);

    *destination.ledger.fail_writes.lock().unwrap() = false;
    let recorded = CarryForward::seed_opening_balance(
        &source.stores,
        &destination.stores,
        &LedgerPolicy::default(),
        date(30),
    )
    .unwrap();
    assert_eq!(recorded, 1);

    let err = CarryForward::seed_opening_balance(
        &source.stores,
        &destination.stores,
        &LedgerPolicy::default(),
        date(30),
    )
    .unwrap_err();
    assert!(matches!(err, CoreError::GroupExists(1)));
}
