//! Aggregation over one tenant's accounts and ledger lines.
//!
//! Every report is computed from a [`LedgerSnapshot`] so a single report
//! never mixes two store states.

use std::collections::{BTreeMap, HashMap, HashSet};

use tally_domain::{
    amounts_equal, round_cents, to_cents, Account, AccountBalance, AccountCategory, BalanceSheet,
    DepreciationRule, LedgerLine, ProfitAndLoss, ReportRow, ReportSection, TrialBalance,
    TrialBalanceRow, TrialBalanceSection,
};

use crate::{
    error::CoreResult,
    storage::{AccountStore, LedgerStore},
};

const CURRENT_PROFIT_LABEL: &str = "Current period profit";

/// Accounts and lines read together for reporting.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LedgerSnapshot {
    pub accounts: Vec<Account>,
    pub lines: Vec<LedgerLine>,
}

impl LedgerSnapshot {
    pub fn capture(ledger: &dyn LedgerStore, accounts: &dyn AccountStore) -> CoreResult<Self> {
        let mut accounts = accounts.list_accounts()?;
        accounts.sort_by(|left, right| left.code.cmp(&right.code));
        Ok(Self {
            accounts,
            lines: ledger.list_lines()?,
        })
    }

    /// `(total_debit, total_credit)` per referenced account code.
    fn side_totals_by_code(&self) -> HashMap<&str, (f64, f64)> {
        let mut totals: HashMap<&str, (f64, f64)> = HashMap::new();
        for line in &self.lines {
            let entry = totals.entry(line.account_code.as_str()).or_default();
            entry.0 += line.debit;
            entry.1 += line.credit;
        }
        totals
    }

    fn accounts_in(&self, category: AccountCategory) -> impl Iterator<Item = &Account> {
        self.accounts
            .iter()
            .filter(move |account| account.category == category)
    }
}

pub struct ReportService;

impl ReportService {
    /// Net credit-positive balance of one code. Zero when nothing references it.
    pub fn account_balance(snapshot: &LedgerSnapshot, code: &str) -> f64 {
        snapshot
            .lines
            .iter()
            .filter(|line| line.account_code == code)
            .map(|line| line.credit - line.debit)
            .sum()
    }

    /// Totals for every account in the chart, ordered by code.
    pub fn account_balances(snapshot: &LedgerSnapshot) -> Vec<AccountBalance> {
        let totals = snapshot.side_totals_by_code();
        snapshot
            .accounts
            .iter()
            .map(|account| {
                let (total_debit, total_credit) = totals
                    .get(account.code.as_str())
                    .copied()
                    .unwrap_or_default();
                AccountBalance {
                    code: account.code.clone(),
                    name: account.name.clone(),
                    category: account.category,
                    total_debit,
                    total_credit,
                    balance: total_credit - total_debit,
                }
            })
            .collect()
    }

    pub fn trial_balance(snapshot: &LedgerSnapshot) -> TrialBalance {
        let balances = Self::account_balances(snapshot);
        let mut report = TrialBalance {
            sections: Vec::new(),
            total_debit: 0.0,
            total_credit: 0.0,
        };
        for category in AccountCategory::ALL {
            let mut section = TrialBalanceSection {
                category,
                rows: Vec::new(),
                total_debit: 0.0,
                total_credit: 0.0,
            };
            for balance in balances.iter().filter(|b| b.category == category) {
                let net = round_cents(balance.balance);
                let (debit, credit) = if net < 0.0 { (-net, 0.0) } else { (0.0, net) };
                section.total_debit += debit;
                section.total_credit += credit;
                section.rows.push(TrialBalanceRow {
                    code: balance.code.clone(),
                    name: balance.name.clone(),
                    debit,
                    credit,
                });
            }
            if section.rows.is_empty() {
                continue;
            }
            report.total_debit += section.total_debit;
            report.total_credit += section.total_credit;
            report.sections.push(section);
        }
        report
    }

    pub fn profit_and_loss(snapshot: &LedgerSnapshot) -> ProfitAndLoss {
        let balances = balance_map(snapshot);
        let section = |category: AccountCategory| {
            let mut section = ReportSection::default();
            for account in snapshot.accounts_in(category) {
                section.push(row(account, amount_of(&balances, &account.code)));
            }
            section
        };

        let sales = section(AccountCategory::Sales);
        let cost_of_sales = section(AccountCategory::CostOfSale);
        let expenses = section(AccountCategory::Expense);
        let brought_down = section(AccountCategory::ProfitAndLoss);
        let gross_profit = sales.total + cost_of_sales.total;
        let final_profit = gross_profit + expenses.total;
        let carried_forward = final_profit + brought_down.total;
        ProfitAndLoss {
            sales,
            cost_of_sales,
            expenses,
            brought_down,
            gross_profit,
            final_profit,
            carried_forward,
        }
    }

    pub fn balance_sheet(snapshot: &LedgerSnapshot, rule: &DepreciationRule) -> BalanceSheet {
        let balances = balance_map(snapshot);
        let balance_of = |account: &Account| amount_of(&balances, &account.code);

        let mut share_capital = ReportSection::default();
        for account in snapshot.accounts_in(AccountCategory::Equity) {
            share_capital.push(row(account, balance_of(account)));
        }

        let mut profit_and_loss = ReportSection::default();
        for account in snapshot.accounts_in(AccountCategory::ProfitAndLoss) {
            profit_and_loss.push(row(account, balance_of(account)));
        }
        let current_profit = Self::profit_and_loss(snapshot).final_profit;
        if to_cents(current_profit) != 0 {
            profit_and_loss.push(ReportRow {
                code: String::new(),
                name: CURRENT_PROFIT_LABEL.into(),
                amount: current_profit,
            });
        }

        let fixed_assets = fixed_asset_section(snapshot, rule, &balances);

        let mut current_assets = ReportSection::default();
        for account in snapshot.accounts.iter().filter(|account| {
            matches!(
                account.category,
                AccountCategory::Asset | AccountCategory::Debtor
            )
        }) {
            current_assets.push(row(account, -balance_of(account)));
        }

        let mut current_liabilities = ReportSection::default();
        for account in snapshot.accounts.iter().filter(|account| {
            matches!(
                account.category,
                AccountCategory::Liabilities | AccountCategory::Creditor
            )
        }) {
            current_liabilities.push(row(account, balance_of(account)));
        }

        BalanceSheet {
            net_fixed_assets: fixed_assets.total,
            net_current_assets: current_assets.total - current_liabilities.total,
            capital: share_capital.total + profit_and_loss.total,
            share_capital,
            profit_and_loss,
            fixed_assets,
            current_assets,
            current_liabilities,
        }
    }

    /// Data-quality findings: orphaned lines, unbalanced groups, and a
    /// trial balance that does not balance.
    pub fn ledger_warnings(snapshot: &LedgerSnapshot) -> Vec<String> {
        let mut warnings = Vec::new();
        let known: HashSet<&str> = snapshot
            .accounts
            .iter()
            .map(|account| account.code.as_str())
            .collect();
        for line in &snapshot.lines {
            if !known.contains(line.account_code.as_str()) {
                warnings.push(format!(
                    "Line {} in transaction {} references unknown account `{}`.",
                    line.id, line.group, line.account_code
                ));
            }
        }

        let mut groups: BTreeMap<u64, (f64, f64)> = BTreeMap::new();
        for line in &snapshot.lines {
            let entry = groups.entry(line.group).or_default();
            entry.0 += line.debit;
            entry.1 += line.credit;
        }
        for (group, (debit, credit)) in groups {
            if !amounts_equal(debit, credit) {
                warnings.push(format!(
                    "Transaction {group} is unbalanced: debit {debit:.2}, credit {credit:.2}."
                ));
            }
        }

        let trial = Self::trial_balance(snapshot);
        if !trial.is_balanced() {
            warnings.push(format!(
                "Trial balance is off by {:.2}.",
                trial.difference()
            ));
        }
        warnings
    }
}

/// Credit-positive balance for every account in the chart.
fn balance_map(snapshot: &LedgerSnapshot) -> HashMap<&str, f64> {
    let totals = snapshot.side_totals_by_code();
    snapshot
        .accounts
        .iter()
        .map(|account| {
            let (debit, credit) = totals
                .get(account.code.as_str())
                .copied()
                .unwrap_or_default();
            (account.code.as_str(), credit - debit)
        })
        .collect()
}

fn amount_of(balances: &HashMap<&str, f64>, code: &str) -> f64 {
    balances.get(code).copied().unwrap_or_default()
}

fn row(account: &Account, amount: f64) -> ReportRow {
    ReportRow {
        code: account.code.clone(),
        name: account.name.clone(),
        amount,
    }
}

/// Fixed assets net of their matched accumulated depreciation. Depreciation
/// that matches no asset is still deducted, as a row of its own.
fn fixed_asset_section(
    snapshot: &LedgerSnapshot,
    rule: &DepreciationRule,
    balances: &HashMap<&str, f64>,
) -> ReportSection {
    let assets: Vec<&Account> = snapshot.accounts_in(AccountCategory::FixedAsset).collect();
    let asset_codes: Vec<&str> = assets.iter().map(|asset| asset.code.as_str()).collect();

    let mut deductions: HashMap<&str, f64> = HashMap::new();
    let mut unmatched = Vec::new();
    for depreciation in snapshot.accounts_in(AccountCategory::AccumulatedDepreciation) {
        let amount = amount_of(balances, &depreciation.code);
        match rule.matching_asset(&depreciation.code, &asset_codes) {
            Some(asset) => *deductions.entry(asset).or_default() += amount,
            None => unmatched.push(row(depreciation, -amount)),
        }
    }

    let mut section = ReportSection::default();
    for asset in assets {
        let cost = -amount_of(balances, &asset.code);
        let deduction = deductions.get(asset.code.as_str()).copied().unwrap_or_default();
        section.push(row(asset, cost - deduction));
    }
    for depreciation in unmatched {
        section.push(depreciation);
    }
    section
}
