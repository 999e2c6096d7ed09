//! Read-side report shapes produced by the aggregation engine.
//!
//! All amounts follow the credit-positive convention unless a field says
//! otherwise: a positive balance is a net credit.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{account::AccountCategory, common::BALANCE_SHEET_TOLERANCE};

/// Totals for one account across every ledger line that references it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountBalance {
    pub code: String,
    pub name: String,
    pub category: AccountCategory,
    pub total_debit: f64,
    pub total_credit: f64,
    pub balance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialBalanceRow {
    pub code: String,
    pub name: String,
    /// Magnitude of a net debit balance, otherwise zero.
    pub debit: f64,
    /// Magnitude of a net credit balance, otherwise zero.
    pub credit: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialBalanceSection {
    pub category: AccountCategory,
    pub rows: Vec<TrialBalanceRow>,
    pub total_debit: f64,
    pub total_credit: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialBalance {
    pub sections: Vec<TrialBalanceSection>,
    pub total_debit: f64,
    pub total_credit: f64,
}

impl TrialBalance {
    pub fn difference(&self) -> f64 {
        self.total_credit - self.total_debit
    }

    pub fn is_balanced(&self) -> bool {
        crate::common::amounts_equal(self.total_debit, self.total_credit)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportRow {
    pub code: String,
    pub name: String,
    pub amount: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportSection {
    pub rows: Vec<ReportRow>,
    pub total: f64,
}

impl ReportSection {
    pub fn push(&mut self, row: ReportRow) {
        self.total += row.amount;
        self.rows.push(row);
    }
}

/// Profit and loss grouping. Section totals are credit-positive, so cost of
/// sale and expenses are normally negative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfitAndLoss {
    pub sales: ReportSection,
    pub cost_of_sales: ReportSection,
    pub expenses: ReportSection,
    /// Balances of Profit & Loss category accounts (brought down).
    pub brought_down: ReportSection,
    pub gross_profit: f64,
    pub final_profit: f64,
    pub carried_forward: f64,
}

/// Balance sheet sections. Asset sections are debit-positive, capital and
/// liability sections credit-positive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceSheet {
    pub share_capital: ReportSection,
    /// Profit & Loss accounts plus a row for the current period's profit.
    pub profit_and_loss: ReportSection,
    pub fixed_assets: ReportSection,
    pub current_assets: ReportSection,
    pub current_liabilities: ReportSection,
    /// A: fixed assets net of accumulated depreciation.
    pub net_fixed_assets: f64,
    /// D: current assets less current liabilities.
    pub net_current_assets: f64,
    /// P: share capital plus profit and loss carried forward.
    pub capital: f64,
}

impl BalanceSheet {
    /// A + D.
    pub fn net_assets(&self) -> f64 {
        self.net_fixed_assets + self.net_current_assets
    }

    pub fn difference(&self) -> f64 {
        self.net_assets() - self.capital
    }

    pub fn is_balanced(&self) -> bool {
        self.difference().abs() < BALANCE_SHEET_TOLERANCE
    }
}

/// How accumulated depreciation accounts are paired with fixed assets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DepreciationRule {
    /// The depreciation code ends with the asset code (`DEPFA101` nets `FA101`).
    /// The longest matching asset code wins.
    #[default]
    Suffix,
    /// Explicit asset code to depreciation code pairs.
    Mapping { pairs: BTreeMap<String, String> },
}

impl DepreciationRule {
    /// Picks the asset a depreciation account belongs to, if any.
    pub fn matching_asset<'a>(
        &self,
        depreciation_code: &str,
        assets: &[&'a str],
    ) -> Option<&'a str> {
        match self {
            DepreciationRule::Suffix => assets
                .iter()
                .copied()
                .filter(|asset| !asset.is_empty() && depreciation_code.ends_with(asset))
                .max_by_key(|asset| asset.len()),
            DepreciationRule::Mapping { pairs } => assets.iter().copied().find(|asset| {
                pairs
                    .get(*asset)
                    .is_some_and(|mapped| mapped == depreciation_code)
            }),
        }
    }
}
