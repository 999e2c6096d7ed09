use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// Fixed enumeration of account categories a chart of accounts may use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AccountCategory {
    Asset,
    Liabilities,
    Expense,
    Equity,
    #[serde(rename = "Profit & Loss")]
    ProfitAndLoss,
    Sales,
    #[serde(rename = "Cost of Sale")]
    CostOfSale,
    Debtor,
    Creditor,
    #[serde(rename = "Fixed Asset")]
    FixedAsset,
    #[serde(rename = "Accumulated Depreciation")]
    AccumulatedDepreciation,
}

impl AccountCategory {
    /// Every category, in reporting order.
    pub const ALL: [AccountCategory; 11] = [
        AccountCategory::Asset,
        AccountCategory::Liabilities,
        AccountCategory::Expense,
        AccountCategory::Equity,
        AccountCategory::ProfitAndLoss,
        AccountCategory::Sales,
        AccountCategory::CostOfSale,
        AccountCategory::Debtor,
        AccountCategory::Creditor,
        AccountCategory::FixedAsset,
        AccountCategory::AccumulatedDepreciation,
    ];

    pub fn label(self) -> &'static str {
        match self {
            AccountCategory::Asset => "Asset",
            AccountCategory::Liabilities => "Liabilities",
            AccountCategory::Expense => "Expense",
            AccountCategory::Equity => "Equity",
            AccountCategory::ProfitAndLoss => "Profit & Loss",
            AccountCategory::Sales => "Sales",
            AccountCategory::CostOfSale => "Cost of Sale",
            AccountCategory::Debtor => "Debtor",
            AccountCategory::Creditor => "Creditor",
            AccountCategory::FixedAsset => "Fixed Asset",
            AccountCategory::AccumulatedDepreciation => "Accumulated Depreciation",
        }
    }
}

impl fmt::Display for AccountCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownCategory(pub String);

impl fmt::Display for UnknownCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown account category `{}`", self.0)
    }
}

impl std::error::Error for UnknownCategory {}

impl FromStr for AccountCategory {
    type Err = UnknownCategory;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        AccountCategory::ALL
            .into_iter()
            .find(|category| category.label().to_ascii_lowercase() == normalized)
            .ok_or_else(|| UnknownCategory(value.trim().to_string()))
    }
}

/// A named, categorized account within one tenant's chart of accounts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub code: String,
    pub name: String,
    pub category: AccountCategory,
}

impl Account {
    pub fn new(
        code: impl Into<String>,
        name: impl Into<String>,
        category: AccountCategory,
    ) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            category,
        }
    }
}

/// An editable chart-of-accounts row.
///
/// `original_code` is the code the row was loaded under, or `None` for a row
/// added during the edit. Changing `code` on a loaded row re-keys the account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountDraft {
    #[serde(default)]
    pub original_code: Option<String>,
    pub code: String,
    pub name: String,
    pub category: AccountCategory,
}

impl AccountDraft {
    pub fn new(
        code: impl Into<String>,
        name: impl Into<String>,
        category: AccountCategory,
    ) -> Self {
        Self {
            original_code: None,
            code: code.into(),
            name: name.into(),
            category,
        }
    }

    pub fn into_account(self) -> Account {
        Account {
            code: self.code,
            name: self.name,
            category: self.category,
        }
    }
}

impl From<&Account> for AccountDraft {
    fn from(account: &Account) -> Self {
        Self {
            original_code: Some(account.code.clone()),
            code: account.code.clone(),
            name: account.name.clone(),
            category: account.category,
        }
    }
}

/// Rename or recategorize request for an existing account, addressed by code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountChange {
    pub code: String,
    pub account: Account,
}
