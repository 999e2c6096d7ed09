use tally_domain::DepreciationRule;

pub const DEFAULT_CARRY_FORWARD_DESCRIPTION: &str = "Balance brought forward";

/// Tenant-independent rules the services apply on writes and reports.
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerPolicy {
    /// Reject lines where debit and credit are both zero or both non-zero.
    pub reject_two_sided_lines: bool,
    pub depreciation_rule: DepreciationRule,
    pub carry_forward_description: String,
    /// Fold the current period's final profit into the opening P&L line.
    pub roll_profit_into_carry_forward: bool,
}

impl Default for LedgerPolicy {
    fn default() -> Self {
        Self {
            reject_two_sided_lines: false,
            depreciation_rule: DepreciationRule::default(),
            carry_forward_description: DEFAULT_CARRY_FORWARD_DESCRIPTION.into(),
            roll_profit_into_carry_forward: false,
        }
    }
}
