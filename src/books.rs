//! The `Books` facade: one entry point per bookkeeping operation, addressed
//! by company id.

use std::sync::Arc;

use chrono::{Local, NaiveDate};
use tally_config::Config;
use tally_core::{
    AccountReconcileSummary, AccountService, AccountStore, CarryForward, CarryForwardOutcome,
    CoreError, LedgerPolicy, LedgerSnapshot, LedgerStore, ReconcileSummary, ReportService,
    TenantRegistry, TenantStores, TransactionService,
};
use tally_domain::{
    Account, AccountBalance, AccountChange, AccountDraft, BalanceSheet, Company, CompanyId,
    LedgerLine, LineDraft, LineId, NewLine, ProfitAndLoss, TrialBalance,
};
use tally_storage_json::JsonRegistry;
use tracing::{info, warn};

use crate::errors::BooksError;

pub type BooksResult<T> = Result<T, BooksError>;

pub struct Books {
    registry: Arc<dyn TenantRegistry>,
    policy: LedgerPolicy,
}

impl Books {
    /// Opens the JSON registry under the configured data root.
    pub fn open(config: &Config) -> BooksResult<Self> {
        let registry = JsonRegistry::open(config.resolve_data_root())?;
        Ok(Self::with_registry(Arc::new(registry), policy_from(config)))
    }

    pub fn with_registry(registry: Arc<dyn TenantRegistry>, policy: LedgerPolicy) -> Self {
        Self { registry, policy }
    }

    pub fn policy(&self) -> &LedgerPolicy {
        &self.policy
    }

    fn stores(&self, id: CompanyId) -> BooksResult<TenantStores> {
        Ok(self.registry.resolve_stores(id)?)
    }

    fn snapshot(&self, id: CompanyId) -> BooksResult<LedgerSnapshot> {
        let stores = self.stores(id)?;
        Ok(LedgerSnapshot::capture(&*stores.ledger, &*stores.accounts)?)
    }

    // Companies

    pub fn list_companies(&self) -> BooksResult<Vec<Company>> {
        Ok(self.registry.list_companies()?)
    }

    pub fn create_company(&self, name: &str) -> BooksResult<CompanyId> {
        Ok(self.registry.create_company(name)?)
    }

    pub fn delete_company(&self, id: CompanyId) -> BooksResult<()> {
        Ok(self.registry.delete_company(id)?)
    }

    pub fn company(&self, id: CompanyId) -> BooksResult<Company> {
        Ok(self.registry.find_company(id)?)
    }

    // Ledger

    pub fn list_transactions(&self, id: CompanyId) -> BooksResult<Vec<LedgerLine>> {
        Ok(self.stores(id)?.ledger.list_lines()?)
    }

    pub fn last_transaction(&self, id: CompanyId) -> BooksResult<Option<LedgerLine>> {
        Ok(self.stores(id)?.ledger.last_transaction_group()?)
    }

    pub fn search_transactions(
        &self,
        id: CompanyId,
        query: &str,
    ) -> BooksResult<Vec<LedgerLine>> {
        Ok(self.stores(id)?.ledger.find_by_code_or_text(query)?)
    }

    pub fn next_transaction_group(&self, id: CompanyId) -> BooksResult<u64> {
        Ok(TransactionService::next_group(&*self.stores(id)?.ledger)?)
    }

    pub fn find_transaction_group(
        &self,
        id: CompanyId,
        group: u64,
    ) -> BooksResult<Vec<LedgerLine>> {
        Ok(self.stores(id)?.ledger.find_by_group(group)?)
    }

    pub fn add_transaction_group(
        &self,
        id: CompanyId,
        lines: Vec<NewLine>,
    ) -> BooksResult<Vec<LineId>> {
        let stores = self.stores(id)?;
        Ok(TransactionService::add_group(
            &*stores.ledger,
            &*stores.accounts,
            &self.policy,
            lines,
        )?)
    }

    /// See [`TransactionService::reconcile_group`].
    pub fn reconcile_transaction_group(
        &self,
        id: CompanyId,
        group: u64,
        previous: &[LedgerLine],
        desired: Vec<LineDraft>,
    ) -> BooksResult<ReconcileSummary> {
        let stores = self.stores(id)?;
        Ok(TransactionService::reconcile_group(
            &*stores.ledger,
            &*stores.accounts,
            &self.policy,
            group,
            previous,
            desired,
        )?)
    }

    /// Removes lines without a balance check. Unknown ids are ignored.
    pub fn delete_transaction_lines(&self, id: CompanyId, ids: &[LineId]) -> BooksResult<()> {
        Ok(self.stores(id)?.ledger.delete_lines(ids)?)
    }

    // Chart of accounts

    pub fn list_accounts(&self, id: CompanyId) -> BooksResult<Vec<Account>> {
        Ok(self.stores(id)?.accounts.list_accounts()?)
    }

    pub fn add_account(&self, id: CompanyId, account: Account) -> BooksResult<()> {
        Ok(AccountService::add(&*self.stores(id)?.accounts, account)?)
    }

    /// Renames or recategorizes several accounts, keyed by their current code.
    pub fn update_accounts(&self, id: CompanyId, changes: Vec<AccountChange>) -> BooksResult<()> {
        Ok(AccountService::update(&*self.stores(id)?.accounts, changes)?)
    }

    pub fn reconcile_accounts(
        &self,
        id: CompanyId,
        previous: &[Account],
        desired: Vec<AccountDraft>,
    ) -> BooksResult<AccountReconcileSummary> {
        Ok(AccountService::reconcile(
            &*self.stores(id)?.accounts,
            previous,
            desired,
        )?)
    }

    pub fn delete_account(&self, id: CompanyId, code: &str) -> BooksResult<()> {
        Ok(AccountService::delete(&*self.stores(id)?.accounts, code)?)
    }

    // Reports

    pub fn account_balance(&self, id: CompanyId, code: &str) -> BooksResult<f64> {
        Ok(ReportService::account_balance(&self.snapshot(id)?, code))
    }

    pub fn account_balances(&self, id: CompanyId) -> BooksResult<Vec<AccountBalance>> {
        Ok(ReportService::account_balances(&self.snapshot(id)?))
    }

    pub fn trial_balance(&self, id: CompanyId) -> BooksResult<TrialBalance> {
        Ok(ReportService::trial_balance(&self.snapshot(id)?))
    }

    pub fn profit_and_loss(&self, id: CompanyId) -> BooksResult<ProfitAndLoss> {
        Ok(ReportService::profit_and_loss(&self.snapshot(id)?))
    }

    pub fn balance_sheet(&self, id: CompanyId) -> BooksResult<BalanceSheet> {
        Ok(ReportService::balance_sheet(
            &self.snapshot(id)?,
            &self.policy.depreciation_rule,
        ))
    }

    pub fn ledger_warnings(&self, id: CompanyId) -> BooksResult<Vec<String>> {
        let warnings = ReportService::ledger_warnings(&self.snapshot(id)?);
        for warning in &warnings {
            warn!(company = %id, "{warning}");
        }
        Ok(warnings)
    }

    // Carry-forward

    pub fn carry_forward(
        &self,
        source: CompanyId,
        destination: CompanyId,
    ) -> BooksResult<CarryForwardOutcome> {
        self.carry_forward_on(source, destination, today())
    }

    /// Carry-forward with an explicit date for the opening lines.
    pub fn carry_forward_on(
        &self,
        source: CompanyId,
        destination: CompanyId,
        date: NaiveDate,
    ) -> BooksResult<CarryForwardOutcome> {
        let source = self.stores(source)?;
        let destination = self.stores(destination)?;
        Ok(CarryForward::run(&source, &destination, &self.policy, date)?)
    }

    /// Retries only the opening-balance step of an interrupted carry-forward.
    pub fn seed_opening_balance(
        &self,
        source: CompanyId,
        destination: CompanyId,
    ) -> BooksResult<usize> {
        let source = self.stores(source)?;
        let destination = self.stores(destination)?;
        Ok(CarryForward::seed_opening_balance(
            &source,
            &destination,
            &self.policy,
            today(),
        )?)
    }

    /// Creates `name` and carries `source` forward into it.
    ///
    /// If the account clone fails the new company is removed again. A
    /// partial carry-forward keeps it so the opening balance can be retried.
    pub fn create_company_with_carry_forward(
        &self,
        name: &str,
        source: CompanyId,
    ) -> BooksResult<(CompanyId, CarryForwardOutcome)> {
        self.registry.find_company(source)?;
        let destination = self.registry.create_company(name)?;
        match self.carry_forward(source, destination) {
            Ok(outcome) => {
                info!(company = %destination, "Company created from carry-forward");
                Ok((destination, outcome))
            }
            Err(BooksError::Core(err @ CoreError::PartialCarryForward { .. })) => Err(err.into()),
            Err(err) => {
                if let Err(cleanup) = self.registry.delete_company(destination) {
                    warn!(
                        company = %destination,
                        error = %cleanup,
                        "Failed to remove company after carry-forward error"
                    );
                }
                Err(err)
            }
        }
    }
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn policy_from(config: &Config) -> LedgerPolicy {
    LedgerPolicy {
        reject_two_sided_lines: config.reject_two_sided_lines,
        depreciation_rule: config.depreciation_rule.clone(),
        carry_forward_description: config.carry_forward_description.clone(),
        roll_profit_into_carry_forward: config.roll_profit_into_carry_forward,
    }
}
