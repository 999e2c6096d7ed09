//! In-memory stores for exercising the services without a filesystem.

use std::sync::{Arc, Mutex};

use chrono::Utc;
use tally_domain::{Account, Company, CompanyId, LedgerLine, StoreLocations};

use crate::{
    error::{CoreError, CoreResult},
    storage::{
        plan_account_batch, plan_line_batch, AccountBatch, AccountStore, BatchOutcome,
        LedgerStore, LineBatch, TenantStores,
    },
};

#[derive(Default)]
pub struct MemoryLedger {
    state: Mutex<(Vec<LedgerLine>, u64)>,
    pub fail_writes: Mutex<bool>,
}

impl LedgerStore for MemoryLedger {
    fn list_lines(&self) -> CoreResult<Vec<LedgerLine>> {
        Ok(self.state.lock()?.0.clone())
    }

    fn apply_batch(&self, batch: LineBatch) -> CoreResult<BatchOutcome> {
        if *self.fail_writes.lock()? {
            return Err(CoreError::Storage("ledger is read-only".into()));
        }
        let mut state = self.state.lock()?;
        let planned = plan_line_batch(&state.0, state.1, batch)?;
        *state = (planned.lines, planned.next_line_id);
        Ok(planned.outcome)
    }
}

#[derive(Default)]
pub struct MemoryAccounts {
    accounts: Mutex<Vec<Account>>,
}

impl AccountStore for MemoryAccounts {
    fn list_accounts(&self) -> CoreResult<Vec<Account>> {
        Ok(self.accounts.lock()?.clone())
    }

    fn apply_batch(&self, batch: AccountBatch) -> CoreResult<()> {
        let mut accounts = self.accounts.lock()?;
        *accounts = plan_account_batch(&accounts, batch)?;
        Ok(())
    }
}

pub struct MemoryTenant {
    pub stores: TenantStores,
    pub ledger: Arc<MemoryLedger>,
    pub accounts: Arc<MemoryAccounts>,
}

pub fn tenant(name: &str) -> MemoryTenant {
    let ledger = Arc::new(MemoryLedger::default());
    let accounts = Arc::new(MemoryAccounts::default());
    let company = Company {
        id: CompanyId::new(),
        name: name.into(),
        slug: name.to_lowercase(),
        stores: StoreLocations {
            ledger: "ledger.json".into(),
            accounts: "accounts.json".into(),
        },
        created_at: Utc::now(),
    };
    MemoryTenant {
        stores: TenantStores {
            company,
            ledger: ledger.clone(),
            accounts: accounts.clone(),
        },
        ledger,
        accounts,
    }
}
