//! JSON-file persistence for the tenant registry and per-company stores.
//!
//! Layout under the data root:
//!
//! ```text
//! registry.json
//! companies/<slug>/ledger.json
//! companies/<slug>/accounts.json
//! ```

mod files;
mod tenant;

use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tally_core::{
    validation::company_name, CoreError, TenantRegistry, TenantStores,
};
use tally_domain::{Company, CompanyId, StoreLocations};
use tracing::{info, warn};

pub use files::{canonical_name, SCHEMA_VERSION};
pub use tenant::{JsonAccountStore, JsonLedgerStore};

use files::{read_document, write_document, Versioned};

const REGISTRY_FILE: &str = "registry.json";
const COMPANIES_DIR: &str = "companies";
const LEDGER_FILE: &str = "ledger.json";
const ACCOUNTS_FILE: &str = "accounts.json";

#[derive(Debug, Serialize, Deserialize)]
struct RegistryDocument {
    schema_version: u32,
    #[serde(default)]
    companies: Vec<Company>,
}

impl Versioned for RegistryDocument {
    fn schema_version(&self) -> u32 {
        self.schema_version
    }
}

/// Open handles of one company plus the lock both of its stores write under.
struct CachedTenant {
    stores: TenantStores,
    lock: Arc<Mutex<()>>,
}

#[derive(Default)]
struct RegistryState {
    companies: Vec<Company>,
    handles: HashMap<CompanyId, CachedTenant>,
}

/// Filesystem-backed tenant registry.
///
/// Store locations are recorded relative to the data root.
pub struct JsonRegistry {
    root: PathBuf,
    state: Mutex<RegistryState>,
}

impl JsonRegistry {
    /// Opens the registry under `root`, creating the directory if needed.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, CoreError> {
        let root = root.into();
        fs::create_dir_all(root.join(COMPANIES_DIR))?;
        let registry_path = root.join(REGISTRY_FILE);
        let companies = if registry_path.exists() {
            read_document::<RegistryDocument>(&registry_path)?.companies
        } else {
            Vec::new()
        };
        info!(root = %root.display(), companies = companies.len(), "Registry opened");
        Ok(Self {
            root,
            state: Mutex::new(RegistryState {
                companies,
                handles: HashMap::new(),
            }),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn registry_path(&self) -> PathBuf {
        self.root.join(REGISTRY_FILE)
    }

    /// Absolute location of a company's directory.
    pub fn company_dir(&self, company: &Company) -> PathBuf {
        self.root.join(COMPANIES_DIR).join(&company.slug)
    }

    fn absolute(&self, relative: &Path) -> PathBuf {
        self.root.join(relative)
    }

    fn persist(&self, companies: &[Company]) -> Result<(), CoreError> {
        write_document(
            &self.registry_path(),
            &RegistryDocument {
                schema_version: SCHEMA_VERSION,
                companies: companies.to_vec(),
            },
        )
    }
}

impl TenantRegistry for JsonRegistry {
    fn create_company(&self, name: &str) -> Result<CompanyId, CoreError> {
        let name = company_name(name)?;
        let slug = canonical_name(name);
        let mut state = self.state.lock()?;
        if state
            .companies
            .iter()
            .any(|company| company.has_name(name) || company.slug == slug)
        {
            return Err(CoreError::DuplicateName(name.to_string()));
        }

        let relative_dir = Path::new(COMPANIES_DIR).join(&slug);
        let company = Company {
            id: CompanyId::new(),
            name: name.to_string(),
            slug,
            stores: StoreLocations {
                ledger: relative_dir.join(LEDGER_FILE),
                accounts: relative_dir.join(ACCOUNTS_FILE),
            },
            created_at: Utc::now(),
        };

        let dir = self.company_dir(&company);
        if dir.exists() {
            warn!(path = %dir.display(), "Reusing leftover company directory");
        }
        let initialized = fs::create_dir_all(&dir)
            .map_err(CoreError::from)
            .and_then(|_| {
                tenant::initialize_stores(
                    &self.absolute(&company.stores.ledger),
                    &self.absolute(&company.stores.accounts),
                )
            });
        if let Err(err) = initialized {
            remove_best_effort(&dir);
            return Err(err);
        }

        let mut companies = state.companies.clone();
        companies.push(company.clone());
        if let Err(err) = self.persist(&companies) {
            remove_best_effort(&dir);
            return Err(err);
        }
        state.companies = companies;

        info!(company = %company.name, id = %company.id, "Company created");
        Ok(company.id)
    }

    fn list_companies(&self) -> Result<Vec<Company>, CoreError> {
        let mut companies = self.state.lock()?.companies.clone();
        companies.sort_by_cached_key(|company| company.name.to_lowercase());
        Ok(companies)
    }

    fn find_company(&self, id: CompanyId) -> Result<Company, CoreError> {
        self.state
            .lock()?
            .companies
            .iter()
            .find(|company| company.id == id)
            .cloned()
            .ok_or(CoreError::CompanyNotFound(id))
    }

    fn resolve_stores(&self, id: CompanyId) -> Result<TenantStores, CoreError> {
        let mut state = self.state.lock()?;
        if let Some(cached) = state.handles.get(&id) {
            return Ok(cached.stores.clone());
        }
        let company = state
            .companies
            .iter()
            .find(|company| company.id == id)
            .cloned()
            .ok_or(CoreError::CompanyNotFound(id))?;

        let lock = Arc::new(Mutex::new(()));
        let stores = TenantStores {
            ledger: Arc::new(JsonLedgerStore::new(
                self.absolute(&company.stores.ledger),
                lock.clone(),
            )),
            accounts: Arc::new(JsonAccountStore::new(
                self.absolute(&company.stores.accounts),
                lock.clone(),
            )),
            company,
        };
        state.handles.insert(
            id,
            CachedTenant {
                stores: stores.clone(),
                lock,
            },
        );
        Ok(stores)
    }

    fn delete_company(&self, id: CompanyId) -> Result<(), CoreError> {
        let mut state = self.state.lock()?;
        let company = state
            .companies
            .iter()
            .find(|company| company.id == id)
            .cloned()
            .ok_or(CoreError::CompanyNotFound(id))?;

        let remaining: Vec<Company> = state
            .companies
            .iter()
            .filter(|company| company.id != id)
            .cloned()
            .collect();
        self.persist(&remaining)?;
        state.companies = remaining;
        let cached = state.handles.remove(&id);
        drop(state);

        // Batches already holding the tenant lock finish before the files go.
        let _guard = match &cached {
            Some(cached) => Some(cached.lock.lock()?),
            None => None,
        };
        remove_best_effort(&self.company_dir(&company));
        info!(company = %company.name, id = %id, "Company deleted");
        Ok(())
    }
}

fn remove_best_effort(dir: &Path) {
    if !dir.exists() {
        return;
    }
    if let Err(err) = fs::remove_dir_all(dir) {
        warn!(path = %dir.display(), error = %err, "Failed to remove company directory");
    }
}
