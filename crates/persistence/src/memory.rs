//! In-memory `RecordStore` for local development and tests

use async_trait::async_trait;
use parking_lot::RwLock;
use revpulse_core::{ApiKeyRecord, Campaign, Customer, Lead, RecordStore, Result};
use serde::Deserialize;
use std::path::Path;
use uuid::Uuid;

use crate::error::PersistenceError;

/// Fixture document loaded into the in-memory store
#[derive(Debug, Default, Deserialize)]
pub struct SeedData {
    #[serde(default)]
    pub leads: Vec<Lead>,
    #[serde(default)]
    pub campaigns: Vec<Campaign>,
    #[serde(default)]
    pub customers: Vec<Customer>,
    #[serde(default)]
    pub api_keys: Vec<ApiKeyRecord>,
}

#[derive(Default)]
struct Tables {
    leads: Vec<Lead>,
    campaigns: Vec<Campaign>,
    customers: Vec<Customer>,
    api_keys: Vec<ApiKeyRecord>,
}

/// Records held in process, in insertion order
#[derive(Default)]
pub struct InMemoryRecordStore {
    tables: RwLock<Tables>,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_seed(seed: SeedData) -> Self {
        Self {
            tables: RwLock::new(Tables {
                leads: seed.leads,
                campaigns: seed.campaigns,
                customers: seed.customers,
                api_keys: seed.api_keys,
            }),
        }
    }

    /// Load a JSON fixture file with `leads`, `campaigns`, `customers`, `api_keys`
    pub fn from_seed_file(path: impl AsRef<Path>) -> std::result::Result<Self, PersistenceError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;
        let seed: SeedData = serde_json::from_str(&raw)
            .map_err(|e| PersistenceError::InvalidData(format!("{}: {}", path.display(), e)))?;

        tracing::info!(
            path = %path.display(),
            leads = seed.leads.len(),
            campaigns = seed.campaigns.len(),
            customers = seed.customers.len(),
            api_keys = seed.api_keys.len(),
            "Seeded in-memory store"
        );

        Ok(Self::from_seed(seed))
    }

    pub fn insert_lead(&self, lead: Lead) {
        self.tables.write().leads.push(lead);
    }

    pub fn insert_campaign(&self, campaign: Campaign) {
        self.tables.write().campaigns.push(campaign);
    }

    pub fn insert_customer(&self, customer: Customer) {
        self.tables.write().customers.push(customer);
    }

    pub fn insert_api_key(&self, key: ApiKeyRecord) {
        self.tables.write().api_keys.push(key);
    }
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn list_leads(&self, org: Uuid) -> Result<Vec<Lead>> {
        let tables = self.tables.read();
        Ok(tables
            .leads
            .iter()
            .filter(|l| l.organization_id == org)
            .cloned()
            .collect())
    }

    async fn get_lead(&self, org: Uuid, id: Uuid) -> Result<Option<Lead>> {
        let tables = self.tables.read();
        Ok(tables
            .leads
            .iter()
            .find(|l| l.organization_id == org && l.id == id)
            .cloned())
    }

    async fn list_campaigns(&self, org: Uuid) -> Result<Vec<Campaign>> {
        let tables = self.tables.read();
        Ok(tables
            .campaigns
            .iter()
            .filter(|c| c.organization_id == org)
            .cloned()
            .collect())
    }

    async fn list_customers(&self, org: Uuid) -> Result<Vec<Customer>> {
        let tables = self.tables.read();
        Ok(tables
            .customers
            .iter()
            .filter(|c| c.organization_id == org)
            .cloned()
            .collect())
    }

    async fn get_customer(&self, org: Uuid, id: Uuid) -> Result<Option<Customer>> {
        let tables = self.tables.read();
        Ok(tables
            .customers
            .iter()
            .find(|c| c.organization_id == org && c.id == id)
            .cloned())
    }

    async fn find_api_keys_by_prefix(&self, prefix: &str) -> Result<Vec<ApiKeyRecord>> {
        let tables = self.tables.read();
        Ok(tables
            .api_keys
            .iter()
            .filter(|k| k.is_active && k.key_prefix == prefix)
            .cloned()
            .collect())
    }

    fn backend_name(&self) -> &str {
        "memory"
    }
}
