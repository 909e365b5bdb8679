//! Record store interface

use crate::{ApiKeyRecord, Campaign, Customer, Lead, Result};
use async_trait::async_trait;
use uuid::Uuid;

/// Read-only, tenant-scoped access to the hosted record store
///
/// Every method that takes an `org` must only return rows whose
/// `organization_id` equals it. A record that exists under a different
/// organization is reported exactly like a missing one.
///
/// Implementations:
/// - `RestRecordStore` - PostgREST-style HTTP table API
/// - `InMemoryRecordStore` - fixtures and local development
#[async_trait]
pub trait RecordStore: Send + Sync + 'static {
    /// All leads of the organization, in store order
    async fn list_leads(&self, org: Uuid) -> Result<Vec<Lead>>;

    /// A single lead, `Ok(None)` when absent or owned by another organization
    async fn get_lead(&self, org: Uuid, id: Uuid) -> Result<Option<Lead>>;

    /// All campaigns of the organization
    async fn list_campaigns(&self, org: Uuid) -> Result<Vec<Campaign>>;

    /// All customers of the organization
    async fn list_customers(&self, org: Uuid) -> Result<Vec<Customer>>;

    /// A single customer, `Ok(None)` when absent or owned by another organization
    async fn get_customer(&self, org: Uuid, id: Uuid) -> Result<Option<Customer>>;

    /// API keys whose public prefix matches, across all organizations
    ///
    /// Used during authentication, before the tenant is known.
    async fn find_api_keys_by_prefix(&self, prefix: &str) -> Result<Vec<ApiKeyRecord>>;

    /// Backend name for logging
    fn backend_name(&self) -> &str;

    /// Cheap connectivity probe for readiness checks
    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}
