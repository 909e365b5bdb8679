//! `RecordStore` backed by the REST query API

use async_trait::async_trait;
use revpulse_core::{ApiKeyRecord, Campaign, Customer, Lead, RecordStore, Result};
use uuid::Uuid;

use crate::client::{Filter, RestClient};

pub const LEADS_TABLE: &str = "leads";
pub const CAMPAIGNS_TABLE: &str = "campaigns";
pub const CUSTOMERS_TABLE: &str = "customers";
pub const API_KEYS_TABLE: &str = "api_keys";

/// Read-only store over the hosted relational database
#[derive(Clone)]
pub struct RestRecordStore {
    client: RestClient,
}

impl RestRecordStore {
    pub fn new(client: RestClient) -> Self {
        Self { client }
    }

    async fn list_for_org<T>(&self, table: &str, org: Uuid) -> Result<Vec<T>>
    where
        T: serde::de::DeserializeOwned,
    {
        let rows = self
            .client
            .select(table, &[Filter::eq("organization_id", org)])
            .await?;
        Ok(rows)
    }

    async fn get_for_org<T>(&self, table: &str, org: Uuid, id: Uuid) -> Result<Option<T>>
    where
        T: serde::de::DeserializeOwned,
    {
        let rows: Vec<T> = self
            .client
            .select(
                table,
                &[Filter::eq("organization_id", org), Filter::eq("id", id)],
            )
            .await?;
        Ok(rows.into_iter().next())
    }
}

#[async_trait]
impl RecordStore for RestRecordStore {
    async fn list_leads(&self, org: Uuid) -> Result<Vec<Lead>> {
        self.list_for_org(LEADS_TABLE, org).await
    }

    async fn get_lead(&self, org: Uuid, id: Uuid) -> Result<Option<Lead>> {
        self.get_for_org(LEADS_TABLE, org, id).await
    }

    async fn list_campaigns(&self, org: Uuid) -> Result<Vec<Campaign>> {
        self.list_for_org(CAMPAIGNS_TABLE, org).await
    }

    async fn list_customers(&self, org: Uuid) -> Result<Vec<Customer>> {
        self.list_for_org(CUSTOMERS_TABLE, org).await
    }

    async fn get_customer(&self, org: Uuid, id: Uuid) -> Result<Option<Customer>> {
        self.get_for_org(CUSTOMERS_TABLE, org, id).await
    }

    async fn find_api_keys_by_prefix(&self, prefix: &str) -> Result<Vec<ApiKeyRecord>> {
        let rows = self
            .client
            .select(
                API_KEYS_TABLE,
                &[
                    Filter::eq("key_prefix", prefix),
                    Filter::eq("is_active", true),
                ],
            )
            .await?;
        Ok(rows)
    }

    fn backend_name(&self) -> &str {
        "rest"
    }

    async fn ping(&self) -> Result<()> {
        self.client.ping().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::RestConfig;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn store(server: &MockServer) -> RestRecordStore {
        let config = RestConfig::new(format!("{}/rest/v1", server.uri())).with_service_key("svc");
        RestRecordStore::new(RestClient::new(config).unwrap())
    }

    #[tokio::test]
    async fn test_list_leads_filters_by_org() {
        let server = MockServer::start().await;
        let org = Uuid::new_v4();

        Mock::given(method("GET"))
            .and(path("/rest/v1/leads"))
            .and(query_param("select", "*"))
            .and(query_param("organization_id", format!("eq.{org}")))
            .and(header("apikey", "svc"))
            .and(header("authorization", "Bearer svc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {
                    "id": Uuid::new_v4(),
                    "organization_id": org,
                    "source": "paid_ads",
                    "engagement_level": null,
                    "status": "qualified",
                    "revenue": 120.5,
                    "converted": true
                }
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let leads = store(&server).list_leads(org).await.unwrap();
        assert_eq!(leads.len(), 1);
        assert_eq!(leads[0].organization_id, org);
        assert!(leads[0].converted);
    }

    #[tokio::test]
    async fn test_get_customer_missing_is_none() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/rest/v1/customers"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
            .mount(&server)
            .await;

        let found = store(&server)
            .get_customer(Uuid::new_v4(), Uuid::new_v4())
            .await
            .unwrap();
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn test_api_keys_lookup_uses_prefix_and_active() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/rest/v1/api_keys"))
            .and(query_param("key_prefix", "eq.rp_live_"))
            .and(query_param("is_active", "eq.true"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
            .expect(1)
            .mount(&server)
            .await;

        let keys = store(&server).find_api_keys_by_prefix("rp_live_").await.unwrap();
        assert!(keys.is_empty());
    }

    #[tokio::test]
    async fn test_error_status_becomes_store_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/rest/v1/campaigns"))
            .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
            .mount(&server)
            .await;

        let err = store(&server)
            .list_campaigns(Uuid::new_v4())
            .await
            .unwrap_err();
        assert!(matches!(err, revpulse_core::Error::Store(_)));
        assert!(err.to_string().contains("503"));
    }

    #[tokio::test]
    async fn test_malformed_rows_are_reported() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/rest/v1/customers"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!([{ "id": "nope" }])),
            )
            .mount(&server)
            .await;

        let err = store(&server)
            .list_customers(Uuid::new_v4())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("customers"));
    }
}
