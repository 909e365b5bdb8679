//! Router tests driven through `tower::ServiceExt::oneshot`

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use chrono::{DateTime, Duration, TimeZone, Utc};
use revpulse_config::Settings;
use revpulse_core::{
    ApiKeyRecord, ApiScope, Campaign, Customer, EngagementLevel, Error, FixedClock, Lead,
    LeadSource, LeadStatus, RecordStore, Result,
};
use revpulse_persistence::InMemoryRecordStore;
use revpulse_server::{create_router, hash_api_key, AppState};
use rust_decimal_macros::dec;
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

const FULL_KEY: &str = "rp_live_full0000access";
const LEADS_KEY: &str = "rp_live_lead0000only";
const EXPIRED_KEY: &str = "rp_live_gone0000away";

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 17, 12, 0, 0).unwrap()
}

fn key(org: Uuid, raw: &str, scopes: &[&str]) -> ApiKeyRecord {
    ApiKeyRecord {
        id: Uuid::new_v4(),
        organization_id: org,
        key_prefix: raw[..8].to_string(),
        key_hash: hash_api_key(raw),
        name: raw.to_string(),
        scopes: scopes.iter().map(|s| ApiScope::parse(s)).collect(),
        expires_at: None,
        is_active: true,
    }
}

struct Fixture {
    org: Uuid,
    hot_lead: Uuid,
    customer: Uuid,
    app: Router,
}

fn fixture_with(settings: Settings) -> Fixture {
    let org = Uuid::new_v4();
    let other_org = Uuid::new_v4();
    let store = InMemoryRecordStore::new();

    let hot_lead = Uuid::from_u128(1);
    let campaign = Campaign::new(org, "Referral push")
        .with_id(Uuid::from_u128(20))
        .channel("referral")
        .spend(dec!(1000));
    store.insert_lead(
        Lead::new(org)
            .with_id(hot_lead)
            .name("Ada")
            .source(LeadSource::InboundReferral)
            .engagement(EngagementLevel::EmailReplied)
            .status(LeadStatus::Qualified)
            .last_activity(now())
            .campaign(campaign.id)
            .converted_with(dec!(3000)),
    );
    store.insert_lead(
        Lead::new(org)
            .with_id(Uuid::from_u128(2))
            .source(LeadSource::ColdList)
            .last_activity(now() - Duration::days(40)),
    );
    store.insert_lead(Lead::new(other_org).with_id(Uuid::from_u128(3)));
    store.insert_campaign(campaign);

    let customer = Uuid::from_u128(30);
    store.insert_customer(
        Customer::new(org)
            .with_id(customer)
            .company("Acme")
            .last_active(now() - Duration::days(20))
            .mrr(dec!(700))
            .previous_mrr(dec!(1000))
            .open_issues(4),
    );

    store.insert_api_key(key(org, FULL_KEY, &["read:*"]));
    store.insert_api_key(key(org, LEADS_KEY, &["read:leads"]));
    store.insert_api_key(ApiKeyRecord {
        expires_at: Some(now() - Duration::days(1)),
        ..key(org, EXPIRED_KEY, &["*"])
    });

    let state = AppState::with_clock(settings, Arc::new(store), Arc::new(FixedClock(now())));
    Fixture {
        org,
        hot_lead,
        customer,
        app: create_router(state),
    }
}

fn fixture() -> Fixture {
    fixture_with(Settings::default())
}

async fn get(app: &Router, uri: &str, api_key: Option<&str>) -> (StatusCode, Value) {
    let mut request = Request::builder().uri(uri);
    if let Some(api_key) = api_key {
        request = request.header(header::AUTHORIZATION, format!("Bearer {api_key}"));
    }
    let response = app
        .clone()
        .oneshot(request.body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

#[tokio::test]
async fn test_health_is_public() {
    let fx = fixture();
    let (status, body) = get(&fx.app, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");

    let (status, body) = get(&fx.app, "/ready", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["checks"]["store"]["backend"], "memory");
}

#[tokio::test]
async fn test_missing_and_malformed_authorization() {
    let fx = fixture();

    let (status, body) = get(&fx.app, "/api/v1/leads", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Missing Authorization header");

    let response = fx
        .app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/v1/leads")
                .header(header::AUTHORIZATION, "Token abc")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_unknown_and_expired_keys_rejected() {
    let fx = fixture();
    for bad in ["rp_live_full0000wrong", EXPIRED_KEY] {
        let (status, body) = get(&fx.app, "/api/v1/leads", Some(bad)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{bad}");
        assert_eq!(body["error"], "Invalid or expired API key");
    }
}

#[tokio::test]
async fn test_missing_scope_is_forbidden() {
    let fx = fixture();
    let (status, body) = get(&fx.app, "/api/v1/customers", Some(LEADS_KEY)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Insufficient permissions");
    assert_eq!(body["required_scopes"][0], "read:customers");
    assert_eq!(body["key_scopes"][0], "read:leads");
}

#[tokio::test]
async fn test_info_reports_caller() {
    let fx = fixture();
    let (status, body) = get(&fx.app, "/api/v1/info", Some(LEADS_KEY)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["organization_id"], fx.org.to_string());
    assert_eq!(body["scopes"][0], "read:leads");
    assert_eq!(body["environment"], "development");
    assert!(body["insights_model"].is_null());
}

#[tokio::test]
async fn test_leads_are_scored_and_scoped_to_tenant() {
    let fx = fixture();
    let (status, body) = get(&fx.app, "/api/v1/leads", Some(LEADS_KEY)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 2);
    assert_eq!(body["leads"][0]["id"], fx.hot_lead.to_string());
    assert_eq!(body["leads"][0]["score"], 80);
    assert_eq!(body["leads"][0]["temperature"], "hot");

    let (status, _) = get(&fx.app, "/api/v1/leads?sort=recent", Some(LEADS_KEY)).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = get(&fx.app, "/api/v1/leads?sort=bogus", Some(LEADS_KEY)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_lead_detail_and_not_found() {
    let fx = fixture();
    let uri = format!("/api/v1/leads/{}", fx.hot_lead);
    let (status, body) = get(&fx.app, &uri, Some(LEADS_KEY)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["lead"]["score"], 80);
    assert!(body["lead"]["score_breakdown"].is_object());

    // another tenant's lead
    let uri = format!("/api/v1/leads/{}", Uuid::from_u128(3));
    let (status, body) = get(&fx.app, &uri, Some(LEADS_KEY)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().starts_with("lead not found"));

    let (status, _) = get(&fx.app, "/api/v1/leads/not-a-uuid", Some(LEADS_KEY)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_lead_analysis_uses_fallback_without_generator() {
    let fx = fixture();
    let (status, body) = get(&fx.app, "/api/v1/leads/analysis", Some(LEADS_KEY)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["analysis"]["total_leads"], 2);
    assert_eq!(body["analysis"]["generated"], false);
    assert!(!body["analysis"]["insights"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_campaigns_and_dashboard() {
    let fx = fixture();
    let (status, body) = get(&fx.app, "/api/v1/campaigns", Some(FULL_KEY)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 1);
    assert_eq!(body["campaigns"][0]["roi_percentage"], "200.0%");
    assert_eq!(body["campaigns"][0]["performance"], "good");

    let (status, body) = get(&fx.app, "/api/v1/campaigns/analysis", Some(FULL_KEY)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["analysis"]["portfolio_roi_percentage"], "200.0%");

    // either read scope opens the RevOps dashboard
    let (status, body) = get(&fx.app, "/api/v1/revops/dashboard", Some(LEADS_KEY)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["dashboard"]["total_leads"], 2);
    assert_eq!(body["dashboard"]["hot_leads"], 1);
}

#[tokio::test]
async fn test_customer_routes() {
    let fx = fixture();
    let (status, body) = get(&fx.app, "/api/v1/customers?filter=at_risk", Some(FULL_KEY)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 1);

    let uri = format!("/api/v1/customers/{}", fx.customer);
    let (status, body) = get(&fx.app, &uri, Some(FULL_KEY)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["customer"]["health_score"], 5);
    assert_eq!(body["customer"]["churn_risk"]["level"], "critical");

    let (status, body) = get(&fx.app, "/api/v1/customers/dashboard", Some(FULL_KEY)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["dashboard"]["total_customers"], 1);
    assert_eq!(body["dashboard"]["alerts"][0]["company"], "Acme");
}

#[tokio::test]
async fn test_customer_filter_values() {
    let fx = fixture();
    let (status, body) = get(&fx.app, "/api/v1/customers?filter=none", Some(FULL_KEY)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 1);

    let (status, body) = get(&fx.app, "/api/v1/customers", Some(FULL_KEY)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 1);

    let (status, body) = get(&fx.app, "/api/v1/customers?filter=healthy", Some(FULL_KEY)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 0);

    let (status, _) = get(&fx.app, "/api/v1/customers?filter=churned", Some(FULL_KEY)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_disabled_auth_reads_organization_header() {
    let mut settings = Settings::default();
    settings.auth.enabled = false;
    let fx = fixture_with(settings);

    let (status, _) = get(&fx.app, "/api/v1/leads", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let response = fx
        .app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/v1/customers")
                .header("X-Organization-Id", fx.org.to_string())
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_metrics_disabled_without_recorder() {
    let fx = fixture();
    let (status, _) = get(&fx.app, "/metrics", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

struct DownStore;

#[async_trait]
impl RecordStore for DownStore {
    async fn list_leads(&self, _org: Uuid) -> Result<Vec<Lead>> {
        Err(Error::Store("connection refused".into()))
    }
    async fn get_lead(&self, _org: Uuid, _id: Uuid) -> Result<Option<Lead>> {
        Err(Error::Store("connection refused".into()))
    }
    async fn list_campaigns(&self, _org: Uuid) -> Result<Vec<Campaign>> {
        Err(Error::Store("connection refused".into()))
    }
    async fn list_customers(&self, _org: Uuid) -> Result<Vec<Customer>> {
        Err(Error::Store("connection refused".into()))
    }
    async fn get_customer(&self, _org: Uuid, _id: Uuid) -> Result<Option<Customer>> {
        Err(Error::Store("connection refused".into()))
    }
    async fn find_api_keys_by_prefix(&self, _prefix: &str) -> Result<Vec<ApiKeyRecord>> {
        Err(Error::Store("connection refused".into()))
    }
    fn backend_name(&self) -> &str {
        "down"
    }
    async fn ping(&self) -> Result<()> {
        Err(Error::Store("connection refused".into()))
    }
}

#[tokio::test]
async fn test_store_outage_maps_to_502_and_503() {
    let state = AppState::with_clock(
        Settings::default(),
        Arc::new(DownStore),
        Arc::new(FixedClock(now())),
    );
    let app = create_router(state);

    let (status, body) = get(&app, "/ready", None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["status"], "not_ready");

    let (status, body) = get(&app, "/api/v1/leads", Some(FULL_KEY)).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"], "Bad Gateway");
}

#[tokio::test]
async fn test_bundled_seed_serves_demo_key() {
    let seed = concat!(env!("CARGO_MANIFEST_DIR"), "/../../config/seed.json");
    let store = InMemoryRecordStore::from_seed_file(seed).unwrap();
    let state = AppState::with_clock(Settings::default(), Arc::new(store), Arc::new(FixedClock(now())));
    let app = create_router(state);

    let (status, body) = get(&app, "/api/v1/revops/dashboard", Some("rp_live_demo7f3c9a2e51")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["dashboard"]["total_leads"], 4);

    let (status, body) = get(&app, "/api/v1/customers", Some("rp_live_demo7f3c9a2e51")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 3);
}
