//! HTTP Endpoints
//!
//! Read-only JSON API over leads, campaigns and customers. Every `/api`
//! handler receives the caller's [`KeyContext`] from the auth middleware and
//! scopes its query to that key's organization.

use std::time::Duration;

use axum::{
    extract::{Path, Query, State},
    http::{HeaderValue, Method, StatusCode},
    middleware,
    routing::get,
    Extension, Json, Router,
};
use revpulse_core::{ApiScope, KeyContext};
use revpulse_services::{CustomerFilter, LeadSort};
use serde::Deserialize;
use serde_json::{json, Value};
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::auth::{auth_middleware, require_scopes};
use crate::metrics::{metrics_handler, track_requests};
use crate::state::AppState;
use crate::ServerError;

type ApiResult = Result<Json<Value>, ServerError>;

const DEFAULT_ORIGIN: &str = "http://localhost:3000";

/// Create the application router
pub fn create_router(state: AppState) -> Router {
    let server = &state.settings.server;
    let cors_layer = build_cors_layer(&server.cors_origins, server.cors_enabled);
    let timeout = Duration::from_secs(server.request_timeout_secs);

    Router::new()
        // Health check
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        // Prometheus metrics
        .route("/metrics", get(metrics_handler))
        .route("/api/v1/info", get(api_info))
        // Leads
        .route("/api/v1/leads", get(list_leads))
        .route("/api/v1/leads/analysis", get(analyze_leads))
        .route("/api/v1/leads/:id", get(get_lead))
        // Campaigns
        .route("/api/v1/campaigns", get(list_campaigns))
        .route("/api/v1/campaigns/analysis", get(analyze_campaigns))
        .route("/api/v1/revops/dashboard", get(revops_dashboard))
        // Customers
        .route("/api/v1/customers", get(list_customers))
        .route("/api/v1/customers/dashboard", get(customer_dashboard))
        .route("/api/v1/customers/:id", get(get_customer))
        // auth runs inside the request counter so rejections are recorded
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ))
        .route_layer(middleware::from_fn(track_requests))
        .layer(TimeoutLayer::new(timeout))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(cors_layer)
        .with_state(state)
}

/// Build CORS layer from configured origins
///
/// - If cors_enabled is false, returns permissive layer (for dev)
/// - If cors_origins is empty, defaults to localhost:3000
/// - Otherwise, uses the configured origins
fn build_cors_layer(origins: &[String], enabled: bool) -> CorsLayer {
    if !enabled {
        tracing::warn!("CORS is disabled - allowing all origins (NOT FOR PRODUCTION)");
        return CorsLayer::permissive();
    }

    let parsed_origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| {
            origin.parse::<HeaderValue>().ok().or_else(|| {
                tracing::warn!("Invalid CORS origin: {}", origin);
                None
            })
        })
        .collect();

    if parsed_origins.is_empty() {
        if !origins.is_empty() {
            tracing::error!("All configured CORS origins are invalid, falling back to localhost");
        } else {
            tracing::info!("No CORS origins configured, defaulting to localhost:3000");
        }
        return CorsLayer::new()
            .allow_origin(HeaderValue::from_static(DEFAULT_ORIGIN))
            .allow_methods([Method::GET, Method::OPTIONS])
            .allow_headers(Any);
    }

    tracing::info!("CORS configured with {} origins", parsed_origins.len());
    CorsLayer::new()
        .allow_origin(parsed_origins)
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers(Any)
        .allow_credentials(true)
}

/// Path ids that are not UUIDs cannot name a record
fn parse_id(kind: &str, raw: &str) -> Result<Uuid, ServerError> {
    Uuid::parse_str(raw).map_err(|_| ServerError::NotFound(format!("{kind} not found: {raw}")))
}

async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Ready once the record store answers
async fn readiness_check(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    let backend = state.store.backend_name().to_string();
    let (ready, store_status) = match state.store.ping().await {
        Ok(()) => (true, json!({ "status": "ok", "backend": backend })),
        Err(e) => {
            tracing::warn!(backend = %backend, error = %e, "Record store not reachable");
            (false, json!({ "status": "unreachable", "backend": backend }))
        }
    };

    let status_code = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status_code,
        Json(json!({
            "status": if ready { "ready" } else { "not_ready" },
            "checks": { "store": store_status },
        })),
    )
}

/// Caller identity and server capabilities
async fn api_info(
    State(state): State<AppState>,
    Extension(key): Extension<KeyContext>,
) -> Json<Value> {
    Json(json!({
        "name": "revpulse",
        "version": env!("CARGO_PKG_VERSION"),
        "environment": state.settings.environment,
        "organization_id": key.organization_id,
        "scopes": key.scope_names(),
        "store": state.store.backend_name(),
        "insights_model": state.generator_model,
    }))
}

#[derive(Debug, Deserialize)]
struct LeadQuery {
    #[serde(default)]
    sort: LeadSort,
}

async fn list_leads(
    State(state): State<AppState>,
    Extension(key): Extension<KeyContext>,
    Query(query): Query<LeadQuery>,
) -> ApiResult {
    require_scopes(&key, &[ApiScope::READ_LEADS])?;
    let leads = state
        .revops
        .list_leads(key.organization_id, query.sort)
        .await?;
    Ok(Json(json!({ "count": leads.len(), "leads": leads })))
}

async fn get_lead(
    State(state): State<AppState>,
    Extension(key): Extension<KeyContext>,
    Path(id): Path<String>,
) -> ApiResult {
    require_scopes(&key, &[ApiScope::READ_LEADS])?;
    let id = parse_id("lead", &id)?;
    let lead = state.revops.get_lead(key.organization_id, id).await?;
    Ok(Json(json!({ "lead": lead })))
}

async fn analyze_leads(
    State(state): State<AppState>,
    Extension(key): Extension<KeyContext>,
) -> ApiResult {
    require_scopes(&key, &[ApiScope::READ_LEADS])?;
    let analysis = state.revops.analyze_leads(key.organization_id).await?;
    Ok(Json(json!({ "analysis": analysis })))
}

async fn list_campaigns(
    State(state): State<AppState>,
    Extension(key): Extension<KeyContext>,
) -> ApiResult {
    require_scopes(&key, &[ApiScope::READ_CAMPAIGNS])?;
    let campaigns = state.revops.list_campaigns(key.organization_id).await?;
    Ok(Json(json!({ "count": campaigns.len(), "campaigns": campaigns })))
}

async fn analyze_campaigns(
    State(state): State<AppState>,
    Extension(key): Extension<KeyContext>,
) -> ApiResult {
    require_scopes(&key, &[ApiScope::READ_CAMPAIGNS])?;
    let analysis = state.revops.analyze_campaigns(key.organization_id).await?;
    Ok(Json(json!({ "analysis": analysis })))
}

/// Lead funnel and campaign summary; either read scope suffices
async fn revops_dashboard(
    State(state): State<AppState>,
    Extension(key): Extension<KeyContext>,
) -> ApiResult {
    require_scopes(&key, &[ApiScope::READ_LEADS, ApiScope::READ_CAMPAIGNS])?;
    let dashboard = state.revops.dashboard(key.organization_id).await?;
    Ok(Json(json!({ "dashboard": dashboard })))
}

#[derive(Debug, Deserialize)]
struct CustomerQuery {
    filter: Option<CustomerFilter>,
}

async fn list_customers(
    State(state): State<AppState>,
    Extension(key): Extension<KeyContext>,
    Query(query): Query<CustomerQuery>,
) -> ApiResult {
    require_scopes(&key, &[ApiScope::READ_CUSTOMERS])?;
    let customers = state
        .customers
        .list_customers(key.organization_id, query.filter)
        .await?;
    Ok(Json(json!({ "count": customers.len(), "customers": customers })))
}

async fn get_customer(
    State(state): State<AppState>,
    Extension(key): Extension<KeyContext>,
    Path(id): Path<String>,
) -> ApiResult {
    require_scopes(&key, &[ApiScope::READ_CUSTOMERS])?;
    let id = parse_id("customer", &id)?;
    let customer = state.customers.get_customer(key.organization_id, id).await?;
    Ok(Json(json!({ "customer": customer })))
}

async fn customer_dashboard(
    State(state): State<AppState>,
    Extension(key): Extension<KeyContext>,
) -> ApiResult {
    require_scopes(&key, &[ApiScope::READ_CUSTOMERS])?;
    let dashboard = state.customers.dashboard(key.organization_id).await?;
    Ok(Json(json!({ "dashboard": dashboard })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use revpulse_config::Settings;
    use revpulse_persistence::InMemoryRecordStore;
    use std::sync::Arc;

    #[test]
    fn test_router_creation() {
        let state = AppState::new(Settings::default(), Arc::new(InMemoryRecordStore::new()));
        let _ = create_router(state);
    }

    #[test]
    fn test_cors_layer_variants() {
        let _ = build_cors_layer(&[], true);
        let _ = build_cors_layer(&[], false);
        let _ = build_cors_layer(&["https://app.example.com".to_string()], true);
        let _ = build_cors_layer(&["bad\norigin".to_string()], true);
    }

    #[test]
    fn test_parse_id() {
        let id = Uuid::new_v4();
        assert_eq!(parse_id("lead", &id.to_string()).unwrap(), id);

        let err = parse_id("lead", "nope").unwrap_err();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(err.to_string(), "lead not found: nope");
    }
}
