//! RevPulse HTTP server
//!
//! Exposes the lead, campaign and customer health services over a
//! read-only JSON API. Every `/api` route is authenticated with a per-tenant
//! API key; health, readiness and metrics are public.

pub mod auth;
pub mod http;
pub mod metrics;
pub mod state;

pub use auth::{auth_middleware, hash_api_key};
pub use http::create_router;
pub use metrics::init_metrics;
pub use state::AppState;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use revpulse_services::ServiceError;
use thiserror::Error;

/// Server errors
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("{0}")]
    Unauthorized(String),

    #[error("Insufficient permissions")]
    Forbidden {
        required: Vec<String>,
        key_scopes: Vec<String>,
    },

    #[error("{0}")]
    NotFound(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ServerError {
    pub fn status(&self) -> StatusCode {
        match self {
            ServerError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ServerError::Forbidden { .. } => StatusCode::FORBIDDEN,
            ServerError::NotFound(_) => StatusCode::NOT_FOUND,
            ServerError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::Upstream(_) => StatusCode::BAD_GATEWAY,
            ServerError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            ServerError::Forbidden {
                required,
                key_scopes,
            } => serde_json::json!({
                "error": self.to_string(),
                "required_scopes": required,
                "key_scopes": key_scopes,
            }),
            // upstream details stay in the logs
            ServerError::Upstream(detail) | ServerError::Internal(detail) => {
                tracing::error!(status = status.as_u16(), error = %detail, "Request failed");
                serde_json::json!({ "error": status.canonical_reason().unwrap_or("Error") })
            }
            _ => serde_json::json!({ "error": self.to_string() }),
        };
        (status, Json(body)).into_response()
    }
}

impl From<ServiceError> for ServerError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::NotFound { .. } => ServerError::NotFound(err.to_string()),
            ServiceError::Store(detail) => ServerError::Upstream(detail),
        }
    }
}

impl From<revpulse_core::Error> for ServerError {
    fn from(err: revpulse_core::Error) -> Self {
        ServerError::from(ServiceError::from(err))
    }
}
