//! API key authentication
//!
//! Clients send `Authorization: Bearer <api_key>`. The first
//! `auth.api_key_prefix_len` characters of the key select candidate rows;
//! the SHA-256 of the full key must match one of them, compared in constant
//! time. The matching key's organization and scopes are attached to the
//! request as a [`KeyContext`].
//!
//! With `auth.enabled = false` (development only) the organization is taken
//! from the `X-Organization-Id` header and every scope is granted.

use axum::extract::{Request, State};
use axum::http::{header, HeaderMap};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use chrono::{DateTime, Utc};
use revpulse_core::{ApiScope, KeyContext, RecordStore};
use sha2::{Digest, Sha256};
use std::sync::atomic::{AtomicBool, Ordering};
use uuid::Uuid;

use crate::state::AppState;
use crate::ServerError;

/// Tenant header honoured only while authentication is disabled
pub const ORGANIZATION_HEADER: &str = "x-organization-id";

static AUTH_DISABLED_WARNED: AtomicBool = AtomicBool::new(false);

const MISSING_HEADER: &str = "Missing Authorization header";
const BAD_FORMAT: &str = "Invalid Authorization header format. Use: Bearer <api_key>";
const INVALID_KEY: &str = "Invalid or expired API key";

/// Lower-case hex SHA-256 of a full API key
pub fn hash_api_key(key: &str) -> String {
    hex::encode(Sha256::digest(key.as_bytes()))
}

/// Constant-time comparison to prevent timing attacks
fn constant_time_compare(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }
    result == 0
}

/// Extract the key from an `Authorization` header value
fn bearer_token(value: Option<&str>) -> Result<&str, ServerError> {
    let value = value.ok_or_else(|| ServerError::Unauthorized(MISSING_HEADER.to_string()))?;
    value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|key| !key.is_empty())
        .ok_or_else(|| ServerError::Unauthorized(BAD_FORMAT.to_string()))
}

/// Resolve an `Authorization` header value to a key context
pub async fn authenticate(
    store: &dyn RecordStore,
    authorization: Option<&str>,
    prefix_len: usize,
    now: DateTime<Utc>,
) -> Result<KeyContext, ServerError> {
    let key = bearer_token(authorization)?;
    let prefix = key
        .get(..prefix_len)
        .ok_or_else(|| ServerError::Unauthorized(INVALID_KEY.to_string()))?;

    let candidates = store.find_api_keys_by_prefix(prefix).await?;
    let hash = hash_api_key(key);

    candidates
        .iter()
        .find(|record| {
            record.key_prefix == prefix
                && constant_time_compare(
                    record.key_hash.to_ascii_lowercase().as_bytes(),
                    hash.as_bytes(),
                )
        })
        .filter(|record| record.is_usable(now))
        .map(|record| record.context())
        .ok_or_else(|| {
            tracing::warn!(key_prefix = %prefix, "Rejected API key");
            ServerError::Unauthorized(INVALID_KEY.to_string())
        })
}

/// Context used when authentication is disabled
fn development_context(headers: &HeaderMap) -> Result<KeyContext, ServerError> {
    if !AUTH_DISABLED_WARNED.swap(true, Ordering::Relaxed) {
        tracing::warn!(
            "API authentication is DISABLED! Set REVPULSE__AUTH__ENABLED=true for production."
        );
    }

    let organization_id = headers
        .get(ORGANIZATION_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| Uuid::parse_str(v.trim()).ok())
        .ok_or_else(|| {
            ServerError::InvalidRequest(
                "X-Organization-Id header is required while authentication is disabled".into(),
            )
        })?;

    Ok(KeyContext {
        organization_id,
        key_id: Uuid::nil(),
        scopes: vec![ApiScope::All],
    })
}

/// Authentication middleware attaching a [`KeyContext`] to every non-public request
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let auth = &state.settings.auth;
    let path = request.uri().path();

    if auth.public_paths.iter().any(|p| path.starts_with(p.as_str())) {
        return next.run(request).await;
    }

    let context = if auth.enabled {
        let authorization = request
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok());
        authenticate(
            state.store.as_ref(),
            authorization,
            auth.api_key_prefix_len,
            state.clock.now(),
        )
        .await
    } else {
        development_context(request.headers())
    };

    match context {
        Ok(context) => {
            request.extensions_mut().insert(context);
            next.run(request).await
        }
        Err(e) => e.into_response(),
    }
}

/// Fail with 403 unless the key holds one of `required`
pub fn require_scopes(context: &KeyContext, required: &[&str]) -> Result<(), ServerError> {
    if context.permits(required) {
        return Ok(());
    }
    Err(ServerError::Forbidden {
        required: required.iter().map(|s| s.to_string()).collect(),
        key_scopes: context.scope_names(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use revpulse_core::ApiKeyRecord;
    use revpulse_persistence::InMemoryRecordStore;

    const KEY: &str = "rp_live_3f9a2c7d1e";

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 17, 12, 0, 0).unwrap()
    }

    fn store_with(record: ApiKeyRecord) -> InMemoryRecordStore {
        let store = InMemoryRecordStore::new();
        store.insert_api_key(record);
        store
    }

    fn record() -> ApiKeyRecord {
        ApiKeyRecord {
            id: Uuid::new_v4(),
            organization_id: Uuid::new_v4(),
            key_prefix: KEY[..8].to_string(),
            key_hash: hash_api_key(KEY),
            name: "test".to_string(),
            scopes: vec![ApiScope::parse("read:leads")],
            expires_at: None,
            is_active: true,
        }
    }

    #[test]
    fn test_constant_time_compare() {
        assert!(constant_time_compare(b"secret", b"secret"));
        assert!(!constant_time_compare(b"secret", b"secre"));
        assert!(!constant_time_compare(b"secret", b"secreT"));
    }

    #[test]
    fn test_hash_is_lowercase_hex() {
        let hash = hash_api_key("abc");
        assert_eq!(
            hash,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_bearer_parsing() {
        assert_eq!(bearer_token(Some("Bearer abc")).unwrap(), "abc");
        assert_eq!(
            bearer_token(None).unwrap_err().to_string(),
            MISSING_HEADER
        );
        assert_eq!(
            bearer_token(Some("Basic abc")).unwrap_err().to_string(),
            BAD_FORMAT
        );
        assert_eq!(
            bearer_token(Some("Bearer   ")).unwrap_err().to_string(),
            BAD_FORMAT
        );
    }

    #[tokio::test]
    async fn test_valid_key_yields_context() {
        let record = record();
        let store = store_with(record.clone());
        let ctx = authenticate(&store, Some(&format!("Bearer {KEY}")), 8, now())
            .await
            .unwrap();
        assert_eq!(ctx.organization_id, record.organization_id);
        assert_eq!(ctx.key_id, record.id);
    }

    #[tokio::test]
    async fn test_wrong_key_with_same_prefix_rejected() {
        let store = store_with(record());
        let err = authenticate(&store, Some("Bearer rp_live_wrong"), 8, now())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), INVALID_KEY);
    }

    #[tokio::test]
    async fn test_inactive_and_expired_keys_rejected() {
        let inactive = ApiKeyRecord {
            is_active: false,
            ..record()
        };
        let store = store_with(inactive);
        assert!(authenticate(&store, Some(&format!("Bearer {KEY}")), 8, now())
            .await
            .is_err());

        let expired = ApiKeyRecord {
            expires_at: Some(now() - Duration::seconds(1)),
            ..record()
        };
        let store = store_with(expired);
        assert!(authenticate(&store, Some(&format!("Bearer {KEY}")), 8, now())
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_short_key_rejected() {
        let store = store_with(record());
        let err = authenticate(&store, Some("Bearer rp"), 8, now())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), INVALID_KEY);
    }

    #[test]
    fn test_require_scopes() {
        let ctx = record().context();
        assert!(require_scopes(&ctx, &[ApiScope::READ_LEADS]).is_ok());

        match require_scopes(&ctx, &[ApiScope::READ_CUSTOMERS]) {
            Err(ServerError::Forbidden {
                required,
                key_scopes,
            }) => {
                assert_eq!(required, vec!["read:customers"]);
                assert_eq!(key_scopes, vec!["read:leads"]);
            }
            other => panic!("expected forbidden, got {other:?}"),
        }
    }

    #[test]
    fn test_development_context_requires_org_header() {
        let mut headers = HeaderMap::new();
        assert!(development_context(&headers).is_err());

        let org = Uuid::new_v4();
        headers.insert(ORGANIZATION_HEADER, org.to_string().parse().unwrap());
        let ctx = development_context(&headers).unwrap();
        assert_eq!(ctx.organization_id, org);
        assert!(ctx.permits(&[ApiScope::READ_CUSTOMERS]));
    }
}
