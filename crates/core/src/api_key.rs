//! API key records and scope checks
//!
//! Keys look like `rp_live_<random>`. The first `prefix_len` characters are
//! stored in clear for lookup; the full key is only ever kept as a hash.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Permission scope attached to an API key
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ApiScope {
    /// `*`
    All,
    /// `read:*`
    ReadAll,
    /// `write:*`
    WriteAll,
    /// `read:leads`, `read:campaigns`, ...
    Named(String),
}

impl ApiScope {
    pub const READ_LEADS: &'static str = "read:leads";
    pub const READ_CAMPAIGNS: &'static str = "read:campaigns";
    pub const READ_CUSTOMERS: &'static str = "read:customers";

    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "*" => Self::All,
            "read:*" => Self::ReadAll,
            "write:*" => Self::WriteAll,
            other => Self::Named(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::All => "*",
            Self::ReadAll => "read:*",
            Self::WriteAll => "write:*",
            Self::Named(s) => s,
        }
    }

    /// Wildcard scopes grant every route
    pub fn is_wildcard(&self) -> bool {
        matches!(self, Self::All | Self::ReadAll | Self::WriteAll)
    }
}

impl From<String> for ApiScope {
    fn from(raw: String) -> Self {
        Self::parse(&raw)
    }
}

impl From<ApiScope> for String {
    fn from(scope: ApiScope) -> Self {
        scope.as_str().to_string()
    }
}

impl fmt::Display for ApiScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn default_active() -> bool {
    true
}

/// Stored API key row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiKeyRecord {
    pub id: Uuid,

    pub organization_id: Uuid,

    /// Clear-text key prefix used for lookup
    pub key_prefix: String,

    /// Lower-case hex SHA-256 of the full key
    pub key_hash: String,

    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub scopes: Vec<ApiScope>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,

    #[serde(default = "default_active")]
    pub is_active: bool,
}

impl ApiKeyRecord {
    /// Whether the key may be used at `now`
    pub fn is_usable(&self, now: DateTime<Utc>) -> bool {
        self.is_active && self.expires_at.map_or(true, |exp| now <= exp)
    }

    /// Authenticated context for this key
    pub fn context(&self) -> KeyContext {
        KeyContext {
            organization_id: self.organization_id,
            key_id: self.id,
            scopes: self.scopes.clone(),
        }
    }
}

/// Identity established by a valid API key, attached to each request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeyContext {
    pub organization_id: Uuid,
    pub key_id: Uuid,
    pub scopes: Vec<ApiScope>,
}

impl KeyContext {
    /// True when any wildcard scope is held, or any of `required` is held
    ///
    /// An empty `required` list always passes.
    pub fn permits(&self, required: &[&str]) -> bool {
        if required.is_empty() || self.scopes.iter().any(ApiScope::is_wildcard) {
            return true;
        }
        required
            .iter()
            .any(|req| self.scopes.iter().any(|held| held.as_str() == *req))
    }

    pub fn scope_names(&self) -> Vec<String> {
        self.scopes.iter().map(|s| s.as_str().to_string()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn record(scopes: &[&str]) -> ApiKeyRecord {
        ApiKeyRecord {
            id: Uuid::new_v4(),
            organization_id: Uuid::new_v4(),
            key_prefix: "rp_live_".to_string(),
            key_hash: String::new(),
            name: "ci".to_string(),
            scopes: scopes.iter().map(|s| ApiScope::parse(s)).collect(),
            expires_at: None,
            is_active: true,
        }
    }

    #[test]
    fn test_wildcards_grant_everything() {
        for wildcard in ["*", "read:*", "write:*"] {
            let ctx = record(&[wildcard]).context();
            assert!(ctx.permits(&[ApiScope::READ_CUSTOMERS]), "{wildcard}");
        }
    }

    #[test]
    fn test_named_scope_must_match() {
        let ctx = record(&["read:leads"]).context();
        assert!(ctx.permits(&[ApiScope::READ_LEADS]));
        assert!(!ctx.permits(&[ApiScope::READ_CUSTOMERS]));
        assert!(ctx.permits(&[]));
    }

    #[test]
    fn test_usable_checks_active_and_expiry() {
        let now = Utc.with_ymd_and_hms(2026, 10, 17, 0, 0, 0).unwrap();
        let mut key = record(&["*"]);
        assert!(key.is_usable(now));

        key.expires_at = Some(now - Duration::seconds(1));
        assert!(!key.is_usable(now));

        key.expires_at = Some(now + Duration::days(1));
        key.is_active = false;
        assert!(!key.is_usable(now));
    }

    #[test]
    fn test_scopes_deserialize_from_strings() {
        let row = serde_json::json!({
            "id": "6a1f0c1e-9a43-4a55-9f43-1f3b7f1f2a10",
            "organization_id": "0b8e3c55-3f8a-4a11-8d65-2a8c2c7e9d01",
            "key_prefix": "rp_live_",
            "key_hash": "ab",
            "scopes": ["read:*", "read:leads"]
        });
        let key: ApiKeyRecord = serde_json::from_value(row).unwrap();
        assert_eq!(key.scopes, vec![ApiScope::ReadAll, ApiScope::Named("read:leads".into())]);
        assert!(key.is_active);
    }
}
