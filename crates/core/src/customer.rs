//! Customer records used for health monitoring

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::lead::null_as_default;
use crate::traits::days_since;

fn default_plan() -> String {
    "free".to_string()
}

/// A `null` plan column reads as the free plan
fn null_as_free_plan<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_else(default_plan))
}

/// Open-ended customer metadata
///
/// Only the recognised keys are typed; everything else is preserved verbatim
/// in `extra` so it round-trips back to API consumers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CustomerMetadata {
    /// Unresolved support issues
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub open_issues: Option<i64>,

    /// Usage tier reported by product analytics ("low" | "high")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage_tier: Option<String>,

    /// Number of teams active in the account
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team_count: Option<i64>,

    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl CustomerMetadata {
    /// Open issues, 0 when absent
    pub fn open_issues(&self) -> i64 {
        self.open_issues.unwrap_or(0)
    }

    /// True only when the usage tier is exactly "high"
    pub fn is_high_usage(&self) -> bool {
        self.usage_tier.as_deref() == Some("high")
    }

    /// Team count, 1 when absent
    pub fn team_count(&self) -> i64 {
        self.team_count.unwrap_or(1)
    }
}

/// Customer record as stored
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub id: Uuid,

    pub organization_id: Uuid,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    #[serde(default = "default_plan", deserialize_with = "null_as_free_plan")]
    pub plan: String,

    /// Current monthly recurring revenue
    #[serde(default, deserialize_with = "null_as_default")]
    pub mrr: Decimal,

    /// MRR at the previous snapshot, if one exists
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_mrr: Option<Decimal>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_active: Option<DateTime<Utc>>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub metadata: CustomerMetadata,
}

impl Customer {
    pub fn new(organization_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            organization_id,
            company: None,
            email: None,
            plan: default_plan(),
            mrr: Decimal::ZERO,
            previous_mrr: None,
            last_active: None,
            metadata: CustomerMetadata::default(),
        }
    }

    pub fn with_id(mut self, id: Uuid) -> Self {
        self.id = id;
        self
    }

    pub fn company(mut self, company: impl Into<String>) -> Self {
        self.company = Some(company.into());
        self
    }

    pub fn plan(mut self, plan: impl Into<String>) -> Self {
        self.plan = plan.into();
        self
    }

    pub fn mrr(mut self, mrr: Decimal) -> Self {
        self.mrr = mrr;
        self
    }

    pub fn previous_mrr(mut self, previous: Decimal) -> Self {
        self.previous_mrr = Some(previous);
        self
    }

    pub fn last_active(mut self, at: DateTime<Utc>) -> Self {
        self.last_active = Some(at);
        self
    }

    pub fn open_issues(mut self, count: i64) -> Self {
        self.metadata.open_issues = Some(count);
        self
    }

    pub fn usage_tier(mut self, tier: impl Into<String>) -> Self {
        self.metadata.usage_tier = Some(tier.into());
        self
    }

    pub fn team_count(mut self, count: i64) -> Self {
        self.metadata.team_count = Some(count);
        self
    }

    /// Previous MRR, falling back to the current MRR when no snapshot exists
    pub fn baseline_mrr(&self) -> Decimal {
        self.previous_mrr.unwrap_or(self.mrr)
    }

    /// Lower-cased plan name for comparisons
    pub fn plan_key(&self) -> String {
        self.plan.trim().to_lowercase()
    }

    /// Whole days since the customer was last active, `None` without activity data
    pub fn days_inactive(&self, now: DateTime<Utc>) -> Option<i64> {
        self.last_active.map(|at| days_since(now, at))
    }

    /// Display name (company or "Customer")
    pub fn display_name(&self) -> &str {
        self.company.as_deref().unwrap_or("Customer")
    }
}
