//! Marketing campaign records

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::lead::null_as_default;

/// Campaign record as stored
///
/// `revenue` is the revenue reported for the campaign itself (e.g. imported
/// alongside spend). Revenue attributed through converted leads is aggregated
/// on read and never written back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Campaign {
    pub id: Uuid,

    pub organization_id: Uuid,

    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,

    /// Acquisition channel (e.g. "linkedin", "google_ads")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub spend: Decimal,

    #[serde(default, deserialize_with = "null_as_default")]
    pub revenue: Decimal,

    /// Free-form reporting period label (e.g. "2026-Q3")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Campaign {
    pub fn new(organization_id: Uuid, name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            organization_id,
            name: name.into(),
            channel: None,
            spend: Decimal::ZERO,
            revenue: Decimal::ZERO,
            period: None,
            created_at: None,
        }
    }

    pub fn with_id(mut self, id: Uuid) -> Self {
        self.id = id;
        self
    }

    pub fn channel(mut self, channel: impl Into<String>) -> Self {
        self.channel = Some(channel.into());
        self
    }

    pub fn spend(mut self, spend: Decimal) -> Self {
        self.spend = spend;
        self
    }

    pub fn reported_revenue(mut self, revenue: Decimal) -> Self {
        self.revenue = revenue;
        self
    }

    /// Channel label used for grouping, "unknown" when absent
    pub fn channel_label(&self) -> &str {
        match self.channel.as_deref() {
            Some(c) if !c.trim().is_empty() => c,
            _ => "unknown",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_null_name_reads_as_empty() {
        let row = serde_json::json!({
            "id": "6a1f0c1e-9a43-4a55-9f43-1f3b7f1f2a10",
            "organization_id": "0b8e3c55-3f8a-4a11-8d65-2a8c2c7e9d01",
            "name": null,
            "channel": null,
            "spend": "1200",
            "revenue": null
        });

        let campaign: Campaign = serde_json::from_value(row).unwrap();
        assert_eq!(campaign.name, "");
        assert_eq!(campaign.channel_label(), "unknown");
        assert_eq!(campaign.spend, dec!(1200));
        assert_eq!(campaign.revenue, Decimal::ZERO);
    }
}
