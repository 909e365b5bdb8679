//! Lead records and their closed enumerations
//!
//! The hosted store keeps `source`, `engagement_level` and `status` as free
//! text. Each is parsed into a closed enum whose `Other` variant absorbs any
//! value the scoring tables do not recognise.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Where a lead came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeadSource {
    WebsiteForm,
    InboundReferral,
    PaidAds,
    ColdList,
    #[default]
    #[serde(other)]
    Other,
}

impl LeadSource {
    pub const ALL: [LeadSource; 5] = [
        Self::WebsiteForm,
        Self::InboundReferral,
        Self::PaidAds,
        Self::ColdList,
        Self::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::WebsiteForm => "website_form",
            Self::InboundReferral => "inbound_referral",
            Self::PaidAds => "paid_ads",
            Self::ColdList => "cold_list",
            Self::Other => "other",
        }
    }
}

impl From<&str> for LeadSource {
    fn from(value: &str) -> Self {
        match value.trim() {
            "website_form" => Self::WebsiteForm,
            "inbound_referral" => Self::InboundReferral,
            "paid_ads" => Self::PaidAds,
            "cold_list" => Self::ColdList,
            _ => Self::Other,
        }
    }
}

impl fmt::Display for LeadSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Strongest engagement the lead has shown so far
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngagementLevel {
    FormFilled,
    EmailReplied,
    MultipleVisits,
    #[default]
    None,
    #[serde(other)]
    Other,
}

impl EngagementLevel {
    pub const ALL: [EngagementLevel; 5] = [
        Self::FormFilled,
        Self::EmailReplied,
        Self::MultipleVisits,
        Self::None,
        Self::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FormFilled => "form_filled",
            Self::EmailReplied => "email_replied",
            Self::MultipleVisits => "multiple_visits",
            Self::None => "none",
            Self::Other => "other",
        }
    }
}

impl From<&str> for EngagementLevel {
    fn from(value: &str) -> Self {
        match value.trim() {
            "form_filled" => Self::FormFilled,
            "email_replied" => Self::EmailReplied,
            "multiple_visits" => Self::MultipleVisits,
            "none" | "" => Self::None,
            _ => Self::Other,
        }
    }
}

impl fmt::Display for EngagementLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pipeline status of a lead
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeadStatus {
    #[default]
    New,
    Contacted,
    Qualified,
    Lost,
    Converted,
    #[serde(other)]
    Other,
}

impl LeadStatus {
    pub const ALL: [LeadStatus; 6] = [
        Self::New,
        Self::Contacted,
        Self::Qualified,
        Self::Lost,
        Self::Converted,
        Self::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Contacted => "contacted",
            Self::Qualified => "qualified",
            Self::Lost => "lost",
            Self::Converted => "converted",
            Self::Other => "other",
        }
    }

    /// Statuses that still expect a first or follow-up touch
    pub fn awaiting_follow_up(&self) -> bool {
        matches!(self, Self::New | Self::Contacted)
    }
}

impl From<&str> for LeadStatus {
    fn from(value: &str) -> Self {
        match value.trim() {
            "new" => Self::New,
            "contacted" => Self::Contacted,
            "qualified" => Self::Qualified,
            "lost" => Self::Lost,
            "converted" => Self::Converted,
            _ => Self::Other,
        }
    }
}

impl fmt::Display for LeadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lead record as stored
///
/// Score and temperature are never stored; they are derived on read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lead {
    pub id: Uuid,

    pub organization_id: Uuid,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub source: LeadSource,

    #[serde(default, deserialize_with = "null_as_default")]
    pub engagement_level: EngagementLevel,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_activity_date: Option<DateTime<Utc>>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub status: LeadStatus,

    /// Campaign the lead is attributed to (first touch)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub campaign_id: Option<Uuid>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub converted: bool,

    /// Revenue booked on conversion
    #[serde(default, deserialize_with = "null_as_default")]
    pub revenue: Decimal,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Lead {
    /// Create a new lead with default fields
    pub fn new(organization_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            organization_id,
            name: None,
            email: None,
            company: None,
            source: LeadSource::default(),
            engagement_level: EngagementLevel::default(),
            last_activity_date: None,
            status: LeadStatus::default(),
            campaign_id: None,
            converted: false,
            revenue: Decimal::ZERO,
            created_at: None,
        }
    }

    pub fn with_id(mut self, id: Uuid) -> Self {
        self.id = id;
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn source(mut self, source: LeadSource) -> Self {
        self.source = source;
        self
    }

    pub fn engagement(mut self, level: EngagementLevel) -> Self {
        self.engagement_level = level;
        self
    }

    pub fn status(mut self, status: LeadStatus) -> Self {
        self.status = status;
        self
    }

    pub fn last_activity(mut self, at: DateTime<Utc>) -> Self {
        self.last_activity_date = Some(at);
        self
    }

    pub fn campaign(mut self, campaign_id: Uuid) -> Self {
        self.campaign_id = Some(campaign_id);
        self
    }

    /// Mark the lead converted with the booked revenue
    pub fn converted_with(mut self, revenue: Decimal) -> Self {
        self.converted = true;
        self.revenue = revenue;
        self
    }

    pub fn created(mut self, at: DateTime<Utc>) -> Self {
        self.created_at = Some(at);
        self
    }
}

/// Treat an explicit JSON `null` like a missing field.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
