//! Lead scoring
//!
//! A lead's score is the sum of four independent contributions (source,
//! engagement, recency, status), clamped into `0..=100` only after summing.
//! A large negative status modifier can therefore be absorbed by strong
//! positive factors before the clamp applies.

use chrono::{DateTime, Utc};
use revpulse_core::{days_since, EngagementLevel, Lead, LeadSource, LeadStatus};
use serde::{Deserialize, Serialize};

use crate::clamp_score;

/// Coarse bucket over a lead score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Temperature {
    /// Score 80+
    Hot,
    /// Score 50-79
    Warm,
    /// Score below 50
    Cold,
}

impl Temperature {
    pub fn from_score(score: u8) -> Self {
        match score {
            0..=49 => Temperature::Cold,
            50..=79 => Temperature::Warm,
            _ => Temperature::Hot,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Temperature::Hot => "hot",
            Temperature::Warm => "warm",
            Temperature::Cold => "cold",
        }
    }
}

/// Score and temperature of a single lead
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeadScore {
    pub score: u8,
    pub temperature: Temperature,
}

pub fn source_points(source: LeadSource) -> i32 {
    match source {
        LeadSource::WebsiteForm => 20,
        LeadSource::InboundReferral => 25,
        LeadSource::PaidAds => 15,
        LeadSource::ColdList => 5,
        LeadSource::Other => 0,
    }
}

pub fn engagement_points(engagement: EngagementLevel) -> i32 {
    match engagement {
        EngagementLevel::FormFilled => 20,
        EngagementLevel::EmailReplied => 25,
        EngagementLevel::MultipleVisits => 15,
        EngagementLevel::None | EngagementLevel::Other => 0,
    }
}

/// Status modifier, may be negative
pub fn status_modifier(status: LeadStatus) -> i32 {
    match status {
        LeadStatus::Contacted => -5,
        LeadStatus::Qualified => 10,
        LeadStatus::Lost => -30,
        LeadStatus::New | LeadStatus::Converted | LeadStatus::Other => 0,
    }
}

/// How recently a lead was active
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecencyBucket {
    UnderOneDay,
    OneToThreeDays,
    ThreeToSevenDays,
    OverSevenDays,
    NoActivity,
}

impl RecencyBucket {
    /// Bucket for a whole-day count; negative counts land in the freshest bucket
    pub fn from_days(days: Option<i64>) -> Self {
        match days {
            None => RecencyBucket::NoActivity,
            Some(d) if d < 1 => RecencyBucket::UnderOneDay,
            Some(d) if d <= 3 => RecencyBucket::OneToThreeDays,
            Some(d) if d <= 7 => RecencyBucket::ThreeToSevenDays,
            Some(_) => RecencyBucket::OverSevenDays,
        }
    }

    pub fn points(&self) -> i32 {
        match self {
            RecencyBucket::UnderOneDay => 20,
            RecencyBucket::OneToThreeDays => 15,
            RecencyBucket::ThreeToSevenDays => 10,
            RecencyBucket::OverSevenDays | RecencyBucket::NoActivity => 0,
        }
    }

    /// Display label
    pub fn label(&self) -> &'static str {
        match self {
            RecencyBucket::UnderOneDay => "< 1 day",
            RecencyBucket::OneToThreeDays => "1-3 days",
            RecencyBucket::ThreeToSevenDays => "3-7 days",
            RecencyBucket::OverSevenDays => "> 7 days",
            RecencyBucket::NoActivity => "No activity",
        }
    }
}

/// Score a lead from its four inputs
pub fn score_lead(
    source: LeadSource,
    engagement: EngagementLevel,
    last_activity: Option<DateTime<Utc>>,
    status: LeadStatus,
    now: DateTime<Utc>,
) -> LeadScore {
    score_breakdown(source, engagement, last_activity, status, now).into()
}

/// Score a stored lead record
pub fn score_lead_record(lead: &Lead, now: DateTime<Utc>) -> LeadScore {
    score_lead(
        lead.source,
        lead.engagement_level,
        lead.last_activity_date,
        lead.status,
        now,
    )
}

/// A factor and the points it contributed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactorScore<T> {
    pub value: T,
    pub score: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecencyScore {
    /// Whole days since the last activity, `None` without activity data
    pub days_since: Option<i64>,
    pub label: String,
    pub score: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusScore {
    pub value: LeadStatus,
    pub modifier: i32,
}

/// Itemised lead score for display
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub source: FactorScore<LeadSource>,
    pub engagement: FactorScore<EngagementLevel>,
    pub recency: RecencyScore,
    pub status: StatusScore,
    /// Clamped sum of the four factors
    pub total: u8,
}

impl ScoreBreakdown {
    /// Sum of the factors before clamping
    pub fn raw_total(&self) -> i32 {
        self.source.score + self.engagement.score + self.recency.score + self.status.modifier
    }

    pub fn temperature(&self) -> Temperature {
        Temperature::from_score(self.total)
    }
}

impl From<ScoreBreakdown> for LeadScore {
    fn from(breakdown: ScoreBreakdown) -> Self {
        LeadScore {
            score: breakdown.total,
            temperature: breakdown.temperature(),
        }
    }
}

/// Itemised score for the same inputs as [`score_lead`]
pub fn score_breakdown(
    source: LeadSource,
    engagement: EngagementLevel,
    last_activity: Option<DateTime<Utc>>,
    status: LeadStatus,
    now: DateTime<Utc>,
) -> ScoreBreakdown {
    let days = last_activity.map(|at| days_since(now, at));
    let bucket = RecencyBucket::from_days(days);

    let mut breakdown = ScoreBreakdown {
        source: FactorScore {
            value: source,
            score: source_points(source),
        },
        engagement: FactorScore {
            value: engagement,
            score: engagement_points(engagement),
        },
        recency: RecencyScore {
            days_since: days,
            label: bucket.label().to_string(),
            score: bucket.points(),
        },
        status: StatusScore {
            value: status,
            modifier: status_modifier(status),
        },
        total: 0,
    };
    breakdown.total = clamp_score(breakdown.raw_total());
    breakdown
}
