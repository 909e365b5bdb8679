//! Customer health scoring
//!
//! Four components summed then clamped into `0..=100`:
//!
//! | component          | range    | input                        |
//! |--------------------|----------|------------------------------|
//! | engagement         | 0..=40   | days since `last_active`     |
//! | revenue_stability  | 0..=30   | `mrr` against `previous_mrr` |
//! | support_activity   | 0..=20   | `metadata.open_issues`       |
//! | time_decay         | -10..=0  | days since `last_active`     |
//!
//! Missing activity data contributes nothing to either activity component.

use chrono::{DateTime, Utc};
use revpulse_core::Customer;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::clamp_score;

/// Coarse bucket over a health score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    /// Score 80+
    Healthy,
    /// Score 50-79
    Watch,
    /// Score below 50
    AtRisk,
}

impl HealthStatus {
    pub fn from_score(score: u8) -> Self {
        match score {
            0..=49 => HealthStatus::AtRisk,
            50..=79 => HealthStatus::Watch,
            _ => HealthStatus::Healthy,
        }
    }

    /// Traffic-light color for UI display
    pub fn color(&self) -> &'static str {
        match self {
            HealthStatus::Healthy => "green",
            HealthStatus::Watch => "yellow",
            HealthStatus::AtRisk => "red",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HealthStatus::Healthy => "healthy",
            HealthStatus::Watch => "watch",
            HealthStatus::AtRisk => "at_risk",
        }
    }
}

/// Per-component health points
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthBreakdown {
    pub engagement: i32,
    pub revenue_stability: i32,
    pub support_activity: i32,
    pub time_decay: i32,
}

impl HealthBreakdown {
    /// Clamped sum of the components
    pub fn total(&self) -> u8 {
        clamp_score(
            self.engagement + self.revenue_stability + self.support_activity + self.time_decay,
        )
    }
}

/// Health score with its breakdown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthScore {
    pub score: u8,
    pub breakdown: HealthBreakdown,
}

impl HealthScore {
    pub fn status(&self) -> HealthStatus {
        HealthStatus::from_score(self.score)
    }
}

pub fn engagement_points(days_inactive: Option<i64>) -> i32 {
    match days_inactive {
        None => 0,
        Some(d) if d <= 7 => 40,
        Some(d) if d <= 14 => 20,
        Some(_) => 0,
    }
}

/// Growing 30, stable 20, declining 10, no revenue 0
pub fn revenue_stability_points(mrr: Decimal, previous_mrr: Decimal) -> i32 {
    if mrr > previous_mrr {
        30
    } else if mrr.is_zero() || mrr.is_sign_negative() {
        0
    } else if mrr == previous_mrr {
        20
    } else {
        10
    }
}

pub fn support_points(open_issues: i64) -> i32 {
    match open_issues {
        0 => 20,
        i if i <= 2 => 10,
        _ => 0,
    }
}

pub fn time_decay_points(days_inactive: Option<i64>) -> i32 {
    match days_inactive {
        Some(d) if d >= 30 => -10,
        Some(d) if d >= 14 => -5,
        _ => 0,
    }
}

/// Health score of a customer at `now`
pub fn calculate_health_score(customer: &Customer, now: DateTime<Utc>) -> HealthScore {
    let days_inactive = customer.days_inactive(now);

    let breakdown = HealthBreakdown {
        engagement: engagement_points(days_inactive),
        revenue_stability: revenue_stability_points(customer.mrr, customer.baseline_mrr()),
        support_activity: support_points(customer.metadata.open_issues()),
        time_decay: time_decay_points(days_inactive),
    };

    HealthScore {
        score: breakdown.total(),
        breakdown,
    }
}
