//! Aggregation helpers shared by the dashboards
//!
//! All helpers guard against empty input and return zeros rather than
//! dividing by zero.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::{HealthStatus, Performance, RiskLevel, Temperature};

/// Round to one decimal place, halves to even
///
/// The exact binary value of `value` is rounded, so `74.25` becomes `74.2`
/// while `0.35` (stored just below the midpoint) becomes `0.3`. Non-finite
/// input is returned unchanged.
pub fn round1(value: f64) -> f64 {
    Decimal::from_f64_retain(value)
        .map(|d| d.round_dp_with_strategy(1, RoundingStrategy::MidpointNearestEven))
        .and_then(|d| d.to_f64())
        .unwrap_or(value)
}

/// `part / total * 100`, rounded to one decimal, 0 when `total` is 0
pub fn percentage(part: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    round1(part as f64 / total as f64 * 100.0)
}

/// Arithmetic mean, 0 for an empty input
pub fn average<I>(values: I) -> f64
where
    I: IntoIterator,
    I::Item: Into<f64>,
{
    let (sum, count) = values
        .into_iter()
        .fold((0.0_f64, 0usize), |(sum, n), v| (sum + v.into(), n + 1));
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

/// Count occurrences of each key, ordered by key
pub fn tally<K, I>(keys: I) -> BTreeMap<K, usize>
where
    K: Ord,
    I: IntoIterator<Item = K>,
{
    let mut counts = BTreeMap::new();
    for key in keys {
        *counts.entry(key).or_insert(0) += 1;
    }
    counts
}

/// Sort most urgent first: severity desc, score asc, id asc
///
/// The id tie-break makes the order total, so repeated calls agree.
pub fn sort_by_urgency<T, F>(items: &mut [T], key: F)
where
    F: Fn(&T) -> (RiskLevel, u8, Uuid),
{
    items.sort_by(|a, b| {
        let (level_a, score_a, id_a) = key(a);
        let (level_b, score_b, id_b) = key(b);
        level_b
            .severity()
            .cmp(&level_a.severity())
            .then(score_a.cmp(&score_b))
            .then(id_a.cmp(&id_b))
    });
}

/// Compare by score descending, then id ascending
pub fn by_score_desc(score_a: u8, id_a: Uuid, score_b: u8, id_b: Uuid) -> Ordering {
    score_b.cmp(&score_a).then(id_a.cmp(&id_b))
}

/// Lead counts per temperature
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemperatureCounts {
    pub hot: usize,
    pub warm: usize,
    pub cold: usize,
}

impl TemperatureCounts {
    pub fn record(&mut self, temperature: Temperature) {
        match temperature {
            Temperature::Hot => self.hot += 1,
            Temperature::Warm => self.warm += 1,
            Temperature::Cold => self.cold += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.hot + self.warm + self.cold
    }

    /// Share of each temperature in percent
    pub fn percentages(&self) -> TemperaturePercentages {
        let total = self.total();
        TemperaturePercentages {
            hot: percentage(self.hot, total),
            warm: percentage(self.warm, total),
            cold: percentage(self.cold, total),
        }
    }
}

impl FromIterator<Temperature> for TemperatureCounts {
    fn from_iter<I: IntoIterator<Item = Temperature>>(iter: I) -> Self {
        let mut counts = Self::default();
        for t in iter {
            counts.record(t);
        }
        counts
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TemperaturePercentages {
    pub hot: f64,
    pub warm: f64,
    pub cold: f64,
}

/// Customer counts per health status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatusCounts {
    pub healthy: usize,
    pub watch: usize,
    pub at_risk: usize,
}

impl FromIterator<HealthStatus> for HealthStatusCounts {
    fn from_iter<I: IntoIterator<Item = HealthStatus>>(iter: I) -> Self {
        let mut counts = Self::default();
        for status in iter {
            match status {
                HealthStatus::Healthy => counts.healthy += 1,
                HealthStatus::Watch => counts.watch += 1,
                HealthStatus::AtRisk => counts.at_risk += 1,
            }
        }
        counts
    }
}

/// Customer counts per churn risk level; low risk is not reported
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChurnCounts {
    pub critical: usize,
    pub high: usize,
    pub medium: usize,
}

impl FromIterator<RiskLevel> for ChurnCounts {
    fn from_iter<I: IntoIterator<Item = RiskLevel>>(iter: I) -> Self {
        let mut counts = Self::default();
        for level in iter {
            match level {
                RiskLevel::Critical => counts.critical += 1,
                RiskLevel::High => counts.high += 1,
                RiskLevel::Medium => counts.medium += 1,
                RiskLevel::Low => {}
            }
        }
        counts
    }
}

/// Campaign counts per performance tier
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerformanceDistribution {
    pub excellent: usize,
    pub good: usize,
    pub break_even: usize,
    pub loss: usize,
}

impl FromIterator<Performance> for PerformanceDistribution {
    fn from_iter<I: IntoIterator<Item = Performance>>(iter: I) -> Self {
        let mut counts = Self::default();
        for performance in iter {
            match performance {
                Performance::Excellent => counts.excellent += 1,
                Performance::Good => counts.good += 1,
                Performance::BreakEven => counts.break_even += 1,
                Performance::Loss => counts.loss += 1,
            }
        }
        counts
    }
}
