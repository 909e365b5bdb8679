//! Scoring and risk classification
//!
//! Every function in this crate is pure: it reads its input record and the
//! caller-supplied `now`, and returns a value. Nothing here fails, logs or
//! performs I/O, so a batch scored against one `now` is internally
//! consistent and repeated calls give identical output.
//!
//! - [`lead`] - lead score, temperature and itemised breakdown
//! - [`roi`] - campaign ROI, performance tier and lead attribution
//! - [`health`] - customer health score and status
//! - [`churn`] - churn risk window with reasons
//! - [`expansion`] - upgrade / upsell / cross-sell detection
//! - [`aggregate`] - counting, averaging and urgency ordering helpers

pub mod aggregate;
pub mod churn;
pub mod expansion;
pub mod health;
pub mod lead;
pub mod roi;

pub use aggregate::{
    average, by_score_desc, percentage, round1, sort_by_urgency, tally, ChurnCounts,
    HealthStatusCounts, PerformanceDistribution, TemperatureCounts, TemperaturePercentages,
};
pub use churn::{predict_churn_risk, ChurnRisk, RiskLevel, INACTIVITY_SENTINEL_DAYS};
pub use expansion::{detect_expansion_signals, ExpansionSignal, Priority, SignalType};
pub use health::{calculate_health_score, HealthBreakdown, HealthScore, HealthStatus};
pub use lead::{
    score_breakdown, score_lead, score_lead_record, LeadScore, RecencyBucket, ScoreBreakdown,
    Temperature,
};
pub use roi::{
    aggregate_campaign_metrics, calculate_roi, performance_indicator, roi_percentage,
    CampaignMetrics, Performance,
};

/// Clamp a summed score into `0..=100`
pub(crate) fn clamp_score(raw: i32) -> u8 {
    raw.clamp(0, 100) as u8
}
