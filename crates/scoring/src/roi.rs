//! Campaign ROI and first-touch attribution

use revpulse_core::Lead;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Return on investment as a ratio, `(revenue - spend) / spend`
///
/// A ratio of 1.0 is a 100% return. Zero spend yields zero.
pub fn calculate_roi(spend: Decimal, revenue: Decimal) -> Decimal {
    if spend.is_zero() {
        return Decimal::ZERO;
    }
    (revenue - spend).checked_div(spend).unwrap_or(Decimal::ZERO)
}

/// Render a ratio as a percentage with one decimal, e.g. `1.5` -> `"150.0%"`
///
/// Halves round to even.
pub fn roi_percentage(roi: Decimal) -> String {
    let pct = roi
        .checked_mul(Decimal::ONE_HUNDRED)
        .unwrap_or(Decimal::ZERO)
        .round_dp_with_strategy(1, RoundingStrategy::MidpointNearestEven);
    format!("{:.1}%", pct)
}

/// Campaign performance tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Performance {
    /// ROI of 3.0 or more
    Excellent,
    /// ROI in `1.0..3.0`
    Good,
    /// ROI in `0.0..1.0`
    #[serde(rename = "break-even")]
    BreakEven,
    /// Negative ROI
    Loss,
}

impl Performance {
    pub fn as_str(&self) -> &'static str {
        match self {
            Performance::Excellent => "excellent",
            Performance::Good => "good",
            Performance::BreakEven => "break-even",
            Performance::Loss => "loss",
        }
    }
}

/// Tier for an ROI ratio; each tier includes its lower bound
pub fn performance_indicator(roi: Decimal) -> Performance {
    if roi >= Decimal::from(3) {
        Performance::Excellent
    } else if roi >= Decimal::ONE {
        Performance::Good
    } else if roi >= Decimal::ZERO {
        Performance::BreakEven
    } else {
        Performance::Loss
    }
}

/// Counts and revenue attributed to a campaign through its leads
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CampaignMetrics {
    pub lead_count: usize,
    pub conversion_count: usize,
    /// Revenue of converted leads only
    pub revenue: Decimal,
    /// Conversions per hundred leads, 0 without leads
    pub conversion_rate: f64,
}

/// Aggregate the leads attributed to one campaign
pub fn aggregate_campaign_metrics<'a, I>(leads: I) -> CampaignMetrics
where
    I: IntoIterator<Item = &'a Lead>,
{
    let mut lead_count = 0usize;
    let mut conversion_count = 0usize;
    let mut revenue = Decimal::ZERO;

    for lead in leads {
        lead_count += 1;
        if lead.converted {
            conversion_count += 1;
            revenue += lead.revenue;
        }
    }

    let conversion_rate = if lead_count == 0 {
        0.0
    } else {
        conversion_count as f64 / lead_count as f64 * 100.0
    };

    CampaignMetrics {
        lead_count,
        conversion_count,
        revenue,
        conversion_rate,
    }
}
