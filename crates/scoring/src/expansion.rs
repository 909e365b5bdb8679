//! Expansion opportunity detection

use revpulse_core::Customer;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Plans considered entry tiers for upgrade offers
const ENTRY_PLANS: [&str; 2] = ["free", "starter"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalType {
    Upgrade,
    Upsell,
    CrossSell,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
}

/// Detected opportunity; every field but the flag is `null` without one
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpansionSignal {
    pub has_opportunity: bool,
    pub signal_type: Option<SignalType>,
    pub suggestion: Option<String>,
    pub priority: Option<Priority>,
}

impl ExpansionSignal {
    pub fn none() -> Self {
        Self {
            has_opportunity: false,
            signal_type: None,
            suggestion: None,
            priority: None,
        }
    }

    fn found(signal_type: SignalType, priority: Priority, suggestion: &str) -> Self {
        Self {
            has_opportunity: true,
            signal_type: Some(signal_type),
            suggestion: Some(suggestion.to_string()),
            priority: Some(priority),
        }
    }
}

/// First matching signal in priority order: upgrade, upsell, cross-sell
pub fn detect_expansion_signals(customer: &Customer, health_score: u8) -> ExpansionSignal {
    let plan = customer.plan_key();

    if health_score >= 75 && ENTRY_PLANS.contains(&plan.as_str()) {
        return ExpansionSignal::found(
            SignalType::Upgrade,
            Priority::High,
            "High engagement on lower tier - suggest plan upgrade",
        );
    }

    if health_score >= 80 && customer.mrr >= Decimal::from(5000) {
        return if customer.metadata.is_high_usage() {
            ExpansionSignal::found(
                SignalType::Upsell,
                Priority::High,
                "High usage and stable revenue - consider premium features",
            )
        } else {
            ExpansionSignal::found(
                SignalType::Upsell,
                Priority::Medium,
                "Strong account health - consider premium add-ons",
            )
        };
    }

    if customer.metadata.team_count() > 1 && health_score >= 70 {
        return ExpansionSignal::found(
            SignalType::CrossSell,
            Priority::Medium,
            "Multiple teams active - offer team collaboration tools",
        );
    }

    ExpansionSignal::none()
}
