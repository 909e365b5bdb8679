//! Churn risk prediction
//!
//! An ordered decision list, most severe tier first. The first tier with any
//! triggering condition wins and lists a reason for every condition of that
//! tier that fired.

use chrono::{DateTime, Utc};
use revpulse_core::Customer;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Inactivity assumed for customers with no activity data
pub const INACTIVITY_SENTINEL_DAYS: i64 = 999;

/// Churn risk level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    /// Ordering key, higher is more urgent
    pub fn severity(&self) -> u8 {
        match self {
            RiskLevel::Low => 0,
            RiskLevel::Medium => 1,
            RiskLevel::High => 2,
            RiskLevel::Critical => 3,
        }
    }

    /// Days within which churn is likely, `None` for low risk
    pub fn window_days(&self) -> Option<u32> {
        match self {
            RiskLevel::Critical => Some(3),
            RiskLevel::High => Some(7),
            RiskLevel::Medium => Some(14),
            RiskLevel::Low => None,
        }
    }

    /// Critical and high risks raise dashboard alerts
    pub fn is_alert(&self) -> bool {
        matches!(self, RiskLevel::Critical | RiskLevel::High)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
            RiskLevel::Critical => "critical",
        }
    }
}

/// Predicted churn risk
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChurnRisk {
    pub level: RiskLevel,
    /// Risk window in days, `null` for low risk
    pub days: Option<u32>,
    pub reasons: Vec<String>,
}

impl ChurnRisk {
    fn new(level: RiskLevel, reasons: Vec<String>) -> Self {
        Self {
            level,
            days: level.window_days(),
            reasons,
        }
    }
}

/// Predict churn risk for a customer with an already computed health score
pub fn predict_churn_risk(customer: &Customer, health_score: u8, now: DateTime<Utc>) -> ChurnRisk {
    let days_inactive = customer
        .days_inactive(now)
        .unwrap_or(INACTIVITY_SENTINEL_DAYS);
    let mrr = customer.mrr;
    let previous = customer.baseline_mrr();
    let open_issues = customer.metadata.open_issues();

    // 20% or larger drop
    let sharp_drop = mrr < previous * Decimal::new(8, 1);
    let declining = mrr < previous;
    let flat = mrr == previous;

    let mut reasons = Vec::new();

    if days_inactive >= 14 || sharp_drop || open_issues > 2 {
        if days_inactive >= 14 {
            reasons.push(format!("No activity in {} days", days_inactive));
        }
        if sharp_drop {
            reasons.push("Significant revenue drop".to_string());
        }
        if open_issues > 2 {
            reasons.push(format!("{} unresolved issues", open_issues));
        }
        return ChurnRisk::new(RiskLevel::Critical, reasons);
    }

    if days_inactive >= 7 || health_score < 50 || declining {
        if days_inactive >= 7 {
            reasons.push(format!("Low engagement ({} days inactive)", days_inactive));
        }
        if declining {
            reasons.push("Revenue declining".to_string());
        }
        if health_score < 50 {
            reasons.push("Low health score".to_string());
        }
        return ChurnRisk::new(RiskLevel::High, reasons);
    }

    if days_inactive >= 3 || flat || health_score < 70 {
        if days_inactive >= 3 {
            reasons.push("Gradual usage decline".to_string());
        }
        if flat && mrr > Decimal::ZERO {
            reasons.push("Revenue flat".to_string());
        }
        if health_score < 70 {
            reasons.push("Health score declining".to_string());
        }
        return ChurnRisk::new(RiskLevel::Medium, reasons);
    }

    ChurnRisk::new(RiskLevel::Low, vec!["Account is healthy".to_string()])
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 17, 12, 0, 0).unwrap()
    }

    fn active_customer() -> Customer {
        Customer::new(Uuid::new_v4())
            .last_active(now())
            .mrr(dec!(1000))
            .previous_mrr(dec!(1000))
    }

    #[test]
    fn test_open_issues_alone_is_critical() {
        let customer = active_customer().open_issues(3);
        let risk = predict_churn_risk(&customer, 60, now());
        assert_eq!(risk.level, RiskLevel::Critical);
        assert_eq!(risk.days, Some(3));
        assert_eq!(risk.reasons, vec!["3 unresolved issues"]);
    }

    #[test]
    fn test_critical_collects_every_reason() {
        let customer = Customer::new(Uuid::new_v4())
            .last_active(now() - Duration::days(20))
            .mrr(dec!(700))
            .previous_mrr(dec!(1000))
            .open_issues(4);
        let risk = predict_churn_risk(&customer, 10, now());
        assert_eq!(
            risk.reasons,
            vec![
                "No activity in 20 days",
                "Significant revenue drop",
                "4 unresolved issues"
            ]
        );
    }

    #[test]
    fn test_revenue_drop_threshold_is_exact() {
        // exactly 20% down is not a sharp drop
        let customer = active_customer().mrr(dec!(800));
        let risk = predict_churn_risk(&customer, 90, now());
        assert_eq!(risk.level, RiskLevel::High);
        assert_eq!(risk.reasons, vec!["Revenue declining"]);

        let customer = active_customer().mrr(dec!(799.99));
        let risk = predict_churn_risk(&customer, 90, now());
        assert_eq!(risk.level, RiskLevel::Critical);
    }

    #[test]
    fn test_missing_activity_uses_sentinel() {
        let customer = Customer::new(Uuid::new_v4()).mrr(dec!(1000));
        let risk = predict_churn_risk(&customer, 60, now());
        assert_eq!(risk.level, RiskLevel::Critical);
        assert_eq!(risk.reasons, vec!["No activity in 999 days"]);
    }

    #[test]
    fn test_high_risk_reasons_order() {
        let customer = active_customer()
            .last_active(now() - Duration::days(8))
            .mrr(dec!(950));
        let risk = predict_churn_risk(&customer, 40, now());
        assert_eq!(risk.level, RiskLevel::High);
        assert_eq!(risk.days, Some(7));
        assert_eq!(
            risk.reasons,
            vec![
                "Low engagement (8 days inactive)",
                "Revenue declining",
                "Low health score"
            ]
        );
    }

    #[test]
    fn test_flat_revenue_is_medium() {
        let risk = predict_churn_risk(&active_customer(), 80, now());
        assert_eq!(risk.level, RiskLevel::Medium);
        assert_eq!(risk.days, Some(14));
        assert_eq!(risk.reasons, vec!["Revenue flat"]);
    }

    #[test]
    fn test_flat_zero_revenue_is_medium_without_flat_reason() {
        let customer = active_customer().mrr(dec!(0)).previous_mrr(dec!(0));
        let risk = predict_churn_risk(&customer, 80, now());
        assert_eq!(risk.level, RiskLevel::Medium);
        assert!(risk.reasons.is_empty());
    }

    #[test]
    fn test_growing_active_customer_is_low() {
        let customer = active_customer().mrr(dec!(1200));
        let risk = predict_churn_risk(&customer, 100, now());
        assert_eq!(risk.level, RiskLevel::Low);
        assert_eq!(risk.days, None);
        assert_eq!(risk.reasons, vec!["Account is healthy"]);
    }

    #[test]
    fn test_severity_ordering() {
        assert!(RiskLevel::Critical.severity() > RiskLevel::High.severity());
        assert!(RiskLevel::High.severity() > RiskLevel::Medium.severity());
        assert!(RiskLevel::Medium.severity() > RiskLevel::Low.severity());
    }

    #[test]
    fn test_json_shape() {
        let risk = predict_churn_risk(&active_customer().mrr(dec!(1200)), 100, now());
        let json = serde_json::to_value(&risk).unwrap();
        assert_eq!(json["level"], "low");
        assert!(json["days"].is_null());
    }
}
