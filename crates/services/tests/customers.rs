//! Customer health service against an in-memory store and a frozen clock

use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use revpulse_config::DashboardConfig;
use revpulse_core::{Customer, FixedClock};
use revpulse_persistence::InMemoryRecordStore;
use revpulse_scoring::{HealthStatus, Priority, RiskLevel, SignalType};
use revpulse_services::{CustomerFilter, CustomerHealthService, ServiceError};
use rust_decimal_macros::dec;
use uuid::Uuid;

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 17, 12, 0, 0).unwrap()
}

fn id(n: u128) -> Uuid {
    Uuid::from_u128(n)
}

/// Five customers covering every status and risk tier
fn store(org: Uuid) -> Arc<InMemoryRecordStore> {
    let store = InMemoryRecordStore::new();

    // 40 + 20 + 20 + 0 = 80, flat revenue
    store.insert_customer(
        Customer::new(org)
            .with_id(id(1))
            .company("Acme")
            .plan("starter")
            .last_active(now())
            .mrr(dec!(1000))
            .previous_mrr(dec!(1000))
            .open_issues(0),
    );
    // 0 + 10 + 0 - 5 = 5
    store.insert_customer(
        Customer::new(org)
            .with_id(id(2))
            .company("Globex")
            .last_active(now() - Duration::days(20))
            .mrr(dec!(700))
            .previous_mrr(dec!(1000))
            .open_issues(4),
    );
    // 20 + 10 + 10 + 0 = 40
    store.insert_customer(
        Customer::new(org)
            .with_id(id(3))
            .company("Initech")
            .last_active(now() - Duration::days(8))
            .mrr(dec!(950))
            .previous_mrr(dec!(1000))
            .open_issues(1),
    );
    // 40 + 30 + 20 + 0 = 90
    store.insert_customer(
        Customer::new(org)
            .with_id(id(4))
            .company("Umbrella")
            .plan("enterprise")
            .last_active(now())
            .mrr(dec!(6000))
            .previous_mrr(dec!(5000))
            .usage_tier("high")
            .open_issues(0),
    );
    // 40 + 20 + 0 + 0 = 60, critical through open issues
    store.insert_customer(
        Customer::new(org)
            .with_id(id(5))
            .company("Hooli")
            .last_active(now())
            .mrr(dec!(1000))
            .previous_mrr(dec!(1000))
            .open_issues(3),
    );
    store.insert_customer(Customer::new(Uuid::new_v4()).with_id(id(9)));

    Arc::new(store)
}

fn service(org: Uuid, config: DashboardConfig) -> CustomerHealthService {
    CustomerHealthService::new(store(org), Arc::new(FixedClock(now())), config)
}

fn ids(views: &[revpulse_services::CustomerView]) -> Vec<Uuid> {
    views.iter().map(|v| v.customer.id).collect()
}

#[tokio::test]
async fn test_customers_sorted_by_health_ascending() {
    let org = Uuid::new_v4();
    let customers = service(org, DashboardConfig::default())
        .list_customers(org, None)
        .await
        .unwrap();

    assert_eq!(ids(&customers), vec![id(2), id(3), id(5), id(1), id(4)]);
    let scores: Vec<u8> = customers.iter().map(|c| c.health_score).collect();
    assert_eq!(scores, vec![5, 40, 60, 80, 90]);
}

#[tokio::test]
async fn test_customer_filters() {
    let org = Uuid::new_v4();
    let svc = service(org, DashboardConfig::default());

    let at_risk = svc
        .list_customers(org, Some(CustomerFilter::AtRisk))
        .await
        .unwrap();
    assert_eq!(ids(&at_risk), vec![id(2), id(3)]);

    let healthy = svc
        .list_customers(org, Some(CustomerFilter::Healthy))
        .await
        .unwrap();
    assert_eq!(ids(&healthy), vec![id(1), id(4)]);

    let expansion = svc
        .list_customers(org, Some(CustomerFilter::Expansion))
        .await
        .unwrap();
    assert_eq!(ids(&expansion), vec![id(1), id(4)]);
}

#[tokio::test]
async fn test_customer_detail() {
    let org = Uuid::new_v4();
    let view = service(org, DashboardConfig::default())
        .get_customer(org, id(3))
        .await
        .unwrap();

    assert_eq!(view.health_score, 40);
    assert_eq!(view.health_status, HealthStatus::AtRisk);
    assert_eq!(view.churn_risk.level, RiskLevel::High);
    assert_eq!(
        view.churn_risk.reasons,
        vec![
            "Low engagement (8 days inactive)",
            "Revenue declining",
            "Low health score"
        ]
    );
    assert!(!view.expansion_signal.has_opportunity);
}

#[tokio::test]
async fn test_upsell_detected_for_large_healthy_account() {
    let org = Uuid::new_v4();
    let view = service(org, DashboardConfig::default())
        .get_customer(org, id(4))
        .await
        .unwrap();

    assert_eq!(view.churn_risk.level, RiskLevel::Low);
    assert_eq!(view.expansion_signal.signal_type, Some(SignalType::Upsell));
    assert_eq!(view.expansion_signal.priority, Some(Priority::High));
}

#[tokio::test]
async fn test_customer_of_other_tenant_is_not_found() {
    let org = Uuid::new_v4();
    let err = service(org, DashboardConfig::default())
        .get_customer(org, id(9))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound { kind: "customer", .. }));
}

#[tokio::test]
async fn test_dashboard_summary_and_alert_order() {
    let org = Uuid::new_v4();
    let config = DashboardConfig {
        alert_limit: 2,
        ..Default::default()
    };
    let dashboard = service(org, config).dashboard(org).await.unwrap();

    assert_eq!(dashboard.total_customers, 5);
    assert_eq!(dashboard.status_counts.healthy, 2);
    assert_eq!(dashboard.status_counts.watch, 1);
    assert_eq!(dashboard.status_counts.at_risk, 2);
    assert_eq!(dashboard.churn_risk.critical, 2);
    assert_eq!(dashboard.churn_risk.high, 1);
    assert_eq!(dashboard.churn_risk.medium, 1);
    assert_eq!(dashboard.expansion_opportunities, 2);
    assert_eq!(dashboard.avg_health_score, 55.0);

    // critical first, lowest score first within a tier
    let alert_ids: Vec<Uuid> = dashboard.alerts.iter().map(|a| a.customer_id).collect();
    assert_eq!(alert_ids, vec![id(2), id(5)]);
    assert_eq!(dashboard.alerts[0].risk_days, Some(3));
    assert_eq!(dashboard.alerts[1].reasons, vec!["3 unresolved issues"]);
}

#[tokio::test]
async fn test_dashboard_json_shape() {
    let org = Uuid::new_v4();
    let dashboard = service(org, DashboardConfig::default())
        .dashboard(org)
        .await
        .unwrap();

    let json = serde_json::to_value(&dashboard).unwrap();
    assert_eq!(json["healthy"], 2);
    assert_eq!(json["at_risk"], 2);
    assert_eq!(json["churn_risk"]["critical"], 2);
    assert_eq!(json["alerts"].as_array().unwrap().len(), 3);
    assert_eq!(json["alerts"][2]["company"], "Initech");
}

#[tokio::test]
async fn test_dashboard_for_empty_tenant() {
    let org = Uuid::new_v4();
    let dashboard = service(org, DashboardConfig::default())
        .dashboard(Uuid::new_v4())
        .await
        .unwrap();

    assert_eq!(dashboard.total_customers, 0);
    assert_eq!(dashboard.avg_health_score, 0.0);
    assert!(dashboard.alerts.is_empty());
}
