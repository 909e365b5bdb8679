//! Customer health, churn risk and expansion views

use std::sync::Arc;

use chrono::{DateTime, Utc};
use revpulse_config::DashboardConfig;
use revpulse_core::{Clock, Customer, RecordStore};
use revpulse_scoring::{
    average, calculate_health_score, detect_expansion_signals, predict_churn_risk, round1,
    sort_by_urgency, ChurnCounts, ChurnRisk, ExpansionSignal, HealthBreakdown, HealthStatus,
    HealthStatusCounts, RiskLevel,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Result, ServiceError};

/// Customer list filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CustomerFilter {
    /// Every customer, same as no filter
    #[serde(rename = "none")]
    All,
    /// Health status at risk
    AtRisk,
    /// Health status healthy
    Healthy,
    /// Any expansion opportunity
    Expansion,
}

impl CustomerFilter {
    pub fn matches(&self, view: &CustomerView) -> bool {
        match self {
            CustomerFilter::All => true,
            CustomerFilter::AtRisk => view.health_status == HealthStatus::AtRisk,
            CustomerFilter::Healthy => view.health_status == HealthStatus::Healthy,
            CustomerFilter::Expansion => view.expansion_signal.has_opportunity,
        }
    }
}

/// Customer enriched with health, churn and expansion analysis
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CustomerView {
    #[serde(flatten)]
    pub customer: Customer,
    pub health_score: u8,
    pub health_status: HealthStatus,
    pub health_color: &'static str,
    pub health_breakdown: HealthBreakdown,
    pub churn_risk: ChurnRisk,
    pub expansion_signal: ExpansionSignal,
}

impl CustomerView {
    /// Run the full pipeline: health, then churn and expansion from that score
    pub fn analyze(customer: Customer, now: DateTime<Utc>) -> Self {
        let health = calculate_health_score(&customer, now);
        let status = health.status();
        let churn_risk = predict_churn_risk(&customer, health.score, now);
        let expansion_signal = detect_expansion_signals(&customer, health.score);

        Self {
            customer,
            health_score: health.score,
            health_status: status,
            health_color: status.color(),
            health_breakdown: health.breakdown,
            churn_risk,
            expansion_signal,
        }
    }
}

/// Customer needing attention
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CustomerAlert {
    pub customer_id: Uuid,
    pub company: Option<String>,
    pub health_score: u8,
    pub risk_level: RiskLevel,
    pub risk_days: Option<u32>,
    pub reasons: Vec<String>,
}

impl From<&CustomerView> for CustomerAlert {
    fn from(view: &CustomerView) -> Self {
        Self {
            customer_id: view.customer.id,
            company: view.customer.company.clone(),
            health_score: view.health_score,
            risk_level: view.churn_risk.level,
            risk_days: view.churn_risk.days,
            reasons: view.churn_risk.reasons.clone(),
        }
    }
}

/// Customer health dashboard summary
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CustomerDashboard {
    pub total_customers: usize,
    #[serde(flatten)]
    pub status_counts: HealthStatusCounts,
    pub avg_health_score: f64,
    pub churn_risk: ChurnCounts,
    pub expansion_opportunities: usize,
    pub alerts: Vec<CustomerAlert>,
}

/// Customer health service
pub struct CustomerHealthService {
    store: Arc<dyn RecordStore>,
    clock: Arc<dyn Clock>,
    config: DashboardConfig,
}

impl CustomerHealthService {
    pub fn new(store: Arc<dyn RecordStore>, clock: Arc<dyn Clock>, config: DashboardConfig) -> Self {
        Self {
            store,
            clock,
            config,
        }
    }

    /// Enriched customers, lowest health first
    pub async fn list_customers(
        &self,
        org: Uuid,
        filter: Option<CustomerFilter>,
    ) -> Result<Vec<CustomerView>> {
        let mut views = self.analyze_all(org).await?;
        if let Some(filter) = filter {
            views.retain(|view| filter.matches(view));
        }
        views.sort_by_key(|view| (view.health_score, view.customer.id));

        tracing::debug!(organization_id = %org, count = views.len(), ?filter, "Listed customers");
        Ok(views)
    }

    pub async fn get_customer(&self, org: Uuid, id: Uuid) -> Result<CustomerView> {
        let now = self.clock.now();
        let customer = self
            .store
            .get_customer(org, id)
            .await?
            .ok_or_else(|| ServiceError::not_found("customer", id))?;
        Ok(CustomerView::analyze(customer, now))
    }

    pub async fn dashboard(&self, org: Uuid) -> Result<CustomerDashboard> {
        let views = self.analyze_all(org).await?;

        let mut urgent: Vec<&CustomerView> = views
            .iter()
            .filter(|view| view.churn_risk.level.is_alert())
            .collect();
        sort_by_urgency(&mut urgent, |view| {
            (view.churn_risk.level, view.health_score, view.customer.id)
        });
        urgent.truncate(self.config.alert_limit);

        let dashboard = CustomerDashboard {
            total_customers: views.len(),
            status_counts: views.iter().map(|v| v.health_status).collect(),
            avg_health_score: round1(average(views.iter().map(|v| v.health_score))),
            churn_risk: views.iter().map(|v| v.churn_risk.level).collect(),
            expansion_opportunities: views
                .iter()
                .filter(|v| v.expansion_signal.has_opportunity)
                .count(),
            alerts: urgent.into_iter().map(CustomerAlert::from).collect(),
        };

        if !dashboard.alerts.is_empty() {
            tracing::info!(
                organization_id = %org,
                alerts = dashboard.alerts.len(),
                critical = dashboard.churn_risk.critical,
                "Customers need attention"
            );
        }
        Ok(dashboard)
    }

    async fn analyze_all(&self, org: Uuid) -> Result<Vec<CustomerView>> {
        let now = self.clock.now();
        let customers = self.store.list_customers(org).await?;
        Ok(customers
            .into_iter()
            .map(|customer| CustomerView::analyze(customer, now))
            .collect())
    }
}
