//! Lead scoring and campaign ROI views

use std::cmp::Reverse;
use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use revpulse_config::DashboardConfig;
use revpulse_core::{Campaign, Clock, Lead, RecordStore, TextGenerator};
use revpulse_scoring::{
    aggregate_campaign_metrics, average, by_score_desc, calculate_roi, performance_indicator,
    roi_percentage, round1, score_breakdown, score_lead_record, Performance, ScoreBreakdown,
    Temperature, TemperatureCounts, TemperaturePercentages,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::analysis::{narrate, CampaignAnalysis, LeadAnalysis};
use crate::{Result, ServiceError};

/// Lead list ordering
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LeadSort {
    /// Highest score first
    #[default]
    Score,
    /// Newest first by creation time
    Recent,
}

/// A stored lead with its score computed at read time
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredLead {
    #[serde(flatten)]
    pub lead: Lead,
    pub score: u8,
    pub temperature: Temperature,
}

impl ScoredLead {
    pub fn new(lead: Lead, now: DateTime<Utc>) -> Self {
        let scored = score_lead_record(&lead, now);
        Self {
            lead,
            score: scored.score,
            temperature: scored.temperature,
        }
    }
}

/// Scored lead with its itemised breakdown
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeadDetail {
    #[serde(flatten)]
    pub lead: ScoredLead,
    pub score_breakdown: ScoreBreakdown,
}

/// Campaign with attribution metrics and ROI
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CampaignView {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub name: String,
    pub channel: Option<String>,
    pub period: Option<String>,
    pub spend: Decimal,
    /// Revenue as stored on the campaign row
    pub reported_revenue: Decimal,
    /// Revenue used for ROI: attributed when the campaign has leads
    pub revenue: Decimal,
    pub lead_count: usize,
    pub conversion_count: usize,
    pub conversion_rate: f64,
    pub roi: Decimal,
    pub roi_percentage: String,
    pub performance: Performance,
}

impl CampaignView {
    pub fn build(campaign: &Campaign, leads: &[&Lead]) -> Self {
        let metrics = aggregate_campaign_metrics(leads.iter().copied());
        let revenue = if metrics.lead_count > 0 {
            metrics.revenue
        } else {
            campaign.revenue
        };
        let roi = calculate_roi(campaign.spend, revenue);

        Self {
            id: campaign.id,
            organization_id: campaign.organization_id,
            name: campaign.name.clone(),
            channel: campaign.channel.clone(),
            period: campaign.period.clone(),
            spend: campaign.spend,
            reported_revenue: campaign.revenue,
            revenue,
            lead_count: metrics.lead_count,
            conversion_count: metrics.conversion_count,
            conversion_rate: round1(metrics.conversion_rate),
            roi,
            roi_percentage: roi_percentage(roi),
            performance: performance_indicator(roi),
        }
    }

    pub fn channel_label(&self) -> &str {
        self.channel.as_deref().unwrap_or("unknown")
    }
}

/// RevOps dashboard summary
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RevOpsDashboard {
    pub total_leads: usize,
    pub hot_leads: usize,
    pub warm_leads: usize,
    pub cold_leads: usize,
    pub temperature_percentages: TemperaturePercentages,
    pub average_score: f64,
    /// Hot leads still new or only contacted
    pub follow_up_count: usize,
    pub top_campaigns: Vec<CampaignView>,
}

/// Lead and campaign service
pub struct RevOpsService {
    store: Arc<dyn RecordStore>,
    generator: Option<Arc<dyn TextGenerator>>,
    clock: Arc<dyn Clock>,
    config: DashboardConfig,
}

impl RevOpsService {
    pub fn new(store: Arc<dyn RecordStore>, clock: Arc<dyn Clock>, config: DashboardConfig) -> Self {
        Self {
            store,
            generator: None,
            clock,
            config,
        }
    }

    /// Enable generated insights for the analysis endpoints
    pub fn with_generator(mut self, generator: Arc<dyn TextGenerator>) -> Self {
        self.generator = Some(generator);
        self
    }

    /// All leads of the organization, scored
    pub async fn list_leads(&self, org: Uuid, sort: LeadSort) -> Result<Vec<ScoredLead>> {
        let now = self.clock.now();
        let leads = self.store.list_leads(org).await?;
        let mut scored = score_all(leads, now);

        match sort {
            LeadSort::Score => {
                scored.sort_by(|a, b| by_score_desc(a.score, a.lead.id, b.score, b.lead.id))
            }
            LeadSort::Recent => {
                scored.sort_by_key(|l| (Reverse(l.lead.created_at), l.lead.id))
            }
        }

        tracing::debug!(organization_id = %org, count = scored.len(), ?sort, "Listed leads");
        Ok(scored)
    }

    /// One lead with its score breakdown
    pub async fn get_lead(&self, org: Uuid, id: Uuid) -> Result<LeadDetail> {
        let now = self.clock.now();
        let lead = self
            .store
            .get_lead(org, id)
            .await?
            .ok_or_else(|| ServiceError::not_found("lead", id))?;

        let breakdown = score_breakdown(
            lead.source,
            lead.engagement_level,
            lead.last_activity_date,
            lead.status,
            now,
        );

        Ok(LeadDetail {
            lead: ScoredLead::new(lead, now),
            score_breakdown: breakdown,
        })
    }

    /// All campaigns with attribution, best ROI first
    pub async fn list_campaigns(&self, org: Uuid) -> Result<Vec<CampaignView>> {
        let (campaigns, leads) =
            futures::try_join!(self.store.list_campaigns(org), self.store.list_leads(org))?;
        let views = campaign_views(&campaigns, &leads);
        tracing::debug!(organization_id = %org, count = views.len(), "Listed campaigns");
        Ok(views)
    }

    pub async fn dashboard(&self, org: Uuid) -> Result<RevOpsDashboard> {
        let now = self.clock.now();
        let (campaigns, leads) =
            futures::try_join!(self.store.list_campaigns(org), self.store.list_leads(org))?;

        let mut top_campaigns = campaign_views(&campaigns, &leads);
        top_campaigns.truncate(self.config.top_campaigns);

        let scored = score_all(leads, now);
        let counts: TemperatureCounts = scored.iter().map(|l| l.temperature).collect();
        let follow_up_count = scored
            .iter()
            .filter(|l| l.temperature == Temperature::Hot && l.lead.status.awaiting_follow_up())
            .count();

        Ok(RevOpsDashboard {
            total_leads: scored.len(),
            hot_leads: counts.hot,
            warm_leads: counts.warm,
            cold_leads: counts.cold,
            temperature_percentages: counts.percentages(),
            average_score: round1(average(scored.iter().map(|l| l.score))),
            follow_up_count,
            top_campaigns,
        })
    }

    /// Lead portfolio analysis with narrative insights
    pub async fn analyze_leads(&self, org: Uuid) -> Result<LeadAnalysis> {
        let now = self.clock.now();
        let leads = self.store.list_leads(org).await?;
        if leads.is_empty() {
            return Ok(LeadAnalysis::empty());
        }

        let summary = LeadAnalysis::summarize(&score_all(leads, now));
        let (insights, generated) = narrate(
            self.generator.as_deref(),
            summary.prompt(),
            self.config.insight_limit,
            || summary.fallback(),
        )
        .await;

        tracing::info!(
            organization_id = %org,
            total_leads = summary.total_leads,
            generated,
            "Analyzed leads"
        );
        Ok(summary.with_insights(insights, generated))
    }

    /// Campaign portfolio analysis with narrative insights
    pub async fn analyze_campaigns(&self, org: Uuid) -> Result<CampaignAnalysis> {
        let (campaigns, leads) =
            futures::try_join!(self.store.list_campaigns(org), self.store.list_leads(org))?;
        if campaigns.is_empty() {
            return Ok(CampaignAnalysis::empty());
        }

        let summary = CampaignAnalysis::summarize(&campaign_views(&campaigns, &leads));
        let (insights, generated) = narrate(
            self.generator.as_deref(),
            summary.prompt(),
            self.config.insight_limit,
            || summary.fallback(),
        )
        .await;

        tracing::info!(
            organization_id = %org,
            total_campaigns = summary.total_campaigns,
            generated,
            "Analyzed campaigns"
        );
        Ok(summary.with_insights(insights, generated))
    }
}

fn score_all(leads: Vec<Lead>, now: DateTime<Utc>) -> Vec<ScoredLead> {
    leads
        .into_iter()
        .map(|lead| ScoredLead::new(lead, now))
        .collect()
}

/// Build views with first-touch attribution, sorted by ROI desc then id
fn campaign_views(campaigns: &[Campaign], leads: &[Lead]) -> Vec<CampaignView> {
    let mut attributed: HashMap<Uuid, Vec<&Lead>> = HashMap::new();
    for lead in leads {
        if let Some(campaign_id) = lead.campaign_id {
            attributed.entry(campaign_id).or_default().push(lead);
        }
    }

    let mut views: Vec<CampaignView> = campaigns
        .iter()
        .map(|campaign| {
            let leads = attributed
                .get(&campaign.id)
                .map(Vec::as_slice)
                .unwrap_or_default();
            CampaignView::build(campaign, leads)
        })
        .collect();

    views.sort_by(|a, b| b.roi.cmp(&a.roi).then(a.id.cmp(&b.id)));
    views
}
