//! Lead and campaign analysis with narrative insights
//!
//! Each analysis is summarized from scored records first. The summary feeds
//! both the generation prompt and the rule-based fallback, so the two always
//! describe the same numbers.

use std::collections::BTreeMap;

use revpulse_core::{GenerationRequest, TextGenerator};
use revpulse_llm::{extract_insights, ParsedInsights};
use revpulse_scoring::{
    calculate_roi, roi_percentage, tally, PerformanceDistribution, TemperatureCounts,
};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

use crate::revops::{CampaignView, ScoredLead};

const SYSTEM_PROMPT: &str = "You are a revenue operations analyst for a B2B SaaS company. \
Answer only with a JSON object containing two arrays of strings: \"insights\" and \"recommendations\".";

const NO_LEADS_INSIGHT: &str =
    "No leads data available yet. Upload leads to get AI-powered insights.";

/// Lead portfolio analysis
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeadAnalysis {
    pub total_leads: usize,
    pub score_distribution: TemperatureCounts,
    pub status_breakdown: BTreeMap<String, usize>,
    pub source_breakdown: BTreeMap<String, usize>,
    pub engagement_breakdown: BTreeMap<String, usize>,
    pub insights: Vec<String>,
    pub recommendations: Vec<String>,
    /// True when the insights came from the text generator
    pub generated: bool,
}

impl LeadAnalysis {
    pub(crate) fn summarize(leads: &[ScoredLead]) -> Self {
        Self {
            total_leads: leads.len(),
            score_distribution: leads.iter().map(|l| l.temperature).collect(),
            status_breakdown: string_keys(tally(leads.iter().map(|l| l.lead.status.as_str()))),
            source_breakdown: string_keys(tally(leads.iter().map(|l| l.lead.source.as_str()))),
            engagement_breakdown: string_keys(tally(
                leads.iter().map(|l| l.lead.engagement_level.as_str()),
            )),
            insights: Vec::new(),
            recommendations: Vec::new(),
            generated: false,
        }
    }

    /// Analysis of an organization without leads
    pub(crate) fn empty() -> Self {
        Self {
            insights: vec![NO_LEADS_INSIGHT.to_string()],
            ..Self::summarize(&[])
        }
    }

    pub(crate) fn prompt(&self) -> String {
        let d = &self.score_distribution;
        format!(
            "Analyze this leads data and provide actionable insights and recommendations:\n\n\
             Total Leads: {}\n\
             Score Distribution: {} hot, {} warm, {} cold\n\n\
             Status Breakdown: {}\n\
             Source Breakdown: {}\n\
             Engagement Breakdown: {}\n\n\
             Provide:\n\
             1. 3-4 key insights about the lead quality and patterns\n\
             2. 3-4 actionable recommendations to improve lead conversion\n\n\
             Format your response as JSON with two arrays: \"insights\" and \"recommendations\".\n\
             Each should be a concise sentence (max 100 characters).",
            self.total_leads,
            d.hot,
            d.warm,
            d.cold,
            render_counts(&self.status_breakdown),
            render_counts(&self.source_breakdown),
            render_counts(&self.engagement_breakdown),
        )
    }

    pub(crate) fn fallback(&self) -> ParsedInsights {
        let waiting = self.status_breakdown.get("new").copied().unwrap_or(0);
        let mut insights = vec![format!(
            "You have {} leads with {} hot prospects",
            self.total_leads, self.score_distribution.hot
        )];
        let mut recommendations =
            vec!["Prioritize contacting hot leads (score 80+) first".to_string()];

        if let Some((source, count)) = top_entry(&self.source_breakdown) {
            insights.push(format!("Top source: {} ({} leads)", source, count));
            recommendations.push(format!(
                "Focus on {} channel - it's your best performer",
                source
            ));
        }
        insights.push(format!("{} leads are waiting for first contact", waiting));
        recommendations.push("Engage with warm leads to move them to hot status".to_string());

        ParsedInsights {
            insights,
            recommendations,
        }
    }

    pub(crate) fn with_insights(mut self, parsed: ParsedInsights, generated: bool) -> Self {
        self.insights = parsed.insights;
        self.recommendations = parsed.recommendations;
        self.generated = generated;
        self
    }
}

/// Campaign portfolio analysis
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CampaignAnalysis {
    pub total_campaigns: usize,
    pub total_spend: Decimal,
    pub total_revenue: Decimal,
    /// Portfolio ROI ratio, 0 when nothing was spent
    pub portfolio_roi: Decimal,
    pub portfolio_roi_percentage: String,
    pub performance_distribution: PerformanceDistribution,
    /// ROI ratio per channel, channels without spend omitted
    pub channel_roi: BTreeMap<String, Decimal>,
    pub best_channel: Option<String>,
    pub insights: Vec<String>,
    pub recommendations: Vec<String>,
    pub generated: bool,
}

impl CampaignAnalysis {
    pub(crate) fn summarize(campaigns: &[CampaignView]) -> Self {
        let mut total_spend = Decimal::ZERO;
        let mut total_revenue = Decimal::ZERO;
        let mut per_channel: BTreeMap<String, (Decimal, Decimal)> = BTreeMap::new();

        for campaign in campaigns {
            total_spend += campaign.spend;
            total_revenue += campaign.revenue;
            let entry = per_channel
                .entry(campaign.channel_label().to_string())
                .or_insert((Decimal::ZERO, Decimal::ZERO));
            entry.0 += campaign.spend;
            entry.1 += campaign.revenue;
        }

        let channel_roi: BTreeMap<String, Decimal> = per_channel
            .into_iter()
            .filter(|(_, (spend, _))| *spend > Decimal::ZERO)
            .map(|(channel, (spend, revenue))| (channel, calculate_roi(spend, revenue)))
            .collect();

        // highest ROI, earliest channel name on ties
        let best_channel = channel_roi
            .iter()
            .fold(None::<(&String, &Decimal)>, |best, (channel, roi)| match best {
                Some((_, best_roi)) if best_roi >= roi => best,
                _ => Some((channel, roi)),
            })
            .map(|(channel, _)| channel.clone());

        let portfolio_roi = calculate_roi(total_spend, total_revenue);

        Self {
            total_campaigns: campaigns.len(),
            total_spend,
            total_revenue,
            portfolio_roi,
            portfolio_roi_percentage: roi_percentage(portfolio_roi),
            performance_distribution: campaigns.iter().map(|c| c.performance).collect(),
            channel_roi,
            best_channel,
            insights: Vec::new(),
            recommendations: Vec::new(),
            generated: false,
        }
    }

    /// Analysis of an organization without campaigns
    pub(crate) fn empty() -> Self {
        Self {
            insights: vec!["No campaigns data available yet".to_string()],
            recommendations: vec!["Upload campaign data to get AI-powered insights".to_string()],
            ..Self::summarize(&[])
        }
    }

    pub(crate) fn prompt(&self) -> String {
        let d = &self.performance_distribution;
        let channels = self
            .channel_roi
            .iter()
            .map(|(channel, roi)| format!("{}: {}", channel, roi_percentage(*roi)))
            .collect::<Vec<_>>()
            .join(", ");

        format!(
            "Analyze this marketing campaign performance data:\n\n\
             Total Campaigns: {}\n\
             Total Spend: ${:.2}\n\
             Total Revenue: ${:.2}\n\
             Portfolio ROI: {}\n\n\
             Performance Distribution:\n\
             - Excellent (ROI 300%+): {} campaigns\n\
             - Good (ROI 100-300%): {} campaigns\n\
             - Break-even (ROI 0-100%): {} campaigns\n\
             - Loss (ROI below 0%): {} campaigns\n\n\
             Channel ROI: {}\n\n\
             Provide:\n\
             1. 3-4 key insights about campaign performance and ROI trends\n\
             2. 3-4 actionable recommendations to optimize marketing spend\n\n\
             Format your response as JSON with two arrays: \"insights\" and \"recommendations\".\n\
             Each should be a concise sentence (max 100 characters).",
            self.total_campaigns,
            self.total_spend,
            self.total_revenue,
            self.portfolio_roi_percentage,
            d.excellent,
            d.good,
            d.break_even,
            d.loss,
            if channels.is_empty() { "none" } else { channels.as_str() },
        )
    }

    pub(crate) fn fallback(&self) -> ParsedInsights {
        let d = &self.performance_distribution;
        let mut insights = vec![
            format!(
                "Portfolio ROI at {} with ${} total revenue",
                self.portfolio_roi_percentage,
                group_thousands(self.total_revenue)
            ),
            format!("{} campaigns achieving excellent ROI (300%+)", d.excellent),
        ];
        let mut recommendations = Vec::new();

        if let Some(best) = &self.best_channel {
            insights.push(format!("{} is your top performing channel", title_case(best)));
            recommendations.push(format!(
                "Double down on {} - showing best ROI performance",
                best
            ));
        }
        if d.loss > 0 {
            recommendations.push(format!("Investigate {} underperforming campaigns", d.loss));
        }
        recommendations.push("Focus budget on channels with proven ROI above 100%".to_string());
        if self.best_channel.is_none() {
            recommendations.push("Add channel data to campaigns for better insights".to_string());
        }

        ParsedInsights {
            insights,
            recommendations,
        }
    }

    pub(crate) fn with_insights(mut self, parsed: ParsedInsights, generated: bool) -> Self {
        self.insights = parsed.insights;
        self.recommendations = parsed.recommendations;
        self.generated = generated;
        self
    }
}

/// Ask the generator for insights, falling back to `fallback` on any failure
///
/// Returns the insights, truncated to `limit`, and whether they were generated.
pub(crate) async fn narrate(
    generator: Option<&dyn TextGenerator>,
    prompt: String,
    limit: usize,
    fallback: impl FnOnce() -> ParsedInsights,
) -> (ParsedInsights, bool) {
    if let Some(generator) = generator {
        match generator
            .generate(GenerationRequest::new(SYSTEM_PROMPT, prompt))
            .await
        {
            Ok(text) => match extract_insights(&text, limit) {
                Some(parsed) => return (parsed, true),
                None => tracing::warn!(
                    model = generator.model_name(),
                    "Generated insights were unusable, using rule-based insights"
                ),
            },
            Err(e) => tracing::warn!(
                model = generator.model_name(),
                error = %e,
                "Insight generation failed, using rule-based insights"
            ),
        }
    }

    let mut parsed = fallback();
    parsed.insights.truncate(limit);
    parsed.recommendations.truncate(limit);
    (parsed, false)
}

fn string_keys(counts: BTreeMap<&str, usize>) -> BTreeMap<String, usize> {
    counts
        .into_iter()
        .map(|(key, count)| (key.to_string(), count))
        .collect()
}

fn render_counts(counts: &BTreeMap<String, usize>) -> String {
    counts
        .iter()
        .map(|(key, count)| format!("{}: {}", key, count))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Largest count, alphabetically first key on ties
fn top_entry(counts: &BTreeMap<String, usize>) -> Option<(&str, usize)> {
    counts
        .iter()
        .max_by(|a, b| a.1.cmp(b.1).then(b.0.cmp(a.0)))
        .map(|(key, count)| (key.as_str(), *count))
}

/// Whole currency units with thousands separators, e.g. `12,500`
fn group_thousands(value: Decimal) -> String {
    let rounded = value.round_dp_with_strategy(0, RoundingStrategy::MidpointNearestEven);
    let digits = rounded.abs().trunc().to_string();

    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }

    if rounded.is_sign_negative() && !rounded.is_zero() {
        format!("-{}", out)
    } else {
        out
    }
}

/// Capitalize the first letter of every word, lowercase the rest
fn title_case(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut in_word = false;
    for ch in value.chars() {
        if ch.is_alphabetic() {
            if in_word {
                out.extend(ch.to_lowercase());
            } else {
                out.extend(ch.to_uppercase());
            }
            in_word = true;
        } else {
            out.push(ch);
            in_word = false;
        }
    }
    out
}
