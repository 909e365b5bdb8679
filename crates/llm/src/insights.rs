//! Insight extraction from model output
//!
//! Models are asked for a JSON object with `insights` and `recommendations`
//! arrays but often wrap it in markdown or prose. The outermost `{...}` span
//! is parsed when present; otherwise non-empty lines are split into the two
//! lists.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

/// Lines taken per list by the plain-text fallback
const LINES_PER_LIST: usize = 4;

static JSON_OBJECT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{[\s\S]*\}").expect("static regex is valid"));

/// Insights and recommendations parsed from model output
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedInsights {
    pub insights: Vec<String>,
    pub recommendations: Vec<String>,
}

#[derive(Deserialize)]
struct RawInsights {
    #[serde(default)]
    insights: Vec<String>,
    #[serde(default)]
    recommendations: Vec<String>,
}

/// Parse model output into at most `limit` insights and recommendations
///
/// Returns `None` when the output is unusable: a JSON span that does not
/// parse, or no insights at all. Callers fall back to rule-based text.
pub fn extract_insights(text: &str, limit: usize) -> Option<ParsedInsights> {
    let mut parsed = match JSON_OBJECT.find(text) {
        Some(m) => match serde_json::from_str::<RawInsights>(m.as_str()) {
            Ok(raw) => ParsedInsights {
                insights: raw.insights,
                recommendations: raw.recommendations,
            },
            Err(e) => {
                tracing::debug!(error = %e, "Model output contained malformed JSON");
                return None;
            }
        },
        None => split_lines(text),
    };

    if parsed.insights.is_empty() {
        return None;
    }

    parsed.insights.truncate(limit);
    parsed.recommendations.truncate(limit);
    Some(parsed)
}

fn split_lines(text: &str) -> ParsedInsights {
    let lines: Vec<String> = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect();

    ParsedInsights {
        insights: lines.iter().take(LINES_PER_LIST).cloned().collect(),
        recommendations: lines
            .iter()
            .skip(LINES_PER_LIST)
            .take(LINES_PER_LIST)
            .cloned()
            .collect(),
    }
}
