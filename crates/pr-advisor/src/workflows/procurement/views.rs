use chrono::{DateTime, FixedOffset, Offset, Utc};
use serde::Serialize;

use super::advisory::AdvisoryInsight;
use super::analysis::{
    AnalysisResult, BudgetMetrics, EffortLevel, RecommendationRule, RiskLevel, ScoreComponent,
};
use super::domain::PrInput;

const IST_OFFSET_SECS: i32 = 5 * 3600 + 30 * 60;

/// Renders a timestamp the way the dashboard shows it: `16/10/2026, 3:00:00 pm` in IST.
pub fn display_timestamp(at: DateTime<Utc>) -> String {
    let ist = FixedOffset::east_opt(IST_OFFSET_SECS).unwrap_or_else(|| Utc.fix());
    at.with_timezone(&ist)
        .format("%-d/%-m/%Y, %-I:%M:%S %P")
        .to_string()
}

/// Analysis payload returned to the submitting client.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisView<'a> {
    #[serde(flatten)]
    pub input: &'a PrInput,
    #[serde(flatten)]
    pub metrics: &'a BudgetMetrics,
    pub risk_score: u8,
    pub risk_level: RiskLevel,
    pub score_components: &'a [ScoreComponent],
    pub effort_level: EffortLevel,
    pub ai_recommendation: &'a str,
    pub recommendation_rule: RecommendationRule,
    pub generated_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ai_insight: Option<&'a AdvisoryInsight>,
}

impl<'a> AnalysisView<'a> {
    pub fn new(result: &'a AnalysisResult, ai_insight: Option<&'a AdvisoryInsight>) -> Self {
        Self {
            input: &result.input,
            metrics: &result.metrics,
            risk_score: result.risk_score,
            risk_level: result.risk_level,
            score_components: &result.score_components,
            effort_level: result.effort_level,
            ai_recommendation: &result.ai_recommendation,
            recommendation_rule: result.recommendation_rule,
            generated_at: display_timestamp(result.generated_at),
            ai_insight,
        }
    }
}
