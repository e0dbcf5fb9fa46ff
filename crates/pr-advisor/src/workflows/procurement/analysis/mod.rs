mod recommendation;
mod scoring;
mod utilization;

pub use recommendation::{
    priority_order, recommend, EffortLevel, Recommendation, RecommendationRule,
};
pub use scoring::{
    assess, RiskAssessment, RiskLevel, ScoreBucket, ScoreComponent, MAX_RISK_SCORE,
};
pub use utilization::{calculate, Utilization, UtilizationSnapshot};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::PrInput;
use super::error::AnalysisError;
use super::money::Money;

/// Budget figures derived from the four monetary inputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetMetrics {
    pub remaining_budget: Money,
    pub budget_utilization_before: f64,
    pub budget_utilization_after: f64,
    pub expected_value: Money,
    pub is_overrun: bool,
    pub overrun_amount: Money,
}

/// Immutable outcome of one purchase-request analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    #[serde(flatten)]
    pub input: PrInput,
    #[serde(flatten)]
    pub metrics: BudgetMetrics,
    pub risk_score: u8,
    pub risk_level: RiskLevel,
    pub score_components: Vec<ScoreComponent>,
    pub effort_level: EffortLevel,
    pub ai_recommendation: String,
    pub recommendation_rule: RecommendationRule,
    pub generated_at: DateTime<Utc>,
}

/// Runs calculator, scorer and recommendation engine in order. All or nothing.
pub fn assemble(
    input: &PrInput,
    generated_at: DateTime<Utc>,
) -> Result<AnalysisResult, AnalysisError> {
    let snapshot = calculate(
        input.project_budget,
        input.spent_till_date,
        input.new_pr_value,
    )?;
    let risk = assess(input)?;
    let recommendation = recommend(input, snapshot.remaining_budget)?;

    let is_overrun = snapshot.remaining_budget.is_negative();
    let overrun_amount = if is_overrun {
        snapshot
            .remaining_budget
            .checked_neg()
            .ok_or(AnalysisError::Internal("overrun amount overflowed"))?
    } else {
        Money::ZERO
    };

    let metrics = BudgetMetrics {
        remaining_budget: snapshot.remaining_budget,
        budget_utilization_before: snapshot.before_percent(),
        budget_utilization_after: snapshot.after_percent(),
        expected_value: expected_value(input)?,
        is_overrun,
        overrun_amount,
    };

    Ok(AnalysisResult {
        input: input.clone(),
        metrics,
        risk_score: risk.score,
        risk_level: risk.level,
        score_components: risk.components,
        effort_level: recommendation.effort,
        ai_recommendation: recommendation.message,
        recommendation_rule: recommendation.rule,
        generated_at,
    })
}

/// `project_size * historical_win_probability`, rounded to the nearest paisa.
fn expected_value(input: &PrInput) -> Result<Money, AnalysisError> {
    let size = i128::from(input.project_size.minor_units());
    let points = i128::from(input.historical_win_probability.basis_points());
    let scale = 10_000i128;
    let scaled = size * points;
    let rounded = if scaled >= 0 {
        (2 * scaled + scale) / (2 * scale)
    } else {
        -((-2 * scaled + scale) / (2 * scale))
    };
    i64::try_from(rounded)
        .map(Money::from_minor)
        .map_err(|_| AnalysisError::Internal("expected value overflowed"))
}
