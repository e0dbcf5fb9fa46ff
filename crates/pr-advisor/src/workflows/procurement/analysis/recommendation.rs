//! Ordered decision table mapping a purchase request to a procurement effort level.
//!
//! Rules are evaluated top-down and the first match wins. The table order is the
//! contract: an overrun pre-empts every other rule, fast-track eligibility pre-empts
//! the design-effort rules, and so on down to the unconditional fallback.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::super::domain::{ClientType, PrInput};
use super::super::error::AnalysisError;
use super::super::money::Money;
use super::utilization::Utilization;

/// How much preparation work to invest before committing to the PR.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EffortLevel {
    #[serde(rename = "Minimal effort – low expected value")]
    Minimal,
    #[serde(rename = "Fast-track – high probability client")]
    FastTrack,
    #[serde(rename = "Full design effort")]
    FullDesign,
    #[serde(rename = "Concept-level BOQ only")]
    ConceptBoq,
}

impl EffortLevel {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Minimal => "Minimal effort – low expected value",
            Self::FastTrack => "Fast-track – high probability client",
            Self::FullDesign => "Full design effort",
            Self::ConceptBoq => "Concept-level BOQ only",
        }
    }
}

impl fmt::Display for EffortLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Identifies which row of the decision table produced a recommendation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationRule {
    BudgetOverrun,
    FastTrack,
    FullDesign,
    LowWinProbability,
    HighUtilization,
    ConceptDefault,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recommendation {
    pub rule: RecommendationRule,
    pub effort: EffortLevel,
    pub message: String,
}

struct RuleContext<'a> {
    input: &'a PrInput,
    remaining_budget: Money,
    utilization_after: Utilization,
}

struct DecisionRule {
    rule: RecommendationRule,
    effort: EffortLevel,
    applies: fn(&RuleContext<'_>) -> bool,
    message: fn(&RuleContext<'_>) -> String,
}

const DECISION_TABLE: [DecisionRule; 6] = [
    DecisionRule {
        rule: RecommendationRule::BudgetOverrun,
        effort: EffortLevel::Minimal,
        applies: |ctx| ctx.remaining_budget.is_negative(),
        message: |ctx| {
            let overrun = ctx
                .remaining_budget
                .checked_neg()
                .unwrap_or(ctx.remaining_budget);
            format!(
                "PR exceeds available budget by {overrun}. Immediate director approval required \
                 before any procurement. Consider phasing or scope revision."
            )
        },
    },
    DecisionRule {
        rule: RecommendationRule::FastTrack,
        effort: EffortLevel::FastTrack,
        applies: |ctx| {
            ctx.input.historical_win_probability.basis_points() >= 7_500
                && ctx.input.client_type == ClientType::Repeat
        },
        message: |ctx| {
            format!(
                "Proceed immediately. Repeat client with {} historical conversion. Budget is \
                 healthy. Prioritize delivery timeline and skip intermediate approvals.",
                ctx.input.historical_win_probability.percent_label()
            )
        },
    },
    DecisionRule {
        rule: RecommendationRule::FullDesign,
        effort: EffortLevel::FullDesign,
        applies: |ctx| {
            ctx.input.historical_win_probability.basis_points() >= 6_000
                && ctx.utilization_after.below_percent(85)
        },
        message: |ctx| {
            format!(
                "Proceed with detailed BOQ. {} client with {} historical conversion. Budget \
                 utilization stays within safe range after this PR.",
                ctx.input.client_type,
                ctx.input.historical_win_probability.percent_label()
            )
        },
    },
    DecisionRule {
        rule: RecommendationRule::LowWinProbability,
        effort: EffortLevel::Minimal,
        applies: |ctx| ctx.input.historical_win_probability.basis_points() < 4_500,
        message: |ctx| {
            format!(
                "Win probability is only {}. Limit effort to a high-level estimate. Re-evaluate \
                 when client engagement improves.",
                ctx.input.historical_win_probability.percent_label()
            )
        },
    },
    DecisionRule {
        rule: RecommendationRule::HighUtilization,
        effort: EffortLevel::ConceptBoq,
        applies: |ctx| ctx.utilization_after.at_least_percent(85),
        message: |ctx| {
            format!(
                "Budget utilization after PR will reach {:.1}%. Proceed with concept-level BOQ \
                 only. Seek director sign-off before full commitment.",
                ctx.utilization_after.percent()
            )
        },
    },
    DecisionRule {
        rule: RecommendationRule::ConceptDefault,
        effort: EffortLevel::ConceptBoq,
        applies: |_| true,
        message: |_| {
            "Moderate risk detected. Prepare concept-level design and confirm client intent \
             before committing full procurement resources."
                .to_string()
        },
    },
];

/// Rules in evaluation order.
pub fn priority_order() -> impl Iterator<Item = (RecommendationRule, EffortLevel)> {
    DECISION_TABLE.iter().map(|row| (row.rule, row.effort))
}

/// Picks the first matching rule for `input`, given the already computed remaining budget.
pub fn recommend(
    input: &PrInput,
    remaining_budget: Money,
) -> Result<Recommendation, AnalysisError> {
    let committed = input
        .spent_till_date
        .checked_add(input.new_pr_value)
        .ok_or(AnalysisError::Internal("committed amount overflowed"))?;
    let ctx = RuleContext {
        input,
        remaining_budget,
        utilization_after: Utilization::of(committed, input.project_budget)?,
    };

    DECISION_TABLE
        .iter()
        .find(|row| (row.applies)(&ctx))
        .map(|row| Recommendation {
            rule: row.rule,
            effort: row.effort,
            message: (row.message)(&ctx),
        })
        .ok_or(AnalysisError::Internal("decision table has no fallback rule"))
}
