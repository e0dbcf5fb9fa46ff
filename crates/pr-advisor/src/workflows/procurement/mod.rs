//! Purchase-request analysis: validation, the deterministic risk/recommendation
//! pipeline, and the storage and advisory seams around it.

pub mod advisory;
pub mod analysis;
pub mod domain;
pub mod error;
pub mod money;
pub mod repository;
pub mod router;
pub mod service;
pub mod store;
pub mod views;

#[cfg(test)]
mod tests;

pub use advisory::{
    AdvisoryConfidence, AdvisoryError, AdvisoryInsight, AdvisoryProvider, ConfiguredAdvisor,
    DisabledAdvisor, FollowUpContext, GeminiAdvisor,
};
pub use analysis::{
    assemble, AnalysisResult, BudgetMetrics, EffortLevel, RecommendationRule, RiskLevel,
    ScoreBucket, ScoreComponent, MAX_RISK_SCORE,
};
pub use domain::{ClientType, PrInput, PrSubmission, WinProbability};
pub use error::AnalysisError;
pub use money::Money;
pub use repository::{
    newest_first, AnalysisId, AnalysisRepository, AnalysisStats, RepositoryError,
    StoredAnalysis,
};
pub use router::{cors_layer, procurement_router};
pub use service::{
    AnalysisOutcome, FollowUpRequest, ProcurementAnalysisService, ProcurementServiceError,
};
pub use store::JsonLinesAnalysisRepository;
pub use views::{display_timestamp, AnalysisView};
