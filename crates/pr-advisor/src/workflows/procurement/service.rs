use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;
use tracing::{info, warn};

use super::advisory::{AdvisoryError, AdvisoryInsight, AdvisoryProvider, FollowUpContext};
use super::analysis::{assemble, AnalysisResult};
use super::domain::PrSubmission;
use super::error::AnalysisError;
use super::repository::{AnalysisRepository, AnalysisStats, RepositoryError, StoredAnalysis};

/// What `analyze` hands back: the deterministic result plus best-effort extras.
#[derive(Debug, Clone)]
pub struct AnalysisOutcome {
    pub result: AnalysisResult,
    /// `None` when the store rejected the record; the result is still valid.
    pub stored: Option<StoredAnalysis>,
    pub insight: Option<AdvisoryInsight>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FollowUpRequest {
    pub context: FollowUpContext,
    #[serde(default)]
    pub question: String,
}

/// Service composing validation, the analysis pipeline, storage and advisory enrichment.
pub struct ProcurementAnalysisService<R, A> {
    repository: Arc<R>,
    advisor: Arc<A>,
    history_limit: usize,
}

impl<R, A> ProcurementAnalysisService<R, A>
where
    R: AnalysisRepository + 'static,
    A: AdvisoryProvider + 'static,
{
    pub fn new(repository: Arc<R>, advisor: Arc<A>, history_limit: usize) -> Self {
        Self {
            repository,
            advisor,
            history_limit: history_limit.max(1),
        }
    }

    /// Validate, analyse, store, then enrich. Only validation and analysis failures are fatal.
    pub async fn analyze(
        &self,
        submission: PrSubmission,
    ) -> Result<AnalysisOutcome, ProcurementServiceError> {
        let input = submission.validate()?;
        let result = assemble(&input, Utc::now())?;

        let stored = match self.repository.append(result.clone()) {
            Ok(stored) => Some(stored),
            Err(err) => {
                warn!(project = %result.input.project_name, error = %err, "analysis not persisted");
                None
            }
        };

        let insight = match self.advisor.generate_insight(&result).await {
            Ok(insight) => Some(insight),
            Err(AdvisoryError::Disabled) => None,
            Err(err) => {
                warn!(project = %result.input.project_name, error = %err, "advisory enrichment skipped");
                None
            }
        };

        info!(
            project = %result.input.project_name,
            risk_level = %result.risk_level,
            risk_score = result.risk_score,
            effort = %result.effort_level,
            stored = stored.is_some(),
            "purchase request analysed"
        );

        Ok(AnalysisOutcome {
            result,
            stored,
            insight,
        })
    }

    pub fn history(&self) -> Result<Vec<StoredAnalysis>, ProcurementServiceError> {
        Ok(self.repository.recent(self.history_limit)?)
    }

    pub fn stats(&self) -> Result<AnalysisStats, ProcurementServiceError> {
        Ok(self.repository.stats()?)
    }

    pub fn storage_connected(&self) -> bool {
        self.repository.is_connected()
    }

    pub async fn follow_up(
        &self,
        request: FollowUpRequest,
    ) -> Result<String, ProcurementServiceError> {
        let question = request.question.trim();
        if question.is_empty() {
            return Err(AnalysisError::invalid("question", "is required").into());
        }

        let answer = self
            .advisor
            .answer_follow_up(&request.context, question)
            .await?;
        Ok(answer)
    }
}

/// Error raised by the procurement service.
#[derive(Debug, thiserror::Error)]
pub enum ProcurementServiceError {
    #[error(transparent)]
    Analysis(#[from] AnalysisError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Advisory(#[from] AdvisoryError),
}
