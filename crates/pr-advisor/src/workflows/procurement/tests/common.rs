use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::response::Response;
use chrono::{TimeZone, Utc};
use serde_json::Value;

use crate::workflows::procurement::advisory::{
    AdvisoryConfidence, AdvisoryError, AdvisoryInsight, AdvisoryProvider, DisabledAdvisor,
    FollowUpContext,
};
use crate::workflows::procurement::analysis::AnalysisResult;
use crate::workflows::procurement::domain::PrSubmission;
use crate::workflows::procurement::repository::{
    newest_first, AnalysisId, AnalysisRepository, AnalysisStats, RepositoryError, StoredAnalysis,
};
use crate::workflows::procurement::service::ProcurementAnalysisService;

pub(super) fn scenario_a() -> PrSubmission {
    PrSubmission {
        project_name: Some("Scenario A - Mall Chiller Plant".to_string()),
        client_type: Some("Repeat".to_string()),
        project_size: Some(7_500_000.0),
        project_budget: Some(5_000_000.0),
        spent_till_date: Some(3_200_000.0),
        new_pr_value: Some(1_200_000.0),
        historical_win_probability: Some(0.72),
    }
}

pub(super) fn scenario_b() -> PrSubmission {
    PrSubmission {
        project_name: Some("Scenario B - Mall Chiller Plant".to_string()),
        new_pr_value: Some(2_000_000.0),
        ..scenario_a()
    }
}

pub(super) fn scenario_c() -> PrSubmission {
    PrSubmission {
        project_name: Some("Scenario C - Clinic VRF Retrofit".to_string()),
        client_type: Some("New".to_string()),
        project_size: Some(2_000_000.0),
        project_budget: Some(1_000_000.0),
        spent_till_date: Some(300_000.0),
        new_pr_value: Some(200_000.0),
        historical_win_probability: Some(0.30),
    }
}

pub(super) fn insight() -> AdvisoryInsight {
    AdvisoryInsight {
        short_recommendation: "Proceed with a concept BOQ and seek sign-off.".to_string(),
        detailed_analysis: "Utilization is high but the client converts reliably.".to_string(),
        action_items: vec!["Request director sign-off".to_string()],
        risk_flags: vec!["Budget above 85%".to_string()],
        confidence: AdvisoryConfidence::Medium,
    }
}

#[derive(Default)]
pub(super) struct MemoryRepository {
    records: Mutex<Vec<StoredAnalysis>>,
}

impl MemoryRepository {
    pub(super) fn len(&self) -> usize {
        self.records.lock().expect("repository mutex poisoned").len()
    }

    /// Appends with an explicit storage timestamp so ordering can be asserted.
    pub(super) fn seed(&self, result: AnalysisResult, minute: u32) {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        let id = AnalysisId::from_sequence(guard.len() + 1);
        guard.push(StoredAnalysis {
            id,
            created_at: Utc
                .with_ymd_and_hms(2026, 10, 16, 10, minute, 0)
                .single()
                .expect("valid timestamp"),
            result,
        });
    }
}

impl AnalysisRepository for MemoryRepository {
    fn append(&self, result: AnalysisResult) -> Result<StoredAnalysis, RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        let stored = StoredAnalysis {
            id: AnalysisId::from_sequence(guard.len() + 1),
            created_at: Utc::now(),
            result,
        };
        guard.push(stored.clone());
        Ok(stored)
    }

    fn recent(&self, limit: usize) -> Result<Vec<StoredAnalysis>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(newest_first(&guard, limit))
    }

    fn stats(&self) -> Result<AnalysisStats, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(AnalysisStats::tally(guard.iter()))
    }

    fn is_connected(&self) -> bool {
        true
    }
}

pub(super) struct UnavailableRepository;

impl AnalysisRepository for UnavailableRepository {
    fn append(&self, _result: AnalysisResult) -> Result<StoredAnalysis, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn recent(&self, _limit: usize) -> Result<Vec<StoredAnalysis>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn stats(&self) -> Result<AnalysisStats, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn is_connected(&self) -> bool {
        false
    }
}

/// Advisor returning canned output and counting calls.
#[derive(Default)]
pub(super) struct StubAdvisor {
    pub(super) insight_calls: AtomicUsize,
    pub(super) questions: Mutex<Vec<String>>,
}

impl StubAdvisor {
    pub(super) fn insight_calls(&self) -> usize {
        self.insight_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AdvisoryProvider for StubAdvisor {
    async fn generate_insight(
        &self,
        _result: &AnalysisResult,
    ) -> Result<AdvisoryInsight, AdvisoryError> {
        self.insight_calls.fetch_add(1, Ordering::SeqCst);
        Ok(insight())
    }

    async fn answer_follow_up(
        &self,
        context: &FollowUpContext,
        question: &str,
    ) -> Result<String, AdvisoryError> {
        self.questions
            .lock()
            .expect("advisor mutex poisoned")
            .push(question.to_string());
        Ok(format!("{} should be phased.", context.project_name))
    }
}

pub(super) struct FailingAdvisor;

#[async_trait]
impl AdvisoryProvider for FailingAdvisor {
    async fn generate_insight(
        &self,
        _result: &AnalysisResult,
    ) -> Result<AdvisoryInsight, AdvisoryError> {
        Err(AdvisoryError::Transport("connection reset".to_string()))
    }

    async fn answer_follow_up(
        &self,
        _context: &FollowUpContext,
        _question: &str,
    ) -> Result<String, AdvisoryError> {
        Err(AdvisoryError::Transport("connection reset".to_string()))
    }
}

pub(super) fn build_service() -> (
    ProcurementAnalysisService<MemoryRepository, StubAdvisor>,
    Arc<MemoryRepository>,
    Arc<StubAdvisor>,
) {
    let repository = Arc::new(MemoryRepository::default());
    let advisor = Arc::new(StubAdvisor::default());
    let service = ProcurementAnalysisService::new(repository.clone(), advisor.clone(), 50);
    (service, repository, advisor)
}

pub(super) fn disabled_service(
) -> ProcurementAnalysisService<MemoryRepository, DisabledAdvisor> {
    ProcurementAnalysisService::new(
        Arc::new(MemoryRepository::default()),
        Arc::new(DisabledAdvisor),
        50,
    )
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
