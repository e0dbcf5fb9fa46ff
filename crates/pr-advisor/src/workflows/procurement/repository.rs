use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::analysis::{AnalysisResult, RiskLevel};

/// Server-assigned identifier for a stored analysis.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AnalysisId(pub String);

impl AnalysisId {
    pub fn from_sequence(sequence: usize) -> Self {
        Self(format!("pra-{sequence:06}"))
    }
}

/// Persisted analysis. `created_at` is storage time and orders the history view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredAnalysis {
    pub id: AnalysisId,
    pub created_at: DateTime<Utc>,
    #[serde(flatten)]
    pub result: AnalysisResult,
}

/// Dashboard counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisStats {
    pub total: usize,
    pub critical: usize,
    pub high: usize,
    pub overruns: usize,
}

impl AnalysisStats {
    pub fn tally<'a>(records: impl IntoIterator<Item = &'a StoredAnalysis>) -> Self {
        records
            .into_iter()
            .fold(Self::default(), |mut stats, record| {
                stats.total += 1;
                match record.result.risk_level {
                    RiskLevel::Critical => stats.critical += 1,
                    RiskLevel::High => stats.high += 1,
                    RiskLevel::Medium | RiskLevel::Low => {}
                }
                if record.result.metrics.is_overrun {
                    stats.overruns += 1;
                }
                stats
            })
    }
}

/// Append-only storage for analysis results.
pub trait AnalysisRepository: Send + Sync {
    fn append(&self, result: AnalysisResult) -> Result<StoredAnalysis, RepositoryError>;
    /// Newest first, at most `limit` records.
    fn recent(&self, limit: usize) -> Result<Vec<StoredAnalysis>, RepositoryError>;
    fn stats(&self) -> Result<AnalysisStats, RepositoryError>;
    fn is_connected(&self) -> bool;
}

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("analysis store unavailable: {0}")]
    Unavailable(String),
    #[error("analysis store corrupt: {0}")]
    Corrupt(String),
}

/// Sorts newest first; records sharing a timestamp keep reverse insertion order.
pub fn newest_first(records: &[StoredAnalysis], limit: usize) -> Vec<StoredAnalysis> {
    let mut ordered: Vec<&StoredAnalysis> = records.iter().rev().collect();
    ordered.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    ordered.into_iter().take(limit).cloned().collect()
}
