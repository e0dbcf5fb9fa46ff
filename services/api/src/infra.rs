use chrono::Utc;
use metrics_exporter_prometheus::PrometheusHandle;
use pr_advisor::config::StorageConfig;
use pr_advisor::workflows::procurement::{
    newest_first, AnalysisId, AnalysisRepository, AnalysisResult, AnalysisStats,
    JsonLinesAnalysisRepository, RepositoryError, StoredAnalysis,
};
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Process-local store used when no log file is configured. History is lost on restart.
#[derive(Default, Clone)]
pub(crate) struct InMemoryAnalysisRepository {
    records: Arc<Mutex<Vec<StoredAnalysis>>>,
}

impl InMemoryAnalysisRepository {
    fn guard(&self) -> Result<MutexGuard<'_, Vec<StoredAnalysis>>, RepositoryError> {
        self.records
            .lock()
            .map_err(|_| RepositoryError::Unavailable("in-memory store lock poisoned".to_string()))
    }
}

impl AnalysisRepository for InMemoryAnalysisRepository {
    fn append(&self, result: AnalysisResult) -> Result<StoredAnalysis, RepositoryError> {
        let mut guard = self.guard()?;
        let stored = StoredAnalysis {
            id: AnalysisId::from_sequence(guard.len() + 1),
            created_at: Utc::now(),
            result,
        };
        guard.push(stored.clone());
        Ok(stored)
    }

    fn recent(&self, limit: usize) -> Result<Vec<StoredAnalysis>, RepositoryError> {
        let guard = self.guard()?;
        Ok(newest_first(&guard, limit))
    }

    fn stats(&self) -> Result<AnalysisStats, RepositoryError> {
        let guard = self.guard()?;
        Ok(AnalysisStats::tally(guard.iter()))
    }

    fn is_connected(&self) -> bool {
        self.records.lock().is_ok()
    }
}

/// Storage backend picked at startup.
pub(crate) enum ConfiguredRepository {
    File(JsonLinesAnalysisRepository),
    Memory(InMemoryAnalysisRepository),
}

impl ConfiguredRepository {
    pub(crate) fn from_config(config: &StorageConfig) -> Result<Self, RepositoryError> {
        match &config.store_path {
            Some(path) => JsonLinesAnalysisRepository::open(path.clone()).map(Self::File),
            None => Ok(Self::Memory(InMemoryAnalysisRepository::default())),
        }
    }

    pub(crate) fn backend(&self) -> &'static str {
        match self {
            Self::File(_) => "json-lines",
            Self::Memory(_) => "in-memory",
        }
    }

    fn inner(&self) -> &dyn AnalysisRepository {
        match self {
            Self::File(store) => store,
            Self::Memory(store) => store,
        }
    }
}

impl AnalysisRepository for ConfiguredRepository {
    fn append(&self, result: AnalysisResult) -> Result<StoredAnalysis, RepositoryError> {
        self.inner().append(result)
    }

    fn recent(&self, limit: usize) -> Result<Vec<StoredAnalysis>, RepositoryError> {
        self.inner().recent(limit)
    }

    fn stats(&self) -> Result<AnalysisStats, RepositoryError> {
        self.inner().stats()
    }

    fn is_connected(&self) -> bool {
        self.inner().is_connected()
    }
}
