//! Append-only JSON-lines file store: one stored analysis per line.

use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::Utc;
use tracing::{debug, info};

use super::analysis::AnalysisResult;
use super::repository::{
    newest_first, AnalysisId, AnalysisRepository, AnalysisStats, RepositoryError, StoredAnalysis,
};

pub struct JsonLinesAnalysisRepository {
    path: PathBuf,
    records: Mutex<Vec<StoredAnalysis>>,
}

impl JsonLinesAnalysisRepository {
    /// Opens (or creates) the log at `path` and replays existing records.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, RepositoryError> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|err| unavailable(&path, err))?;
        }

        let records = if path.exists() {
            replay(&path)?
        } else {
            Vec::new()
        };
        info!(path = %path.display(), records = records.len(), "analysis log opened");

        Ok(Self {
            path,
            records: Mutex::new(records),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn replay(path: &Path) -> Result<Vec<StoredAnalysis>, RepositoryError> {
    let file = File::open(path).map_err(|err| unavailable(path, err))?;
    let mut records = Vec::new();
    for (index, line) in BufReader::new(file).lines().enumerate() {
        let line = line.map_err(|err| unavailable(path, err))?;
        if line.trim().is_empty() {
            continue;
        }
        let record: StoredAnalysis = serde_json::from_str(&line)
            .map_err(|err| RepositoryError::Corrupt(format!("line {}: {err}", index + 1)))?;
        records.push(record);
    }
    Ok(records)
}

fn unavailable(path: &Path, err: std::io::Error) -> RepositoryError {
    RepositoryError::Unavailable(format!("{}: {err}", path.display()))
}

fn poisoned() -> RepositoryError {
    RepositoryError::Unavailable("analysis log lock poisoned".to_string())
}

impl AnalysisRepository for JsonLinesAnalysisRepository {
    fn append(&self, result: AnalysisResult) -> Result<StoredAnalysis, RepositoryError> {
        let mut records = self.records.lock().map_err(|_| poisoned())?;
        let stored = StoredAnalysis {
            id: AnalysisId::from_sequence(records.len() + 1),
            created_at: Utc::now(),
            result,
        };

        let line = serde_json::to_string(&stored)
            .map_err(|err| RepositoryError::Corrupt(err.to_string()))?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|err| unavailable(&self.path, err))?;
        writeln!(file, "{line}").map_err(|err| unavailable(&self.path, err))?;

        debug!(id = %stored.id.0, "analysis appended");
        records.push(stored.clone());
        Ok(stored)
    }

    fn recent(&self, limit: usize) -> Result<Vec<StoredAnalysis>, RepositoryError> {
        let records = self.records.lock().map_err(|_| poisoned())?;
        Ok(newest_first(&records, limit))
    }

    fn stats(&self) -> Result<AnalysisStats, RepositoryError> {
        let records = self.records.lock().map_err(|_| poisoned())?;
        Ok(AnalysisStats::tally(records.iter()))
    }

    /// Never creates the log; a missing file is fine as long as its directory exists.
    fn is_connected(&self) -> bool {
        if self.path.exists() {
            return OpenOptions::new().append(true).open(&self.path).is_ok();
        }
        let parent = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        fs::metadata(parent)
            .map(|meta| meta.is_dir())
            .unwrap_or(false)
    }
}
