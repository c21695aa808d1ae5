use async_trait::async_trait;
use chrono::{DateTime, Utc};
use exam_core::model::{
    Answers, AttemptId, ExamResult, ExamResultParts, Level, ModuleKind, Question, ResultError,
    ResultId, SeriesId,
};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error(transparent)]
    InvalidResult(#[from] ResultError),
}

/// Persisted shape of an `ExamResult`.
///
/// `into_result` re-validates the fields on the way back in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultRecord {
    pub id: ResultId,
    pub series_id: SeriesId,
    pub module_kind: ModuleKind,
    pub score: u32,
    pub level: Level,
    pub questions: Vec<Question>,
    pub answers: Answers,
    pub correct_count: u32,
    pub total_questions: u32,
    pub elapsed_seconds: u32,
    pub allotted_seconds: u32,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl ResultRecord {
    #[must_use]
    pub fn from_result(result: &ExamResult) -> Self {
        let parts = result.to_parts();
        Self {
            id: parts.id,
            series_id: parts.series_id,
            module_kind: parts.module_kind,
            score: parts.score,
            level: parts.level,
            questions: parts.questions,
            answers: parts.answers,
            correct_count: parts.correct_count,
            total_questions: parts.total_questions,
            elapsed_seconds: parts.elapsed_seconds,
            allotted_seconds: parts.allotted_seconds,
            started_at: parts.started_at,
            finished_at: parts.finished_at,
        }
    }

    /// Convert the record back into a domain `ExamResult`.
    ///
    /// # Errors
    ///
    /// Returns `ResultError` if the stored fields break result invariants.
    pub fn into_result(self) -> Result<ExamResult, ResultError> {
        ExamResult::from_persisted(ExamResultParts {
            id: self.id,
            series_id: self.series_id,
            module_kind: self.module_kind,
            score: self.score,
            level: self.level,
            questions: self.questions,
            answers: self.answers,
            correct_count: self.correct_count,
            total_questions: self.total_questions,
            elapsed_seconds: self.elapsed_seconds,
            allotted_seconds: self.allotted_seconds,
            started_at: self.started_at,
            finished_at: self.finished_at,
        })
    }
}

/// The most recent result together with its remote submission state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedResult {
    pub result: ExamResult,
    /// Set once the remote API has accepted the attempt.
    pub attempt_id: Option<AttemptId>,
    pub cached_at: DateTime<Utc>,
}

/// Local cache holding a single "most recent result" entry.
#[async_trait]
pub trait ResultCache: Send + Sync {
    /// Replace the cached entry with `result`, clearing any previous attempt id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the result cannot be stored.
    async fn store_latest(
        &self,
        result: &ExamResult,
        cached_at: DateTime<Utc>,
    ) -> Result<(), StorageError>;

    /// Fetch the cached entry, if any.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on read or decode failures.
    async fn latest(&self) -> Result<Option<CachedResult>, StorageError>;

    /// Record the remote attempt id for the cached result.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if `result_id` is no longer the cached result.
    async fn mark_submitted(
        &self,
        result_id: ResultId,
        attempt_id: &AttemptId,
    ) -> Result<(), StorageError>;

    /// Drop the cached entry.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the entry cannot be removed.
    async fn clear(&self) -> Result<(), StorageError>;
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    latest: Arc<Mutex<Option<CachedResult>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ResultCache for InMemoryRepository {
    async fn store_latest(
        &self,
        result: &ExamResult,
        cached_at: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        let mut guard = self
            .latest
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        *guard = Some(CachedResult {
            result: result.clone(),
            attempt_id: None,
            cached_at,
        });
        Ok(())
    }

    async fn latest(&self) -> Result<Option<CachedResult>, StorageError> {
        let guard = self
            .latest
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.clone())
    }

    async fn mark_submitted(
        &self,
        result_id: ResultId,
        attempt_id: &AttemptId,
    ) -> Result<(), StorageError> {
        let mut guard = self
            .latest
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        match guard.as_mut() {
            Some(cached) if cached.result.id() == result_id => {
                cached.attempt_id = Some(attempt_id.clone());
                Ok(())
            }
            _ => Err(StorageError::NotFound),
        }
    }

    async fn clear(&self) -> Result<(), StorageError> {
        let mut guard = self
            .latest
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        *guard = None;
        Ok(())
    }
}

/// Bundle of repositories handed to the services layer.
#[derive(Clone)]
pub struct Storage {
    pub results: Arc<dyn ResultCache>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let results: Arc<dyn ResultCache> = Arc::new(InMemoryRepository::new());
        Self { results }
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::build_result;
    use super::*;
    use exam_core::time::fixed_now;

    #[tokio::test]
    async fn store_latest_overwrites_previous_entry() {
        let repo = InMemoryRepository::new();
        let first = build_result(1);
        let second = build_result(2);

        repo.store_latest(&first, fixed_now()).await.unwrap();
        repo.mark_submitted(first.id(), &AttemptId::new("a-1"))
            .await
            .unwrap();
        repo.store_latest(&second, fixed_now()).await.unwrap();

        let cached = repo.latest().await.unwrap().unwrap();
        assert_eq!(cached.result, second);
        assert_eq!(cached.attempt_id, None);
    }

    #[tokio::test]
    async fn mark_submitted_requires_current_result() {
        let repo = InMemoryRepository::new();
        let first = build_result(1);
        let second = build_result(2);
        repo.store_latest(&second, fixed_now()).await.unwrap();

        let err = repo
            .mark_submitted(first.id(), &AttemptId::new("stale"))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::NotFound));
    }

    #[tokio::test]
    async fn clear_empties_cache() {
        let storage = Storage::in_memory();
        storage
            .results
            .store_latest(&build_result(3), fixed_now())
            .await
            .unwrap();
        storage.results.clear().await.unwrap();
        assert!(storage.results.latest().await.unwrap().is_none());
    }

    #[test]
    fn record_roundtrips_through_json() {
        let result = build_result(4);
        let json = serde_json::to_string(&ResultRecord::from_result(&result)).unwrap();
        let record: ResultRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(record.into_result().unwrap(), result);
    }
}
