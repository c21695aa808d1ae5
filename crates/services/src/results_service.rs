use std::sync::Arc;

use chrono::{DateTime, Utc};
use exam_core::analytics::{self, Band};
use exam_core::model::{AttemptId, ExamResult};
use storage::repository::ResultCache;

use crate::error::ResultsError;

/// The cached result with its analytics computed.
///
/// Presentation-agnostic: the UI formats scores, dates and labels itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultOverview {
    pub result: ExamResult,
    pub attempt_id: Option<AttemptId>,
    pub cached_at: DateTime<Utc>,
    pub accuracy: Band,
    pub time: Band,
}

impl ResultOverview {
    #[must_use]
    pub fn from_result(
        result: ExamResult,
        attempt_id: Option<AttemptId>,
        cached_at: DateTime<Utc>,
    ) -> Self {
        let accuracy = analytics::accuracy_band(&result);
        let time = analytics::result_time_band(&result);
        Self {
            result,
            attempt_id,
            cached_at,
            accuracy,
            time,
        }
    }

    #[must_use]
    pub fn is_submitted(&self) -> bool {
        self.attempt_id.is_some()
    }
}

/// Read side of the local "most recent result" cache.
#[derive(Clone)]
pub struct ResultsService {
    results: Arc<dyn ResultCache>,
}

impl ResultsService {
    #[must_use]
    pub fn new(results: Arc<dyn ResultCache>) -> Self {
        Self { results }
    }

    /// Load the most recent result, if one was cached.
    ///
    /// # Errors
    ///
    /// Returns `ResultsError::Storage` on read or decode failures.
    pub async fn latest(&self) -> Result<Option<ResultOverview>, ResultsError> {
        let cached = self.results.latest().await?;
        Ok(cached.map(|cached| {
            ResultOverview::from_result(cached.result, cached.attempt_id, cached.cached_at)
        }))
    }

    /// Forget the cached result.
    ///
    /// # Errors
    ///
    /// Returns `ResultsError::Storage` if the entry cannot be removed.
    pub async fn clear(&self) -> Result<(), ResultsError> {
        self.results.clear().await?;
        tracing::info!("cached result cleared");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use exam_core::analytics::Quality;
    use exam_core::model::{
        AnswerValue, FinishedAttempt, FlagSet, ModuleKind, QuestionDraft, QuestionId, SeriesId,
    };
    use exam_core::time::fixed_now;
    use storage::repository::InMemoryRepository;

    fn result(elapsed_seconds: u32) -> ExamResult {
        let questions = (1..=5)
            .map(|id| {
                QuestionDraft {
                    id,
                    prompt: format!("Q{id}"),
                    choices: Some(vec!["a".into(), "b".into()]),
                    correct_choice: Some(0),
                    media_url: None,
                    points: 10,
                }
                .validate()
                .unwrap()
            })
            .collect::<Vec<_>>();
        let answers = (1..=4)
            .map(|id| (QuestionId::new(id), AnswerValue::Choice(0)))
            .collect();
        ExamResult::score_choices(FinishedAttempt {
            series_id: SeriesId::new(2),
            module_kind: ModuleKind::Listening,
            questions,
            answers,
            flags: FlagSet::default(),
            elapsed_seconds,
            allotted_seconds: 1_000,
            started_at: fixed_now(),
            finished_at: fixed_now(),
            timed_out: false,
        })
    }

    #[tokio::test]
    async fn latest_is_none_when_nothing_cached() {
        let svc = ResultsService::new(Arc::new(InMemoryRepository::new()));
        assert!(svc.latest().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn latest_computes_bands() {
        let repo = InMemoryRepository::new();
        repo.store_latest(&result(700), fixed_now()).await.unwrap();
        let svc = ResultsService::new(Arc::new(repo));

        let overview = svc.latest().await.unwrap().unwrap();
        assert_eq!(overview.accuracy.quality, Quality::Excellent);
        assert_eq!(overview.time.quality, Quality::Excellent);
        assert_eq!(overview.time.score, 100);
        assert!(!overview.is_submitted());
    }

    #[tokio::test]
    async fn clear_removes_cached_result() {
        let repo = InMemoryRepository::new();
        repo.store_latest(&result(950), fixed_now()).await.unwrap();
        let svc = ResultsService::new(Arc::new(repo));

        assert_eq!(
            svc.latest().await.unwrap().unwrap().time.quality,
            Quality::Good
        );
        svc.clear().await.unwrap();
        assert!(svc.latest().await.unwrap().is_none());
    }
}
