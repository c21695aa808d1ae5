use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use exam_core::model::{
    AnswerValue, AttemptId, ExamResult, FinishedAttempt, FlagSet, ModuleKind, QuestionDraft,
    QuestionId, ResultId, SeriesId,
};
use exam_core::time::fixed_now;
use storage::repository::{CachedResult, ResultCache, Storage, StorageError};

use super::test_harness::{ViewKind, setup_view_harness, setup_view_harness_with_cache};

fn sample_result() -> ExamResult {
    let questions = (1..=4)
        .map(|id| {
            QuestionDraft {
                id,
                prompt: format!("Q{id}"),
                choices: Some(vec!["a".into(), "b".into()]),
                correct_choice: Some(1),
                media_url: None,
                points: 10,
            }
            .validate()
            .unwrap()
        })
        .collect();
    let answers = (1..=3)
        .map(|id| (QuestionId::new(id), AnswerValue::Choice(1)))
        .collect();
    ExamResult::score_choices(FinishedAttempt {
        series_id: SeriesId::new(9),
        module_kind: ModuleKind::Reading,
        questions,
        answers,
        flags: FlagSet::default(),
        elapsed_seconds: 2_400,
        allotted_seconds: 3_600,
        started_at: fixed_now(),
        finished_at: fixed_now(),
        timed_out: false,
    })
}

#[tokio::test(flavor = "current_thread")]
async fn home_view_smoke_renders_latest_result() {
    let mut harness = setup_view_harness(ViewKind::Home);
    harness
        .storage
        .results
        .store_latest(&sample_result(), fixed_now())
        .await
        .expect("store result");

    harness.rebuild();
    harness.drive_async().await;
    let html = harness.render();
    assert!(html.contains("Start exam"), "missing start button in {html}");
    assert!(html.contains("Series 9"), "missing series in {html}");
    assert!(html.contains("524 / 699"), "missing score in {html}");
}

#[tokio::test(flavor = "current_thread")]
async fn results_view_smoke_renders_bands_and_retry() {
    let mut harness = setup_view_harness(ViewKind::Results);
    harness
        .storage
        .results
        .store_latest(&sample_result(), fixed_now())
        .await
        .expect("store result");

    harness.rebuild();
    harness.drive_async().await;
    let html = harness.render();
    assert!(html.contains("3 / 4 correct"), "missing correct count in {html}");
    assert!(html.contains("Bien"), "missing accuracy band in {html}");
    assert!(html.contains("Excellent"), "missing time band in {html}");
    assert!(html.contains("Retry submission"), "missing retry in {html}");
}

#[tokio::test(flavor = "current_thread")]
async fn results_view_smoke_renders_empty_state() {
    let mut harness = setup_view_harness(ViewKind::Results);
    harness.rebuild();
    harness.drive_async().await;
    let html = harness.render();
    assert!(html.contains("No exam taken yet."), "missing empty state in {html}");
}

#[tokio::test(flavor = "current_thread")]
async fn exam_view_smoke_renders_first_question() {
    let mut harness = setup_view_harness(ViewKind::Exam(3));
    harness.rebuild();
    harness.drive_async().await;
    harness.drive_async().await;
    let html = harness.render();
    assert!(html.contains("Question 1 / 2"), "missing question header in {html}");
    assert!(html.contains("Prompt 1"), "missing prompt in {html}");
    assert!(html.contains("01:30"), "missing timer in {html}");
}

struct FailingCache;

#[async_trait]
impl ResultCache for FailingCache {
    async fn store_latest(
        &self,
        _result: &ExamResult,
        _cached_at: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        Err(StorageError::Connection("fail".to_string()))
    }

    async fn latest(&self) -> Result<Option<CachedResult>, StorageError> {
        Err(StorageError::Connection("fail".to_string()))
    }

    async fn mark_submitted(
        &self,
        _result_id: ResultId,
        _attempt_id: &AttemptId,
    ) -> Result<(), StorageError> {
        Err(StorageError::NotFound)
    }

    async fn clear(&self) -> Result<(), StorageError> {
        Err(StorageError::Connection("fail".to_string()))
    }
}

#[tokio::test(flavor = "current_thread")]
async fn results_view_smoke_renders_error_state() {
    let storage = Storage {
        results: Arc::new(FailingCache),
    };
    let mut harness = setup_view_harness_with_cache(ViewKind::Results, storage);
    harness.rebuild();
    harness.drive_async().await;
    let html = harness.render();
    assert!(html.contains("Something went wrong"), "missing error in {html}");
    assert!(html.contains("Retry"), "missing retry in {html}");
}
