use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use exam_core::model::{
    AnswerValue, AttemptId, ExamPaper, ModuleKind, QuestionDraft, QuestionId, SeriesId,
};
use exam_core::time::fixed_now;
use services::exam_api::{AttemptSubmission, GradingRequest};
use services::{ApiError, AppServices, Clock, ExamApi, SubmissionStatus};
use storage::repository::Storage;

/// Accepts submissions only after `online` is switched on.
struct FlakyApi {
    online: Mutex<bool>,
    submitted: Mutex<Vec<u32>>,
}

#[async_trait]
impl ExamApi for FlakyApi {
    async fn fetch_exam(&self, series_id: SeriesId) -> Result<ExamPaper, ApiError> {
        let questions = (1..=4)
            .map(|id| {
                QuestionDraft {
                    id,
                    prompt: format!("Question {id}"),
                    choices: Some(vec!["oui".into(), "non".into(), "peut-être".into()]),
                    correct_choice: Some(2),
                    media_url: None,
                    points: 5,
                }
                .validate()
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ExamPaper {
            series_id,
            module_kind: ModuleKind::Reading,
            questions,
            allotted_seconds: 600,
        })
    }

    async fn grade(&self, _request: &GradingRequest) -> Result<u32, ApiError> {
        Err(ApiError::Disabled)
    }

    async fn submit_attempt(&self, submission: &AttemptSubmission) -> Result<AttemptId, ApiError> {
        if !*self.online.lock().unwrap() {
            return Err(ApiError::InvalidPayload("service unavailable".into()));
        }
        self.submitted.lock().unwrap().push(submission.score);
        Ok(AttemptId::new("remote-1"))
    }
}

#[tokio::test]
async fn exam_flow_caches_result_and_retries_submission() {
    let api = Arc::new(FlakyApi {
        online: Mutex::new(false),
        submitted: Mutex::new(Vec::new()),
    });
    let storage = Storage::in_memory();
    let services = AppServices::new(&storage, Clock::fixed(fixed_now()), api.clone());
    let exam_run = services.exam_run();

    let mut session = exam_run.start_exam(SeriesId::new(12)).await.unwrap();
    for (id, choice) in [(1, 2), (2, 2), (3, 0)] {
        session
            .answer(QuestionId::new(id), AnswerValue::Choice(choice))
            .unwrap();
    }
    session.toggle_flag(QuestionId::new(4)).unwrap();

    let finalized = exam_run.finish_and_finalize(&mut session).await.unwrap();
    assert!(matches!(finalized.submission, SubmissionStatus::Failed(_)));
    // 10 of 20 points
    assert_eq!(finalized.result.score(), 350);
    assert_eq!(finalized.result.correct_count(), 2);

    let overview = services.results().latest().await.unwrap().unwrap();
    assert_eq!(overview.result, finalized.result);
    assert!(!overview.is_submitted());

    *api.online.lock().unwrap() = true;
    let attempt_id = exam_run.retry_submission(&finalized.result).await.unwrap();
    assert_eq!(attempt_id, AttemptId::new("remote-1"));
    assert_eq!(*api.submitted.lock().unwrap(), vec![350]);

    let overview = services.results().latest().await.unwrap().unwrap();
    assert_eq!(overview.attempt_id, Some(attempt_id));

    services.results().clear().await.unwrap();
    assert!(services.results().latest().await.unwrap().is_none());
}
