use std::collections::HashMap;
use std::sync::Arc;

use exam_core::model::{AttemptId, ExamResult, FinishedAttempt, ResultId, SeriesId};
use storage::repository::ResultCache;
use tokio::sync::Mutex;

use super::service::ExamSession;
use crate::Clock;
use crate::error::{ExamRunError, SessionError};
use crate::exam_api::{AttemptSubmission, ExamApi, GradingRequest};

/// Outcome of the one-shot remote submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionStatus {
    Submitted(AttemptId),
    /// The local result is kept; the user may retry.
    Failed(String),
}

/// A scored result plus what happened when it was sent to the API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinalizedExam {
    pub result: ExamResult,
    pub submission: SubmissionStatus,
}

impl FinalizedExam {
    #[must_use]
    pub fn is_submitted(&self) -> bool {
        matches!(self.submission, SubmissionStatus::Submitted(_))
    }
}

/// Orchestrates exam start, scoring, local caching and remote submission.
#[derive(Clone)]
pub struct ExamRunService {
    clock: Clock,
    api: Arc<dyn ExamApi>,
    results: Arc<dyn ResultCache>,
    /// Attempts the server accepted, including any whose id could not be cached.
    accepted: Arc<Mutex<HashMap<ResultId, AttemptId>>>,
}

impl ExamRunService {
    #[must_use]
    pub fn new(clock: Clock, api: Arc<dyn ExamApi>, results: Arc<dyn ResultCache>) -> Self {
        Self {
            clock,
            api,
            results,
            accepted: Arc::default(),
        }
    }

    #[must_use]
    pub fn clock(&self) -> Clock {
        self.clock
    }

    /// Fetch the exam for a series and start a session at the current time.
    ///
    /// # Errors
    ///
    /// Returns `ExamRunError::Fetch` when content cannot be loaded and
    /// `ExamRunError::Session` when the paper cannot start a session.
    pub async fn start_exam(&self, series_id: SeriesId) -> Result<ExamSession, ExamRunError> {
        let paper = self
            .api
            .fetch_exam(series_id)
            .await
            .map_err(ExamRunError::Fetch)?;
        let session = ExamSession::load(paper, self.clock.now())?;
        tracing::info!(
            series_id = %series_id,
            module = session.module_kind().as_str(),
            questions = session.questions().len(),
            allotted_seconds = session.allotted_seconds(),
            "exam session started"
        );
        Ok(session)
    }

    /// Finish the session now and finalize the attempt.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Finished` if the session had already finished, plus
    /// anything [`ExamRunService::finalize`] returns.
    pub async fn finish_and_finalize(
        &self,
        session: &mut ExamSession,
    ) -> Result<FinalizedExam, ExamRunError> {
        let attempt = session
            .finish(self.clock.now())
            .ok_or(SessionError::Finished)?;
        self.finalize(attempt).await
    }

    /// Score a finished attempt, cache it as the most recent result, then submit it once.
    ///
    /// A failed submission does not fail this call: the result is already cached and
    /// returned with `SubmissionStatus::Failed`.
    ///
    /// # Errors
    ///
    /// Returns `ExamRunError::Grading` when a free-response attempt cannot be graded
    /// (keep the attempt and call again), or `ExamRunError::Storage` if caching fails.
    pub async fn finalize(&self, attempt: FinishedAttempt) -> Result<FinalizedExam, ExamRunError> {
        let result = if attempt.module_kind.is_free_response() {
            let request = GradingRequest::new(
                attempt.series_id,
                attempt.module_kind,
                &attempt.questions,
                &attempt.answers,
            );
            let graded = self
                .api
                .grade(&request)
                .await
                .map_err(ExamRunError::Grading)?;
            ExamResult::with_external_score(attempt, graded)
        } else {
            ExamResult::score_choices(attempt)
        };

        self.results.store_latest(&result, self.clock.now()).await?;
        tracing::info!(
            series_id = %result.series_id(),
            result_id = %result.id(),
            score = result.score(),
            level = %result.level(),
            elapsed_seconds = result.elapsed_seconds(),
            wall_clock_seconds = result.wall_clock_seconds(),
            "exam finalized"
        );

        let submission = match self.submit(&result).await {
            Ok(attempt_id) => SubmissionStatus::Submitted(attempt_id),
            Err(err) => {
                tracing::warn!(result_id = %result.id(), error = %err, "attempt submission failed");
                SubmissionStatus::Failed(err.to_string())
            }
        };

        Ok(FinalizedExam { result, submission })
    }

    /// Submit again after a failed attempt. Never called automatically.
    ///
    /// An attempt the server already accepted is not sent twice; only its id is
    /// recorded again.
    ///
    /// # Errors
    ///
    /// Returns `ExamRunError::Submission` if the API rejects the attempt again.
    pub async fn retry_submission(&self, result: &ExamResult) -> Result<AttemptId, ExamRunError> {
        let accepted = self.accepted.lock().await.get(&result.id()).cloned();
        if let Some(attempt_id) = accepted {
            self.record_submitted(result.id(), &attempt_id).await;
            return Ok(attempt_id);
        }
        self.submit(result).await
    }

    async fn submit(&self, result: &ExamResult) -> Result<AttemptId, ExamRunError> {
        let attempt_id = self
            .api
            .submit_attempt(&AttemptSubmission::from_result(result))
            .await
            .map_err(ExamRunError::Submission)?;
        self.accepted
            .lock()
            .await
            .insert(result.id(), attempt_id.clone());
        tracing::info!(result_id = %result.id(), attempt_id = %attempt_id, "attempt submitted");
        self.record_submitted(result.id(), &attempt_id).await;
        Ok(attempt_id)
    }

    /// Cache write failures are logged; the server already holds the attempt.
    async fn record_submitted(&self, result_id: ResultId, attempt_id: &AttemptId) {
        if let Err(err) = self.results.mark_submitted(result_id, attempt_id).await {
            tracing::warn!(
                result_id = %result_id,
                attempt_id = %attempt_id,
                error = %err,
                "recording submitted attempt failed"
            );
        }
    }
}
