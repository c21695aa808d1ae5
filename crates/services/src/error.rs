//! Shared error types for the services crate.

use thiserror::Error;

use exam_core::model::{QuestionError, QuestionId};
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Misuse of the session controller. These indicate a caller bug and leave the
/// session untouched.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionError {
    #[error("no questions available for session")]
    Empty,
    #[error("question {0} appears more than once")]
    DuplicateQuestion(QuestionId),
    #[error("question {0} is not part of this session")]
    UnknownQuestion(QuestionId),
    #[error("session already finished")]
    Finished,
}

/// Errors emitted by the exam content/attempt API client.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ApiError {
    #[error("exam api is not configured")]
    Disabled,
    #[error("exam api request failed with status {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error("exam api returned an invalid question: {0}")]
    InvalidQuestion(#[from] QuestionError),
    #[error("exam api returned an invalid payload: {0}")]
    InvalidPayload(String),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

/// Errors emitted by `ExamRunService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ExamRunError {
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error("could not load exam: {0}")]
    Fetch(#[source] ApiError),
    #[error("grading failed: {0}")]
    Grading(#[source] ApiError),
    #[error("submission failed: {0}")]
    Submission(#[source] ApiError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `ResultsService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ResultsError {
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}
