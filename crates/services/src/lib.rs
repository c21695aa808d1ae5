#![forbid(unsafe_code)]

pub mod app_services;
pub mod error;
pub mod exam_api;
pub mod results_service;
pub mod sessions;

pub use exam_core::Clock;

pub use app_services::AppServices;
pub use error::{ApiError, AppServicesError, ExamRunError, ResultsError, SessionError};
pub use exam_api::{ExamApi, ExamApiConfig, HttpExamApi};
pub use results_service::{ResultOverview, ResultsService};
pub use sessions::{
    ExamRunService, ExamSession, FinalizedExam, SessionProgress, SubmissionStatus, Ticker,
    TickerHandle,
};
