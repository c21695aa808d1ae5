mod progress;
mod service;
mod ticker;
mod workflow;

// Public API of the session subsystem.
pub use crate::error::SessionError;
pub use progress::SessionProgress;
pub use service::ExamSession;
pub use ticker::{Ticker, TickerHandle};
pub use workflow::{ExamRunService, FinalizedExam, SubmissionStatus};
