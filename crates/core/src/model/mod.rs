mod answer;
mod attempt;
mod ids;
mod level;
mod paper;
mod question;
mod result;

pub use answer::{AnswerValue, Answers, FlagSet};
pub use attempt::FinishedAttempt;
pub use ids::{AttemptId, ParseIdError, QuestionId, ResultId, SeriesId};
pub use level::{Level, MAX_SCORE};
pub use paper::ExamPaper;
pub use question::{ModuleKind, Question, QuestionDraft, QuestionError};
pub use result::{ExamResult, ExamResultParts, ResultError};
