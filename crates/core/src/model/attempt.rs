use chrono::{DateTime, Utc};

use crate::model::{Answers, FlagSet, ModuleKind, Question, SeriesId};

/// Frozen state of a session at the moment it finished.
///
/// Produced exactly once per session; an `ExamResult` is built from it by the
/// scoring step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinishedAttempt {
    pub series_id: SeriesId,
    pub module_kind: ModuleKind,
    pub questions: Vec<Question>,
    pub answers: Answers,
    pub flags: FlagSet,
    /// Countdown-derived: allotted minus remaining. Never exceeds `allotted_seconds`.
    pub elapsed_seconds: u32,
    pub allotted_seconds: u32,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub timed_out: bool,
}

impl FinishedAttempt {
    #[must_use]
    pub fn answered_count(&self) -> usize {
        self.questions
            .iter()
            .filter(|q| self.answers.contains(q.id()))
            .count()
    }
}
