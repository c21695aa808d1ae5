use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::model::{
    Answers, FinishedAttempt, Level, MAX_SCORE, ModuleKind, Question, ResultId, SeriesId,
};
use crate::scoring::{self, ScoreReport};
use crate::time::whole_seconds_between;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ResultError {
    #[error("score {score} is above the {max} ceiling")]
    ScoreOutOfRange { score: u32, max: u32 },

    #[error("level {stored} does not match score {score} (expected {expected})")]
    LevelMismatch {
        score: u32,
        stored: Level,
        expected: Level,
    },

    #[error("correct count ({correct}) exceeds total ({total})")]
    CountMismatch { correct: u32, total: u32 },

    #[error("finished_at is before started_at")]
    InvalidTimeRange,
}

/// Raw fields of a result, as read back from storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExamResultParts {
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

/// Immutable outcome of one finished attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExamResult {
    id: ResultId,
    series_id: SeriesId,
    module_kind: ModuleKind,
    score: u32,
    level: Level,
    questions: Vec<Question>,
    answers: Answers,
    correct_count: u32,
    total_questions: u32,
    elapsed_seconds: u32,
    allotted_seconds: u32,
    started_at: DateTime<Utc>,
    finished_at: DateTime<Utc>,
}

impl ExamResult {
    /// Score a choice-based attempt locally.
    #[must_use]
    pub fn score_choices(attempt: FinishedAttempt) -> Self {
        let report = scoring::score(&attempt.questions, &attempt.answers);
        Self::from_report(attempt, report)
    }

    /// Band a score produced by the external grading service.
    #[must_use]
    pub fn with_external_score(attempt: FinishedAttempt, external_score: u32) -> Self {
        Self::from_report(attempt, scoring::score_external(external_score))
    }

    fn from_report(attempt: FinishedAttempt, report: ScoreReport) -> Self {
        Self {
            id: ResultId::generate(),
            series_id: attempt.series_id,
            module_kind: attempt.module_kind,
            score: report.normalized,
            level: report.level,
            questions: attempt.questions,
            answers: attempt.answers,
            correct_count: report.correct,
            total_questions: report.total,
            elapsed_seconds: attempt.elapsed_seconds,
            allotted_seconds: attempt.allotted_seconds,
            started_at: attempt.started_at,
            finished_at: attempt.finished_at,
        }
    }

    /// Rehydrate a result from persisted storage.
    ///
    /// # Errors
    ///
    /// Returns `ResultError` when the score is off the scale, the level does not match
    /// the score, counts disagree, or the timestamps are reversed.
    pub fn from_persisted(parts: ExamResultParts) -> Result<Self, ResultError> {
        if parts.score > MAX_SCORE {
            return Err(ResultError::ScoreOutOfRange {
                score: parts.score,
                max: MAX_SCORE,
            });
        }
        let expected = Level::from_score(parts.score);
        if parts.level != expected {
            return Err(ResultError::LevelMismatch {
                score: parts.score,
                stored: parts.level,
                expected,
            });
        }
        if parts.correct_count > parts.total_questions {
            return Err(ResultError::CountMismatch {
                correct: parts.correct_count,
                total: parts.total_questions,
            });
        }
        if parts.finished_at < parts.started_at {
            return Err(ResultError::InvalidTimeRange);
        }

        Ok(Self {
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
        })
    }

    #[must_use]
    pub fn id(&self) -> ResultId {
        self.id
    }

    #[must_use]
    pub fn series_id(&self) -> SeriesId {
        self.series_id
    }

    #[must_use]
    pub fn module_kind(&self) -> ModuleKind {
        self.module_kind
    }

    #[must_use]
    pub fn score(&self) -> u32 {
        self.score
    }

    #[must_use]
    pub fn level(&self) -> Level {
        self.level
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn answers(&self) -> &Answers {
        &self.answers
    }

    #[must_use]
    pub fn correct_count(&self) -> u32 {
        self.correct_count
    }

    #[must_use]
    pub fn total_questions(&self) -> u32 {
        self.total_questions
    }

    #[must_use]
    pub fn elapsed_seconds(&self) -> u32 {
        self.elapsed_seconds
    }

    #[must_use]
    pub fn allotted_seconds(&self) -> u32 {
        self.allotted_seconds
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn finished_at(&self) -> DateTime<Utc> {
        self.finished_at
    }

    /// Wall-clock span of the attempt. Diagnostic only; `elapsed_seconds` is authoritative.
    #[must_use]
    pub fn wall_clock_seconds(&self) -> u64 {
        whole_seconds_between(self.started_at, self.finished_at)
    }

    /// Split back into raw fields for persistence.
    #[must_use]
    pub fn to_parts(&self) -> ExamResultParts {
        ExamResultParts {
            id: self.id,
            series_id: self.series_id,
            module_kind: self.module_kind,
            score: self.score,
            level: self.level,
            questions: self.questions.clone(),
            answers: self.answers.clone(),
            correct_count: self.correct_count,
            total_questions: self.total_questions,
            elapsed_seconds: self.elapsed_seconds,
            allotted_seconds: self.allotted_seconds,
            started_at: self.started_at,
            finished_at: self.finished_at,
        }
    }
}
