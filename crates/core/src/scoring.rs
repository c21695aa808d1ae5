//! Authoritative scoring: raw points rescaled onto the 0–699 reporting scale.

use crate::model::{Answers, Level, MAX_SCORE, Question};

/// Outcome of scoring a set of answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoreReport {
    pub normalized: u32,
    pub level: Level,
    /// Scorable questions answered correctly.
    pub correct: u32,
    /// Scorable questions (those with a known correct choice).
    pub total: u32,
}

/// Score choice-based answers.
///
/// Only questions with a correct choice count. Each match adds the question's points;
/// unanswered questions add nothing. With no scorable points the score is 0.
#[must_use]
pub fn score(questions: &[Question], answers: &Answers) -> ScoreReport {
    let mut raw = 0_u64;
    let mut max = 0_u64;
    let mut correct = 0_u32;
    let mut total = 0_u32;

    for question in questions {
        let Some(expected) = question.correct_choice() else {
            continue;
        };
        total = total.saturating_add(1);
        max += u64::from(question.points());

        let given = answers.get(question.id()).and_then(|a| a.as_choice());
        if given == Some(expected) {
            correct = correct.saturating_add(1);
            raw += u64::from(question.points());
        }
    }

    let normalized = normalize(raw, max);
    ScoreReport {
        normalized,
        level: Level::from_score(normalized),
        correct,
        total,
    }
}

/// Band a score supplied by the external grading service.
#[must_use]
pub fn score_external(external: u32) -> ScoreReport {
    let normalized = external.min(MAX_SCORE);
    ScoreReport {
        normalized,
        level: Level::from_score(normalized),
        correct: 0,
        total: 0,
    }
}

/// `round(raw / max * 699)` in integer arithmetic (half rounds up).
fn normalize(raw: u64, max: u64) -> u32 {
    if max == 0 {
        return 0;
    }
    let scaled = (raw * u64::from(MAX_SCORE) * 2 + max) / (2 * max);
    u32::try_from(scaled).map_or(MAX_SCORE, |v| v.min(MAX_SCORE))
}
