use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::fmt;

use exam_core::model::{
    AnswerValue, Answers, ExamPaper, FinishedAttempt, FlagSet, ModuleKind, Question, QuestionId,
    SeriesId,
};

use super::progress::SessionProgress;
use crate::error::SessionError;

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// One timed exam attempt, from load to a finished attempt.
///
/// The question order is fixed at load. `tick` counts the clock down one second at a
/// time; reaching zero finishes the session. `finish` runs once: the first call
/// returns the frozen attempt, later calls return `None`.
pub struct ExamSession {
    series_id: SeriesId,
    module_kind: ModuleKind,
    questions: Vec<Question>,
    answers: Answers,
    flags: FlagSet,
    current: usize,
    allotted_seconds: u32,
    remaining_seconds: u32,
    started_at: DateTime<Utc>,
    finished_at: Option<DateTime<Utc>>,
}

impl ExamSession {
    /// Start a session from a loaded paper.
    ///
    /// `started_at` should come from the services layer clock to keep time deterministic.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Empty` if the paper has no questions and
    /// `SessionError::DuplicateQuestion` if two questions share an id.
    pub fn load(paper: ExamPaper, started_at: DateTime<Utc>) -> Result<Self, SessionError> {
        if paper.questions.is_empty() {
            return Err(SessionError::Empty);
        }

        let mut seen = HashSet::with_capacity(paper.questions.len());
        for question in &paper.questions {
            if !seen.insert(question.id()) {
                return Err(SessionError::DuplicateQuestion(question.id()));
            }
        }

        Ok(Self {
            series_id: paper.series_id,
            module_kind: paper.module_kind,
            questions: paper.questions,
            answers: Answers::new(),
            flags: FlagSet::new(),
            current: 0,
            allotted_seconds: paper.allotted_seconds,
            remaining_seconds: paper.allotted_seconds,
            started_at,
            finished_at: None,
        })
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
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn answers(&self) -> &Answers {
        &self.answers
    }

    #[must_use]
    pub fn flags(&self) -> &FlagSet {
        &self.flags
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current
    }

    #[must_use]
    pub fn current_question(&self) -> &Question {
        // `current` is clamped to `questions` and `load` rejects an empty list.
        &self.questions[self.current]
    }

    #[must_use]
    pub fn allotted_seconds(&self) -> u32 {
        self.allotted_seconds
    }

    #[must_use]
    pub fn remaining_seconds(&self) -> u32 {
        self.remaining_seconds
    }

    #[must_use]
    pub fn elapsed_seconds(&self) -> u32 {
        self.allotted_seconds - self.remaining_seconds
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn finished_at(&self) -> Option<DateTime<Utc>> {
        self.finished_at
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.finished_at.is_some()
    }

    #[must_use]
    pub fn progress(&self) -> SessionProgress {
        SessionProgress {
            total: self.questions.len(),
            answered: self.answers.len(),
            flagged: self.flags.len(),
            current_index: self.current,
            remaining_seconds: self.remaining_seconds,
            is_finished: self.is_finished(),
        }
    }

    //
    // ─── MUTATIONS ─────────────────────────────────────────────────────────────
    //

    /// Record a response, replacing any earlier one for the same question.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Finished` after finish, `SessionError::UnknownQuestion`
    /// for ids outside the session.
    pub fn answer(&mut self, id: QuestionId, value: AnswerValue) -> Result<(), SessionError> {
        self.ensure_mutable(id)?;
        self.answers.set(id, value);
        Ok(())
    }

    /// Remove a response so the question reads as unanswered again.
    ///
    /// # Errors
    ///
    /// Same as [`ExamSession::answer`].
    pub fn clear_answer(&mut self, id: QuestionId) -> Result<(), SessionError> {
        self.ensure_mutable(id)?;
        self.answers.remove(id);
        Ok(())
    }

    /// Flip the review flag on a question. Returns whether it is flagged afterwards.
    ///
    /// # Errors
    ///
    /// Same as [`ExamSession::answer`].
    pub fn toggle_flag(&mut self, id: QuestionId) -> Result<bool, SessionError> {
        self.ensure_mutable(id)?;
        Ok(self.flags.toggle(id))
    }

    fn ensure_mutable(&self, id: QuestionId) -> Result<(), SessionError> {
        if self.is_finished() {
            return Err(SessionError::Finished);
        }
        if !self.questions.iter().any(|q| q.id() == id) {
            return Err(SessionError::UnknownQuestion(id));
        }
        Ok(())
    }

    /// Jump to `index`, clamped to the last question.
    pub fn go_to(&mut self, index: usize) {
        self.current = index.min(self.questions.len() - 1);
    }

    /// Move forward one question; a no-op on the last one.
    pub fn next(&mut self) {
        self.go_to(self.current.saturating_add(1));
    }

    /// Move back one question; a no-op on the first one.
    pub fn previous(&mut self) {
        self.go_to(self.current.saturating_sub(1));
    }

    //
    // ─── TIME & COMPLETION ─────────────────────────────────────────────────────
    //

    /// Advance the countdown by one second.
    ///
    /// Returns the finished attempt on the tick that exhausts the time. Does nothing
    /// once the session is finished.
    pub fn tick(&mut self, now: DateTime<Utc>) -> Option<FinishedAttempt> {
        if self.is_finished() {
            return None;
        }
        self.remaining_seconds = self.remaining_seconds.saturating_sub(1);
        if self.remaining_seconds == 0 {
            tracing::debug!(series_id = %self.series_id, "countdown reached zero");
            return self.finalize(now, true);
        }
        None
    }

    /// Finish the attempt. Only the first call returns the attempt.
    pub fn finish(&mut self, now: DateTime<Utc>) -> Option<FinishedAttempt> {
        self.finalize(now, false)
    }

    fn finalize(&mut self, now: DateTime<Utc>, timed_out: bool) -> Option<FinishedAttempt> {
        if self.is_finished() {
            return None;
        }
        let finished_at = now.max(self.started_at);
        self.finished_at = Some(finished_at);

        Some(FinishedAttempt {
            series_id: self.series_id,
            module_kind: self.module_kind,
            questions: self.questions.clone(),
            answers: self.answers.clone(),
            flags: self.flags.clone(),
            elapsed_seconds: self.elapsed_seconds(),
            allotted_seconds: self.allotted_seconds,
            started_at: self.started_at,
            finished_at,
            timed_out,
        })
    }
}

impl fmt::Debug for ExamSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExamSession")
            .field("series_id", &self.series_id)
            .field("module_kind", &self.module_kind)
            .field("questions_len", &self.questions.len())
            .field("answers_len", &self.answers.len())
            .field("current", &self.current)
            .field("remaining_seconds", &self.remaining_seconds)
            .field("started_at", &self.started_at)
            .field("finished_at", &self.finished_at)
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use exam_core::model::{ExamResult, Level, QuestionDraft};
    use exam_core::time::fixed_now;

    fn choice(id: u64, points: u32, correct: usize) -> Question {
        QuestionDraft {
            id,
            prompt: format!("Q{id}"),
            choices: Some(vec!["a".into(), "b".into(), "c".into()]),
            correct_choice: Some(correct),
            media_url: None,
            points,
        }
        .validate()
        .unwrap()
    }

    fn paper(allotted_seconds: u32) -> ExamPaper {
        ExamPaper {
            series_id: SeriesId::new(1),
            module_kind: ModuleKind::Reading,
            questions: vec![choice(1, 10, 0), choice(2, 15, 1), choice(3, 20, 2)],
            allotted_seconds,
        }
    }

    fn session(allotted_seconds: u32) -> ExamSession {
        ExamSession::load(paper(allotted_seconds), fixed_now()).unwrap()
    }

    #[test]
    fn load_starts_clean() {
        let s = session(60);
        assert_eq!(s.remaining_seconds(), 60);
        assert_eq!(s.current_index(), 0);
        assert!(s.answers().is_empty());
        assert!(s.flags().is_empty());
        assert!(!s.is_finished());
        assert_eq!(s.current_question().id(), QuestionId::new(1));
    }

    #[test]
    fn empty_paper_is_rejected() {
        let err = ExamSession::load(
            ExamPaper {
                questions: Vec::new(),
                ..paper(60)
            },
            fixed_now(),
        )
        .unwrap_err();
        assert_eq!(err, SessionError::Empty);
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let err = ExamSession::load(
            ExamPaper {
                questions: vec![choice(1, 1, 0), choice(1, 2, 1)],
                ..paper(60)
            },
            fixed_now(),
        )
        .unwrap_err();
        assert_eq!(err, SessionError::DuplicateQuestion(QuestionId::new(1)));
    }

    #[test]
    fn answer_overwrites_and_rejects_unknown_ids() {
        let mut s = session(60);
        s.answer(QuestionId::new(2), AnswerValue::Choice(0)).unwrap();
        s.answer(QuestionId::new(2), AnswerValue::Choice(1)).unwrap();
        assert_eq!(
            s.answers().get(QuestionId::new(2)),
            Some(&AnswerValue::Choice(1))
        );

        let err = s
            .answer(QuestionId::new(99), AnswerValue::Choice(0))
            .unwrap_err();
        assert_eq!(err, SessionError::UnknownQuestion(QuestionId::new(99)));
        assert_eq!(s.answers().len(), 1);
    }

    #[test]
    fn clear_answer_marks_unanswered() {
        let mut s = session(60);
        s.answer(QuestionId::new(1), AnswerValue::Choice(0)).unwrap();
        s.clear_answer(QuestionId::new(1)).unwrap();
        assert!(!s.answers().contains(QuestionId::new(1)));
    }

    #[test]
    fn toggle_flag_flips_and_does_not_touch_answers() {
        let mut s = session(60);
        assert!(s.toggle_flag(QuestionId::new(3)).unwrap());
        assert!(s.flags().contains(QuestionId::new(3)));
        assert!(!s.toggle_flag(QuestionId::new(3)).unwrap());
        assert!(s.answers().is_empty());
    }

    #[test]
    fn toggle_flag_rejects_unknown_ids() {
        let mut s = session(60);
        s.toggle_flag(QuestionId::new(1)).unwrap();

        let err = s.toggle_flag(QuestionId::new(99)).unwrap_err();
        assert_eq!(err, SessionError::UnknownQuestion(QuestionId::new(99)));
        assert!(!s.flags().contains(QuestionId::new(99)));
        assert_eq!(s.flags().len(), 1);
        assert_eq!(s.progress().flagged, 1);
    }

    #[test]
    fn navigation_clamps_without_wrapping() {
        let mut s = session(60);
        s.previous();
        assert_eq!(s.current_index(), 0);
        s.next();
        s.next();
        s.next();
        assert_eq!(s.current_index(), 2);
        s.go_to(usize::MAX);
        assert_eq!(s.current_index(), 2);
        s.go_to(1);
        assert_eq!(s.current_question().id(), QuestionId::new(2));
    }

    #[test]
    fn finish_is_idempotent() {
        let mut s = session(60);
        s.answer(QuestionId::new(1), AnswerValue::Choice(0)).unwrap();
        for _ in 0..10 {
            assert!(s.tick(fixed_now()).is_none());
        }

        let later = fixed_now() + Duration::seconds(10);
        let attempt = s.finish(later).expect("first finish yields attempt");
        assert_eq!(attempt.elapsed_seconds, 10);
        assert_eq!(attempt.finished_at, later);
        assert!(!attempt.timed_out);

        let before = format!("{s:?}");
        assert!(s.finish(later + Duration::seconds(5)).is_none());
        assert!(s.tick(later).is_none());
        assert_eq!(format!("{s:?}"), before);
        assert_eq!(s.finished_at(), Some(later));
    }

    #[test]
    fn ticking_to_zero_finishes_exactly_once() {
        let allotted = 5;
        let mut s = session(allotted);
        let mut produced = Vec::new();
        for i in 1..=allotted {
            if let Some(attempt) = s.tick(fixed_now() + Duration::seconds(i64::from(i))) {
                produced.push((i, attempt));
            }
        }
        assert!(s.is_finished());
        assert_eq!(produced.len(), 1);
        let (on_tick, attempt) = &produced[0];
        assert_eq!(*on_tick, allotted);
        assert!(attempt.timed_out);
        assert_eq!(attempt.elapsed_seconds, allotted);

        assert!(s.tick(fixed_now()).is_none());
        assert!(s.finish(fixed_now()).is_none());
        assert_eq!(s.remaining_seconds(), 0);
    }

    #[test]
    fn zero_allotment_finishes_on_first_tick() {
        let mut s = session(0);
        let attempt = s.tick(fixed_now()).expect("finishes immediately");
        assert_eq!(attempt.elapsed_seconds, 0);
        assert_eq!(attempt.allotted_seconds, 0);
    }

    #[test]
    fn mutations_after_finish_leave_state_unchanged() {
        let mut s = session(60);
        s.answer(QuestionId::new(1), AnswerValue::Choice(0)).unwrap();
        s.toggle_flag(QuestionId::new(2)).unwrap();
        s.finish(fixed_now()).unwrap();

        let answers = s.answers().clone();
        let flags = s.flags().clone();

        assert_eq!(
            s.answer(QuestionId::new(3), AnswerValue::Choice(2)),
            Err(SessionError::Finished)
        );
        assert_eq!(s.toggle_flag(QuestionId::new(2)), Err(SessionError::Finished));
        assert_eq!(s.clear_answer(QuestionId::new(1)), Err(SessionError::Finished));

        assert_eq!(s.answers(), &answers);
        assert_eq!(s.flags(), &flags);
    }

    #[test]
    fn finished_attempt_scores_through_core() {
        let mut s = session(3_600);
        s.answer(QuestionId::new(1), AnswerValue::Choice(0)).unwrap();
        s.answer(QuestionId::new(3), AnswerValue::Choice(2)).unwrap();
        let result = ExamResult::score_choices(s.finish(fixed_now()).unwrap());
        assert_eq!(result.score(), 466);
        assert_eq!(result.level(), Level::C1);
    }

    #[test]
    fn finish_before_start_clamps_timestamp() {
        let mut s = session(60);
        let attempt = s.finish(fixed_now() - Duration::seconds(30)).unwrap();
        assert_eq!(attempt.finished_at, fixed_now());
    }

    #[test]
    fn progress_reports_counts() {
        let mut s = session(90);
        s.answer(QuestionId::new(1), AnswerValue::Choice(1)).unwrap();
        s.toggle_flag(QuestionId::new(2)).unwrap();
        s.next();
        s.tick(fixed_now());
        assert_eq!(
            s.progress(),
            SessionProgress {
                total: 3,
                answered: 1,
                flagged: 1,
                current_index: 1,
                remaining_seconds: 89,
                is_finished: false,
            }
        );
    }
}
