use chrono::{DateTime, Utc};
use exam_core::model::{AnswerValue, FinishedAttempt, ModuleKind, SeriesId};
use services::{ExamRunError, ExamRunService, ExamSession, SessionError, TickerHandle};

use crate::views::ViewError;
use crate::vm::time_fmt::format_countdown;

/// User actions on the exam screen. Answers and flags target the current question.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ExamIntent {
    Answer(AnswerValue),
    ClearAnswer,
    ToggleFlag,
    Next,
    Previous,
    GoTo(usize),
    Finish,
}

impl ExamIntent {
    /// Intent for a free-text edit on the current question. Empty text clears the answer.
    #[must_use]
    pub fn response(kind: ModuleKind, text: String) -> Self {
        if text.trim().is_empty() {
            return ExamIntent::ClearAnswer;
        }
        match kind {
            ModuleKind::Speaking => ExamIntent::Answer(AnswerValue::Recording(text)),
            ModuleKind::Reading | ModuleKind::Listening | ModuleKind::Writing => {
                ExamIntent::Answer(AnswerValue::Text(text))
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ExamOutcome {
    Continue,
    Finished(FinishedAttempt),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChoiceVm {
    pub index: usize,
    pub label: String,
    pub selected: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QuestionVm {
    pub index: usize,
    pub number_label: String,
    pub prompt: String,
    pub media_url: Option<String>,
    pub choices: Vec<ChoiceVm>,
    /// Current written/recorded answer for free-response questions.
    pub response: String,
    pub flagged: bool,
}

/// One cell of the question navigator.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NavItemVm {
    pub index: usize,
    pub answered: bool,
    pub flagged: bool,
    pub current: bool,
}

pub struct ExamVm {
    session: ExamSession,
    ticker: Option<TickerHandle>,
}

impl ExamVm {
    #[must_use]
    pub fn new(session: ExamSession) -> Self {
        Self {
            session,
            ticker: None,
        }
    }

    /// Attach the countdown ticker. Stopped at once if the session already finished.
    pub fn attach_ticker(&mut self, handle: TickerHandle) {
        if self.session.is_finished() {
            handle.stop();
        }
        self.ticker = Some(handle);
    }

    #[must_use]
    pub fn series_id(&self) -> SeriesId {
        self.session.series_id()
    }

    #[must_use]
    pub fn module_kind(&self) -> ModuleKind {
        self.session.module_kind()
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.session.is_finished()
    }

    #[must_use]
    pub fn remaining_label(&self) -> String {
        format_countdown(self.session.remaining_seconds())
    }

    /// True in the last minute, for styling the timer.
    #[must_use]
    pub fn is_running_out(&self) -> bool {
        self.session.remaining_seconds() <= 60
    }

    #[must_use]
    pub fn progress_label(&self) -> String {
        let progress = self.session.progress();
        format!(
            "{} / {} answered · {} flagged",
            progress.answered, progress.total, progress.flagged
        )
    }

    #[must_use]
    pub fn is_first(&self) -> bool {
        self.session.current_index() == 0
    }

    #[must_use]
    pub fn is_last(&self) -> bool {
        self.session.current_index() + 1 == self.session.questions().len()
    }

    #[must_use]
    pub fn current(&self) -> QuestionVm {
        let index = self.session.current_index();
        let question = self.session.current_question();
        let answer = self.session.answers().get(question.id());
        let selected = answer.and_then(AnswerValue::as_choice);
        let choices = question
            .choices()
            .unwrap_or_default()
            .iter()
            .enumerate()
            .map(|(i, label)| ChoiceVm {
                index: i,
                label: label.clone(),
                selected: selected == Some(i),
            })
            .collect();
        let response = match answer {
            Some(AnswerValue::Text(text) | AnswerValue::Recording(text)) => text.clone(),
            _ => String::new(),
        };
        QuestionVm {
            index,
            number_label: format!("Question {} / {}", index + 1, self.session.questions().len()),
            prompt: question.prompt().to_owned(),
            media_url: question.media().map(ToString::to_string),
            choices,
            response,
            flagged: self.session.flags().contains(question.id()),
        }
    }

    #[must_use]
    pub fn navigator(&self) -> Vec<NavItemVm> {
        let current = self.session.current_index();
        self.session
            .questions()
            .iter()
            .enumerate()
            .map(|(index, q)| NavItemVm {
                index,
                answered: self.session.answers().contains(q.id()),
                flagged: self.session.flags().contains(q.id()),
                current: index == current,
            })
            .collect()
    }

    /// Apply an intent.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` when the session rejects the action; state is unchanged.
    pub fn apply(
        &mut self,
        intent: ExamIntent,
        now: DateTime<Utc>,
    ) -> Result<ExamOutcome, SessionError> {
        let id = self.session.current_question().id();
        match intent {
            ExamIntent::Answer(value) => self.session.answer(id, value)?,
            ExamIntent::ClearAnswer => self.session.clear_answer(id)?,
            ExamIntent::ToggleFlag => {
                self.session.toggle_flag(id)?;
            }
            ExamIntent::Next => self.session.next(),
            ExamIntent::Previous => self.session.previous(),
            ExamIntent::GoTo(index) => self.session.go_to(index),
            ExamIntent::Finish => {
                let attempt = self.session.finish(now).ok_or(SessionError::Finished)?;
                self.stop_ticker();
                return Ok(ExamOutcome::Finished(attempt));
            }
        }
        Ok(ExamOutcome::Continue)
    }

    /// Advance the countdown by one second.
    pub fn on_tick(&mut self, now: DateTime<Utc>) -> ExamOutcome {
        match self.session.tick(now) {
            Some(attempt) => {
                tracing::info!(series_id = %self.series_id(), "exam timed out");
                self.stop_ticker();
                ExamOutcome::Finished(attempt)
            }
            None => ExamOutcome::Continue,
        }
    }

    fn stop_ticker(&mut self) {
        if let Some(handle) = self.ticker.take() {
            handle.stop();
        }
    }
}

/// # Errors
///
/// Returns `ViewError::EmptyExam` when the series has no questions and
/// `ViewError::ContentUnavailable` when it cannot be fetched.
pub async fn start_exam(
    exam_run: &ExamRunService,
    series_id: SeriesId,
) -> Result<ExamVm, ViewError> {
    match exam_run.start_exam(series_id).await {
        Ok(session) => Ok(ExamVm::new(session)),
        Err(ExamRunError::Session(SessionError::Empty)) => Err(ViewError::EmptyExam),
        Err(ExamRunError::Fetch(_)) => Err(ViewError::ContentUnavailable),
        Err(_) => Err(ViewError::Unknown),
    }
}
