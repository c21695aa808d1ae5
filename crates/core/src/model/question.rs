use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::model::ids::QuestionId;

//
// ─── MODULE KIND ───────────────────────────────────────────────────────────────
//

/// Category of exam section. Decides how a module is scored and timed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModuleKind {
    Reading,
    Listening,
    Writing,
    Speaking,
}

impl ModuleKind {
    /// Writing and speaking answers are graded by an external service.
    #[must_use]
    pub fn is_free_response(self) -> bool {
        matches!(self, ModuleKind::Writing | ModuleKind::Speaking)
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ModuleKind::Reading => "reading",
            ModuleKind::Listening => "listening",
            ModuleKind::Writing => "writing",
            ModuleKind::Speaking => "speaking",
        }
    }
}

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question {id} has an empty prompt")]
    EmptyPrompt { id: QuestionId },

    #[error("question {id} must be worth at least one point")]
    ZeroPoints { id: QuestionId },

    #[error("question {id} has correct choice {index} but only {len} choices")]
    CorrectChoiceOutOfRange {
        id: QuestionId,
        index: usize,
        len: usize,
    },

    #[error("question {id} has a correct choice but no choices")]
    MissingChoices { id: QuestionId },

    #[error("question {id} has an invalid media url: {raw}")]
    InvalidMedia { id: QuestionId, raw: String },
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// Unvalidated question as it arrives from the exam content API.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct QuestionDraft {
    pub id: u64,
    pub prompt: String,
    #[serde(default)]
    pub choices: Option<Vec<String>>,
    #[serde(default)]
    pub correct_choice: Option<usize>,
    #[serde(default)]
    pub media_url: Option<String>,
    pub points: u32,
}

impl QuestionDraft {
    /// Validate the draft into an immutable `Question`.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` when the prompt is blank, points are zero, the media
    /// reference is not a URL, or the correct choice does not index into `choices`.
    pub fn validate(self) -> Result<Question, QuestionError> {
        let id = QuestionId::new(self.id);
        let prompt = self.prompt.trim();
        if prompt.is_empty() {
            return Err(QuestionError::EmptyPrompt { id });
        }
        if self.points == 0 {
            return Err(QuestionError::ZeroPoints { id });
        }

        match (&self.choices, self.correct_choice) {
            (None, Some(_)) => return Err(QuestionError::MissingChoices { id }),
            (Some(choices), Some(index)) if index >= choices.len() => {
                return Err(QuestionError::CorrectChoiceOutOfRange {
                    id,
                    index,
                    len: choices.len(),
                });
            }
            _ => {}
        }

        let media = match self.media_url {
            Some(raw) if !raw.trim().is_empty() => Some(
                Url::parse(raw.trim()).map_err(|_| QuestionError::InvalidMedia { id, raw })?,
            ),
            _ => None,
        };

        Ok(Question {
            id,
            prompt: prompt.to_owned(),
            choices: self.choices,
            correct_choice: self.correct_choice,
            media,
            points: self.points,
        })
    }
}

/// A single exam question. Immutable once loaded into a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    id: QuestionId,
    prompt: String,
    choices: Option<Vec<String>>,
    correct_choice: Option<usize>,
    media: Option<Url>,
    points: u32,
}

impl Question {
    #[must_use]
    pub fn id(&self) -> QuestionId {
        self.id
    }

    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    #[must_use]
    pub fn choices(&self) -> Option<&[String]> {
        self.choices.as_deref()
    }

    #[must_use]
    pub fn correct_choice(&self) -> Option<usize> {
        self.correct_choice
    }

    #[must_use]
    pub fn media(&self) -> Option<&Url> {
        self.media.as_ref()
    }

    #[must_use]
    pub fn points(&self) -> u32 {
        self.points
    }

    /// Questions with a known correct choice count toward the local score.
    #[must_use]
    pub fn is_scorable(&self) -> bool {
        self.correct_choice.is_some()
    }
}
