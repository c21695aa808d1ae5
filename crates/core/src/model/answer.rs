use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::model::ids::QuestionId;

/// A response to one question. The shape follows the question kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum AnswerValue {
    /// Index into the question's choices.
    Choice(usize),
    /// Written response.
    Text(String),
    /// Reference (usually a URL) to a spoken response recording.
    Recording(String),
}

impl AnswerValue {
    #[must_use]
    pub fn as_choice(&self) -> Option<usize> {
        match self {
            AnswerValue::Choice(index) => Some(*index),
            AnswerValue::Text(_) | AnswerValue::Recording(_) => None,
        }
    }
}

/// Responses keyed by question id. A missing key means "unanswered".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Answers(BTreeMap<QuestionId, AnswerValue>);

impl Answers {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a response, returning the value it replaced.
    pub fn set(&mut self, id: QuestionId, value: AnswerValue) -> Option<AnswerValue> {
        self.0.insert(id, value)
    }

    pub fn remove(&mut self, id: QuestionId) -> Option<AnswerValue> {
        self.0.remove(&id)
    }

    #[must_use]
    pub fn get(&self, id: QuestionId) -> Option<&AnswerValue> {
        self.0.get(&id)
    }

    #[must_use]
    pub fn contains(&self, id: QuestionId) -> bool {
        self.0.contains_key(&id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (QuestionId, &AnswerValue)> {
        self.0.iter().map(|(id, value)| (*id, value))
    }
}

impl FromIterator<(QuestionId, AnswerValue)> for Answers {
    fn from_iter<I: IntoIterator<Item = (QuestionId, AnswerValue)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Questions the user marked for later review. Never affects scoring.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FlagSet(BTreeSet<QuestionId>);

impl FlagSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Flip membership of `id`; returns whether it is flagged afterwards.
    pub fn toggle(&mut self, id: QuestionId) -> bool {
        if self.0.remove(&id) {
            false
        } else {
            self.0.insert(id);
            true
        }
    }

    #[must_use]
    pub fn contains(&self, id: QuestionId) -> bool {
        self.0.contains(&id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = QuestionId> + '_ {
        self.0.iter().copied()
    }
}
