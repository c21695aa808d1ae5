use thiserror::Error;

use crate::model::{ParseIdError, QuestionError, ResultError};

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Question(#[from] QuestionError),
    #[error(transparent)]
    Result(#[from] ResultError),
    #[error(transparent)]
    ParseId(#[from] ParseIdError),
}
