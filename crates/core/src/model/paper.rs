use crate::model::{ModuleKind, Question, SeriesId};

/// Everything needed to start a timed attempt of one exam series.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExamPaper {
    pub series_id: SeriesId,
    pub module_kind: ModuleKind,
    pub questions: Vec<Question>,
    pub allotted_seconds: u32,
}
