mod exam_vm;
mod results_vm;
pub mod time_fmt;

pub use exam_vm::{
    ChoiceVm, ExamIntent, ExamOutcome, ExamVm, NavItemVm, QuestionVm, start_exam,
};
pub use results_vm::{BandVm, ResultsVm, map_results};
