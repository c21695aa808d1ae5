use exam_core::analytics::{Band, Quality};
use exam_core::model::{MAX_SCORE, ModuleKind};
use services::ResultOverview;

use crate::vm::time_fmt::{format_countdown, format_datetime};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BandVm {
    pub label: &'static str,
    pub score: u8,
    /// CSS modifier, e.g. `band-good`.
    pub class: &'static str,
}

impl From<Band> for BandVm {
    fn from(band: Band) -> Self {
        let class = match band.quality {
            Quality::Excellent => "band-excellent",
            Quality::Good => "band-good",
            Quality::Average => "band-average",
            Quality::Insufficient => "band-insufficient",
            Quality::NotMeasured => "band-none",
        };
        Self {
            label: band.quality.label(),
            score: band.score,
            class,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResultsVm {
    pub series_label: String,
    pub module_label: &'static str,
    pub score_label: String,
    pub level_label: &'static str,
    /// `None` for externally graded modules.
    pub correct_label: Option<String>,
    pub time_used_label: String,
    pub finished_at_str: String,
    pub accuracy: BandVm,
    pub time: BandVm,
    pub submitted: bool,
    pub submission_label: String,
}

impl From<&ResultOverview> for ResultsVm {
    fn from(overview: &ResultOverview) -> Self {
        let result = &overview.result;
        let correct_label = (!result.module_kind().is_free_response())
            .then(|| format!("{} / {} correct", result.correct_count(), result.total_questions()));
        let submission_label = match &overview.attempt_id {
            Some(attempt_id) => format!("Submitted (attempt {attempt_id})"),
            None => "Not submitted yet. Your result is saved on this device.".to_string(),
        };
        Self {
            series_label: format!("Series {}", result.series_id()),
            module_label: module_label(result.module_kind()),
            score_label: format!("{} / {MAX_SCORE}", result.score()),
            level_label: result.level().as_str(),
            correct_label,
            time_used_label: format!(
                "{} of {}",
                format_countdown(result.elapsed_seconds()),
                format_countdown(result.allotted_seconds())
            ),
            finished_at_str: format_datetime(result.finished_at()),
            accuracy: overview.accuracy.into(),
            time: overview.time.into(),
            submitted: overview.is_submitted(),
            submission_label,
        }
    }
}

fn module_label(kind: ModuleKind) -> &'static str {
    match kind {
        ModuleKind::Reading => "Compréhension écrite",
        ModuleKind::Listening => "Compréhension orale",
        ModuleKind::Writing => "Expression écrite",
        ModuleKind::Speaking => "Expression orale",
    }
}

#[must_use]
pub fn map_results(overview: &ResultOverview) -> ResultsVm {
    ResultsVm::from(overview)
}
