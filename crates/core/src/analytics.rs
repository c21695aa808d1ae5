//! Display-only quality bands computed from a finished attempt.
//!
//! Nothing here feeds back into the stored score.

use std::fmt;

use crate::model::{ExamResult, MAX_SCORE};

/// Free-response modules are expected to take at least this long.
pub const FREE_RESPONSE_MIN_SECONDS: u32 = 600;

/// Lowest numeric score an overrun can degrade to.
pub const OVERRUN_FLOOR: u8 = 10;

const OVERRUN_START: u8 = 40;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Quality {
    NotMeasured,
    Insufficient,
    Average,
    Good,
    Excellent,
}

impl Quality {
    /// Label shown in the results view.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Quality::Excellent => "Excellent",
            Quality::Good => "Bien",
            Quality::Average => "Moyen",
            Quality::Insufficient => "Insuffisant",
            Quality::NotMeasured => "Non mesuré",
        }
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A qualitative band plus a 0–100 score for gauges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Band {
    pub quality: Quality,
    pub score: u8,
}

impl Band {
    const fn new(quality: Quality, score: u8) -> Self {
        Self { quality, score }
    }

    pub const NOT_MEASURED: Band = Band::new(Quality::NotMeasured, 0);
}

/// Classify how the allotted time was used.
///
/// Choice modules are best in the 50–90% window. Free-response modules need at
/// least ten minutes (or the whole allotment if shorter) and at most 85%.
/// Any overrun is `Insufficient`, losing one point per percent over, down to the floor.
#[must_use]
pub fn time_band(elapsed_seconds: u32, allotted_seconds: u32, free_response: bool) -> Band {
    if allotted_seconds == 0 {
        return Band::NOT_MEASURED;
    }

    if elapsed_seconds > allotted_seconds {
        let over = u64::from(elapsed_seconds - allotted_seconds) * 100 / u64::from(allotted_seconds);
        let score = u64::from(OVERRUN_START)
            .saturating_sub(over)
            .max(u64::from(OVERRUN_FLOOR));
        return Band::new(
            Quality::Insufficient,
            u8::try_from(score).unwrap_or(OVERRUN_FLOOR),
        );
    }

    let at_most = |limit: u64| at_most_percent(elapsed_seconds, allotted_seconds, limit);

    if free_response {
        let minimum = FREE_RESPONSE_MIN_SECONDS.min(allotted_seconds);
        return if elapsed_seconds < minimum {
            Band::new(Quality::Average, 45)
        } else if at_most(85) {
            Band::new(Quality::Excellent, 100)
        } else {
            Band::new(Quality::Good, 75)
        };
    }

    let under = |limit: u64| under_percent(elapsed_seconds, allotted_seconds, limit);
    if !at_most(90) {
        Band::new(Quality::Good, 75)
    } else if !under(50) {
        Band::new(Quality::Excellent, 100)
    } else if !under(30) {
        Band::new(Quality::Good, 70)
    } else {
        Band::new(Quality::Average, 50)
    }
}

/// Classify answer accuracy.
///
/// Choice modules use correct/total; free-response modules use the graded score
/// against the 699 ceiling.
#[must_use]
pub fn accuracy_band(result: &ExamResult) -> Band {
    let percent = if result.module_kind().is_free_response() {
        percent_of(u64::from(result.score()), u64::from(MAX_SCORE))
    } else {
        if result.total_questions() == 0 {
            return Band::NOT_MEASURED;
        }
        percent_of(
            u64::from(result.correct_count()),
            u64::from(result.total_questions()),
        )
    };

    let quality = match percent {
        80.. => Quality::Excellent,
        60..=79 => Quality::Good,
        40..=59 => Quality::Average,
        _ => Quality::Insufficient,
    };
    Band::new(quality, u8::try_from(percent.min(100)).unwrap_or(100))
}

/// Time band for a stored result.
#[must_use]
pub fn result_time_band(result: &ExamResult) -> Band {
    time_band(
        result.elapsed_seconds(),
        result.allotted_seconds(),
        result.module_kind().is_free_response(),
    )
}

/// `elapsed / allotted <= limit%`, compared exactly.
fn at_most_percent(elapsed: u32, allotted: u32, limit: u64) -> bool {
    u64::from(elapsed) * 100 <= u64::from(allotted) * limit
}

/// `elapsed / allotted < limit%`, compared exactly.
fn under_percent(elapsed: u32, allotted: u32, limit: u64) -> bool {
    u64::from(elapsed) * 100 < u64::from(allotted) * limit
}

/// Integer percentage, rounded down.
fn percent_of(part: u64, whole: u64) -> u64 {
    if whole == 0 {
        return 0;
    }
    part * 100 / whole
}
