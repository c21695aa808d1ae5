use serde::{Deserialize, Serialize};
use std::fmt;

/// Highest value on the normalized reporting scale.
pub const MAX_SCORE: u32 = 699;

/// CEFR-style proficiency band derived from a normalized score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Level {
    A1,
    A2,
    B1,
    B2,
    C1,
    C2,
}

impl Level {
    /// Step function over the 0–699 scale. Values above the scale band as `C2`.
    #[must_use]
    pub fn from_score(score: u32) -> Self {
        match score {
            0..=99 => Level::A1,
            100..=199 => Level::A2,
            200..=299 => Level::B1,
            300..=399 => Level::B2,
            400..=499 => Level::C1,
            _ => Level::C2,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Level::A1 => "A1",
            Level::A2 => "A2",
            Level::B1 => "B1",
            Level::B2 => "B2",
            Level::C1 => "C1",
            Level::C2 => "C2",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
