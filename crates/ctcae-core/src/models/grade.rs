use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Normalized grade label. The fixed set is `{1,2,3,4,5,Death,Not Applicable}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum GradeLevel {
    #[serde(rename = "1")]
    One,
    #[serde(rename = "2")]
    Two,
    #[serde(rename = "3")]
    Three,
    #[serde(rename = "4")]
    Four,
    #[serde(rename = "5")]
    Five,
    #[serde(rename = "death")]
    Death,
    #[serde(rename = "not_applicable")]
    NotApplicable,
}

impl GradeLevel {
    /// Normalize a raw grade label from a reference table.
    ///
    /// Accepts bare digits, `Grade N`, `GN`, `Death`, and the usual spellings
    /// of "not applicable" (`N/A`, `NA`, `-`). Matching is case-insensitive
    /// and ignores surrounding whitespace.
    pub fn from_label(raw: &str) -> Result<Self, CoreError> {
        let label = raw.trim().to_ascii_lowercase();
        let collapsed: String = label.split_whitespace().collect::<Vec<_>>().join(" ");

        match collapsed.as_str() {
            "death" | "grade death" => return Ok(GradeLevel::Death),
            "not applicable" | "n/a" | "na" | "-" | "–" => return Ok(GradeLevel::NotApplicable),
            _ => {}
        }

        let digits = collapsed
            .strip_prefix("grade")
            .or_else(|| collapsed.strip_prefix('g'))
            .unwrap_or(&collapsed)
            .trim();

        match digits {
            "1" => Ok(GradeLevel::One),
            "2" => Ok(GradeLevel::Two),
            "3" => Ok(GradeLevel::Three),
            "4" => Ok(GradeLevel::Four),
            "5" => Ok(GradeLevel::Five),
            _ => Err(CoreError::InvalidGradeLabel(raw.to_string())),
        }
    }

    /// Identifier-safe form used in grade ids (`1`..`5`, `death`, `not-applicable`).
    pub fn slug(self) -> &'static str {
        match self {
            GradeLevel::One => "1",
            GradeLevel::Two => "2",
            GradeLevel::Three => "3",
            GradeLevel::Four => "4",
            GradeLevel::Five => "5",
            GradeLevel::Death => "death",
            GradeLevel::NotApplicable => "not-applicable",
        }
    }

    pub fn is_applicable(self) -> bool {
        self != GradeLevel::NotApplicable
    }
}

impl fmt::Display for GradeLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GradeLevel::Death => f.write_str("Death"),
            GradeLevel::NotApplicable => f.write_str("Not Applicable"),
            other => f.write_str(other.slug()),
        }
    }
}

/// One severity level of a term, with its textual criteria.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GradeEntry {
    pub grade_id: String,
    /// Owning term. Must reference an existing [`super::term::TermEntry`].
    pub term_id: String,
    pub grade_level: GradeLevel,
    pub grade_description: String,
}

impl GradeEntry {
    pub fn id_for(term_id: &str, level: GradeLevel) -> String {
        format!("{term_id}:{}", level.slug())
    }
}
