//! Triage items: the tasks and topics sorted into priority columns.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Priority column a triage item currently sits in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TriageColumn {
    /// Required for the course; generates coverage expectations.
    Must,
    /// Important but negotiable; also counts as active coverage.
    Should,
    /// Parked. Excluded from coverage and validation.
    Nice,
}

impl TriageColumn {
    /// Items in `must` or `should` participate in objective coverage.
    pub fn is_active(&self) -> bool {
        !matches!(self, TriageColumn::Nice)
    }

    pub fn label(&self) -> &'static str {
        match self {
            TriageColumn::Must => "Must cover",
            TriageColumn::Should => "Should cover",
            TriageColumn::Nice => "Nice to have",
        }
    }
}

impl fmt::Display for TriageColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TriageColumn::Must => "must",
            TriageColumn::Should => "should",
            TriageColumn::Nice => "nice",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for TriageColumn {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "must" => Ok(TriageColumn::Must),
            "should" => Ok(TriageColumn::Should),
            "nice" => Ok(TriageColumn::Nice),
            _ => Err(format!("Invalid column: {}", s)),
        }
    }
}

/// Where a triage item came from. Only `Custom` items may be deleted;
/// the others are owned by upstream analysis steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TriageSource {
    #[serde(rename = "NA")]
    NeedsAnalysis,
    TaskAnalysis,
    Custom,
}

impl TriageSource {
    pub fn is_deletable(&self) -> bool {
        matches!(self, TriageSource::Custom)
    }
}

impl fmt::Display for TriageSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TriageSource::NeedsAnalysis => "NA",
            TriageSource::TaskAnalysis => "TaskAnalysis",
            TriageSource::Custom => "Custom",
        };
        write!(f, "{}", s)
    }
}

/// A single task or topic under triage for a course.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriageItem {
    pub id: String,
    pub course_id: String,
    pub text: String,
    pub column: TriageColumn,
    pub source: TriageSource,
    #[serde(default)]
    pub sort_order: i64,
}

impl TriageItem {
    /// A user-added item, as opposed to one imported from analysis.
    pub fn custom(id: impl Into<String>, course_id: impl Into<String>, text: impl Into<String>, sort_order: i64) -> Self {
        Self {
            id: id.into(),
            course_id: course_id.into(),
            text: text.into(),
            column: TriageColumn::Should,
            source: TriageSource::Custom,
            sort_order,
        }
    }

    pub fn is_active(&self) -> bool {
        self.column.is_active()
    }
}
