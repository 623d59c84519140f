//! The full wizard document for one course, as served by the backend.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{GapClassification, NaSection, NaSummary, Objective, SubTask, TriageItem};

/// Everything the wizard needs for a course, fetched in one round trip.
///
/// Collections arrive in server order; clients are expected to sort by
/// `sort_order` where presentation order matters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseSnapshot {
    pub course_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub gap: GapClassification,
    #[serde(default)]
    pub triage_items: Vec<TriageItem>,
    #[serde(default)]
    pub sub_tasks: Vec<SubTask>,
    #[serde(default)]
    pub objectives: Vec<Objective>,
    #[serde(default)]
    pub na_summary: NaSummary,
    #[serde(default)]
    pub na_sections: Vec<NaSection>,
    #[serde(default)]
    pub audiences: Vec<String>,
}

impl CourseSnapshot {
    /// Minimal snapshot for a course with no wizard data yet.
    pub fn empty(course_id: impl Into<String>) -> Self {
        Self {
            course_id: course_id.into(),
            title: String::new(),
            updated_at: None,
            gap: GapClassification::default(),
            triage_items: Vec::new(),
            sub_tasks: Vec::new(),
            objectives: Vec::new(),
            na_summary: NaSummary::default(),
            na_sections: Vec::new(),
            audiences: Vec::new(),
        }
    }
}
