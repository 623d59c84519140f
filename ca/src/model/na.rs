//! Needs-analysis context carried into the wizard.
//!
//! This material is produced by earlier analysis steps and is read-only
//! here; it exists to ground gap classification and audience defaults.

use serde::{Deserialize, Serialize};

/// Condensed needs-analysis findings for a course.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NaSummary {
    #[serde(default)]
    pub business_goal: String,
    #[serde(default)]
    pub audience: String,
    #[serde(default)]
    pub current_state: String,
    #[serde(default)]
    pub desired_state: String,
    #[serde(default)]
    pub pain_points: Vec<String>,
}

impl NaSummary {
    pub fn is_empty(&self) -> bool {
        self.business_goal.is_empty()
            && self.audience.is_empty()
            && self.current_state.is_empty()
            && self.desired_state.is_empty()
            && self.pain_points.is_empty()
    }
}

/// One interview question and its recorded answer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NaEntry {
    #[serde(default)]
    pub question: String,
    #[serde(default)]
    pub answer: String,
}

/// A titled group of needs-analysis entries.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NaSection {
    #[serde(default)]
    pub topic: String,
    #[serde(default)]
    pub entries: Vec<NaEntry>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_summary() {
        assert!(NaSummary::default().is_empty());
        let summary = NaSummary {
            audience: "floor nurses".into(),
            ..Default::default()
        };
        assert!(!summary.is_empty());
    }

    #[test]
    fn test_section_deserializes_with_defaults() {
        let section: NaSection = serde_json::from_str(r#"{"topic":"Audience"}"#).unwrap();
        assert_eq!(section.topic, "Audience");
        assert!(section.entries.is_empty());
    }
}
