//! Gap classification for a course: what kind of gap the training closes.

use serde::{Deserialize, Serialize};

/// Flags describing whether the performance gap is one of knowledge,
/// skill, or both. Both `false` means the course is not yet classified.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GapClassification {
    #[serde(default)]
    pub knowledge: bool,
    #[serde(default)]
    pub skill: bool,
}

impl GapClassification {
    pub fn new(knowledge: bool, skill: bool) -> Self {
        Self { knowledge, skill }
    }

    /// At least one gap dimension has been selected.
    pub fn is_classified(&self) -> bool {
        self.knowledge || self.skill
    }

    /// Short human label, e.g. for status lines.
    pub fn label(&self) -> &'static str {
        match (self.knowledge, self.skill) {
            (true, true) => "knowledge + skill",
            (true, false) => "knowledge",
            (false, true) => "skill",
            (false, false) => "unclassified",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        assert!(!GapClassification::default().is_classified());
        assert!(GapClassification::new(true, false).is_classified());
        assert!(GapClassification::new(false, true).is_classified());
        assert!(GapClassification::new(true, true).is_classified());
    }

    #[test]
    fn test_labels() {
        assert_eq!(GapClassification::default().label(), "unclassified");
        assert_eq!(GapClassification::new(true, true).label(), "knowledge + skill");
        assert_eq!(GapClassification::new(false, true).label(), "skill");
    }

    #[test]
    fn test_wire_shape() {
        let json = serde_json::to_value(GapClassification::new(true, false)).unwrap();
        assert_eq!(json, serde_json::json!({"knowledge": true, "skill": false}));
    }
}
