//! Learning objectives and their classification vocabulary.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Cognitive level from the revised Bloom taxonomy.
///
/// Variant order is the taxonomy order, so `Ord` sorts from lowest to
/// highest cognitive demand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum BloomLevel {
    Remember,
    Understand,
    Apply,
    Analyze,
    Evaluate,
    Create,
}

impl BloomLevel {
    pub const ALL: [BloomLevel; 6] = [
        BloomLevel::Remember,
        BloomLevel::Understand,
        BloomLevel::Apply,
        BloomLevel::Analyze,
        BloomLevel::Evaluate,
        BloomLevel::Create,
    ];

    /// Analyze and above. These levels normally warrant an assessment.
    pub fn is_higher_order(&self) -> bool {
        *self >= BloomLevel::Analyze
    }

    /// Starter verbs commonly used at this level, for prompting authors.
    pub fn verbs(&self) -> &'static [&'static str] {
        match self {
            BloomLevel::Remember => &["list", "define", "recall", "name", "identify"],
            BloomLevel::Understand => &["explain", "summarize", "describe", "classify"],
            BloomLevel::Apply => &["use", "demonstrate", "perform", "calculate"],
            BloomLevel::Analyze => &["compare", "differentiate", "examine", "test"],
            BloomLevel::Evaluate => &["judge", "critique", "justify", "prioritize"],
            BloomLevel::Create => &["design", "construct", "compose", "develop"],
        }
    }
}

impl fmt::Display for BloomLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BloomLevel::Remember => "Remember",
            BloomLevel::Understand => "Understand",
            BloomLevel::Apply => "Apply",
            BloomLevel::Analyze => "Analyze",
            BloomLevel::Evaluate => "Evaluate",
            BloomLevel::Create => "Create",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for BloomLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "remember" => Ok(BloomLevel::Remember),
            "understand" => Ok(BloomLevel::Understand),
            "apply" => Ok(BloomLevel::Apply),
            "analyze" => Ok(BloomLevel::Analyze),
            "evaluate" => Ok(BloomLevel::Evaluate),
            "create" => Ok(BloomLevel::Create),
            _ => Err(format!("Invalid Bloom level: {}", s)),
        }
    }
}

/// Knowledge dimension from the same taxonomy revision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum KnowledgeDimension {
    Factual,
    Conceptual,
    Procedural,
    Metacognitive,
}

impl fmt::Display for KnowledgeDimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            KnowledgeDimension::Factual => "Factual",
            KnowledgeDimension::Conceptual => "Conceptual",
            KnowledgeDimension::Procedural => "Procedural",
            KnowledgeDimension::Metacognitive => "Metacognitive",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for KnowledgeDimension {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "factual" => Ok(KnowledgeDimension::Factual),
            "conceptual" => Ok(KnowledgeDimension::Conceptual),
            "procedural" => Ok(KnowledgeDimension::Procedural),
            "metacognitive" => Ok(KnowledgeDimension::Metacognitive),
            _ => Err(format!("Invalid knowledge dimension: {}", s)),
        }
    }
}

/// How firmly an objective is committed to the course.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ObjectivePriority {
    #[serde(rename = "Must Have")]
    MustHave,
    #[default]
    #[serde(rename = "Should Have")]
    ShouldHave,
    #[serde(rename = "Nice to Have")]
    NiceToHave,
}

impl ObjectivePriority {
    pub const ALL: [ObjectivePriority; 3] = [
        ObjectivePriority::MustHave,
        ObjectivePriority::ShouldHave,
        ObjectivePriority::NiceToHave,
    ];
}

impl fmt::Display for ObjectivePriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ObjectivePriority::MustHave => "Must Have",
            ObjectivePriority::ShouldHave => "Should Have",
            ObjectivePriority::NiceToHave => "Nice to Have",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for ObjectivePriority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "must have" | "must" => Ok(ObjectivePriority::MustHave),
            "should have" | "should" => Ok(ObjectivePriority::ShouldHave),
            "nice to have" | "nice" => Ok(ObjectivePriority::NiceToHave),
            _ => Err(format!("Invalid priority: {}", s)),
        }
    }
}

/// A learning objective in the ABCD format (audience, behavior,
/// condition, degree/criteria), plus classification metadata.
///
/// String fields use the empty string for "not filled in yet"; the
/// classification fields use `Option` backed by the same convention on
/// the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Objective {
    pub id: String,
    #[serde(default)]
    pub audience: String,
    #[serde(default)]
    pub behavior: String,
    #[serde(default)]
    pub verb: String,
    #[serde(default)]
    pub condition: String,
    #[serde(default)]
    pub criteria: String,
    #[serde(default, with = "crate::wire::option_wire")]
    pub bloom_level: Option<BloomLevel>,
    #[serde(default, with = "crate::wire::option_wire")]
    pub bloom_knowledge: Option<KnowledgeDimension>,
    #[serde(default, with = "crate::wire::option_wire")]
    pub priority: Option<ObjectivePriority>,
    #[serde(default)]
    pub freeform_text: String,
    #[serde(default)]
    pub requires_assessment: bool,
    #[serde(default)]
    pub wiifm: String,
    #[serde(default)]
    pub rationale: String,
    #[serde(default, with = "crate::wire::option_wire")]
    pub linked_task_id: Option<String>,
    #[serde(default)]
    pub sort_order: i64,
}

impl Objective {
    /// Freshly created objective: everything blank except priority,
    /// which starts at the default, and an optional task link.
    pub fn blank(id: impl Into<String>, linked_task_id: Option<String>, sort_order: i64) -> Self {
        Self {
            id: id.into(),
            audience: String::new(),
            behavior: String::new(),
            verb: String::new(),
            condition: String::new(),
            criteria: String::new(),
            bloom_level: None,
            bloom_knowledge: None,
            priority: Some(ObjectivePriority::default()),
            freeform_text: String::new(),
            requires_assessment: false,
            wiifm: String::new(),
            rationale: String::new(),
            linked_task_id,
            sort_order,
        }
    }

    /// Fully composed: condition, behavior, and criteria all filled in.
    pub fn is_composed(&self) -> bool {
        !self.condition.is_empty() && !self.behavior.is_empty() && !self.criteria.is_empty()
    }

    /// Any ABCD field has content, so the author has started work.
    pub fn is_started(&self) -> bool {
        !self.audience.is_empty()
            || !self.behavior.is_empty()
            || !self.condition.is_empty()
            || !self.criteria.is_empty()
            || !self.freeform_text.is_empty()
    }

    /// Higher-order Bloom level without an assessment flags a mismatch
    /// between what the objective claims and how it will be verified.
    pub fn lacks_needed_assessment(&self) -> bool {
        self.bloom_level.is_some_and(|l| l.is_higher_order()) && !self.requires_assessment
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bloom_order_and_higher() {
        assert!(BloomLevel::Remember < BloomLevel::Create);
        assert!(!BloomLevel::Apply.is_higher_order());
        assert!(BloomLevel::Analyze.is_higher_order());
        assert!(BloomLevel::Create.is_higher_order());
    }

    #[test]
    fn test_bloom_round_trip() {
        for level in BloomLevel::ALL {
            assert_eq!(level.to_string().parse::<BloomLevel>().unwrap(), level);
        }
        assert!("transcend".parse::<BloomLevel>().is_err());
    }

    #[test]
    fn test_priority_wire_and_shorthand() {
        assert_eq!(
            serde_json::to_string(&ObjectivePriority::MustHave).unwrap(),
            "\"Must Have\""
        );
        assert_eq!("must".parse::<ObjectivePriority>().unwrap(), ObjectivePriority::MustHave);
        assert_eq!(
            "nice to have".parse::<ObjectivePriority>().unwrap(),
            ObjectivePriority::NiceToHave
        );
    }

    #[test]
    fn test_blank_objective() {
        let obj = Objective::blank("o1", Some("t1".into()), 3);
        assert_eq!(obj.priority, Some(ObjectivePriority::ShouldHave));
        assert_eq!(obj.linked_task_id.as_deref(), Some("t1"));
        assert!(!obj.is_composed());
        assert!(!obj.is_started());
    }

    #[test]
    fn test_is_composed_requires_all_three() {
        let mut obj = Objective::blank("o1", None, 0);
        obj.condition = "Given a chart".into();
        obj.behavior = "identify abnormal vitals".into();
        assert!(!obj.is_composed());
        obj.criteria = "with 90% accuracy".into();
        assert!(obj.is_composed());
    }

    #[test]
    fn test_assessment_mismatch() {
        let mut obj = Objective::blank("o1", None, 0);
        assert!(!obj.lacks_needed_assessment());
        obj.bloom_level = Some(BloomLevel::Evaluate);
        assert!(obj.lacks_needed_assessment());
        obj.requires_assessment = true;
        assert!(!obj.lacks_needed_assessment());
        obj.bloom_level = Some(BloomLevel::Remember);
        obj.requires_assessment = false;
        assert!(!obj.lacks_needed_assessment());
    }

    #[test]
    fn test_objective_wire_round_trip() {
        let json = r#"{
            "id": "o1",
            "audience": "the new nurse",
            "behavior": "identify abnormal vitals",
            "verb": "identify",
            "condition": "Given a patient chart",
            "criteria": "with 90% accuracy",
            "bloomLevel": "Analyze",
            "bloomKnowledge": "",
            "priority": "Must Have",
            "freeformText": "",
            "requiresAssessment": true,
            "wiifm": "",
            "rationale": "",
            "linkedTaskId": "t1",
            "sortOrder": 0
        }"#;
        let obj: Objective = serde_json::from_str(json).unwrap();
        assert_eq!(obj.bloom_level, Some(BloomLevel::Analyze));
        assert_eq!(obj.bloom_knowledge, None);
        assert_eq!(obj.priority, Some(ObjectivePriority::MustHave));
        assert_eq!(obj.linked_task_id.as_deref(), Some("t1"));
        assert!(obj.is_composed());

        let back = serde_json::to_value(&obj).unwrap();
        assert_eq!(back["bloomKnowledge"], "");
        assert_eq!(back["linkedTaskId"], "t1");
    }
}
