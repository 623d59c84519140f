//! Request and response bodies for the wizard endpoints.
//!
//! Create bodies never carry an id; the server mints one and returns it.
//! Patch types model partial updates: every field optional, absent keys
//! untouched, and (for classification fields) an explicit empty string
//! to clear. Patches merge so coalesced edits collapse into one request.

use serde::{Deserialize, Serialize};

use crate::model::{
    BloomLevel, KnowledgeDimension, ObjectivePriority, SubTaskNovelty, TriageColumn, TriageSource,
};

/// Body for `PATCH .../gap`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GapPayload {
    pub gap_knowledge: bool,
    pub gap_skill: bool,
}

/// Server reply to any create: the canonical id plus whatever else the
/// backend chooses to echo, which we ignore.
#[derive(Debug, Clone, Deserialize)]
pub struct CreatedId {
    pub id: String,
}

/// Body for `POST .../triage-items`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriageItemCreate {
    pub text: String,
    pub column: TriageColumn,
    pub source: TriageSource,
    pub sort_order: i64,
}

/// Body for `POST .../triage-items/{taskId}/sub-tasks`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubTaskCreate {
    pub text: String,
    pub is_new: SubTaskNovelty,
    pub sort_order: i64,
}

/// Body for `POST .../objectives`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectiveCreate {
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

/// Partial update for a triage item.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriageItemPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<TriageColumn>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<i64>,
}

impl TriageItemPatch {
    pub fn is_empty(&self) -> bool {
        self.text.is_none() && self.column.is_none() && self.sort_order.is_none()
    }

    /// Overlay a later patch; its fields win where both are present.
    pub fn merge(&mut self, newer: TriageItemPatch) {
        if newer.text.is_some() {
            self.text = newer.text;
        }
        if newer.column.is_some() {
            self.column = newer.column;
        }
        if newer.sort_order.is_some() {
            self.sort_order = newer.sort_order;
        }
    }
}

/// Partial update for a sub-task.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubTaskPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_new: Option<SubTaskNovelty>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<i64>,
}

impl SubTaskPatch {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Default::default()
        }
    }

    pub fn novelty(novelty: SubTaskNovelty) -> Self {
        Self {
            is_new: Some(novelty),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_none() && self.is_new.is_none() && self.sort_order.is_none()
    }

    pub fn merge(&mut self, newer: SubTaskPatch) {
        if newer.text.is_some() {
            self.text = newer.text;
        }
        if newer.is_new.is_some() {
            self.is_new = newer.is_new;
        }
        if newer.sort_order.is_some() {
            self.sort_order = newer.sort_order;
        }
    }
}

/// Partial update for an objective.
///
/// Classification fields are doubly optional: the outer layer is "does
/// this patch touch the field", the inner one is the new value, with
/// `None` clearing it (sent as `""`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectivePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audience: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub behavior: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verb: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub criteria: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "crate::wire::patch_wire"
    )]
    pub bloom_level: Option<Option<BloomLevel>>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "crate::wire::patch_wire"
    )]
    pub bloom_knowledge: Option<Option<KnowledgeDimension>>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "crate::wire::patch_wire"
    )]
    pub priority: Option<Option<ObjectivePriority>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub freeform_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requires_assessment: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wiifm: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rationale: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "crate::wire::patch_wire"
    )]
    pub linked_task_id: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<i64>,
}

impl ObjectivePatch {
    pub fn is_empty(&self) -> bool {
        *self == ObjectivePatch::default()
    }

    pub fn merge(&mut self, newer: ObjectivePatch) {
        if newer.audience.is_some() {
            self.audience = newer.audience;
        }
        if newer.behavior.is_some() {
            self.behavior = newer.behavior;
        }
        if newer.verb.is_some() {
            self.verb = newer.verb;
        }
        if newer.condition.is_some() {
            self.condition = newer.condition;
        }
        if newer.criteria.is_some() {
            self.criteria = newer.criteria;
        }
        if newer.bloom_level.is_some() {
            self.bloom_level = newer.bloom_level;
        }
        if newer.bloom_knowledge.is_some() {
            self.bloom_knowledge = newer.bloom_knowledge;
        }
        if newer.priority.is_some() {
            self.priority = newer.priority;
        }
        if newer.freeform_text.is_some() {
            self.freeform_text = newer.freeform_text;
        }
        if newer.requires_assessment.is_some() {
            self.requires_assessment = newer.requires_assessment;
        }
        if newer.wiifm.is_some() {
            self.wiifm = newer.wiifm;
        }
        if newer.rationale.is_some() {
            self.rationale = newer.rationale;
        }
        if newer.linked_task_id.is_some() {
            self.linked_task_id = newer.linked_task_id;
        }
        if newer.sort_order.is_some() {
            self.sort_order = newer.sort_order;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sub_task_patch_merge_last_wins() {
        let mut patch = SubTaskPatch::text("first");
        patch.merge(SubTaskPatch::text("second"));
        patch.merge(SubTaskPatch::novelty(SubTaskNovelty::Uncertain));
        assert_eq!(patch.text.as_deref(), Some("second"));
        assert_eq!(patch.is_new, Some(SubTaskNovelty::Uncertain));
        assert_eq!(patch.sort_order, None);
    }

    #[test]
    fn test_sub_task_patch_skips_absent_fields() {
        let patch = SubTaskPatch::text("Read the chart");
        let json = serde_json::to_string(&patch).unwrap();
        assert_eq!(json, r#"{"text":"Read the chart"}"#);
    }

    #[test]
    fn test_objective_patch_clear_versus_untouched() {
        let patch = ObjectivePatch {
            bloom_level: Some(None),
            behavior: Some("identify abnormal vitals".into()),
            ..Default::default()
        };
        let json = serde_json::to_value(&patch).unwrap();
        assert_eq!(json["bloomLevel"], "");
        assert_eq!(json["behavior"], "identify abnormal vitals");
        assert!(json.get("priority").is_none());
        assert!(json.get("bloomKnowledge").is_none());
    }

    #[test]
    fn test_objective_patch_merge_keeps_clears() {
        let mut patch = ObjectivePatch {
            bloom_level: Some(Some(BloomLevel::Apply)),
            condition: Some("Given a chart".into()),
            ..Default::default()
        };
        patch.merge(ObjectivePatch {
            bloom_level: Some(None),
            ..Default::default()
        });
        assert_eq!(patch.bloom_level, Some(None));
        assert_eq!(patch.condition.as_deref(), Some("Given a chart"));
        assert!(!patch.is_empty());
    }

    #[test]
    fn test_gap_payload_wire_names() {
        let payload = GapPayload {
            gap_knowledge: true,
            gap_skill: false,
        };
        let json = serde_json::to_value(payload).unwrap();
        assert_eq!(json, serde_json::json!({"gapKnowledge": true, "gapSkill": false}));
    }

    #[test]
    fn test_objective_create_has_no_id() {
        let body = ObjectiveCreate {
            linked_task_id: Some("t1".into()),
            priority: Some(ObjectivePriority::ShouldHave),
            sort_order: 2,
            ..Default::default()
        };
        let json = serde_json::to_value(&body).unwrap();
        assert!(json.get("id").is_none());
        assert_eq!(json["linkedTaskId"], "t1");
        assert_eq!(json["priority"], "Should Have");
    }
}
