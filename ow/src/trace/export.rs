//! Export traversal: objectives grouped by their linked task.
//!
//! Export always succeeds. Incomplete objectives come out with their
//! placeholder sentences; unlinked and dangling links land in the
//! "Ungrouped" bucket. Completeness is reported elsewhere, never
//! enforced here.

use std::collections::HashMap;
use std::fmt::Write as _;

use chrono::{DateTime, Utc};
use courseapi::model::{BloomLevel, Objective, ObjectivePriority, TriageItem};
use serde::Serialize;

use crate::compose::compose_objective_text;

pub const UNGROUPED_LABEL: &str = "Ungrouped";

/// One objective, ready for output.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportedObjective {
    pub id: String,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bloom_level: Option<BloomLevel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<ObjectivePriority>,
    pub requires_assessment: bool,
}

/// Objectives sharing one linked task (or none).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportGroup {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
    pub title: String,
    pub objectives: Vec<ExportedObjective>,
}

/// Group objectives by linked task. Links resolve against active items
/// only, so an objective pointing at a parked or missing task lands in
/// the Ungrouped bucket. Groups follow item order; Ungrouped comes last
/// and only appears when something falls into it.
pub fn build_export(
    items: &[TriageItem],
    objectives: &[Objective],
    default_audience: &str,
) -> Vec<ExportGroup> {
    let titles: HashMap<&str, (&str, i64)> = items
        .iter()
        .filter(|i| i.is_active())
        .map(|i| (i.id.as_str(), (i.text.as_str(), i.sort_order)))
        .collect();

    let mut sorted: Vec<&Objective> = objectives.iter().collect();
    sorted.sort_by(|a, b| a.sort_order.cmp(&b.sort_order).then(a.id.cmp(&b.id)));

    let mut grouped: HashMap<Option<&str>, Vec<ExportedObjective>> = HashMap::new();
    for objective in sorted {
        let key = objective
            .linked_task_id
            .as_deref()
            .filter(|link| titles.contains_key(link));
        grouped.entry(key).or_default().push(ExportedObjective {
            id: objective.id.clone(),
            text: compose_objective_text(objective, default_audience),
            bloom_level: objective.bloom_level,
            priority: objective.priority,
            requires_assessment: objective.requires_assessment,
        });
    }

    let mut groups: Vec<ExportGroup> = Vec::new();
    let mut linked_keys: Vec<&str> = grouped.keys().filter_map(|k| *k).collect();
    linked_keys.sort_by_key(|id| {
        titles
            .get(id)
            .map(|(_, sort)| (*sort, *id))
            .unwrap_or((i64::MAX, *id))
    });
    for key in linked_keys {
        if let Some(objectives) = grouped.remove(&Some(key)) {
            let title = titles
                .get(key)
                .map(|(text, _)| text.to_string())
                .unwrap_or_else(|| key.to_string());
            groups.push(ExportGroup {
                task_id: Some(key.to_string()),
                title,
                objectives,
            });
        }
    }
    if let Some(ungrouped) = grouped.remove(&None) {
        groups.push(ExportGroup {
            task_id: None,
            title: UNGROUPED_LABEL.to_string(),
            objectives: ungrouped,
        });
    }
    groups
}

/// Render groups as a Markdown document.
pub fn render_markdown(groups: &[ExportGroup], generated_at: DateTime<Utc>) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "# Learning objectives");
    let _ = writeln!(
        out,
        "\n_Generated {}_",
        generated_at.format("%Y-%m-%d %H:%M UTC")
    );
    if groups.is_empty() {
        let _ = writeln!(out, "\nNo objectives yet.");
        return out;
    }
    for group in groups {
        let _ = writeln!(out, "\n## {}", group.title);
        let _ = writeln!(out);
        for objective in &group.objectives {
            let mut notes: Vec<String> = Vec::new();
            if let Some(level) = objective.bloom_level {
                notes.push(level.to_string());
            }
            if let Some(priority) = objective.priority {
                notes.push(priority.to_string());
            }
            if objective.requires_assessment {
                notes.push("assessed".to_string());
            }
            let text = if objective.text.is_empty() {
                "(empty objective)"
            } else {
                objective.text.as_str()
            };
            if notes.is_empty() {
                let _ = writeln!(out, "- {}", text);
            } else {
                let _ = writeln!(out, "- {} ({})", text, notes.join(", "));
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use courseapi::model::{TriageColumn, TriageSource};

    fn item(id: &str, text: &str, sort_order: i64) -> TriageItem {
        TriageItem {
            id: id.into(),
            course_id: "c1".into(),
            text: text.into(),
            column: TriageColumn::Must,
            source: TriageSource::TaskAnalysis,
            sort_order,
        }
    }

    fn objective(id: &str, link: Option<&str>, sort_order: i64) -> Objective {
        let mut obj = Objective::blank(id, link.map(String::from), sort_order);
        obj.behavior = format!("do thing {}", id);
        obj
    }

    #[test]
    fn test_one_group_per_distinct_link() {
        let items = [item("t1", "Chart vitals", 0), item("t2", "Escalate", 1)];
        let objectives = [
            objective("o1", Some("t1"), 0),
            objective("o2", Some("t1"), 1),
            objective("o3", None, 2),
            objective("o4", Some("gone"), 3),
        ];
        let groups = build_export(&items, &objectives, "the learner");
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].task_id.as_deref(), Some("t1"));
        assert_eq!(groups[0].objectives.len(), 2);
        assert_eq!(groups[1].title, UNGROUPED_LABEL);
        // Unlinked and dangling both land in Ungrouped.
        let ids: Vec<&str> = groups[1].objectives.iter().map(|o| o.id.as_str()).collect();
        assert_eq!(ids, vec!["o3", "o4"]);
    }

    #[test]
    fn test_groups_follow_item_order() {
        let items = [item("t2", "Second", 5), item("t1", "First", 1)];
        let objectives = [objective("o1", Some("t2"), 0), objective("o2", Some("t1"), 1)];
        let groups = build_export(&items, &objectives, "");
        assert_eq!(groups[0].title, "First");
        assert_eq!(groups[1].title, "Second");
    }

    #[test]
    fn test_nice_links_fall_to_ungrouped() {
        let mut parked = item("t9", "Polish the slide deck", 0);
        parked.column = TriageColumn::Nice;
        let objectives = [objective("o1", Some("t9"), 0)];
        let groups = build_export(&[parked], &objectives, "");
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].title, UNGROUPED_LABEL);
        assert!(groups[0].task_id.is_none());
    }

    #[test]
    fn test_export_never_blocks_on_incomplete() {
        let blanks: Vec<Objective> = (0..4)
            .map(|i| Objective::blank(format!("o{}", i), None, i))
            .collect();
        let groups = build_export(&[], &blanks, "the learner");
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].objectives.len(), 4);
        let md = render_markdown(&groups, Utc::now());
        assert!(md.contains("(empty objective)"));
    }

    #[test]
    fn test_markdown_shape() {
        let items = [item("t1", "Chart vitals", 0)];
        let mut obj = objective("o1", Some("t1"), 0);
        obj.condition = "Given a chart".into();
        obj.criteria = "within 2 minutes".into();
        obj.bloom_level = Some(BloomLevel::Apply);
        obj.requires_assessment = true;
        let groups = build_export(&items, &[obj], "the nurse");
        let md = render_markdown(&groups, Utc::now());
        assert!(md.starts_with("# Learning objectives"));
        assert!(md.contains("## Chart vitals"));
        assert!(md.contains("Given a chart, the nurse will do thing o1 within 2 minutes."));
        assert!(md.contains("(Apply, Should Have, assessed)"));
    }

    #[test]
    fn test_objectives_sorted_within_group() {
        let items = [item("t1", "Task", 0)];
        let objectives = [
            objective("o2", Some("t1"), 9),
            objective("o1", Some("t1"), 1),
        ];
        let groups = build_export(&items, &objectives, "");
        let ids: Vec<&str> = groups[0].objectives.iter().map(|o| o.id.as_str()).collect();
        assert_eq!(ids, vec!["o1", "o2"]);
    }
}
