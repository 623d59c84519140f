//! Wizard step keys and the status derivation over the entity collections.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use courseapi::model::{GapClassification, Objective, SubTask, TriageItem};
use serde::{Deserialize, Serialize};

/// The six wizard steps, in presentation order. `Ord` follows variant
/// order, so a `BTreeMap` keyed by step iterates in wizard order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepKey {
    Context,
    Priority,
    Tasks,
    Builder,
    Validation,
    Export,
}

impl StepKey {
    pub const ORDERED: [StepKey; 6] = [
        StepKey::Context,
        StepKey::Priority,
        StepKey::Tasks,
        StepKey::Builder,
        StepKey::Validation,
        StepKey::Export,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            StepKey::Context => "Context & gap",
            StepKey::Priority => "Task priority",
            StepKey::Tasks => "Task breakdown",
            StepKey::Builder => "Objective builder",
            StepKey::Validation => "Validation",
            StepKey::Export => "Export",
        }
    }

    /// Next step in order, or `None` at the end. Navigation is never
    /// gated on status; these are plain index moves.
    pub fn next(&self) -> Option<StepKey> {
        let idx = Self::ORDERED.iter().position(|s| s == self)?;
        Self::ORDERED.get(idx + 1).copied()
    }

    pub fn prev(&self) -> Option<StepKey> {
        let idx = Self::ORDERED.iter().position(|s| s == self)?;
        idx.checked_sub(1).and_then(|i| Self::ORDERED.get(i)).copied()
    }
}

impl fmt::Display for StepKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StepKey::Context => "context",
            StepKey::Priority => "priority",
            StepKey::Tasks => "tasks",
            StepKey::Builder => "builder",
            StepKey::Validation => "validation",
            StepKey::Export => "export",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for StepKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "context" => Ok(StepKey::Context),
            "priority" => Ok(StepKey::Priority),
            "tasks" => Ok(StepKey::Tasks),
            "builder" => Ok(StepKey::Builder),
            "validation" => Ok(StepKey::Validation),
            "export" => Ok(StepKey::Export),
            _ => Err(format!("Invalid step: {}", s)),
        }
    }
}

/// Advisory readiness of a step. Purely presentational; nothing is
/// ever blocked on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum StepStatus {
    #[serde(rename = "none")]
    NotStarted,
    #[serde(rename = "progress")]
    InProgress,
    #[serde(rename = "done")]
    Done,
}

impl StepStatus {
    pub fn symbol(&self) -> &'static str {
        match self {
            StepStatus::NotStarted => "[ ]",
            StepStatus::InProgress => "[~]",
            StepStatus::Done => "[x]",
        }
    }
}

impl fmt::Display for StepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StepStatus::NotStarted => "none",
            StepStatus::InProgress => "progress",
            StepStatus::Done => "done",
        };
        write!(f, "{}", s)
    }
}

/// Map each step to its current status, straight from the collections.
///
/// The rules are intentionally shallow: `context` and `priority` flip
/// directly to done, `tasks`/`builder`/`validation` only ever report
/// in-progress (there is no "enough" amount of breakdown or objectives),
/// and `export` has no completion concept at all.
pub fn derive_step_status(
    gap: &GapClassification,
    triage_items: &[TriageItem],
    sub_tasks: &[SubTask],
    objectives: &[Objective],
) -> BTreeMap<StepKey, StepStatus> {
    let mut status = BTreeMap::new();
    status.insert(
        StepKey::Context,
        if gap.is_classified() {
            StepStatus::Done
        } else {
            StepStatus::NotStarted
        },
    );
    status.insert(
        StepKey::Priority,
        if triage_items.iter().any(|i| i.is_active()) {
            StepStatus::Done
        } else {
            StepStatus::NotStarted
        },
    );
    status.insert(
        StepKey::Tasks,
        if sub_tasks.is_empty() {
            StepStatus::NotStarted
        } else {
            StepStatus::InProgress
        },
    );
    let builder = if objectives.is_empty() {
        StepStatus::NotStarted
    } else {
        StepStatus::InProgress
    };
    status.insert(StepKey::Builder, builder);
    status.insert(StepKey::Validation, builder);
    status.insert(StepKey::Export, StepStatus::NotStarted);
    status
}

#[cfg(test)]
mod tests {
    use super::*;
    use courseapi::model::{SubTaskNovelty, TriageColumn, TriageSource};

    fn item(id: &str, column: TriageColumn) -> TriageItem {
        TriageItem {
            id: id.into(),
            course_id: "c1".into(),
            text: format!("item {}", id),
            column,
            source: TriageSource::TaskAnalysis,
            sort_order: 0,
        }
    }

    fn sub_task(id: &str, parent: &str) -> SubTask {
        SubTask {
            id: id.into(),
            parent_item_id: parent.into(),
            text: "step".into(),
            is_new: SubTaskNovelty::New,
            sort_order: 0,
        }
    }

    #[test]
    fn test_all_empty_is_all_not_started() {
        let status = derive_step_status(&GapClassification::default(), &[], &[], &[]);
        assert_eq!(status.len(), 6);
        assert!(status.values().all(|s| *s == StepStatus::NotStarted));
    }

    #[test]
    fn test_gap_toggle_changes_only_context() {
        let before = derive_step_status(&GapClassification::default(), &[], &[], &[]);
        let after = derive_step_status(&GapClassification::new(true, false), &[], &[], &[]);
        assert_eq!(after[&StepKey::Context], StepStatus::Done);
        for step in StepKey::ORDERED {
            if step != StepKey::Context {
                assert_eq!(before[&step], after[&step], "step {} changed", step);
            }
        }
    }

    #[test]
    fn test_priority_needs_an_active_item() {
        let nice_only = [item("t1", TriageColumn::Nice)];
        let status = derive_step_status(&GapClassification::default(), &nice_only, &[], &[]);
        assert_eq!(status[&StepKey::Priority], StepStatus::NotStarted);

        let with_must = [item("t1", TriageColumn::Nice), item("t2", TriageColumn::Must)];
        let status = derive_step_status(&GapClassification::default(), &with_must, &[], &[]);
        assert_eq!(status[&StepKey::Priority], StepStatus::Done);
    }

    #[test]
    fn test_tasks_and_builder_cap_at_in_progress() {
        let items = [item("t1", TriageColumn::Must)];
        let subs = [sub_task("s1", "t1")];
        let objectives = [courseapi::model::Objective::blank("o1", None, 0)];
        let status = derive_step_status(&GapClassification::default(), &items, &subs, &objectives);
        assert_eq!(status[&StepKey::Tasks], StepStatus::InProgress);
        assert_eq!(status[&StepKey::Builder], StepStatus::InProgress);
        assert_eq!(status[&StepKey::Validation], StepStatus::InProgress);
        assert_eq!(status[&StepKey::Export], StepStatus::NotStarted);
    }

    #[test]
    fn test_validation_mirrors_builder() {
        let objectives = [courseapi::model::Objective::blank("o1", None, 0)];
        let status = derive_step_status(&GapClassification::default(), &[], &[], &objectives);
        assert_eq!(status[&StepKey::Builder], status[&StepKey::Validation]);
    }

    #[test]
    fn test_determinism() {
        let gap = GapClassification::new(true, true);
        let items = [item("t1", TriageColumn::Should)];
        let a = derive_step_status(&gap, &items, &[], &[]);
        let b = derive_step_status(&gap, &items, &[], &[]);
        assert_eq!(a, b);
    }

    #[test]
    fn test_step_navigation() {
        assert_eq!(StepKey::Context.prev(), None);
        assert_eq!(StepKey::Context.next(), Some(StepKey::Priority));
        assert_eq!(StepKey::Export.next(), None);
        assert_eq!(StepKey::Export.prev(), Some(StepKey::Validation));
    }

    #[test]
    fn test_wire_names() {
        assert_eq!(serde_json::to_string(&StepStatus::NotStarted).unwrap(), "\"none\"");
        assert_eq!(serde_json::to_string(&StepStatus::InProgress).unwrap(), "\"progress\"");
        assert_eq!(serde_json::to_string(&StepKey::Builder).unwrap(), "\"builder\"");
        assert_eq!("validation".parse::<StepKey>().unwrap(), StepKey::Validation);
    }
}
