//! In-memory course state owned by the session engine.
//!
//! The engine applies every edit here first, then schedules the
//! matching network write. Reads hand out clones, so callers never
//! observe a half-applied edit.

use courseapi::model::{
    CourseSnapshot, GapClassification, NaSection, NaSummary, Objective, SubTask, TriageItem,
};
use courseapi::payloads::{ObjectivePatch, SubTaskPatch, TriageItemPatch};

use super::id::temp_id;
use super::messages::{EntityKind, SessionError};

#[derive(Debug, Clone)]
pub struct SessionState {
    pub course_id: String,
    pub title: String,
    pub gap: GapClassification,
    pub triage_items: Vec<TriageItem>,
    pub sub_tasks: Vec<SubTask>,
    pub objectives: Vec<Objective>,
    pub na_summary: NaSummary,
    pub na_sections: Vec<NaSection>,
    pub audiences: Vec<String>,
}

impl SessionState {
    pub fn from_snapshot(snapshot: CourseSnapshot) -> Self {
        let mut state = Self {
            course_id: snapshot.course_id,
            title: snapshot.title,
            gap: snapshot.gap,
            triage_items: snapshot.triage_items,
            sub_tasks: snapshot.sub_tasks,
            objectives: snapshot.objectives,
            na_summary: snapshot.na_summary,
            na_sections: snapshot.na_sections,
            audiences: snapshot.audiences,
        };
        state
            .triage_items
            .sort_by(|a, b| a.sort_order.cmp(&b.sort_order).then_with(|| a.id.cmp(&b.id)));
        state
            .sub_tasks
            .sort_by(|a, b| a.sort_order.cmp(&b.sort_order).then_with(|| a.id.cmp(&b.id)));
        state
            .objectives
            .sort_by(|a, b| a.sort_order.cmp(&b.sort_order).then_with(|| a.id.cmp(&b.id)));
        state
    }

    /// Audience used when an objective leaves the slot blank: the first
    /// configured audience for the course, else the caller's fallback.
    pub fn default_audience(&self, fallback: &str) -> String {
        self.audiences
            .iter()
            .find(|a| !a.is_empty())
            .cloned()
            .unwrap_or_else(|| fallback.to_string())
    }

    pub fn triage_item(&self, id: &str) -> Option<&TriageItem> {
        self.triage_items.iter().find(|i| i.id == id)
    }

    pub fn sub_task(&self, id: &str) -> Option<&SubTask> {
        self.sub_tasks.iter().find(|s| s.id == id)
    }

    pub fn objective(&self, id: &str) -> Option<&Objective> {
        self.objectives.iter().find(|o| o.id == id)
    }

    pub fn sub_tasks_of(&self, item_id: &str) -> Vec<&SubTask> {
        self.sub_tasks
            .iter()
            .filter(|s| s.parent_item_id == item_id)
            .collect()
    }

    fn next_item_sort(&self) -> i64 {
        self.triage_items
            .iter()
            .map(|i| i.sort_order)
            .max()
            .map_or(0, |m| m + 1)
    }

    fn next_sub_task_sort(&self, parent_item_id: &str) -> i64 {
        self.sub_tasks
            .iter()
            .filter(|s| s.parent_item_id == parent_item_id)
            .map(|s| s.sort_order)
            .max()
            .map_or(0, |m| m + 1)
    }

    fn next_objective_sort(&self) -> i64 {
        self.objectives
            .iter()
            .map(|o| o.sort_order)
            .max()
            .map_or(0, |m| m + 1)
    }

    pub fn set_gap(&mut self, knowledge: bool, skill: bool) {
        self.gap = GapClassification::new(knowledge, skill);
    }

    /// Add a custom triage item under a fresh temp id.
    pub fn add_triage_item(&mut self, text: &str) -> TriageItem {
        let item = TriageItem::custom(temp_id(), self.course_id.clone(), text, self.next_item_sort());
        self.triage_items.push(item.clone());
        item
    }

    pub fn apply_triage_patch(
        &mut self,
        item_id: &str,
        patch: &TriageItemPatch,
    ) -> Result<(), SessionError> {
        let item = self
            .triage_items
            .iter_mut()
            .find(|i| i.id == item_id)
            .ok_or_else(|| SessionError::NotFound(format!("triage item {item_id}")))?;
        if let Some(text) = &patch.text {
            item.text = text.clone();
        }
        if let Some(column) = patch.column {
            item.column = column;
        }
        if let Some(sort_order) = patch.sort_order {
            item.sort_order = sort_order;
        }
        Ok(())
    }

    /// Remove a custom item along with its breakdown. Items imported
    /// from analysis steps are owned upstream and stay put.
    pub fn remove_triage_item(
        &mut self,
        item_id: &str,
    ) -> Result<(TriageItem, Vec<SubTask>), SessionError> {
        let pos = self
            .triage_items
            .iter()
            .position(|i| i.id == item_id)
            .ok_or_else(|| SessionError::NotFound(format!("triage item {item_id}")))?;
        if !self.triage_items[pos].source.is_deletable() {
            return Err(SessionError::NotEditable(format!(
                "triage item {item_id} was imported from {} and cannot be deleted",
                self.triage_items[pos].source
            )));
        }
        let item = self.triage_items.remove(pos);
        let mut children = Vec::new();
        self.sub_tasks.retain(|s| {
            if s.parent_item_id == item_id {
                children.push(s.clone());
                false
            } else {
                true
            }
        });
        Ok((item, children))
    }

    /// Add a sub-task under an existing, active triage item.
    pub fn add_sub_task(&mut self, parent_item_id: &str, text: &str) -> Result<SubTask, SessionError> {
        let parent = self
            .triage_item(parent_item_id)
            .ok_or_else(|| SessionError::NotFound(format!("triage item {parent_item_id}")))?;
        if !parent.is_active() {
            return Err(SessionError::NotEditable(format!(
                "triage item {parent_item_id} is parked in nice-to-have; move it before breaking it down"
            )));
        }
        let sub = SubTask::new(
            temp_id(),
            parent_item_id,
            text,
            self.next_sub_task_sort(parent_item_id),
        );
        self.sub_tasks.push(sub.clone());
        Ok(sub)
    }

    pub fn apply_sub_task_patch(
        &mut self,
        sub_task_id: &str,
        patch: &SubTaskPatch,
    ) -> Result<(), SessionError> {
        let sub = self
            .sub_tasks
            .iter_mut()
            .find(|s| s.id == sub_task_id)
            .ok_or_else(|| SessionError::NotFound(format!("sub-task {sub_task_id}")))?;
        if let Some(text) = &patch.text {
            sub.text = text.clone();
        }
        if let Some(is_new) = patch.is_new {
            sub.is_new = is_new;
        }
        if let Some(sort_order) = patch.sort_order {
            sub.sort_order = sort_order;
        }
        Ok(())
    }

    pub fn remove_sub_task(&mut self, sub_task_id: &str) -> Result<SubTask, SessionError> {
        let pos = self
            .sub_tasks
            .iter()
            .position(|s| s.id == sub_task_id)
            .ok_or_else(|| SessionError::NotFound(format!("sub-task {sub_task_id}")))?;
        Ok(self.sub_tasks.remove(pos))
    }

    /// Add a blank objective, optionally linked to an existing item.
    /// Snapshots may contain dangling links, but new ones must resolve.
    pub fn add_objective(
        &mut self,
        linked_task_id: Option<String>,
    ) -> Result<Objective, SessionError> {
        if let Some(link) = &linked_task_id {
            if self.triage_item(link).is_none() {
                return Err(SessionError::NotFound(format!("triage item {link}")));
            }
        }
        let obj = Objective::blank(temp_id(), linked_task_id, self.next_objective_sort());
        self.objectives.push(obj.clone());
        Ok(obj)
    }

    pub fn apply_objective_patch(
        &mut self,
        objective_id: &str,
        patch: &ObjectivePatch,
    ) -> Result<(), SessionError> {
        let obj = self
            .objectives
            .iter_mut()
            .find(|o| o.id == objective_id)
            .ok_or_else(|| SessionError::NotFound(format!("objective {objective_id}")))?;
        if let Some(audience) = &patch.audience {
            obj.audience = audience.clone();
        }
        if let Some(behavior) = &patch.behavior {
            obj.behavior = behavior.clone();
        }
        if let Some(verb) = &patch.verb {
            obj.verb = verb.clone();
        }
        if let Some(condition) = &patch.condition {
            obj.condition = condition.clone();
        }
        if let Some(criteria) = &patch.criteria {
            obj.criteria = criteria.clone();
        }
        if let Some(bloom_level) = patch.bloom_level {
            obj.bloom_level = bloom_level;
        }
        if let Some(bloom_knowledge) = patch.bloom_knowledge {
            obj.bloom_knowledge = bloom_knowledge;
        }
        if let Some(priority) = patch.priority {
            obj.priority = priority;
        }
        if let Some(freeform_text) = &patch.freeform_text {
            obj.freeform_text = freeform_text.clone();
        }
        if let Some(requires_assessment) = patch.requires_assessment {
            obj.requires_assessment = requires_assessment;
        }
        if let Some(wiifm) = &patch.wiifm {
            obj.wiifm = wiifm.clone();
        }
        if let Some(rationale) = &patch.rationale {
            obj.rationale = rationale.clone();
        }
        if let Some(linked_task_id) = &patch.linked_task_id {
            obj.linked_task_id = linked_task_id.clone();
        }
        if let Some(sort_order) = patch.sort_order {
            obj.sort_order = sort_order;
        }
        Ok(())
    }

    pub fn remove_objective(&mut self, objective_id: &str) -> Result<Objective, SessionError> {
        let pos = self
            .objectives
            .iter()
            .position(|o| o.id == objective_id)
            .ok_or_else(|| SessionError::NotFound(format!("objective {objective_id}")))?;
        Ok(self.objectives.remove(pos))
    }

    /// Swap a confirmed create's temp id for the server one, in place,
    /// and rewrite every reference that pointed at the temp id.
    pub fn confirm_id(
        &mut self,
        kind: EntityKind,
        temp_id: &str,
        server_id: &str,
    ) -> Result<(), SessionError> {
        match kind {
            EntityKind::TriageItem => {
                let item = self
                    .triage_items
                    .iter_mut()
                    .find(|i| i.id == temp_id)
                    .ok_or_else(|| SessionError::NotFound(format!("triage item {temp_id}")))?;
                item.id = server_id.to_string();
                for sub in &mut self.sub_tasks {
                    if sub.parent_item_id == temp_id {
                        sub.parent_item_id = server_id.to_string();
                    }
                }
                for obj in &mut self.objectives {
                    if obj.linked_task_id.as_deref() == Some(temp_id) {
                        obj.linked_task_id = Some(server_id.to_string());
                    }
                }
            }
            EntityKind::SubTask => {
                let sub = self
                    .sub_tasks
                    .iter_mut()
                    .find(|s| s.id == temp_id)
                    .ok_or_else(|| SessionError::NotFound(format!("sub-task {temp_id}")))?;
                sub.id = server_id.to_string();
            }
            EntityKind::Objective => {
                let obj = self
                    .objectives
                    .iter_mut()
                    .find(|o| o.id == temp_id)
                    .ok_or_else(|| SessionError::NotFound(format!("objective {temp_id}")))?;
                obj.id = server_id.to_string();
            }
        }
        Ok(())
    }
}
