//! Traceability and validation aggregates.
//!
//! Everything here is advisory. The report flags gaps and mismatches
//! but nothing downstream is allowed to block on any of it.

use std::collections::{BTreeMap, HashSet};
use std::fmt::Write as _;

use courseapi::model::{BloomLevel, Objective, ObjectivePriority, TriageColumn, TriageItem};
use serde::Serialize;

/// Coverage of one active triage item by objectives.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkageRow {
    pub item_id: String,
    pub text: String,
    pub column: TriageColumn,
    pub objective_count: usize,
}

/// Objective counts per Bloom level, plus the ones with no level.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BloomDistribution {
    pub counts: BTreeMap<BloomLevel, usize>,
    pub unclassified: usize,
}

/// Objective counts per priority, plus the ones with none.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PriorityDistribution {
    pub counts: BTreeMap<ObjectivePriority, usize>,
    pub unprioritized: usize,
}

/// How assessment demand lines up with cognitive demand.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentAlignment {
    pub requiring_assessment: usize,
    /// Objectives at Analyze or above with `requiresAssessment` off.
    pub high_bloom_unassessed: Vec<String>,
}

/// The full cross-entity report for the validation step.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub linkage: Vec<LinkageRow>,
    pub uncovered_item_ids: Vec<String>,
    pub orphan_objective_ids: Vec<String>,
    pub bloom: BloomDistribution,
    pub priority: PriorityDistribution,
    pub assessment: AssessmentAlignment,
    pub objective_total: usize,
    pub active_item_total: usize,
}

/// Items that participate in coverage: everything not parked in `nice`.
pub fn active_items(items: &[TriageItem]) -> Vec<&TriageItem> {
    items.iter().filter(|i| i.is_active()).collect()
}

/// Active items no objective links to, in item order.
pub fn uncovered_items<'a>(
    items: &'a [TriageItem],
    objectives: &[Objective],
) -> Vec<&'a TriageItem> {
    let covered: HashSet<&str> = objectives
        .iter()
        .filter_map(|o| o.linked_task_id.as_deref())
        .collect();
    active_items(items)
        .into_iter()
        .filter(|i| !covered.contains(i.id.as_str()))
        .collect()
}

/// Compute the whole report from the current collections.
///
/// Items in the `nice` column are invisible to every aggregate here: an
/// objective linked to one counts as an orphan, and the item itself is
/// never listed as uncovered.
pub fn build_report(items: &[TriageItem], objectives: &[Objective]) -> ValidationReport {
    let mut active = active_items(items);
    active.sort_by(|a, b| a.sort_order.cmp(&b.sort_order).then(a.id.cmp(&b.id)));
    let active_ids: HashSet<&str> = active.iter().map(|i| i.id.as_str()).collect();

    let linkage: Vec<LinkageRow> = active
        .iter()
        .map(|item| LinkageRow {
            item_id: item.id.clone(),
            text: item.text.clone(),
            column: item.column,
            objective_count: objectives
                .iter()
                .filter(|o| o.linked_task_id.as_deref() == Some(item.id.as_str()))
                .count(),
        })
        .collect();

    let uncovered_item_ids: Vec<String> = linkage
        .iter()
        .filter(|row| row.objective_count == 0)
        .map(|row| row.item_id.clone())
        .collect();

    let orphan_objective_ids: Vec<String> = objectives
        .iter()
        .filter(|o| {
            o.linked_task_id
                .as_deref()
                .map_or(true, |link| !active_ids.contains(link))
        })
        .map(|o| o.id.clone())
        .collect();

    let mut bloom_counts: BTreeMap<BloomLevel, usize> =
        BloomLevel::ALL.iter().map(|l| (*l, 0)).collect();
    let mut classified = 0usize;
    for objective in objectives {
        if let Some(level) = objective.bloom_level {
            *bloom_counts.entry(level).or_default() += 1;
            classified += 1;
        }
    }

    let mut priority_counts: BTreeMap<ObjectivePriority, usize> =
        ObjectivePriority::ALL.iter().map(|p| (*p, 0)).collect();
    let mut unprioritized = 0usize;
    for objective in objectives {
        match objective.priority {
            Some(priority) => *priority_counts.entry(priority).or_default() += 1,
            None => unprioritized += 1,
        }
    }

    let requiring_assessment = objectives.iter().filter(|o| o.requires_assessment).count();
    let high_bloom_unassessed: Vec<String> = objectives
        .iter()
        .filter(|o| o.lacks_needed_assessment())
        .map(|o| o.id.clone())
        .collect();

    ValidationReport {
        linkage,
        uncovered_item_ids,
        orphan_objective_ids,
        bloom: BloomDistribution {
            counts: bloom_counts,
            unclassified: objectives.len() - classified,
        },
        priority: PriorityDistribution {
            counts: priority_counts,
            unprioritized,
        },
        assessment: AssessmentAlignment {
            requiring_assessment,
            high_bloom_unassessed,
        },
        objective_total: objectives.len(),
        active_item_total: active.len(),
    }
}

impl ValidationReport {
    /// Plain-text rendering shared by the CLI and the REPL.
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "Validation report: {} objectives across {} active tasks",
            self.objective_total, self.active_item_total
        );

        let _ = writeln!(out, "\nTask coverage:");
        if self.linkage.is_empty() {
            let _ = writeln!(out, "  (no active tasks)");
        }
        for row in &self.linkage {
            let _ = writeln!(
                out,
                "  [{}] {} - {} objective{}",
                row.column,
                row.text,
                row.objective_count,
                if row.objective_count == 1 { "" } else { "s" }
            );
        }
        if !self.uncovered_item_ids.is_empty() {
            let _ = writeln!(
                out,
                "  uncovered: {} task{} ({})",
                self.uncovered_item_ids.len(),
                if self.uncovered_item_ids.len() == 1 { "" } else { "s" },
                self.uncovered_item_ids.join(", ")
            );
        }
        if !self.orphan_objective_ids.is_empty() {
            let _ = writeln!(
                out,
                "  orphan objectives: {} ({})",
                self.orphan_objective_ids.len(),
                self.orphan_objective_ids.join(", ")
            );
        }

        let _ = writeln!(out, "\nBloom distribution:");
        for (level, count) in &self.bloom.counts {
            let _ = writeln!(out, "  {:<12} {}", level.to_string(), count);
        }
        let _ = writeln!(out, "  {:<12} {}", "unclassified", self.bloom.unclassified);

        let _ = writeln!(out, "\nPriority distribution:");
        for (priority, count) in &self.priority.counts {
            let _ = writeln!(out, "  {:<12} {}", priority.to_string(), count);
        }
        let _ = writeln!(out, "  {:<12} {}", "none", self.priority.unprioritized);

        let _ = writeln!(
            out,
            "\nAssessment: {} of {} objectives require assessment",
            self.assessment.requiring_assessment, self.objective_total
        );
        if !self.assessment.high_bloom_unassessed.is_empty() {
            let _ = writeln!(
                out,
                "  high-Bloom without assessment: {}",
                self.assessment.high_bloom_unassessed.join(", ")
            );
        }
        out
    }
}
