//! Cross-entity aggregates: linkage, distributions, and export grouping.

mod export;
mod report;

pub use export::{ExportGroup, ExportedObjective, UNGROUPED_LABEL, build_export, render_markdown};
pub use report::{
    AssessmentAlignment, BloomDistribution, LinkageRow, PriorityDistribution, ValidationReport,
    active_items, build_report, uncovered_items,
};
