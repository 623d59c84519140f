//! Entity model shared between the API client and its consumers.

mod gap;
mod na;
mod objective;
mod snapshot;
mod subtask;
mod triage;

pub use gap::GapClassification;
pub use na::{NaEntry, NaSection, NaSummary};
pub use objective::{BloomLevel, KnowledgeDimension, Objective, ObjectivePriority};
pub use snapshot::CourseSnapshot;
pub use subtask::{SubTask, SubTaskNovelty};
pub use triage::{TriageColumn, TriageItem, TriageSource};
