//! courseapi: typed client for the course-wizard REST backend.
//!
//! The crate has four layers:
//!
//! - `model`: the entities a wizard document is made of, with the
//!   backend's wire encoding (camelCase keys, empty-string optionals)
//! - `payloads`: create bodies and mergeable partial-update patches
//! - `client`: the async [`CourseApiClient`] plus [`WriteOp`], the
//!   self-contained representation of a fire-and-forget write
//! - `beacon`: blocking best-effort delivery for process teardown
//!
//! Consumers own all policy (debouncing, retries, reconciliation);
//! this crate only knows how to speak the protocol.

pub mod beacon;
pub mod client;
pub mod error;
pub mod model;
pub mod payloads;
pub(crate) mod wire;

pub use client::{CourseApiClient, WriteMethod, WriteOp};
pub use error::ApiError;
pub use model::{
    BloomLevel, CourseSnapshot, GapClassification, KnowledgeDimension, NaEntry, NaSection,
    NaSummary, Objective, ObjectivePriority, SubTask, SubTaskNovelty, TriageColumn, TriageItem,
    TriageSource,
};
pub use payloads::{
    CreatedId, GapPayload, ObjectiveCreate, ObjectivePatch, SubTaskCreate, SubTaskPatch,
    TriageItemCreate, TriageItemPatch,
};
