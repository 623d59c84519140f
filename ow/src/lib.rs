//! Objective Wizard - ABCD learning-objective authoring for courses
//!
//! The wizard walks a course's triage board from raw task statements to
//! composed learning objectives. Edits land in a local working copy
//! immediately and reach the backend through per-entity debounce timers,
//! so the editing surfaces never wait on the network.
//!
//! # Core Concepts
//!
//! - **Optimistic Edits**: Every change applies to local state first
//! - **Debounced Autosave**: One PATCH per entity per quiet period
//! - **Composed Sentences**: Objectives render from ABCD parts with fallbacks
//! - **Traceability**: Active triage items are checked for objective coverage
//!
//! # Modules
//!
//! - [`session`] - Editing session with optimistic state and autosave
//! - [`compose`] - Step derivation and objective sentence assembly
//! - [`trace`] - Coverage reporting and export
//! - [`config`] - Configuration types and loading
//! - [`cli`] - Command-line interface
//! - [`repl`] - Interactive wizard

pub mod cli;
pub mod compose;
pub mod config;
pub mod repl;
pub mod session;
pub mod trace;

// Re-export commonly used types
pub use compose::{StepKey, StepStatus, compose_objective_text, derive_step_status};
pub use config::{ApiConfig, AutosaveConfig, Config, DefaultsConfig};
pub use repl::WizardRepl;
pub use session::{
    EntityKind, SessionError, SessionEvent, SessionHandle, SessionState, is_temp_id,
};
pub use trace::{
    ExportGroup, ExportedObjective, ValidationReport, build_export, build_report, render_markdown,
};
