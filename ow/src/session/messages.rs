//! Message types for the session actor.

use std::fmt;

use courseapi::payloads::{ObjectivePatch, SubTaskPatch, TriageItemPatch};
use thiserror::Error;
use tokio::sync::oneshot;

use super::state::SessionState;

/// Errors a session operation can report back to a caller.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Not editable: {0}")]
    NotEditable(String),

    #[error("Channel error")]
    ChannelError,
}

pub type SessionResponse<T> = Result<T, SessionError>;

/// Which kind of entity a create or event refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    TriageItem,
    SubTask,
    Objective,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::TriageItem => write!(f, "triage item"),
            EntityKind::SubTask => write!(f, "sub-task"),
            EntityKind::Objective => write!(f, "objective"),
        }
    }
}

/// Commands accepted by the session engine.
#[derive(Debug)]
pub enum SessionCommand {
    /// Request a copy of the current course state.
    Snapshot {
        reply: oneshot::Sender<SessionState>,
    },

    /// Set the gap classification. Fire-and-forget; the write is debounced.
    SetGap { knowledge: bool, skill: bool },

    AddTriageItem {
        text: String,
        reply: oneshot::Sender<SessionResponse<String>>,
    },
    UpdateTriageItem {
        item_id: String,
        patch: TriageItemPatch,
        reply: oneshot::Sender<SessionResponse<()>>,
    },
    RemoveTriageItem {
        item_id: String,
        reply: oneshot::Sender<SessionResponse<()>>,
    },

    AddSubTask {
        parent_item_id: String,
        text: String,
        reply: oneshot::Sender<SessionResponse<String>>,
    },
    UpdateSubTask {
        sub_task_id: String,
        patch: SubTaskPatch,
        reply: oneshot::Sender<SessionResponse<()>>,
    },
    RemoveSubTask {
        sub_task_id: String,
        reply: oneshot::Sender<SessionResponse<()>>,
    },

    AddObjective {
        linked_task_id: Option<String>,
        reply: oneshot::Sender<SessionResponse<String>>,
    },
    UpdateObjective {
        objective_id: String,
        patch: ObjectivePatch,
        reply: oneshot::Sender<SessionResponse<()>>,
    },
    RemoveObjective {
        objective_id: String,
        reply: oneshot::Sender<SessionResponse<()>>,
    },

    /// Create one blank objective per active triage item that has none.
    SeedUncovered {
        reply: oneshot::Sender<SessionResponse<Vec<String>>>,
    },

    /// Push every pending write now and wait for the sends to finish.
    Flush { reply: oneshot::Sender<()> },

    /// Internal: a spawned create request finished. `result` carries the
    /// server-assigned id on success, a rendered error otherwise.
    CreateSettled {
        temp_id: String,
        result: Result<String, String>,
    },

    /// Flush pending writes best-effort and stop the engine.
    Shutdown { reply: oneshot::Sender<()> },
}

/// Events broadcast by the session engine.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// A local create was confirmed; the temp id was swapped for `id`.
    CreateConfirmed {
        kind: EntityKind,
        temp_id: String,
        id: String,
    },
    /// A local create was rejected by the server and rolled back.
    CreateRejected { kind: EntityKind, temp_id: String },
    /// A debounced write was delivered.
    WriteFlushed { description: String },
}
