//! Editing session for one course.
//!
//! A session owns the course state and every network write against it.
//! Edits apply locally first and are pushed to the backend on debounced
//! per-entity timers; creates are optimistic, living under a temp id
//! until the server-issued one arrives and is swapped in everywhere.

mod engine;
mod handle;
mod id;
mod messages;
mod state;

pub use handle::SessionHandle;
pub use id::{TEMP_ID_PREFIX, is_temp_id, temp_id};
pub use messages::{EntityKind, SessionError, SessionEvent, SessionResponse};
pub use state::SessionState;
