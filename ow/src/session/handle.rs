//! Caller-facing handle for the session engine.

use courseapi::client::CourseApiClient;
use courseapi::payloads::{ObjectivePatch, SubTaskPatch, TriageItemPatch};
use tokio::sync::{broadcast, mpsc, oneshot};
use tracing::debug;

use super::engine::SessionEngine;
use super::messages::{SessionCommand, SessionError, SessionEvent};
use super::state::SessionState;
use crate::config::AutosaveConfig;

const COMMAND_BUFFER: usize = 256;
const EVENT_BUFFER: usize = 64;

/// Cheap-to-clone handle to a running session. All reads and edits go
/// through the engine task, so callers never race each other.
#[derive(Clone)]
pub struct SessionHandle {
    tx: mpsc::Sender<SessionCommand>,
    event_tx: broadcast::Sender<SessionEvent>,
}

impl SessionHandle {
    /// Spawn the engine for a loaded course and return its handle.
    pub fn spawn(state: SessionState, client: CourseApiClient, autosave: AutosaveConfig) -> Self {
        let (tx, rx) = mpsc::channel(COMMAND_BUFFER);
        let (event_tx, _) = broadcast::channel(EVENT_BUFFER);
        let engine = SessionEngine::new(state, client, autosave, rx, tx.clone(), event_tx.clone());
        tokio::spawn(engine.run());
        Self { tx, event_tx }
    }

    /// Subscribe to session events (create confirmations, flushes).
    pub fn subscribe_events(&self) -> broadcast::Receiver<SessionEvent> {
        self.event_tx.subscribe()
    }

    /// Copy of the current course state.
    pub async fn snapshot(&self) -> Result<SessionState, SessionError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(SessionCommand::Snapshot { reply: reply_tx })
            .await
            .map_err(|_| SessionError::ChannelError)?;
        reply_rx.await.map_err(|_| SessionError::ChannelError)
    }

    pub async fn set_gap(&self, knowledge: bool, skill: bool) -> Result<(), SessionError> {
        debug!(knowledge, skill, "set_gap");
        self.tx
            .send(SessionCommand::SetGap { knowledge, skill })
            .await
            .map_err(|_| SessionError::ChannelError)
    }

    /// Add a custom triage item; returns its id, which stays temporary
    /// until the server confirms the create.
    pub async fn add_triage_item(&self, text: impl Into<String>) -> Result<String, SessionError> {
        let text = text.into();
        debug!(%text, "add_triage_item");
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(SessionCommand::AddTriageItem {
                text,
                reply: reply_tx,
            })
            .await
            .map_err(|_| SessionError::ChannelError)?;
        reply_rx.await.map_err(|_| SessionError::ChannelError)?
    }

    pub async fn update_triage_item(
        &self,
        item_id: impl Into<String>,
        patch: TriageItemPatch,
    ) -> Result<(), SessionError> {
        let item_id = item_id.into();
        debug!(%item_id, "update_triage_item");
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(SessionCommand::UpdateTriageItem {
                item_id,
                patch,
                reply: reply_tx,
            })
            .await
            .map_err(|_| SessionError::ChannelError)?;
        reply_rx.await.map_err(|_| SessionError::ChannelError)?
    }

    pub async fn remove_triage_item(
        &self,
        item_id: impl Into<String>,
    ) -> Result<(), SessionError> {
        let item_id = item_id.into();
        debug!(%item_id, "remove_triage_item");
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(SessionCommand::RemoveTriageItem {
                item_id,
                reply: reply_tx,
            })
            .await
            .map_err(|_| SessionError::ChannelError)?;
        reply_rx.await.map_err(|_| SessionError::ChannelError)?
    }

    pub async fn add_sub_task(
        &self,
        parent_item_id: impl Into<String>,
        text: impl Into<String>,
    ) -> Result<String, SessionError> {
        let parent_item_id = parent_item_id.into();
        let text = text.into();
        debug!(%parent_item_id, %text, "add_sub_task");
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(SessionCommand::AddSubTask {
                parent_item_id,
                text,
                reply: reply_tx,
            })
            .await
            .map_err(|_| SessionError::ChannelError)?;
        reply_rx.await.map_err(|_| SessionError::ChannelError)?
    }

    pub async fn update_sub_task(
        &self,
        sub_task_id: impl Into<String>,
        patch: SubTaskPatch,
    ) -> Result<(), SessionError> {
        let sub_task_id = sub_task_id.into();
        debug!(%sub_task_id, "update_sub_task");
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(SessionCommand::UpdateSubTask {
                sub_task_id,
                patch,
                reply: reply_tx,
            })
            .await
            .map_err(|_| SessionError::ChannelError)?;
        reply_rx.await.map_err(|_| SessionError::ChannelError)?
    }

    pub async fn remove_sub_task(
        &self,
        sub_task_id: impl Into<String>,
    ) -> Result<(), SessionError> {
        let sub_task_id = sub_task_id.into();
        debug!(%sub_task_id, "remove_sub_task");
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(SessionCommand::RemoveSubTask {
                sub_task_id,
                reply: reply_tx,
            })
            .await
            .map_err(|_| SessionError::ChannelError)?;
        reply_rx.await.map_err(|_| SessionError::ChannelError)?
    }

    /// Add a blank objective, optionally linked to a triage item.
    pub async fn add_objective(
        &self,
        linked_task_id: Option<String>,
    ) -> Result<String, SessionError> {
        debug!(linked = linked_task_id.as_deref().unwrap_or("-"), "add_objective");
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(SessionCommand::AddObjective {
                linked_task_id,
                reply: reply_tx,
            })
            .await
            .map_err(|_| SessionError::ChannelError)?;
        reply_rx.await.map_err(|_| SessionError::ChannelError)?
    }

    pub async fn update_objective(
        &self,
        objective_id: impl Into<String>,
        patch: ObjectivePatch,
    ) -> Result<(), SessionError> {
        let objective_id = objective_id.into();
        debug!(%objective_id, "update_objective");
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(SessionCommand::UpdateObjective {
                objective_id,
                patch,
                reply: reply_tx,
            })
            .await
            .map_err(|_| SessionError::ChannelError)?;
        reply_rx.await.map_err(|_| SessionError::ChannelError)?
    }

    pub async fn remove_objective(
        &self,
        objective_id: impl Into<String>,
    ) -> Result<(), SessionError> {
        let objective_id = objective_id.into();
        debug!(%objective_id, "remove_objective");
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(SessionCommand::RemoveObjective {
                objective_id,
                reply: reply_tx,
            })
            .await
            .map_err(|_| SessionError::ChannelError)?;
        reply_rx.await.map_err(|_| SessionError::ChannelError)?
    }

    /// Create one blank objective per uncovered active item; returns the
    /// ids of the objectives created.
    pub async fn seed_uncovered(&self) -> Result<Vec<String>, SessionError> {
        debug!("seed_uncovered");
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(SessionCommand::SeedUncovered { reply: reply_tx })
            .await
            .map_err(|_| SessionError::ChannelError)?;
        reply_rx.await.map_err(|_| SessionError::ChannelError)?
    }

    /// Deliver every debounced write now and wait for the sends.
    pub async fn flush(&self) -> Result<(), SessionError> {
        debug!("flush");
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(SessionCommand::Flush { reply: reply_tx })
            .await
            .map_err(|_| SessionError::ChannelError)?;
        reply_rx.await.map_err(|_| SessionError::ChannelError)
    }

    /// Flush best-effort and stop the engine.
    pub async fn shutdown(&self) -> Result<(), SessionError> {
        debug!("shutdown");
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(SessionCommand::Shutdown { reply: reply_tx })
            .await
            .map_err(|_| SessionError::ChannelError)?;
        reply_rx.await.map_err(|_| SessionError::ChannelError)
    }
}
