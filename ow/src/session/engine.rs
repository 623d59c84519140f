//! The session engine: a single task that owns the course state.
//!
//! Every edit is applied to local state immediately, then a network
//! write is scheduled. Field updates are debounced per entity and
//! coalesced into one PATCH; creates go out right away because the
//! server-issued id gates every later write to that entity. An entity
//! whose create is still in flight accumulates edits in a dirty patch
//! that is scheduled once the real id arrives.

use std::collections::HashMap;
use std::time::Duration;

use courseapi::beacon::{self, BeaconRequest};
use courseapi::client::{CourseApiClient, WriteOp};
use courseapi::payloads::{
    GapPayload, ObjectiveCreate, ObjectivePatch, SubTaskCreate, SubTaskPatch, TriageItemCreate,
    TriageItemPatch,
};
use tokio::sync::{broadcast, mpsc};
use tokio::time::{self, Instant};
use tracing::{debug, info, warn};

use super::id::is_temp_id;
use super::messages::{EntityKind, SessionCommand, SessionError, SessionEvent};
use super::state::SessionState;
use crate::config::AutosaveConfig;
use crate::trace;

/// How long the engine sleeps when nothing is scheduled.
const IDLE_TICK: Duration = Duration::from_secs(60);

/// One debounce slot per entity (the gap pair shares a single slot).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum WriteKey {
    Gap,
    TriageItem(String),
    SubTask(String),
    Objective(String),
}

/// The coalesced write waiting behind a debounce timer.
#[derive(Debug)]
enum PendingWrite {
    Gap(GapPayload),
    TriageItem {
        item_id: String,
        patch: TriageItemPatch,
    },
    SubTask {
        task_id: String,
        sub_task_id: String,
        patch: SubTaskPatch,
    },
    Objective {
        objective_id: String,
        patch: ObjectivePatch,
    },
}

impl PendingWrite {
    fn merge(&mut self, newer: PendingWrite) {
        match (self, newer) {
            (PendingWrite::Gap(cur), PendingWrite::Gap(new)) => *cur = new,
            (
                PendingWrite::TriageItem { patch: cur, .. },
                PendingWrite::TriageItem { patch, .. },
            ) => cur.merge(patch),
            (PendingWrite::SubTask { patch: cur, .. }, PendingWrite::SubTask { patch, .. }) => {
                cur.merge(patch)
            }
            (
                PendingWrite::Objective { patch: cur, .. },
                PendingWrite::Objective { patch, .. },
            ) => cur.merge(patch),
            // the key shape guarantees matching variants
            (_, _) => {}
        }
    }
}

#[derive(Debug)]
struct PendingEntry {
    write: PendingWrite,
    due: Instant,
}

/// Edits accumulated against an entity whose create has not settled.
#[derive(Debug)]
enum DirtyPatch {
    TriageItem(TriageItemPatch),
    SubTask(SubTaskPatch),
    Objective(ObjectivePatch),
}

/// Bookkeeping for one optimistic create, keyed by temp id.
#[derive(Debug)]
struct InflightCreate {
    kind: EntityKind,
    /// Server id of the parent item, for sub-task request paths.
    parent_item_id: Option<String>,
    dirty: Option<DirtyPatch>,
    /// Deleted locally before the create settled; on success the server
    /// copy gets a compensating delete instead of reconciliation.
    deleted: bool,
}

impl InflightCreate {
    fn absorb_item(&mut self, patch: TriageItemPatch) {
        if let Some(DirtyPatch::TriageItem(cur)) = &mut self.dirty {
            cur.merge(patch);
        } else {
            self.dirty = Some(DirtyPatch::TriageItem(patch));
        }
    }

    fn absorb_sub_task(&mut self, patch: SubTaskPatch) {
        if let Some(DirtyPatch::SubTask(cur)) = &mut self.dirty {
            cur.merge(patch);
        } else {
            self.dirty = Some(DirtyPatch::SubTask(patch));
        }
    }

    fn absorb_objective(&mut self, patch: ObjectivePatch) {
        if let Some(DirtyPatch::Objective(cur)) = &mut self.dirty {
            cur.merge(patch);
        } else {
            self.dirty = Some(DirtyPatch::Objective(patch));
        }
    }
}

/// Body of a create request, dispatched off the engine task.
enum CreateBody {
    TriageItem(TriageItemCreate),
    SubTask { task_id: String, body: SubTaskCreate },
    Objective(ObjectiveCreate),
}

pub struct SessionEngine {
    state: SessionState,
    client: CourseApiClient,
    autosave: AutosaveConfig,
    rx: mpsc::Receiver<SessionCommand>,
    /// Clone of the command sender, used by create tasks to report back.
    self_tx: mpsc::Sender<SessionCommand>,
    event_tx: broadcast::Sender<SessionEvent>,
    pending: HashMap<WriteKey, PendingEntry>,
    inflight: HashMap<String, InflightCreate>,
}

impl SessionEngine {
    pub(crate) fn new(
        state: SessionState,
        client: CourseApiClient,
        autosave: AutosaveConfig,
        rx: mpsc::Receiver<SessionCommand>,
        self_tx: mpsc::Sender<SessionCommand>,
        event_tx: broadcast::Sender<SessionEvent>,
    ) -> Self {
        Self {
            state,
            client,
            autosave,
            rx,
            self_tx,
            event_tx,
            pending: HashMap::new(),
            inflight: HashMap::new(),
        }
    }

    pub async fn run(mut self) {
        debug!(course_id = %self.state.course_id, "session engine started");
        loop {
            let deadline = self
                .pending
                .values()
                .map(|entry| entry.due)
                .min()
                .unwrap_or_else(|| Instant::now() + IDLE_TICK);
            tokio::select! {
                cmd = self.rx.recv() => match cmd {
                    Some(SessionCommand::Shutdown { reply }) => {
                        self.teardown().await;
                        let _ = reply.send(());
                        break;
                    }
                    Some(cmd) => self.handle_command(cmd).await,
                    None => {
                        self.teardown().await;
                        break;
                    }
                },
                _ = time::sleep_until(deadline) => self.flush_due(),
            }
        }
        debug!("session engine stopped");
    }

    async fn handle_command(&mut self, cmd: SessionCommand) {
        match cmd {
            SessionCommand::Snapshot { reply } => {
                let _ = reply.send(self.state.clone());
            }

            SessionCommand::SetGap { knowledge, skill } => {
                self.state.set_gap(knowledge, skill);
                let payload = GapPayload {
                    gap_knowledge: knowledge,
                    gap_skill: skill,
                };
                self.queue(WriteKey::Gap, PendingWrite::Gap(payload));
            }

            SessionCommand::AddTriageItem { text, reply } => {
                let item = self.state.add_triage_item(&text);
                let body = TriageItemCreate {
                    text: item.text.clone(),
                    column: item.column,
                    source: item.source,
                    sort_order: item.sort_order,
                };
                self.start_create(
                    item.id.clone(),
                    EntityKind::TriageItem,
                    None,
                    CreateBody::TriageItem(body),
                );
                let _ = reply.send(Ok(item.id));
            }

            SessionCommand::UpdateTriageItem {
                item_id,
                patch,
                reply,
            } => match self.state.apply_triage_patch(&item_id, &patch) {
                Ok(()) => {
                    if let Some(infl) = self.inflight.get_mut(&item_id) {
                        infl.absorb_item(patch);
                    } else {
                        self.queue(
                            WriteKey::TriageItem(item_id.clone()),
                            PendingWrite::TriageItem { item_id, patch },
                        );
                    }
                    let _ = reply.send(Ok(()));
                }
                Err(e) => {
                    let _ = reply.send(Err(e));
                }
            },

            SessionCommand::RemoveTriageItem { item_id, reply } => {
                match self.state.remove_triage_item(&item_id) {
                    Ok((_, children)) => {
                        self.pending.remove(&WriteKey::TriageItem(item_id.clone()));
                        for child in &children {
                            self.pending.remove(&WriteKey::SubTask(child.id.clone()));
                        }
                        if let Some(infl) = self.inflight.get_mut(&item_id) {
                            // the settle handler issues the delete once
                            // the server id is known
                            infl.deleted = true;
                        } else {
                            // the server cascades the breakdown
                            self.dispatch(WriteOp::TriageItemDelete {
                                course_id: self.state.course_id.clone(),
                                item_id,
                            });
                        }
                        let _ = reply.send(Ok(()));
                    }
                    Err(e) => {
                        let _ = reply.send(Err(e));
                    }
                }
            }

            SessionCommand::AddSubTask {
                parent_item_id,
                text,
                reply,
            } => {
                if is_temp_id(&parent_item_id) {
                    let _ = reply.send(Err(SessionError::NotEditable(
                        "parent item is still being saved; retry in a moment".into(),
                    )));
                    return;
                }
                match self.state.add_sub_task(&parent_item_id, &text) {
                    Ok(sub) => {
                        let body = SubTaskCreate {
                            text: sub.text.clone(),
                            is_new: sub.is_new,
                            sort_order: sub.sort_order,
                        };
                        self.start_create(
                            sub.id.clone(),
                            EntityKind::SubTask,
                            Some(parent_item_id.clone()),
                            CreateBody::SubTask {
                                task_id: parent_item_id,
                                body,
                            },
                        );
                        let _ = reply.send(Ok(sub.id));
                    }
                    Err(e) => {
                        let _ = reply.send(Err(e));
                    }
                }
            }

            SessionCommand::UpdateSubTask {
                sub_task_id,
                patch,
                reply,
            } => match self.state.apply_sub_task_patch(&sub_task_id, &patch) {
                Ok(()) => {
                    if let Some(infl) = self.inflight.get_mut(&sub_task_id) {
                        infl.absorb_sub_task(patch);
                    } else {
                        let task_id = self
                            .state
                            .sub_task(&sub_task_id)
                            .map(|s| s.parent_item_id.clone())
                            .unwrap_or_default();
                        self.queue(
                            WriteKey::SubTask(sub_task_id.clone()),
                            PendingWrite::SubTask {
                                task_id,
                                sub_task_id,
                                patch,
                            },
                        );
                    }
                    let _ = reply.send(Ok(()));
                }
                Err(e) => {
                    let _ = reply.send(Err(e));
                }
            },

            SessionCommand::RemoveSubTask { sub_task_id, reply } => {
                match self.state.remove_sub_task(&sub_task_id) {
                    Ok(sub) => {
                        self.pending.remove(&WriteKey::SubTask(sub_task_id.clone()));
                        if let Some(infl) = self.inflight.get_mut(&sub_task_id) {
                            infl.deleted = true;
                        } else {
                            self.dispatch(WriteOp::SubTaskDelete {
                                course_id: self.state.course_id.clone(),
                                task_id: sub.parent_item_id,
                                sub_task_id,
                            });
                        }
                        let _ = reply.send(Ok(()));
                    }
                    Err(e) => {
                        let _ = reply.send(Err(e));
                    }
                }
            }

            SessionCommand::AddObjective {
                linked_task_id,
                reply,
            } => {
                if let Some(link) = &linked_task_id {
                    if is_temp_id(link) {
                        let _ = reply.send(Err(SessionError::NotEditable(
                            "linked item is still being saved; retry in a moment".into(),
                        )));
                        return;
                    }
                }
                let result = self.start_objective(linked_task_id);
                let _ = reply.send(result);
            }

            SessionCommand::UpdateObjective {
                objective_id,
                patch,
                reply,
            } => {
                if let Some(Some(link)) = &patch.linked_task_id {
                    if is_temp_id(link) {
                        let _ = reply.send(Err(SessionError::NotEditable(
                            "linked item is still being saved; retry in a moment".into(),
                        )));
                        return;
                    }
                }
                match self.state.apply_objective_patch(&objective_id, &patch) {
                    Ok(()) => {
                        if let Some(infl) = self.inflight.get_mut(&objective_id) {
                            infl.absorb_objective(patch);
                        } else {
                            self.queue(
                                WriteKey::Objective(objective_id.clone()),
                                PendingWrite::Objective {
                                    objective_id,
                                    patch,
                                },
                            );
                        }
                        let _ = reply.send(Ok(()));
                    }
                    Err(e) => {
                        let _ = reply.send(Err(e));
                    }
                }
            }

            SessionCommand::RemoveObjective {
                objective_id,
                reply,
            } => match self.state.remove_objective(&objective_id) {
                Ok(_) => {
                    self.pending.remove(&WriteKey::Objective(objective_id.clone()));
                    if let Some(infl) = self.inflight.get_mut(&objective_id) {
                        infl.deleted = true;
                    } else {
                        self.dispatch(WriteOp::ObjectiveDelete {
                            course_id: self.state.course_id.clone(),
                            objective_id,
                        });
                    }
                    let _ = reply.send(Ok(()));
                }
                Err(e) => {
                    let _ = reply.send(Err(e));
                }
            },

            SessionCommand::SeedUncovered { reply } => {
                let uncovered: Vec<String> =
                    trace::uncovered_items(&self.state.triage_items, &self.state.objectives)
                        .into_iter()
                        .filter(|item| !is_temp_id(&item.id))
                        .map(|item| item.id.clone())
                        .collect();
                let mut created = Vec::with_capacity(uncovered.len());
                for item_id in uncovered {
                    match self.start_objective(Some(item_id)) {
                        Ok(id) => created.push(id),
                        Err(e) => warn!(error = %e, "seed skipped an item"),
                    }
                }
                let _ = reply.send(Ok(created));
            }

            SessionCommand::Flush { reply } => {
                self.flush_all().await;
                let _ = reply.send(());
            }

            SessionCommand::CreateSettled { temp_id, result } => {
                self.settle_create(temp_id, result);
            }

            // handled in the run loop
            SessionCommand::Shutdown { reply } => {
                let _ = reply.send(());
            }
        }
    }

    /// Record an in-flight create and dispatch the POST.
    fn start_create(
        &mut self,
        temp_id: String,
        kind: EntityKind,
        parent_item_id: Option<String>,
        body: CreateBody,
    ) {
        debug!(%kind, %temp_id, "create dispatched");
        self.inflight.insert(
            temp_id.clone(),
            InflightCreate {
                kind,
                parent_item_id,
                dirty: None,
                deleted: false,
            },
        );
        let client = self.client.clone();
        let course_id = self.state.course_id.clone();
        let tx = self.self_tx.clone();
        tokio::spawn(async move {
            let result = match body {
                CreateBody::TriageItem(body) => client.create_triage_item(&course_id, &body).await,
                CreateBody::SubTask { task_id, body } => {
                    client.create_sub_task(&course_id, &task_id, &body).await
                }
                CreateBody::Objective(body) => client.create_objective(&course_id, &body).await,
            };
            let result = result.map_err(|e| e.to_string());
            let _ = tx.send(SessionCommand::CreateSettled { temp_id, result }).await;
        });
    }

    fn start_objective(
        &mut self,
        linked_task_id: Option<String>,
    ) -> Result<String, SessionError> {
        let obj = self.state.add_objective(linked_task_id)?;
        let body = ObjectiveCreate {
            priority: obj.priority,
            linked_task_id: obj.linked_task_id.clone(),
            sort_order: obj.sort_order,
            ..Default::default()
        };
        self.start_create(
            obj.id.clone(),
            EntityKind::Objective,
            None,
            CreateBody::Objective(body),
        );
        Ok(obj.id)
    }

    fn settle_create(&mut self, temp_id: String, result: Result<String, String>) {
        let Some(infl) = self.inflight.remove(&temp_id) else {
            warn!(%temp_id, "settled create has no in-flight record");
            return;
        };
        match result {
            Ok(server_id) => {
                if infl.deleted {
                    debug!(
                        kind = %infl.kind,
                        %temp_id,
                        %server_id,
                        "entity deleted while create was in flight; removing server copy"
                    );
                    let op = self.delete_op(infl.kind, &infl.parent_item_id, server_id);
                    self.dispatch(op);
                    return;
                }
                if let Err(e) = self.state.confirm_id(infl.kind, &temp_id, &server_id) {
                    warn!(error = %e, "could not reconcile confirmed create");
                    return;
                }
                debug!(kind = %infl.kind, %temp_id, %server_id, "create confirmed");
                if let Some(dirty) = infl.dirty {
                    self.queue_dirty(infl.parent_item_id, server_id.clone(), dirty);
                }
                let _ = self.event_tx.send(SessionEvent::CreateConfirmed {
                    kind: infl.kind,
                    temp_id,
                    id: server_id,
                });
            }
            Err(message) => {
                warn!(kind = %infl.kind, %temp_id, error = %message, "create rejected");
                if infl.deleted {
                    return;
                }
                let rolled_back = match infl.kind {
                    EntityKind::TriageItem => {
                        self.state.remove_triage_item(&temp_id).map(|_| ())
                    }
                    EntityKind::SubTask => self.state.remove_sub_task(&temp_id).map(|_| ()),
                    EntityKind::Objective => self.state.remove_objective(&temp_id).map(|_| ()),
                };
                if let Err(e) = rolled_back {
                    warn!(error = %e, "rollback after rejected create failed");
                }
                let _ = self.event_tx.send(SessionEvent::CreateRejected {
                    kind: infl.kind,
                    temp_id,
                });
            }
        }
    }

    /// Queue edits that accumulated while a create was in flight, now
    /// addressed by the server id.
    fn queue_dirty(&mut self, parent_item_id: Option<String>, id: String, dirty: DirtyPatch) {
        match dirty {
            DirtyPatch::TriageItem(patch) => self.queue(
                WriteKey::TriageItem(id.clone()),
                PendingWrite::TriageItem { item_id: id, patch },
            ),
            DirtyPatch::SubTask(patch) => {
                let Some(task_id) = parent_item_id else {
                    warn!(sub_task_id = %id, "dirty sub-task has no parent recorded");
                    return;
                };
                self.queue(
                    WriteKey::SubTask(id.clone()),
                    PendingWrite::SubTask {
                        task_id,
                        sub_task_id: id,
                        patch,
                    },
                );
            }
            DirtyPatch::Objective(patch) => self.queue(
                WriteKey::Objective(id.clone()),
                PendingWrite::Objective {
                    objective_id: id,
                    patch,
                },
            ),
        }
    }

    fn delete_op(
        &self,
        kind: EntityKind,
        parent_item_id: &Option<String>,
        id: String,
    ) -> WriteOp {
        let course_id = self.state.course_id.clone();
        match kind {
            EntityKind::TriageItem => WriteOp::TriageItemDelete {
                course_id,
                item_id: id,
            },
            EntityKind::SubTask => WriteOp::SubTaskDelete {
                course_id,
                task_id: parent_item_id.clone().unwrap_or_default(),
                sub_task_id: id,
            },
            EntityKind::Objective => WriteOp::ObjectiveDelete {
                course_id,
                objective_id: id,
            },
        }
    }

    /// Insert or refresh a debounce slot. Every edit pushes the entity's
    /// deadline back out to a full debounce window.
    fn queue(&mut self, key: WriteKey, write: PendingWrite) {
        let due = Instant::now() + self.autosave.debounce();
        match self.pending.get_mut(&key) {
            Some(entry) => {
                entry.write.merge(write);
                entry.due = due;
            }
            None => {
                self.pending.insert(key, PendingEntry { write, due });
            }
        }
    }

    fn flush_due(&mut self) {
        let now = Instant::now();
        let due: Vec<WriteKey> = self
            .pending
            .iter()
            .filter(|(_, entry)| entry.due <= now)
            .map(|(key, _)| key.clone())
            .collect();
        for key in due {
            if let Some(entry) = self.pending.remove(&key) {
                let op = self.to_op(entry.write);
                self.dispatch(op);
            }
        }
    }

    /// Fire a write without blocking the engine loop.
    fn dispatch(&self, op: WriteOp) {
        let client = self.client.clone();
        let events = self.event_tx.clone();
        tokio::spawn(async move {
            let label = op.describe();
            match client.execute(&op).await {
                Ok(()) => {
                    debug!(op = %label, "autosave write delivered");
                    let _ = events.send(SessionEvent::WriteFlushed { description: label });
                }
                Err(e) if e.is_transient() => {
                    warn!(op = %label, error = %e, "autosave write failed (transient)")
                }
                Err(e) => warn!(op = %label, error = %e, "autosave write rejected"),
            }
        });
    }

    /// Send everything pending now and wait for the responses, bounded
    /// by the per-request timeout so a caller is never stuck.
    async fn flush_all(&mut self) {
        if self.pending.is_empty() {
            return;
        }
        let writes: Vec<PendingWrite> = self
            .pending
            .drain()
            .map(|(_, entry)| entry.write)
            .collect();
        let ops: Vec<WriteOp> = writes.into_iter().map(|w| self.to_op(w)).collect();
        info!(count = ops.len(), "flushing pending writes");
        let timeout = self.autosave.request_timeout();
        let client = self.client.clone();
        let sends = ops.into_iter().map(|op| {
            let client = client.clone();
            async move {
                let label = op.describe();
                match time::timeout(timeout, client.execute(&op)).await {
                    Ok(Ok(())) => debug!(op = %label, "flushed"),
                    Ok(Err(e)) => warn!(op = %label, error = %e, "flush write failed"),
                    Err(_) => warn!(op = %label, "flush write timed out"),
                }
            }
        });
        futures::future::join_all(sends).await;
    }

    /// Last-gasp flush on shutdown. Uses the blocking beacon path so the
    /// writes survive the runtime winding down.
    async fn teardown(&mut self) {
        if !self.inflight.is_empty() {
            debug!(count = self.inflight.len(), "abandoning in-flight creates");
        }
        if self.pending.is_empty() {
            return;
        }
        let writes: Vec<PendingWrite> = self
            .pending
            .drain()
            .map(|(_, entry)| entry.write)
            .collect();
        let ops: Vec<WriteOp> = writes.into_iter().map(|w| self.to_op(w)).collect();
        let mut requests = Vec::with_capacity(ops.len());
        for op in &ops {
            match BeaconRequest::from_op(op, self.client.base_url()) {
                Ok(request) => requests.push(request),
                Err(e) => warn!(op = %op.describe(), error = %e, "could not encode teardown write"),
            }
        }
        info!(count = requests.len(), "sending pending writes at teardown");
        let wait = self.autosave.teardown_wait();
        if let Err(e) = tokio::task::spawn_blocking(move || beacon::send_all(requests, wait)).await
        {
            warn!(error = %e, "teardown flush task failed");
        }
    }

    fn to_op(&self, write: PendingWrite) -> WriteOp {
        let course_id = self.state.course_id.clone();
        match write {
            PendingWrite::Gap(payload) => WriteOp::Gap { course_id, payload },
            PendingWrite::TriageItem { item_id, patch } => WriteOp::TriageItem {
                course_id,
                item_id,
                patch,
            },
            PendingWrite::SubTask {
                task_id,
                sub_task_id,
                patch,
            } => WriteOp::SubTask {
                course_id,
                task_id,
                sub_task_id,
                patch,
            },
            PendingWrite::Objective {
                objective_id,
                patch,
            } => WriteOp::Objective {
                course_id,
                objective_id,
                patch,
            },
        }
    }
}
