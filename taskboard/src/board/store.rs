//! The board store: optimistic mutations, persistence, and rollback.
//!
//! Optimistic operations change the partition synchronously, then spawn a
//! continuation that persists the change through the [`TaskApi`]. A failed
//! persistence refetches every section the operation touched and reports
//! the error; the refetched lanes replace local state wholesale.
//!
//! Continuations on the same section run in call order (see
//! [`SectionQueue`]), and behind any load still fetching that section.
//! When a continuation finds that one of its sections was refetched after
//! its optimistic apply, it re-applies its intent to the fresh lane before
//! persisting, or drops the intent if the task is no longer where it
//! expects.
//!
//! Every continuation carries the generation it started under and leaves
//! the state alone once [`BoardStore::reset`] or a new load bumped it.

use std::future::Future;
use std::sync::Arc;

use futures_util::future::join_all;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use taskboard_proto::envelope::{CreateTaskRequest, DEFAULT_PAGE_SIZE};
use taskboard_proto::filter::TaskFilter;
use taskboard_proto::{NewTask, ProjectId, SectionId, Task, TaskId, TaskPatch, TaskStatus};

use super::queue::{MutationOrdering, SectionQueue, Ticket};
use super::status::StatusBinding;
use super::{BoardError, BoardState, Partition};
use crate::api::{ApiError, TaskApi, fetch_section};

/// Store settings.
#[derive(Debug, Clone)]
pub struct BoardOptions {
    /// Page size used when fetching a section's tasks.
    pub page_size: usize,
    pub ordering: MutationOrdering,
    pub status_binding: StatusBinding,
}

impl Default for BoardOptions {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            ordering: MutationOrdering::default(),
            status_binding: StatusBinding::default(),
        }
    }
}

/// Handle on the background persistence of an optimistic operation.
///
/// Dropping it does not cancel anything.
#[derive(Debug)]
pub struct Pending {
    handle: Option<JoinHandle<()>>,
}

impl Pending {
    const fn idle() -> Self {
        Self { handle: None }
    }

    fn spawn<F>(future: F) -> Self
    where
        F: Future<Output = ()> + Send + 'static,
    {
        Self {
            handle: Some(tokio::spawn(future)),
        }
    }

    /// True when the operation was a no-op and nothing runs in the
    /// background.
    #[must_use]
    pub const fn is_idle(&self) -> bool {
        self.handle.is_none()
    }

    /// Waits for persistence, and any rollback, to finish.
    pub async fn settled(self) {
        if let Some(handle) = self.handle
            && let Err(err) = handle.await
        {
            tracing::error!(error = %err, "board continuation failed");
        }
    }
}

/// An optimistic operation, as issued by the caller.
#[derive(Debug, Clone)]
enum Mutation {
    Move {
        task: TaskId,
        from: SectionId,
        to: SectionId,
        index: usize,
    },
    Reorder {
        section: SectionId,
        task: TaskId,
        index: usize,
    },
    Status {
        section: SectionId,
        task: TaskId,
        status: TaskStatus,
    },
    Delete {
        section: SectionId,
        task: TaskId,
    },
}

/// What applying a [`Mutation`] resolved to.
#[derive(Debug, Clone, Copy, Default)]
struct Effect {
    /// Index the task landed at (move, reorder).
    landed: Option<usize>,
    /// Status the task took (status, cross-section move).
    status: Option<TaskStatus>,
}

impl Mutation {
    const fn name(&self) -> &'static str {
        match self {
            Self::Move { .. } => "move",
            Self::Reorder { .. } => "reorder",
            Self::Status { .. } => "status",
            Self::Delete { .. } => "delete",
        }
    }

    const fn task(&self) -> &TaskId {
        match self {
            Self::Move { task, .. }
            | Self::Reorder { task, .. }
            | Self::Status { task, .. }
            | Self::Delete { task, .. } => task,
        }
    }

    fn sections(&self) -> Vec<SectionId> {
        match self {
            Self::Move { from, to, .. } if from == to => vec![from.clone()],
            Self::Move { from, to, .. } => vec![from.clone(), to.clone()],
            Self::Reorder { section, .. }
            | Self::Status { section, .. }
            | Self::Delete { section, .. } => vec![section.clone()],
        }
    }

    fn failed(&self, err: ApiError) -> BoardError {
        match self {
            Self::Move { .. } => BoardError::MoveTask(err),
            Self::Reorder { .. } => BoardError::UpdateOrder(err),
            Self::Status { .. } => BoardError::UpdateStatus(err),
            Self::Delete { .. } => BoardError::DeleteTask(err),
        }
    }

    /// Puts a moved task back at its destination after a refetch of the
    /// destination dropped it while the source lane kept the removal.
    fn reinstate(&self, partition: &mut Partition, moved: &Task, source_revision: u64) -> Option<usize> {
        let Self::Move { from, to, index, .. } = self else {
            return None;
        };
        if partition.revision(from) != source_revision || partition.task(&moved.id).is_some() {
            return None;
        }
        partition.insert(to, *index, moved.clone())
    }

    /// Applies the mutation locally; `None` when the task is not where the
    /// caller claims.
    fn apply(&self, partition: &mut Partition, binding: &StatusBinding) -> Option<Effect> {
        match self {
            Self::Move {
                task,
                from,
                to,
                index,
            } => {
                let landed = partition.move_task(task, from, to, *index)?;
                let status = if from == to {
                    None
                } else {
                    partition.section(to).and_then(|s| binding.status_for(s))
                };
                if let Some(status) = status {
                    partition.set_status(to, task, status);
                }
                Some(Effect {
                    landed: Some(landed),
                    status,
                })
            }
            Self::Reorder {
                section,
                task,
                index,
            } => Some(Effect {
                landed: Some(partition.reorder(section, task, *index)?),
                status: None,
            }),
            Self::Status {
                section,
                task,
                status,
            } => {
                partition.set_status(section, task, *status)?;
                Some(Effect {
                    landed: None,
                    status: Some(*status),
                })
            }
            Self::Delete { section, task } => {
                partition.remove(section, task)?;
                Some(Effect::default())
            }
        }
    }
}

/// Snapshot taken when a mutation was applied optimistically.
struct Applied {
    generation: u64,
    effect: Effect,
    /// Revisions of the touched sections at apply time.
    revisions: Vec<u64>,
    /// Record of a task moved across sections, as it landed.
    moved: Option<Task>,
    ticket: Ticket,
}

enum Replay {
    /// No touched section was refetched since the apply.
    Unchanged,
    /// Re-applied on refreshed lanes.
    Reapplied(Effect),
    /// The task is no longer where the intent expects it.
    Obsolete,
}

fn revisions(partition: &Partition, sections: &[SectionId]) -> Vec<u64> {
    sections.iter().map(|s| partition.revision(s)).collect()
}

/// Task board state manager.
///
/// Cheap to clone; clones share state. Optimistic operations spawn onto
/// the ambient Tokio runtime and must be called from within one.
pub struct BoardStore<A> {
    inner: Arc<Inner<A>>,
}

impl<A> Clone for BoardStore<A> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct Inner<A> {
    api: A,
    state: watch::Sender<BoardState>,
    queue: SectionQueue,
    options: BoardOptions,
}

impl<A: TaskApi + 'static> BoardStore<A> {
    /// Creates an empty store with default options.
    pub fn new(api: A) -> Self {
        Self::with_options(api, BoardOptions::default())
    }

    pub fn with_options(api: A, options: BoardOptions) -> Self {
        Self {
            inner: Arc::new(Inner {
                api,
                state: watch::Sender::new(BoardState::default()),
                queue: SectionQueue::new(options.ordering),
                options,
            }),
        }
    }

    /// The collaborator the store persists through.
    pub fn api(&self) -> &A {
        &self.inner.api
    }

    pub fn options(&self) -> &BoardOptions {
        &self.inner.options
    }

    /// A copy of the current state.
    pub fn snapshot(&self) -> BoardState {
        self.inner.state.borrow().clone()
    }

    /// Change notifications carrying read-only state.
    pub fn subscribe(&self) -> watch::Receiver<BoardState> {
        self.inner.state.subscribe()
    }

    pub fn selected_project(&self) -> Option<ProjectId> {
        self.inner.state.borrow().project_id.clone()
    }

    /// Tasks of a section, in board order.
    pub fn tasks(&self, section: &SectionId) -> Vec<Task> {
        self.inner.state.borrow().partition.tasks(section).to_vec()
    }

    pub fn is_loading(&self) -> bool {
        self.inner.state.borrow().loading
    }

    pub fn error(&self) -> Option<BoardError> {
        self.inner.state.borrow().error.clone()
    }

    pub fn clear_error(&self) {
        self.inner.state.send_if_modified(|s| s.error.take().is_some());
    }

    /// The board restricted to tasks matching `filter`.
    pub fn filtered(&self, filter: &TaskFilter) -> Partition {
        self.inner.state.borrow().partition.filtered(filter)
    }

    /// Loads the board of `project`, replacing whatever was loaded.
    ///
    /// Sections are fetched first; then every section's tasks are fetched
    /// concurrently and installed as they arrive. `loading` stays true
    /// until all of them have finished, failed ones included.
    pub async fn load_sections(&self, project: &ProjectId) {
        self.inner.load(project).await;
    }

    /// Moves a task to `index` in `to` (clamped), optimistically.
    ///
    /// Crossing sections also sets the status bound to the destination,
    /// if any. No-op when the task is not in `from`.
    pub fn move_task(&self, task: &TaskId, from: &SectionId, to: &SectionId, index: usize) -> Pending {
        self.submit(Mutation::Move {
            task: task.clone(),
            from: from.clone(),
            to: to.clone(),
            index,
        })
    }

    /// Reorders a task within its section, optimistically.
    pub fn update_task_order(&self, section: &SectionId, task: &TaskId, index: usize) -> Pending {
        self.submit(Mutation::Reorder {
            section: section.clone(),
            task: task.clone(),
            index,
        })
    }

    /// Sets a task's status, optimistically; failures refetch the section.
    pub fn update_task_status(&self, task: &TaskId, status: TaskStatus, section: &SectionId) -> Pending {
        self.submit(Mutation::Status {
            section: section.clone(),
            task: task.clone(),
            status,
        })
    }

    /// Removes a task, optimistically; failures refetch the section.
    pub fn delete_task(&self, task: &TaskId, section: &SectionId) -> Pending {
        self.submit(Mutation::Delete {
            section: section.clone(),
            task: task.clone(),
        })
    }

    /// Creates a task at the end of `section` once the collaborator
    /// confirms it.
    ///
    /// The selected project is added to the task's projects. Returns the
    /// canonical task, or `None` after reporting the failure.
    pub async fn create_task(&self, new_task: NewTask, section: &SectionId) -> Option<Task> {
        let inner = &self.inner;
        let (generation, project) = {
            let state = inner.state.borrow();
            (state.generation, state.project_id.clone())
        };
        let Some(project) = project else {
            inner.report(generation, BoardError::NoProjectSelected);
            return None;
        };

        let mut new_task = new_task;
        if !new_task.project_ids.contains(&project) {
            new_task.project_ids.insert(0, project);
        }
        if let Err(err) = new_task.validate() {
            inner.report(generation, err.into());
            return None;
        }

        let request = CreateTaskRequest {
            task: new_task,
            section_id: section.clone(),
        };
        match inner.api.create_task(&request).await {
            Ok(task) => {
                tracing::info!(task = %task.id, section = %section, "task created");
                inner.commit(generation, |s| {
                    s.partition.push(section, task.clone());
                });
                Some(task)
            }
            Err(err) => {
                inner.report(generation, BoardError::CreateTask(err));
                None
            }
        }
    }

    /// Applies a field update once the collaborator confirms it, then
    /// replaces the task wherever it sits.
    ///
    /// Placement fields are dropped: use [`move_task`](Self::move_task) or
    /// [`update_task_order`](Self::update_task_order).
    pub async fn update_task(&self, task: &TaskId, mut patch: TaskPatch) -> Option<Task> {
        let inner = &self.inner;
        let generation = inner.generation();

        let placement = (patch.section_id.take(), patch.order.take());
        if placement != (None, None) {
            tracing::debug!(task = %task, "placement fields dropped from task update");
        }
        if let Err(err) = patch.validate() {
            inner.report(generation, err.into());
            return None;
        }

        match inner.api.update_task(task, &patch).await {
            Ok(updated) => {
                inner.commit(generation, |s| {
                    s.partition.replace_task(updated.clone());
                });
                Some(updated)
            }
            Err(err) => {
                inner.report(generation, BoardError::UpdateTask(err));
                None
            }
        }
    }

    /// Forgets the board. In-flight requests are not cancelled, but their
    /// completions no longer touch the state.
    pub fn reset(&self) {
        self.inner.state.send_modify(|s| {
            *s = BoardState {
                generation: s.generation + 1,
                ..BoardState::default()
            };
        });
        tracing::debug!("board reset");
    }

    fn submit(&self, mutation: Mutation) -> Pending {
        let inner = &self.inner;
        let mut applied = None;
        inner.state.send_if_modified(|s| {
            let Some(effect) = mutation.apply(&mut s.partition, &inner.options.status_binding) else {
                return false;
            };
            let sections = mutation.sections();
            let moved = match &mutation {
                Mutation::Move { task, from, to, .. } if from != to => s.partition.task(task).cloned(),
                _ => None,
            };
            applied = Some(Applied {
                generation: s.generation,
                effect,
                revisions: revisions(&s.partition, &sections),
                moved,
                // Taken under the state lock so ticket order is apply order.
                ticket: inner.queue.enqueue(&sections),
            });
            true
        });

        let Some(applied) = applied else {
            tracing::debug!(
                op = mutation.name(),
                task = %mutation.task(),
                "task not in the claimed section, ignored"
            );
            return Pending::idle();
        };
        if let Mutation::Move { from, to, task, .. } = &mutation
            && from != to
            && applied.effect.status.is_none()
        {
            tracing::warn!(task = %task, section = %to, "no status bound to destination section");
        }

        let inner = Arc::clone(inner);
        Pending::spawn(async move { inner.settle(mutation, applied).await })
    }
}

impl<A: TaskApi + 'static> Inner<A> {
    fn generation(&self) -> u64 {
        self.state.borrow().generation
    }

    /// Applies `change` unless the generation moved on.
    fn commit(&self, generation: u64, change: impl FnOnce(&mut BoardState)) -> bool {
        self.state.send_if_modified(|state| {
            if state.generation != generation {
                return false;
            }
            change(state);
            true
        })
    }

    fn report(&self, generation: u64, error: BoardError) {
        tracing::warn!(error = %error, "board operation failed");
        self.commit(generation, |s| s.error = Some(error));
    }

    async fn load(&self, project: &ProjectId) {
        let mut generation = 0;
        self.state.send_modify(|s| {
            s.generation += 1;
            generation = s.generation;
            s.project_id = Some(project.clone());
            s.partition = Partition::default();
            s.loading = true;
            s.error = None;
        });
        tracing::debug!(project = %project, generation, "loading board");

        let sections = match self.api.fetch_sections(project).await {
            Ok(sections) => sections,
            Err(err) => {
                tracing::warn!(project = %project, error = %err, "failed to fetch sections");
                self.commit(generation, |s| {
                    s.loading = false;
                    s.error = Some(BoardError::FetchSections(err));
                });
                return;
            }
        };

        let partition = Partition::new(sections);
        let ids: Vec<SectionId> = partition.sections().iter().map(|s| s.id.clone()).collect();
        let mut tickets = Vec::with_capacity(ids.len());
        self.commit(generation, |s| {
            // Mutations on a section queue behind its lane install.
            tickets.extend(ids.iter().map(|id| self.queue.enqueue(std::slice::from_ref(id))));
            s.partition = partition;
        });
        tickets.resize_with(ids.len(), Ticket::default);

        join_all(ids.iter().zip(tickets).map(|(section, ticket)| async move {
            self.load_lane(generation, section).await;
            drop(ticket);
        }))
        .await;

        if self.commit(generation, |s| s.loading = false) {
            tracing::info!(project = %project, sections = ids.len(), "board loaded");
        }
    }

    /// Fetches a section and installs it as the authoritative lane.
    async fn load_lane(&self, generation: u64, section: &SectionId) {
        match fetch_section(&self.api, section, self.options.page_size).await {
            Ok(tasks) => {
                self.commit(generation, |s| {
                    s.partition.replace_lane(section, tasks);
                });
            }
            Err(err) => {
                tracing::warn!(section = %section, error = %err, "failed to fetch section tasks");
                self.commit(generation, |s| {
                    s.error = Some(BoardError::FetchTasks {
                        section: section.clone(),
                        source: err,
                    });
                });
            }
        }
    }

    /// Background half of an optimistic operation.
    async fn settle(self: Arc<Self>, mutation: Mutation, mut applied: Applied) {
        applied.ticket.ready().await;
        let generation = applied.generation;
        let mut effect = applied.effect;

        if self.queue.ordering() == MutationOrdering::Serialized {
            match self.replay(&mutation, &applied) {
                Replay::Unchanged => {}
                Replay::Reapplied(replayed) => effect = replayed,
                Replay::Obsolete => {
                    tracing::debug!(
                        op = mutation.name(),
                        task = %mutation.task(),
                        "intent no longer applies after refetch, dropped"
                    );
                    return;
                }
            }
        }

        if let Err(err) = self.persist(&mutation, effect).await {
            tracing::warn!(
                op = mutation.name(),
                task = %mutation.task(),
                error = %err,
                "persist failed, refetching"
            );
            if self.generation() == generation {
                for section in mutation.sections() {
                    self.load_lane(generation, &section).await;
                }
            }
            self.commit(generation, |s| s.error = Some(mutation.failed(err)));
        }
        drop(applied);
    }

    /// Re-applies `mutation` if any of its sections was refetched since
    /// the optimistic apply.
    fn replay(&self, mutation: &Mutation, applied: &Applied) -> Replay {
        let mut outcome = Replay::Unchanged;
        self.state.send_if_modified(|s| {
            if s.generation != applied.generation
                || revisions(&s.partition, &mutation.sections()) == applied.revisions
            {
                return false;
            }
            let effect = mutation
                .apply(&mut s.partition, &self.options.status_binding)
                .or_else(|| {
                    let moved = applied.moved.as_ref()?;
                    let source_revision = applied.revisions.first().copied()?;
                    let landed = mutation.reinstate(&mut s.partition, moved, source_revision)?;
                    Some(Effect {
                        landed: Some(landed),
                        status: applied.effect.status,
                    })
                });
            match effect {
                Some(effect) => {
                    outcome = Replay::Reapplied(effect);
                    true
                }
                None => {
                    outcome = Replay::Obsolete;
                    false
                }
            }
        });
        outcome
    }

    async fn persist(&self, mutation: &Mutation, effect: Effect) -> Result<(), ApiError> {
        match mutation {
            Mutation::Move {
                task,
                from,
                to,
                index,
            } => {
                let order = effect.landed.unwrap_or(*index);
                self.api
                    .update_task(task, &TaskPatch::placement(to.clone(), order))
                    .await?;
                if from != to
                    && let Some(status) = effect.status
                {
                    self.api.update_task_status(task, status).await?;
                }
            }
            Mutation::Reorder { task, index, .. } => {
                let order = effect.landed.unwrap_or(*index);
                self.api.update_task(task, &TaskPatch::order(order)).await?;
            }
            Mutation::Status { task, status, .. } => {
                self.api.update_task_status(task, *status).await?;
            }
            Mutation::Delete { task, .. } => self.api.delete_task(task).await?,
        }
        Ok(())
    }
}
