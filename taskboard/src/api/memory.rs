//! In-process collaborator for demo mode and tests.
//!
//! [`InMemoryTaskApi`] answers every [`TaskApi`] call from a
//! [`Ledger`], so it behaves like the real backend without a network.
//! Tests can additionally:
//! - inject failures per operation and target id ([`InMemoryTaskApi::fail`])
//! - hold every call at the door until released ([`InMemoryTaskApi::pause`])
//! - inspect the calls that were issued ([`InMemoryTaskApi::calls`])

use parking_lot::{Mutex, MutexGuard};
use tokio::sync::watch;

use taskboard_proto::demo;
use taskboard_proto::envelope::{CreateTaskRequest, Page};
use taskboard_proto::ledger::{Ledger, LedgerError};
use taskboard_proto::{ProjectId, Section, SectionId, Task, TaskId, TaskPatch, TaskStatus};

use super::{ApiError, TaskApi};

/// The collaborator operations, used to target injected faults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// `fetch_sections`
    FetchSections,
    /// `fetch_tasks`
    FetchTasks,
    /// `create_task`
    CreateTask,
    /// `update_task`
    UpdateTask,
    /// `update_task_status`
    UpdateStatus,
    /// `delete_task`
    DeleteTask,
}

/// A call received by the in-memory collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiCall {
    FetchSections(ProjectId),
    FetchTasks(SectionId),
    CreateTask(SectionId),
    UpdateTask(TaskId, TaskPatch),
    UpdateStatus(TaskId, TaskStatus),
    DeleteTask(TaskId),
}

/// An injected failure.
#[derive(Debug, Clone)]
struct Fault {
    operation: Operation,
    /// Only fail calls about this project/section/task id.
    target: Option<String>,
    message: String,
    /// Remaining failures; `None` fails forever.
    remaining: Option<usize>,
}

/// In-memory [`TaskApi`] backed by a [`Ledger`].
pub struct InMemoryTaskApi {
    ledger: Mutex<Ledger>,
    faults: Mutex<Vec<Fault>>,
    calls: Mutex<Vec<ApiCall>>,
    /// `true` while calls are held at the door.
    paused: watch::Sender<bool>,
}

impl Default for InMemoryTaskApi {
    fn default() -> Self {
        Self::new(Ledger::new())
    }
}

impl InMemoryTaskApi {
    /// Wraps an existing ledger.
    #[must_use]
    pub fn new(ledger: Ledger) -> Self {
        Self {
            ledger: Mutex::new(ledger),
            faults: Mutex::new(Vec::new()),
            calls: Mutex::new(Vec::new()),
            paused: watch::Sender::new(false),
        }
    }

    /// A collaborator seeded with the demo data set.
    #[must_use]
    pub fn demo() -> Self {
        Self::new(demo::ledger())
    }

    /// Direct access to the authoritative ledger.
    pub fn ledger(&self) -> MutexGuard<'_, Ledger> {
        self.ledger.lock()
    }

    /// Fails every call of `operation` with `message` until cleared.
    pub fn fail(&self, operation: Operation, message: &str) {
        self.push_fault(operation, None, message, None);
    }

    /// Fails every call of `operation` about `target` (a project, section,
    /// or task id) until cleared.
    pub fn fail_for(&self, operation: Operation, target: &str, message: &str) {
        self.push_fault(operation, Some(target.to_string()), message, None);
    }

    /// Fails the next call of `operation` only.
    pub fn fail_once(&self, operation: Operation, message: &str) {
        self.push_fault(operation, None, message, Some(1));
    }

    /// Removes every injected fault.
    pub fn clear_faults(&self) {
        self.faults.lock().clear();
    }

    /// Holds every subsequent call until [`resume`](Self::resume).
    pub fn pause(&self) {
        self.paused.send_replace(true);
    }

    /// Releases held calls.
    pub fn resume(&self) {
        self.paused.send_replace(false);
    }

    /// Calls received so far, in arrival order.
    #[must_use]
    pub fn calls(&self) -> Vec<ApiCall> {
        self.calls.lock().clone()
    }

    /// Forgets the recorded calls.
    pub fn clear_calls(&self) {
        self.calls.lock().clear();
    }

    fn push_fault(
        &self,
        operation: Operation,
        target: Option<String>,
        message: &str,
        remaining: Option<usize>,
    ) {
        self.faults.lock().push(Fault {
            operation,
            target,
            message: message.to_string(),
            remaining,
        });
    }

    /// Records the call, waits at the door, then checks injected faults.
    async fn admit(&self, call: ApiCall, operation: Operation, target: &str) -> Result<(), ApiError> {
        self.calls.lock().push(call);

        let mut gate = self.paused.subscribe();
        // The sender lives as long as `self`, so the wait cannot fail.
        let _ = gate.wait_for(|paused| !*paused).await;

        let mut faults = self.faults.lock();
        let hit = faults.iter_mut().position(|f| {
            f.operation == operation && f.target.as_deref().is_none_or(|t| t == target)
        });
        let Some(index) = hit else {
            return Ok(());
        };
        let message = faults[index].message.clone();
        if let Some(remaining) = faults[index].remaining.as_mut() {
            *remaining -= 1;
            if *remaining == 0 {
                faults.remove(index);
            }
        }
        drop(faults);
        tracing::debug!(?operation, target, %message, "injected api failure");
        Err(ApiError::Rejected(message))
    }
}

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::Invalid(_) => Self::Invalid(err.to_string()),
            LedgerError::ProjectNotFound(_)
            | LedgerError::SectionNotFound(_)
            | LedgerError::TaskNotFound(_) => Self::NotFound(err.to_string()),
        }
    }
}

impl TaskApi for InMemoryTaskApi {
    async fn fetch_sections(&self, project: &ProjectId) -> Result<Vec<Section>, ApiError> {
        self.admit(
            ApiCall::FetchSections(project.clone()),
            Operation::FetchSections,
            project.as_str(),
        )
        .await?;
        Ok(self.ledger.lock().sections(project)?)
    }

    async fn fetch_tasks(
        &self,
        section: &SectionId,
        page: usize,
        size: usize,
    ) -> Result<Page<Task>, ApiError> {
        self.admit(
            ApiCall::FetchTasks(section.clone()),
            Operation::FetchTasks,
            section.as_str(),
        )
        .await?;
        Ok(self.ledger.lock().page(section, page, size)?)
    }

    async fn create_task(&self, request: &CreateTaskRequest) -> Result<Task, ApiError> {
        self.admit(
            ApiCall::CreateTask(request.section_id.clone()),
            Operation::CreateTask,
            request.section_id.as_str(),
        )
        .await?;
        Ok(self.ledger.lock().create(request)?)
    }

    async fn update_task(&self, id: &TaskId, patch: &TaskPatch) -> Result<Task, ApiError> {
        self.admit(
            ApiCall::UpdateTask(id.clone(), patch.clone()),
            Operation::UpdateTask,
            id.as_str(),
        )
        .await?;
        Ok(self.ledger.lock().update(id, patch)?)
    }

    async fn update_task_status(&self, id: &TaskId, status: TaskStatus) -> Result<Task, ApiError> {
        self.admit(
            ApiCall::UpdateStatus(id.clone(), status),
            Operation::UpdateStatus,
            id.as_str(),
        )
        .await?;
        Ok(self.ledger.lock().set_status(id, status)?)
    }

    async fn delete_task(&self, id: &TaskId) -> Result<(), ApiError> {
        self.admit(
            ApiCall::DeleteTask(id.clone()),
            Operation::DeleteTask,
            id.as_str(),
        )
        .await?;
        Ok(self.ledger.lock().delete(id)?)
    }
}
