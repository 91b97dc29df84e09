//! Remote collaborator abstraction for the task board.
//!
//! Defines the [`TaskApi`] trait the board store persists through.
//! Concrete implementations:
//! - [`http::HttpTaskApi`]: JSON over HTTP against the REST backend
//! - [`memory::InMemoryTaskApi`]: in-process ledger with fault injection,
//!   used for demo mode and tests

pub mod http;
pub mod memory;

use std::future::Future;
use std::sync::Arc;

use taskboard_proto::envelope::{CreateTaskRequest, Page};
use taskboard_proto::{ProjectId, Section, SectionId, Task, TaskId, TaskPatch, TaskStatus};

/// Errors reported by a [`TaskApi`] implementation.
///
/// Only success/failure and a message matter to the board; status codes
/// are kept for logging.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    /// The server answered with a non-success status.
    #[error("{message} (HTTP {status})")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Server-provided message, or the canonical reason.
        message: String,
    },

    /// The server answered `success = false`.
    #[error("{0}")]
    Rejected(String),

    /// The referenced project, section, or task does not exist.
    #[error("{0}")]
    NotFound(String),

    /// The server refused the input.
    #[error("{0}")]
    Invalid(String),

    /// The request never produced a response.
    #[error("request failed: {0}")]
    Transport(String),

    /// The response could not be decoded.
    #[error("invalid response: {0}")]
    Decode(String),
}

impl ApiError {
    /// The user-facing message, without transport decoration.
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::Status { message, .. } => message,
            Self::Rejected(m)
            | Self::NotFound(m)
            | Self::Invalid(m)
            | Self::Transport(m)
            | Self::Decode(m) => m,
        }
    }
}

/// Async collaborator that owns the authoritative sections and tasks.
///
/// Implementations are plain request/response: no retries, no caching.
/// Every returned task is the canonical record and replaces whatever the
/// caller held before.
pub trait TaskApi: Send + Sync {
    /// Ordered sections of a project.
    fn fetch_sections(
        &self,
        project: &ProjectId,
    ) -> impl Future<Output = Result<Vec<Section>, ApiError>> + Send;

    /// One page of a section's tasks, in board order.
    fn fetch_tasks(
        &self,
        section: &SectionId,
        page: usize,
        size: usize,
    ) -> impl Future<Output = Result<Page<Task>, ApiError>> + Send;

    /// Creates a task in a section and returns the canonical record.
    fn create_task(
        &self,
        request: &CreateTaskRequest,
    ) -> impl Future<Output = Result<Task, ApiError>> + Send;

    /// Applies a partial update (including placement) to a task.
    fn update_task(
        &self,
        id: &TaskId,
        patch: &TaskPatch,
    ) -> impl Future<Output = Result<Task, ApiError>> + Send;

    /// Sets a task's status.
    fn update_task_status(
        &self,
        id: &TaskId,
        status: TaskStatus,
    ) -> impl Future<Output = Result<Task, ApiError>> + Send;

    /// Deletes a task.
    fn delete_task(&self, id: &TaskId) -> impl Future<Output = Result<(), ApiError>> + Send;
}

impl<T: TaskApi> TaskApi for Arc<T> {
    fn fetch_sections(
        &self,
        project: &ProjectId,
    ) -> impl Future<Output = Result<Vec<Section>, ApiError>> + Send {
        (**self).fetch_sections(project)
    }

    fn fetch_tasks(
        &self,
        section: &SectionId,
        page: usize,
        size: usize,
    ) -> impl Future<Output = Result<Page<Task>, ApiError>> + Send {
        (**self).fetch_tasks(section, page, size)
    }

    fn create_task(
        &self,
        request: &CreateTaskRequest,
    ) -> impl Future<Output = Result<Task, ApiError>> + Send {
        (**self).create_task(request)
    }

    fn update_task(
        &self,
        id: &TaskId,
        patch: &TaskPatch,
    ) -> impl Future<Output = Result<Task, ApiError>> + Send {
        (**self).update_task(id, patch)
    }

    fn update_task_status(
        &self,
        id: &TaskId,
        status: TaskStatus,
    ) -> impl Future<Output = Result<Task, ApiError>> + Send {
        (**self).update_task_status(id, status)
    }

    fn delete_task(&self, id: &TaskId) -> impl Future<Output = Result<(), ApiError>> + Send {
        (**self).delete_task(id)
    }
}

/// Fetches every task of a section by walking its pages.
///
/// Stops at the page flagged `last`, at an empty page, or after the
/// advertised page count, whichever comes first.
///
/// # Errors
///
/// Returns the first page error; partial results are discarded.
pub async fn fetch_section<A: TaskApi>(
    api: &A,
    section: &SectionId,
    page_size: usize,
) -> Result<Vec<Task>, ApiError> {
    let mut tasks = Vec::new();
    let mut page = 0;
    loop {
        let chunk = api.fetch_tasks(section, page, page_size).await?;
        let done = chunk.last || chunk.content.is_empty() || page + 1 >= chunk.total_pages;
        tasks.extend(chunk.content);
        if done {
            return Ok(tasks);
        }
        page += 1;
    }
}
