//! Client-side task board state.
//!
//! [`BoardStore`] owns the section -> tasks [`Partition`] of the selected
//! project and applies board operations to it:
//! - move, reorder, status and delete apply optimistically and roll back
//!   by refetching the affected sections when persistence fails
//! - create and generic update only touch local state after the remote
//!   collaborator confirms
//!
//! Consumers read [`BoardState`] snapshots; every change goes through the
//! store's operations.

pub mod partition;
pub mod queue;
pub mod status;
pub mod store;

pub use partition::Partition;
pub use queue::{MutationOrdering, SectionQueue, Ticket};
pub use status::{StatusBinding, status_for_name};
pub use store::{BoardOptions, BoardStore, Pending};

use taskboard_proto::task::ValidationError;
use taskboard_proto::{ProjectId, SectionId};

use crate::api::ApiError;

/// The error a board operation reports into [`BoardState::error`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BoardError {
    #[error("Failed to fetch sections: {0}")]
    FetchSections(#[source] ApiError),

    #[error("Failed to fetch tasks for section {section}: {source}")]
    FetchTasks {
        section: SectionId,
        source: ApiError,
    },

    #[error("Failed to move task: {0}")]
    MoveTask(#[source] ApiError),

    #[error("Failed to update task order: {0}")]
    UpdateOrder(#[source] ApiError),

    #[error("Failed to update task status: {0}")]
    UpdateStatus(#[source] ApiError),

    #[error("Failed to create task: {0}")]
    CreateTask(#[source] ApiError),

    #[error("Failed to update task: {0}")]
    UpdateTask(#[source] ApiError),

    #[error("Failed to delete task: {0}")]
    DeleteTask(#[source] ApiError),

    /// Create was called before a project was loaded.
    #[error("No project selected")]
    NoProjectSelected,

    /// Input was refused before reaching the collaborator.
    #[error("Invalid task: {0}")]
    Invalid(#[from] ValidationError),
}

impl BoardError {
    /// Text to show the user: the server's message when it sent one,
    /// otherwise a generic description of the failed operation.
    #[must_use]
    pub fn message(&self) -> String {
        let (fallback, source) = match self {
            Self::FetchSections(e) => ("Failed to fetch sections", e),
            Self::FetchTasks { source, .. } => ("Failed to fetch tasks", source),
            Self::MoveTask(e) => ("Failed to move task", e),
            Self::UpdateOrder(e) => ("Failed to update task order", e),
            Self::UpdateStatus(e) => ("Failed to update task status", e),
            Self::CreateTask(e) => ("Failed to create task", e),
            Self::UpdateTask(e) => ("Failed to update task", e),
            Self::DeleteTask(e) => ("Failed to delete task", e),
            Self::NoProjectSelected | Self::Invalid(_) => return self.to_string(),
        };
        match source {
            ApiError::Transport(_) | ApiError::Decode(_) => fallback.to_string(),
            other if other.message().trim().is_empty() => fallback.to_string(),
            other => other.message().to_string(),
        }
    }
}

/// What consumers observe.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BoardState {
    /// Project whose board is loaded, if any.
    pub project_id: Option<ProjectId>,
    pub partition: Partition,
    /// True while [`BoardStore::load_sections`] is fetching.
    pub loading: bool,
    /// Most recent reported error.
    pub error: Option<BoardError>,
    /// Bumped by reset and by every load; continuations started under an
    /// older generation leave the state alone.
    generation: u64,
}

impl BoardState {
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }
}
