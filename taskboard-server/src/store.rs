//! Shared, lock-guarded task ledger behind the REST handlers.
//!
//! [`TaskStore`] wraps a [`Ledger`] in a [`RwLock`] so listings can run
//! concurrently while mutations are applied one at a time. Every mutation
//! is atomic with respect to other requests.

use taskboard_proto::envelope::{CreateTaskRequest, Page};
use taskboard_proto::ledger::{Ledger, LedgerError};
use taskboard_proto::{ProjectId, Section, SectionId, Task, TaskId, TaskPatch, TaskStatus, demo};
use tokio::sync::RwLock;

/// Default upper bound on a listing's page size.
const DEFAULT_MAX_PAGE_SIZE: usize = 500;

/// Thread-safe task ledger with a page size cap.
pub struct TaskStore {
    ledger: RwLock<Ledger>,
    max_page_size: usize,
}

impl Default for TaskStore {
    fn default() -> Self {
        Self::new(Ledger::new())
    }
}

impl TaskStore {
    /// Wraps an existing ledger.
    #[must_use]
    pub fn new(ledger: Ledger) -> Self {
        Self {
            ledger: RwLock::new(ledger),
            max_page_size: DEFAULT_MAX_PAGE_SIZE,
        }
    }

    /// A store seeded with the demo projects.
    #[must_use]
    pub fn demo() -> Self {
        Self::new(demo::ledger())
    }

    /// Caps the page size of listings (at least one).
    #[must_use]
    pub fn with_max_page_size(mut self, max_page_size: usize) -> Self {
        self.max_page_size = max_page_size.max(1);
        self
    }

    /// Sections of a project, sorted by order.
    pub async fn sections(&self, project: &ProjectId) -> Result<Vec<Section>, LedgerError> {
        self.ledger.read().await.sections(project)
    }

    /// One page of a section's tasks. `size` is clamped to the store's cap.
    pub async fn page(
        &self,
        section: &SectionId,
        page: usize,
        size: usize,
    ) -> Result<Page<Task>, LedgerError> {
        let size = size.clamp(1, self.max_page_size);
        self.ledger.read().await.page(section, page, size)
    }

    pub async fn create(&self, request: &CreateTaskRequest) -> Result<Task, LedgerError> {
        self.ledger.write().await.create(request)
    }

    pub async fn update(&self, id: &TaskId, patch: &TaskPatch) -> Result<Task, LedgerError> {
        self.ledger.write().await.update(id, patch)
    }

    pub async fn set_status(&self, id: &TaskId, status: TaskStatus) -> Result<Task, LedgerError> {
        self.ledger.write().await.set_status(id, status)
    }

    pub async fn delete(&self, id: &TaskId) -> Result<(), LedgerError> {
        self.ledger.write().await.delete(id)
    }

    /// Section a task currently sits in.
    pub async fn section_of(&self, id: &TaskId) -> Option<SectionId> {
        self.ledger.read().await.section_of(id).cloned()
    }

    /// Total number of stored tasks.
    pub async fn len(&self) -> usize {
        self.ledger.read().await.len()
    }

    /// True when no task is stored.
    pub async fn is_empty(&self) -> bool {
        self.ledger.read().await.is_empty()
    }
}
