//! Authoritative in-memory store of sections and task placement.
//!
//! The [`Ledger`] is the reference implementation of the backend's
//! contract: it owns the canonical tasks, which section each task sits in,
//! and the order within each section. The mock server wraps one behind a
//! lock, and the client's in-memory collaborator uses one directly.
//!
//! # Invariant
//!
//! Every stored task sits in exactly one section lane, exactly once.

use std::collections::HashMap;

use crate::envelope::{CreateTaskRequest, Page};
use crate::ids::{ProjectId, SectionId, TaskId};
use crate::section::{Section, sort_sections};
use crate::task::{Task, TaskPatch, TaskStatus, ValidationError};

/// Errors returned by ledger operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    /// No sections are registered for the project.
    #[error("project not found: {0}")]
    ProjectNotFound(ProjectId),
    /// The section does not exist.
    #[error("section not found: {0}")]
    SectionNotFound(SectionId),
    /// The task does not exist.
    #[error("task not found: {0}")]
    TaskNotFound(TaskId),
    /// Input failed validation.
    #[error("invalid task: {0}")]
    Invalid(#[from] ValidationError),
}

/// In-memory sections, tasks, and per-section ordering.
#[derive(Debug, Clone, Default)]
pub struct Ledger {
    /// Project -> sections, kept sorted by `order`.
    sections: HashMap<ProjectId, Vec<Section>>,
    /// Section -> ordered task ids.
    lanes: HashMap<SectionId, Vec<TaskId>>,
    /// Canonical task records.
    tasks: HashMap<TaskId, Task>,
    /// Task -> the section it currently sits in.
    placement: HashMap<TaskId, SectionId>,
}

impl Ledger {
    /// Creates an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a section (and implicitly its project).
    ///
    /// Re-adding an existing section id replaces its metadata and keeps
    /// its tasks.
    pub fn add_section(&mut self, section: Section) {
        let project = self.sections.entry(section.project_id.clone()).or_default();
        project.retain(|s| s.id != section.id);
        self.lanes.entry(section.id.clone()).or_default();
        project.push(section);
        sort_sections(project);
    }

    /// Appends an existing canonical task to a section, replacing any
    /// previous placement of the same id.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::SectionNotFound`] if the section is unknown.
    pub fn insert_task(&mut self, section: &SectionId, task: Task) -> Result<(), LedgerError> {
        if !self.lanes.contains_key(section) {
            return Err(LedgerError::SectionNotFound(section.clone()));
        }
        self.detach(&task.id);
        self.place(&task.id, section, usize::MAX);
        self.tasks.insert(task.id.clone(), task);
        Ok(())
    }

    /// Sections of a project, ordered.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::ProjectNotFound`] for an unknown project.
    pub fn sections(&self, project: &ProjectId) -> Result<Vec<Section>, LedgerError> {
        self.sections
            .get(project)
            .cloned()
            .ok_or_else(|| LedgerError::ProjectNotFound(project.clone()))
    }

    /// All tasks of a section, in board order.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::SectionNotFound`] for an unknown section.
    pub fn tasks(&self, section: &SectionId) -> Result<Vec<Task>, LedgerError> {
        let lane = self
            .lanes
            .get(section)
            .ok_or_else(|| LedgerError::SectionNotFound(section.clone()))?;
        Ok(lane
            .iter()
            .filter_map(|id| self.tasks.get(id))
            .cloned()
            .collect())
    }

    /// One page of a section's tasks.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::SectionNotFound`] for an unknown section.
    pub fn page(
        &self,
        section: &SectionId,
        page: usize,
        size: usize,
    ) -> Result<Page<Task>, LedgerError> {
        let all = self.tasks(section)?;
        Ok(Page::slice(&all, page, size))
    }

    /// Looks up a task by id.
    #[must_use]
    pub fn task(&self, id: &TaskId) -> Option<&Task> {
        self.tasks.get(id)
    }

    /// The section a task currently sits in.
    #[must_use]
    pub fn section_of(&self, id: &TaskId) -> Option<&SectionId> {
        self.placement.get(id)
    }

    /// Ordered task ids of a section.
    #[must_use]
    pub fn lane(&self, section: &SectionId) -> Option<&[TaskId]> {
        self.lanes.get(section).map(Vec::as_slice)
    }

    /// Creates a task at the end of the requested section.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Invalid`] if the input fails validation or
    /// [`LedgerError::SectionNotFound`] if the section is unknown.
    pub fn create(&mut self, request: &CreateTaskRequest) -> Result<Task, LedgerError> {
        request.task.validate()?;
        if !self.lanes.contains_key(&request.section_id) {
            return Err(LedgerError::SectionNotFound(request.section_id.clone()));
        }
        let task = Task::from_new(TaskId::generate(), &request.task);
        self.place(&task.id, &request.section_id, usize::MAX);
        self.tasks.insert(task.id.clone(), task.clone());
        Ok(task)
    }

    /// Applies a patch.
    ///
    /// With `section_id` set the task is relocated to that section at
    /// `order` (end of section when absent); with only `order` set it is
    /// reordered within its current section. Indices past the end append.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Invalid`], [`LedgerError::TaskNotFound`], or
    /// [`LedgerError::SectionNotFound`] for a bad target section.
    pub fn update(&mut self, id: &TaskId, patch: &TaskPatch) -> Result<Task, LedgerError> {
        patch.validate()?;
        if !self.tasks.contains_key(id) {
            return Err(LedgerError::TaskNotFound(id.clone()));
        }
        if let Some(target) = &patch.section_id
            && !self.lanes.contains_key(target)
        {
            return Err(LedgerError::SectionNotFound(target.clone()));
        }

        let target = patch
            .section_id
            .clone()
            .or_else(|| patch.order.and_then(|_| self.placement.get(id).cloned()));
        if let Some(section) = target {
            self.detach(id);
            self.place(id, &section, patch.order.unwrap_or(usize::MAX));
        }

        let task = self
            .tasks
            .get_mut(id)
            .ok_or_else(|| LedgerError::TaskNotFound(id.clone()))?;
        patch.apply_to(task);
        Ok(task.clone())
    }

    /// Sets a task's status.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::TaskNotFound`] for an unknown task.
    pub fn set_status(&mut self, id: &TaskId, status: TaskStatus) -> Result<Task, LedgerError> {
        self.update(id, &TaskPatch::default().with_status(status))
    }

    /// Removes a task.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::TaskNotFound`] for an unknown task.
    pub fn delete(&mut self, id: &TaskId) -> Result<(), LedgerError> {
        if self.tasks.remove(id).is_none() {
            return Err(LedgerError::TaskNotFound(id.clone()));
        }
        self.detach(id);
        Ok(())
    }

    /// Total number of stored tasks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// True when no task is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    fn detach(&mut self, id: &TaskId) {
        if let Some(section) = self.placement.remove(id)
            && let Some(lane) = self.lanes.get_mut(&section)
        {
            lane.retain(|t| t != id);
        }
    }

    fn place(&mut self, id: &TaskId, section: &SectionId, index: usize) {
        let lane = self.lanes.entry(section.clone()).or_default();
        let index = index.min(lane.len());
        lane.insert(index, id.clone());
        self.placement.insert(id.clone(), section.clone());
    }
}
