//! The section -> ordered tasks partition.
//!
//! # Invariant
//!
//! A task id appears in at most one lane, at most once. Every mutator
//! here preserves that, including [`Partition::replace_lane`], which strips
//! the incoming ids from every other lane before installing the new one.

use std::collections::{HashMap, HashSet};

use taskboard_proto::filter::TaskFilter;
use taskboard_proto::section::sort_sections;
use taskboard_proto::{Section, SectionId, Task, TaskId, TaskStatus};

/// Ordered sections of one project and the ordered tasks of each.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Partition {
    sections: Vec<Section>,
    lanes: HashMap<SectionId, Vec<Task>>,
    /// Bumped every time a lane is replaced wholesale from the remote.
    revisions: HashMap<SectionId, u64>,
}

impl Partition {
    /// Seeds one empty lane per section; sections are sorted by `order`.
    #[must_use]
    pub fn new(mut sections: Vec<Section>) -> Self {
        sort_sections(&mut sections);
        let lanes = sections
            .iter()
            .map(|s| (s.id.clone(), Vec::new()))
            .collect();
        Self {
            sections,
            lanes,
            revisions: HashMap::new(),
        }
    }

    #[must_use]
    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    #[must_use]
    pub fn section(&self, id: &SectionId) -> Option<&Section> {
        self.sections.iter().find(|s| &s.id == id)
    }

    #[must_use]
    pub fn contains_section(&self, id: &SectionId) -> bool {
        self.lanes.contains_key(id)
    }

    /// Tasks of a section, or `None` for an unknown section.
    #[must_use]
    pub fn lane(&self, section: &SectionId) -> Option<&[Task]> {
        self.lanes.get(section).map(Vec::as_slice)
    }

    /// Tasks of a section; empty for an unknown section.
    #[must_use]
    pub fn tasks(&self, section: &SectionId) -> &[Task] {
        self.lane(section).unwrap_or_default()
    }

    /// Task ids of a section, in order.
    #[must_use]
    pub fn ids(&self, section: &SectionId) -> Vec<TaskId> {
        self.tasks(section).iter().map(|t| t.id.clone()).collect()
    }

    /// Position of a task within a section.
    #[must_use]
    pub fn position(&self, section: &SectionId, task: &TaskId) -> Option<usize> {
        self.lanes.get(section)?.iter().position(|t| &t.id == task)
    }

    /// Finds a task anywhere on the board.
    #[must_use]
    pub fn locate(&self, task: &TaskId) -> Option<(&SectionId, usize)> {
        self.sections.iter().find_map(|s| {
            self.position(&s.id, task).map(|index| (&s.id, index))
        })
    }

    #[must_use]
    pub fn task(&self, id: &TaskId) -> Option<&Task> {
        let (section, index) = self.locate(id)?;
        self.lanes.get(section)?.get(index)
    }

    /// How many times a section's lane has been replaced wholesale.
    #[must_use]
    pub fn revision(&self, section: &SectionId) -> u64 {
        self.revisions.get(section).copied().unwrap_or_default()
    }

    /// Installs an authoritative lane.
    ///
    /// Incoming ids are removed from every other lane and duplicates within
    /// `tasks` keep their first occurrence. Returns `false` (and changes
    /// nothing) for an unknown section.
    pub fn replace_lane(&mut self, section: &SectionId, mut tasks: Vec<Task>) -> bool {
        if !self.lanes.contains_key(section) {
            return false;
        }
        let mut seen = HashSet::new();
        tasks.retain(|t| seen.insert(t.id.clone()));
        for (id, lane) in &mut self.lanes {
            if id != section {
                lane.retain(|t| !seen.contains(&t.id));
            }
        }
        self.lanes.insert(section.clone(), tasks);
        *self.revisions.entry(section.clone()).or_default() += 1;
        true
    }

    /// Moves a task from `from` to `to` at `index`, clamped to the
    /// destination length after removal. `from == to` reorders in place.
    ///
    /// Returns the index the task landed at, or `None` when the task is
    /// not in `from` or either section is unknown.
    pub fn move_task(
        &mut self,
        task: &TaskId,
        from: &SectionId,
        to: &SectionId,
        index: usize,
    ) -> Option<usize> {
        if !self.lanes.contains_key(to) {
            return None;
        }
        let source = self.lanes.get_mut(from)?;
        let position = source.iter().position(|t| &t.id == task)?;
        let moved = source.remove(position);
        let destination = self.lanes.get_mut(to)?;
        let index = index.min(destination.len());
        destination.insert(index, moved);
        Some(index)
    }

    /// Reorders a task within its section.
    pub fn reorder(&mut self, section: &SectionId, task: &TaskId, index: usize) -> Option<usize> {
        self.move_task(task, section, section, index)
    }

    /// Appends a task to a section, dropping any other copy of its id.
    pub fn push(&mut self, section: &SectionId, task: Task) -> bool {
        self.insert(section, usize::MAX, task).is_some()
    }

    /// Inserts a task at `index` (clamped), dropping any other copy of its
    /// id. Returns the landing index, or `None` for an unknown section.
    pub fn insert(&mut self, section: &SectionId, index: usize, task: Task) -> Option<usize> {
        if !self.lanes.contains_key(section) {
            return None;
        }
        for lane in self.lanes.values_mut() {
            lane.retain(|t| t.id != task.id);
        }
        let lane = self.lanes.get_mut(section)?;
        let index = index.min(lane.len());
        lane.insert(index, task);
        Some(index)
    }

    /// Removes a task from a section.
    pub fn remove(&mut self, section: &SectionId, task: &TaskId) -> Option<Task> {
        let lane = self.lanes.get_mut(section)?;
        let position = lane.iter().position(|t| &t.id == task)?;
        Some(lane.remove(position))
    }

    /// Replaces a task record wherever it sits. Returns `false` if absent.
    pub fn replace_task(&mut self, task: Task) -> bool {
        for lane in self.lanes.values_mut() {
            if let Some(slot) = lane.iter_mut().find(|t| t.id == task.id) {
                *slot = task;
                return true;
            }
        }
        false
    }

    /// Sets a task's status in place, returning the previous status.
    pub fn set_status(
        &mut self,
        section: &SectionId,
        task: &TaskId,
        status: TaskStatus,
    ) -> Option<TaskStatus> {
        let slot = self.lanes.get_mut(section)?.iter_mut().find(|t| &t.id == task)?;
        Some(std::mem::replace(&mut slot.status, status))
    }

    /// Sections in order, each with its tasks.
    pub fn iter(&self) -> impl Iterator<Item = (&Section, &[Task])> {
        self.sections.iter().map(|s| (s, self.tasks(&s.id)))
    }

    /// A copy keeping every section but only the tasks matching `filter`.
    #[must_use]
    pub fn filtered(&self, filter: &TaskFilter) -> Self {
        let lanes = self
            .lanes
            .iter()
            .map(|(id, lane)| {
                let kept = lane.iter().filter(|t| filter.matches(t)).cloned().collect();
                (id.clone(), kept)
            })
            .collect();
        Self {
            sections: self.sections.clone(),
            lanes,
            revisions: self.revisions.clone(),
        }
    }

    /// Number of tasks across all lanes.
    #[must_use]
    pub fn task_count(&self) -> usize {
        self.lanes.values().map(Vec::len).sum()
    }
}
