//! Client-side task filtering for list and board views.
//!
//! A [`TaskFilter`] is a conjunction of criteria; each criterion is only
//! active when it is non-empty. Within a multi-valued criterion any value
//! may match (status in {todo, done}, ...).

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::ids::{ProjectId, UserId};
use crate::task::{Task, TaskPriority, TaskStatus};

/// Filter criteria for tasks.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TaskFilter {
    /// Match any of these statuses.
    pub status: Vec<TaskStatus>,
    /// Match any of these priorities.
    pub priority: Vec<TaskPriority>,
    /// Match tasks assigned to any of these users.
    pub assignee_id: Vec<UserId>,
    /// Match tasks belonging to any of these projects.
    pub project_id: Vec<ProjectId>,
    /// Match tasks carrying any of these tags.
    pub tags: Vec<String>,
    /// Inclusive lower bound on the due date.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date_from: Option<NaiveDate>,
    /// Inclusive upper bound on the due date.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date_to: Option<NaiveDate>,
    /// Case-insensitive substring of title or description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
}

impl TaskFilter {
    /// Whether `task` satisfies every active criterion.
    ///
    /// A due-date bound excludes tasks without a due date.
    #[must_use]
    pub fn matches(&self, task: &Task) -> bool {
        if !self.status.is_empty() && !self.status.contains(&task.status) {
            return false;
        }
        if !self.priority.is_empty() && !self.priority.contains(&task.priority) {
            return false;
        }
        if !self.assignee_id.is_empty()
            && !task
                .assignee_id
                .as_ref()
                .is_some_and(|a| self.assignee_id.contains(a))
        {
            return false;
        }
        if !self.project_id.is_empty()
            && !task.project_ids.iter().any(|p| self.project_id.contains(p))
        {
            return false;
        }
        if !self.tags.is_empty() && !self.tags.iter().any(|t| task.tags.contains(t)) {
            return false;
        }
        if self.due_date_from.is_some() || self.due_date_to.is_some() {
            let Some(due) = task.due_date else {
                return false;
            };
            if self.due_date_from.is_some_and(|from| due < from)
                || self.due_date_to.is_some_and(|to| due > to)
            {
                return false;
            }
        }
        if let Some(needle) = self.search_needle() {
            let in_title = task.title.to_lowercase().contains(&needle);
            let in_description = task
                .description
                .as_deref()
                .is_some_and(|d| d.to_lowercase().contains(&needle));
            if !in_title && !in_description {
                return false;
            }
        }
        true
    }

    /// Number of active criteria; the due-date range counts once.
    #[must_use]
    pub fn active_count(&self) -> usize {
        [
            !self.status.is_empty(),
            !self.priority.is_empty(),
            !self.assignee_id.is_empty(),
            !self.project_id.is_empty(),
            !self.tags.is_empty(),
            self.due_date_from.is_some() || self.due_date_to.is_some(),
            self.search_needle().is_some(),
        ]
        .into_iter()
        .filter(|active| *active)
        .count()
    }

    /// True when no criterion is active.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.active_count() == 0
    }

    fn search_needle(&self) -> Option<String> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase)
    }
}
