//! Status derived from the destination section of a cross-section move.
//!
//! Explicit section-id bindings win. Otherwise the section's display name
//! is looked up in a fixed table (case-insensitive, surrounding whitespace
//! ignored). A section matching neither yields no status at all.

use std::collections::HashMap;

use taskboard_proto::{Section, SectionId, TaskStatus};

/// Display names recognized without an explicit binding.
const NAMED_STATUSES: [(&str, TaskStatus); 5] = [
    ("to do", TaskStatus::Todo),
    ("in progress", TaskStatus::InProgress),
    ("in review", TaskStatus::InReview),
    ("done", TaskStatus::Done),
    ("blocked", TaskStatus::Blocked),
];

/// Status for a section display name, if the name is recognized.
#[must_use]
pub fn status_for_name(name: &str) -> Option<TaskStatus> {
    let name = name.trim();
    NAMED_STATUSES
        .iter()
        .find(|(known, _)| known.eq_ignore_ascii_case(name))
        .map(|&(_, status)| status)
}

/// Section -> status bindings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusBinding {
    by_section: HashMap<SectionId, TaskStatus>,
}

impl StatusBinding {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds a section id to a status, overriding its display name.
    #[must_use]
    pub fn bind(mut self, section: impl Into<SectionId>, status: TaskStatus) -> Self {
        self.insert(section.into(), status);
        self
    }

    pub fn insert(&mut self, section: SectionId, status: TaskStatus) {
        self.by_section.insert(section, status);
    }

    /// Status a task takes when moved into `section`.
    #[must_use]
    pub fn status_for(&self, section: &Section) -> Option<TaskStatus> {
        self.by_section
            .get(&section.id)
            .copied()
            .or_else(|| status_for_name(&section.name))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.by_section.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_section.is_empty()
    }
}

impl FromIterator<(SectionId, TaskStatus)> for StatusBinding {
    fn from_iter<I: IntoIterator<Item = (SectionId, TaskStatus)>>(iter: I) -> Self {
        Self {
            by_section: iter.into_iter().collect(),
        }
    }
}
