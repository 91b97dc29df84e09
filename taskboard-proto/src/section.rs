//! Board sections (kanban columns).

use serde::{Deserialize, Serialize};

use crate::ids::{ProjectId, SectionId};

/// An ordered bucket of tasks within a project.
///
/// Sections are created, renamed and reordered on the backend; clients only
/// ever receive them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    /// Section identifier.
    pub id: SectionId,
    /// Owning project.
    pub project_id: ProjectId,
    /// Display name (e.g. "To Do").
    pub name: String,
    /// Position among sibling sections, ascending.
    pub order: u32,
}

impl Section {
    /// Creates a section description.
    pub fn new(
        id: impl Into<SectionId>,
        project_id: impl Into<ProjectId>,
        name: impl Into<String>,
        order: u32,
    ) -> Self {
        Self {
            id: id.into(),
            project_id: project_id.into(),
            name: name.into(),
            order,
        }
    }
}

/// Sorts sections by their `order`, keeping the incoming order on ties.
pub fn sort_sections(sections: &mut [Section]) {
    sections.sort_by_key(|s| s.order);
}
