//! Opaque string identifiers for projects, sections, tasks, and users.
//!
//! The backend owns identity, so ids are kept as the strings it hands out
//! (`"proj-1"`, `"sec-1-2"`, UUIDs, ...). Each kind gets its own newtype so
//! a section id can never be passed where a task id is expected.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wraps an existing identifier string.
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Returns the identifier as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }
    };
}

string_id!(
    /// Identifier of a project. Tasks may belong to several projects.
    ProjectId
);

string_id!(
    /// Identifier of a section (board column) within a project.
    SectionId
);

string_id!(
    /// Identifier of a task.
    TaskId
);

string_id!(
    /// Identifier of a user (assignee or comment author).
    UserId
);

impl TaskId {
    /// Mints a fresh, time-ordered task id (UUID v7).
    ///
    /// Only the authoritative side (the ledger) mints ids; clients always
    /// use the id returned by a create call.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::now_v7().to_string())
    }
}
