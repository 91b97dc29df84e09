//! Shared data model and REST wire types for the task board.

pub mod demo;
pub mod envelope;
pub mod filter;
pub mod ids;
pub mod ledger;
pub mod section;
pub mod task;

pub use ids::{ProjectId, SectionId, TaskId, UserId};
pub use section::Section;
pub use task::{NewTask, Task, TaskPatch, TaskPriority, TaskStatus};
