//! Response envelope, pagination, and request bodies of the REST API.
//!
//! Every endpoint answers with an [`ApiResponse`]. Successful responses
//! carry `data`; failures set `success = false` and a human-readable
//! `message`, optionally with per-field `errors`.

use serde::{Deserialize, Serialize};

use crate::ids::SectionId;
use crate::task::{NewTask, TaskStatus};

/// Default page size used when listing a section's tasks.
pub const DEFAULT_PAGE_SIZE: usize = 100;

/// A field-level error detail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// Offending field, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    /// What is wrong with it.
    pub message: String,
}

/// The envelope wrapping every API response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    /// Whether the request succeeded.
    pub success: bool,
    /// Payload on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    /// Human-readable message, always set on failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Field-level details on validation failures.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<ErrorDetail>,
}

impl<T> ApiResponse<T> {
    /// A successful response carrying `data`.
    pub const fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            errors: Vec::new(),
        }
    }

    /// A failed response with a message.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message.into()),
            errors: Vec::new(),
        }
    }

    /// Attaches field-level error details.
    #[must_use]
    pub fn with_errors(mut self, errors: Vec<ErrorDetail>) -> Self {
        self.errors = errors;
        self
    }
}

impl ApiResponse<()> {
    /// A successful response without payload.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            success: true,
            data: None,
            message: None,
            errors: Vec::new(),
        }
    }
}

/// One page of a listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub content: Vec<T>,
    pub total_elements: usize,
    pub total_pages: usize,
    pub page: usize,
    pub size: usize,
    pub first: bool,
    pub last: bool,
}

impl<T: Clone> Page<T> {
    /// Cuts page `page` of size `size` out of the full listing.
    ///
    /// A zero `size` is treated as one so the listing always terminates.
    #[must_use]
    pub fn slice(all: &[T], page: usize, size: usize) -> Self {
        let size = size.max(1);
        let total_elements = all.len();
        let total_pages = total_elements.div_ceil(size);
        let start = page.saturating_mul(size).min(total_elements);
        let end = start.saturating_add(size).min(total_elements);
        Self {
            content: all[start..end].to_vec(),
            total_elements,
            total_pages,
            page,
            size,
            first: page == 0,
            last: page + 1 >= total_pages,
        }
    }
}

/// Query string of `GET /tasks`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskQuery {
    pub section_id: SectionId,
    #[serde(default)]
    pub page: usize,
    #[serde(default = "default_page_size")]
    pub size: usize,
}

const fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

/// Body of `POST /tasks`: the task fields plus the target section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskRequest {
    #[serde(flatten)]
    pub task: NewTask,
    pub section_id: SectionId,
}

/// Body of `PUT /tasks/{id}/status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusUpdateRequest {
    pub status: TaskStatus,
}
