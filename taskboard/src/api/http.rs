//! JSON-over-HTTP collaborator.
//!
//! Talks to the REST backend under a base URL (for example
//! `http://127.0.0.1:8080/api/v1`). Every response is an
//! [`ApiResponse`] envelope; non-success statuses and `success = false`
//! envelopes become [`ApiError`]s carrying the server's message.

use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::Serialize;
use serde::de::{DeserializeOwned, IgnoredAny};
use url::Url;

use taskboard_proto::envelope::{
    ApiResponse, CreateTaskRequest, Page, StatusUpdateRequest, TaskQuery,
};
use taskboard_proto::{ProjectId, Section, SectionId, Task, TaskId, TaskPatch, TaskStatus};

use super::{ApiError, TaskApi};

/// Default base URL of the REST backend.
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8080/api/v1";

/// [`TaskApi`] over HTTP.
#[derive(Debug, Clone)]
pub struct HttpTaskApi {
    client: Client,
    base: Url,
}

impl HttpTaskApi {
    /// Builds a client for the backend rooted at `base`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Transport`] if `base` cannot carry path
    /// segments (e.g. `mailto:`) or the HTTP client cannot be built.
    pub fn new(base: Url, timeout: Duration) -> Result<Self, ApiError> {
        if base.cannot_be_a_base() {
            return Err(ApiError::Transport(format!("not a base URL: {base}")));
        }
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        Ok(Self { client, base })
    }

    /// The base URL every endpoint is resolved against.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|()| ApiError::Transport(format!("not a base URL: {}", self.base)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, segments: &[&str]) -> Result<RequestBuilder, ApiError> {
        let url = self.endpoint(segments)?;
        tracing::debug!(%method, %url, "api request");
        Ok(self.client.request(method, url))
    }

    fn json<B: Serialize + ?Sized>(
        &self,
        method: Method,
        segments: &[&str],
        body: &B,
    ) -> Result<RequestBuilder, ApiError> {
        Ok(self.request(method, segments)?.json(body))
    }

    /// Sends a request and unwraps the response envelope.
    async fn execute<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<Option<T>, ApiError> {
        let response = request
            .send()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        if !status.is_success() {
            let err = status_error(status, &body);
            tracing::debug!(status = status.as_u16(), error = %err, "api request failed");
            return Err(err);
        }

        let envelope: ApiResponse<T> =
            serde_json::from_slice(&body).map_err(|e| ApiError::Decode(e.to_string()))?;
        if !envelope.success {
            return Err(ApiError::Rejected(
                envelope
                    .message
                    .unwrap_or_else(|| "request rejected".to_string()),
            ));
        }
        Ok(envelope.data)
    }

    async fn execute_data<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, ApiError> {
        self.execute(request)
            .await?
            .ok_or_else(|| ApiError::Decode("response carried no data".to_string()))
    }
}

/// Maps a non-success status to an error, preferring the envelope's message.
fn status_error(status: StatusCode, body: &[u8]) -> ApiError {
    let message = serde_json::from_slice::<ApiResponse<IgnoredAny>>(body)
        .ok()
        .and_then(|envelope| envelope.message)
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_string()
        });
    match status {
        StatusCode::NOT_FOUND => ApiError::NotFound(message),
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => ApiError::Invalid(message),
        _ => ApiError::Status {
            status: status.as_u16(),
            message,
        },
    }
}

impl TaskApi for HttpTaskApi {
    async fn fetch_sections(&self, project: &ProjectId) -> Result<Vec<Section>, ApiError> {
        let request = self.request(Method::GET, &["projects", project.as_str(), "sections"])?;
        self.execute_data(request).await
    }

    async fn fetch_tasks(
        &self,
        section: &SectionId,
        page: usize,
        size: usize,
    ) -> Result<Page<Task>, ApiError> {
        let query = TaskQuery {
            section_id: section.clone(),
            page,
            size,
        };
        let request = self.request(Method::GET, &["tasks"])?.query(&query);
        self.execute_data(request).await
    }

    async fn create_task(&self, request: &CreateTaskRequest) -> Result<Task, ApiError> {
        let request = self.json(Method::POST, &["tasks"], request)?;
        self.execute_data(request).await
    }

    async fn update_task(&self, id: &TaskId, patch: &TaskPatch) -> Result<Task, ApiError> {
        let request = self.json(Method::PUT, &["tasks", id.as_str()], patch)?;
        self.execute_data(request).await
    }

    async fn update_task_status(&self, id: &TaskId, status: TaskStatus) -> Result<Task, ApiError> {
        let body = StatusUpdateRequest { status };
        let request = self.json(Method::PUT, &["tasks", id.as_str(), "status"], &body)?;
        self.execute_data(request).await
    }

    async fn delete_task(&self, id: &TaskId) -> Result<(), ApiError> {
        let request = self.request(Method::DELETE, &["tasks", id.as_str()])?;
        self.execute::<IgnoredAny>(request).await.map(|_| ())
    }
}
