//! REST endpoints of the mock task board backend.
//!
//! Every route lives under [`API_PREFIX`] and answers with an
//! [`ApiResponse`] envelope, including on failure: unknown entities map to
//! `404`, validation failures and malformed requests to `400`.
//!
//! | Method   | Path                               | Body                    |
//! |----------|------------------------------------|-------------------------|
//! | `GET`    | `/projects/{id}/sections`          |                         |
//! | `GET`    | `/tasks?sectionId=&page=&size=`    |                         |
//! | `POST`   | `/tasks`                           | [`CreateTaskRequest`]   |
//! | `PUT`    | `/tasks/{id}`                      | [`TaskPatch`]           |
//! | `PUT`    | `/tasks/{id}/status`               | [`StatusUpdateRequest`] |
//! | `DELETE` | `/tasks/{id}`                      |                         |

use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, put};
use taskboard_proto::envelope::{
    ApiResponse, CreateTaskRequest, ErrorDetail, Page, StatusUpdateRequest, TaskQuery,
};
use taskboard_proto::ledger::LedgerError;
use taskboard_proto::task::ValidationError;
use taskboard_proto::{ProjectId, Section, SectionId, Task, TaskId, TaskPatch};

use crate::store::TaskStore;

/// Path prefix of every endpoint.
pub const API_PREFIX: &str = "/api/v1";

type Shared = State<Arc<TaskStore>>;

/// A failed request, rendered as an error envelope.
#[derive(Debug)]
pub struct ApiFailure {
    status: StatusCode,
    body: ApiResponse<()>,
}

impl ApiFailure {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            body: ApiResponse::error(message),
        }
    }
}

impl IntoResponse for ApiFailure {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

impl From<LedgerError> for ApiFailure {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::Invalid(invalid) => {
                let detail = ErrorDetail {
                    field: Some(invalid_field(&invalid).to_string()),
                    message: invalid.to_string(),
                };
                Self {
                    status: StatusCode::BAD_REQUEST,
                    body: ApiResponse::error(invalid.to_string()).with_errors(vec![detail]),
                }
            }
            not_found @ (LedgerError::ProjectNotFound(_)
            | LedgerError::SectionNotFound(_)
            | LedgerError::TaskNotFound(_)) => Self::new(StatusCode::NOT_FOUND, not_found.to_string()),
        }
    }
}

impl From<JsonRejection> for ApiFailure {
    fn from(rejection: JsonRejection) -> Self {
        Self::new(rejection.status(), rejection.body_text())
    }
}

impl From<QueryRejection> for ApiFailure {
    fn from(rejection: QueryRejection) -> Self {
        Self::new(rejection.status(), rejection.body_text())
    }
}

const fn invalid_field(err: &ValidationError) -> &'static str {
    match err {
        ValidationError::TitleEmpty | ValidationError::TitleTooLong => "title",
        ValidationError::NoProjects => "projectIds",
    }
}

type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiFailure>;

async fn list_sections(State(store): Shared, Path(project): Path<String>) -> ApiResult<Vec<Section>> {
    let project = ProjectId::from(project);
    let sections = store.sections(&project).await?;
    tracing::debug!(project = %project, count = sections.len(), "listed sections");
    Ok(Json(ApiResponse::ok(sections)))
}

async fn list_tasks(
    State(store): Shared,
    query: Result<Query<TaskQuery>, QueryRejection>,
) -> ApiResult<Page<Task>> {
    let Query(query) = query?;
    let page = store.page(&query.section_id, query.page, query.size).await?;
    tracing::debug!(
        section = %query.section_id,
        page = query.page,
        returned = page.content.len(),
        "listed tasks"
    );
    Ok(Json(ApiResponse::ok(page)))
}

async fn create_task(
    State(store): Shared,
    payload: Result<Json<CreateTaskRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<Task>>), ApiFailure> {
    let Json(request) = payload?;
    let task = store.create(&request).await?;
    tracing::info!(task = %task.id, section = %request.section_id, "task created");
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(task))))
}

async fn update_task(
    State(store): Shared,
    Path(id): Path<String>,
    payload: Result<Json<TaskPatch>, JsonRejection>,
) -> ApiResult<Task> {
    let Json(patch) = payload?;
    let id = TaskId::from(id);
    let task = store.update(&id, &patch).await?;
    let section = store.section_of(&id).await;
    tracing::info!(
        task = %id,
        section = section.as_ref().map_or("-", SectionId::as_str),
        order = ?patch.order,
        "task updated"
    );
    Ok(Json(ApiResponse::ok(task)))
}

async fn update_status(
    State(store): Shared,
    Path(id): Path<String>,
    payload: Result<Json<StatusUpdateRequest>, JsonRejection>,
) -> ApiResult<Task> {
    let Json(body) = payload?;
    let id = TaskId::from(id);
    let task = store.set_status(&id, body.status).await?;
    tracing::info!(task = %id, status = %body.status, "task status updated");
    Ok(Json(ApiResponse::ok(task)))
}

async fn delete_task(State(store): Shared, Path(id): Path<String>) -> ApiResult<()> {
    let id = TaskId::from(id);
    store.delete(&id).await?;
    tracing::info!(task = %id, "task deleted");
    Ok(Json(ApiResponse::empty()))
}

async fn not_found() -> ApiFailure {
    ApiFailure::new(StatusCode::NOT_FOUND, "Resource not found")
}

/// Builds the application router over a shared store.
pub fn router(store: Arc<TaskStore>) -> Router {
    let api = Router::new()
        .route("/projects/{id}/sections", get(list_sections))
        .route("/tasks", get(list_tasks).post(create_task))
        .route("/tasks/{id}", put(update_task).delete(delete_task))
        .route("/tasks/{id}/status", put(update_status));

    Router::new()
        .nest(API_PREFIX, api)
        .fallback(not_found)
        .with_state(store)
}

/// Starts the server on `addr` with a store seeded with the demo projects.
///
/// # Errors
///
/// Returns an error if the address cannot be bound.
pub async fn start_server(
    addr: &str,
) -> Result<(std::net::SocketAddr, tokio::task::JoinHandle<()>), Box<dyn std::error::Error + Send + Sync>>
{
    start_server_with_state(addr, Arc::new(TaskStore::demo())).await
}

/// Starts the server on `addr` over the given store.
///
/// Returns the bound address (useful with port `0`) and the handle of the
/// serving task.
///
/// # Errors
///
/// Returns an error if the address cannot be bound.
pub async fn start_server_with_state(
    addr: &str,
    store: Arc<TaskStore>,
) -> Result<(std::net::SocketAddr, tokio::task::JoinHandle<()>), Box<dyn std::error::Error + Send + Sync>>
{
    let app = router(store);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    let bound_addr = listener.local_addr()?;

    let handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!(error = %e, "task board server error");
        }
    });

    Ok((bound_addr, handle))
}

/// Starts the demo server in-process on an OS-assigned port.
#[cfg(test)]
pub async fn start_test_server() -> (std::net::SocketAddr, tokio::task::JoinHandle<()>) {
    start_server("127.0.0.1:0")
        .await
        .expect("failed to start test server")
}
