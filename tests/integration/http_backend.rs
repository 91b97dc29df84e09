//! End-to-end: the HTTP collaborator and the board store against the mock
//! REST server, started in-process on an OS-assigned port.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use taskboard::api::http::HttpTaskApi;
use taskboard::api::{ApiError, TaskApi, fetch_section};
use taskboard::board::{BoardError, BoardStore};
use taskboard_proto::envelope::CreateTaskRequest;
use taskboard_proto::{NewTask, ProjectId, SectionId, TaskId, TaskPatch, TaskStatus};
use taskboard_server::routes::{API_PREFIX, start_server_with_state};
use taskboard_server::store::TaskStore;
use tokio::task::JoinHandle;
use url::Url;

// ---------------------------------------------------------------------------
// Helper functions
// ---------------------------------------------------------------------------

struct Backend {
    addr: SocketAddr,
    store: Arc<TaskStore>,
    handle: JoinHandle<()>,
}

impl Drop for Backend {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn backend() -> Backend {
    let store = Arc::new(TaskStore::demo());
    let (addr, handle) = start_server_with_state("127.0.0.1:0", Arc::clone(&store))
        .await
        .expect("failed to start server");
    Backend {
        addr,
        store,
        handle,
    }
}

fn client(addr: SocketAddr) -> HttpTaskApi {
    let base = Url::parse(&format!("http://{addr}{API_PREFIX}")).unwrap();
    HttpTaskApi::new(base, Duration::from_secs(5)).unwrap()
}

fn sec(id: &str) -> SectionId {
    SectionId::from(id)
}

fn task(id: &str) -> TaskId {
    TaskId::from(id)
}

async fn remote_ids(api: &HttpTaskApi, section: &str) -> Vec<String> {
    fetch_section(api, &sec(section), 100)
        .await
        .unwrap()
        .iter()
        .map(|t| t.id.to_string())
        .collect()
}

// ---------------------------------------------------------------------------
// Collaborator
// ---------------------------------------------------------------------------

#[tokio::test]
async fn fetches_sections_and_walks_pages() {
    let backend = backend().await;
    let api = client(backend.addr);

    let sections = api.fetch_sections(&ProjectId::from("proj-1")).await.unwrap();
    assert_eq!(sections.len(), 5);
    assert_eq!(sections[1].name, "To Do");

    let page = api.fetch_tasks(&sec("sec-1-1"), 1, 2).await.unwrap();
    assert_eq!(page.total_elements, 3);
    assert!(page.last);

    let all = fetch_section(&api, &sec("sec-1-1"), 2).await.unwrap();
    let ids: Vec<&str> = all.iter().map(|t| t.id.as_str()).collect();
    assert_eq!(ids, ["task-1", "task-2", "task-3"]);
}

#[tokio::test]
async fn not_found_and_invalid_carry_server_messages() {
    let backend = backend().await;
    let api = client(backend.addr);

    let err = api.delete_task(&task("task-404")).await.unwrap_err();
    assert_eq!(err, ApiError::NotFound("task not found: task-404".to_string()));

    let request = CreateTaskRequest {
        task: NewTask::new("").with_project_ids(vec![ProjectId::from("proj-1")]),
        section_id: sec("sec-1-1"),
    };
    let err = api.create_task(&request).await.unwrap_err();
    assert_eq!(err, ApiError::Invalid("title is required".to_string()));
}

#[tokio::test]
async fn mutations_round_trip_through_the_server() {
    let backend = backend().await;
    let api = client(backend.addr);

    let request = CreateTaskRequest {
        task: NewTask::new("Launch checklist").with_project_ids(vec![ProjectId::from("proj-1")]),
        section_id: sec("sec-1-4"),
    };
    let created = api.create_task(&request).await.unwrap();
    assert_eq!(
        backend.store.section_of(&created.id).await,
        Some(sec("sec-1-4"))
    );

    let updated = api
        .update_task(&created.id, &TaskPatch::placement(sec("sec-1-5"), 0))
        .await
        .unwrap();
    assert_eq!(updated.id, created.id);
    assert_eq!(
        remote_ids(&api, "sec-1-5").await.first(),
        Some(&created.id.to_string())
    );

    let done = api
        .update_task_status(&created.id, TaskStatus::Done)
        .await
        .unwrap();
    assert_eq!(done.status, TaskStatus::Done);

    api.delete_task(&created.id).await.unwrap();
    assert_eq!(backend.store.section_of(&created.id).await, None);
}

#[tokio::test]
async fn unreachable_backend_is_a_transport_error() {
    let addr = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap()
    };
    let api = client(addr);

    let err = api.fetch_sections(&ProjectId::from("proj-1")).await.unwrap_err();
    assert!(matches!(err, ApiError::Transport(_)));

    let store = BoardStore::new(api);
    store.load_sections(&ProjectId::from("proj-1")).await;
    let error = store.error().unwrap();
    assert!(matches!(error, BoardError::FetchSections(ApiError::Transport(_))));
    assert_eq!(error.message(), "Failed to fetch sections");
}

// ---------------------------------------------------------------------------
// Board store over HTTP
// ---------------------------------------------------------------------------

#[tokio::test]
async fn board_loads_and_moves_over_http() {
    let backend = backend().await;
    let board = BoardStore::new(client(backend.addr));
    board.load_sections(&ProjectId::from("proj-1")).await;

    let state = board.snapshot();
    assert!(state.error.is_none());
    assert_eq!(state.partition.task_count(), 12);

    board
        .move_task(&task("task-1"), &sec("sec-1-1"), &sec("sec-1-5"), 0)
        .settled()
        .await;

    let api = client(backend.addr);
    assert_eq!(
        remote_ids(&api, "sec-1-5").await,
        ["task-1", "task-11", "task-12"]
    );
    assert_eq!(remote_ids(&api, "sec-1-1").await, ["task-2", "task-3"]);
    let moved = fetch_section(&api, &sec("sec-1-5"), 100).await.unwrap();
    assert_eq!(moved[0].status, TaskStatus::Done);
    assert!(board.error().is_none());
}

#[tokio::test]
async fn board_rolls_back_when_server_refuses() {
    let backend = backend().await;
    let board = BoardStore::new(client(backend.addr));
    board.load_sections(&ProjectId::from("proj-1")).await;

    // Someone else deleted the task in the meantime.
    backend.store.delete(&task("task-5")).await.unwrap();

    board
        .update_task_status(&task("task-5"), TaskStatus::Done, &sec("sec-1-2"))
        .settled()
        .await;

    let ids: Vec<String> = board
        .tasks(&sec("sec-1-2"))
        .iter()
        .map(|t| t.id.to_string())
        .collect();
    assert_eq!(ids, ["task-4", "task-6"]);
    let error = board.error().unwrap();
    assert!(matches!(error, BoardError::UpdateStatus(ApiError::NotFound(_))));
    assert_eq!(error.message(), "task not found: task-5");
}

#[tokio::test]
async fn board_creates_over_http() {
    let backend = backend().await;
    let board = BoardStore::new(client(backend.addr));
    board.load_sections(&ProjectId::from("proj-2")).await;

    let created = board
        .create_task(NewTask::new("Release to stores"), &sec("sec-2-4"))
        .await
        .unwrap();

    assert_eq!(created.project_ids, [ProjectId::from("proj-2")]);
    assert_eq!(board.tasks(&sec("sec-2-4")), [created.clone()]);
    assert_eq!(
        backend.store.section_of(&created.id).await,
        Some(sec("sec-2-4"))
    );
}
