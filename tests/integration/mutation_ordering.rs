//! Ordering of overlapping optimistic operations.
//!
//! Two moves out of the same section, where the first one fails: the
//! first continuation's rollback refetches both sections while the second
//! move has not been persisted yet. Without per-section ordering the
//! refetch lands on top of the second move's optimistic state and the
//! board silently diverges from the backend. With serialized ordering the
//! second move is replayed onto the refreshed lanes and both sides agree.
//!
//! The same holds for a move into a section whose tasks are still being
//! fetched by a load: the move waits for the lane to be installed and is
//! replayed on top of it.
//!
//! These tests rely on the single-threaded test runtime running spawned
//! continuations in spawn order.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::sync::Arc;

use taskboard::api::memory::{ApiCall, InMemoryTaskApi, Operation};
use taskboard::api::{ApiError, TaskApi};
use taskboard::board::{BoardError, BoardOptions, BoardStore, MutationOrdering};
use taskboard_proto::envelope::{CreateTaskRequest, Page};
use taskboard_proto::ledger::Ledger;
use taskboard_proto::{ProjectId, Section, SectionId, Task, TaskId, TaskPatch, TaskStatus};
use tokio::sync::watch;

type Store = BoardStore<Arc<InMemoryTaskApi>>;

fn sec(id: &str) -> SectionId {
    SectionId::from(id)
}

fn task(id: &str) -> TaskId {
    TaskId::from(id)
}

/// `s1` "Backlog" = [t1, t2, t3], `s2` "Later" = []. Neither name maps to
/// a status, so moves only issue placement updates.
fn fixture_ledger() -> Ledger {
    let mut ledger = Ledger::new();
    ledger.add_section(Section::new("s1", "p", "Backlog", 0));
    ledger.add_section(Section::new("s2", "p", "Later", 1));
    for id in ["t1", "t2", "t3"] {
        ledger
            .insert_task(&sec("s1"), Task::new(id, format!("Task {id}"), "p"))
            .unwrap();
    }
    ledger
}

async fn store_with(ordering: MutationOrdering) -> Store {
    let options = BoardOptions {
        ordering,
        ..BoardOptions::default()
    };
    let store = BoardStore::with_options(Arc::new(InMemoryTaskApi::new(fixture_ledger())), options);
    store.load_sections(&ProjectId::from("p")).await;
    store.api().clear_calls();
    store
}

fn local_ids<A: TaskApi + 'static>(store: &BoardStore<A>, section: &str) -> Vec<String> {
    store
        .tasks(&sec(section))
        .iter()
        .map(|t| t.id.to_string())
        .collect()
}

fn remote_ids(store: &Store, section: &str) -> Vec<String> {
    ledger_ids(&store.api().ledger(), section)
}

fn ledger_ids(ledger: &Ledger, section: &str) -> Vec<String> {
    ledger
        .lane(&sec(section))
        .unwrap()
        .iter()
        .map(ToString::to_string)
        .collect()
}

/// Reads one section's tasks as soon as asked, but hands them over only
/// once released. Everything else goes straight to the ledger.
struct HeldLane {
    api: InMemoryTaskApi,
    held: SectionId,
    released: watch::Sender<bool>,
}

impl HeldLane {
    fn new(ledger: Ledger, held: &str) -> Self {
        Self {
            api: InMemoryTaskApi::new(ledger),
            held: sec(held),
            released: watch::Sender::new(false),
        }
    }

    fn release(&self) {
        self.released.send_replace(true);
    }
}

impl TaskApi for HeldLane {
    async fn fetch_sections(&self, project: &ProjectId) -> Result<Vec<Section>, ApiError> {
        self.api.fetch_sections(project).await
    }

    async fn fetch_tasks(
        &self,
        section: &SectionId,
        page: usize,
        size: usize,
    ) -> Result<Page<Task>, ApiError> {
        let response = self.api.fetch_tasks(section, page, size).await;
        if section == &self.held {
            let mut released = self.released.subscribe();
            let _ = released.wait_for(|released| *released).await;
        }
        response
    }

    async fn create_task(&self, request: &CreateTaskRequest) -> Result<Task, ApiError> {
        self.api.create_task(request).await
    }

    async fn update_task(&self, id: &TaskId, patch: &TaskPatch) -> Result<Task, ApiError> {
        self.api.update_task(id, patch).await
    }

    async fn update_task_status(&self, id: &TaskId, status: TaskStatus) -> Result<Task, ApiError> {
        self.api.update_task_status(id, status).await
    }

    async fn delete_task(&self, id: &TaskId) -> Result<(), ApiError> {
        self.api.delete_task(id).await
    }
}

/// Moves t1 then t2 into `s2`; the first persist is rejected.
async fn race(store: &Store) {
    store
        .api()
        .fail_for(Operation::UpdateTask, "t1", "Task is locked");

    let first = store.move_task(&task("t1"), &sec("s1"), &sec("s2"), 0);
    let second = store.move_task(&task("t2"), &sec("s1"), &sec("s2"), 1);
    assert_eq!(local_ids(store, "s1"), ["t3"]);
    assert_eq!(local_ids(store, "s2"), ["t1", "t2"]);

    first.settled().await;
    second.settled().await;
}

#[tokio::test]
async fn unordered_rollback_clobbers_later_move() {
    let store = store_with(MutationOrdering::Unordered).await;

    race(&store).await;

    // The backend applied the second move...
    assert_eq!(remote_ids(&store, "s1"), ["t1", "t3"]);
    assert_eq!(remote_ids(&store, "s2"), ["t2"]);
    // ...but the first move's refetch ran before it and erased it locally.
    assert_eq!(local_ids(&store, "s1"), ["t1", "t2", "t3"]);
    assert!(local_ids(&store, "s2").is_empty());
}

#[tokio::test]
async fn serialized_replays_later_move_after_rollback() {
    let store = store_with(MutationOrdering::Serialized).await;

    race(&store).await;

    assert_eq!(local_ids(&store, "s1"), remote_ids(&store, "s1"));
    assert_eq!(local_ids(&store, "s2"), remote_ids(&store, "s2"));
    assert_eq!(local_ids(&store, "s1"), ["t1", "t3"]);
    assert_eq!(local_ids(&store, "s2"), ["t2"]);
    assert_eq!(
        store.error(),
        Some(BoardError::MoveTask(ApiError::Rejected(
            "Task is locked".to_string()
        )))
    );

    // The replayed move persists the index it actually landed at.
    let placements: Vec<ApiCall> = store
        .api()
        .calls()
        .into_iter()
        .filter(|c| matches!(c, ApiCall::UpdateTask(..)))
        .collect();
    assert_eq!(
        placements,
        [
            ApiCall::UpdateTask(task("t1"), TaskPatch::placement(sec("s2"), 0)),
            ApiCall::UpdateTask(task("t2"), TaskPatch::placement(sec("s2"), 0)),
        ]
    );
}

#[tokio::test]
async fn serialized_persists_in_call_order() {
    let store = store_with(MutationOrdering::Serialized).await;
    store.api().pause();

    let first = store.update_task_order(&sec("s1"), &task("t3"), 0);
    let second = store.update_task_order(&sec("s1"), &task("t1"), 2);
    assert_eq!(local_ids(&store, "s1"), ["t3", "t2", "t1"]);

    tokio::task::yield_now().await;
    // Only the first continuation reached the collaborator.
    assert_eq!(
        store.api().calls(),
        [ApiCall::UpdateTask(task("t3"), TaskPatch::order(0))]
    );

    store.api().resume();
    first.settled().await;
    second.settled().await;

    assert_eq!(remote_ids(&store, "s1"), ["t3", "t2", "t1"]);
    assert_eq!(local_ids(&store, "s1"), remote_ids(&store, "s1"));
}

#[tokio::test]
async fn obsolete_intent_is_dropped_after_rollback() {
    let store = store_with(MutationOrdering::Serialized).await;
    store.api().fail(Operation::DeleteTask, "nope");
    // Deleting t2 remotely behind the board's back: the refetch after the
    // failed delete of t1 no longer contains it.
    store.api().ledger().delete(&task("t2")).unwrap();

    let first = store.delete_task(&task("t1"), &sec("s1"));
    let second = store.update_task_order(&sec("s1"), &task("t2"), 0);
    first.settled().await;
    second.settled().await;

    assert_eq!(local_ids(&store, "s1"), ["t1", "t3"]);
    assert!(
        store
            .api()
            .calls()
            .iter()
            .all(|c| !matches!(c, ApiCall::UpdateTask(..)))
    );
    assert!(matches!(store.error(), Some(BoardError::DeleteTask(_))));
}

#[tokio::test]
async fn independent_sections_do_not_wait() {
    let mut ledger = fixture_ledger();
    ledger.add_section(Section::new("s3", "p", "Someday", 2));
    ledger
        .insert_task(&sec("s3"), Task::new("t7", "Other", "p"))
        .unwrap();
    ledger
        .insert_task(&sec("s3"), Task::new("t8", "Another", "p"))
        .unwrap();
    let store = BoardStore::new(Arc::new(InMemoryTaskApi::new(ledger)));
    store.load_sections(&ProjectId::from("p")).await;
    store.api().clear_calls();

    store.api().pause();
    let blocked = store.update_task_order(&sec("s1"), &task("t3"), 0);
    let queued = store.update_task_order(&sec("s1"), &task("t2"), 0);
    let independent = store.update_task_order(&sec("s3"), &task("t8"), 0);
    tokio::task::yield_now().await;

    let calls = store.api().calls();
    assert_eq!(calls.len(), 2);
    assert!(calls.contains(&ApiCall::UpdateTask(task("t8"), TaskPatch::order(0))));

    store.api().resume();
    blocked.settled().await;
    queued.settled().await;
    independent.settled().await;
    assert_eq!(remote_ids(&store, "s1"), ["t2", "t3", "t1"]);
    assert_eq!(remote_ids(&store, "s3"), ["t8", "t7"]);
}

#[tokio::test]
async fn failure_across_reload_leaves_new_board_alone() {
    let store = store_with(MutationOrdering::Serialized).await;
    store.api().fail(Operation::UpdateTask, "nope");
    store.api().pause();

    let pending = store.move_task(&task("t1"), &sec("s1"), &sec("s2"), 0);
    tokio::task::yield_now().await;
    let reload = {
        let store = store.clone();
        tokio::spawn(async move { store.load_sections(&ProjectId::from("p")).await })
    };
    tokio::task::yield_now().await;
    assert!(store.is_loading());

    store.api().resume();
    pending.settled().await;
    reload.await.unwrap();

    assert_eq!(local_ids(&store, "s1"), ["t1", "t2", "t3"]);
    assert!(local_ids(&store, "s2").is_empty());
    assert!(store.error().is_none());
    assert!(!store.is_loading());
}

#[tokio::test]
async fn move_into_lane_still_loading_survives_its_install() {
    let store = BoardStore::new(HeldLane::new(fixture_ledger(), "s2"));
    let loader = {
        let store = store.clone();
        tokio::spawn(async move { store.load_sections(&ProjectId::from("p")).await })
    };
    tokio::task::yield_now().await;
    // `s1` is installed; the listing of `s2` was read but not delivered.
    assert!(store.is_loading());
    assert_eq!(local_ids(&store, "s1"), ["t1", "t2", "t3"]);

    let pending = store.move_task(&task("t1"), &sec("s1"), &sec("s2"), 0);
    assert_eq!(local_ids(&store, "s2"), ["t1"]);

    store.api().release();
    pending.settled().await;
    loader.await.unwrap();

    let remote = store.api().api.ledger().clone();
    assert_eq!(local_ids(&store, "s1"), ["t2", "t3"]);
    assert_eq!(local_ids(&store, "s2"), ["t1"]);
    assert_eq!(local_ids(&store, "s1"), ledger_ids(&remote, "s1"));
    assert_eq!(local_ids(&store, "s2"), ledger_ids(&remote, "s2"));
    assert_eq!(store.snapshot().partition.task_count(), 3);
    assert!(store.error().is_none());
    assert!(!store.is_loading());
    assert!(
        store
            .api()
            .api
            .calls()
            .contains(&ApiCall::UpdateTask(task("t1"), TaskPatch::placement(sec("s2"), 0)))
    );
}
