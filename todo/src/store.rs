//! The todo store: the operation surface used by a rendering layer.
//!
//! [`TodoStore`] wraps the generic runtime [`Store`] running [`TodoReducer`].
//! Each operation is one atomic transition: the command is reduced, the
//! resulting write to the durable slot completes, then subscribers are told
//! about the new list. Operations are serialized, so writes land in the same
//! order as the changes that caused them.

use crate::config::{ConfigError, TodoConfig};
use crate::persistence::SnapshotSlot;
use crate::reducer::{TodoEnvironment, TodoReducer};
use crate::types::{Todo, TodoAction, TodoId, TodoPatch, TodoSnapshot, TodoState};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex};
use todo_store_core::environment::IdGenerator;
use todo_store_core::slot::SlotStore;
use todo_store_runtime::{Store, StoreError};

/// Title of the example todo added when seeding is enabled
pub const EXAMPLE_TITLE: &str = "Learn the todo store";

/// Text of the example todo added when seeding is enabled
pub const EXAMPLE_TEXT: &str =
    "Add a few todos, move them through their statuses and mark them done.";

/// Ids drawn per add before giving up on finding a free one
const MAX_ID_ATTEMPTS: usize = 64;

/// Runtime store specialised for the todo list
pub type TodoRuntime = Store<TodoState, TodoAction, TodoEnvironment, TodoReducer>;

/// Observable, persisted todo list
///
/// Any number of independent stores may exist at once; each owns its state
/// and is bound to one slot.
pub struct TodoStore {
    runtime: TodoRuntime,
    ids: Arc<dyn IdGenerator>,
    updates: watch::Sender<TodoSnapshot>,
    gate: Mutex<()>,
    shutdown_timeout: Duration,
}

impl TodoStore {
    /// Open a store bound to `config.slot_key` in `slots`
    ///
    /// The initial list is empty, or holds one example todo when
    /// `config.seed_example` is set. The slot is then read once: a stored
    /// list that is present, well-formed and non-empty replaces the initial
    /// list. A missing, unreadable or malformed slot is logged and skipped.
    /// Opening never writes to the slot.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] when `config` fails
    /// [`TodoConfig::validate`], such as a slot key the slot store could
    /// never write.
    pub async fn open(
        config: &TodoConfig,
        slots: Arc<dyn SlotStore>,
        ids: Arc<dyn IdGenerator>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let snapshot_slot = SnapshotSlot::new(slots, config.slot_key.as_str());

        let mut initial = if config.seed_example {
            vec![Todo::new(
                TodoId::new(ids.next_id()),
                EXAMPLE_TITLE,
                EXAMPLE_TEXT,
            )]
        } else {
            Vec::new()
        };

        match snapshot_slot.load().await {
            Ok(Some(stored)) if !stored.is_empty() => {
                tracing::info!(
                    key = snapshot_slot.key(),
                    count = stored.len(),
                    "Restored todos from slot"
                );
                initial = stored;
            },
            Ok(Some(_)) => {
                tracing::debug!(key = snapshot_slot.key(), "Stored list is empty, keeping defaults");
            },
            Ok(None) => {
                tracing::debug!(key = snapshot_slot.key(), "No stored list, keeping defaults");
            },
            Err(error) => {
                metrics::counter!("todo.restore.failures").increment(1);
                tracing::warn!(
                    key = snapshot_slot.key(),
                    %error,
                    "Ignoring unusable stored list, keeping defaults"
                );
            },
        }

        let state = TodoState::with_todos(config.insert_order, initial);
        let (updates, _) = watch::channel(state.snapshot());
        let runtime = Store::new(state, TodoReducer::new(), TodoEnvironment::new(snapshot_slot));

        Ok(Self {
            runtime,
            ids,
            updates,
            gate: Mutex::new(()),
            shutdown_timeout: config.shutdown_timeout(),
        })
    }

    /// Add a todo with a fresh id
    ///
    /// Returns the new id, or `None` when the title is blank. Generated ids
    /// already held by a stored todo are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ShutdownInProgress`] after [`TodoStore::shutdown`].
    pub async fn add(&self, title: &str, text: Option<&str>) -> Result<Option<TodoId>, StoreError> {
        let _gate = self.gate.lock().await;

        let Some(id) = self.fresh_id().await else {
            return Ok(None);
        };
        let applied = self
            .apply_locked(TodoAction::AddTodo {
                id: id.clone(),
                title: title.to_string(),
                text: text.map(ToString::to_string),
            })
            .await?;
        Ok(applied.then_some(id))
    }

    /// Edit the title and/or text of a todo
    ///
    /// Returns whether anything changed. Unknown ids and empty patches are
    /// ignored.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ShutdownInProgress`] after [`TodoStore::shutdown`].
    pub async fn update(&self, id: &TodoId, patch: TodoPatch) -> Result<bool, StoreError> {
        self.apply(TodoAction::UpdateTodo {
            id: id.clone(),
            patch,
        })
        .await
    }

    /// Remove a todo; returns whether it existed
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ShutdownInProgress`] after [`TodoStore::shutdown`].
    pub async fn remove(&self, id: &TodoId) -> Result<bool, StoreError> {
        self.apply(TodoAction::RemoveTodo { id: id.clone() }).await
    }

    /// Flip the done flag of a todo; returns whether it existed
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ShutdownInProgress`] after [`TodoStore::shutdown`].
    pub async fn toggle_done(&self, id: &TodoId) -> Result<bool, StoreError> {
        self.apply(TodoAction::ToggleDone { id: id.clone() }).await
    }

    /// Move a todo to its next status; returns whether it existed
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ShutdownInProgress`] after [`TodoStore::shutdown`].
    pub async fn advance_status(&self, id: &TodoId) -> Result<bool, StoreError> {
        self.apply(TodoAction::AdvanceStatus { id: id.clone() }).await
    }

    /// Remove every todo
    ///
    /// Always counts as a change, even when the list is already empty.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ShutdownInProgress`] after [`TodoStore::shutdown`].
    pub async fn clear(&self) -> Result<(), StoreError> {
        self.apply(TodoAction::ClearTodos).await.map(|_| ())
    }

    /// Replace the whole list
    ///
    /// An empty `records` is ignored. Records repeating an earlier id are
    /// dropped. Returns whether the list was replaced.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ShutdownInProgress`] after [`TodoStore::shutdown`].
    pub async fn restore(&self, records: Vec<Todo>) -> Result<bool, StoreError> {
        self.apply(TodoAction::RestoreTodos { todos: records }).await
    }

    /// Current list
    ///
    /// The returned snapshot never changes, whatever happens to the store
    /// afterwards.
    pub async fn snapshot(&self) -> TodoSnapshot {
        self.runtime.state(TodoState::snapshot).await
    }

    /// Look up one todo
    pub async fn get(&self, id: &TodoId) -> Option<Todo> {
        self.runtime.state(|state| state.get(id).cloned()).await
    }

    /// Number of changes applied since the store was opened
    pub async fn revision(&self) -> u64 {
        self.runtime.state(TodoState::revision).await
    }

    /// Watch the list
    ///
    /// The receiver starts at the current list and sees a new snapshot after
    /// every applied change, before the call making the change returns.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<TodoSnapshot> {
        self.updates.subscribe()
    }

    /// Timeout configured for [`TodoStore::shutdown`]
    #[must_use]
    pub const fn shutdown_timeout(&self) -> Duration {
        self.shutdown_timeout
    }

    /// Stop accepting changes and wait for outstanding writes
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ShutdownTimeout`] if writes are still running
    /// when `timeout` expires.
    pub async fn shutdown(&self, timeout: Duration) -> Result<(), StoreError> {
        let _gate = self.gate.lock().await;
        self.runtime.shutdown(timeout).await
    }

    /// Next generated id not held by any todo; call with the gate held
    async fn fresh_id(&self) -> Option<TodoId> {
        for _ in 0..MAX_ID_ATTEMPTS {
            let id = TodoId::new(self.ids.next_id());
            if !self.runtime.state(|state| state.contains(&id)).await {
                return Some(id);
            }
            tracing::debug!(%id, "Generated id is taken, drawing another");
        }

        metrics::counter!("todo.id.exhausted").increment(1);
        tracing::warn!(attempts = MAX_ID_ATTEMPTS, "No free todo id, add ignored");
        None
    }

    /// Reduce one command, wait for its write, then notify subscribers
    async fn apply(&self, action: TodoAction) -> Result<bool, StoreError> {
        let _gate = self.gate.lock().await;
        self.apply_locked(action).await
    }

    /// [`TodoStore::apply`] for callers already holding the gate
    async fn apply_locked(&self, action: TodoAction) -> Result<bool, StoreError> {
        let before = self.runtime.state(TodoState::revision).await;
        let mut handle = self.runtime.send(action).await?;
        handle.wait().await;

        let (after, snapshot) = self
            .runtime
            .state(|state| (state.revision(), state.snapshot()))
            .await;
        if after == before {
            return Ok(false);
        }

        self.updates.send_replace(snapshot);
        Ok(true)
    }
}

impl std::fmt::Debug for TodoStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TodoStore")
            .field("shutdown_timeout", &self.shutdown_timeout)
            .field("shutting_down", &self.runtime.is_shutting_down())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TodoStatus;
    use todo_store_testing::{InMemorySlotStore, SequentialIdGenerator};

    async fn open_with(slots: &Arc<InMemorySlotStore>, config: &TodoConfig) -> TodoStore {
        TodoStore::open(
            config,
            slots.clone(),
            Arc::new(SequentialIdGenerator::new()),
        )
        .await
        .unwrap()
    }

    async fn open_empty() -> (TodoStore, Arc<InMemorySlotStore>) {
        let slots = Arc::new(InMemorySlotStore::new());
        let store = open_with(&slots, &TodoConfig::default()).await;
        (store, slots)
    }

    fn stored(slots: &InMemorySlotStore) -> Vec<Todo> {
        crate::persistence::decode(&slots.get("todos").unwrap()).unwrap()
    }

    #[tokio::test]
    async fn add_persists_and_notifies() {
        let (store, slots) = open_empty().await;
        let mut updates = store.subscribe();

        let id = store.add("Buy milk", None).await.unwrap().unwrap();

        assert_eq!(id, TodoId::from("1"));
        assert!(updates.has_changed().unwrap());
        let seen = updates.borrow_and_update().clone();
        assert_eq!(seen.len(), 1);
        assert_eq!(stored(&slots), *seen);
        assert_eq!(slots.write_count(), 1);
    }

    #[tokio::test]
    async fn rejected_commands_neither_persist_nor_notify() {
        let (store, slots) = open_empty().await;
        let mut updates = store.subscribe();
        updates.borrow_and_update();

        assert_eq!(store.add("   ", None).await.unwrap(), None);
        assert!(!store.remove(&TodoId::from("nope")).await.unwrap());
        assert!(!store.toggle_done(&TodoId::from("nope")).await.unwrap());
        assert!(!store.advance_status(&TodoId::from("nope")).await.unwrap());
        assert!(
            !store
                .update(&TodoId::from("nope"), TodoPatch::title("x"))
                .await
                .unwrap()
        );
        assert!(!store.restore(Vec::new()).await.unwrap());

        assert_eq!(slots.write_count(), 0);
        assert!(!updates.has_changed().unwrap());
        assert_eq!(store.revision().await, 0);
    }

    #[tokio::test]
    async fn every_applied_change_rewrites_the_slot() {
        let (store, slots) = open_empty().await;

        let a = store.add("a", None).await.unwrap().unwrap();
        let b = store.add("b", Some("bee")).await.unwrap().unwrap();
        store.toggle_done(&a).await.unwrap();
        store.advance_status(&b).await.unwrap();
        store.update(&a, TodoPatch::title("A")).await.unwrap();

        assert_eq!(slots.write_count(), 5);
        assert_eq!(stored(&slots), *store.snapshot().await);

        store.remove(&b).await.unwrap();
        assert_eq!(stored(&slots), *store.snapshot().await);
        assert_eq!(slots.write_count(), 6);
    }

    #[tokio::test]
    async fn clear_on_empty_store_still_writes() {
        let (store, slots) = open_empty().await;

        store.clear().await.unwrap();

        assert_eq!(slots.get_string("todos").as_deref(), Some("[]"));
        assert!(store.snapshot().await.is_empty());
    }

    #[tokio::test]
    async fn write_failure_keeps_in_memory_change() {
        let (store, slots) = open_empty().await;
        slots.set_fail_writes(true);

        let id = store.add("Buy milk", None).await.unwrap().unwrap();

        assert_eq!(store.get(&id).await.unwrap().title, "Buy milk");
        assert!(slots.get("todos").is_none());

        slots.set_fail_writes(false);
        store.toggle_done(&id).await.unwrap();
        assert!(stored(&slots)[0].is_done);
    }

    #[tokio::test]
    async fn open_restores_non_empty_slot() {
        let slots = Arc::new(InMemorySlotStore::with_slot(
            "todos",
            r#"[{"id": 42, "title": "Stored", "currentStatus": "In Progress"}]"#,
        ));

        let store = open_with(&slots, &TodoConfig::default()).await;
        let todos = store.snapshot().await;

        assert_eq!(todos.len(), 1);
        assert_eq!(todos[0].id, TodoId::from("42"));
        assert_eq!(todos[0].current_status, TodoStatus::InProgress);
        assert_eq!(slots.write_count(), 0);
    }

    #[tokio::test]
    async fn open_keeps_seed_when_slot_is_empty_or_malformed() {
        let config = TodoConfig {
            seed_example: true,
            ..TodoConfig::default()
        };

        for contents in ["[]", "{not json", "null", r#"[{"title": 1}]"#] {
            let slots = Arc::new(InMemorySlotStore::with_slot("todos", contents));
            let store = open_with(&slots, &config).await;

            let todos = store.snapshot().await;
            assert_eq!(todos.len(), 1, "contents: {contents}");
            assert_eq!(todos[0].title, EXAMPLE_TITLE);
            assert_eq!(slots.get_string("todos").as_deref(), Some(contents));
        }
    }

    #[tokio::test]
    async fn open_survives_unreadable_slot() {
        let slots = Arc::new(InMemorySlotStore::new());
        slots.set_fail_reads(true);

        let store = open_with(&slots, &TodoConfig::default()).await;

        assert!(store.snapshot().await.is_empty());
        assert!(store.add("still works", None).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn seeded_id_is_never_reused() {
        let slots = Arc::new(InMemorySlotStore::new());
        let config = TodoConfig {
            seed_example: true,
            ..TodoConfig::default()
        };
        let store = open_with(&slots, &config).await;

        let id = store.add("next", None).await.unwrap().unwrap();

        assert_eq!(id, TodoId::from("2"));
        assert_eq!(store.snapshot().await.len(), 2);
    }

    #[tokio::test]
    async fn add_skips_generated_ids_already_restored() {
        let slots = Arc::new(InMemorySlotStore::with_slot(
            "todos",
            r#"[{"id": 1, "title": "Stored"}, {"id": "2", "title": "Also stored"}]"#,
        ));
        let store = open_with(&slots, &TodoConfig::default()).await;

        let id = store.add("Fresh", None).await.unwrap().unwrap();

        assert_eq!(id, TodoId::from("3"));
        let todos = store.snapshot().await;
        assert_eq!(todos.len(), 3);
        assert_eq!(store.get(&id).await.unwrap().title, "Fresh");
        assert_eq!(store.get(&TodoId::from("1")).await.unwrap().title, "Stored");
        assert_eq!(stored(&slots), *todos);
    }

    #[tokio::test]
    async fn add_gives_up_when_every_id_is_taken() {
        struct Constant;
        impl IdGenerator for Constant {
            fn next_id(&self) -> String {
                "1".to_string()
            }
        }

        let slots = Arc::new(InMemorySlotStore::with_slot(
            "todos",
            r#"[{"id": 1, "title": "Stored"}]"#,
        ));
        let store = TodoStore::open(&TodoConfig::default(), slots.clone(), Arc::new(Constant))
            .await
            .unwrap();

        assert_eq!(store.add("Fresh", None).await.unwrap(), None);
        assert_eq!(store.snapshot().await.len(), 1);
        assert_eq!(slots.write_count(), 0);
    }

    #[tokio::test]
    async fn open_rejects_invalid_slot_key() {
        let slots = Arc::new(InMemorySlotStore::new());

        for key in ["", "../escape", "a/b"] {
            let config = TodoConfig {
                slot_key: key.to_string(),
                ..TodoConfig::default()
            };
            let result =
                TodoStore::open(&config, slots.clone(), Arc::new(SequentialIdGenerator::new()))
                    .await;
            assert!(
                matches!(result, Err(ConfigError::InvalidSlotKey(_))),
                "key: {key:?}"
            );
        }
        assert_eq!(slots.write_count(), 0);
    }

    #[tokio::test]
    async fn restore_dedupes_and_persists() {
        let (store, slots) = open_empty().await;

        let records = vec![
            Todo::new(TodoId::from("x"), "one", ""),
            Todo::new(TodoId::from("x"), "dup", ""),
        ];
        assert!(store.restore(records).await.unwrap());

        assert_eq!(store.snapshot().await.len(), 1);
        assert_eq!(stored(&slots).len(), 1);
    }

    #[tokio::test]
    async fn snapshots_are_stable() {
        let (store, _slots) = open_empty().await;
        store.add("a", None).await.unwrap();
        let before = store.snapshot().await;

        store.clear().await.unwrap();

        assert_eq!(before.len(), 1);
        assert!(store.snapshot().await.is_empty());
    }

    #[tokio::test]
    async fn shutdown_rejects_further_changes() {
        let (store, slots) = open_empty().await;
        store.add("a", None).await.unwrap();

        store.shutdown(store.shutdown_timeout()).await.unwrap();

        assert!(matches!(
            store.add("b", None).await,
            Err(StoreError::ShutdownInProgress)
        ));
        assert_eq!(store.snapshot().await.len(), 1);
        assert_eq!(slots.write_count(), 1);
    }

    #[tokio::test]
    async fn stores_are_independent() {
        let (first, first_slots) = open_empty().await;
        let (second, second_slots) = open_empty().await;

        first.add("only here", None).await.unwrap();

        assert!(second.snapshot().await.is_empty());
        assert!(first_slots.contains_key("todos"));
        assert!(!second_slots.contains_key("todos"));
    }
}
