//! Snapshot persistence for the todo list.
//!
//! The whole list is stored as one JSON array in a named durable slot:
//!
//! ```json
//! [{"id": "…", "title": "…", "text": "…", "isDone": false, "currentStatus": "Not Started"}]
//! ```
//!
//! Every applied change rewrites the slot in full. The slot is read once, when
//! the store is opened.

use crate::types::Todo;
use std::sync::Arc;
use thiserror::Error;
use todo_store_core::slot::{SlotError, SlotStore};

/// Errors that can occur while loading or saving a snapshot
#[derive(Error, Debug)]
pub enum SnapshotError {
    /// The durable slot could not be read or written
    #[error("Slot error: {0}")]
    Slot(#[from] SlotError),

    /// The stored bytes are not a JSON array of todos
    #[error("Malformed snapshot: {0}")]
    Decode(#[source] serde_json::Error),

    /// The list could not be serialized
    #[error("Failed to encode snapshot: {0}")]
    Encode(#[source] serde_json::Error),
}

/// Serialize a list of todos to the stored JSON form
///
/// # Errors
///
/// Returns [`SnapshotError::Encode`] if serialization fails.
pub fn encode(todos: &[Todo]) -> Result<Vec<u8>, SnapshotError> {
    serde_json::to_vec(todos).map_err(SnapshotError::Encode)
}

/// Parse the stored JSON form back into a list of todos
///
/// # Errors
///
/// Returns [`SnapshotError::Decode`] if the bytes are not a JSON array of
/// todo records.
pub fn decode(bytes: &[u8]) -> Result<Vec<Todo>, SnapshotError> {
    serde_json::from_slice(bytes).map_err(SnapshotError::Decode)
}

/// A todo list bound to one key of a [`SlotStore`]
#[derive(Clone)]
pub struct SnapshotSlot {
    slots: Arc<dyn SlotStore>,
    key: Arc<str>,
}

impl SnapshotSlot {
    /// Bind `key` in `slots`
    #[must_use]
    pub fn new(slots: Arc<dyn SlotStore>, key: impl Into<Arc<str>>) -> Self {
        Self {
            slots,
            key: key.into(),
        }
    }

    /// The slot key
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Read and decode the stored list
    ///
    /// Returns `Ok(None)` when the slot has never been written.
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotError`] if the slot can not be read or holds
    /// something other than a list of todos.
    pub async fn load(&self) -> Result<Option<Vec<Todo>>, SnapshotError> {
        match self.slots.read(&self.key).await? {
            Some(bytes) => decode(&bytes).map(Some),
            None => Ok(None),
        }
    }

    /// Encode and store `todos`, replacing the previous contents
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotError`] if encoding or the slot write fails.
    pub async fn save(&self, todos: &[Todo]) -> Result<(), SnapshotError> {
        let bytes = encode(todos)?;
        self.slots.write(&self.key, bytes).await?;
        Ok(())
    }
}

impl std::fmt::Debug for SnapshotSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SnapshotSlot")
            .field("key", &self.key)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{TodoId, TodoStatus};
    use todo_store_testing::InMemorySlotStore;

    fn sample() -> Vec<Todo> {
        let mut second = Todo::new(TodoId::from("b"), "Walk dog", "around the block");
        second.is_done = true;
        second.current_status = TodoStatus::InProgress;
        vec![Todo::new(TodoId::from("a"), "Buy milk", ""), second]
    }

    #[test]
    fn encode_writes_camel_case_array() {
        let bytes = encode(&sample()).unwrap();
        let text = String::from_utf8(bytes).unwrap();

        assert!(text.starts_with('['));
        assert!(text.contains(r#""isDone":true"#));
        assert!(text.contains(r#""currentStatus":"In Progress""#));
        assert_eq!(decode(text.as_bytes()).unwrap(), sample());
    }

    #[test]
    fn decode_accepts_legacy_records() {
        let stored = br#"[
            {"id": 1718000000000, "title": "Learn", "text": "", "isDone": false,
             "status": ["In Progress", "Not Started"], "currentStatus": "Not Started"},
            {"id": "x", "title": "Ship", "currentStatus": "InProgress"}
        ]"#;

        let todos = decode(stored).unwrap();
        assert_eq!(todos.len(), 2);
        assert_eq!(todos[0].id, TodoId::from("1718000000000"));
        assert_eq!(todos[1].current_status, TodoStatus::InProgress);
        assert_eq!(todos[1].text, "");
    }

    #[test]
    fn decode_rejects_non_arrays() {
        assert!(matches!(decode(b"null"), Err(SnapshotError::Decode(_))));
        assert!(matches!(decode(b"{}"), Err(SnapshotError::Decode(_))));
        assert!(matches!(decode(b"not json"), Err(SnapshotError::Decode(_))));
        assert!(matches!(
            decode(br#"[{"id": "1"}]"#),
            Err(SnapshotError::Decode(_))
        ));
    }

    #[tokio::test]
    async fn load_missing_slot_is_none() {
        let slot = SnapshotSlot::new(Arc::new(InMemorySlotStore::new()), "todos");
        assert!(slot.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn save_then_load() {
        let slots = Arc::new(InMemorySlotStore::new());
        let slot = SnapshotSlot::new(slots.clone(), "todos");

        slot.save(&sample()).await.unwrap();

        assert_eq!(slots.write_count(), 1);
        assert_eq!(slot.load().await.unwrap(), Some(sample()));
    }

    #[tokio::test]
    async fn slot_failures_surface_as_slot_errors() {
        let slots = Arc::new(InMemorySlotStore::new());
        slots.set_fail_writes(true);
        slots.set_fail_reads(true);
        let slot = SnapshotSlot::new(slots, "todos");

        assert!(matches!(
            slot.save(&sample()).await,
            Err(SnapshotError::Slot(_))
        ));
        assert!(matches!(slot.load().await, Err(SnapshotError::Slot(_))));
    }
}
