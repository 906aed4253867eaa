//! # Todo Store Testing
//!
//! Testing utilities and helpers for the todo store.
//!
//! This crate provides:
//! - Mock implementations of Environment traits
//! - An in-memory durable slot with failure injection
//! - [`ReducerTest`], a Given-When-Then harness for reducers
//! - Assertion helpers for effects
//!
//! ## Example
//!
//! ```ignore
//! use todo_store_testing::{InMemorySlotStore, SequentialIdGenerator};
//!
//! #[tokio::test]
//! async fn test_add_persists() {
//!     let slot = Arc::new(InMemorySlotStore::new());
//!     let ids = Arc::new(SequentialIdGenerator::new());
//!     let store = TodoStore::open(&config, slot.clone(), ids).await.unwrap();
//!
//!     store.add("Buy milk", None).await.unwrap();
//!     assert!(slot.contains_key("todos"));
//! }
//! ```


/// Mock implementations of Environment traits and storage
pub mod mocks {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
    use std::sync::{Arc, RwLock};
    use todo_store_core::environment::IdGenerator;
    use todo_store_core::slot::{validate_key, SlotError, SlotFuture, SlotStore};

    /// Predictable ID generator for deterministic tests
    ///
    /// Produces `"1"`, `"2"`, `"3"`, … Clones share the same counter.
    ///
    /// # Example
    ///
    /// ```
    /// use todo_store_testing::mocks::SequentialIdGenerator;
    /// use todo_store_core::environment::IdGenerator;
    ///
    /// let ids = SequentialIdGenerator::new();
    /// assert_eq!(ids.next_id(), "1");
    /// assert_eq!(ids.next_id(), "2");
    /// ```
    #[derive(Debug, Clone, Default)]
    pub struct SequentialIdGenerator {
        next: Arc<AtomicU64>,
    }

    impl SequentialIdGenerator {
        /// Create a generator whose first id is `"1"`
        #[must_use]
        pub fn new() -> Self {
            Self::starting_at(1)
        }

        /// Create a generator whose first id is `first`
        #[must_use]
        pub fn starting_at(first: u64) -> Self {
            Self {
                next: Arc::new(AtomicU64::new(first)),
            }
        }
    }

    impl IdGenerator for SequentialIdGenerator {
        fn next_id(&self) -> String {
            self.next.fetch_add(1, Ordering::SeqCst).to_string()
        }
    }

    /// In-memory slot store for fast, deterministic testing.
    ///
    /// Counts writes and can be switched into a failing mode to exercise
    /// fire-and-forget persistence. Clones share the same data.
    ///
    /// # Example
    ///
    /// ```
    /// use todo_store_testing::mocks::InMemorySlotStore;
    /// use todo_store_core::slot::SlotStore;
    ///
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let slots = InMemorySlotStore::new();
    /// slots.write("todos", b"[]".to_vec()).await?;
    /// assert_eq!(slots.get("todos").as_deref(), Some(&b"[]"[..]));
    /// assert_eq!(slots.write_count(), 1);
    /// # Ok(())
    /// # }
    /// ```
    #[derive(Clone, Debug, Default)]
    pub struct InMemorySlotStore {
        data: Arc<RwLock<HashMap<String, Vec<u8>>>>,
        writes: Arc<AtomicUsize>,
        fail_writes: Arc<AtomicBool>,
        fail_reads: Arc<AtomicBool>,
    }

    impl InMemorySlotStore {
        /// Create a new empty in-memory slot store
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        /// Create a store whose `key` slot already holds `data`
        #[must_use]
        pub fn with_slot(key: &str, data: impl Into<Vec<u8>>) -> Self {
            let store = Self::new();
            store.put(key, data);
            store
        }

        /// Set a slot directly, bypassing the write counter
        pub fn put(&self, key: &str, data: impl Into<Vec<u8>>) {
            if let Ok(mut map) = self.data.write() {
                map.insert(key.to_string(), data.into());
            }
        }

        /// Current contents of a slot
        #[must_use]
        pub fn get(&self, key: &str) -> Option<Vec<u8>> {
            self.data.read().ok().and_then(|map| map.get(key).cloned())
        }

        /// Current contents of a slot as UTF-8 text
        #[must_use]
        pub fn get_string(&self, key: &str) -> Option<String> {
            self.get(key).and_then(|bytes| String::from_utf8(bytes).ok())
        }

        /// Check if a slot exists
        #[must_use]
        pub fn contains_key(&self, key: &str) -> bool {
            self.data
                .read()
                .map(|map| map.contains_key(key))
                .unwrap_or(false)
        }

        /// Number of successful `write` calls so far
        #[must_use]
        pub fn write_count(&self) -> usize {
            self.writes.load(Ordering::SeqCst)
        }

        /// Make every subsequent `write` fail (or succeed again)
        pub fn set_fail_writes(&self, fail: bool) {
            self.fail_writes.store(fail, Ordering::SeqCst);
        }

        /// Make every subsequent `read` fail (or succeed again)
        pub fn set_fail_reads(&self, fail: bool) {
            self.fail_reads.store(fail, Ordering::SeqCst);
        }

        fn lock_error() -> SlotError {
            SlotError::Backend("in-memory slot lock poisoned".to_string())
        }
    }

    impl SlotStore for InMemorySlotStore {
        fn read<'a>(&'a self, key: &'a str) -> SlotFuture<'a, Option<Vec<u8>>> {
            Box::pin(async move {
                validate_key(key)?;
                if self.fail_reads.load(Ordering::SeqCst) {
                    return Err(SlotError::Backend("injected read failure".to_string()));
                }
                let map = self.data.read().map_err(|_| Self::lock_error())?;
                Ok(map.get(key).cloned())
            })
        }

        fn write<'a>(&'a self, key: &'a str, data: Vec<u8>) -> SlotFuture<'a, ()> {
            Box::pin(async move {
                validate_key(key)?;
                if self.fail_writes.load(Ordering::SeqCst) {
                    return Err(SlotError::Backend("injected write failure".to_string()));
                }
                self.data
                    .write()
                    .map_err(|_| Self::lock_error())?
                    .insert(key.to_string(), data);
                self.writes.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
        }

        fn remove<'a>(&'a self, key: &'a str) -> SlotFuture<'a, ()> {
            Box::pin(async move {
                validate_key(key)?;
                self.data
                    .write()
                    .map_err(|_| Self::lock_error())?
                    .remove(key);
                Ok(())
            })
        }
    }
}

// Re-export commonly used items
pub use mocks::{InMemorySlotStore, SequentialIdGenerator};
pub use reducer_test::{assertions, ReducerTest};

#[cfg(test)]
mod tests {
    use super::*;
    use todo_store_core::environment::IdGenerator;
    use todo_store_core::slot::{SlotError, SlotStore};

    #[test]
    fn test_sequential_ids() {
        let ids = SequentialIdGenerator::starting_at(7);
        assert_eq!(ids.next_id(), "7");
        assert_eq!(ids.clone().next_id(), "8");
        assert_eq!(ids.next_id(), "9");
    }

    #[tokio::test]
    async fn test_in_memory_round_trip() -> Result<(), SlotError> {
        let slots = InMemorySlotStore::new();
        assert_eq!(slots.read("todos").await?, None);

        slots.write("todos", b"[1]".to_vec()).await?;
        assert_eq!(slots.read("todos").await?, Some(b"[1]".to_vec()));
        assert_eq!(slots.write_count(), 1);

        slots.remove("todos").await?;
        assert!(!slots.contains_key("todos"));
        Ok(())
    }

    #[tokio::test]
    async fn test_injected_write_failure() {
        let slots = InMemorySlotStore::with_slot("todos", "[]");
        slots.set_fail_writes(true);

        let result = slots.write("todos", b"[1]".to_vec()).await;
        assert!(matches!(result, Err(SlotError::Backend(_))));
        assert_eq!(slots.get_string("todos").as_deref(), Some("[]"));
        assert_eq!(slots.write_count(), 0);
    }

    #[tokio::test]
    async fn test_injected_read_failure() {
        let slots = InMemorySlotStore::with_slot("todos", "[]");
        slots.set_fail_reads(true);
        assert!(slots.read("todos").await.is_err());
    }

    #[tokio::test]
    async fn test_invalid_key_rejected() {
        let slots = InMemorySlotStore::new();
        let result = slots.write("../escape", Vec::new()).await;
        assert!(matches!(result, Err(SlotError::InvalidKey { .. })));
    }
}
