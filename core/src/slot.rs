//! Durable key-value slot abstraction.
//!
//! A slot is a single named storage location holding the serialized form of
//! some piece of state. It is written in full (no partial updates, no
//! versioning) and read back whole.
//!
//! # Implementations
//!
//! - `FileSlotStore` (in `todo-store-filesystem` crate): One JSON file per key
//! - `InMemorySlotStore` (in `todo-store-testing` crate): Fast, deterministic testing
//!
//! # Dyn Compatibility
//!
//! [`SlotStore`] returns `Pin<Box<dyn Future>>` instead of `impl Future` so it
//! can be held as `Arc<dyn SlotStore>` inside a reducer environment.
//!
//! # Example
//!
//! ```no_run
//! use todo_store_core::slot::{SlotStore, SlotError};
//!
//! async fn example(store: &dyn SlotStore) -> Result<(), SlotError> {
//!     store.write("todos", b"[]".to_vec()).await?;
//!     let data = store.read("todos").await?;
//!     assert_eq!(data.as_deref(), Some(&b"[]"[..]));
//!     Ok(())
//! }
//! ```

use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Result alias for slot operations.
pub type Result<T> = std::result::Result<T, SlotError>;

/// Boxed future returned by [`SlotStore`] methods.
pub type SlotFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + Send + 'a>>;

/// Errors that can occur during slot operations.
#[derive(Error, Debug)]
pub enum SlotError {
    /// The key is not usable as a slot name.
    #[error("Invalid slot key {key:?}: {reason}")]
    InvalidKey {
        /// The rejected key.
        key: String,
        /// Why it was rejected.
        reason: &'static str,
    },

    /// Underlying I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Any other backend failure.
    #[error("Storage backend error: {0}")]
    Backend(String),
}

/// A durable, named key-value storage location.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync` so they can be shared by the
/// runtime's effect tasks.
pub trait SlotStore: Send + Sync {
    /// Read the full contents of a slot.
    ///
    /// # Returns
    ///
    /// - `Some(data)` if the slot has been written
    /// - `None` if the slot does not exist
    ///
    /// # Errors
    ///
    /// Returns [`SlotError`] if the key is invalid or the backend fails.
    fn read<'a>(&'a self, key: &'a str) -> SlotFuture<'a, Option<Vec<u8>>>;

    /// Replace the full contents of a slot.
    ///
    /// # Errors
    ///
    /// Returns [`SlotError`] if the key is invalid or the backend fails.
    fn write<'a>(&'a self, key: &'a str, data: Vec<u8>) -> SlotFuture<'a, ()>;

    /// Remove a slot. Removing a missing slot is not an error.
    ///
    /// # Errors
    ///
    /// Returns [`SlotError`] if the key is invalid or the backend fails.
    fn remove<'a>(&'a self, key: &'a str) -> SlotFuture<'a, ()>;
}

/// Check that `key` is usable as a slot name.
///
/// Keys must be non-empty, must not start with `.`, and may only contain
/// ASCII alphanumerics, `_`, `-` and `.`. This keeps keys safe to use as file
/// names in every backend.
///
/// # Errors
///
/// Returns [`SlotError::InvalidKey`] describing the first violated rule.
pub fn validate_key(key: &str) -> Result<()> {
    let reason = if key.is_empty() {
        "key is empty"
    } else if key.starts_with('.') {
        "key starts with '.'"
    } else if !key
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
    {
        "key contains characters outside [A-Za-z0-9_.-]"
    } else {
        return Ok(());
    };

    Err(SlotError::InvalidKey {
        key: key.to_string(),
        reason,
    })
}
