//! Todo store: an ordered, observable todo list persisted after every change.
//!
//! The list lives in a [`TodoStore`], which runs [`TodoReducer`] on the
//! generic runtime store. Every applied change writes the full list, as a
//! JSON array, to one key of a durable slot store; the slot is read back once
//! when the store is opened.
//!
//! - Domain types: [`Todo`], [`TodoId`], [`TodoStatus`], [`TodoPatch`]
//! - Commands are validated by the reducer; rejected ones change nothing
//! - Observers follow the list through [`TodoStore::subscribe`]
//! - Testing with `ReducerTest` and the in-memory slot store
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use todo_store::{TodoConfig, TodoPatch, TodoStore};
//! use todo_store_core::environment::RandomIdGenerator;
//! use todo_store_filesystem::FileSlotStore;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = TodoConfig::from_env();
//! let slots = Arc::new(FileSlotStore::new(&config.data_dir));
//! let store = TodoStore::open(&config, slots, Arc::new(RandomIdGenerator)).await?;
//!
//! if let Some(id) = store.add("Buy milk", None).await? {
//!     store.advance_status(&id).await?;
//!     store.update(&id, TodoPatch::text("2%")).await?;
//! }
//!
//! println!("Total todos: {}", store.snapshot().await.len());
//! store.shutdown(config.shutdown_timeout()).await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod persistence;
pub mod reducer;
pub mod store;
pub mod types;

// Re-export commonly used types
pub use config::{ConfigError, TodoConfig};
pub use persistence::{SnapshotError, SnapshotSlot};
pub use reducer::{TodoEnvironment, TodoReducer};
pub use store::TodoStore;
pub use types::{
    InsertOrder, Todo, TodoAction, TodoId, TodoPatch, TodoSnapshot, TodoState, TodoStatus,
};
