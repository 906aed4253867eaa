//! File-backed durable slot store for the todo store.
//!
//! This crate provides [`FileSlotStore`], the production implementation of the
//! `SlotStore` trait from `todo-store-core`. Every slot key maps to one JSON
//! file inside a data directory:
//!
//! - Reads of a missing file return `None`
//! - Writes go to a hidden temporary sibling that is then renamed over the
//!   target, so readers never observe a half-written slot
//! - The data directory is created on first write
//!
//! # Example
//!
//! ```no_run
//! use todo_store_core::slot::SlotStore;
//! use todo_store_filesystem::FileSlotStore;
//!
//! # async fn example() -> Result<(), todo_store_core::slot::SlotError> {
//! let slots = FileSlotStore::new(".todo-store");
//! slots.write("todos", b"[]".to_vec()).await?;
//! assert_eq!(slots.read("todos").await?, Some(b"[]".to_vec()));
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use todo_store_core::slot::{validate_key, SlotFuture, SlotStore};

/// Extension appended to every slot key.
const SLOT_EXTENSION: &str = "json";

/// Process-wide counter making temporary file names unique.
static TEMP_SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// Slot store keeping one JSON file per key in a directory.
#[derive(Debug, Clone)]
pub struct FileSlotStore {
    dir: PathBuf,
}

impl FileSlotStore {
    /// Create a store rooted at `dir`.
    ///
    /// The directory is not touched until the first write.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Directory holding the slot files.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file backing `key`.
    ///
    /// The key is not validated here; every [`SlotStore`] method validates
    /// it before touching the filesystem.
    #[must_use]
    pub fn slot_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.{SLOT_EXTENSION}"))
    }

    /// Hidden sibling used for atomic replacement of `key`.
    ///
    /// Valid keys never start with `.`, so this can not clash with a slot.
    /// Every call returns a new name, so concurrent writers never share one.
    fn temp_path(&self, key: &str) -> PathBuf {
        let seq = TEMP_SEQUENCE.fetch_add(1, Ordering::Relaxed);
        self.dir.join(format!(
            ".{key}.{SLOT_EXTENSION}.{}.{seq}.tmp",
            std::process::id()
        ))
    }
}

impl SlotStore for FileSlotStore {
    fn read<'a>(&'a self, key: &'a str) -> SlotFuture<'a, Option<Vec<u8>>> {
        Box::pin(async move {
            validate_key(key)?;
            let path = self.slot_path(key);

            match tokio::fs::read(&path).await {
                Ok(data) => {
                    tracing::debug!(path = %path.display(), bytes = data.len(), "Read slot");
                    Ok(Some(data))
                },
                Err(e) if e.kind() == ErrorKind::NotFound => {
                    tracing::debug!(path = %path.display(), "Slot file does not exist");
                    Ok(None)
                },
                Err(e) => Err(e.into()),
            }
        })
    }

    fn write<'a>(&'a self, key: &'a str, data: Vec<u8>) -> SlotFuture<'a, ()> {
        Box::pin(async move {
            validate_key(key)?;
            tokio::fs::create_dir_all(&self.dir).await?;

            let path = self.slot_path(key);
            let temp = self.temp_path(key);
            let bytes = data.len();

            if let Err(e) = tokio::fs::write(&temp, &data).await {
                let _ = tokio::fs::remove_file(&temp).await;
                return Err(e.into());
            }
            if let Err(e) = tokio::fs::rename(&temp, &path).await {
                let _ = tokio::fs::remove_file(&temp).await;
                return Err(e.into());
            }

            metrics::counter!("slot.file.writes").increment(1);
            tracing::debug!(path = %path.display(), bytes, "Wrote slot");
            Ok(())
        })
    }

    fn remove<'a>(&'a self, key: &'a str) -> SlotFuture<'a, ()> {
        Box::pin(async move {
            validate_key(key)?;
            let path = self.slot_path(key);

            match tokio::fs::remove_file(&path).await {
                Ok(()) => {
                    tracing::debug!(path = %path.display(), "Removed slot");
                    Ok(())
                },
                Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
                Err(e) => Err(e.into()),
            }
        })
    }
}
