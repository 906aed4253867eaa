//! Configuration management for the todo store.
//!
//! Loads configuration from environment variables with sensible defaults.
//! Values that do not parse are logged and replaced by their default.

use crate::types::InsertOrder;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;
use todo_store_core::slot::{validate_key, SlotError};

/// Default data directory
pub const DEFAULT_DATA_DIR: &str = ".todo-store";

/// Default slot key
pub const DEFAULT_SLOT_KEY: &str = "todos";

/// Default graceful shutdown timeout in milliseconds
pub const DEFAULT_SHUTDOWN_TIMEOUT_MS: u64 = 5000;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A setting has a value that can not be used
    #[error("Invalid value {value:?} for {name}: expected {expected}")]
    InvalidValue {
        /// Setting name
        name: &'static str,
        /// Rejected value
        value: String,
        /// What would have been accepted
        expected: &'static str,
    },

    /// The slot key can not be used as a storage key
    #[error("Invalid slot key: {0}")]
    InvalidSlotKey(#[from] SlotError),
}

/// Todo store configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoConfig {
    /// Directory holding the slot files
    pub data_dir: PathBuf,
    /// Key of the slot holding the list
    pub slot_key: String,
    /// Placement of newly added todos
    pub insert_order: InsertOrder,
    /// Start with an example todo when nothing is stored
    pub seed_example: bool,
    /// Graceful shutdown timeout in milliseconds
    pub shutdown_timeout_ms: u64,
}

impl Default for TodoConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            slot_key: DEFAULT_SLOT_KEY.to_string(),
            insert_order: InsertOrder::NewestFirst,
            seed_example: false,
            shutdown_timeout_ms: DEFAULT_SHUTDOWN_TIMEOUT_MS,
        }
    }
}

impl TodoConfig {
    /// Load configuration from environment variables.
    ///
    /// | Variable                   | Default       |
    /// |----------------------------|---------------|
    /// | `TODO_DATA_DIR`            | `.todo-store` |
    /// | `TODO_SLOT_KEY`            | `todos`       |
    /// | `TODO_INSERT_ORDER`        | `newest`      |
    /// | `TODO_SEED_EXAMPLE`        | `false`       |
    /// | `TODO_SHUTDOWN_TIMEOUT_MS` | `5000`        |
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration from an arbitrary variable lookup
    #[must_use]
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        Self {
            data_dir: lookup("TODO_DATA_DIR")
                .filter(|dir| !dir.trim().is_empty())
                .map_or(defaults.data_dir, PathBuf::from),
            slot_key: setting(&lookup, "TODO_SLOT_KEY", parse_slot_key)
                .unwrap_or(defaults.slot_key),
            insert_order: setting(&lookup, "TODO_INSERT_ORDER", |raw| raw.parse())
                .unwrap_or(defaults.insert_order),
            seed_example: setting(&lookup, "TODO_SEED_EXAMPLE", parse_bool)
                .unwrap_or(defaults.seed_example),
            shutdown_timeout_ms: setting(&lookup, "TODO_SHUTDOWN_TIMEOUT_MS", |raw| {
                parse_millis("TODO_SHUTDOWN_TIMEOUT_MS", raw)
            })
            .unwrap_or(defaults.shutdown_timeout_ms),
        }
    }

    /// Graceful shutdown timeout
    #[must_use]
    pub const fn shutdown_timeout(&self) -> Duration {
        Duration::from_millis(self.shutdown_timeout_ms)
    }

    /// Check the settings that can not be fixed up silently
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the slot key is unusable or the shutdown
    /// timeout is zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_key(&self.slot_key)?;
        if self.shutdown_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                name: "shutdown_timeout_ms",
                value: "0".to_string(),
                expected: "a positive number of milliseconds",
            });
        }
        Ok(())
    }
}

impl FromStr for InsertOrder {
    type Err = ConfigError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "newest" | "newest-first" | "newest_first" => Ok(Self::NewestFirst),
            "oldest" | "oldest-first" | "oldest_first" => Ok(Self::OldestFirst),
            _ => Err(ConfigError::InvalidValue {
                name: "insert_order",
                value: raw.to_string(),
                expected: "\"newest\" or \"oldest\"",
            }),
        }
    }
}

/// Read and parse one variable, logging and discarding unusable values
fn setting<L, T, P>(lookup: &L, name: &'static str, parse: P) -> Option<T>
where
    L: Fn(&str) -> Option<String>,
    P: FnOnce(&str) -> Result<T, ConfigError>,
{
    let raw = lookup(name)?;
    match parse(&raw) {
        Ok(value) => Some(value),
        Err(error) => {
            tracing::warn!(variable = name, %error, "Ignoring invalid setting, using default");
            None
        },
    }
}

fn parse_slot_key(raw: &str) -> Result<String, ConfigError> {
    validate_key(raw)?;
    Ok(raw.to_string())
}

fn parse_bool(raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            name: "seed_example",
            value: raw.to_string(),
            expected: "a boolean",
        }),
    }
}

fn parse_millis(name: &'static str, raw: &str) -> Result<u64, ConfigError> {
    raw.trim()
        .parse()
        .ok()
        .filter(|ms| *ms > 0)
        .ok_or_else(|| ConfigError::InvalidValue {
            name,
            value: raw.to_string(),
            expected: "a positive number of milliseconds",
        })
}
