//! Domain types for the todo store.
//!
//! A todo list is an ordered sequence of [`Todo`] records. Records are
//! created, edited, toggled, advanced through a small status cycle and
//! removed. The whole sequence is what gets persisted and restored.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use todo_store_macros::{Action, State};

/// Unique identifier for a todo record
///
/// Ids are opaque tokens. Stored snapshots may carry numeric ids; those are
/// read back as their decimal string.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct TodoId(String);

impl TodoId {
    /// Creates a `TodoId` from any string token
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TodoId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for TodoId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for TodoId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl<'de> Deserialize<'de> for TodoId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Text(String),
            Signed(i64),
            Unsigned(u64),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Text(id) => Self(id),
            RawId::Signed(id) => Self(id.to_string()),
            RawId::Unsigned(id) => Self(id.to_string()),
        })
    }
}

/// Progress of a todo, independent of its done flag
///
/// Statuses form a cycle: `NotStarted → InProgress → Completed → NotStarted`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TodoStatus {
    /// Work has not begun
    #[default]
    #[serde(rename = "Not Started", alias = "NotStarted")]
    NotStarted,
    /// Work is under way
    #[serde(rename = "In Progress", alias = "InProgress")]
    InProgress,
    /// Work is finished
    Completed,
}

impl TodoStatus {
    /// Every status, in cycle order
    pub const ALL: [Self; 3] = [Self::NotStarted, Self::InProgress, Self::Completed];

    /// Position of this status in [`TodoStatus::ALL`]
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::NotStarted => 0,
            Self::InProgress => 1,
            Self::Completed => 2,
        }
    }

    /// The status that follows this one in the cycle
    #[must_use]
    pub const fn next(self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    /// Human-readable label, identical to the persisted form
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::NotStarted => "Not Started",
            Self::InProgress => "In Progress",
            Self::Completed => "Completed",
        }
    }
}

impl std::fmt::Display for TodoStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// A single todo record
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    /// Unique identifier
    pub id: TodoId,
    /// Short title, never blank when created
    pub title: String,
    /// Longer free-form description
    #[serde(default)]
    pub text: String,
    /// Done flag, toggled independently of the status
    #[serde(default)]
    pub is_done: bool,
    /// Position in the status cycle
    #[serde(default)]
    pub current_status: TodoStatus,
}

impl Todo {
    /// Creates a fresh todo: not done, not started
    #[must_use]
    pub fn new(id: TodoId, title: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            text: text.into(),
            is_done: false,
            current_status: TodoStatus::NotStarted,
        }
    }
}

/// Partial update for a todo; `None` fields keep their current value
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoPatch {
    /// New title. A blank title is ignored.
    pub title: Option<String>,
    /// New text
    pub text: Option<String>,
}

impl TodoPatch {
    /// Patch that only replaces the title
    #[must_use]
    pub fn title(title: impl Into<String>) -> Self {
        Self::default().with_title(title)
    }

    /// Patch that only replaces the text
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::default().with_text(text)
    }

    /// Sets the title of this patch
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Sets the text of this patch
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Whether applying this patch would change nothing
    ///
    /// A patch whose only field is a blank title counts as empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.usable_title().is_none() && self.text.is_none()
    }

    /// The title to apply, if one is set and not blank
    #[must_use]
    pub fn usable_title(&self) -> Option<&str> {
        self.title.as_deref().filter(|title| !title.trim().is_empty())
    }
}

/// Where newly added todos are placed
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InsertOrder {
    /// New todos go to the front of the list
    #[default]
    NewestFirst,
    /// New todos go to the back of the list
    OldestFirst,
}

/// Read-only shared view of the todo list at one point in time
pub type TodoSnapshot = Arc<Vec<Todo>>;

/// State of the todo list
///
/// The list sits behind an `Arc` and is copied on write, so a
/// [`TodoSnapshot`] handed out earlier never changes.
#[derive(State, Clone, Debug, Default)]
pub struct TodoState {
    todos: TodoSnapshot,
    /// Placement of newly added todos
    pub insert_order: InsertOrder,
    #[revision]
    revision: u64,
}

impl TodoState {
    /// Creates an empty list with the given insert order
    #[must_use]
    pub fn new(insert_order: InsertOrder) -> Self {
        Self {
            todos: Arc::default(),
            insert_order,
            revision: 0,
        }
    }

    /// Creates a list holding `todos`, dropping repeated ids
    #[must_use]
    pub fn with_todos(insert_order: InsertOrder, todos: Vec<Todo>) -> Self {
        Self {
            todos: Arc::new(dedupe_by_id(todos)),
            insert_order,
            revision: 0,
        }
    }

    /// Shared view of the current list
    #[must_use]
    pub fn snapshot(&self) -> TodoSnapshot {
        Arc::clone(&self.todos)
    }

    /// The current list
    #[must_use]
    pub fn todos(&self) -> &[Todo] {
        &self.todos
    }

    /// Returns the number of todos
    #[must_use]
    pub fn len(&self) -> usize {
        self.todos.len()
    }

    /// Returns true if there are no todos
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.todos.is_empty()
    }

    /// Returns the number of todos marked done
    #[must_use]
    pub fn done_count(&self) -> usize {
        self.todos.iter().filter(|t| t.is_done).count()
    }

    /// Returns a todo by ID
    #[must_use]
    pub fn get(&self, id: &TodoId) -> Option<&Todo> {
        self.todos.iter().find(|t| &t.id == id)
    }

    /// Checks if a todo exists
    #[must_use]
    pub fn contains(&self, id: &TodoId) -> bool {
        self.get(id).is_some()
    }

    /// Mutable access to the list, copying it if a snapshot still shares it
    pub(crate) fn todos_mut(&mut self) -> &mut Vec<Todo> {
        Arc::make_mut(&mut self.todos)
    }

    /// Mutable access to one todo
    pub(crate) fn get_mut(&mut self, id: &TodoId) -> Option<&mut Todo> {
        self.todos_mut().iter_mut().find(|t| &t.id == id)
    }
}

/// Keeps the first record for every id, preserving order
#[must_use]
pub fn dedupe_by_id(todos: Vec<Todo>) -> Vec<Todo> {
    let mut seen = HashSet::with_capacity(todos.len());
    todos
        .into_iter()
        .filter(|todo| seen.insert(todo.id.clone()))
        .collect()
}

/// Actions representing commands and events for the todo list
///
/// Commands are validated by the reducer and produce events. Only events
/// change state.
#[derive(Action, Clone, Debug, Serialize, Deserialize)]
pub enum TodoAction {
    // ========== Commands ==========
    /// Command: Add a new todo
    #[command]
    AddTodo {
        /// Identifier for the new todo
        id: TodoId,
        /// Title; rejected when blank
        title: String,
        /// Optional text, empty when absent
        text: Option<String>,
    },

    /// Command: Edit the title and/or text of a todo
    #[command]
    UpdateTodo {
        /// Todo to edit
        id: TodoId,
        /// Fields to change
        patch: TodoPatch,
    },

    /// Command: Remove a todo
    #[command]
    RemoveTodo {
        /// Todo to remove
        id: TodoId,
    },

    /// Command: Flip the done flag of a todo
    #[command]
    ToggleDone {
        /// Todo to toggle
        id: TodoId,
    },

    /// Command: Move a todo to the next status
    #[command]
    AdvanceStatus {
        /// Todo to advance
        id: TodoId,
    },

    /// Command: Remove every todo
    #[command]
    ClearTodos,

    /// Command: Replace the whole list; ignored when empty
    #[command]
    RestoreTodos {
        /// Replacement records
        todos: Vec<Todo>,
    },

    // ========== Events ==========
    /// Event: Todo was added
    #[event]
    TodoAdded {
        /// The new record
        todo: Todo,
    },

    /// Event: Todo was edited
    #[event]
    TodoUpdated {
        /// Todo identifier
        id: TodoId,
        /// Resulting title
        title: String,
        /// Resulting text
        text: String,
    },

    /// Event: Todo was removed
    #[event]
    TodoRemoved {
        /// Todo identifier
        id: TodoId,
    },

    /// Event: Done flag changed
    #[event]
    DoneToggled {
        /// Todo identifier
        id: TodoId,
        /// Resulting flag
        is_done: bool,
    },

    /// Event: Status moved along the cycle
    #[event]
    StatusAdvanced {
        /// Todo identifier
        id: TodoId,
        /// Resulting status
        status: TodoStatus,
    },

    /// Event: List was emptied
    #[event]
    TodosCleared,

    /// Event: List was replaced
    #[event]
    TodosRestored {
        /// The new contents, ids already unique
        todos: Vec<Todo>,
    },
}
