//! Reducer logic for the todo list.
//!
//! Commands are validated and turned into events. Events are applied to
//! state, and every applied event returns an effect that writes the full list
//! to the durable slot. Rejected commands change nothing and return no
//! effects.

use crate::persistence::SnapshotSlot;
use crate::types::{dedupe_by_id, InsertOrder, Todo, TodoAction, TodoId, TodoPatch, TodoState};
use todo_store_core::{effect::Effect, reducer::Reducer, smallvec, SmallVec};

/// Environment dependencies for the todo reducer
#[derive(Clone, Debug)]
pub struct TodoEnvironment {
    /// Where the list is persisted after each change
    pub snapshot_slot: SnapshotSlot,
}

impl TodoEnvironment {
    /// Creates a new `TodoEnvironment`
    #[must_use]
    pub const fn new(snapshot_slot: SnapshotSlot) -> Self {
        Self { snapshot_slot }
    }
}

/// Reducer for the todo list
#[derive(Clone, Debug)]
pub struct TodoReducer;

impl TodoReducer {
    /// Creates a new `TodoReducer`
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Validates an `AddTodo` command
    fn validate_add(state: &TodoState, id: &TodoId, title: &str) -> Result<(), String> {
        if title.trim().is_empty() {
            return Err("Todo title cannot be empty".to_string());
        }

        if state.contains(id) {
            return Err(format!("Todo with ID {id} already exists"));
        }

        Ok(())
    }

    /// Validates an `UpdateTodo` command
    fn validate_update(state: &TodoState, id: &TodoId, patch: &TodoPatch) -> Result<(), String> {
        if !state.contains(id) {
            return Err(format!("Todo with ID {id} not found"));
        }

        if patch.is_empty() {
            return Err(format!("Nothing to update for todo {id}"));
        }

        Ok(())
    }

    /// Looks up a todo, rejecting unknown ids
    fn existing<'a>(state: &'a TodoState, id: &TodoId) -> Result<&'a Todo, String> {
        state
            .get(id)
            .ok_or_else(|| format!("Todo with ID {id} not found"))
    }

    /// Turns a command into the event it produces, or the reason it is rejected
    fn decide(state: &TodoState, command: TodoAction) -> Result<TodoAction, String> {
        match command {
            TodoAction::AddTodo { id, title, text } => {
                Self::validate_add(state, &id, &title)?;
                Ok(TodoAction::TodoAdded {
                    todo: Todo::new(id, title, text.unwrap_or_default()),
                })
            },
            TodoAction::UpdateTodo { id, patch } => {
                Self::validate_update(state, &id, &patch)?;
                let current = Self::existing(state, &id)?;
                let title = patch
                    .usable_title()
                    .map_or_else(|| current.title.clone(), ToString::to_string);
                let text = patch.text.unwrap_or_else(|| current.text.clone());
                Ok(TodoAction::TodoUpdated { id, title, text })
            },
            TodoAction::RemoveTodo { id } => {
                Self::existing(state, &id)?;
                Ok(TodoAction::TodoRemoved { id })
            },
            TodoAction::ToggleDone { id } => {
                let is_done = !Self::existing(state, &id)?.is_done;
                Ok(TodoAction::DoneToggled { id, is_done })
            },
            TodoAction::AdvanceStatus { id } => {
                let status = Self::existing(state, &id)?.current_status.next();
                Ok(TodoAction::StatusAdvanced { id, status })
            },
            TodoAction::ClearTodos => Ok(TodoAction::TodosCleared),
            TodoAction::RestoreTodos { todos } | TodoAction::TodosRestored { todos } => {
                if todos.is_empty() {
                    return Err("Refusing to restore an empty list".to_string());
                }
                Ok(TodoAction::TodosRestored {
                    todos: dedupe_by_id(todos),
                })
            },

            // Events sent directly are held to the same rules as their commands
            TodoAction::TodoAdded { todo } => {
                Self::validate_add(state, &todo.id, &todo.title)?;
                Ok(TodoAction::TodoAdded { todo })
            },
            TodoAction::TodoUpdated { id, title, text } => {
                Self::existing(state, &id)?;
                if title.trim().is_empty() {
                    return Err("Todo title cannot be empty".to_string());
                }
                Ok(TodoAction::TodoUpdated { id, title, text })
            },
            TodoAction::TodoRemoved { id } => {
                Self::existing(state, &id)?;
                Ok(TodoAction::TodoRemoved { id })
            },
            TodoAction::DoneToggled { id, is_done } => {
                Self::existing(state, &id)?;
                Ok(TodoAction::DoneToggled { id, is_done })
            },
            TodoAction::StatusAdvanced { id, status } => {
                Self::existing(state, &id)?;
                Ok(TodoAction::StatusAdvanced { id, status })
            },
            TodoAction::TodosCleared => Ok(TodoAction::TodosCleared),
        }
    }

    /// Applies an event to state
    fn apply_event(state: &mut TodoState, event: &TodoAction) {
        match event {
            TodoAction::TodoAdded { todo } => match state.insert_order {
                InsertOrder::NewestFirst => state.todos_mut().insert(0, todo.clone()),
                InsertOrder::OldestFirst => state.todos_mut().push(todo.clone()),
            },
            TodoAction::TodoUpdated { id, title, text } => {
                if let Some(todo) = state.get_mut(id) {
                    todo.title.clone_from(title);
                    todo.text.clone_from(text);
                }
            },
            TodoAction::TodoRemoved { id } => {
                state.todos_mut().retain(|todo| &todo.id != id);
            },
            TodoAction::DoneToggled { id, is_done } => {
                if let Some(todo) = state.get_mut(id) {
                    todo.is_done = *is_done;
                }
            },
            TodoAction::StatusAdvanced { id, status } => {
                if let Some(todo) = state.get_mut(id) {
                    todo.current_status = *status;
                }
            },
            TodoAction::TodosCleared => state.todos_mut().clear(),
            TodoAction::TodosRestored { todos } => {
                *state.todos_mut() = todos.clone();
            },
            // Commands are not applied to state
            TodoAction::AddTodo { .. }
            | TodoAction::UpdateTodo { .. }
            | TodoAction::RemoveTodo { .. }
            | TodoAction::ToggleDone { .. }
            | TodoAction::AdvanceStatus { .. }
            | TodoAction::ClearTodos
            | TodoAction::RestoreTodos { .. } => return,
        }
        state.bump_revision();
    }

    /// Effect writing the current list to the durable slot
    fn persist(state: &TodoState, env: &TodoEnvironment) -> Effect<TodoAction> {
        let snapshot = state.snapshot();
        let revision = state.revision();
        let slot = env.snapshot_slot.clone();

        Effect::fire_and_forget(async move {
            match slot.save(&snapshot).await {
                Ok(()) => {
                    tracing::trace!(revision, count = snapshot.len(), "Persisted todos");
                },
                Err(error) => {
                    metrics::counter!("todo.persist.failures").increment(1);
                    tracing::warn!(
                        %error,
                        revision,
                        key = slot.key(),
                        "Failed to persist todos; in-memory list is kept"
                    );
                },
            }
        })
    }
}

impl Default for TodoReducer {
    fn default() -> Self {
        Self::new()
    }
}

impl Reducer for TodoReducer {
    type State = TodoState;
    type Action = TodoAction;
    type Environment = TodoEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        let command = action.is_command();

        let event = match Self::decide(state, action) {
            Ok(event) => event,
            Err(reason) => {
                tracing::debug!(%reason, "Rejected todo command");
                metrics::counter!("todo.commands.rejected").increment(1);
                return SmallVec::new();
            },
        };

        tracing::debug!(event = event.event_type(), command, "Applying todo event");
        Self::apply_event(state, &event);

        smallvec![Self::persist(state, env)]
    }
}
