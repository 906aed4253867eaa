//! Property tests for the todo reducer and store.

use proptest::prelude::*;
use std::collections::HashSet;
use std::sync::Arc;
use todo_store::{
    InsertOrder, SnapshotSlot, Todo, TodoAction, TodoConfig, TodoEnvironment, TodoId, TodoPatch,
    TodoReducer, TodoState, TodoStatus, TodoStore,
};
use todo_store_core::reducer::Reducer;
use todo_store_testing::{InMemorySlotStore, SequentialIdGenerator};

fn env() -> TodoEnvironment {
    TodoEnvironment::new(SnapshotSlot::new(
        Arc::new(InMemorySlotStore::new()),
        "todos",
    ))
}

/// Reduce one action, returning how many effects it produced
fn reduce(state: &mut TodoState, action: TodoAction, env: &TodoEnvironment) -> usize {
    TodoReducer::new().reduce(state, action, env).len()
}

#[derive(Clone, Debug)]
enum Op {
    Add(String),
    Update(usize, Option<String>, Option<String>),
    Remove(usize),
    Toggle(usize),
    Advance(usize),
    Clear,
}

fn title_strategy() -> impl Strategy<Value = String> {
    "[A-Za-z][A-Za-z0-9 ]{0,20}"
}

fn status_strategy() -> impl Strategy<Value = TodoStatus> {
    prop::sample::select(TodoStatus::ALL.to_vec())
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => "[ A-Za-z]{0,12}".prop_map(Op::Add),
        1 => (any::<usize>(), prop::option::of("[ a-z]{0,8}"), prop::option::of("[a-z]{0,8}"))
            .prop_map(|(i, title, text)| Op::Update(i, title, text)),
        1 => any::<usize>().prop_map(Op::Remove),
        1 => any::<usize>().prop_map(Op::Toggle),
        1 => any::<usize>().prop_map(Op::Advance),
        1 => Just(Op::Clear),
    ]
}

/// Pick an id: mostly an existing one, sometimes one that was never issued
fn pick(state: &TodoState, i: usize) -> TodoId {
    let todos = state.todos();
    if todos.is_empty() || i % 5 == 0 {
        TodoId::from("missing")
    } else {
        todos[i % todos.len()].id.clone()
    }
}

fn to_action(state: &TodoState, op: Op, next_id: &mut u64) -> TodoAction {
    match op {
        Op::Add(title) => {
            *next_id += 1;
            TodoAction::AddTodo {
                id: TodoId::new(next_id.to_string()),
                title,
                text: None,
            }
        },
        Op::Update(i, title, text) => TodoAction::UpdateTodo {
            id: pick(state, i),
            patch: TodoPatch { title, text },
        },
        Op::Remove(i) => TodoAction::RemoveTodo { id: pick(state, i) },
        Op::Toggle(i) => TodoAction::ToggleDone { id: pick(state, i) },
        Op::Advance(i) => TodoAction::AdvanceStatus { id: pick(state, i) },
        Op::Clear => TodoAction::ClearTodos,
    }
}

fn state_of(todos: Vec<Todo>) -> TodoState {
    TodoState::with_todos(InsertOrder::NewestFirst, todos)
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]

    #[test]
    fn adds_with_fresh_ids_grow_the_list(titles in prop::collection::vec(title_strategy(), 0..30)) {
        let env = env();
        let mut state = TodoState::default();

        for (n, title) in titles.iter().enumerate() {
            let effects = reduce(
                &mut state,
                TodoAction::AddTodo { id: TodoId::new(n.to_string()), title: title.clone(), text: None },
                &env,
            );
            prop_assert_eq!(effects, 1);
        }

        prop_assert_eq!(state.len(), titles.len());
        let ids: HashSet<_> = state.todos().iter().map(|t| t.id.clone()).collect();
        prop_assert_eq!(ids.len(), titles.len());
    }

    #[test]
    fn advancing_three_times_is_identity(status in status_strategy(), is_done in any::<bool>()) {
        let env = env();
        let mut todo = Todo::new(TodoId::from("1"), "task", "");
        todo.current_status = status;
        todo.is_done = is_done;
        let mut state = state_of(vec![todo.clone()]);

        for _ in 0..3 {
            reduce(&mut state, TodoAction::AdvanceStatus { id: todo.id.clone() }, &env);
        }

        prop_assert_eq!(state.todos(), &[todo][..]);
    }

    #[test]
    fn toggling_twice_is_identity(status in status_strategy(), is_done in any::<bool>()) {
        let env = env();
        let mut todo = Todo::new(TodoId::from("1"), "task", "");
        todo.current_status = status;
        todo.is_done = is_done;
        let mut state = state_of(vec![todo.clone()]);

        reduce(&mut state, TodoAction::ToggleDone { id: todo.id.clone() }, &env);
        prop_assert_eq!(state.todos()[0].is_done, !is_done);
        reduce(&mut state, TodoAction::ToggleDone { id: todo.id.clone() }, &env);

        prop_assert_eq!(state.todos(), &[todo][..]);
    }

    #[test]
    fn operations_on_removed_id_are_noops(
        titles in prop::collection::vec(title_strategy(), 1..10),
        victim in any::<prop::sample::Index>(),
    ) {
        let env = env();
        let todos: Vec<_> = titles
            .iter()
            .enumerate()
            .map(|(n, title)| Todo::new(TodoId::new(n.to_string()), title.clone(), ""))
            .collect();
        let id = todos[victim.index(todos.len())].id.clone();
        let mut state = state_of(todos);

        prop_assert_eq!(reduce(&mut state, TodoAction::RemoveTodo { id: id.clone() }, &env), 1);
        let after_remove = state.snapshot();
        let revision = state.revision();

        let followups = vec![
            TodoAction::RemoveTodo { id: id.clone() },
            TodoAction::ToggleDone { id: id.clone() },
            TodoAction::AdvanceStatus { id: id.clone() },
            TodoAction::UpdateTodo { id: id.clone(), patch: TodoPatch::title("back") },
        ];
        for action in followups {
            prop_assert_eq!(reduce(&mut state, action, &env), 0);
        }

        prop_assert_eq!(state.todos(), after_remove.as_slice());
        prop_assert_eq!(state.revision(), revision);
    }

    #[test]
    fn restore_of_snapshot_is_equivalent(titles in prop::collection::vec(title_strategy(), 1..10)) {
        let env = env();
        let mut state = TodoState::default();
        for (n, title) in titles.iter().enumerate() {
            reduce(
                &mut state,
                TodoAction::AddTodo { id: TodoId::new(n.to_string()), title: title.clone(), text: None },
                &env,
            );
        }
        let snapshot = state.snapshot();

        reduce(&mut state, TodoAction::RestoreTodos { todos: snapshot.to_vec() }, &env);

        prop_assert_eq!(state.todos(), snapshot.as_slice());
    }

    #[test]
    fn random_sequences_keep_invariants(ops in prop::collection::vec(op_strategy(), 0..60)) {
        let env = env();
        let mut state = TodoState::default();
        let mut next_id = 0;

        for op in ops {
            let action = to_action(&state, op, &mut next_id);
            let revision = state.revision();
            let effects = reduce(&mut state, action, &env);

            // One write exactly when something was applied
            prop_assert_eq!(effects, usize::from(state.revision() != revision));

            let ids: HashSet<_> = state.todos().iter().map(|t| t.id.clone()).collect();
            prop_assert_eq!(ids.len(), state.len());
            prop_assert!(state.todos().iter().all(|t| !t.title.trim().is_empty()));
        }

        reduce(&mut state, TodoAction::ClearTodos, &env);
        prop_assert!(state.is_empty());
    }
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 16, .. ProptestConfig::default() })]

    #[test]
    fn slot_always_mirrors_the_list(ops in prop::collection::vec(op_strategy(), 1..20)) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();

        runtime.block_on(async {
            let slots = Arc::new(InMemorySlotStore::new());
            let store = TodoStore::open(
                &TodoConfig::default(),
                slots.clone(),
                Arc::new(SequentialIdGenerator::new()),
            )
            .await
            .unwrap();

            for op in ops {
                let snapshot = store.snapshot().await;
                let pick = |i: usize| {
                    if snapshot.is_empty() {
                        TodoId::from("missing")
                    } else {
                        snapshot[i % snapshot.len()].id.clone()
                    }
                };
                match op {
                    Op::Add(title) => { store.add(&title, None).await.unwrap(); },
                    Op::Update(i, title, text) => {
                        store.update(&pick(i), TodoPatch { title, text }).await.unwrap();
                    },
                    Op::Remove(i) => { store.remove(&pick(i)).await.unwrap(); },
                    Op::Toggle(i) => { store.toggle_done(&pick(i)).await.unwrap(); },
                    Op::Advance(i) => { store.advance_status(&pick(i)).await.unwrap(); },
                    Op::Clear => store.clear().await.unwrap(),
                }

                if let Some(bytes) = slots.get("todos") {
                    let stored = todo_store::persistence::decode(&bytes).unwrap();
                    assert_eq!(stored.as_slice(), store.snapshot().await.as_slice());
                }
            }
        });
    }
}
