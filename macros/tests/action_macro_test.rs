//! Tests for #[derive(Action)] macro

use todo_store_macros::Action;

#[derive(Action, Clone, Debug, PartialEq)]
enum ListAction {
    #[command]
    AddItem { title: String },

    #[command]
    ClearItems,

    #[command]
    Rename(String, String),

    #[event]
    ItemAdded { id: String, title: String },

    #[event]
    ItemsCleared,

    #[event]
    Renamed(String, String),

    // Neither command nor event
    Refresh,
}

#[test]
fn test_is_command() {
    assert!(ListAction::AddItem { title: "Buy milk".to_string() }.is_command());
    assert!(ListAction::ClearItems.is_command());
    assert!(ListAction::Rename("a".to_string(), "b".to_string()).is_command());
    assert!(!ListAction::ClearItems.is_event());
}

#[test]
fn test_is_event() {
    let action = ListAction::ItemAdded {
        id: "item-1".to_string(),
        title: "Buy milk".to_string(),
    };
    assert!(action.is_event());
    assert!(!action.is_command());
    assert!(ListAction::ItemsCleared.is_event());
    assert!(ListAction::Renamed("a".to_string(), "b".to_string()).is_event());
}

#[test]
fn test_event_type() {
    let action = ListAction::ItemAdded {
        id: "item-1".to_string(),
        title: "Buy milk".to_string(),
    };
    assert_eq!(action.event_type(), "ItemAdded.v1");
    assert_eq!(ListAction::ItemsCleared.event_type(), "ItemsCleared.v1");
}

#[test]
fn test_command_event_type_is_unknown() {
    // Commands don't have event types
    assert_eq!(ListAction::ClearItems.event_type(), "unknown");
}

#[test]
fn test_unmarked_variant() {
    assert!(!ListAction::Refresh.is_command());
    assert!(!ListAction::Refresh.is_event());
    assert_eq!(ListAction::Refresh.event_type(), "unknown");
}

const fn classify(action: &ListAction) -> (bool, bool) {
    (action.is_command(), action.is_event())
}

#[test]
fn test_helpers_are_const() {
    assert_eq!(classify(&ListAction::ItemsCleared), (false, true));
    assert_eq!(classify(&ListAction::ClearItems), (true, false));
}
