//! Assertion helpers for `TestWorld` integration tests.

use crate::commands::{CommandFinished, HistoryAction};

use super::TestWorld;

impl TestWorld {
    pub fn assert_occupied(&self, x: i32, y: i32) {
        assert!(
            self.object_at(x, y).is_some(),
            "Expected an object at ({x}, {y})"
        );
    }

    pub fn assert_empty(&self, x: i32, y: i32) {
        let occupant = self.object_at(x, y).map(|o| o.unique_id);
        assert!(
            occupant.is_none(),
            "Expected ({x}, {y}) to be empty, found {occupant:?}"
        );
    }

    /// Assert the last processed request of `action` had the given outcome.
    pub fn assert_last_finished(&self, action: HistoryAction, succeeded: bool) {
        let last = self
            .finished()
            .into_iter()
            .filter(|f| f.action == action)
            .last();
        assert_eq!(
            last,
            Some(CommandFinished { action, succeeded }),
            "Unexpected outcome for {action:?}"
        );
    }

    pub fn assert_history_len(&self, undo: usize, redo: usize) {
        let invoker = self.invoker();
        assert_eq!(
            (invoker.undo_history().count(), invoker.redo_stack().len()),
            (undo, redo),
            "Unexpected (undo, redo) lengths"
        );
    }
}
