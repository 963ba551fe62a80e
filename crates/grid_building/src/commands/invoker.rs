//! Command invoker resource: bounded undo history plus redo stack.

use std::collections::VecDeque;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use super::command::{Command, GridCommand};
use crate::config::DEFAULT_MAX_UNDO_HISTORY;
use crate::placement::PlacementBackend;
use crate::saveable::{decode_or_warn, Saveable};

// ---------------------------------------------------------------------------
// CommandInvoker resource
// ---------------------------------------------------------------------------

#[derive(Resource, Debug, Clone)]
pub struct CommandInvoker {
    undo_history: VecDeque<GridCommand>,
    redo_stack: Vec<GridCommand>,
    max_history: usize,
}

impl Default for CommandInvoker {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_UNDO_HISTORY)
    }
}

impl CommandInvoker {
    pub fn new(max_history: usize) -> Self {
        Self {
            undo_history: VecDeque::new(),
            redo_stack: Vec::new(),
            max_history,
        }
    }

    pub fn max_history(&self) -> usize {
        self.max_history
    }

    /// Change the bound, evicting the oldest entries right away if needed.
    pub fn set_max_history(&mut self, max_history: usize) {
        self.max_history = max_history;
        self.evict_oldest();
    }

    /// Record an already executed command. Clears the redo stack.
    pub fn add_command(&mut self, command: GridCommand) {
        self.redo_stack.clear();
        self.undo_history.push_back(command);
        self.evict_oldest();
    }

    /// Execute `command` and record it if it succeeded.
    pub fn execute_command(&mut self, mut command: GridCommand, backend: &mut dyn PlacementBackend) -> bool {
        if !command.execute(backend) {
            debug!("{} command failed; history unchanged", command.label());
            return false;
        }
        self.add_command(command);
        true
    }

    /// Undo the most recent command. Returns false when there is nothing to
    /// undo or the inverse could not be applied.
    pub fn undo_command(&mut self, backend: &mut dyn PlacementBackend) -> bool {
        let Some(mut command) = self.undo_history.pop_back() else {
            return false;
        };
        let undone = command.undo(backend);
        self.redo_stack.push(command);
        undone
    }

    /// Redo the most recently undone command. Returns false when there is
    /// nothing to redo or the replay failed.
    pub fn redo_command(&mut self, backend: &mut dyn PlacementBackend) -> bool {
        let Some(mut command) = self.redo_stack.pop() else {
            return false;
        };
        let redone = command.redo(backend);
        self.undo_history.push_back(command);
        self.evict_oldest();
        redone
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_history.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Oldest first.
    pub fn undo_history(&self) -> impl Iterator<Item = &GridCommand> {
        self.undo_history.iter()
    }

    /// Next to redo last.
    pub fn redo_stack(&self) -> &[GridCommand] {
        &self.redo_stack
    }

    /// Replace both stacks wholesale. No command is invoked.
    pub fn replace_history(&mut self, undo: Vec<GridCommand>, redo: Vec<GridCommand>) {
        self.undo_history = undo.into();
        self.redo_stack = redo;
        self.evict_oldest();
    }

    /// Append to both stacks. No command is invoked.
    pub fn merge_history(&mut self, undo: Vec<GridCommand>, redo: Vec<GridCommand>) {
        self.undo_history.extend(undo);
        self.redo_stack.extend(redo);
        self.evict_oldest();
    }

    fn evict_oldest(&mut self) {
        while self.undo_history.len() > self.max_history {
            self.undo_history.pop_front();
        }
    }
}

// ---------------------------------------------------------------------------
// Saveable
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Serialize, Deserialize)]
struct SavedHistory {
    max_history: usize,
    undo: Vec<GridCommand>,
    redo: Vec<GridCommand>,
}

impl Saveable for CommandInvoker {
    const SAVE_KEY: &'static str = "command_history";

    fn save_to_bytes(&self) -> Option<Vec<u8>> {
        if self.undo_history.is_empty() && self.redo_stack.is_empty() {
            return None;
        }
        let saved = SavedHistory {
            max_history: self.max_history,
            undo: self.undo_history.iter().cloned().collect(),
            redo: self.redo_stack.clone(),
        };
        match bitcode::serialize(&saved) {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                warn!("Saveable {}: failed to encode history: {}", Self::SAVE_KEY, e);
                None
            }
        }
    }

    fn load_from_bytes(bytes: &[u8]) -> Self {
        let saved: SavedHistory = decode_or_warn(Self::SAVE_KEY, bytes);
        // A zero bound never produces a non-empty save, so zero means the
        // decode fell back to default.
        let max_history = match saved.max_history {
            0 => DEFAULT_MAX_UNDO_HISTORY,
            n => n,
        };
        let mut invoker = Self::new(max_history);
        invoker.replace_history(saved.undo, saved.redo);
        invoker
    }
}
