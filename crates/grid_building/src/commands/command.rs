//! The command contract and the serializable command sum type.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use super::destroy::DestroyCommand;
use super::place::PlaceCommand;
use crate::objects::PlacementRequest;
use crate::placement::PlacementBackend;

pub trait Command {
    /// Apply the command. Returns whether it succeeded.
    fn execute(&mut self, backend: &mut dyn PlacementBackend) -> bool;

    /// Reverse a successful execution. Returns whether anything was reversed.
    fn undo(&mut self, backend: &mut dyn PlacementBackend) -> bool;

    /// Re-apply after an undo, recreating the same identities.
    fn redo(&mut self, backend: &mut dyn PlacementBackend) -> bool;

    /// Result of the most recent `execute` or `redo`.
    fn succeeded(&self) -> bool;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GridCommand {
    Place(PlaceCommand),
    Destroy(DestroyCommand),
}

impl GridCommand {
    pub fn label(&self) -> &'static str {
        match self {
            GridCommand::Place(_) => "place",
            GridCommand::Destroy(_) => "destroy",
        }
    }
}

impl From<PlaceCommand> for GridCommand {
    fn from(command: PlaceCommand) -> Self {
        GridCommand::Place(command)
    }
}

impl From<DestroyCommand> for GridCommand {
    fn from(command: DestroyCommand) -> Self {
        GridCommand::Destroy(command)
    }
}

impl Command for GridCommand {
    fn execute(&mut self, backend: &mut dyn PlacementBackend) -> bool {
        match self {
            GridCommand::Place(c) => c.execute(backend),
            GridCommand::Destroy(c) => c.execute(backend),
        }
    }

    fn undo(&mut self, backend: &mut dyn PlacementBackend) -> bool {
        match self {
            GridCommand::Place(c) => c.undo(backend),
            GridCommand::Destroy(c) => c.undo(backend),
        }
    }

    fn redo(&mut self, backend: &mut dyn PlacementBackend) -> bool {
        match self {
            GridCommand::Place(c) => c.redo(backend),
            GridCommand::Destroy(c) => c.redo(backend),
        }
    }

    fn succeeded(&self) -> bool {
        match self {
            GridCommand::Place(c) => c.succeeded(),
            GridCommand::Destroy(c) => c.succeeded(),
        }
    }
}

/// Recreate an object from its snapshot and give it back its original id.
///
/// Restoration bypasses area rules. Nothing happens when the snapshot's grid
/// system is gone.
pub(crate) fn restore_snapshot(snapshot: &PlacementRequest, backend: &mut dyn PlacementBackend) -> bool {
    let Some(original_id) = snapshot.unique_id else {
        return false;
    };
    if !backend.has_grid_system(snapshot.binding.system) {
        warn!(
            "cannot restore object {original_id}: grid system {:?} no longer exists",
            snapshot.binding.system
        );
        return false;
    }
    let mut request = snapshot.clone();
    request.unique_id = None;
    request.bypass_rules = true;
    let Some(restored) = backend.try_place(&request) else {
        warn!("cannot restore object {original_id}: placement failed");
        return false;
    };
    if !backend.restamp_unique_id(restored.unique_id, original_id) {
        warn!(
            "restored object kept id {} instead of {original_id}",
            restored.unique_id
        );
        return false;
    }
    true
}
