use serde::{Deserialize, Serialize};

use super::command::{restore_snapshot, Command};
use crate::objects::{PlacedObject, PlacementRequest};
use crate::placement::PlacementBackend;

/// Destroy (or detach) an object; undo recreates it with its original id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DestroyCommand {
    snapshot: PlacementRequest,
    bypass_events: bool,
    detach_instead: bool,
    succeeded: bool,
}

impl DestroyCommand {
    pub fn new(target: &PlacedObject) -> Self {
        Self {
            snapshot: target.snapshot(),
            bypass_events: false,
            detach_instead: false,
            succeeded: false,
        }
    }

    pub fn with_flags(mut self, bypass_events: bool, detach_instead: bool) -> Self {
        self.bypass_events = bypass_events;
        self.detach_instead = detach_instead;
        self
    }

    pub fn snapshot(&self) -> &PlacementRequest {
        &self.snapshot
    }
}

impl Command for DestroyCommand {
    fn execute(&mut self, backend: &mut dyn PlacementBackend) -> bool {
        self.succeeded = match self.snapshot.unique_id {
            Some(id) => backend.try_destroy_by_unique_id(id, self.bypass_events, self.detach_instead),
            None => false,
        };
        self.succeeded
    }

    fn undo(&mut self, backend: &mut dyn PlacementBackend) -> bool {
        if !self.succeeded {
            return false;
        }
        restore_snapshot(&self.snapshot, backend)
    }

    fn redo(&mut self, backend: &mut dyn PlacementBackend) -> bool {
        self.execute(backend)
    }

    fn succeeded(&self) -> bool {
        self.succeeded
    }
}
