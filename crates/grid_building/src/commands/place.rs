use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use super::command::{restore_snapshot, Command};
use crate::objects::{PlacedObject, PlacementRequest, UniqueId};
use crate::placement::PlacementBackend;

/// Place an object, optionally replacing an existing one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceCommand {
    request: PlacementRequest,
    replaced: Option<PlacementRequest>,
    /// Whether the last execution actually removed the replaced object.
    removed_original: bool,
    placed: Option<UniqueId>,
    succeeded: bool,
}

impl PlaceCommand {
    pub fn new(request: PlacementRequest) -> Self {
        Self {
            request,
            replaced: None,
            removed_original: false,
            placed: None,
            succeeded: false,
        }
    }

    /// Place `request` in place of `original`, which is snapshotted now.
    pub fn replacing(request: PlacementRequest, original: &PlacedObject) -> Self {
        Self {
            replaced: Some(original.snapshot()),
            ..Self::new(request)
        }
    }

    pub fn request(&self) -> &PlacementRequest {
        &self.request
    }

    /// Id of the object created by the last successful execution.
    pub fn placed_id(&self) -> Option<UniqueId> {
        self.placed
    }
}

impl Command for PlaceCommand {
    fn execute(&mut self, backend: &mut dyn PlacementBackend) -> bool {
        self.succeeded = false;
        self.removed_original = match self.replaced.as_ref().and_then(|r| r.unique_id) {
            Some(id) => backend.try_destroy_by_unique_id(id, false, false),
            None => false,
        };

        match backend.try_place(&self.request) {
            Some(placed) => {
                self.request.unique_id = Some(placed.unique_id);
                self.request.variant = Some(placed.variant);
                self.placed = Some(placed.unique_id);
                self.succeeded = true;
            }
            None => {
                debug!("place command failed at {}", self.request.origin);
                if self.removed_original {
                    if let Some(original) = &self.replaced {
                        restore_snapshot(original, backend);
                    }
                    self.removed_original = false;
                }
            }
        }
        self.succeeded
    }

    fn undo(&mut self, backend: &mut dyn PlacementBackend) -> bool {
        if !self.succeeded {
            return false;
        }
        let Some(placed) = self.placed else {
            return false;
        };
        let destroyed = backend.try_destroy_by_unique_id(placed, false, false);
        if self.removed_original {
            if let Some(original) = &self.replaced {
                restore_snapshot(original, backend);
            }
        }
        destroyed
    }

    fn redo(&mut self, backend: &mut dyn PlacementBackend) -> bool {
        self.execute(backend)
    }

    fn succeeded(&self) -> bool {
        self.succeeded
    }
}
