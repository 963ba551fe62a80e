//! Area volume component and its binding state.

use std::collections::HashSet;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use super::shape::{project_cells, sorted_cells, AreaShape};
use crate::grid::{GridBinding, GridLookup};

/// When an active volume recomputes its cell set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AreaTrigger {
    /// Once, when the first grid binding is found.
    Once,
    /// Whenever the volume's world position changed since the last pass.
    #[default]
    OnPositionChange,
    /// Every `Update`.
    EveryUpdate,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum VolumePhase {
    /// Spawned, not yet seen by the bind system.
    #[default]
    Pending,
    /// State reset, waiting for activation on the next update.
    Bound,
    /// Recomputing according to its trigger.
    Active,
}

/// Read-only view of a volume's covered cells.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AreaSnapshot {
    pub binding: Option<GridBinding>,
    pub cells: HashSet<IVec2>,
}

impl AreaSnapshot {
    pub fn contains(&self, binding: GridBinding, cell: IVec2) -> bool {
        self.binding == Some(binding) && self.cells.contains(&cell)
    }
}

/// Cells gained and lost by one recomputation.
///
/// When the binding changed, `removed` lists every cell of the previous
/// binding and `added` every cell of the new one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AreaDelta {
    pub binding: Option<GridBinding>,
    pub added: Vec<IVec2>,
    pub removed_from: Option<GridBinding>,
    pub removed: Vec<IVec2>,
    pub system_changed: bool,
    pub grid_changed: bool,
}

impl AreaDelta {
    /// Delta that introduces every cell of `snapshot`.
    pub fn initial(snapshot: &AreaSnapshot) -> Self {
        Self {
            binding: snapshot.binding,
            added: sorted_cells(&snapshot.cells),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && !self.grid_changed
    }
}

/// Current and previous binding and cell sets of one volume.
#[derive(Debug, Clone, Default)]
pub struct AreaVolumeState {
    pub binding: Option<GridBinding>,
    pub previous_binding: Option<GridBinding>,
    pub cells: HashSet<IVec2>,
    pub previous_cells: HashSet<IVec2>,
    system_changed: bool,
    grid_changed: bool,
}

impl AreaVolumeState {
    /// Record a new binding and cell set; the change flags accumulate until
    /// [`Self::take_binding_changes`] consumes them.
    pub fn rebind(&mut self, binding: Option<GridBinding>, cells: HashSet<IVec2>) {
        self.previous_binding = self.binding;
        if binding.map(|b| b.system) != self.binding.map(|b| b.system) {
            self.system_changed = true;
        }
        if binding != self.binding {
            self.grid_changed = true;
        }
        self.binding = binding;
        self.previous_cells = std::mem::replace(&mut self.cells, cells);
    }

    pub fn has_pending_binding_change(&self) -> bool {
        self.system_changed || self.grid_changed
    }

    /// Returns `(system_changed, grid_changed)` and clears both.
    pub fn take_binding_changes(&mut self) -> (bool, bool) {
        let flags = (self.system_changed, self.grid_changed);
        self.system_changed = false;
        self.grid_changed = false;
        flags
    }

    pub fn snapshot(&self) -> AreaSnapshot {
        AreaSnapshot {
            binding: self.binding,
            cells: self.cells.clone(),
        }
    }

    fn build_delta(&mut self) -> AreaDelta {
        let (system_changed, grid_changed) = self.take_binding_changes();
        if grid_changed {
            return AreaDelta {
                binding: self.binding,
                added: sorted_cells(&self.cells),
                removed_from: self.previous_binding,
                removed: sorted_cells(&self.previous_cells),
                system_changed,
                grid_changed,
            };
        }
        let added: HashSet<IVec2> = self.cells.difference(&self.previous_cells).copied().collect();
        let removed: HashSet<IVec2> = self.previous_cells.difference(&self.cells).copied().collect();
        AreaDelta {
            binding: self.binding,
            added: sorted_cells(&added),
            removed_from: self.binding,
            removed: sorted_cells(&removed),
            system_changed,
            grid_changed,
        }
    }
}

/// Result of a recomputation, turned into events by the area systems.
#[derive(Debug, Clone, PartialEq)]
pub enum AreaNotice {
    Initialized(AreaSnapshot),
    Updated { snapshot: AreaSnapshot, delta: AreaDelta },
}

/// A shape attached to an entity; its `Transform` translation is the
/// volume's world position.
#[derive(Component, Debug, Clone)]
pub struct AreaVolume {
    pub shape: AreaShape,
    pub trigger: AreaTrigger,
    state: AreaVolumeState,
    phase: VolumePhase,
    initialized: bool,
    last_position: Option<Vec3>,
    force_refresh: bool,
}

impl AreaVolume {
    pub fn new(shape: AreaShape) -> Self {
        Self {
            shape,
            trigger: AreaTrigger::default(),
            state: AreaVolumeState::default(),
            phase: VolumePhase::Pending,
            initialized: false,
            last_position: None,
            force_refresh: false,
        }
    }

    pub fn with_trigger(mut self, trigger: AreaTrigger) -> Self {
        self.trigger = trigger;
        self
    }

    pub fn phase(&self) -> VolumePhase {
        self.phase
    }

    pub fn state(&self) -> &AreaVolumeState {
        &self.state
    }

    /// True once a first cell set has been published.
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// The published cell set, `None` before initialization.
    pub fn snapshot(&self) -> Option<AreaSnapshot> {
        self.initialized.then(|| self.state.snapshot())
    }

    /// Swap the shape; the next refresh recomputes regardless of trigger.
    pub fn set_shape(&mut self, shape: AreaShape) {
        self.shape = shape;
        self.force_refresh = true;
    }

    /// First startup phase: reset state. Returns false if already bound.
    pub fn bind(&mut self) -> bool {
        if self.phase != VolumePhase::Pending {
            return false;
        }
        self.state = AreaVolumeState::default();
        self.initialized = false;
        self.last_position = None;
        self.phase = VolumePhase::Bound;
        true
    }

    /// Second startup phase: start reacting to the trigger and compute the
    /// first cell set.
    pub fn activate(&mut self, position: Vec3, grids: &dyn GridLookup) -> Option<AreaNotice> {
        if self.phase != VolumePhase::Bound {
            return None;
        }
        self.phase = VolumePhase::Active;
        self.recompute(position, grids)
    }

    /// Recompute if the trigger asks for it. Inactive volumes never refresh.
    pub fn refresh(&mut self, position: Vec3, grids: &dyn GridLookup) -> Option<AreaNotice> {
        if self.phase != VolumePhase::Active {
            return None;
        }
        let due = self.force_refresh
            || match self.trigger {
                AreaTrigger::Once => !self.initialized,
                AreaTrigger::OnPositionChange => {
                    !self.initialized || self.last_position != Some(position)
                }
                AreaTrigger::EveryUpdate => true,
            };
        if !due {
            return None;
        }
        self.recompute(position, grids)
    }

    fn recompute(&mut self, position: Vec3, grids: &dyn GridLookup) -> Option<AreaNotice> {
        self.last_position = Some(position);
        self.force_refresh = false;
        let binding = grids.nearest_grid_system(position);
        let cells = match binding {
            Some(binding) => project_cells(&self.shape, position, binding.system, grids),
            None => HashSet::new(),
        };
        self.state.rebind(binding, cells);

        if !self.initialized {
            // Flags raised while searching for a grid are folded into the
            // initial notice.
            self.state.take_binding_changes();
            if binding.is_none() {
                return None;
            }
            self.initialized = true;
            return Some(AreaNotice::Initialized(self.state.snapshot()));
        }

        let delta = self.state.build_delta();
        Some(AreaNotice::Updated {
            snapshot: self.state.snapshot(),
            delta,
        })
    }
}
