//! Rule registry: provider state, legality queries and overlay painting.

use std::collections::{HashMap, HashSet};

use bevy::prelude::*;

use super::config::{contains_object, RulePolarity, RuleScope, RuleSet};
use crate::area::{sorted_cells, AreaDelta, AreaSnapshot};
use crate::grid::{Direction, GridBinding, GridSystemId};
use crate::objects::ObjectType;
use crate::overlay::GridOverlay;

/// Registration data of one rule provider.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleProviderConfig {
    pub polarity: RulePolarity,
    pub scope: RuleScope,
    pub rules: RuleSet,
    /// Area volumes whose cells this provider acts on.
    pub volumes: Vec<Entity>,
    pub highlight: Option<Color>,
}

#[derive(Debug)]
struct ProviderEntry {
    config: RuleProviderConfig,
    snapshots: HashMap<Entity, AreaSnapshot>,
    /// Cells this provider currently claims a color on.
    painted: HashSet<(GridBinding, IVec2)>,
}

impl ProviderEntry {
    fn covers(&self, binding: GridBinding, cell: IVec2) -> bool {
        self.snapshots.values().any(|s| s.contains(binding, cell))
    }

    fn is_spatial(&self, polarity: RulePolarity) -> bool {
        self.config.polarity == polarity && self.config.scope == RuleScope::Spatial
    }
}

/// All registered rule providers, keyed by provider entity.
#[derive(Resource, Debug, Default)]
pub struct RuleRegistry {
    providers: HashMap<Entity, ProviderEntry>,
}

impl RuleRegistry {
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    pub fn is_registered(&self, provider: Entity) -> bool {
        self.providers.contains_key(&provider)
    }

    /// Register a provider. Registering an already known provider is a no-op
    /// and returns false.
    pub fn register(&mut self, provider: Entity, config: RuleProviderConfig) -> bool {
        if self.providers.contains_key(&provider) {
            return false;
        }
        self.providers.insert(
            provider,
            ProviderEntry {
                config,
                snapshots: HashMap::new(),
                painted: HashSet::new(),
            },
        );
        true
    }

    /// Forget a provider and withdraw its colors. Cells still claimed by
    /// another highlighted provider are repainted with that provider's color.
    pub fn unregister(&mut self, provider: Entity, overlay: &mut dyn GridOverlay) -> bool {
        let Some(entry) = self.providers.remove(&provider) else {
            return false;
        };
        let mut released: Vec<(GridBinding, IVec2)> = entry.painted.into_iter().collect();
        released.sort_by_key(|(b, c)| (b.system, b.layer, c.y, c.x));
        for (binding, cell) in released {
            self.repaint_cell(binding, cell, overlay);
        }
        true
    }

    /// Providers subscribed to `volume`, in entity order.
    pub fn providers_for_volume(&self, volume: Entity) -> Vec<Entity> {
        let mut providers: Vec<Entity> = self
            .providers
            .iter()
            .filter(|(_, entry)| entry.config.volumes.contains(&volume))
            .map(|(&provider, _)| provider)
            .collect();
        providers.sort();
        providers
    }

    /// Record a new cell set for one of `provider`'s volumes and update the
    /// overlay from `delta`.
    pub fn update_volume(
        &mut self,
        provider: Entity,
        volume: Entity,
        snapshot: &AreaSnapshot,
        delta: &AreaDelta,
        overlay: &mut dyn GridOverlay,
    ) {
        let Some(entry) = self.providers.get_mut(&provider) else {
            return;
        };
        if !entry.config.volumes.contains(&volume) {
            return;
        }
        entry.snapshots.insert(volume, snapshot.clone());
        if entry.config.highlight.is_none() || entry.config.scope == RuleScope::Global {
            return;
        }
        if let Some(from) = delta.removed_from {
            for &cell in &delta.removed {
                self.release_cell(provider, from, cell, overlay);
            }
        }
        if let Some(binding) = snapshot.binding {
            for &cell in &delta.added {
                self.claim_cell(provider, binding, cell, overlay);
            }
        }
    }

    /// Drop a volume from every provider subscribed to it.
    pub fn remove_volume(&mut self, volume: Entity, overlay: &mut dyn GridOverlay) {
        for provider in self.providers_for_volume(volume) {
            let Some(entry) = self.providers.get_mut(&provider) else {
                continue;
            };
            let Some(snapshot) = entry.snapshots.remove(&volume) else {
                continue;
            };
            let Some(binding) = snapshot.binding else {
                continue;
            };
            for cell in sorted_cells(&snapshot.cells) {
                self.release_cell(provider, binding, cell, overlay);
            }
        }
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// Does a spatial disabler cover an `object_type` anchored at `cell`?
    pub fn is_blocked(
        &self,
        binding: GridBinding,
        object_type: &ObjectType,
        cell: IVec2,
        direction: Option<Direction>,
    ) -> bool {
        self.spatial_match(RulePolarity::Disable, binding, object_type, cell, direction)
    }

    /// Does a spatial enabler cover an `object_type` anchored at `cell`?
    pub fn is_enabled(
        &self,
        binding: GridBinding,
        object_type: &ObjectType,
        cell: IVec2,
        direction: Option<Direction>,
    ) -> bool {
        self.spatial_match(RulePolarity::Enable, binding, object_type, cell, direction)
    }

    /// Is any global provider of `polarity` registered?
    pub fn any_global_active(&self, polarity: RulePolarity) -> bool {
        self.providers
            .values()
            .any(|e| e.config.polarity == polarity && e.config.scope == RuleScope::Global)
    }

    pub fn is_globally_blocked(&self, object_type: &ObjectType) -> bool {
        self.global_match(RulePolarity::Disable, object_type)
    }

    pub fn is_globally_enabled(&self, object_type: &ObjectType) -> bool {
        self.global_match(RulePolarity::Enable, object_type)
    }

    fn spatial_match(
        &self,
        polarity: RulePolarity,
        binding: GridBinding,
        object_type: &ObjectType,
        cell: IVec2,
        direction: Option<Direction>,
    ) -> bool {
        self.providers
            .values()
            .filter(|e| e.is_spatial(polarity) && e.config.rules.applies_to(object_type))
            .any(|e| {
                e.snapshots.values().any(|s| {
                    s.binding == Some(binding)
                        && contains_object(&s.cells, object_type.kind, cell, direction)
                })
            })
    }

    fn global_match(&self, polarity: RulePolarity, object_type: &ObjectType) -> bool {
        self.providers.values().any(|e| {
            e.config.polarity == polarity
                && e.config.scope == RuleScope::Global
                && e.config.rules.applies_to(object_type)
        })
    }

    // -----------------------------------------------------------------------
    // Painting
    // -----------------------------------------------------------------------

    /// Repaint every highlighted cell on `system`, or withdraw all claims
    /// there when the system's overlay is hidden.
    pub fn repaint_system(&mut self, system: GridSystemId, overlay: &mut dyn GridOverlay) {
        let visible = overlay.is_overlay_visible(system);
        let mut touched: HashSet<(GridBinding, IVec2)> = HashSet::new();
        for entry in self.providers.values_mut() {
            entry.painted.retain(|&(binding, cell)| {
                if binding.system != system {
                    return true;
                }
                touched.insert((binding, cell));
                false
            });
            if !visible
                || entry.config.highlight.is_none()
                || entry.config.scope == RuleScope::Global
            {
                continue;
            }
            for snapshot in entry.snapshots.values() {
                let Some(binding) = snapshot.binding.filter(|b| b.system == system) else {
                    continue;
                };
                for &cell in &snapshot.cells {
                    entry.painted.insert((binding, cell));
                    touched.insert((binding, cell));
                }
            }
        }
        let mut touched: Vec<(GridBinding, IVec2)> = touched.into_iter().collect();
        touched.sort_by_key(|(b, c)| (b.layer, c.y, c.x));
        for (binding, cell) in touched {
            self.repaint_cell(binding, cell, overlay);
        }
    }

    fn claim_cell(
        &mut self,
        provider: Entity,
        binding: GridBinding,
        cell: IVec2,
        overlay: &mut dyn GridOverlay,
    ) {
        if !overlay.is_overlay_visible(binding.system) {
            return;
        }
        let Some(entry) = self.providers.get_mut(&provider) else {
            return;
        };
        entry.painted.insert((binding, cell));
        self.repaint_cell(binding, cell, overlay);
    }

    fn release_cell(
        &mut self,
        provider: Entity,
        binding: GridBinding,
        cell: IVec2,
        overlay: &mut dyn GridOverlay,
    ) {
        let Some(entry) = self.providers.get_mut(&provider) else {
            return;
        };
        // Another volume of the same provider may still cover the cell.
        if entry.covers(binding, cell) {
            return;
        }
        if !entry.painted.remove(&(binding, cell)) {
            return;
        }
        self.repaint_cell(binding, cell, overlay);
    }

    /// Paint the winning claim on `cell`, or reset it when nobody claims it.
    fn repaint_cell(&self, binding: GridBinding, cell: IVec2, overlay: &mut dyn GridOverlay) {
        match self.winning_color(binding, cell) {
            Some(color) => overlay.set_cell_color(binding, cell, color, false),
            None => overlay.reset_cell_color(binding, cell, false),
        }
    }

    /// Enablers outrank disablers; within a polarity the lowest entity wins.
    pub fn winning_color(&self, binding: GridBinding, cell: IVec2) -> Option<Color> {
        [RulePolarity::Enable, RulePolarity::Disable]
            .into_iter()
            .find_map(|polarity| {
                self.providers
                    .iter()
                    .filter(|(_, e)| {
                        e.config.polarity == polarity && e.painted.contains(&(binding, cell))
                    })
                    .min_by_key(|(&provider, _)| provider)
                    .and_then(|(_, e)| e.config.highlight)
            })
    }
}
