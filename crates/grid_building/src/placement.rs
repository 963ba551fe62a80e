//! Placement and destruction primitives.
//!
//! Commands never touch the object store directly; they go through
//! [`PlacementBackend`]. [`PlacedObjects`] is the reference store (slot
//! exclusivity, variant selection, identity), and [`RuledPlacement`] wraps it
//! with the legality check that consults the dynamic area rules.

use std::collections::HashMap;

use bevy::prelude::*;
use rand::distributions::{Distribution, WeightedIndex};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::config::DEFAULT_PLACEMENT_SEED;
use crate::grid::{GridBinding, GridLookup, GridSystemId};
use crate::objects::{
    footprint_cells, ObjectCatalog, ObjectType, PlacedObject, PlacementRequest, SlotKey, SubSlot,
    UniqueId,
};
use crate::rules::RuleRegistry;

/// The placement/destruction primitives commands are written against.
pub trait PlacementBackend {
    /// Place an object. Returns the placed object on success.
    fn try_place(&mut self, request: &PlacementRequest) -> Option<PlacedObject>;

    /// Remove the object with `id`. `bypass_events` suppresses lifecycle
    /// notifications; `detach_instead` keeps the object materialized but
    /// releases its grid slots.
    fn try_destroy_by_unique_id(&mut self, id: UniqueId, bypass_events: bool, detach_instead: bool) -> bool;

    /// Give the object currently known as `current` the identity `original`.
    fn restamp_unique_id(&mut self, current: UniqueId, original: UniqueId) -> bool;

    fn has_grid_system(&self, system: GridSystemId) -> bool;

    fn object(&self, id: UniqueId) -> Option<&PlacedObject>;
}

// ---------------------------------------------------------------------------
// Lifecycle notifications
// ---------------------------------------------------------------------------

#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectLifecycle {
    Placed(UniqueId),
    Destroyed(UniqueId),
    Detached(UniqueId),
}

// ---------------------------------------------------------------------------
// PlacedObjects store
// ---------------------------------------------------------------------------

/// All live objects across every grid system, indexed by identity and slot.
#[derive(Resource, Debug)]
pub struct PlacedObjects {
    objects: HashMap<UniqueId, PlacedObject>,
    slots: HashMap<SlotKey, UniqueId>,
    detached: HashMap<UniqueId, PlacedObject>,
    pending: Vec<ObjectLifecycle>,
    rng: ChaCha8Rng,
}

impl Default for PlacedObjects {
    fn default() -> Self {
        Self::with_seed(DEFAULT_PLACEMENT_SEED)
    }
}

impl PlacedObjects {
    pub fn with_seed(seed: u64) -> Self {
        Self {
            objects: HashMap::new(),
            slots: HashMap::new(),
            detached: HashMap::new(),
            pending: Vec::new(),
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    pub fn get(&self, id: UniqueId) -> Option<&PlacedObject> {
        self.objects.get(&id)
    }

    pub fn detached(&self, id: UniqueId) -> Option<&PlacedObject> {
        self.detached.get(&id)
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PlacedObject> {
        self.objects.values()
    }

    pub fn occupant(&self, slot: &SlotKey) -> Option<UniqueId> {
        self.slots.get(slot).copied()
    }

    /// The grid-kind object covering `cell`, if any.
    pub fn object_at(&self, binding: GridBinding, cell: IVec2) -> Option<&PlacedObject> {
        let slot = SlotKey {
            binding,
            cell,
            slot: SubSlot::Cell,
        };
        self.occupant(&slot).and_then(|id| self.objects.get(&id))
    }

    pub fn has_pending_lifecycle(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Take the lifecycle notifications queued since the last drain.
    pub fn drain_lifecycle(&mut self) -> Vec<ObjectLifecycle> {
        std::mem::take(&mut self.pending)
    }

    /// Place without consulting dynamic rules. Fails on a kind mismatch, an
    /// unknown grid system, an out-of-bounds footprint, an occupied slot, an
    /// identity clash, or an invalid variant index.
    pub fn place(
        &mut self,
        request: &PlacementRequest,
        object_type: &ObjectType,
        grids: &dyn GridLookup,
    ) -> Option<PlacedObject> {
        if object_type.id != request.object_type
            || request.placement.kind() != object_type.kind
            || !request.placement.is_well_formed()
        {
            return None;
        }
        let system = request.binding.system;
        if !grids.contains_system(system) {
            return None;
        }
        let cells = footprint_cells(object_type, request.origin, &request.placement);
        if !cells.iter().all(|&cell| grids.is_within_bounds(system, cell)) {
            return None;
        }
        let slots = SlotKey::for_placement(request.binding, &cells, &request.placement);
        if slots.iter().any(|slot| self.slots.contains_key(slot)) {
            return None;
        }
        if let Some(id) = request.unique_id {
            if self.objects.contains_key(&id) {
                return None;
            }
        }
        let variant = match request.variant {
            Some(v) if v < object_type.variants.len().max(1) => v,
            Some(_) => return None,
            None => self.pick_variant(object_type),
        };
        let unique_id = match request.unique_id {
            Some(id) => id,
            None => self.fresh_id(),
        };

        let object = PlacedObject {
            unique_id,
            object_type: object_type.id,
            binding: request.binding,
            origin: request.origin,
            placement: request.placement,
            world_offset: request.world_offset,
            variant,
        };
        for slot in slots {
            self.slots.insert(slot, unique_id);
        }
        self.detached.remove(&unique_id);
        self.objects.insert(unique_id, object.clone());
        self.pending.push(ObjectLifecycle::Placed(unique_id));
        Some(object)
    }

    pub fn destroy(&mut self, id: UniqueId, bypass_events: bool, detach_instead: bool) -> bool {
        let Some(object) = self.objects.remove(&id) else {
            return false;
        };
        self.slots.retain(|_, occupant| *occupant != id);
        let notice = if detach_instead {
            self.detached.insert(id, object);
            ObjectLifecycle::Detached(id)
        } else {
            ObjectLifecycle::Destroyed(id)
        };
        if !bypass_events {
            self.pending.push(notice);
        }
        true
    }

    pub fn restamp(&mut self, current: UniqueId, original: UniqueId) -> bool {
        if current == original {
            return self.objects.contains_key(&current);
        }
        if self.objects.contains_key(&original) {
            return false;
        }
        let Some(mut object) = self.objects.remove(&current) else {
            return false;
        };
        object.unique_id = original;
        self.detached.remove(&original);
        for occupant in self.slots.values_mut() {
            if *occupant == current {
                *occupant = original;
            }
        }
        for notice in &mut self.pending {
            if *notice == ObjectLifecycle::Placed(current) {
                *notice = ObjectLifecycle::Placed(original);
            }
        }
        self.objects.insert(original, object);
        true
    }

    fn pick_variant(&mut self, object_type: &ObjectType) -> usize {
        match WeightedIndex::new(object_type.variants.iter().map(|v| v.weight.max(0.0))) {
            Ok(dist) => dist.sample(&mut self.rng),
            // Empty or all-zero weight sets fall back to the first variant.
            Err(_) => 0,
        }
    }

    fn fresh_id(&mut self) -> UniqueId {
        loop {
            let id = UniqueId(self.rng.gen::<u128>());
            if id.0 != 0 && !self.objects.contains_key(&id) && !self.detached.contains_key(&id) {
                return id;
            }
        }
    }
}

// ---------------------------------------------------------------------------
// RuledPlacement backend
// ---------------------------------------------------------------------------

/// [`PlacementBackend`] over the reference store, with legality checks that
/// consult the rule registry when one is available.
pub struct RuledPlacement<'a> {
    pub objects: &'a mut PlacedObjects,
    pub grids: &'a dyn GridLookup,
    pub catalog: &'a ObjectCatalog,
    pub rules: Option<&'a RuleRegistry>,
}

impl<'a> RuledPlacement<'a> {
    pub fn new(
        objects: &'a mut PlacedObjects,
        grids: &'a dyn GridLookup,
        catalog: &'a ObjectCatalog,
        rules: Option<&'a RuleRegistry>,
    ) -> Self {
        Self {
            objects,
            grids,
            catalog,
            rules,
        }
    }

    /// A cell refuses the placement when it is blocked and not enabled.
    /// Global (non-spatial) providers apply to every cell.
    fn rules_allow(&self, object_type: &ObjectType, request: &PlacementRequest) -> bool {
        let Some(rules) = self.rules else {
            return true;
        };
        let direction = request.placement.direction();
        let globally_blocked = rules.is_globally_blocked(object_type);
        let globally_enabled = rules.is_globally_enabled(object_type);
        footprint_cells(object_type, request.origin, &request.placement)
            .into_iter()
            .all(|cell| {
                let blocked = globally_blocked
                    || rules.is_blocked(request.binding, object_type, cell, direction);
                !blocked
                    || globally_enabled
                    || rules.is_enabled(request.binding, object_type, cell, direction)
            })
    }
}

impl PlacementBackend for RuledPlacement<'_> {
    fn try_place(&mut self, request: &PlacementRequest) -> Option<PlacedObject> {
        let Some(object_type) = self.catalog.get(request.object_type) else {
            debug!("placement refused: unknown object type {:?}", request.object_type);
            return None;
        };
        if !request.bypass_rules && !self.rules_allow(object_type, request) {
            debug!(
                "placement of {} at {} refused by area rules",
                object_type.name, request.origin
            );
            return None;
        }
        self.objects.place(request, object_type, self.grids)
    }

    fn try_destroy_by_unique_id(&mut self, id: UniqueId, bypass_events: bool, detach_instead: bool) -> bool {
        self.objects.destroy(id, bypass_events, detach_instead)
    }

    fn restamp_unique_id(&mut self, current: UniqueId, original: UniqueId) -> bool {
        self.objects.restamp(current, original)
    }

    fn has_grid_system(&self, system: GridSystemId) -> bool {
        self.grids.contains_system(system)
    }

    fn object(&self, id: UniqueId) -> Option<&PlacedObject> {
        self.objects.get(id)
    }
}
