//! Area volumes: 3-D shapes projected onto the nearest grid.
//!
//! An [`AreaVolume`] owns a shape and, from its entity's `Transform`, works
//! out which grid system and layer it sits on and which cells it covers. It
//! never writes grid state; it only publishes read-only cell sets through
//! [`AreaVolumeInitialized`] and [`AreaVolumeUpdated`], which the rule and
//! modifier registries consume later in the same `Update` pass.
//!
//! Startup is two-phase: the component is bound when it appears and activated
//! on the next tick, so providers spawned alongside it are registered before
//! the first cell set is published.

mod shape;
mod systems;
mod volume;


pub use shape::{project_cells, sorted_cells, AreaShape};
pub use systems::{
    activate_area_volumes, bind_area_volumes, refresh_area_volumes, AreaPlugin,
    AreaVolumeInitialized, AreaVolumeUpdated,
};
pub use volume::{
    AreaDelta, AreaNotice, AreaSnapshot, AreaTrigger, AreaVolume, AreaVolumeState, VolumePhase,
};
