//! Grid modifiers: write channel values over the cells of area volumes.
//!
//! A [`GridModifier`] adds to, multiplies or overwrites a channel on every
//! cell its volumes cover, optionally fading toward the channel minimum away
//! from the area's centroid. Initial application is immediate; later
//! re-applications are throttled on the fixed tick and always revert the
//! previously applied geometry first.

mod calc;
mod registry;
mod systems;


pub use calc::{apply_value, cell_values, revert_value, ChangeMode};
pub use registry::{ChannelValuesChanged, ModifierConfig, ModifierRegistry, ModifierSchedule};
pub use systems::{
    apply_area_events_to_modifiers, drop_removed_volumes_from_modifiers,
    reapply_throttled_modifiers, sync_grid_modifiers, tick_modifier_counter,
    unregister_removed_modifiers, GridModifier, ModifierTickCounter, ModifiersPlugin,
};
