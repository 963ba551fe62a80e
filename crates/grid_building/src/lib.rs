//! Grid building core: undoable placement commands plus dynamic area rules.
//!
//! Area volumes project shapes onto grid systems; rule providers block or
//! allow object kinds inside those areas; grid modifiers write per-cell
//! channel values over them. All placement changes go through commands kept
//! in a bounded undo/redo history.

use bevy::prelude::*;

pub mod area;
pub mod channels;
pub mod commands;
pub mod config;
pub mod grid;
pub mod modifiers;
pub mod objects;
pub mod overlay;
pub mod params;
pub mod placement;
pub mod rules;
pub mod saveable;
pub mod sets;

#[cfg(test)]
mod integration_tests;
#[cfg(test)]
pub mod test_harness;

pub use modifiers::ModifierTickCounter;
pub use saveable::{decode_or_warn, Saveable, SaveableRegistry};

use area::AreaPlugin;
use commands::{CommandInvoker, CommandsPlugin};
use grid::GridSystems;
use modifiers::ModifiersPlugin;
use objects::ObjectCatalog;
use params::GridBuildingParams;
use placement::PlacedObjects;
use rules::RulesPlugin;
use sets::{GridBuildingFixedSet, GridBuildingSet};

// ---------------------------------------------------------------------------
// Params propagation
// ---------------------------------------------------------------------------

/// Push changed params into the resources that cache them.
pub fn apply_params(
    params: Res<GridBuildingParams>,
    mut invoker: ResMut<CommandInvoker>,
    grids: Option<ResMut<GridSystems>>,
) {
    if !params.is_changed() {
        return;
    }
    if invoker.max_history() != params.max_undo_history {
        invoker.set_max_history(params.max_undo_history);
    }
    if let Some(mut grids) = grids {
        grids.set_probe_distance(params.probe_distance);
    }
    debug!("grid building params applied: {:?}", *params);
}

// ---------------------------------------------------------------------------
// Plugin
// ---------------------------------------------------------------------------

/// Everything needed for headless grid building. The host may insert its own
/// [`GridBuildingParams`], [`GridSystems`] or [`ObjectCatalog`] before adding
/// the plugin; otherwise defaults are used.
pub struct GridBuildingPlugin;

impl Plugin for GridBuildingPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<GridBuildingParams>()
            .init_resource::<GridSystems>()
            .init_resource::<ObjectCatalog>()
            .init_resource::<PlacedObjects>()
            .configure_sets(
                Update,
                (
                    GridBuildingSet::Params,
                    GridBuildingSet::Areas,
                    GridBuildingSet::Registries,
                    GridBuildingSet::Commands,
                )
                    .chain(),
            )
            .configure_sets(
                FixedUpdate,
                (GridBuildingFixedSet::Tick, GridBuildingFixedSet::Modifiers).chain(),
            )
            .add_plugins((AreaPlugin, RulesPlugin, ModifiersPlugin, CommandsPlugin))
            .add_systems(Update, apply_params.in_set(GridBuildingSet::Params));
    }
}
