//! # TestWorld: headless integration test harness
//!
//! Wraps `bevy::app::App` + [`GridBuildingPlugin`] with a single 10x10 grid
//! system (G1) and a small object catalog, so tests can spawn volumes and
//! providers, send requests, and call `update()` / `tick()` explicitly.

mod assertions;
mod queries;
mod setup;

pub use setup::{cell_center, grid_request};

use std::time::Duration;

use bevy::app::App;
use bevy::prelude::*;

use crate::grid::{GridSystemDef, GridSystemId, GridSystems};
use crate::objects::{
    CategoryId, ObjectCatalog, ObjectKind, ObjectType, ObjectTypeId, PrefabVariant,
};
use crate::GridBuildingPlugin;

pub const G1: GridSystemId = GridSystemId(1);
pub const CRATE: ObjectTypeId = ObjectTypeId(1);
pub const FENCE: ObjectTypeId = ObjectTypeId(2);
pub const CRATES: CategoryId = CategoryId(1);

/// A headless Bevy App wrapping `GridBuildingPlugin` for integration testing.
pub struct TestWorld {
    app: App,
}

impl TestWorld {
    pub fn new() -> Self {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins);

        let mut grids = GridSystems::default();
        grids.insert(GridSystemDef::new(G1, Vec3::ZERO, 10, 10));
        app.insert_resource(grids);

        let mut catalog = ObjectCatalog::default();
        catalog.insert(
            ObjectType::new(CRATE, "crate", ObjectKind::Grid)
                .with_categories([CRATES])
                .with_variants(vec![
                    PrefabVariant::new("crate_a", 1.0),
                    PrefabVariant::new("crate_b", 1.0),
                ]),
        );
        catalog.insert(ObjectType::new(FENCE, "fence", ObjectKind::Edge));
        app.insert_resource(catalog);

        app.add_plugins(GridBuildingPlugin);
        // FixedUpdate only runs through explicit `tick()` calls.
        app.insert_resource(Time::<Fixed>::from_duration(Duration::from_secs(3600)));
        app.update();

        Self { app }
    }
}

impl Default for TestWorld {
    fn default() -> Self {
        Self::new()
    }
}
