//! Demo scene shared by the scripted run and agent mode.

use std::time::Duration;

use bevy::log::LogPlugin;
use bevy::prelude::*;

use grid_building::area::{AreaShape, AreaVolume};
use grid_building::channels::{ChannelDef, ChannelId, ChannelStore, GridChannels};
use grid_building::grid::{GridBinding, GridSystemDef, GridSystemId, GridSystems};
use grid_building::modifiers::{ChangeMode, GridModifier, ModifierSchedule};
use grid_building::objects::{
    CategoryId, ObjectCatalog, ObjectKind, ObjectType, ObjectTypeId, PrefabVariant,
};
use grid_building::params::GridBuildingParams;
use grid_building::placement::PlacedObjects;
use grid_building::rules::{GridRuleProvider, KindRule, RuleRegistry, RuleSet};
use grid_building::GridBuildingPlugin;

pub const GROUND: GridSystemId = GridSystemId(1);
pub const GROUND_SIZE: u32 = 16;

pub const HOUSE: ObjectTypeId = ObjectTypeId(1);
pub const TREE: ObjectTypeId = ObjectTypeId(2);
pub const WALL: ObjectTypeId = ObjectTypeId(3);
pub const LAMP: ObjectTypeId = ObjectTypeId(4);

pub const BUILDINGS: CategoryId = CategoryId(1);
pub const NATURE: CategoryId = CategoryId(2);

/// Centre of the no-build park spawned by [`spawn_scene`].
pub const PARK_CENTER: IVec2 = IVec2::new(4, 4);

pub fn heat() -> ChannelId {
    ChannelId::new("heat")
}

pub fn ground_binding() -> GridBinding {
    GridBinding::new(GROUND, 0)
}

pub fn cell_center(cell: IVec2) -> Vec3 {
    Vec3::new(cell.x as f32 + 0.5, 0.0, cell.y as f32 + 0.5)
}

fn catalog() -> ObjectCatalog {
    let mut catalog = ObjectCatalog::default();
    catalog.insert(
        ObjectType::new(HOUSE, "house", ObjectKind::Grid)
            .with_categories([BUILDINGS])
            .with_footprint(2, 2)
            .with_variants(vec![
                PrefabVariant::new("house_brick", 3.0),
                PrefabVariant::new("house_timber", 1.0),
            ]),
    );
    catalog.insert(ObjectType::new(TREE, "tree", ObjectKind::Free).with_categories([NATURE]));
    catalog.insert(ObjectType::new(WALL, "wall", ObjectKind::Edge).with_categories([BUILDINGS]));
    catalog.insert(ObjectType::new(LAMP, "lamp", ObjectKind::Corner));
    catalog
}

/// Build the headless app with `params` applied. FixedUpdate is driven by
/// explicit `run_schedule` calls, so the fixed timestep is set far out.
pub fn build_app(params: GridBuildingParams, with_logging: bool) -> App {
    let mut app = App::new();
    app.add_plugins(MinimalPlugins);
    if with_logging {
        app.add_plugins(LogPlugin::default());
    }

    let mut grids = GridSystems::with_probe_distance(params.probe_distance);
    grids.insert(GridSystemDef::new(GROUND, Vec3::ZERO, GROUND_SIZE, GROUND_SIZE));
    app.insert_resource(grids)
        .insert_resource(catalog())
        .insert_resource(params)
        .add_plugins(GridBuildingPlugin)
        .insert_resource(Time::<Fixed>::from_duration(Duration::from_secs(3600)));

    app.world_mut()
        .resource_mut::<GridChannels>()
        .define(heat(), ChannelDef::new(0.0, 20.0, 0.0));

    app.update();
    app
}

/// Area volumes spawned by [`spawn_scene`].
#[derive(Debug, Clone, Copy)]
pub struct SceneVolumes {
    pub park: Entity,
    pub plaza: Entity,
    pub furnace: Entity,
}

/// Spawn a park that blocks buildings, a 2x2 plaza at its centre that allows
/// them again, and a heat source.
pub fn spawn_scene(app: &mut App) -> SceneVolumes {
    let world = app.world_mut();
    let park = world
        .spawn((
            AreaVolume::new(AreaShape::Rectangle {
                width: 5,
                length: 5,
            }),
            Transform::from_translation(cell_center(PARK_CENTER)),
        ))
        .id();
    let plaza = world
        .spawn((
            AreaVolume::new(AreaShape::Rectangle {
                width: 2,
                length: 2,
            }),
            // Corner shared by the park centre and its +x/+y neighbours.
            Transform::from_translation(cell_center(PARK_CENTER) + Vec3::new(0.5, 0.0, 0.5)),
        ))
        .id();
    let furnace = world
        .spawn((
            AreaVolume::new(AreaShape::Circle { radius: 2.5 }),
            Transform::from_translation(cell_center(IVec2::new(11, 11))),
        ))
        .id();

    let no_buildings = RuleSet::default().with_kind(ObjectKind::Grid, KindRule::categories([BUILDINGS]));
    world.spawn(
        GridRuleProvider::disabler(no_buildings.clone())
            .with_volumes([park])
            .with_highlight(Color::srgb(0.8, 0.2, 0.2)),
    );
    world.spawn(
        GridRuleProvider::enabler(no_buildings)
            .with_volumes([plaza])
            .with_highlight(Color::srgb(0.2, 0.8, 0.2)),
    );
    world.spawn(
        GridModifier::new(heat(), 12.0, ChangeMode::Additive)
            .with_falloff()
            .with_schedule(ModifierSchedule::OnChange {
                min_interval_secs: 0.5,
            })
            .with_volumes([furnace]),
    );

    // Bind, then activate and publish.
    app.update();
    app.update();

    SceneVolumes {
        park,
        plaza,
        furnace,
    }
}

/// What a single cell of the ground grid currently holds.
#[derive(Debug, Clone, PartialEq)]
pub struct CellReport {
    pub object: Option<(ObjectTypeId, u128)>,
    pub blocked: bool,
    pub heat: f32,
}

pub fn report_cell(app: &App, cell: IVec2) -> CellReport {
    let world = app.world();
    let binding = ground_binding();
    let object = world
        .get_resource::<PlacedObjects>()
        .and_then(|objects| objects.object_at(binding, cell))
        .map(|object| (object.object_type, object.unique_id.0));
    let blocked = match (
        world.get_resource::<RuleRegistry>(),
        world.get_resource::<ObjectCatalog>().and_then(|c| c.get(HOUSE)),
    ) {
        (Some(rules), Some(house)) => {
            rules.is_blocked(binding, house, cell, None) && !rules.is_enabled(binding, house, cell, None)
        }
        _ => false,
    };
    let heat_value = world
        .get_resource::<GridChannels>()
        .map(|channels| channels.channel_value(binding, cell, &heat()))
        .unwrap_or(0.0);
    CellReport {
        object,
        blocked,
        heat: heat_value,
    }
}
