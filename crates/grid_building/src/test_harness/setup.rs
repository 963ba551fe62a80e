//! Spawning and request helpers for `TestWorld`.

use bevy::prelude::*;

use crate::area::{AreaShape, AreaTrigger, AreaVolume};
use crate::channels::{ChannelDef, ChannelId, GridChannels};
use crate::commands::{CommandRequested, GridCommand, PlaceCommand, RedoRequested, UndoRequested};
use crate::grid::{Direction, GridBinding, GridSystemDef, GridSystems};
use crate::modifiers::GridModifier;
use crate::objects::{ObjectTypeId, PlacementRequest, ShapePlacement};
use crate::rules::GridRuleProvider;

use super::{TestWorld, G1};

/// World position of the centre of `cell` on G1.
pub fn cell_center(x: i32, y: i32) -> Vec3 {
    Vec3::new(x as f32 + 0.5, 0.0, y as f32 + 0.5)
}

pub fn grid_request(object_type: ObjectTypeId, x: i32, y: i32) -> PlacementRequest {
    PlacementRequest::new(
        object_type,
        GridBinding::new(G1, 0),
        IVec2::new(x, y),
        ShapePlacement::Grid {
            rotation: Direction::North,
        },
    )
}

impl TestWorld {
    // -----------------------------------------------------------------------
    // Simulation
    // -----------------------------------------------------------------------

    /// One `Update` pass.
    pub fn update(&mut self) {
        self.app.update();
    }

    pub fn update_n(&mut self, n: u32) {
        for _ in 0..n {
            self.app.update();
        }
    }

    /// Run N fixed ticks by executing the `FixedUpdate` schedule directly.
    pub fn tick(&mut self, n: u32) {
        for _ in 0..n {
            self.app.world_mut().run_schedule(FixedUpdate);
        }
    }

    // -----------------------------------------------------------------------
    // Spawning
    // -----------------------------------------------------------------------

    /// Spawn an area volume at `position`. It publishes its first cell set two
    /// updates later.
    pub fn spawn_volume(&mut self, shape: AreaShape, position: Vec3) -> Entity {
        self.spawn_volume_with_trigger(shape, position, AreaTrigger::OnPositionChange)
    }

    pub fn spawn_volume_with_trigger(&mut self, shape: AreaShape, position: Vec3, trigger: AreaTrigger) -> Entity {
        self.app
            .world_mut()
            .spawn((
                AreaVolume::new(shape).with_trigger(trigger),
                Transform::from_translation(position),
            ))
            .id()
    }

    pub fn spawn_provider(&mut self, provider: GridRuleProvider) -> Entity {
        self.app.world_mut().spawn(provider).id()
    }

    pub fn spawn_modifier(&mut self, modifier: GridModifier) -> Entity {
        self.app.world_mut().spawn(modifier).id()
    }

    pub fn move_volume(&mut self, volume: Entity, position: Vec3) {
        if let Some(mut transform) = self.app.world_mut().get_mut::<Transform>(volume) {
            transform.translation = position;
        }
    }

    pub fn despawn(&mut self, entity: Entity) {
        self.app.world_mut().despawn(entity);
    }

    pub fn define_channel(&mut self, channel: &ChannelId, def: ChannelDef) {
        self.app
            .world_mut()
            .resource_mut::<GridChannels>()
            .define(channel.clone(), def);
    }

    pub fn add_grid_system(&mut self, def: GridSystemDef) {
        self.app.world_mut().resource_mut::<GridSystems>().insert(def);
    }

    // -----------------------------------------------------------------------
    // Requests
    // -----------------------------------------------------------------------

    pub fn send_command(&mut self, command: impl Into<GridCommand>) {
        self.app.world_mut().send_event(CommandRequested(command.into()));
    }

    pub fn place(&mut self, request: PlacementRequest) {
        self.send_command(PlaceCommand::new(request));
    }

    pub fn undo(&mut self) {
        self.app.world_mut().send_event(UndoRequested);
    }

    pub fn redo(&mut self) {
        self.app.world_mut().send_event(RedoRequested);
    }

    pub fn send<E: Event>(&mut self, event: E) {
        self.app.world_mut().send_event(event);
    }
}
