//! Query methods for `TestWorld`.

use bevy::ecs::event::Events;
use bevy::prelude::*;

use crate::channels::{ChannelId, ChannelStore, GridChannels};
use crate::commands::{CommandFinished, CommandInvoker};
use crate::grid::GridBinding;
use crate::objects::PlacedObject;
use crate::overlay::CellOverlay;
use crate::placement::{ObjectLifecycle, PlacedObjects};
use crate::rules::RuleRegistry;

use super::{TestWorld, G1};

impl TestWorld {
    pub fn world_mut(&mut self) -> &mut World {
        self.app.world_mut()
    }

    pub fn resource<R: Resource>(&self) -> &R {
        self.app.world().resource::<R>()
    }

    pub fn invoker(&self) -> &CommandInvoker {
        self.resource::<CommandInvoker>()
    }

    pub fn objects(&self) -> &PlacedObjects {
        self.resource::<PlacedObjects>()
    }

    pub fn rules(&self) -> &RuleRegistry {
        self.resource::<RuleRegistry>()
    }

    pub fn overlay(&self) -> &CellOverlay {
        self.resource::<CellOverlay>()
    }

    /// Object occupying `(x, y)` on G1 layer 0.
    pub fn object_at(&self, x: i32, y: i32) -> Option<&PlacedObject> {
        self.objects().object_at(GridBinding::new(G1, 0), IVec2::new(x, y))
    }

    pub fn color_at(&self, x: i32, y: i32) -> Option<Color> {
        self.overlay().color_at(GridBinding::new(G1, 0), IVec2::new(x, y))
    }

    pub fn channel_value(&self, channel: &ChannelId, x: i32, y: i32) -> f32 {
        self.resource::<GridChannels>()
            .channel_value(GridBinding::new(G1, 0), IVec2::new(x, y), channel)
    }

    /// Every `CommandFinished` still buffered, oldest first.
    pub fn finished(&self) -> Vec<CommandFinished> {
        self.events::<CommandFinished>()
    }

    pub fn lifecycle(&self) -> Vec<ObjectLifecycle> {
        self.events::<ObjectLifecycle>()
    }

    pub fn events<E: Event + Clone>(&self) -> Vec<E> {
        let events = self.resource::<Events<E>>();
        events.iter_current_update_events().cloned().collect()
    }
}
