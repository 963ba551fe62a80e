//! Grid modifier component and the systems feeding the registry.

use bevy::prelude::*;

use super::calc::ChangeMode;
use super::registry::{ChannelValuesChanged, ModifierConfig, ModifierRegistry, ModifierSchedule};
use crate::area::{AreaVolume, AreaVolumeInitialized, AreaVolumeUpdated};
use crate::channels::{ChannelId, GridChannels};
use crate::params::GridBuildingParams;
use crate::sets::{GridBuildingFixedSet, GridBuildingSet};

// ---------------------------------------------------------------------------
// Component and resources
// ---------------------------------------------------------------------------

/// Writes `amount` into `channel` over the cells of `volumes`. Any change to
/// the component reverts and re-registers it.
#[derive(Component, Debug, Clone)]
pub struct GridModifier {
    pub channel: ChannelId,
    pub amount: f32,
    pub mode: ChangeMode,
    pub falloff: bool,
    pub schedule: ModifierSchedule,
    pub volumes: Vec<Entity>,
    pub enabled: bool,
}

impl GridModifier {
    pub fn new(channel: ChannelId, amount: f32, mode: ChangeMode) -> Self {
        Self {
            channel,
            amount,
            mode,
            falloff: false,
            schedule: ModifierSchedule::default(),
            volumes: Vec::new(),
            enabled: true,
        }
    }

    pub fn with_falloff(mut self) -> Self {
        self.falloff = true;
        self
    }

    pub fn with_schedule(mut self, schedule: ModifierSchedule) -> Self {
        self.schedule = schedule;
        self
    }

    pub fn with_volumes(mut self, volumes: impl IntoIterator<Item = Entity>) -> Self {
        self.volumes = volumes.into_iter().collect();
        self
    }

    pub fn config(&self) -> ModifierConfig {
        ModifierConfig {
            channel: self.channel.clone(),
            amount: self.amount,
            mode: self.mode,
            falloff: self.falloff,
            schedule: self.schedule,
            volumes: self.volumes.clone(),
        }
    }
}

/// Fixed ticks elapsed, incremented each `FixedUpdate`.
#[derive(Resource, Default, Debug)]
pub struct ModifierTickCounter(pub u64);

// ---------------------------------------------------------------------------
// Systems
// ---------------------------------------------------------------------------

pub fn sync_grid_modifiers(
    modifiers: Query<(Entity, &GridModifier), Changed<GridModifier>>,
    volumes: Query<&AreaVolume>,
    mut registry: ResMut<ModifierRegistry>,
    mut channels: ResMut<GridChannels>,
    mut changed: EventWriter<ChannelValuesChanged>,
) {
    for (entity, modifier) in &modifiers {
        changed.send_batch(registry.unregister(entity, &mut *channels));
        if !modifier.enabled {
            debug!("grid modifier {entity} disabled");
            continue;
        }
        registry.register(entity, modifier.config());
        for &volume in &modifier.volumes {
            let Some(snapshot) = volumes.get(volume).ok().and_then(AreaVolume::snapshot) else {
                continue;
            };
            changed.send_batch(registry.update_volume(entity, volume, &snapshot, &mut *channels));
        }
        info!(
            "registered {:?} modifier {entity} on channel {}",
            modifier.mode, modifier.channel
        );
    }
}

pub fn unregister_removed_modifiers(
    mut removed: RemovedComponents<GridModifier>,
    mut registry: ResMut<ModifierRegistry>,
    mut channels: ResMut<GridChannels>,
    mut changed: EventWriter<ChannelValuesChanged>,
) {
    for entity in removed.read() {
        changed.send_batch(registry.unregister(entity, &mut *channels));
    }
}

pub fn drop_removed_volumes_from_modifiers(
    mut removed: RemovedComponents<AreaVolume>,
    mut registry: ResMut<ModifierRegistry>,
    mut channels: ResMut<GridChannels>,
    mut changed: EventWriter<ChannelValuesChanged>,
) {
    for volume in removed.read() {
        changed.send_batch(registry.remove_volume(volume, &mut *channels));
    }
}

pub fn apply_area_events_to_modifiers(
    mut initialized: EventReader<AreaVolumeInitialized>,
    mut updated: EventReader<AreaVolumeUpdated>,
    mut registry: ResMut<ModifierRegistry>,
    mut channels: ResMut<GridChannels>,
    mut changed: EventWriter<ChannelValuesChanged>,
) {
    let notices = initialized
        .read()
        .map(|e| (e.volume, &e.snapshot))
        .chain(updated.read().map(|e| (e.volume, &e.snapshot)));
    for (volume, snapshot) in notices {
        for provider in registry.providers_for_volume(volume) {
            changed.send_batch(registry.update_volume(provider, volume, snapshot, &mut *channels));
        }
    }
}

pub fn tick_modifier_counter(mut counter: ResMut<ModifierTickCounter>) {
    counter.0 = counter.0.wrapping_add(1);
}

pub fn reapply_throttled_modifiers(
    counter: Res<ModifierTickCounter>,
    params: Res<GridBuildingParams>,
    mut registry: ResMut<ModifierRegistry>,
    mut channels: ResMut<GridChannels>,
    mut changed: EventWriter<ChannelValuesChanged>,
) {
    changed.send_batch(registry.tick(counter.0, &params, &mut *channels));
}

// ---------------------------------------------------------------------------
// Plugin
// ---------------------------------------------------------------------------

pub struct ModifiersPlugin;

impl Plugin for ModifiersPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<ModifierRegistry>()
            .init_resource::<ModifierTickCounter>()
            .init_resource::<GridChannels>()
            .add_event::<ChannelValuesChanged>()
            .add_systems(
                Update,
                (
                    sync_grid_modifiers,
                    unregister_removed_modifiers,
                    drop_removed_volumes_from_modifiers,
                    apply_area_events_to_modifiers,
                )
                    .chain()
                    .in_set(GridBuildingSet::Registries),
            )
            .add_systems(
                FixedUpdate,
                (
                    tick_modifier_counter.in_set(GridBuildingFixedSet::Tick),
                    reapply_throttled_modifiers.in_set(GridBuildingFixedSet::Modifiers),
                ),
            );
    }
}
