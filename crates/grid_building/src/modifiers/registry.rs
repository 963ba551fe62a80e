//! Modifier registry: applied geometry tracking and throttled re-application.

use std::collections::HashMap;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use super::calc::{apply_value, cell_values, revert_value, ChangeMode};
use crate::area::AreaSnapshot;
use crate::channels::{ChannelId, ChannelStore};
use crate::grid::GridBinding;
use crate::params::GridBuildingParams;

/// How often a registered modifier is re-applied.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ModifierSchedule {
    /// After an area change, at most once per interval.
    OnChange { min_interval_secs: f32 },
    /// Unconditionally, once per interval.
    Every { interval_secs: f32 },
}

impl Default for ModifierSchedule {
    fn default() -> Self {
        ModifierSchedule::OnChange {
            min_interval_secs: 0.0,
        }
    }
}

impl ModifierSchedule {
    pub fn interval_ticks(&self, params: &GridBuildingParams) -> u64 {
        match *self {
            ModifierSchedule::OnChange { min_interval_secs } => params.seconds_to_ticks(min_interval_secs),
            ModifierSchedule::Every { interval_secs } => params.seconds_to_ticks(interval_secs),
        }
    }
}

/// Channel cells rewritten by one application or reversion.
#[derive(Event, Debug, Clone, PartialEq)]
pub struct ChannelValuesChanged {
    pub binding: GridBinding,
    pub channel: ChannelId,
    pub cells: Vec<IVec2>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModifierConfig {
    pub channel: ChannelId,
    pub amount: f32,
    pub mode: ChangeMode,
    pub falloff: bool,
    pub schedule: ModifierSchedule,
    pub volumes: Vec<Entity>,
}

/// Channel values a Fixed-mode write replaced, per cell.
type Overwritten = HashMap<IVec2, f32>;

#[derive(Debug)]
struct VolumeState {
    current: AreaSnapshot,
    applied: Option<AreaSnapshot>,
    overwritten: Overwritten,
}

#[derive(Debug)]
struct ModifierEntry {
    config: ModifierConfig,
    volumes: HashMap<Entity, VolumeState>,
    dirty: bool,
    last_applied: Option<u64>,
}

impl ModifierEntry {
    /// Apply over `snapshot`. Fixed mode also returns the values it replaced.
    fn apply(
        &self,
        snapshot: &AreaSnapshot,
        store: &mut dyn ChannelStore,
    ) -> Option<(ChannelValuesChanged, Overwritten)> {
        let binding = snapshot.binding?;
        let config = &self.config;
        let def = store.channel_def(&config.channel)?;
        let values = cell_values(&snapshot.cells, config.amount, config.falloff, def.min);
        let mut cells = Vec::with_capacity(values.len());
        let mut overwritten = Overwritten::new();
        for (cell, value) in values {
            let current = store.channel_value(binding, cell, &config.channel);
            if config.mode == ChangeMode::Fixed {
                overwritten.insert(cell, current);
            }
            let next = apply_value(config.mode, current, value, config.amount, &def);
            store.set_channel_value(binding, cell, &config.channel, next);
            cells.push(cell);
        }
        let changed = ChannelValuesChanged {
            binding,
            channel: config.channel.clone(),
            cells,
        };
        Some((changed, overwritten))
    }

    /// Undo an application over `snapshot`. Cells with a recorded
    /// overwritten value get it back; the rest use [`revert_value`].
    fn revert(
        &self,
        snapshot: &AreaSnapshot,
        overwritten: &Overwritten,
        store: &mut dyn ChannelStore,
    ) -> Option<ChannelValuesChanged> {
        let binding = snapshot.binding?;
        let config = &self.config;
        let def = store.channel_def(&config.channel)?;
        let values = cell_values(&snapshot.cells, config.amount, config.falloff, def.min);
        let mut cells = Vec::with_capacity(values.len());
        for (cell, value) in values {
            let previous = match overwritten.get(&cell) {
                Some(&previous) => def.clamp(previous),
                None => {
                    let current = store.channel_value(binding, cell, &config.channel);
                    revert_value(config.mode, current, value, config.amount, &def)
                }
            };
            store.set_channel_value(binding, cell, &config.channel, previous);
            cells.push(cell);
        }
        Some(ChannelValuesChanged {
            binding,
            channel: config.channel.clone(),
            cells,
        })
    }

    /// Revert every applied volume using its current geometry.
    fn revert_all(&self, store: &mut dyn ChannelStore, out: &mut Vec<ChannelValuesChanged>) {
        let mut volumes: Vec<(&Entity, &VolumeState)> = self.volumes.iter().collect();
        volumes.sort_by_key(|(volume, _)| **volume);
        for (_, state) in volumes {
            if state.applied.is_some() {
                out.extend(self.revert(&state.current, &state.overwritten, store));
            }
        }
    }

    fn reapply(&mut self, now: u64, store: &mut dyn ChannelStore, out: &mut Vec<ChannelValuesChanged>) {
        let mut volumes: Vec<Entity> = self.volumes.keys().copied().collect();
        volumes.sort();
        for volume in volumes {
            let Some(state) = self.volumes.get_mut(&volume) else {
                continue;
            };
            let previous = state.applied.take();
            let overwritten = std::mem::take(&mut state.overwritten);
            let current = state.current.clone();
            if let Some(previous) = &previous {
                out.extend(self.revert(previous, &overwritten, store));
            }
            let applied = self.apply(&current, store);
            if let Some(state) = self.volumes.get_mut(&volume) {
                if let Some((changed, overwritten)) = applied {
                    out.push(changed);
                    state.applied = Some(current);
                    state.overwritten = overwritten;
                }
            }
        }
        self.dirty = false;
        self.last_applied = Some(now);
    }
}

/// All registered modifiers, keyed by provider entity.
#[derive(Resource, Debug, Default)]
pub struct ModifierRegistry {
    providers: HashMap<Entity, ModifierEntry>,
    now: u64,
}

impl ModifierRegistry {
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    pub fn is_registered(&self, provider: Entity) -> bool {
        self.providers.contains_key(&provider)
    }

    pub fn is_dirty(&self, provider: Entity) -> bool {
        self.providers.get(&provider).is_some_and(|e| e.dirty)
    }

    /// Registering an already known provider is a no-op and returns false.
    pub fn register(&mut self, provider: Entity, config: ModifierConfig) -> bool {
        if self.providers.contains_key(&provider) {
            return false;
        }
        self.providers.insert(
            provider,
            ModifierEntry {
                config,
                volumes: HashMap::new(),
                dirty: false,
                last_applied: None,
            },
        );
        true
    }

    /// Forget a provider, reverting what it applied.
    pub fn unregister(&mut self, provider: Entity, store: &mut dyn ChannelStore) -> Vec<ChannelValuesChanged> {
        let mut out = Vec::new();
        if let Some(entry) = self.providers.remove(&provider) {
            entry.revert_all(store, &mut out);
        }
        out
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

    /// Record a volume's cell set. The first snapshot of a volume is applied
    /// immediately; later changes mark the provider dirty for [`Self::tick`].
    pub fn update_volume(
        &mut self,
        provider: Entity,
        volume: Entity,
        snapshot: &AreaSnapshot,
        store: &mut dyn ChannelStore,
    ) -> Vec<ChannelValuesChanged> {
        let mut out = Vec::new();
        let now = self.now;
        let Some(entry) = self.providers.get_mut(&provider) else {
            return out;
        };
        if !entry.config.volumes.contains(&volume) {
            return out;
        }
        match entry.volumes.get_mut(&volume) {
            Some(state) => {
                if state.current != *snapshot {
                    state.current = snapshot.clone();
                    entry.dirty = true;
                }
            }
            None => {
                let applied = entry.apply(snapshot, store);
                let is_applied = applied.is_some();
                let overwritten = match applied {
                    Some((changed, overwritten)) => {
                        out.push(changed);
                        overwritten
                    }
                    None => Overwritten::new(),
                };
                entry.volumes.insert(
                    volume,
                    VolumeState {
                        current: snapshot.clone(),
                        applied: is_applied.then(|| snapshot.clone()),
                        overwritten,
                    },
                );
                if is_applied {
                    entry.last_applied = Some(now);
                } else {
                    // No grid yet: pick it up on the next due tick.
                    entry.dirty = true;
                }
            }
        }
        out
    }

    /// Drop a volume from every subscribed provider, reverting it using its
    /// last known geometry.
    pub fn remove_volume(&mut self, volume: Entity, store: &mut dyn ChannelStore) -> Vec<ChannelValuesChanged> {
        let mut out = Vec::new();
        for provider in self.providers_for_volume(volume) {
            let Some(entry) = self.providers.get_mut(&provider) else {
                continue;
            };
            let Some(state) = entry.volumes.remove(&volume) else {
                continue;
            };
            if state.applied.is_some() {
                out.extend(entry.revert(&state.current, &state.overwritten, store));
            }
        }
        out
    }

    /// Advance to tick `now` and re-apply every provider that is due.
    pub fn tick(
        &mut self,
        now: u64,
        params: &GridBuildingParams,
        store: &mut dyn ChannelStore,
    ) -> Vec<ChannelValuesChanged> {
        self.now = now;
        let mut out = Vec::new();
        let mut providers: Vec<Entity> = self.providers.keys().copied().collect();
        providers.sort();
        for provider in providers {
            let Some(entry) = self.providers.get_mut(&provider) else {
                continue;
            };
            let interval = entry.config.schedule.interval_ticks(params);
            let elapsed = match entry.last_applied {
                Some(last) => now.saturating_sub(last) >= interval,
                None => true,
            };
            let due = match entry.config.schedule {
                ModifierSchedule::OnChange { .. } => entry.dirty && elapsed,
                ModifierSchedule::Every { .. } => elapsed && !entry.volumes.is_empty(),
            };
            if due {
                entry.reapply(now, store, &mut out);
            }
        }
        out
    }
}
