//! Per-cell scalar channels (e.g. a heat-map value), independent of occupancy.

use std::collections::HashMap;
use std::fmt;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::grid::GridBinding;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChannelId(pub String);

impl ChannelId {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChannelDef {
    pub min: f32,
    pub max: f32,
    /// Value of a cell that was never written.
    pub default: f32,
}

impl ChannelDef {
    pub fn new(min: f32, max: f32, default: f32) -> Self {
        Self { min, max, default }
    }

    /// Clamp into `[min, max]`. Never panics: a NaN bound is ignored and
    /// inverted bounds resolve to `max`.
    pub fn clamp(&self, value: f32) -> f32 {
        value.max(self.min).min(self.max)
    }

    /// Whether both bounds are numbers and `min <= max`.
    pub fn has_valid_bounds(&self) -> bool {
        self.min <= self.max
    }
}

/// Channel storage consumed by the modifier registry.
pub trait ChannelStore {
    fn channel_def(&self, channel: &ChannelId) -> Option<ChannelDef>;

    fn channel_value(&self, binding: GridBinding, cell: IVec2, channel: &ChannelId) -> f32;

    fn set_channel_value(&mut self, binding: GridBinding, cell: IVec2, channel: &ChannelId, value: f32);
}

/// Reference channel storage: sparse values over declared channels.
#[derive(Resource, Debug, Default)]
pub struct GridChannels {
    defs: HashMap<ChannelId, ChannelDef>,
    values: HashMap<(GridBinding, IVec2, ChannelId), f32>,
}

impl GridChannels {
    /// Declare `channel`. Inverted bounds are swapped and NaN bounds widened
    /// to infinity, with a warning.
    pub fn define(&mut self, channel: ChannelId, mut def: ChannelDef) {
        if !def.has_valid_bounds() {
            warn!("channel {channel}: invalid bounds [{}, {}], normalising", def.min, def.max);
            if def.min.is_nan() {
                def.min = f32::NEG_INFINITY;
            }
            if def.max.is_nan() {
                def.max = f32::INFINITY;
            }
            if def.min > def.max {
                std::mem::swap(&mut def.min, &mut def.max);
            }
        }
        self.defs.insert(channel, def);
    }

    /// Number of cells holding an explicitly written value.
    pub fn written_cell_count(&self) -> usize {
        self.values.len()
    }
}

impl ChannelStore for GridChannels {
    fn channel_def(&self, channel: &ChannelId) -> Option<ChannelDef> {
        self.defs.get(channel).copied()
    }

    fn channel_value(&self, binding: GridBinding, cell: IVec2, channel: &ChannelId) -> f32 {
        self.values
            .get(&(binding, cell, channel.clone()))
            .copied()
            .or_else(|| self.defs.get(channel).map(|def| def.default))
            .unwrap_or(0.0)
    }

    fn set_channel_value(&mut self, binding: GridBinding, cell: IVec2, channel: &ChannelId, value: f32) {
        if !self.defs.contains_key(channel) {
            return;
        }
        self.values.insert((binding, cell, channel.clone()), value);
    }
}
