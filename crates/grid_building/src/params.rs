//! Data-driven parameters for the grid building core.
//!
//! Everything that used to be a process-wide static (the undo bound, the
//! modifier tick rate, the area probe distance) lives in [`GridBuildingParams`]
//! so it can be injected per app and overridden from a JSON file by the host.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::{
    DEFAULT_FIXED_TICKS_PER_SECOND, DEFAULT_MAX_UNDO_HISTORY, DEFAULT_PROBE_DISTANCE,
};

#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridBuildingParams {
    /// Maximum number of commands kept in the undo history.
    pub max_undo_history: usize,
    /// Rate of the shared fixed tick counter. Modifier intervals given in
    /// seconds are converted to ticks with this value.
    pub fixed_ticks_per_second: u32,
    /// Maximum vertical distance from an area volume to a grid layer plane.
    pub probe_distance: f32,
}

impl Default for GridBuildingParams {
    fn default() -> Self {
        Self {
            max_undo_history: DEFAULT_MAX_UNDO_HISTORY,
            fixed_ticks_per_second: DEFAULT_FIXED_TICKS_PER_SECOND,
            probe_distance: DEFAULT_PROBE_DISTANCE,
        }
    }
}

impl GridBuildingParams {
    /// Convert an interval in seconds to a whole number of fixed ticks.
    /// Never returns zero, so an interval always spans at least one tick.
    pub fn seconds_to_ticks(&self, seconds: f32) -> u64 {
        let ticks = (seconds.max(0.0) * self.fixed_ticks_per_second as f32).round() as u64;
        ticks.max(1)
    }
}
