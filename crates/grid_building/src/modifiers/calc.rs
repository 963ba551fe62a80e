//! Per-cell modifier arithmetic.

use std::collections::HashSet;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::area::sorted_cells;
use crate::channels::ChannelDef;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChangeMode {
    /// Overwrite with the computed value.
    Fixed,
    #[default]
    Additive,
    /// Multiply by the raw amount; falloff does not apply.
    Multiplicative,
}

/// Per-cell value for `amount` over `cells`, in row-major order.
///
/// With falloff the value interpolates linearly from `amount` at the
/// centroid cell to `channel_min` at the farthest covered cell. The centroid
/// is the integer (truncating) mean of the cells.
pub fn cell_values(
    cells: &HashSet<IVec2>,
    amount: f32,
    falloff: bool,
    channel_min: f32,
) -> Vec<(IVec2, f32)> {
    let sorted = sorted_cells(cells);
    if !falloff || sorted.is_empty() {
        return sorted.into_iter().map(|cell| (cell, amount)).collect();
    }

    let n = sorted.len() as i64;
    let (sx, sy) = sorted
        .iter()
        .fold((0i64, 0i64), |(sx, sy), c| (sx + c.x as i64, sy + c.y as i64));
    let centroid = Vec2::new((sx / n) as f32, (sy / n) as f32);
    let max_distance = sorted
        .iter()
        .map(|c| c.as_vec2().distance(centroid))
        .fold(0.0f32, f32::max);

    sorted
        .into_iter()
        .map(|cell| {
            if max_distance <= 0.0 {
                return (cell, amount);
            }
            let t = cell.as_vec2().distance(centroid) / max_distance;
            (cell, amount + (channel_min - amount) * t)
        })
        .collect()
}

pub fn apply_value(mode: ChangeMode, current: f32, value: f32, amount: f32, def: &ChannelDef) -> f32 {
    let next = match mode {
        ChangeMode::Fixed => value,
        ChangeMode::Additive => current + value,
        ChangeMode::Multiplicative => current * amount,
    };
    def.clamp(next)
}

/// Inverse of [`apply_value`]. Fixed mode cannot know the value it
/// overwrote and treats it as zero; the registry restores recorded values
/// instead where it has them. Clamping can make any mode lossy.
pub fn revert_value(mode: ChangeMode, current: f32, value: f32, amount: f32, def: &ChannelDef) -> f32 {
    let previous = match mode {
        ChangeMode::Fixed | ChangeMode::Additive => current - value,
        ChangeMode::Multiplicative if amount != 0.0 => current / amount,
        ChangeMode::Multiplicative => current,
    };
    def.clamp(previous)
}
