//! Area shapes and their rasterization onto a grid.

use std::collections::HashSet;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::grid::{GridLookup, GridSystemId};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum AreaShape {
    /// Axis-aligned rectangle of `width` x `length` cells centred on the volume.
    Rectangle { width: u32, length: u32 },
    /// Disc of `radius` world units, taken on the cell lattice.
    Circle { radius: f32 },
}

impl AreaShape {
    /// Integer cell offsets covered by this shape, relative to
    /// [`Self::anchor_offset`]. Rectangles yield exactly `width * length`
    /// offsets; circles keep the lattice points within `radius` and are empty
    /// below half a cell.
    pub fn cell_offsets(&self, cell_size: f32) -> Vec<IVec2> {
        if cell_size <= 0.0 || !cell_size.is_finite() {
            return Vec::new();
        }
        match *self {
            AreaShape::Rectangle { width, length } => {
                let mut offsets = Vec::with_capacity((width as usize).saturating_mul(length as usize));
                for j in 0..length {
                    for i in 0..width {
                        offsets.push(IVec2::new(i as i32, j as i32));
                    }
                }
                offsets
            }
            AreaShape::Circle { radius } => {
                if !radius.is_finite() || radius < cell_size / 2.0 {
                    return Vec::new();
                }
                let n = Self::circle_half_extent(radius, cell_size);
                let radius_sq = radius * radius;
                let mut offsets = Vec::new();
                for j in -n..=n {
                    for i in -n..=n {
                        let offset = Vec2::new(i as f32 * cell_size, j as f32 * cell_size);
                        if offset.length_squared() <= radius_sq {
                            offsets.push(IVec2::new(i, j));
                        }
                    }
                }
                offsets
            }
        }
    }

    /// World XZ offset, relative to the volume position, of the lattice point
    /// that maps to offset (0, 0): the centre of the first rectangle cell, or
    /// the circle's own centre.
    pub fn anchor_offset(&self, cell_size: f32) -> Vec2 {
        match *self {
            AreaShape::Rectangle { width, length } => Vec2::new(
                (0.5 - width as f32 / 2.0) * cell_size,
                (0.5 - length as f32 / 2.0) * cell_size,
            ),
            AreaShape::Circle { .. } => Vec2::ZERO,
        }
    }

    /// The smallest rectangle whose lattice contains every cell of this shape.
    pub fn bounding_rectangle(&self, cell_size: f32) -> AreaShape {
        match *self {
            AreaShape::Rectangle { .. } => *self,
            AreaShape::Circle { radius } => {
                let side = (2 * Self::circle_half_extent(radius.max(0.0), cell_size) + 1) as u32;
                AreaShape::Rectangle {
                    width: side,
                    length: side,
                }
            }
        }
    }

    fn circle_half_extent(radius: f32, cell_size: f32) -> i32 {
        (radius / cell_size).ceil() as i32
    }
}

/// Cells of `system` covered by `shape` placed at `center`. Cells outside
/// the grid are dropped.
///
/// Only the anchor point goes through `world_to_cell`; the rest of the shape
/// is laid out in cell space so float error cannot merge two cells. The
/// anchor is nudged a quarter cell towards +x/+z, which keeps points that sit
/// on a cell boundary in the cell they start.
pub fn project_cells(
    shape: &AreaShape,
    center: Vec3,
    system: GridSystemId,
    grids: &dyn GridLookup,
) -> HashSet<IVec2> {
    let Some(cell_size) = grids.cell_size(system) else {
        return HashSet::new();
    };
    let offsets = shape.cell_offsets(cell_size);
    if offsets.is_empty() {
        return HashSet::new();
    }
    let anchor = shape.anchor_offset(cell_size) + Vec2::splat(cell_size * 0.25);
    let Some(anchor_cell) = grids.world_to_cell(system, center + Vec3::new(anchor.x, 0.0, anchor.y)) else {
        return HashSet::new();
    };
    offsets
        .into_iter()
        .map(|offset| anchor_cell + offset)
        .filter(|&cell| grids.is_within_bounds(system, cell))
        .collect()
}

/// Cells in row-major order, for deterministic iteration over a set.
pub fn sorted_cells(cells: &HashSet<IVec2>) -> Vec<IVec2> {
    let mut sorted: Vec<IVec2> = cells.iter().copied().collect();
    sorted.sort_by_key(|c| (c.y, c.x));
    sorted
}
