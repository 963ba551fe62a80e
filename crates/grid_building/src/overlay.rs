//! Visual overlay contract.
//!
//! Rule providers recolor the cells they cover; the overlay that actually
//! draws those colors is an external collaborator. [`CellOverlay`] records
//! the requested colors so the demo and the tests can inspect them.

use std::collections::{HashMap, HashSet};

use bevy::prelude::*;

use crate::grid::{GridBinding, GridSystemId};

pub trait GridOverlay {
    /// Paint `cell` on `binding`. With `all_layers`, every layer of the
    /// binding's grid system is painted.
    fn set_cell_color(&mut self, binding: GridBinding, cell: IVec2, color: Color, all_layers: bool);

    fn reset_cell_color(&mut self, binding: GridBinding, cell: IVec2, all_layers: bool);

    fn is_overlay_visible(&self, system: GridSystemId) -> bool;
}

/// Reference overlay: colors per (binding, cell), visibility per grid system.
/// Grid systems are visible unless explicitly hidden.
#[derive(Resource, Debug, Default)]
pub struct CellOverlay {
    colors: HashMap<(GridBinding, IVec2), Color>,
    all_layer_colors: HashMap<(GridSystemId, IVec2), Color>,
    hidden: HashSet<GridSystemId>,
}

impl CellOverlay {
    /// The color drawn at `cell`, if any. Per-layer colors win over
    /// all-layer colors.
    pub fn color_at(&self, binding: GridBinding, cell: IVec2) -> Option<Color> {
        self.colors
            .get(&(binding, cell))
            .or_else(|| self.all_layer_colors.get(&(binding.system, cell)))
            .copied()
    }

    pub fn painted_cell_count(&self) -> usize {
        self.colors.len() + self.all_layer_colors.len()
    }

    pub fn set_visible(&mut self, system: GridSystemId, visible: bool) {
        if visible {
            self.hidden.remove(&system);
        } else {
            self.hidden.insert(system);
        }
    }
}

impl GridOverlay for CellOverlay {
    fn set_cell_color(&mut self, binding: GridBinding, cell: IVec2, color: Color, all_layers: bool) {
        if all_layers {
            self.all_layer_colors.insert((binding.system, cell), color);
        } else {
            self.colors.insert((binding, cell), color);
        }
    }

    fn reset_cell_color(&mut self, binding: GridBinding, cell: IVec2, all_layers: bool) {
        if all_layers {
            self.all_layer_colors.remove(&(binding.system, cell));
            self.colors.retain(|(b, c), _| !(b.system == binding.system && *c == cell));
        } else {
            self.colors.remove(&(binding, cell));
        }
    }

    fn is_overlay_visible(&self, system: GridSystemId) -> bool {
        !self.hidden.contains(&system)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_reset_single_layer() {
        let mut overlay = CellOverlay::default();
        let binding = GridBinding::new(GridSystemId(1), 0);
        overlay.set_cell_color(binding, IVec2::new(1, 1), Color::BLACK, false);
        assert_eq!(overlay.color_at(binding, IVec2::new(1, 1)), Some(Color::BLACK));
        overlay.reset_cell_color(binding, IVec2::new(1, 1), false);
        assert_eq!(overlay.color_at(binding, IVec2::new(1, 1)), None);
    }

    #[test]
    fn test_all_layers_reaches_every_layer() {
        let mut overlay = CellOverlay::default();
        let ground = GridBinding::new(GridSystemId(1), 0);
        let upper = GridBinding::new(GridSystemId(1), 2);
        overlay.set_cell_color(ground, IVec2::ZERO, Color::WHITE, true);
        assert_eq!(overlay.color_at(upper, IVec2::ZERO), Some(Color::WHITE));
        overlay.reset_cell_color(upper, IVec2::ZERO, true);
        assert_eq!(overlay.color_at(ground, IVec2::ZERO), None);
    }

    #[test]
    fn test_visibility_defaults_to_visible() {
        let mut overlay = CellOverlay::default();
        assert!(overlay.is_overlay_visible(GridSystemId(4)));
        overlay.set_visible(GridSystemId(4), false);
        assert!(!overlay.is_overlay_visible(GridSystemId(4)));
    }
}
