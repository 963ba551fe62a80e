//! Grid systems, layers and directions.
//!
//! The cell lattice and its world mapping are an external collaborator of the
//! core: everything else talks to grids through [`GridLookup`]. [`GridSystems`]
//! is the in-crate implementation used by the plugin, the demo and the tests.
//! Grids lie in the world XZ plane; the normal axis is world Y, and cell `+y`
//! ("north") is world `+z`.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::{DEFAULT_CELL_SIZE, DEFAULT_PROBE_DISTANCE};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridSystemId(pub u32);

/// One grid system plus one of its vertical layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridBinding {
    pub system: GridSystemId,
    pub layer: u32,
}

impl GridBinding {
    pub fn new(system: GridSystemId, layer: u32) -> Self {
        Self { system, layer }
    }
}

// ---------------------------------------------------------------------------
// Directions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Direction {
    #[default]
    North,
    NorthEast,
    East,
    SouthEast,
    South,
    SouthWest,
    West,
    NorthWest,
}

impl Direction {
    pub const CARDINALS: [Direction; 4] = [
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
    ];

    pub const DIAGONALS: [Direction; 4] = [
        Direction::NorthEast,
        Direction::SouthEast,
        Direction::SouthWest,
        Direction::NorthWest,
    ];

    /// Cell-space offset of the neighbour in this direction.
    pub fn offset(self) -> IVec2 {
        match self {
            Direction::North => IVec2::new(0, 1),
            Direction::NorthEast => IVec2::new(1, 1),
            Direction::East => IVec2::new(1, 0),
            Direction::SouthEast => IVec2::new(1, -1),
            Direction::South => IVec2::new(0, -1),
            Direction::SouthWest => IVec2::new(-1, -1),
            Direction::West => IVec2::new(-1, 0),
            Direction::NorthWest => IVec2::new(-1, 1),
        }
    }

    pub fn is_cardinal(self) -> bool {
        matches!(
            self,
            Direction::North | Direction::East | Direction::South | Direction::West
        )
    }

    pub fn is_diagonal(self) -> bool {
        !self.is_cardinal()
    }

    pub fn opposite(self) -> Self {
        match self {
            Direction::North => Direction::South,
            Direction::NorthEast => Direction::SouthWest,
            Direction::East => Direction::West,
            Direction::SouthEast => Direction::NorthWest,
            Direction::South => Direction::North,
            Direction::SouthWest => Direction::NorthEast,
            Direction::West => Direction::East,
            Direction::NorthWest => Direction::SouthEast,
        }
    }

    /// For a diagonal, the two cardinal directions that form it
    /// (e.g. NorthEast -> North, East). Cardinals return themselves twice.
    pub fn components(self) -> (Direction, Direction) {
        match self {
            Direction::NorthEast => (Direction::North, Direction::East),
            Direction::SouthEast => (Direction::South, Direction::East),
            Direction::SouthWest => (Direction::South, Direction::West),
            Direction::NorthWest => (Direction::North, Direction::West),
            cardinal => (cardinal, cardinal),
        }
    }
}

// ---------------------------------------------------------------------------
// Lookup contract
// ---------------------------------------------------------------------------

/// The grid-system services the core consumes.
pub trait GridLookup {
    /// Probe along the grid normal from `world_pos` and return the nearest
    /// grid system and layer hit, if any.
    fn nearest_grid_system(&self, world_pos: Vec3) -> Option<GridBinding>;

    /// Map a world position to a cell of `system`. The result may lie outside
    /// the grid; use [`GridLookup::is_within_bounds`] to check.
    fn world_to_cell(&self, system: GridSystemId, world_pos: Vec3) -> Option<IVec2>;

    fn cell_size(&self, system: GridSystemId) -> Option<f32>;

    fn is_within_bounds(&self, system: GridSystemId, cell: IVec2) -> bool;

    fn contains_system(&self, system: GridSystemId) -> bool;
}

// ---------------------------------------------------------------------------
// Reference implementation
// ---------------------------------------------------------------------------

/// A rectangular grid system with stacked layers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridSystemDef {
    pub id: GridSystemId,
    /// World position of the corner of cell (0, 0) on layer 0.
    pub origin: Vec3,
    pub cell_size: f32,
    pub width: u32,
    pub length: u32,
    pub layer_count: u32,
    /// Vertical spacing between consecutive layers.
    pub layer_height: f32,
}

impl GridSystemDef {
    /// A single-layer grid with unit cells at `origin`.
    pub fn new(id: GridSystemId, origin: Vec3, width: u32, length: u32) -> Self {
        Self {
            id,
            origin,
            cell_size: DEFAULT_CELL_SIZE,
            width,
            length,
            layer_count: 1,
            layer_height: 0.0,
        }
    }

    pub fn with_cell_size(mut self, cell_size: f32) -> Self {
        self.cell_size = cell_size;
        self
    }

    pub fn with_layers(mut self, layer_count: u32, layer_height: f32) -> Self {
        self.layer_count = layer_count.max(1);
        self.layer_height = layer_height;
        self
    }

    pub fn layer_y(&self, layer: u32) -> f32 {
        self.origin.y + layer as f32 * self.layer_height
    }

    pub fn world_to_cell(&self, world_pos: Vec3) -> IVec2 {
        let gx = ((world_pos.x - self.origin.x) / self.cell_size).floor() as i32;
        let gy = ((world_pos.z - self.origin.z) / self.cell_size).floor() as i32;
        IVec2::new(gx, gy)
    }

    /// World position of the centre of `cell` on `layer`.
    pub fn cell_to_world(&self, cell: IVec2, layer: u32) -> Vec3 {
        Vec3::new(
            self.origin.x + (cell.x as f32 + 0.5) * self.cell_size,
            self.layer_y(layer),
            self.origin.z + (cell.y as f32 + 0.5) * self.cell_size,
        )
    }

    #[inline]
    pub fn in_bounds(&self, cell: IVec2) -> bool {
        cell.x >= 0 && cell.y >= 0 && (cell.x as u32) < self.width && (cell.y as u32) < self.length
    }
}

/// Registry of grid systems that answers [`GridLookup`] queries.
#[derive(Resource, Debug, Clone)]
pub struct GridSystems {
    systems: Vec<GridSystemDef>,
    probe_distance: f32,
}

impl Default for GridSystems {
    fn default() -> Self {
        Self {
            systems: Vec::new(),
            probe_distance: DEFAULT_PROBE_DISTANCE,
        }
    }
}

impl GridSystems {
    pub fn with_probe_distance(probe_distance: f32) -> Self {
        Self {
            systems: Vec::new(),
            probe_distance,
        }
    }

    pub fn set_probe_distance(&mut self, probe_distance: f32) {
        self.probe_distance = probe_distance;
    }

    /// Insert or replace a grid system definition.
    pub fn insert(&mut self, def: GridSystemDef) {
        match self.systems.iter_mut().find(|s| s.id == def.id) {
            Some(existing) => *existing = def,
            None => {
                self.systems.push(def);
                self.systems.sort_by_key(|s| s.id);
            }
        }
    }

    pub fn remove(&mut self, id: GridSystemId) -> Option<GridSystemDef> {
        let idx = self.systems.iter().position(|s| s.id == id)?;
        Some(self.systems.remove(idx))
    }

    pub fn get(&self, id: GridSystemId) -> Option<&GridSystemDef> {
        self.systems.iter().find(|s| s.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &GridSystemDef> {
        self.systems.iter()
    }
}

impl GridLookup for GridSystems {
    fn nearest_grid_system(&self, world_pos: Vec3) -> Option<GridBinding> {
        let mut best: Option<(f32, GridBinding)> = None;
        // Systems are kept sorted by id and layers are probed bottom-up, so a
        // strict `<` keeps the lowest id/layer on ties.
        for def in &self.systems {
            if !def.in_bounds(def.world_to_cell(world_pos)) {
                continue;
            }
            for layer in 0..def.layer_count {
                let distance = (world_pos.y - def.layer_y(layer)).abs();
                if distance > self.probe_distance {
                    continue;
                }
                match best {
                    Some((d, _)) if distance >= d => {}
                    _ => best = Some((distance, GridBinding::new(def.id, layer))),
                }
            }
        }
        best.map(|(_, binding)| binding)
    }

    fn world_to_cell(&self, system: GridSystemId, world_pos: Vec3) -> Option<IVec2> {
        self.get(system).map(|def| def.world_to_cell(world_pos))
    }

    fn cell_size(&self, system: GridSystemId) -> Option<f32> {
        self.get(system).map(|def| def.cell_size)
    }

    fn is_within_bounds(&self, system: GridSystemId, cell: IVec2) -> bool {
        self.get(system).is_some_and(|def| def.in_bounds(cell))
    }

    fn contains_system(&self, system: GridSystemId) -> bool {
        self.get(system).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_systems() -> GridSystems {
        let mut grids = GridSystems::default();
        grids.insert(
            GridSystemDef::new(GridSystemId(1), Vec3::ZERO, 10, 10).with_layers(3, 4.0),
        );
        grids.insert(GridSystemDef::new(
            GridSystemId(2),
            Vec3::new(100.0, 0.0, 0.0),
            10,
            10,
        ));
        grids
    }

    #[test]
    fn test_direction_offsets_are_opposite() {
        for dir in Direction::CARDINALS.iter().chain(Direction::DIAGONALS.iter()) {
            assert_eq!(dir.offset() + dir.opposite().offset(), IVec2::ZERO);
        }
    }

    #[test]
    fn test_diagonal_components() {
        let (a, b) = Direction::SouthWest.components();
        assert_eq!(a.offset() + b.offset(), Direction::SouthWest.offset());
    }

    #[test]
    fn test_world_to_cell_floors() {
        let def = GridSystemDef::new(GridSystemId(1), Vec3::ZERO, 10, 10).with_cell_size(2.0);
        assert_eq!(def.world_to_cell(Vec3::new(3.9, 0.0, 0.1)), IVec2::new(1, 0));
        assert_eq!(def.world_to_cell(Vec3::new(-0.1, 0.0, 0.0)), IVec2::new(-1, 0));
        assert!(!def.in_bounds(IVec2::new(-1, 0)));
        assert!(def.in_bounds(IVec2::new(9, 9)));
        assert!(!def.in_bounds(IVec2::new(10, 9)));
    }

    #[test]
    fn test_cell_to_world_is_cell_centre() {
        let def = GridSystemDef::new(GridSystemId(1), Vec3::ZERO, 10, 10).with_layers(2, 3.0);
        let centre = def.cell_to_world(IVec2::new(2, 3), 1);
        assert_eq!(centre, Vec3::new(2.5, 3.0, 3.5));
        assert_eq!(def.world_to_cell(centre), IVec2::new(2, 3));
    }

    #[test]
    fn test_nearest_grid_picks_closest_layer() {
        let grids = two_systems();
        let binding = grids.nearest_grid_system(Vec3::new(5.0, 5.0, 5.0));
        assert_eq!(binding, Some(GridBinding::new(GridSystemId(1), 1)));
        let binding = grids.nearest_grid_system(Vec3::new(5.0, 7.5, 5.0));
        assert_eq!(binding, Some(GridBinding::new(GridSystemId(1), 2)));
    }

    #[test]
    fn test_nearest_grid_requires_footprint_and_range() {
        let grids = two_systems();
        assert_eq!(
            grids.nearest_grid_system(Vec3::new(105.0, 0.0, 5.0)),
            Some(GridBinding::new(GridSystemId(2), 0))
        );
        assert_eq!(grids.nearest_grid_system(Vec3::new(50.0, 0.0, 5.0)), None);
        assert_eq!(grids.nearest_grid_system(Vec3::new(5.0, 500.0, 5.0)), None);
    }

    #[test]
    fn test_insert_replaces_and_remove() {
        let mut grids = two_systems();
        grids.insert(GridSystemDef::new(GridSystemId(2), Vec3::ZERO, 3, 3));
        assert_eq!(grids.iter().count(), 2);
        assert_eq!(grids.get(GridSystemId(2)).map(|d| d.width), Some(3));
        assert!(grids.remove(GridSystemId(2)).is_some());
        assert!(!grids.contains_system(GridSystemId(2)));
    }
}
