//! Object types and placed objects.
//!
//! An object type belongs to exactly one [`ObjectKind`]; a placed object
//! carries a [`ShapePlacement`] whose variant matches that kind. Edge and
//! corner objects claim directional sub-slots around a cell rather than the
//! cell itself; [`SlotKey`] normalises those so neighbouring cells agree on
//! which slot a shared edge or corner is.

use std::collections::HashMap;
use std::fmt;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::grid::{Direction, GridBinding};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjectKind {
    Grid,
    Edge,
    Corner,
    Free,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectTypeId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CategoryId(pub u32);

/// Stable identity of a placed object (128-bit token).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UniqueId(pub u128);

impl fmt::Display for UniqueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:032x}", self.0)
    }
}

/// One member of an object type's weighted random-prefab set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrefabVariant {
    pub name: String,
    pub weight: f32,
}

impl PrefabVariant {
    pub fn new(name: impl Into<String>, weight: f32) -> Self {
        Self {
            name: name.into(),
            weight,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectType {
    pub id: ObjectTypeId,
    pub name: String,
    pub kind: ObjectKind,
    pub categories: Vec<CategoryId>,
    /// Footprint in cells for `ObjectKind::Grid` (width along x, length along
    /// y before rotation). Other kinds always occupy a single slot.
    pub footprint: UVec2,
    pub variants: Vec<PrefabVariant>,
}

impl ObjectType {
    pub fn new(id: ObjectTypeId, name: impl Into<String>, kind: ObjectKind) -> Self {
        let name = name.into();
        Self {
            id,
            variants: vec![PrefabVariant {
                name: name.clone(),
                weight: 1.0,
            }],
            name,
            kind,
            categories: Vec::new(),
            footprint: UVec2::ONE,
        }
    }

    pub fn with_categories(mut self, categories: impl IntoIterator<Item = CategoryId>) -> Self {
        self.categories = categories.into_iter().collect();
        self
    }

    pub fn with_footprint(mut self, width: u32, length: u32) -> Self {
        self.footprint = UVec2::new(width.max(1), length.max(1));
        self
    }

    pub fn with_variants(mut self, variants: Vec<PrefabVariant>) -> Self {
        self.variants = variants;
        self
    }

    pub fn has_category(&self, category: CategoryId) -> bool {
        self.categories.contains(&category)
    }
}

/// All known object types, keyed by id.
#[derive(Resource, Debug, Clone, Default)]
pub struct ObjectCatalog {
    types: HashMap<ObjectTypeId, ObjectType>,
}

impl ObjectCatalog {
    pub fn insert(&mut self, object_type: ObjectType) {
        self.types.insert(object_type.id, object_type);
    }

    pub fn get(&self, id: ObjectTypeId) -> Option<&ObjectType> {
        self.types.get(&id)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Shape-specific placement payload
// ---------------------------------------------------------------------------

/// How an object sits on the grid, one variant per [`ObjectKind`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ShapePlacement {
    /// Cell-aligned, four-directional rotation.
    Grid { rotation: Direction },
    /// Aligned to one side of the origin cell.
    Edge { side: Direction },
    /// Aligned to one diagonal corner of the origin cell.
    Corner { corner: Direction },
    /// Free-form, continuous yaw in radians.
    Free { yaw: f32 },
}

impl ShapePlacement {
    pub fn kind(&self) -> ObjectKind {
        match self {
            ShapePlacement::Grid { .. } => ObjectKind::Grid,
            ShapePlacement::Edge { .. } => ObjectKind::Edge,
            ShapePlacement::Corner { .. } => ObjectKind::Corner,
            ShapePlacement::Free { .. } => ObjectKind::Free,
        }
    }

    /// The direction rule queries should use for directional containment.
    pub fn direction(&self) -> Option<Direction> {
        match *self {
            ShapePlacement::Edge { side } => Some(side),
            ShapePlacement::Corner { corner } => Some(corner),
            ShapePlacement::Grid { .. } | ShapePlacement::Free { .. } => None,
        }
    }

    /// Whether the direction payload is valid for the variant.
    pub fn is_well_formed(&self) -> bool {
        match *self {
            ShapePlacement::Grid { rotation } => rotation.is_cardinal(),
            ShapePlacement::Edge { side } => side.is_cardinal(),
            ShapePlacement::Corner { corner } => corner.is_diagonal(),
            ShapePlacement::Free { yaw } => yaw.is_finite(),
        }
    }
}

/// Everything needed to (re)create a placed object.
///
/// Commands capture this at construction time; after the first successful
/// execution the chosen `variant` and `unique_id` are written back so that a
/// redo recreates the identical object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacementRequest {
    pub object_type: ObjectTypeId,
    pub binding: GridBinding,
    pub origin: IVec2,
    pub placement: ShapePlacement,
    pub world_offset: Vec3,
    pub variant: Option<usize>,
    pub unique_id: Option<UniqueId>,
    /// Skip dynamic area rules (used when restoring a previously existing object).
    pub bypass_rules: bool,
}

impl PlacementRequest {
    pub fn new(
        object_type: ObjectTypeId,
        binding: GridBinding,
        origin: IVec2,
        placement: ShapePlacement,
    ) -> Self {
        Self {
            object_type,
            binding,
            origin,
            placement,
            world_offset: Vec3::ZERO,
            variant: None,
            unique_id: None,
            bypass_rules: false,
        }
    }

    pub fn with_variant(mut self, variant: usize) -> Self {
        self.variant = Some(variant);
        self
    }

    pub fn with_offset(mut self, world_offset: Vec3) -> Self {
        self.world_offset = world_offset;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacedObject {
    pub unique_id: UniqueId,
    pub object_type: ObjectTypeId,
    /// Owning grid system and layer.
    pub binding: GridBinding,
    pub origin: IVec2,
    pub placement: ShapePlacement,
    pub world_offset: Vec3,
    /// Index into the type's variant list, chosen once at first placement.
    pub variant: usize,
}

impl PlacedObject {
    pub fn kind(&self) -> ObjectKind {
        self.placement.kind()
    }

    /// A request that recreates this object exactly, identity included.
    pub fn snapshot(&self) -> PlacementRequest {
        PlacementRequest {
            object_type: self.object_type,
            binding: self.binding,
            origin: self.origin,
            placement: self.placement,
            world_offset: self.world_offset,
            variant: Some(self.variant),
            unique_id: Some(self.unique_id),
            bypass_rules: false,
        }
    }
}

/// Cells covered by a placement. Grid objects expand their rotated footprint;
/// every other kind covers only its origin cell.
pub fn footprint_cells(object_type: &ObjectType, origin: IVec2, placement: &ShapePlacement) -> Vec<IVec2> {
    match placement {
        ShapePlacement::Grid { rotation } => {
            let size = match rotation {
                Direction::East | Direction::West => {
                    UVec2::new(object_type.footprint.y, object_type.footprint.x)
                }
                _ => object_type.footprint,
            };
            let mut cells = Vec::with_capacity((size.x * size.y) as usize);
            for dy in 0..size.y as i32 {
                for dx in 0..size.x as i32 {
                    cells.push(origin + IVec2::new(dx, dy));
                }
            }
            cells
        }
        _ => vec![origin],
    }
}

// ---------------------------------------------------------------------------
// Occupancy slots
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubSlot {
    Cell,
    Free,
    /// Normalised to the north or east edge of `SlotKey::cell`.
    Edge(Direction),
    /// Normalised to the north-east corner of `SlotKey::cell`.
    Corner,
}

/// An exclusive claim on part of a grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SlotKey {
    pub binding: GridBinding,
    pub cell: IVec2,
    pub slot: SubSlot,
}

impl SlotKey {
    /// Slots claimed by a placement with the given footprint cells.
    pub fn for_placement(binding: GridBinding, cells: &[IVec2], placement: &ShapePlacement) -> Vec<SlotKey> {
        match *placement {
            ShapePlacement::Grid { .. } => cells
                .iter()
                .map(|&cell| SlotKey {
                    binding,
                    cell,
                    slot: SubSlot::Cell,
                })
                .collect(),
            ShapePlacement::Free { .. } => cells
                .iter()
                .map(|&cell| SlotKey {
                    binding,
                    cell,
                    slot: SubSlot::Free,
                })
                .collect(),
            ShapePlacement::Edge { side } => {
                let origin = cells.first().copied().unwrap_or_default();
                vec![Self::edge(binding, origin, side)]
            }
            ShapePlacement::Corner { corner } => {
                let origin = cells.first().copied().unwrap_or_default();
                vec![Self::corner(binding, origin, corner)]
            }
        }
    }

    /// South and west edges belong to the neighbouring cell's north/east edge.
    pub fn edge(binding: GridBinding, cell: IVec2, side: Direction) -> SlotKey {
        let (cell, side) = match side {
            Direction::South | Direction::West => (cell + side.offset(), side.opposite()),
            _ => (cell, side),
        };
        SlotKey {
            binding,
            cell,
            slot: SubSlot::Edge(side),
        }
    }

    /// Every corner is expressed as the north-east corner of its south-west cell.
    pub fn corner(binding: GridBinding, cell: IVec2, corner: Direction) -> SlotKey {
        let offset = corner.offset();
        let cell = IVec2::new(cell.x + offset.x.min(0), cell.y + offset.y.min(0));
        SlotKey {
            binding,
            cell,
            slot: SubSlot::Corner,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::GridSystemId;

    fn binding() -> GridBinding {
        GridBinding::new(GridSystemId(1), 0)
    }

    #[test]
    fn test_unique_id_display_is_fixed_width_hex() {
        assert_eq!(UniqueId(0xab).to_string(), format!("{:0>32}", "ab"));
    }

    #[test]
    fn test_placement_kind_and_direction() {
        let edge = ShapePlacement::Edge {
            side: Direction::East,
        };
        assert_eq!(edge.kind(), ObjectKind::Edge);
        assert_eq!(edge.direction(), Some(Direction::East));
        assert_eq!(
            ShapePlacement::Grid {
                rotation: Direction::North
            }
            .direction(),
            None
        );
    }

    #[test]
    fn test_malformed_placements() {
        assert!(!ShapePlacement::Edge {
            side: Direction::NorthEast
        }
        .is_well_formed());
        assert!(!ShapePlacement::Corner {
            corner: Direction::North
        }
        .is_well_formed());
        assert!(!ShapePlacement::Free { yaw: f32::NAN }.is_well_formed());
        assert!(ShapePlacement::Free { yaw: 1.2 }.is_well_formed());
    }

    #[test]
    fn test_footprint_rotates_for_east_west() {
        let ty = ObjectType::new(ObjectTypeId(1), "barn", ObjectKind::Grid).with_footprint(3, 1);
        let north = footprint_cells(
            &ty,
            IVec2::ZERO,
            &ShapePlacement::Grid {
                rotation: Direction::North,
            },
        );
        assert_eq!(north, vec![IVec2::new(0, 0), IVec2::new(1, 0), IVec2::new(2, 0)]);
        let east = footprint_cells(
            &ty,
            IVec2::ZERO,
            &ShapePlacement::Grid {
                rotation: Direction::East,
            },
        );
        assert_eq!(east, vec![IVec2::new(0, 0), IVec2::new(0, 1), IVec2::new(0, 2)]);
    }

    #[test]
    fn test_shared_edge_normalises_to_same_slot() {
        let north_of_a = SlotKey::edge(binding(), IVec2::new(2, 2), Direction::North);
        let south_of_b = SlotKey::edge(binding(), IVec2::new(2, 3), Direction::South);
        assert_eq!(north_of_a, south_of_b);
        let east_of_a = SlotKey::edge(binding(), IVec2::new(2, 2), Direction::East);
        assert_ne!(north_of_a, east_of_a);
    }

    #[test]
    fn test_shared_corner_normalises_to_same_slot() {
        let ne = SlotKey::corner(binding(), IVec2::new(0, 0), Direction::NorthEast);
        let nw = SlotKey::corner(binding(), IVec2::new(1, 0), Direction::NorthWest);
        let se = SlotKey::corner(binding(), IVec2::new(0, 1), Direction::SouthEast);
        let sw = SlotKey::corner(binding(), IVec2::new(1, 1), Direction::SouthWest);
        assert_eq!(ne, nw);
        assert_eq!(ne, se);
        assert_eq!(ne, sw);
    }

    #[test]
    fn test_snapshot_recreates_identity() {
        let object = PlacedObject {
            unique_id: UniqueId(7),
            object_type: ObjectTypeId(3),
            binding: binding(),
            origin: IVec2::new(4, 5),
            placement: ShapePlacement::Free { yaw: 0.5 },
            world_offset: Vec3::new(0.1, 0.0, 0.2),
            variant: 2,
        };
        let request = object.snapshot();
        assert_eq!(request.unique_id, Some(UniqueId(7)));
        assert_eq!(request.variant, Some(2));
        assert_eq!(request.world_offset, object.world_offset);
    }
}
