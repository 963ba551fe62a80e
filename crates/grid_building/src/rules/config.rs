//! Rule configuration and area containment.

use std::collections::HashSet;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::grid::Direction;
use crate::objects::{CategoryId, ObjectKind, ObjectType, ObjectTypeId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RulePolarity {
    Disable,
    Enable,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RuleScope {
    /// Acts on the cells of the provider's area volumes.
    #[default]
    Spatial,
    /// Acts on every cell of every grid.
    Global,
}

/// Which object types of one kind a rule applies to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KindRule {
    pub all: bool,
    pub categories: HashSet<CategoryId>,
    pub types: HashSet<ObjectTypeId>,
}

impl KindRule {
    pub fn all() -> Self {
        Self {
            all: true,
            ..Default::default()
        }
    }

    pub fn categories(categories: impl IntoIterator<Item = CategoryId>) -> Self {
        Self {
            categories: categories.into_iter().collect(),
            ..Default::default()
        }
    }

    pub fn types(types: impl IntoIterator<Item = ObjectTypeId>) -> Self {
        Self {
            types: types.into_iter().collect(),
            ..Default::default()
        }
    }

    pub fn matches(&self, object_type: &ObjectType) -> bool {
        self.all
            || self.types.contains(&object_type.id)
            || object_type.categories.iter().any(|c| self.categories.contains(c))
    }
}

/// One [`KindRule`] per object kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSet {
    pub grid: KindRule,
    pub edge: KindRule,
    pub corner: KindRule,
    pub free: KindRule,
}

impl RuleSet {
    /// Every type of every kind.
    pub fn everything() -> Self {
        Self {
            grid: KindRule::all(),
            edge: KindRule::all(),
            corner: KindRule::all(),
            free: KindRule::all(),
        }
    }

    pub fn with_kind(mut self, kind: ObjectKind, rule: KindRule) -> Self {
        match kind {
            ObjectKind::Grid => self.grid = rule,
            ObjectKind::Edge => self.edge = rule,
            ObjectKind::Corner => self.corner = rule,
            ObjectKind::Free => self.free = rule,
        }
        self
    }

    pub fn for_kind(&self, kind: ObjectKind) -> &KindRule {
        match kind {
            ObjectKind::Grid => &self.grid,
            ObjectKind::Edge => &self.edge,
            ObjectKind::Corner => &self.corner,
            ObjectKind::Free => &self.free,
        }
    }

    pub fn applies_to(&self, object_type: &ObjectType) -> bool {
        self.for_kind(object_type.kind).matches(object_type)
    }
}

/// Whether an object of `kind` anchored at `cell` lies inside `cells`.
///
/// Edges need both cells sharing the edge, corners all four cells touching
/// the corner. Grid and free objects only need the anchor cell.
pub fn contains_object(
    cells: &HashSet<IVec2>,
    kind: ObjectKind,
    cell: IVec2,
    direction: Option<Direction>,
) -> bool {
    if !cells.contains(&cell) {
        return false;
    }
    match (kind, direction) {
        (ObjectKind::Edge, Some(side)) => cells.contains(&(cell + side.offset())),
        (ObjectKind::Corner, Some(corner)) => {
            let (a, b) = corner.components();
            cells.contains(&(cell + a.offset()))
                && cells.contains(&(cell + b.offset()))
                && cells.contains(&(cell + corner.offset()))
        }
        _ => true,
    }
}
