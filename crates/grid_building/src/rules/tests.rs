use std::collections::HashSet;

use bevy::prelude::*;

use super::*;
use crate::area::{AreaDelta, AreaSnapshot};
use crate::grid::{Direction, GridBinding, GridSystemId};
use crate::objects::{CategoryId, ObjectKind, ObjectType, ObjectTypeId};
use crate::overlay::{CellOverlay, GridOverlay};

const RED: Color = Color::srgb(1.0, 0.0, 0.0);
const GREEN: Color = Color::srgb(0.0, 1.0, 0.0);

const DISABLER: Entity = Entity::from_raw(10);
const ENABLER: Entity = Entity::from_raw(11);
const VOLUME_A: Entity = Entity::from_raw(20);
const VOLUME_B: Entity = Entity::from_raw(21);

fn ground() -> GridBinding {
    GridBinding::new(GridSystemId(1), 0)
}

/// Square of cells `min..=max` on both axes.
fn square(min: i32, max: i32) -> AreaSnapshot {
    let mut cells = HashSet::new();
    for x in min..=max {
        for y in min..=max {
            cells.insert(IVec2::new(x, y));
        }
    }
    AreaSnapshot {
        binding: Some(ground()),
        cells,
    }
}

fn wall() -> ObjectType {
    ObjectType::new(ObjectTypeId(1), "wall", ObjectKind::Grid).with_categories([CategoryId(7)])
}

fn fence() -> ObjectType {
    ObjectType::new(ObjectTypeId(2), "fence", ObjectKind::Edge)
}

fn pillar() -> ObjectType {
    ObjectType::new(ObjectTypeId(3), "pillar", ObjectKind::Corner)
}

fn config(polarity: RulePolarity, volumes: &[Entity], highlight: Option<Color>) -> RuleProviderConfig {
    RuleProviderConfig {
        polarity,
        scope: RuleScope::Spatial,
        rules: RuleSet::everything(),
        volumes: volumes.to_vec(),
        highlight,
    }
}

fn attach(
    registry: &mut RuleRegistry,
    provider: Entity,
    volume: Entity,
    snapshot: &AreaSnapshot,
    overlay: &mut CellOverlay,
) {
    registry.update_volume(provider, volume, snapshot, &AreaDelta::initial(snapshot), overlay);
}

// ====================================================================
// Matching and containment
// ====================================================================

#[test]
fn test_kind_rule_matches_category_or_type() {
    let by_category = KindRule::categories([CategoryId(7)]);
    assert!(by_category.matches(&wall()));
    assert!(!by_category.matches(&fence()));

    let by_type = KindRule::types([ObjectTypeId(2)]);
    assert!(by_type.matches(&fence()));
    assert!(!KindRule::default().matches(&wall()));
}

#[test]
fn test_rule_set_is_per_kind() {
    let rules = RuleSet::default().with_kind(ObjectKind::Edge, KindRule::all());
    assert!(rules.applies_to(&fence()));
    assert!(!rules.applies_to(&wall()));
}

#[test]
fn test_edge_needs_both_sides_inside() {
    let cells = square(4, 6).cells;
    assert!(contains_object(&cells, ObjectKind::Edge, IVec2::new(5, 5), Some(Direction::East)));
    assert!(!contains_object(&cells, ObjectKind::Edge, IVec2::new(6, 5), Some(Direction::East)));
}

#[test]
fn test_corner_needs_all_four_cells() {
    let cells = square(4, 6).cells;
    assert!(contains_object(
        &cells,
        ObjectKind::Corner,
        IVec2::new(5, 5),
        Some(Direction::NorthEast)
    ));
    assert!(!contains_object(
        &cells,
        ObjectKind::Corner,
        IVec2::new(6, 6),
        Some(Direction::NorthEast)
    ));
    assert!(contains_object(&cells, ObjectKind::Grid, IVec2::new(6, 6), None));
}

// ====================================================================
// Registry queries
// ====================================================================

#[test]
fn test_disabler_blocks_only_inside_its_area() {
    let mut registry = RuleRegistry::default();
    let mut overlay = CellOverlay::default();
    assert!(registry.register(DISABLER, config(RulePolarity::Disable, &[VOLUME_A], None)));
    assert!(!registry.register(DISABLER, config(RulePolarity::Disable, &[VOLUME_A], None)));
    attach(&mut registry, DISABLER, VOLUME_A, &square(4, 6), &mut overlay);

    assert!(registry.is_blocked(ground(), &wall(), IVec2::new(5, 5), None));
    assert!(!registry.is_blocked(ground(), &wall(), IVec2::new(8, 8), None));
    assert!(!registry.is_blocked(GridBinding::new(GridSystemId(1), 1), &wall(), IVec2::new(5, 5), None));
    assert!(!registry.is_enabled(ground(), &wall(), IVec2::new(5, 5), None));
}

#[test]
fn test_blocked_and_enabled_are_independent() {
    let mut registry = RuleRegistry::default();
    let mut overlay = CellOverlay::default();
    registry.register(DISABLER, config(RulePolarity::Disable, &[VOLUME_A], None));
    registry.register(ENABLER, config(RulePolarity::Enable, &[VOLUME_B], None));
    attach(&mut registry, DISABLER, VOLUME_A, &square(0, 9), &mut overlay);
    attach(&mut registry, ENABLER, VOLUME_B, &square(4, 6), &mut overlay);

    let cell = IVec2::new(5, 5);
    assert!(registry.is_blocked(ground(), &wall(), cell, None));
    assert!(registry.is_enabled(ground(), &wall(), cell, None));
    assert!(!registry.is_enabled(ground(), &wall(), IVec2::new(1, 1), None));
}

#[test]
fn test_volume_for_other_provider_is_ignored() {
    let mut registry = RuleRegistry::default();
    let mut overlay = CellOverlay::default();
    registry.register(DISABLER, config(RulePolarity::Disable, &[VOLUME_A], None));
    attach(&mut registry, DISABLER, VOLUME_B, &square(4, 6), &mut overlay);
    assert!(!registry.is_blocked(ground(), &wall(), IVec2::new(5, 5), None));
}

#[test]
fn test_global_providers() {
    let mut registry = RuleRegistry::default();
    registry.register(
        DISABLER,
        RuleProviderConfig {
            scope: RuleScope::Global,
            rules: RuleSet::default().with_kind(ObjectKind::Grid, KindRule::categories([CategoryId(7)])),
            ..config(RulePolarity::Disable, &[], None)
        },
    );
    assert!(registry.any_global_active(RulePolarity::Disable));
    assert!(!registry.any_global_active(RulePolarity::Enable));
    assert!(registry.is_globally_blocked(&wall()));
    assert!(!registry.is_globally_blocked(&fence()));
    // Global providers never answer spatial queries.
    assert!(!registry.is_blocked(ground(), &wall(), IVec2::ZERO, None));
}

#[test]
fn test_removed_volume_stops_blocking() {
    let mut registry = RuleRegistry::default();
    let mut overlay = CellOverlay::default();
    registry.register(DISABLER, config(RulePolarity::Disable, &[VOLUME_A], None));
    attach(&mut registry, DISABLER, VOLUME_A, &square(4, 6), &mut overlay);
    registry.remove_volume(VOLUME_A, &mut overlay);
    assert!(!registry.is_blocked(ground(), &wall(), IVec2::new(5, 5), None));
}

// ====================================================================
// Painting
// ====================================================================

#[test]
fn test_highlighted_disabler_paints_its_cells() {
    let mut registry = RuleRegistry::default();
    let mut overlay = CellOverlay::default();
    registry.register(DISABLER, config(RulePolarity::Disable, &[VOLUME_A], Some(RED)));
    attach(&mut registry, DISABLER, VOLUME_A, &square(4, 6), &mut overlay);
    assert_eq!(overlay.painted_cell_count(), 9);
    assert_eq!(overlay.color_at(ground(), IVec2::new(5, 5)), Some(RED));

    registry.unregister(DISABLER, &mut overlay);
    assert_eq!(overlay.painted_cell_count(), 0);
}

#[test]
fn test_enabler_color_wins_on_shared_cells() {
    let mut registry = RuleRegistry::default();
    let mut overlay = CellOverlay::default();
    registry.register(DISABLER, config(RulePolarity::Disable, &[VOLUME_A], Some(RED)));
    registry.register(ENABLER, config(RulePolarity::Enable, &[VOLUME_B], Some(GREEN)));
    attach(&mut registry, ENABLER, VOLUME_B, &square(5, 5), &mut overlay);
    attach(&mut registry, DISABLER, VOLUME_A, &square(4, 6), &mut overlay);

    assert_eq!(overlay.color_at(ground(), IVec2::new(5, 5)), Some(GREEN));
    assert_eq!(overlay.color_at(ground(), IVec2::new(4, 4)), Some(RED));

    // Enabler leaves: the disabler's claim shows through.
    registry.unregister(ENABLER, &mut overlay);
    assert_eq!(overlay.color_at(ground(), IVec2::new(5, 5)), Some(RED));
}

#[test]
fn test_disabler_leaving_keeps_enabler_color() {
    let mut registry = RuleRegistry::default();
    let mut overlay = CellOverlay::default();
    registry.register(DISABLER, config(RulePolarity::Disable, &[VOLUME_A], Some(RED)));
    registry.register(ENABLER, config(RulePolarity::Enable, &[VOLUME_B], Some(GREEN)));
    attach(&mut registry, DISABLER, VOLUME_A, &square(4, 6), &mut overlay);
    attach(&mut registry, ENABLER, VOLUME_B, &square(5, 5), &mut overlay);

    registry.unregister(DISABLER, &mut overlay);
    assert_eq!(overlay.color_at(ground(), IVec2::new(5, 5)), Some(GREEN));
    assert_eq!(overlay.color_at(ground(), IVec2::new(4, 4)), None);
}

#[test]
fn test_moving_area_repaints_delta() {
    let mut registry = RuleRegistry::default();
    let mut overlay = CellOverlay::default();
    registry.register(DISABLER, config(RulePolarity::Disable, &[VOLUME_A], Some(RED)));
    attach(&mut registry, DISABLER, VOLUME_A, &square(5, 5), &mut overlay);

    let moved = AreaSnapshot {
        binding: Some(ground()),
        cells: HashSet::from([IVec2::new(6, 5)]),
    };
    let delta = AreaDelta {
        binding: Some(ground()),
        added: vec![IVec2::new(6, 5)],
        removed_from: Some(ground()),
        removed: vec![IVec2::new(5, 5)],
        ..Default::default()
    };
    registry.update_volume(DISABLER, VOLUME_A, &moved, &delta, &mut overlay);
    assert_eq!(overlay.color_at(ground(), IVec2::new(5, 5)), None);
    assert_eq!(overlay.color_at(ground(), IVec2::new(6, 5)), Some(RED));
}

#[test]
fn test_hidden_overlay_is_painted_when_shown() {
    let mut registry = RuleRegistry::default();
    let mut overlay = CellOverlay::default();
    overlay.set_visible(GridSystemId(1), false);
    registry.register(DISABLER, config(RulePolarity::Disable, &[VOLUME_A], Some(RED)));
    attach(&mut registry, DISABLER, VOLUME_A, &square(4, 6), &mut overlay);
    assert_eq!(overlay.painted_cell_count(), 0);
    // Blocking does not depend on visibility.
    assert!(registry.is_blocked(ground(), &wall(), IVec2::new(5, 5), None));

    overlay.set_visible(GridSystemId(1), true);
    registry.repaint_system(GridSystemId(1), &mut overlay);
    assert_eq!(overlay.painted_cell_count(), 9);

    overlay.set_visible(GridSystemId(1), false);
    registry.repaint_system(GridSystemId(1), &mut overlay);
    assert_eq!(overlay.painted_cell_count(), 0);
    assert!(!overlay.is_overlay_visible(GridSystemId(1)));
}
