//! Rule provider component and the systems feeding the registry.

use bevy::prelude::*;

use super::config::{RulePolarity, RuleScope, RuleSet};
use super::registry::{RuleProviderConfig, RuleRegistry};
use crate::area::{AreaDelta, AreaVolume, AreaVolumeInitialized, AreaVolumeUpdated};
use crate::grid::GridSystemId;
use crate::overlay::CellOverlay;
use crate::sets::GridBuildingSet;

// ---------------------------------------------------------------------------
// Component
// ---------------------------------------------------------------------------

/// A disabler or enabler attached to an entity. Any change to the component
/// re-registers it; `enabled = false` withdraws it.
#[derive(Component, Debug, Clone)]
pub struct GridRuleProvider {
    pub polarity: RulePolarity,
    pub scope: RuleScope,
    pub rules: RuleSet,
    pub volumes: Vec<Entity>,
    pub highlight: Option<Color>,
    pub enabled: bool,
}

impl GridRuleProvider {
    pub fn disabler(rules: RuleSet) -> Self {
        Self {
            polarity: RulePolarity::Disable,
            scope: RuleScope::Spatial,
            rules,
            volumes: Vec::new(),
            highlight: None,
            enabled: true,
        }
    }

    pub fn enabler(rules: RuleSet) -> Self {
        Self {
            polarity: RulePolarity::Enable,
            ..Self::disabler(rules)
        }
    }

    pub fn global(mut self) -> Self {
        self.scope = RuleScope::Global;
        self
    }

    pub fn with_volumes(mut self, volumes: impl IntoIterator<Item = Entity>) -> Self {
        self.volumes = volumes.into_iter().collect();
        self
    }

    pub fn with_highlight(mut self, color: Color) -> Self {
        self.highlight = Some(color);
        self
    }

    pub fn config(&self) -> RuleProviderConfig {
        RuleProviderConfig {
            polarity: self.polarity,
            scope: self.scope,
            rules: self.rules.clone(),
            volumes: self.volumes.clone(),
            highlight: self.highlight,
        }
    }
}

/// Show or hide the overlay of one grid system.
#[derive(Event, Debug, Clone, Copy)]
pub struct SetOverlayVisibility {
    pub system: GridSystemId,
    pub visible: bool,
}

// ---------------------------------------------------------------------------
// Systems
// ---------------------------------------------------------------------------

/// (Re)register changed providers, attaching the cell sets their volumes
/// have already published.
pub fn sync_rule_providers(
    providers: Query<(Entity, &GridRuleProvider), Changed<GridRuleProvider>>,
    volumes: Query<&AreaVolume>,
    mut registry: ResMut<RuleRegistry>,
    mut overlay: ResMut<CellOverlay>,
) {
    for (entity, provider) in &providers {
        registry.unregister(entity, &mut *overlay);
        if !provider.enabled {
            debug!("rule provider {entity} disabled");
            continue;
        }
        registry.register(entity, provider.config());
        for &volume in &provider.volumes {
            let Some(snapshot) = volumes.get(volume).ok().and_then(AreaVolume::snapshot) else {
                continue;
            };
            let delta = AreaDelta::initial(&snapshot);
            registry.update_volume(entity, volume, &snapshot, &delta, &mut *overlay);
        }
        info!(
            "registered {:?} {:?} rule provider {entity} over {} volume(s)",
            provider.scope,
            provider.polarity,
            provider.volumes.len()
        );
    }
}

pub fn unregister_removed_rule_providers(
    mut removed: RemovedComponents<GridRuleProvider>,
    mut registry: ResMut<RuleRegistry>,
    mut overlay: ResMut<CellOverlay>,
) {
    for entity in removed.read() {
        if registry.unregister(entity, &mut *overlay) {
            debug!("rule provider {entity} removed");
        }
    }
}

pub fn drop_removed_volumes_from_rules(
    mut removed: RemovedComponents<AreaVolume>,
    mut registry: ResMut<RuleRegistry>,
    mut overlay: ResMut<CellOverlay>,
) {
    for volume in removed.read() {
        registry.remove_volume(volume, &mut *overlay);
    }
}

/// Forward area events to the subscribed providers.
pub fn apply_area_events_to_rules(
    mut initialized: EventReader<AreaVolumeInitialized>,
    mut updated: EventReader<AreaVolumeUpdated>,
    mut registry: ResMut<RuleRegistry>,
    mut overlay: ResMut<CellOverlay>,
) {
    for event in initialized.read() {
        let delta = AreaDelta::initial(&event.snapshot);
        for provider in registry.providers_for_volume(event.volume) {
            registry.update_volume(provider, event.volume, &event.snapshot, &delta, &mut *overlay);
        }
    }
    for event in updated.read() {
        for provider in registry.providers_for_volume(event.volume) {
            registry.update_volume(
                provider,
                event.volume,
                &event.snapshot,
                &event.delta,
                &mut *overlay,
            );
        }
    }
}

pub fn apply_overlay_visibility(
    mut events: EventReader<SetOverlayVisibility>,
    mut registry: ResMut<RuleRegistry>,
    mut overlay: ResMut<CellOverlay>,
) {
    for event in events.read() {
        overlay.set_visible(event.system, event.visible);
        registry.repaint_system(event.system, &mut *overlay);
    }
}

// ---------------------------------------------------------------------------
// Plugin
// ---------------------------------------------------------------------------

pub struct RulesPlugin;

impl Plugin for RulesPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<RuleRegistry>()
            .init_resource::<CellOverlay>()
            .add_event::<SetOverlayVisibility>()
            .add_systems(
                Update,
                (
                    sync_rule_providers,
                    unregister_removed_rule_providers,
                    drop_removed_volumes_from_rules,
                    apply_area_events_to_rules,
                    apply_overlay_visibility,
                )
                    .chain()
                    .in_set(GridBuildingSet::Registries),
            );
    }
}
