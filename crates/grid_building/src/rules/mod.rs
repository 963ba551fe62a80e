//! Area rules: which object kinds are blocked or explicitly allowed where.
//!
//! A [`GridRuleProvider`] is either a disabler or an enabler. Spatial
//! providers act on the cells covered by the area volumes they subscribe to;
//! global providers act everywhere. Placement legality is
//! "blocked and not enabled", computed per cell by the placement backend from
//! the [`RuleRegistry`] queries.
//!
//! Highlighted providers also paint their cells through the grid overlay.
//! Enabler colors win over disabler colors on shared cells.

mod config;
mod registry;
mod systems;

#[cfg(test)]
mod tests;

pub use config::{contains_object, KindRule, RulePolarity, RuleScope, RuleSet};
pub use registry::{RuleProviderConfig, RuleRegistry};
pub use systems::{
    apply_area_events_to_rules, apply_overlay_visibility, drop_removed_volumes_from_rules,
    sync_rule_providers, unregister_removed_rule_providers, GridRuleProvider, RulesPlugin,
    SetOverlayVisibility,
};
