//! Ordering of grid-building systems via `SystemSet` phases.
//!
//! # Update phases (`GridBuildingSet`)
//!
//! ```text
//! Params  →  Areas  →  Registries  →  Commands
//! ```
//!
//! * **Params** – Push changed [`crate::params::GridBuildingParams`] into the
//!   resources that cache them.
//! * **Areas** – Area volumes bind, activate and recompute their cell sets.
//! * **Registries** – Rule and modifier registries consume the area events
//!   emitted earlier in the same pass.
//! * **Commands** – Placement commands, undo and redo, evaluated against the
//!   rules as they stand after this frame's area updates.
//!
//! # FixedUpdate phases (`GridBuildingFixedSet`)
//!
//! ```text
//! Tick  →  Modifiers
//! ```

use bevy::prelude::*;

// ---------------------------------------------------------------------------
// Update phases
// ---------------------------------------------------------------------------

/// Configured as a chain: `Params` → `Areas` → `Registries` → `Commands`.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum GridBuildingSet {
    Params,
    Areas,
    Registries,
    Commands,
}

// ---------------------------------------------------------------------------
// FixedUpdate phases
// ---------------------------------------------------------------------------

/// Configured as a chain: `Tick` → `Modifiers`.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum GridBuildingFixedSet {
    /// Advances [`crate::ModifierTickCounter`].
    Tick,
    /// Throttled modifier re-application.
    Modifiers,
}
