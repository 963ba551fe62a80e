/// Default bound on the undo history when no `GridBuildingParams` override is given.
pub const DEFAULT_MAX_UNDO_HISTORY: usize = 50;

/// Rate of the shared fixed tick source that drives modifier throttling.
pub const DEFAULT_FIXED_TICKS_PER_SECOND: u32 = 10;

/// Maximum vertical distance (world units) at which an area volume still
/// "hits" a grid layer when probing along the grid normal.
pub const DEFAULT_PROBE_DISTANCE: f32 = 100.0;

/// Default seed for variant selection and unique-id generation.
pub const DEFAULT_PLACEMENT_SEED: u64 = 42;

/// Default cell size for grid systems created without an explicit one.
pub const DEFAULT_CELL_SIZE: f32 = 1.0;
