//! JSON command/response envelope for the `--agent` mode.
//!
//! One command per stdin line, one response per stdout line. The `cmd` field
//! tags commands; responses carry `protocol_version` plus a `type` tag.

use serde::{Deserialize, Serialize};

use grid_building::grid::Direction;

// ---------------------------------------------------------------------------
// Commands (stdin → app)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(tag = "cmd")]
pub enum AgentCommand {
    /// Place an object of `object_type` anchored at (`x`, `y`) on the ground
    /// grid. `facing` is the rotation, side or corner depending on the kind.
    #[serde(rename = "place")]
    Place {
        object_type: u32,
        x: i32,
        y: i32,
        #[serde(default)]
        facing: Direction,
    },

    /// Destroy whatever occupies the grid cell (`x`, `y`).
    #[serde(rename = "destroy")]
    Destroy { x: i32, y: i32 },

    #[serde(rename = "undo")]
    Undo,

    #[serde(rename = "redo")]
    Redo,

    /// Run `updates` Update passes.
    #[serde(rename = "step")]
    Step {
        #[serde(default = "one")]
        updates: u32,
    },

    /// Run `ticks` FixedUpdate passes.
    #[serde(rename = "tick")]
    Tick { ticks: u32 },

    /// Report what occupies a cell, whether houses are blocked there and
    /// the cell's heat.
    #[serde(rename = "query")]
    Query { x: i32, y: i32 },

    /// Show or hide the rule highlight on the ground grid.
    #[serde(rename = "overlay")]
    Overlay { visible: bool },

    #[serde(rename = "quit")]
    Quit,
}

fn one() -> u32 {
    1
}

// ---------------------------------------------------------------------------
// Responses (app → stdout)
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct AgentResponse {
    pub protocol_version: u32,
    #[serde(flatten)]
    pub payload: ResponsePayload,
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(tag = "type")]
pub enum ResponsePayload {
    #[serde(rename = "ready")]
    Ready,

    /// Outcome of a place, destroy, undo or redo request.
    #[serde(rename = "finished")]
    Finished {
        action: String,
        succeeded: bool,
        undo_len: usize,
        redo_len: usize,
    },

    #[serde(rename = "cell")]
    Cell {
        x: i32,
        y: i32,
        object_type: Option<u32>,
        /// Hex string; JSON numbers cannot carry 128 bits.
        unique_id: Option<String>,
        blocked: bool,
        heat: f32,
    },

    #[serde(rename = "ok")]
    Ok,

    #[serde(rename = "error")]
    Error { message: String },

    #[serde(rename = "goodbye")]
    Goodbye,
}

/// Bump when the command/response schema changes.
pub const PROTOCOL_VERSION: u32 = 1;

pub fn make_response(payload: ResponsePayload) -> AgentResponse {
    AgentResponse {
        protocol_version: PROTOCOL_VERSION,
        payload,
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
