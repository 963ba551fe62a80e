//! `grid_builder`: headless host for the grid building core.
//!
//! Without flags it runs a scripted walk through the demo scene and logs each
//! step. `--agent` switches to the newline-delimited JSON protocol on
//! stdin/stdout instead. Params come from `--params <file.json>` or the
//! `GRID_BUILDER_PARAMS` environment variable; missing fields keep defaults.

mod agent;
mod protocol;
mod scene;

use bevy::prelude::*;

use grid_building::grid::Direction;
use grid_building::objects::ObjectTypeId;
use grid_building::overlay::CellOverlay;
use grid_building::params::GridBuildingParams;
use grid_building::rules::SetOverlayVisibility;

use protocol::{AgentCommand, ResponsePayload};
use scene::{build_app, cell_center, report_cell, spawn_scene, HOUSE, LAMP, PARK_CENTER, TREE, WALL};

const PARAMS_ENV: &str = "GRID_BUILDER_PARAMS";

fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let agent_mode = args.iter().any(|a| a == "--agent");
    let params_path = args
        .iter()
        .position(|a| a == "--params")
        .and_then(|i| args.get(i + 1).cloned())
        .or_else(|| std::env::var(PARAMS_ENV).ok());

    let params = match params_path {
        Some(path) => match load_params(&path) {
            Ok(params) => params,
            Err(e) => {
                eprintln!("failed to load params from {path}: {e}");
                std::process::exit(1);
            }
        },
        None => GridBuildingParams::default(),
    };

    // Logs would interleave with the protocol on stdout.
    let mut app = build_app(params, !agent_mode);
    let volumes = spawn_scene(&mut app);
    debug!(
        "scene volumes: park {:?}, plaza {:?}, furnace {:?}",
        volumes.park, volumes.plaza, volumes.furnace
    );

    if agent_mode {
        agent::run_agent_mode(app);
    } else {
        run_demo(&mut app, volumes.furnace);
    }
}

fn load_params(path: &str) -> Result<GridBuildingParams, String> {
    let text = std::fs::read_to_string(path).map_err(|e| e.to_string())?;
    serde_json::from_str(&text).map_err(|e| e.to_string())
}

// ---------------------------------------------------------------------------
// Scripted demo
// ---------------------------------------------------------------------------

fn run_demo(app: &mut App, furnace: Entity) {
    let plaza_corner = PARK_CENTER;
    let inside_park = PARK_CENTER + IVec2::new(1, 0);

    let script = [
        ("house outside the park", place(HOUSE, 12, 2, Direction::North)),
        ("house overlapping the park", place(HOUSE, inside_park.x, inside_park.y, Direction::North)),
        ("house on the plaza", place(HOUSE, plaza_corner.x, plaza_corner.y, Direction::North)),
        ("wall east of (12, 5)", place(WALL, 12, 5, Direction::East)),
        ("lamp on the NE corner of (8, 8)", place(LAMP, 8, 8, Direction::NorthEast)),
        ("tree at (1, 14)", place(TREE, 1, 14, Direction::North)),
        ("undo tree", AgentCommand::Undo),
        ("undo lamp", AgentCommand::Undo),
        ("redo lamp", AgentCommand::Redo),
        ("destroy the first house", AgentCommand::Destroy { x: 12, y: 2 }),
    ];
    for (label, command) in script {
        log_response(label, agent::process_command(command, app));
    }

    let before = report_cell(app, IVec2::new(12, 2));
    log_response("undo destroy", agent::process_command(AgentCommand::Undo, app));
    let after = report_cell(app, IVec2::new(12, 2));
    info!(
        "house restored: {} (object {:?})",
        before.object.is_none() && after.object.is_some(),
        after.object
    );

    // Move the furnace and let the throttled modifier catch up.
    let old_centre = IVec2::new(11, 11);
    let new_centre = IVec2::new(11, 6);
    if let Some(mut transform) = app.world_mut().get_mut::<Transform>(furnace) {
        transform.translation = cell_center(new_centre);
    }
    app.update();
    info!(
        "furnace moved: heat at old centre {:.1}, new centre {:.1}",
        report_cell(app, old_centre).heat,
        report_cell(app, new_centre).heat
    );
    let interval_ticks = app
        .world()
        .get_resource::<GridBuildingParams>()
        .map_or(1, |params| params.seconds_to_ticks(0.5));
    for _ in 0..interval_ticks {
        app.world_mut().run_schedule(FixedUpdate);
    }
    info!(
        "after {interval_ticks} ticks: heat at old centre {:.1}, new centre {:.1}",
        report_cell(app, old_centre).heat,
        report_cell(app, new_centre).heat
    );

    let painted = |app: &App| {
        app.world()
            .get_resource::<CellOverlay>()
            .map_or(0, CellOverlay::painted_cell_count)
    };
    info!("overlay cells painted: {}", painted(app));
    for visible in [false, true] {
        app.world_mut().send_event(SetOverlayVisibility {
            system: scene::GROUND,
            visible,
        });
        app.update();
        info!("overlay visible={visible}: {} cells painted", painted(app));
    }
}

fn place(object_type: ObjectTypeId, x: i32, y: i32, facing: Direction) -> AgentCommand {
    AgentCommand::Place {
        object_type: object_type.0,
        x,
        y,
        facing,
    }
}

fn log_response(label: &str, response: protocol::AgentResponse) {
    match response.payload {
        ResponsePayload::Finished {
            action,
            succeeded,
            undo_len,
            redo_len,
        } => info!("{label}: {action} succeeded={succeeded} (undo {undo_len}, redo {redo_len})"),
        ResponsePayload::Error { message } => warn!("{label}: {message}"),
        other => info!("{label}: {other:?}"),
    }
}
