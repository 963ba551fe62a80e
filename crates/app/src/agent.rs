//! Headless `--agent` mode: a blocking loop that reads JSON commands from
//! stdin and writes JSON responses to stdout.
//!
//! Each command is applied to the demo scene and followed by one `Update`
//! pass, so the response reflects the processed request. See
//! [`crate::protocol`] for the schema.

use std::io::{BufRead, Write};

use bevy::prelude::*;

use grid_building::commands::{
    CommandFinished, CommandInvoker, CommandRequested, DestroyCommand, HistoryAction,
    PlaceCommand, RedoRequested, UndoRequested,
};
use grid_building::grid::Direction;
use grid_building::objects::{ObjectCatalog, ObjectKind, ObjectTypeId, PlacementRequest, ShapePlacement};
use grid_building::placement::PlacedObjects;
use grid_building::rules::SetOverlayVisibility;

use crate::protocol::{make_response, AgentCommand, AgentResponse, ResponsePayload, PROTOCOL_VERSION};
use crate::scene::{ground_binding, report_cell, GROUND};

pub fn run_agent_mode(mut app: App) {
    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    let mut stdout = stdout.lock();

    write_response(&mut stdout, &make_response(ResponsePayload::Ready));
    // stderr keeps stdout clean for the protocol.
    eprintln!("grid_builder agent mode v{PROTOCOL_VERSION} ready, waiting for commands on stdin");

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(l) => l,
            Err(e) => {
                eprintln!("stdin read error: {e}");
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        let response = match serde_json::from_str::<AgentCommand>(&line) {
            Ok(cmd) => process_command(cmd, &mut app),
            Err(e) => make_response(ResponsePayload::Error {
                message: format!("Parse error: {e}"),
            }),
        };
        let is_goodbye = matches!(response.payload, ResponsePayload::Goodbye);
        write_response(&mut stdout, &response);
        if is_goodbye {
            break;
        }
    }

    eprintln!("grid_builder agent mode shutting down");
}

fn write_response(out: &mut impl Write, response: &AgentResponse) {
    match serde_json::to_string(response) {
        Ok(json) => {
            let _ = writeln!(out, "{json}");
            let _ = out.flush();
        }
        Err(e) => eprintln!("failed to encode response: {e}"),
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

pub fn process_command(cmd: AgentCommand, app: &mut App) -> AgentResponse {
    let payload = match cmd {
        AgentCommand::Place {
            object_type,
            x,
            y,
            facing,
        } => match placement_request(app, ObjectTypeId(object_type), IVec2::new(x, y), facing) {
            Some(request) => {
                app.world_mut()
                    .send_event(CommandRequested(PlaceCommand::new(request).into()));
                finish(app)
            }
            None => ResponsePayload::Error {
                message: format!("unknown object type {object_type}"),
            },
        },
        AgentCommand::Destroy { x, y } => {
            let target = app
                .world()
                .get_resource::<PlacedObjects>()
                .and_then(|objects| objects.object_at(ground_binding(), IVec2::new(x, y)))
                .cloned();
            match target {
                Some(target) => {
                    app.world_mut()
                        .send_event(CommandRequested(DestroyCommand::new(&target).into()));
                    finish(app)
                }
                None => ResponsePayload::Error {
                    message: format!("no object at ({x}, {y})"),
                },
            }
        }
        AgentCommand::Undo => {
            app.world_mut().send_event(UndoRequested);
            finish(app)
        }
        AgentCommand::Redo => {
            app.world_mut().send_event(RedoRequested);
            finish(app)
        }
        AgentCommand::Step { updates } => {
            for _ in 0..updates {
                app.update();
            }
            ResponsePayload::Ok
        }
        AgentCommand::Tick { ticks } => {
            for _ in 0..ticks {
                app.world_mut().run_schedule(FixedUpdate);
            }
            ResponsePayload::Ok
        }
        AgentCommand::Query { x, y } => {
            let report = report_cell(app, IVec2::new(x, y));
            ResponsePayload::Cell {
                x,
                y,
                object_type: report.object.map(|(object_type, _)| object_type.0),
                unique_id: report.object.map(|(_, id)| format!("{id:032x}")),
                blocked: report.blocked,
                heat: report.heat,
            }
        }
        AgentCommand::Overlay { visible } => {
            app.world_mut().send_event(SetOverlayVisibility {
                system: GROUND,
                visible,
            });
            app.update();
            ResponsePayload::Ok
        }
        AgentCommand::Quit => ResponsePayload::Goodbye,
    };
    make_response(payload)
}

/// Build a ground-grid request whose placement matches the type's kind.
fn placement_request(app: &App, object_type: ObjectTypeId, cell: IVec2, facing: Direction) -> Option<PlacementRequest> {
    let kind = app.world().get_resource::<ObjectCatalog>()?.get(object_type)?.kind;
    let placement = match kind {
        ObjectKind::Grid => ShapePlacement::Grid { rotation: facing },
        ObjectKind::Edge => ShapePlacement::Edge { side: facing },
        ObjectKind::Corner => ShapePlacement::Corner { corner: facing },
        ObjectKind::Free => ShapePlacement::Free { yaw: 0.0 },
    };
    Some(PlacementRequest::new(object_type, ground_binding(), cell, placement))
}

/// Run one update and report the last finished history request.
fn finish(app: &mut App) -> ResponsePayload {
    app.update();
    let world = app.world();
    let Some(finished) = world
        .get_resource::<Events<CommandFinished>>()
        .and_then(|events| events.iter_current_update_events().last().copied())
    else {
        return ResponsePayload::Error {
            message: "request was not processed".into(),
        };
    };
    let (undo_len, redo_len) = world
        .get_resource::<CommandInvoker>()
        .map(|invoker| (invoker.undo_history().count(), invoker.redo_stack().len()))
        .unwrap_or_default();
    let action = match finished.action {
        HistoryAction::Execute => "execute",
        HistoryAction::Undo => "undo",
        HistoryAction::Redo => "redo",
    };
    ResponsePayload::Finished {
        action: action.into(),
        succeeded: finished.succeeded,
        undo_len,
        redo_len,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use grid_building::params::GridBuildingParams;

    use crate::scene::{build_app, spawn_scene, HOUSE, PARK_CENTER};

    fn scene_app() -> App {
        let mut app = build_app(GridBuildingParams::default(), false);
        spawn_scene(&mut app);
        app
    }

    fn place(app: &mut App, object_type: ObjectTypeId, x: i32, y: i32) -> ResponsePayload {
        process_command(
            AgentCommand::Place {
                object_type: object_type.0,
                x,
                y,
                facing: Direction::North,
            },
            app,
        )
        .payload
    }

    #[test]
    fn place_then_undo_reports_history() {
        let mut app = scene_app();
        assert_eq!(
            place(&mut app, HOUSE, 12, 2),
            ResponsePayload::Finished {
                action: "execute".into(),
                succeeded: true,
                undo_len: 1,
                redo_len: 0,
            }
        );
        assert_eq!(
            process_command(AgentCommand::Undo, &mut app).payload,
            ResponsePayload::Finished {
                action: "undo".into(),
                succeeded: true,
                undo_len: 0,
                redo_len: 1,
            }
        );
    }

    #[test]
    fn park_blocks_houses_except_on_plaza() {
        let mut app = scene_app();
        let edge_of_park = PARK_CENTER + IVec2::new(1, 0);
        assert!(matches!(
            place(&mut app, HOUSE, edge_of_park.x, edge_of_park.y),
            ResponsePayload::Finished { succeeded: false, .. }
        ));
        assert!(matches!(
            place(&mut app, HOUSE, PARK_CENTER.x, PARK_CENTER.y),
            ResponsePayload::Finished { succeeded: true, .. }
        ));
    }

    #[test]
    fn query_reports_placed_object() {
        let mut app = scene_app();
        place(&mut app, HOUSE, 12, 2);
        match process_command(AgentCommand::Query { x: 12, y: 2 }, &mut app).payload {
            ResponsePayload::Cell {
                object_type,
                unique_id,
                blocked,
                ..
            } => {
                assert_eq!(object_type, Some(HOUSE.0));
                assert_eq!(unique_id.map(|id| id.len()), Some(32));
                assert!(!blocked);
            }
            other => panic!("expected Cell, got {other:?}"),
        }
    }

    #[test]
    fn destroy_empty_cell_is_an_error() {
        let mut app = scene_app();
        assert!(matches!(
            process_command(AgentCommand::Destroy { x: 0, y: 15 }, &mut app).payload,
            ResponsePayload::Error { .. }
        ));
    }

    #[test]
    fn unknown_object_type_is_an_error() {
        let mut app = scene_app();
        assert!(matches!(place(&mut app, ObjectTypeId(99), 1, 1), ResponsePayload::Error { .. }));
    }

    #[test]
    fn furnace_heats_its_centre() {
        let mut app = scene_app();
        match process_command(AgentCommand::Query { x: 11, y: 11 }, &mut app).payload {
            ResponsePayload::Cell { heat, .. } => assert!(heat > 0.0),
            other => panic!("expected Cell, got {other:?}"),
        }
    }

    #[test]
    fn quit_says_goodbye() {
        let mut app = scene_app();
        assert_eq!(process_command(AgentCommand::Quit, &mut app).payload, ResponsePayload::Goodbye);
    }
}
