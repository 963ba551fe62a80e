//! Systems and events driving the command invoker.

use bevy::prelude::*;

use super::command::GridCommand;
use super::invoker::CommandInvoker;
use crate::grid::GridSystems;
use crate::objects::ObjectCatalog;
use crate::placement::{ObjectLifecycle, PlacedObjects, RuledPlacement};
use crate::rules::RuleRegistry;
use crate::saveable::SaveableRegistry;
use crate::sets::GridBuildingSet;

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// Execute a command and record it in the history if it succeeds.
#[derive(Event, Debug, Clone)]
pub struct CommandRequested(pub GridCommand);

/// Marker event: undo the most recent command.
#[derive(Event, Debug, Clone, Copy)]
pub struct UndoRequested;

/// Marker event: redo the most recently undone command.
#[derive(Event, Debug, Clone, Copy)]
pub struct RedoRequested;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryAction {
    Execute,
    Undo,
    Redo,
}

/// Outcome of one processed request.
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandFinished {
    pub action: HistoryAction,
    pub succeeded: bool,
}

// ---------------------------------------------------------------------------
// Systems
// ---------------------------------------------------------------------------

/// Placement collaborators, any of which may be absent in a host app.
type Collaborators<'a> = (
    Option<ResMut<'a, PlacedObjects>>,
    Option<Res<'a, GridSystems>>,
    Option<Res<'a, ObjectCatalog>>,
    Option<Res<'a, RuleRegistry>>,
);

/// Run `f` against a [`RuledPlacement`] built from the collaborators, or
/// return `None` when one of them is missing.
fn with_backend<R>(
    (objects, grids, catalog, rules): &mut Collaborators<'_>,
    f: impl FnOnce(&mut RuledPlacement<'_>) -> R,
) -> Option<R> {
    let (Some(objects), Some(grids), Some(catalog)) =
        (objects.as_deref_mut(), grids.as_deref(), catalog.as_deref())
    else {
        return None;
    };
    let mut backend = RuledPlacement::new(objects, grids, catalog, rules.as_deref());
    Some(f(&mut backend))
}

pub fn process_command_requests(
    mut requests: EventReader<CommandRequested>,
    mut invoker: ResMut<CommandInvoker>,
    mut collaborators: Collaborators,
    mut finished: EventWriter<CommandFinished>,
) {
    for CommandRequested(command) in requests.read() {
        let label = command.label();
        let succeeded = with_backend(&mut collaborators, |backend| {
            invoker.execute_command(command.clone(), backend)
        })
        .unwrap_or_else(|| {
            warn!("{label} command ignored: placement resources are missing");
            false
        });
        finished.send(CommandFinished {
            action: HistoryAction::Execute,
            succeeded,
        });
    }
}

pub fn process_undo(
    mut events: EventReader<UndoRequested>,
    mut invoker: ResMut<CommandInvoker>,
    mut collaborators: Collaborators,
    mut finished: EventWriter<CommandFinished>,
) {
    for _ in events.read() {
        let succeeded = with_backend(&mut collaborators, |backend| invoker.undo_command(backend))
            .unwrap_or_else(|| {
                warn!("undo ignored: placement resources are missing");
                false
            });
        finished.send(CommandFinished {
            action: HistoryAction::Undo,
            succeeded,
        });
    }
}

pub fn process_redo(
    mut events: EventReader<RedoRequested>,
    mut invoker: ResMut<CommandInvoker>,
    mut collaborators: Collaborators,
    mut finished: EventWriter<CommandFinished>,
) {
    for _ in events.read() {
        let succeeded = with_backend(&mut collaborators, |backend| invoker.redo_command(backend))
            .unwrap_or_else(|| {
                warn!("redo ignored: placement resources are missing");
                false
            });
        finished.send(CommandFinished {
            action: HistoryAction::Redo,
            succeeded,
        });
    }
}

/// Turn the placement store's queued notifications into events.
pub fn flush_object_lifecycle(
    objects: Option<ResMut<PlacedObjects>>,
    mut lifecycle: EventWriter<ObjectLifecycle>,
) {
    let Some(mut objects) = objects else { return };
    // Avoid flagging the resource as changed every frame.
    if objects.bypass_change_detection().has_pending_lifecycle() {
        lifecycle.send_batch(objects.drain_lifecycle());
    }
}

// ---------------------------------------------------------------------------
// Plugin
// ---------------------------------------------------------------------------

pub struct CommandsPlugin;

impl Plugin for CommandsPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<CommandInvoker>()
            .add_event::<CommandRequested>()
            .add_event::<UndoRequested>()
            .add_event::<RedoRequested>()
            .add_event::<CommandFinished>()
            .add_event::<ObjectLifecycle>()
            .add_systems(
                Update,
                (
                    process_command_requests,
                    process_undo,
                    process_redo,
                    flush_object_lifecycle,
                )
                    .chain()
                    .in_set(GridBuildingSet::Commands),
            );

        app.init_resource::<SaveableRegistry>();
        app.world_mut()
            .resource_mut::<SaveableRegistry>()
            .register::<CommandInvoker>();
    }
}
