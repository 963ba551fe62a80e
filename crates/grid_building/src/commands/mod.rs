//! Undoable placement commands.
//!
//! Every placement change goes through a [`Command`] so it can be undone and
//! redone. A [`CommandInvoker`] resource keeps a bounded undo history (oldest
//! entries evicted first) and a redo stack that is cleared whenever a new
//! command is recorded. Commands act on a [`crate::placement::PlacementBackend`]
//! handed in at call time.

pub mod command;
pub mod destroy;
pub mod invoker;
pub mod place;
pub mod systems;


pub use command::{Command, GridCommand};
pub use destroy::DestroyCommand;
pub use invoker::CommandInvoker;
pub use place::PlaceCommand;
pub use systems::{
    process_command_requests, process_redo, process_undo, CommandFinished, CommandRequested,
    CommandsPlugin, HistoryAction, RedoRequested, UndoRequested,
};
