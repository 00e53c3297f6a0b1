mod commands;
mod history;

use thiserror::Error;

use crate::element::ObjectId;
use crate::error::{ElementError, HistoryError};

pub use commands::{Alignment, Command};
pub use history::{History, HistoryRecord, SceneSnapshot};

/// Result type for command operations
pub type CommandResult = Result<(), CommandError>;

/// Errors that can occur during command execution
#[derive(Debug, Error, PartialEq)]
pub enum CommandError {
    /// The command needs a selected object
    #[error("no object is selected")]
    NoSelection,

    /// Overlays cannot be deleted, moved or restyled
    #[error("object {0} is a protected overlay")]
    Protected(ObjectId),

    /// The referenced object is not in the scene
    #[error("object {0} is not in the scene")]
    UnknownObject(ObjectId),

    /// No text object is being edited
    #[error("no text object is being edited")]
    NotEditing,

    #[error(transparent)]
    History(#[from] HistoryError),

    #[error(transparent)]
    Element(#[from] ElementError),
}
