use thiserror::Error;

/// Errors raised when an element's geometry cannot be changed as requested
#[derive(Debug, Error, PartialEq)]
pub enum ElementError {
    #[error("Element dimensions too small (min: {min}). Width: {width}, Height: {height}")]
    TooSmall { min: f32, width: f32, height: f32 },

    #[error("Cannot resize an element without geometry")]
    EmptyGeometry,

    #[error("Derived overlays cannot be transformed directly")]
    Overlay,
}

/// Errors from the snapshot history
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum HistoryError {
    #[error("nothing to undo")]
    NothingToUndo,

    #[error("nothing to redo")]
    NothingToRedo,
}
