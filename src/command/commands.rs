use egui::{Color32, Rect, Vec2};
use serde::{Deserialize, Serialize};

use crate::element::{ElementType, ObjectId, PatchImage, TextElement};
use crate::overlay::{CropRect, SpotlightHole};
use crate::presets::BlurStyle;
use crate::tools::ToolKind;

/// Alignment of the selected object against the canvas
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Alignment {
    Left,
    HorizontalCenter,
    Right,
    Top,
    VerticalCenter,
    Bottom,
}

/// Commands that can be executed by the canvas engine
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Append a finished object on top of the scene
    AddElement(ElementType),

    /// Add a spotlight hole and re-derive the overlay
    AddSpotlightHole(SpotlightHole),

    /// Remove every spotlight hole
    ClearSpotlight,

    /// Install a crop region, replacing any previous one
    SetCrop(CropRect),

    ClearCrop,

    /// Queue a region capture; the blur patch is added once the capture resolves
    CaptureBlur {
        rect: Rect,
        style: BlurStyle,
        intensity: u8,
    },

    /// Swap in freshly processed pixels for an existing blur patch, keeping
    /// its id and place in the scene
    ReplaceBlurImage {
        id: ObjectId,
        rect: Rect,
        style: BlurStyle,
        intensity: u8,
        image: PatchImage,
    },

    /// Change the selected object
    Select(Option<ObjectId>),

    /// Live move during a drag
    MoveElement { id: ObjectId, delta: Vec2 },

    /// Live resize during a handle drag
    ResizeElement { id: ObjectId, rect: Rect },

    /// Live rotation during a handle drag, absolute degrees
    SetRotation { id: ObjectId, degrees: f32 },

    /// End of a live move/resize/rotate gesture
    FinishTransform,

    /// Place a new empty text object and start editing it
    PlaceText(TextElement),

    /// Re-enter edit mode on an existing text object
    BeginTextEdit(ObjectId),

    InsertText(String),

    Backspace,

    /// Leave edit mode; blank text objects are removed
    CommitText,

    DeleteSelected,
    Duplicate,
    Copy,
    Cut,
    Paste,
    FlipHorizontal,
    FlipVertical,

    /// Rotate the selection by a relative amount of degrees
    Rotate(f32),

    Nudge(Vec2),

    Align(Alignment),

    /// Re-apply the current tool configuration to the selection. A selected
    /// blur patch is recaptured with the current blur style and intensity.
    ApplyStyle,

    SetSpotlightColor(Color32),
    SetSpotlightDarkness(f32),

    SetTool(ToolKind),

    /// Escape: drop the in-progress gesture, or the selection when idle
    Cancel,

    Undo,
    Redo,
    ClearAll,
}

impl Command {
    /// True for commands whose success ends in a history snapshot.
    ///
    /// Live transform steps, selection and tool changes never snapshot; the
    /// gesture's `FinishTransform` does.
    pub fn records_history(&self) -> bool {
        match self {
            Command::AddElement(_)
            | Command::AddSpotlightHole(_)
            | Command::ClearSpotlight
            | Command::SetCrop(_)
            | Command::ClearCrop
            | Command::ReplaceBlurImage { .. }
            | Command::FinishTransform
            | Command::CommitText
            | Command::DeleteSelected
            | Command::Duplicate
            | Command::Cut
            | Command::Paste
            | Command::FlipHorizontal
            | Command::FlipVertical
            | Command::Rotate(_)
            | Command::Nudge(_)
            | Command::Align(_)
            | Command::ApplyStyle
            | Command::SetSpotlightColor(_)
            | Command::SetSpotlightDarkness(_) => true,

            Command::CaptureBlur { .. }
            | Command::Select(_)
            | Command::MoveElement { .. }
            | Command::ResizeElement { .. }
            | Command::SetRotation { .. }
            | Command::PlaceText(_)
            | Command::BeginTextEdit(_)
            | Command::InsertText(_)
            | Command::Backspace
            | Command::Copy
            | Command::SetTool(_)
            | Command::Cancel
            | Command::Undo
            | Command::Redo
            | Command::ClearAll => false,
        }
    }

    /// Commands that act on the selected object
    pub fn requires_selection(&self) -> bool {
        matches!(
            self,
            Command::DeleteSelected
                | Command::Duplicate
                | Command::Copy
                | Command::Cut
                | Command::FlipHorizontal
                | Command::FlipVertical
                | Command::Rotate(_)
                | Command::Nudge(_)
                | Command::Align(_)
                | Command::ApplyStyle
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn live_steps_do_not_snapshot() {
        let id = ObjectId::new();
        assert!(!Command::MoveElement { id, delta: Vec2::X }.records_history());
        assert!(!Command::Select(Some(id)).records_history());
        assert!(Command::FinishTransform.records_history());
        assert!(Command::SetSpotlightDarkness(0.3).records_history());
    }
}
