//! Editor interaction states.

use courier_domain::VariableType;

use crate::ports::ScreenPoint;

/// Interaction state of the editor controller.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum EditorState {
    /// Nothing has happened since the editor opened or lost focus.
    #[default]
    Idle,
    /// The user is editing text.
    Composing,
    /// The variable picker is shown after the trigger was typed.
    PickerOpen {
        /// Where the picker is anchored on screen.
        anchor: Option<ScreenPoint>,
        /// Character offset of the first trigger character.
        trigger_offset: usize,
    },
    /// The text popover of a `base64-text` variable is shown.
    PopoverOpen {
        /// The variable being edited.
        variable_id: String,
        /// Where the popover is anchored on screen.
        anchor: Option<ScreenPoint>,
    },
}

impl EditorState {
    /// Returns true if the variable picker is shown.
    #[must_use]
    pub const fn is_picker_open(&self) -> bool {
        matches!(self, Self::PickerOpen { .. })
    }

    /// Returns true if a popover is shown.
    #[must_use]
    pub const fn is_popover_open(&self) -> bool {
        matches!(self, Self::PopoverOpen { .. })
    }

    /// Short name used in logs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Composing => "composing",
            Self::PickerOpen { .. } => "picker-open",
            Self::PopoverOpen { .. } => "popover-open",
        }
    }
}

/// A request for the host to let the user pick a file for a variable.
///
/// The host answers with
/// [`EditorController::complete_file_read`](super::EditorController::complete_file_read).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRequest {
    /// The variable that receives the file.
    pub variable_id: String,
    /// Whether the file is encoded as plain base64 or a data URL.
    pub variable_type: VariableType,
}
