//! Input events delivered by the host surface.

/// Keys the controller reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    /// Line break.
    Enter,
    /// Indentation; never moves focus.
    Tab,
    /// Delete backwards.
    Backspace,
    /// Close the picker or popover.
    Escape,
    /// Any other key, left to the host.
    Other,
}

/// Raw input events from the host text surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurfaceEvent {
    /// The surface content changed through native editing.
    TextChanged,
    /// The user pasted text.
    Paste(String),
    /// A key was pressed, before its native action runs.
    KeyDown(Key),
    /// A chip was clicked.
    ChipClicked {
        /// Id of the chip's variable.
        id: String,
    },
    /// The user clicked outside the picker or popover.
    ClickedElsewhere,
    /// The surface lost keyboard focus.
    FocusLost,
}

/// What the host must do with an event's native default action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventOutcome {
    /// The controller handled the event; suppress the native action.
    Handled,
    /// Let the native action run.
    Ignored,
}

impl EventOutcome {
    /// Returns true if the native action must be suppressed.
    #[must_use]
    pub const fn is_handled(self) -> bool {
        matches!(self, Self::Handled)
    }
}
