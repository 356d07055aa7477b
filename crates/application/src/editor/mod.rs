//! Editor controller module
//!
//! The state machine that keeps a [`TextSurface`](crate::ports::TextSurface),
//! the canonical document and the variable registry in sync.

mod controller;
mod events;
mod state;
mod timer;

pub use controller::EditorController;
pub use events::{EventOutcome, Key, SurfaceEvent};
pub use state::{EditorState, FileRequest};
pub use timer::FormatTimer;
