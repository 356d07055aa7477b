//! Courier Application - Editor core and ports
//!
//! This crate defines the application layer with:
//! - Port traits (clock, file loading, host text surface, owning form)
//! - The editor controller state machine
//! - Marker resolution and auto-formatting
//! - Application-level error handling

pub mod editor;
pub mod error;
pub mod format;
pub mod ports;
pub mod variable_resolver;

pub use editor::{EditorController, EditorState, EventOutcome, FileRequest, Key, SurfaceEvent};
pub use error::{ApplicationError, ApplicationResult};
pub use format::{FormatOutcome, auto_format, validate};
pub use ports::{Clock, EditorObserver, FileLoader, TextSurface};
pub use variable_resolver::{ResolutionResult, ResolveOptions, VariableResolver, resolve_variables};
