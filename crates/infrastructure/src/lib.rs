//! Courier Infrastructure - Adapters and implementations
//!
//! This crate provides concrete implementations of the ports defined in the
//! application layer, plus the tokio runtime that drives the editor.

pub mod adapters;
pub mod persistence;
pub mod runtime;
pub mod serialization;
pub mod surface;

use std::sync::Arc;

use courier_application::variable_resolver::{self, ResolveOptions};
use courier_domain::Variable;

pub use adapters::{SystemClock, TokioFileLoader};
pub use persistence::{SettingsError, SettingsRepository};
pub use runtime::{EditorCommand, EditorRuntime, NativeEdit};
pub use serialization::{SerializationError, from_json, to_json_stable};
pub use surface::TreeSurface;

/// Resolves `document` for execution, reading the time from the system clock.
#[must_use]
pub fn resolve_variables(document: &str, variables: &[Variable], options: &ResolveOptions) -> String {
    variable_resolver::resolve_variables(document, variables, options, Arc::new(SystemClock::new()))
}
