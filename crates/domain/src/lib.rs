//! Courier Domain - Core editor types
//!
//! This crate defines the document model for the Courier body editor:
//! `{{type:id}}` markers, variables and their registry, body syntax status,
//! and editor settings. All types here are pure Rust with no I/O dependencies.

pub mod error;
pub mod id;
pub mod marker;
pub mod registry;
pub mod settings;
pub mod syntax;
pub mod text;
pub mod variable;

pub use error::{DomainError, DomainResult};
pub use id::{generate_id, validate_id};
pub use marker::{Marker, Run, parse_markers, referenced_ids, split_runs};
pub use registry::{RegistryDiff, VariableRegistry};
pub use settings::{EditorSettings, TimestampUnit};
pub use syntax::{BodySyntax, SyntaxStatus};
pub use variable::{Variable, VariableType};
