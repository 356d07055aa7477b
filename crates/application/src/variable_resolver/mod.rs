//! Variable resolution module
//!
//! Substitutes `{{type:id}}` markers with literal values for execution and
//! preview. The editable document always stays marker-based.
//!
//! # Usage
//!
//! ```
//! use std::sync::Arc;
//!
//! use chrono::{DateTime, Utc};
//! use courier_application::ports::Clock;
//! use courier_application::variable_resolver::{ResolveOptions, VariableResolver};
//! use courier_domain::{Variable, VariableType};
//!
//! struct Epoch;
//!
//! impl Clock for Epoch {
//!     fn now(&self) -> DateTime<Utc> {
//!         DateTime::UNIX_EPOCH
//!     }
//! }
//!
//! let resolver = VariableResolver::new(Arc::new(Epoch), ResolveOptions::default());
//! let variables = [
//!     Variable::new("t", VariableType::Timestamp),
//!     Variable::new("b", VariableType::Base64Text).with_data("aGk="),
//! ];
//!
//! let result = resolver.resolve("at={{timestamp:t}} body={{base64-text:b}}", &variables);
//! assert_eq!(result.resolved, "at=0 body=aGk=");
//! assert!(result.is_complete);
//! ```

pub mod builtins;
pub mod engine;

pub use builtins::GeneratedValues;
pub use engine::{
    DEFAULT_MIME_TYPE, ResolutionResult, ResolveOptions, VariableResolver, resolve_variables,
};
