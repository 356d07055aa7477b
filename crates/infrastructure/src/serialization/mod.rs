//! Deterministic JSON serialization for Courier files.
//!
//! Settings and variable files are written with:
//! - 2-space indentation
//! - Trailing newline
//! - UTF-8 encoding without BOM

mod json;

pub use json::*;
