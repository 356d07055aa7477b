//! Text surface adapters

mod tree;

pub use tree::{CARET_ANCHOR, Cursor, Inline, Line, TreeSurface};
