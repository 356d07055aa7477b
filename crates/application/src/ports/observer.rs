//! Owning-form notification port.

use courier_domain::Variable;

/// Receives the editor's canonical state after every internal mutation.
///
/// The owning form is the source of truth for both the document and the
/// variable list; it feeds them back through
/// [`EditorController::set_props`](crate::editor::EditorController::set_props).
pub trait EditorObserver {
    /// Called with the new canonical document.
    fn on_change(&mut self, document: &str);

    /// Called whenever a variable is added, updated or pruned.
    fn on_variables_change(&mut self, variables: &[Variable]);
}
