//! Variable registry
//!
//! Holds the variables referenced by the current document. After every edit
//! the registry is reconciled against the document's markers: variables no
//! marker references are pruned, and markers with unknown ids are adopted as
//! unconfigured variables.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::marker::parse_markers;
use crate::variable::Variable;

/// Outcome of reconciling the registry with a document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistryDiff {
    /// Variables removed because no marker references them.
    pub pruned: Vec<Variable>,
    /// Ids added because a marker referenced an unknown variable.
    pub adopted: Vec<String>,
}

impl RegistryDiff {
    /// Returns true if the registry changed.
    #[must_use]
    pub fn is_changed(&self) -> bool {
        !self.pruned.is_empty() || !self.adopted.is_empty()
    }
}

/// Ordered collection of variables keyed by id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VariableRegistry {
    variables: Vec<Variable>,
}

impl VariableRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            variables: Vec::new(),
        }
    }

    /// Creates a registry from a list, keeping the last entry for duplicate ids.
    #[must_use]
    pub fn from_variables(variables: impl IntoIterator<Item = Variable>) -> Self {
        let mut registry = Self::new();
        for variable in variables {
            registry.upsert(variable);
        }
        registry
    }

    /// Returns the variable with the given id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Variable> {
        self.variables.iter().find(|v| v.id == id)
    }

    /// Returns a mutable reference to the variable with the given id.
    pub fn get_mut(&mut self, id: &str) -> Option<&mut Variable> {
        self.variables.iter_mut().find(|v| v.id == id)
    }

    /// Returns true if a variable with the id is registered.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Inserts a variable, replacing any existing one with the same id.
    pub fn upsert(&mut self, variable: Variable) {
        if let Some(existing) = self.get_mut(&variable.id) {
            *existing = variable;
        } else {
            self.variables.push(variable);
        }
    }

    /// Removes every variable whose id is not in `referenced`.
    pub fn prune(&mut self, referenced: &BTreeSet<String>) -> Vec<Variable> {
        let (kept, pruned): (Vec<_>, Vec<_>) = std::mem::take(&mut self.variables)
            .into_iter()
            .partition(|v| referenced.contains(&v.id));
        self.variables = kept;
        pruned
    }

    /// Reconciles the registry with the markers of `document`.
    pub fn sync_with_document(&mut self, document: &str) -> RegistryDiff {
        let markers = parse_markers(document);
        let referenced: BTreeSet<String> = markers.iter().map(|m| m.id.clone()).collect();

        let pruned = self.prune(&referenced);

        let mut adopted = Vec::new();
        for marker in markers {
            if !self.contains(&marker.id) {
                adopted.push(marker.id.clone());
                self.variables.push(Variable::new(marker.id, marker.variable_type));
            }
        }

        RegistryDiff { pruned, adopted }
    }

    /// Ids of all registered variables.
    #[must_use]
    pub fn ids(&self) -> BTreeSet<String> {
        self.variables.iter().map(|v| v.id.clone()).collect()
    }

    /// Iterates over the variables in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, Variable> {
        self.variables.iter()
    }

    /// The variables as a slice.
    #[must_use]
    pub fn as_slice(&self) -> &[Variable] {
        &self.variables
    }

    /// Number of registered variables.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.variables.len()
    }

    /// Returns true if no variables are registered.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }
}

impl<'a> IntoIterator for &'a VariableRegistry {
    type Item = &'a Variable;
    type IntoIter = std::slice::Iter<'a, Variable>;

    fn into_iter(self) -> Self::IntoIter {
        self.variables.iter()
    }
}
