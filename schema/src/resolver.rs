//! Input-label routing.

use std::sync::Arc;

use indexmap::IndexMap;
use tracing::debug;

use crate::catalog::{ResolvedClass, SchemaCatalog, SchemaError};

/// Immutable input-label → class table.
///
/// Built once from a [`SchemaCatalog`]; `Send + Sync`, so translator workers
/// share one resolver by reference or `Arc`.
#[derive(Debug, Clone)]
pub struct ClassResolver {
    by_label: IndexMap<String, Arc<ResolvedClass>>,
    classes: Vec<Arc<ResolvedClass>>,
}

impl ClassResolver {
    /// Builds the label table.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::AmbiguousLabel`] when two distinct classes
    /// claim the same input label.
    pub fn new(catalog: &SchemaCatalog) -> Result<Self, SchemaError> {
        let mut by_label: IndexMap<String, Arc<ResolvedClass>> = IndexMap::new();
        for class in catalog.classes() {
            for label in &class.input_labels {
                if let Some(existing) = by_label.get(label) {
                    if existing.name != class.name {
                        return Err(SchemaError::AmbiguousLabel {
                            label: label.clone(),
                            first: existing.name.clone(),
                            second: class.name.clone(),
                        });
                    }
                    continue;
                }
                debug!(label = %label, class = %class.name, "routing label");
                by_label.insert(label.clone(), Arc::clone(class));
            }
        }
        Ok(Self {
            by_label,
            classes: catalog.classes().cloned().collect(),
        })
    }

    /// Returns the class routed to `label`.
    #[must_use]
    pub fn resolve(&self, label: &str) -> Option<&Arc<ResolvedClass>> {
        self.by_label.get(label)
    }

    /// All routed labels, in catalog order.
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.by_label.keys().map(String::as_str)
    }

    /// Every resolved class, routed or not.
    #[must_use]
    pub fn classes(&self) -> &[Arc<ResolvedClass>] {
        &self.classes
    }

    /// Classes reachable through at least one label.
    pub fn routed_classes(&self) -> impl Iterator<Item = &Arc<ResolvedClass>> {
        self.classes.iter().filter(|c| !c.input_labels.is_empty())
    }

    /// Number of routed labels.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_label.len()
    }

    /// True when no label is routed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_label.is_empty()
    }
}
