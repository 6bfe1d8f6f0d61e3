//! Hierarchy view of the classes a run exercised.

use biograph_ontology::{render, serializer, GraphError, TermGraph};
use biograph_schema::SchemaCatalog;
use biograph_translate::TranslationTally;
use serde_json::Value;

/// The part of the extended term graph that holds the exercised classes and
/// their ancestors.
#[derive(Debug, Clone)]
pub struct HierarchyTree {
    graph: TermGraph,
    classes: Vec<String>,
}

impl HierarchyTree {
    /// Tree of every class that produced at least one entity.
    ///
    /// # Errors
    ///
    /// Returns a [`GraphError`] only if the pruned graph fails revalidation.
    pub fn exercised(
        catalog: &SchemaCatalog,
        tally: &TranslationTally,
    ) -> Result<Self, GraphError> {
        Self::for_classes(catalog, tally.exercised.keys().map(String::as_str))
    }

    /// Tree of the named classes; unknown names are skipped.
    ///
    /// # Errors
    ///
    /// Returns a [`GraphError`] only if the pruned graph fails revalidation.
    pub fn for_classes<'a>(
        catalog: &SchemaCatalog,
        names: impl IntoIterator<Item = &'a str>,
    ) -> Result<Self, GraphError> {
        let graph = catalog.graph();
        let mut classes = Vec::new();
        let mut seeds = Vec::new();
        for name in names {
            let Some(class) = catalog.class(name) else {
                continue;
            };
            if let Some(idx) = graph.lookup(&class.term) {
                seeds.push(idx);
                classes.push(class.name.clone());
            }
        }
        Ok(Self {
            graph: graph.subgraph(seeds)?,
            classes,
        })
    }

    /// The pruned graph.
    #[must_use]
    pub fn graph(&self) -> &TermGraph {
        &self.graph
    }

    /// Classes the tree was seeded with.
    #[must_use]
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    /// Box-drawing text tree.
    #[must_use]
    pub fn to_text(&self) -> String {
        render::text_tree(&self.graph)
    }

    /// Nested `{id, name, children}` JSON.
    #[must_use]
    pub fn to_json(&self) -> Value {
        render::json_tree(&self.graph)
    }

    /// Turtle with `rdfs:subClassOf` edges under `base_iri`.
    #[must_use]
    pub fn to_turtle(&self, base_iri: &str) -> String {
        serializer::turtle::to_turtle(&self.graph, base_iri)
    }
}
