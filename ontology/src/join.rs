//! Fusing several term graphs at named join points.
//!
//! A head graph receives subtrees cut out of tail graphs. Each [`JoinSpec`]
//! names a head term, a tail source and a tail term; the tail term and all of
//! its descendants are grafted onto the head, either as a child of the head
//! term or unified with it.

use std::collections::HashSet;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::graph::{GraphError, TermGraph};
use crate::model::OntologyTerm;

/// One join point between the head graph and a tail graph.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JoinSpec {
    /// Head term id or name.
    pub head: String,
    /// Key of the tail graph registered with [`TermGraphJoiner::with_tail`].
    pub tail_source: String,
    /// Tail term id or name; the root of the grafted subtree.
    pub tail: String,
    /// Unify the tail term with the head term instead of attaching it below.
    #[serde(default)]
    pub merge: bool,
}

impl JoinSpec {
    /// Attaches `tail` (from `tail_source`) as a child of `head`.
    pub fn attach(
        head: impl Into<String>,
        tail_source: impl Into<String>,
        tail: impl Into<String>,
    ) -> Self {
        Self {
            head: head.into(),
            tail_source: tail_source.into(),
            tail: tail.into(),
            merge: false,
        }
    }

    /// Unifies `tail` (from `tail_source`) with `head`.
    pub fn merge(
        head: impl Into<String>,
        tail_source: impl Into<String>,
        tail: impl Into<String>,
    ) -> Self {
        Self {
            merge: true,
            ..Self::attach(head, tail_source, tail)
        }
    }
}

/// Errors raised while joining graphs.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum JoinError {
    /// The head term is not in the (partially joined) head graph.
    #[error("join head term `{head}` not found")]
    MissingHeadTerm {
        /// Requested head term.
        head: String,
    },
    /// No tail graph is registered under this key.
    #[error("unknown tail ontology `{tail_source}`")]
    UnknownTailSource {
        /// Requested tail source key.
        tail_source: String,
    },
    /// The tail term is not in its tail graph.
    #[error("join tail term `{tail}` not found in `{tail_source}`")]
    MissingTailTerm {
        /// Tail source key.
        tail_source: String,
        /// Requested tail term.
        tail: String,
    },
    /// The joined graph failed validation, e.g. joins introduced a cycle.
    #[error(transparent)]
    Graph(#[from] GraphError),
}

/// Combines a head graph with subtrees of registered tail graphs.
#[derive(Debug, Clone)]
pub struct TermGraphJoiner {
    head: TermGraph,
    tails: IndexMap<String, TermGraph>,
}

impl TermGraphJoiner {
    /// Starts from `head`, whose root becomes the root of the joined graph.
    #[must_use]
    pub fn new(head: TermGraph) -> Self {
        Self {
            head,
            tails: IndexMap::new(),
        }
    }

    /// Registers a tail graph under `source`.
    #[must_use]
    pub fn with_tail(mut self, source: impl Into<String>, graph: TermGraph) -> Self {
        self.tails.insert(source.into(), graph);
        self
    }

    /// Applies `joins` in order and returns the validated combined graph.
    ///
    /// # Errors
    ///
    /// Returns [`JoinError`] when a head term, tail source or tail term is
    /// missing, or when the combined graph is invalid (notably cyclic).
    pub fn join(&self, joins: &[JoinSpec]) -> Result<TermGraph, JoinError> {
        let (synonyms, terms): (Vec<OntologyTerm>, Vec<OntologyTerm>) = self
            .head
            .to_terms()
            .into_iter()
            .partition(|t| t.synonym_for.is_some());
        let mut combined: IndexMap<String, OntologyTerm> =
            terms.into_iter().map(|t| (t.id.clone(), t)).collect();
        let mut synonyms: IndexMap<String, OntologyTerm> =
            synonyms.into_iter().map(|t| (t.id.clone(), t)).collect();

        for spec in joins {
            let head_id = find_head(&combined, &synonyms, &spec.head).ok_or_else(|| {
                JoinError::MissingHeadTerm {
                    head: spec.head.clone(),
                }
            })?;
            let tail_graph =
                self.tails
                    .get(&spec.tail_source)
                    .ok_or_else(|| JoinError::UnknownTailSource {
                        tail_source: spec.tail_source.clone(),
                    })?;
            let tail_idx =
                tail_graph
                    .lookup(&spec.tail)
                    .ok_or_else(|| JoinError::MissingTailTerm {
                        tail_source: spec.tail_source.clone(),
                        tail: spec.tail.clone(),
                    })?;
            let tail_id = tail_graph.term(tail_idx).id.clone();

            let subtree = tail_graph.descendants(tail_idx);
            let inside: HashSet<&str> = subtree
                .iter()
                .map(|&i| tail_graph.term(i).id.as_str())
                .collect();
            let rename = |id: &str| -> String {
                if spec.merge && id == tail_id {
                    head_id.clone()
                } else {
                    id.to_owned()
                }
            };

            let mut added = 0usize;
            for &idx in &subtree {
                let mut term = tail_graph.term(idx).clone();
                if idx == tail_idx {
                    term.parents = if spec.merge {
                        Vec::new()
                    } else {
                        vec![head_id.clone()]
                    };
                    term.id = rename(&term.id);
                } else {
                    term.parents = term
                        .parents
                        .iter()
                        .filter(|p| inside.contains(p.as_str()))
                        .map(|p| rename(p))
                        .collect();
                }
                if idx == tail_idx && spec.merge {
                    // head keeps its name and wins property conflicts
                    if let Some(existing) = combined.get_mut(&head_id) {
                        existing.absorb(term);
                    }
                } else if let Some(existing) = combined.get_mut(&term.id) {
                    debug!(id = %term.id, "tail term already present; unifying");
                    existing.absorb(term);
                } else {
                    combined.insert(term.id.clone(), term);
                    added += 1;
                }
            }

            for synonym in tail_graph.synonyms() {
                let target = synonym.synonym_for.as_deref().unwrap_or_default();
                if inside.contains(target) && !synonyms.contains_key(&synonym.id) {
                    let mut synonym = synonym.clone();
                    synonym.synonym_for = Some(rename(target));
                    synonyms.insert(synonym.id.clone(), synonym);
                }
            }

            info!(
                head = %head_id,
                tail = %tail_id,
                tail_source = %spec.tail_source,
                merge = spec.merge,
                added,
                "joined ontology subtree"
            );
        }

        let graph = TermGraph::build(
            combined.into_values().chain(synonyms.into_values()),
            self.head.root_id(),
        )?;
        Ok(graph)
    }
}

fn find_head(
    combined: &IndexMap<String, OntologyTerm>,
    synonyms: &IndexMap<String, OntologyTerm>,
    key: &str,
) -> Option<String> {
    if combined.contains_key(key) {
        return Some(key.to_owned());
    }
    if let Some(term) = combined.values().find(|t| t.name == key) {
        return Some(term.id.clone());
    }
    synonyms
        .values()
        .find(|s| s.name == key)
        .and_then(|s| s.synonym_for.as_deref())
        .and_then(|target| find_head(combined, &IndexMap::new(), target))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::PropertyType;

    fn term(id: &str, name: &str, parents: &[&str]) -> OntologyTerm {
        parents
            .iter()
            .fold(OntologyTerm::new(id, name), |t, p| t.with_parent(*p))
    }

    fn head() -> TermGraph {
        TermGraph::build(
            vec![
                term("BL:entity", "entity", &[]),
                term("BL:variant", "sequence variant", &["BL:entity"])
                    .with_property("hgvs", PropertyType::STR),
                term("BL:snv", "snv", &["BL:variant"]),
            ],
            "BL:entity",
        )
        .unwrap()
    }

    fn so() -> TermGraph {
        TermGraph::build(
            vec![
                term("SO:0000110", "sequence_feature", &[]),
                term("SO:0001060", "sequence_variant", &["SO:0000110"])
                    .with_property("hgvs", PropertyType::Scalar(crate::model::ScalarType::Int))
                    .with_property("consequence", PropertyType::STR),
                term("SO:0001583", "missense_variant", &["SO:0001060"]),
                term("SO:0001587", "stop_gained", &["SO:0001060"]),
            ],
            "SO:0000110",
        )
        .unwrap()
    }

    #[test]
    fn merge_join_unions_children() {
        let joined = TermGraphJoiner::new(head())
            .with_tail("so", so())
            .join(&[JoinSpec::merge("sequence variant", "so", "sequence_variant")])
            .unwrap();

        let variant = joined.lookup("BL:variant").unwrap();
        let children: Vec<&str> = joined
            .children(variant)
            .iter()
            .map(|&c| joined.name(c))
            .collect();
        assert_eq!(children.len(), 3);
        for name in ["snv", "missense_variant", "stop_gained"] {
            assert!(children.contains(&name), "{name} missing from {children:?}");
        }
        // head name and head property declarations win
        assert_eq!(joined.name(variant), "sequence variant");
        let props = &joined.term(variant).properties;
        assert_eq!(props["hgvs"], PropertyType::STR);
        assert!(props.contains_key("consequence"));
        // tail graph's own ancestors do not come along
        assert!(joined.lookup("SO:0000110").is_none());
        assert!(joined.lookup("SO:0001060").is_none());
    }

    #[test]
    fn attach_join_keeps_tail_identity() {
        let joined = TermGraphJoiner::new(head())
            .with_tail("so", so())
            .join(&[JoinSpec::attach("BL:entity", "so", "SO:0001060")])
            .unwrap();
        let tail = joined.lookup("sequence_variant").unwrap();
        assert_eq!(joined.term(tail).parents, vec!["BL:entity"]);
        assert_eq!(joined.children(tail).len(), 2);
        assert_eq!(joined.depth(tail), 1);
    }

    #[test]
    fn missing_pieces_are_reported() {
        let joiner = TermGraphJoiner::new(head()).with_tail("so", so());
        assert_eq!(
            joiner.join(&[JoinSpec::attach("nope", "so", "SO:0001060")]),
            Err(JoinError::MissingHeadTerm {
                head: "nope".into()
            })
        );
        assert_eq!(
            joiner.join(&[JoinSpec::attach("BL:entity", "go", "SO:0001060")]),
            Err(JoinError::UnknownTailSource {
                tail_source: "go".into()
            })
        );
        assert!(matches!(
            joiner.join(&[JoinSpec::attach("BL:entity", "so", "SO:9999999")]),
            Err(JoinError::MissingTailTerm { .. })
        ));
    }

    #[test]
    fn joins_that_close_a_loop_are_cycles() {
        // second join hangs the head's own variant term below one of its new children
        let tail = TermGraph::build(
            vec![
                term("X:top", "top", &[]),
                term("BL:variant", "variant again", &["X:top"]),
            ],
            "X:top",
        )
        .unwrap();
        let err = TermGraphJoiner::new(head())
            .with_tail("x", tail)
            .join(&[JoinSpec::attach("BL:snv", "x", "X:top")])
            .unwrap_err();
        assert!(matches!(err, JoinError::Graph(GraphError::Cycle { .. })));
    }

    #[test]
    fn sequential_joins_on_the_same_head() {
        let other = TermGraph::build(vec![term("Y:indel", "indel", &[])], "Y:indel").unwrap();
        let joined = TermGraphJoiner::new(head())
            .with_tail("so", so())
            .with_tail("y", other)
            .join(&[
                JoinSpec::merge("BL:variant", "so", "SO:0001060"),
                JoinSpec::attach("BL:variant", "y", "Y:indel"),
            ])
            .unwrap();
        let variant = joined.lookup("BL:variant").unwrap();
        assert_eq!(joined.children(variant).len(), 4);
    }
}
