//! Property tests over randomly generated term DAGs.

#![allow(clippy::unwrap_used)]

use std::collections::HashSet;

use biograph_ontology::{GraphError, OntologyTerm, TermGraph};
use proptest::prelude::*;

/// Term `t{i}` picks parents among `t0..t{i}`; `t0` is the root.
fn dag_terms() -> impl Strategy<Value = Vec<OntologyTerm>> {
    (2usize..24)
        .prop_flat_map(|n| {
            let parent_lists: Vec<_> = (1..n)
                .map(|i| proptest::collection::vec(0..i, 1..=3.min(i)))
                .collect();
            parent_lists
        })
        .prop_map(|parent_lists| {
            let mut terms = vec![OntologyTerm::new("t0", "term 0")];
            for (offset, parents) in parent_lists.into_iter().enumerate() {
                let i = offset + 1;
                let mut term = OntologyTerm::new(format!("t{i}"), format!("term {i}"));
                for p in parents {
                    term = term.with_parent(format!("t{p}"));
                }
                terms.push(term);
            }
            terms
        })
}

proptest! {
    #[test]
    fn ancestors_are_unique_and_end_at_root(terms in dag_terms()) {
        let graph = TermGraph::build(terms, "t0").unwrap();
        for (idx, _) in graph.iter() {
            let ancestors = graph.ancestors(idx);
            let unique: HashSet<_> = ancestors.iter().collect();
            prop_assert_eq!(unique.len(), ancestors.len());
            prop_assert!(ancestors.contains(&graph.root()));
            prop_assert_eq!(ancestors[0], idx);
        }
    }

    #[test]
    fn depth_exceeds_every_parent_depth(terms in dag_terms()) {
        let graph = TermGraph::build(terms, "t0").unwrap();
        for (idx, _) in graph.iter() {
            for &parent in graph.parents(idx) {
                prop_assert!(graph.depth(idx) > graph.depth(parent));
            }
        }
    }

    #[test]
    fn input_order_does_not_matter(terms in dag_terms()) {
        let forward = TermGraph::build(terms.clone(), "t0").unwrap();
        let mut reversed_terms = terms;
        reversed_terms.reverse();
        let reversed = TermGraph::build(reversed_terms, "t0").unwrap();
        for (idx, term) in forward.iter() {
            let other = reversed.lookup(&term.id).unwrap();
            prop_assert_eq!(forward.depth(idx), reversed.depth(other));
            prop_assert_eq!(forward.ancestors(idx).len(), reversed.ancestors(other).len());
        }
    }

    #[test]
    fn back_edge_is_always_a_cycle(terms in dag_terms()) {
        // hang the root below the last term
        let last = terms.len() - 1;
        let mut terms = terms;
        terms[0] = OntologyTerm::new("t0", "term 0").with_parent(format!("t{last}"));
        let err = TermGraph::build(terms, "t0").unwrap_err();
        prop_assert!(matches!(err, GraphError::Cycle { .. }), "unexpected error {err:?}");
    }
}
