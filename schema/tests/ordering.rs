//! Resolution is independent of authoring order.

#![allow(clippy::unwrap_used)]

use biograph_ontology::{OntologyTerm, TermGraph};
use biograph_schema::{
    CatalogOptions, ClassSpec, OneOrMany, OrderingPolicy, SchemaCatalog, SchemaConfig,
};
use proptest::prelude::*;

fn graph() -> TermGraph {
    TermGraph::build(
        vec![
            OntologyTerm::new("entity", "entity"),
            OntologyTerm::new("named thing", "named thing").with_parent("entity"),
            OntologyTerm::new("gene", "gene").with_parent("named thing"),
            OntologyTerm::new("chemical", "chemical").with_parent("named thing"),
        ],
        "entity",
    )
    .unwrap()
}

fn specs() -> Vec<(String, ClassSpec)> {
    let is_a = |parents: &[&str]| ClassSpec {
        is_a: Some(if parents.len() == 1 {
            OneOrMany::One(parents[0].to_owned())
        } else {
            OneOrMany::Many(parents.iter().map(|p| (*p).to_owned()).collect())
        }),
        ..ClassSpec::default()
    };
    vec![
        ("gene".to_owned(), ClassSpec::default()),
        ("coding gene".to_owned(), is_a(&["gene"])),
        ("kinase gene".to_owned(), is_a(&["coding gene"])),
        ("drug".to_owned(), is_a(&["small molecule", "chemical"])),
        ("antibiotic".to_owned(), is_a(&["drug"])),
        (
            "synonymous".to_owned(),
            ClassSpec {
                synonym_for: Some("kinase gene".to_owned()),
                ..ClassSpec::default()
            },
        ),
    ]
}

fn chains(config: SchemaConfig, ordering: OrderingPolicy) -> Vec<(String, Vec<String>)> {
    let catalog = SchemaCatalog::build(&graph(), &config, CatalogOptions::new(ordering)).unwrap();
    let mut out: Vec<_> = catalog
        .classes()
        .map(|c| (c.name.clone(), c.ancestors.clone()))
        .collect();
    out.sort();
    out
}

proptest! {
    #[test]
    fn shuffled_schemas_resolve_identically(
        shuffled in Just(specs()).prop_shuffle(),
        alphabetic in any::<bool>(),
    ) {
        let ordering = if alphabetic {
            OrderingPolicy::Alphabetic
        } else {
            OrderingPolicy::Specificity
        };
        let reference = chains(specs().into_iter().collect(), ordering);
        let permuted = chains(shuffled.into_iter().collect(), ordering);
        prop_assert_eq!(reference, permuted);
    }
}

#[test]
fn specificity_chain_for_deep_explicit_class() {
    let config: SchemaConfig = specs().into_iter().collect();
    let catalog =
        SchemaCatalog::build(&graph(), &config, CatalogOptions::new(OrderingPolicy::Specificity))
            .unwrap();
    assert_eq!(
        catalog.class("antibiotic").unwrap().ancestors,
        ["antibiotic", "drug", "small molecule", "chemical", "named thing", "entity"]
    );
    assert_eq!(
        catalog.class("synonymous").unwrap().ancestors,
        catalog.class("kinase gene").unwrap().ancestors
    );
}
