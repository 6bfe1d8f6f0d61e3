//! Translating record streams against a resolved schema.

#![allow(clippy::unwrap_used)]

use std::collections::BTreeMap;

use biograph_ontology::{OntologyTerm, PropertyType, TermGraph};
use biograph_schema::{CatalogOptions, ClassResolver, OrderingPolicy, SchemaCatalog, SchemaConfig};
use biograph_translate::{
    relationship_id, EdgeRecord, EntityKind, EntityTranslator, GraphEntity, NodeRecord,
    Properties, PropertyValue, Record, TranslationTally, TranslatorConfig,
};
use proptest::prelude::*;

const SCHEMA: &str = r"
protein:
  preferred_id: [uniprot, entrez]
  input_label: [uniprot_protein, entrez_protein]
  properties:
    sequence: str
    mass: int
    reviewed: bool
complex:
  synonym_for: macromolecular complex
  input_label: complex
gene to disease association:
  represented_as: edge
  input_label: gene_disease
  source: gene
  target: disease
  properties:
    score: float
    evidence: str[]
";

fn resolver() -> ClassResolver {
    let graph = TermGraph::build(
        vec![
            OntologyTerm::new("entity", "entity"),
            OntologyTerm::new("named thing", "named thing").with_parent("entity"),
            OntologyTerm::new("protein", "protein").with_parent("named thing"),
            OntologyTerm::new("gene", "gene").with_parent("named thing"),
            OntologyTerm::new("disease", "disease").with_parent("named thing"),
            OntologyTerm::new("macromolecular complex", "macromolecular complex")
                .with_parent("named thing")
                .with_property("members", PropertyType::STR),
            OntologyTerm::new("association", "association").with_parent("entity"),
            OntologyTerm::new("gene to disease association", "gene to disease association")
                .with_parent("association"),
        ],
        "entity",
    )
    .unwrap();
    let config = SchemaConfig::from_yaml_str(SCHEMA).unwrap();
    let catalog =
        SchemaCatalog::build(&graph, &config, CatalogOptions::new(OrderingPolicy::Specificity))
            .unwrap();
    ClassResolver::new(&catalog).unwrap()
}

fn run(resolver: &ClassResolver, records: Vec<Record>) -> (Vec<GraphEntity>, TranslationTally) {
    let mut translator = EntityTranslator::new(resolver, TranslatorConfig::default());
    let entities = translator.translate_stream(records).collect();
    (entities, translator.into_tally())
}

fn property_value() -> impl Strategy<Value = PropertyValue> {
    prop_oneof![
        Just(PropertyValue::Absent),
        any::<bool>().prop_map(PropertyValue::Bool),
        any::<i64>().prop_map(PropertyValue::Int),
        (-1.0e6..1.0e6).prop_map(PropertyValue::Float),
        "[a-z0-9|]{0,8}".prop_map(PropertyValue::Str),
    ]
}

fn supplied() -> impl Strategy<Value = Properties> {
    let key = prop_oneof![
        Just("sequence".to_owned()),
        Just("mass".to_owned()),
        Just("reviewed".to_owned()),
        Just("score".to_owned()),
        Just("evidence".to_owned()),
        "[a-z]{1,6}",
    ];
    proptest::collection::btree_map(key, property_value(), 0..6)
}

proptest! {
    #[test]
    fn entities_of_a_class_share_one_key_set(
        rows in proptest::collection::vec(
            (prop_oneof![Just("uniprot_protein"), Just("entrez_protein")], supplied()),
            1..20,
        )
    ) {
        let resolver = resolver();
        let records = rows
            .into_iter()
            .enumerate()
            .map(|(i, (label, properties))| {
                Record::Node(NodeRecord { id: format!("P{i}"), label: label.to_owned(), properties })
            })
            .collect();
        let (entities, tally) = run(&resolver, records);
        prop_assert_eq!(entities.len(), tally.records);

        let mut shapes: BTreeMap<&str, _> = BTreeMap::new();
        for entity in &entities {
            let keys = entity.key_set();
            let first = shapes.entry(entity.class.as_str()).or_insert_with(|| keys.clone());
            prop_assert_eq!(&*first, &keys);
        }
    }

    #[test]
    fn generated_edge_ids_depend_only_on_content(
        source in "[A-Z]{2}:[0-9]{1,5}",
        target in "[A-Z]{2}:[0-9]{1,5}",
        properties in supplied(),
    ) {
        let resolver = resolver();
        let record = EdgeRecord {
            id: None,
            source: source.clone(),
            target: target.clone(),
            label: "gene_disease".to_owned(),
            properties: properties.clone(),
        };
        let (first, _) = run(&resolver, vec![record.clone().into()]);
        let (second, _) = run(&resolver, vec![record.into()]);
        prop_assert_eq!(first.len(), 1);
        prop_assert_eq!(&first[0].id, &second[0].id);
        prop_assert_eq!(first[0].id.clone(), Some(relationship_id(&source, &target, &properties)));
    }
}

#[test]
fn paired_labels_route_to_distinct_implicit_classes() {
    let resolver = resolver();
    let (entities, _) = run(
        &resolver,
        vec![
            NodeRecord::new("P04637", "uniprot_protein").into(),
            NodeRecord::new("7157", "entrez_protein").into(),
        ],
    );
    assert_eq!(
        entities[0].labels,
        ["uniprot.protein", "protein", "named thing", "entity"]
    );
    assert_eq!(entities[0].preferred_id.as_deref(), Some("uniprot"));
    assert_eq!(entities[1].class, "entrez.protein");
    assert_eq!(entities[0].key_set(), entities[1].key_set());
}

#[test]
fn synonym_entities_carry_the_target_chain() {
    let resolver = resolver();
    let (entities, _) = run(
        &resolver,
        vec![NodeRecord::new("CPX-1", "complex").with("members", "A|B").into()],
    );
    assert_eq!(entities[0].class, "complex");
    assert_eq!(
        entities[0].labels,
        ["macromolecular complex", "named thing", "entity"]
    );
    assert_eq!(entities[0].properties["members"], PropertyValue::from("A|B"));
}

#[test]
fn unaccounted_labels_are_dropped_and_reported() {
    let resolver = resolver();
    let (entities, tally) = run(
        &resolver,
        vec![
            NodeRecord::new("P1", "uniprot_protein").into(),
            NodeRecord::new("X1", "mystery").into(),
            EdgeRecord::new("a", "b", "mystery_link").into(),
            NodeRecord::new("X2", "mystery").into(),
        ],
    );
    assert_eq!(entities.len(), 1);
    assert_eq!(tally.records, 4);
    assert_eq!(tally.unaccounted["mystery"].count, 2);
    assert_eq!(tally.unaccounted["mystery"].examples, ["X1", "X2"]);
    assert_eq!(tally.unaccounted["mystery_link"].examples, ["a->b"]);
    assert_eq!(
        tally.unused_schema_entries(&resolver),
        ["entrez.protein", "complex", "gene to disease association"]
    );
}

#[test]
fn edge_properties_are_coerced() {
    let resolver = resolver();
    let (entities, _) = run(
        &resolver,
        vec![EdgeRecord::new("HGNC:1100", "MONDO:0007254", "gene_disease")
            .with("score", "0.75")
            .with("evidence", "ECO:1|ECO:2")
            .into()],
    );
    let edge = &entities[0];
    assert!(matches!(edge.kind, EntityKind::Edge { .. }));
    assert_eq!(edge.properties["score"], PropertyValue::Float(0.75));
    assert_eq!(
        edge.properties["evidence"],
        PropertyValue::List(vec!["ECO:1".into(), "ECO:2".into()])
    );
}

#[test]
fn workers_share_one_resolver() {
    let resolver = resolver();
    let slices: Vec<Vec<Record>> = (0..4)
        .map(|w| {
            (0..25)
                .map(|i| {
                    let label = if i % 5 == 0 { "mystery" } else { "uniprot_protein" };
                    NodeRecord::new(format!("w{w}-{i}"), label).into()
                })
                .collect()
        })
        .collect();

    let tallies: Vec<TranslationTally> = std::thread::scope(|scope| {
        let handles: Vec<_> = slices
            .into_iter()
            .map(|slice| {
                let resolver = &resolver;
                scope.spawn(move || run(resolver, slice).1)
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    let mut total = TranslationTally::default();
    for tally in tallies {
        total.merge(tally);
    }
    assert_eq!(total.records, 100);
    assert_eq!(total.emitted, 80);
    assert_eq!(total.unaccounted["mystery"].count, 20);
    assert_eq!(total.exercised["uniprot.protein"], 80);
}
