//! JSON-LD 1.1 serializer for term hierarchies.
//!
//! Produces a single document with a `@context` (standard prefixes plus a
//! `term` prefix bound to the base IRI) and a flat `@graph`.

use serde_json::{json, Map, Value};

use super::{term_iri, xsd_range};
use crate::graph::TermGraph;

/// Serializes `graph` to a JSON-LD `Value`, minting IRIs under `base_iri`.
///
/// The returned value can be pretty-printed with [`serde_json::to_string_pretty`].
#[must_use]
pub fn to_json_ld(graph: &TermGraph, base_iri: &str) -> Value {
    json!({
        "@context": build_context(base_iri),
        "@graph": build_graph(graph, base_iri)
    })
}

fn build_context(base_iri: &str) -> Value {
    let mut ctx = Map::new();
    ctx.insert("owl".to_owned(), json!("http://www.w3.org/2002/07/owl#"));
    ctx.insert("rdf".to_owned(), json!("http://www.w3.org/1999/02/22-rdf-syntax-ns#"));
    ctx.insert("rdfs".to_owned(), json!("http://www.w3.org/2000/01/rdf-schema#"));
    ctx.insert("xsd".to_owned(), json!("http://www.w3.org/2001/XMLSchema#"));
    ctx.insert("term".to_owned(), json!(base_iri));
    Value::Object(ctx)
}

fn build_graph(graph: &TermGraph, base_iri: &str) -> Value {
    let mut nodes: Vec<Value> = Vec::with_capacity(graph.len() + 1);

    nodes.push(json!({
        "@id": base_iri,
        "@type": "owl:Ontology",
        "rdfs:label": graph.root_id()
    }));

    for (idx, term) in graph.iter() {
        let class_iri = term_iri(base_iri, &term.id);
        let subclass_of: Vec<Value> = graph
            .parents(idx)
            .iter()
            .map(|&p| json!({ "@id": term_iri(base_iri, &graph.term(p).id) }))
            .collect();
        nodes.push(json!({
            "@id": class_iri,
            "@type": "owl:Class",
            "rdfs:label": term.name,
            "rdfs:subClassOf": subclass_of
        }));
        for (name, ty) in &term.properties {
            nodes.push(json!({
                "@id": term_iri(base_iri, name),
                "@type": "owl:DatatypeProperty",
                "rdfs:label": name,
                "rdfs:domain": { "@id": class_iri },
                "rdfs:range": { "@id": xsd_range(*ty) }
            }));
        }
    }

    for synonym in graph.synonyms() {
        let target = synonym.synonym_for.as_deref().unwrap_or_default();
        nodes.push(json!({
            "@id": term_iri(base_iri, &synonym.id),
            "rdfs:label": synonym.name,
            "owl:equivalentClass": { "@id": term_iri(base_iri, target) }
        }));
    }

    Value::Array(nodes)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::model::OntologyTerm;

    fn graph() -> TermGraph {
        TermGraph::build(
            vec![
                OntologyTerm::new("entity", "entity"),
                OntologyTerm::new("gene", "gene").with_parent("entity"),
            ],
            "entity",
        )
        .unwrap()
    }

    #[test]
    fn produces_context_and_graph() {
        let json = to_json_ld(&graph(), "https://example.org/");
        assert!(json["@context"].is_object());
        assert_eq!(json["@context"]["term"], "https://example.org/");
        assert!(json["@graph"].is_array());
    }

    #[test]
    fn all_nodes_have_ids() {
        let json = to_json_ld(&graph(), "https://example.org/");
        let nodes = json["@graph"].as_array().expect("@graph must be array");
        assert_eq!(nodes.len(), 3);
        for (i, node) in nodes.iter().enumerate() {
            assert!(!node["@id"].is_null(), "node at index {i} is missing @id");
        }
        assert_eq!(
            nodes[2]["rdfs:subClassOf"][0]["@id"],
            "https://example.org/entity"
        );
    }
}
