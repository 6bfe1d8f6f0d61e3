//! Turtle 1.1 serializer for term hierarchies.
//!
//! Emits one `owl:Class` block per term (label and `rdfs:subClassOf` links),
//! one `owl:DatatypeProperty` block per declared property, and an
//! `owl:equivalentClass` block per synonym.

use std::collections::BTreeMap;

use super::{term_iri, xsd_range};
use crate::graph::TermGraph;
use crate::model::PropertyType;

/// Serializes `graph` to a Turtle string, minting IRIs under `base_iri`.
#[must_use]
pub fn to_turtle(graph: &TermGraph, base_iri: &str) -> String {
    let mut out = String::with_capacity(256 * graph.len());

    out.push_str("@prefix owl:  <http://www.w3.org/2002/07/owl#> .\n");
    out.push_str("@prefix rdf:  <http://www.w3.org/1999/02/22-rdf-syntax-ns#> .\n");
    out.push_str("@prefix rdfs: <http://www.w3.org/2000/01/rdf-schema#> .\n");
    out.push_str("@prefix xsd:  <http://www.w3.org/2001/XMLSchema#> .\n\n");

    out.push_str(&format!(
        "<{base_iri}>\n  a owl:Ontology ;\n  rdfs:label {} .\n\n",
        turtle_string(graph.root_id())
    ));

    // property name -> (range, domains)
    let mut properties: BTreeMap<&str, (PropertyType, Vec<String>)> = BTreeMap::new();

    for (idx, term) in graph.iter() {
        let subclasses: String = graph
            .parents(idx)
            .iter()
            .map(|&p| {
                format!(
                    "  rdfs:subClassOf <{}> ;\n",
                    term_iri(base_iri, &graph.term(p).id)
                )
            })
            .collect();
        let class_iri = term_iri(base_iri, &term.id);
        out.push_str(&format!(
            "<{class_iri}>\n  a owl:Class ;\n{subclasses}  rdfs:label {} .\n\n",
            turtle_string(&term.name)
        ));
        for (name, ty) in &term.properties {
            properties
                .entry(name.as_str())
                .or_insert_with(|| (*ty, Vec::new()))
                .1
                .push(class_iri.clone());
        }
    }

    for (name, (ty, domains)) in &properties {
        let domain_str: String = domains
            .iter()
            .map(|d| format!("  rdfs:domain <{d}> ;\n"))
            .collect();
        out.push_str(&format!(
            "<{}>\n  a owl:DatatypeProperty ;\n  rdfs:label {} ;\n{domain_str}  rdfs:range <{}> .\n\n",
            term_iri(base_iri, name),
            turtle_string(name),
            xsd_range(*ty)
        ));
    }

    for synonym in graph.synonyms() {
        let target = synonym.synonym_for.as_deref().unwrap_or_default();
        out.push_str(&format!(
            "<{}>\n  owl:equivalentClass <{}> ;\n  rdfs:label {} .\n\n",
            term_iri(base_iri, &synonym.id),
            term_iri(base_iri, target),
            turtle_string(&synonym.name)
        ));
    }

    out
}

fn turtle_string(s: &str) -> String {
    let escaped = s
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
        .replace('\r', "\\r");
    format!("\"{escaped}\"")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::OntologyTerm;

    const BASE: &str = "https://example.org/bio/";

    fn graph() -> TermGraph {
        TermGraph::build(
            vec![
                OntologyTerm::new("entity", "entity"),
                OntologyTerm::new("gene", "gene")
                    .with_parent("entity")
                    .with_property("symbol", PropertyType::STR),
                OntologyTerm::new("locus", "locus").synonym_of("gene"),
            ],
            "entity",
        )
        .unwrap()
    }

    #[test]
    fn declares_prefixes_and_classes() {
        let turtle = to_turtle(&graph(), BASE);
        assert!(turtle.contains("@prefix owl:"));
        assert!(turtle.contains("<https://example.org/bio/gene>\n  a owl:Class ;"));
        assert!(turtle.contains("rdfs:subClassOf <https://example.org/bio/entity>"));
    }

    #[test]
    fn emits_property_and_synonym_blocks() {
        let turtle = to_turtle(&graph(), BASE);
        assert!(turtle.contains("<https://example.org/bio/symbol>\n  a owl:DatatypeProperty"));
        assert!(turtle.contains("rdfs:range <http://www.w3.org/2001/XMLSchema#string>"));
        assert!(turtle.contains("owl:equivalentClass <https://example.org/bio/gene>"));
    }

    #[test]
    fn escapes_quotes_in_labels() {
        assert_eq!(turtle_string("5\" cap"), "\"5\\\" cap\"");
    }

    #[test]
    fn escapes_line_breaks_in_labels() {
        assert_eq!(turtle_string("a\r\nb"), "\"a\\r\\nb\"");
    }
}
