//! N-Triples serializer for term hierarchies.
//!
//! One triple per line, absolute IRIs only. Triples follow the graph's
//! topological order, so output is stable for a given input.

use super::{term_iri, xsd_range};
use crate::graph::TermGraph;

const OWL_CLASS: &str = "http://www.w3.org/2002/07/owl#Class";
const OWL_ONTOLOGY: &str = "http://www.w3.org/2002/07/owl#Ontology";
const OWL_DATATYPE_PROPERTY: &str = "http://www.w3.org/2002/07/owl#DatatypeProperty";
const OWL_EQUIVALENT_CLASS: &str = "http://www.w3.org/2002/07/owl#equivalentClass";
const RDFS_LABEL: &str = "http://www.w3.org/2000/01/rdf-schema#label";
const RDFS_SUBCLASS_OF: &str = "http://www.w3.org/2000/01/rdf-schema#subClassOf";
const RDFS_DOMAIN: &str = "http://www.w3.org/2000/01/rdf-schema#domain";
const RDFS_RANGE: &str = "http://www.w3.org/2000/01/rdf-schema#range";
const RDF_TYPE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#type";
const XSD_STRING: &str = "http://www.w3.org/2001/XMLSchema#string";

/// Serializes `graph` to an N-Triples string, minting IRIs under `base_iri`.
#[must_use]
pub fn to_ntriples(graph: &TermGraph, base_iri: &str) -> String {
    let mut out = String::with_capacity(192 * graph.len());

    triple(&mut out, base_iri, RDF_TYPE, &iri(OWL_ONTOLOGY));

    for (idx, term) in graph.iter() {
        let subject = term_iri(base_iri, &term.id);
        triple(&mut out, &subject, RDF_TYPE, &iri(OWL_CLASS));
        triple(&mut out, &subject, RDFS_LABEL, &lit(&term.name));
        for &parent in graph.parents(idx) {
            let object = term_iri(base_iri, &graph.term(parent).id);
            triple(&mut out, &subject, RDFS_SUBCLASS_OF, &iri(&object));
        }
        for (name, ty) in &term.properties {
            let property = term_iri(base_iri, name);
            triple(&mut out, &property, RDF_TYPE, &iri(OWL_DATATYPE_PROPERTY));
            triple(&mut out, &property, RDFS_DOMAIN, &iri(&subject));
            triple(&mut out, &property, RDFS_RANGE, &iri(&xsd_range(*ty)));
        }
    }

    for synonym in graph.synonyms() {
        let subject = term_iri(base_iri, &synonym.id);
        let target = term_iri(base_iri, synonym.synonym_for.as_deref().unwrap_or_default());
        triple(&mut out, &subject, OWL_EQUIVALENT_CLASS, &iri(&target));
        triple(&mut out, &subject, RDFS_LABEL, &lit(&synonym.name));
    }

    out
}

fn triple(out: &mut String, subj: &str, pred: &str, obj: &str) {
    out.push('<');
    out.push_str(subj);
    out.push_str("> <");
    out.push_str(pred);
    out.push_str("> ");
    out.push_str(obj);
    out.push_str(" .\n");
}

fn iri(s: &str) -> String {
    format!("<{s}>")
}

fn lit(s: &str) -> String {
    let escaped = s
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
        .replace('\r', "\\r");
    format!("\"{escaped}\"^^<{XSD_STRING}>")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::OntologyTerm;

    fn graph() -> TermGraph {
        TermGraph::build(
            vec![
                OntologyTerm::new("entity", "entity"),
                OntologyTerm::new("gene", "gene").with_parent("entity"),
                OntologyTerm::new("protein", "protein").with_parent("gene"),
            ],
            "entity",
        )
        .unwrap()
    }

    #[test]
    fn every_line_ends_with_period() {
        let nt = to_ntriples(&graph(), "https://example.org/");
        assert!(!nt.is_empty());
        for line in nt.lines() {
            assert!(line.ends_with(" ."), "line does not end with ' .': {line}");
        }
    }

    #[test]
    fn one_subclass_triple_per_parent_link() {
        let nt = to_ntriples(&graph(), "https://example.org/");
        let count = nt.lines().filter(|l| l.contains(RDFS_SUBCLASS_OF)).count();
        assert_eq!(count, 2);
        assert!(nt.contains(
            "<https://example.org/protein> <http://www.w3.org/2000/01/rdf-schema#subClassOf> <https://example.org/gene> ."
        ));
    }

    #[test]
    fn literals_stay_on_one_line() {
        let literal = lit("line\r\nbreak");
        assert_eq!(
            literal,
            format!("\"line\\r\\nbreak\"^^<{XSD_STRING}>")
        );
        assert!(!literal.contains('\r'));
        assert!(!literal.contains('\n'));
    }
}
