//! RDF serializers for term hierarchies.
//!
//! Three formats are supported, all emitting `owl:Class` declarations linked
//! by `rdfs:subClassOf`:
//! - **JSON-LD** ([`jsonld`]) with a `@context` and a flat `@graph`
//! - **Turtle** ([`turtle`]) for RDF tooling
//! - **N-Triples** ([`ntriples`]) for bulk loading and diffs
//!
//! Term ids become IRIs under a caller-supplied base; see [`term_iri`].

pub mod jsonld;
pub mod ntriples;
pub mod turtle;

use crate::model::{PropertyType, ScalarType};

const XSD: &str = "http://www.w3.org/2001/XMLSchema#";

/// Builds the IRI of a term (or property) id under `base`.
///
/// Characters outside the IRI-unreserved set (plus `:`) are percent-encoded,
/// so `"gene product"` becomes `<base>gene%20product`.
#[must_use]
pub fn term_iri(base: &str, id: &str) -> String {
    let mut out = String::with_capacity(base.len() + id.len());
    out.push_str(base);
    for byte in id.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' | b':' => {
                out.push(char::from(byte));
            }
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}

/// XSD datatype IRI for the element type of a declared property.
#[must_use]
pub fn xsd_range(ty: PropertyType) -> String {
    let local = match ty.scalar() {
        ScalarType::Str => "string",
        ScalarType::Int => "integer",
        ScalarType::Float => "double",
        ScalarType::Bool => "boolean",
    };
    format!("{XSD}{local}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn iri_encoding_keeps_curies_and_escapes_spaces() {
        assert_eq!(
            term_iri("https://example.org/", "SO:0001060"),
            "https://example.org/SO:0001060"
        );
        assert_eq!(
            term_iri("https://example.org/", "gene product"),
            "https://example.org/gene%20product"
        );
    }

    #[test]
    fn array_types_range_over_their_element() {
        let ty: PropertyType = "int[]".parse().unwrap_or(PropertyType::STR);
        assert_eq!(xsd_range(ty), "http://www.w3.org/2001/XMLSchema#integer");
    }
}
