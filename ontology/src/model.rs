//! Core ontology model types.
//!
//! These types describe ontology terms as handed over by the ontology-file
//! parsing collaborator: an id, a display name, parent ids, and optional
//! property declarations. Graph structure lives in [`crate::graph`].

use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Scalar element type of a declared property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarType {
    /// Free text.
    Str,
    /// Signed 64-bit integer.
    Int,
    /// 64-bit float.
    Float,
    /// Boolean flag.
    Bool,
}

impl ScalarType {
    /// Returns the canonical type name (`str`, `int`, `float`, `bool`).
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ScalarType::Str => "str",
            ScalarType::Int => "int",
            ScalarType::Float => "float",
            ScalarType::Bool => "bool",
        }
    }

    fn parse(name: &str) -> Option<Self> {
        match name {
            "str" | "string" => Some(ScalarType::Str),
            "int" | "integer" | "long" => Some(ScalarType::Int),
            "float" | "double" => Some(ScalarType::Float),
            "bool" | "boolean" => Some(ScalarType::Bool),
            _ => None,
        }
    }
}

/// Declared type of a property.
///
/// Schema files spell these as strings (`str`, `int[]`, `boolean`, ...). The
/// set is closed: unknown names are rejected when the declaration is parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum PropertyType {
    /// A single value.
    Scalar(ScalarType),
    /// A homogeneous list of values.
    Array(ScalarType),
}

impl PropertyType {
    /// `str`, the type assumed for provenance attributes.
    pub const STR: PropertyType = PropertyType::Scalar(ScalarType::Str);

    /// Returns the element type.
    #[must_use]
    pub fn scalar(self) -> ScalarType {
        match self {
            PropertyType::Scalar(s) | PropertyType::Array(s) => s,
        }
    }

    /// Returns true for array types.
    #[must_use]
    pub fn is_array(self) -> bool {
        matches!(self, PropertyType::Array(_))
    }
}

impl fmt::Display for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyType::Scalar(s) => f.write_str(s.as_str()),
            PropertyType::Array(s) => write!(f, "{}[]", s.as_str()),
        }
    }
}

/// A property type name outside the supported set.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown property type `{0}` (expected str, int, float, bool, or an array form like `str[]`)")]
pub struct UnknownPropertyType(pub String);

impl FromStr for PropertyType {
    type Err = UnknownPropertyType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_ascii_lowercase();
        let parsed = match name.strip_suffix("[]") {
            Some(element) => ScalarType::parse(element).map(PropertyType::Array),
            None => ScalarType::parse(&name).map(PropertyType::Scalar),
        };
        parsed.ok_or_else(|| UnknownPropertyType(s.to_owned()))
    }
}

impl TryFrom<String> for PropertyType {
    type Error = UnknownPropertyType;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<PropertyType> for String {
    fn from(value: PropertyType) -> Self {
        value.to_string()
    }
}

/// One ontology term as produced by the ontology-file parser.
///
/// A term with `synonym_for` set is not a node of its own: it names an
/// existing term and shares its position in the hierarchy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OntologyTerm {
    /// Unique id within its source (e.g. `"SO:0001060"`).
    pub id: String,
    /// Human-readable display name (e.g. `"sequence variant"`).
    pub name: String,
    /// Ids of the direct parents (`rdfs:subClassOf`).
    #[serde(default)]
    pub parents: Vec<String>,
    /// Declared properties, in declaration order.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub properties: IndexMap<String, PropertyType>,
    /// Id or name of the term this one is an alternate name for.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub synonym_for: Option<String>,
}

impl OntologyTerm {
    /// Creates a parentless term.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            parents: Vec::new(),
            properties: IndexMap::new(),
            synonym_for: None,
        }
    }

    /// Adds a parent id.
    #[must_use]
    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parents.push(parent.into());
        self
    }

    /// Adds a property declaration.
    #[must_use]
    pub fn with_property(mut self, name: impl Into<String>, ty: PropertyType) -> Self {
        self.properties.insert(name.into(), ty);
        self
    }

    /// Marks this term as a synonym of `target`.
    #[must_use]
    pub fn synonym_of(mut self, target: impl Into<String>) -> Self {
        self.synonym_for = Some(target.into());
        self
    }

    /// Unifies `other` into `self`: parents are unioned (own parents first)
    /// and property declarations already present on `self` win.
    pub fn absorb(&mut self, other: OntologyTerm) {
        for parent in other.parents {
            if parent != self.id && !self.parents.contains(&parent) {
                self.parents.push(parent);
            }
        }
        for (key, ty) in other.properties {
            self.properties.entry(key).or_insert(ty);
        }
        if self.synonym_for.is_none() {
            self.synonym_for = other.synonym_for;
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn parses_scalar_and_array_types() {
        assert_eq!("str".parse(), Ok(PropertyType::Scalar(ScalarType::Str)));
        assert_eq!("Integer".parse(), Ok(PropertyType::Scalar(ScalarType::Int)));
        assert_eq!("double".parse(), Ok(PropertyType::Scalar(ScalarType::Float)));
        assert_eq!("boolean[]".parse(), Ok(PropertyType::Array(ScalarType::Bool)));
        assert_eq!("string[]".parse(), Ok(PropertyType::Array(ScalarType::Str)));
    }

    #[test]
    fn rejects_unknown_types() {
        assert!("uuid".parse::<PropertyType>().is_err());
        assert!("str[][]".parse::<PropertyType>().is_err());
        assert!("".parse::<PropertyType>().is_err());
    }

    #[test]
    fn display_is_canonical() {
        let ty: PropertyType = "long[]".parse().unwrap();
        assert_eq!(ty.to_string(), "int[]");
    }

    #[test]
    fn deserializes_from_json_string() {
        let ty: PropertyType = serde_json::from_str("\"float\"").unwrap();
        assert_eq!(ty, PropertyType::Scalar(ScalarType::Float));
        assert!(serde_json::from_str::<PropertyType>("\"decimal\"").is_err());
    }

    #[test]
    fn absorb_unions_parents_with_own_precedence() {
        let mut head = OntologyTerm::new("a", "a")
            .with_parent("p1")
            .with_property("name", PropertyType::STR);
        let tail = OntologyTerm::new("a", "a-tail")
            .with_parent("p2")
            .with_parent("p1")
            .with_property("name", PropertyType::Scalar(ScalarType::Int))
            .with_property("score", PropertyType::Scalar(ScalarType::Float));
        head.absorb(tail);
        assert_eq!(head.parents, vec!["p1", "p2"]);
        assert_eq!(head.properties["name"], PropertyType::STR);
        assert_eq!(
            head.properties["score"],
            PropertyType::Scalar(ScalarType::Float)
        );
        assert_eq!(head.name, "a");
    }
}
