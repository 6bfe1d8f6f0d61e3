//! Schema selection: the YAML mapping of class names to [`ClassSpec`]s.
//!
//! ```yaml
//! protein:
//!   represented_as: node
//!   preferred_id: [uniprot, entrez]
//!   input_label: [uniprot_protein, entrez_protein]
//!   properties:
//!     sequence: str
//!     mass: int
//! ```

use std::path::{Path, PathBuf};

use biograph_ontology::PropertyType;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A scalar or a list of scalars, as authored in YAML.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    /// A single value.
    One(T),
    /// A list of values.
    Many(Vec<T>),
}

impl<T> OneOrMany<T> {
    /// Views the value(s) as a slice.
    #[must_use]
    pub fn as_slice(&self) -> &[T] {
        match self {
            OneOrMany::One(value) => std::slice::from_ref(value),
            OneOrMany::Many(values) => values,
        }
    }

    /// Number of values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.as_slice().len()
    }

    /// True for an empty list.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.as_slice().is_empty()
    }

    /// True when more than one value is present.
    #[must_use]
    pub fn is_many(&self) -> bool {
        self.len() > 1
    }
}

impl<T> From<T> for OneOrMany<T> {
    fn from(value: T) -> Self {
        OneOrMany::One(value)
    }
}

/// How a class materializes in the output graph.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Representation {
    /// A node.
    #[default]
    Node,
    /// An edge between two nodes.
    Edge,
}

fn default_true() -> bool {
    true
}

fn is_true(value: &bool) -> bool {
    *value
}

/// One class entry of the schema selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassSpec {
    /// Node or edge.
    #[serde(default)]
    pub represented_as: Representation,
    /// Identifier namespace(s); a list pairs with `input_label` for implicit
    /// subclassing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_id: Option<OneOrMany<String>>,
    /// Raw input label(s) routed to this class; defaults to the class name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_label: Option<OneOrMany<String>>,
    /// Parent class, or a chain of parents ending in an existing term.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_a: Option<OneOrMany<String>>,
    /// Layer own declarations over the nearest ancestor's schema.
    #[serde(default)]
    pub inherit_properties: bool,
    /// Declared properties; overlay the ontology term's own declarations.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub properties: IndexMap<String, PropertyType>,
    /// Keys removed from the merged schema.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exclude_properties: Vec<String>,
    /// Class or term this class is an alternate name for.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub synonym_for: Option<String>,
    /// Source class of a relationship.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// Target class of a relationship.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    /// Edge label used instead of the class name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label_as_edge: Option<String>,
    /// Whether relationship entities carry an id at all.
    #[serde(default = "default_true", skip_serializing_if = "is_true")]
    pub use_id: bool,
    /// Fields this crate does not interpret, carried through to the
    /// resolved class.
    #[serde(flatten)]
    pub extra: IndexMap<String, serde_json::Value>,
}

impl Default for ClassSpec {
    fn default() -> Self {
        Self {
            represented_as: Representation::Node,
            preferred_id: None,
            input_label: None,
            is_a: None,
            inherit_properties: false,
            properties: IndexMap::new(),
            exclude_properties: Vec::new(),
            synonym_for: None,
            source: None,
            target: None,
            label_as_edge: None,
            use_id: true,
            extra: IndexMap::new(),
        }
    }
}

impl ClassSpec {
    /// Preferred-id namespaces as a slice (empty when unset).
    #[must_use]
    pub fn preferred_ids(&self) -> &[String] {
        self.preferred_id.as_ref().map_or(&[][..], OneOrMany::as_slice)
    }

    /// Input labels as a slice (empty when unset).
    #[must_use]
    pub fn input_labels(&self) -> &[String] {
        self.input_label.as_ref().map_or(&[][..], OneOrMany::as_slice)
    }

    /// `is_a` entries as a slice (empty when unset).
    #[must_use]
    pub fn parents(&self) -> &[String] {
        self.is_a.as_ref().map_or(&[][..], OneOrMany::as_slice)
    }

    /// True when both namespaces and labels are lists, which requests one
    /// implicit subclass per pair.
    #[must_use]
    pub fn is_paired(&self) -> bool {
        self.preferred_ids().len() > 1 && self.input_labels().len() > 1
    }

    /// True for relationship classes: edges, or nodes with endpoints.
    #[must_use]
    pub fn is_relationship(&self) -> bool {
        self.represented_as == Representation::Edge
            || self.source.is_some()
            || self.target.is_some()
    }
}

/// Errors raised while loading a schema selection.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("cannot read schema file {path}")]
    Io {
        /// Offending path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
    /// The YAML is malformed or has invalid field values.
    #[error("invalid schema YAML")]
    Yaml(#[from] serde_yaml::Error),
}

/// Class name → spec, in authoring order.
///
/// Entries with an empty body (`gene:`) are plain direct mappings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(
    from = "IndexMap<String, Option<ClassSpec>>",
    into = "IndexMap<String, ClassSpec>"
)]
pub struct SchemaConfig {
    classes: IndexMap<String, ClassSpec>,
}

impl From<IndexMap<String, Option<ClassSpec>>> for SchemaConfig {
    fn from(raw: IndexMap<String, Option<ClassSpec>>) -> Self {
        Self {
            classes: raw
                .into_iter()
                .map(|(name, spec)| (name, spec.unwrap_or_default()))
                .collect(),
        }
    }
}

impl From<SchemaConfig> for IndexMap<String, ClassSpec> {
    fn from(config: SchemaConfig) -> Self {
        config.classes
    }
}

impl FromIterator<(String, ClassSpec)> for SchemaConfig {
    fn from_iter<I: IntoIterator<Item = (String, ClassSpec)>>(iter: I) -> Self {
        Self {
            classes: iter.into_iter().collect(),
        }
    }
}

impl SchemaConfig {
    /// Parses a YAML schema selection.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] for malformed YAML, unknown
    /// representation kinds, or unknown property types.
    pub fn from_yaml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Reads and parses a YAML schema selection.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, otherwise
    /// as [`SchemaConfig::from_yaml_str`].
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&content)
    }

    /// Looks up a class spec by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ClassSpec> {
        self.classes.get(name)
    }

    /// True if `name` is a configured class.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.classes.contains_key(name)
    }

    /// Iterates classes in authoring order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &ClassSpec)> {
        self.classes.iter()
    }

    /// Number of configured classes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    /// True when no class is configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Adds or replaces a class spec.
    pub fn insert(&mut self, name: impl Into<String>, spec: ClassSpec) {
        self.classes.insert(name.into(), spec);
    }
}
