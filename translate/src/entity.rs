//! Graph entities handed to sinks.

use std::collections::BTreeSet;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::value::PropertyValue;

/// What kind of graph element an entity is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EntityKind {
    /// A node.
    Node,
    /// An edge of a relationship class.
    Edge {
        /// Source node id.
        source: String,
        /// Target node id.
        target: String,
        /// Edge label.
        label: String,
    },
    /// A structural link from a reified relationship node to one of its
    /// endpoints.
    Link {
        /// Source node id.
        source: String,
        /// Target node id.
        target: String,
        /// `IS_SOURCE_OF` or `IS_TARGET_OF`.
        label: String,
        /// Whether the link is directed.
        directed: bool,
    },
}

/// A fully qualified entity: class, ancestor labels and normalized
/// properties.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphEntity {
    /// Entity id; `None` only for edges without ids and links.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Primary class name.
    pub class: String,
    /// Ancestor labels, in the run's ordering policy.
    pub labels: Vec<String>,
    /// Identifier namespace of the class.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_id: Option<String>,
    /// Node, edge or link.
    #[serde(flatten)]
    pub kind: EntityKind,
    /// Exactly the class's schema keys; missing values are absent.
    pub properties: IndexMap<String, PropertyValue>,
}

impl GraphEntity {
    /// True for link entities.
    #[must_use]
    pub fn is_link(&self) -> bool {
        matches!(self.kind, EntityKind::Link { .. })
    }

    /// The property key set.
    #[must_use]
    pub fn key_set(&self) -> BTreeSet<&str> {
        self.properties.keys().map(String::as_str).collect()
    }

    /// Property value, treating absent as missing.
    #[must_use]
    pub fn value(&self, key: &str) -> Option<&PropertyValue> {
        self.properties.get(key).filter(|v| !v.is_absent())
    }
}
