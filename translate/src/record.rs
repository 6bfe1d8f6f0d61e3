//! Raw input records.
//!
//! On the wire a node record is `[id, label, {props}]` and a relationship
//! record is `[id | null, source, target, label, {props}]`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::value::PropertyValue;

/// Supplied properties, sorted by key.
pub type Properties = BTreeMap<String, PropertyValue>;

/// A raw node record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    from = "(String, String, Properties)",
    into = "(String, String, Properties)"
)]
pub struct NodeRecord {
    /// Record id.
    pub id: String,
    /// Raw input label.
    pub label: String,
    /// Supplied properties.
    pub properties: Properties,
}

impl NodeRecord {
    /// A record without properties.
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            properties: Properties::new(),
        }
    }

    /// Adds a property.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }
}

impl From<(String, String, Properties)> for NodeRecord {
    fn from((id, label, properties): (String, String, Properties)) -> Self {
        Self {
            id,
            label,
            properties,
        }
    }
}

impl From<NodeRecord> for (String, String, Properties) {
    fn from(record: NodeRecord) -> Self {
        (record.id, record.label, record.properties)
    }
}

/// A raw relationship record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    from = "(Option<String>, String, String, String, Properties)",
    into = "(Option<String>, String, String, String, Properties)"
)]
pub struct EdgeRecord {
    /// Supplied id, if any.
    pub id: Option<String>,
    /// Source node id.
    pub source: String,
    /// Target node id.
    pub target: String,
    /// Raw input label.
    pub label: String,
    /// Supplied properties.
    pub properties: Properties,
}

impl EdgeRecord {
    /// A record without id or properties.
    pub fn new(
        source: impl Into<String>,
        target: impl Into<String>,
        label: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            source: source.into(),
            target: target.into(),
            label: label.into(),
            properties: Properties::new(),
        }
    }

    /// Sets the supplied id.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Adds a property.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }
}

type EdgeTuple = (Option<String>, String, String, String, Properties);

impl From<EdgeTuple> for EdgeRecord {
    fn from((id, source, target, label, properties): EdgeTuple) -> Self {
        Self {
            id,
            source,
            target,
            label,
            properties,
        }
    }
}

impl From<EdgeRecord> for EdgeTuple {
    fn from(record: EdgeRecord) -> Self {
        (
            record.id,
            record.source,
            record.target,
            record.label,
            record.properties,
        )
    }
}

/// Either kind of record; arity tells them apart on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Record {
    /// A node record.
    Node(NodeRecord),
    /// A relationship record.
    Edge(EdgeRecord),
}

impl From<NodeRecord> for Record {
    fn from(record: NodeRecord) -> Self {
        Record::Node(record)
    }
}

impl From<EdgeRecord> for Record {
    fn from(record: EdgeRecord) -> Self {
        Record::Edge(record)
    }
}
