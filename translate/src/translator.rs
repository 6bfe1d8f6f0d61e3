//! Record → entity translation.

use std::collections::VecDeque;

use biograph_schema::{ClassResolver, ResolvedClass};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::entity::{EntityKind, GraphEntity};
use crate::id::relationship_id;
use crate::record::{EdgeRecord, NodeRecord, Properties, Record};
use crate::tally::TranslationTally;
use crate::value::PropertyValue;

/// Label of the link from a relationship's source to its reified node.
pub const IS_SOURCE_OF: &str = "IS_SOURCE_OF";
/// Label of the link from a reified relationship node to its target.
pub const IS_TARGET_OF: &str = "IS_TARGET_OF";

/// Direction flag stamped on the links of reified relationships.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkDirection {
    /// Links are directed.
    #[default]
    Directed,
    /// Links are undirected.
    Undirected,
}

/// Per-run translator settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TranslatorConfig {
    /// Direction of `IS_SOURCE_OF` / `IS_TARGET_OF` links.
    pub link_direction: LinkDirection,
}

/// The entities one record turns into.
#[derive(Debug, Clone, PartialEq)]
pub enum Translated {
    /// A node record.
    Node(GraphEntity),
    /// A relationship kept as an edge.
    Edge(GraphEntity),
    /// A relationship materialized as a node plus its two links.
    Reified {
        /// The relationship node.
        node: GraphEntity,
        /// Source → relationship.
        source_link: GraphEntity,
        /// Relationship → target.
        target_link: GraphEntity,
    },
}

impl IntoIterator for Translated {
    type Item = GraphEntity;
    type IntoIter = std::iter::Flatten<std::array::IntoIter<Option<GraphEntity>, 3>>;

    fn into_iter(self) -> Self::IntoIter {
        let parts = match self {
            Translated::Node(entity) | Translated::Edge(entity) => [Some(entity), None, None],
            Translated::Reified {
                node,
                source_link,
                target_link,
            } => [Some(node), Some(source_link), Some(target_link)],
        };
        parts.into_iter().flatten()
    }
}

/// Turns raw records into [`GraphEntity`] values against a shared
/// [`ClassResolver`].
///
/// A translator is single-threaded; parallel workers each own one and share
/// the resolver. Problems that do not abort a record land in the
/// [`TranslationTally`].
#[derive(Debug)]
pub struct EntityTranslator<'r> {
    resolver: &'r ClassResolver,
    config: TranslatorConfig,
    tally: TranslationTally,
}

impl<'r> EntityTranslator<'r> {
    /// A translator with an empty tally.
    #[must_use]
    pub fn new(resolver: &'r ClassResolver, config: TranslatorConfig) -> Self {
        Self {
            resolver,
            config,
            tally: TranslationTally::default(),
        }
    }

    /// Translates one record; `None` when it is dropped.
    pub fn translate(&mut self, record: impl Into<Record>) -> Option<Translated> {
        let translated = match record.into() {
            Record::Node(node) => self.translate_node(node),
            Record::Edge(edge) => self.translate_edge(edge),
        };
        if let Some(translated) = &translated {
            let (class, emitted) = match translated {
                Translated::Node(e) | Translated::Edge(e) => (&e.class, 1),
                Translated::Reified { node, .. } => (&node.class, 3),
            };
            self.tally.exercised(class);
            self.tally.emitted += emitted;
        }
        translated
    }

    /// Translates a node record.
    pub fn translate_node(&mut self, record: NodeRecord) -> Option<Translated> {
        self.tally.records += 1;
        let class = self.route(&record.label, &record.id)?;
        if class.is_relationship() && !class.materializes_as_node() {
            warn!(label = %record.label, class = %class.name, "node record routed to an edge class");
            self.tally.kind_mismatch(&record.label, &record.id);
            return None;
        }
        let properties = self.normalize(class, &record.id, record.properties);
        Some(Translated::Node(GraphEntity {
            id: Some(record.id),
            class: class.name.clone(),
            labels: class.ancestors.clone(),
            preferred_id: class.preferred_id.clone(),
            kind: EntityKind::Node,
            properties,
        }))
    }

    /// Translates a relationship record.
    ///
    /// Missing ids are derived from the record's content unless the class
    /// sets `use_id: false`; reified relationships always get an id.
    pub fn translate_edge(&mut self, record: EdgeRecord) -> Option<Translated> {
        self.tally.records += 1;
        let example = record
            .id
            .clone()
            .unwrap_or_else(|| format!("{}->{}", record.source, record.target));
        let class = self.route(&record.label, &example)?;
        if !class.is_relationship() {
            warn!(label = %record.label, class = %class.name, "relationship record routed to a node class");
            self.tally.kind_mismatch(&record.label, &example);
            return None;
        }

        let reified = class.materializes_as_node();
        let id = if class.use_id || reified {
            Some(record.id.unwrap_or_else(|| {
                relationship_id(&record.source, &record.target, &record.properties)
            }))
        } else {
            None
        };
        let properties = self.normalize(class, &example, record.properties);

        if !reified {
            return Some(Translated::Edge(GraphEntity {
                id,
                class: class.name.clone(),
                labels: class.ancestors.clone(),
                preferred_id: class.preferred_id.clone(),
                kind: EntityKind::Edge {
                    source: record.source,
                    target: record.target,
                    label: class.relationship_label().to_owned(),
                },
                properties,
            }));
        }

        let node_id = id.unwrap_or_default();
        let source_link = self.link(IS_SOURCE_OF, record.source, node_id.clone());
        let target_link = self.link(IS_TARGET_OF, node_id.clone(), record.target);
        Some(Translated::Reified {
            node: GraphEntity {
                id: Some(node_id),
                class: class.name.clone(),
                labels: class.ancestors.clone(),
                preferred_id: class.preferred_id.clone(),
                kind: EntityKind::Node,
                properties,
            },
            source_link,
            target_link,
        })
    }

    /// Lazily translates `records`, one at a time.
    pub fn translate_stream<I>(&mut self, records: I) -> Entities<'_, 'r, I::IntoIter>
    where
        I: IntoIterator,
        I::Item: Into<Record>,
    {
        Entities {
            translator: self,
            records: records.into_iter(),
            pending: VecDeque::with_capacity(2),
        }
    }

    /// Counters so far.
    #[must_use]
    pub fn tally(&self) -> &TranslationTally {
        &self.tally
    }

    /// Consumes the translator, returning its counters.
    #[must_use]
    pub fn into_tally(self) -> TranslationTally {
        self.tally
    }

    fn route(&mut self, label: &str, example: &str) -> Option<&'r ResolvedClass> {
        let resolver: &'r ClassResolver = self.resolver;
        match resolver.resolve(label) {
            Some(class) => Some(class.as_ref()),
            None => {
                if !self.tally.unaccounted.contains_key(label) {
                    warn!(label, "input label is not routed to any class");
                }
                self.tally.unaccounted(label, example);
                None
            }
        }
    }

    fn normalize(
        &mut self,
        class: &ResolvedClass,
        example: &str,
        mut supplied: Properties,
    ) -> IndexMap<String, PropertyValue> {
        if class.properties.contains_key("license")
            && !class.properties.contains_key("licence")
            && !supplied.contains_key("license")
        {
            if let Some(value) = supplied.remove("licence") {
                supplied.insert("license".to_owned(), value);
            }
        }

        let mut properties = IndexMap::with_capacity(class.properties.len());
        for (key, ty) in &class.properties {
            let value = match supplied.remove(key) {
                None => PropertyValue::Absent,
                Some(raw) => match raw.clone().coerce(*ty) {
                    Some(value) => value,
                    None => {
                        warn!(class = %class.name, key = %key, value = %raw, expected = %ty, "value does not fit declared type");
                        self.tally.coercion_failure(&class.name, key, example);
                        PropertyValue::Absent
                    }
                },
            };
            properties.insert(key.clone(), value);
        }
        for key in supplied.into_keys() {
            debug!(class = %class.name, key = %key, "discarding undeclared property");
            self.tally.discarded(&class.name, key);
        }
        properties
    }

    fn link(&self, label: &str, source: String, target: String) -> GraphEntity {
        GraphEntity {
            id: None,
            class: label.to_owned(),
            labels: vec![label.to_owned()],
            preferred_id: None,
            kind: EntityKind::Link {
                source,
                target,
                label: label.to_owned(),
                directed: self.config.link_direction == LinkDirection::Directed,
            },
            properties: IndexMap::new(),
        }
    }
}

/// Lazy entity stream returned by [`EntityTranslator::translate_stream`].
#[derive(Debug)]
pub struct Entities<'t, 'r, I> {
    translator: &'t mut EntityTranslator<'r>,
    records: I,
    pending: VecDeque<GraphEntity>,
}

impl<I> Iterator for Entities<'_, '_, I>
where
    I: Iterator,
    I::Item: Into<Record>,
{
    type Item = GraphEntity;

    fn next(&mut self) -> Option<GraphEntity> {
        loop {
            if let Some(entity) = self.pending.pop_front() {
                return Some(entity);
            }
            let record = self.records.next()?;
            if let Some(translated) = self.translator.translate(record) {
                self.pending.extend(translated);
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use biograph_ontology::{OntologyTerm, TermGraph};
    use biograph_schema::{CatalogOptions, OrderingPolicy, SchemaCatalog, SchemaConfig};

    use super::*;

    fn resolver(yaml: &str) -> ClassResolver {
        let graph = TermGraph::build(
            vec![
                OntologyTerm::new("entity", "entity"),
                OntologyTerm::new("gene", "gene").with_parent("entity"),
                OntologyTerm::new("disease", "disease").with_parent("entity"),
                OntologyTerm::new("association", "association").with_parent("entity"),
            ],
            "entity",
        )
        .unwrap();
        let config = SchemaConfig::from_yaml_str(yaml).unwrap();
        let catalog =
            SchemaCatalog::build(&graph, &config, CatalogOptions::new(OrderingPolicy::Specificity))
                .unwrap();
        ClassResolver::new(&catalog).unwrap()
    }

    #[test]
    fn node_properties_follow_the_schema() {
        let resolver = resolver(
            "gene:\n  input_label: hgnc_gene\n  properties:\n    symbol: str\n    length: int\n    taxon: str\n",
        );
        let mut translator = EntityTranslator::new(&resolver, TranslatorConfig::default());
        let Some(Translated::Node(entity)) = translator.translate(
            NodeRecord::new("HGNC:1100", "hgnc_gene")
                .with("symbol", "BRCA1")
                .with("length", "81189")
                .with("color", "blue"),
        ) else {
            panic!("expected a node");
        };
        assert_eq!(entity.labels, ["gene", "entity"]);
        assert_eq!(entity.value("length"), Some(&PropertyValue::Int(81189)));
        assert_eq!(entity.properties["taxon"], PropertyValue::Absent);
        assert!(!entity.properties.contains_key("color"));
        assert!(translator.tally().discarded_properties["gene"].contains("color"));
    }

    #[test]
    fn failed_coercion_is_absent_and_counted() {
        let resolver = resolver("gene:\n  input_label: hgnc_gene\n  properties:\n    length: int\n");
        let mut translator = EntityTranslator::new(&resolver, TranslatorConfig::default());
        let entity: Vec<_> = translator
            .translate(NodeRecord::new("g1", "hgnc_gene").with("length", "long"))
            .unwrap()
            .into_iter()
            .collect();
        assert_eq!(entity[0].properties["length"], PropertyValue::Absent);
        assert_eq!(translator.tally().coercion_failure_count(), 1);
    }

    #[test]
    fn edge_ids_are_generated_unless_disabled() {
        let resolver = resolver(
            "association:\n  represented_as: edge\n  input_label: gene_disease\n  source: gene\n  target: disease\n  label_as_edge: GENE_DISEASE\n  properties:\n    score: float\n",
        );
        let mut translator = EntityTranslator::new(&resolver, TranslatorConfig::default());
        let record = EdgeRecord::new("HGNC:1100", "MONDO:0007254", "gene_disease").with("score", 0.8);
        let Some(Translated::Edge(first)) = translator.translate(record.clone()) else {
            panic!("expected an edge");
        };
        let Some(Translated::Edge(second)) = translator.translate(record.clone()) else {
            panic!("expected an edge");
        };
        assert_eq!(first.id, second.id);
        assert_eq!(first.id.as_deref().map(str::len), Some(64));
        assert_eq!(
            first.kind,
            EntityKind::Edge {
                source: "HGNC:1100".into(),
                target: "MONDO:0007254".into(),
                label: "GENE_DISEASE".into()
            }
        );

        let Some(Translated::Edge(supplied)) = translator.translate(record.with_id("e1")) else {
            panic!("expected an edge");
        };
        assert_eq!(supplied.id.as_deref(), Some("e1"));
    }

    #[test]
    fn use_id_false_drops_ids() {
        let resolver = resolver(
            "association:\n  represented_as: edge\n  input_label: gene_disease\n  use_id: false\n",
        );
        let mut translator = EntityTranslator::new(&resolver, TranslatorConfig::default());
        let entity = translator
            .translate(EdgeRecord::new("a", "b", "gene_disease").with_id("e1"))
            .unwrap()
            .into_iter()
            .next()
            .unwrap();
        assert_eq!(entity.id, None);
    }

    #[test]
    fn reified_relationships_expand_into_links() {
        let resolver = resolver(
            "association:\n  represented_as: node\n  input_label: gene_disease\n  source: gene\n  target: disease\n",
        );
        let config = TranslatorConfig {
            link_direction: LinkDirection::Undirected,
        };
        let mut translator = EntityTranslator::new(&resolver, config);
        let entities: Vec<_> = translator
            .translate(EdgeRecord::new("g", "d", "gene_disease"))
            .unwrap()
            .into_iter()
            .collect();
        assert_eq!(entities.len(), 3);
        let node_id = entities[0].id.clone().unwrap();
        assert_eq!(entities[0].kind, EntityKind::Node);
        assert_eq!(
            entities[1].kind,
            EntityKind::Link {
                source: "g".into(),
                target: node_id.clone(),
                label: IS_SOURCE_OF.into(),
                directed: false
            }
        );
        assert_eq!(
            entities[2].kind,
            EntityKind::Link {
                source: node_id,
                target: "d".into(),
                label: IS_TARGET_OF.into(),
                directed: false
            }
        );
        assert_eq!(translator.tally().emitted, 3);
    }

    #[test]
    fn mismatched_record_kinds_are_dropped() {
        let resolver = resolver(
            "gene:\n  input_label: hgnc_gene\nassociation:\n  represented_as: edge\n  input_label: gene_disease\n",
        );
        let mut translator = EntityTranslator::new(&resolver, TranslatorConfig::default());
        assert!(translator
            .translate(EdgeRecord::new("a", "b", "hgnc_gene"))
            .is_none());
        assert!(translator
            .translate(NodeRecord::new("x", "gene_disease"))
            .is_none());
        assert_eq!(translator.tally().dropped(), 2);
        assert_eq!(translator.tally().kind_mismatches["hgnc_gene"].examples, ["a->b"]);
    }

    #[test]
    fn licence_fills_license() {
        let resolver = resolver("gene:\n  input_label: hgnc_gene\n  properties:\n    license: str\n");
        let mut translator = EntityTranslator::new(&resolver, TranslatorConfig::default());
        let entity = translator
            .translate(NodeRecord::new("g", "hgnc_gene").with("licence", "CC0"))
            .unwrap()
            .into_iter()
            .next()
            .unwrap();
        assert_eq!(entity.value("license"), Some(&PropertyValue::from("CC0")));
        assert!(!translator.tally().discarded_properties.contains_key("gene"));
    }

    #[test]
    fn stream_is_lazy() {
        let resolver = resolver("gene:\n  input_label: hgnc_gene\n");
        let mut translator = EntityTranslator::new(&resolver, TranslatorConfig::default());
        let records = (0..).map(|i| NodeRecord::new(format!("g{i}"), "hgnc_gene"));
        let firsts: Vec<_> = translator.translate_stream(records).take(3).collect();
        assert_eq!(firsts.len(), 3);
        assert_eq!(translator.tally().records, 3);
    }
}
