//! Streaming record translation for biograph.
//!
//! [`EntityTranslator`] routes each raw record through a shared
//! [`biograph_schema::ClassResolver`] and emits [`GraphEntity`] values that
//! carry the class's ancestor chain and exactly the class's property keys.
//! Records with unrouted labels are dropped and counted in the
//! [`TranslationTally`].
//!
//! ```
//! use biograph_ontology::{OntologyTerm, TermGraph};
//! use biograph_schema::{CatalogOptions, ClassResolver, OrderingPolicy, SchemaCatalog, SchemaConfig};
//! use biograph_translate::{EntityTranslator, NodeRecord, PropertyValue, TranslatorConfig};
//!
//! let graph = TermGraph::build(
//!     vec![
//!         OntologyTerm::new("entity", "entity"),
//!         OntologyTerm::new("gene", "gene").with_parent("entity"),
//!     ],
//!     "entity",
//! )?;
//! let config = SchemaConfig::from_yaml_str("gene:\n  input_label: hgnc\n  properties:\n    symbol: str\n")?;
//! let catalog = SchemaCatalog::build(&graph, &config, CatalogOptions::new(OrderingPolicy::Specificity))?;
//! let resolver = ClassResolver::new(&catalog)?;
//!
//! let mut translator = EntityTranslator::new(&resolver, TranslatorConfig::default());
//! let records = vec![
//!     NodeRecord::new("HGNC:1100", "hgnc").with("symbol", "BRCA1"),
//!     NodeRecord::new("X", "unknown"),
//! ];
//! let entities: Vec<_> = translator.translate_stream(records).collect();
//! assert_eq!(entities.len(), 1);
//! assert_eq!(entities[0].labels, ["gene", "entity"]);
//! assert_eq!(entities[0].properties["symbol"], PropertyValue::from("BRCA1"));
//! assert_eq!(translator.tally().unaccounted["unknown"].count, 1);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![deny(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    missing_docs,
    clippy::missing_errors_doc
)]

pub mod entity;
pub mod id;
pub mod record;
pub mod tally;
pub mod translator;
pub mod value;

pub use entity::{EntityKind, GraphEntity};
pub use id::relationship_id;
pub use record::{EdgeRecord, NodeRecord, Properties, Record};
pub use tally::{LabelTally, TranslationTally, MAX_EXAMPLES};
pub use translator::{
    Entities, EntityTranslator, LinkDirection, Translated, TranslatorConfig, IS_SOURCE_OF,
    IS_TARGET_OF,
};
pub use value::PropertyValue;
