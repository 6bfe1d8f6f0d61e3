//! Schema selection and class resolution for biograph.
//!
//! A schema selection ([`SchemaConfig`]) picks ontology terms as classes and
//! configures them: explicit subclassing through `is_a`, implicit
//! `namespace.parent` subclasses from paired `preferred_id`/`input_label`
//! lists, synonyms, property inheritance and exclusion, and relationship
//! endpoints. [`SchemaCatalog`] resolves the selection against a
//! [`biograph_ontology::TermGraph`]; [`ClassResolver`] routes raw input
//! labels to the resolved classes.
//!
//! ```
//! use biograph_ontology::{OntologyTerm, TermGraph};
//! use biograph_schema::{CatalogOptions, ClassResolver, OrderingPolicy, SchemaCatalog, SchemaConfig};
//!
//! let graph = TermGraph::build(
//!     vec![
//!         OntologyTerm::new("entity", "entity"),
//!         OntologyTerm::new("protein", "protein").with_parent("entity"),
//!     ],
//!     "entity",
//! )?;
//! let config = SchemaConfig::from_yaml_str(
//!     "protein:\n  preferred_id: [uniprot, entrez]\n  input_label: [uniprot_protein, entrez_protein]\n",
//! )?;
//! let catalog = SchemaCatalog::build(&graph, &config, CatalogOptions::new(OrderingPolicy::Specificity))?;
//! let resolver = ClassResolver::new(&catalog)?;
//! let class = resolver.resolve("uniprot_protein").ok_or("unrouted")?;
//! assert_eq!(class.name, "uniprot.protein");
//! assert_eq!(class.ancestors, ["uniprot.protein", "protein", "entity"]);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![deny(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    missing_docs,
    clippy::missing_errors_doc
)]

pub mod catalog;
pub mod config;
pub mod resolver;

pub use catalog::{
    CatalogOptions, ClassOrigin, OrderingPolicy, ResolvedClass, SchemaCatalog, SchemaError,
    PROVENANCE_KEYS,
};
pub use config::{ClassSpec, ConfigError, OneOrMany, Representation, SchemaConfig};
pub use resolver::ClassResolver;
