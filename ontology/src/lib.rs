//! Ontology term graphs for biograph.
//!
//! The `biograph-ontology` crate turns parsed ontology terms (id, display
//! name, parent ids, optional property declarations) into a validated,
//! immutable DAG, fuses several such graphs at named join points, caches
//! built graphs on disk, and exports hierarchies as Turtle, N-Triples or
//! JSON-LD.
//!
//! # Entry Point
//!
//! ```
//! use biograph_ontology::{OntologyTerm, TermGraph};
//!
//! let graph = TermGraph::build(
//!     vec![
//!         OntologyTerm::new("entity", "entity"),
//!         OntologyTerm::new("gene", "gene").with_parent("entity"),
//!     ],
//!     "entity",
//! )?;
//! let gene = graph.lookup("gene").ok_or("gene missing")?;
//! assert_eq!(graph.ancestors(gene).len(), 2);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Joining
//!
//! ```
//! use biograph_ontology::{JoinSpec, OntologyTerm, TermGraph, TermGraphJoiner};
//!
//! let head = TermGraph::build(
//!     vec![
//!         OntologyTerm::new("entity", "entity"),
//!         OntologyTerm::new("variant", "sequence variant").with_parent("entity"),
//!     ],
//!     "entity",
//! )?;
//! let tail = TermGraph::build(
//!     vec![
//!         OntologyTerm::new("SO:0001060", "sequence_variant"),
//!         OntologyTerm::new("SO:0001583", "missense_variant").with_parent("SO:0001060"),
//!     ],
//!     "SO:0001060",
//! )?;
//! let joined = TermGraphJoiner::new(head)
//!     .with_tail("so", tail)
//!     .join(&[JoinSpec::merge("sequence variant", "so", "sequence_variant")])?;
//! assert!(joined.contains("missense_variant"));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![deny(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    missing_docs,
    clippy::missing_errors_doc
)]

pub mod graph;
pub mod join;
pub mod model;
pub mod render;
pub mod serializer;
pub mod store;

pub use graph::{GraphError, TermGraph, TermIdx};
pub use join::{JoinError, JoinSpec, TermGraphJoiner};
pub use model::{OntologyTerm, PropertyType, ScalarType, UnknownPropertyType};
pub use store::{CacheKey, OntologyStore, StoreError};
