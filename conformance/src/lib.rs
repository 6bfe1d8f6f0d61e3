//! Run-time consistency checks and reporting for biograph.
//!
//! [`ConsistencyGuard`] sits between the translator and a sink. It enforces
//! strict-mode provenance per entity and re-asserts that all entities of one
//! class share a key set. [`run_report`] turns a translation tally and a guard
//! into a [`RunReport`]; [`HierarchyTree`] shows the exercised part of the
//! class hierarchy.
//!
//! # Entry Point
//!
//! ```
//! use biograph_ontology::{OntologyTerm, TermGraph};
//! use biograph_schema::{CatalogOptions, ClassResolver, OrderingPolicy, SchemaCatalog, SchemaConfig};
//! use biograph_translate::{EntityTranslator, NodeRecord, TranslatorConfig};
//! use biograph_conformance::{run_report, ConsistencyGuard, GuardConfig};
//!
//! let graph = TermGraph::build(
//!     vec![
//!         OntologyTerm::new("entity", "entity"),
//!         OntologyTerm::new("gene", "gene").with_parent("entity"),
//!     ],
//!     "entity",
//! )?;
//! let config = SchemaConfig::from_yaml_str("gene:\n  input_label: hgnc\n")?;
//! let options = CatalogOptions::new(OrderingPolicy::Specificity).strict(true);
//! let catalog = SchemaCatalog::build(&graph, &config, options)?;
//! let resolver = ClassResolver::new(&catalog)?;
//!
//! let mut translator = EntityTranslator::new(&resolver, TranslatorConfig::default());
//! let mut guard = ConsistencyGuard::new(GuardConfig { strict_mode: true, strict_fatal: false });
//! let records = vec![
//!     NodeRecord::new("HGNC:1100", "hgnc")
//!         .with("source", "hgnc")
//!         .with("version", "2024-06")
//!         .with("licence", "CC0"),
//!     NodeRecord::new("HGNC:1101", "hgnc"),
//! ];
//! let accepted = guard
//!     .guard_stream(translator.translate_stream(records))
//!     .collect::<Result<Vec<_>, _>>()?;
//! assert_eq!(accepted.len(), 1);
//!
//! let report = run_report(translator.tally(), &guard, &resolver);
//! assert!(report.all_passed());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![deny(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    missing_docs,
    clippy::missing_errors_doc
)]

pub mod diagnostics;
pub mod guard;
pub mod hierarchy;
pub mod report;

pub use diagnostics::run_report;
pub use guard::{Admission, ConsistencyGuard, GuardConfig, GuardError, Guarded};
pub use hierarchy::HierarchyTree;
pub use report::{Finding, RunReport, Severity};
