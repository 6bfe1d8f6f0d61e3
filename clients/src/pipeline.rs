//! Construction phase shared by the clients: term graphs, joins, schema
//! catalog and resolver.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use biograph_conformance::GuardConfig;
use biograph_ontology::{
    CacheKey, JoinSpec, OntologyStore, OntologyTerm, TermGraph, TermGraphJoiner,
};
use biograph_schema::{CatalogOptions, ClassResolver, SchemaCatalog, SchemaConfig};
use biograph_translate::TranslatorConfig;
use serde::Serialize;
use tracing::info;

use crate::config::RunConfig;

/// A fully resolved run: nothing here changes once translation starts.
#[derive(Debug)]
pub struct Prepared {
    /// Run configuration.
    pub config: RunConfig,
    /// Resolved classes and the extended term graph.
    pub catalog: SchemaCatalog,
    /// Label routing table.
    pub resolver: ClassResolver,
}

impl Prepared {
    /// Loads every input named by `config` and resolves the schema.
    ///
    /// # Errors
    ///
    /// Fails on unreadable inputs and on any construction error (cycles,
    /// missing join points, unresolved classes, ambiguous labels).
    pub fn load(config: RunConfig) -> Result<Self> {
        let store = match &config.cache {
            Some(cache) => {
                let store = OntologyStore::new(cache.dir.clone());
                if cache.clear {
                    let removed = store.invalidate().context("failed to clear the term cache")?;
                    info!(removed, dir = %cache.dir.display(), "cleared term graph cache");
                }
                store
            }
            None => OntologyStore::disabled(),
        };
        let graph = build_graph(&config, &store)?;

        let schema = SchemaConfig::from_file(&config.schema)
            .with_context(|| format!("failed to load schema {}", config.schema.display()))?;
        let options = CatalogOptions::new(config.ordering).strict(config.strict_mode);
        let catalog = SchemaCatalog::build(&graph, &schema, options)
            .context("failed to resolve the schema selection")?;
        let resolver = ClassResolver::new(&catalog).context("failed to build label routing")?;
        info!(
            terms = catalog.graph().len(),
            classes = catalog.len(),
            labels = resolver.len(),
            "schema resolved"
        );

        Ok(Self {
            config,
            catalog,
            resolver,
        })
    }

    /// Translator settings derived from the run configuration.
    #[must_use]
    pub fn translator_config(&self) -> TranslatorConfig {
        TranslatorConfig {
            link_direction: self.config.link_direction,
        }
    }

    /// Guard settings derived from the run configuration.
    #[must_use]
    pub fn guard_config(&self) -> GuardConfig {
        GuardConfig {
            strict_mode: self.config.strict_mode,
            strict_fatal: self.config.strict_fatal,
        }
    }
}

/// Reads a JSON array of ontology terms.
///
/// # Errors
///
/// Fails if the file cannot be read or is not a term array.
pub fn load_terms(path: &Path) -> Result<Vec<OntologyTerm>> {
    let content =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("failed to parse {} as ontology terms", path.display()))
}

#[derive(Serialize)]
struct GraphInputs<'a> {
    head: (&'a str, &'a [OntologyTerm]),
    tails: Vec<(&'a str, &'a str, &'a [OntologyTerm])>,
    joins: &'a [JoinSpec],
}

/// Builds the head graph, every tail graph, and joins them; cached in
/// `store` under a digest of all inputs.
///
/// # Errors
///
/// Fails on unreadable term files and on graph or join errors.
pub fn build_graph(config: &RunConfig, store: &OntologyStore) -> Result<TermGraph> {
    let head_terms = load_terms(&config.head.terms)?;
    let tail_terms = config
        .tails
        .iter()
        .map(|tail| load_terms(&tail.terms))
        .collect::<Result<Vec<_>>>()?;

    let inputs = GraphInputs {
        head: (config.head.root.as_str(), head_terms.as_slice()),
        tails: config
            .tails
            .iter()
            .zip(&tail_terms)
            .map(|(tail, terms)| (tail.source.as_str(), tail.root.as_str(), terms.as_slice()))
            .collect(),
        joins: &config.joins,
    };
    let key = CacheKey::of(&inputs).context("failed to digest ontology inputs")?;

    store.load_or_build(&key, || -> Result<TermGraph> {
        let head = TermGraph::build(head_terms.iter().cloned(), &config.head.root)
            .with_context(|| format!("invalid head ontology {}", config.head.terms.display()))?;
        let mut joiner = TermGraphJoiner::new(head);
        for (tail, terms) in config.tails.iter().zip(&tail_terms) {
            let graph = TermGraph::build(terms.iter().cloned(), &tail.root)
                .with_context(|| format!("invalid tail ontology {}", tail.source))?;
            joiner = joiner.with_tail(tail.source.clone(), graph);
        }
        joiner
            .join(&config.joins)
            .context("failed to join ontology sources")
    })
}
