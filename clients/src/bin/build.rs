//! `biograph-build`: runs the construction phase and writes the resolved
//! class hierarchy.
//!
//! **Outputs** (with `--out`):
//! - `<out>/biograph.ttl`: Turtle
//! - `<out>/biograph.nt`: N-Triples
//! - `<out>/biograph.jsonld`: JSON-LD
//! - `<out>/biograph.txt`: text tree of the schema classes
//! - `<out>/classes.json`: resolved classes
//!
//! **Usage:**
//! ```text
//! biograph-build --config run.toml [--out <path>] [--tree] [--json-logs]
//! ```
//!
//! Exits non-zero on any construction error, naming the offending term or
//! class.

#![deny(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    missing_docs,
    clippy::missing_errors_doc
)]

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use biograph_clients::{init_tracing, Prepared, RunConfig};
use biograph_conformance::HierarchyTree;
use biograph_ontology::serializer::{jsonld, ntriples, turtle};
use biograph_schema::ResolvedClass;
use clap::Parser;

/// Resolve a biograph schema against its ontologies.
#[derive(Parser)]
#[command(name = "biograph-build", about = "Resolve and export a biograph class hierarchy")]
struct Args {
    /// Run configuration (TOML).
    #[arg(long)]
    config: PathBuf,

    /// Output directory for hierarchy artifacts.
    #[arg(long)]
    out: Option<PathBuf>,

    /// Print the schema class tree to stdout.
    #[arg(long)]
    tree: bool,

    /// Log as JSON lines.
    #[arg(long)]
    json_logs: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.json_logs)?;

    let config = RunConfig::from_file(&args.config)
        .with_context(|| format!("failed to load {}", args.config.display()))?;
    let prepared = Prepared::load(config)?;
    let catalog = &prepared.catalog;
    let graph = catalog.graph();

    println!(
        "biograph: {} terms, {} classes, {} routed labels",
        graph.len(),
        catalog.len(),
        prepared.resolver.len()
    );

    let tree = HierarchyTree::for_classes(catalog, catalog.classes().map(|c| c.name.as_str()))
        .context("failed to prune the class hierarchy")?;
    if args.tree {
        print!("{}", tree.to_text());
    }

    let Some(out) = &args.out else {
        return Ok(());
    };
    fs::create_dir_all(out)
        .with_context(|| format!("failed to create output directory: {}", out.display()))?;
    let base = &prepared.config.base_iri;

    let ttl_path = out.join("biograph.ttl");
    fs::write(&ttl_path, turtle::to_turtle(graph, base))
        .with_context(|| format!("failed to write {}", ttl_path.display()))?;
    println!("  Written: {}", ttl_path.display());

    let nt_path = out.join("biograph.nt");
    fs::write(&nt_path, ntriples::to_ntriples(graph, base))
        .with_context(|| format!("failed to write {}", nt_path.display()))?;
    println!("  Written: {}", nt_path.display());

    let json_path = out.join("biograph.jsonld");
    let json = serde_json::to_string_pretty(&jsonld::to_json_ld(graph, base))
        .context("failed to serialize hierarchy to JSON-LD")?;
    fs::write(&json_path, json)
        .with_context(|| format!("failed to write {}", json_path.display()))?;
    println!("  Written: {}", json_path.display());

    let txt_path = out.join("biograph.txt");
    fs::write(&txt_path, tree.to_text())
        .with_context(|| format!("failed to write {}", txt_path.display()))?;
    println!("  Written: {}", txt_path.display());

    let classes_path = out.join("classes.json");
    let classes: Vec<&ResolvedClass> = catalog.classes().map(|c| &**c).collect();
    let classes = serde_json::to_string_pretty(&classes).context("failed to serialize classes")?;
    fs::write(&classes_path, classes)
        .with_context(|| format!("failed to write {}", classes_path.display()))?;
    println!("  Written: {}", classes_path.display());

    println!("Build complete.");
    Ok(())
}
