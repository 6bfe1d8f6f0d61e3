//! `biograph-translate`: streams raw records through the resolver,
//! translator and consistency guard.
//!
//! Input is JSON lines, one record per line: `[id, label, {props}]` for
//! nodes, `[id|null, source, target, label, {props}]` for relationships.
//! Output is JSON lines of graph entities. The run report goes to stderr.
//!
//! **Usage:**
//! ```text
//! biograph-translate --config run.toml [--input records.jsonl] [--output entities.jsonl]
//!                    [--report report.json] [--hierarchy exercised.txt] [--json-logs]
//! ```
//!
//! Exits non-zero if construction fails, a record cannot be parsed, or the
//! guard hits a fatal violation.

#![deny(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    missing_docs,
    clippy::missing_errors_doc
)]

use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::PathBuf;
use std::process;

use anyhow::{Context, Result};
use biograph_clients::{init_tracing, Prepared, RunConfig};
use biograph_conformance::{run_report, Admission, ConsistencyGuard, Finding, HierarchyTree};
use biograph_translate::{EntityTranslator, Record};
use clap::Parser;
use tracing::info;

/// Translate raw records into ontology-grounded graph entities.
#[derive(Parser)]
#[command(
    name = "biograph-translate",
    about = "Translate JSON-lines records into graph entities"
)]
struct Args {
    /// Run configuration (TOML).
    #[arg(long)]
    config: PathBuf,

    /// Record file (default: stdin).
    #[arg(long)]
    input: Option<PathBuf>,

    /// Entity file (default: stdout).
    #[arg(long)]
    output: Option<PathBuf>,

    /// Also write the run report as JSON.
    #[arg(long)]
    report: Option<PathBuf>,

    /// Write the text tree of exercised classes.
    #[arg(long)]
    hierarchy: Option<PathBuf>,

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

    let input: Box<dyn BufRead> = match &args.input {
        Some(path) => Box::new(BufReader::new(
            File::open(path).with_context(|| format!("failed to open {}", path.display()))?,
        )),
        None => Box::new(io::stdin().lock()),
    };
    let mut output: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("failed to create {}", path.display()))?,
        )),
        None => Box::new(BufWriter::new(io::stdout().lock())),
    };

    let mut translator = EntityTranslator::new(&prepared.resolver, prepared.translator_config());
    let mut guard = ConsistencyGuard::new(prepared.guard_config());
    let mut fatal = None;

    'records: for (index, line) in input.lines().enumerate() {
        let line = line.context("failed to read input")?;
        if line.trim().is_empty() {
            continue;
        }
        let record: Record = serde_json::from_str(&line)
            .with_context(|| format!("line {}: not a node or relationship record", index + 1))?;
        let Some(translated) = translator.translate(record) else {
            continue;
        };
        for entity in translated {
            match guard.check(&entity) {
                Ok(Admission::Accepted) => {
                    serde_json::to_writer(&mut output, &entity)
                        .context("failed to write entity")?;
                    output.write_all(b"\n").context("failed to write entity")?;
                }
                Ok(Admission::Rejected(_)) => {}
                Err(err) => {
                    fatal = Some(err);
                    break 'records;
                }
            }
        }
    }
    output.flush().context("failed to flush output")?;

    let tally = translator.into_tally();
    info!(
        records = tally.records,
        entities = tally.emitted,
        accepted = guard.accepted(),
        "translation finished"
    );

    let mut report = run_report(&tally, &guard, &prepared.resolver);
    if let Some(err) = &fatal {
        report.push(Finding::fail("guard/fatal", err.to_string()));
    }

    if let Some(path) = &args.hierarchy {
        let tree = HierarchyTree::exercised(&prepared.catalog, &tally)
            .context("failed to prune the exercised hierarchy")?;
        fs::write(path, tree.to_text())
            .with_context(|| format!("failed to write {}", path.display()))?;
    }
    if let Some(path) = &args.report {
        let json = serde_json::to_string_pretty(&report).context("failed to serialize report")?;
        fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))?;
    }

    eprintln!("biograph translation report");
    eprintln!("===========================");
    eprint!("{}", report.render());

    if !report.all_passed() {
        eprintln!("Translation FAILED.");
        process::exit(1);
    }
    Ok(())
}
