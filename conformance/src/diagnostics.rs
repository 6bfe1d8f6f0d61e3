//! End-of-run findings from a translation tally and a guard.

use std::collections::BTreeMap;

use biograph_schema::ClassResolver;
use biograph_translate::{LabelTally, TranslationTally};

use crate::guard::ConsistencyGuard;
use crate::report::{Finding, RunReport};

/// Builds the run report.
///
/// Dropped records, coercion failures, unused schema entries and strict-mode
/// rejections are warnings; none of them fail a run on their own.
#[must_use]
pub fn run_report(
    tally: &TranslationTally,
    guard: &ConsistencyGuard,
    resolver: &ClassResolver,
) -> RunReport {
    let mut report = RunReport::new();

    report.push(Finding::pass(
        "translate/records",
        format!(
            "{} records in, {} entities out, {} dropped",
            tally.records,
            tally.emitted,
            tally.dropped()
        ),
    ));

    report.push(labelled(
        "translate/unaccounted",
        "input labels with no schema class",
        &tally.unaccounted,
    ));
    report.push(labelled(
        "translate/kind",
        "labels whose records do not fit their class",
        &tally.kind_mismatches,
    ));

    let failures: Vec<String> = tally
        .coercion_failures
        .iter()
        .flat_map(|(class, keys)| {
            keys.iter()
                .map(move |(key, t)| format!("{class}.{key}: {}", describe(t)))
        })
        .collect();
    report.push(if failures.is_empty() {
        Finding::pass("translate/coercion", "all values fit their declared types")
    } else {
        Finding::warn(
            "translate/coercion",
            format!(
                "{} values did not fit their declared type",
                tally.coercion_failure_count()
            ),
        )
        .with_details(failures)
    });

    if !tally.discarded_properties.is_empty() {
        let details = tally
            .discarded_properties
            .iter()
            .map(|(class, keys)| {
                let keys: Vec<&str> = keys.iter().map(String::as_str).collect();
                format!("{class}: {}", keys.join(", "))
            })
            .collect();
        report.push(
            Finding::pass("translate/discarded", "undeclared properties were discarded")
                .with_details(details),
        );
    }

    let unused = tally.unused_schema_entries(resolver);
    report.push(if unused.is_empty() {
        Finding::pass("schema/unused", "every routed class received records")
    } else {
        Finding::warn(
            "schema/unused",
            format!("{} schema classes received no records", unused.len()),
        )
        .with_details(unused.into_iter().map(str::to_owned).collect())
    });

    if guard.config().strict_mode {
        report.push(labelled(
            "guard/strict",
            "entities rejected for missing provenance",
            guard.rejections(),
        ));
    }
    report.push(Finding::pass(
        "guard/shape",
        format!(
            "{} entities accepted across {} classes with stable key sets",
            guard.accepted(),
            guard.shapes().len()
        ),
    ));

    report
}

fn labelled(check: &str, what: &str, tallies: &BTreeMap<String, LabelTally>) -> Finding {
    if tallies.is_empty() {
        return Finding::pass(check, format!("no {what}"));
    }
    let total: usize = tallies.values().map(|t| t.count).sum();
    let details = tallies
        .iter()
        .map(|(label, t)| format!("{label}: {}", describe(t)))
        .collect();
    Finding::warn(check, format!("{total} {what}")).with_details(details)
}

fn describe(tally: &LabelTally) -> String {
    format!("{} (e.g. {})", tally.count, tally.examples.join(", "))
}
