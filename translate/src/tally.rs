//! Per-run translation counters.

use std::collections::{BTreeMap, BTreeSet};

use biograph_schema::ClassResolver;
use serde::Serialize;

/// Example record ids kept per finding.
pub const MAX_EXAMPLES: usize = 5;

/// A count plus the first few offending record ids.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LabelTally {
    /// Occurrences.
    pub count: usize,
    /// Up to [`MAX_EXAMPLES`] record ids.
    pub examples: Vec<String>,
}

impl LabelTally {
    /// Counts one occurrence.
    pub fn hit(&mut self, example: &str) {
        self.count += 1;
        if self.examples.len() < MAX_EXAMPLES {
            self.examples.push(example.to_owned());
        }
    }

    /// Adds `other`'s counts and examples.
    pub fn merge(&mut self, other: LabelTally) {
        self.count += other.count;
        let room = MAX_EXAMPLES.saturating_sub(self.examples.len());
        self.examples.extend(other.examples.into_iter().take(room));
    }
}

/// What a translator saw: record counts, dropped records and soft
/// property problems.
///
/// Each worker owns one; [`TranslationTally::merge`] folds them together.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TranslationTally {
    /// Records consumed.
    pub records: usize,
    /// Entities produced, links included.
    pub emitted: usize,
    /// Input labels with no routed class.
    pub unaccounted: BTreeMap<String, LabelTally>,
    /// Entities produced per class.
    pub exercised: BTreeMap<String, usize>,
    /// Values that could not be coerced, by class then key.
    pub coercion_failures: BTreeMap<String, BTreeMap<String, LabelTally>>,
    /// Records whose shape does not fit their class, by input label.
    pub kind_mismatches: BTreeMap<String, LabelTally>,
    /// Supplied keys outside the class schema, by class.
    pub discarded_properties: BTreeMap<String, BTreeSet<String>>,
}

impl TranslationTally {
    pub(crate) fn unaccounted(&mut self, label: &str, record: &str) {
        self.unaccounted
            .entry(label.to_owned())
            .or_default()
            .hit(record);
    }

    pub(crate) fn kind_mismatch(&mut self, label: &str, record: &str) {
        self.kind_mismatches
            .entry(label.to_owned())
            .or_default()
            .hit(record);
    }

    pub(crate) fn coercion_failure(&mut self, class: &str, key: &str, record: &str) {
        self.coercion_failures
            .entry(class.to_owned())
            .or_default()
            .entry(key.to_owned())
            .or_default()
            .hit(record);
    }

    pub(crate) fn discarded(&mut self, class: &str, key: String) {
        if let Some(keys) = self.discarded_properties.get_mut(class) {
            keys.insert(key);
        } else {
            self.discarded_properties
                .insert(class.to_owned(), BTreeSet::from([key]));
        }
    }

    pub(crate) fn exercised(&mut self, class: &str) {
        *self.exercised.entry(class.to_owned()).or_default() += 1;
    }

    /// Records dropped from the output stream.
    #[must_use]
    pub fn dropped(&self) -> usize {
        self.unaccounted
            .values()
            .chain(self.kind_mismatches.values())
            .map(|t| t.count)
            .sum()
    }

    /// Total failed coercions.
    #[must_use]
    pub fn coercion_failure_count(&self) -> usize {
        self.coercion_failures
            .values()
            .flat_map(BTreeMap::values)
            .map(|t| t.count)
            .sum()
    }

    /// Routed classes that no record reached, in catalog order.
    #[must_use]
    pub fn unused_schema_entries<'r>(&self, resolver: &'r ClassResolver) -> Vec<&'r str> {
        resolver
            .routed_classes()
            .filter(|class| !self.exercised.contains_key(&class.name))
            .map(|class| class.name.as_str())
            .collect()
    }

    /// Folds another worker's tally into this one.
    pub fn merge(&mut self, other: TranslationTally) {
        self.records += other.records;
        self.emitted += other.emitted;
        for (label, tally) in other.unaccounted {
            self.unaccounted.entry(label).or_default().merge(tally);
        }
        for (class, count) in other.exercised {
            *self.exercised.entry(class).or_default() += count;
        }
        for (class, keys) in other.coercion_failures {
            let mine = self.coercion_failures.entry(class).or_default();
            for (key, tally) in keys {
                mine.entry(key).or_default().merge(tally);
            }
        }
        for (label, tally) in other.kind_mismatches {
            self.kind_mismatches.entry(label).or_default().merge(tally);
        }
        for (class, keys) in other.discarded_properties {
            self.discarded_properties
                .entry(class)
                .or_default()
                .extend(keys);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn examples_are_capped() {
        let mut tally = LabelTally::default();
        for i in 0..8 {
            tally.hit(&format!("r{i}"));
        }
        assert_eq!(tally.count, 8);
        assert_eq!(tally.examples, ["r0", "r1", "r2", "r3", "r4"]);
    }

    #[test]
    fn merge_adds_counts_and_keeps_cap() {
        let mut a = TranslationTally {
            records: 3,
            ..TranslationTally::default()
        };
        a.unaccounted("mystery", "a1");
        a.exercised("gene");
        a.discarded("gene", "color".into());

        let mut b = TranslationTally {
            records: 2,
            ..TranslationTally::default()
        };
        for i in 0..6 {
            b.unaccounted("mystery", &format!("b{i}"));
        }
        b.exercised("gene");
        b.coercion_failure("gene", "length", "b0");
        b.discarded("gene", "shape".into());

        a.merge(b);
        assert_eq!(a.records, 5);
        assert_eq!(a.unaccounted["mystery"].count, 7);
        assert_eq!(a.unaccounted["mystery"].examples.len(), MAX_EXAMPLES);
        assert_eq!(a.exercised["gene"], 2);
        assert_eq!(a.coercion_failure_count(), 1);
        assert_eq!(a.dropped(), 7);
        assert_eq!(
            a.discarded_properties["gene"],
            BTreeSet::from(["color".to_owned(), "shape".to_owned()])
        );
    }
}
