//! Deterministic relationship ids.

use sha2::{Digest, Sha256};

use crate::record::Properties;
use crate::value::PropertyValue;

/// SHA-256 hex digest of the source id, the target id and the supplied
/// properties in key order.
///
/// Every field is length-prefixed and every value carries its variant tag,
/// so `1` and `"1"`, or `null` and `""`, hash differently.
#[must_use]
pub fn relationship_id(source: &str, target: &str, properties: &Properties) -> String {
    let mut hasher = Sha256::new();
    feed_str(&mut hasher, source);
    feed_str(&mut hasher, target);
    feed_len(&mut hasher, properties.len());
    for (key, value) in properties {
        feed_str(&mut hasher, key);
        feed_value(&mut hasher, value);
    }
    format!("{:x}", hasher.finalize())
}

fn feed_len(hasher: &mut Sha256, len: usize) {
    hasher.update((len as u64).to_be_bytes());
}

fn feed_str(hasher: &mut Sha256, text: &str) {
    feed_len(hasher, text.len());
    hasher.update(text.as_bytes());
}

fn feed_value(hasher: &mut Sha256, value: &PropertyValue) {
    match value {
        PropertyValue::Absent => hasher.update([0]),
        PropertyValue::Bool(b) => hasher.update([1, u8::from(*b)]),
        PropertyValue::Int(i) => {
            hasher.update([2]);
            hasher.update(i.to_be_bytes());
        }
        PropertyValue::Float(f) => {
            hasher.update([3]);
            hasher.update(f.to_bits().to_be_bytes());
        }
        PropertyValue::Str(text) => {
            hasher.update([4]);
            feed_str(hasher, text);
        }
        PropertyValue::List(items) => {
            hasher.update([5]);
            feed_len(hasher, items.len());
            for item in items {
                feed_value(hasher, item);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_content_gives_identical_ids() {
        let mut a = Properties::new();
        a.insert("score".into(), PropertyValue::Float(0.9));
        a.insert("evidence".into(), "ECO:0000269".into());
        let mut b = Properties::new();
        b.insert("evidence".into(), "ECO:0000269".into());
        b.insert("score".into(), PropertyValue::Float(0.9));
        assert_eq!(relationship_id("g", "d", &a), relationship_id("g", "d", &b));
        assert_eq!(relationship_id("g", "d", &a).len(), 64);
    }

    #[test]
    fn direction_and_boundaries_matter() {
        let empty = Properties::new();
        assert_ne!(
            relationship_id("a", "b", &empty),
            relationship_id("b", "a", &empty)
        );
        assert_ne!(
            relationship_id("ab", "c", &empty),
            relationship_id("a", "bc", &empty)
        );
    }

    fn single(value: PropertyValue) -> String {
        let mut properties = Properties::new();
        properties.insert("n".into(), value);
        relationship_id("s", "t", &properties)
    }

    #[test]
    fn value_types_are_distinguished() {
        assert_ne!(
            single(PropertyValue::Int(1)),
            single(PropertyValue::Str("1".into()))
        );
        assert_ne!(
            single(PropertyValue::Absent),
            single(PropertyValue::Str(String::new()))
        );
        assert_ne!(
            single(PropertyValue::List(vec!["x".into(), "y".into()])),
            single(PropertyValue::Str("x|y".into()))
        );
        assert_ne!(
            single(PropertyValue::Bool(true)),
            single(PropertyValue::Str("true".into()))
        );
        assert_ne!(
            single(PropertyValue::Float(1.0)),
            single(PropertyValue::Int(1))
        );
    }

    #[test]
    fn empty_and_missing_properties_differ() {
        let mut with_empty = Properties::new();
        with_empty.insert("n".into(), PropertyValue::Absent);
        assert_ne!(
            relationship_id("s", "t", &Properties::new()),
            relationship_id("s", "t", &with_empty)
        );
    }
}
