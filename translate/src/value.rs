//! Property values and coercion to declared types.

use std::fmt;

use biograph_ontology::{PropertyType, ScalarType};
use serde::{Deserialize, Serialize};

/// A property value as supplied by a record or emitted on an entity.
///
/// Serialized untagged; [`PropertyValue::Absent`] is `null`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    /// Declared but not supplied (or not coercible).
    #[default]
    Absent,
    /// Boolean.
    Bool(bool),
    /// Integer.
    Int(i64),
    /// Float.
    Float(f64),
    /// Text.
    Str(String),
    /// List of values.
    List(Vec<PropertyValue>),
}

impl PropertyValue {
    /// True for [`PropertyValue::Absent`].
    #[must_use]
    pub fn is_absent(&self) -> bool {
        matches!(self, PropertyValue::Absent)
    }

    /// Converts the value to `ty`, or `None` if it cannot be represented.
    ///
    /// Numeric and boolean strings parse, empty strings become absent,
    /// scalars wrap into one-element lists, `|`-joined strings split into
    /// lists, and lists bound for a text property join with `|`.
    #[must_use]
    pub fn coerce(self, ty: PropertyType) -> Option<PropertyValue> {
        match (self, ty) {
            (PropertyValue::Absent, _) => Some(PropertyValue::Absent),
            (value, PropertyType::Scalar(scalar)) => value.coerce_scalar(scalar),
            (PropertyValue::List(items), PropertyType::Array(scalar)) => items
                .into_iter()
                .map(|item| item.coerce_scalar(scalar))
                .collect::<Option<Vec<_>>>()
                .map(PropertyValue::List),
            (PropertyValue::Str(text), PropertyType::Array(scalar)) if text.contains('|') => text
                .split('|')
                .map(|part| PropertyValue::Str(part.to_owned()).coerce_scalar(scalar))
                .collect::<Option<Vec<_>>>()
                .map(PropertyValue::List),
            (value, PropertyType::Array(scalar)) => match value.coerce_scalar(scalar)? {
                PropertyValue::Absent => Some(PropertyValue::Absent),
                single => Some(PropertyValue::List(vec![single])),
            },
        }
    }

    fn coerce_scalar(self, scalar: ScalarType) -> Option<PropertyValue> {
        use PropertyValue as V;

        match (self, scalar) {
            (V::Absent, _) => Some(V::Absent),
            (V::Str(text), ScalarType::Str) => Some(V::Str(text)),
            (V::Str(text), _) if text.trim().is_empty() => Some(V::Absent),
            (V::List(items), ScalarType::Str) => {
                let parts = items
                    .into_iter()
                    .map(|item| match item.coerce_scalar(ScalarType::Str)? {
                        V::Str(text) => Some(text),
                        _ => Some(String::new()),
                    })
                    .collect::<Option<Vec<_>>>()?;
                Some(V::Str(parts.join("|")))
            }
            (V::List(mut items), _) if items.len() == 1 => items.pop()?.coerce_scalar(scalar),
            (V::List(_), _) => None,
            (value, ScalarType::Str) => Some(V::Str(value.to_string())),

            (V::Int(i), ScalarType::Int) => Some(V::Int(i)),
            (V::Float(f), ScalarType::Int) => float_to_int(f).map(V::Int),
            (V::Str(text), ScalarType::Int) => text.trim().parse().ok().map(V::Int),

            (V::Float(f), ScalarType::Float) => Some(V::Float(f)),
            #[allow(clippy::cast_precision_loss)]
            (V::Int(i), ScalarType::Float) => Some(V::Float(i as f64)),
            (V::Str(text), ScalarType::Float) => text.trim().parse().ok().map(V::Float),

            (V::Bool(b), ScalarType::Bool) => Some(V::Bool(b)),
            (V::Int(0), ScalarType::Bool) => Some(V::Bool(false)),
            (V::Int(1), ScalarType::Bool) => Some(V::Bool(true)),
            (V::Str(text), ScalarType::Bool) => parse_bool(&text).map(V::Bool),

            _ => None,
        }
    }
}

#[allow(clippy::cast_possible_truncation)]
fn float_to_int(f: f64) -> Option<i64> {
    // i64::MAX is not representable as f64; stay strictly below 2^63
    const LIMIT: f64 = 9_223_372_036_854_775_808.0;
    (f.is_finite() && f.fract() == 0.0 && f >= -LIMIT && f < LIMIT).then_some(f as i64)
}

fn parse_bool(text: &str) -> Option<bool> {
    match text.trim().to_ascii_lowercase().as_str() {
        "true" | "t" | "yes" | "y" | "1" => Some(true),
        "false" | "f" | "no" | "n" | "0" => Some(false),
        _ => None,
    }
}

/// Canonical text form: absent is empty, lists join with `|`.
impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::Absent => Ok(()),
            PropertyValue::Bool(b) => write!(f, "{b}"),
            PropertyValue::Int(i) => write!(f, "{i}"),
            PropertyValue::Float(x) => write!(f, "{x}"),
            PropertyValue::Str(s) => f.write_str(s),
            PropertyValue::List(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str("|")?;
                    }
                    write!(f, "{item}")?;
                }
                Ok(())
            }
        }
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        PropertyValue::Str(value.to_owned())
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        PropertyValue::Str(value)
    }
}

impl From<i64> for PropertyValue {
    fn from(value: i64) -> Self {
        PropertyValue::Int(value)
    }
}

impl From<f64> for PropertyValue {
    fn from(value: f64) -> Self {
        PropertyValue::Float(value)
    }
}

impl From<bool> for PropertyValue {
    fn from(value: bool) -> Self {
        PropertyValue::Bool(value)
    }
}
