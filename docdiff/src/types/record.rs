use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

/// Key identifying a record on either side of a diff.
///
/// Ordering is byte-wise lexicographic, which matches the order in which Elasticsearch sorts
/// `_id` values.
pub type RecordId = String;

/// Opaque structured payload of a [`Record`].
///
/// Equality is deep and structural. Objects compare as unordered key maps, arrays compare
/// element-wise in order and numbers compare by numeric value, so `599` equals `599.0`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Content(Value);

impl Content {
    /// Creates a new [`Content`] from a JSON value.
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    /// Returns the underlying JSON value.
    pub fn as_value(&self) -> &Value {
        &self.0
    }

    /// Consumes the content and returns the underlying JSON value.
    pub fn into_value(self) -> Value {
        self.0
    }
}

impl PartialEq for Content {
    fn eq(&self, other: &Self) -> bool {
        values_eq(&self.0, &other.0)
    }
}

impl From<Value> for Content {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

impl fmt::Display for Content {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Compares two JSON values structurally with numeric equality for numbers.
pub fn values_eq(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Null, Value::Null) => true,
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (Value::String(a), Value::String(b)) => a == b,
        (Value::Number(a), Value::Number(b)) => numbers_eq(a, b),
        (Value::Array(a), Value::Array(b)) => {
            a.len() == b.len() && a.iter().zip(b.iter()).all(|(a, b)| values_eq(a, b))
        }
        (Value::Object(a), Value::Object(b)) => objects_eq(a, b),
        _ => false,
    }
}

fn numbers_eq(left: &Number, right: &Number) -> bool {
    match (integer(left), integer(right)) {
        (Some(a), Some(b)) => a == b,
        (Some(a), None) => right.as_f64().is_some_and(|b| float_eq_integer(b, a)),
        (None, Some(b)) => left.as_f64().is_some_and(|a| float_eq_integer(a, b)),
        (None, None) => match (left.as_f64(), right.as_f64()) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        },
    }
}

fn integer(number: &Number) -> Option<i128> {
    number
        .as_i64()
        .map(i128::from)
        .or_else(|| number.as_u64().map(i128::from))
}

/// Integral floats compare exactly, `2^53 + 1` does not equal `2^53` as a float.
fn float_eq_integer(float: f64, integer: i128) -> bool {
    float.is_finite() && float.fract() == 0.0 && float as i128 == integer
}

fn objects_eq(left: &Map<String, Value>, right: &Map<String, Value>) -> bool {
    left.len() == right.len()
        && left.iter().all(|(key, value)| {
            right
                .get(key)
                .is_some_and(|other| values_eq(value, other))
        })
}

/// A single comparable unit read from one side of a diff.
///
/// Serializes to and from the `{"_id": ..., "_source": ...}` shape used by Elasticsearch hits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    #[serde(rename = "_id")]
    pub id: RecordId,
    #[serde(rename = "_source", default)]
    pub content: Content,
}

impl Record {
    /// Creates a new [`Record`].
    pub fn new(id: impl Into<RecordId>, content: impl Into<Content>) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn integers_and_floats_compare_numerically() {
        assert_eq!(
            Content::new(json!({"X": 599})),
            Content::new(json!({"X": 599.0}))
        );
        assert_ne!(
            Content::new(json!({"X": 599})),
            Content::new(json!({"X": 600}))
        );
        assert_eq!(Content::new(json!(-3)), Content::new(json!(-3.0)));
    }

    #[test]
    fn large_integers_compare_exactly() {
        let a = Content::new(json!(9_007_199_254_740_993u64));
        let b = Content::new(json!(9_007_199_254_740_992u64));
        assert_ne!(a, b);
    }

    #[test]
    fn integers_and_floats_compare_exactly() {
        let float = Content::new(json!(9_007_199_254_740_992.0));
        assert_eq!(Content::new(json!(9_007_199_254_740_992u64)), float);
        assert_ne!(Content::new(json!(9_007_199_254_740_993u64)), float);

        assert_ne!(Content::new(json!(u64::MAX)), Content::new(json!(u64::MAX as f64)));
        assert_ne!(Content::new(json!(7)), Content::new(json!(7.5)));
    }

    #[test]
    fn objects_compare_regardless_of_key_order() {
        let a: Value = serde_json::from_str(r#"{"a": 1, "b": [1, 2, {"c": null}]}"#).unwrap();
        let b: Value = serde_json::from_str(r#"{"b": [1, 2, {"c": null}], "a": 1}"#).unwrap();
        assert_eq!(Content::new(a), Content::new(b));
    }

    #[test]
    fn arrays_compare_in_order() {
        assert_ne!(Content::new(json!([1, 2])), Content::new(json!([2, 1])));
        assert_ne!(Content::new(json!([1, 2])), Content::new(json!([1, 2, 3])));
    }

    #[test]
    fn mismatched_types_are_not_equal() {
        assert_ne!(Content::new(json!("1")), Content::new(json!(1)));
        assert_ne!(Content::new(json!(null)), Content::new(json!(false)));
        assert_ne!(Content::new(json!({})), Content::new(json!([])));
    }

    #[test]
    fn record_round_trips_through_hit_shape() {
        let record: Record =
            serde_json::from_str(r#"{"_index": "a", "_id": "7", "_source": {"name": "x"}}"#)
                .unwrap();
        assert_eq!(record, Record::new("7", json!({"name": "x"})));

        let encoded = serde_json::to_value(&record).unwrap();
        assert_eq!(encoded, json!({"_id": "7", "_source": {"name": "x"}}));
    }

    #[test]
    fn record_without_source_has_null_content() {
        let record: Record = serde_json::from_str(r#"{"_id": "7"}"#).unwrap();
        assert_eq!(record.content.as_value(), &Value::Null);
    }
}
