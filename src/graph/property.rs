//! Attribute values and the per-entity attribute bag
//!
//! Every node and edge carries an [`Attributes`] bag: string keys mapped to
//! dynamically typed [`AttributeValue`]s. Insertion order is kept so JSON
//! output is deterministic.

use super::store::{GraphError, GraphResult};
use indexmap::IndexMap;
use serde::{ser, Deserialize, Serialize, Serializer};
use std::fmt;
use thiserror::Error;

/// Attribute value supporting the JSON data model
///
/// Supports:
/// - Null
/// - Boolean
/// - Integer (i64)
/// - Float (f64)
/// - String
/// - Array (Vec<AttributeValue>)
/// - Map (insertion-ordered)
///
/// JSON has no NaN or infinity, so encoding a non-finite float fails
/// with an encode error rather than writing `null`. Decoded integers
/// outside the `i64` range become floats and may lose precision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Null,
    Boolean(bool),
    Integer(i64),
    #[serde(serialize_with = "serialize_finite")]
    Float(f64),
    String(String),
    Array(Vec<AttributeValue>),
    Map(IndexMap<String, AttributeValue>),
}

fn serialize_finite<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    if !value.is_finite() {
        return Err(ser::Error::custom(format!("non-finite float {} has no JSON form", value)));
    }
    serializer.serialize_f64(*value)
}

impl AttributeValue {
    pub fn is_null(&self) -> bool {
        matches!(self, AttributeValue::Null)
    }

    pub fn as_string(&self) -> Option<&str> {
        match self {
            AttributeValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            AttributeValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Integers widen to floats
    pub fn as_float(&self) -> Option<f64> {
        match self {
            AttributeValue::Float(f) => Some(*f),
            AttributeValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_boolean(&self) -> Option<bool> {
        match self {
            AttributeValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&Vec<AttributeValue>> {
        match self {
            AttributeValue::Array(arr) => Some(arr),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&IndexMap<String, AttributeValue>> {
        match self {
            AttributeValue::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Get type name as string
    pub fn type_name(&self) -> &'static str {
        match self {
            AttributeValue::Null => "Null",
            AttributeValue::Boolean(_) => "Boolean",
            AttributeValue::Integer(_) => "Integer",
            AttributeValue::Float(_) => "Float",
            AttributeValue::String(_) => "String",
            AttributeValue::Array(_) => "Array",
            AttributeValue::Map(_) => "Map",
        }
    }
}

/// Compact rendering for logs and listings: strings unquoted, floats
/// with their shortest exact form, collections in JSON-like brackets
impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeValue::Null => f.write_str("null"),
            AttributeValue::Boolean(b) => b.fmt(f),
            AttributeValue::Integer(i) => i.fmt(f),
            AttributeValue::Float(x) => write!(f, "{:?}", x),
            AttributeValue::String(s) => f.write_str(s),
            AttributeValue::Array(items) => {
                f.write_str("[")?;
                let mut sep = "";
                for item in items {
                    write!(f, "{}{}", sep, item)?;
                    sep = ", ";
                }
                f.write_str("]")
            }
            AttributeValue::Map(entries) => {
                f.write_str("{")?;
                let mut sep = "";
                for (key, value) in entries {
                    write!(f, "{}{}={}", sep, key, value)?;
                    sep = ", ";
                }
                f.write_str("}")
            }
        }
    }
}

// Convenience conversions
impl From<String> for AttributeValue {
    fn from(s: String) -> Self {
        AttributeValue::String(s)
    }
}

impl From<&str> for AttributeValue {
    fn from(s: &str) -> Self {
        AttributeValue::String(s.to_string())
    }
}

impl From<i64> for AttributeValue {
    fn from(i: i64) -> Self {
        AttributeValue::Integer(i)
    }
}

impl From<i32> for AttributeValue {
    fn from(i: i32) -> Self {
        AttributeValue::Integer(i as i64)
    }
}

impl From<f64> for AttributeValue {
    fn from(f: f64) -> Self {
        AttributeValue::Float(f)
    }
}

impl From<bool> for AttributeValue {
    fn from(b: bool) -> Self {
        AttributeValue::Boolean(b)
    }
}

impl From<Vec<AttributeValue>> for AttributeValue {
    fn from(arr: Vec<AttributeValue>) -> Self {
        AttributeValue::Array(arr)
    }
}

impl From<IndexMap<String, AttributeValue>> for AttributeValue {
    fn from(map: IndexMap<String, AttributeValue>) -> Self {
        AttributeValue::Map(map)
    }
}

impl From<serde_json::Value> for AttributeValue {
    fn from(value: serde_json::Value) -> Self {
        use serde_json::Value;
        match value {
            Value::Null => AttributeValue::Null,
            Value::Bool(b) => AttributeValue::Boolean(b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => AttributeValue::Integer(i),
                None => n.as_f64().map(AttributeValue::Float).unwrap_or(AttributeValue::Null),
            },
            Value::String(s) => AttributeValue::String(s),
            Value::Array(arr) => AttributeValue::Array(arr.into_iter().map(Into::into).collect()),
            Value::Object(obj) => {
                AttributeValue::Map(obj.into_iter().map(|(k, v)| (k, v.into())).collect())
            }
        }
    }
}

/// Strict attribute read failures
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AttributeError {
    #[error("Attribute {0} not found")]
    Missing(String),

    #[error("Attribute {key} is {found}, expected {expected}")]
    TypeMismatch {
        key: String,
        expected: &'static str,
        found: &'static str,
    },
}

pub type AttributeResult<T> = Result<T, AttributeError>;

/// Attribute bag attached to every node and edge
///
/// Writes are last-write-wins. The `get_*` readers are lenient: a missing
/// key or a value of another type reads as the type's zero value. The
/// `try_get_*` readers report which of the two happened.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Attributes(IndexMap<String, AttributeValue>);

impl Attributes {
    pub fn new() -> Self {
        Attributes(IndexMap::new())
    }

    /// Set a value, replacing any previous one under the same key
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<AttributeValue>) -> Option<AttributeValue> {
        self.0.insert(key.into(), value.into())
    }

    /// Merge entries, overwriting existing keys
    pub fn set_all<K, V>(&mut self, entries: impl IntoIterator<Item = (K, V)>)
    where
        K: Into<String>,
        V: Into<AttributeValue>,
    {
        for (key, value) in entries {
            self.0.insert(key.into(), value.into());
        }
    }

    pub fn get(&self, key: &str) -> Option<&AttributeValue> {
        self.0.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    fn lookup(&self, key: &str) -> AttributeResult<&AttributeValue> {
        self.0
            .get(key)
            .ok_or_else(|| AttributeError::Missing(key.to_string()))
    }

    fn mismatch(key: &str, expected: &'static str, found: &AttributeValue) -> AttributeError {
        AttributeError::TypeMismatch {
            key: key.to_string(),
            expected,
            found: found.type_name(),
        }
    }

    pub fn try_get_string(&self, key: &str) -> AttributeResult<&str> {
        let value = self.lookup(key)?;
        value.as_string().ok_or_else(|| Self::mismatch(key, "String", value))
    }

    pub fn try_get_int(&self, key: &str) -> AttributeResult<i64> {
        let value = self.lookup(key)?;
        value.as_integer().ok_or_else(|| Self::mismatch(key, "Integer", value))
    }

    pub fn try_get_float(&self, key: &str) -> AttributeResult<f64> {
        let value = self.lookup(key)?;
        value.as_float().ok_or_else(|| Self::mismatch(key, "Float", value))
    }

    pub fn try_get_bool(&self, key: &str) -> AttributeResult<bool> {
        let value = self.lookup(key)?;
        value.as_boolean().ok_or_else(|| Self::mismatch(key, "Boolean", value))
    }

    /// String value, or "" if missing or not a string
    pub fn get_string(&self, key: &str) -> String {
        self.try_get_string(key).map(str::to_string).unwrap_or_default()
    }

    /// Integer value, or 0 if missing or not an integer
    pub fn get_int(&self, key: &str) -> i64 {
        self.try_get_int(key).unwrap_or_default()
    }

    /// Float value, or 0.0 if missing or not numeric
    pub fn get_float(&self, key: &str) -> f64 {
        self.try_get_float(key).unwrap_or_default()
    }

    /// Boolean value, or false if missing or not a boolean
    pub fn get_bool(&self, key: &str) -> bool {
        self.try_get_bool(key).unwrap_or_default()
    }

    /// Remove a key; no-op if absent
    pub fn del(&mut self, key: &str) -> Option<AttributeValue> {
        self.0.shift_remove(key)
    }

    /// Visit entries in insertion order until `f` returns false
    pub fn range(&self, mut f: impl FnMut(&str, &AttributeValue) -> bool) {
        for (key, value) in &self.0 {
            if !f(key, value) {
                break;
            }
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    pub fn iter(&self) -> indexmap::map::Iter<'_, String, AttributeValue> {
        self.0.iter()
    }

    /// Encode as a JSON object
    pub fn to_json(&self) -> GraphResult<Vec<u8>> {
        serde_json::to_vec(self).map_err(GraphError::Encode)
    }

    /// Replace the content with a decoded JSON object
    ///
    /// On failure the bag is left unchanged.
    pub fn from_json(&mut self, bytes: &[u8]) -> GraphResult<()> {
        let decoded: Attributes = serde_json::from_slice(bytes).map_err(GraphError::Decode)?;
        *self = decoded;
        Ok(())
    }
}

impl<K: Into<String>, V: Into<AttributeValue>> FromIterator<(K, V)> for Attributes {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut attributes = Attributes::new();
        attributes.set_all(iter);
        attributes
    }
}

impl IntoIterator for Attributes {
    type Item = (String, AttributeValue);
    type IntoIter = indexmap::map::IntoIter<String, AttributeValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Attributes {
    type Item = (&'a String, &'a AttributeValue);
    type IntoIter = indexmap::map::Iter<'a, String, AttributeValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Attributes {
        let mut attrs = Attributes::new();
        attrs.set("name", "Alice");
        attrs.set("age", 30i64);
        attrs.set("score", 95.5);
        attrs.set("active", true);
        attrs
    }

    #[test]
    fn test_attribute_value_types() {
        assert_eq!(AttributeValue::String("test".to_string()).type_name(), "String");
        assert_eq!(AttributeValue::Integer(42).type_name(), "Integer");
        assert_eq!(AttributeValue::Float(3.14).type_name(), "Float");
        assert_eq!(AttributeValue::Boolean(true).type_name(), "Boolean");
        assert_eq!(AttributeValue::Array(vec![]).type_name(), "Array");
        assert_eq!(AttributeValue::Map(IndexMap::new()).type_name(), "Map");
        assert_eq!(AttributeValue::Null.type_name(), "Null");
    }

    #[test]
    fn test_set_and_get() {
        let attrs = sample();
        assert_eq!(attrs.get_string("name"), "Alice");
        assert_eq!(attrs.get_int("age"), 30);
        assert_eq!(attrs.get_float("score"), 95.5);
        assert!(attrs.get_bool("active"));
        assert_eq!(attrs.get("age"), Some(&AttributeValue::Integer(30)));
        assert_eq!(attrs.get("missing"), None);
    }

    #[test]
    fn test_lenient_reads() {
        let attrs = sample();
        assert_eq!(attrs.get_int("missing"), 0);
        assert_eq!(attrs.get_string("missing"), "");
        assert!(!attrs.get_bool("missing"));

        // Wrong type collapses to zero value
        assert_eq!(attrs.get_int("name"), 0);
        assert_eq!(attrs.get_string("age"), "");
        assert!(!attrs.get_bool("score"));
    }

    #[test]
    fn test_strict_reads() {
        let attrs = sample();
        assert_eq!(attrs.try_get_int("age"), Ok(30));
        assert_eq!(
            attrs.try_get_int("missing"),
            Err(AttributeError::Missing("missing".to_string()))
        );
        assert_eq!(
            attrs.try_get_bool("name"),
            Err(AttributeError::TypeMismatch {
                key: "name".to_string(),
                expected: "Boolean",
                found: "String",
            })
        );
        assert_eq!(attrs.try_get_float("age"), Ok(30.0));
    }

    #[test]
    fn test_set_all_overwrites() {
        let mut attrs = sample();
        attrs.set_all([("age", AttributeValue::from(31i64)), ("city", "Paris".into())]);
        assert_eq!(attrs.get_int("age"), 31);
        assert_eq!(attrs.get_string("city"), "Paris");
        assert_eq!(attrs.len(), 5);
    }

    #[test]
    fn test_del() {
        let mut attrs = sample();
        assert!(attrs.del("age").is_some());
        assert!(attrs.del("age").is_none());
        assert!(!attrs.contains("age"));
        assert_eq!(attrs.len(), 3);
    }

    #[test]
    fn test_range_early_exit() {
        let attrs = sample();
        let mut seen = Vec::new();
        attrs.range(|key, _| {
            seen.push(key.to_string());
            seen.len() < 2
        });
        assert_eq!(seen, vec!["name", "age"]);
    }

    #[test]
    fn test_json_preserves_order_and_values() {
        let attrs = sample();
        let json = attrs.to_json().unwrap();
        assert_eq!(
            String::from_utf8(json.clone()).unwrap(),
            r#"{"name":"Alice","age":30,"score":95.5,"active":true}"#
        );

        let mut decoded = Attributes::new();
        decoded.set("stale", "value");
        decoded.from_json(&json).unwrap();
        assert_eq!(decoded, attrs);
        assert!(!decoded.contains("stale"));
    }

    #[test]
    fn test_nested_values_from_json() {
        let mut attrs = Attributes::new();
        attrs
            .from_json(br#"{"tags":["a",1,null],"meta":{"x":1.5,"ok":false}}"#)
            .unwrap();

        let tags = attrs.get("tags").unwrap().as_array().unwrap();
        assert_eq!(tags[0], AttributeValue::String("a".to_string()));
        assert_eq!(tags[1], AttributeValue::Integer(1));
        assert!(tags[2].is_null());

        let meta = attrs.get("meta").unwrap().as_map().unwrap();
        assert_eq!(meta.get("x"), Some(&AttributeValue::Float(1.5)));
        assert_eq!(meta.get("ok"), Some(&AttributeValue::Boolean(false)));
    }

    #[test]
    fn test_decode_unknown_shape_fails() {
        let mut attrs = sample();
        assert!(matches!(attrs.from_json(b"[1, 2, 3]"), Err(GraphError::Decode(_))));
        assert!(matches!(attrs.from_json(b"{not json"), Err(GraphError::Decode(_))));
        // Left untouched
        assert_eq!(attrs, sample());
    }

    #[test]
    fn test_from_json_value() {
        let value: AttributeValue = serde_json::json!({"n": 1, "f": 2.5, "s": "x"}).into();
        let map = value.as_map().unwrap();
        assert_eq!(map.get("n"), Some(&AttributeValue::Integer(1)));
        assert_eq!(map.get("f"), Some(&AttributeValue::Float(2.5)));
        assert_eq!(map.get("s"), Some(&AttributeValue::String("x".to_string())));
    }

    #[test]
    fn test_display() {
        let mut meta = IndexMap::new();
        meta.insert("x".to_string(), AttributeValue::Float(1.0));
        meta.insert("tags".to_string(), vec![AttributeValue::from("a"), AttributeValue::Null].into());

        assert_eq!(AttributeValue::from("Alice").to_string(), "Alice");
        assert_eq!(AttributeValue::from(30i64).to_string(), "30");
        assert_eq!(AttributeValue::from(true).to_string(), "true");
        assert_eq!(AttributeValue::Map(meta).to_string(), "{x=1.0, tags=[a, null]}");
    }

    #[test]
    fn test_non_finite_float_not_encoded() {
        for value in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let mut attrs = Attributes::new();
            attrs.set("x", value);
            assert!(matches!(attrs.to_json(), Err(GraphError::Encode(_))));
        }

        let mut nested = Attributes::new();
        nested.set("xs", vec![AttributeValue::Float(1.5), AttributeValue::Float(f64::NAN)]);
        assert!(matches!(nested.to_json(), Err(GraphError::Encode(_))));
    }

    #[test]
    fn test_integer_extremes() {
        let mut attrs = Attributes::new();
        attrs.set("min", i64::MIN);
        attrs.set("max", i64::MAX);
        let mut decoded = Attributes::new();
        decoded.from_json(&attrs.to_json().unwrap()).unwrap();
        assert_eq!(decoded, attrs);

        // Past i64 the value decodes as a float
        decoded.from_json(b"{\"big\": 18446744073709551615}").unwrap();
        assert_eq!(decoded.get("big").and_then(AttributeValue::as_integer), None);
        assert_eq!(decoded.get_float("big"), u64::MAX as f64);
    }
}
