//! Typed identifiers for graph entities
//!
//! Every node and edge is named by a `(type, id)` pair. The type is the
//! namespace an id is unique within.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Namespaced identity of a node or edge
///
/// Equality is structural and case-sensitive on both fields.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
#[serde(deny_unknown_fields)]
pub struct TypedId {
    #[serde(rename = "type")]
    typ: String,

    #[serde(default)]
    id: String,
}

impl TypedId {
    pub fn new(typ: impl Into<String>, id: impl Into<String>) -> Self {
        TypedId {
            typ: typ.into(),
            id: id.into(),
        }
    }

    /// Type namespace (e.g., "person", "knows")
    pub fn typ(&self) -> &str {
        &self.typ
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// False only for the unassigned sentinel (empty id)
    pub fn has_id(&self) -> bool {
        !self.id.is_empty()
    }

    /// Same type with a fresh random id
    pub(crate) fn generate(typ: &str) -> Self {
        TypedId::new(typ, Uuid::new_v4().to_string())
    }
}

impl fmt::Display for TypedId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.typ, self.id)
    }
}

impl<T: Into<String>, I: Into<String>> From<(T, I)> for TypedId {
    fn from((typ, id): (T, I)) -> Self {
        TypedId::new(typ, id)
    }
}

/// Build an identifier without touching any store
///
/// Used as a lookup key, or as an edge endpoint before the node is known
/// to exist.
pub fn foreign_key(typ: impl Into<String>, id: impl Into<String>) -> TypedId {
    TypedId::new(typ, id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_typed_id() {
        let id = TypedId::new("person", "alice");
        assert_eq!(id.typ(), "person");
        assert_eq!(id.id(), "alice");
        assert!(id.has_id());
        assert_eq!(format!("{}", id), "person:alice");
    }

    #[test]
    fn test_equality_is_case_sensitive() {
        assert_eq!(foreign_key("person", "alice"), TypedId::new("person", "alice"));
        assert_ne!(foreign_key("person", "alice"), foreign_key("Person", "alice"));
        assert_ne!(foreign_key("person", "alice"), foreign_key("person", "Alice"));
        assert_ne!(foreign_key("person", "alice"), foreign_key("company", "alice"));
    }

    #[test]
    fn test_unassigned_sentinel() {
        let id = TypedId::new("person", "");
        assert!(!id.has_id());
    }

    #[test]
    fn test_generate() {
        let a = TypedId::generate("person");
        let b = TypedId::generate("person");
        assert_eq!(a.typ(), "person");
        assert!(a.has_id());
        assert_ne!(a, b);
    }

    #[test]
    fn test_json_shape() {
        let id: TypedId = ("person", "bob").into();
        let json = serde_json::to_value(&id).unwrap();
        assert_eq!(json, serde_json::json!({"type": "person", "id": "bob"}));

        let decoded: TypedId = serde_json::from_value(serde_json::json!({"type": "person"})).unwrap();
        assert!(!decoded.has_id());
    }
}
