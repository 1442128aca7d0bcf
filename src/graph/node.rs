//! Nodes and the type-indexed node store

use super::property::{AttributeValue, Attributes};
use super::types::TypedId;
use indexmap::map::Entry;
use indexmap::IndexMap;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// A node in the property graph
///
/// JSON shape: `{"type": ..., "id": ..., "attributes": {...}}`. Decoding
/// requires `type` and `attributes` and rejects any other key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "NodeRecord")]
pub struct Node {
    #[serde(flatten)]
    pub id: TypedId,

    pub attributes: Attributes,
}

/// Decoding form of [`Node`]; `flatten` cannot deny unknown keys
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct NodeRecord {
    #[serde(rename = "type")]
    typ: String,
    #[serde(default)]
    id: String,
    attributes: Attributes,
}

impl From<NodeRecord> for Node {
    fn from(record: NodeRecord) -> Self {
        Node::new_with_attributes(TypedId::new(record.typ, record.id), record.attributes)
    }
}

impl Node {
    pub fn new(id: TypedId) -> Self {
        Node {
            id,
            attributes: Attributes::new(),
        }
    }

    pub fn new_with_attributes(id: TypedId, attributes: Attributes) -> Self {
        Node { id, attributes }
    }

    pub fn set_attribute(&mut self, key: impl Into<String>, value: impl Into<AttributeValue>) -> Option<AttributeValue> {
        self.attributes.set(key, value)
    }

    pub fn get_attribute(&self, key: &str) -> Option<&AttributeValue> {
        self.attributes.get(key)
    }
}

/// Node index: type -> id -> node
///
/// "All nodes of type T" is a single bucket lookup. Buckets keep
/// insertion order and are dropped once empty, so `node_types` only
/// reports types that currently have nodes.
#[derive(Debug, Default)]
pub struct NodeStore {
    types: FxHashMap<String, IndexMap<String, Node>>,
    type_capacity: usize,
}

impl NodeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store whose per-type buckets start with room for `type_capacity` nodes
    pub fn with_capacity(type_capacity: usize) -> Self {
        NodeStore {
            types: FxHashMap::default(),
            type_capacity,
        }
    }

    /// Insert unless a node with an equal identifier exists
    ///
    /// Returns false, leaving the stored node untouched, if it does.
    pub fn add_node(&mut self, node: Node) -> bool {
        let capacity = self.type_capacity;
        let bucket = self
            .types
            .entry(node.id.typ().to_string())
            .or_insert_with(|| IndexMap::with_capacity(capacity));

        match bucket.entry(node.id.id().to_string()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(node);
                true
            }
        }
    }

    pub fn get_node(&self, id: &TypedId) -> Option<&Node> {
        self.types.get(id.typ())?.get(id.id())
    }

    pub fn get_node_mut(&mut self, id: &TypedId) -> Option<&mut Node> {
        self.types.get_mut(id.typ())?.get_mut(id.id())
    }

    pub fn has_node(&self, id: &TypedId) -> bool {
        self.get_node(id).is_some()
    }

    /// Remove a node; `None` if it was absent
    pub fn del_node(&mut self, id: &TypedId) -> Option<Node> {
        let bucket = self.types.get_mut(id.typ())?;
        let removed = bucket.shift_remove(id.id());
        if bucket.is_empty() {
            self.types.remove(id.typ());
        }
        removed
    }

    /// Visit every node until `f` returns false
    pub fn range_nodes(&self, mut f: impl FnMut(&Node) -> bool) {
        for bucket in self.types.values() {
            for node in bucket.values() {
                if !f(node) {
                    return;
                }
            }
        }
    }

    /// Visit nodes of one type until `f` returns false
    pub fn range_node_types(&self, typ: &str, mut f: impl FnMut(&Node) -> bool) {
        if let Some(bucket) = self.types.get(typ) {
            for node in bucket.values() {
                if !f(node) {
                    return;
                }
            }
        }
    }

    /// Distinct types currently present, in no particular order
    pub fn node_types(&self) -> Vec<String> {
        self.types.keys().cloned().collect()
    }

    pub fn count(&self) -> usize {
        self.types.values().map(IndexMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn clear(&mut self) {
        self.types.clear();
    }
}
