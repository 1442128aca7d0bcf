//! Directed edges and the edge store
//!
//! Edges are indexed by type then id, like nodes, plus outgoing and
//! incoming adjacency keyed by endpoint so edges of a node are found
//! without a scan. Several edges may connect the same ordered pair.

use super::node::NodeStore;
use super::property::{AttributeValue, Attributes};
use super::store::{GraphError, GraphResult};
use super::types::TypedId;
use indexmap::map::Entry;
use indexmap::{IndexMap, IndexSet};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// A directed edge in the property graph
///
/// JSON shape: `{"type", "id", "attributes", "from": {"type", "id"}, "to": {"type", "id"}}`.
/// Decoding requires every key but `id` and rejects any other.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "EdgeRecord")]
pub struct Edge {
    #[serde(flatten)]
    pub id: TypedId,

    pub attributes: Attributes,

    /// Source node (edge goes FROM this node)
    pub from: TypedId,

    /// Target node (edge goes TO this node)
    pub to: TypedId,
}

/// Decoding form of [`Edge`]
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct EdgeRecord {
    #[serde(rename = "type")]
    typ: String,
    #[serde(default)]
    id: String,
    attributes: Attributes,
    from: TypedId,
    to: TypedId,
}

impl From<EdgeRecord> for Edge {
    fn from(record: EdgeRecord) -> Self {
        Edge::new_with_attributes(TypedId::new(record.typ, record.id), record.from, record.to, record.attributes)
    }
}

impl Edge {
    pub fn new(id: TypedId, from: TypedId, to: TypedId) -> Self {
        Edge {
            id,
            attributes: Attributes::new(),
            from,
            to,
        }
    }

    pub fn new_with_attributes(id: TypedId, from: TypedId, to: TypedId, attributes: Attributes) -> Self {
        Edge {
            id,
            attributes,
            from,
            to,
        }
    }

    pub fn set_attribute(&mut self, key: impl Into<String>, value: impl Into<AttributeValue>) -> Option<AttributeValue> {
        self.attributes.set(key, value)
    }

    pub fn get_attribute(&self, key: &str) -> Option<&AttributeValue> {
        self.attributes.get(key)
    }

    pub fn starts_from(&self, node: &TypedId) -> bool {
        &self.from == node
    }

    pub fn ends_at(&self, node: &TypedId) -> bool {
        &self.to == node
    }
}

/// Edge index: type -> id -> edge, with endpoint adjacency
#[derive(Debug, Default)]
pub struct EdgeStore {
    types: FxHashMap<String, IndexMap<String, Edge>>,

    /// Outgoing edges for each source node
    outgoing: FxHashMap<TypedId, IndexSet<TypedId>>,

    /// Incoming edges for each target node
    incoming: FxHashMap<TypedId, IndexSet<TypedId>>,

    type_capacity: usize,
}

impl EdgeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(type_capacity: usize) -> Self {
        EdgeStore {
            type_capacity,
            ..Self::default()
        }
    }

    /// Insert unless an edge with an equal identifier exists
    ///
    /// Both endpoints must resolve in `nodes`, checked before anything
    /// else. `Ok(false)` means an edge with this identifier was already
    /// stored and was left untouched.
    pub fn add_edge(&mut self, edge: Edge, nodes: &NodeStore) -> GraphResult<bool> {
        if !nodes.has_node(&edge.from) {
            return Err(GraphError::UnknownSource(edge.from));
        }
        if !nodes.has_node(&edge.to) {
            return Err(GraphError::UnknownTarget(edge.to));
        }
        Ok(self.insert(edge))
    }

    /// Insert without endpoint validation
    pub(crate) fn insert(&mut self, edge: Edge) -> bool {
        let capacity = self.type_capacity;
        let bucket = self
            .types
            .entry(edge.id.typ().to_string())
            .or_insert_with(|| IndexMap::with_capacity(capacity));

        match bucket.entry(edge.id.id().to_string()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                self.outgoing
                    .entry(edge.from.clone())
                    .or_default()
                    .insert(edge.id.clone());
                self.incoming
                    .entry(edge.to.clone())
                    .or_default()
                    .insert(edge.id.clone());
                slot.insert(edge);
                true
            }
        }
    }

    pub fn get_edge(&self, id: &TypedId) -> Option<&Edge> {
        self.types.get(id.typ())?.get(id.id())
    }

    pub fn get_edge_mut(&mut self, id: &TypedId) -> Option<&mut Edge> {
        self.types.get_mut(id.typ())?.get_mut(id.id())
    }

    pub fn has_edge(&self, id: &TypedId) -> bool {
        self.get_edge(id).is_some()
    }

    /// Remove an edge; `None` if it was absent
    pub fn del_edge(&mut self, id: &TypedId) -> Option<Edge> {
        let bucket = self.types.get_mut(id.typ())?;
        let edge = bucket.shift_remove(id.id())?;
        if bucket.is_empty() {
            self.types.remove(id.typ());
        }

        Self::unlink(&mut self.outgoing, &edge.from, id);
        Self::unlink(&mut self.incoming, &edge.to, id);
        Some(edge)
    }

    fn unlink(adjacency: &mut FxHashMap<TypedId, IndexSet<TypedId>>, node: &TypedId, edge: &TypedId) {
        if let Some(edges) = adjacency.get_mut(node) {
            edges.shift_remove(edge);
            if edges.is_empty() {
                adjacency.remove(node);
            }
        }
    }

    /// Remove every edge leaving or entering `node`
    pub fn detach_node(&mut self, node: &TypedId) -> Vec<Edge> {
        let mut ids: IndexSet<TypedId> = self.outgoing.get(node).cloned().unwrap_or_default();
        if let Some(incoming) = self.incoming.get(node) {
            ids.extend(incoming.iter().cloned());
        }

        let detached: Vec<Edge> = ids.iter().filter_map(|id| self.del_edge(id)).collect();
        debug_assert!(detached.iter().all(|edge| edge.starts_from(node) || edge.ends_at(node)));
        detached
    }

    /// Visit every edge until `f` returns false
    pub fn range_edges(&self, mut f: impl FnMut(&Edge) -> bool) {
        for bucket in self.types.values() {
            for edge in bucket.values() {
                if !f(edge) {
                    return;
                }
            }
        }
    }

    /// Visit edges of one type until `f` returns false
    pub fn range_edge_types(&self, typ: &str, mut f: impl FnMut(&Edge) -> bool) {
        if let Some(bucket) = self.types.get(typ) {
            for edge in bucket.values() {
                if !f(edge) {
                    return;
                }
            }
        }
    }

    /// Visit edges whose source is `node` until `f` returns false
    pub fn range_edges_from(&self, node: &TypedId, f: impl FnMut(&Edge) -> bool) {
        self.range_adjacent(self.outgoing.get(node), f);
    }

    /// Visit edges whose target is `node` until `f` returns false
    pub fn range_edges_to(&self, node: &TypedId, f: impl FnMut(&Edge) -> bool) {
        self.range_adjacent(self.incoming.get(node), f);
    }

    fn range_adjacent(&self, ids: Option<&IndexSet<TypedId>>, mut f: impl FnMut(&Edge) -> bool) {
        for id in ids.into_iter().flatten() {
            if let Some(edge) = self.get_edge(id) {
                if !f(edge) {
                    return;
                }
            }
        }
    }

    /// Distinct types currently present, in no particular order
    pub fn edge_types(&self) -> Vec<String> {
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
        self.outgoing.clear();
        self.incoming.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::node::Node;

    fn key(typ: &str, id: &str) -> TypedId {
        TypedId::new(typ, id)
    }

    fn people(ids: &[&str]) -> NodeStore {
        let mut nodes = NodeStore::new();
        for id in ids {
            nodes.add_node(Node::new(key("person", id)));
        }
        nodes
    }

    #[test]
    fn test_edge_direction() {
        let edge = Edge::new(key("knows", "e1"), key("person", "alice"), key("person", "bob"));
        assert!(edge.starts_from(&key("person", "alice")));
        assert!(edge.ends_at(&key("person", "bob")));
        assert!(!edge.starts_from(&key("person", "bob")));
        assert!(!edge.ends_at(&key("person", "alice")));
    }

    #[test]
    fn test_edge_json_shape() {
        let mut edge = Edge::new(key("knows", "e1"), key("person", "alice"), key("person", "bob"));
        edge.set_attribute("since", 2020i64);

        let json = serde_json::to_value(&edge).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "type": "knows",
                "id": "e1",
                "attributes": {"since": 2020},
                "from": {"type": "person", "id": "alice"},
                "to": {"type": "person", "id": "bob"}
            })
        );

        let decoded: Edge = serde_json::from_value(json).unwrap();
        assert_eq!(decoded, edge);
    }

    #[test]
    fn test_edge_json_rejects_missing_and_unknown_keys() {
        let alice = serde_json::json!({"type": "person", "id": "alice"});
        let bob = serde_json::json!({"type": "person", "id": "bob"});
        for json in [
            serde_json::json!({"type": "knows", "id": "e1", "from": alice, "to": bob}),
            serde_json::json!({"type": "knows", "id": "e1", "attributes": {}, "from": alice}),
            serde_json::json!({"type": "knows", "id": "e1", "atributes": {}, "from": alice, "to": bob}),
            serde_json::json!({"type": "knows", "id": "e1", "attributes": {}, "from": alice, "to": bob, "weight": 1}),
            serde_json::json!({"type": "knows", "id": "e1", "attributes": {}, "from": alice,
                               "to": {"type": "person", "id": "bob", "extra": true}}),
        ] {
            assert!(serde_json::from_value::<Edge>(json).is_err());
        }
    }

    #[test]
    fn test_add_edge_validates_endpoints() {
        let nodes = people(&["alice"]);
        let mut edges = EdgeStore::new();

        let result = edges.add_edge(
            Edge::new(key("knows", "e1"), key("person", "ghost"), key("person", "alice")),
            &nodes,
        );
        assert!(matches!(result, Err(GraphError::UnknownSource(id)) if id == key("person", "ghost")));

        let result = edges.add_edge(
            Edge::new(key("knows", "e1"), key("person", "alice"), key("person", "ghost")),
            &nodes,
        );
        assert!(matches!(result, Err(GraphError::UnknownTarget(id)) if id == key("person", "ghost")));

        assert_eq!(edges.count(), 0);
        assert!(edges.edge_types().is_empty());
    }

    #[test]
    fn test_add_existing_edge_is_noop() {
        let nodes = people(&["alice", "bob"]);
        let mut edges = EdgeStore::new();

        let mut first = Edge::new(key("knows", "e1"), key("person", "alice"), key("person", "bob"));
        first.set_attribute("since", 2020i64);
        assert!(edges.add_edge(first, &nodes).unwrap());

        let second = Edge::new(key("knows", "e1"), key("person", "bob"), key("person", "alice"));
        assert!(!edges.add_edge(second, &nodes).unwrap());

        let stored = edges.get_edge(&key("knows", "e1")).unwrap();
        assert_eq!(stored.from, key("person", "alice"));
        assert_eq!(stored.attributes.get_int("since"), 2020);
        assert_eq!(edges.count(), 1);
    }

    #[test]
    fn test_multiple_edges_between_nodes() {
        let nodes = people(&["alice", "bob"]);
        let mut edges = EdgeStore::new();
        let alice = key("person", "alice");
        let bob = key("person", "bob");

        edges.add_edge(Edge::new(key("knows", "e1"), alice.clone(), bob.clone()), &nodes).unwrap();
        edges.add_edge(Edge::new(key("works_with", "e1"), alice.clone(), bob.clone()), &nodes).unwrap();
        edges.add_edge(Edge::new(key("knows", "e2"), alice.clone(), bob.clone()), &nodes).unwrap();

        assert_eq!(edges.count(), 3);
        let mut types = edges.edge_types();
        types.sort();
        assert_eq!(types, vec!["knows".to_string(), "works_with".to_string()]);

        let mut outgoing = 0;
        edges.range_edges_from(&alice, |_| {
            outgoing += 1;
            true
        });
        assert_eq!(outgoing, 3);

        let mut incoming = 0;
        edges.range_edges_to(&alice, |_| {
            incoming += 1;
            true
        });
        assert_eq!(incoming, 0);
    }

    #[test]
    fn test_del_edge_updates_adjacency() {
        let nodes = people(&["alice", "bob"]);
        let mut edges = EdgeStore::new();
        let alice = key("person", "alice");
        let bob = key("person", "bob");
        edges.add_edge(Edge::new(key("knows", "e1"), alice.clone(), bob.clone()), &nodes).unwrap();

        assert!(edges.del_edge(&key("knows", "e1")).is_some());
        assert!(edges.del_edge(&key("knows", "e1")).is_none());

        edges.range_edges_from(&alice, |_| panic!("edge was deleted"));
        edges.range_edges_to(&bob, |_| panic!("edge was deleted"));
        assert!(edges.is_empty());
    }

    #[test]
    fn test_detach_node() {
        let nodes = people(&["alice", "bob", "carol"]);
        let mut edges = EdgeStore::new();
        let alice = key("person", "alice");
        let bob = key("person", "bob");
        let carol = key("person", "carol");

        edges.add_edge(Edge::new(key("knows", "e1"), alice.clone(), bob.clone()), &nodes).unwrap();
        edges.add_edge(Edge::new(key("knows", "e2"), carol.clone(), bob.clone()), &nodes).unwrap();
        edges.add_edge(Edge::new(key("knows", "e3"), alice.clone(), carol.clone()), &nodes).unwrap();
        edges.add_edge(Edge::new(key("knows", "e4"), bob.clone(), bob.clone()), &nodes).unwrap();

        let removed = edges.detach_node(&bob);
        assert_eq!(removed.len(), 3);
        assert_eq!(edges.count(), 1);
        assert!(edges.has_edge(&key("knows", "e3")));
    }

    #[test]
    fn test_range_edge_types_early_exit() {
        let nodes = people(&["alice", "bob"]);
        let mut edges = EdgeStore::with_capacity(8);
        for i in 0..6 {
            edges
                .add_edge(
                    Edge::new(key("knows", &format!("e{}", i)), key("person", "alice"), key("person", "bob")),
                    &nodes,
                )
                .unwrap();
        }

        let mut visits = 0;
        edges.range_edge_types("knows", |edge| {
            assert_eq!(edge.id.typ(), "knows");
            visits += 1;
            visits < 4
        });
        assert_eq!(visits, 4);
    }
}
