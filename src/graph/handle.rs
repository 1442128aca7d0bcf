//! Live handles to graph entities
//!
//! A handle is an identifier plus a reference to the owning [`Graph`].
//! Every accessor goes back to the graph, so handles never hold stale
//! copies. Once the entity is deleted (or the graph closed) accessors
//! return `NodeNotFound`/`EdgeNotFound`; `must_load` panics instead.

use super::edge::Edge;
use super::node::Node;
use super::property::{AttributeValue, Attributes};
use super::store::{Graph, GraphError, GraphResult};
use super::types::TypedId;
use std::fmt;
use std::ptr;

/// Handle to a node stored in a [`Graph`]
#[derive(Clone)]
pub struct NodeRef<'g> {
    graph: &'g Graph,
    id: TypedId,
}

impl<'g> NodeRef<'g> {
    pub(crate) fn new(graph: &'g Graph, id: TypedId) -> Self {
        NodeRef { graph, id }
    }

    pub fn id(&self) -> &TypedId {
        &self.id
    }

    pub fn graph(&self) -> &'g Graph {
        self.graph
    }

    /// Whether the node is still stored
    pub fn exists(&self) -> bool {
        self.graph.has_node(&self.id)
    }

    /// Copy of the stored node
    pub fn load(&self) -> GraphResult<Node> {
        self.graph.with_node(&self.id, Node::clone)
    }

    /// Copy of the stored node, panicking if it no longer exists
    ///
    /// For call sites where a missing node is a logic error.
    pub fn must_load(&self) -> Node {
        match self.load() {
            Ok(node) => node,
            Err(err) => panic!("invalid node handle: {}", err),
        }
    }

    /// Copy of the attribute bag, for strict `try_get_*` reads
    pub fn attributes(&self) -> GraphResult<Attributes> {
        self.graph.with_node(&self.id, |node| node.attributes.clone())
    }

    pub fn get(&self, key: &str) -> GraphResult<Option<AttributeValue>> {
        self.graph.with_node(&self.id, |node| node.attributes.get(key).cloned())
    }

    pub fn get_string(&self, key: &str) -> GraphResult<String> {
        self.graph.with_node(&self.id, |node| node.attributes.get_string(key))
    }

    pub fn get_int(&self, key: &str) -> GraphResult<i64> {
        self.graph.with_node(&self.id, |node| node.attributes.get_int(key))
    }

    pub fn get_float(&self, key: &str) -> GraphResult<f64> {
        self.graph.with_node(&self.id, |node| node.attributes.get_float(key))
    }

    pub fn get_bool(&self, key: &str) -> GraphResult<bool> {
        self.graph.with_node(&self.id, |node| node.attributes.get_bool(key))
    }

    pub fn set(&self, key: impl Into<String>, value: impl Into<AttributeValue>) -> GraphResult<()> {
        let (key, value) = (key.into(), value.into());
        self.graph.with_node_mut(&self.id, |node| {
            node.attributes.set(key, value);
        })
    }

    /// Merge attributes into the node, overwriting existing keys
    pub fn patch<K, V>(&self, entries: impl IntoIterator<Item = (K, V)>) -> GraphResult<()>
    where
        K: Into<String>,
        V: Into<AttributeValue>,
    {
        let entries: Attributes = entries.into_iter().collect();
        self.graph
            .with_node_mut(&self.id, |node| node.attributes.set_all(entries))
    }

    /// Remove an attribute; no-op if absent
    pub fn del(&self, key: &str) -> GraphResult<()> {
        self.graph.with_node_mut(&self.id, |node| {
            node.attributes.del(key);
        })
    }

    /// Visit attributes until `f` returns false
    ///
    /// Runs over a copy taken when the call starts.
    pub fn range(&self, f: impl FnMut(&str, &AttributeValue) -> bool) -> GraphResult<()> {
        self.attributes()?.range(f);
        Ok(())
    }

    /// Visit edges leaving this node
    pub fn range_edges_from(&self, f: impl FnMut(EdgeRef<'g>) -> bool) {
        self.graph.range_edges_from(&self.id, f);
    }

    /// Visit edges entering this node
    pub fn range_edges_to(&self, f: impl FnMut(EdgeRef<'g>) -> bool) {
        self.graph.range_edges_to(&self.id, f);
    }

    /// `{"type", "id", "attributes"}`
    pub fn to_json(&self) -> GraphResult<Vec<u8>> {
        let node = self.load()?;
        serde_json::to_vec(&node).map_err(GraphError::Encode)
    }

    /// Replace the attributes with those of an encoded node
    ///
    /// The decoded `type`/`id` must match this handle.
    pub fn from_json(&self, bytes: &[u8]) -> GraphResult<()> {
        let decoded: Node = serde_json::from_slice(bytes).map_err(GraphError::Decode)?;
        if decoded.id != self.id {
            return Err(GraphError::IdentityMismatch {
                expected: self.id.clone(),
                found: decoded.id,
            });
        }
        self.graph
            .with_node_mut(&self.id, |node| node.attributes = decoded.attributes)
    }
}

impl PartialEq for NodeRef<'_> {
    fn eq(&self, other: &Self) -> bool {
        ptr::eq(self.graph, other.graph) && self.id == other.id
    }
}

impl Eq for NodeRef<'_> {}

impl fmt::Debug for NodeRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("NodeRef").field(&self.id).finish()
    }
}

/// Handle to an edge stored in a [`Graph`]
#[derive(Clone)]
pub struct EdgeRef<'g> {
    graph: &'g Graph,
    id: TypedId,
}

impl<'g> EdgeRef<'g> {
    pub(crate) fn new(graph: &'g Graph, id: TypedId) -> Self {
        EdgeRef { graph, id }
    }

    pub fn id(&self) -> &TypedId {
        &self.id
    }

    pub fn graph(&self) -> &'g Graph {
        self.graph
    }

    pub fn exists(&self) -> bool {
        self.graph.has_edge(&self.id)
    }

    pub fn load(&self) -> GraphResult<Edge> {
        self.graph.with_edge(&self.id, Edge::clone)
    }

    pub fn must_load(&self) -> Edge {
        match self.load() {
            Ok(edge) => edge,
            Err(err) => panic!("invalid edge handle: {}", err),
        }
    }

    /// Live handle to the source node
    pub fn from(&self) -> GraphResult<NodeRef<'g>> {
        let from = self.graph.with_edge(&self.id, |edge| edge.from.clone())?;
        self.endpoint(from)
    }

    /// Live handle to the target node
    pub fn to(&self) -> GraphResult<NodeRef<'g>> {
        let to = self.graph.with_edge(&self.id, |edge| edge.to.clone())?;
        self.endpoint(to)
    }

    fn endpoint(&self, id: TypedId) -> GraphResult<NodeRef<'g>> {
        match self.graph.get_node(&id) {
            Some(node) => Ok(node),
            None => Err(GraphError::NodeNotFound(id)),
        }
    }

    pub fn attributes(&self) -> GraphResult<Attributes> {
        self.graph.with_edge(&self.id, |edge| edge.attributes.clone())
    }

    pub fn get(&self, key: &str) -> GraphResult<Option<AttributeValue>> {
        self.graph.with_edge(&self.id, |edge| edge.attributes.get(key).cloned())
    }

    pub fn get_string(&self, key: &str) -> GraphResult<String> {
        self.graph.with_edge(&self.id, |edge| edge.attributes.get_string(key))
    }

    pub fn get_int(&self, key: &str) -> GraphResult<i64> {
        self.graph.with_edge(&self.id, |edge| edge.attributes.get_int(key))
    }

    pub fn get_float(&self, key: &str) -> GraphResult<f64> {
        self.graph.with_edge(&self.id, |edge| edge.attributes.get_float(key))
    }

    pub fn get_bool(&self, key: &str) -> GraphResult<bool> {
        self.graph.with_edge(&self.id, |edge| edge.attributes.get_bool(key))
    }

    pub fn set(&self, key: impl Into<String>, value: impl Into<AttributeValue>) -> GraphResult<()> {
        let (key, value) = (key.into(), value.into());
        self.graph.with_edge_mut(&self.id, |edge| {
            edge.attributes.set(key, value);
        })
    }

    pub fn patch<K, V>(&self, entries: impl IntoIterator<Item = (K, V)>) -> GraphResult<()>
    where
        K: Into<String>,
        V: Into<AttributeValue>,
    {
        let entries: Attributes = entries.into_iter().collect();
        self.graph
            .with_edge_mut(&self.id, |edge| edge.attributes.set_all(entries))
    }

    pub fn del(&self, key: &str) -> GraphResult<()> {
        self.graph.with_edge_mut(&self.id, |edge| {
            edge.attributes.del(key);
        })
    }

    pub fn range(&self, f: impl FnMut(&str, &AttributeValue) -> bool) -> GraphResult<()> {
        self.attributes()?.range(f);
        Ok(())
    }

    /// `{"type", "id", "attributes", "from", "to"}`
    pub fn to_json(&self) -> GraphResult<Vec<u8>> {
        let edge = self.load()?;
        serde_json::to_vec(&edge).map_err(GraphError::Encode)
    }

    /// Replace the attributes with those of an encoded edge
    ///
    /// The decoded identifier and both endpoints must match the stored edge.
    pub fn from_json(&self, bytes: &[u8]) -> GraphResult<()> {
        let decoded: Edge = serde_json::from_slice(bytes).map_err(GraphError::Decode)?;
        if decoded.id != self.id {
            return Err(GraphError::IdentityMismatch {
                expected: self.id.clone(),
                found: decoded.id,
            });
        }

        self.graph.with_edge_mut(&self.id, |edge| {
            for (expected, found) in [(&edge.from, &decoded.from), (&edge.to, &decoded.to)] {
                if expected != found {
                    return Err(GraphError::IdentityMismatch {
                        expected: expected.clone(),
                        found: found.clone(),
                    });
                }
            }
            edge.attributes = decoded.attributes;
            Ok(())
        })?
    }
}

impl PartialEq for EdgeRef<'_> {
    fn eq(&self, other: &Self) -> bool {
        ptr::eq(self.graph, other.graph) && self.id == other.id
    }
}

impl Eq for EdgeRef<'_> {}

impl fmt::Debug for EdgeRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("EdgeRef").field(&self.id).finish()
    }
}
