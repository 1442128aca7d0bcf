//! In-memory graph coordinator
//!
//! [`Graph`] owns a [`NodeStore`] and an [`EdgeStore`], each behind its own
//! reader/writer lock, so a shared graph can be used from many threads.
//! Locks are always taken nodes first, then edges.

use super::config::GraphConfig;
use super::edge::{Edge, EdgeStore};
use super::handle::{EdgeRef, NodeRef};
use super::node::{Node, NodeStore};
use super::property::Attributes;
use super::types::TypedId;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use thiserror::Error;
use tracing::{debug, info};

/// Errors that can occur during graph operations
#[derive(Error, Debug)]
pub enum GraphError {
    #[error("Node {0} not found")]
    NodeNotFound(TypedId),

    #[error("Edge {0} not found")]
    EdgeNotFound(TypedId),

    #[error("Node {0} already exists")]
    NodeAlreadyExists(TypedId),

    #[error("Edge {0} already exists")]
    EdgeAlreadyExists(TypedId),

    #[error("Unknown endpoint: source node {0} does not exist")]
    UnknownSource(TypedId),

    #[error("Unknown endpoint: target node {0} does not exist")]
    UnknownTarget(TypedId),

    #[error("Entity type must not be empty")]
    EmptyType,

    #[error("Decoded entity {found} does not match {expected}")]
    IdentityMismatch { expected: TypedId, found: TypedId },

    #[error("Decode error: {0}")]
    Decode(serde_json::Error),

    #[error("Encode error: {0}")]
    Encode(serde_json::Error),
}

pub type GraphResult<T> = Result<T, GraphError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InsertMode {
    /// Fail if the identifier is taken
    Create,
    /// Return the existing entity untouched
    GetOrCreate,
    /// Merge attributes into the existing entity
    Upsert,
}

/// In-memory typed property graph
///
/// Nodes and edges are named by [`TypedId`]. Callers get [`NodeRef`] and
/// [`EdgeRef`] handles that read and write through to the graph, so a
/// change made through one handle is seen by every handle with an equal
/// identifier.
#[derive(Debug)]
pub struct Graph {
    config: GraphConfig,
    nodes: RwLock<NodeStore>,
    edges: RwLock<EdgeStore>,
}

impl Graph {
    /// Create a new empty graph
    pub fn new() -> Self {
        Self::with_config(GraphConfig::default())
    }

    pub fn with_config(config: GraphConfig) -> Self {
        info!(?config, "creating graph");
        Graph {
            nodes: RwLock::new(NodeStore::with_capacity(config.type_capacity)),
            edges: RwLock::new(EdgeStore::with_capacity(config.type_capacity)),
            config,
        }
    }

    pub fn config(&self) -> &GraphConfig {
        &self.config
    }

    // Poisoned locks are recovered, not propagated
    pub(crate) fn read_nodes(&self) -> RwLockReadGuard<'_, NodeStore> {
        self.nodes.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn write_nodes(&self) -> RwLockWriteGuard<'_, NodeStore> {
        self.nodes.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn read_edges(&self) -> RwLockReadGuard<'_, EdgeStore> {
        self.edges.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn write_edges(&self) -> RwLockWriteGuard<'_, EdgeStore> {
        self.edges.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Random id not yet taken within `typ`
    pub(super) fn unused_id(typ: &str, taken: impl Fn(&TypedId) -> bool) -> TypedId {
        loop {
            let candidate = TypedId::generate(typ);
            if !taken(&candidate) {
                return candidate;
            }
        }
    }

    // ============================================================
    // Nodes
    // ============================================================

    /// Create a node, failing if the identifier is taken
    ///
    /// An empty `id` gets a generated one.
    pub fn create_node(
        &self,
        typ: impl Into<String>,
        id: impl Into<String>,
        attributes: Attributes,
    ) -> GraphResult<NodeRef<'_>> {
        self.insert_node(typ.into(), id.into(), attributes, InsertMode::Create)
    }

    /// Return the node with this identifier, creating it if absent
    ///
    /// If the node exists, `attributes` are discarded and the node is
    /// returned unchanged; use [`NodeRef::patch`] or [`Graph::upsert_node`]
    /// to update it. An empty `id` always creates a node with a generated id.
    pub fn get_or_create_node(
        &self,
        typ: impl Into<String>,
        id: impl Into<String>,
        attributes: Attributes,
    ) -> GraphResult<NodeRef<'_>> {
        self.insert_node(typ.into(), id.into(), attributes, InsertMode::GetOrCreate)
    }

    /// Create the node, or merge `attributes` into the existing one
    pub fn upsert_node(
        &self,
        typ: impl Into<String>,
        id: impl Into<String>,
        attributes: Attributes,
    ) -> GraphResult<NodeRef<'_>> {
        self.insert_node(typ.into(), id.into(), attributes, InsertMode::Upsert)
    }

    fn insert_node(
        &self,
        typ: String,
        id: String,
        attributes: Attributes,
        mode: InsertMode,
    ) -> GraphResult<NodeRef<'_>> {
        if typ.is_empty() {
            return Err(GraphError::EmptyType);
        }

        let mut nodes = self.write_nodes();
        let id = if id.is_empty() {
            Self::unused_id(&typ, |candidate| nodes.has_node(candidate))
        } else {
            TypedId::new(typ, id)
        };

        if let Some(existing) = nodes.get_node_mut(&id) {
            match mode {
                InsertMode::Create => return Err(GraphError::NodeAlreadyExists(id)),
                InsertMode::GetOrCreate => {}
                InsertMode::Upsert => existing.attributes.set_all(attributes),
            }
            return Ok(NodeRef::new(self, id));
        }

        nodes.add_node(Node::new_with_attributes(id.clone(), attributes));
        debug!(node = %id, "node inserted");
        Ok(NodeRef::new(self, id))
    }

    /// Handle for an existing node
    pub fn get_node(&self, id: &TypedId) -> Option<NodeRef<'_>> {
        if self.has_node(id) {
            Some(NodeRef::new(self, id.clone()))
        } else {
            None
        }
    }

    pub fn has_node(&self, id: &TypedId) -> bool {
        self.read_nodes().has_node(id)
    }

    /// Delete a node; no-op if absent
    ///
    /// With `cascade_edge_delete` set, edges leaving or entering the node
    /// are deleted with it.
    pub fn del_node(&self, id: &TypedId) -> Option<Node> {
        let mut nodes = self.write_nodes();
        let removed = nodes.del_node(id)?;

        if self.config.cascade_edge_delete {
            let detached = self.write_edges().detach_node(id);
            debug!(node = %id, edges = detached.len(), "node deleted");
        } else {
            debug!(node = %id, "node deleted");
        }
        Some(removed)
    }

    /// Visit every node until `f` returns false
    ///
    /// The visited set is the nodes present when the call starts. `f` runs
    /// with no lock held and may call back into the graph.
    pub fn range_nodes<'g>(&'g self, mut f: impl FnMut(NodeRef<'g>) -> bool) {
        let ids = {
            let nodes = self.read_nodes();
            let mut ids = Vec::with_capacity(nodes.count());
            nodes.range_nodes(|node| {
                ids.push(node.id.clone());
                true
            });
            ids
        };

        for id in ids {
            if !f(NodeRef::new(self, id)) {
                break;
            }
        }
    }

    /// Visit nodes of type `typ` until `f` returns false
    pub fn range_node_types<'g>(&'g self, typ: &str, mut f: impl FnMut(NodeRef<'g>) -> bool) {
        let mut ids = Vec::new();
        self.read_nodes().range_node_types(typ, |node| {
            ids.push(node.id.clone());
            true
        });

        for id in ids {
            if !f(NodeRef::new(self, id)) {
                break;
            }
        }
    }

    /// Distinct node types present, in no particular order
    pub fn node_types(&self) -> Vec<String> {
        self.read_nodes().node_types()
    }

    pub fn node_count(&self) -> usize {
        self.read_nodes().count()
    }

    pub(crate) fn with_node<R>(&self, id: &TypedId, f: impl FnOnce(&Node) -> R) -> GraphResult<R> {
        let nodes = self.read_nodes();
        let node = nodes
            .get_node(id)
            .ok_or_else(|| GraphError::NodeNotFound(id.clone()))?;
        Ok(f(node))
    }

    pub(crate) fn with_node_mut<R>(&self, id: &TypedId, f: impl FnOnce(&mut Node) -> R) -> GraphResult<R> {
        let mut nodes = self.write_nodes();
        let node = nodes
            .get_node_mut(id)
            .ok_or_else(|| GraphError::NodeNotFound(id.clone()))?;
        Ok(f(node))
    }

    // ============================================================
    // Edges
    // ============================================================

    /// Create an edge, failing if the identifier is taken
    ///
    /// `from` and `to` must name existing nodes.
    pub fn create_edge(
        &self,
        typ: impl Into<String>,
        id: impl Into<String>,
        attributes: Attributes,
        from: &TypedId,
        to: &TypedId,
    ) -> GraphResult<EdgeRef<'_>> {
        self.insert_edge(typ.into(), id.into(), attributes, from, to, InsertMode::Create)
    }

    /// Return the edge with this identifier, creating it if absent
    ///
    /// An existing edge is returned unchanged, endpoints included. A new
    /// edge fails with [`GraphError::UnknownSource`] or
    /// [`GraphError::UnknownTarget`] if an endpoint is not a stored node.
    pub fn get_or_create_edge(
        &self,
        typ: impl Into<String>,
        id: impl Into<String>,
        attributes: Attributes,
        from: &TypedId,
        to: &TypedId,
    ) -> GraphResult<EdgeRef<'_>> {
        self.insert_edge(typ.into(), id.into(), attributes, from, to, InsertMode::GetOrCreate)
    }

    /// Create the edge, or merge `attributes` into the existing one
    ///
    /// Endpoints of an existing edge are never changed.
    pub fn upsert_edge(
        &self,
        typ: impl Into<String>,
        id: impl Into<String>,
        attributes: Attributes,
        from: &TypedId,
        to: &TypedId,
    ) -> GraphResult<EdgeRef<'_>> {
        self.insert_edge(typ.into(), id.into(), attributes, from, to, InsertMode::Upsert)
    }

    fn insert_edge(
        &self,
        typ: String,
        id: String,
        attributes: Attributes,
        from: &TypedId,
        to: &TypedId,
        mode: InsertMode,
    ) -> GraphResult<EdgeRef<'_>> {
        if typ.is_empty() {
            return Err(GraphError::EmptyType);
        }

        // Held for reading so endpoints cannot vanish before the insert lands
        let nodes = self.read_nodes();
        let mut edges = self.write_edges();
        let id = if id.is_empty() {
            Self::unused_id(&typ, |candidate| edges.has_edge(candidate))
        } else {
            TypedId::new(typ, id)
        };

        if let Some(existing) = edges.get_edge_mut(&id) {
            match mode {
                InsertMode::Create => return Err(GraphError::EdgeAlreadyExists(id)),
                InsertMode::GetOrCreate => {}
                InsertMode::Upsert => existing.attributes.set_all(attributes),
            }
            return Ok(EdgeRef::new(self, id));
        }

        let edge = Edge::new_with_attributes(id.clone(), from.clone(), to.clone(), attributes);
        if let Err(err) = edges.add_edge(edge, &nodes) {
            debug!(edge = %id, error = %err, "edge rejected");
            return Err(err);
        }
        debug!(edge = %id, from = %from, to = %to, "edge inserted");
        Ok(EdgeRef::new(self, id))
    }

    /// Handle for an existing edge
    pub fn get_edge(&self, id: &TypedId) -> Option<EdgeRef<'_>> {
        if self.has_edge(id) {
            Some(EdgeRef::new(self, id.clone()))
        } else {
            None
        }
    }

    pub fn has_edge(&self, id: &TypedId) -> bool {
        self.read_edges().has_edge(id)
    }

    /// Delete an edge; no-op if absent
    pub fn del_edge(&self, id: &TypedId) -> Option<Edge> {
        let removed = self.write_edges().del_edge(id);
        if removed.is_some() {
            debug!(edge = %id, "edge deleted");
        }
        removed
    }

    /// Visit every edge until `f` returns false
    ///
    /// Same snapshot rules as [`Graph::range_nodes`].
    pub fn range_edges<'g>(&'g self, mut f: impl FnMut(EdgeRef<'g>) -> bool) {
        let ids = {
            let edges = self.read_edges();
            let mut ids = Vec::with_capacity(edges.count());
            edges.range_edges(|edge| {
                ids.push(edge.id.clone());
                true
            });
            ids
        };
        self.visit_edges(ids, &mut f);
    }

    /// Visit edges of type `typ` until `f` returns false
    pub fn range_edge_types<'g>(&'g self, typ: &str, mut f: impl FnMut(EdgeRef<'g>) -> bool) {
        let mut ids = Vec::new();
        self.read_edges().range_edge_types(typ, |edge| {
            ids.push(edge.id.clone());
            true
        });
        self.visit_edges(ids, &mut f);
    }

    /// Visit edges leaving `node` until `f` returns false
    pub fn range_edges_from<'g>(&'g self, node: &TypedId, mut f: impl FnMut(EdgeRef<'g>) -> bool) {
        let mut ids = Vec::new();
        self.read_edges().range_edges_from(node, |edge| {
            ids.push(edge.id.clone());
            true
        });
        self.visit_edges(ids, &mut f);
    }

    /// Visit edges entering `node` until `f` returns false
    pub fn range_edges_to<'g>(&'g self, node: &TypedId, mut f: impl FnMut(EdgeRef<'g>) -> bool) {
        let mut ids = Vec::new();
        self.read_edges().range_edges_to(node, |edge| {
            ids.push(edge.id.clone());
            true
        });
        self.visit_edges(ids, &mut f);
    }

    fn visit_edges<'g>(&'g self, ids: Vec<TypedId>, f: &mut impl FnMut(EdgeRef<'g>) -> bool) {
        for id in ids {
            if !f(EdgeRef::new(self, id)) {
                break;
            }
        }
    }

    /// Distinct edge types present, in no particular order
    pub fn edge_types(&self) -> Vec<String> {
        self.read_edges().edge_types()
    }

    pub fn edge_count(&self) -> usize {
        self.read_edges().count()
    }

    pub(crate) fn with_edge<R>(&self, id: &TypedId, f: impl FnOnce(&Edge) -> R) -> GraphResult<R> {
        let edges = self.read_edges();
        let edge = edges
            .get_edge(id)
            .ok_or_else(|| GraphError::EdgeNotFound(id.clone()))?;
        Ok(f(edge))
    }

    pub(crate) fn with_edge_mut<R>(&self, id: &TypedId, f: impl FnOnce(&mut Edge) -> R) -> GraphResult<R> {
        let mut edges = self.write_edges();
        let edge = edges
            .get_edge_mut(id)
            .ok_or_else(|| GraphError::EdgeNotFound(id.clone()))?;
        Ok(f(edge))
    }

    // ============================================================
    // Lifecycle
    // ============================================================

    /// Drop every node and edge
    ///
    /// The graph is left as if newly constructed. Handles taken earlier
    /// now report `NodeNotFound`/`EdgeNotFound`.
    pub fn close(&self) {
        let mut nodes = self.write_nodes();
        let mut edges = self.write_edges();
        info!(nodes = nodes.count(), edges = edges.count(), "closing graph");
        nodes.clear();
        edges.clear();
    }
}

impl Default for Graph {
    fn default() -> Self {
        Self::new()
    }
}
