//! Whole-graph JSON snapshots
//!
//! `{"nodes": [...], "edges": [...]}` with the same entity shapes that
//! handles produce. Importing applies get-or-create semantics.

use super::edge::Edge;
use super::node::Node;
use super::store::{Graph, GraphError, GraphResult};
use super::types::TypedId;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Point-in-time copy of every node and edge
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphSnapshot {
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub edges: Vec<Edge>,
}

/// Entities actually inserted by an import
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportStats {
    pub nodes: usize,
    pub edges: usize,
}

impl Graph {
    /// Copy every node and edge
    pub fn snapshot(&self) -> GraphSnapshot {
        let nodes = self.read_nodes();
        let edges = self.read_edges();

        let mut snapshot = GraphSnapshot {
            nodes: Vec::with_capacity(nodes.count()),
            edges: Vec::with_capacity(edges.count()),
        };
        nodes.range_nodes(|node| {
            snapshot.nodes.push(node.clone());
            true
        });
        edges.range_edges(|edge| {
            snapshot.edges.push(edge.clone());
            true
        });
        snapshot
    }

    pub fn export_json(&self) -> GraphResult<Vec<u8>> {
        serde_json::to_vec(&self.snapshot()).map_err(GraphError::Encode)
    }

    /// Insert the snapshot's nodes, then its edges
    ///
    /// Entities whose identifier already exists are left untouched and
    /// entities without an id get a generated one. Every new edge must
    /// point at a stored node or a node of the snapshot; otherwise
    /// nothing is applied.
    pub fn restore(&self, snapshot: GraphSnapshot) -> GraphResult<ImportStats> {
        let mut nodes = self.write_nodes();
        let mut edges = self.write_edges();

        let empty_type = snapshot
            .nodes
            .iter()
            .map(|node| &node.id)
            .chain(snapshot.edges.iter().map(|edge| &edge.id))
            .any(|id| id.typ().is_empty());
        if empty_type {
            return Err(GraphError::EmptyType);
        }

        {
            let incoming: FxHashSet<&TypedId> = snapshot
                .nodes
                .iter()
                .map(|node| &node.id)
                .filter(|id| id.has_id())
                .collect();
            let resolves = |id: &TypedId| nodes.has_node(id) || incoming.contains(id);

            for edge in &snapshot.edges {
                if edge.id.has_id() && edges.has_edge(&edge.id) {
                    continue;
                }
                if !resolves(&edge.from) {
                    return Err(GraphError::UnknownSource(edge.from.clone()));
                }
                if !resolves(&edge.to) {
                    return Err(GraphError::UnknownTarget(edge.to.clone()));
                }
            }
        }

        let mut stats = ImportStats::default();
        for mut node in snapshot.nodes {
            if !node.id.has_id() {
                node.id = Self::unused_id(node.id.typ(), |candidate| nodes.has_node(candidate));
            }
            if nodes.add_node(node) {
                stats.nodes += 1;
            }
        }
        for mut edge in snapshot.edges {
            if edge.id.has_id() && edges.has_edge(&edge.id) {
                continue;
            }
            if !edge.id.has_id() {
                edge.id = Self::unused_id(edge.id.typ(), |candidate| edges.has_edge(candidate));
            }
            if edges.add_edge(edge, &nodes)? {
                stats.edges += 1;
            }
        }

        info!(nodes = stats.nodes, edges = stats.edges, "snapshot imported");
        Ok(stats)
    }

    /// Decode a snapshot produced by [`Graph::export_json`] and restore it
    pub fn import_json(&self, bytes: &[u8]) -> GraphResult<ImportStats> {
        let snapshot: GraphSnapshot = serde_json::from_slice(bytes).map_err(GraphError::Decode)?;
        self.restore(snapshot)
    }
}
