//! Graph configuration

use super::store::{GraphError, GraphResult};
use serde::{Deserialize, Serialize};

/// Graph configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    /// Deleting a node also deletes the edges leaving or entering it
    pub cascade_edge_delete: bool,
    /// Initial capacity of each per-type bucket
    pub type_capacity: usize,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            cascade_edge_delete: true,
            type_capacity: 16,
        }
    }
}

impl GraphConfig {
    /// Decode from a JSON object; absent fields keep their defaults
    pub fn from_json(bytes: &[u8]) -> GraphResult<Self> {
        serde_json::from_slice(bytes).map_err(GraphError::Decode)
    }
}
