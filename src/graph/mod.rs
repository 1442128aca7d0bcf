//! Core typed property graph
//!
//! This module implements the in-memory graph model:
//! - Typed identifiers: `(type, id)` pairs, ids generated when absent
//! - Attribute bags on nodes and edges with lenient and strict reads
//! - Type-indexed node and edge stores, edges validated against nodes
//! - Directed edges, several allowed between the same pair of nodes
//! - A lock-guarded coordinator handing out live entity handles

pub mod config;
pub mod edge;
pub mod handle;
pub mod node;
pub mod property;
pub mod snapshot;
pub mod store;
pub mod types;

// Re-export main types
pub use config::GraphConfig;
pub use edge::{Edge, EdgeStore};
pub use handle::{EdgeRef, NodeRef};
pub use node::{Node, NodeStore};
pub use property::{AttributeError, AttributeResult, AttributeValue, Attributes};
pub use snapshot::{GraphSnapshot, ImportStats};
pub use store::{Graph, GraphError, GraphResult};
pub use types::{foreign_key, TypedId};
