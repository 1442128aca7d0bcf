//! Dagger typed property graph
//!
//! An in-memory, thread-safe, directed property graph. Nodes and edges are
//! named by a `(type, id)` pair, carry attribute bags, and are reached
//! through live handles that read and write through to the graph.
//!
//! # Features
//!
//! - Typed identifiers with generated ids when none is given
//! - Ordered attribute bags with lenient (`get_*`) and strict (`try_get_*`) reads
//! - Nodes and edges indexed by type, so a type-scoped scan is one lookup
//! - Directed edges whose endpoints must exist when the edge is added
//! - Several edges between the same pair of nodes
//! - Early-exit range callbacks over point-in-time snapshots
//! - JSON encoding of single entities and of the whole graph
//!
//! ## Example Usage
//!
//! ```rust
//! use dagger::graph::{foreign_key, Attributes, Graph};
//!
//! let graph = Graph::new();
//!
//! // Create nodes
//! let alice = graph.get_or_create_node("person", "alice", Attributes::new()).unwrap();
//! let bob = graph.get_or_create_node("person", "bob", Attributes::new()).unwrap();
//! alice.set("age", 30i64).unwrap();
//!
//! // Create edge
//! let knows = graph
//!     .get_or_create_edge("knows", "e1", Attributes::new(), alice.id(), bob.id())
//!     .unwrap();
//! assert_eq!(knows.from().unwrap().get_int("age").unwrap(), 30);
//!
//! // Endpoints must exist
//! let ghost = foreign_key("person", "ghost");
//! assert!(graph.get_or_create_edge("knows", "e2", Attributes::new(), alice.id(), &ghost).is_err());
//!
//! // Query by type
//! let mut persons = 0;
//! graph.range_node_types("person", |_| {
//!     persons += 1;
//!     true
//! });
//! assert_eq!(persons, 2);
//! ```

#![warn(clippy::all)]

pub mod graph;

// Re-export main types for convenience
pub use graph::{
    foreign_key, AttributeError, AttributeValue, Attributes, Edge, EdgeRef, Graph, GraphConfig,
    GraphError, GraphResult, GraphSnapshot, Node, NodeRef, TypedId,
};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get version string
pub fn version() -> &'static str {
    VERSION
}
