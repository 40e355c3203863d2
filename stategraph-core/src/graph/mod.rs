//! Dependency Graph
//!
//! This module implements the incremental update engine: nodes connected by
//! stateful edges, dirtiness propagated eagerly, recomputation run lazily and
//! only for what is stale.
//!
//! # Overview
//!
//! - A node is a named computation with an optional recompute callback.
//! - An edge feeds a producer's output into one input of a consumer. It is
//!   `Unchanged`, `Pending` (something upstream is dirty) or `Changed` (a
//!   concrete change is available).
//! - Each node counts its dirty inputs. The counter is kept exact by the
//!   forward and clean walks in `propagate`.
//!
//! External code dirties the graph with [`Graph::invalidate`] and
//! [`Graph::send_edge`], then calls [`Graph::update`]. The scheduler runs
//! the dirty subgraph upstream-first. A callback can hand its consumers an
//! exact delta with [`Graph::send_node`], or declare that nothing changed
//! with [`Graph::cancel_node`]; otherwise its pending consumer edges simply
//! become changed.
//!
//! # Example
//!
//! ```
//! use stategraph_core::graph::{Graph, Replace};
//!
//! let mut graph: Graph<u32> = Graph::new();
//! let model = graph.add_source("model");
//! let count = graph.add_node("count", |graph, node| {
//!     graph.send_node(node, 42);
//! });
//! graph.input(count, Some(model), None);
//! let view = graph.add_source("view");
//! let edge = graph.input(view, Some(count), Some(Box::new(Replace)));
//!
//! graph.invalidate(model);
//! graph.update(count).unwrap();
//! assert!(graph.changed(edge));
//! assert_eq!(graph.edge_value(edge), Some(&42));
//! ```

mod arena;
mod edge;
mod export;
mod node;
mod probe;
mod propagate;
mod scheduler;
mod traits;

pub use arena::{EdgeId, NodeId};
pub use edge::EdgeStatus;
pub use export::{DirtyEdge, DirtyNode, DirtySubgraph};
pub use node::{Graph, Recompute};
pub use probe::{NoopProbe, Probe, TracingProbe};
pub use traits::{Append, EdgeTraits, Merge, Replace};
