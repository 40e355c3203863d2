//! Graph Edges
//!
//! An edge connects a producer node's output to one input of its consumer.
//! The consumer owns the edge; the producer only lists it among its
//! consumer edges.
//!
//! # Status
//!
//! ```text
//!             forward walk            send
//!  Unchanged ─────────────► Pending ───────► Changed
//!      ▲  ◄─────────────────   │                │
//!      │     clean walk        │                │
//!      └───────────────────────┴────────────────┘
//!                 cancel / consumed
//! ```
//!
//! `send` may also go straight from `Unchanged` to `Changed`. Only
//! `Changed` reports as changed; `Pending` means "something upstream is
//! dirty" and carries no value.

use serde::Serialize;

use super::arena::{EdgeId, NodeId};
use super::traits::EdgeTraits;
use super::Graph;

/// Status of a single edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeStatus {
    /// Nothing upstream is outstanding.
    Unchanged,

    /// An upstream node is dirty, but no value has been pushed yet.
    Pending,

    /// A concrete change is available to the consumer.
    Changed,
}

impl EdgeStatus {
    /// Whether the edge counts towards its consumer's dirty inputs.
    pub fn is_dirty(self) -> bool {
        self != EdgeStatus::Unchanged
    }
}

/// Edge record stored in the graph's edge arena.
pub(crate) struct EdgeRecord<V> {
    pub consumer: NodeId,
    pub producer: Option<NodeId>,
    pub traits: Option<Box<dyn EdgeTraits<V>>>,
    pub status: EdgeStatus,
    pub value: Option<V>,
}

impl<V> EdgeRecord<V> {
    /// Edges without traits carry no payload; their values are dropped.
    pub fn update(&mut self, incoming: V) {
        if let Some(traits) = self.traits.as_mut() {
            traits.update(&mut self.value, incoming);
        }
    }

    pub fn reset(&mut self) {
        if let Some(traits) = self.traits.as_mut() {
            traits.reset(&mut self.value);
        }
    }

    pub fn attached(&mut self) {
        if let Some(traits) = self.traits.as_mut() {
            traits.attached(&mut self.value, self.producer);
        }
    }

    pub fn detached(&mut self) {
        if let Some(traits) = self.traits.as_mut() {
            traits.detached(&mut self.value);
        }
    }

    pub fn consumed(&mut self) {
        if let Some(traits) = self.traits.as_mut() {
            traits.consumed(&mut self.value);
        }
    }
}

impl<V> Graph<V> {
    /// Push `value` into `edge` and mark it changed.
    ///
    /// The first transition away from `Unchanged` counts the edge as a
    /// dirty input of its consumer, which dirties everything downstream if
    /// the consumer was clean.
    pub fn send_edge(&mut self, edge: EdgeId, value: V) {
        self.edges[edge].update(value);
        self.mark_changed(edge);
    }

    /// Force `edge` back to `Unchanged`, discarding its payload.
    ///
    /// If the consumer has no dirty inputs left, the clean walk retracts
    /// the pending edges it had dirtied downstream.
    pub fn cancel_edge(&mut self, edge: EdgeId) {
        let record = &mut self.edges[edge];
        if !record.status.is_dirty() {
            return;
        }
        record.status = EdgeStatus::Unchanged;
        record.consumed();
        let consumer = record.consumer;
        self.remove_dirty_input(consumer);
    }

    /// Mark `edge` changed without touching its payload.
    pub(super) fn mark_changed(&mut self, edge: EdgeId) {
        let record = &mut self.edges[edge];
        let was_dirty = record.status.is_dirty();
        record.status = EdgeStatus::Changed;
        if !was_dirty {
            let consumer = record.consumer;
            self.add_dirty_input(consumer);
        }
    }

    /// Whether `edge` holds a concrete change. `Pending` is not a change.
    pub fn changed(&self, edge: EdgeId) -> bool {
        self.edges[edge].status == EdgeStatus::Changed
    }

    pub fn edge_status(&self, edge: EdgeId) -> EdgeStatus {
        self.edges[edge].status
    }

    /// The payload accumulated on `edge` by its traits.
    pub fn edge_value(&self, edge: EdgeId) -> Option<&V> {
        self.edges[edge].value.as_ref()
    }

    /// Move the payload out of `edge`, leaving its status alone.
    pub fn take_edge_value(&mut self, edge: EdgeId) -> Option<V> {
        self.edges[edge].value.take()
    }

    pub fn producer(&self, edge: EdgeId) -> Option<NodeId> {
        self.edges[edge].producer
    }

    pub fn consumer(&self, edge: EdgeId) -> NodeId {
        self.edges[edge].consumer
    }

    pub fn contains_edge(&self, edge: EdgeId) -> bool {
        self.edges.contains(edge)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::traits::{Append, Replace};

    /// A clean two-node chain `src -> dst` with a `Replace` edge.
    fn settled_chain() -> (Graph<i32>, NodeId, NodeId, EdgeId) {
        let mut graph = Graph::new();
        let src = graph.add_source("src");
        let dst = graph.add_source("dst");
        let edge = graph.input(dst, Some(src), Some(Box::new(Replace)));
        graph.update(dst).unwrap();
        (graph, src, dst, edge)
    }

    #[test]
    fn send_marks_changed_and_stores_value() {
        let (mut graph, _, dst, edge) = settled_chain();
        assert_eq!(graph.edge_status(edge), EdgeStatus::Unchanged);

        graph.send_edge(edge, 7);
        assert!(graph.changed(edge));
        assert_eq!(graph.edge_value(edge), Some(&7));
        assert_eq!(graph.dirty_input_count(dst), 1);

        // A second send is not counted twice.
        graph.send_edge(edge, 8);
        assert_eq!(graph.dirty_input_count(dst), 1);
        assert_eq!(graph.edge_value(edge), Some(&8));
    }

    #[test]
    fn send_promotes_pending() {
        let (mut graph, src, dst, edge) = settled_chain();
        graph.invalidate(src);
        assert_eq!(graph.edge_status(edge), EdgeStatus::Pending);
        assert!(!graph.changed(edge));

        graph.send_edge(edge, 1);
        assert_eq!(graph.edge_status(edge), EdgeStatus::Changed);
        assert_eq!(graph.dirty_input_count(dst), 1);
    }

    #[test]
    fn cancel_resets_from_changed() {
        let (mut graph, _, dst, edge) = settled_chain();
        graph.send_edge(edge, 3);
        graph.cancel_edge(edge);

        assert_eq!(graph.edge_status(edge), EdgeStatus::Unchanged);
        assert_eq!(graph.edge_value(edge), None);
        assert!(!graph.is_dirty(dst));

        // Cancelling a clean edge is a no-op.
        graph.cancel_edge(edge);
        assert_eq!(graph.dirty_input_count(dst), 0);
    }

    #[test]
    fn edges_without_traits_drop_values() {
        let mut graph: Graph<i32> = Graph::new();
        let dst = graph.add_source("dst");
        let edge = graph.input(dst, None, None);
        graph.send_edge(edge, 5);
        assert!(graph.changed(edge));
        assert_eq!(graph.edge_value(edge), None);
    }

    #[test]
    fn take_value_leaves_status() {
        let mut graph: Graph<Vec<u8>> = Graph::new();
        let dst = graph.add_source("dst");
        let edge = graph.input(dst, None, Some(Box::new(Append)));
        graph.send_edge(edge, vec![1]);
        graph.send_edge(edge, vec![2]);

        assert_eq!(graph.take_edge_value(edge), Some(vec![1, 2]));
        assert!(graph.changed(edge));
        assert_eq!(graph.edge_value(edge), None);
    }
}
