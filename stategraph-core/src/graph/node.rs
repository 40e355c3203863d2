//! Graph Nodes
//!
//! A node is a named computation unit. It owns its input edges, lists the
//! edges it feeds as their producer, and keeps a counter of how many of
//! its inputs are dirty. A counter of zero means the node is clean.
//!
//! [`Graph`] owns every node and edge record; nodes and edges are referred
//! to by [`NodeId`] and [`EdgeId`] handles.

use std::fmt;

use smallvec::SmallVec;
use tracing::{debug, trace};

use super::arena::{Arena, EdgeId, NodeId};
use super::edge::{EdgeRecord, EdgeStatus};
use super::probe::{NoopProbe, Probe};
use super::traits::EdgeTraits;
use crate::config::EngineConfig;
use crate::error::{Error, Result};

/// Recompute callback of a node.
///
/// The callback receives the graph and its own handle, so it can inspect
/// its inputs and push values with [`Graph::send_node`] or suppress
/// downstream work with [`Graph::cancel_node`].
pub type Recompute<V> = Box<dyn FnMut(&mut Graph<V>, NodeId)>;

pub(crate) type EdgeList = SmallVec<[EdgeId; 4]>;

/// Node record stored in the graph's node arena.
pub(crate) struct NodeRecord<V> {
    pub name: String,

    /// Taken out of the record while the callback runs.
    pub recompute: Option<Recompute<V>>,

    /// Edges this node consumes, in creation order.
    pub inputs: EdgeList,

    /// Edges this node produces into. Owned by their consumers.
    pub consumer_edges: EdgeList,

    /// Number of `inputs` that are `Pending` or `Changed`.
    pub dirty_inputs: usize,

    /// Producer-less input used by [`Graph::invalidate`].
    pub self_edge: Option<EdgeId>,
}

impl<V> NodeRecord<V> {
    fn new(name: String, recompute: Option<Recompute<V>>) -> Self {
        Self {
            name,
            recompute,
            inputs: EdgeList::new(),
            consumer_edges: EdgeList::new(),
            dirty_inputs: 0,
            self_edge: None,
        }
    }
}

/// The incremental dependency graph.
///
/// `V` is the payload type carried by edges that have traits.
pub struct Graph<V> {
    pub(super) nodes: Arena<NodeId, NodeRecord<V>>,
    pub(super) edges: Arena<EdgeId, EdgeRecord<V>>,
    pub(super) config: EngineConfig,
    pub(super) probe: Box<dyn Probe>,
}

impl<V> Default for Graph<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> fmt::Debug for Graph<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Graph")
            .field("nodes", &self.nodes.len())
            .field("edges", &self.edges.len())
            .field("config", &self.config)
            .finish()
    }
}

impl<V> Graph<V> {
    /// Create an empty graph with the default configuration.
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    pub fn with_config(config: EngineConfig) -> Self {
        Self {
            nodes: Arena::default(),
            edges: Arena::default(),
            config,
            probe: Box::new(NoopProbe),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Install the probe invoked around every recompute callback.
    pub fn set_probe(&mut self, probe: Box<dyn Probe>) {
        self.probe = probe;
    }

    /// Add a node with a recompute callback.
    pub fn add_node<F>(&mut self, name: impl Into<String>, recompute: F) -> NodeId
    where
        F: FnMut(&mut Graph<V>, NodeId) + 'static,
    {
        self.nodes.push(NodeRecord::new(name.into(), Some(Box::new(recompute))))
    }

    /// Add a node without derivation logic, typically driven from outside
    /// through [`invalidate`](Self::invalidate) or [`send_node`](Self::send_node).
    pub fn add_source(&mut self, name: impl Into<String>) -> NodeId {
        self.nodes.push(NodeRecord::new(name.into(), None))
    }

    /// Create a new input edge on `node`, fed by `producer` if given.
    ///
    /// New inputs start `Changed`: the consumer has never seen this input,
    /// so it must recompute at least once.
    pub fn input(
        &mut self,
        node: NodeId,
        producer: Option<NodeId>,
        traits: Option<Box<dyn EdgeTraits<V>>>,
    ) -> EdgeId {
        // Validate both handles before mutating anything.
        let _ = &self.nodes[node];
        if let Some(producer) = producer {
            let _ = &self.nodes[producer];
        }

        let mut record = EdgeRecord {
            consumer: node,
            producer,
            traits,
            status: EdgeStatus::Unchanged,
            value: None,
        };
        record.attached();
        let edge = self.edges.push(record);

        self.nodes[node].inputs.push(edge);
        if let Some(producer) = producer {
            self.nodes[producer].consumer_edges.push(edge);
        }
        trace!(%edge, consumer = %node, producer = ?producer, "edge attached");

        self.mark_changed(edge);
        edge
    }

    /// Mark `node` dirty on its own account. Repeated calls before the next
    /// update have the same effect as one.
    pub fn invalidate(&mut self, node: NodeId) {
        match self.nodes[node].self_edge {
            Some(edge) => self.mark_changed(edge),
            None => {
                let edge = self.input(node, None, None);
                self.nodes[node].self_edge = Some(edge);
            }
        }
    }

    /// Push `value` to every consumer edge of `node` and resolve the node's
    /// own inputs.
    ///
    /// Consumers observe their edge from this node as changed, carrying
    /// whatever the edge's traits made of `value`. May be called several
    /// times during one recompute; accumulating traits then see every push.
    pub fn send_node(&mut self, node: NodeId, value: V)
    where
        V: Clone,
    {
        let count = self.nodes[node].consumer_edges.len();
        for i in 0..count {
            let edge = self.nodes[node].consumer_edges[i];
            self.send_edge(edge, value.clone());
        }
        self.consume_inputs(node);
    }

    /// Resolve `node`'s inputs as if it had run with no effect, and retract
    /// the pending edges it had dirtied downstream.
    pub fn cancel_node(&mut self, node: NodeId) {
        self.consume_inputs(node);
        self.propagate_clean(node);
    }

    /// Reset every input of `node` to `Unchanged` and zero its counter.
    pub(super) fn consume_inputs(&mut self, node: NodeId) {
        let count = self.nodes[node].inputs.len();
        for i in 0..count {
            let edge = &mut self.edges[self.nodes[node].inputs[i]];
            edge.status = EdgeStatus::Unchanged;
            edge.consumed();
        }
        self.nodes[node].dirty_inputs = 0;
    }

    /// Remove `node` and the edges it owns.
    ///
    /// Edges this node produced into stay with their consumers as
    /// producer-less edges. Those still `Pending` are cancelled, since
    /// nothing is left to resolve them; `Changed` ones keep their payload.
    pub fn remove_node(&mut self, node: NodeId) {
        let consumer_edges = std::mem::take(&mut self.nodes[node].consumer_edges);
        for &edge in &consumer_edges {
            let Some(record) = self.edges.get_mut(edge) else {
                continue;
            };
            record.producer = None;
            record.detached();
            if record.status == EdgeStatus::Pending {
                self.cancel_edge(edge);
            }
        }

        let Some(record) = self.nodes.remove(node) else {
            return;
        };
        for edge in record.inputs {
            let Some(mut input) = self.edges.remove(edge) else {
                continue;
            };
            if let Some(producer) = input.producer {
                if let Some(producer) = self.nodes.get_mut(producer) {
                    producer.consumer_edges.retain(|e| *e != edge);
                }
            }
            input.detached();
        }
        debug!(%node, name = %record.name, "node removed");
    }

    pub fn name(&self, node: NodeId) -> &str {
        &self.nodes[node].name
    }

    /// Whether `node` has outstanding dirty inputs.
    pub fn is_dirty(&self, node: NodeId) -> bool {
        self.nodes[node].dirty_inputs > 0
    }

    pub fn dirty_input_count(&self, node: NodeId) -> usize {
        self.nodes[node].dirty_inputs
    }

    /// Input edges of `node`, including the one created by `invalidate`.
    pub fn inputs(&self, node: NodeId) -> &[EdgeId] {
        &self.nodes[node].inputs
    }

    /// Edges `node` produces into.
    pub fn consumer_edges(&self, node: NodeId) -> &[EdgeId] {
        &self.nodes[node].consumer_edges
    }

    /// The input edge `node` is fed through by `producer`, if any.
    pub fn input_from(&self, node: NodeId, producer: NodeId) -> Option<EdgeId> {
        self.nodes[node]
            .inputs
            .iter()
            .copied()
            .find(|&edge| self.edges[edge].producer == Some(producer))
    }

    pub fn contains_node(&self, node: NodeId) -> bool {
        self.nodes.contains(node)
    }

    /// Find the first live node named `name`.
    pub fn find_node(&self, name: &str) -> Option<NodeId> {
        self.nodes
            .iter()
            .find(|(_, record)| record.name == name)
            .map(|(id, _)| id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.iter().map(|(id, _)| id)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Verify that every node's counter equals its number of dirty inputs.
    pub fn check_invariants(&self) -> Result<()> {
        for (_, record) in self.nodes.iter() {
            let actual = record
                .inputs
                .iter()
                .filter(|&&edge| self.edges[edge].status.is_dirty())
                .count();
            if actual != record.dirty_inputs {
                return Err(Error::Invariant {
                    node: record.name.clone(),
                    counter: record.dirty_inputs,
                    actual,
                });
            }
        }
        Ok(())
    }
}
