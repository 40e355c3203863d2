//! Update Scheduler
//!
//! The scheduler runs the recompute callbacks of the dirty subgraph behind a
//! set of requested nodes, upstream before downstream, each at most once.
//!
//! # Algorithm
//!
//! 1. Walk backwards from the requested roots through input producers,
//!    entering only dirty nodes. Each visited node gets a counter of the
//!    dirty downstream edges pointing at it; each root is seeded with one.
//! 2. Order with Kahn's algorithm: release the roots' seeds, extract every
//!    node whose counter reaches zero and decrement its producers. This
//!    yields downstream-first order, which is reversed for execution.
//! 3. Run each node that is still dirty when its turn comes. After the
//!    callback, a node that did not resolve its inputs itself (through
//!    [`Graph::send_node`] or [`Graph::cancel_node`]) gets the default
//!    completion: pending consumer edges become changed with their payload
//!    reset, and the node's own inputs are consumed.
//!
//! Nodes on a producer cycle never reach zero in step 2. What happens then
//! is decided by [`CycleHandling`].

use indexmap::map::Entry;
use indexmap::IndexMap;
use tracing::{debug, error, trace, warn};

use super::arena::NodeId;
use super::edge::EdgeStatus;
use super::Graph;
use crate::config::CycleHandling;
use crate::error::{Error, Result};

/// Execution plan for one update pass.
#[derive(Debug, Default, PartialEq, Eq)]
pub(super) struct Schedule {
    /// Nodes to run, upstream first.
    pub order: Vec<NodeId>,
    /// Nodes that could not be ordered.
    pub stalled: Vec<NodeId>,
}

/// Count one more dirty downstream edge on `node`, reporting first visits.
fn bump(counters: &mut IndexMap<NodeId, usize>, node: NodeId) -> bool {
    match counters.entry(node) {
        Entry::Vacant(entry) => {
            entry.insert(1);
            true
        }
        Entry::Occupied(mut entry) => {
            *entry.get_mut() += 1;
            false
        }
    }
}

/// Release one downstream edge of `node`, reporting when it becomes free.
fn release(counters: &mut IndexMap<NodeId, usize>, node: NodeId) -> bool {
    match counters.get_mut(&node) {
        Some(count) if *count > 0 => {
            *count -= 1;
            *count == 0
        }
        _ => false,
    }
}

impl<V> Graph<V> {
    /// Plan the update of `roots` without running anything.
    pub(super) fn plan(&self, roots: &[NodeId]) -> Schedule {
        let mut counters: IndexMap<NodeId, usize> = IndexMap::new();
        let mut stack = Vec::new();

        for &root in roots {
            if self.is_dirty(root) && bump(&mut counters, root) {
                stack.push(root);
            }
        }

        while let Some(node) = stack.pop() {
            for &edge in &self.nodes[node].inputs {
                let Some(producer) = self.edges[edge].producer else {
                    continue;
                };
                if self.is_dirty(producer) && bump(&mut counters, producer) {
                    stack.push(producer);
                }
            }
        }

        let mut ready = Vec::new();
        for &root in roots {
            if release(&mut counters, root) {
                ready.push(root);
            }
        }

        let mut order = Vec::with_capacity(counters.len());
        while let Some(node) = ready.pop() {
            order.push(node);
            for &edge in &self.nodes[node].inputs {
                if let Some(producer) = self.edges[edge].producer {
                    if release(&mut counters, producer) {
                        ready.push(producer);
                    }
                }
            }
        }
        order.reverse();

        let stalled = counters
            .iter()
            .filter(|(_, count)| **count > 0)
            .map(|(&node, _)| node)
            .collect();

        Schedule { order, stalled }
    }

    /// Bring `node` up to date, running only what is stale.
    ///
    /// A clean node is a no-op.
    pub fn update(&mut self, node: NodeId) -> Result<()> {
        self.update_all(&[node])
    }

    /// Bring several nodes up to date in a single pass. Shared upstream
    /// nodes run once.
    pub fn update_all(&mut self, roots: &[NodeId]) -> Result<()> {
        let schedule = self.plan(roots);
        if schedule.order.is_empty() && schedule.stalled.is_empty() {
            return Ok(());
        }

        if !schedule.stalled.is_empty() {
            let nodes: Vec<String> = schedule
                .stalled
                .iter()
                .map(|&node| self.nodes[node].name.clone())
                .collect();
            match self.config.cycle_handling {
                CycleHandling::Error => {
                    error!(?nodes, "producer cycle in dirty subgraph, update aborted");
                    return Err(Error::Cycle { nodes });
                }
                CycleHandling::Ignore => {
                    warn!(?nodes, "producer cycle in dirty subgraph, skipping stalled nodes");
                }
            }
        }

        debug!(nodes = schedule.order.len(), "update pass started");
        let mut ran = 0usize;
        for node in schedule.order {
            // A callback may have removed or resolved a later node.
            let dirty = self
                .nodes
                .get(node)
                .is_some_and(|record| record.dirty_inputs > 0);
            if !dirty {
                trace!(%node, "skipping clean node");
                continue;
            }
            self.run(node);
            ran += 1;
        }
        debug!(ran, "update pass finished");

        if self.config.check_invariants {
            self.check_invariants()?;
        }
        Ok(())
    }

    fn run(&mut self, node: NodeId) {
        if let Some(mut recompute) = self.nodes[node].recompute.take() {
            let name = self.nodes[node].name.clone();
            trace!(%node, name = %name, "recompute");
            self.probe.begin(node, &name);
            recompute(self, node);
            self.probe.end(node, &name);

            // The callback may have removed its own node.
            let Some(record) = self.nodes.get_mut(node) else {
                return;
            };
            if record.recompute.is_none() {
                record.recompute = Some(recompute);
            }
        }

        if self.nodes[node].dirty_inputs > 0 {
            self.complete(node);
        }
    }

    /// Default completion for a node that left its inputs unresolved.
    fn complete(&mut self, node: NodeId) {
        let count = self.nodes[node].consumer_edges.len();
        for i in 0..count {
            let edge = &mut self.edges[self.nodes[node].consumer_edges[i]];
            if edge.status == EdgeStatus::Pending {
                edge.status = EdgeStatus::Changed;
                edge.reset();
            }
        }
        self.consume_inputs(node);
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::config::EngineConfig;
    use crate::graph::EdgeTraits;

    type HookLog = Rc<RefCell<Vec<&'static str>>>;

    /// Logs every hook. `consumed` keeps the payload so it can be told
    /// apart from `reset`.
    struct Recording(HookLog);

    impl EdgeTraits<i32> for Recording {
        fn reset(&mut self, slot: &mut Option<i32>) {
            self.0.borrow_mut().push("reset");
            *slot = None;
        }

        fn update(&mut self, slot: &mut Option<i32>, incoming: i32) {
            self.0.borrow_mut().push("update");
            *slot = Some(incoming);
        }

        fn attached(&mut self, _slot: &mut Option<i32>, _producer: Option<NodeId>) {
            self.0.borrow_mut().push("attached");
        }

        fn detached(&mut self, _slot: &mut Option<i32>) {
            self.0.borrow_mut().push("detached");
        }

        fn consumed(&mut self, _slot: &mut Option<i32>) {
            self.0.borrow_mut().push("consumed");
        }
    }

    fn logging_node(
        graph: &mut Graph<()>,
        name: &'static str,
        log: &Rc<RefCell<Vec<&'static str>>>,
    ) -> NodeId {
        let log = log.clone();
        graph.add_node(name, move |_, _| log.borrow_mut().push(name))
    }

    #[test]
    fn plan_orders_chain_upstream_first() {
        let mut graph: Graph<()> = Graph::new();
        let a = graph.add_source("a");
        let b = graph.add_source("b");
        let c = graph.add_source("c");
        graph.input(b, Some(a), None);
        graph.input(c, Some(b), None);
        graph.invalidate(a);

        let schedule = graph.plan(&[c]);
        assert_eq!(schedule.order, vec![a, b, c]);
        assert!(schedule.stalled.is_empty());
    }

    #[test]
    fn plan_skips_clean_roots_and_producers() {
        let mut graph: Graph<()> = Graph::new();
        let a = graph.add_source("a");
        let b = graph.add_source("b");
        graph.input(b, Some(a), None);
        graph.update(b).unwrap();

        assert_eq!(graph.plan(&[b]), Schedule::default());
        assert_eq!(graph.plan(&[a, b]), Schedule::default());
    }

    #[test]
    fn duplicate_roots_run_once() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut graph: Graph<()> = Graph::new();
        let a = graph.add_source("a");
        let b = logging_node(&mut graph, "b", &log);
        graph.input(b, Some(a), None);

        graph.update_all(&[b, b, a]).unwrap();
        assert_eq!(*log.borrow(), vec!["b"]);
    }

    #[test]
    fn cycle_is_reported_by_default() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut graph: Graph<()> = Graph::new();
        let a = logging_node(&mut graph, "a", &log);
        let b = logging_node(&mut graph, "b", &log);
        graph.input(a, Some(b), None);
        graph.input(b, Some(a), None);

        let err = graph.update(b).unwrap_err();
        match err {
            Error::Cycle { mut nodes } => {
                nodes.sort();
                assert_eq!(nodes, vec!["a", "b"]);
            }
            other => panic!("unexpected error: {}", other),
        }
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn ignored_cycle_runs_the_orderable_part() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let config = EngineConfig {
            cycle_handling: CycleHandling::Ignore,
            check_invariants: true,
        };
        let mut graph: Graph<()> = Graph::with_config(config);
        let a = logging_node(&mut graph, "a", &log);
        let b = logging_node(&mut graph, "b", &log);
        let c = logging_node(&mut graph, "c", &log);
        graph.input(a, Some(b), None);
        graph.input(b, Some(a), None);
        graph.input(c, None, None);

        graph.update_all(&[b, c]).unwrap();
        assert_eq!(*log.borrow(), vec!["c"]);
        assert!(graph.is_dirty(a));
        assert!(graph.is_dirty(b));
    }

    #[test]
    fn default_completion_promotes_pending_edges() {
        let mut graph: Graph<i32> = Graph::new();
        let a = graph.add_source("a");
        let b = graph.add_source("b");
        let edge = graph.input(b, Some(a), Some(Box::new(crate::graph::Replace)));
        graph.update(b).unwrap();

        graph.invalidate(a);
        assert_eq!(graph.edge_status(edge), EdgeStatus::Pending);

        graph.update(a).unwrap();
        assert!(!graph.is_dirty(a));
        assert!(graph.changed(edge));
        assert_eq!(graph.edge_value(edge), None);
        assert!(graph.is_dirty(b));
    }

    #[test]
    fn edge_hooks_follow_edge_lifecycle() {
        let log: HookLog = Rc::new(RefCell::new(Vec::new()));
        let mut graph: Graph<i32> = Graph::new();
        let a = graph.add_source("a");
        let b = graph.add_source("b");
        let edge = graph.input(b, Some(a), Some(Box::new(Recording(log.clone()))));
        assert_eq!(log.take(), vec!["attached"]);

        graph.update(b).unwrap();
        assert_eq!(log.take(), vec!["consumed"]);

        // Default completion resets the promoted edge.
        graph.invalidate(a);
        assert!(log.borrow().is_empty());
        graph.update(a).unwrap();
        assert_eq!(log.take(), vec!["reset"]);
        assert!(graph.changed(edge));

        graph.send_edge(edge, 5);
        graph.cancel_edge(edge);
        assert_eq!(log.take(), vec!["update", "consumed"]);
        assert_eq!(graph.edge_value(edge), Some(&5));

        graph.remove_node(a);
        assert_eq!(log.take(), vec!["detached"]);
        assert_eq!(graph.producer(edge), None);
    }
}
