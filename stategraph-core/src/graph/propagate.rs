//! Dirty Propagation
//!
//! Two dual walks keep every node's dirty-input counter equal to the number
//! of its dirty inputs.
//!
//! - The forward walk starts at a node that just became dirty and marks its
//!   `Unchanged` consumer edges `Pending`. A consumer whose counter goes
//!   from 0 to 1 is walked in turn. Edges that are already dirty stop the
//!   walk, so repeated invalidation costs nothing beyond the first.
//!
//! - The clean walk starts at a node that just became clean and retracts its
//!   `Pending` consumer edges. `Changed` edges carry a concrete value and
//!   are never retracted. A consumer whose counter drops to 0 is walked in
//!   turn.
//!
//! Both walks use an explicit worklist, so deep graphs do not grow the stack,
//! and a node is only pushed on the transition of its counter, so no node is
//! visited twice per walk.

use tracing::trace;

use super::arena::NodeId;
use super::edge::EdgeStatus;
use super::Graph;

impl<V> Graph<V> {
    /// Count one more dirty input on `node`.
    pub(super) fn add_dirty_input(&mut self, node: NodeId) {
        let record = &mut self.nodes[node];
        record.dirty_inputs += 1;
        if record.dirty_inputs == 1 {
            self.propagate_dirty(node);
        }
    }

    /// Count one fewer dirty input on `node`.
    pub(super) fn remove_dirty_input(&mut self, node: NodeId) {
        let record = &mut self.nodes[node];
        debug_assert!(
            record.dirty_inputs > 0,
            "dirty-input counter of `{}` would go negative",
            record.name
        );
        record.dirty_inputs = record.dirty_inputs.saturating_sub(1);
        if record.dirty_inputs == 0 {
            self.propagate_clean(node);
        }
    }

    /// Forward walk from a node that just became dirty.
    pub(super) fn propagate_dirty(&mut self, start: NodeId) {
        self.walk(start, EdgeStatus::Unchanged, EdgeStatus::Pending);
    }

    /// Clean walk from a node whose dirtiness was resolved without output.
    pub(super) fn propagate_clean(&mut self, start: NodeId) {
        self.walk(start, EdgeStatus::Pending, EdgeStatus::Unchanged);
    }

    fn walk(&mut self, start: NodeId, from: EdgeStatus, to: EdgeStatus) {
        let dirtying = to.is_dirty();
        let mut worklist = vec![start];
        let mut visited = 0usize;

        while let Some(node) = worklist.pop() {
            visited += 1;
            let count = self.nodes[node].consumer_edges.len();
            for i in 0..count {
                let edge = &mut self.edges[self.nodes[node].consumer_edges[i]];
                if edge.status != from {
                    continue;
                }
                edge.status = to;
                let consumer = &mut self.nodes[edge.consumer];

                let flipped = if dirtying {
                    consumer.dirty_inputs += 1;
                    consumer.dirty_inputs == 1
                } else {
                    consumer.dirty_inputs -= 1;
                    consumer.dirty_inputs == 0
                };
                if flipped {
                    worklist.push(edge.consumer);
                }
            }
        }

        trace!(%start, visited, dirtying, "propagation walk finished");
    }
}
