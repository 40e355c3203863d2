//! Timing probes around recompute callbacks.
//!
//! A [`Graph`](super::Graph) calls [`Probe::begin`] right before a node's
//! recompute callback and [`Probe::end`] right after it returns. The default
//! probe does nothing.

use std::time::Instant;

use tracing::debug;

use super::arena::NodeId;

/// Hooks invoked around each recompute callback.
pub trait Probe {
    fn begin(&mut self, node: NodeId, name: &str) {
        let _ = (node, name);
    }

    fn end(&mut self, node: NodeId, name: &str) {
        let _ = (node, name);
    }
}

/// Probe that records nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopProbe;

impl Probe for NoopProbe {}

/// Reports how long each recompute took as a `tracing` event.
///
/// Begin times are kept on a stack, so updates nested inside a callback
/// are timed correctly.
#[derive(Debug, Default)]
pub struct TracingProbe {
    started: Vec<Instant>,
}

impl TracingProbe {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Probe for TracingProbe {
    fn begin(&mut self, _node: NodeId, _name: &str) {
        self.started.push(Instant::now());
    }

    fn end(&mut self, node: NodeId, name: &str) {
        if let Some(start) = self.started.pop() {
            let elapsed = start.elapsed();
            debug!(
                %node,
                name,
                elapsed_us = u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX),
                "recompute finished"
            );
        }
    }
}
