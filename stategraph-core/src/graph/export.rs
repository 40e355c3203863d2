//! Dirty-subgraph export for offline inspection.
//!
//! [`Graph::dirty_subgraph`] snapshots every dirty node and dirty edge. The
//! snapshot serializes with serde, and renders to JSON or to a Graphviz
//! `digraph` where pending edges are dashed and changed edges solid.

use std::fmt::Write;

use serde::Serialize;

use super::arena::{EdgeId, NodeId};
use super::edge::EdgeStatus;
use super::Graph;
use crate::error::{Error, Result};

/// A dirty node in an export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DirtyNode {
    pub id: NodeId,
    pub name: String,
    pub dirty_inputs: usize,
}

/// A dirty edge in an export. Edges without a producer are external roots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DirtyEdge {
    pub id: EdgeId,
    pub producer: Option<NodeId>,
    pub consumer: NodeId,
    pub status: EdgeStatus,
}

/// Snapshot of the dirty part of a graph.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DirtySubgraph {
    pub nodes: Vec<DirtyNode>,
    pub edges: Vec<DirtyEdge>,
}

impl DirtySubgraph {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(Error::Export)
    }

    /// Render as a Graphviz `digraph`.
    pub fn to_dot(&self) -> String {
        let mut out = String::from("digraph dirty {\n");
        for node in &self.nodes {
            let _ = writeln!(
                out,
                "  {} [label=\"{} ({})\"];",
                node.id,
                escape(&node.name),
                node.dirty_inputs
            );
        }
        for edge in &self.edges {
            let style = match edge.status {
                EdgeStatus::Pending => "dashed",
                _ => "solid",
            };
            let from = match edge.producer {
                Some(producer) => producer.to_string(),
                None => {
                    let root = format!("root_{}", edge.id);
                    let _ = writeln!(out, "  {} [shape=point];", root);
                    root
                }
            };
            let _ = writeln!(out, "  {} -> {} [style={}];", from, edge.consumer, style);
        }
        out.push_str("}\n");
        out
    }
}

fn escape(name: &str) -> String {
    name.replace('\\', "\\\\").replace('"', "\\\"")
}

impl<V> Graph<V> {
    /// Snapshot the dirty nodes and the dirty edges between them.
    pub fn dirty_subgraph(&self) -> DirtySubgraph {
        let mut export = DirtySubgraph::default();
        for (id, record) in self.nodes.iter() {
            if record.dirty_inputs == 0 {
                continue;
            }
            export.nodes.push(DirtyNode {
                id,
                name: record.name.clone(),
                dirty_inputs: record.dirty_inputs,
            });
            for &edge in &record.inputs {
                let input = &self.edges[edge];
                if input.status.is_dirty() {
                    export.edges.push(DirtyEdge {
                        id: edge,
                        producer: input.producer,
                        consumer: id,
                        status: input.status,
                    });
                }
            }
        }
        export
    }
}
