//! Stategraph Core
//!
//! This crate provides an incremental dependency engine: a graph of named
//! computations that recomputes only what is stale, and lets a recomputing
//! node push exactly what changed to its dependents instead of forcing them
//! to rederive everything.
//!
//! It implements:
//!
//! - Tri-state edges (`Unchanged`, `Pending`, `Changed`) with pluggable
//!   value accumulation
//! - Forward and backward dirty propagation that keeps per-node dirty
//!   counters exact
//! - A topological scheduler for the dirty subgraph behind requested nodes
//! - Diagnostics: dirty-subgraph export and recompute timing probes
//!
//! # Architecture
//!
//! - `graph`: nodes, edges, propagation and scheduling
//! - `config`: engine policy (cycle handling, invariant checks)
//! - `error`: error type shared by the crate
//!
//! The engine is single-threaded. Callers batch any number of invalidations,
//! then call [`Graph::update`](graph::Graph::update) when they need results.

pub mod config;
pub mod error;
pub mod graph;

pub use config::{CycleHandling, EngineConfig};
pub use error::{Error, Result};
pub use graph::{EdgeId, EdgeStatus, EdgeTraits, Graph, NodeId};
