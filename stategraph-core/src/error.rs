//! Error types for stategraph-core.
//!
//! The engine itself is bookkeeping; the only failures it reports are the
//! ones a caller can act on: a producer cycle that makes a dirty subgraph
//! unorderable, a broken dirty-count invariant, and malformed configuration.

use thiserror::Error;

/// Result type for stategraph-core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in stategraph-core.
#[derive(Debug, Error)]
pub enum Error {
    /// The scheduler could not order the dirty subgraph.
    ///
    /// `nodes` lists the names of the nodes whose downstream counters never
    /// reached zero.
    #[error("producer cycle detected among nodes: {}", nodes.join(", "))]
    Cycle { nodes: Vec<String> },

    /// A node's dirty-input counter disagrees with its input edges.
    #[error("dirty-count invariant violated on node `{node}`: counter is {counter}, {actual} dirty inputs")]
    Invariant {
        node: String,
        counter: usize,
        actual: usize,
    },

    /// Configuration could not be parsed.
    #[error("invalid configuration: {0}")]
    Config(#[source] serde_json::Error),

    /// A dirty-subgraph export could not be serialized.
    #[error("export failed: {0}")]
    Export(#[source] serde_json::Error),

    /// An environment variable held a value we do not understand.
    #[error("invalid value `{value}` for {var}")]
    Env { var: &'static str, value: String },
}
