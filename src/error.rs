//! Error taxonomy for the virtual graph engine.

use std::time::Duration;

use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, GraphError>;

/// Errors raised by the virtual graph engine.
///
/// No-path conditions are not errors: pathfinding handlers report them
/// in-band through the result's `error` field instead.
#[derive(Debug, Error)]
pub enum GraphError {
    /// A schema string failed the identifier allow-list. Raised before
    /// any SQL is sent.
    #[error("invalid identifier {0:?}")]
    InvalidIdentifier(String),
    /// A caller-supplied predicate was empty or attempted statement
    /// splitting.
    #[error("invalid predicate: {0}")]
    InvalidPredicate(String),
    /// A handler argument was malformed (empty start set, unknown
    /// option combination).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    /// A safety budget was breached while executing.
    #[error("safety limit exceeded: {0}")]
    SafetyLimitExceeded(String),
    /// The pre-flight estimator predicted a reachable set larger than
    /// the node budget; no traversal work was started.
    #[error("estimated subgraph of {estimated} nodes exceeds limit of {limit}")]
    SubgraphTooLarge {
        /// Conservative upper bound on reachable nodes.
        estimated: u64,
        /// The configured node budget.
        limit: u64,
    },
    /// The store interrupted a statement at the session deadline.
    #[error("statement timed out after {0:?}")]
    QueryTimeout(Duration),
    /// Any other store-reported error, original message preserved.
    #[error("store error: {0}")]
    Store(#[from] rusqlite::Error),
    /// Ontology document could not be parsed or a lookup failed.
    #[error("ontology error: {0}")]
    Ontology(String),
}
