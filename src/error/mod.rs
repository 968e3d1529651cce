//! Error types for dlr-graph
//!
//! Read operations never fail: a missing identity yields `None` or an empty
//! sequence. Errors are reserved for handle misuse and host-facing checks.

use thiserror::Error;

use crate::graph::ContextId;

/// Main error type for graph operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    /// A live node already uses this identity
    #[error("Duplicate identity: {0}")]
    DuplicateIdentity(i32),

    /// Handle was issued by a different context
    #[error("Handle belongs to context {found}, not {expected}")]
    ForeignHandle {
        /// Context the operation ran against
        expected: ContextId,
        /// Context that issued the handle
        found: ContextId,
    },

    /// Handle refers to a node that was already released
    #[error("Stale handle for node {0}")]
    StaleHandle(i32),

    /// No live node with this identity
    #[error("Node not found: {0}")]
    NodeNotFound(i32),

    /// Shared context lock was poisoned
    #[error("Context lock poisoned: {0}")]
    Lock(String),
}

/// Result type alias for graph operations
pub type GraphResult<T> = Result<T, GraphError>;
