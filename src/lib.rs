//! # dlr-graph
//!
//! In-memory computational graph storage.
//!
//! A [`GraphContext`](graph::GraphContext) owns a set of op nodes, each
//! either wrapping a host value ("real") or standing in for a value not yet
//! computed ("virtual"), connected by directed input edges. The crate stores
//! structure only; it never evaluates an op.
//!
//! ## Features
//!
//! - **Identity lookup**: nodes are named by caller-assigned integers
//! - **Edge wiring**: inputs wired by identity, in creation order
//! - **Release**: handle counting plus cycle-safe sweeping frees nodes no
//!   caller or live consumer still needs
//!
//! ## Example
//!
//! ```
//! use dlr_graph::prelude::*;
//!
//! let mut ctx: GraphContext<Vec<f32>> = GraphContext::new();
//! let x = ctx.create_node(1, Some(vec![1.0, 2.0]));
//! let y = ctx.create_node(2, None);
//! ctx.add_inputs(2, &[1]);
//!
//! assert_eq!(ctx.node_inputs(2), vec![1]);
//!
//! // dropping the virtual result leaves the real input in place
//! ctx.release(y)?;
//! assert!(ctx.has_node(1));
//! ctx.release(x)?;
//! assert!(ctx.is_empty());
//! # Ok::<(), dlr_graph::GraphError>(())
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod chain;
pub mod error;
pub mod graph;
pub mod traversal;

// Python bindings (only with python feature)
#[cfg(feature = "python")]
pub mod python;

/// Prelude module - import commonly used types with `use dlr_graph::prelude::*`
pub mod prelude {
    pub use crate::chain::Chain;
    pub use crate::error::{GraphError, GraphResult};
    pub use crate::graph::{
        ContextConfig, ContextId, GraphContext, NodeHandle, NodeIndex, OpNode, SharedContext,
        WiringMode,
    };
    pub use crate::traversal::{
        find_cycle, has_path, predecessors, successors, BfsIterator, DfsIterator, Direction,
    };
}

pub use error::{GraphError, GraphResult};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
