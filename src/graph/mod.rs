//! Graph storage module
//!
//! This module provides the storage and lifecycle layer for computational
//! graphs:
//!
//! - [`GraphContext`]: owner of every node, with identity lookups and wiring
//! - [`OpNode`]: a vertex, real (with payload) or virtual (without)
//! - [`NodeHandle`]: what the host holds, and gives back on release
//!
//! # Example
//!
//! ```
//! use dlr_graph::graph::GraphContext;
//!
//! let mut ctx: GraphContext<&str> = GraphContext::new();
//! ctx.create_node(1, Some("x"));
//! ctx.create_node(2, None);
//! ctx.add_inputs(2, &[1]);
//!
//! assert_eq!(ctx.node_inputs(2), vec![1]);
//! assert_eq!(ctx.vertex_count(), 2);
//! assert_eq!(ctx.dump(), "-> 1 -> 2");
//! ```
//!
//! # Lifetimes
//!
//! | Holder | Keeps a node alive? |
//! |--------|---------------------|
//! | caller handle | yes, until released |
//! | input edge from a live node | yes |
//! | output edge | no |
//! | the context | only until it is dropped |
//!
//! Arena bookkeeping is internal; callers only see nodes and handles:
//!
//! ```compile_fail
//! use dlr_graph::graph::OpEntry;
//! ```

pub mod accessors;
pub mod config;
pub mod context;
pub(crate) mod maps;
pub mod mutators;
pub mod node;

// Re-export main types
pub use config::{ContextConfig, WiringMode};
pub use context::{GraphContext, SharedContext};
pub use node::{ContextId, NodeHandle, NodeIndex, OpNode};
