//! Op nodes and the handles that name them

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::chain::Chain;

use super::config::WiringMode;

static NEXT_CONTEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identifier of a [`GraphContext`](super::GraphContext)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContextId(u64);

impl ContextId {
    /// Allocate a fresh id
    pub(crate) fn next() -> Self {
        Self(NEXT_CONTEXT_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Wrap a raw value
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw value
    pub fn as_raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ctx#{}", self.0)
    }
}

/// Position of a node in its context's arena (creation order)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeIndex(pub(crate) usize);

impl NodeIndex {
    /// Arena position
    pub fn index(self) -> usize {
        self.0
    }
}

/// Caller-side handle to a node
///
/// Issued by `create_node`/`acquire` and given back through `release`.
/// Every handle the host drops must be released exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeHandle {
    pub(crate) context: ContextId,
    pub(crate) index: NodeIndex,
}

impl NodeHandle {
    /// Context that issued this handle
    pub fn context(&self) -> ContextId {
        self.context
    }

    /// Arena position of the node
    pub fn index(&self) -> NodeIndex {
        self.index
    }
}

/// A graph vertex
///
/// A node carrying a payload is "real"; a node without one is a virtual
/// placeholder for a value not computed yet.
#[derive(Debug, Clone)]
pub struct OpNode<P> {
    pub(crate) identity: i32,
    pub(crate) payload: Option<P>,
    pub(crate) context: ContextId,
    pub(crate) inputs: Chain<NodeIndex>,
    pub(crate) outputs: Chain<NodeIndex>,
}

impl<P> OpNode<P> {
    /// Create a node with no edges
    pub(crate) fn new(identity: i32, payload: Option<P>, context: ContextId) -> Self {
        Self {
            identity,
            payload,
            context,
            inputs: Chain::new(),
            outputs: Chain::new(),
        }
    }

    /// Caller-assigned identity
    pub fn identity(&self) -> i32 {
        self.identity
    }

    /// Host payload, absent for virtual nodes
    pub fn payload(&self) -> Option<&P> {
        self.payload.as_ref()
    }

    /// True if the node has no payload
    pub fn is_virtual(&self) -> bool {
        self.payload.is_none()
    }

    /// Owning context
    pub fn context(&self) -> ContextId {
        self.context
    }

    /// Direct predecessors, in wiring order
    pub fn inputs(&self) -> &Chain<NodeIndex> {
        &self.inputs
    }

    /// Direct successors, in wiring order
    pub fn outputs(&self) -> &Chain<NodeIndex> {
        &self.outputs
    }

    /// Length of the input chain
    pub fn input_count(&self) -> usize {
        self.inputs.len()
    }

    /// Record `input` as a predecessor
    ///
    /// In [`WiringMode::Legacy`] a list that already has a head gets its
    /// second slot overwritten; the displaced input is returned so the
    /// caller can fix up its reference counts.
    pub(crate) fn add_input(&mut self, input: NodeIndex, mode: WiringMode) -> Option<NodeIndex> {
        match mode {
            WiringMode::Append => {
                self.inputs.push(input);
                None
            }
            WiringMode::Legacy => {
                if self.inputs.len() < 2 {
                    self.inputs.push(input);
                    None
                } else {
                    self.inputs.replace(1, input)
                }
            }
        }
    }
}
