//! Graph context
//!
//! `GraphContext` owns every node of one computational graph. Nodes live in
//! an append-only arena, so arena order is creation order and an index stays
//! valid for the lifetime of the context.

use std::fmt;
use std::sync::{Arc, Mutex};

use crate::error::{GraphError, GraphResult};

use super::config::ContextConfig;
use super::maps::{IdentityIndex, OpEntry};
use super::node::{ContextId, NodeHandle, NodeIndex};

/// Context behind one lock, for hosts that call in from several threads
pub type SharedContext<P> = Arc<Mutex<GraphContext<P>>>;

/// Owner of all nodes in one graph
///
/// Every mutation takes `&mut self`; share across threads through
/// [`SharedContext`].
#[derive(Debug)]
pub struct GraphContext<P> {
    pub(crate) id: ContextId,
    pub(crate) config: ContextConfig,

    /// Arena of nodes in creation order, released ones included
    pub(crate) entries: Vec<OpEntry<P>>,

    /// Maps identity → nodes created with it
    pub(crate) identity_index: IdentityIndex,

    /// Number of `create_node` calls so far
    pub(crate) vertex_count: usize,
}

impl<P> GraphContext<P> {
    /// Create an empty context
    pub fn new() -> Self {
        Self::with_config(ContextConfig::default())
    }

    /// Create an empty context with the given configuration
    pub fn with_config(config: ContextConfig) -> Self {
        Self {
            id: ContextId::next(),
            entries: Vec::with_capacity(config.capacity),
            identity_index: IdentityIndex::default(),
            vertex_count: 0,
            config,
        }
    }

    /// Wrap this context in a lock
    pub fn into_shared(self) -> SharedContext<P> {
        Arc::new(Mutex::new(self))
    }

    /// Context id, carried by every node and handle it issues
    pub fn id(&self) -> ContextId {
        self.id
    }

    /// Active configuration
    pub fn config(&self) -> &ContextConfig {
        &self.config
    }

    /// Number of nodes ever created (O(1), never decremented)
    pub fn vertex_count(&self) -> usize {
        self.vertex_count
    }

    /// Number of nodes not yet released
    pub fn live_count(&self) -> usize {
        self.entries.iter().filter(|e| !e.released).count()
    }

    /// True if no live node remains
    pub fn is_empty(&self) -> bool {
        self.entries.iter().all(|e| e.released)
    }

    // ========================================================================
    // Index resolution
    // ========================================================================

    /// Earliest live node created with `identity`
    pub(crate) fn find_index(&self, identity: i32) -> Option<NodeIndex> {
        self.identity_index
            .get(&identity)?
            .iter()
            .copied()
            .find(|idx| !self.entries[idx.0].released)
    }

    /// Check that `handle` was issued here and still names a live node
    pub(crate) fn resolve(&self, handle: NodeHandle) -> GraphResult<NodeIndex> {
        if handle.context != self.id {
            return Err(GraphError::ForeignHandle {
                expected: self.id,
                found: handle.context,
            });
        }

        let entry = self
            .entries
            .get(handle.index.0)
            .ok_or(GraphError::StaleHandle(-1))?;
        if entry.released {
            return Err(GraphError::StaleHandle(entry.node.identity));
        }

        Ok(handle.index)
    }

    /// Live arena positions in creation order
    pub(crate) fn live_indices(&self) -> impl Iterator<Item = NodeIndex> + '_ {
        self.entries
            .iter()
            .enumerate()
            .filter(|(_, e)| !e.released)
            .map(|(i, _)| NodeIndex(i))
    }

    pub(crate) fn identity_at(&self, idx: NodeIndex) -> i32 {
        self.entries[idx.0].node.identity
    }
}

impl<P> Default for GraphContext<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P> fmt::Display for GraphContext<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for entry in self.entries.iter().filter(|e| !e.released) {
            if !first {
                f.write_str(" ")?;
            }
            write!(f, "-> {}", entry.node.identity)?;
            first = false;
        }
        Ok(())
    }
}
