//! Arena entry and identity index types

use std::hash::BuildHasherDefault;

use indexmap::IndexMap;
use rustc_hash::{FxHashSet, FxHasher};
use smallvec::SmallVec;

use super::node::{NodeIndex, OpNode};

/// Insertion-ordered map with the Fx hasher
pub type FxIndexMap<K, V> = IndexMap<K, V, BuildHasherDefault<FxHasher>>;

/// Identity → every node created with it, in creation order
///
/// SmallVec optimized for the common case of unique identities.
/// Key order is the order in which each identity was first used.
pub type IdentityIndex = FxIndexMap<i32, SmallVec<[NodeIndex; 1]>>;

/// Set of visited arena positions
pub type VisitedSet = FxHashSet<NodeIndex>;

/// Entry in the context arena - tracks a node and its lifetime state
#[derive(Debug, Clone)]
pub struct OpEntry<P> {
    /// The node itself
    pub node: OpNode<P>,
    /// Live caller handles
    pub handles: usize,
    /// Input edges from live nodes that name this node
    pub inbound: usize,
    /// Whether the node has been freed
    pub released: bool,
}

impl<P> OpEntry<P> {
    /// Create a live entry with one caller handle
    pub fn new(node: OpNode<P>) -> Self {
        Self {
            node,
            handles: 1,
            inbound: 0,
            released: false,
        }
    }

    /// Nothing refers to this node any more
    pub fn is_collectable(&self) -> bool {
        !self.released && self.handles == 0 && self.inbound == 0
    }

    /// Mark freed and hand back the payload
    pub fn mark_released(&mut self) -> Option<P> {
        self.released = true;
        self.node.payload.take()
    }
}

/// Record `index` under `identity`
pub fn index_identity(index: &mut IdentityIndex, identity: i32, node: NodeIndex) {
    index.entry(identity).or_default().push(node);
}
