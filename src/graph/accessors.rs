//! Read-only graph accessors
//!
//! Lookups by identity, edge listing and the creation-order dump. None of
//! these fail: a missing identity yields `None` or an empty vector.

use crate::chain::Chain;
use crate::error::GraphResult;

use super::context::GraphContext;
use super::node::{NodeHandle, NodeIndex, OpNode};

impl<P> GraphContext<P> {
    // ========================================================================
    // Node lookup
    // ========================================================================

    /// Earliest live node with this identity
    pub fn lookup(&self, identity: i32) -> Option<&OpNode<P>> {
        self.find_index(identity).map(|idx| &self.entries[idx.0].node)
    }

    /// Check if a live node has this identity
    pub fn has_node(&self, identity: i32) -> bool {
        self.find_index(identity).is_some()
    }

    /// Node behind a handle
    pub fn node(&self, handle: NodeHandle) -> GraphResult<&OpNode<P>> {
        let idx = self.resolve(handle)?;
        Ok(&self.entries[idx.0].node)
    }

    /// Node at an arena position, if still live
    pub fn node_at(&self, index: NodeIndex) -> Option<&OpNode<P>> {
        self.entries
            .get(index.0)
            .filter(|e| !e.released)
            .map(|e| &e.node)
    }

    /// Payload of the earliest live node with this identity
    ///
    /// `None` both when no such node exists and when it is virtual; use
    /// [`lookup`](Self::lookup) to tell the two apart.
    pub fn payload(&self, identity: i32) -> Option<&P> {
        self.lookup(identity).and_then(|n| n.payload())
    }

    /// Number of caller handles held on the node `identity`
    pub fn handle_count(&self, identity: i32) -> usize {
        self.find_index(identity)
            .map(|idx| self.entries[idx.0].handles)
            .unwrap_or(0)
    }

    // ========================================================================
    // Iteration
    // ========================================================================

    /// Live nodes in creation order
    pub fn nodes(&self) -> impl Iterator<Item = &OpNode<P>> {
        self.entries
            .iter()
            .filter(|e| !e.released)
            .map(|e| &e.node)
    }

    /// Live virtual nodes in creation order
    pub fn virtual_nodes(&self) -> impl Iterator<Item = &OpNode<P>> {
        self.nodes().filter(|n| n.is_virtual())
    }

    /// Distinct identities of live nodes, in order of first use
    pub fn identities(&self) -> impl Iterator<Item = i32> + '_ {
        self.identity_index
            .keys()
            .copied()
            .filter(|&id| self.has_node(id))
    }

    // ========================================================================
    // Edges
    // ========================================================================

    /// Number of inputs of the node `identity`
    pub fn input_count(&self, identity: i32) -> usize {
        self.lookup(identity).map(|n| n.input_count()).unwrap_or(0)
    }

    /// Identities of the node's inputs, in wiring order
    pub fn node_inputs(&self, identity: i32) -> Vec<i32> {
        self.lookup(identity)
            .map(|n| self.identities_of(n.inputs()))
            .unwrap_or_default()
    }

    /// Identities of the nodes consuming this one, in wiring order
    pub fn node_outputs(&self, identity: i32) -> Vec<i32> {
        self.lookup(identity)
            .map(|n| self.identities_of(n.outputs()))
            .unwrap_or_default()
    }

    /// Identities of the inputs of the node behind `handle`
    pub fn inputs_of(&self, handle: NodeHandle) -> GraphResult<Vec<i32>> {
        let node = self.node(handle)?;
        Ok(self.identities_of(node.inputs()))
    }

    fn identities_of(&self, chain: &Chain<NodeIndex>) -> Vec<i32> {
        let mut out = Vec::with_capacity(chain.len());
        for &idx in chain {
            out.push(self.identity_at(idx));
        }
        out
    }

    // ========================================================================
    // Inspection
    // ========================================================================

    /// Live node identities in creation order, as `-> 1 -> 2 -> 3`
    pub fn dump(&self) -> String {
        self.to_string()
    }
}
