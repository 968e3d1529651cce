//! Graph mutation operations
//!
//! Node creation, edge wiring and handle-driven release.
//!
//! A node is freed once no caller handle and no live node's input list
//! names it. Freeing a node drops its edges, which may in turn free the
//! virtual intermediates that only it was holding on to.

use smallvec::SmallVec;
use tracing::{debug, trace};

use crate::error::{GraphError, GraphResult};

use super::context::GraphContext;
use super::maps::{index_identity, OpEntry, VisitedSet};
use super::node::{NodeHandle, NodeIndex, OpNode};

impl<P> GraphContext<P> {
    // ========================================================================
    // Node creation
    // ========================================================================

    /// Append a new node and return a handle to it
    ///
    /// Identities are not checked: a duplicate is stored, but lookups keep
    /// resolving to the earliest live node with that identity.
    pub fn create_node(&mut self, identity: i32, payload: Option<P>) -> NodeHandle {
        let index = NodeIndex(self.entries.len());
        let is_virtual = payload.is_none();

        self.entries
            .push(OpEntry::new(OpNode::new(identity, payload, self.id)));
        index_identity(&mut self.identity_index, identity, index);
        self.vertex_count += 1;

        debug!(
            context = %self.id,
            identity,
            index = index.0,
            is_virtual,
            "created node"
        );

        NodeHandle {
            context: self.id,
            index,
        }
    }

    /// Like [`create_node`](Self::create_node), but refuse an identity
    /// already used by a live node
    pub fn insert_unique(&mut self, identity: i32, payload: Option<P>) -> GraphResult<NodeHandle> {
        self.try_insert(identity, payload).map_err(|(err, _)| err)
    }

    /// Like [`insert_unique`](Self::insert_unique), handing a rejected
    /// payload back to the caller instead of dropping it
    pub fn try_insert(
        &mut self,
        identity: i32,
        payload: Option<P>,
    ) -> Result<NodeHandle, (GraphError, Option<P>)> {
        if self.find_index(identity).is_some() {
            return Err((GraphError::DuplicateIdentity(identity), payload));
        }
        Ok(self.create_node(identity, payload))
    }

    // ========================================================================
    // Edge wiring
    // ========================================================================

    /// Wire inputs of the node `identity` by identity
    ///
    /// Walks the live nodes in creation order; each one whose identity is
    /// listed becomes an input (once per occurrence in `inputs`). Unknown
    /// identities, and an unknown target, are skipped. Returns the number
    /// of edges wired.
    pub fn add_inputs(&mut self, identity: i32, inputs: &[i32]) -> usize {
        let mut dropped = Vec::new();
        self.add_inputs_into(identity, inputs, &mut dropped)
    }

    /// Like [`add_inputs`](Self::add_inputs), moving the payloads of nodes
    /// freed by legacy slot overwrites into `dropped`
    pub fn add_inputs_into(
        &mut self,
        identity: i32,
        inputs: &[i32],
        dropped: &mut Vec<P>,
    ) -> usize {
        let Some(target) = self.find_index(identity) else {
            trace!(context = %self.id, identity, "add_inputs: unknown target, skipped");
            return 0;
        };

        let mut pending: SmallVec<[(NodeIndex, usize); 4]> = SmallVec::new();
        for entry in self.entries.iter().filter(|e| !e.released) {
            let candidate = entry.node.identity;
            let hits = inputs.iter().filter(|&&i| i == candidate).count();
            if hits == 0 {
                continue;
            }
            if let Some(resolved) = self.find_index(candidate) {
                pending.push((resolved, hits));
            }
        }

        for &missing in inputs.iter().filter(|&&i| self.find_index(i).is_none()) {
            trace!(context = %self.id, identity, input = missing, "add_inputs: unknown input, skipped");
        }

        let mut wired = 0;
        'pending: for (input, hits) in pending {
            for _ in 0..hits {
                // a legacy overwrite can free the target along with the displaced input
                if self.entries[target.0].released {
                    trace!(context = %self.id, identity, "add_inputs: target freed while wiring");
                    break 'pending;
                }
                if self.entries[input.0].released {
                    break;
                }
                self.wire(target, input, dropped);
                wired += 1;
            }
        }

        debug!(context = %self.id, identity, wired, "wired inputs");
        wired
    }

    /// Wire `input` as a predecessor of `target`
    pub fn add_input(&mut self, target: NodeHandle, input: NodeHandle) -> GraphResult<()> {
        let target = self.resolve(target)?;
        let input = self.resolve(input)?;
        let mut dropped = Vec::new();
        self.wire(target, input, &mut dropped);
        Ok(())
    }

    fn wire(&mut self, target: NodeIndex, input: NodeIndex, dropped: &mut Vec<P>) {
        let mode = self.config.wiring;
        let displaced = self.entries[target.0].node.add_input(input, mode);

        let entry = &mut self.entries[input.0];
        entry.inbound += 1;
        entry.node.outputs.push(target);

        if let Some(old) = displaced {
            let entry = &mut self.entries[old.0];
            entry.inbound = entry.inbound.saturating_sub(1);
            entry.node.outputs.remove_first(|&i| i == target);
            if entry.is_collectable() {
                self.collect(old, dropped);
            }
        }
    }

    // ========================================================================
    // Handles and release
    // ========================================================================

    /// Take out another handle on the node `identity`
    pub fn acquire(&mut self, identity: i32) -> Option<NodeHandle> {
        let index = self.find_index(identity)?;
        self.entries[index.0].handles += 1;
        Some(NodeHandle {
            context: self.id,
            index,
        })
    }

    /// Register one more holder of `handle`; returns the new handle count
    pub fn retain(&mut self, handle: NodeHandle) -> GraphResult<usize> {
        let index = self.resolve(handle)?;
        let entry = &mut self.entries[index.0];
        entry.handles += 1;
        Ok(entry.handles)
    }

    /// Drop one holder of `handle`
    ///
    /// This is the host release callback. Returns the number of nodes freed
    /// as a result, which is 0 while other handles or live consumers remain.
    pub fn release(&mut self, handle: NodeHandle) -> GraphResult<usize> {
        let mut dropped = Vec::new();
        self.release_into(handle, &mut dropped)
    }

    /// Like [`release`](Self::release), but freed payloads are moved into
    /// `dropped` rather than dropped here
    ///
    /// Hosts whose payload destructors may call back into this context
    /// (through a lock around it) drop `dropped` after unlocking.
    pub fn release_into(
        &mut self,
        handle: NodeHandle,
        dropped: &mut Vec<P>,
    ) -> GraphResult<usize> {
        let index = self.resolve(handle)?;
        let entry = &mut self.entries[index.0];
        if entry.handles == 0 {
            return Err(GraphError::StaleHandle(entry.node.identity));
        }
        entry.handles -= 1;

        if entry.is_collectable() {
            Ok(self.collect(index, dropped))
        } else {
            Ok(0)
        }
    }

    /// Free every node that no caller handle can reach through input edges
    ///
    /// Catches unreferenced cycles, which reference counting alone keeps
    /// alive. Returns the number of nodes freed.
    pub fn sweep(&mut self) -> usize {
        let mut dropped = Vec::new();
        self.sweep_into(&mut dropped)
    }

    /// Like [`sweep`](Self::sweep), moving freed payloads into `dropped`
    pub fn sweep_into(&mut self, dropped: &mut Vec<P>) -> usize {
        let mut marked = VisitedSet::default();
        let mut stack: Vec<NodeIndex> = self
            .live_indices()
            .filter(|idx| self.entries[idx.0].handles > 0)
            .collect();

        while let Some(idx) = stack.pop() {
            if !marked.insert(idx) {
                continue;
            }
            stack.extend(
                self.entries[idx.0]
                    .node
                    .inputs
                    .iter()
                    .copied()
                    .filter(|i| !marked.contains(i)),
            );
        }

        let dead: Vec<NodeIndex> = self
            .live_indices()
            .filter(|idx| !marked.contains(idx))
            .collect();
        for &idx in &dead {
            self.free_entry(idx, dropped);
        }

        debug!(context = %self.id, freed = dead.len(), "sweep finished");
        dead.len()
    }

    fn collect(&mut self, start: NodeIndex, dropped: &mut Vec<P>) -> usize {
        let mut worklist = vec![start];
        let mut freed = 0;

        while let Some(idx) = worklist.pop() {
            if !self.entries[idx.0].is_collectable() {
                continue;
            }
            for input in self.free_entry(idx, dropped) {
                if self.entries[input.0].is_collectable() {
                    worklist.push(input);
                }
            }
            freed += 1;
        }

        freed
    }

    /// Mark `idx` released and detach it from its inputs
    fn free_entry(
        &mut self,
        idx: NodeIndex,
        dropped: &mut Vec<P>,
    ) -> SmallVec<[NodeIndex; 4]> {
        let entry = &mut self.entries[idx.0];
        dropped.extend(entry.mark_released());
        entry.node.outputs.take();
        let inputs = entry.node.inputs.take();

        debug!(context = %self.id, identity = entry.node.identity, index = idx.0, "released node");

        for &input in &inputs {
            let entry = &mut self.entries[input.0];
            entry.inbound = entry.inbound.saturating_sub(1);
            entry.node.outputs.remove_first(|&i| i == idx);
        }
        inputs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::ContextConfig;

    fn chain_ctx() -> (GraphContext<&'static str>, Vec<NodeHandle>) {
        // 1 (real) <- 2 (virtual) <- 3 (virtual)
        let mut ctx = GraphContext::new();
        let handles = vec![
            ctx.create_node(1, Some("x")),
            ctx.create_node(2, None),
            ctx.create_node(3, None),
        ];
        ctx.add_inputs(2, &[1]);
        ctx.add_inputs(3, &[2]);
        (ctx, handles)
    }

    #[test]
    fn test_create_node_counts() {
        let mut ctx: GraphContext<()> = GraphContext::new();
        for i in 0..5 {
            ctx.create_node(i, None);
        }
        assert_eq!(ctx.vertex_count(), 5);
        assert_eq!(ctx.live_count(), 5);
    }

    #[test]
    fn test_insert_unique() {
        let mut ctx: GraphContext<()> = GraphContext::new();
        assert!(ctx.insert_unique(1, None).is_ok());
        assert_eq!(
            ctx.insert_unique(1, None),
            Err(GraphError::DuplicateIdentity(1))
        );
        assert_eq!(ctx.vertex_count(), 1);
    }

    #[test]
    fn test_add_inputs_follows_creation_order() {
        let mut ctx: GraphContext<()> = GraphContext::new();
        for i in 1..=4 {
            ctx.create_node(i, None);
        }

        assert_eq!(ctx.add_inputs(4, &[3, 1, 2]), 3);
        assert_eq!(ctx.node_inputs(4), vec![1, 2, 3]);
        assert_eq!(ctx.node_outputs(1), vec![4]);
    }

    #[test]
    fn test_add_inputs_repeated_identity_in_list() {
        let mut ctx: GraphContext<()> = GraphContext::new();
        ctx.create_node(1, None);
        ctx.create_node(2, None);

        assert_eq!(ctx.add_inputs(2, &[1, 1]), 2);
        assert_eq!(ctx.node_inputs(2), vec![1, 1]);
    }

    #[test]
    fn test_add_inputs_duplicate_node_wires_earliest() {
        let mut ctx: GraphContext<u8> = GraphContext::new();
        ctx.create_node(1, Some(1));
        ctx.create_node(1, Some(2));
        ctx.create_node(5, None);

        // both chain entries with identity 1 match, both resolve to the first
        assert_eq!(ctx.add_inputs(5, &[1]), 2);
        let target = ctx.lookup(5).unwrap();
        assert!(target.inputs().iter().all(|i| i.index() == 0));
    }

    #[test]
    fn test_add_inputs_unknown_target_or_input() {
        let mut ctx: GraphContext<()> = GraphContext::new();
        ctx.create_node(1, None);
        ctx.create_node(2, None);

        assert_eq!(ctx.add_inputs(99, &[1]), 0);
        assert_eq!(ctx.add_inputs(2, &[99]), 0);
        assert!(ctx.node_inputs(2).is_empty());
    }

    #[test]
    fn test_legacy_wiring_keeps_two_inputs() {
        let mut ctx: GraphContext<()> = GraphContext::with_config(ContextConfig::legacy());
        for i in 1..=4 {
            ctx.create_node(i, None);
        }

        assert_eq!(ctx.add_inputs(4, &[1, 2, 3]), 3);
        assert_eq!(ctx.node_inputs(4), vec![1, 3]);
        // the overwritten input no longer lists 4 as a consumer
        assert!(ctx.node_outputs(2).is_empty());
    }

    #[test]
    fn test_add_input_by_handle() {
        let mut ctx: GraphContext<()> = GraphContext::new();
        let a = ctx.create_node(1, None);
        let b = ctx.create_node(2, None);

        ctx.add_input(b, a).unwrap();
        assert_eq!(ctx.node_inputs(2), vec![1]);

        let mut other: GraphContext<()> = GraphContext::new();
        let c = other.create_node(3, None);
        assert!(matches!(
            ctx.add_input(b, c),
            Err(GraphError::ForeignHandle { .. })
        ));
    }

    #[test]
    fn test_release_unreferenced_node() {
        let mut ctx: GraphContext<()> = GraphContext::new();
        let h = ctx.create_node(1, None);

        assert_eq!(ctx.release(h), Ok(1));
        assert!(!ctx.has_node(1));
        assert_eq!(ctx.live_count(), 0);
        assert_eq!(ctx.vertex_count(), 1);
        assert_eq!(ctx.release(h), Err(GraphError::StaleHandle(1)));
    }

    #[test]
    fn test_release_waits_for_consumers() {
        let (mut ctx, handles) = chain_ctx();

        // node 2 is still an input of node 3
        assert_eq!(ctx.release(handles[1]), Ok(0));
        assert!(ctx.has_node(2));
        assert_eq!(ctx.node_inputs(3), vec![2]);
    }

    #[test]
    fn test_release_cascades_through_virtual_nodes() {
        let (mut ctx, handles) = chain_ctx();
        ctx.release(handles[1]).unwrap();

        // dropping 3 frees 3 and the virtual 2; real 1 is still held
        assert_eq!(ctx.release(handles[2]), Ok(2));
        assert!(ctx.has_node(1));
        assert!(!ctx.has_node(2));
        assert!(!ctx.has_node(3));
        assert!(ctx.node_outputs(1).is_empty());

        assert_eq!(ctx.release(handles[0]), Ok(1));
        assert!(ctx.is_empty());
    }

    #[test]
    fn test_retain_and_acquire() {
        let mut ctx: GraphContext<()> = GraphContext::new();
        let h = ctx.create_node(1, None);

        assert_eq!(ctx.retain(h), Ok(2));
        let again = ctx.acquire(1).unwrap();
        assert_eq!(again, h);
        assert!(ctx.acquire(2).is_none());

        assert_eq!(ctx.release(h), Ok(0));
        assert_eq!(ctx.release(h), Ok(0));
        assert_eq!(ctx.release(h), Ok(1));
    }

    #[test]
    fn test_release_on_cycle_terminates() {
        let mut ctx: GraphContext<()> = GraphContext::new();
        let a = ctx.create_node(1, None);
        let b = ctx.create_node(2, None);
        ctx.add_inputs(1, &[2]);
        ctx.add_inputs(2, &[1]);

        assert_eq!(ctx.release(a), Ok(0));
        assert_eq!(ctx.release(b), Ok(0));
        // the cycle keeps itself alive until swept
        assert_eq!(ctx.live_count(), 2);
        assert_eq!(ctx.sweep(), 2);
        assert!(ctx.is_empty());
    }

    #[test]
    fn test_sweep_keeps_reachable_nodes() {
        let (mut ctx, handles) = chain_ctx();
        let orphan = ctx.create_node(4, None);
        ctx.add_inputs(4, &[4]);
        ctx.release(orphan).unwrap();
        ctx.release(handles[1]).unwrap();

        assert_eq!(ctx.sweep(), 1);
        assert!(ctx.has_node(1));
        assert!(ctx.has_node(2));
        assert!(ctx.has_node(3));
        assert!(!ctx.has_node(4));
    }

    #[test]
    fn test_lookup_falls_through_to_next_duplicate() {
        let mut ctx: GraphContext<u8> = GraphContext::new();
        let first = ctx.create_node(1, Some(1));
        ctx.create_node(1, Some(2));

        assert_eq!(ctx.payload(1), Some(&1));
        ctx.release(first).unwrap();
        assert_eq!(ctx.payload(1), Some(&2));
    }

    #[test]
    fn test_release_into_hands_back_payloads() {
        let mut ctx: GraphContext<String> = GraphContext::new();
        let x = ctx.create_node(1, Some("x".to_string()));
        let y = ctx.create_node(2, Some("y".to_string()));
        ctx.add_inputs(2, &[1]);
        ctx.release(x).unwrap();

        let mut dropped = Vec::new();
        assert_eq!(ctx.release_into(y, &mut dropped), Ok(2));
        dropped.sort();
        assert_eq!(dropped, vec!["x".to_string(), "y".to_string()]);
        assert!(ctx.is_empty());
    }

    #[test]
    fn test_sweep_into_hands_back_payloads() {
        let mut ctx: GraphContext<u8> = GraphContext::new();
        let a = ctx.create_node(1, Some(1));
        let b = ctx.create_node(2, None);
        ctx.add_inputs(1, &[2]);
        ctx.add_inputs(2, &[1]);
        ctx.release(a).unwrap();
        ctx.release(b).unwrap();

        let mut dropped = Vec::new();
        assert_eq!(ctx.sweep_into(&mut dropped), 2);
        assert_eq!(dropped, vec![1]);
    }

    #[test]
    fn test_try_insert_returns_rejected_payload() {
        let mut ctx: GraphContext<&str> = GraphContext::new();
        ctx.try_insert(1, Some("kept")).unwrap();

        let (err, rejected) = ctx.try_insert(1, Some("rejected")).unwrap_err();
        assert_eq!(err, GraphError::DuplicateIdentity(1));
        assert_eq!(rejected, Some("rejected"));
        assert_eq!(ctx.payload(1), Some(&"kept"));
    }

    #[test]
    fn test_legacy_overwrite_freeing_target_stops_wiring() {
        let mut ctx: GraphContext<&str> = GraphContext::with_config(ContextConfig::legacy());
        let target = ctx.create_node(1, Some("target"));
        ctx.create_node(2, None);
        let holder = ctx.create_node(3, Some("holder"));
        ctx.create_node(4, None);
        let last = ctx.create_node(5, None);

        // 1 <- [2, 3] and 3 <- [1]: a released cycle through the second slot
        ctx.add_inputs(1, &[2]);
        ctx.add_inputs(1, &[3]);
        ctx.add_inputs(3, &[1]);
        ctx.release(target).unwrap();
        ctx.release(holder).unwrap();

        // wiring 4 displaces 3, which frees 3 and then 1
        let mut dropped = Vec::new();
        assert_eq!(ctx.add_inputs_into(1, &[4, 5], &mut dropped), 1);
        assert_eq!(dropped.len(), 2);
        assert!(!ctx.has_node(1));
        assert!(!ctx.has_node(3));
        assert!(ctx.node_outputs(4).is_empty());
        assert!(ctx.node_outputs(5).is_empty());

        // nothing still pins 5, so its handle is the last holder
        assert_eq!(ctx.release(last), Ok(1));
    }
}
