//! Graph traversal utilities
//!
//! BFS and DFS over input or output edges. Graphs may contain cycles, so
//! every walk tracks the nodes it has already visited.

use std::collections::VecDeque;

use crate::graph::maps::VisitedSet;
use crate::graph::{GraphContext, NodeIndex, OpNode};

/// Direction of traversal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Forward: follow output edges (node → consumers)
    Forward,
    /// Backward: follow input edges (node → dependencies)
    Backward,
}

fn neighbours<P>(node: &OpNode<P>, direction: Direction) -> &[NodeIndex] {
    match direction {
        Direction::Forward => node.outputs().as_slice(),
        Direction::Backward => node.inputs().as_slice(),
    }
}

/// BFS traversal iterator
pub struct BfsIterator<'a, P> {
    ctx: &'a GraphContext<P>,
    queue: VecDeque<NodeIndex>,
    visited: VisitedSet,
    direction: Direction,
}

impl<'a, P> BfsIterator<'a, P> {
    /// Create a new BFS iterator starting from the node `start`
    pub fn new(ctx: &'a GraphContext<P>, start: i32, direction: Direction) -> Self {
        let mut queue = VecDeque::new();
        let mut visited = VisitedSet::default();

        if let Some(idx) = ctx.find_index(start) {
            queue.push_back(idx);
            visited.insert(idx);
        }

        Self {
            ctx,
            queue,
            visited,
            direction,
        }
    }

    /// Create forward BFS (follows consumers)
    pub fn forward(ctx: &'a GraphContext<P>, start: i32) -> Self {
        Self::new(ctx, start, Direction::Forward)
    }

    /// Create backward BFS (follows inputs)
    pub fn backward(ctx: &'a GraphContext<P>, start: i32) -> Self {
        Self::new(ctx, start, Direction::Backward)
    }
}

impl<'a, P> Iterator for BfsIterator<'a, P> {
    type Item = &'a OpNode<P>;

    fn next(&mut self) -> Option<Self::Item> {
        let idx = self.queue.pop_front()?;
        let node = self.ctx.node_at(idx)?;

        for &next in neighbours(node, self.direction) {
            if self.visited.insert(next) {
                self.queue.push_back(next);
            }
        }

        Some(node)
    }
}

/// DFS traversal iterator
pub struct DfsIterator<'a, P> {
    ctx: &'a GraphContext<P>,
    stack: Vec<NodeIndex>,
    visited: VisitedSet,
    direction: Direction,
}

impl<'a, P> DfsIterator<'a, P> {
    /// Create a new DFS iterator starting from the node `start`
    pub fn new(ctx: &'a GraphContext<P>, start: i32, direction: Direction) -> Self {
        let mut stack = Vec::new();
        let mut visited = VisitedSet::default();

        if let Some(idx) = ctx.find_index(start) {
            stack.push(idx);
            visited.insert(idx);
        }

        Self {
            ctx,
            stack,
            visited,
            direction,
        }
    }

    /// Create forward DFS
    pub fn forward(ctx: &'a GraphContext<P>, start: i32) -> Self {
        Self::new(ctx, start, Direction::Forward)
    }

    /// Create backward DFS
    pub fn backward(ctx: &'a GraphContext<P>, start: i32) -> Self {
        Self::new(ctx, start, Direction::Backward)
    }
}

impl<'a, P> Iterator for DfsIterator<'a, P> {
    type Item = &'a OpNode<P>;

    fn next(&mut self) -> Option<Self::Item> {
        let idx = self.stack.pop()?;
        let node = self.ctx.node_at(idx)?;

        for &next in neighbours(node, self.direction) {
            if self.visited.insert(next) {
                self.stack.push(next);
            }
        }

        Some(node)
    }
}

/// Collect all nodes reachable from start in the given direction
pub fn reachable_nodes<P>(
    ctx: &GraphContext<P>,
    start: i32,
    direction: Direction,
) -> Vec<&OpNode<P>> {
    BfsIterator::new(ctx, start, direction).collect()
}

/// Every node `start` depends on, directly or transitively
pub fn predecessors<P>(ctx: &GraphContext<P>, start: i32) -> Vec<&OpNode<P>> {
    BfsIterator::backward(ctx, start).skip(1).collect() // skip start node
}

/// Every node depending on `start`, directly or transitively
pub fn successors<P>(ctx: &GraphContext<P>, start: i32) -> Vec<&OpNode<P>> {
    BfsIterator::forward(ctx, start).skip(1).collect() // skip start node
}

/// Check if `to` consumes `from`, directly or transitively
///
/// `from == to` holds only when the node lies on a cycle.
pub fn has_path<P>(ctx: &GraphContext<P>, from: i32, to: i32) -> bool {
    let (Some(start), Some(goal)) = (ctx.find_index(from), ctx.find_index(to)) else {
        return false;
    };

    let mut visited = VisitedSet::default();
    let mut queue: VecDeque<NodeIndex> =
        ctx.entries[start.0].node.outputs().iter().copied().collect();

    while let Some(idx) = queue.pop_front() {
        if idx == goal {
            return true;
        }
        if visited.insert(idx) {
            queue.extend(ctx.entries[idx.0].node.outputs().iter().copied());
        }
    }

    false
}

/// Find one cycle among live nodes
///
/// Returns the identities on the cycle, each followed by one of its inputs,
/// or `None` if the graph is acyclic.
pub fn find_cycle<P>(ctx: &GraphContext<P>) -> Option<Vec<i32>> {
    #[derive(Clone, Copy, PartialEq, Eq)]
    enum Mark {
        Unseen,
        OnPath,
        Done,
    }

    let mut marks = vec![Mark::Unseen; ctx.entries.len()];

    for start in ctx.live_indices() {
        if marks[start.0] != Mark::Unseen {
            continue;
        }

        // (node, position of next input to explore)
        let mut path: Vec<(NodeIndex, usize)> = vec![(start, 0)];
        marks[start.0] = Mark::OnPath;

        while let Some(&(idx, pos)) = path.last() {
            let next = ctx.entries[idx.0].node.inputs().as_slice().get(pos).copied();
            let Some(next) = next else {
                marks[idx.0] = Mark::Done;
                path.pop();
                continue;
            };

            if let Some(top) = path.last_mut() {
                top.1 += 1;
            }

            match marks[next.0] {
                Mark::Unseen => {
                    marks[next.0] = Mark::OnPath;
                    path.push((next, 0));
                }
                Mark::OnPath => {
                    let from = path.iter().position(|&(i, _)| i == next)?;
                    return Some(
                        path[from..]
                            .iter()
                            .map(|&(i, _)| ctx.identity_at(i))
                            .collect(),
                    );
                }
                Mark::Done => {}
            }
        }
    }

    None
}
