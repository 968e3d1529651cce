//! Append-only edge chains
//!
//! A [`Chain`] is the sequence type behind a node's input and output lists.
//! Items are kept in insertion order, duplicates are allowed, and the only
//! way to read a chain is a forward pass from head to tail.
//!
//! # Example
//!
//! ```
//! use dlr_graph::chain::Chain;
//!
//! let mut chain = Chain::link(1, Chain::new());
//! chain.push(2);
//! chain.push(3);
//!
//! assert_eq!(chain.len(), 3);
//! assert_eq!(chain.iter().copied().collect::<Vec<_>>(), vec![1, 2, 3]);
//! ```

use smallvec::SmallVec;

/// Inline capacity; most ops have at most a handful of inputs
const INLINE: usize = 4;

/// Append-only, insertion-ordered sequence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chain<T> {
    items: SmallVec<[T; INLINE]>,
}

impl<T> Chain<T> {
    /// Create an empty chain
    pub fn new() -> Self {
        Self {
            items: SmallVec::new(),
        }
    }

    /// Create a chain whose head is `item`, followed by `next`
    pub fn link(item: T, next: Chain<T>) -> Self {
        let mut items = SmallVec::with_capacity(next.len() + 1);
        items.push(item);
        items.extend(next.items);
        Self { items }
    }

    /// Append an item at the tail
    pub fn push(&mut self, item: T) {
        self.items.push(item);
    }

    /// Number of items
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// First item, if any
    pub fn head(&self) -> Option<&T> {
        self.items.first()
    }

    /// Forward traversal from head to tail
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    /// Items as a slice, in chain order
    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    /// Overwrite the item at `pos`, returning the old one
    pub(crate) fn replace(&mut self, pos: usize, item: T) -> Option<T> {
        let slot = self.items.get_mut(pos)?;
        Some(std::mem::replace(slot, item))
    }

    /// Remove the first item matching `pred`
    pub(crate) fn remove_first(&mut self, pred: impl Fn(&T) -> bool) -> Option<T> {
        let pos = self.items.iter().position(pred)?;
        Some(self.items.remove(pos))
    }

    /// Empty the chain, returning its items in order
    pub(crate) fn take(&mut self) -> SmallVec<[T; INLINE]> {
        std::mem::take(&mut self.items)
    }
}

impl<T> Default for Chain<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> FromIterator<T> for Chain<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}

impl<'a, T> IntoIterator for &'a Chain<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
