//! Vertex handles for graph collections.
//!
//! A [`NodeId`] is the only way to refer to a vertex of a
//! [`GraphCollection`](crate::utils::graph::GraphCollection). Handles are dense indices
//! assigned in insertion order; removing a vertex leaves a tombstone behind, so a handle
//! is never handed out twice by the same collection.

use std::fmt;

/// A strongly-typed handle to a vertex of a graph collection.
///
/// `NodeId` wraps the `usize` slot index of the vertex inside its owning collection.
/// The newtype keeps vertex indices apart from edge indices, DFS numbers and loop ids,
/// which all are plain integers in the analyses built on top of the collection.
///
/// Ordering follows the slot index, which is the vertex insertion order. Ordered sets
/// of `NodeId` are therefore deterministic for a given construction sequence, a property
/// the irreducible-loop detector relies on when it picks its next Tarjan root.
///
/// # Examples
///
/// ```rust
/// use cfgscope::{GraphCollection, NodeId};
///
/// let mut graph: GraphCollection<(), ()> = GraphCollection::new();
/// let entry: NodeId = graph.add_vertex();
/// let body = graph.add_vertex();
///
/// assert!(entry < body);
/// assert_eq!(body.index(), 1);
/// ```
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    /// Creates a `NodeId` from a raw slot index.
    ///
    /// Intended for tests and for code that stores vertex indices in flat arrays.
    /// Regular code obtains handles from
    /// [`GraphCollection::add_vertex`](crate::utils::graph::GraphCollection::add_vertex).
    #[must_use]
    #[inline]
    pub const fn new(index: usize) -> Self {
        NodeId(index)
    }

    /// Returns the slot index of this vertex, usable to index per-vertex arrays sized by
    /// [`GraphBase::node_bound`](crate::utils::graph::GraphBase::node_bound).
    #[must_use]
    #[inline]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({})", self.0)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

impl From<usize> for NodeId {
    #[inline]
    fn from(index: usize) -> Self {
        NodeId(index)
    }
}

impl From<NodeId> for usize {
    #[inline]
    fn from(node: NodeId) -> Self {
        node.0
    }
}
