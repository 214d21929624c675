//! Edge handles and borrowed edge records.
//!
//! Every physical edge of a [`GraphCollection`](crate::utils::graph::GraphCollection) is
//! identified by an [`EdgeId`]. At most one record exists per ordered vertex pair; the
//! logical graphs an edge belongs to are expressed by its [`Selector`] bits rather than by
//! duplicate records. [`EdgeRef`] is the read-only projection handed out by views.

use std::fmt;

use crate::utils::graph::{NodeId, Selector};

/// A strongly-typed handle to an edge record of a graph collection.
///
/// Edge ids are assigned in insertion order and never reused, even after
/// [`remove_edge`](crate::utils::graph::GraphCollection::remove_edge) or
/// [`compress_edges`](crate::utils::graph::GraphCollection::compress_edges).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EdgeId(pub(crate) usize);

impl EdgeId {
    /// Creates an `EdgeId` from a raw slot index.
    #[must_use]
    #[inline]
    pub const fn new(index: usize) -> Self {
        EdgeId(index)
    }

    /// Returns the slot index of this edge.
    #[must_use]
    #[inline]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Debug for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EdgeId({})", self.0)
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "e{}", self.0)
    }
}

impl From<usize> for EdgeId {
    #[inline]
    fn from(index: usize) -> Self {
        EdgeId(index)
    }
}

impl From<EdgeId> for usize {
    #[inline]
    fn from(edge: EdgeId) -> Self {
        edge.0
    }
}

/// A borrowed view of one edge record, as seen through a
/// [`GraphView`](crate::utils::graph::GraphView).
///
/// `selector` is already masked by the selector of the view that produced the reference,
/// so it only contains the logical graphs the observer asked for.
#[derive(Debug)]
pub struct EdgeRef<'g, E> {
    /// Handle of the underlying edge record
    pub id: EdgeId,
    /// Source vertex
    pub source: NodeId,
    /// Target vertex
    pub target: NodeId,
    /// Logical memberships visible through the view
    pub selector: Selector,
    /// Payload attached to the edge
    pub data: &'g E,
}

impl<E> Clone for EdgeRef<'_, E> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<E> Copy for EdgeRef<'_, E> {}

impl<E> EdgeRef<'_, E> {
    /// Returns `true` for an edge whose source and target coincide.
    #[must_use]
    pub fn is_self_loop(&self) -> bool {
        self.source == self.target
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edge_id_formatting() {
        let edge = EdgeId::new(3);
        assert_eq!(format!("{edge:?}"), "EdgeId(3)");
        assert_eq!(format!("{edge}"), "e3");
        assert_eq!(usize::from(edge), 3);
    }

    #[test]
    fn test_edge_ref_self_loop() {
        let payload = ();
        let edge = EdgeRef {
            id: EdgeId::new(0),
            source: NodeId::new(4),
            target: NodeId::new(4),
            selector: Selector::CFG,
            data: &payload,
        };
        let copy = edge;
        assert!(copy.is_self_loop());
        assert!(edge.is_self_loop());
    }
}
