//! Trait definitions for graph abstractions.
//!
//! The analyses of this crate never talk to a [`GraphCollection`](super::GraphCollection)
//! directly. They are written against these traits, which are implemented by
//! [`GraphView`](super::GraphView) (selector filtered), by [`Reversed`](super::Reversed)
//! (edges flipped) and by the DJ-graph used during loop detection. That way the dominator
//! and post-dominator computations share a single implementation.
//!
//! # Architecture
//!
//! - [`GraphBase`] - Vertex membership, counts and iteration
//! - [`Successors`] - Forward edge traversal
//! - [`Predecessors`] - Backward edge traversal
//! - [`RootedGraph`] - Graphs with a designated entry vertex
//!
//! # Ordering
//!
//! Implementations must yield successors and predecessors in the insertion order of the
//! underlying edge records. DFS numbering, loop ids and every test expectation downstream
//! depend on it.

use crate::utils::graph::NodeId;

/// Base trait providing vertex membership and iteration.
pub trait GraphBase {
    /// Returns the number of vertices visible in the graph.
    fn node_count(&self) -> usize;

    /// Returns an exclusive upper bound on the indices of visible vertices.
    ///
    /// Algorithms size their per-vertex arrays with this value. It may be larger than
    /// [`node_count`](GraphBase::node_count) when the graph filters vertices out or the
    /// collection holds tombstones.
    fn node_bound(&self) -> usize;

    /// Returns an iterator over the visible vertices in ascending index order.
    fn node_ids(&self) -> impl Iterator<Item = NodeId>;

    /// Returns `true` if `node` is a visible vertex of this graph.
    fn contains_node(&self, node: NodeId) -> bool;
}

/// Trait for graphs that support forward edge traversal.
///
/// # Examples
///
/// ```rust
/// use cfgscope::{GraphCollection, NodeId, Selector, Successors};
///
/// let mut graph: GraphCollection<(), ()> = GraphCollection::new();
/// let a = graph.add_vertex();
/// let b = graph.add_vertex();
/// let c = graph.add_vertex();
/// graph.add_edge(a, b, Selector::CFG)?;
/// graph.add_edge(a, c, Selector::CDG)?;
///
/// let cfg = graph.view(Selector::CFG);
/// let successors: Vec<NodeId> = cfg.successors(a).collect();
/// assert_eq!(successors, vec![b]);
/// # Ok::<(), cfgscope::Error>(())
/// ```
pub trait Successors: GraphBase {
    /// Returns an iterator over the successor vertices of `node`, in edge insertion order.
    ///
    /// # Panics
    ///
    /// May panic if `node` is not a valid vertex of the graph.
    fn successors(&self, node: NodeId) -> impl Iterator<Item = NodeId>;
}

/// Trait for graphs that support backward edge traversal.
pub trait Predecessors: GraphBase {
    /// Returns an iterator over the predecessor vertices of `node`, in edge insertion order.
    ///
    /// # Panics
    ///
    /// May panic if `node` is not a valid vertex of the graph.
    fn predecessors(&self, node: NodeId) -> impl Iterator<Item = NodeId>;
}

/// Trait for graphs with a designated entry (root) vertex.
pub trait RootedGraph: Successors + Predecessors {
    /// Returns the entry vertex of the graph.
    fn entry(&self) -> NodeId;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EdgeList {
        nodes: usize,
        edges: Vec<(NodeId, NodeId)>,
    }

    impl GraphBase for EdgeList {
        fn node_count(&self) -> usize {
            self.nodes
        }

        fn node_bound(&self) -> usize {
            self.nodes
        }

        fn node_ids(&self) -> impl Iterator<Item = NodeId> {
            (0..self.nodes).map(NodeId::new)
        }

        fn contains_node(&self, node: NodeId) -> bool {
            node.index() < self.nodes
        }
    }

    impl Successors for EdgeList {
        fn successors(&self, node: NodeId) -> impl Iterator<Item = NodeId> {
            self.edges
                .iter()
                .filter(move |(src, _)| *src == node)
                .map(|(_, dst)| *dst)
        }
    }

    impl Predecessors for EdgeList {
        fn predecessors(&self, node: NodeId) -> impl Iterator<Item = NodeId> {
            self.edges
                .iter()
                .filter(move |(_, dst)| *dst == node)
                .map(|(src, _)| *src)
        }
    }

    impl RootedGraph for EdgeList {
        fn entry(&self) -> NodeId {
            NodeId::new(0)
        }
    }

    #[test]
    fn test_adjacency_keeps_insertion_order() {
        let n = NodeId::new;
        let graph = EdgeList {
            nodes: 4,
            edges: vec![(n(0), n(3)), (n(0), n(1)), (n(2), n(1)), (n(0), n(2))],
        };

        let succ: Vec<NodeId> = graph.successors(n(0)).collect();
        assert_eq!(succ, vec![n(3), n(1), n(2)]);

        let pred: Vec<NodeId> = graph.predecessors(n(1)).collect();
        assert_eq!(pred, vec![n(0), n(2)]);

        assert_eq!(graph.entry(), n(0));
        assert!(graph.contains_node(n(3)));
        assert!(!graph.contains_node(n(4)));
    }
}
