//! Edge-flipping adaptor.
//!
//! Post-dominance is dominance on the reversed graph rooted at the exit vertex.
//! [`Reversed`] exposes any graph with the direction of every edge flipped so the same
//! traversal and dominator code can run on both.

use crate::utils::graph::{GraphBase, NodeId, Predecessors, RootedGraph, Successors};

/// A graph with every edge reversed, optionally re-rooted.
///
/// # Examples
///
/// ```rust
/// use cfgscope::{GraphCollection, NodeId, Reversed, Selector, Successors};
///
/// let mut graph: GraphCollection<(), ()> = GraphCollection::new();
/// let a = graph.add_vertex();
/// let b = graph.add_vertex();
/// graph.add_edge(a, b, Selector::CFG)?;
///
/// let cfg = graph.view(Selector::CFG);
/// let reversed = Reversed::new(&cfg, b);
/// assert_eq!(reversed.successors(b).collect::<Vec<NodeId>>(), vec![a]);
/// # Ok::<(), cfgscope::Error>(())
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Reversed<'a, G> {
    inner: &'a G,
    root: NodeId,
}

impl<'a, G> Reversed<'a, G> {
    /// Wraps `inner`, treating `root` as the entry of the reversed graph.
    #[must_use]
    pub fn new(inner: &'a G, root: NodeId) -> Self {
        Reversed { inner, root }
    }

    /// Returns the wrapped graph.
    #[must_use]
    pub fn inner(&self) -> &'a G {
        self.inner
    }
}

impl<G: GraphBase> GraphBase for Reversed<'_, G> {
    fn node_count(&self) -> usize {
        self.inner.node_count()
    }

    fn node_bound(&self) -> usize {
        self.inner.node_bound()
    }

    fn node_ids(&self) -> impl Iterator<Item = NodeId> {
        self.inner.node_ids()
    }

    fn contains_node(&self, node: NodeId) -> bool {
        self.inner.contains_node(node)
    }
}

impl<G: Predecessors> Successors for Reversed<'_, G> {
    fn successors(&self, node: NodeId) -> impl Iterator<Item = NodeId> {
        self.inner.predecessors(node)
    }
}

impl<G: Successors> Predecessors for Reversed<'_, G> {
    fn predecessors(&self, node: NodeId) -> impl Iterator<Item = NodeId> {
        self.inner.successors(node)
    }
}

impl<G: Successors + Predecessors> RootedGraph for Reversed<'_, G> {
    fn entry(&self) -> NodeId {
        self.root
    }
}
