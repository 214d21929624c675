//! Selector-filtered, read-only projections of a graph collection.
//!
//! A [`GraphView`] sees exactly the edges whose selector mask intersects its own, and
//! optionally only the vertices of a given subset. It never copies edge records: every
//! query walks the adjacency lists of the underlying collection and filters on the fly.

use rustc_hash::FxHashSet;

use crate::utils::graph::{
    collection::EdgeRecord, EdgeId, EdgeRef, GraphBase, GraphCollection, NodeId, Predecessors,
    Selector, Successors,
};

/// A read-only logical graph over a [`GraphCollection`].
///
/// An edge is visible when its selector intersects the view's selector and, for
/// subgraph views, when both endpoints are in the subset. Vertices are visible when
/// they are live in the collection and, for subgraph views, members of the subset.
///
/// # Examples
///
/// ```rust
/// use cfgscope::{GraphCollection, NodeId, Selector};
///
/// let mut graph: GraphCollection<(), ()> = GraphCollection::new();
/// let a = graph.add_vertex();
/// let b = graph.add_vertex();
/// let c = graph.add_vertex();
/// graph.add_edge(a, b, Selector::CFG)?;
/// graph.add_edge(b, c, Selector::CFG)?;
/// graph.add_edge(a, c, Selector::DOMINATOR)?;
///
/// let cfg = graph.view(Selector::CFG);
/// assert_eq!(cfg.out_degree(a), 1);
///
/// let upper = graph.subgraph_view(Selector::CFG, [a, b]);
/// assert!(!upper.contains_vertex(c));
/// assert_eq!(upper.exit_vertices().collect::<Vec<NodeId>>(), vec![b]);
/// # Ok::<(), cfgscope::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct GraphView<'g, N, E> {
    graph: &'g GraphCollection<N, E>,
    selector: Selector,
    subset: Option<FxHashSet<NodeId>>,
}

impl<'g, N, E> GraphView<'g, N, E> {
    pub(crate) fn new(
        graph: &'g GraphCollection<N, E>,
        selector: Selector,
        subset: Option<FxHashSet<NodeId>>,
    ) -> Self {
        GraphView {
            graph,
            selector,
            subset,
        }
    }

    /// Returns the selector this view filters on.
    #[must_use]
    pub fn selector(&self) -> Selector {
        self.selector
    }

    /// Returns the collection this view projects.
    #[must_use]
    pub fn collection(&self) -> &'g GraphCollection<N, E> {
        self.graph
    }

    /// Returns `true` if `node` is visible through this view.
    #[must_use]
    pub fn contains_vertex(&self, node: NodeId) -> bool {
        self.graph.contains_vertex(node)
            && self
                .subset
                .as_ref()
                .is_none_or(|subset| subset.contains(&node))
    }

    /// Returns the payload of a visible vertex.
    #[must_use]
    pub fn vertex_data(&self, node: NodeId) -> Option<&'g N> {
        if self.contains_vertex(node) {
            self.graph.vertex_data(node)
        } else {
            None
        }
    }

    /// Returns `true` if `edge` is visible through this view.
    #[must_use]
    pub fn contains_edge(&self, edge: EdgeId) -> bool {
        self.graph
            .record(edge)
            .is_some_and(|record| self.selects(record))
    }

    /// Returns the selector of a visible edge, masked by the view's selector.
    #[must_use]
    pub fn edge_selector(&self, edge: EdgeId) -> Option<Selector> {
        self.edge_ref(edge).map(|edge| edge.selector)
    }

    /// Returns the visible edge from `source` to `target`, if any.
    #[must_use]
    pub fn find_edge(&self, source: NodeId, target: NodeId) -> Option<EdgeId> {
        self.graph
            .find_edge(source, target)
            .filter(|&edge| self.contains_edge(edge))
    }

    /// Iterates over the visible out-edges of `node`, in insertion order.
    pub fn out_edges(&self, node: NodeId) -> impl Iterator<Item = EdgeRef<'g, E>> + '_ {
        self.graph
            .outgoing_ids(node)
            .iter()
            .filter_map(move |&edge| self.edge_ref(edge))
    }

    /// Iterates over the visible in-edges of `node`, in insertion order.
    pub fn in_edges(&self, node: NodeId) -> impl Iterator<Item = EdgeRef<'g, E>> + '_ {
        self.graph
            .incoming_ids(node)
            .iter()
            .filter_map(move |&edge| self.edge_ref(edge))
    }

    /// Calls `f` for every visible out-edge of `node`.
    pub fn for_each_out_edge<F>(&self, node: NodeId, mut f: F)
    where
        F: FnMut(EdgeRef<'g, E>),
    {
        for edge in self.out_edges(node) {
            f(edge);
        }
    }

    /// Calls `f` for every visible in-edge of `node`.
    pub fn for_each_in_edge<F>(&self, node: NodeId, mut f: F)
    where
        F: FnMut(EdgeRef<'g, E>),
    {
        for edge in self.in_edges(node) {
            f(edge);
        }
    }

    /// Returns the number of visible out-edges of `node`.
    #[must_use]
    pub fn out_degree(&self, node: NodeId) -> usize {
        self.out_edges(node).count()
    }

    /// Returns the number of visible in-edges of `node`.
    #[must_use]
    pub fn in_degree(&self, node: NodeId) -> usize {
        self.in_edges(node).count()
    }

    /// Iterates over the visible vertices in ascending index order.
    pub fn vertices(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.graph
            .vertices()
            .filter(move |&node| self.contains_vertex(node))
    }

    /// Iterates over the visible edges in insertion order.
    pub fn edges(&self) -> impl Iterator<Item = EdgeRef<'g, E>> + '_ {
        (0..self.graph.edge_bound()).filter_map(move |i| self.edge_ref(EdgeId::new(i)))
    }

    /// Returns the number of visible edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges().count()
    }

    /// Iterates over the visible vertices without visible in-edges.
    pub fn entry_vertices(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.vertices().filter(move |&node| self.in_degree(node) == 0)
    }

    /// Iterates over the visible vertices without visible out-edges.
    pub fn exit_vertices(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.vertices().filter(move |&node| self.out_degree(node) == 0)
    }

    fn selects(&self, record: &EdgeRecord<E>) -> bool {
        record.selector.intersects(self.selector)
            && self.contains_vertex(record.source)
            && self.contains_vertex(record.target)
    }

    fn edge_ref(&self, edge: EdgeId) -> Option<EdgeRef<'g, E>> {
        let record = self.graph.record(edge)?;
        if !self.selects(record) {
            return None;
        }
        Some(EdgeRef {
            id: edge,
            source: record.source,
            target: record.target,
            selector: record.selector & self.selector,
            data: &record.data,
        })
    }
}

impl<N, E> GraphBase for GraphView<'_, N, E> {
    fn node_count(&self) -> usize {
        match &self.subset {
            None => self.graph.vertex_count(),
            Some(_) => self.vertices().count(),
        }
    }

    fn node_bound(&self) -> usize {
        self.graph.vertex_bound()
    }

    fn node_ids(&self) -> impl Iterator<Item = NodeId> {
        self.vertices()
    }

    fn contains_node(&self, node: NodeId) -> bool {
        self.contains_vertex(node)
    }
}

impl<N, E> Successors for GraphView<'_, N, E> {
    fn successors(&self, node: NodeId) -> impl Iterator<Item = NodeId> {
        self.out_edges(node).map(|edge| edge.target)
    }
}

impl<N, E> Predecessors for GraphView<'_, N, E> {
    fn predecessors(&self, node: NodeId) -> impl Iterator<Item = NodeId> {
        self.in_edges(node).map(|edge| edge.source)
    }
}

#[cfg(test)]
mod tests {
    use crate::utils::graph::{
        GraphBase, GraphCollection, NodeId, Predecessors, Selector, Successors,
    };

    /// a -> b (CFG), b -> c (CFG|DOM), a -> c (DOM), c -> a (FEEDBACK)
    fn create_layered() -> (GraphCollection<(), ()>, [NodeId; 3]) {
        let mut graph = GraphCollection::new();
        let a = graph.add_vertex();
        let b = graph.add_vertex();
        let c = graph.add_vertex();
        graph.add_edge(a, b, Selector::CFG).unwrap();
        graph
            .add_edge(b, c, Selector::CFG | Selector::DOMINATOR)
            .unwrap();
        graph.add_edge(a, c, Selector::DOMINATOR).unwrap();
        graph.add_edge(c, a, Selector::FEEDBACK_CFG).unwrap();
        (graph, [a, b, c])
    }

    #[test]
    fn test_view_filters_by_selector() {
        let (graph, [a, b, c]) = create_layered();

        let cfg = graph.view(Selector::CFG);
        assert_eq!(cfg.successors(a).collect::<Vec<_>>(), vec![b]);
        assert_eq!(cfg.predecessors(c).collect::<Vec<_>>(), vec![b]);
        assert_eq!(cfg.edge_count(), 2);

        let dom = graph.view(Selector::DOMINATOR);
        assert_eq!(dom.successors(a).collect::<Vec<_>>(), vec![c]);
        assert_eq!(dom.in_degree(c), 2);

        let full = graph.view(Selector::FULL_CFG);
        assert_eq!(full.successors(c).collect::<Vec<_>>(), vec![a]);
    }

    #[test]
    fn test_edge_selector_is_masked() {
        let (graph, [_, b, c]) = create_layered();
        let edge = graph.get_edge(b, c).unwrap();

        assert_eq!(
            graph.view(Selector::DOMINATOR).edge_selector(edge),
            Some(Selector::DOMINATOR)
        );
        assert_eq!(
            graph.view(Selector::DJ).edge_selector(edge),
            Some(Selector::DOMINATOR)
        );
        assert_eq!(graph.view(Selector::CDG).edge_selector(edge), None);
        assert!(!graph.view(Selector::CDG).contains_edge(edge));
    }

    #[test]
    fn test_subgraph_view_hides_outside_vertices() {
        let (graph, [a, b, c]) = create_layered();
        let view = graph.subgraph_view(Selector::FULL_CFG, [a, b]);

        assert_eq!(view.node_count(), 2);
        assert!(!view.contains_node(c));
        assert_eq!(view.out_degree(b), 0);
        assert_eq!(view.in_degree(a), 0);
        assert_eq!(view.entry_vertices().collect::<Vec<_>>(), vec![a]);
        assert_eq!(view.exit_vertices().collect::<Vec<_>>(), vec![b]);
        assert!(view.vertex_data(c).is_none());
    }

    #[test]
    fn test_for_each_edge_visits_in_order() {
        let (graph, [a, b, c]) = create_layered();
        let view = graph.view(Selector::CFG | Selector::DOMINATOR);

        let mut targets = Vec::new();
        view.for_each_out_edge(a, |edge| targets.push(edge.target));
        assert_eq!(targets, vec![b, c]);

        let mut sources = Vec::new();
        view.for_each_in_edge(c, |edge| sources.push(edge.source));
        assert_eq!(sources, vec![b, a]);
    }

    #[test]
    fn test_find_edge_respects_selector() {
        let (graph, [a, _, c]) = create_layered();
        assert!(graph.view(Selector::DOMINATOR).find_edge(a, c).is_some());
        assert!(graph.view(Selector::CFG).find_edge(a, c).is_none());
    }

    #[test]
    fn test_view_after_vertex_removal() {
        let (mut graph, [a, b, c]) = create_layered();
        graph.remove_vertex(b).unwrap();

        let view = graph.view(Selector::all());
        assert_eq!(view.node_count(), 2);
        assert_eq!(view.node_bound(), 3);
        assert_eq!(view.node_ids().collect::<Vec<_>>(), vec![a, c]);
    }
}
