//! The owning store behind every logical graph of a function.
//!
//! [`GraphCollection`] owns all vertex and edge records of one function. Logical graphs
//! (control flow, dominator tree, DJ-graph, control dependence, ...) are not separate
//! containers: they are selector bits on the shared edge records, and a
//! [`GraphView`] materialises one of them on demand.
//!
//! The collection keeps the insertion order of edges in its adjacency lists. Removal
//! preserves the relative order of the surviving edges, so that any view taken after a
//! mutation still iterates in a reproducible order.

use rustc_hash::FxHashMap;

use crate::{
    utils::graph::{EdgeId, EdgeRef, GraphView, NodeId, Selector},
    Error, Result,
};

/// Internal storage for one physical edge.
#[derive(Debug, Clone)]
pub(crate) struct EdgeRecord<E> {
    /// Source vertex of the edge
    pub(crate) source: NodeId,
    /// Target vertex of the edge
    pub(crate) target: NodeId,
    /// Logical graphs this edge belongs to
    pub(crate) selector: Selector,
    /// User-provided edge payload
    pub(crate) data: E,
}

/// Arena owning the vertices and edges of a function's graphs.
///
/// `GraphCollection` provides:
///
/// - Generic vertex payload (`N`) stored in a side table indexed by [`NodeId`]
/// - Generic edge payload (`E`), e.g. branch labels on control flow edges
/// - A single edge record per ordered vertex pair, tagged with a [`Selector`] mask
/// - Stable handles: removal tombstones a slot instead of compacting the arena
///
/// # Mutation discipline
///
/// Views borrow the collection immutably, so the borrow checker rejects structural
/// mutation while a view is alive. Build the graph, take views, analyse, drop the
/// views, mutate again.
///
/// # Examples
///
/// ```rust
/// use cfgscope::{GraphCollection, Selector, Successors};
///
/// let mut graph: GraphCollection<&str, ()> = GraphCollection::new();
/// let entry = graph.add_vertex_with("entry");
/// let body = graph.add_vertex_with("body");
///
/// let edge = graph.add_edge(entry, body, Selector::CFG)?;
/// graph.add_selector(edge, Selector::DOMINATOR)?;
///
/// assert_eq!(graph.edge_count(), 1);
/// assert_eq!(graph.selector(edge)?, Selector::CFG | Selector::DOMINATOR);
/// assert_eq!(graph.view(Selector::DOMINATOR).successors(entry).count(), 1);
/// # Ok::<(), cfgscope::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct GraphCollection<N, E> {
    /// Vertex payloads, `None` marks a removed vertex
    vertices: Vec<Option<N>>,
    /// Number of live vertices
    live_vertices: usize,
    /// Edge records, `None` marks a removed edge
    edges: Vec<Option<EdgeRecord<E>>>,
    /// Number of live edges
    live_edges: usize,
    /// Outgoing edges per vertex, in insertion order
    outgoing: Vec<Vec<EdgeId>>,
    /// Incoming edges per vertex, in insertion order
    incoming: Vec<Vec<EdgeId>>,
    /// Lookup of the unique record for an ordered vertex pair
    pairs: FxHashMap<(NodeId, NodeId), EdgeId>,
}

impl<N, E> Default for GraphCollection<N, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<N, E> GraphCollection<N, E> {
    /// Creates an empty collection.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(0, 0)
    }

    /// Creates an empty collection with pre-allocated room for vertices and edges.
    #[must_use]
    pub fn with_capacity(vertex_capacity: usize, edge_capacity: usize) -> Self {
        GraphCollection {
            vertices: Vec::with_capacity(vertex_capacity),
            live_vertices: 0,
            edges: Vec::with_capacity(edge_capacity),
            live_edges: 0,
            outgoing: Vec::with_capacity(vertex_capacity),
            incoming: Vec::with_capacity(vertex_capacity),
            pairs: FxHashMap::default(),
        }
    }

    /// Appends a vertex carrying `data` and returns its handle.
    pub fn add_vertex_with(&mut self, data: N) -> NodeId {
        let id = NodeId::new(self.vertices.len());
        self.vertices.push(Some(data));
        self.outgoing.push(Vec::new());
        self.incoming.push(Vec::new());
        self.live_vertices += 1;
        id
    }

    /// Appends a vertex with a default payload and returns its handle.
    pub fn add_vertex(&mut self) -> NodeId
    where
        N: Default,
    {
        self.add_vertex_with(N::default())
    }

    /// Returns `true` if `node` is a live vertex of this collection.
    #[must_use]
    pub fn contains_vertex(&self, node: NodeId) -> bool {
        matches!(self.vertices.get(node.index()), Some(Some(_)))
    }

    /// Returns the payload of a live vertex.
    #[must_use]
    pub fn vertex_data(&self, node: NodeId) -> Option<&N> {
        self.vertices.get(node.index()).and_then(Option::as_ref)
    }

    /// Returns the payload of a live vertex for modification.
    pub fn vertex_data_mut(&mut self, node: NodeId) -> Option<&mut N> {
        self.vertices.get_mut(node.index()).and_then(Option::as_mut)
    }

    /// Returns the number of live vertices.
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.live_vertices
    }

    /// Returns one past the highest vertex index ever handed out.
    #[must_use]
    pub fn vertex_bound(&self) -> usize {
        self.vertices.len()
    }

    /// Iterates over the live vertices in insertion order.
    pub fn vertices(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.vertices
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.is_some())
            .map(|(i, _)| NodeId::new(i))
    }

    /// Adds an edge from `source` to `target` carrying `data`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownVertex`] if either endpoint is not a live vertex, and
    /// [`Error::MalformedGraph`] if a record for the pair already exists. Use
    /// [`add_selector`](Self::add_selector) or [`ensure_edge`](Self::ensure_edge) to
    /// add a logical membership to an existing physical edge.
    pub fn add_edge_with(
        &mut self,
        source: NodeId,
        target: NodeId,
        selector: Selector,
        data: E,
    ) -> Result<EdgeId> {
        self.check_vertex(source)?;
        self.check_vertex(target)?;
        if let Some(existing) = self.pairs.get(&(source, target)) {
            return Err(malformed_error!(
                "edge {} -> {} already exists as {}",
                source,
                target,
                existing
            ));
        }

        Ok(self.push_edge(source, target, selector, data))
    }

    /// Appends the record for a pair already known to be free, between live vertices.
    pub(crate) fn push_edge(
        &mut self,
        source: NodeId,
        target: NodeId,
        selector: Selector,
        data: E,
    ) -> EdgeId {
        debug_assert!(!self.pairs.contains_key(&(source, target)));

        let id = EdgeId::new(self.edges.len());
        self.edges.push(Some(EdgeRecord {
            source,
            target,
            selector,
            data,
        }));
        self.outgoing[source.index()].push(id);
        self.incoming[target.index()].push(id);
        self.pairs.insert((source, target), id);
        self.live_edges += 1;
        id
    }

    /// Adds an edge with a default payload.
    ///
    /// # Errors
    ///
    /// Same as [`add_edge_with`](Self::add_edge_with).
    pub fn add_edge(&mut self, source: NodeId, target: NodeId, selector: Selector) -> Result<EdgeId>
    where
        E: Default,
    {
        self.add_edge_with(source, target, selector, E::default())
    }

    /// Adds `selector` to the edge between `source` and `target`, creating the edge with
    /// a default payload if none exists yet.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownVertex`] if either endpoint is not a live vertex.
    pub fn ensure_edge(
        &mut self,
        source: NodeId,
        target: NodeId,
        selector: Selector,
    ) -> Result<EdgeId>
    where
        E: Default,
    {
        match self.pairs.get(&(source, target)).copied() {
            Some(edge) => {
                self.add_selector(edge, selector)?;
                Ok(edge)
            }
            None => self.add_edge(source, target, selector),
        }
    }

    /// ORs `selector` onto an existing edge record.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownEdge`] if `edge` is not live.
    pub fn add_selector(&mut self, edge: EdgeId, selector: Selector) -> Result<()> {
        self.record_mut(edge)?.selector |= selector;
        Ok(())
    }

    /// Clears the bits of `selector` on an existing edge record.
    ///
    /// The record stays in place even if its mask becomes empty; call
    /// [`compress_edges`](Self::compress_edges) to drop such records.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownEdge`] if `edge` is not live.
    pub fn remove_selector(&mut self, edge: EdgeId, selector: Selector) -> Result<()> {
        self.record_mut(edge)?.selector.remove(selector);
        Ok(())
    }

    /// Returns the full selector mask of an edge.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownEdge`] if `edge` is not live.
    pub fn selector(&self, edge: EdgeId) -> Result<Selector> {
        Ok(self.record_checked(edge)?.selector)
    }

    /// Returns `true` if an edge record exists from `source` to `target`.
    #[must_use]
    pub fn exists_edge(&self, source: NodeId, target: NodeId) -> bool {
        self.pairs.contains_key(&(source, target))
    }

    /// Returns the edge record from `source` to `target`, if any.
    #[must_use]
    pub fn find_edge(&self, source: NodeId, target: NodeId) -> Option<EdgeId> {
        self.pairs.get(&(source, target)).copied()
    }

    /// Returns the edge record from `source` to `target`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingEdge`] if no such record exists.
    pub fn get_edge(&self, source: NodeId, target: NodeId) -> Result<EdgeId> {
        self.find_edge(source, target).ok_or(Error::MissingEdge {
            from: source,
            to: target,
        })
    }

    /// Returns the `(source, target)` pair of an edge.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownEdge`] if `edge` is not live.
    pub fn edge_endpoints(&self, edge: EdgeId) -> Result<(NodeId, NodeId)> {
        let record = self.record_checked(edge)?;
        Ok((record.source, record.target))
    }

    /// Returns the payload of an edge.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownEdge`] if `edge` is not live.
    pub fn edge_data(&self, edge: EdgeId) -> Result<&E> {
        Ok(&self.record_checked(edge)?.data)
    }

    /// Returns the payload of an edge for modification.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownEdge`] if `edge` is not live.
    pub fn edge_data_mut(&mut self, edge: EdgeId) -> Result<&mut E> {
        Ok(&mut self.record_mut(edge)?.data)
    }

    /// Returns the number of live edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.live_edges
    }

    /// Iterates over all live edges in insertion order, with their full selector masks.
    pub fn edges(&self) -> impl Iterator<Item = EdgeRef<'_, E>> + '_ {
        self.edges.iter().enumerate().filter_map(|(i, slot)| {
            slot.as_ref().map(|record| EdgeRef {
                id: EdgeId::new(i),
                source: record.source,
                target: record.target,
                selector: record.selector,
                data: &record.data,
            })
        })
    }

    /// Removes an edge record and returns its payload.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownEdge`] if `edge` is not live.
    pub fn remove_edge(&mut self, edge: EdgeId) -> Result<E> {
        let record = self
            .edges
            .get_mut(edge.index())
            .and_then(Option::take)
            .ok_or(Error::UnknownEdge(edge))?;

        self.outgoing[record.source.index()].retain(|&id| id != edge);
        self.incoming[record.target.index()].retain(|&id| id != edge);
        self.pairs.remove(&(record.source, record.target));
        self.live_edges -= 1;

        Ok(record.data)
    }

    /// Removes a vertex together with every edge incident to it and returns its payload.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownVertex`] if `node` is not live.
    pub fn remove_vertex(&mut self, node: NodeId) -> Result<N> {
        self.check_vertex(node)?;

        let mut incident: Vec<EdgeId> = self.outgoing[node.index()].clone();
        incident.extend(self.incoming[node.index()].iter().copied());
        incident.sort_unstable();
        incident.dedup();
        for edge in incident {
            self.remove_edge(edge)?;
        }

        self.live_vertices -= 1;
        self.vertices[node.index()]
            .take()
            .ok_or(Error::UnknownVertex(node))
    }

    /// Physically removes every edge whose selector mask is empty.
    ///
    /// Returns the number of removed records.
    pub fn compress_edges(&mut self) -> usize {
        let empty: Vec<EdgeId> = self
            .edges()
            .filter(|edge| edge.selector.is_empty())
            .map(|edge| edge.id)
            .collect();

        let mut removed = 0;
        for edge in empty {
            if self.remove_edge(edge).is_ok() {
                removed += 1;
            }
        }
        removed
    }

    /// Takes a view over the edges intersecting `selector`.
    #[must_use]
    pub fn view(&self, selector: Selector) -> GraphView<'_, N, E> {
        GraphView::new(self, selector, None)
    }

    /// Takes a view over the edges intersecting `selector` whose endpoints both lie in
    /// `subset`. Vertices outside `subset` are invisible to the view.
    #[must_use]
    pub fn subgraph_view<I>(&self, selector: Selector, subset: I) -> GraphView<'_, N, E>
    where
        I: IntoIterator<Item = NodeId>,
    {
        GraphView::new(self, selector, Some(subset.into_iter().collect()))
    }

    pub(crate) fn outgoing_ids(&self, node: NodeId) -> &[EdgeId] {
        self.outgoing.get(node.index()).map_or(&[], Vec::as_slice)
    }

    pub(crate) fn incoming_ids(&self, node: NodeId) -> &[EdgeId] {
        self.incoming.get(node.index()).map_or(&[], Vec::as_slice)
    }

    pub(crate) fn record(&self, edge: EdgeId) -> Option<&EdgeRecord<E>> {
        self.edges.get(edge.index()).and_then(Option::as_ref)
    }

    pub(crate) fn edge_bound(&self) -> usize {
        self.edges.len()
    }

    fn record_checked(&self, edge: EdgeId) -> Result<&EdgeRecord<E>> {
        self.record(edge).ok_or(Error::UnknownEdge(edge))
    }

    fn record_mut(&mut self, edge: EdgeId) -> Result<&mut EdgeRecord<E>> {
        self.edges
            .get_mut(edge.index())
            .and_then(Option::as_mut)
            .ok_or(Error::UnknownEdge(edge))
    }

    fn check_vertex(&self, node: NodeId) -> Result<()> {
        if self.contains_vertex(node) {
            Ok(())
        } else {
            Err(Error::UnknownVertex(node))
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        utils::graph::{EdgeId, GraphCollection, NodeId, Selector},
        Error,
    };

    /// Creates a diamond: a -> b, a -> c, b -> d, c -> d (all CFG)
    fn create_diamond() -> (GraphCollection<(), ()>, [NodeId; 4]) {
        let mut graph = GraphCollection::new();
        let a = graph.add_vertex();
        let b = graph.add_vertex();
        let c = graph.add_vertex();
        let d = graph.add_vertex();
        graph.add_edge(a, b, Selector::CFG).unwrap();
        graph.add_edge(a, c, Selector::CFG).unwrap();
        graph.add_edge(b, d, Selector::CFG).unwrap();
        graph.add_edge(c, d, Selector::CFG).unwrap();
        (graph, [a, b, c, d])
    }

    #[test]
    fn test_new_collection_is_empty() {
        let graph: GraphCollection<(), ()> = GraphCollection::default();
        assert_eq!(graph.vertex_count(), 0);
        assert_eq!(graph.edge_count(), 0);
        assert_eq!(graph.vertices().count(), 0);
    }

    #[test]
    fn test_add_vertex_assigns_sequential_ids() {
        let mut graph: GraphCollection<&str, ()> = GraphCollection::new();
        let a = graph.add_vertex_with("a");
        let b = graph.add_vertex_with("b");
        assert_eq!(a, NodeId::new(0));
        assert_eq!(b, NodeId::new(1));
        assert_eq!(graph.vertex_data(b), Some(&"b"));

        if let Some(data) = graph.vertex_data_mut(a) {
            *data = "entry";
        }
        assert_eq!(graph.vertex_data(a), Some(&"entry"));
    }

    #[test]
    fn test_duplicate_edge_is_rejected() {
        let (mut graph, [a, b, ..]) = create_diamond();
        let result = graph.add_edge(a, b, Selector::DOMINATOR);
        assert!(matches!(result, Err(Error::MalformedGraph { .. })));
        assert_eq!(graph.edge_count(), 4);
    }

    #[test]
    fn test_push_edge_matches_checked_insertion() {
        let mut graph: GraphCollection<(), u8> = GraphCollection::new();
        let a = graph.add_vertex();
        let b = graph.add_vertex();
        let pushed = graph.push_edge(a, b, Selector::CFG, 3);
        let checked = graph.add_edge_with(b, a, Selector::CFG, 4).unwrap();

        assert_eq!(pushed, EdgeId::new(0));
        assert_eq!(checked, EdgeId::new(1));
        assert_eq!(graph.get_edge(a, b), Ok(pushed));
        assert_eq!(graph.edge_data(pushed), Ok(&3));
        assert_eq!(graph.edge_count(), 2);
        assert!(matches!(
            graph.add_edge_with(a, b, Selector::CFG, 5),
            Err(Error::MalformedGraph { .. })
        ));
    }

    #[test]
    fn test_edge_to_unknown_vertex_is_rejected() {
        let (mut graph, [a, ..]) = create_diamond();
        let ghost = NodeId::new(99);
        assert_eq!(
            graph.add_edge(a, ghost, Selector::CFG),
            Err(Error::UnknownVertex(ghost))
        );
    }

    #[test]
    fn test_selectors_accumulate_on_one_record() {
        let (mut graph, [a, b, ..]) = create_diamond();
        let edge = graph.get_edge(a, b).unwrap();

        let again = graph.ensure_edge(a, b, Selector::DOMINATOR).unwrap();
        assert_eq!(again, edge);
        assert_eq!(
            graph.selector(edge).unwrap(),
            Selector::CFG | Selector::DOMINATOR
        );

        graph.remove_selector(edge, Selector::CFG).unwrap();
        assert_eq!(graph.selector(edge).unwrap(), Selector::DOMINATOR);
        assert_eq!(graph.edge_count(), 4);
    }

    #[test]
    fn test_ensure_edge_creates_missing_record() {
        let (mut graph, [a, _, _, d]) = create_diamond();
        assert!(!graph.exists_edge(a, d));
        let edge = graph.ensure_edge(a, d, Selector::DOMINATOR).unwrap();
        assert_eq!(edge, EdgeId::new(4));
        assert_eq!(graph.edge_endpoints(edge).unwrap(), (a, d));
    }

    #[test]
    fn test_get_edge_missing() {
        let (graph, [a, _, _, d]) = create_diamond();
        assert_eq!(
            graph.get_edge(d, a),
            Err(Error::MissingEdge { from: d, to: a })
        );
    }

    #[test]
    fn test_compress_edges_drops_empty_records() {
        let (mut graph, [a, b, c, _]) = create_diamond();
        let ab = graph.get_edge(a, b).unwrap();
        graph.remove_selector(ab, Selector::CFG).unwrap();

        assert_eq!(graph.compress_edges(), 1);
        assert!(!graph.exists_edge(a, b));
        assert!(graph.exists_edge(a, c));
        assert_eq!(graph.edge_count(), 3);
        assert_eq!(graph.selector(ab), Err(Error::UnknownEdge(ab)));
    }

    #[test]
    fn test_remove_vertex_removes_incident_edges() {
        let (mut graph, [a, b, c, d]) = create_diamond();
        graph.remove_vertex(b).unwrap();

        assert!(!graph.contains_vertex(b));
        assert_eq!(graph.vertex_count(), 3);
        assert_eq!(graph.vertex_bound(), 4);
        assert_eq!(graph.edge_count(), 2);
        assert!(graph.exists_edge(a, c));
        assert!(graph.exists_edge(c, d));

        // handles are not reused
        let e = graph.add_vertex();
        assert_eq!(e, NodeId::new(4));
        assert_eq!(graph.remove_vertex(b), Err(Error::UnknownVertex(b)));
    }

    #[test]
    fn test_removal_preserves_edge_order() {
        let mut graph: GraphCollection<(), ()> = GraphCollection::new();
        let hub = graph.add_vertex();
        let targets: Vec<NodeId> = (0..4).map(|_| graph.add_vertex()).collect();
        for &t in &targets {
            graph.add_edge(hub, t, Selector::CFG).unwrap();
        }
        let second = graph.get_edge(hub, targets[1]).unwrap();
        graph.remove_edge(second).unwrap();

        let remaining: Vec<NodeId> = graph.edges().map(|e| e.target).collect();
        assert_eq!(remaining, vec![targets[0], targets[2], targets[3]]);
    }

    #[test]
    fn test_edge_payload_access() {
        let mut graph: GraphCollection<(), u32> = GraphCollection::new();
        let a = graph.add_vertex();
        let b = graph.add_vertex();
        let edge = graph.add_edge_with(a, b, Selector::CFG, 7).unwrap();

        *graph.edge_data_mut(edge).unwrap() += 1;
        assert_eq!(graph.edge_data(edge), Ok(&8));
        assert_eq!(graph.remove_edge(edge), Ok(8));
        assert_eq!(graph.edge_data(edge), Err(Error::UnknownEdge(edge)));
    }
}
