//! Depth-first traversals.
//!
//! Both traversals here visit successors in the order the graph yields them and number a
//! vertex the moment it is first reached from its parent, exactly like a recursive
//! depth-first search would. They run on an explicit stack, so arbitrarily deep control
//! flow cannot overflow the native call stack.
//!
//! - [`dfs`] - Lazy pre-order iterator from a single start vertex
//! - [`PreorderForest`] - Pre-order numbering with tree parents, grown from several roots
//!   over one shared visited state

use std::vec;

use crate::utils::graph::{NodeId, Successors};

fn successor_list<G: Successors>(graph: &G, node: NodeId) -> vec::IntoIter<NodeId> {
    graph.successors(node).collect::<Vec<_>>().into_iter()
}

/// Depth-first pre-order iterator over graph vertices.
///
/// # Examples
///
/// ```rust
/// use cfgscope::{algorithms::dfs, GraphCollection, NodeId, Selector};
///
/// let mut graph: GraphCollection<(), ()> = GraphCollection::new();
/// let a = graph.add_vertex();
/// let b = graph.add_vertex();
/// let c = graph.add_vertex();
/// let d = graph.add_vertex();
/// graph.add_edge(a, b, Selector::CFG)?;
/// graph.add_edge(a, c, Selector::CFG)?;
/// graph.add_edge(b, d, Selector::CFG)?;
///
/// let cfg = graph.view(Selector::CFG);
/// let order: Vec<NodeId> = dfs(&cfg, a).collect();
/// assert_eq!(order, vec![a, b, d, c]);
/// # Ok::<(), cfgscope::Error>(())
/// ```
pub struct DfsIterator<'g, G> {
    graph: &'g G,
    start: Option<NodeId>,
    stack: Vec<(NodeId, vec::IntoIter<NodeId>)>,
    visited: Vec<bool>,
}

impl<G: Successors> Iterator for DfsIterator<'_, G> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(start) = self.start.take() {
            self.stack.push((start, successor_list(self.graph, start)));
            return Some(start);
        }

        loop {
            let (_, successors) = self.stack.last_mut()?;
            let visited = &self.visited;
            let next = successors.find(|succ| visited.get(succ.index()) == Some(&false));
            match next {
                Some(node) => {
                    self.visited[node.index()] = true;
                    self.stack.push((node, successor_list(self.graph, node)));
                    return Some(node);
                }
                None => {
                    self.stack.pop();
                }
            }
        }
    }
}

/// Returns a depth-first pre-order iterator starting at `start`.
///
/// Vertices not reachable from `start` are not visited. If `start` is not a vertex of
/// the graph the iterator is empty.
pub fn dfs<G: Successors>(graph: &G, start: NodeId) -> DfsIterator<'_, G> {
    let mut visited = vec![false; graph.node_bound()];
    let start = if graph.contains_node(start) {
        visited[start.index()] = true;
        Some(start)
    } else {
        None
    };

    DfsIterator {
        graph,
        start,
        stack: Vec::new(),
        visited,
    }
}

/// Pre-order numbering of a depth-first spanning forest.
///
/// Numbers start at 1 and grow across every call to [`grow`](PreorderForest::grow), so a
/// forest built from several roots still has a single consistent numbering. The tree
/// parent of a vertex is the vertex it was first reached from, or whatever parent the
/// caller supplied for a root.
#[derive(Debug, Clone)]
pub struct PreorderForest {
    /// Pre-order number per vertex index, 0 while unvisited
    number: Vec<usize>,
    /// Tree parent per vertex index
    parent: Vec<Option<NodeId>>,
    /// Vertices in numbering order, `order[n - 1]` carries number `n`
    order: Vec<NodeId>,
}

impl PreorderForest {
    /// Creates an empty forest able to hold vertices with index below `node_bound`.
    #[must_use]
    pub fn new(node_bound: usize) -> Self {
        PreorderForest {
            number: vec![0; node_bound],
            parent: vec![None; node_bound],
            order: Vec::with_capacity(node_bound),
        }
    }

    /// Numbers `root` with the given tree parent, then every vertex reachable from it that
    /// is not numbered yet.
    ///
    /// Returns the number of newly visited vertices, zero if `root` was already visited.
    pub fn grow<G: Successors>(&mut self, graph: &G, root: NodeId, parent: Option<NodeId>) -> usize {
        if root.index() >= self.number.len() || self.is_visited(root) {
            return 0;
        }

        let before = self.order.len();
        self.discover(root, parent);

        let mut stack = vec![(root, successor_list(graph, root))];
        while let Some((node, successors)) = stack.last_mut() {
            let node = *node;
            let number = &self.number;
            let child = successors.find(|succ| number.get(succ.index()) == Some(&0));
            match child {
                Some(child) => {
                    self.discover(child, Some(node));
                    stack.push((child, successor_list(graph, child)));
                }
                None => {
                    stack.pop();
                }
            }
        }

        self.order.len() - before
    }

    /// Returns the 1-based pre-order number of `node`.
    #[must_use]
    pub fn number(&self, node: NodeId) -> Option<usize> {
        self.number
            .get(node.index())
            .copied()
            .filter(|&number| number != 0)
    }

    /// Returns `true` once `node` has been numbered.
    #[must_use]
    pub fn is_visited(&self, node: NodeId) -> bool {
        self.number(node).is_some()
    }

    /// Returns the tree parent of `node`.
    #[must_use]
    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.parent.get(node.index()).copied().flatten()
    }

    /// Returns the vertex carrying pre-order number `number`.
    #[must_use]
    pub fn node_at(&self, number: usize) -> Option<NodeId> {
        number
            .checked_sub(1)
            .and_then(|slot| self.order.get(slot))
            .copied()
    }

    /// Returns the visited vertices in pre-order.
    #[must_use]
    pub fn order(&self) -> &[NodeId] {
        &self.order
    }

    /// Returns the number of visited vertices.
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Returns `true` if nothing has been visited.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Returns `true` if `ancestor` is a strict tree ancestor of `node`.
    #[must_use]
    pub fn is_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = self.parent(node);
        while let Some(step) = current {
            if step == ancestor {
                return true;
            }
            current = self.parent(step);
        }
        false
    }

    fn discover(&mut self, node: NodeId, parent: Option<NodeId>) {
        self.order.push(node);
        self.number[node.index()] = self.order.len();
        self.parent[node.index()] = parent;
    }
}

#[cfg(test)]
mod tests {
    use crate::utils::graph::{
        algorithms::{dfs, PreorderForest},
        GraphCollection, NodeId, Selector,
    };

    /// 0 -> 1, 0 -> 2, 1 -> 3, 2 -> 3, 3 -> 1; 4 isolated, 5 -> 3
    fn create_graph() -> (GraphCollection<(), ()>, Vec<NodeId>) {
        let mut graph = GraphCollection::new();
        let n: Vec<NodeId> = (0..6).map(|_| graph.add_vertex()).collect();
        for (s, t) in [(0, 1), (0, 2), (1, 3), (2, 3), (3, 1), (5, 3)] {
            graph.add_edge(n[s], n[t], Selector::CFG).unwrap();
        }
        (graph, n)
    }

    #[test]
    fn test_dfs_preorder() {
        let (graph, n) = create_graph();
        let cfg = graph.view(Selector::CFG);
        let order: Vec<NodeId> = dfs(&cfg, n[0]).collect();
        assert_eq!(order, vec![n[0], n[1], n[3], n[2]]);
    }

    #[test]
    fn test_dfs_unknown_start() {
        let (graph, _) = create_graph();
        let cfg = graph.view(Selector::CFG);
        assert_eq!(dfs(&cfg, NodeId::new(42)).count(), 0);
    }

    #[test]
    fn test_dfs_is_true_preorder() {
        // a -> b, a -> c, b -> c: a stack-marking traversal would report c before b's
        // subtree is finished, a recursive one reaches c through b.
        let mut graph: GraphCollection<(), ()> = GraphCollection::new();
        let a = graph.add_vertex();
        let b = graph.add_vertex();
        let c = graph.add_vertex();
        graph.add_edge(a, b, Selector::CFG).unwrap();
        graph.add_edge(a, c, Selector::CFG).unwrap();
        graph.add_edge(b, c, Selector::CFG).unwrap();

        let cfg = graph.view(Selector::CFG);
        let mut forest = PreorderForest::new(3);
        forest.grow(&cfg, a, None);
        assert_eq!(forest.parent(c), Some(b));
        assert_eq!(dfs(&cfg, a).collect::<Vec<_>>(), vec![a, b, c]);
    }

    #[test]
    fn test_forest_numbering_and_parents() {
        let (graph, n) = create_graph();
        let cfg = graph.view(Selector::CFG);
        let mut forest = PreorderForest::new(graph.vertex_bound());

        assert_eq!(forest.grow(&cfg, n[0], None), 4);
        assert_eq!(forest.number(n[0]), Some(1));
        assert_eq!(forest.number(n[3]), Some(3));
        assert_eq!(forest.number(n[2]), Some(4));
        assert_eq!(forest.parent(n[0]), None);
        assert_eq!(forest.parent(n[3]), Some(n[1]));
        assert_eq!(forest.parent(n[2]), Some(n[0]));
        assert!(forest.is_ancestor(n[0], n[3]));
        assert!(!forest.is_ancestor(n[3], n[3]));
        assert!(!forest.is_ancestor(n[2], n[3]));

        // a second root continues the numbering
        assert_eq!(forest.grow(&cfg, n[5], Some(n[0])), 1);
        assert_eq!(forest.number(n[5]), Some(5));
        assert_eq!(forest.parent(n[5]), Some(n[0]));
        assert_eq!(forest.grow(&cfg, n[5], None), 0);

        assert!(!forest.is_visited(n[4]));
        assert_eq!(forest.node_at(5), Some(n[5]));
        assert_eq!(forest.node_at(0), None);
        assert_eq!(forest.len(), 5);
    }
}
