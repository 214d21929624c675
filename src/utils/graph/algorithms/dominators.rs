//! Dominator and post-dominator computation using the Lengauer-Tarjan algorithm.
//!
//! A vertex `d` **dominates** `n` if every path from the entry to `n` passes through `d`.
//! The **immediate dominator** of `n` is the unique closest strict dominator of `n`;
//! linking every vertex to it yields the dominator tree. Post-dominance is the same
//! relation on the reversed graph rooted at the exit.
//!
//! # Algorithm
//!
//! [`DominanceEngine`] runs the Lengauer-Tarjan algorithm with a balanced
//! path-compression forest, achieving O(E α(E, V)). All working state lives in flat arrays
//! indexed by DFS number, with 0 as the "no vertex" sentinel and the root numbered 1:
//!
//! 1. Depth-first numbering from the root, see
//!    [`PreorderForest`](crate::utils::graph::algorithms::PreorderForest)
//! 2. Semidominators, visiting vertices by decreasing DFS number
//! 3. Bucket resolution of semidominators into immediate dominators
//! 4. A final increasing pass fixing up deferred immediate dominators
//!
//! # Post-dominators and missing exits
//!
//! Real functions contain blocks from which the exit cannot be reached: calls to noreturn
//! functions and infinite loops. For the reverse direction such blocks receive a fake edge
//! from the exit so that the DFS still produces a single tree. Blocks without successors
//! are connected first; any block that is still unnumbered afterwards (the body of an
//! infinite loop) is connected next. Fake edges are remembered and reported through
//! [`DominanceEngine::fake_exit_edges`].

use std::{
    collections::{BTreeMap, BTreeSet},
    sync::OnceLock,
};

use log::{debug, trace};

use crate::{
    utils::graph::{
        algorithms::PreorderForest, GraphCollection, NodeId, Predecessors, Reversed, Selector,
        Successors,
    },
    Error, Result,
};

/// Which dominance relation to compute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DominanceDirection {
    /// Dominators, rooted at the entry vertex
    Dominators,
    /// Post-dominators, rooted at the exit vertex on the reversed graph
    PostDominators,
}

impl DominanceDirection {
    /// Returns the selector recording this relation's tree edges.
    #[must_use]
    pub fn selector(self) -> Selector {
        match self {
            DominanceDirection::Dominators => Selector::DOMINATOR,
            DominanceDirection::PostDominators => Selector::POST_DOMINATOR,
        }
    }
}

/// Lifecycle of a [`DominanceEngine`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DominanceState {
    /// No computation has run yet
    NotComputed,
    /// The relation for the given direction is available and frozen
    Computed(DominanceDirection),
}

/// Output of one Lengauer-Tarjan run, keyed by vertex index.
#[derive(Debug, Clone)]
struct DominanceSolution {
    direction: DominanceDirection,
    root: NodeId,
    /// Immediate dominator per vertex index; the root maps to itself
    idom: Vec<Option<NodeId>>,
    /// Numbered vertices in DFS order
    preorder: Vec<NodeId>,
    /// 1-based DFS number per vertex index, 0 for unnumbered vertices
    dfs_number: Vec<usize>,
    /// Vertices that received a fake edge from the exit
    fake_exit: BTreeSet<NodeId>,
}

/// Immediate-dominator computation over a graph view.
///
/// The engine borrows the graph for its whole lifetime. Once computed its result is
/// frozen: asking again for the same direction is a no-op, asking for the other one is an
/// invariant violation. Use one engine per direction and convert each into an owned
/// [`DominatorTree`] with [`into_tree`](Self::into_tree) to release the borrow.
///
/// # Examples
///
/// ```rust
/// use cfgscope::{DominanceDirection, DominanceEngine, GraphCollection, Selector};
///
/// // entry -> a -> {b, c} -> d -> exit
/// let mut graph: GraphCollection<(), ()> = GraphCollection::new();
/// let entry = graph.add_vertex();
/// let exit = graph.add_vertex();
/// let a = graph.add_vertex();
/// let b = graph.add_vertex();
/// let c = graph.add_vertex();
/// let d = graph.add_vertex();
/// for (s, t) in [(entry, a), (a, b), (a, c), (b, d), (c, d), (d, exit)] {
///     graph.add_edge(s, t, Selector::CFG)?;
/// }
///
/// let cfg = graph.view(Selector::CFG);
/// let mut engine = DominanceEngine::new(&cfg, entry, exit)?;
/// engine.compute(DominanceDirection::Dominators)?;
/// assert_eq!(engine.immediate_dominator(d)?, a);
///
/// let mut post = DominanceEngine::new(&cfg, entry, exit)?;
/// post.compute(DominanceDirection::PostDominators)?;
/// assert_eq!(post.immediate_dominator(a)?, d);
/// # Ok::<(), cfgscope::Error>(())
/// ```
#[derive(Debug)]
pub struct DominanceEngine<'a, G> {
    graph: &'a G,
    entry: NodeId,
    exit: NodeId,
    state: DominanceState,
    solution: Option<DominanceSolution>,
}

impl<'a, G> DominanceEngine<'a, G>
where
    G: Successors + Predecessors,
{
    /// Creates an engine for `graph` with the given entry and exit vertices.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedGraph`] if `entry` equals `exit`, if `entry` is not a
    /// vertex of `graph`, or if `exit` lies outside the graph's vertex range. The exit
    /// only has to be visible in the graph when post-dominators are computed.
    pub fn new(graph: &'a G, entry: NodeId, exit: NodeId) -> Result<Self> {
        if entry == exit {
            return Err(malformed_error!(
                "Entry and exit must differ, both are {}",
                entry
            ));
        }
        if !graph.contains_node(entry) {
            return Err(malformed_error!("Entry {} is not a vertex of the graph", entry));
        }
        if exit.index() >= graph.node_bound() {
            return Err(malformed_error!("Exit {} is not a vertex of the graph", exit));
        }

        Ok(DominanceEngine {
            graph,
            entry,
            exit,
            state: DominanceState::NotComputed,
            solution: None,
        })
    }

    /// Returns the current lifecycle state.
    #[must_use]
    pub fn state(&self) -> DominanceState {
        self.state
    }

    /// Computes the dominance relation in `direction`.
    ///
    /// # Errors
    ///
    /// - [`Error::MalformedGraph`] if some vertex is unreachable from the entry (forward
    ///   direction), or the exit is not visible in the graph (reverse direction)
    /// - [`Error::InvariantViolation`] if the engine was already computed for the other
    ///   direction
    pub fn compute(&mut self, direction: DominanceDirection) -> Result<()> {
        match self.state {
            DominanceState::Computed(done) if done == direction => return Ok(()),
            DominanceState::Computed(done) => {
                return Err(invariant_error!(
                    "Dominance already computed as {:?}, cannot recompute as {:?}",
                    done,
                    direction
                ));
            }
            DominanceState::NotComputed => {}
        }

        let solution = match direction {
            DominanceDirection::Dominators => {
                debug!("Computing dominators from {}", self.entry);
                LengauerTarjan::new(self.graph, self.entry, false).solve(direction)?
            }
            DominanceDirection::PostDominators => {
                if !self.graph.contains_node(self.exit) {
                    return Err(malformed_error!(
                        "Exit {} is not a vertex of the graph",
                        self.exit
                    ));
                }
                debug!("Computing post-dominators from {}", self.exit);
                let reversed = Reversed::new(self.graph, self.exit);
                LengauerTarjan::new(&reversed, self.exit, true).solve(direction)?
            }
        };

        self.solution = Some(solution);
        self.state = DominanceState::Computed(direction);
        Ok(())
    }

    fn solved(&self) -> Result<&DominanceSolution> {
        self.solution.as_ref().ok_or(Error::DominanceNotComputed)
    }

    /// Returns the immediate dominator of `node`. The root is its own immediate dominator.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DominanceNotComputed`] before [`compute`](Self::compute), and
    /// [`Error::UnknownVertex`] for a vertex that was not numbered by the traversal.
    pub fn immediate_dominator(&self, node: NodeId) -> Result<NodeId> {
        self.solved()?
            .idom
            .get(node.index())
            .copied()
            .flatten()
            .ok_or(Error::UnknownVertex(node))
    }

    /// Returns the full vertex to immediate-dominator map, the root mapping to itself.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DominanceNotComputed`] before [`compute`](Self::compute).
    pub fn dominator_map(&self) -> Result<BTreeMap<NodeId, NodeId>> {
        let solution = self.solved()?;
        Ok(solution
            .idom
            .iter()
            .enumerate()
            .filter_map(|(i, idom)| idom.map(|d| (NodeId::new(i), d)))
            .collect())
    }

    /// Returns, for every mapped vertex, the set of vertices it dominates (itself
    /// included).
    ///
    /// # Errors
    ///
    /// Returns [`Error::DominanceNotComputed`] before [`compute`](Self::compute).
    pub fn all_dominated(&self) -> Result<BTreeMap<NodeId, BTreeSet<NodeId>>> {
        let solution = self.solved()?;
        let closure = dominated_closure(solution.root, &solution.idom, &solution.preorder);
        Ok(solution
            .preorder
            .iter()
            .map(|&node| (node, closure[node.index()].clone()))
            .collect())
    }

    /// Returns `true` if `node` received a fake edge from the exit.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DominanceNotComputed`] before [`compute`](Self::compute).
    pub fn has_fake_exit_edge(&self, node: NodeId) -> Result<bool> {
        Ok(self.solved()?.fake_exit.contains(&node))
    }

    /// Returns the vertices that received a fake edge from the exit.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DominanceNotComputed`] before [`compute`](Self::compute).
    pub fn fake_exit_edges(&self) -> Result<&BTreeSet<NodeId>> {
        Ok(&self.solved()?.fake_exit)
    }

    /// Returns the 1-based DFS number assigned to `node`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DominanceNotComputed`] before [`compute`](Self::compute), and
    /// [`Error::UnknownVertex`] for an unnumbered vertex.
    pub fn dfs_number(&self, node: NodeId) -> Result<usize> {
        self.solved()?
            .dfs_number
            .get(node.index())
            .copied()
            .filter(|&number| number != 0)
            .ok_or(Error::UnknownVertex(node))
    }

    /// Consumes the engine and returns the owned dominator tree.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DominanceNotComputed`] before [`compute`](Self::compute).
    pub fn into_tree(self) -> Result<DominatorTree> {
        let solution = self.solution.ok_or(Error::DominanceNotComputed)?;
        Ok(DominatorTree::from_solution(solution))
    }
}

/// Working arrays of one Lengauer-Tarjan run. Every array except `dfs_order` is indexed by
/// DFS number and sized `n + 1`, slot 0 being the sentinel.
struct LengauerTarjan<'g, G> {
    graph: &'g G,
    root: NodeId,
    reverse: bool,
    forest: PreorderForest,
    fake_exit: BTreeSet<NodeId>,
    dfs_parent: Vec<usize>,
    key: Vec<usize>,
    path_min: Vec<usize>,
    bucket: Vec<usize>,
    next_bucket: Vec<usize>,
    set_chain: Vec<usize>,
    set_size: Vec<usize>,
    set_child: Vec<usize>,
    dom: Vec<usize>,
}

impl<'g, G> LengauerTarjan<'g, G>
where
    G: Successors + Predecessors,
{
    fn new(graph: &'g G, root: NodeId, reverse: bool) -> Self {
        let slots = graph.node_count() + 1;
        LengauerTarjan {
            graph,
            root,
            reverse,
            forest: PreorderForest::new(graph.node_bound()),
            fake_exit: BTreeSet::new(),
            dfs_parent: vec![0; slots],
            key: (0..slots).collect(),
            path_min: (0..slots).collect(),
            bucket: vec![0; slots],
            next_bucket: vec![0; slots],
            set_chain: vec![0; slots],
            set_size: vec![1; slots],
            set_child: vec![0; slots],
            dom: vec![0; slots],
        }
    }

    fn solve(mut self, direction: DominanceDirection) -> Result<DominanceSolution> {
        self.number_vertices()?;
        self.compute_idoms();
        Ok(self.into_solution(direction))
    }

    fn number_vertices(&mut self) -> Result<()> {
        let graph = self.graph;
        self.forest.grow(graph, self.root, None);

        if self.reverse {
            // Blocks without any path to the exit: noreturn calls first, then whatever
            // the DFS still misses (infinite loops).
            let mut saw_unconnected = false;
            for node in graph.node_ids() {
                if node == self.root {
                    continue;
                }
                if graph.predecessors(node).next().is_some() {
                    saw_unconnected |= !self.forest.is_visited(node);
                    continue;
                }
                self.add_fake_exit_edge(node);
            }

            if saw_unconnected {
                for node in graph.node_ids() {
                    if node == self.root || self.forest.is_visited(node) {
                        continue;
                    }
                    self.add_fake_exit_edge(node);
                }
            }
        }

        let total = graph.node_count();
        if self.forest.len() != total {
            return Err(malformed_error!(
                "There is no path from {} to every vertex: {} of {} vertices reached",
                self.root,
                self.forest.len(),
                total
            ));
        }

        for (slot, &node) in self.forest.order().iter().enumerate() {
            let number = slot + 1;
            self.dfs_parent[number] = self
                .forest
                .parent(node)
                .and_then(|parent| self.forest.number(parent))
                .unwrap_or(0);
            trace!("dfs {} -> {} (parent {})", number, node, self.dfs_parent[number]);
        }

        Ok(())
    }

    fn add_fake_exit_edge(&mut self, node: NodeId) {
        trace!("Fake exit edge {} -> {}", self.root, node);
        self.fake_exit.insert(node);
        self.forest.grow(self.graph, node, Some(self.root));
    }

    fn number_of(&self, node: NodeId) -> usize {
        self.forest.number(node).unwrap_or(0)
    }

    fn compute_idoms(&mut self) {
        let graph = self.graph;
        let nodes = self.forest.len();
        let root_number = self.number_of(self.root);

        for v in (2..=nodes).rev() {
            let Some(node) = self.forest.node_at(v) else {
                continue;
            };
            let par = self.dfs_parent[v];
            let mut k = v;

            // The fake edge from the exit is processed before the real predecessors
            let fake = (self.reverse && self.fake_exit.contains(&node)).then_some(root_number);
            let preds: Vec<usize> = fake
                .into_iter()
                .chain(graph.predecessors(node).map(|pred| self.number_of(pred)))
                .collect();

            for mut k1 in preds {
                if k1 > v {
                    let min = self.eval(k1);
                    k1 = self.key[min];
                }
                if k1 < k {
                    k = k1;
                }
            }
            trace!("semidominator key of {} (dfs {}) is {}", node, v, k);

            self.key[v] = k;
            self.link_roots(par, v);
            self.next_bucket[v] = self.bucket[k];
            self.bucket[k] = v;

            let mut w = self.bucket[par];
            while w != 0 {
                let min = self.eval(w);
                self.dom[w] = if self.key[min] < self.key[w] { min } else { par };
                w = self.next_bucket[w];
            }
            self.bucket[par] = 0;
        }

        for v in 1..=nodes {
            if self.dom[v] != self.key[v] {
                self.dom[v] = self.dom[self.dom[v]];
            }
        }
    }

    /// Compresses the path from `v` to the root of its set, keeping `path_min` current.
    fn compress(&mut self, v: usize) {
        let mut path = Vec::new();
        let mut current = v;
        while self.set_chain[self.set_chain[current]] != 0 {
            path.push(current);
            current = self.set_chain[current];
        }

        for &node in path.iter().rev() {
            let parent = self.set_chain[node];
            if self.key[self.path_min[parent]] < self.key[self.path_min[node]] {
                self.path_min[node] = self.path_min[parent];
            }
            self.set_chain[node] = self.set_chain[parent];
        }
    }

    /// Returns the vertex with the smallest key on the path from `v` to its set root.
    fn eval(&mut self, v: usize) -> usize {
        let mut rep = self.set_chain[v];
        if rep == 0 {
            return self.path_min[v];
        }

        if self.set_chain[rep] != 0 {
            self.compress(v);
            rep = self.set_chain[v];
        }

        if self.key[self.path_min[rep]] >= self.key[self.path_min[v]] {
            self.path_min[v]
        } else {
            self.path_min[rep]
        }
    }

    /// Merges the set of `w` into the set rooted at its DFS parent `v`, rebalancing.
    fn link_roots(&mut self, v: usize, w: usize) {
        let mut s = w;
        while self.key[self.path_min[w]] < self.key[self.path_min[self.set_child[s]]] {
            let child = self.set_child[s];
            if self.set_size[s] + self.set_size[self.set_child[child]] >= 2 * self.set_size[child]
            {
                self.set_chain[child] = s;
                self.set_child[s] = self.set_child[child];
            } else {
                self.set_size[child] = self.set_size[s];
                self.set_chain[s] = child;
                s = child;
            }
        }

        self.path_min[s] = self.path_min[w];
        self.set_size[v] += self.set_size[w];
        if self.set_size[v] < 2 * self.set_size[w] {
            std::mem::swap(&mut s, &mut self.set_child[v]);
        }

        while s != 0 {
            self.set_chain[s] = v;
            s = self.set_child[s];
        }
    }

    fn into_solution(self, direction: DominanceDirection) -> DominanceSolution {
        let bound = self.graph.node_bound();
        let mut idom = vec![None; bound];
        let mut dfs_number = vec![0; bound];

        for (slot, &node) in self.forest.order().iter().enumerate() {
            dfs_number[node.index()] = slot + 1;
            let d = self.dom[slot + 1];
            if let Some(dominator) = self.forest.node_at(d) {
                idom[node.index()] = Some(dominator);
            }
        }
        idom[self.root.index()] = Some(self.root);

        debug!(
            "{:?}: {} vertices numbered, {} fake exit edges",
            direction,
            self.forest.len(),
            self.fake_exit.len()
        );

        DominanceSolution {
            direction,
            root: self.root,
            idom,
            preorder: self.forest.order().to_vec(),
            dfs_number,
            fake_exit: self.fake_exit,
        }
    }
}

/// Builds the reflexive transitive closure of the dominator relation.
///
/// Every immediate dominator precedes the vertices it dominates in DFS order, so one pass
/// by decreasing DFS number folds each vertex's set into its immediate dominator's.
fn dominated_closure(
    root: NodeId,
    idom: &[Option<NodeId>],
    preorder: &[NodeId],
) -> Vec<BTreeSet<NodeId>> {
    let mut sets = vec![BTreeSet::new(); idom.len()];
    for &node in preorder.iter().rev() {
        sets[node.index()].insert(node);
        if node == root {
            continue;
        }
        if let Some(parent) = idom[node.index()] {
            let subtree = std::mem::take(&mut sets[node.index()]);
            sets[parent.index()].extend(subtree.iter().copied());
            sets[node.index()] = subtree;
        }
    }
    sets
}

/// Owned result of a dominance computation.
///
/// The tree is detached from the graph it was computed on, so it can outlive views and
/// be stored next to the collection.
///
/// # Examples
///
/// ```rust
/// use cfgscope::{DominanceDirection, DominanceEngine, GraphCollection, NodeId, Selector};
///
/// // entry -> a -> b, entry -> exit, b -> exit
/// let mut graph: GraphCollection<(), ()> = GraphCollection::new();
/// let entry = graph.add_vertex();
/// let exit = graph.add_vertex();
/// let a = graph.add_vertex();
/// let b = graph.add_vertex();
/// for (s, t) in [(entry, exit), (entry, a), (a, b), (b, exit)] {
///     graph.add_edge(s, t, Selector::CFG)?;
/// }
///
/// let cfg = graph.view(Selector::CFG);
/// let mut engine = DominanceEngine::new(&cfg, entry, exit)?;
/// engine.compute(DominanceDirection::Dominators)?;
/// let tree = engine.into_tree()?;
///
/// assert_eq!(tree.immediate_dominator(b), Some(a));
/// assert_eq!(tree.immediate_dominator(entry), None);
/// assert!(tree.strictly_dominates(entry, exit));
/// assert_eq!(tree.dominators(b).collect::<Vec<NodeId>>(), vec![b, a, entry]);
/// # Ok::<(), cfgscope::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct DominatorTree {
    root: NodeId,
    direction: DominanceDirection,
    /// Immediate dominator per vertex index; the root maps to itself
    idom: Vec<Option<NodeId>>,
    /// Mapped vertices in DFS order
    preorder: Vec<NodeId>,
    children: Vec<Vec<NodeId>>,
    depth: Vec<usize>,
    /// Tree preorder number of each vertex and the largest number in its subtree
    interval: Vec<(usize, usize)>,
    fake_exit: BTreeSet<NodeId>,
    dominated: OnceLock<Vec<BTreeSet<NodeId>>>,
}

impl DominatorTree {
    fn from_solution(solution: DominanceSolution) -> Self {
        let bound = solution.idom.len();
        let mut children = vec![Vec::new(); bound];
        for (i, idom) in solution.idom.iter().enumerate() {
            let node = NodeId::new(i);
            if let Some(parent) = idom.filter(|_| node != solution.root) {
                children[parent.index()].push(node);
            }
        }

        let mut depth = vec![0; bound];
        for &node in &solution.preorder {
            if node == solution.root {
                continue;
            }
            if let Some(parent) = solution.idom[node.index()] {
                depth[node.index()] = depth[parent.index()] + 1;
            }
        }

        let mut interval = vec![(0, 0); bound];
        let mut clock = 0;
        let mut stack = vec![(solution.root, 0)];
        while let Some(top) = stack.last_mut() {
            let (node, next) = *top;
            if let Some(&child) = children[node.index()].get(next) {
                top.1 += 1;
                clock += 1;
                interval[child.index()].0 = clock;
                stack.push((child, 0));
            } else {
                interval[node.index()].1 = clock;
                stack.pop();
            }
        }

        DominatorTree {
            root: solution.root,
            direction: solution.direction,
            idom: solution.idom,
            preorder: solution.preorder,
            children,
            depth,
            interval,
            fake_exit: solution.fake_exit,
            dominated: OnceLock::new(),
        }
    }

    /// Returns the root: the entry for dominators, the exit for post-dominators.
    #[must_use]
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Returns the direction this tree was computed for.
    #[must_use]
    pub fn direction(&self) -> DominanceDirection {
        self.direction
    }

    /// Returns `true` if `node` has a place in the tree.
    #[must_use]
    pub fn contains(&self, node: NodeId) -> bool {
        matches!(self.idom.get(node.index()), Some(Some(_)))
    }

    /// Returns the immediate dominator of `node`, or `None` for the root and for vertices
    /// outside the tree.
    #[must_use]
    pub fn immediate_dominator(&self, node: NodeId) -> Option<NodeId> {
        if node == self.root {
            return None;
        }
        self.idom.get(node.index()).copied().flatten()
    }

    /// Checks if `a` dominates `b`. Every vertex of the tree dominates itself.
    ///
    /// # Complexity
    ///
    /// O(1), a check of tree preorder intervals.
    #[must_use]
    pub fn dominates(&self, a: NodeId, b: NodeId) -> bool {
        if !self.contains(a) || !self.contains(b) {
            return false;
        }
        let (first, last) = self.interval[a.index()];
        (first..=last).contains(&self.interval[b.index()].0)
    }

    /// Checks if `a` dominates `b` and `a != b`.
    #[must_use]
    pub fn strictly_dominates(&self, a: NodeId, b: NodeId) -> bool {
        a != b && self.dominates(a, b)
    }

    /// Returns an iterator over the dominators of `node`, from `node` itself up to the
    /// root. Empty for a vertex outside the tree.
    pub fn dominators(&self, node: NodeId) -> DominatorIterator<'_> {
        DominatorIterator {
            tree: self,
            current: self.contains(node).then_some(node),
        }
    }

    /// Returns the distance of `node` from the root, 0 for the root and for vertices
    /// outside the tree.
    #[must_use]
    pub fn depth(&self, node: NodeId) -> usize {
        self.depth.get(node.index()).copied().unwrap_or(0)
    }

    /// Returns the vertices immediately dominated by `node`, in vertex order.
    #[must_use]
    pub fn children(&self, node: NodeId) -> &[NodeId] {
        self.children.get(node.index()).map_or(&[], Vec::as_slice)
    }

    /// Iterates over the `(idom(v), v)` tree edges in vertex order.
    pub fn tree_edges(&self) -> impl Iterator<Item = (NodeId, NodeId)> + '_ {
        self.idom.iter().enumerate().filter_map(move |(i, idom)| {
            let node = NodeId::new(i);
            idom.filter(|_| node != self.root).map(|parent| (parent, node))
        })
    }

    /// Returns the mapped vertices in DFS order.
    #[must_use]
    pub fn preorder(&self) -> &[NodeId] {
        &self.preorder
    }

    /// Returns the set of vertices dominated by `node`, itself included. The closure is
    /// computed on first use and cached.
    #[must_use]
    pub fn all_dominated(&self, node: NodeId) -> Option<&BTreeSet<NodeId>> {
        if !self.contains(node) {
            return None;
        }
        self.dominated
            .get_or_init(|| dominated_closure(self.root, &self.idom, &self.preorder))
            .get(node.index())
    }

    /// Returns `true` if `node` received a fake edge from the exit during a
    /// post-dominator computation.
    #[must_use]
    pub fn has_fake_exit_edge(&self, node: NodeId) -> bool {
        self.fake_exit.contains(&node)
    }

    /// Returns the vertices that received a fake edge from the exit.
    #[must_use]
    pub fn fake_exit_edges(&self) -> &BTreeSet<NodeId> {
        &self.fake_exit
    }

    /// Computes the dominance frontier of every vertex of the tree.
    ///
    /// `graph` must be the graph the tree was computed on, seen in the tree's direction:
    /// the plain view for dominators, a [`Reversed`] view for post-dominators. The
    /// post-dominance frontier of `w` holds exactly the branches `w` is control dependent
    /// on. Frontiers are indexed by vertex index.
    pub fn dominance_frontiers<G: Predecessors>(&self, graph: &G) -> Vec<BTreeSet<NodeId>> {
        let mut frontiers = vec![BTreeSet::new(); self.idom.len()];

        for &node in &self.preorder {
            let preds: Vec<NodeId> = graph
                .predecessors(node)
                .filter(|&pred| self.contains(pred))
                .collect();
            if preds.len() < 2 {
                continue;
            }

            let idom = self.immediate_dominator(node);
            for pred in preds {
                let mut runner = Some(pred);
                while let Some(current) = runner.filter(|&r| Some(r) != idom) {
                    frontiers[current.index()].insert(node);
                    runner = self.immediate_dominator(current);
                }
            }
        }

        frontiers
    }
}

/// Iterator over the dominators of a vertex, from the vertex up to the root.
pub struct DominatorIterator<'a> {
    tree: &'a DominatorTree,
    current: Option<NodeId>,
}

impl Iterator for DominatorIterator<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.current?;
        self.current = self.tree.immediate_dominator(current);
        Some(current)
    }
}

/// Records the edges of `tree` in `collection` under the tree direction's selector.
///
/// Each `(idom(v), v)` pair ORs [`Selector::DOMINATOR`] or [`Selector::POST_DOMINATOR`]
/// onto the existing record, or creates a new one.
///
/// # Errors
///
/// Returns [`Error::UnknownVertex`] if the tree references a vertex the collection does
/// not hold.
pub fn record_tree_edges<N, E: Default>(
    collection: &mut GraphCollection<N, E>,
    tree: &DominatorTree,
) -> Result<usize> {
    let selector = tree.direction().selector();
    let mut recorded = 0;
    for (parent, node) in tree.tree_edges() {
        collection.ensure_edge(parent, node, selector)?;
        recorded += 1;
    }
    debug!("Recorded {} {:?} tree edges", recorded, tree.direction());
    Ok(recorded)
}
