//! Strongly connected components using Tarjan's algorithm.
//!
//! A strongly connected component is a maximal set of vertices such that there is a path
//! from every vertex to every other vertex in the set. In control flow analysis the
//! non-trivial components are the cyclic regions: irreducible loop detection runs Tarjan
//! restricted to the vertices below a given DJ-graph level to find them.
//!
//! Both entry points share one iterative implementation. The recursion of the textbook
//! formulation is replaced by an explicit frame stack, preserving the exact visitation
//! order of the recursive version.

use std::{collections::BTreeSet, vec};

use crate::utils::graph::{NodeId, Successors};

/// Computes all strongly connected components of a graph.
///
/// Traversal starts from the smallest unvisited vertex, repeatedly, until every vertex has
/// been visited. Components are returned in the order Tarjan's algorithm closes them,
/// which is a reverse topological order of the condensation. The members of a component
/// are listed in stack pop order.
///
/// # Examples
///
/// ```rust
/// use cfgscope::{algorithms::strongly_connected_components, GraphCollection, Selector};
///
/// // a -> b -> c -> a, c -> d
/// let mut graph: GraphCollection<(), ()> = GraphCollection::new();
/// let a = graph.add_vertex();
/// let b = graph.add_vertex();
/// let c = graph.add_vertex();
/// let d = graph.add_vertex();
/// graph.add_edge(a, b, Selector::CFG)?;
/// graph.add_edge(b, c, Selector::CFG)?;
/// graph.add_edge(c, a, Selector::CFG)?;
/// graph.add_edge(c, d, Selector::CFG)?;
///
/// let sccs = strongly_connected_components(&graph.view(Selector::CFG));
/// assert_eq!(sccs.len(), 2);
/// assert_eq!(sccs[0], vec![d]);
/// assert_eq!(sccs[1].len(), 3);
/// # Ok::<(), cfgscope::Error>(())
/// ```
pub fn strongly_connected_components<G>(graph: &G) -> Vec<Vec<NodeId>>
where
    G: Successors,
{
    let mut candidates: BTreeSet<NodeId> = graph.node_ids().collect();
    let mut tarjan = Tarjan::new(graph.node_bound(), true);
    while let Some(&root) = candidates.first() {
        tarjan.run(graph, root, &mut candidates);
    }
    tarjan.components
}

/// Finds the cyclic components among a set of candidate vertices.
///
/// Tarjan's algorithm is started from the smallest remaining candidate until the set is
/// drained. Only candidates are ever entered: edges to vertices outside the set, or to
/// vertices already consumed by an earlier start, are ignored. Every visited vertex is
/// removed from `candidates`.
///
/// A component is reported only if it has at least two members. A single vertex is never
/// reported, even when it carries a self-loop; such loops are handled as reducible loops
/// by the caller.
pub fn components_within<G>(graph: &G, candidates: &mut BTreeSet<NodeId>) -> Vec<Vec<NodeId>>
where
    G: Successors,
{
    let mut tarjan = Tarjan::new(graph.node_bound(), false);
    while let Some(&root) = candidates.first() {
        tarjan.run(graph, root, candidates);
    }
    tarjan.components
}

/// Returns `true` if the graph has no cycle, self-loops included.
pub fn is_acyclic<G>(graph: &G) -> bool
where
    G: Successors,
{
    let has_self_loop = graph
        .node_ids()
        .any(|node| graph.successors(node).any(|succ| succ == node));
    !has_self_loop
        && strongly_connected_components(graph)
            .iter()
            .all(|component| component.len() == 1)
}

/// Unvisited marker for the discovery index.
const UNVISITED: usize = usize::MAX;

/// Internal state for Tarjan's algorithm.
struct Tarjan {
    /// Discovery index per vertex
    index: Vec<usize>,
    /// Lowlink value per vertex
    lowlink: Vec<usize>,
    /// Whether a vertex is currently on the component stack
    on_stack: Vec<bool>,
    /// Component stack
    stack: Vec<NodeId>,
    /// Next discovery index
    counter: usize,
    /// Whether single-vertex components are reported
    report_trivial: bool,
    /// Closed components
    components: Vec<Vec<NodeId>>,
}

impl Tarjan {
    fn new(node_bound: usize, report_trivial: bool) -> Self {
        Tarjan {
            index: vec![UNVISITED; node_bound],
            lowlink: vec![0; node_bound],
            on_stack: vec![false; node_bound],
            stack: Vec::new(),
            counter: 0,
            report_trivial,
            components: Vec::new(),
        }
    }

    fn enter<G: Successors>(
        &mut self,
        graph: &G,
        node: NodeId,
        candidates: &mut BTreeSet<NodeId>,
    ) -> (NodeId, vec::IntoIter<NodeId>) {
        let i = node.index();
        self.index[i] = self.counter;
        self.lowlink[i] = self.counter;
        self.counter += 1;
        self.stack.push(node);
        self.on_stack[i] = true;
        candidates.remove(&node);
        (node, graph.successors(node).collect::<Vec<_>>().into_iter())
    }

    fn run<G: Successors>(&mut self, graph: &G, root: NodeId, candidates: &mut BTreeSet<NodeId>) {
        if root.index() >= self.index.len() {
            candidates.remove(&root);
            return;
        }

        let mut frames = vec![self.enter(graph, root, candidates)];
        while let Some((node, successors)) = frames.last_mut() {
            let node = *node;
            match successors.next() {
                Some(target) if candidates.contains(&target) => {
                    let frame = self.enter(graph, target, candidates);
                    frames.push(frame);
                }
                Some(target) => {
                    if self.on_stack.get(target.index()) == Some(&true) {
                        let i = node.index();
                        self.lowlink[i] = self.lowlink[i].min(self.index[target.index()]);
                    }
                }
                None => {
                    frames.pop();
                    self.close(node);
                    if let Some((parent, _)) = frames.last() {
                        let p = parent.index();
                        self.lowlink[p] = self.lowlink[p].min(self.lowlink[node.index()]);
                    }
                }
            }
        }
    }

    fn close(&mut self, node: NodeId) {
        let i = node.index();
        if self.lowlink[i] != self.index[i] {
            return;
        }

        if self.stack.last() == Some(&node) {
            self.stack.pop();
            self.on_stack[i] = false;
            if self.report_trivial {
                self.components.push(vec![node]);
            }
            return;
        }

        let mut component = Vec::new();
        while let Some(member) = self.stack.pop() {
            self.on_stack[member.index()] = false;
            component.push(member);
            if member == node {
                break;
            }
        }
        self.components.push(component);
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use crate::utils::graph::{
        algorithms::{components_within, is_acyclic, strongly_connected_components},
        GraphCollection, NodeId, Selector,
    };

    fn build(count: usize, edges: &[(usize, usize)]) -> (GraphCollection<(), ()>, Vec<NodeId>) {
        let mut graph = GraphCollection::new();
        let nodes: Vec<NodeId> = (0..count).map(|_| graph.add_vertex()).collect();
        for &(s, t) in edges {
            graph.add_edge(nodes[s], nodes[t], Selector::CFG).unwrap();
        }
        (graph, nodes)
    }

    #[test]
    fn test_scc_empty_graph() {
        let graph: GraphCollection<(), ()> = GraphCollection::new();
        assert!(strongly_connected_components(&graph.view(Selector::CFG)).is_empty());
    }

    #[test]
    fn test_scc_dag_is_all_singletons() {
        let (graph, _) = build(4, &[(0, 1), (0, 2), (1, 3), (2, 3)]);
        let sccs = strongly_connected_components(&graph.view(Selector::CFG));
        assert_eq!(sccs.len(), 4);
        assert!(sccs.iter().all(|c| c.len() == 1));
        assert!(is_acyclic(&graph.view(Selector::CFG)));
    }

    #[test]
    fn test_scc_two_cycles() {
        // {0,1} and {2,3}, connected 1 -> 2
        let (graph, n) = build(4, &[(0, 1), (1, 0), (1, 2), (2, 3), (3, 2)]);
        let sccs = strongly_connected_components(&graph.view(Selector::CFG));
        assert_eq!(sccs.len(), 2);
        assert_eq!(sccs[0], vec![n[3], n[2]]);
        assert_eq!(sccs[1], vec![n[1], n[0]]);
        assert!(!is_acyclic(&graph.view(Selector::CFG)));
    }

    #[test]
    fn test_self_loop_is_not_acyclic() {
        let (graph, _) = build(2, &[(0, 1), (1, 1)]);
        assert!(!is_acyclic(&graph.view(Selector::CFG)));
    }

    #[test]
    fn test_components_within_restricts_to_candidates() {
        // 0 -> 1 -> 2 -> 1, 2 -> 3 -> 0
        let (graph, n) = build(4, &[(0, 1), (1, 2), (2, 1), (2, 3), (3, 0)]);
        let view = graph.view(Selector::CFG);

        // with everything the whole graph is one component
        let mut all: BTreeSet<NodeId> = n.iter().copied().collect();
        let found = components_within(&view, &mut all);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].len(), 4);
        assert!(all.is_empty());

        // without 3 only the inner cycle remains
        let mut some: BTreeSet<NodeId> = [n[1], n[2]].into_iter().collect();
        let found = components_within(&view, &mut some);
        assert_eq!(found, vec![vec![n[2], n[1]]]);
        assert!(some.is_empty());
    }

    #[test]
    fn test_components_within_skips_trivial() {
        let (graph, n) = build(3, &[(0, 0), (0, 1), (1, 2)]);
        let mut candidates: BTreeSet<NodeId> = n.iter().copied().collect();
        assert!(components_within(&graph.view(Selector::CFG), &mut candidates).is_empty());
        assert!(candidates.is_empty());
    }
}
