//! Graph algorithms for control-flow analysis.
//!
//! Every algorithm here is generic over the traits of [`crate::utils::graph`], so it runs
//! unchanged on selector views, subgraph views and reversed views.
//!
//! # Available Algorithms
//!
//! ## Traversal
//!
//! - [`dfs`] - Depth-first pre-order iterator
//! - [`PreorderForest`] - Pre-order numbering with tree parents across several roots
//!
//! ## Dominator Analysis
//!
//! - [`DominanceEngine`] - Lengauer-Tarjan dominators and post-dominators
//! - [`DominatorTree`] - Owned result with dominance queries and frontiers
//! - [`record_tree_edges`] - Stores tree edges back into a collection under a selector
//!
//! ## Strongly Connected Components
//!
//! - [`strongly_connected_components`] - Tarjan's SCC algorithm
//! - [`components_within`] - Cyclic components restricted to a candidate set
//! - [`is_acyclic`] - Cycle check
//!
//! # Algorithm Selection
//!
//! | Algorithm | Time Complexity | Use Case |
//! |-----------|-----------------|----------|
//! | DFS | O(V + E) | Reachability, DJ-graph levels |
//! | Dominators | O(E α(E, V)) | Loop analysis, control dependence |
//! | Dominance frontiers | O(V + E + \|DF\|) | Control dependence |
//! | SCC | O(V + E) | Irreducible loop detection |
//!
//! # Examples
//!
//! ```rust
//! use cfgscope::{algorithms, GraphCollection, NodeId, Selector};
//!
//! let mut graph: GraphCollection<(), ()> = GraphCollection::new();
//! let a = graph.add_vertex();
//! let b = graph.add_vertex();
//! let c = graph.add_vertex();
//! graph.add_edge(a, b, Selector::CFG)?;
//! graph.add_edge(b, c, Selector::CFG)?;
//! graph.add_edge(c, b, Selector::CFG)?;
//!
//! let cfg = graph.view(Selector::CFG);
//! let order: Vec<NodeId> = algorithms::dfs(&cfg, a).collect();
//! assert_eq!(order, vec![a, b, c]);
//! assert!(!algorithms::is_acyclic(&cfg));
//! # Ok::<(), cfgscope::Error>(())
//! ```

mod dominators;
mod scc;
mod traversal;

pub use dominators::{
    record_tree_edges, DominanceDirection, DominanceEngine, DominanceState, DominatorIterator,
    DominatorTree,
};
pub use scc::{components_within, is_acyclic, strongly_connected_components};
pub use traversal::{dfs, DfsIterator, PreorderForest};
