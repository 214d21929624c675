//! Multi-view graph infrastructure for control-flow analysis.
//!
//! A function's control flow graph, dominator tree, post-dominator tree, DJ-graph and
//! control dependence graph all share one vertex set and largely overlap in their edges.
//! Instead of keeping separate containers, this module stores every edge once in a
//! [`GraphCollection`] and records the logical graphs it belongs to as [`Selector`] bits.
//!
//! # Architecture
//!
//! - **Core Types**: [`NodeId`], [`EdgeId`], [`Selector`] and [`GraphCollection`] form the
//!   owning store
//! - **Views**: [`GraphView`] filters the store by selector and optional vertex subset,
//!   [`Reversed`] flips edge directions
//! - **Traits**: [`GraphBase`], [`Successors`], [`Predecessors`] and [`RootedGraph`] let the
//!   algorithms run on views, reversed views and ad-hoc graphs alike
//! - **Algorithms**: traversal, strongly connected components and Lengauer-Tarjan
//!   dominance in [`algorithms`]
//!
//! # Design Principles
//!
//! ## Strongly-Typed Identifiers
//!
//! Vertex and edge identifiers are newtypes. DFS numbers, loop ids and block numbers are
//! plain integers elsewhere in the crate and cannot be confused with them.
//!
//! ## Single Edge Per Pair
//!
//! At most one edge record exists for an ordered vertex pair. Adding the dominator tree
//! edge `a -> b` when the control flow edge `a -> b` already exists only ORs the
//! [`Selector::DOMINATOR`] bit onto that record.
//!
//! ## Deterministic Iteration
//!
//! Adjacency lists keep insertion order, and all views iterate in that order. Every
//! algorithm result in the crate is a pure function of the construction sequence.
//!
//! # Usage Examples
//!
//! ```rust
//! use cfgscope::{GraphCollection, NodeId, Selector, Successors};
//!
//! // Diamond: a -> b, a -> c, b -> d, c -> d
//! let mut graph: GraphCollection<&str, ()> = GraphCollection::new();
//! let a = graph.add_vertex_with("a");
//! let b = graph.add_vertex_with("b");
//! let c = graph.add_vertex_with("c");
//! let d = graph.add_vertex_with("d");
//! graph.add_edge(a, b, Selector::CFG)?;
//! graph.add_edge(a, c, Selector::CFG)?;
//! graph.add_edge(b, d, Selector::CFG)?;
//! graph.add_edge(c, d, Selector::CFG)?;
//!
//! let cfg = graph.view(Selector::CFG);
//! let succ: Vec<NodeId> = cfg.successors(a).collect();
//! assert_eq!(succ, vec![b, c]);
//! # Ok::<(), cfgscope::Error>(())
//! ```
//!
//! # Thread Safety
//!
//! All types in this module are [`Send`] and [`Sync`] when their payload types are.

mod collection;
mod edge;
mod node;
mod reversed;
mod selector;
mod traits;
mod view;

pub mod algorithms;

pub use collection::GraphCollection;
pub use edge::{EdgeId, EdgeRef};
pub use node::NodeId;
pub use reversed::Reversed;
pub use selector::Selector;
pub use traits::{GraphBase, Predecessors, RootedGraph, Successors};
pub use view::GraphView;
