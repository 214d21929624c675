// Copyright 2025 Johann Kempter
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![doc(html_no_source)]
#![deny(missing_docs)]
#![deny(unsafe_code)]

//! # cfgscope
//!
//! Control-flow analysis core for high-level synthesis. `cfgscope` keeps every graph of a
//! function in one arena and answers the structural questions scheduling and binding
//! passes ask: who dominates whom, where the loops are, how they nest, and which blocks
//! control which.
//!
//! ## Features
//!
//! - **Multi-view graphs** - One edge record per vertex pair, tagged with selector bits;
//!   the control flow graph, dominator tree, DJ-graph and control dependence graph are
//!   views over the same records
//! - **Dominance** - Lengauer-Tarjan dominators and post-dominators, with synthetic exit
//!   edges for blocks that never reach the exit
//! - **Loop nesting forest** - Reducible and irreducible loops found on the DJ-graph,
//!   nested under a zero loop spanning the function
//! - **Deterministic** - Numbering and loop ids depend only on insertion order
//! - **Parallel** - Independent functions are analysed on the rayon thread pool
//!
//! ## Quick Start
//!
//! ```rust
//! use cfgscope::prelude::*;
//!
//! // entry -> h, h -> h, h -> exit
//! let mut cfg = ControlFlowGraph::new();
//! let h = cfg.add_block(2)?;
//! cfg.add_unconditional_edge(cfg.entry(), h)?;
//! cfg.add_edge(h, h, CfgEdgeKind::ConditionalTrue)?;
//! cfg.add_edge(h, cfg.exit(), CfgEdgeKind::ConditionalFalse)?;
//!
//! let analysis = FunctionAnalysis::run(&mut cfg, &AnalysisConfig::default())?;
//! let lp = analysis.loops().loop_for(h).unwrap();
//! assert_eq!(lp.header(), Some(h));
//! assert_eq!(lp.depth(), 1);
//! # Ok::<(), cfgscope::Error>(())
//! ```
//!
//! ## Working on Raw Graphs
//!
//! The algorithms are generic over the graph traits, so they also run directly on a
//! [`GraphCollection`] view:
//!
//! ```rust
//! use cfgscope::{DominanceDirection, DominanceEngine, GraphCollection, Selector};
//!
//! let mut graph: GraphCollection<(), ()> = GraphCollection::new();
//! let entry = graph.add_vertex();
//! let exit = graph.add_vertex();
//! let a = graph.add_vertex();
//! graph.add_edge(entry, a, Selector::CFG)?;
//! graph.add_edge(a, exit, Selector::CFG)?;
//!
//! let view = graph.view(Selector::CFG);
//! let mut engine = DominanceEngine::new(&view, entry, exit)?;
//! engine.compute(DominanceDirection::PostDominators)?;
//! assert_eq!(engine.immediate_dominator(a)?, exit);
//! # Ok::<(), cfgscope::Error>(())
//! ```
//!
//! ## Error Handling
//!
//! Every fallible operation returns [`Result`]. The errors describe contract violations
//! by the producer of the graph and are never retried internally.
//!
//! ## Logging
//!
//! The crate logs through the [`log`] facade: `debug` for per-function milestones,
//! `trace` for individual algorithm steps. Install any logger to see them.

#[macro_use]
pub(crate) mod error;

pub(crate) mod config;
pub(crate) mod utils;

/// Convenient re-exports of the most commonly used types and traits.
///
/// # Example
///
/// ```rust
/// use cfgscope::prelude::*;
///
/// let mut cfg = ControlFlowGraph::new();
/// let a = cfg.add_block(2)?;
/// cfg.finalize()?;
/// let analysis = FunctionAnalysis::run(&mut cfg, &AnalysisConfig::minimal())?;
/// assert_eq!(analysis.dominators().immediate_dominator(a), Some(cfg.entry()));
/// # Ok::<(), cfgscope::Error>(())
/// ```
pub mod prelude;

/// Control flow graphs, loop forests and the per-function analysis driver
///
/// # Key Types
///
/// - [`analysis::ControlFlowGraph`] - Blocks and labelled branches of one function
/// - [`analysis::LoopForest`] - Loop nesting forest built on the DJ-graph
/// - [`analysis::FunctionAnalysis`] - Dominance and loop results of one function
/// - [`analysis::AnalysisConfig`] - Optional stages of the driver
pub mod analysis;

/// `cfgscope` Result type
///
/// A type alias for `std::result::Result<T, Error>` where the error type is always
/// [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// `cfgscope` Error type
///
/// Every variant describes a contract violation by the producer of a graph.
pub use error::Error;

/// Graph substrate: the owning arena, selector views and the traversal traits
pub use utils::graph::{
    EdgeId, EdgeRef, GraphBase, GraphCollection, GraphView, NodeId, Predecessors, Reversed,
    RootedGraph, Selector, Successors,
};

/// Generic graph algorithms: traversal, dominance and strongly connected components
pub use utils::graph::algorithms;

/// Dominance analysis
pub use utils::graph::algorithms::{
    record_tree_edges, DominanceDirection, DominanceEngine, DominanceState, DominatorTree,
};
