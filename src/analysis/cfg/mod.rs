//! Control Flow Graph (CFG) construction and analysis.
//!
//! This module provides the per-function control flow graph handed over by the front
//! end, and the analyses HLS passes consume: dominance, the loop nesting forest and
//! control dependence.
//!
//! # Architecture
//!
//! The CFG builds upon the generic [`crate::utils::graph::GraphCollection`]. Control flow
//! edges carry the `CFG` selector; analysis results are recorded as further selector
//! bits on the same records, so `cfg.view(Selector::DJ)` or `cfg.view(Selector::CDG)`
//! reads a derived graph without copying anything.
//!
//! # Key Components
//!
//! - [`ControlFlowGraph`] - Blocks, labelled branches and the synthetic ENTRY/EXIT
//! - [`CfgEdgeLabel`] / [`CfgEdgeKind`] - Branch kinds carried by control flow edges
//! - [`LoopForest`] / [`Loop`] - Reducible and irreducible loops nested under the zero
//!   loop
//! - [`FunctionAnalysis`] - Runs every stage for one function
//! - [`analyze_functions`] - Runs many functions in parallel
//!
//! # Examples
//!
//! ```rust
//! use cfgscope::{
//!     analysis::{AnalysisConfig, CfgEdgeKind, ControlFlowGraph, FunctionAnalysis},
//!     Selector,
//! };
//!
//! // entry -> head, head -> {body, exit}, body -> head
//! let mut cfg = ControlFlowGraph::new();
//! let head = cfg.add_block(2)?;
//! let body = cfg.add_block(3)?;
//! cfg.add_unconditional_edge(cfg.entry(), head)?;
//! cfg.add_edge(head, body, CfgEdgeKind::ConditionalTrue)?;
//! cfg.add_edge(head, cfg.exit(), CfgEdgeKind::ConditionalFalse)?;
//! cfg.add_unconditional_edge(body, head)?;
//!
//! let analysis = FunctionAnalysis::run(&mut cfg, &AnalysisConfig::default())?;
//!
//! let lp = analysis.loops().loop_for(body).unwrap();
//! assert_eq!(lp.header(), Some(head));
//! assert_eq!(lp.landing_pads().iter().copied().collect::<Vec<_>>(), vec![cfg.exit()]);
//! assert!(analysis.dominators().dominates(head, body));
//! assert!(cfg.view(Selector::JOIN).edge_count() > 0);
//! # Ok::<(), cfgscope::Error>(())
//! ```
//!
//! # Thread Safety
//!
//! All types here are [`Send`] and [`Sync`]. Analysis results own their data and never
//! borrow the graph, so independent functions can be analysed concurrently.

mod analyzer;
mod edge;
mod graph;
mod loops;

pub use analyzer::{analyze_functions, FunctionAnalysis};
pub use edge::{CfgEdgeKind, CfgEdgeLabel};
pub use graph::{BasicBlock, ControlFlowGraph, ENTRY_BLOCK, EXIT_BLOCK};
pub use loops::{record_join_edges, JoinEdge, JoinKind, Loop, LoopForest, LoopId};
