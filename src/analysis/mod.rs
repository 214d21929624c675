//! Control-flow analysis for high-level synthesis.
//!
//! This module provides the analyses HLS scheduling and binding passes rely on. It
//! builds upon the generic graph infrastructure in [`crate::utils::graph`] and adds the
//! function-level view: blocks, branch labels, loops and control dependence.
//!
//! # Architecture
//!
//! The analysis module is organized into focused sub-modules:
//!
//! - [`cfg`] - Control Flow Graph construction, loop forest and the per-function driver
//!
//! # Usage
//!
//! ```rust
//! use cfgscope::analysis::{AnalysisConfig, CfgEdgeKind, ControlFlowGraph, FunctionAnalysis};
//!
//! let mut cfg = ControlFlowGraph::new();
//! let a = cfg.add_block(2)?;
//! let b = cfg.add_block(3)?;
//! cfg.add_edge(a, b, CfgEdgeKind::ConditionalTrue)?;
//! cfg.add_edge(a, cfg.exit(), CfgEdgeKind::ConditionalFalse)?;
//!
//! // Connect `a` to ENTRY and `b` to EXIT
//! cfg.finalize()?;
//!
//! let analysis = FunctionAnalysis::run(&mut cfg, &AnalysisConfig::default())?;
//! assert!(analysis.dominators().dominates(a, b));
//! assert!(analysis.loops().is_empty());
//! # Ok::<(), cfgscope::Error>(())
//! ```

pub mod cfg;

// Re-export primary types at module level
pub use crate::config::AnalysisConfig;
pub use cfg::{
    analyze_functions, record_join_edges, BasicBlock, CfgEdgeKind, CfgEdgeLabel,
    ControlFlowGraph, FunctionAnalysis, JoinEdge, JoinKind, Loop, LoopForest, LoopId,
    ENTRY_BLOCK, EXIT_BLOCK,
};
