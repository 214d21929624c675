//! # cfgscope Prelude
//!
//! This module provides a convenient prelude for the most commonly used types and traits
//! from the cfgscope library. Import this module to get quick access to the essential
//! types for control-flow analysis.

// ================================================================================================
// Core Types and Error Handling
// ================================================================================================

/// The main error type for all cfgscope operations
pub use crate::Error;

/// The result type used throughout cfgscope
pub use crate::Result;

/// Optional stages of the per-function analysis
pub use crate::analysis::AnalysisConfig;

// ================================================================================================
// Graph Substrate
// ================================================================================================

/// Owning arena and selector views
pub use crate::{GraphCollection, GraphView, Reversed, Selector};

/// Vertex and edge handles
pub use crate::{EdgeId, EdgeRef, NodeId};

/// Traversal traits implemented by every graph view
pub use crate::{GraphBase, Predecessors, RootedGraph, Successors};

// ================================================================================================
// Dominance
// ================================================================================================

/// Lengauer-Tarjan dominance engine and its owned result
pub use crate::{DominanceDirection, DominanceEngine, DominanceState, DominatorTree};

// ================================================================================================
// Control Flow and Loops
// ================================================================================================

/// Per-function control flow graph
pub use crate::analysis::{BasicBlock, CfgEdgeKind, CfgEdgeLabel, ControlFlowGraph};

/// Loop nesting forest
pub use crate::analysis::{JoinEdge, JoinKind, Loop, LoopForest, LoopId};

/// Analysis drivers
pub use crate::analysis::{analyze_functions, FunctionAnalysis};
