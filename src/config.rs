//! Analysis configuration
//!
//! The dominance and loop algorithms themselves are not configurable. This module only
//! gates the optional stages of the per-function driver, [`FunctionAnalysis`], and
//! whether results are written back into the graph collection.
//!
//! [`FunctionAnalysis`]: crate::analysis::FunctionAnalysis

/// Configuration for the per-function analysis driver
///
/// Dominators, post-dominators and the loop forest are always computed. The flags
/// below decide which results are recorded as selector bits on the function's graph
/// collection and which follow-up passes run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(clippy::struct_excessive_bools)]
pub struct AnalysisConfig {
    /// Record dominator and post-dominator tree edges under `DOMINATOR` and
    /// `POST_DOMINATOR`
    pub record_tree_edges: bool,

    /// Record the DJ-graph join edges under `JOIN`
    pub record_join_edges: bool,

    /// Add control dependence edges under `CDG`
    pub compute_control_dependences: bool,

    /// Move spanning-tree back edges from `CFG` to `FEEDBACK_CFG`, leaving the `CFG` view
    /// acyclic
    pub split_feedback_edges: bool,

    /// Check the loop forest invariants after construction
    pub verify_loops: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            record_tree_edges: true,
            record_join_edges: true,
            compute_control_dependences: false,
            split_feedback_edges: false,
            verify_loops: cfg!(debug_assertions),
        }
    }
}

impl AnalysisConfig {
    /// Creates a configuration that leaves the graph collection untouched
    ///
    /// Only the dominance trees and the loop forest are produced.
    #[must_use]
    pub fn minimal() -> Self {
        Self {
            record_tree_edges: false,
            record_join_edges: false,
            compute_control_dependences: false,
            split_feedback_edges: false,
            verify_loops: false,
        }
    }

    /// Creates a configuration running every stage, verification included
    #[must_use]
    pub fn full() -> Self {
        Self {
            record_tree_edges: true,
            record_join_edges: true,
            compute_control_dependences: true,
            split_feedback_edges: true,
            verify_loops: true,
        }
    }
}
