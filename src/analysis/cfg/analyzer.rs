//! Per-function analysis driver.
//!
//! [`FunctionAnalysis::run`] chains the analyses of one function in their fixed order
//! and hands back the owned results. [`analyze_functions`] does the same for many
//! independent functions on the rayon thread pool.

use log::debug;
use rayon::prelude::*;

use crate::{
    analysis::cfg::{record_join_edges, ControlFlowGraph, LoopForest},
    config::AnalysisConfig,
    utils::graph::algorithms::{
        record_tree_edges, DominanceDirection, DominanceEngine, DominatorTree,
    },
    Result,
};

/// Dominance and loop results of one function.
///
/// The results own their data, so the function's graph can be mutated again once the
/// analysis returns. Any structural change makes them stale; run the analysis again.
#[derive(Debug, Clone)]
pub struct FunctionAnalysis {
    dominators: DominatorTree,
    post_dominators: DominatorTree,
    loops: LoopForest,
}

impl FunctionAnalysis {
    /// Analyses one function.
    ///
    /// Stages, in order:
    /// 1. dominators and post-dominators over the full control flow view
    /// 2. recording of the tree edges, if enabled
    /// 3. the loop forest
    /// 4. recording of the join edges, if enabled
    /// 5. control dependences and feedback edge splitting, if enabled
    /// 6. loop forest verification, if enabled
    ///
    /// # Errors
    ///
    /// Fails with the first error of any stage. A block unreachable from ENTRY makes
    /// the graph malformed; call [`ControlFlowGraph::finalize`] before analysing.
    pub fn run(cfg: &mut ControlFlowGraph, config: &AnalysisConfig) -> Result<Self> {
        let entry = cfg.entry();
        let exit = cfg.exit();

        let (dominators, post_dominators, loops) = {
            let view = cfg.full_cfg_view();

            let mut engine = DominanceEngine::new(&view, entry, exit)?;
            engine.compute(DominanceDirection::Dominators)?;
            let dominators = engine.into_tree()?;

            let mut engine = DominanceEngine::new(&view, entry, exit)?;
            engine.compute(DominanceDirection::PostDominators)?;
            let post_dominators = engine.into_tree()?;

            let loops = LoopForest::new(&view, entry, &dominators, &post_dominators)?;
            (dominators, post_dominators, loops)
        };

        if config.record_tree_edges {
            record_tree_edges(cfg.graph_mut(), &dominators)?;
            record_tree_edges(cfg.graph_mut(), &post_dominators)?;
        }
        if config.record_join_edges {
            record_join_edges(cfg.graph_mut(), &loops)?;
        }
        if config.compute_control_dependences {
            cfg.compute_control_dependences(&post_dominators)?;
        }
        if config.split_feedback_edges {
            cfg.split_feedback_edges(&loops)?;
        }
        if config.verify_loops {
            loops.verify()?;
        }

        debug!(
            "Analysed function with {} blocks: {} loops",
            cfg.block_count(),
            loops.len() - 1
        );

        Ok(FunctionAnalysis {
            dominators,
            post_dominators,
            loops,
        })
    }

    /// Returns the dominator tree.
    #[must_use]
    pub fn dominators(&self) -> &DominatorTree {
        &self.dominators
    }

    /// Returns the post-dominator tree.
    #[must_use]
    pub fn post_dominators(&self) -> &DominatorTree {
        &self.post_dominators
    }

    /// Returns the loop nesting forest.
    #[must_use]
    pub fn loops(&self) -> &LoopForest {
        &self.loops
    }

    /// Splits the analysis into its parts.
    #[must_use]
    pub fn into_parts(self) -> (DominatorTree, DominatorTree, LoopForest) {
        (self.dominators, self.post_dominators, self.loops)
    }
}

/// Analyses independent functions in parallel.
///
/// Each function is analysed on its own, so one malformed function does not affect the
/// others. Results come back in input order.
pub fn analyze_functions(
    functions: &mut [ControlFlowGraph],
    config: &AnalysisConfig,
) -> Vec<Result<FunctionAnalysis>> {
    functions
        .par_iter_mut()
        .map(|cfg| FunctionAnalysis::run(cfg, config))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        analysis::cfg::{CfgEdgeKind, LoopId},
        utils::graph::{Selector, Successors},
        Error,
    };

    /// entry -> h, h -> h, h -> exit
    fn self_loop() -> ControlFlowGraph {
        let mut cfg = ControlFlowGraph::new();
        let h = cfg.add_block(2).unwrap();
        cfg.add_unconditional_edge(cfg.entry(), h).unwrap();
        cfg.add_edge(h, h, CfgEdgeKind::ConditionalTrue).unwrap();
        cfg.add_edge(h, cfg.exit(), CfgEdgeKind::ConditionalFalse)
            .unwrap();
        cfg
    }

    #[test]
    fn test_run_records_requested_selectors() {
        let mut cfg = self_loop();
        let analysis = FunctionAnalysis::run(&mut cfg, &AnalysisConfig::default()).unwrap();

        assert_eq!(analysis.loops().len(), 2);
        let h = cfg.node(2).unwrap();
        assert_eq!(analysis.dominators().immediate_dominator(h), Some(cfg.entry()));
        assert_eq!(analysis.post_dominators().immediate_dominator(h), Some(cfg.exit()));

        assert!(cfg.view(Selector::DOMINATOR).edge_count() > 0);
        assert!(cfg.view(Selector::POST_DOMINATOR).edge_count() > 0);
        let dj = cfg.view(Selector::DJ);
        assert!(dj.successors(h).any(|s| s == h));
    }

    #[test]
    fn test_run_minimal_leaves_graph_untouched() {
        let mut cfg = self_loop();
        let edges = cfg.graph().edge_count();
        FunctionAnalysis::run(&mut cfg, &AnalysisConfig::minimal()).unwrap();
        assert_eq!(cfg.graph().edge_count(), edges);
        assert_eq!(cfg.view(Selector::DJ).edge_count(), 0);
    }

    #[test]
    fn test_run_full_splits_feedback() {
        let mut cfg = self_loop();
        let analysis = FunctionAnalysis::run(&mut cfg, &AnalysisConfig::full()).unwrap();
        let h = cfg.node(2).unwrap();

        assert_eq!(cfg.view(Selector::FEEDBACK_CFG).edge_count(), 1);
        assert!(!cfg.cfg_view().successors(h).any(|s| s == h));
        assert!(cfg.view(Selector::CDG).successors(h).any(|s| s == h));
        let lp = analysis.loops().loop_by_id(LoopId::new(1)).unwrap();
        assert_eq!(lp.header(), Some(h));
    }

    #[test]
    fn test_run_rejects_unreachable_block() {
        let mut cfg = self_loop();
        let a = cfg.add_block(3).unwrap();
        let b = cfg.add_block(4).unwrap();
        cfg.add_unconditional_edge(a, b).unwrap();
        cfg.add_unconditional_edge(b, a).unwrap();
        assert!(matches!(
            FunctionAnalysis::run(&mut cfg, &AnalysisConfig::default()),
            Err(Error::MalformedGraph { .. })
        ));
    }

    #[test]
    fn test_analyze_functions_in_parallel() {
        let mut functions: Vec<ControlFlowGraph> = (0..8)
            .map(|i| if i % 2 == 0 { self_loop() } else { ControlFlowGraph::new() })
            .collect();
        let results = analyze_functions(&mut functions, &AnalysisConfig::default());

        assert_eq!(results.len(), 8);
        for (i, result) in results.iter().enumerate() {
            let expected = if i % 2 == 0 { 2 } else { 1 };
            assert_eq!(result.as_ref().unwrap().loops().len(), expected);
        }
    }
}
