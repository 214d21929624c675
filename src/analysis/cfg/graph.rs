//! Control Flow Graph implementation.
//!
//! This module provides [`ControlFlowGraph`], the per-function container the front end
//! fills with basic blocks and labelled branches. It owns the function's
//! [`GraphCollection`], so every analysis result recorded later (dominator trees,
//! join edges, control dependences) lives next to the control flow edges it was
//! derived from.

use std::collections::BTreeSet;

use log::{debug, trace};
use rustc_hash::FxHashMap;

use crate::{
    analysis::cfg::{CfgEdgeKind, CfgEdgeLabel, LoopForest},
    utils::graph::{
        algorithms::{dfs, DominanceDirection, DominatorTree},
        EdgeId, GraphCollection, GraphView, NodeId, Selector,
    },
    Result,
};

/// Block number of the synthetic function entry.
pub const ENTRY_BLOCK: u32 = 0;

/// Block number of the synthetic function exit.
pub const EXIT_BLOCK: u32 = 1;

/// Vertex payload of a control flow graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BasicBlock {
    number: u32,
}

impl BasicBlock {
    /// Returns the front end's block number.
    #[must_use]
    pub const fn number(&self) -> u32 {
        self.number
    }

    /// Returns `true` for the synthetic entry block.
    #[must_use]
    pub const fn is_entry(&self) -> bool {
        self.number == ENTRY_BLOCK
    }

    /// Returns `true` for the synthetic exit block.
    #[must_use]
    pub const fn is_exit(&self) -> bool {
        self.number == EXIT_BLOCK
    }
}

/// Control flow graph of one function.
///
/// A fresh graph holds the synthetic ENTRY and EXIT blocks joined by an ENTRY -> EXIT
/// edge, which keeps the exit reachable and gives post-dominance a root even for
/// functions that never return.
///
/// # Examples
///
/// ```rust
/// use cfgscope::analysis::{CfgEdgeKind, ControlFlowGraph};
///
/// let mut cfg = ControlFlowGraph::new();
/// let head = cfg.add_block(2)?;
/// let body = cfg.add_block(3)?;
///
/// cfg.add_edge(cfg.entry(), head, CfgEdgeKind::ConditionalTrue)?;
/// cfg.add_edge(head, body, CfgEdgeKind::ConditionalTrue)?;
/// cfg.add_unconditional_edge(body, head)?;
/// cfg.add_edge(head, cfg.exit(), CfgEdgeKind::ConditionalFalse)?;
/// cfg.finalize()?;
///
/// assert_eq!(cfg.block_count(), 4);
/// assert!(cfg.unreachable_blocks().is_empty());
/// # Ok::<(), cfgscope::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct ControlFlowGraph {
    graph: GraphCollection<BasicBlock, CfgEdgeLabel>,
    entry: NodeId,
    exit: NodeId,
    by_number: FxHashMap<u32, NodeId>,
}

impl Default for ControlFlowGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl ControlFlowGraph {
    /// Creates a graph holding only ENTRY, EXIT and the ENTRY -> EXIT edge.
    #[must_use]
    pub fn new() -> Self {
        let mut graph = GraphCollection::new();
        let entry = graph.add_vertex_with(BasicBlock {
            number: ENTRY_BLOCK,
        });
        let exit = graph.add_vertex_with(BasicBlock { number: EXIT_BLOCK });
        graph.push_edge(entry, exit, Selector::CFG, CfgEdgeLabel::unconditional());

        let mut by_number = FxHashMap::default();
        by_number.insert(ENTRY_BLOCK, entry);
        by_number.insert(EXIT_BLOCK, exit);

        ControlFlowGraph {
            graph,
            entry,
            exit,
            by_number,
        }
    }

    /// Adds a basic block with the front end's block number.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::MalformedGraph`] if a block with this number exists,
    /// including the reserved ENTRY and EXIT numbers.
    pub fn add_block(&mut self, number: u32) -> Result<NodeId> {
        if let Some(existing) = self.by_number.get(&number) {
            return Err(malformed_error!(
                "Block {} already exists as {}",
                number,
                existing
            ));
        }
        let node = self.graph.add_vertex_with(BasicBlock { number });
        self.by_number.insert(number, node);
        trace!("Added block {} as {}", number, node);
        Ok(node)
    }

    /// Adds a control flow edge of the given kind.
    ///
    /// Adding a second edge between the same blocks merges the kinds into the existing
    /// label, as happens when several switch cases share a target.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::UnknownVertex`] if either block does not exist.
    pub fn add_edge(&mut self, source: NodeId, target: NodeId, kind: CfgEdgeKind) -> Result<EdgeId> {
        self.add_labeled_edge(source, target, CfgEdgeLabel::from(kind))
    }

    /// Adds an unconditional control flow edge.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::UnknownVertex`] if either block does not exist.
    pub fn add_unconditional_edge(&mut self, source: NodeId, target: NodeId) -> Result<EdgeId> {
        self.add_labeled_edge(source, target, CfgEdgeLabel::unconditional())
    }

    /// Adds a control flow edge carrying `label`, merging into an existing record.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::UnknownVertex`] if either block does not exist.
    pub fn add_labeled_edge(
        &mut self,
        source: NodeId,
        target: NodeId,
        label: CfgEdgeLabel,
    ) -> Result<EdgeId> {
        match self.graph.find_edge(source, target) {
            Some(edge) => {
                self.graph.add_selector(edge, Selector::CFG)?;
                self.graph.edge_data_mut(edge)?.merge(&label);
                Ok(edge)
            }
            None => self.graph.add_edge_with(source, target, Selector::CFG, label),
        }
    }

    /// Connects dangling blocks to the synthetic ENTRY and EXIT.
    ///
    /// Every block other than ENTRY without a control flow predecessor gets an edge
    /// from ENTRY. Every block other than EXIT without a control flow successor gets an
    /// edge to EXIT. Returns the number of edges added.
    ///
    /// # Errors
    ///
    /// Propagates edge insertion failures, which indicate a corrupted collection.
    pub fn finalize(&mut self) -> Result<usize> {
        let (orphans, dead_ends) = {
            let view = self.graph.view(Selector::FULL_CFG);
            let orphans: Vec<NodeId> = view
                .vertices()
                .filter(|&node| node != self.entry && view.in_degree(node) == 0)
                .collect();
            let dead_ends: Vec<NodeId> = view
                .vertices()
                .filter(|&node| node != self.exit && view.out_degree(node) == 0)
                .collect();
            (orphans, dead_ends)
        };

        for &node in &orphans {
            self.add_unconditional_edge(self.entry, node)?;
        }
        for &node in &dead_ends {
            self.add_unconditional_edge(node, self.exit)?;
        }

        let added = orphans.len() + dead_ends.len();
        debug!(
            "Finalized control flow graph: {} entry and {} exit edges added",
            orphans.len(),
            dead_ends.len()
        );
        Ok(added)
    }

    /// Returns the ENTRY vertex.
    #[must_use]
    pub const fn entry(&self) -> NodeId {
        self.entry
    }

    /// Returns the EXIT vertex.
    #[must_use]
    pub const fn exit(&self) -> NodeId {
        self.exit
    }

    /// Returns the number of blocks, ENTRY and EXIT included.
    #[must_use]
    pub fn block_count(&self) -> usize {
        self.graph.vertex_count()
    }

    /// Returns the block stored at `node`.
    #[must_use]
    pub fn block(&self, node: NodeId) -> Option<&BasicBlock> {
        self.graph.vertex_data(node)
    }

    /// Returns the vertex of the block with the given number.
    #[must_use]
    pub fn node(&self, number: u32) -> Option<NodeId> {
        self.by_number.get(&number).copied()
    }

    /// Returns the branch label of the edge from `source` to `target`.
    #[must_use]
    pub fn edge_label(&self, source: NodeId, target: NodeId) -> Option<&CfgEdgeLabel> {
        self.graph
            .find_edge(source, target)
            .and_then(|edge| self.graph.edge_data(edge).ok())
    }

    /// Returns the forward control flow view, without feedback edges.
    #[must_use]
    pub fn cfg_view(&self) -> GraphView<'_, BasicBlock, CfgEdgeLabel> {
        self.graph.view(Selector::CFG)
    }

    /// Returns the complete control flow view, feedback edges included.
    ///
    /// This is the view dominance and loop analysis run on.
    #[must_use]
    pub fn full_cfg_view(&self) -> GraphView<'_, BasicBlock, CfgEdgeLabel> {
        self.graph.view(Selector::FULL_CFG)
    }

    /// Returns the view of an arbitrary logical graph.
    #[must_use]
    pub fn view(&self, selector: Selector) -> GraphView<'_, BasicBlock, CfgEdgeLabel> {
        self.graph.view(selector)
    }

    /// Returns the underlying collection.
    #[must_use]
    pub fn graph(&self) -> &GraphCollection<BasicBlock, CfgEdgeLabel> {
        &self.graph
    }

    /// Returns the underlying collection mutably.
    pub fn graph_mut(&mut self) -> &mut GraphCollection<BasicBlock, CfgEdgeLabel> {
        &mut self.graph
    }

    /// Returns the blocks not reachable from ENTRY along control flow edges.
    ///
    /// Dominance analysis rejects a graph with such blocks.
    #[must_use]
    pub fn unreachable_blocks(&self) -> BTreeSet<NodeId> {
        let view = self.full_cfg_view();
        let reached: BTreeSet<NodeId> = dfs(&view, self.entry).collect();
        view.vertices()
            .filter(|node| !reached.contains(node))
            .collect()
    }

    /// Moves the spanning-tree back edges of `forest` from `CFG` to `FEEDBACK_CFG`.
    ///
    /// The moved edges include every loop back edge. Removing them leaves the `CFG` view
    /// acyclic while `FULL_CFG` still sees the complete flow. Returns the number of
    /// edges moved.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::MissingEdge`] if `forest` was built from another graph.
    pub fn split_feedback_edges(&mut self, forest: &LoopForest) -> Result<usize> {
        let mut moved = 0;
        for &(source, target) in forest.sp_back_edges() {
            let edge = self.graph.get_edge(source, target)?;
            if !self.graph.selector(edge)?.contains(Selector::CFG) {
                continue;
            }
            self.graph.remove_selector(edge, Selector::CFG)?;
            self.graph.add_selector(edge, Selector::FEEDBACK_CFG)?;
            trace!("Feedback edge {} -> {}", source, target);
            moved += 1;
        }
        debug!("Split {} feedback edges", moved);
        Ok(moved)
    }

    /// Adds control dependence edges under [`Selector::CDG`].
    ///
    /// For every control flow edge `(a, b)` the post-dominator tree is walked from `b` up
    /// to, but excluding, the immediate post-dominator of `a`; every vertex `w` on the
    /// way is control dependent on `a` and gets an edge `a -> w`. Returns the number of
    /// dependences recorded.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::InvariantViolation`] if `post_dominators` is a dominator
    /// tree.
    pub fn compute_control_dependences(&mut self, post_dominators: &DominatorTree) -> Result<usize> {
        if post_dominators.direction() != DominanceDirection::PostDominators {
            return Err(invariant_error!(
                "Control dependences need a post-dominator tree"
            ));
        }

        let mut dependences = Vec::new();
        {
            let view = self.full_cfg_view();
            for edge in view.edges() {
                let stop = post_dominators.immediate_dominator(edge.source);
                let mut current = Some(edge.target);
                while let Some(node) = current {
                    if Some(node) == stop || !post_dominators.contains(node) {
                        break;
                    }
                    dependences.push((edge.source, node));
                    current = post_dominators.immediate_dominator(node);
                }
            }
        }

        for &(controller, dependent) in &dependences {
            self.graph.ensure_edge(controller, dependent, Selector::CDG)?;
            trace!("{} is control dependent on {}", dependent, controller);
        }
        debug!("Recorded {} control dependences", dependences.len());
        Ok(dependences.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        utils::graph::{
            algorithms::{is_acyclic, DominanceEngine},
            Successors,
        },
        Error,
    };

    fn post_dominators(cfg: &ControlFlowGraph) -> DominatorTree {
        let view = cfg.full_cfg_view();
        let mut engine = DominanceEngine::new(&view, cfg.entry(), cfg.exit()).unwrap();
        engine.compute(DominanceDirection::PostDominators).unwrap();
        engine.into_tree().unwrap()
    }

    #[test]
    fn test_cfg_new_has_entry_and_exit() {
        let cfg = ControlFlowGraph::new();
        assert_eq!(cfg.block_count(), 2);
        assert!(cfg.block(cfg.entry()).unwrap().is_entry());
        assert!(cfg.block(cfg.exit()).unwrap().is_exit());
        assert_eq!(cfg.node(ENTRY_BLOCK), Some(cfg.entry()));
        assert!(cfg.edge_label(cfg.entry(), cfg.exit()).unwrap().is_unconditional());

        let edge = cfg.graph().get_edge(cfg.entry(), cfg.exit()).unwrap();
        assert_eq!(cfg.graph().selector(edge), Ok(Selector::CFG));
        assert_eq!(cfg.cfg_view().edge_count(), 1);
    }

    #[test]
    fn test_cfg_duplicate_block() {
        let mut cfg = ControlFlowGraph::new();
        cfg.add_block(7).unwrap();
        assert!(matches!(cfg.add_block(7), Err(Error::MalformedGraph { .. })));
        assert!(matches!(
            cfg.add_block(EXIT_BLOCK),
            Err(Error::MalformedGraph { .. })
        ));
    }

    #[test]
    fn test_cfg_switch_edges_merge() {
        let mut cfg = ControlFlowGraph::new();
        let switch = cfg.add_block(2).unwrap();
        let target = cfg.add_block(3).unwrap();

        let first = cfg
            .add_edge(switch, target, CfgEdgeKind::Switch { case_value: Some(1) })
            .unwrap();
        let second = cfg
            .add_edge(switch, target, CfgEdgeKind::Switch { case_value: None })
            .unwrap();
        assert_eq!(first, second);

        let label = cfg.edge_label(switch, target).unwrap();
        assert_eq!(label.kinds().count(), 2);
        assert!(label.has_kind(CfgEdgeKind::Switch { case_value: None }));
    }

    #[test]
    fn test_cfg_finalize_connects_dangling_blocks() {
        let mut cfg = ControlFlowGraph::new();
        let a = cfg.add_block(2).unwrap();
        let b = cfg.add_block(3).unwrap();
        cfg.add_unconditional_edge(a, b).unwrap();

        assert_eq!(cfg.unreachable_blocks(), BTreeSet::from([a, b]));
        assert_eq!(cfg.finalize().unwrap(), 2);
        assert!(cfg.unreachable_blocks().is_empty());

        let view = cfg.cfg_view();
        assert!(view.successors(cfg.entry()).any(|s| s == a));
        assert!(view.successors(b).any(|s| s == cfg.exit()));
        assert_eq!(cfg.finalize().unwrap(), 0);
    }

    #[test]
    fn test_cfg_unreachable_cycle_survives_finalize() {
        let mut cfg = ControlFlowGraph::new();
        let a = cfg.add_block(2).unwrap();
        let b = cfg.add_block(3).unwrap();
        cfg.add_unconditional_edge(a, b).unwrap();
        cfg.add_unconditional_edge(b, a).unwrap();
        cfg.finalize().unwrap();
        assert_eq!(cfg.unreachable_blocks(), BTreeSet::from([a, b]));
    }

    #[test]
    fn test_cfg_split_feedback_edges() {
        let mut cfg = ControlFlowGraph::new();
        let head = cfg.add_block(2).unwrap();
        let latch = cfg.add_block(3).unwrap();
        cfg.add_unconditional_edge(cfg.entry(), head).unwrap();
        cfg.add_unconditional_edge(head, latch).unwrap();
        cfg.add_edge(latch, head, CfgEdgeKind::ConditionalTrue).unwrap();
        cfg.add_edge(latch, cfg.exit(), CfgEdgeKind::ConditionalFalse)
            .unwrap();

        let forest = {
            let view = cfg.full_cfg_view();
            let mut dom = DominanceEngine::new(&view, cfg.entry(), cfg.exit()).unwrap();
            dom.compute(DominanceDirection::Dominators).unwrap();
            let dom = dom.into_tree().unwrap();
            LoopForest::new(&view, cfg.entry(), &dom, &post_dominators(&cfg)).unwrap()
        };

        assert!(!is_acyclic(&cfg.cfg_view()));
        assert_eq!(cfg.split_feedback_edges(&forest).unwrap(), 1);
        assert!(is_acyclic(&cfg.cfg_view()));
        assert!(!is_acyclic(&cfg.full_cfg_view()));
        assert_eq!(cfg.view(Selector::FEEDBACK_CFG).edge_count(), 1);
        assert_eq!(cfg.split_feedback_edges(&forest).unwrap(), 0);
    }

    #[test]
    fn test_cfg_control_dependences_of_diamond() {
        // entry -> a -> {b, c} -> d -> exit
        let mut cfg = ControlFlowGraph::new();
        let a = cfg.add_block(2).unwrap();
        let b = cfg.add_block(3).unwrap();
        let c = cfg.add_block(4).unwrap();
        let d = cfg.add_block(5).unwrap();
        cfg.add_unconditional_edge(cfg.entry(), a).unwrap();
        cfg.add_edge(a, b, CfgEdgeKind::ConditionalTrue).unwrap();
        cfg.add_edge(a, c, CfgEdgeKind::ConditionalFalse).unwrap();
        cfg.add_unconditional_edge(b, d).unwrap();
        cfg.add_unconditional_edge(c, d).unwrap();
        cfg.add_unconditional_edge(d, cfg.exit()).unwrap();

        let pdom = post_dominators(&cfg);
        let count = cfg.compute_control_dependences(&pdom).unwrap();

        let cdg = cfg.view(Selector::CDG);
        let of_a: BTreeSet<NodeId> = cdg.successors(a).collect();
        assert_eq!(of_a, BTreeSet::from([b, c]));
        // ENTRY decides between EXIT and the function body
        let of_entry: BTreeSet<NodeId> = cdg.successors(cfg.entry()).collect();
        assert_eq!(of_entry, BTreeSet::from([a, d]));
        assert_eq!(count, 4);
    }

    #[test]
    fn test_cfg_control_dependences_need_post_dominators() {
        let mut cfg = ControlFlowGraph::new();
        let dom = {
            let view = cfg.full_cfg_view();
            let mut engine = DominanceEngine::new(&view, cfg.entry(), cfg.exit()).unwrap();
            engine.compute(DominanceDirection::Dominators).unwrap();
            engine.into_tree().unwrap()
        };
        assert!(matches!(
            cfg.compute_control_dependences(&dom),
            Err(Error::InvariantViolation { .. })
        ));
    }
}
