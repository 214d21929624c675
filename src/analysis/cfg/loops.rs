//! Loop nesting forest built on the DJ-graph.
//!
//! Loops are detected with the DJ-graph method of Sreedhar, Gao and Lee: the dominator
//! tree ("D" edges) is overlaid with every control flow edge that is not a tree edge
//! ("J" edges). A J edge whose target dominates its source is a back-join (BJ) edge and
//! closes a reducible loop; any other J edge is a cross-join (CJ) edge.
//!
//! # Algorithm
//!
//! 1. Classify the join edges and build the DJ-graph overlay
//! 2. Depth-first traversal of the DJ-graph from the entry, assigning each vertex a level
//!    (1 + the smallest level among its already discovered predecessors) and recording
//!    the spanning tree
//! 3. Mark sp-back edges: self-loops and edges whose target is a spanning tree ancestor
//!    of their source
//! 4. Visit levels from the deepest to the entry. A BJ in-edge makes the vertex a loop
//!    header, and the body is collected by walking DJ in-edges backwards; blocks owned by
//!    a parentless loop nest that loop instead. A CJ sp-back in-edge flags the level as
//!    irreducible, after which Tarjan's algorithm runs over every vertex at that level or
//!    deeper and each cyclic component with unclaimed blocks becomes an irreducible loop
//! 5. Attach every sp-back edge to the innermost loop it closes
//! 6. Wrap everything in the zero loop, compute depths, landing pads and reconvergence
//!    points
//!
//! # Loop Structure
//!
//! ```text
//!     [zero loop]  depth 0, header = entry, owns every block no loop claims
//!       |
//!       +-- [L1]   depth 1, reducible: single header, back edges target the header
//!       |     |
//!       |     +-- [L3] depth 2
//!       |
//!       +-- [L2]   depth 1, irreducible: no header, several entries
//! ```
//!
//! # Identifiers
//!
//! The zero loop is [`LoopId::ZERO`]. Real loops are numbered from 1 in the order they
//! are found, so inner loops always carry smaller ids than the loops enclosing them.

use std::{collections::BTreeSet, fmt, vec};

use log::{debug, trace};
use rustc_hash::{FxHashMap, FxHashSet};

use crate::{
    utils::graph::{
        algorithms::{components_within, DominanceDirection, DominatorTree, PreorderForest},
        GraphBase, GraphCollection, NodeId, Predecessors, Selector, Successors,
    },
    Result,
};

/// Identifier of a loop inside a [`LoopForest`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LoopId(usize);

impl LoopId {
    /// The synthetic loop spanning the whole function.
    pub const ZERO: LoopId = LoopId(0);

    /// Creates a loop id from a raw index.
    #[must_use]
    pub const fn new(index: usize) -> Self {
        LoopId(index)
    }

    /// Returns the raw index.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }

    /// Returns `true` for the zero loop.
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for LoopId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "L{}", self.0)
    }
}

/// Classification of a join edge of the DJ-graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JoinKind {
    /// Cross-join: the target does not dominate the source
    Cross,
    /// Back-join: the target dominates the source
    Back,
}

/// A control flow edge that is not a dominator tree edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct JoinEdge {
    /// Source block
    pub source: NodeId,
    /// Target block
    pub target: NodeId,
    /// Cross-join or back-join
    pub kind: JoinKind,
}

/// A loop of the nesting forest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Loop {
    id: LoopId,
    header: Option<NodeId>,
    blocks: BTreeSet<NodeId>,
    recursive_blocks: BTreeSet<NodeId>,
    back_edges: BTreeSet<(NodeId, NodeId)>,
    entries: BTreeSet<NodeId>,
    depth: usize,
    parent: Option<LoopId>,
    children: Vec<LoopId>,
    landing_pads: BTreeSet<NodeId>,
    reconvergence: Option<NodeId>,
}

impl Loop {
    /// Returns the loop identifier.
    #[must_use]
    pub fn id(&self) -> LoopId {
        self.id
    }

    /// Returns the header block. Irreducible loops have none; the zero loop's header is
    /// the function entry.
    #[must_use]
    pub fn header(&self) -> Option<NodeId> {
        self.header
    }

    /// Returns the blocks whose innermost loop is this one.
    #[must_use]
    pub fn blocks(&self) -> &BTreeSet<NodeId> {
        &self.blocks
    }

    /// Returns the blocks of this loop and of every loop nested in it.
    #[must_use]
    pub fn recursive_blocks(&self) -> &BTreeSet<NodeId> {
        &self.recursive_blocks
    }

    /// Returns `true` if `block` belongs to this loop or a nested one.
    #[must_use]
    pub fn contains(&self, block: NodeId) -> bool {
        self.recursive_blocks.contains(&block)
    }

    /// Returns the sp-back edges closing this loop, as `(source, target)` pairs.
    #[must_use]
    pub fn back_edges(&self) -> &BTreeSet<(NodeId, NodeId)> {
        &self.back_edges
    }

    /// Returns the blocks control can enter the loop through.
    ///
    /// For a reducible loop this is the header alone. For an irreducible loop it holds
    /// every back edge target plus every member sharing that target's immediate
    /// dominator.
    #[must_use]
    pub fn entries(&self) -> &BTreeSet<NodeId> {
        &self.entries
    }

    /// Returns `true` if the loop can be entered through more than one block.
    #[must_use]
    pub fn is_multi_entry(&self) -> bool {
        self.entries.len() > 1
    }

    /// Returns `true` if the loop has a single header.
    #[must_use]
    pub fn is_reducible(&self) -> bool {
        self.header.is_some()
    }

    /// Returns the nesting depth, 0 for the zero loop.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Returns the enclosing loop, `None` only for the zero loop.
    #[must_use]
    pub fn parent(&self) -> Option<LoopId> {
        self.parent
    }

    /// Returns the loops directly nested in this one, by ascending id.
    #[must_use]
    pub fn children(&self) -> &[LoopId] {
        &self.children
    }

    /// Returns `true` if no loop is nested in this one.
    #[must_use]
    pub fn is_innermost(&self) -> bool {
        self.children.is_empty()
    }

    /// Returns `true` for the zero loop.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.id.is_zero()
    }

    /// Returns the blocks outside the loop that control flow reaches directly from
    /// inside it.
    #[must_use]
    pub fn landing_pads(&self) -> &BTreeSet<NodeId> {
        &self.landing_pads
    }

    /// Returns the nearest strict post-dominator of the header lying outside the loop.
    ///
    /// `None` for irreducible loops, for the zero loop, and for loops that never reach
    /// the exit.
    #[must_use]
    pub fn reconvergence(&self) -> Option<NodeId> {
        self.reconvergence
    }
}

/// The DJ-graph as an adjacency overlay.
///
/// Adjacency lists hold the control flow edges first, in record order, followed
/// by the dominator tree edges that have no control flow counterpart. This is the order a
/// collection yields once the dominator tree has been recorded into it.
struct DjGraph {
    vertices: Vec<NodeId>,
    present: Vec<bool>,
    successors: Vec<Vec<NodeId>>,
    predecessors: Vec<Vec<NodeId>>,
}

impl DjGraph {
    fn new<G>(cfg: &G, dominators: &DominatorTree) -> Self
    where
        G: Successors + Predecessors,
    {
        let bound = cfg.node_bound();
        let vertices: Vec<NodeId> = cfg.node_ids().collect();
        let mut present = vec![false; bound];
        let mut successors = vec![Vec::new(); bound];
        let mut predecessors = vec![Vec::new(); bound];

        for &node in &vertices {
            present[node.index()] = true;
            successors[node.index()] = cfg.successors(node).collect();
            predecessors[node.index()] = cfg.predecessors(node).collect();
        }

        for (idom, node) in dominators.tree_edges() {
            let visible = |v: NodeId| present.get(v.index()) == Some(&true);
            if !visible(idom) || !visible(node) || successors[idom.index()].contains(&node) {
                continue;
            }
            successors[idom.index()].push(node);
            predecessors[node.index()].push(idom);
        }

        DjGraph {
            vertices,
            present,
            successors,
            predecessors,
        }
    }
}

impl GraphBase for DjGraph {
    fn node_count(&self) -> usize {
        self.vertices.len()
    }

    fn node_bound(&self) -> usize {
        self.present.len()
    }

    fn node_ids(&self) -> impl Iterator<Item = NodeId> {
        self.vertices.iter().copied()
    }

    fn contains_node(&self, node: NodeId) -> bool {
        self.present.get(node.index()) == Some(&true)
    }
}

impl Successors for DjGraph {
    fn successors(&self, node: NodeId) -> impl Iterator<Item = NodeId> {
        self.successors
            .get(node.index())
            .into_iter()
            .flatten()
            .copied()
    }
}

impl Predecessors for DjGraph {
    fn predecessors(&self, node: NodeId) -> impl Iterator<Item = NodeId> {
        self.predecessors
            .get(node.index())
            .into_iter()
            .flatten()
            .copied()
    }
}

/// Immediate dominator with the root mapping to itself.
fn idom_of(tree: &DominatorTree, node: NodeId) -> Option<NodeId> {
    if node == tree.root() {
        Some(node)
    } else {
        tree.immediate_dominator(node)
    }
}

fn classify_join_edges<G: Successors>(cfg: &G, dominators: &DominatorTree) -> Vec<JoinEdge> {
    let mut joins = Vec::new();
    for source in cfg.node_ids() {
        for target in cfg.successors(source) {
            if idom_of(dominators, target) == Some(source) {
                continue;
            }
            let kind = if dominators.dominates(target, source) {
                JoinKind::Back
            } else {
                JoinKind::Cross
            };
            trace!("J edge {} -> {} is {:?}", source, target, kind);
            joins.push(JoinEdge {
                source,
                target,
                kind,
            });
        }
    }
    joins
}

/// A loop under construction, addressed by its position in the detector's list.
#[derive(Debug)]
struct LoopDraft {
    header: Option<NodeId>,
    blocks: BTreeSet<NodeId>,
    parent: Option<usize>,
    children: BTreeSet<usize>,
}

struct LoopDetector<'a> {
    dj: &'a DjGraph,
    drafts: Vec<LoopDraft>,
    block_to_loop: Vec<Option<usize>>,
}

impl<'a> LoopDetector<'a> {
    fn new(dj: &'a DjGraph) -> Self {
        LoopDetector {
            dj,
            drafts: Vec::new(),
            block_to_loop: vec![None; dj.node_bound()],
        }
    }

    fn detect(
        &mut self,
        levels: &[Vec<NodeId>],
        cross: &FxHashSet<(NodeId, NodeId)>,
        back: &FxHashSet<(NodeId, NodeId)>,
        sp_back: &BTreeSet<(NodeId, NodeId)>,
    ) {
        for level in (0..levels.len()).rev() {
            let mut irreducible = false;
            for &header in &levels[level] {
                let mut slot = None;
                let mut visited = FxHashSet::default();
                let in_sources: Vec<NodeId> = self.dj.predecessors(header).collect();
                for source in in_sources {
                    let edge = (source, header);
                    if cross.contains(&edge) && sp_back.contains(&edge) {
                        trace!(
                            "Irreducible loop found: sp-back edge {} -> {}",
                            source,
                            header
                        );
                        irreducible = true;
                    }
                    if back.contains(&edge) {
                        let id = *slot.get_or_insert_with(|| self.open_reducible(header));
                        self.block_to_loop[header.index()] = Some(id);
                        self.claim_reducible(id, source, header, &mut visited);
                        trace!("Reducible loop found: sp-back edge {} -> {}", source, header);
                    }
                }
            }
            if irreducible {
                self.detect_irreducible(levels, level);
            }
        }
    }

    fn open_reducible(&mut self, header: NodeId) -> usize {
        self.drafts.push(LoopDraft {
            header: Some(header),
            blocks: BTreeSet::from([header]),
            parent: None,
            children: BTreeSet::new(),
        });
        self.drafts.len() - 1
    }

    /// Walks DJ in-edges backwards from `start` until `header`, claiming blocks.
    fn claim_reducible(
        &mut self,
        id: usize,
        start: NodeId,
        header: NodeId,
        visited: &mut FxHashSet<NodeId>,
    ) {
        if start == header {
            return;
        }

        let mut stack = vec![self.claim_block(id, start, visited)];
        while let Some(sources) = stack.last_mut() {
            match sources.find(|source| !visited.contains(source)) {
                Some(source) if source == header => {}
                Some(source) => {
                    let frame = self.claim_block(id, source, visited);
                    stack.push(frame);
                }
                None => {
                    stack.pop();
                }
            }
        }
    }

    fn claim_block(
        &mut self,
        id: usize,
        block: NodeId,
        visited: &mut FxHashSet<NodeId>,
    ) -> vec::IntoIter<NodeId> {
        visited.insert(block);
        match self.block_to_loop[block.index()] {
            None => {
                self.drafts[id].blocks.insert(block);
                self.block_to_loop[block.index()] = Some(id);
            }
            Some(other) if other != id => {
                // Owned by an inner loop: nest that loop once, keep the block there
                if self.drafts[other].parent.is_none() {
                    self.drafts[other].parent = Some(id);
                    self.drafts[id].children.insert(other);
                }
            }
            Some(_) => {}
        }
        self.dj
            .predecessors(block)
            .collect::<Vec<_>>()
            .into_iter()
    }

    fn detect_irreducible(&mut self, levels: &[Vec<NodeId>], min_level: usize) {
        let mut candidates: BTreeSet<NodeId> = levels[min_level..]
            .iter()
            .flatten()
            .copied()
            .collect();
        trace!(
            "Detecting irreducible loops from level {} over {} blocks",
            min_level,
            candidates.len()
        );

        for component in components_within(self.dj, &mut candidates) {
            let members: BTreeSet<NodeId> = component.into_iter().collect();
            let mut body = BTreeSet::new();
            let mut nested = BTreeSet::new();
            for &member in &members {
                match self.block_to_loop[member.index()] {
                    Some(owner) => {
                        let draft = &self.drafts[owner];
                        if draft.header == Some(member) && draft.parent.is_none() {
                            nested.insert(owner);
                        }
                    }
                    None => {
                        body.insert(member);
                    }
                }
            }
            if body.is_empty() {
                continue;
            }

            let id = self.drafts.len();
            for &block in &body {
                self.block_to_loop[block.index()] = Some(id);
            }
            for &inner in &nested {
                self.drafts[inner].parent = Some(id);
            }
            trace!("Irreducible loop with blocks {:?}", body);
            self.drafts.push(LoopDraft {
                header: None,
                blocks: body,
                parent: None,
                children: nested,
            });
        }
    }
}

/// The loop nesting forest of one function.
///
/// Built once from a control flow view and its two dominance trees, then immutable. The
/// forest owns all of its data and does not borrow the graph.
///
/// # Examples
///
/// ```rust
/// use cfgscope::{
///     analysis::LoopForest, DominanceDirection, DominanceEngine, GraphCollection, Selector,
/// };
///
/// // entry -> h, h -> h, h -> exit, entry -> exit
/// let mut graph: GraphCollection<(), ()> = GraphCollection::new();
/// let entry = graph.add_vertex();
/// let exit = graph.add_vertex();
/// let h = graph.add_vertex();
/// for (s, t) in [(entry, exit), (entry, h), (h, h), (h, exit)] {
///     graph.add_edge(s, t, Selector::CFG)?;
/// }
///
/// let cfg = graph.view(Selector::FULL_CFG);
/// let mut dom = DominanceEngine::new(&cfg, entry, exit)?;
/// dom.compute(DominanceDirection::Dominators)?;
/// let mut pdom = DominanceEngine::new(&cfg, entry, exit)?;
/// pdom.compute(DominanceDirection::PostDominators)?;
///
/// let forest = LoopForest::new(&cfg, entry, &dom.into_tree()?, &pdom.into_tree()?)?;
/// assert_eq!(forest.len(), 2);
///
/// let inner = forest.loop_for(h).unwrap();
/// assert_eq!(inner.header(), Some(h));
/// assert_eq!(inner.depth(), 1);
/// assert!(inner.back_edges().contains(&(h, h)));
/// # Ok::<(), cfgscope::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct LoopForest {
    /// Loops indexed by id, the zero loop first
    loops: Vec<Loop>,
    /// Innermost loop per vertex index
    innermost: Vec<Option<LoopId>>,
    /// DJ-graph level per vertex index
    levels: Vec<Option<usize>>,
    vertex_count: usize,
    join_edges: Vec<JoinEdge>,
    sp_back_edges: BTreeSet<(NodeId, NodeId)>,
}

impl LoopForest {
    /// Detects the loops of the function seen through `cfg`.
    ///
    /// `cfg` should include the feedback edges ([`Selector::FULL_CFG`]) and must be the
    /// view both trees were computed on.
    ///
    /// # Errors
    ///
    /// - [`crate::Error::InvariantViolation`] if the trees have the wrong directions, if a
    ///   DJ-graph level cannot be determined, or if a reducible loop ends up without back
    ///   edges
    /// - [`crate::Error::MalformedGraph`] if `entry` is not a vertex of `cfg` or not the
    ///   dominator tree's root
    pub fn new<G>(
        cfg: &G,
        entry: NodeId,
        dominators: &DominatorTree,
        post_dominators: &DominatorTree,
    ) -> Result<Self>
    where
        G: Successors + Predecessors,
    {
        if dominators.direction() != DominanceDirection::Dominators
            || post_dominators.direction() != DominanceDirection::PostDominators
        {
            return Err(invariant_error!(
                "Loop detection needs dominators and post-dominators, got {:?} and {:?}",
                dominators.direction(),
                post_dominators.direction()
            ));
        }
        if !cfg.contains_node(entry) || dominators.root() != entry {
            return Err(malformed_error!(
                "Entry {} is not the root of the dominator tree",
                entry
            ));
        }

        debug!("Loop detection started from {}", entry);

        let join_edges = classify_join_edges(cfg, dominators);
        let dj = DjGraph::new(cfg, dominators);

        let mut spanning = PreorderForest::new(dj.node_bound());
        spanning.grow(&dj, entry, None);

        let mut level_of: Vec<Option<usize>> = vec![None; dj.node_bound()];
        let mut levels: Vec<Vec<NodeId>> = Vec::new();
        for &node in spanning.order() {
            let level = if node == entry {
                0
            } else {
                dj.predecessors(node)
                    .filter_map(|pred| level_of[pred.index()])
                    .min()
                    .map(|level| level + 1)
                    .ok_or_else(|| {
                        invariant_error!("Cannot determine a proper level for {}", node)
                    })?
            };
            trace!("DJ level of {} is {}", node, level);
            level_of[node.index()] = Some(level);
            if levels.len() <= level {
                levels.resize_with(level + 1, Vec::new);
            }
            levels[level].push(node);
        }

        let mut sp_back_edges = BTreeSet::new();
        for source in dj.node_ids() {
            for target in dj.successors(source) {
                if source == target || spanning.is_ancestor(target, source) {
                    sp_back_edges.insert((source, target));
                }
            }
        }

        let mut cross = FxHashSet::default();
        let mut back = FxHashSet::default();
        for join in &join_edges {
            match join.kind {
                JoinKind::Cross => cross.insert((join.source, join.target)),
                JoinKind::Back => back.insert((join.source, join.target)),
            };
        }

        let mut detector = LoopDetector::new(&dj);
        detector.detect(&levels, &cross, &back, &sp_back_edges);
        let LoopDetector {
            drafts,
            block_to_loop,
            ..
        } = detector;

        let loops = assemble(
            cfg,
            entry,
            dominators,
            post_dominators,
            &drafts,
            &block_to_loop,
            &sp_back_edges,
        )?;

        let mut innermost = vec![None; dj.node_bound()];
        for lp in &loops {
            for &block in &lp.blocks {
                innermost[block.index()] = Some(lp.id);
            }
        }

        debug!(
            "Loops detection ended: {} loops besides the zero loop",
            loops.len() - 1
        );

        Ok(LoopForest {
            loops,
            innermost,
            levels: level_of,
            vertex_count: dj.node_count(),
            join_edges,
            sp_back_edges,
        })
    }

    /// Returns the innermost loop containing `block`. Blocks claimed by no real loop
    /// belong to the zero loop. `None` for vertices outside the analysed view.
    #[must_use]
    pub fn loop_for(&self, block: NodeId) -> Option<&Loop> {
        self.innermost
            .get(block.index())
            .copied()
            .flatten()
            .and_then(|id| self.loop_by_id(id))
    }

    /// Returns the loop with the given id.
    #[must_use]
    pub fn loop_by_id(&self, id: LoopId) -> Option<&Loop> {
        self.loops.get(id.index())
    }

    /// Returns the zero loop.
    #[must_use]
    pub fn zero_loop(&self) -> &Loop {
        &self.loops[0]
    }

    /// Returns every loop by ascending id, the zero loop first.
    #[must_use]
    pub fn all_loops(&self) -> &[Loop] {
        &self.loops
    }

    /// Returns the number of loops, the zero loop included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.loops.len()
    }

    /// Returns `true` if the function has no loop besides the zero loop.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.loops.len() == 1
    }

    /// Returns the depth of a loop.
    #[must_use]
    pub fn depth(&self, id: LoopId) -> Option<usize> {
        self.loop_by_id(id).map(Loop::depth)
    }

    /// Returns the loops directly nested in `id`.
    #[must_use]
    pub fn children(&self, id: LoopId) -> &[LoopId] {
        self.loop_by_id(id).map_or(&[], Loop::children)
    }

    /// Returns the back edges of a loop.
    #[must_use]
    pub fn back_edges(&self, id: LoopId) -> Option<&BTreeSet<(NodeId, NodeId)>> {
        self.loop_by_id(id).map(Loop::back_edges)
    }

    /// Iterates over the outermost real loops, the children of the zero loop.
    pub fn top_level_loops(&self) -> impl Iterator<Item = &Loop> + '_ {
        self.zero_loop()
            .children
            .iter()
            .filter_map(move |&id| self.loop_by_id(id))
    }

    /// Returns the loops sorted innermost first. Loops of equal depth keep id order.
    #[must_use]
    pub fn by_depth_descending(&self) -> Vec<&Loop> {
        let mut sorted: Vec<_> = self.loops.iter().collect();
        sorted.sort_by_key(|l| std::cmp::Reverse(l.depth));
        sorted
    }

    /// Returns `true` if any loop is irreducible.
    #[must_use]
    pub fn has_irreducible_loops(&self) -> bool {
        self.loops.iter().any(|l| !l.is_reducible())
    }

    /// Returns the join edges of the DJ-graph with their classification.
    #[must_use]
    pub fn join_edges(&self) -> &[JoinEdge] {
        &self.join_edges
    }

    /// Returns every sp-back edge of the DJ-graph spanning tree.
    #[must_use]
    pub fn sp_back_edges(&self) -> &BTreeSet<(NodeId, NodeId)> {
        &self.sp_back_edges
    }

    /// Returns the DJ-graph level of `block`, 0 for the entry.
    #[must_use]
    pub fn level(&self, block: NodeId) -> Option<usize> {
        self.levels.get(block.index()).copied().flatten()
    }

    /// Checks the structural invariants of the forest.
    ///
    /// - every block is a direct member of exactly one loop
    /// - the zero loop recursively covers every block
    /// - back edge endpoints are members of their loop, and reducible loops are closed
    ///   on their header by at least one back edge
    /// - real loops have a parent one level up; only the zero loop is parentless
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::InvariantViolation`] describing the first broken invariant.
    pub fn verify(&self) -> Result<()> {
        let mut owner: FxHashMap<NodeId, LoopId> = FxHashMap::default();
        for lp in &self.loops {
            for &block in &lp.blocks {
                if let Some(previous) = owner.insert(block, lp.id) {
                    return Err(invariant_error!(
                        "Block {} is a direct member of both {} and {}",
                        block,
                        previous,
                        lp.id
                    ));
                }
            }
        }
        if owner.len() != self.vertex_count {
            return Err(invariant_error!(
                "{} of {} blocks belong to a loop",
                owner.len(),
                self.vertex_count
            ));
        }
        if self.zero_loop().recursive_blocks.len() != self.vertex_count {
            return Err(invariant_error!("The zero loop does not cover every block"));
        }

        for lp in &self.loops {
            for &(source, target) in &lp.back_edges {
                if !lp.contains(source) || !lp.contains(target) {
                    return Err(invariant_error!(
                        "Back edge {} -> {} leaves {}",
                        source,
                        target,
                        lp.id
                    ));
                }
                if lp.is_reducible() && lp.header != Some(target) {
                    return Err(invariant_error!(
                        "Back edge {} -> {} of reducible {} misses its header",
                        source,
                        target,
                        lp.id
                    ));
                }
            }

            match lp.parent {
                None if lp.is_zero() => {}
                None => {
                    return Err(invariant_error!("{} has no parent", lp.id));
                }
                Some(parent_id) => {
                    let parent = self.loop_by_id(parent_id).ok_or_else(|| {
                        invariant_error!("{} has unknown parent {}", lp.id, parent_id)
                    })?;
                    if lp.is_zero() || parent.depth + 1 != lp.depth {
                        return Err(invariant_error!(
                            "{} at depth {} below {} at depth {}",
                            lp.id,
                            lp.depth,
                            parent.id,
                            parent.depth
                        ));
                    }
                    if !parent.children.contains(&lp.id) {
                        return Err(invariant_error!(
                            "{} is not listed as a child of {}",
                            lp.id,
                            parent.id
                        ));
                    }
                }
            }

            if !lp.is_zero() && lp.is_reducible() && lp.back_edges.is_empty() {
                return Err(invariant_error!("{} has no back edges", lp.id));
            }
        }

        Ok(())
    }
}

/// Turns the detector's drafts into the final loops, the zero loop at index 0.
fn assemble<G>(
    cfg: &G,
    entry: NodeId,
    dominators: &DominatorTree,
    post_dominators: &DominatorTree,
    drafts: &[LoopDraft],
    block_to_loop: &[Option<usize>],
    sp_back_edges: &BTreeSet<(NodeId, NodeId)>,
) -> Result<Vec<Loop>>
where
    G: Successors,
{
    let count = drafts.len();

    // A loop is always created before the loop it gets nested in
    let mut recursive: Vec<BTreeSet<NodeId>> = Vec::with_capacity(count);
    for (index, draft) in drafts.iter().enumerate() {
        let mut blocks = draft.blocks.clone();
        for &child in &draft.children {
            let nested = recursive.get(child).filter(|_| child < index).ok_or_else(|| {
                invariant_error!("Loop {} nests the later loop {}", index + 1, child + 1)
            })?;
            blocks.extend(nested.iter().copied());
        }
        recursive.push(blocks);
    }

    let mut back_edges = vec![BTreeSet::new(); count];
    let mut entries = vec![BTreeSet::new(); count];
    for &(source, target) in sp_back_edges {
        let mut current = block_to_loop.get(target.index()).copied().flatten();
        while let Some(index) = current {
            let closes_header = drafts[index].header.is_none_or(|header| header == target);
            if closes_header && recursive[index].contains(&source) {
                break;
            }
            current = drafts[index].parent;
        }
        let Some(index) = current else {
            trace!("sp-back edge {} -> {} closes no loop", source, target);
            continue;
        };

        back_edges[index].insert((source, target));
        if drafts[index].header.is_none() {
            entries[index].insert(target);
            let entry_idom = idom_of(dominators, target);
            for &block in &recursive[index] {
                if idom_of(dominators, block) == entry_idom {
                    entries[index].insert(block);
                }
            }
        }
    }

    for (index, edges) in back_edges.iter().enumerate() {
        if !edges.is_empty() {
            continue;
        }
        if drafts[index].header.is_some() {
            return Err(invariant_error!(
                "Wrongly computed loop back edges: {} has none",
                LoopId(index + 1)
            ));
        }
        debug!("Irreducible {} closes no sp-back edge", LoopId(index + 1));
    }

    // Parents carry larger indices than their children
    let mut depth = vec![0; count];
    for index in (0..count).rev() {
        depth[index] = drafts[index].parent.map_or(1, |parent| depth[parent] + 1);
    }

    let vertices: BTreeSet<NodeId> = cfg.node_ids().collect();
    let mut zero_blocks = vertices.clone();
    let mut zero_children = Vec::new();
    for (index, draft) in drafts.iter().enumerate() {
        if draft.parent.is_none() {
            zero_children.push(LoopId(index + 1));
            for block in &recursive[index] {
                zero_blocks.remove(block);
            }
        }
    }

    let mut loops = Vec::with_capacity(count + 1);
    loops.push(Loop {
        id: LoopId::ZERO,
        header: Some(entry),
        blocks: zero_blocks,
        recursive_blocks: vertices,
        back_edges: BTreeSet::new(),
        entries: BTreeSet::from([entry]),
        depth: 0,
        parent: None,
        children: zero_children,
        landing_pads: BTreeSet::new(),
        reconvergence: None,
    });

    for (index, draft) in drafts.iter().enumerate() {
        let members = &recursive[index];

        let mut landing_pads = BTreeSet::new();
        for &block in members {
            for succ in cfg.successors(block) {
                if !members.contains(&succ) {
                    landing_pads.insert(succ);
                }
            }
        }

        let reconvergence = draft.header.and_then(|header| {
            let mut current = post_dominators.immediate_dominator(header);
            while let Some(candidate) = current {
                if !members.contains(&candidate) {
                    break;
                }
                current = post_dominators.immediate_dominator(candidate);
            }
            current
        });

        let loop_entries = match draft.header {
            Some(header) => BTreeSet::from([header]),
            None => std::mem::take(&mut entries[index]),
        };

        loops.push(Loop {
            id: LoopId(index + 1),
            header: draft.header,
            blocks: draft.blocks.clone(),
            recursive_blocks: members.clone(),
            back_edges: std::mem::take(&mut back_edges[index]),
            entries: loop_entries,
            depth: depth[index],
            parent: Some(draft.parent.map_or(LoopId::ZERO, |parent| LoopId(parent + 1))),
            children: draft.children.iter().map(|&child| LoopId(child + 1)).collect(),
            landing_pads,
            reconvergence,
        });
    }

    Ok(loops)
}

/// Records the join edges of `forest` in `collection` under [`Selector::JOIN`].
///
/// Together with the recorded dominator tree edges this makes the DJ-graph available as
/// `collection.view(Selector::DJ)`.
///
/// # Errors
///
/// Returns [`crate::Error::MissingEdge`] if a join edge has no record in `collection`,
/// which means the forest was built from a different graph.
pub fn record_join_edges<N, E>(
    collection: &mut GraphCollection<N, E>,
    forest: &LoopForest,
) -> Result<usize> {
    for join in forest.join_edges() {
        let edge = collection.get_edge(join.source, join.target)?;
        collection.add_selector(edge, Selector::JOIN)?;
    }
    debug!("Recorded {} join edges", forest.join_edges().len());
    Ok(forest.join_edges().len())
}
