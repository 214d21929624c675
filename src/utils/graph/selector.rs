//! Edge selectors: the logical graphs an edge record belongs to.
//!
//! One physical edge can simultaneously be part of the control flow graph, the
//! dominator tree, the DJ-graph and the control dependence graph. Each of those
//! logical graphs owns one bit of the [`Selector`] mask. Views filter edges by
//! intersecting their own mask with the edge's mask.

use bitflags::bitflags;

bitflags! {
    /// Bitmask naming the logical graphs an edge is a member of.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use cfgscope::Selector;
    ///
    /// let edge = Selector::CFG | Selector::DOMINATOR;
    /// assert!(edge.intersects(Selector::DJ));
    /// assert!(!edge.intersects(Selector::POST_DOMINATOR));
    /// ```
    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
    pub struct Selector: u32 {
        /// Control flow edges between basic blocks
        const CFG = 1 << 0;
        /// Control dependence edges
        const CDG = 1 << 1;
        /// Loop back edges moved out of the acyclic control flow graph
        const FEEDBACK_CFG = 1 << 2;
        /// Dominator tree edges, immediate dominator to dominated block
        const DOMINATOR = 1 << 7;
        /// Post-dominator tree edges, immediate post-dominator to post-dominated block
        const POST_DOMINATOR = 1 << 8;
        /// Join edges of the DJ-graph (control flow edges that are not dominator tree edges)
        const JOIN = 1 << 9;
        /// Edges instrumented for path profiling
        const PATH_PROFILE = 1 << 10;

        /// The DJ-graph: dominator tree plus join edges
        const DJ = Self::DOMINATOR.bits() | Self::JOIN.bits();
        /// Control flow including the feedback edges
        const FULL_CFG = Self::CFG.bits() | Self::FEEDBACK_CFG.bits();
    }
}
