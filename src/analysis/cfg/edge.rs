//! Control flow edge labels.
//!
//! Every CFG edge record carries a [`CfgEdgeLabel`] describing why control moves along
//! it: the taken or not-taken side of a conditional, one or more switch cases, or
//! nothing at all for unconditional flow. Other logical graphs sharing the same record
//! (dominator tree, DJ-graph) ignore the label.

use std::{collections::BTreeSet, fmt};

/// The kind of control transfer represented by a CFG edge.
///
/// # Examples
///
/// ```rust
/// use cfgscope::analysis::CfgEdgeKind;
///
/// let edge_kind = CfgEdgeKind::ConditionalTrue;
/// assert!(edge_kind.is_conditional());
/// assert!(CfgEdgeKind::Switch { case_value: None }.is_default_case());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CfgEdgeKind {
    /// Taken when the branch condition evaluates to true.
    ConditionalTrue,

    /// Taken when the branch condition evaluates to false.
    ConditionalFalse,

    /// A switch case edge.
    ///
    /// Contains the case value, or `None` for the default case.
    Switch {
        /// The case value that triggers this edge, or `None` for the default case.
        case_value: Option<i64>,
    },
}

impl CfgEdgeKind {
    /// Returns `true` for [`ConditionalTrue`](Self::ConditionalTrue) and
    /// [`ConditionalFalse`](Self::ConditionalFalse).
    #[must_use]
    pub const fn is_conditional(&self) -> bool {
        matches!(self, Self::ConditionalTrue | Self::ConditionalFalse)
    }

    /// Returns `true` for [`Switch`](Self::Switch) edges.
    #[must_use]
    pub const fn is_switch(&self) -> bool {
        matches!(self, Self::Switch { .. })
    }

    /// Returns `true` for the default case of a switch.
    #[must_use]
    pub const fn is_default_case(&self) -> bool {
        matches!(self, Self::Switch { case_value: None })
    }
}

impl fmt::Display for CfgEdgeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CfgEdgeKind::ConditionalTrue => write!(f, "T"),
            CfgEdgeKind::ConditionalFalse => write!(f, "F"),
            CfgEdgeKind::Switch { case_value: None } => write!(f, "default"),
            CfgEdgeKind::Switch {
                case_value: Some(value),
            } => write!(f, "{value}"),
        }
    }
}

/// Payload of a CFG edge record.
///
/// Several switch cases may lead to the same block; since at most one edge record exists
/// per block pair, their kinds accumulate in one label. An empty label marks an
/// unconditional edge.
///
/// # Examples
///
/// ```rust
/// use cfgscope::analysis::{CfgEdgeKind, CfgEdgeLabel};
///
/// let mut label = CfgEdgeLabel::from(CfgEdgeKind::Switch { case_value: Some(1) });
/// label.merge(&CfgEdgeLabel::from(CfgEdgeKind::Switch { case_value: Some(3) }));
/// assert_eq!(label.kinds().count(), 2);
/// assert!(!label.is_unconditional());
/// assert_eq!(label.to_string(), "1,3");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CfgEdgeLabel {
    kinds: BTreeSet<CfgEdgeKind>,
    weight: Option<u64>,
}

impl CfgEdgeLabel {
    /// Creates an unconditional label.
    #[must_use]
    pub fn unconditional() -> Self {
        Self::default()
    }

    /// Returns the kinds carried by this edge, in ascending order.
    pub fn kinds(&self) -> impl Iterator<Item = CfgEdgeKind> + '_ {
        self.kinds.iter().copied()
    }

    /// Returns `true` if the label carries `kind`.
    #[must_use]
    pub fn has_kind(&self, kind: CfgEdgeKind) -> bool {
        self.kinds.contains(&kind)
    }

    /// Returns `true` if the edge carries no branch kind.
    #[must_use]
    pub fn is_unconditional(&self) -> bool {
        self.kinds.is_empty()
    }

    /// Adds a branch kind to the label.
    pub fn add_kind(&mut self, kind: CfgEdgeKind) {
        self.kinds.insert(kind);
    }

    /// Returns the path-profile weight, if one was recorded.
    #[must_use]
    pub fn weight(&self) -> Option<u64> {
        self.weight
    }

    /// Records the path-profile weight of the edge.
    pub fn set_weight(&mut self, weight: u64) {
        self.weight = Some(weight);
    }

    /// Merges the kinds of `other` into this label. Weights add up.
    pub fn merge(&mut self, other: &CfgEdgeLabel) {
        self.kinds.extend(other.kinds.iter().copied());
        self.weight = match (self.weight, other.weight) {
            (Some(a), Some(b)) => Some(a.saturating_add(b)),
            (a, b) => a.or(b),
        };
    }
}

impl From<CfgEdgeKind> for CfgEdgeLabel {
    fn from(kind: CfgEdgeKind) -> Self {
        let mut label = CfgEdgeLabel::default();
        label.add_kind(kind);
        label
    }
}

impl fmt::Display for CfgEdgeLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, kind) in self.kinds.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{kind}")?;
        }
        Ok(())
    }
}
