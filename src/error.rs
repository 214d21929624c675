use thiserror::Error;

use crate::utils::graph::{EdgeId, NodeId};

macro_rules! malformed_error {
    // Single string version
    ($msg:expr) => {
        crate::Error::MalformedGraph {
            message: $msg.to_string(),
            file: file!(),
            line: line!(),
        }
    };

    // Format string with arguments version
    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::MalformedGraph {
            message: format!($fmt, $($arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

macro_rules! invariant_error {
    ($msg:expr) => {
        crate::Error::InvariantViolation {
            message: $msg.to_string(),
            file: file!(),
            line: line!(),
        }
    };

    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::InvariantViolation {
            message: format!($fmt, $($arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

/// The generic Error type, which provides coverage for all errors this library can potentially
/// return.
///
/// Every variant describes a broken contract between the producer of a control flow graph
/// and the analyses consuming it. None of them is recoverable inside the library: a graph
/// that triggers one of these errors is a bug in the front end, and the enclosing tool is
/// expected to report it and abort the analysis of the affected function.
///
/// # Error Categories
///
/// ## Structural Errors
/// - [`Error::MalformedGraph`] - Duplicate edges, bad entry/exit choice, unreachable blocks
/// - [`Error::UnknownVertex`] - A vertex handle that is not live in the collection
/// - [`Error::UnknownEdge`] - An edge handle that is not live in the collection
/// - [`Error::MissingEdge`] - No edge record between two vertices
///
/// ## Analysis Errors
/// - [`Error::InvariantViolation`] - An internal consistency check of an analysis failed
/// - [`Error::DominanceNotComputed`] - Dominance queried before it was computed
///
/// # Examples
///
/// ```rust
/// use cfgscope::{Error, Selector, GraphCollection};
///
/// let mut graph: GraphCollection<(), ()> = GraphCollection::new();
/// let a = graph.add_vertex();
/// let b = graph.add_vertex();
/// graph.add_edge(a, b, Selector::CFG)?;
///
/// match graph.add_edge(a, b, Selector::DOMINATOR) {
///     Err(Error::MalformedGraph { message, .. }) => println!("rejected: {message}"),
///     other => panic!("unexpected {other:?}"),
/// }
/// # Ok::<(), cfgscope::Error>(())
/// ```
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The graph handed to the library violates a structural contract.
    ///
    /// Raised for duplicate edge insertion, an entry equal to the exit, entry or exit
    /// outside of the analysed view, and vertices the forward traversal cannot reach.
    /// The error includes the source location where the violation was detected.
    ///
    /// # Fields
    ///
    /// * `message` - Detailed description of the violation
    /// * `file` - Source file where the error was detected
    /// * `line` - Source line where the error was detected
    #[error("Malformed graph - {file}:{line}: {message}")]
    MalformedGraph {
        /// The message to be printed for the MalformedGraph error
        message: String,
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },

    /// An analysis reached a state its own invariants rule out.
    ///
    /// Examples are a loop without back edges, a Tarjan component root popped with an
    /// inconsistent stack, or a dominance engine asked to recompute in another direction.
    #[error("Invariant violation - {file}:{line}: {message}")]
    InvariantViolation {
        /// Description of the violated invariant
        message: String,
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },

    /// The vertex handle is not a live vertex of the collection (or of the view).
    #[error("Unknown vertex - {0}")]
    UnknownVertex(NodeId),

    /// The edge handle is not a live edge of the collection.
    #[error("Unknown edge - {0}")]
    UnknownEdge(EdgeId),

    /// No edge record exists for the requested ordered vertex pair.
    #[error("No edge from {from} to {to}")]
    MissingEdge {
        /// Source vertex of the requested edge
        from: NodeId,
        /// Target vertex of the requested edge
        to: NodeId,
    },

    /// Dominance information was queried before `compute` ran.
    #[error("Dominance information has not been computed")]
    DominanceNotComputed,
}
