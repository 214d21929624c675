//! Shared infrastructure used by the analyses.

pub mod graph;
