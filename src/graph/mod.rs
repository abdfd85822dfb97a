//! Module discovery and change-impact resolution
//!
//! Built on walkdir + petgraph: the builder owns the filesystem scan, the
//! resolver is a pure function over the built graph.

pub mod affected;
pub mod module_graph;
