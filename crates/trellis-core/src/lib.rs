//! Trellis Core — graph data model, identifier policy, assembler, and query engine

pub mod assemble;
pub mod graph;
pub mod ident;
pub mod model;
pub mod query;


pub use assemble::{assemble, merge_unit};
pub use graph::CodeGraph;
pub use model::{EdgeKind, GraphEdge, GraphNode, NodeKind, SourceLocation, UnitExtraction};
pub use query::{QueryEngine, QueryHit};
