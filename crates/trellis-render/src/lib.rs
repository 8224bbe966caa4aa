//! Presentation adapters over the assembled graph
//!
//! Both renderers consume only the graph's node and edge sequences; they
//! have no influence on graph construction and no state of their own.

pub mod dot;
pub mod outline;


pub use dot::{render_dot, DotOptions};
pub use outline::{build_outline, outline_to_markdown, OutlineNode};
