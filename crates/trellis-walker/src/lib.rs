//! Per-unit syntax walking and graph-fragment extraction

pub mod python;
pub mod services;

#[cfg(test)]
pub mod tests;

use thiserror::Error;
use trellis_core::UnitExtraction;

pub use python::PythonWalker;
pub use services::{default_patterns, ServicePattern};

/// Why a unit contributed nothing to the graph.
///
/// Walk failures are unit-scoped diagnostics, never pipeline-fatal: the
/// caller reports them and continues with the remaining units.
#[derive(Debug, Error)]
pub enum WalkError {
    #[error("grammar rejected by tree-sitter: {0}")]
    Language(#[from] tree_sitter::LanguageError),
    #[error("unit `{unit}` produced no syntax tree")]
    Parse { unit: String },
    #[error("unit `{unit}` has invalid syntax near line {line}")]
    Syntax { unit: String, line: u32 },
}

/// A syntax walker: one source unit's text in, flat graph records out.
///
/// Implementations are pure per-unit functions with no cross-file
/// knowledge, so units can be walked in parallel and a failed walk can be
/// dropped without touching any other unit's result.
pub trait SourceWalker: Send + Sync {
    fn walk(&self, unit: &str, source: &str) -> Result<UnitExtraction, WalkError>;
}
