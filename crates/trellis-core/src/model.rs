//! Core data structures for the code graph

use serde::{Deserialize, Serialize};

/// Discriminates what kind of structural element a node represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    // ── Structural ──────────────────────────────────────────
    /// One analyzed source file.
    Unit,

    // ── Declarations ────────────────────────────────────────
    /// Class-like declaration.
    Type,
    /// Free function.
    Callable,
    /// Function declared directly inside a type body.
    MemberCallable,

    // ── Synthetic (name- or site-keyed) ─────────────────────
    Variable,
    DecoratorTag,
    ExceptionSite,
    HandlerSite,
    ReturnSite,
    ExternalService,
}

impl NodeKind {
    /// Wire-format label, e.g. `member_callable`.
    pub fn label(&self) -> &'static str {
        match self {
            NodeKind::Unit => "unit",
            NodeKind::Type => "type",
            NodeKind::Callable => "callable",
            NodeKind::MemberCallable => "member_callable",
            NodeKind::Variable => "variable",
            NodeKind::DecoratorTag => "decorator_tag",
            NodeKind::ExceptionSite => "exception_site",
            NodeKind::HandlerSite => "handler_site",
            NodeKind::ReturnSite => "return_site",
            NodeKind::ExternalService => "external_service",
        }
    }
}

/// What kind of relationship this edge represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EdgeKind {
    Contains,
    Calls,
    Imports,
    Inherits,
    ReadsVar,
    WritesVar,
    Throws,
    Handles,
    HasDecorator,
    ReturnsValue,
    UsesService,
}

impl EdgeKind {
    /// Wire-format label, e.g. `CALLS`. Used by the renderers and CLI output.
    pub fn label(&self) -> &'static str {
        match self {
            EdgeKind::Contains => "CONTAINS",
            EdgeKind::Calls => "CALLS",
            EdgeKind::Imports => "IMPORTS",
            EdgeKind::Inherits => "INHERITS",
            EdgeKind::ReadsVar => "READS_VAR",
            EdgeKind::WritesVar => "WRITES_VAR",
            EdgeKind::Throws => "THROWS",
            EdgeKind::Handles => "HANDLES",
            EdgeKind::HasDecorator => "HAS_DECORATOR",
            EdgeKind::ReturnsValue => "RETURNS_VALUE",
            EdgeKind::UsesService => "USES_SERVICE",
        }
    }
}

/// Where in the analyzed sources a node was declared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLocation {
    pub unit: String,
    pub line: u32,
}

/// A single node in the code graph.
///
/// The `id` is globally unique after assembly and follows the scheme in
/// [`crate::ident`]; two extractions of the same source produce the same ids.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: String,
    pub kind: NodeKind,
    pub name: String,
    pub location: Option<SourceLocation>,
    /// First line of the declaration's docstring, when one exists.
    pub doc: Option<String>,
}

/// A directed edge between two node ids.
///
/// Targets are plain strings and are allowed to dangle: a `CALLS` or
/// `INHERITS` target may name a symbol never declared in any analyzed unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphEdge {
    pub source: String,
    pub target: String,
    pub kind: EdgeKind,
    pub line: Option<u32>,
}

/// Everything one walker pass over a single unit produced.
///
/// This is the per-extraction local accumulator handed to the assembler;
/// it carries no cross-file knowledge.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UnitExtraction {
    pub unit: String,
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}
