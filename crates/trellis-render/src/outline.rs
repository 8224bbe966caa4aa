//! Nested outline emission
//!
//! The outline roots at nodes with no incoming edges (units, normally) and
//! groups each node's children by outgoing edge kind. Malformed inputs can
//! produce cycles (mutual inheritance, containment loops), so every branch
//! carries a visited set and terminates on revisit instead of recursing.

use std::collections::HashSet;
use std::fmt::Write;

use serde::Serialize;
use trellis_core::{CodeGraph, EdgeKind};

/// One outline entry, serializable as `{content, children}`.
#[derive(Debug, Clone, Serialize)]
pub struct OutlineNode {
    pub content: String,
    pub children: Vec<OutlineNode>,
}

// Grouping order for a node's outgoing edges.
const KIND_ORDER: [EdgeKind; 11] = [
    EdgeKind::Contains,
    EdgeKind::Imports,
    EdgeKind::Inherits,
    EdgeKind::Calls,
    EdgeKind::ReadsVar,
    EdgeKind::WritesVar,
    EdgeKind::Throws,
    EdgeKind::Handles,
    EdgeKind::HasDecorator,
    EdgeKind::ReturnsValue,
    EdgeKind::UsesService,
];

fn display(graph: &CodeGraph, id: &str) -> String {
    match graph.node(id) {
        Some(node) => format!("{} [{}]", node.name, node.kind.label()),
        None => id.to_string(),
    }
}

fn branch(graph: &CodeGraph, id: &str, visited: &mut HashSet<String>) -> OutlineNode {
    let content = display(graph, id);
    if !visited.insert(id.to_string()) {
        // Revisit within this branch: stop here.
        return OutlineNode {
            content,
            children: Vec::new(),
        };
    }

    let mut children = Vec::new();
    for kind in KIND_ORDER {
        let targets: Vec<&str> = graph
            .edges_out_of(id)
            .filter(|e| e.kind == kind)
            .map(|e| e.target.as_str())
            .collect();
        if targets.is_empty() {
            continue;
        }
        let mut group = OutlineNode {
            content: kind.label().to_string(),
            children: Vec::new(),
        };
        for target in targets {
            group.children.push(branch(graph, target, visited));
        }
        children.push(group);
    }

    visited.remove(id);
    OutlineNode { content, children }
}

/// Build the outline forest for a graph.
///
/// When every node has an incoming edge (no natural roots), the first
/// declared node serves as an arbitrary root; an empty graph yields an
/// empty forest.
pub fn build_outline(graph: &CodeGraph) -> Vec<OutlineNode> {
    let mut roots = graph.source_ids();
    if roots.is_empty() {
        roots = graph.nodes().take(1).map(|n| n.id.as_str()).collect();
    }

    roots
        .into_iter()
        .map(|id| {
            let mut visited = HashSet::new();
            branch(graph, id, &mut visited)
        })
        .collect()
}

fn write_markdown(node: &OutlineNode, depth: usize, out: &mut String) {
    let _ = writeln!(out, "{}- {}", "  ".repeat(depth), node.content);
    for child in &node.children {
        write_markdown(child, depth + 1, out);
    }
}

/// Render the outline forest as a nested markdown list, one `#` heading
/// per root.
pub fn outline_to_markdown(roots: &[OutlineNode]) -> String {
    let mut out = String::new();
    for root in roots {
        let _ = writeln!(out, "# {}", root.content);
        for child in &root.children {
            write_markdown(child, 0, &mut out);
        }
    }
    out
}
