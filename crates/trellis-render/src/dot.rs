//! DOT diagram emission

use std::collections::BTreeMap;
use std::fmt::Write;

use trellis_core::{CodeGraph, EdgeKind, GraphNode, NodeKind};

/// Rendering knobs for [`render_dot`].
#[derive(Debug, Clone, Default)]
pub struct DotOptions {
    /// Group declared nodes into one cluster per declaring unit.
    pub cluster_by_unit: bool,
    /// Keep only elements whose kind label contains this substring,
    /// e.g. `CALLS` or `callable`.
    pub kind_filter: Option<String>,
}

fn node_style(kind: NodeKind) -> (&'static str, &'static str) {
    match kind {
        NodeKind::Unit => ("folder", "#ADD8E6"),
        NodeKind::Type => ("component", "#90EE90"),
        NodeKind::Callable | NodeKind::MemberCallable => ("ellipse", "#FFD700"),
        NodeKind::Variable => ("note", "#E6E6FA"),
        NodeKind::DecoratorTag => ("tab", "#FFE4B5"),
        NodeKind::ExceptionSite => ("octagon", "#FFA07A"),
        NodeKind::HandlerSite => ("house", "#98FB98"),
        NodeKind::ReturnSite => ("cds", "#FFFACD"),
        NodeKind::ExternalService => ("cylinder", "#D3D3D3"),
    }
}

fn edge_style(kind: EdgeKind) -> (&'static str, &'static str, bool) {
    // (color, style, labelled)
    match kind {
        EdgeKind::Contains => ("gray", "dotted", false),
        EdgeKind::Calls => ("blue", "bold", true),
        EdgeKind::Imports => ("green", "dashed", true),
        EdgeKind::Inherits => ("purple", "solid", true),
        EdgeKind::ReadsVar => ("darkcyan", "solid", true),
        EdgeKind::WritesVar => ("darkorange", "solid", true),
        EdgeKind::Throws => ("red", "solid", true),
        EdgeKind::Handles => ("darkgreen", "solid", true),
        EdgeKind::HasDecorator => ("sienna", "dashed", true),
        EdgeKind::ReturnsValue => ("black", "solid", true),
        EdgeKind::UsesService => ("magenta", "bold", true),
    }
}

fn escape(text: &str) -> String {
    text.replace('\\', "\\\\").replace('"', "\\\"")
}

fn keeps(filter: Option<&str>, label: &str) -> bool {
    filter.map_or(true, |f| label.contains(f))
}

fn node_line(node: &GraphNode) -> String {
    let (shape, fill) = node_style(node.kind);
    let mut label = escape(&node.name);
    if let Some(doc) = &node.doc {
        let _ = write!(label, "\\n({})", escape(doc));
    }
    format!(
        "  \"{}\" [label=\"{}\", shape={}, style=filled, fillcolor=\"{}\", type=\"{}\"];\n",
        escape(&node.id),
        label,
        shape,
        fill,
        node.kind.label()
    )
}

/// Render the assembled graph as a DOT digraph.
///
/// Dangling edge endpoints — ids no unit ever declared — render as plain
/// boxes labelled by id, so every edge remains visible.
pub fn render_dot(graph: &CodeGraph, options: &DotOptions) -> String {
    let filter = options.kind_filter.as_deref();

    let mut out = String::from("digraph CodeFlow {\n  rankdir=LR;\n  node [shape=box];\n");

    if options.cluster_by_unit {
        // Declared nodes with a source location group under their unit.
        let mut clusters: BTreeMap<&str, Vec<&GraphNode>> = BTreeMap::new();
        let mut free: Vec<&GraphNode> = Vec::new();
        for node in graph.nodes() {
            if !keeps(filter, node.kind.label()) {
                continue;
            }
            match &node.location {
                Some(loc) => clusters.entry(loc.unit.as_str()).or_default().push(node),
                None => free.push(node),
            }
        }
        for (i, (unit, members)) in clusters.iter().enumerate() {
            let _ = write!(out, "  subgraph cluster_{i} {{\n    label=\"{}\";\n", escape(unit));
            for node in members {
                out.push_str("  ");
                out.push_str(&node_line(node));
            }
            out.push_str("  }\n");
        }
        for node in free {
            out.push_str(&node_line(node));
        }
    } else {
        for node in graph.nodes() {
            if keeps(filter, node.kind.label()) {
                out.push_str(&node_line(node));
            }
        }
    }

    for id in graph.dangling_ids() {
        let _ = write!(
            out,
            "  \"{}\" [label=\"{}\", shape=box, style=filled, fillcolor=\"white\", type=\"external\"];\n",
            escape(id),
            escape(id)
        );
    }

    for edge in graph.edges() {
        let label = edge.kind.label();
        if !keeps(filter, label) {
            continue;
        }
        let (color, style, labelled) = edge_style(edge.kind);
        let _ = write!(
            out,
            "  \"{}\" -> \"{}\" [label=\"{}\", color=\"{}\", style={}, type=\"{}\"];\n",
            escape(&edge.source),
            escape(&edge.target),
            if labelled { label } else { "" },
            color,
            style,
            label
        );
    }

    out.push_str("}\n");
    out
}
