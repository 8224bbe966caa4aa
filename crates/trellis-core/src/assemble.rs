//! Merging per-unit extraction results into one graph

use crate::graph::CodeGraph;
use crate::model::UnitExtraction;

/// Merge extraction results in input order into a single graph.
///
/// Node records are deduplicated by id (first write wins, so input order
/// decides which record's optional attributes survive a collision) and
/// edges by (source, target, kind). Edge targets are never validated;
/// dangling references are an expected outcome of name-only resolution.
pub fn assemble<I>(parts: I) -> CodeGraph
where
    I: IntoIterator<Item = UnitExtraction>,
{
    let mut graph = CodeGraph::new();
    for part in parts {
        merge_unit(&mut graph, part);
    }
    graph
}

/// Merge one unit's records into an existing graph.
///
/// A malformed record (empty id or empty edge endpoint) is dropped with a
/// warning; it never aborts the rest of the merge.
pub fn merge_unit(graph: &mut CodeGraph, part: UnitExtraction) {
    for node in part.nodes {
        if node.id.is_empty() {
            tracing::warn!(unit = %part.unit, "dropping node record with empty id");
            continue;
        }
        graph.insert_node(node);
    }

    for edge in part.edges {
        if edge.source.is_empty() || edge.target.is_empty() {
            tracing::warn!(
                unit = %part.unit,
                kind = edge.kind.label(),
                "dropping edge record with empty endpoint"
            );
            continue;
        }
        graph.insert_edge(edge);
    }
}
