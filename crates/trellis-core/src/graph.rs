//! Graph wrapper using petgraph::StableDiGraph keyed by string node ids

use crate::model::{EdgeKind, GraphEdge, GraphNode};
use petgraph::stable_graph::{NodeIndex, StableDiGraph};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use std::collections::{HashMap, HashSet};

/// One endpoint position in the graph.
///
/// An edge may reference an id that no analyzed unit ever declared
/// (external library symbol, dynamic dispatch target). Such endpoints
/// occupy a slot with no record, so the edge is representable while
/// `nodes()` still reports only declared elements.
#[derive(Debug)]
struct NodeSlot {
    id: String,
    record: Option<GraphNode>,
}

/// The assembled code graph — a directed multigraph over string ids.
///
/// Nodes are deduplicated by id (first record wins) and edges by
/// (source, target, kind). Once assembly finishes the graph is only read.
pub struct CodeGraph {
    inner: StableDiGraph<NodeSlot, GraphEdge>,
    ids: HashMap<String, NodeIndex>,
    edge_keys: HashSet<(NodeIndex, NodeIndex, EdgeKind)>,
    record_count: usize,
}

impl std::fmt::Debug for CodeGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CodeGraph")
            .field("node_count", &self.record_count)
            .field("edge_count", &self.inner.edge_count())
            .finish()
    }
}

impl CodeGraph {
    pub fn new() -> Self {
        CodeGraph {
            inner: StableDiGraph::new(),
            ids: HashMap::new(),
            edge_keys: HashSet::new(),
            record_count: 0,
        }
    }

    fn slot_index(&mut self, id: &str) -> NodeIndex {
        if let Some(&idx) = self.ids.get(id) {
            return idx;
        }
        let idx = self.inner.add_node(NodeSlot {
            id: id.to_string(),
            record: None,
        });
        self.ids.insert(id.to_string(), idx);
        idx
    }

    /// Insert a node record. The first record for an id wins; a later
    /// insert for the same id is a no-op and returns false.
    pub fn insert_node(&mut self, node: GraphNode) -> bool {
        let idx = self.slot_index(&node.id);
        let slot = &mut self.inner[idx];
        if slot.record.is_some() {
            return false;
        }
        slot.record = Some(node);
        self.record_count += 1;
        true
    }

    /// Insert an edge. Endpoints need not be declared nodes; a missing
    /// endpoint becomes a recordless slot. Returns false when an edge
    /// with the same (source, target, kind) already exists.
    pub fn insert_edge(&mut self, edge: GraphEdge) -> bool {
        let source = self.slot_index(&edge.source);
        let target = self.slot_index(&edge.target);
        if !self.edge_keys.insert((source, target, edge.kind)) {
            return false;
        }
        self.inner.add_edge(source, target, edge);
        true
    }

    /// Get a declared node record by exact id.
    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        let idx = *self.ids.get(id)?;
        self.inner[idx].record.as_ref()
    }

    /// Whether any edge references this id, declared or not.
    pub fn mentions(&self, id: &str) -> bool {
        self.ids.contains_key(id)
    }

    /// Number of declared node records (recordless endpoint slots excluded).
    pub fn node_count(&self) -> usize {
        self.record_count
    }

    /// Total number of edges.
    pub fn edge_count(&self) -> usize {
        self.inner.edge_count()
    }

    /// Iterate over declared node records in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &GraphNode> {
        self.inner
            .node_indices()
            .filter_map(move |idx| self.inner[idx].record.as_ref())
    }

    /// Iterate over all edges in insertion order.
    pub fn edges(&self) -> impl Iterator<Item = &GraphEdge> {
        self.inner
            .edge_indices()
            .filter_map(move |idx| self.inner.edge_weight(idx))
    }

    /// All edges whose target is exactly `id`.
    pub fn edges_into<'g>(&'g self, id: &str) -> impl Iterator<Item = &'g GraphEdge> {
        let idx = self.ids.get(id).copied();
        idx.into_iter().flat_map(move |idx| {
            self.inner
                .edges_directed(idx, Direction::Incoming)
                .map(|edge_ref| edge_ref.weight())
        })
    }

    /// All edges whose source is exactly `id`.
    pub fn edges_out_of<'g>(&'g self, id: &str) -> impl Iterator<Item = &'g GraphEdge> {
        let idx = self.ids.get(id).copied();
        idx.into_iter().flat_map(move |idx| {
            self.inner
                .edges_directed(idx, Direction::Outgoing)
                .map(|edge_ref| edge_ref.weight())
        })
    }

    /// Ids referenced by some edge but never declared as a node.
    pub fn dangling_ids(&self) -> impl Iterator<Item = &str> {
        self.inner
            .node_indices()
            .filter(move |&idx| self.inner[idx].record.is_none())
            .map(move |idx| self.inner[idx].id.as_str())
    }

    /// Ids with no incoming edges of any kind. Used as outline roots.
    pub fn source_ids(&self) -> Vec<&str> {
        self.inner
            .node_indices()
            .filter(|&idx| {
                self.inner
                    .edges_directed(idx, Direction::Incoming)
                    .next()
                    .is_none()
            })
            .map(|idx| self.inner[idx].id.as_str())
            .collect()
    }

    /// All ids that are ancestors of `id` along `CONTAINS` edges.
    pub fn containing_ancestors(&self, id: &str) -> HashSet<String> {
        let mut ancestors = HashSet::new();
        let Some(&start) = self.ids.get(id) else {
            return ancestors;
        };
        let mut to_visit = vec![start];

        while let Some(current) = to_visit.pop() {
            for edge_ref in self.inner.edges_directed(current, Direction::Incoming) {
                let edge = edge_ref.weight();
                if edge.kind == EdgeKind::Contains && ancestors.insert(edge.source.clone()) {
                    to_visit.push(edge_ref.source());
                }
            }
        }

        ancestors
    }
}

impl Default for CodeGraph {
    fn default() -> Self {
        Self::new()
    }
}
