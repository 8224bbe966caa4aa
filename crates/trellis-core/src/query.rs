//! Read-only structural queries over the assembled graph
//!
//! Every operation is a linear or index-backed scan and returns an empty
//! result on a miss; nothing here mutates the graph or fails for a
//! well-formed query. The `*_of` name lookups match by substring on ids
//! (a query for `greet` matches `mod.py:greet`), which trades precision
//! for ergonomics — colliding names across units produce extra hits.

use crate::graph::CodeGraph;
use crate::ident;
use crate::model::{EdgeKind, GraphNode, NodeKind};
use serde::Serialize;

/// One query result: an id plus the declared record behind it, if any.
///
/// A hit with no record is a dangling reference — legal, per the data
/// model — and still identifies the symbol by id.
#[derive(Debug, Clone, Serialize)]
pub struct QueryHit<'g> {
    pub id: &'g str,
    pub node: Option<&'g GraphNode>,
}

/// Stateless facade answering structural questions about the graph.
pub struct QueryEngine<'g> {
    graph: &'g CodeGraph,
}

impl<'g> QueryEngine<'g> {
    pub fn new(graph: &'g CodeGraph) -> Self {
        QueryEngine { graph }
    }

    fn hit(&self, id: &'g str) -> QueryHit<'g> {
        QueryHit {
            id,
            node: self.graph.node(id),
        }
    }

    /// Free functions declared in a unit, matched by id substring.
    pub fn functions_in_unit(&self, unit: &str) -> Vec<&'g GraphNode> {
        self.graph
            .nodes()
            .filter(|n| n.kind == NodeKind::Callable && n.id.contains(unit))
            .collect()
    }

    /// Scopes with a `CALLS` edge whose target id contains `name`.
    pub fn callers_of(&self, name: &str) -> Vec<QueryHit<'g>> {
        self.graph
            .edges()
            .filter(|e| e.kind == EdgeKind::Calls && e.target.contains(name))
            .map(|e| self.hit(&e.source))
            .collect()
    }

    /// Targets of `CALLS` edges out of scopes whose id contains `name`.
    pub fn callees_of(&self, name: &str) -> Vec<QueryHit<'g>> {
        self.graph
            .edges()
            .filter(|e| e.kind == EdgeKind::Calls && e.source.contains(name))
            .map(|e| self.hit(&e.target))
            .collect()
    }

    /// First declared node whose id contains the fragment.
    pub fn node_details(&self, fragment: &str) -> Option<&'g GraphNode> {
        self.graph.nodes().find(|n| n.id.contains(fragment))
    }

    /// Scopes that read the variable with this exact bare name.
    pub fn readers_of(&self, name: &str) -> Vec<QueryHit<'g>> {
        self.incoming_sources(&ident::variable(name), EdgeKind::ReadsVar)
    }

    /// Scopes that write the variable with this exact bare name.
    pub fn writers_of(&self, name: &str) -> Vec<QueryHit<'g>> {
        self.incoming_sources(&ident::variable(name), EdgeKind::WritesVar)
    }

    /// Scopes containing a raise statement.
    pub fn throwers(&self) -> Vec<QueryHit<'g>> {
        self.sources_of_kind(EdgeKind::Throws)
    }

    /// Scopes containing a try block.
    pub fn handlers(&self) -> Vec<QueryHit<'g>> {
        self.sources_of_kind(EdgeKind::Handles)
    }

    /// Nodes decorated with this exact bare decorator name.
    pub fn decorated_by(&self, name: &str) -> Vec<QueryHit<'g>> {
        self.incoming_sources(&ident::decorator(name), EdgeKind::HasDecorator)
    }

    /// Scopes containing a valued return statement.
    pub fn returners(&self) -> Vec<QueryHit<'g>> {
        self.sources_of_kind(EdgeKind::ReturnsValue)
    }

    /// Scopes whose call chain matched this external service's pattern.
    pub fn users_of_service(&self, name: &str) -> Vec<QueryHit<'g>> {
        self.incoming_sources(&ident::service(name), EdgeKind::UsesService)
    }

    fn incoming_sources(&self, target_id: &str, kind: EdgeKind) -> Vec<QueryHit<'g>> {
        self.graph
            .edges_into(target_id)
            .filter(|e| e.kind == kind)
            .map(|e| self.hit(&e.source))
            .collect()
    }

    fn sources_of_kind(&self, kind: EdgeKind) -> Vec<QueryHit<'g>> {
        self.graph
            .edges()
            .filter(|e| e.kind == kind)
            .map(|e| self.hit(&e.source))
            .collect()
    }
}
