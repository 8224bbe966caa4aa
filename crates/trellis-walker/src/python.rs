//! Python syntax walker using tree-sitter
//!
//! The walker is a single-pass, per-file syntactic approximation. It has
//! no scope or type resolution: call and inheritance targets are resolved
//! by bare name into `"<unit>:<name>"` ids that may dangle, and variable
//! accesses key on the bare name alone. Both are deliberate precision
//! trades, carried through to the query layer unchanged.

use std::collections::HashSet;
use std::path::Path;

use tree_sitter::{Node, Parser};
use trellis_core::{
    ident, EdgeKind, GraphEdge, GraphNode, NodeKind, SourceLocation, UnitExtraction,
};

use crate::services::{default_patterns, ServicePattern};
use crate::{SourceWalker, WalkError};

pub struct PythonWalker {
    patterns: Vec<ServicePattern>,
}

impl PythonWalker {
    pub fn new() -> Self {
        Self::with_patterns(default_patterns())
    }

    /// Use a caller-supplied connector pattern table instead of the
    /// built-in one.
    pub fn with_patterns(patterns: Vec<ServicePattern>) -> Self {
        PythonWalker { patterns }
    }
}

impl Default for PythonWalker {
    fn default() -> Self {
        Self::new()
    }
}

impl SourceWalker for PythonWalker {
    fn walk(&self, unit: &str, source: &str) -> Result<UnitExtraction, WalkError> {
        let mut parser = Parser::new();
        parser.set_language(&tree_sitter_python::LANGUAGE.into())?;

        let tree = parser.parse(source, None).ok_or_else(|| WalkError::Parse {
            unit: unit.to_string(),
        })?;
        let root = tree.root_node();
        if root.has_error() {
            return Err(WalkError::Syntax {
                unit: unit.to_string(),
                line: first_error_line(root),
            });
        }

        let mut acc = UnitAccumulator::new(unit);
        acc.push_node(GraphNode {
            id: unit.to_string(),
            kind: NodeKind::Unit,
            name: unit_display_name(unit),
            location: Some(SourceLocation {
                unit: unit.to_string(),
                line: 1,
            }),
            doc: None,
        });

        let src = source.as_bytes();
        let armed = collect_imports(&self.patterns, root, src, &mut acc);
        tracing::debug!(unit, services = armed.len(), "walking unit");

        let pass = WalkPass { unit, src, armed };
        pass.visit(root, unit, None, &mut acc);

        Ok(acc.finish())
    }
}

/// Per-extraction local accumulator. Node inserts are idempotent by id
/// (first declaration wins, so a later same-named declaration in the unit
/// cannot clobber a node that decorators or edges already reference) and
/// edge inserts by (source, target, kind).
struct UnitAccumulator {
    unit: String,
    nodes: Vec<GraphNode>,
    seen_nodes: HashSet<String>,
    edges: Vec<GraphEdge>,
    seen_edges: HashSet<(String, String, EdgeKind)>,
}

impl UnitAccumulator {
    fn new(unit: &str) -> Self {
        UnitAccumulator {
            unit: unit.to_string(),
            nodes: Vec::new(),
            seen_nodes: HashSet::new(),
            edges: Vec::new(),
            seen_edges: HashSet::new(),
        }
    }

    /// Returns true when the node was actually created.
    fn push_node(&mut self, node: GraphNode) -> bool {
        if !self.seen_nodes.insert(node.id.clone()) {
            return false;
        }
        self.nodes.push(node);
        true
    }

    fn push_edge(&mut self, source: &str, target: &str, kind: EdgeKind, line: Option<u32>) {
        let key = (source.to_string(), target.to_string(), kind);
        if !self.seen_edges.insert(key) {
            return;
        }
        self.edges.push(GraphEdge {
            source: source.to_string(),
            target: target.to_string(),
            kind,
            line,
        });
    }

    fn finish(self) -> UnitExtraction {
        UnitExtraction {
            unit: self.unit,
            nodes: self.nodes,
            edges: self.edges,
        }
    }
}

/// Shared context for one walk over one unit's tree.
struct WalkPass<'a> {
    unit: &'a str,
    src: &'a [u8],
    armed: Vec<ServicePattern>,
}

impl WalkPass<'_> {
    /// Recursive visitor. `scope` is the innermost enclosing
    /// callable/type/unit id; `enclosing_type` is set while directly
    /// inside a class body so function definitions become members.
    fn visit(&self, node: Node, scope: &str, enclosing_type: Option<&str>, acc: &mut UnitAccumulator) {
        match node.kind() {
            "decorated_definition" => {
                let decorators = bare_decorator_names(node, self.src);
                if let Some(def) = node.child_by_field_name("definition") {
                    self.declare(def, enclosing_type, &decorators, acc);
                }
            }
            "function_definition" | "class_definition" => {
                self.declare(node, enclosing_type, &[], acc);
            }

            // Imports were handled in the pre-scan.
            "import_statement" | "import_from_statement" => {}

            "call" => {
                self.record_call(node, scope, acc);
                self.visit_children(node, scope, enclosing_type, acc);
            }

            "assignment" | "augmented_assignment" => {
                if let Some(left) = node.child_by_field_name("left") {
                    self.record_write_targets(left, scope, acc);
                }
                if let Some(right) = node.child_by_field_name("right") {
                    self.visit(right, scope, enclosing_type, acc);
                }
            }
            "for_statement" => {
                let left = node.child_by_field_name("left");
                if let Some(target) = left {
                    self.record_write_targets(target, scope, acc);
                }
                let mut cursor = node.walk();
                for child in node.named_children(&mut cursor) {
                    if Some(child.id()) == left.map(|n| n.id()) {
                        continue;
                    }
                    self.visit(child, scope, enclosing_type, acc);
                }
            }

            "raise_statement" => {
                let line = line_of(node);
                let id = ident::exception_site(line);
                if acc.push_node(GraphNode {
                    id: id.clone(),
                    kind: NodeKind::ExceptionSite,
                    name: format!("raise@{line}"),
                    location: Some(SourceLocation {
                        unit: self.unit.to_string(),
                        line,
                    }),
                    doc: None,
                }) {
                    acc.push_edge(scope, &id, EdgeKind::Contains, Some(line));
                }
                acc.push_edge(scope, &id, EdgeKind::Throws, Some(line));
                self.visit_children(node, scope, enclosing_type, acc);
            }
            "try_statement" => {
                let line = line_of(node);
                let id = ident::handler_site(line);
                if acc.push_node(GraphNode {
                    id: id.clone(),
                    kind: NodeKind::HandlerSite,
                    name: format!("try@{line}"),
                    location: Some(SourceLocation {
                        unit: self.unit.to_string(),
                        line,
                    }),
                    doc: None,
                }) {
                    acc.push_edge(scope, &id, EdgeKind::Contains, Some(line));
                }
                acc.push_edge(scope, &id, EdgeKind::Handles, Some(line));
                self.visit_children(node, scope, enclosing_type, acc);
            }
            "return_statement" => {
                if node.named_child_count() > 0 {
                    let line = line_of(node);
                    let id = ident::return_site(line);
                    if acc.push_node(GraphNode {
                        id: id.clone(),
                        kind: NodeKind::ReturnSite,
                        name: format!("return@{line}"),
                        location: Some(SourceLocation {
                            unit: self.unit.to_string(),
                            line,
                        }),
                        doc: None,
                    }) {
                        acc.push_edge(scope, &id, EdgeKind::Contains, Some(line));
                    }
                    acc.push_edge(scope, &id, EdgeKind::ReturnsValue, Some(line));
                }
                self.visit_children(node, scope, enclosing_type, acc);
            }

            // Only the object side of an attribute access is a bare-name
            // read; the trailing attribute is never a variable.
            "attribute" => {
                if let Some(object) = node.child_by_field_name("object") {
                    self.visit(object, scope, enclosing_type, acc);
                }
            }
            "keyword_argument" => {
                if let Some(value) = node.child_by_field_name("value") {
                    self.visit(value, scope, enclosing_type, acc);
                }
            }

            "identifier" => {
                let name = text(node, self.src);
                self.touch_variable(&name, scope, EdgeKind::ReadsVar, line_of(node), acc);
            }

            _ => self.visit_children(node, scope, enclosing_type, acc),
        }
    }

    fn visit_children(&self, node: Node, scope: &str, enclosing_type: Option<&str>, acc: &mut UnitAccumulator) {
        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            self.visit(child, scope, enclosing_type, acc);
        }
    }

    fn declare(&self, node: Node, enclosing_type: Option<&str>, decorators: &[String], acc: &mut UnitAccumulator) {
        match node.kind() {
            "function_definition" => self.declare_callable(node, enclosing_type, decorators, acc),
            "class_definition" => self.declare_type(node, decorators, acc),
            _ => {}
        }
    }

    fn declare_callable(
        &self,
        node: Node,
        enclosing_type: Option<&str>,
        decorators: &[String],
        acc: &mut UnitAccumulator,
    ) {
        let Some(name_node) = node.child_by_field_name("name") else {
            return;
        };
        let name = text(name_node, self.src);
        let id = ident::scoped(self.unit, &name);
        let line = line_of(node);
        let kind = if enclosing_type.is_some() {
            NodeKind::MemberCallable
        } else {
            NodeKind::Callable
        };

        let created = acc.push_node(GraphNode {
            id: id.clone(),
            kind,
            name: name.clone(),
            location: Some(SourceLocation {
                unit: self.unit.to_string(),
                line,
            }),
            doc: docstring(node, self.src),
        });
        if created {
            let parent = enclosing_type.unwrap_or(self.unit);
            acc.push_edge(parent, &id, EdgeKind::Contains, Some(line));
        }

        self.attach_decorators(&id, decorators, line, acc);

        // The body is a fresh scope: calls and accesses inside it belong
        // to this callable, not to whatever lexically surrounds it.
        if let Some(body) = node.child_by_field_name("body") {
            self.visit(body, &id, None, acc);
        }
    }

    fn declare_type(&self, node: Node, decorators: &[String], acc: &mut UnitAccumulator) {
        let Some(name_node) = node.child_by_field_name("name") else {
            return;
        };
        let name = text(name_node, self.src);
        let id = ident::scoped(self.unit, &name);
        let line = line_of(node);

        let created = acc.push_node(GraphNode {
            id: id.clone(),
            kind: NodeKind::Type,
            name: name.clone(),
            location: Some(SourceLocation {
                unit: self.unit.to_string(),
                line,
            }),
            doc: docstring(node, self.src),
        });
        if created {
            acc.push_edge(self.unit, &id, EdgeKind::Contains, Some(line));
        }

        // Only bases resolvable as bare names produce inheritance edges;
        // the target may dangle if the base is undeclared here.
        if let Some(superclasses) = node.child_by_field_name("superclasses") {
            let mut cursor = superclasses.walk();
            for base in superclasses.named_children(&mut cursor) {
                if base.kind() == "identifier" {
                    let base_name = text(base, self.src);
                    acc.push_edge(
                        &id,
                        &ident::scoped(self.unit, &base_name),
                        EdgeKind::Inherits,
                        Some(line),
                    );
                }
            }
        }

        self.attach_decorators(&id, decorators, line, acc);

        if let Some(body) = node.child_by_field_name("body") {
            let mut cursor = body.walk();
            for child in body.named_children(&mut cursor) {
                self.visit(child, &id, Some(&id), acc);
            }
        }
    }

    fn attach_decorators(&self, decorated: &str, decorators: &[String], line: u32, acc: &mut UnitAccumulator) {
        for name in decorators {
            let id = ident::decorator(name);
            if acc.push_node(GraphNode {
                id: id.clone(),
                kind: NodeKind::DecoratorTag,
                name: name.clone(),
                location: None,
                doc: None,
            }) {
                acc.push_edge(self.unit, &id, EdgeKind::Contains, None);
            }
            acc.push_edge(decorated, &id, EdgeKind::HasDecorator, Some(line));
        }
    }

    fn record_call(&self, node: Node, scope: &str, acc: &mut UnitAccumulator) {
        let Some(function) = node.child_by_field_name("function") else {
            return;
        };
        let line = line_of(node);

        if let Some(path) = dotted_path(function, self.src) {
            let callee = ident::bare_name(&path);
            acc.push_edge(
                scope,
                &ident::scoped(self.unit, callee),
                EdgeKind::Calls,
                Some(line),
            );
            for pattern in &self.armed {
                if pattern.matches_call(&path) {
                    acc.push_edge(
                        scope,
                        &ident::service(&pattern.service),
                        EdgeKind::UsesService,
                        Some(line),
                    );
                }
            }
        } else if function.kind() == "attribute" {
            // Call through a computed object, e.g. conn.cursor().execute().
            // Only the trailing attribute name resolves.
            if let Some(attr) = function.child_by_field_name("attribute") {
                let callee = text(attr, self.src);
                acc.push_edge(
                    scope,
                    &ident::scoped(self.unit, &callee),
                    EdgeKind::Calls,
                    Some(line),
                );
            }
        }
    }

    /// Assignment targets. Bare names become writes; tuple and list
    /// patterns are unpacked; attribute and subscript targets are not
    /// bare names, so only their object side is visited (as reads).
    fn record_write_targets(&self, target: Node, scope: &str, acc: &mut UnitAccumulator) {
        match target.kind() {
            "identifier" => {
                let name = text(target, self.src);
                self.touch_variable(&name, scope, EdgeKind::WritesVar, line_of(target), acc);
            }
            "pattern_list" | "tuple_pattern" | "list_pattern" | "parenthesized_expression" => {
                let mut cursor = target.walk();
                for child in target.named_children(&mut cursor) {
                    self.record_write_targets(child, scope, acc);
                }
            }
            _ => self.visit(target, scope, None, acc),
        }
    }

    fn touch_variable(
        &self,
        name: &str,
        scope: &str,
        access: EdgeKind,
        line: u32,
        acc: &mut UnitAccumulator,
    ) {
        let id = ident::variable(name);
        if acc.push_node(GraphNode {
            id: id.clone(),
            kind: NodeKind::Variable,
            name: name.to_string(),
            location: None,
            doc: None,
        }) {
            acc.push_edge(scope, &id, EdgeKind::Contains, None);
        }
        acc.push_edge(scope, &id, access, Some(line));
    }
}

/// Pre-scan for import statements. Emits the `IMPORTS` edges, and arms
/// any connector patterns the unit's imports match, creating their
/// `external_service` nodes up front.
fn collect_imports(
    patterns: &[ServicePattern],
    root: Node,
    src: &[u8],
    acc: &mut UnitAccumulator,
) -> Vec<ServicePattern> {
    let unit = acc.unit.clone();
    let mut modules = Vec::new();
    scan_imports(root, src, &unit, acc, &mut modules);

    let armed: Vec<ServicePattern> = patterns
        .iter()
        .filter(|p| modules.iter().any(|m| p.matches_import(m)))
        .cloned()
        .collect();

    for pattern in &armed {
        let id = ident::service(&pattern.service);
        if acc.push_node(GraphNode {
            id: id.clone(),
            kind: NodeKind::ExternalService,
            name: pattern.service.clone(),
            location: None,
            doc: None,
        }) {
            acc.push_edge(&unit, &id, EdgeKind::Contains, None);
        }
    }

    armed
}

fn scan_imports(node: Node, src: &[u8], unit: &str, acc: &mut UnitAccumulator, modules: &mut Vec<String>) {
    match node.kind() {
        "import_statement" => {
            let line = line_of(node);
            let mut cursor = node.walk();
            for child in node.named_children(&mut cursor) {
                let module = match child.kind() {
                    "dotted_name" => text(child, src),
                    "aliased_import" => child
                        .child_by_field_name("name")
                        .map(|n| text(n, src))
                        .unwrap_or_default(),
                    _ => continue,
                };
                if !module.is_empty() {
                    acc.push_edge(unit, &module, EdgeKind::Imports, Some(line));
                    modules.push(module);
                }
            }
        }
        "import_from_statement" => {
            let line = line_of(node);
            let module = node
                .child_by_field_name("module_name")
                .map(|n| text(n, src))
                .unwrap_or_default();

            let mut named_any = false;
            let mut cursor = node.walk();
            for name_node in node.children_by_field_name("name", &mut cursor) {
                let imported = match name_node.kind() {
                    "dotted_name" => text(name_node, src),
                    "aliased_import" => name_node
                        .child_by_field_name("name")
                        .map(|n| text(n, src))
                        .unwrap_or_default(),
                    _ => String::new(),
                };
                if imported.is_empty() {
                    continue;
                }
                named_any = true;
                let target = format!("{module}.{imported}");
                acc.push_edge(unit, &target, EdgeKind::Imports, Some(line));
                modules.push(target);
            }

            // `from pkg import *` names nothing explicitly.
            if !named_any && !module.is_empty() {
                acc.push_edge(unit, &module, EdgeKind::Imports, Some(line));
                modules.push(module);
            }
        }
        _ => {
            let mut cursor = node.walk();
            for child in node.named_children(&mut cursor) {
                scan_imports(child, src, unit, acc, modules);
            }
        }
    }
}

/// Dotted path of a plain identifier/attribute chain, or None when the
/// chain passes through anything else (a call result, a subscript).
fn dotted_path(node: Node, src: &[u8]) -> Option<String> {
    match node.kind() {
        "identifier" => Some(text(node, src)),
        "attribute" => {
            let object = dotted_path(node.child_by_field_name("object")?, src)?;
            let attr = text(node.child_by_field_name("attribute")?, src);
            Some(format!("{object}.{attr}"))
        }
        _ => None,
    }
}

/// Bare decorator names on a decorated definition. Decorators that are
/// calls or attribute paths are skipped; only `@name` resolves.
fn bare_decorator_names(node: Node, src: &[u8]) -> Vec<String> {
    let mut names = Vec::new();
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        if child.kind() != "decorator" {
            continue;
        }
        if let Some(expr) = child.named_child(0) {
            if expr.kind() == "identifier" {
                names.push(text(expr, src));
            }
        }
    }
    names
}

/// First line of a definition's docstring, if its body starts with one.
fn docstring(def: Node, src: &[u8]) -> Option<String> {
    let body = def.child_by_field_name("body")?;
    let first = body.named_child(0)?;
    if first.kind() != "expression_statement" {
        return None;
    }
    let expr = first.named_child(0)?;
    if expr.kind() != "string" {
        return None;
    }
    let raw = text(expr, src);
    let stripped = raw
        .trim_start_matches(['r', 'b', 'u', 'f', 'R', 'B', 'U', 'F'])
        .trim_matches(|c| c == '"' || c == '\'');
    let line = stripped.lines().map(str::trim).find(|l| !l.is_empty())?;
    Some(line.to_string())
}

fn text(node: Node, src: &[u8]) -> String {
    node.utf8_text(src).unwrap_or("").to_string()
}

fn line_of(node: Node) -> u32 {
    node.start_position().row as u32 + 1
}

fn first_error_line(node: Node) -> u32 {
    if node.is_error() || node.is_missing() {
        return line_of(node);
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.has_error() {
            return first_error_line(child);
        }
    }
    line_of(node)
}

fn unit_display_name(unit: &str) -> String {
    Path::new(unit)
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| unit.to_string())
}
