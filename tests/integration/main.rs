//! End-to-end pipeline tests.
//!
//! A small two-unit Python codebase is walked, assembled, and queried
//! through the library crates, and then again through the installed
//! binary against a temp directory on disk.

use std::fs;
use std::process::Command;

use tempfile::TempDir;

use trellis_core::{assemble, CodeGraph, EdgeKind, NodeKind, QueryEngine};
use trellis_walker::{PythonWalker, SourceWalker};

const APP_PY: &str = r#"import snowflake.connector
from util import helper

@cached
def greet(name):
    """Greets the given name."""
    print(f"hello {name}")
    return helper(name)

class Greeter(Base):
    def say_hello(self):
        greeting = "hi"
        return greeting

def main():
    try:
        conn = snowflake.connector.connect(account="x")
    except Exception:
        raise
"#;

const UTIL_PY: &str = r#"def helper(name):
    return name.upper()
"#;

fn build_graph() -> CodeGraph {
    let walker = PythonWalker::new();
    let parts = vec![
        walker.walk("app.py", APP_PY).unwrap(),
        walker.walk("util.py", UTIL_PY).unwrap(),
    ];
    assemble(parts)
}

fn write_fixture() -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("app.py"), APP_PY).unwrap();
    fs::write(dir.path().join("util.py"), UTIL_PY).unwrap();
    dir
}

#[test]
fn cross_unit_calls_surface_callers_and_callees() {
    let graph = build_graph();
    let engine = QueryEngine::new(&graph);

    // greet calls helper; the callee id stays unit-local and dangles,
    // because helper is declared in util.py, not app.py.
    let callers: Vec<&str> = engine.callers_of("helper").iter().map(|h| h.id).collect();
    assert!(callers.contains(&"app.py:greet"));

    let callees = engine.callees_of("greet");
    let helper_hit = callees
        .iter()
        .find(|h| h.id == "app.py:helper")
        .expect("greet should call helper");
    assert!(helper_hit.node.is_none());
}

#[test]
fn class_declarations_become_types_with_members() {
    let graph = build_graph();
    let engine = QueryEngine::new(&graph);

    let greeter = engine.node_details("Greeter").expect("Greeter is declared");
    assert_eq!(greeter.kind, NodeKind::Type);

    let method = graph.node("app.py:say_hello").expect("method is declared");
    assert_eq!(method.kind, NodeKind::MemberCallable);

    assert!(graph.edges().any(|e| e.kind == EdgeKind::Contains
        && e.source == "app.py:Greeter"
        && e.target == "app.py:say_hello"));
    assert!(graph.edges().any(|e| e.kind == EdgeKind::Inherits
        && e.source == "app.py:Greeter"
        && e.target == "app.py:Base"));
}

#[test]
fn service_usage_is_attributed_to_the_calling_scope() {
    let graph = build_graph();
    let engine = QueryEngine::new(&graph);

    let service = graph
        .node("external_service:snowflake")
        .expect("import arms the connector pattern");
    assert_eq!(service.kind, NodeKind::ExternalService);

    let users: Vec<&str> = engine
        .users_of_service("snowflake")
        .iter()
        .map(|h| h.id)
        .collect();
    assert_eq!(users, vec!["app.py:main"]);
}

#[test]
fn variable_accesses_include_fstring_reads() {
    let graph = build_graph();
    let engine = QueryEngine::new(&graph);

    // `name` is only read inside f-string interpolation and a call in
    // greet; helper reads it too, under the same collapsed bare name.
    let readers: Vec<&str> = engine.readers_of("name").iter().map(|h| h.id).collect();
    assert!(readers.contains(&"app.py:greet"));
    assert!(readers.contains(&"util.py:helper"));

    let writers: Vec<&str> = engine.writers_of("greeting").iter().map(|h| h.id).collect();
    assert_eq!(writers, vec!["app.py:say_hello"]);
}

#[test]
fn exception_and_return_sites_point_back_at_scopes() {
    let graph = build_graph();
    let engine = QueryEngine::new(&graph);

    let throwers: Vec<&str> = engine.throwers().iter().map(|h| h.id).collect();
    assert_eq!(throwers, vec!["app.py:main"]);

    let handlers: Vec<&str> = engine.handlers().iter().map(|h| h.id).collect();
    assert_eq!(handlers, vec!["app.py:main"]);

    let returners: Vec<&str> = engine.returners().iter().map(|h| h.id).collect();
    assert!(returners.contains(&"app.py:greet"));
    assert!(returners.contains(&"app.py:say_hello"));
    assert!(returners.contains(&"util.py:helper"));
}

#[test]
fn decorated_definitions_are_queryable_by_tag() {
    let graph = build_graph();
    let engine = QueryEngine::new(&graph);

    let decorated: Vec<&str> = engine.decorated_by("cached").iter().map(|h| h.id).collect();
    assert_eq!(decorated, vec!["app.py:greet"]);
}

#[test]
fn assembling_the_same_units_twice_changes_nothing() {
    let walker = PythonWalker::new();
    let once = build_graph();

    let parts = vec![
        walker.walk("app.py", APP_PY).unwrap(),
        walker.walk("util.py", UTIL_PY).unwrap(),
        walker.walk("app.py", APP_PY).unwrap(),
        walker.walk("util.py", UTIL_PY).unwrap(),
    ];
    let twice = assemble(parts);

    assert_eq!(once.node_count(), twice.node_count());
    assert_eq!(once.edge_count(), twice.edge_count());
}

#[test]
fn cli_index_reports_graph_size() {
    let dir = write_fixture();
    let output = Command::new(env!("CARGO_BIN_EXE_trellis"))
        .args(["--root"])
        .arg(dir.path())
        .arg("index")
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("nodes"));
    assert!(stdout.contains("0 units skipped"));
}

#[test]
fn cli_query_emits_json() {
    let dir = write_fixture();
    let output = Command::new(env!("CARGO_BIN_EXE_trellis"))
        .args(["--root"])
        .arg(dir.path())
        .args(["query", "functions-in-unit", "app.py"])
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let value: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    let names: Vec<&str> = value
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|n| n["name"].as_str())
        .collect();
    assert!(names.contains(&"greet"));
    assert!(names.contains(&"main"));
    assert!(!names.contains(&"say_hello"));
}

#[test]
fn cli_renders_dot_and_outline() {
    let dir = write_fixture();

    let output = Command::new(env!("CARGO_BIN_EXE_trellis"))
        .args(["--root"])
        .arg(dir.path())
        .args(["dot", "--cluster"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let dot = String::from_utf8_lossy(&output.stdout);
    assert!(dot.starts_with("digraph CodeFlow {"));
    assert!(dot.contains("subgraph cluster_0"));

    let out_path = dir.path().join("outline.md");
    let output = Command::new(env!("CARGO_BIN_EXE_trellis"))
        .args(["--root"])
        .arg(dir.path())
        .arg("outline")
        .args(["--output"])
        .arg(&out_path)
        .output()
        .unwrap();
    assert!(output.status.success());
    let markdown = fs::read_to_string(&out_path).unwrap();
    assert!(markdown.contains("# app [unit]"));
    assert!(markdown.contains("# util [unit]"));
}

#[test]
fn cli_skips_broken_units_and_keeps_going() {
    let dir = write_fixture();
    fs::write(dir.path().join("broken.py"), "def oops(:\n").unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_trellis"))
        .args(["--root"])
        .arg(dir.path())
        .arg("index")
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("1 units skipped"));
}
