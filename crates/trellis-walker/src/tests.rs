//! Unit tests for trellis-walker

use crate::python::PythonWalker;
use crate::services::ServicePattern;
use crate::{SourceWalker, WalkError};
use trellis_core::{EdgeKind, NodeKind, UnitExtraction};

fn walk(source: &str) -> UnitExtraction {
    PythonWalker::new()
        .walk("m.py", source)
        .expect("unit should parse")
}

fn has_edge(ext: &UnitExtraction, source: &str, target: &str, kind: EdgeKind) -> bool {
    ext.edges
        .iter()
        .any(|e| e.source == source && e.target == target && e.kind == kind)
}

fn node_kind<'a>(ext: &'a UnitExtraction, id: &str) -> Option<NodeKind> {
    ext.nodes.iter().find(|n| n.id == id).map(|n| n.kind)
}

#[test]
fn free_function_with_call() {
    let ext = walk(
        r#"
def greet(name):
    """Greets the given name."""
    message = "Hello, " + name
    print(message)
"#,
    );

    assert_eq!(node_kind(&ext, "m.py"), Some(NodeKind::Unit));
    assert_eq!(node_kind(&ext, "m.py:greet"), Some(NodeKind::Callable));
    // The callee is a dangling target, not a node.
    assert_eq!(node_kind(&ext, "m.py:print"), None);

    assert!(has_edge(&ext, "m.py", "m.py:greet", EdgeKind::Contains));
    assert!(has_edge(&ext, "m.py:greet", "m.py:print", EdgeKind::Calls));
}

#[test]
fn unit_node_is_emitted_first() {
    let ext = walk("def f():\n    pass\n");
    assert_eq!(ext.nodes[0].id, "m.py");
    assert_eq!(ext.nodes[0].kind, NodeKind::Unit);
    assert_eq!(ext.nodes[0].name, "m");
}

#[test]
fn class_with_base_and_method() {
    let ext = walk(
        r#"
class Greeter(Base):
    """A class to handle greetings."""
    def say_hello(self, name):
        return f"{self.greeting_word}, {name}!"
"#,
    );

    assert_eq!(node_kind(&ext, "m.py:Greeter"), Some(NodeKind::Type));
    assert_eq!(
        node_kind(&ext, "m.py:say_hello"),
        Some(NodeKind::MemberCallable)
    );
    assert!(has_edge(&ext, "m.py:Greeter", "m.py:Base", EdgeKind::Inherits));
    assert!(has_edge(&ext, "m.py:Greeter", "m.py:say_hello", EdgeKind::Contains));
    // The base is undeclared here; no node for it.
    assert_eq!(node_kind(&ext, "m.py:Base"), None);
}

#[test]
fn docstring_first_line_becomes_doc() {
    let ext = walk(
        r#"
def greet(name):
    """Greets the given name.

    Longer prose nobody reads.
    """
    return name
"#,
    );

    let greet = ext.nodes.iter().find(|n| n.id == "m.py:greet").unwrap();
    assert_eq!(greet.doc.as_deref(), Some("Greets the given name."));
    assert_eq!(greet.location.as_ref().unwrap().line, 2);
}

#[test]
fn duplicate_declaration_is_a_no_op() {
    let ext = walk(
        r#"
def task():
    """First declaration."""
    return 1

def task():
    """Second declaration."""
    return 2
"#,
    );

    let tasks: Vec<_> = ext.nodes.iter().filter(|n| n.id == "m.py:task").collect();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].doc.as_deref(), Some("First declaration."));
}

#[test]
fn reads_and_writes() {
    let ext = walk(
        r#"
def greet(name):
    message = "Hello"
    message += name
    a, b = split(message)
    print(message)
"#,
    );

    assert!(has_edge(&ext, "m.py:greet", "var:message", EdgeKind::WritesVar));
    assert!(has_edge(&ext, "m.py:greet", "var:message", EdgeKind::ReadsVar));
    assert!(has_edge(&ext, "m.py:greet", "var:name", EdgeKind::ReadsVar));
    assert!(has_edge(&ext, "m.py:greet", "var:a", EdgeKind::WritesVar));
    assert!(has_edge(&ext, "m.py:greet", "var:b", EdgeKind::WritesVar));

    // Variable nodes are keyed by bare name and contained by the scope
    // that first touched them.
    assert_eq!(node_kind(&ext, "var:message"), Some(NodeKind::Variable));
    assert!(has_edge(&ext, "m.py:greet", "var:message", EdgeKind::Contains));
}

#[test]
fn fstring_interpolation_reads() {
    let ext = walk(
        r#"
def greet(name):
    return f"Hello, {name}!"
"#,
    );
    assert!(has_edge(&ext, "m.py:greet", "var:name", EdgeKind::ReadsVar));
}

#[test]
fn attribute_writes_are_not_bare_names() {
    let ext = walk(
        r#"
class Greeter:
    def __init__(self, greeting_word):
        self.greeting_word = greeting_word
"#,
    );

    // `self.greeting_word = ...` writes no bare name; `self` is read as
    // the object side of the attribute.
    assert!(!has_edge(
        &ext,
        "m.py:__init__",
        "var:greeting_word",
        EdgeKind::WritesVar
    ));
    assert!(has_edge(&ext, "m.py:__init__", "var:self", EdgeKind::ReadsVar));
    assert!(has_edge(
        &ext,
        "m.py:__init__",
        "var:greeting_word",
        EdgeKind::ReadsVar
    ));
}

#[test]
fn bare_decorators_attach() {
    let ext = walk(
        r#"
@cached
@app.route
def handler():
    pass
"#,
    );

    assert_eq!(node_kind(&ext, "decorator:cached"), Some(NodeKind::DecoratorTag));
    assert!(has_edge(
        &ext,
        "m.py:handler",
        "decorator:cached",
        EdgeKind::HasDecorator
    ));
    // Attribute-path decorators are not bare names and are skipped.
    assert_eq!(node_kind(&ext, "decorator:route"), None);
    assert!(has_edge(&ext, "m.py", "decorator:cached", EdgeKind::Contains));
}

#[test]
fn nested_declarations_own_their_calls() {
    let ext = walk(
        r#"
def outer():
    def inner():
        helper()
    inner()
"#,
    );

    // inner's body belongs to inner, not outer.
    assert!(has_edge(&ext, "m.py:inner", "m.py:helper", EdgeKind::Calls));
    assert!(!has_edge(&ext, "m.py:outer", "m.py:helper", EdgeKind::Calls));
    assert!(has_edge(&ext, "m.py:outer", "m.py:inner", EdgeKind::Calls));
    // A function nested in a function is still a free callable.
    assert_eq!(node_kind(&ext, "m.py:inner"), Some(NodeKind::Callable));
}

#[test]
fn method_calls_resolve_trailing_attribute() {
    let ext = walk(
        r#"
def run():
    greeter.say_hello("Bob")
    conn.cursor().execute("SELECT 1")
"#,
    );

    assert!(has_edge(&ext, "m.py:run", "m.py:say_hello", EdgeKind::Calls));
    assert!(has_edge(&ext, "m.py:run", "m.py:execute", EdgeKind::Calls));
}

#[test]
fn exception_and_return_sites() {
    let ext = walk(
        r#"
def risky(flag):
    try:
        if flag:
            raise ValueError("no")
    except ValueError:
        pass
    return flag
"#,
    );

    assert_eq!(
        node_kind(&ext, "try_block_at_line:3"),
        Some(NodeKind::HandlerSite)
    );
    assert_eq!(
        node_kind(&ext, "exception_at_line:5"),
        Some(NodeKind::ExceptionSite)
    );
    assert_eq!(
        node_kind(&ext, "return_value_at_line:8"),
        Some(NodeKind::ReturnSite)
    );

    assert!(has_edge(&ext, "m.py:risky", "try_block_at_line:3", EdgeKind::Handles));
    assert!(has_edge(&ext, "m.py:risky", "exception_at_line:5", EdgeKind::Throws));
    assert!(has_edge(
        &ext,
        "m.py:risky",
        "return_value_at_line:8",
        EdgeKind::ReturnsValue
    ));
}

#[test]
fn bare_return_emits_no_site() {
    let ext = walk("def quit():\n    return\n");
    assert!(ext
        .edges
        .iter()
        .all(|e| e.kind != EdgeKind::ReturnsValue));
}

#[test]
fn imports_edge_from_unit() {
    let ext = walk(
        r#"
import os
import snowflake.connector as sc
from pathlib import Path
"#,
    );

    assert!(has_edge(&ext, "m.py", "os", EdgeKind::Imports));
    assert!(has_edge(&ext, "m.py", "snowflake.connector", EdgeKind::Imports));
    assert!(has_edge(&ext, "m.py", "pathlib.Path", EdgeKind::Imports));
}

#[test]
fn snowflake_connector_is_detected() {
    let ext = walk(
        r#"
import snowflake.connector

def connect_to_snowflake():
    conn = snowflake.connector.connect(user="u", password="p", account="a")
    cursor = conn.cursor()
    cursor.execute("SELECT current_version()")

def another_function():
    print("unrelated")
"#,
    );

    assert_eq!(
        node_kind(&ext, "external_service:snowflake"),
        Some(NodeKind::ExternalService)
    );
    assert!(has_edge(
        &ext,
        "m.py:connect_to_snowflake",
        "external_service:snowflake",
        EdgeKind::UsesService
    ));
    assert!(!has_edge(
        &ext,
        "m.py:another_function",
        "external_service:snowflake",
        EdgeKind::UsesService
    ));
}

#[test]
fn unimported_connector_stays_unarmed() {
    let ext = walk(
        r#"
def looks_similar():
    snowflake.connector.connect()
"#,
    );
    assert_eq!(node_kind(&ext, "external_service:snowflake"), None);
    assert!(ext.edges.iter().all(|e| e.kind != EdgeKind::UsesService));
}

#[test]
fn custom_pattern_table() {
    let walker = PythonWalker::with_patterns(vec![ServicePattern::new(
        "kafka",
        "kafka",
        "KafkaProducer",
    )]);
    let ext = walker
        .walk(
            "m.py",
            r#"
import kafka

def produce():
    kafka.KafkaProducer()
"#,
        )
        .unwrap();

    assert!(has_edge(
        &ext,
        "m.py:produce",
        "external_service:kafka",
        EdgeKind::UsesService
    ));
}

#[test]
fn invalid_syntax_is_a_reported_skip() {
    let err = PythonWalker::new()
        .walk("broken.py", "def broken(:\n")
        .unwrap_err();

    match err {
        WalkError::Syntax { unit, .. } => assert_eq!(unit, "broken.py"),
        other => panic!("expected syntax error, got {other:?}"),
    }
}

#[test]
fn walking_twice_is_deterministic() {
    let source = r#"
import os

@cached
def greet(name):
    """Greets."""
    print(name)

class Greeter(Base):
    def say_hello(self):
        return 1
"#;

    let a = walk(source);
    let b = walk(source);
    assert_eq!(a.nodes, b.nodes);
    assert_eq!(a.edges, b.edges);
}

#[test]
fn service_pattern_matching() {
    let p = ServicePattern::new("snowflake.connector", "snowflake", "connect");
    assert!(p.matches_import("snowflake.connector"));
    assert!(p.matches_import("snowflake"));
    assert!(p.matches_import("snowflake.connector.errors"));
    assert!(!p.matches_import("snowball"));

    assert!(p.matches_call("snowflake.connector.connect"));
    assert!(p.matches_call("connector.connect"));
    assert!(!p.matches_call("snowflake.connector.close"));
    assert!(!p.matches_call("socket.connect"));
}
