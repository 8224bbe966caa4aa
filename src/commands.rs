//! CLI command implementations

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Subcommand;
use ignore::WalkBuilder;
use rayon::prelude::*;

use trellis_core::{assemble, CodeGraph, QueryEngine};
use trellis_render::{build_outline, outline_to_markdown, render_dot, DotOptions};
use trellis_walker::{PythonWalker, SourceWalker};

/// One structural question, mirroring the query engine's operations.
#[derive(Subcommand)]
pub enum QueryOp {
    /// Free functions declared in a unit
    FunctionsInUnit { unit: String },
    /// Scopes calling a symbol by (partial) name
    CallersOf { name: String },
    /// Symbols called from scopes matching a (partial) name
    CalleesOf { name: String },
    /// First node whose id contains the fragment
    Details { fragment: String },
    /// Scopes reading a variable by exact bare name
    ReadersOf { name: String },
    /// Scopes writing a variable by exact bare name
    WritersOf { name: String },
    /// Scopes containing a raise statement
    Throwers,
    /// Scopes containing a try block
    Handlers,
    /// Nodes carrying an exact bare decorator name
    DecoratedBy { name: String },
    /// Scopes containing a valued return
    Returners,
    /// Scopes using a detected external service
    UsersOfService { name: String },
}

pub fn index(root: PathBuf) -> anyhow::Result<()> {
    let (graph, skipped) = analyze(&root)?;
    println!(
        "{} nodes, {} edges ({} units skipped)",
        graph.node_count(),
        graph.edge_count(),
        skipped
    );
    Ok(())
}

pub fn query(root: PathBuf, op: QueryOp) -> anyhow::Result<()> {
    let (graph, _) = analyze(&root)?;
    let engine = QueryEngine::new(&graph);

    let value = match op {
        QueryOp::FunctionsInUnit { unit } => serde_json::to_value(engine.functions_in_unit(&unit))?,
        QueryOp::CallersOf { name } => serde_json::to_value(engine.callers_of(&name))?,
        QueryOp::CalleesOf { name } => serde_json::to_value(engine.callees_of(&name))?,
        QueryOp::Details { fragment } => serde_json::to_value(engine.node_details(&fragment))?,
        QueryOp::ReadersOf { name } => serde_json::to_value(engine.readers_of(&name))?,
        QueryOp::WritersOf { name } => serde_json::to_value(engine.writers_of(&name))?,
        QueryOp::Throwers => serde_json::to_value(engine.throwers())?,
        QueryOp::Handlers => serde_json::to_value(engine.handlers())?,
        QueryOp::DecoratedBy { name } => serde_json::to_value(engine.decorated_by(&name))?,
        QueryOp::Returners => serde_json::to_value(engine.returners())?,
        QueryOp::UsersOfService { name } => serde_json::to_value(engine.users_of_service(&name))?,
    };

    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}

pub fn dot(
    root: PathBuf,
    cluster: bool,
    filter: Option<String>,
    output: Option<PathBuf>,
) -> anyhow::Result<()> {
    let (graph, _) = analyze(&root)?;
    let text = render_dot(
        &graph,
        &DotOptions {
            cluster_by_unit: cluster,
            kind_filter: filter,
        },
    );
    emit(text, output)
}

pub fn outline(root: PathBuf, output: Option<PathBuf>) -> anyhow::Result<()> {
    let (graph, _) = analyze(&root)?;
    let text = outline_to_markdown(&build_outline(&graph));
    emit(text, output)
}

/// Walk every Python unit under `root` in parallel and assemble the graph.
///
/// Units that cannot be read, decoded, or parsed are skipped with a
/// warning; the merge proceeds with whatever extracted cleanly.
pub fn analyze(root: &Path) -> anyhow::Result<(CodeGraph, usize)> {
    let units = collect_units(root);
    if units.is_empty() {
        tracing::warn!("no Python units found under {}", root.display());
    } else {
        tracing::info!("analyzing {} units", units.len());
    }

    let walker = PythonWalker::new();
    let results: Vec<Result<_, String>> = units
        .par_iter()
        .map(|(unit, path)| {
            let source = fs::read_to_string(path)
                .map_err(|err| format!("{unit}: unreadable ({err})"))?;
            walker.walk(unit, &source).map_err(|err| err.to_string())
        })
        .collect();

    let mut skipped = 0;
    let mut parts = Vec::new();
    for result in results {
        match result {
            Ok(part) => parts.push(part),
            Err(diagnostic) => {
                skipped += 1;
                tracing::warn!("skipping unit: {diagnostic}");
            }
        }
    }

    let graph = assemble(parts);
    tracing::info!(
        "graph built: {} nodes, {} edges",
        graph.node_count(),
        graph.edge_count()
    );
    Ok((graph, skipped))
}

/// Discover Python units under the root, honoring ignore files, keyed by
/// root-relative path. Sorted so assembly order (and with it, which record
/// wins an id collision) is stable across runs.
fn collect_units(root: &Path) -> Vec<(String, PathBuf)> {
    let mut units = Vec::new();
    for entry in WalkBuilder::new(root).build() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                tracing::warn!("cannot read entry: {err}");
                continue;
            }
        };
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) == Some("py") {
            let unit = path
                .strip_prefix(root)
                .unwrap_or(path)
                .to_string_lossy()
                .into_owned();
            units.push((unit, path.to_path_buf()));
        }
    }
    units.sort();
    units
}

fn emit(text: String, output: Option<PathBuf>) -> anyhow::Result<()> {
    match output {
        Some(path) => {
            fs::write(&path, text).with_context(|| format!("writing {}", path.display()))?;
            tracing::info!("wrote {}", path.display());
        }
        None => print!("{text}"),
    }
    Ok(())
}
