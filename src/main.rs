//! Trellis CLI entry point

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "trellis")]
#[command(about = "Structural code graph extraction and queries", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Codebase root path (defaults to current directory)
    #[arg(short, long, default_value = ".")]
    root: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze the codebase and print graph statistics
    Index,
    /// Run one structural query against the graph
    Query {
        #[command(subcommand)]
        op: commands::QueryOp,
    },
    /// Emit a DOT diagram of the graph
    Dot {
        /// Group nodes into one cluster per unit
        #[arg(long)]
        cluster: bool,

        /// Keep only elements whose kind label contains this substring
        #[arg(long)]
        filter: Option<String>,

        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Emit a nested outline of the graph
    Outline {
        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Show version
    Version,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(format!(
            "trellis={}",
            log_level
        )))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match cli.command {
        Commands::Index => commands::index(cli.root),
        Commands::Query { op } => commands::query(cli.root, op),
        Commands::Dot {
            cluster,
            filter,
            output,
        } => commands::dot(cli.root, cluster, filter, output),
        Commands::Outline { output } => commands::outline(cli.root, output),
        Commands::Version => {
            println!("Trellis v{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}
