use std::path::PathBuf;

use anyhow::{Result, anyhow};
use clap::Parser;
use reelgraph::app::{LaunchOptions, SimilarityGraphApp};
use reelgraph::graph::LayoutConfig;
use reelgraph::source::load_layout_config;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Similarity graph JSON, either bare or wrapped in a `data` envelope.
    graph: PathBuf,

    /// Smaller cards for dense graphs.
    #[arg(long)]
    compact: bool,

    /// Start recentered on this item id.
    #[arg(long, value_name = "ID")]
    center: Option<String>,

    /// JSON file overriding force layout tunables.
    #[arg(long, value_name = "PATH")]
    layout_config: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("reelgraph=info")),
        )
        .init();

    let args = Args::parse();
    let layout = match args.layout_config.as_deref() {
        Some(path) => load_layout_config(path)?,
        None => LayoutConfig::default(),
    };
    let launch = LaunchOptions {
        graph_path: args.graph,
        compact: args.compact,
        center: args.center,
        layout,
    };

    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default().with_inner_size([1440.0, 920.0]),
        ..Default::default()
    };

    eframe::run_native(
        "reelgraph",
        options,
        Box::new(move |cc| Ok(Box::new(SimilarityGraphApp::new(cc, launch)))),
    )
    .map_err(|error| anyhow!("failed to start the graph window: {error}"))
}
