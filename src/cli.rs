use crate::config::{NodeMetricsConfig, load_config};
use crate::ir::Graph;
use crate::layout::{
    LayoutResult, LayoutStrategy, Point, compute_layout_with, edge_path, place_edge_labels,
};
use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "fsmlay", version, about = "Lay out and route finite-state-machine graphs")]
pub struct Args {
    /// Input graph (JSON5) or '-' for stdin
    #[arg(short = 'i', long = "input")]
    pub input: Option<PathBuf>,

    /// Output file for the JSON layout. Defaults to stdout.
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Layout config file (JSON5)
    #[arg(short = 'c', long = "configFile")]
    pub config: Option<PathBuf>,

    /// Canvas width in layout units
    #[arg(short = 'w', long = "width", default_value_t = 80.0)]
    pub width: f32,

    /// Canvas height in layout units
    #[arg(short = 'H', long = "height", default_value_t = 40.0)]
    pub height: f32,

    #[arg(short = 's', long = "strategy", value_enum, default_value = "auto")]
    pub strategy: LayoutStrategy,

    /// Include drawable edge paths and label positions
    #[arg(long = "paths")]
    pub paths: bool,

    /// Pretty-print the JSON output
    #[arg(long = "pretty")]
    pub pretty: bool,
}

#[derive(Debug, Serialize)]
struct Document<'a> {
    #[serde(flatten)]
    layout: &'a LayoutResult,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    paths: BTreeMap<String, Vec<Point>>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    labels: BTreeMap<String, Point>,
}

pub fn run() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    let config = load_config(args.config.as_deref())?;

    let input = read_input(args.input.as_deref())?;
    let graph = Graph::from_json5(&input)?;
    log::info!(
        "laying out {} nodes and {} edges",
        graph.nodes.len(),
        graph.edges.len()
    );
    let layout = compute_layout_with(&graph, args.strategy, args.width, args.height, &config);

    let (paths, labels) = if args.paths {
        (
            edge_paths(&layout, &config.metrics),
            place_edge_labels(&layout, &graph, &config.metrics),
        )
    } else {
        (BTreeMap::new(), BTreeMap::new())
    };
    let document = Document {
        layout: &layout,
        paths,
        labels,
    };
    let json = if args.pretty {
        serde_json::to_string_pretty(&document)?
    } else {
        serde_json::to_string(&document)?
    };
    write_output(&json, args.output.as_deref())
}

fn edge_paths(layout: &LayoutResult, metrics: &NodeMetricsConfig) -> BTreeMap<String, Vec<Point>> {
    layout
        .edges
        .keys()
        .filter_map(|id| Some((id.clone(), edge_path(layout, id, metrics)?)))
        .collect()
}

fn read_input(path: Option<&Path>) -> Result<String> {
    match path {
        Some(path) if path != Path::new("-") => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display())),
        _ => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            Ok(buf)
        }
    }
}

fn write_output(json: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => std::fs::write(path, json)
            .with_context(|| format!("failed to write {}", path.display())),
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(json.as_bytes())?;
            stdout.write_all(b"\n")?;
            Ok(())
        }
    }
}
