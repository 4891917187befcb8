use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Error;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub from: String,
    pub to: String,
    /// Transition label, e.g. the input symbol.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl Edge {
    pub fn new(from: &str, to: &str) -> Self {
        Self {
            from: from.to_string(),
            to: to.to_string(),
            label: None,
        }
    }

    pub fn with_label(mut self, label: &str) -> Self {
        self.label = Some(label.to_string());
        self
    }

    /// Key used for edge routes in a layout result.
    pub fn key(&self) -> String {
        edge_key(&self.from, &self.to)
    }
}

pub fn edge_key(from: &str, to: &str) -> String {
    format!("{from}->{to}")
}

/// Caller-supplied state graph: states become nodes, transitions become edges.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Graph {
    pub nodes: Vec<String>,
    pub root: Option<String>,
    pub edges: Vec<Edge>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ensure_node(&mut self, id: &str) {
        if !self.nodes.iter().any(|node| node == id) {
            self.nodes.push(id.to_string());
        }
    }

    /// Adds an edge, declaring both endpoints if they are new.
    pub fn add_edge(&mut self, from: &str, to: &str) {
        self.ensure_node(from);
        self.ensure_node(to);
        self.edges.push(Edge::new(from, to));
    }

    pub fn add_labeled_edge(&mut self, from: &str, to: &str, label: &str) {
        self.ensure_node(from);
        self.ensure_node(to);
        self.edges.push(Edge::new(from, to).with_label(label));
    }

    pub fn set_root(&mut self, id: &str) {
        self.ensure_node(id);
        self.root = Some(id.to_string());
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Builds a graph from `(from, to)` pairs, declaring nodes in first-seen order.
    pub fn from_edges(root: &str, edges: &[(&str, &str)]) -> Self {
        let mut graph = Graph::new();
        graph.set_root(root);
        for (from, to) in edges {
            graph.add_edge(from, to);
        }
        graph
    }

    pub fn from_json5(input: &str) -> Result<Self, Error> {
        let mut graph: Graph = json5::from_str(input)?;
        // Edge endpoints count as declared states.
        let endpoints: Vec<(String, String)> = graph
            .edges
            .iter()
            .map(|edge| (edge.from.clone(), edge.to.clone()))
            .collect();
        for (from, to) in endpoints {
            graph.ensure_node(&from);
            graph.ensure_node(&to);
        }
        Ok(graph)
    }
}

pub fn load_graph(path: &Path) -> Result<Graph, Error> {
    let contents = std::fs::read_to_string(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Graph::from_json5(&contents)
}
