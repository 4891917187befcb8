use std::collections::{HashMap, HashSet};

use crate::config::NodeMetricsConfig;
use crate::ir::Graph;

#[derive(Debug, Clone)]
pub struct LayoutNode {
    pub name: String,
    pub width: f32,
    pub height: f32,
    pub is_virtual: bool,
    /// Owning edge id (`"from->to"`), set for virtual nodes only.
    pub edge_id: Option<String>,
}

/// Index-based directed graph used by every layout phase.
///
/// Parallel edges are collapsed and self-loops are kept aside: neither
/// matters for ranking or ordering, only for rendering.
#[derive(Debug, Clone, Default)]
pub struct LayoutGraph {
    nodes: Vec<LayoutNode>,
    forward: Vec<Vec<usize>>,
    backward: Vec<Vec<usize>>,
    index: HashMap<String, usize>,
    /// Distinct caller edges (self-loops included) in first-seen order.
    edges: Vec<(usize, usize)>,
    self_loops: Vec<usize>,
}

impl LayoutGraph {
    pub fn build(graph: &Graph, metrics: &NodeMetricsConfig) -> Self {
        let mut layout = LayoutGraph::default();
        for name in &graph.nodes {
            if layout.index.contains_key(name) {
                continue;
            }
            layout.push_node(LayoutNode {
                name: name.clone(),
                width: metrics.label_width(name),
                height: metrics.node_height,
                is_virtual: false,
                edge_id: None,
            });
        }

        let mut seen: HashSet<(usize, usize)> = HashSet::new();
        for edge in &graph.edges {
            let endpoints = (layout.index_of(&edge.from), layout.index_of(&edge.to));
            let (Some(from), Some(to)) = endpoints else {
                log::warn!("skipping edge {} with undeclared endpoint", edge.key());
                continue;
            };
            if !seen.insert((from, to)) {
                continue;
            }
            layout.edges.push((from, to));
            if from == to {
                layout.self_loops.push(from);
            } else {
                layout.add_adjacency(from, to);
            }
        }
        layout
    }

    pub(crate) fn push_node(&mut self, node: LayoutNode) -> usize {
        let idx = self.nodes.len();
        self.index.insert(node.name.clone(), idx);
        self.nodes.push(node);
        self.forward.push(Vec::new());
        self.backward.push(Vec::new());
        idx
    }

    pub(crate) fn add_adjacency(&mut self, from: usize, to: usize) {
        self.forward[from].push(to);
        self.backward[to].push(from);
    }

    pub(crate) fn remove_adjacency(&mut self, from: usize, to: usize) {
        self.forward[from].retain(|&next| next != to);
        self.backward[to].retain(|&prev| prev != from);
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, idx: usize) -> &LayoutNode {
        &self.nodes[idx]
    }

    pub fn nodes(&self) -> &[LayoutNode] {
        &self.nodes
    }

    pub fn name(&self, idx: usize) -> &str {
        &self.nodes[idx].name
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn successors(&self, idx: usize) -> &[usize] {
        &self.forward[idx]
    }

    pub fn predecessors(&self, idx: usize) -> &[usize] {
        &self.backward[idx]
    }

    pub fn edges(&self) -> &[(usize, usize)] {
        &self.edges
    }

    pub fn self_loops(&self) -> &[usize] {
        &self.self_loops
    }

    /// Real (caller-visible) node indices.
    pub fn real_nodes(&self) -> impl Iterator<Item = usize> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, node)| !node.is_virtual)
            .map(|(idx, _)| idx)
    }

    /// Node indices sorted by name, the tie-break order used throughout.
    pub fn sorted_by_name(&self, indices: impl IntoIterator<Item = usize>) -> Vec<usize> {
        let mut sorted: Vec<usize> = indices.into_iter().collect();
        sorted.sort_by(|a, b| self.nodes[*a].name.cmp(&self.nodes[*b].name));
        sorted
    }

    /// In/out degree of every node, self-loops excluded.
    pub fn degrees(&self) -> (Vec<usize>, Vec<usize>) {
        let in_degree = self.backward.iter().map(Vec::len).collect();
        let out_degree = self.forward.iter().map(Vec::len).collect();
        (in_degree, out_degree)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metrics() -> NodeMetricsConfig {
        NodeMetricsConfig::default()
    }

    #[test]
    fn deduplicates_parallel_edges() {
        let graph = Graph::from_edges("A", &[("A", "B"), ("A", "B"), ("B", "A")]);
        let layout = LayoutGraph::build(&graph, &metrics());
        let a = layout.index_of("A").unwrap();
        let b = layout.index_of("B").unwrap();
        assert_eq!(layout.successors(a), &[b]);
        assert_eq!(layout.predecessors(a), &[b]);
        assert_eq!(layout.edges().len(), 2);
    }

    #[test]
    fn self_loops_stay_out_of_adjacency() {
        let graph = Graph::from_edges("A", &[("A", "A"), ("A", "B")]);
        let layout = LayoutGraph::build(&graph, &metrics());
        let a = layout.index_of("A").unwrap();
        assert_eq!(layout.self_loops(), &[a]);
        assert_eq!(layout.successors(a).len(), 1);
        let (in_degree, _) = layout.degrees();
        assert_eq!(in_degree[a], 0);
    }

    #[test]
    fn skips_edges_to_unknown_nodes() {
        let mut graph = Graph::new();
        graph.ensure_node("A");
        graph.edges.push(crate::ir::Edge::new("A", "Ghost"));
        let layout = LayoutGraph::build(&graph, &metrics());
        assert_eq!(layout.len(), 1);
        assert!(layout.edges().is_empty());
    }
}
