use std::collections::BTreeMap;

use crate::config::NodeMetricsConfig;
use crate::ir::edge_key;

use super::geom::RoutingBox;
use super::graph::{LayoutGraph, LayoutNode};

/// Ordered virtual-node chains, keyed by the id (`"from->to"`) of the edge
/// they replace.
pub type VirtualChains = BTreeMap<String, Vec<usize>>;

/// Vertical extent of one rank.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankBand {
    pub y: f32,
    pub height: f32,
}

/// Splits every edge spanning more than one rank into a chain of virtual
/// nodes, one per intermediate rank, and rewires adjacency through it.
pub fn insert_virtual_nodes(
    graph: &mut LayoutGraph,
    ranks: &mut Vec<usize>,
    metrics: &NodeMetricsConfig,
) -> VirtualChains {
    let mut chains = VirtualChains::new();
    let long_edges: Vec<(usize, usize)> = graph
        .edges()
        .iter()
        .copied()
        .filter(|&(from, to)| from != to && ranks[to] > ranks[from] + 1)
        .collect();

    for (from, to) in long_edges {
        let id = edge_key(graph.name(from), graph.name(to));
        graph.remove_adjacency(from, to);
        let mut chain = Vec::with_capacity(ranks[to] - ranks[from] - 1);
        let mut prev = from;
        for rank in ranks[from] + 1..ranks[to] {
            let name = format!("_v_{}_{}_{}", graph.name(from), graph.name(to), rank);
            let idx = graph.push_node(LayoutNode {
                name,
                width: metrics.virtual_node_width,
                height: metrics.node_height,
                is_virtual: true,
                edge_id: Some(id.clone()),
            });
            ranks.push(rank);
            graph.add_adjacency(prev, idx);
            chain.push(idx);
            prev = idx;
        }
        graph.add_adjacency(prev, to);
        log::trace!("edge {id} routed through {} virtual nodes", chain.len());
        chains.insert(id, chain);
    }
    chains
}

/// Computes one routing box per virtual node of every chain.
///
/// Horizontal bounds stop `clearance` short of the facing sides of the
/// node's immediate layer neighbours, or reach the canvas edge when there is
/// no neighbour on that side. Vertical bounds are the node's rank band.
pub fn compute_routing_boxes(
    graph: &LayoutGraph,
    chains: &VirtualChains,
    layers: &[Vec<usize>],
    ranks: &[usize],
    xs: &[f32],
    bands: &[RankBand],
    canvas_width: f32,
    clearance: f32,
) -> BTreeMap<String, Vec<RoutingBox>> {
    let mut order = vec![0usize; graph.len()];
    for layer in layers {
        for (pos, &idx) in layer.iter().enumerate() {
            order[idx] = pos;
        }
    }

    chains
        .iter()
        .map(|(id, chain)| {
            let boxes = chain
                .iter()
                .map(|&idx| {
                    let layer = &layers[ranks[idx]];
                    let pos = order[idx];
                    let x = xs[idx];
                    let mut left = pos
                        .checked_sub(1)
                        .map(|p| {
                            let n = layer[p];
                            xs[n] + graph.node(n).width / 2.0 + clearance
                        })
                        .unwrap_or(0.0);
                    let mut right = layer
                        .get(pos + 1)
                        .map(|&n| xs[n] - graph.node(n).width / 2.0 - clearance)
                        .unwrap_or(canvas_width);
                    // The node itself always lies inside its own corridor.
                    left = left.min(x);
                    right = right.max(x);
                    let band = bands[ranks[idx]];
                    RoutingBox {
                        left,
                        right,
                        top: band.y - band.height / 2.0,
                        bottom: band.y + band.height / 2.0,
                    }
                })
                .collect();
            (id.clone(), boxes)
        })
        .collect()
}
