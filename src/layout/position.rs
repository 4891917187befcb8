use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::config::LayeredConfig;

use super::corridors::RankBand;
use super::graph::LayoutGraph;

#[derive(Debug, Clone, Default)]
pub struct Positions {
    /// Node centers, indexed like the layout graph.
    pub xs: Vec<f32>,
    pub ys: Vec<f32>,
    pub bands: Vec<RankBand>,
}

/// Distance between consecutive ranks for a canvas of the given height.
pub fn rank_spacing(canvas_height: f32, layer_count: usize, config: &LayeredConfig) -> f32 {
    if canvas_height <= 10.0 || layer_count == 0 {
        return config.min_rank_spacing;
    }
    ((canvas_height - 4.0) / layer_count as f32)
        .floor()
        .clamp(config.min_rank_spacing, config.max_rank_spacing)
}

fn upper_median(values: &mut [f32]) -> Option<f32> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    Some(values[values.len() / 2])
}

fn by_x_then_name<'a>(
    graph: &'a LayoutGraph,
    xs: &'a [f32],
) -> impl Fn(&usize, &usize) -> Ordering + 'a {
    move |a, b| match xs[*a].partial_cmp(&xs[*b]) {
        Some(Ordering::Equal) | None => graph.name(*a).cmp(graph.name(*b)),
        Some(ordering) => ordering,
    }
}

/// Pushes nodes of one layer rightward until neighbours are at least half
/// their combined width plus `padding` apart.
fn resolve_overlaps(graph: &LayoutGraph, layer: &[usize], xs: &mut [f32], padding: f32) {
    if layer.len() <= 1 {
        return;
    }
    let mut sorted = layer.to_vec();
    sorted.sort_by(by_x_then_name(graph, xs));
    for pair in sorted.windows(2) {
        let (prev, curr) = (pair[0], pair[1]);
        let min_gap = (graph.node(prev).width + graph.node(curr).width) / 2.0 + padding;
        if xs[curr] - xs[prev] < min_gap {
            xs[curr] = xs[prev] + min_gap;
        }
    }
}

fn pull_toward_median(
    graph: &LayoutGraph,
    layer: &[usize],
    adjacent_rank: usize,
    ranks: &[usize],
    xs: &mut [f32],
    downward: bool,
    factor: f32,
) {
    for &idx in layer {
        let neighbors = if downward {
            graph.predecessors(idx)
        } else {
            graph.successors(idx)
        };
        let mut values: Vec<f32> = neighbors
            .iter()
            .filter(|&&n| ranks[n] == adjacent_rank)
            .map(|&n| xs[n])
            .collect();
        if let Some(median) = upper_median(&mut values) {
            xs[idx] += (median - xs[idx]) * factor;
        }
    }
}

/// Assigns node centers for an ordered layering.
///
/// Layers are packed left to right and centered, refined toward neighbour
/// medians, rounded to integers and finally swept row by row so no two
/// nodes sharing a row overlap.
pub fn assign_coordinates(
    graph: &LayoutGraph,
    layers: &[Vec<usize>],
    ranks: &[usize],
    canvas_width: f32,
    canvas_height: f32,
    config: &LayeredConfig,
) -> Positions {
    let n = graph.len();
    let mut xs = vec![0.0f32; n];
    let mut ys = vec![0.0f32; n];
    if layers.is_empty() {
        return Positions::default();
    }

    let spacing = rank_spacing(canvas_height, layers.len(), config);
    for (rank, layer) in layers.iter().enumerate() {
        let total: f32 = layer.iter().map(|&idx| graph.node(idx).width).sum::<f32>()
            + config.node_gap * layer.len().saturating_sub(1) as f32;
        let mut cursor = ((canvas_width - total) / 2.0).max(config.left_margin);
        let y = config.top_margin + rank as f32 * spacing;
        for &idx in layer {
            let width = graph.node(idx).width;
            xs[idx] = cursor + width / 2.0;
            ys[idx] = y;
            cursor += width + config.node_gap;
        }
    }

    for _ in 0..config.refinement_passes {
        for rank in 1..layers.len() {
            pull_toward_median(
                graph,
                &layers[rank],
                rank - 1,
                ranks,
                &mut xs,
                true,
                config.forward_pull,
            );
            resolve_overlaps(graph, &layers[rank], &mut xs, config.overlap_padding);
        }
        for rank in (0..layers.len() - 1).rev() {
            pull_toward_median(
                graph,
                &layers[rank],
                rank + 1,
                ranks,
                &mut xs,
                false,
                config.backward_pull,
            );
            resolve_overlaps(graph, &layers[rank], &mut xs, config.overlap_padding);
        }
    }

    for idx in 0..n {
        let half = (graph.node(idx).width / 2.0).ceil();
        xs[idx] = xs[idx].round().max(half);
        ys[idx] = ys[idx].round();
    }

    // Rows are keyed by integer y so nodes pulled onto the same line by
    // rounding are separated too.
    let mut rows: BTreeMap<i64, Vec<usize>> = BTreeMap::new();
    for idx in 0..n {
        rows.entry(ys[idx] as i64).or_default().push(idx);
    }
    for row in rows.values_mut() {
        row.sort_by(by_x_then_name(graph, &xs));
        for i in 1..row.len() {
            let (prev, curr) = (row[i - 1], row[i]);
            let half_widths = (graph.node(prev).width + graph.node(curr).width) / 2.0;
            let min_gap = (half_widths + config.row_padding).floor();
            if xs[curr] - xs[prev] < min_gap {
                xs[curr] = xs[prev] + min_gap;
            }
        }
    }

    let bands = (0..layers.len())
        .map(|rank| RankBand {
            y: (config.top_margin + rank as f32 * spacing).round(),
            height: spacing,
        })
        .collect();
    Positions { xs, ys, bands }
}

/// Re-sorts every layer by final x so in-layer order matches geometry.
pub fn sort_layers_by_x(graph: &LayoutGraph, layers: &mut [Vec<usize>], xs: &[f32]) {
    for layer in layers.iter_mut() {
        layer.sort_by(by_x_then_name(graph, xs));
    }
}
