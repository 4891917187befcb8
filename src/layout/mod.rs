pub mod corridors;
pub mod geom;
pub mod graph;
pub mod label_placement;
pub mod position;
pub mod ranking;
pub mod self_loop;
pub mod spline;
pub mod strategies;
pub(crate) mod types;
pub mod visibility;

pub use geom::{Ellipse, Point, Rect, RoutingBox, rect_overlap};
pub use graph::LayoutGraph;
pub use spline::{evaluate_spline, fit_spline_through_boxes};
pub use strategies::{LayoutStrategy, select_strategy};
pub use types::*;
pub use visibility::route_around_obstacles;

use corridors::{compute_routing_boxes, insert_virtual_nodes};
use label_placement::{PlacedLabels, place_label_on_curve, place_label_on_edge};
use position::{assign_coordinates, sort_layers_by_x};
use ranking::{assign_layers, group_layers, order_layers};
use self_loop::{
    SelfLoopParams, choose_self_loop_side, self_loop_control_points, self_loop_label_position,
};
use spline::{catmull_rom_to_bezier, evaluate_spline_tangent, spline_midpoint};

use crate::config::{LayoutConfig, NodeMetricsConfig};
use crate::ir::{Graph, edge_key};
use std::collections::BTreeMap;

/// Height of an edge label in layout units.
const EDGE_LABEL_HEIGHT: f32 = 1.0;
/// Horizontal padding added to an edge label's text width.
const EDGE_LABEL_PADDING: f32 = 1.0;
/// Distance from a straight segment to the label center.
const EDGE_LABEL_GAP: f32 = 1.0;
/// Distance from a curve to the label center.
const EDGE_LABEL_CURVE_OFFSET: f32 = 1.5;

/// Layered layout of `graph` on a canvas of the given size.
///
/// Ranks come from the graph root, long edges are threaded through virtual
/// nodes that reappear as waypoints and routing boxes, and back edges are
/// routed around the nodes in their way. The reported canvas is never
/// smaller than requested and grows when the content needs more room.
pub fn compute_layout(
    graph: &Graph,
    canvas_width: f32,
    canvas_height: f32,
    config: &LayoutConfig,
) -> LayoutResult {
    let layout_graph = LayoutGraph::build(graph, &config.metrics);
    layered_layout(graph, layout_graph, canvas_width, canvas_height, config)
}

fn layered_layout(
    graph: &Graph,
    mut layout_graph: LayoutGraph,
    canvas_width: f32,
    canvas_height: f32,
    config: &LayoutConfig,
) -> LayoutResult {
    if layout_graph.is_empty() {
        return LayoutResult::empty(canvas_width, canvas_height);
    }
    let layered = &config.layered;

    let mut ranks = assign_layers(&layout_graph, graph.root.as_deref());
    let chains = insert_virtual_nodes(&mut layout_graph, &mut ranks, &config.metrics);
    let mut layers = group_layers(&layout_graph, &ranks);
    order_layers(&mut layers, &layout_graph, layered.crossing_passes);
    let positions = assign_coordinates(
        &layout_graph,
        &layers,
        &ranks,
        canvas_width,
        canvas_height,
        layered,
    );
    sort_layers_by_x(&layout_graph, &mut layers, &positions.xs);
    let boxes = compute_routing_boxes(
        &layout_graph,
        &chains,
        &layers,
        &ranks,
        &positions.xs,
        &positions.bands,
        canvas_width,
        layered.corridor_clearance,
    );
    log::debug!(
        "layered layout: {} nodes, {} ranks, {} virtual chains",
        graph.nodes.len(),
        layers.len(),
        chains.len()
    );

    let (xs, ys) = (&positions.xs, &positions.ys);
    let mut result = LayoutResult::empty(canvas_width, canvas_height);
    for (rank, layer) in layers.iter().enumerate() {
        let mut names = Vec::new();
        for &idx in layer {
            let node = layout_graph.node(idx);
            result.width = result.width.max(xs[idx] + node.width / 2.0);
            result.height = result.height.max(ys[idx] + node.height / 2.0);
            if node.is_virtual {
                continue;
            }
            result.nodes.insert(
                node.name.clone(),
                NodeLayout {
                    x: xs[idx],
                    y: ys[idx],
                    width: node.width,
                    height: node.height,
                    rank,
                    order: names.len(),
                },
            );
            names.push(node.name.clone());
        }
        let band = positions.bands[rank];
        result.ranks.push(RankInfo {
            y: band.y,
            height: band.height,
            nodes: names,
        });
    }

    for &(from, to) in layout_graph.edges() {
        let id = edge_key(layout_graph.name(from), layout_graph.name(to));
        let mut route = EdgeRoute {
            from: layout_graph.name(from).to_string(),
            to: layout_graph.name(to).to_string(),
            ..EdgeRoute::default()
        };
        if from == to {
            route.is_self_loop = true;
        } else if ranks[to] <= ranks[from] {
            route.is_back_edge = ranks[to] < ranks[from];
            route.is_flat_edge = ranks[to] == ranks[from];
            route.waypoints = detour(&result, &route.from, &route.to);
        } else if let Some(chain) = chains.get(&id) {
            route.waypoints = chain
                .iter()
                .map(|&idx| Point::new(xs[idx], ys[idx]))
                .collect();
            route.boxes = boxes.get(&id).cloned().unwrap_or_default();
        }
        result.edges.insert(id, route);
    }
    result
}

/// Interior points of a path between two placed nodes that avoids every
/// other node's outline.
fn detour(result: &LayoutResult, from: &str, to: &str) -> Vec<Point> {
    let (Some(source), Some(target)) = (result.nodes.get(from), result.nodes.get(to)) else {
        return Vec::new();
    };
    let obstacles: Vec<Ellipse> = result
        .nodes
        .iter()
        .filter(|(name, _)| name.as_str() != from && name.as_str() != to)
        .map(|(_, node)| node.outline())
        .collect();
    let path = route_around_obstacles(source.center(), target.center(), &obstacles);
    if path.len() <= 2 {
        return Vec::new();
    }
    path[1..path.len() - 1].to_vec()
}

/// Runs `strategy`, resolving [`LayoutStrategy::Auto`] with
/// [`select_strategy`].
pub fn compute_layout_with(
    graph: &Graph,
    strategy: LayoutStrategy,
    canvas_width: f32,
    canvas_height: f32,
    config: &LayoutConfig,
) -> LayoutResult {
    let layout_graph = LayoutGraph::build(graph, &config.metrics);
    let strategy = match strategy {
        LayoutStrategy::Auto => select_strategy(&layout_graph),
        other => other,
    };
    log::debug!("layout strategy: {strategy:?}");
    match strategy {
        LayoutStrategy::Auto | LayoutStrategy::Layered => {
            layered_layout(graph, layout_graph, canvas_width, canvas_height, config)
        }
        other => alternative_layout(
            graph,
            &layout_graph,
            other,
            canvas_width,
            canvas_height,
            config,
        ),
    }
}

/// Grid, circular and force-directed layouts. Nodes keep rank 0 and their
/// declaration index as order; every non-loop edge is routed around the
/// other nodes.
fn alternative_layout(
    graph: &Graph,
    layout_graph: &LayoutGraph,
    strategy: LayoutStrategy,
    canvas_width: f32,
    canvas_height: f32,
    config: &LayoutConfig,
) -> LayoutResult {
    if layout_graph.is_empty() {
        return LayoutResult::empty(canvas_width, canvas_height);
    }
    let mut positions = match strategy {
        LayoutStrategy::Grid => strategies::grid_positions(layout_graph, canvas_width),
        LayoutStrategy::Circular => strategies::circular_positions(
            layout_graph,
            graph.root.as_deref(),
            canvas_width,
            canvas_height,
        ),
        _ => strategies::force_positions(layout_graph, canvas_width, canvas_height, &config.force),
    };
    let (width, height) =
        strategies::settle(layout_graph, &mut positions, canvas_width, canvas_height);

    let mut result = LayoutResult::empty(width, height);
    for (idx, node) in layout_graph.nodes().iter().enumerate() {
        result.nodes.insert(
            node.name.clone(),
            NodeLayout {
                x: positions[idx].x,
                y: positions[idx].y,
                width: node.width,
                height: node.height,
                rank: 0,
                order: idx,
            },
        );
    }
    for &(from, to) in layout_graph.edges() {
        let route = EdgeRoute {
            from: layout_graph.name(from).to_string(),
            to: layout_graph.name(to).to_string(),
            is_self_loop: from == to,
            ..EdgeRoute::default()
        };
        let waypoints = if route.is_self_loop {
            Vec::new()
        } else {
            detour(&result, &route.from, &route.to)
        };
        result.edges.insert(
            edge_key(&route.from, &route.to),
            EdgeRoute { waypoints, ..route },
        );
    }
    result
}

/// Standard deviation of edge lengths between node centers; lower reads as
/// more uniform. Self-loops are ignored.
pub fn layout_quality(result: &LayoutResult) -> f32 {
    let lengths: Vec<f32> = result
        .edges
        .values()
        .filter(|edge| !edge.is_self_loop)
        .filter_map(|edge| {
            let from = result.nodes.get(&edge.from)?;
            let to = result.nodes.get(&edge.to)?;
            Some(from.center().distance(to.center()))
        })
        .collect();
    if lengths.is_empty() {
        return 0.0;
    }
    let count = lengths.len() as f32;
    let mean = lengths.iter().sum::<f32>() / count;
    let squared: f32 = lengths.iter().map(|l| (l - mean).powi(2)).sum();
    (squared / count).sqrt()
}

fn self_loop_shape(
    result: &LayoutResult,
    node: &NodeLayout,
    metrics: &NodeMetricsConfig,
) -> (SelfLoopParams, [Point; 7], f32) {
    let outline = node.outline();
    let params = SelfLoopParams {
        side: choose_self_loop_side(&outline, result.width, result.height, &[]),
        ..SelfLoopParams::default()
    };
    let scale = 1.0 / metrics.pixels_per_unit.max(f32::EPSILON);
    let points = self_loop_control_points(&outline, &params, scale);
    (params, points, scale)
}

/// Drawable path of edge `id` from source center to target center: a
/// corridor-constrained spline for long edges, a smooth curve through the
/// detour for back edges, seven loop control points for self-loops.
pub fn edge_path(
    result: &LayoutResult,
    id: &str,
    metrics: &NodeMetricsConfig,
) -> Option<Vec<Point>> {
    let route = result.edges.get(id)?;
    let source = result.nodes.get(&route.from)?;
    let target = result.nodes.get(&route.to)?;
    if route.is_self_loop {
        let (_, points, _) = self_loop_shape(result, source, metrics);
        return Some(points.to_vec());
    }
    if !route.boxes.is_empty() {
        return Some(fit_spline_through_boxes(source.center(), target.center(), &route.boxes));
    }
    if !route.waypoints.is_empty() {
        let mut through = Vec::with_capacity(route.waypoints.len() + 2);
        through.push(source.center());
        through.extend_from_slice(&route.waypoints);
        through.push(target.center());
        return Some(catmull_rom_to_bezier(&through));
    }
    Some(fit_spline_through_boxes(source.center(), target.center(), &[]))
}

/// Label centers for every labelled edge of `graph`, placed so they avoid
/// the nodes and each other where possible.
pub fn place_edge_labels(
    result: &LayoutResult,
    graph: &Graph,
    metrics: &NodeMetricsConfig,
) -> BTreeMap<String, Point> {
    let mut placed = PlacedLabels::new(result.nodes.values().map(NodeLayout::footprint));
    let mut labels = BTreeMap::new();
    for edge in &graph.edges {
        let Some(text) = edge.label.as_deref() else {
            continue;
        };
        let id = edge.key();
        if labels.contains_key(&id) {
            continue;
        }
        let Some(route) = result.edges.get(&id) else {
            continue;
        };
        let text_width = text.chars().count() as f32 * metrics.char_width;
        let width = text_width / metrics.pixels_per_unit.max(f32::EPSILON) + EDGE_LABEL_PADDING;

        let position = if route.is_self_loop {
            let Some(node) = result.nodes.get(&route.from) else {
                continue;
            };
            let (params, points, scale) = self_loop_shape(result, node, metrics);
            let at =
                self_loop_label_position(&points, params.side, width, EDGE_LABEL_HEIGHT, scale);
            placed.insert(Rect::new(at.x, at.y, width, EDGE_LABEL_HEIGHT));
            at
        } else {
            let Some(path) = edge_path(result, &id, metrics) else {
                continue;
            };
            if path.len() >= 4 {
                place_label_on_curve(
                    &mut placed,
                    spline_midpoint(&path),
                    evaluate_spline_tangent(&path, 0.5),
                    width,
                    EDGE_LABEL_HEIGHT,
                    EDGE_LABEL_CURVE_OFFSET,
                )
            } else {
                let mid = (path.len() - 1) / 2;
                place_label_on_edge(
                    &mut placed,
                    path[mid],
                    path[(mid + 1).min(path.len() - 1)],
                    width,
                    EDGE_LABEL_HEIGHT,
                    EDGE_LABEL_GAP,
                )
            }
        };
        labels.insert(id, position);
    }
    labels
}
