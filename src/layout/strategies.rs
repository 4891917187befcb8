//! Non-layered placements and the heuristic that picks a strategy.
//!
//! Every placement here returns node centers indexed like the layout graph;
//! [`settle`] then clamps them into the canvas and separates colliding nodes.

use std::collections::VecDeque;
use std::f32::consts::PI;

use serde::{Deserialize, Serialize};

use crate::config::ForceConfig;

use super::geom::{Point, Rect};
use super::graph::LayoutGraph;
use super::ranking::{depth_first, resolve_root};

// ── Grid ────────────────────────────────────────────────────────────

const GRID_LEFT: f32 = 5.0;
const GRID_TOP: f32 = 2.0;
const GRID_MIN_CELL_WIDTH: f32 = 15.0;
const GRID_CELL_HEIGHT: f32 = 4.0;

// ── Circular ────────────────────────────────────────────────────────

const CIRCLE_MIN_RADIUS_X: f32 = 10.0;
const CIRCLE_MIN_RADIUS_Y: f32 = 4.0;

// ── Force-directed ──────────────────────────────────────────────────

/// Keeps the rightmost centers clear of the canvas edge for their labels.
const FORCE_RIGHT_INSET: f32 = 15.0;
const FORCE_LEFT_INSET: f32 = 5.0;
const FORCE_VERTICAL_INSET: f32 = 2.0;
const SNAP_X: f32 = 2.0;
const SNAP_Y: f32 = 1.0;

// ── Collision resolution ────────────────────────────────────────────

const COLLISION_ATTEMPTS: usize = 20;
const COLLISION_STEP_X: f32 = 2.0;
const COLLISION_STEP_Y: f32 = 2.0;

// ── Selector ────────────────────────────────────────────────────────

const SMALL_GRAPH: usize = 4;
const SMALL_ACYCLIC_GRAPH: usize = 8;
const MEDIUM_GRAPH: usize = 15;
const DENSE_THRESHOLD: f32 = 0.25;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "kebab-case")]
pub enum LayoutStrategy {
    /// Let [`select_strategy`] decide.
    #[default]
    Auto,
    Layered,
    Grid,
    Circular,
    ForceDirected,
}

/// Row-major grid with `ceil(sqrt(n))` columns in declaration order.
pub fn grid_positions(graph: &LayoutGraph, canvas_width: f32) -> Vec<Point> {
    let n = graph.len();
    let cols = ((n as f32).sqrt().ceil() as usize).max(1);
    let cell_width = ((canvas_width - 10.0) / cols as f32)
        .floor()
        .max(GRID_MIN_CELL_WIDTH);
    (0..n)
        .map(|i| {
            Point::new(
                GRID_LEFT + (i % cols) as f32 * cell_width,
                GRID_TOP + (i / cols) as f32 * GRID_CELL_HEIGHT,
            )
        })
        .collect()
}

/// Root first, then breadth-first along successors, then the remaining
/// nodes. Siblings and leftovers are taken in name order.
pub fn connectivity_order(graph: &LayoutGraph, root: Option<&str>) -> Vec<usize> {
    let n = graph.len();
    let mut visited = vec![false; n];
    let mut order = Vec::with_capacity(n);
    if let Some(root) = resolve_root(graph, root) {
        visited[root] = true;
        let mut queue = VecDeque::from([root]);
        while let Some(current) = queue.pop_front() {
            order.push(current);
            let successors = graph.successors(current).iter().copied();
            for next in graph.sorted_by_name(successors) {
                if !visited[next] {
                    visited[next] = true;
                    queue.push_back(next);
                }
            }
        }
    }
    let leftovers = (0..n).filter(|&idx| !visited[idx]);
    order.extend(graph.sorted_by_name(leftovers));
    order
}

/// Equal angular spacing on an ellipse, starting at the top and running
/// clockwise in [`connectivity_order`]. Offsets from the center are
/// truncated to whole cells.
pub fn circular_positions(
    graph: &LayoutGraph,
    root: Option<&str>,
    canvas_width: f32,
    canvas_height: f32,
) -> Vec<Point> {
    let n = graph.len();
    let mut positions = vec![Point::default(); n];
    if n == 0 {
        return positions;
    }
    let (cx, cy) = ((canvas_width / 2.0).floor(), (canvas_height / 2.0).floor());
    let radius_x = ((canvas_width - 20.0) / 2.0).floor().max(CIRCLE_MIN_RADIUS_X);
    let radius_y = ((canvas_height - 6.0) / 2.0).floor().max(CIRCLE_MIN_RADIUS_Y);
    for (i, idx) in connectivity_order(graph, root).into_iter().enumerate() {
        let angle = -PI / 2.0 + 2.0 * PI * i as f32 / n as f32;
        positions[idx] = Point::new(
            cx + (radius_x * angle.cos()).trunc(),
            cy + (radius_y * angle.sin()).trunc(),
        );
    }
    positions
}

/// Spring embedding: inverse-square repulsion between every pair, linear
/// attraction along edges, a fixed number of damped steps.
pub fn force_positions(
    graph: &LayoutGraph,
    canvas_width: f32,
    canvas_height: f32,
    config: &ForceConfig,
) -> Vec<Point> {
    let n = graph.len();
    if n == 0 {
        return Vec::new();
    }
    let mut pos: Vec<Point> = (0..n)
        .map(|i| {
            let angle = 2.0 * PI * i as f32 / n as f32;
            Point::new(
                canvas_width / 2.0 + canvas_width / 3.0 * angle.cos(),
                canvas_height / 2.0 + canvas_height / 3.0 * angle.sin(),
            )
        })
        .collect();
    let springs: Vec<(usize, usize)> = graph
        .edges()
        .iter()
        .copied()
        .filter(|(from, to)| from != to)
        .collect();
    let max_x = (canvas_width - FORCE_RIGHT_INSET).max(FORCE_LEFT_INSET);
    let max_y = (canvas_height - FORCE_VERTICAL_INSET).max(FORCE_VERTICAL_INSET);

    let mut force = vec![Point::default(); n];
    for _ in 0..config.iterations {
        force.fill(Point::default());
        for a in 0..n {
            for b in a + 1..n {
                let dx = pos[a].x - pos[b].x;
                let dy = pos[a].y - pos[b].y;
                let dist = (dx * dx + dy * dy).sqrt().max(1.0);
                let magnitude = config.repulsion / (dist * dist);
                let (fx, fy) = (magnitude * dx / dist, magnitude * dy / dist);
                force[a].x += fx;
                force[a].y += fy;
                force[b].x -= fx;
                force[b].y -= fy;
            }
        }
        for &(a, b) in &springs {
            let dx = pos[b].x - pos[a].x;
            let dy = pos[b].y - pos[a].y;
            let dist = (dx * dx + dy * dy).sqrt();
            if dist <= f32::EPSILON {
                continue;
            }
            // attraction * dist along the unit vector
            let (fx, fy) = (config.attraction * dx, config.attraction * dy);
            force[a].x += fx;
            force[a].y += fy;
            force[b].x -= fx;
            force[b].y -= fy;
        }
        for (p, f) in pos.iter_mut().zip(&force) {
            p.x = (p.x + f.x * config.damping).clamp(FORCE_LEFT_INSET, max_x);
            p.y = (p.y + f.y * config.damping).clamp(FORCE_VERTICAL_INSET, max_y);
        }
    }

    pos.into_iter()
        .map(|p| {
            Point::new(
                ((p.x.round() + SNAP_X / 2.0) / SNAP_X).floor() * SNAP_X,
                ((p.y.round() + SNAP_Y / 2.0) / SNAP_Y).floor() * SNAP_Y,
            )
        })
        .collect()
}

fn footprint(graph: &LayoutGraph, idx: usize, at: Point) -> Rect {
    let node = graph.node(idx);
    Rect::new(at.x, at.y, node.width, node.height)
}

/// Shared post-processing: clamps centers into the canvas, then moves
/// colliding nodes until no two footprints overlap.
///
/// Returns the canvas size, grown when resolution had to push nodes past
/// the original bounds.
pub fn settle(
    graph: &LayoutGraph,
    positions: &mut [Point],
    canvas_width: f32,
    canvas_height: f32,
) -> (f32, f32) {
    for (idx, p) in positions.iter_mut().enumerate() {
        let node = graph.node(idx);
        let (half_w, half_h) = ((node.width / 2.0).ceil(), (node.height / 2.0).ceil());
        p.x = p.x.clamp(half_w, (canvas_width - half_w).max(half_w));
        p.y = p.y.clamp(half_h, (canvas_height - half_h).max(half_h));
    }
    resolve_collisions(graph, positions);

    let mut width = canvas_width;
    let mut height = canvas_height;
    for (idx, p) in positions.iter().enumerate() {
        let node = graph.node(idx);
        width = width.max(p.x + node.width / 2.0);
        height = height.max(p.y + node.height / 2.0);
    }
    (width, height)
}

/// Places nodes top to bottom, left to right. A colliding node alternately
/// tries one label width to the right and one step down from its original
/// spot; after the last attempt it goes past the rightmost placed node.
pub fn resolve_collisions(graph: &LayoutGraph, positions: &mut [Point]) {
    let mut sequence: Vec<usize> = (0..positions.len()).collect();
    sequence.sort_by(|&a, &b| {
        positions[a]
            .y
            .total_cmp(&positions[b].y)
            .then(positions[a].x.total_cmp(&positions[b].x))
            .then_with(|| graph.name(a).cmp(graph.name(b)))
    });

    let mut placed: Vec<Rect> = Vec::with_capacity(positions.len());
    for idx in sequence {
        let origin = positions[idx];
        let width = graph.node(idx).width;
        let collides = |at: Point, placed: &[Rect]| {
            let rect = footprint(graph, idx, at);
            placed.iter().any(|other| other.overlaps(&rect))
        };

        let mut at = origin;
        let mut attempt = 0;
        while collides(at, &placed) && attempt < COLLISION_ATTEMPTS {
            if attempt % 2 == 0 {
                at.x += width + COLLISION_STEP_X;
            } else {
                at.x = origin.x;
                at.y += COLLISION_STEP_Y;
            }
            attempt += 1;
        }
        if collides(at, &placed) {
            let rightmost = placed
                .iter()
                .map(|rect| rect.x + rect.w / 2.0)
                .fold(f32::MIN, f32::max);
            at = Point::new(rightmost + width / 2.0 + COLLISION_STEP_X, origin.y);
            log::debug!("{} moved past the rightmost node", graph.name(idx));
        }
        positions[idx] = at;
        placed.push(footprint(graph, idx, at));
    }
}

/// True when the graph reads as a single path: one start node, at least one
/// end node, and nothing branching or merging in between.
pub fn is_linear_chain(graph: &LayoutGraph) -> bool {
    let n = graph.len();
    if n <= 2 {
        return true;
    }
    let (in_degree, out_degree) = graph.degrees();
    let (mut starts, mut ends, mut middles) = (0, 0, 0);
    for idx in 0..n {
        let (ins, outs) = (in_degree[idx], out_degree[idx]);
        if ins == 0 && outs <= 1 {
            starts += 1;
        } else if outs == 0 && ins <= 1 {
            ends += 1;
        } else if ins <= 1 && outs <= 1 {
            middles += 1;
        }
    }
    starts == 1 && ends >= 1 && middles == n - starts - ends
}

pub fn has_cycles(graph: &LayoutGraph) -> bool {
    let starts = graph.sorted_by_name(0..graph.len());
    !depth_first(graph, &starts).back_edges.is_empty()
}

/// Picks a strategy from the graph's size, shape and density.
pub fn select_strategy(graph: &LayoutGraph) -> LayoutStrategy {
    let n = graph.len();
    if n == 0 {
        return LayoutStrategy::Layered;
    }
    if n <= SMALL_GRAPH || is_linear_chain(graph) {
        return LayoutStrategy::Layered;
    }
    if n <= SMALL_ACYCLIC_GRAPH && !has_cycles(graph) {
        return LayoutStrategy::Layered;
    }
    if n <= MEDIUM_GRAPH {
        return LayoutStrategy::Circular;
    }
    let density = graph.edges().len() as f32 / (n * n) as f32;
    if density > DENSE_THRESHOLD {
        return LayoutStrategy::ForceDirected;
    }
    LayoutStrategy::Layered
}
