use std::cmp::Ordering;
use std::collections::BinaryHeap;

use super::geom::{Ellipse, Point};

// ── Tangent construction ────────────────────────────────────────────
/// Radial scale applied to tangent points so paths clear the outline.
const TANGENT_PADDING: f32 = 1.08;
/// Points at or inside this normalized distance get no tangents.
const TANGENT_MIN_DISTANCE: f32 = 1.01;
/// Candidate points closer than this are merged.
const DEDUP_TOLERANCE: f32 = 1.0;

// ── Segment/obstacle intersection ───────────────────────────────────
/// Normalized squared radius under which an endpoint counts as inside.
const INSIDE_THRESHOLD: f32 = 0.95;
/// Fraction of the segment at each end where touching is tolerated.
const TANGENCY_MARGIN: f32 = 0.02;
/// Squared normalized length below which a segment is degenerate.
const DEGENERATE_SEGMENT: f32 = 1e-10;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisEdge {
    pub to: usize,
    pub weight: f32,
}

#[derive(Debug, Clone, Default)]
pub struct VisibilityGraph {
    pub vertices: Vec<Point>,
    pub adj: Vec<Vec<VisEdge>>,
}

#[derive(Debug, Clone, Copy)]
struct QueueEntry {
    cost: f32,
    vertex: usize,
}

impl PartialEq for QueueEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for QueueEntry {}

impl Ord for QueueEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed so the max-heap pops the cheapest entry first.
        other
            .cost
            .total_cmp(&self.cost)
            .then_with(|| other.vertex.cmp(&self.vertex))
    }
}

impl PartialOrd for QueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl VisibilityGraph {
    pub fn new(vertices: Vec<Point>) -> Self {
        let adj = vec![Vec::new(); vertices.len()];
        Self { vertices, adj }
    }

    /// Adds an undirected weighted edge.
    pub fn add_edge(&mut self, a: usize, b: usize, weight: f32) {
        self.adj[a].push(VisEdge { to: b, weight });
        self.adj[b].push(VisEdge { to: a, weight });
    }

    /// Builds the graph over tangent and bitangent points of `obstacles`.
    /// `start` and `end` are the last two vertices, in that order.
    pub fn build(obstacles: &[Ellipse], start: Point, end: Point) -> Self {
        let mut candidates = Vec::new();
        for obstacle in obstacles {
            candidates.extend(tangent_points(obstacle, start));
            candidates.extend(tangent_points(obstacle, end));
        }
        for (i, a) in obstacles.iter().enumerate() {
            for b in &obstacles[i + 1..] {
                candidates.extend(bitangent_points(a, b));
            }
        }
        let mut vertices = dedup_points(candidates, DEDUP_TOLERANCE);
        vertices.push(start);
        vertices.push(end);

        let mut graph = VisibilityGraph::new(vertices);
        for i in 0..graph.vertices.len() {
            for j in i + 1..graph.vertices.len() {
                let (a, b) = (graph.vertices[i], graph.vertices[j]);
                if can_see(a, b, obstacles) {
                    graph.add_edge(i, j, a.distance(b));
                }
            }
        }
        graph
    }

    /// Dijkstra from `from` to `to`; returns the vertex path and its cost.
    pub fn shortest_path(&self, from: usize, to: usize) -> Option<(Vec<usize>, f32)> {
        let n = self.vertices.len();
        if from >= n || to >= n {
            return None;
        }
        let mut dist = vec![f32::INFINITY; n];
        let mut prev: Vec<Option<usize>> = vec![None; n];
        let mut heap = BinaryHeap::new();
        dist[from] = 0.0;
        heap.push(QueueEntry {
            cost: 0.0,
            vertex: from,
        });

        while let Some(QueueEntry { cost, vertex }) = heap.pop() {
            if vertex == to {
                break;
            }
            if cost > dist[vertex] {
                continue;
            }
            for edge in &self.adj[vertex] {
                let next = cost + edge.weight;
                if next < dist[edge.to] {
                    dist[edge.to] = next;
                    prev[edge.to] = Some(vertex);
                    heap.push(QueueEntry {
                        cost: next,
                        vertex: edge.to,
                    });
                }
            }
        }

        if !dist[to].is_finite() {
            return None;
        }
        let mut path = vec![to];
        let mut cursor = to;
        while let Some(p) = prev[cursor] {
            path.push(p);
            cursor = p;
        }
        path.reverse();
        Some((path, dist[to]))
    }

    /// Shortest path as points, falling back to the direct segment.
    pub fn shortest_path_points(&self, from: usize, to: usize) -> Vec<Point> {
        match self.shortest_path(from, to) {
            Some((path, _)) => path.into_iter().map(|idx| self.vertices[idx]).collect(),
            None => match (self.vertices.get(from), self.vertices.get(to)) {
                (Some(&a), Some(&b)) => vec![a, b],
                _ => Vec::new(),
            },
        }
    }
}

/// The two points where lines through `p` touch `ellipse`, pushed slightly
/// outward. Empty when `p` is on or inside the outline.
pub fn tangent_points(ellipse: &Ellipse, p: Point) -> Vec<Point> {
    if ellipse.is_degenerate() {
        return Vec::new();
    }
    let (dx, dy) = ellipse.normalize(p);
    let d = (dx * dx + dy * dy).sqrt();
    if d <= TANGENT_MIN_DISTANCE {
        return Vec::new();
    }
    let theta = dy.atan2(dx);
    // Angle between the center->p ray and the center->tangent ray.
    let spread = std::f32::consts::FRAC_PI_2 - (1.0 / d).asin();
    [theta + spread, theta - spread]
        .into_iter()
        .map(|angle| {
            Point::new(
                ellipse.cx + ellipse.rx * TANGENT_PADDING * angle.cos(),
                ellipse.cy + ellipse.ry * TANGENT_PADDING * angle.sin(),
            )
        })
        .collect()
}

/// Candidate points for routing between two obstacles: tangents on each
/// one as seen from the other's center.
pub fn bitangent_points(a: &Ellipse, b: &Ellipse) -> Vec<Point> {
    let mut points = tangent_points(a, b.center());
    points.extend(tangent_points(b, a.center()));
    points
}

fn dedup_points(points: Vec<Point>, tolerance: f32) -> Vec<Point> {
    let mut result: Vec<Point> = Vec::with_capacity(points.len());
    for p in points {
        if !result.iter().any(|r| r.distance(p) < tolerance) {
            result.push(p);
        }
    }
    result
}

/// Whether segment `p1`-`p2` passes through the interior of `ellipse`.
/// Grazing contact near either endpoint is tolerated.
pub fn segment_intersects_ellipse(p1: Point, p2: Point, ellipse: &Ellipse) -> bool {
    if ellipse.is_degenerate() {
        return false;
    }
    let (x1, y1) = ellipse.normalize(p1);
    let (x2, y2) = ellipse.normalize(p2);
    if x1 * x1 + y1 * y1 < INSIDE_THRESHOLD || x2 * x2 + y2 * y2 < INSIDE_THRESHOLD {
        return true;
    }

    let dx = x2 - x1;
    let dy = y2 - y1;
    let a = dx * dx + dy * dy;
    if a < DEGENERATE_SEGMENT {
        return false;
    }
    let b = 2.0 * (x1 * dx + y1 * dy);
    let c = x1 * x1 + y1 * y1 - 1.0;
    let discriminant = b * b - 4.0 * a * c;
    // Zero means the line only touches the outline.
    if discriminant <= 0.0 {
        return false;
    }
    let root = discriminant.sqrt();
    let t1 = (-b - root) / (2.0 * a);
    let t2 = (-b + root) / (2.0 * a);
    let inside = |t: f32| t > TANGENCY_MARGIN && t < 1.0 - TANGENCY_MARGIN;
    inside(t1) || inside(t2)
}

pub fn can_see(a: Point, b: Point, obstacles: &[Ellipse]) -> bool {
    !obstacles
        .iter()
        .any(|obstacle| segment_intersects_ellipse(a, b, obstacle))
}

/// Shortest polyline from `start` to `end` avoiding the interiors of
/// `obstacles`. Returns the direct segment when it is already clear or when
/// no detour exists.
pub fn route_around_obstacles(start: Point, end: Point, obstacles: &[Ellipse]) -> Vec<Point> {
    if obstacles.is_empty() || can_see(start, end, obstacles) {
        return vec![start, end];
    }
    let graph = VisibilityGraph::build(obstacles, start, end);
    let end_idx = graph.vertices.len() - 1;
    let start_idx = end_idx - 1;
    let path = graph.shortest_path_points(start_idx, end_idx);
    if path.len() < 2 {
        log::debug!("no visibility path, falling back to a straight edge");
        return vec![start, end];
    }
    path
}
