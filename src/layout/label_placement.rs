// Collision-aware label placement. The caller owns the accumulator of
// occupied rectangles and threads it through successive placements.

use super::geom::{Point, Rect, rect_overlap};

/// Occupied footprints: node rectangles seeded up front, then every label
/// placed so far.
#[derive(Debug, Clone, Default)]
pub struct PlacedLabels {
    rects: Vec<Rect>,
}

impl PlacedLabels {
    pub fn new(obstacles: impl IntoIterator<Item = Rect>) -> Self {
        Self {
            rects: obstacles.into_iter().collect(),
        }
    }

    /// Records a footprint placed by other means, e.g. a self-loop label.
    pub fn insert(&mut self, rect: Rect) {
        self.rects.push(rect);
    }

    pub fn len(&self) -> usize {
        self.rects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rects.is_empty()
    }

    fn total_overlap(&self, rect: &Rect) -> f32 {
        self.rects.iter().map(|obs| rect_overlap(rect, obs)).sum()
    }

    fn is_clear(&self, rect: &Rect) -> bool {
        !self.rects.iter().any(|obs| obs.overlaps(rect))
    }

    fn claim(&mut self, center: Point, w: f32, h: f32) -> Point {
        self.rects.push(Rect::new(center.x, center.y, w, h));
        center
    }
}

/// Tries the four sides of `anchor`, then the four diagonals, and takes the
/// first clear spot; otherwise the candidate with the least overlap area.
pub fn place_label(placed: &mut PlacedLabels, anchor: Point, w: f32, h: f32, gap: f32) -> Point {
    let dx = w / 2.0 + gap;
    let dy = h / 2.0 + gap;
    let candidates = [
        Point::new(anchor.x, anchor.y - dy),
        Point::new(anchor.x, anchor.y + dy),
        Point::new(anchor.x + dx, anchor.y),
        Point::new(anchor.x - dx, anchor.y),
        Point::new(anchor.x + dx, anchor.y - dy),
        Point::new(anchor.x - dx, anchor.y - dy),
        Point::new(anchor.x + dx, anchor.y + dy),
        Point::new(anchor.x - dx, anchor.y + dy),
    ];

    let mut best = candidates[0];
    let mut best_overlap = f32::INFINITY;
    for pos in candidates {
        let overlap = placed.total_overlap(&Rect::new(pos.x, pos.y, w, h));
        if overlap == 0.0 {
            return placed.claim(pos, w, h);
        }
        if overlap < best_overlap {
            best_overlap = overlap;
            best = pos;
        }
    }
    placed.claim(best, w, h)
}

/// Places a label beside the midpoint of segment `p1`-`p2`, stepping away
/// from it perpendicularly on alternating sides before falling back to
/// [`place_label`].
pub fn place_label_on_edge(
    placed: &mut PlacedLabels,
    p1: Point,
    p2: Point,
    w: f32,
    h: f32,
    gap: f32,
) -> Point {
    let mid = p1.midpoint(p2);
    let dist = p1.distance(p2);
    if dist < 1.0 {
        return place_label(placed, mid, w, h, gap);
    }
    let perp_x = -(p2.y - p1.y) / dist;
    let perp_y = (p2.x - p1.x) / dist;

    for offset in [gap, -gap, gap * 2.0, -gap * 2.0] {
        let pos = Point::new(mid.x + perp_x * offset, mid.y + perp_y * offset);
        if placed.is_clear(&Rect::new(pos.x, pos.y, w, h)) {
            return placed.claim(pos, w, h);
        }
    }
    place_label(placed, mid, w, h, gap)
}

/// Places a label `offset` away from a curve point, perpendicular to its
/// tangent. A vanishing tangent returns the curve point unrecorded.
pub fn place_label_on_curve(
    placed: &mut PlacedLabels,
    curve_point: Point,
    tangent: Point,
    w: f32,
    h: f32,
    offset: f32,
) -> Point {
    let len = (tangent.x * tangent.x + tangent.y * tangent.y).sqrt();
    if len < 0.001 {
        return curve_point;
    }
    let perp_x = -tangent.y / len;
    let perp_y = tangent.x / len;
    let at = |sign: f32| {
        Point::new(
            curve_point.x + perp_x * offset * sign,
            curve_point.y + perp_y * offset * sign,
        )
    };

    for sign in [1.0, -1.0] {
        let pos = at(sign);
        if placed.is_clear(&Rect::new(pos.x, pos.y, w, h)) {
            return placed.claim(pos, w, h);
        }
    }
    placed.claim(at(1.0), w, h)
}
