//! Cubic Bézier fitting through routing corridors.
//!
//! A spline is a flat point list `[p0, c1, c2, p1, c3, c4, p2, ...]`: after
//! the first point, every three points are the two control points and the
//! end anchor of one cubic segment. Lists shorter than four points are read
//! as polylines.

use super::geom::{Point, RoutingBox};

/// Samples taken along the curve when validating it against its boxes.
const VALIDATION_SAMPLES: usize = 100;
/// Parameter range exempt from validation at each end; the endpoints sit
/// inside their nodes, not inside any corridor.
const ENDPOINT_EXEMPTION: f32 = 0.05;
/// Slack allowed around each box for numerical imprecision.
const BOX_MARGIN: f32 = 2.0;
const MAX_TIGHTEN_ITERATIONS: usize = 10;
/// Fraction of the way a control point moves toward its anchor per iteration.
const TIGHTEN_STEP: f32 = 0.2;

/// Fits a smooth curve from `start` to `end` through the centers of `boxes`
/// that stays inside them, falling back to the polyline through the centers.
pub fn fit_spline_through_boxes(start: Point, end: Point, boxes: &[RoutingBox]) -> Vec<Point> {
    if boxes.is_empty() {
        return vec![start, start.midpoint(end), end];
    }

    let mut waypoints = Vec::with_capacity(boxes.len() + 2);
    waypoints.push(start);
    waypoints.extend(boxes.iter().map(RoutingBox::center));
    waypoints.push(end);

    let mut spline = catmull_rom_to_bezier(&waypoints);
    if spline_inside_boxes(&spline, boxes) {
        return spline;
    }
    for _ in 0..MAX_TIGHTEN_ITERATIONS {
        spline = tighten_spline(&spline);
        if spline_inside_boxes(&spline, boxes) {
            return spline;
        }
    }
    log::trace!("spline left {} corridors, using polyline", boxes.len());
    waypoints
}

/// Interpolating curve through `waypoints`, two control points per segment
/// taken from one sixth of the neighbouring chord (clamped at the ends).
pub fn catmull_rom_to_bezier(waypoints: &[Point]) -> Vec<Point> {
    if waypoints.len() <= 2 {
        return waypoints.to_vec();
    }
    let last = waypoints.len() - 1;
    let mut result = Vec::with_capacity(last * 3 + 1);
    result.push(waypoints[0]);
    for i in 0..last {
        let p0 = waypoints[i.saturating_sub(1)];
        let p1 = waypoints[i];
        let p2 = waypoints[(i + 1).min(last)];
        let p3 = waypoints[(i + 2).min(last)];
        result.push(Point::new(p1.x + (p2.x - p0.x) / 6.0, p1.y + (p2.y - p0.y) / 6.0));
        result.push(Point::new(p2.x - (p3.x - p1.x) / 6.0, p2.y - (p3.y - p1.y) / 6.0));
        result.push(p2);
    }
    result
}

/// Checks sampled curve points against the box their parameter maps to.
///
/// The mapping is uniform over `[0.05, 0.95]`, not by arc length.
pub fn spline_inside_boxes(spline: &[Point], boxes: &[RoutingBox]) -> bool {
    if boxes.is_empty() {
        return true;
    }
    for i in 0..=VALIDATION_SAMPLES {
        let t = i as f32 / VALIDATION_SAMPLES as f32;
        if t < ENDPOINT_EXEMPTION || t > 1.0 - ENDPOINT_EXEMPTION {
            continue;
        }
        let normalized = (t - ENDPOINT_EXEMPTION) / (1.0 - 2.0 * ENDPOINT_EXEMPTION);
        let box_idx = ((normalized * boxes.len() as f32) as usize).min(boxes.len() - 1);
        let point = evaluate_spline(spline, t);
        if !boxes[box_idx].contains_with_margin(point, BOX_MARGIN) {
            return false;
        }
    }
    true
}

/// Pulls every control point `TIGHTEN_STEP` of the way toward the anchor of
/// its own segment end: first control points toward the segment start,
/// second control points toward the segment end.
pub fn tighten_spline(spline: &[Point]) -> Vec<Point> {
    if spline.len() < 4 {
        return spline.to_vec();
    }
    let last = spline.len() - 1;
    let mut result = spline.to_vec();
    for i in 1..last {
        let anchor = match i % 3 {
            0 => continue,
            1 => spline[(i / 3) * 3],
            _ => spline[((i / 3 + 1) * 3).min(last)],
        };
        result[i] = spline[i].lerp(anchor, TIGHTEN_STEP);
    }
    result
}

fn segment_count(spline: &[Point]) -> usize {
    ((spline.len() - 1) / 3).max(1)
}

/// Point on the spline at `t` in `[0, 1]`. The first and last points are
/// returned exactly at `t = 0` and `t = 1`.
pub fn evaluate_spline(spline: &[Point], t: f32) -> Point {
    let (Some(&first), Some(&last)) = (spline.first(), spline.last()) else {
        return Point::default();
    };
    if spline.len() == 1 || t <= 0.0 {
        return first;
    }
    if t >= 1.0 {
        return last;
    }
    if spline.len() < 4 {
        let scaled = t * (spline.len() - 1) as f32;
        let idx = (scaled as usize).min(spline.len() - 2);
        return spline[idx].lerp(spline[idx + 1], scaled - idx as f32);
    }

    let segments = segment_count(spline);
    let segment = ((t * segments as f32) as usize).min(segments - 1);
    let local = (t * segments as f32 - segment as f32).clamp(0.0, 1.0);
    let i = segment * 3;
    if i + 3 >= spline.len() {
        return last;
    }
    let (p0, p1, p2, p3) = (spline[i], spline[i + 1], spline[i + 2], spline[i + 3]);
    let mt = 1.0 - local;
    let a = mt * mt * mt;
    let b = 3.0 * mt * mt * local;
    let c = 3.0 * mt * local * local;
    let d = local * local * local;
    Point::new(
        a * p0.x + b * p1.x + c * p2.x + d * p3.x,
        a * p0.y + b * p1.y + c * p2.y + d * p3.y,
    )
}

/// Derivative of the spline at `t`; `(1, 0)` when undefined.
pub fn evaluate_spline_tangent(spline: &[Point], t: f32) -> Point {
    if spline.len() < 4 {
        return match (spline.first(), spline.last()) {
            (Some(first), Some(last)) if spline.len() >= 2 => {
                Point::new(last.x - first.x, last.y - first.y)
            }
            _ => Point::new(1.0, 0.0),
        };
    }
    let segments = segment_count(spline);
    let t = t.clamp(0.0, 1.0);
    let segment = ((t * segments as f32) as usize).min(segments - 1);
    let local = t * segments as f32 - segment as f32;
    let i = segment * 3;
    if i + 3 >= spline.len() {
        return Point::new(1.0, 0.0);
    }
    let (p0, p1, p2, p3) = (spline[i], spline[i + 1], spline[i + 2], spline[i + 3]);
    let mt = 1.0 - local;
    let a = 3.0 * mt * mt;
    let b = 6.0 * mt * local;
    let c = 3.0 * local * local;
    Point::new(
        a * (p1.x - p0.x) + b * (p2.x - p1.x) + c * (p3.x - p2.x),
        a * (p1.y - p0.y) + b * (p2.y - p1.y) + c * (p3.y - p2.y),
    )
}

/// Approximate arc length from 100 samples.
pub fn spline_length(spline: &[Point]) -> f32 {
    if spline.len() < 2 {
        return 0.0;
    }
    let mut length = 0.0;
    let mut prev = evaluate_spline(spline, 0.0);
    for i in 1..=VALIDATION_SAMPLES {
        let curr = evaluate_spline(spline, i as f32 / VALIDATION_SAMPLES as f32);
        length += prev.distance(curr);
        prev = curr;
    }
    length
}

pub fn spline_midpoint(spline: &[Point]) -> Point {
    evaluate_spline(spline, 0.5)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corridor(x: f32, y: f32, half_w: f32, half_h: f32) -> RoutingBox {
        RoutingBox {
            left: x - half_w,
            right: x + half_w,
            top: y - half_h,
            bottom: y + half_h,
        }
    }

    #[test]
    fn endpoints_are_exact() {
        let spline = catmull_rom_to_bezier(&[
            Point::new(0.3, 0.7),
            Point::new(10.1, 20.9),
            Point::new(-3.3, 41.7),
            Point::new(5.5, 60.2),
        ]);
        assert_eq!(evaluate_spline(&spline, 0.0), spline[0]);
        assert_eq!(evaluate_spline(&spline, 1.0), *spline.last().unwrap());

        let line = [Point::new(1.0, 1.0), Point::new(4.0, 9.0)];
        assert_eq!(evaluate_spline(&line, 1.0), line[1]);
        let single = [Point::new(3.0, 3.0)];
        assert_eq!(evaluate_spline(&single, 0.4), single[0]);
        assert_eq!(evaluate_spline(&[], 0.4), Point::default());
    }

    #[test]
    fn catmull_rom_passes_through_waypoints() {
        let waypoints = [
            Point::new(0.0, 0.0),
            Point::new(10.0, 10.0),
            Point::new(0.0, 20.0),
        ];
        let spline = catmull_rom_to_bezier(&waypoints);
        assert_eq!(spline.len(), 7);
        assert_eq!(spline[3], waypoints[1]);
        assert_eq!(spline[6], waypoints[2]);
        // First control point of a clamped start uses p0 == p1.
        assert_eq!(spline[1], Point::new(10.0 / 6.0, 10.0 / 6.0));
    }

    #[test]
    fn no_boxes_gives_midpoint_path() {
        let start = Point::new(0.0, 0.0);
        let end = Point::new(10.0, 4.0);
        assert_eq!(
            fit_spline_through_boxes(start, end, &[]),
            vec![start, Point::new(5.0, 2.0), end]
        );
    }

    #[test]
    fn straight_corridor_keeps_curve() {
        let start = Point::new(50.0, 0.0);
        let end = Point::new(50.0, 40.0);
        let boxes = [
            corridor(50.0, 13.0, 10.0, 13.0),
            corridor(50.0, 27.0, 10.0, 13.0),
        ];
        let spline = fit_spline_through_boxes(start, end, &boxes);
        assert_eq!(spline.len(), 10);
        assert_eq!(spline[0], start);
        assert_eq!(*spline.last().unwrap(), end);
        assert!(spline_inside_boxes(&spline, &boxes));
    }

    #[test]
    fn tightening_pulls_overshoot_back_inside() {
        let start = Point::new(7.0, 0.0);
        let end = Point::new(0.0, 12.0);
        let upper = corridor(5.0, 2.5, 3.0, 2.5);
        let lower = corridor(-5.0, 7.5, 3.0, 2.5);
        let boxes = [upper, lower];
        let first = catmull_rom_to_bezier(&[start, upper.center(), lower.center(), end]);
        assert!(!spline_inside_boxes(&first, &boxes));

        let spline = fit_spline_through_boxes(start, end, &boxes);
        assert_eq!(spline.len(), 10);
        assert_ne!(spline, first);
        assert_eq!(spline, tighten_spline(&first));
        assert!(spline_inside_boxes(&spline, &boxes));
        assert_eq!(evaluate_spline(&spline, 0.0), start);
        assert_eq!(evaluate_spline(&spline, 1.0), end);
    }

    #[test]
    fn impossible_corridor_falls_back_to_polyline() {
        let start = Point::new(0.0, 0.0);
        let end = Point::new(100.0, 0.0);
        // A tiny box far off the straight line the curve would take.
        let boxes = [
            corridor(50.0, 80.0, 0.5, 0.5),
            corridor(52.0, -80.0, 0.5, 0.5),
        ];
        let spline = fit_spline_through_boxes(start, end, &boxes);
        assert_eq!(
            spline,
            vec![start, boxes[0].center(), boxes[1].center(), end]
        );
    }

    #[test]
    fn tighten_moves_controls_toward_anchors() {
        let spline = [
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(10.0, 10.0),
            Point::new(0.0, 10.0),
        ];
        let tight = tighten_spline(&spline);
        assert_eq!(tight[0], spline[0]);
        assert_eq!(tight[3], spline[3]);
        assert_eq!(tight[1], Point::new(8.0, 0.0));
        assert_eq!(tight[2], Point::new(8.0, 10.0));
    }

    #[test]
    fn length_and_tangent_of_straight_segment() {
        let spline = catmull_rom_to_bezier(&[
            Point::new(0.0, 0.0),
            Point::new(0.0, 50.0),
            Point::new(0.0, 100.0),
        ]);
        assert!((spline_length(&spline) - 100.0).abs() < 0.5);
        let mid = spline_midpoint(&spline);
        assert!((mid.y - 50.0).abs() < 1e-3);
        let tangent = evaluate_spline_tangent(&spline, 0.25);
        assert!(tangent.y > 0.0 && tangent.x.abs() < 1e-4);
        assert_eq!(evaluate_spline_tangent(&[], 0.5), Point::new(1.0, 0.0));
    }
}
