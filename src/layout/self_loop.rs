//! Geometry for edges that leave and re-enter the same node.

use serde::{Deserialize, Serialize};

use super::geom::{Ellipse, Point};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoopSide {
    #[default]
    Right,
    Left,
    Top,
    Bottom,
}

/// Shape of a self-loop. Offsets are multiplied by the caller's scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelfLoopParams {
    pub side: LoopSide,
    /// Zero-based index among several loops on the same node.
    pub index: usize,
    /// Distance from the node outline to the loop apex.
    pub base_offset: f32,
    /// Extra apex distance per loop index.
    pub spacing: f32,
    /// Port distance from the node axis, as a fraction of the facing radius.
    pub port_offset: f32,
}

impl Default for SelfLoopParams {
    fn default() -> Self {
        Self {
            side: LoopSide::Right,
            index: 0,
            base_offset: 25.0,
            spacing: 18.0,
            port_offset: 0.35,
        }
    }
}

/// Seven control points forming two cubic segments: tail port to apex
/// (`p0..=p3`) and apex to head port (`p3..=p6`).
pub fn self_loop_control_points(node: &Ellipse, params: &SelfLoopParams, scale: f32) -> [Point; 7] {
    let Ellipse { cx, cy, rx, ry } = *node;
    let offset = (params.base_offset + params.index as f32 * params.spacing) * scale;
    let spread = ry * 0.5;

    match params.side {
        LoopSide::Right | LoopSide::Left => {
            let dir = if params.side == LoopSide::Right {
                1.0
            } else {
                -1.0
            };
            let port_y = ry * params.port_offset;
            let dx = rx + offset;
            [
                Point::new(cx + dir * rx, cy - port_y),
                Point::new(cx + dir * (rx + dx * 0.4), cy - port_y - spread),
                Point::new(cx + dir * dx, cy - spread),
                Point::new(cx + dir * dx, cy),
                Point::new(cx + dir * dx, cy + spread),
                Point::new(cx + dir * (rx + dx * 0.4), cy + port_y + spread),
                Point::new(cx + dir * rx, cy + port_y),
            ]
        }
        LoopSide::Top | LoopSide::Bottom => {
            let dir = if params.side == LoopSide::Bottom {
                1.0
            } else {
                -1.0
            };
            let port_x = rx * params.port_offset;
            let dy = ry + offset;
            [
                Point::new(cx - port_x, cy + dir * ry),
                Point::new(cx - port_x - spread, cy + dir * (ry + dy * 0.4)),
                Point::new(cx - spread, cy + dir * dy),
                Point::new(cx, cy + dir * dy),
                Point::new(cx + spread, cy + dir * dy),
                Point::new(cx + port_x + spread, cy + dir * (ry + dy * 0.4)),
                Point::new(cx + port_x, cy + dir * ry),
            ]
        }
    }
}

/// Label center just beyond the loop apex.
pub fn self_loop_label_position(
    points: &[Point; 7],
    side: LoopSide,
    label_width: f32,
    label_height: f32,
    scale: f32,
) -> Point {
    let apex = points[3];
    let gap = 6.0 * scale;
    match side {
        LoopSide::Right => Point::new(apex.x + gap + label_width / 2.0, apex.y),
        LoopSide::Left => Point::new(apex.x - gap - label_width / 2.0, apex.y),
        LoopSide::Top => Point::new(apex.x, apex.y - gap - label_height / 2.0),
        LoopSide::Bottom => Point::new(apex.x, apex.y + gap + label_height / 2.0),
    }
}

/// `(min_x, min_y, max_x, max_y)` of the control points grown by 10% per
/// axis, since the curve may bulge past its hull extremes only slightly.
pub fn self_loop_bounds(points: &[Point]) -> (f32, f32, f32, f32) {
    let Some(first) = points.first() else {
        return (0.0, 0.0, 0.0, 0.0);
    };
    let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
    for p in points {
        min_x = min_x.min(p.x);
        min_y = min_y.min(p.y);
        max_x = max_x.max(p.x);
        max_y = max_y.max(p.y);
    }
    let dx = (max_x - min_x) * 0.1;
    let dy = (max_y - min_y) * 0.1;
    (min_x - dx, min_y - dy, max_x + dx, max_y + dy)
}

/// Picks the first free side with room for a loop, in the order right, top,
/// left, bottom. When none has room, the free side with the most space wins.
pub fn choose_self_loop_side(
    node: &Ellipse,
    canvas_width: f32,
    canvas_height: f32,
    occupied: &[LoopSide],
) -> LoopSide {
    let space = |side: LoopSide| match side {
        LoopSide::Right => canvas_width - (node.cx + node.rx),
        LoopSide::Left => node.cx - node.rx,
        LoopSide::Top => node.cy - node.ry,
        LoopSide::Bottom => canvas_height - (node.cy + node.ry),
    };
    let required = node.rx * 1.5;
    let preference = [
        LoopSide::Right,
        LoopSide::Top,
        LoopSide::Left,
        LoopSide::Bottom,
    ];
    let free = || preference.into_iter().filter(|side| !occupied.contains(side));

    if let Some(side) = free().find(|&side| space(side) >= required) {
        return side;
    }
    free()
        .fold(None, |best: Option<LoopSide>, side| match best {
            Some(b) if space(b) >= space(side) => Some(b),
            _ => Some(side),
        })
        .unwrap_or(LoopSide::Right)
}
