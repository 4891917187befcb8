use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance(self, other: Point) -> f32 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// Linear interpolation, `t = 0` yields `self` and `t = 1` yields `other`.
    pub fn lerp(self, other: Point, t: f32) -> Point {
        Point {
            x: self.x * (1.0 - t) + other.x * t,
            y: self.y * (1.0 - t) + other.y * t,
        }
    }

    pub fn midpoint(self, other: Point) -> Point {
        Point {
            x: (self.x + other.x) / 2.0,
            y: (self.y + other.y) / 2.0,
        }
    }
}

/// Axis-aligned corridor a path segment between two ranks may travel through.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RoutingBox {
    pub left: f32,
    pub right: f32,
    pub top: f32,
    pub bottom: f32,
}

impl RoutingBox {
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.left && p.x <= self.right && p.y >= self.top && p.y <= self.bottom
    }

    pub fn contains_with_margin(&self, p: Point, margin: f32) -> bool {
        p.x >= self.left - margin
            && p.x <= self.right + margin
            && p.y >= self.top - margin
            && p.y <= self.bottom + margin
    }

    pub fn center(&self) -> Point {
        Point {
            x: (self.left + self.right) / 2.0,
            y: (self.top + self.bottom) / 2.0,
        }
    }

    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    pub fn height(&self) -> f32 {
        self.bottom - self.top
    }
}

/// Elliptical node outline used as a routing obstacle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ellipse {
    pub cx: f32,
    pub cy: f32,
    pub rx: f32,
    pub ry: f32,
}

impl Ellipse {
    pub const fn new(cx: f32, cy: f32, rx: f32, ry: f32) -> Self {
        Self { cx, cy, rx, ry }
    }

    pub fn center(&self) -> Point {
        Point::new(self.cx, self.cy)
    }

    /// Maps a point into the space where this ellipse is the unit circle.
    pub(crate) fn normalize(&self, p: Point) -> (f32, f32) {
        ((p.x - self.cx) / self.rx, (p.y - self.cy) / self.ry)
    }

    /// Radii must be positive for the unit-circle transform to be defined.
    pub(crate) fn is_degenerate(&self) -> bool {
        !(self.rx > 0.0 && self.ry > 0.0)
    }
}

/// Center-based rectangle, as used for label footprints.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    pub fn overlaps(&self, other: &Rect) -> bool {
        rect_overlap(self, other) > 0.0
    }
}

/// Overlap area of two rectangles, zero when they only touch or are apart.
pub fn rect_overlap(a: &Rect, b: &Rect) -> f32 {
    let overlap_x = (a.w + b.w) / 2.0 - (a.x - b.x).abs();
    let overlap_y = (a.h + b.h) / 2.0 - (a.y - b.y).abs();
    if overlap_x <= 0.0 || overlap_y <= 0.0 {
        return 0.0;
    }
    overlap_x * overlap_y
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn routing_box_queries() {
        let b = RoutingBox {
            left: 10.0,
            right: 100.0,
            top: 20.0,
            bottom: 80.0,
        };
        assert!(b.contains(Point::new(50.0, 50.0)));
        assert!(!b.contains(Point::new(5.0, 50.0)));
        assert!(!b.contains(Point::new(50.0, 10.0)));
        assert!(b.contains_with_margin(Point::new(9.0, 50.0), 2.0));
        assert_eq!(b.center(), Point::new(55.0, 50.0));
        assert_eq!(b.width(), 90.0);
        assert_eq!(b.height(), 60.0);
    }

    #[test]
    fn rect_overlap_area() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(5.0, 5.0, 10.0, 10.0);
        assert_eq!(rect_overlap(&a, &b), 25.0);
        let touching = Rect::new(10.0, 0.0, 10.0, 10.0);
        assert_eq!(rect_overlap(&a, &touching), 0.0);
        assert!(!a.overlaps(&touching));
    }
}
