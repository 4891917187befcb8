use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::geom::{Ellipse, Point, Rect, RoutingBox};

/// Placement of one caller-visible node; `x`/`y` are its center.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeLayout {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub rank: usize,
    /// Position within the rank, left to right.
    pub order: usize,
}

impl NodeLayout {
    pub fn center(&self) -> Point {
        Point::new(self.x, self.y)
    }

    /// Elliptical outline used for routing and self-loops.
    pub fn outline(&self) -> Ellipse {
        Ellipse::new(self.x, self.y, self.width / 2.0, self.height / 2.0)
    }

    pub fn footprint(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EdgeRoute {
    pub from: String,
    pub to: String,
    /// Interior points between the two node centers; empty for adjacent
    /// ranks and self-loops.
    pub waypoints: Vec<Point>,
    /// One corridor per waypoint of an edge spanning several ranks.
    pub boxes: Vec<RoutingBox>,
    pub is_self_loop: bool,
    pub is_back_edge: bool,
    pub is_flat_edge: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankInfo {
    pub y: f32,
    pub height: f32,
    /// Real nodes of the rank, left to right.
    pub nodes: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LayoutResult {
    pub nodes: BTreeMap<String, NodeLayout>,
    /// Keyed by `"from->to"`.
    pub edges: BTreeMap<String, EdgeRoute>,
    /// Empty for the non-layered strategies.
    pub ranks: Vec<RankInfo>,
    pub width: f32,
    pub height: f32,
}

impl LayoutResult {
    pub fn empty(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
