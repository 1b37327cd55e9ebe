//! Point lists for lines and polylines.

use kurbo::{Point, Rect, Vec2};
use serde::{Deserialize, Serialize};

/// An open path through a list of points (local space).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polyline {
    pub points: Vec<Point>,
}

impl Polyline {
    pub fn new(points: Vec<Point>) -> Self {
        Self { points }
    }

    pub fn start(&self) -> Option<Point> {
        self.points.first().copied()
    }

    pub fn end(&self) -> Option<Point> {
        self.points.last().copied()
    }

    /// Axis-aligned bounding box of all points.
    pub fn bounds(&self) -> Rect {
        let Some(&first) = self.points.first() else {
            return Rect::ZERO;
        };
        self.points
            .iter()
            .skip(1)
            .fold(Rect::from_points(first, first), |acc, &p| acc.union_pt(p))
    }

    pub fn translate(&mut self, delta: Vec2) {
        for point in &mut self.points {
            *point += delta;
        }
    }

    /// Map every point from `from` into `to`, keeping relative positions.
    /// Degenerate source extents map onto the target's origin edge.
    pub fn remap(&mut self, from: Rect, to: Rect) {
        let sx = if from.width() > f64::EPSILON { to.width() / from.width() } else { 1.0 };
        let sy = if from.height() > f64::EPSILON { to.height() / from.height() } else { 1.0 };
        for point in &mut self.points {
            point.x = to.x0 + (point.x - from.x0) * sx;
            point.y = to.y0 + (point.y - from.y0) * sy;
        }
    }
}
