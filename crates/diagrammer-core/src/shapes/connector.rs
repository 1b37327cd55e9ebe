//! Connector shape: an edge between two shape ports or literal points.

use super::{PortId, ShapeId};
use kurbo::{Point, Rect, Vec2};
use serde::{Deserialize, Serialize};

/// One end of a connector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Endpoint {
    /// Bound to a shape. `port == None` resolves to the port nearest the other end.
    #[serde(rename_all = "camelCase")]
    Attached {
        shape_id: ShapeId,
        #[serde(default)]
        port: Option<PortId>,
    },
    /// Detached end anchored at a literal point.
    Free { point: Point },
}

impl Endpoint {
    pub fn attached(shape_id: ShapeId, port: Option<PortId>) -> Self {
        Self::Attached { shape_id, port }
    }

    pub fn free(point: Point) -> Self {
        Self::Free { point }
    }

    /// The shape this end is bound to, if any.
    pub fn shape_id(&self) -> Option<ShapeId> {
        match self {
            Endpoint::Attached { shape_id, .. } => Some(*shape_id),
            Endpoint::Free { .. } => None,
        }
    }

    pub fn port(&self) -> Option<&str> {
        match self {
            Endpoint::Attached { port, .. } => port.as_deref(),
            Endpoint::Free { .. } => None,
        }
    }
}

/// Which end of a connector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectorEnd {
    Start,
    End,
}

impl ConnectorEnd {
    pub fn opposite(self) -> Self {
        match self {
            ConnectorEnd::Start => ConnectorEnd::End,
            ConnectorEnd::End => ConnectorEnd::Start,
        }
    }
}

/// A connector between two endpoints. `start`/`end` cache the resolved
/// world coordinates and are refreshed whenever bound shapes move.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connector {
    pub from: Endpoint,
    pub to: Endpoint,
    pub start: Point,
    pub end: Point,
}

impl Connector {
    pub fn new(from: Endpoint, to: Endpoint) -> Self {
        let start = match &from {
            Endpoint::Free { point } => *point,
            Endpoint::Attached { .. } => Point::ZERO,
        };
        let end = match &to {
            Endpoint::Free { point } => *point,
            Endpoint::Attached { .. } => Point::ZERO,
        };
        Self { from, to, start, end }
    }

    pub fn from_shape_id(&self) -> Option<ShapeId> {
        self.from.shape_id()
    }

    pub fn to_shape_id(&self) -> Option<ShapeId> {
        self.to.shape_id()
    }

    pub fn endpoint(&self, end: ConnectorEnd) -> &Endpoint {
        match end {
            ConnectorEnd::Start => &self.from,
            ConnectorEnd::End => &self.to,
        }
    }

    pub fn endpoint_mut(&mut self, end: ConnectorEnd) -> &mut Endpoint {
        match end {
            ConnectorEnd::Start => &mut self.from,
            ConnectorEnd::End => &mut self.to,
        }
    }

    /// Resolved coordinate of one end.
    pub fn point(&self, end: ConnectorEnd) -> Point {
        match end {
            ConnectorEnd::Start => self.start,
            ConnectorEnd::End => self.end,
        }
    }

    pub fn set_point(&mut self, end: ConnectorEnd, point: Point) {
        match end {
            ConnectorEnd::Start => self.start = point,
            ConnectorEnd::End => self.end = point,
        }
    }

    /// Whether either end is bound to `shape_id`.
    pub fn references(&self, shape_id: ShapeId) -> bool {
        self.from_shape_id() == Some(shape_id) || self.to_shape_id() == Some(shape_id)
    }

    /// Freeze any end bound to `shape_id` at its last resolved coordinate.
    /// Returns true if an end was detached.
    pub fn detach_from(&mut self, shape_id: ShapeId) -> bool {
        let mut detached = false;
        if self.from_shape_id() == Some(shape_id) {
            self.from = Endpoint::free(self.start);
            detached = true;
        }
        if self.to_shape_id() == Some(shape_id) {
            self.to = Endpoint::free(self.end);
            detached = true;
        }
        detached
    }

    /// Move free ends by `delta`; attached ends follow their shapes instead.
    pub fn translate(&mut self, delta: Vec2) {
        if let Endpoint::Free { point } = &mut self.from {
            *point += delta;
            self.start = *point;
        }
        if let Endpoint::Free { point } = &mut self.to {
            *point += delta;
            self.end = *point;
        }
    }

    pub fn bounds(&self) -> Rect {
        Rect::from_points(self.start, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_detach_freezes_last_point() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let mut connector = Connector::new(Endpoint::attached(a, None), Endpoint::attached(b, None));
        connector.start = Point::new(10.0, 10.0);
        connector.end = Point::new(90.0, 10.0);

        assert!(connector.detach_from(a));
        assert_eq!(connector.from, Endpoint::free(Point::new(10.0, 10.0)));
        assert_eq!(connector.to_shape_id(), Some(b));
        assert!(!connector.references(a));
        assert!(!connector.detach_from(a));
    }

    #[test]
    fn test_translate_moves_only_free_ends() {
        let a = Uuid::new_v4();
        let mut connector = Connector::new(
            Endpoint::attached(a, Some("right".into())),
            Endpoint::free(Point::new(50.0, 50.0)),
        );
        connector.start = Point::new(5.0, 5.0);
        connector.translate(Vec2::new(10.0, 0.0));
        assert_eq!(connector.start, Point::new(5.0, 5.0));
        assert_eq!(connector.end, Point::new(60.0, 50.0));
    }

    #[test]
    fn test_endpoint_json_shape() {
        let id = Uuid::new_v4();
        let json = serde_json::to_value(Endpoint::attached(id, Some("top".into()))).unwrap();
        assert_eq!(json["type"], "attached");
        assert_eq!(json["shapeId"], id.to_string());
        assert_eq!(json["port"], "top");
    }
}
