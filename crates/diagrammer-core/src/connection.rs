//! Port markers, connector endpoint handles and pending connections.
//!
//! The manager owns a registry from stable keys to marker state. Renderers
//! read the registry to draw port dots and endpoint handles; the core never
//! assumes how they are drawn.

use crate::canvas::CanvasDocument;
use crate::config::EditorConfig;
use crate::error::{EditorError, EditorResult};
use crate::geometry;
use crate::shapes::{ConnectorEnd, Endpoint, PortId, Shape, ShapeId};
use kurbo::Point;
use std::collections::{HashMap, HashSet};

/// Identity of a visual marker.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MarkerKey {
    Port { shape_id: ShapeId, port: PortId },
    ConnectorEnd { connector_id: ShapeId, end: ConnectorEnd },
}

/// Render state of a marker.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Marker {
    pub position: Point,
    pub radius: f64,
    pub highlighted: bool,
}

/// A port found near the pointer.
#[derive(Debug, Clone, PartialEq)]
pub struct PortHit {
    pub shape_id: ShapeId,
    pub port: PortId,
    pub position: Point,
    pub distance: f64,
}

/// A connector whose start is bound and whose end is still following the pointer.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingConnection {
    pub from_shape: ShapeId,
    pub from_port: Option<PortId>,
}

impl PendingConnection {
    pub fn endpoint(&self) -> Endpoint {
        Endpoint::attached(self.from_shape, self.from_port.clone())
    }
}

/// Owns port visibility, the active snap highlight and the pending connection.
#[derive(Debug, Clone)]
pub struct ConnectionManager {
    markers: HashMap<MarkerKey, Marker>,
    port_shapes: HashSet<ShapeId>,
    handle_connectors: HashSet<ShapeId>,
    highlight: Option<(ShapeId, PortId)>,
    pending: Option<PendingConnection>,
    port_radius: f64,
    highlight_radius: f64,
    snap_tolerance: f64,
}

impl ConnectionManager {
    pub fn new(config: &EditorConfig) -> Self {
        Self {
            markers: HashMap::new(),
            port_shapes: HashSet::new(),
            handle_connectors: HashSet::new(),
            highlight: None,
            pending: None,
            port_radius: config.port_radius,
            highlight_radius: config.port_highlight_radius,
            snap_tolerance: config.snap_tolerance,
        }
    }

    pub fn snap_tolerance(&self) -> f64 {
        self.snap_tolerance
    }

    /// Show port markers for a shape. Returns false if the shape is missing
    /// or has no ports.
    pub fn show_ports(&mut self, doc: &CanvasDocument, shape_id: ShapeId) -> bool {
        let Some(shape) = doc.find_shape(shape_id) else {
            return false;
        };
        let ports = geometry::world_ports(shape);
        if ports.is_empty() {
            return false;
        }
        self.port_shapes.insert(shape_id);
        for port in ports {
            let highlighted = self.is_highlighted(shape_id, &port.id);
            self.markers.insert(
                MarkerKey::Port {
                    shape_id,
                    port: port.id.clone(),
                },
                Marker {
                    position: port.position(),
                    radius: self.radius_for(highlighted),
                    highlighted,
                },
            );
        }
        true
    }

    pub fn hide_ports(&mut self, shape_id: ShapeId) {
        self.port_shapes.remove(&shape_id);
        self.markers
            .retain(|key, _| !matches!(key, MarkerKey::Port { shape_id: s, .. } if *s == shape_id));
        if self.highlight.as_ref().is_some_and(|(s, _)| *s == shape_id) {
            self.highlight = None;
        }
    }

    pub fn hide_all_ports(&mut self) {
        let shown: Vec<ShapeId> = self.port_shapes.iter().copied().collect();
        for shape_id in shown {
            self.hide_ports(shape_id);
        }
    }

    pub fn ports_visible(&self, shape_id: ShapeId) -> bool {
        self.port_shapes.contains(&shape_id)
    }

    /// Show draggable endpoint handles for a connector.
    pub fn show_connector_handles(&mut self, doc: &CanvasDocument, connector_id: ShapeId) -> bool {
        let Some(connector) = doc.find_shape(connector_id).and_then(Shape::as_connector) else {
            return false;
        };
        self.handle_connectors.insert(connector_id);
        for end in [ConnectorEnd::Start, ConnectorEnd::End] {
            self.markers.insert(
                MarkerKey::ConnectorEnd { connector_id, end },
                Marker {
                    position: connector.point(end),
                    radius: self.port_radius,
                    highlighted: false,
                },
            );
        }
        true
    }

    pub fn hide_connector_handles(&mut self, connector_id: ShapeId) {
        self.handle_connectors.remove(&connector_id);
        self.markers.retain(|key, _| {
            !matches!(key, MarkerKey::ConnectorEnd { connector_id: c, .. } if *c == connector_id)
        });
    }

    pub fn hide_all_connector_handles(&mut self) {
        let shown: Vec<ShapeId> = self.handle_connectors.iter().copied().collect();
        for connector_id in shown {
            self.hide_connector_handles(connector_id);
        }
    }

    pub fn markers(&self) -> impl Iterator<Item = (&MarkerKey, &Marker)> {
        self.markers.iter()
    }

    pub fn marker(&self, key: &MarkerKey) -> Option<&Marker> {
        self.markers.get(key)
    }

    /// Nearest port of any shape within `tolerance` of `point`, skipping `exclude`.
    pub fn find_nearest_port(
        &self,
        doc: &CanvasDocument,
        point: Point,
        tolerance: f64,
        exclude: Option<ShapeId>,
    ) -> Option<PortHit> {
        doc.shapes_ordered()
            .filter(|shape| Some(shape.id()) != exclude && !shape.is_connector())
            .flat_map(|shape| {
                geometry::world_ports(shape)
                    .into_iter()
                    .map(move |port| PortHit {
                        shape_id: shape.id(),
                        distance: (port.position() - point).hypot(),
                        position: port.position(),
                        port: port.id,
                    })
            })
            .filter(|hit| hit.distance <= tolerance)
            .min_by(|a, b| a.distance.total_cmp(&b.distance))
    }

    /// A currently shown port marker within `radius` of `point`.
    pub fn hit_visible_port(&self, point: Point, radius: f64) -> Option<(ShapeId, PortId)> {
        self.markers
            .iter()
            .filter_map(|(key, marker)| match key {
                MarkerKey::Port { shape_id, port } => {
                    let d = (marker.position - point).hypot();
                    (d <= radius).then(|| (d, *shape_id, port.clone()))
                }
                MarkerKey::ConnectorEnd { .. } => None,
            })
            .min_by(|a, b| a.0.total_cmp(&b.0))
            .map(|(_, shape_id, port)| (shape_id, port))
    }

    fn radius_for(&self, highlighted: bool) -> f64 {
        if highlighted {
            self.highlight_radius
        } else {
            self.port_radius
        }
    }

    fn is_highlighted(&self, shape_id: ShapeId, port: &str) -> bool {
        self.highlight
            .as_ref()
            .is_some_and(|(s, p)| *s == shape_id && p == port)
    }

    /// Set the single active snap highlight, clearing any previous one.
    pub fn set_highlight(&mut self, target: Option<(ShapeId, PortId)>) {
        if self.highlight == target {
            return;
        }
        let previous = self.highlight.take();
        for (shape_id, port) in previous.into_iter().chain(target.clone()) {
            let highlighted = target.as_ref() == Some(&(shape_id, port.clone()));
            let radius = self.radius_for(highlighted);
            if let Some(marker) = self.markers.get_mut(&MarkerKey::Port { shape_id, port }) {
                marker.highlighted = highlighted;
                marker.radius = radius;
            }
        }
        self.highlight = target;
    }

    pub fn clear_highlight(&mut self) {
        self.set_highlight(None);
    }

    pub fn highlighted(&self) -> Option<&(ShapeId, PortId)> {
        self.highlight.as_ref()
    }

    /// Begin a connector bound to `shape_id` (and `port`, if given).
    pub fn start_connection(
        &mut self,
        doc: &CanvasDocument,
        shape_id: ShapeId,
        port: Option<PortId>,
    ) -> EditorResult<()> {
        let shape = doc
            .find_shape(shape_id)
            .ok_or(EditorError::InvalidReference(shape_id))?;
        if let Some(port) = &port {
            if geometry::port_position_by_id(shape, port).is_none() {
                return Err(EditorError::UnknownPort {
                    shape_id,
                    port: port.clone(),
                });
            }
        }
        log::debug!("Connection started from {shape_id} ({port:?})");
        self.pending = Some(PendingConnection {
            from_shape: shape_id,
            from_port: port,
        });
        Ok(())
    }

    pub fn pending(&self) -> Option<&PendingConnection> {
        self.pending.as_ref()
    }

    pub fn take_pending(&mut self) -> Option<PendingConnection> {
        self.pending.take()
    }

    pub fn cancel_connection(&mut self) {
        if self.pending.take().is_some() {
            log::debug!("Connection cancelled");
        }
        self.clear_highlight();
    }

    /// Recompute marker positions after geometry changes and drop markers for
    /// shapes that no longer exist.
    pub fn refresh(&mut self, doc: &CanvasDocument) {
        let port_shapes: Vec<ShapeId> = self.port_shapes.iter().copied().collect();
        for shape_id in port_shapes {
            self.hide_ports_keep_highlight(shape_id);
            if !self.show_ports(doc, shape_id) {
                self.hide_ports(shape_id);
            }
        }
        let connectors: Vec<ShapeId> = self.handle_connectors.iter().copied().collect();
        for connector_id in connectors {
            if !self.show_connector_handles(doc, connector_id) {
                self.hide_connector_handles(connector_id);
            }
        }
        if self
            .pending
            .as_ref()
            .is_some_and(|p| !doc.contains(p.from_shape))
        {
            self.pending = None;
        }
    }

    fn hide_ports_keep_highlight(&mut self, shape_id: ShapeId) {
        self.markers
            .retain(|key, _| !matches!(key, MarkerKey::Port { shape_id: s, .. } if *s == shape_id));
    }

    /// Drop all markers, highlights and the pending connection.
    pub fn clear(&mut self) {
        self.markers.clear();
        self.port_shapes.clear();
        self.handle_connectors.clear();
        self.highlight = None;
        self.pending = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::Connector;

    fn setup() -> (CanvasDocument, ShapeId, ShapeId, ConnectionManager) {
        let mut doc = CanvasDocument::new();
        let a = doc.add_shape(Shape::rectangle(Point::new(0.0, 0.0), 50.0, 50.0));
        let b = doc.add_shape(Shape::rectangle(Point::new(200.0, 0.0), 50.0, 50.0));
        (doc, a, b, ConnectionManager::new(&EditorConfig::default()))
    }

    #[test]
    fn test_show_and_hide_ports() {
        let (doc, a, _, mut manager) = setup();
        assert!(manager.show_ports(&doc, a));
        assert_eq!(manager.markers().count(), 8);
        let right = manager
            .marker(&MarkerKey::Port {
                shape_id: a,
                port: "right".into(),
            })
            .unwrap();
        assert_eq!(right.position, Point::new(50.0, 25.0));
        assert!((right.radius - 5.0).abs() < f64::EPSILON);

        manager.hide_ports(a);
        assert_eq!(manager.markers().count(), 0);
        assert!(!manager.show_ports(&doc, uuid::Uuid::new_v4()));
    }

    #[test]
    fn test_single_highlight() {
        let (doc, a, b, mut manager) = setup();
        manager.show_ports(&doc, a);
        manager.show_ports(&doc, b);
        manager.set_highlight(Some((a, "right".into())));
        manager.set_highlight(Some((b, "left".into())));

        let highlighted: Vec<&Marker> = manager.markers().map(|(_, m)| m).filter(|m| m.highlighted).collect();
        assert_eq!(highlighted.len(), 1);
        assert!((highlighted[0].radius - 7.0).abs() < f64::EPSILON);
        assert_eq!(highlighted[0].position, Point::new(200.0, 25.0));

        manager.clear_highlight();
        assert!(manager.markers().all(|(_, m)| !m.highlighted && (m.radius - 5.0).abs() < f64::EPSILON));
    }

    #[test]
    fn test_find_nearest_port_respects_tolerance() {
        let (doc, a, b, manager) = setup();
        let hit = manager
            .find_nearest_port(&doc, Point::new(195.0, 28.0), 14.0, None)
            .unwrap();
        assert_eq!(hit.shape_id, b);
        assert_eq!(hit.port, "left");
        assert!(manager.find_nearest_port(&doc, Point::new(120.0, 25.0), 14.0, None).is_none());
        assert!(manager.find_nearest_port(&doc, Point::new(52.0, 25.0), 14.0, Some(a)).is_none());
    }

    #[test]
    fn test_start_connection_validates() {
        let (doc, a, _, mut manager) = setup();
        let missing = uuid::Uuid::new_v4();
        assert_eq!(
            manager.start_connection(&doc, missing, None),
            Err(EditorError::InvalidReference(missing))
        );
        assert!(matches!(
            manager.start_connection(&doc, a, Some("start".into())),
            Err(EditorError::UnknownPort { .. })
        ));
        manager.start_connection(&doc, a, Some("right".into())).unwrap();
        assert_eq!(manager.pending().unwrap().from_shape, a);
        manager.cancel_connection();
        assert!(manager.pending().is_none());
    }

    #[test]
    fn test_refresh_tracks_moves_and_deletions() {
        let (mut doc, a, b, mut manager) = setup();
        let connector = Connector::new(Endpoint::attached(a, None), Endpoint::attached(b, None));
        let c = doc.add_shape(Shape::connector(connector));
        doc.refresh_connectors(Default::default());
        manager.show_ports(&doc, a);
        manager.show_connector_handles(&doc, c);

        doc.translate_shapes(&[a], kurbo::Vec2::new(0.0, 10.0), Default::default());
        manager.refresh(&doc);
        let top = manager
            .marker(&MarkerKey::Port {
                shape_id: a,
                port: "top".into(),
            })
            .unwrap();
        assert_eq!(top.position, Point::new(25.0, 10.0));

        doc.remove_shape(a, Default::default());
        manager.refresh(&doc);
        assert!(!manager.ports_visible(a));
        assert_eq!(manager.markers().count(), 2);
    }
}
