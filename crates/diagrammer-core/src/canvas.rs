//! Canvas document: the ordered shape store.

use crate::config::DanglingConnectorPolicy;
use crate::error::{EditorError, EditorResult};
use crate::geometry;
use crate::shapes::{
    ArrowMode, ConnectorEnd, Endpoint, SerializableColor, Shape, ShapeId, ShapeKind,
};
use kurbo::{Point, Rect, Vec2};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Z-order move direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ZOrder {
    Front,
    Back,
    Forward,
    Backward,
}

/// Partial update merged into a shape by [`CanvasDocument::update_shape`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ShapePatch {
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub rotation: Option<f64>,
    pub scale: Option<f64>,
    pub flip_x: Option<bool>,
    pub flip_y: Option<bool>,
    /// `Some(None)` clears the fill.
    pub fill: Option<Option<SerializableColor>>,
    pub stroke: Option<SerializableColor>,
    pub stroke_width: Option<f64>,
    pub opacity: Option<f64>,
    pub arrow: Option<ArrowMode>,
    pub text: Option<String>,
    pub font_size: Option<f64>,
    pub corner_radius: Option<f64>,
    pub href: Option<String>,
    pub points: Option<Vec<Point>>,
}

impl ShapePatch {
    fn numbers(&self) -> impl Iterator<Item = f64> + '_ {
        [
            self.x,
            self.y,
            self.width,
            self.height,
            self.rotation,
            self.scale,
            self.stroke_width,
            self.opacity,
            self.font_size,
            self.corner_radius,
        ]
        .into_iter()
        .flatten()
        .chain(self.points.iter().flatten().flat_map(|p| [p.x, p.y]))
    }

    fn validate(&self) -> EditorResult<()> {
        if self.numbers().any(|n| !n.is_finite()) {
            return Err(EditorError::DegenerateGeometry("non-finite value".into()));
        }
        if self.width.is_some_and(|w| w < 0.0) || self.height.is_some_and(|h| h < 0.0) {
            return Err(EditorError::DegenerateGeometry("negative size".into()));
        }
        if self.scale.is_some_and(|s| s <= 0.0) {
            return Err(EditorError::DegenerateGeometry("scale must be positive".into()));
        }
        if self.points.as_ref().is_some_and(|p| p.len() < 2) {
            return Err(EditorError::DegenerateGeometry(
                "a path needs at least two points".into(),
            ));
        }
        Ok(())
    }
}

/// A shape removed from the document and the connectors removed with it.
#[derive(Debug, Clone)]
pub struct Removal {
    pub shape: Shape,
    pub removed_connectors: Vec<ShapeId>,
}

/// All shapes in the document, keyed by ID, plus their z-order (back to front).
#[derive(Debug, Clone, Default)]
pub struct CanvasDocument {
    shapes: HashMap<ShapeId, Shape>,
    z_order: Vec<ShapeId>,
}

impl CanvasDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a document from an ordered shape list (bottom first).
    pub fn from_shapes(shapes: Vec<Shape>) -> Self {
        let mut doc = Self::new();
        doc.restore(shapes);
        doc
    }

    /// Append a shape at the top of the z-order and return its ID.
    /// IDs already present in the document are regenerated.
    pub fn add_shape(&mut self, mut shape: Shape) -> ShapeId {
        if shape.all_ids().iter().any(|&id| self.contains(id)) {
            log::debug!("Shape id {} already in use, regenerating", shape.id());
            shape.regenerate_id();
        }
        let id = shape.id();
        self.shapes.insert(id, shape);
        self.z_order.push(id);
        id
    }

    /// Remove a top-level shape. Connectors bound to it (or to anything inside
    /// it) are detached or removed according to `policy`.
    pub fn remove_shape(&mut self, id: ShapeId, policy: DanglingConnectorPolicy) -> Option<Removal> {
        let shape = self.shapes.remove(&id)?;
        self.z_order.retain(|&shape_id| shape_id != id);
        let gone: HashSet<ShapeId> = shape.all_ids().into_iter().collect();
        let removed_connectors = self.handle_dangling(&gone, policy);
        Some(Removal {
            shape,
            removed_connectors,
        })
    }

    fn handle_dangling(
        &mut self,
        gone: &HashSet<ShapeId>,
        policy: DanglingConnectorPolicy,
    ) -> Vec<ShapeId> {
        let dangling: Vec<ShapeId> = self
            .z_order
            .iter()
            .filter(|id| {
                self.shapes
                    .get(*id)
                    .and_then(Shape::as_connector)
                    .is_some_and(|c| gone.iter().any(|&g| c.references(g)))
            })
            .copied()
            .collect();

        let mut removed = Vec::new();
        for connector_id in dangling {
            match policy {
                DanglingConnectorPolicy::Remove => {
                    self.shapes.remove(&connector_id);
                    self.z_order.retain(|&z| z != connector_id);
                    log::debug!("Removed dangling connector {connector_id}");
                    removed.push(connector_id);
                }
                DanglingConnectorPolicy::Detach => {
                    if let Some(connector) = self
                        .shapes
                        .get_mut(&connector_id)
                        .and_then(Shape::as_connector_mut)
                    {
                        for &g in gone {
                            connector.detach_from(g);
                        }
                    }
                    log::debug!("Detached connector {connector_id}");
                }
            }
        }

        // Connectors inside groups are detached regardless of policy.
        for shape in self.shapes.values_mut() {
            detach_nested(shape, gone);
        }
        removed
    }

    /// Remove all shapes.
    pub fn clear(&mut self) {
        self.shapes.clear();
        self.z_order.clear();
    }

    /// Get a top-level shape by ID.
    pub fn get_shape(&self, id: ShapeId) -> Option<&Shape> {
        self.shapes.get(&id)
    }

    pub fn get_shape_mut(&mut self, id: ShapeId) -> Option<&mut Shape> {
        self.shapes.get_mut(&id)
    }

    /// Find a shape by ID, searching inside groups.
    pub fn find_shape(&self, id: ShapeId) -> Option<&Shape> {
        self.shapes.get(&id).or_else(|| {
            self.shapes
                .values()
                .filter_map(Shape::as_group)
                .find_map(|g| g.find_shape(id))
        })
    }

    /// Whether `id` exists at the top level or inside a group.
    pub fn contains(&self, id: ShapeId) -> bool {
        self.find_shape(id).is_some()
    }

    /// Top-level shapes, back to front.
    pub fn shapes_ordered(&self) -> impl Iterator<Item = &Shape> {
        self.z_order.iter().filter_map(|id| self.shapes.get(id))
    }

    pub fn z_order(&self) -> &[ShapeId] {
        &self.z_order
    }

    /// Merge `patch` into a shape, then refresh dependent connectors.
    pub fn update_shape(
        &mut self,
        id: ShapeId,
        patch: &ShapePatch,
        policy: DanglingConnectorPolicy,
    ) -> EditorResult<()> {
        patch.validate()?;
        let shape = self
            .shapes
            .get_mut(&id)
            .ok_or(EditorError::InvalidReference(id))?;
        apply_patch(shape, patch);
        self.refresh_connectors(policy);
        Ok(())
    }

    /// Move a shape within the z-order. Returns false if nothing changed.
    pub fn reorder(&mut self, id: ShapeId, direction: ZOrder) -> bool {
        let Some(pos) = self.z_order.iter().position(|&shape_id| shape_id == id) else {
            return false;
        };
        let last = self.z_order.len() - 1;
        let target = match direction {
            ZOrder::Front => last,
            ZOrder::Back => 0,
            ZOrder::Forward => (pos + 1).min(last),
            ZOrder::Backward => pos.saturating_sub(1),
        };
        if target == pos {
            return false;
        }
        let moved = self.z_order.remove(pos);
        self.z_order.insert(target, moved);
        true
    }

    /// Union of all shapes' transformed bounds.
    pub fn bounds(&self) -> Option<Rect> {
        geometry::union_bounds(self.shapes_ordered())
    }

    /// Shapes hit at a point (world coordinates), front to back.
    pub fn shapes_at_point(&self, point: Point, tolerance: f64) -> Vec<ShapeId> {
        self.z_order
            .iter()
            .rev()
            .filter(|&&id| {
                self.shapes
                    .get(&id)
                    .is_some_and(|s| geometry::hit_test(s, point, tolerance))
            })
            .copied()
            .collect()
    }

    /// Topmost shape at a point.
    pub fn topmost_at(&self, point: Point, tolerance: f64) -> Option<ShapeId> {
        self.shapes_at_point(point, tolerance).into_iter().next()
    }

    /// Shapes whose transformed bounds intersect `rect`, back to front.
    pub fn shapes_in_rect(&self, rect: Rect) -> Vec<ShapeId> {
        let rect = rect.abs();
        self.z_order
            .iter()
            .filter(|&&id| {
                self.shapes.get(&id).is_some_and(|s| {
                    let bounds = geometry::transformed_bounds(s);
                    // zero-area shapes (horizontal lines) still count when touched
                    bounds.x0 <= rect.x1
                        && bounds.x1 >= rect.x0
                        && bounds.y0 <= rect.y1
                        && bounds.y1 >= rect.y0
                })
            })
            .copied()
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    /// Deep copy of all shapes in z-order.
    pub fn snapshot(&self) -> Vec<Shape> {
        self.shapes_ordered().cloned().collect()
    }

    /// Replace the store's contents with an ordered shape list. Derived
    /// frames of path and group shapes are recomputed from their points.
    pub fn restore(&mut self, shapes: Vec<Shape>) {
        self.clear();
        for mut shape in shapes {
            shape.sync_frame();
            let id = shape.id();
            self.z_order.push(id);
            self.shapes.insert(id, shape);
        }
    }

    /// Translate top-level shapes and refresh connectors.
    pub fn translate_shapes(&mut self, ids: &[ShapeId], delta: Vec2, policy: DanglingConnectorPolicy) {
        for id in ids {
            if let Some(shape) = self.shapes.get_mut(id) {
                shape.translate(delta);
            }
        }
        self.refresh_connectors(policy);
    }

    /// Recompute every connector's resolved endpoints. Ends whose shape has
    /// vanished are handled by `policy`. Returns IDs of removed connectors.
    pub fn refresh_connectors(&mut self, policy: DanglingConnectorPolicy) -> Vec<ShapeId> {
        let mut updates = Vec::new();
        let mut gone = HashSet::new();
        for (&id, shape) in &self.shapes {
            collect_connector_updates(self, id, shape, &mut updates, &mut gone);
        }
        for (id, connector) in updates {
            if let Some(shape) = self.find_shape_mut(id) {
                shape.kind = ShapeKind::Connector(connector);
                shape.sync_frame();
            }
        }
        for shape in self.shapes.values_mut() {
            if shape.is_group() {
                sync_group_frames(shape);
            }
        }
        if gone.is_empty() {
            Vec::new()
        } else {
            self.handle_dangling(&gone, policy)
        }
    }

    fn find_shape_mut(&mut self, id: ShapeId) -> Option<&mut Shape> {
        if self.shapes.contains_key(&id) {
            return self.shapes.get_mut(&id);
        }
        self.shapes.values_mut().find_map(|s| find_nested_mut(s, id))
    }

    /// Group top-level shapes. Returns `None` unless at least two exist.
    /// The group takes the z-position of the frontmost member.
    pub fn group_shapes(&mut self, shape_ids: &[ShapeId]) -> Option<ShapeId> {
        let members: Vec<ShapeId> = self
            .z_order
            .iter()
            .filter(|id| shape_ids.contains(id))
            .copied()
            .collect();
        if members.len() < 2 {
            return None;
        }
        let last = members.last().copied()?;
        let front_idx = self.z_order.iter().position(|&id| id == last)?;
        let insert_pos = self.z_order[..front_idx]
            .iter()
            .filter(|id| !members.contains(id))
            .count();

        let children: Vec<Shape> = members
            .iter()
            .filter_map(|id| self.shapes.remove(id))
            .collect();
        self.z_order.retain(|id| !members.contains(id));

        let group = Shape::group(children);
        let group_id = group.id();
        self.shapes.insert(group_id, group);
        self.z_order.insert(insert_pos, group_id);
        Some(group_id)
    }

    /// Dissolve a group, returning its children to the group's z-position.
    /// Connectors bound to the group itself are handled by `policy`.
    pub fn ungroup_shape(
        &mut self,
        group_id: ShapeId,
        policy: DanglingConnectorPolicy,
    ) -> Option<Vec<ShapeId>> {
        if !self.shapes.get(&group_id).is_some_and(Shape::is_group) {
            return None;
        }
        let z_pos = self.z_order.iter().position(|&id| id == group_id)?;
        let shape = self.shapes.remove(&group_id)?;
        self.z_order.remove(z_pos);
        let ShapeKind::Group(group) = shape.kind else {
            return None;
        };

        let children = group.ungroup();
        let child_ids: Vec<ShapeId> = children.iter().map(Shape::id).collect();
        for (i, child) in children.into_iter().enumerate() {
            let child_id = child.id();
            self.shapes.insert(child_id, child);
            self.z_order.insert(z_pos + i, child_id);
        }
        self.handle_dangling(&HashSet::from([group_id]), policy);
        self.refresh_connectors(policy);
        Some(child_ids)
    }
}

fn apply_patch(shape: &mut Shape, patch: &ShapePatch) {
    if let Some(points) = &patch.points {
        if let Some(path) = shape.path_mut() {
            path.points = points.clone();
            shape.sync_frame();
        }
    }
    if patch.x.is_some() || patch.y.is_some() {
        let target = Point::new(
            patch.x.unwrap_or(shape.position.x),
            patch.y.unwrap_or(shape.position.y),
        );
        shape.translate(target - shape.position);
    }
    if patch.width.is_some() || patch.height.is_some() {
        let frame = Rect::from_origin_size(
            shape.position,
            (
                patch.width.unwrap_or(shape.width),
                patch.height.unwrap_or(shape.height),
            ),
        );
        geometry::set_shape_frame(shape, frame);
    }
    if let Some(rotation) = patch.rotation {
        shape.set_rotation(rotation);
    }
    if let Some(scale) = patch.scale {
        if shape.supports_transform() {
            shape.scale = scale;
        }
    }
    if let Some(flip_x) = patch.flip_x {
        shape.flip_x = flip_x;
    }
    if let Some(flip_y) = patch.flip_y {
        shape.flip_y = flip_y;
    }
    if let Some(fill) = patch.fill {
        shape.style.fill = fill;
    }
    if let Some(stroke) = patch.stroke {
        shape.style.stroke = stroke;
    }
    if let Some(width) = patch.stroke_width {
        shape.style.stroke_width = width.max(0.0);
    }
    if let Some(opacity) = patch.opacity {
        shape.style.opacity = opacity.clamp(0.0, 1.0);
    }
    if let Some(arrow) = patch.arrow {
        shape.style.arrow = arrow;
    }
    if let ShapeKind::RoundedRect { corner_radius } = &mut shape.kind {
        if let Some(radius) = patch.corner_radius {
            *corner_radius = radius.max(0.0);
        }
    }
    if let ShapeKind::Icon { href } = &mut shape.kind {
        if let Some(new_href) = &patch.href {
            *href = new_href.clone();
        }
    }
    if patch.text.is_some() || patch.font_size.is_some() {
        if let Some(text) = shape.as_text_mut() {
            if let Some(content) = &patch.text {
                text.text = content.clone();
            }
            if let Some(size) = patch.font_size {
                text.font_size = size;
            }
            let measured = text.measure();
            shape.width = measured.width;
            shape.height = measured.height;
        }
    }
}

fn collect_connector_updates(
    doc: &CanvasDocument,
    id: ShapeId,
    shape: &Shape,
    updates: &mut Vec<(ShapeId, crate::shapes::Connector)>,
    gone: &mut HashSet<ShapeId>,
) {
    match &shape.kind {
        ShapeKind::Connector(connector) => {
            let mut updated = connector.clone();
            let missing = geometry::update_connector_points(&mut updated, |sid| doc.find_shape(sid));
            for end in missing {
                if let Some(sid) = updated.endpoint(end).shape_id() {
                    gone.insert(sid);
                }
            }
            if &updated != connector {
                updates.push((id, updated));
            }
        }
        ShapeKind::Group(group) => {
            for child in &group.children {
                collect_connector_updates(doc, child.id(), child, updates, gone);
            }
        }
        _ => {}
    }
}

fn find_nested_mut(shape: &mut Shape, id: ShapeId) -> Option<&mut Shape> {
    if shape.id() == id {
        return Some(shape);
    }
    match &mut shape.kind {
        ShapeKind::Group(group) => group
            .children
            .iter_mut()
            .find_map(|child| find_nested_mut(child, id)),
        _ => None,
    }
}

fn sync_group_frames(shape: &mut Shape) {
    if let ShapeKind::Group(group) = &mut shape.kind {
        for child in &mut group.children {
            sync_group_frames(child);
        }
    }
    shape.sync_frame();
}

fn detach_nested(shape: &mut Shape, gone: &HashSet<ShapeId>) {
    if let ShapeKind::Group(group) = &mut shape.kind {
        for child in &mut group.children {
            if let Some(connector) = child.as_connector_mut() {
                for end in [ConnectorEnd::Start, ConnectorEnd::End] {
                    let bound = connector.endpoint(end).shape_id();
                    if bound.is_some_and(|sid| gone.contains(&sid)) {
                        *connector.endpoint_mut(end) = Endpoint::free(connector.point(end));
                    }
                }
            } else {
                detach_nested(child, gone);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::Connector;

    const DETACH: DanglingConnectorPolicy = DanglingConnectorPolicy::Detach;

    fn connect(doc: &mut CanvasDocument, a: ShapeId, b: ShapeId) -> ShapeId {
        let connector = Connector::new(Endpoint::attached(a, None), Endpoint::attached(b, None));
        let id = doc.add_shape(Shape::connector(connector));
        doc.refresh_connectors(DETACH);
        id
    }

    #[test]
    fn test_document_creation() {
        let doc = CanvasDocument::new();
        assert!(doc.is_empty());
        assert!(doc.bounds().is_none());
    }

    #[test]
    fn test_add_shape() {
        let mut doc = CanvasDocument::new();
        let id = doc.add_shape(Shape::rectangle(Point::new(0.0, 0.0), 100.0, 100.0));
        assert_eq!(doc.len(), 1);
        assert!(doc.get_shape(id).is_some());
    }

    #[test]
    fn test_add_duplicate_id_regenerates() {
        let mut doc = CanvasDocument::new();
        let rect = Shape::rectangle(Point::ZERO, 10.0, 10.0);
        let first = doc.add_shape(rect.clone());
        let second = doc.add_shape(rect);
        assert_ne!(first, second);
        assert_eq!(doc.len(), 2);
    }

    #[test]
    fn test_remove_shape() {
        let mut doc = CanvasDocument::new();
        let id = doc.add_shape(Shape::rectangle(Point::new(0.0, 0.0), 100.0, 100.0));
        let removed = doc.remove_shape(id, DETACH);
        assert!(removed.is_some());
        assert!(doc.is_empty());
        assert!(doc.remove_shape(id, DETACH).is_none());
    }

    #[test]
    fn test_z_order() {
        let mut doc = CanvasDocument::new();
        let id1 = doc.add_shape(Shape::rectangle(Point::new(0.0, 0.0), 100.0, 100.0));
        let id2 = doc.add_shape(Shape::rectangle(Point::new(50.0, 50.0), 100.0, 100.0));
        let id3 = doc.add_shape(Shape::rectangle(Point::new(80.0, 80.0), 100.0, 100.0));

        assert_eq!(doc.z_order(), &[id1, id2, id3]);

        assert!(doc.reorder(id1, ZOrder::Front));
        assert_eq!(doc.z_order(), &[id2, id3, id1]);

        assert!(doc.reorder(id1, ZOrder::Back));
        assert_eq!(doc.z_order(), &[id1, id2, id3]);

        assert!(doc.reorder(id1, ZOrder::Forward));
        assert_eq!(doc.z_order(), &[id2, id1, id3]);

        assert!(doc.reorder(id3, ZOrder::Backward));
        assert_eq!(doc.z_order(), &[id2, id3, id1]);

        assert!(!doc.reorder(id2, ZOrder::Backward));
        assert!(!doc.reorder(id1, ZOrder::Front));
    }

    #[test]
    fn test_shapes_at_point() {
        let mut doc = CanvasDocument::new();
        let id1 = doc.add_shape(Shape::rectangle(Point::new(0.0, 0.0), 100.0, 100.0));
        let id2 = doc.add_shape(Shape::rectangle(Point::new(50.0, 50.0), 100.0, 100.0));

        // Front shape first
        let hits = doc.shapes_at_point(Point::new(75.0, 75.0), 0.0);
        assert_eq!(hits, vec![id2, id1]);

        let hits = doc.shapes_at_point(Point::new(25.0, 25.0), 0.0);
        assert_eq!(hits, vec![id1]);
    }

    #[test]
    fn test_shapes_in_rect() {
        let mut doc = CanvasDocument::new();
        let id1 = doc.add_shape(Shape::rectangle(Point::new(0.0, 0.0), 10.0, 10.0));
        let _far = doc.add_shape(Shape::rectangle(Point::new(500.0, 500.0), 10.0, 10.0));
        let line = doc.add_shape(Shape::line(Point::new(20.0, 5.0), Point::new(40.0, 5.0)));
        let hits = doc.shapes_in_rect(Rect::new(50.0, 50.0, 5.0, 0.0));
        assert_eq!(hits, vec![id1, line]);
    }

    #[test]
    fn test_update_merges_fields() {
        let mut doc = CanvasDocument::new();
        let id = doc.add_shape(Shape::rectangle(Point::new(0.0, 0.0), 10.0, 10.0));
        let patch = ShapePatch {
            x: Some(30.0),
            width: Some(50.0),
            opacity: Some(0.5),
            ..Default::default()
        };
        doc.update_shape(id, &patch, DETACH).unwrap();
        let shape = doc.get_shape(id).unwrap();
        assert!((shape.position.x - 30.0).abs() < f64::EPSILON);
        assert!(shape.position.y.abs() < f64::EPSILON);
        assert!((shape.width - 50.0).abs() < f64::EPSILON);
        assert!((shape.height - 10.0).abs() < f64::EPSILON);
        assert!((shape.style.opacity - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_update_rejects_bad_values() {
        let mut doc = CanvasDocument::new();
        let id = doc.add_shape(Shape::rectangle(Point::ZERO, 10.0, 10.0));
        let nan = ShapePatch {
            x: Some(f64::NAN),
            ..Default::default()
        };
        assert!(matches!(
            doc.update_shape(id, &nan, DETACH),
            Err(EditorError::DegenerateGeometry(_))
        ));
        for scale in [0.0, -2.0] {
            let flat = ShapePatch {
                scale: Some(scale),
                ..Default::default()
            };
            assert!(matches!(
                doc.update_shape(id, &flat, DETACH),
                Err(EditorError::DegenerateGeometry(_))
            ));
        }
        assert!((doc.get_shape(id).unwrap().scale - 1.0).abs() < f64::EPSILON);
        let missing = uuid::Uuid::new_v4();
        assert_eq!(
            doc.update_shape(missing, &ShapePatch::default(), DETACH),
            Err(EditorError::InvalidReference(missing))
        );
    }

    #[test]
    fn test_restore_resyncs_path_frames() {
        let mut line = Shape::line(Point::new(10.0, 20.0), Point::new(110.0, 70.0));
        line.position = Point::new(500.0, 500.0);
        line.width = 1.0;
        line.height = 1.0;
        let mut doc = CanvasDocument::new();
        doc.restore(vec![line]);
        let shape = doc.shapes_ordered().next().unwrap();
        assert_eq!(shape.position, Point::new(10.0, 20.0));
        assert!((shape.width - 100.0).abs() < f64::EPSILON);
        assert!((shape.height - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_connector_follows_moved_shape() {
        let mut doc = CanvasDocument::new();
        let a = doc.add_shape(Shape::rectangle(Point::new(0.0, 0.0), 50.0, 50.0));
        let b = doc.add_shape(Shape::rectangle(Point::new(200.0, 0.0), 50.0, 50.0));
        let c = connect(&mut doc, a, b);

        doc.translate_shapes(&[b], Vec2::new(0.0, 100.0), DETACH);
        let connector = doc.get_shape(c).and_then(Shape::as_connector).unwrap();
        // B now sits below-right of A
        assert_ne!(connector.end, Point::new(200.0, 25.0));
        assert!(connector.end.y >= 100.0);
    }

    #[test]
    fn test_remove_detaches_connector() {
        let mut doc = CanvasDocument::new();
        let a = doc.add_shape(Shape::rectangle(Point::new(0.0, 0.0), 50.0, 50.0));
        let b = doc.add_shape(Shape::rectangle(Point::new(200.0, 0.0), 50.0, 50.0));
        let c = connect(&mut doc, a, b);

        let removal = doc.remove_shape(b, DETACH).unwrap();
        assert!(removal.removed_connectors.is_empty());
        let connector = doc.get_shape(c).and_then(Shape::as_connector).unwrap();
        assert_eq!(connector.to, Endpoint::free(Point::new(200.0, 25.0)));
        assert_eq!(connector.from_shape_id(), Some(a));
    }

    #[test]
    fn test_remove_policy_deletes_connector() {
        let mut doc = CanvasDocument::new();
        let a = doc.add_shape(Shape::rectangle(Point::new(0.0, 0.0), 50.0, 50.0));
        let b = doc.add_shape(Shape::rectangle(Point::new(200.0, 0.0), 50.0, 50.0));
        let c = connect(&mut doc, a, b);

        let removal = doc.remove_shape(a, DanglingConnectorPolicy::Remove).unwrap();
        assert_eq!(removal.removed_connectors, vec![c]);
        assert!(doc.get_shape(c).is_none());
        assert_eq!(doc.len(), 1);
    }

    #[test]
    fn test_group_and_ungroup() {
        let mut doc = CanvasDocument::new();
        let id1 = doc.add_shape(Shape::rectangle(Point::new(0.0, 0.0), 10.0, 10.0));
        let back = doc.add_shape(Shape::circle(Point::new(100.0, 100.0), 10.0, 10.0));
        let id2 = doc.add_shape(Shape::rectangle(Point::new(40.0, 30.0), 10.0, 10.0));
        let top = doc.add_shape(Shape::triangle(Point::new(200.0, 0.0), 10.0, 10.0));

        let group = doc.group_shapes(&[id2, id1]).unwrap();
        assert_eq!(doc.z_order(), &[back, group, top]);
        assert!(doc.find_shape(id1).is_some());
        assert!(doc.get_shape(id1).is_none());
        let frame = doc.get_shape(group).unwrap().frame();
        assert_eq!(frame, Rect::new(0.0, 0.0, 50.0, 40.0));

        let children = doc.ungroup_shape(group, DETACH).unwrap();
        assert_eq!(children, vec![id1, id2]);
        assert_eq!(doc.z_order(), &[back, id1, id2, top]);
        assert!(doc.group_shapes(&[id1]).is_none());
    }

    #[test]
    fn test_connector_into_group_child_resolves() {
        let mut doc = CanvasDocument::new();
        let a = doc.add_shape(Shape::rectangle(Point::new(0.0, 0.0), 50.0, 50.0));
        let b = doc.add_shape(Shape::rectangle(Point::new(200.0, 0.0), 50.0, 50.0));
        let other = doc.add_shape(Shape::rectangle(Point::new(200.0, 200.0), 10.0, 10.0));
        let c = connect(&mut doc, a, b);
        let group = doc.group_shapes(&[b, other]).unwrap();

        doc.translate_shapes(&[group], Vec2::new(100.0, 0.0), DETACH);
        let connector = doc.get_shape(c).and_then(Shape::as_connector).unwrap();
        assert_eq!(connector.to_shape_id(), Some(b));
        assert_eq!(connector.end, Point::new(300.0, 25.0));
    }
}
