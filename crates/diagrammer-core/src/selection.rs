//! Selection model and manipulation handles.

use crate::canvas::CanvasDocument;
use crate::geometry;
use crate::shapes::{normalize_degrees, ConnectorEnd, Shape, ShapeId, ShapeKind};
use kurbo::{Point, Rect, Size};
use serde::{Deserialize, Serialize};

/// Distance from the top edge to the rotation handle (world units).
pub const ROTATE_HANDLE_OFFSET: f64 = 25.0;

/// Rotation snap step when Shift is held (degrees).
pub const ROTATION_SNAP_DEGREES: f64 = 15.0;

/// Ordered set of selected shape IDs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    ids: Vec<ShapeId>,
}

/// A single shape's frame with its transform, for per-shape handle rendering.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrientedBounds {
    /// Un-rotated local frame.
    pub frame: Rect,
    pub center: Point,
    pub rotation: f64,
    pub scale: f64,
    /// Transformed corners (top-left, top-right, bottom-right, bottom-left).
    pub corners: [Point; 4],
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the selection with a single shape.
    pub fn select_single(&mut self, id: ShapeId) {
        self.ids.clear();
        self.ids.push(id);
    }

    /// Replace the selection, dropping duplicates.
    pub fn select_multiple(&mut self, ids: impl IntoIterator<Item = ShapeId>) {
        self.ids.clear();
        for id in ids {
            self.add(id);
        }
    }

    pub fn select_all(&mut self, ids: impl IntoIterator<Item = ShapeId>) {
        self.select_multiple(ids);
    }

    pub fn add(&mut self, id: ShapeId) {
        if !self.ids.contains(&id) {
            self.ids.push(id);
        }
    }

    pub fn remove(&mut self, id: ShapeId) {
        self.ids.retain(|&s| s != id);
    }

    /// Add or remove a shape. Returns true if it is now selected.
    pub fn toggle(&mut self, id: ShapeId) -> bool {
        if self.contains(id) {
            self.remove(id);
            false
        } else {
            self.ids.push(id);
            true
        }
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    pub fn contains(&self, id: ShapeId) -> bool {
        self.ids.contains(&id)
    }

    pub fn ids(&self) -> &[ShapeId] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// The selected ID when exactly one shape is selected.
    pub fn single(&self) -> Option<ShapeId> {
        match self.ids.as_slice() {
            [id] => Some(*id),
            _ => None,
        }
    }

    /// Drop IDs that no longer exist at the top level of `doc`.
    /// Returns true if anything was removed.
    pub fn retain_existing(&mut self, doc: &CanvasDocument) -> bool {
        let before = self.ids.len();
        self.ids.retain(|&id| doc.get_shape(id).is_some());
        self.ids.len() != before
    }

    /// AABB enclosing all selected shapes' transformed bounds.
    pub fn group_bounds(&self, doc: &CanvasDocument) -> Option<Rect> {
        geometry::union_bounds(self.ids.iter().filter_map(|&id| doc.get_shape(id)))
    }

    /// Oriented bounds of the single selected shape.
    pub fn single_bounds(&self, doc: &CanvasDocument) -> Option<OrientedBounds> {
        let shape = doc.get_shape(self.single()?)?;
        Some(OrientedBounds {
            frame: geometry::shape_bounds(shape),
            center: geometry::shape_center(shape),
            rotation: shape.rotation,
            scale: shape.scale,
            corners: geometry::transformed_corners(shape),
        })
    }
}

/// Type of selection handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HandleKind {
    Corner(Corner),
    Edge(Edge),
    Rotate,
    /// Point handle of a line or polyline.
    Vertex(usize),
    /// Endpoint of a connector.
    ConnectorEnd(ConnectorEnd),
}

/// Corner positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Corner {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

/// Edge positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Edge {
    Top,
    Right,
    Bottom,
    Left,
}

/// A selection handle with its position and type.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Handle {
    /// Position in world coordinates.
    pub position: Point,
    pub kind: HandleKind,
}

impl Handle {
    pub fn new(position: Point, kind: HandleKind) -> Self {
        Self { position, kind }
    }

    /// Check if a point (in world coordinates) hits this handle.
    pub fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        (point - self.position).hypot2() <= tolerance * tolerance
    }
}

/// Get the selection handles for a shape, in world coordinates.
pub fn get_handles(shape: &Shape) -> Vec<Handle> {
    match &shape.kind {
        ShapeKind::Connector(connector) => vec![
            Handle::new(connector.start, HandleKind::ConnectorEnd(ConnectorEnd::Start)),
            Handle::new(connector.end, HandleKind::ConnectorEnd(ConnectorEnd::End)),
        ],
        ShapeKind::Line(path) | ShapeKind::Polyline(path) => path
            .points
            .iter()
            .enumerate()
            .map(|(i, &p)| Handle::new(geometry::local_to_world(shape, p), HandleKind::Vertex(i)))
            .collect(),
        _ => box_handles(shape),
    }
}

fn box_handles(shape: &Shape) -> Vec<Handle> {
    let r = geometry::shape_bounds(shape);
    let c = r.center();
    let scale = if shape.scale.abs() < f64::EPSILON { 1.0 } else { shape.scale.abs() };
    let local = [
        (Point::new(r.x0, r.y0), HandleKind::Corner(Corner::TopLeft)),
        (Point::new(r.x1, r.y0), HandleKind::Corner(Corner::TopRight)),
        (Point::new(r.x0, r.y1), HandleKind::Corner(Corner::BottomLeft)),
        (Point::new(r.x1, r.y1), HandleKind::Corner(Corner::BottomRight)),
        (Point::new(c.x, r.y0), HandleKind::Edge(Edge::Top)),
        (Point::new(r.x1, c.y), HandleKind::Edge(Edge::Right)),
        (Point::new(c.x, r.y1), HandleKind::Edge(Edge::Bottom)),
        (Point::new(r.x0, c.y), HandleKind::Edge(Edge::Left)),
        (
            Point::new(c.x, r.y0 - ROTATE_HANDLE_OFFSET / scale),
            HandleKind::Rotate,
        ),
    ];
    local
        .into_iter()
        .map(|(p, kind)| Handle::new(geometry::local_to_world(shape, p), kind))
        .collect()
}

/// The handle nearest to `point` within `tolerance`, if any.
pub fn hit_test_handles(shape: &Shape, point: Point, tolerance: f64) -> Option<HandleKind> {
    get_handles(shape)
        .into_iter()
        .filter(|h| h.hit_test(point, tolerance))
        .min_by(|a, b| {
            (a.position - point)
                .hypot2()
                .total_cmp(&(b.position - point).hypot2())
        })
        .map(|h| h.kind)
}

/// Resize `original` by dragging a corner or edge handle to `pointer` (world).
///
/// The drag happens in the shape's local frame, so rotated and scaled shapes
/// resize along their own axes. The opposite corner/edge stays fixed in world
/// space. Sizes clamp at `min_size` instead of flipping through zero.
pub fn apply_resize(
    original: &Shape,
    handle: HandleKind,
    pointer: Point,
    min_size: f64,
    keep_aspect_ratio: bool,
) -> Shape {
    let r = geometry::shape_bounds(original);
    let local = geometry::world_to_local(original, pointer);

    let (mut x0, mut y0, mut x1, mut y1) = (r.x0, r.y0, r.x1, r.y1);
    let (moves_left, moves_right, moves_top, moves_bottom) = match handle {
        HandleKind::Corner(Corner::TopLeft) => (true, false, true, false),
        HandleKind::Corner(Corner::TopRight) => (false, true, true, false),
        HandleKind::Corner(Corner::BottomLeft) => (true, false, false, true),
        HandleKind::Corner(Corner::BottomRight) => (false, true, false, true),
        HandleKind::Edge(Edge::Top) => (false, false, true, false),
        HandleKind::Edge(Edge::Right) => (false, true, false, false),
        HandleKind::Edge(Edge::Bottom) => (false, false, false, true),
        HandleKind::Edge(Edge::Left) => (true, false, false, false),
        _ => return original.clone(),
    };
    if moves_left {
        x0 = local.x.min(x1 - min_size);
    }
    if moves_right {
        x1 = local.x.max(x0 + min_size);
    }
    if moves_top {
        y0 = local.y.min(y1 - min_size);
    }
    if moves_bottom {
        y1 = local.y.max(y0 + min_size);
    }

    if keep_aspect_ratio && matches!(handle, HandleKind::Corner(_)) && r.width() > 0.0 && r.height() > 0.0 {
        let factor = ((x1 - x0) / r.width()).max((y1 - y0) / r.height());
        let size = Size::new(r.width() * factor, r.height() * factor);
        if moves_left {
            x0 = x1 - size.width;
        } else {
            x1 = x0 + size.width;
        }
        if moves_top {
            y0 = y1 - size.height;
        } else {
            y1 = y0 + size.height;
        }
    }

    let new_local = Rect::new(x0, y0, x1, y1);
    let world_center = geometry::local_to_world(original, new_local.center());
    let mut shape = original.clone();
    geometry::set_shape_frame(&mut shape, Rect::from_center_size(world_center, new_local.size()));
    shape
}

/// Angle (degrees) of `pointer` around `center`, 0° pointing up.
pub fn pointer_angle(center: Point, pointer: Point) -> f64 {
    let d = pointer - center;
    d.y.atan2(d.x).to_degrees() + 90.0
}

/// Rotate `original` by the pointer's sweep since `start_angle` around `center`.
/// With `snap`, the resulting rotation snaps to 15° steps.
pub fn apply_rotation(
    original: &Shape,
    center: Point,
    start_angle: f64,
    pointer: Point,
    snap: bool,
) -> Shape {
    let sweep = pointer_angle(center, pointer) - start_angle;
    let mut target = normalize_degrees(original.rotation + sweep);
    if snap {
        target = normalize_degrees((target / ROTATION_SNAP_DEGREES).round() * ROTATION_SNAP_DEGREES);
    }
    let mut shape = original.clone();
    geometry::rotate_shape_about(&mut shape, center, target - original.rotation);
    shape
}

/// Move one vertex of a line/polyline to `pointer` (world). Any rotation,
/// scale or flip is first baked into the points so the other vertices stay put.
pub fn apply_vertex_move(original: &Shape, index: usize, pointer: Point) -> Shape {
    let mut shape = original.clone();
    bake_path_transform(&mut shape);
    if let Some(path) = shape.path_mut() {
        if let Some(point) = path.points.get_mut(index) {
            *point = pointer;
        }
    }
    shape.sync_frame();
    shape
}

/// Replace a path shape's transform with equivalent world-space points.
pub fn bake_path_transform(shape: &mut Shape) {
    let Some(path) = shape.path() else {
        return;
    };
    let identity = shape.rotation == 0.0 && shape.scale == 1.0 && !shape.flip_x && !shape.flip_y;
    if identity {
        return;
    }
    let world: Vec<Point> = path
        .points
        .iter()
        .map(|&p| geometry::local_to_world(shape, p))
        .collect();
    if let Some(path) = shape.path_mut() {
        path.points = world;
    }
    shape.rotation = 0.0;
    shape.scale = 1.0;
    shape.flip_x = false;
    shape.flip_y = false;
    shape.sync_frame();
}
