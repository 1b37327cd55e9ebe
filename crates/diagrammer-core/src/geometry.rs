//! Pure geometry over shapes: bounds, ports, transforms, hit-testing and
//! connector endpoint resolution.
//!
//! Every shape maps local to world coordinates through one chain around its
//! frame centre: flip, then scale, then rotate. Groups and connectors are the
//! exception: their data is already in world space, so their chain is the
//! identity (a group's rotation/scale/flip fields record what has been baked
//! into its children).

use crate::shapes::{
    point_to_polyline_dist, point_to_segment_dist, Connector, ConnectorEnd, Endpoint, PortId,
    Shape, ShapeId, ShapeKind,
};
use kurbo::{Affine, Point, Rect, Vec2};
use serde::{Deserialize, Serialize};

/// `{x, y, width, height}` form of a shape's local frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl From<Rect> for Bounds {
    fn from(rect: Rect) -> Self {
        Self {
            x: rect.x0,
            y: rect.y0,
            width: rect.width(),
            height: rect.height(),
        }
    }
}

impl From<Bounds> for Rect {
    fn from(b: Bounds) -> Self {
        Rect::new(b.x, b.y, b.x + b.width, b.y + b.height)
    }
}

/// A named anchor on a shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Port {
    pub id: PortId,
    pub x: f64,
    pub y: f64,
}

impl Port {
    fn new(id: &str, point: Point) -> Self {
        Self {
            id: id.to_string(),
            x: point.x,
            y: point.y,
        }
    }

    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

/// Un-rotated, un-scaled frame in local space.
pub fn shape_bounds(shape: &Shape) -> Rect {
    shape.frame()
}

pub fn bounds(shape: &Shape) -> Bounds {
    shape_bounds(shape).into()
}

/// Rotation and scale pivot.
pub fn shape_center(shape: &Shape) -> Point {
    shape_bounds(shape).center()
}

/// Scale about `center`, then rotate about `center` (degrees, clockwise in y-down space).
pub fn transform_point(point: Point, center: Point, rotation_deg: f64, scale: f64) -> Point {
    let scaled = center + (point - center) * scale;
    rotate_point(scaled, center, rotation_deg)
}

/// Exact inverse of [`transform_point`]. A zero scale collapses onto `center`.
pub fn inverse_transform_point(point: Point, center: Point, rotation_deg: f64, scale: f64) -> Point {
    let unrotated = rotate_point(point, center, -rotation_deg);
    if scale.abs() < f64::EPSILON {
        return center;
    }
    center + (unrotated - center) / scale
}

/// Rotate `point` about `center` by `degrees`.
pub fn rotate_point(point: Point, center: Point, degrees: f64) -> Point {
    let (sin, cos) = degrees.to_radians().sin_cos();
    let d = point - center;
    center + Vec2::new(d.x * cos - d.y * sin, d.x * sin + d.y * cos)
}

fn has_own_transform(shape: &Shape) -> bool {
    !matches!(shape.kind, ShapeKind::Group(_) | ShapeKind::Connector(_))
}

/// Local-to-world transform of a shape.
pub fn shape_transform(shape: &Shape) -> Affine {
    if !has_own_transform(shape) {
        return Affine::IDENTITY;
    }
    let c = shape_center(shape).to_vec2();
    let fx = if shape.flip_x { -1.0 } else { 1.0 };
    let fy = if shape.flip_y { -1.0 } else { 1.0 };
    Affine::translate(c)
        * Affine::rotate(shape.rotation.to_radians())
        * Affine::scale(shape.scale)
        * Affine::scale_non_uniform(fx, fy)
        * Affine::translate(-c)
}

pub fn local_to_world(shape: &Shape, point: Point) -> Point {
    if !has_own_transform(shape) {
        return point;
    }
    let c = shape_center(shape);
    transform_point(flip_local(shape, point, c), c, shape.rotation, shape.scale)
}

pub fn world_to_local(shape: &Shape, point: Point) -> Point {
    if !has_own_transform(shape) {
        return point;
    }
    let c = shape_center(shape);
    flip_local(shape, inverse_transform_point(point, c, shape.rotation, shape.scale), c)
}

fn flip_local(shape: &Shape, point: Point, center: Point) -> Point {
    Point::new(
        if shape.flip_x { 2.0 * center.x - point.x } else { point.x },
        if shape.flip_y { 2.0 * center.y - point.y } else { point.y },
    )
}

/// The four corners of the transformed frame (top-left, top-right, bottom-right, bottom-left).
pub fn transformed_corners(shape: &Shape) -> [Point; 4] {
    let r = shape_bounds(shape);
    [
        Point::new(r.x0, r.y0),
        Point::new(r.x1, r.y0),
        Point::new(r.x1, r.y1),
        Point::new(r.x0, r.y1),
    ]
    .map(|p| local_to_world(shape, p))
}

/// Axis-aligned bounding box of the transformed frame.
pub fn transformed_bounds(shape: &Shape) -> Rect {
    let [a, b, c, d] = transformed_corners(shape);
    Rect::from_points(a, b).union_pt(c).union_pt(d)
}

/// Union of several shapes' transformed bounds.
pub fn union_bounds<'a>(shapes: impl IntoIterator<Item = &'a Shape>) -> Option<Rect> {
    shapes
        .into_iter()
        .map(transformed_bounds)
        .reduce(|acc, r| acc.union(r))
}

fn box_ports(r: Rect) -> Vec<Port> {
    let c = r.center();
    vec![
        Port::new("top", Point::new(c.x, r.y0)),
        Port::new("top-right", Point::new(r.x1, r.y0)),
        Port::new("right", Point::new(r.x1, c.y)),
        Port::new("bottom-right", Point::new(r.x1, r.y1)),
        Port::new("bottom", Point::new(c.x, r.y1)),
        Port::new("bottom-left", Point::new(r.x0, r.y1)),
        Port::new("left", Point::new(r.x0, c.y)),
        Port::new("top-left", Point::new(r.x0, r.y0)),
    ]
}

const BOX_PORT_IDS: [&str; 8] = [
    "top",
    "top-right",
    "right",
    "bottom-right",
    "bottom",
    "bottom-left",
    "left",
    "top-left",
];

/// Ports in local (unrotated, unscaled) space, in a stable order.
pub fn ports_for_shape(shape: &Shape) -> Vec<Port> {
    let r = shape_bounds(shape);
    let c = r.center();
    match &shape.kind {
        ShapeKind::Circle => {
            let (rx, ry) = (r.width() / 2.0, r.height() / 2.0);
            BOX_PORT_IDS
                .iter()
                .enumerate()
                .map(|(i, id)| {
                    let angle = (-90.0 + 45.0 * i as f64).to_radians();
                    Port::new(id, Point::new(c.x + rx * angle.cos(), c.y + ry * angle.sin()))
                })
                .collect()
        }
        ShapeKind::Triangle => {
            let apex = Point::new(c.x, r.y0);
            let bl = Point::new(r.x0, r.y1);
            let br = Point::new(r.x1, r.y1);
            vec![
                Port::new("top", apex),
                Port::new("bottom-left", bl),
                Port::new("bottom-right", br),
                Port::new("left", apex.midpoint(bl)),
                Port::new("right", apex.midpoint(br)),
                Port::new("bottom", bl.midpoint(br)),
            ]
        }
        ShapeKind::Line(path) | ShapeKind::Polyline(path) => match (path.start(), path.end()) {
            (Some(start), Some(end)) => vec![Port::new("start", start), Port::new("end", end)],
            _ => Vec::new(),
        },
        ShapeKind::Connector(_) => Vec::new(),
        _ => box_ports(r),
    }
}

/// Ports resolved through the transform chain.
pub fn world_ports(shape: &Shape) -> Vec<Port> {
    ports_for_shape(shape)
        .into_iter()
        .map(|port| {
            let p = local_to_world(shape, port.position());
            Port::new(&port.id, p)
        })
        .collect()
}

/// World position of a named port; `None` if the shape has no such port.
pub fn port_position_by_id(shape: &Shape, port_id: &str) -> Option<Point> {
    ports_for_shape(shape)
        .into_iter()
        .find(|p| p.id == port_id)
        .map(|p| local_to_world(shape, p.position()))
}

/// The shape's world port nearest to `target`.
pub fn nearest_port(shape: &Shape, target: Point) -> Option<Port> {
    world_ports(shape).into_iter().min_by(|a, b| {
        let da = (a.position() - target).hypot2();
        let db = (b.position() - target).hypot2();
        da.total_cmp(&db)
    })
}

/// Hit-test in the shape's local space. `tolerance` is in world units.
pub fn hit_test(shape: &Shape, point: Point, tolerance: f64) -> bool {
    let stroke_pad = shape.style.stroke_width / 2.0;
    match &shape.kind {
        ShapeKind::Group(group) => group
            .children
            .iter()
            .any(|child| hit_test(child, point, tolerance)),
        ShapeKind::Connector(connector) => {
            point_to_segment_dist(point, connector.start, connector.end) <= tolerance + stroke_pad
        }
        kind => {
            let scale = if shape.scale.abs() < f64::EPSILON { 1.0 } else { shape.scale.abs() };
            let tol = tolerance / scale;
            let local = world_to_local(shape, point);
            let r = shape_bounds(shape);
            match kind {
                ShapeKind::Line(path) | ShapeKind::Polyline(path) => {
                    point_to_polyline_dist(local, &path.points) <= tol + stroke_pad
                }
                ShapeKind::Circle => {
                    let c = r.center();
                    let rx = r.width() / 2.0 + tol;
                    let ry = r.height() / 2.0 + tol;
                    if rx <= 0.0 || ry <= 0.0 {
                        return false;
                    }
                    let dx = (local.x - c.x) / rx;
                    let dy = (local.y - c.y) / ry;
                    dx * dx + dy * dy <= 1.0
                }
                ShapeKind::Triangle => {
                    let apex = Point::new(r.center().x, r.y0);
                    let bl = Point::new(r.x0, r.y1);
                    let br = Point::new(r.x1, r.y1);
                    point_in_triangle(local, apex, bl, br)
                        || point_to_polyline_dist(local, &[apex, bl, br, apex]) <= tol
                }
                _ => r.inflate(tol, tol).contains(local),
            }
        }
    }
}

fn point_in_triangle(p: Point, a: Point, b: Point, c: Point) -> bool {
    let v0 = c - a;
    let v1 = b - a;
    let v2 = p - a;
    let dot00 = v0.dot(v0);
    let dot01 = v0.dot(v1);
    let dot02 = v0.dot(v2);
    let dot11 = v1.dot(v1);
    let dot12 = v1.dot(v2);
    let denom = dot00 * dot11 - dot01 * dot01;
    if denom.abs() < f64::EPSILON {
        return false;
    }
    let u = (dot11 * dot02 - dot01 * dot12) / denom;
    let v = (dot00 * dot12 - dot01 * dot02) / denom;
    u >= 0.0 && v >= 0.0 && u + v <= 1.0
}

/// Point an endpoint "aims from" before auto ports are resolved:
/// free ends and explicit ports use their position, auto ends the shape centre.
fn endpoint_hint<'a>(
    endpoint: &Endpoint,
    lookup: &impl Fn(ShapeId) -> Option<&'a Shape>,
) -> Option<Point> {
    match endpoint {
        Endpoint::Free { point } => Some(*point),
        Endpoint::Attached { shape_id, port } => {
            let shape = lookup(*shape_id)?;
            match port {
                Some(port) => port_position_by_id(shape, port)
                    .or_else(|| Some(local_to_world(shape, shape_center(shape)))),
                None => Some(local_to_world(shape, shape_center(shape))),
            }
        }
    }
}

/// Resolve an endpoint to a world coordinate. Auto ports pick the port nearest `toward`.
/// Returns `None` if the bound shape does not exist.
pub fn resolve_endpoint<'a>(
    endpoint: &Endpoint,
    toward: Point,
    lookup: &impl Fn(ShapeId) -> Option<&'a Shape>,
) -> Option<Point> {
    match endpoint {
        Endpoint::Free { point } => Some(*point),
        Endpoint::Attached { shape_id, port } => {
            let shape = lookup(*shape_id)?;
            let explicit = port.as_deref().and_then(|p| port_position_by_id(shape, p));
            if let Some(p) = explicit {
                return Some(p);
            }
            if let Some(p) = port {
                log::warn!("Port '{p}' not found on shape {shape_id}, using nearest port");
            }
            Some(
                nearest_port(shape, toward)
                    .map(|p| p.position())
                    .unwrap_or_else(|| local_to_world(shape, shape_center(shape))),
            )
        }
    }
}

/// Recompute a connector's cached endpoint coordinates from its bindings.
/// Ends whose bound shape no longer exists keep their last coordinate and are
/// returned so the caller can detach or remove the connector.
pub fn update_connector_points<'a>(
    connector: &mut Connector,
    lookup: impl Fn(ShapeId) -> Option<&'a Shape>,
) -> Vec<ConnectorEnd> {
    let from_hint = endpoint_hint(&connector.from, &lookup).unwrap_or(connector.start);
    let to_hint = endpoint_hint(&connector.to, &lookup).unwrap_or(connector.end);

    let mut missing = Vec::new();
    match resolve_endpoint(&connector.from, to_hint, &lookup) {
        Some(p) => connector.start = p,
        None => missing.push(ConnectorEnd::Start),
    }
    match resolve_endpoint(&connector.to, from_hint, &lookup) {
        Some(p) => connector.end = p,
        None => missing.push(ConnectorEnd::End),
    }
    missing
}

/// Rotate a shape about an external pivot, adding `delta_deg` to its rotation.
/// Groups rotate their children; connectors move their free ends.
pub fn rotate_shape_about(shape: &mut Shape, pivot: Point, delta_deg: f64) {
    match &mut shape.kind {
        ShapeKind::Group(group) => {
            for child in &mut group.children {
                rotate_shape_about(child, pivot, delta_deg);
            }
            shape.rotation = crate::shapes::normalize_degrees(shape.rotation + delta_deg);
            shape.sync_frame();
        }
        ShapeKind::Connector(connector) => {
            map_free_ends(connector, |p| rotate_point(p, pivot, delta_deg));
            shape.sync_frame();
        }
        _ => {
            let c = shape_center(shape);
            let moved = rotate_point(c, pivot, delta_deg);
            shape.translate(moved - c);
            shape.rotation = crate::shapes::normalize_degrees(shape.rotation + delta_deg);
        }
    }
}

/// Multiply a shape's scale by `factor` about an external pivot.
pub fn scale_shape_about(shape: &mut Shape, pivot: Point, factor: f64) {
    match &mut shape.kind {
        ShapeKind::Group(group) => {
            for child in &mut group.children {
                scale_shape_about(child, pivot, factor);
            }
            shape.scale *= factor;
            shape.sync_frame();
        }
        ShapeKind::Connector(connector) => {
            map_free_ends(connector, |p| pivot + (p - pivot) * factor);
            shape.sync_frame();
        }
        _ => {
            let c = shape_center(shape);
            let moved = pivot + (c - pivot) * factor;
            shape.translate(moved - c);
            shape.scale *= factor;
        }
    }
}

/// Mirror a shape across the vertical (`horizontal == true`) or horizontal
/// axis through `pivot`.
pub fn flip_shape_about(shape: &mut Shape, pivot: Point, horizontal: bool) {
    let mirror = |p: Point| {
        if horizontal {
            Point::new(2.0 * pivot.x - p.x, p.y)
        } else {
            Point::new(p.x, 2.0 * pivot.y - p.y)
        }
    };
    match &mut shape.kind {
        ShapeKind::Group(group) => {
            for child in &mut group.children {
                flip_shape_about(child, pivot, horizontal);
            }
            shape.sync_frame();
        }
        ShapeKind::Connector(connector) => {
            map_free_ends(connector, mirror);
            shape.sync_frame();
            return;
        }
        _ => {
            let c = shape_center(shape);
            shape.translate(mirror(c) - c);
        }
    }
    if horizontal {
        shape.flip_x = !shape.flip_x;
    } else {
        shape.flip_y = !shape.flip_y;
    }
    shape.rotation = crate::shapes::normalize_degrees(-shape.rotation);
}

/// Replace a shape's local frame. Point-based kinds remap their points; groups
/// map each child's centre linearly and stretch its size by the same factors.
/// Connectors are driven by their endpoints and are left alone.
pub fn set_shape_frame(shape: &mut Shape, frame: Rect) {
    let old = shape_bounds(shape);
    let frame = frame.abs();
    match &mut shape.kind {
        ShapeKind::Connector(_) => return,
        ShapeKind::Line(path) | ShapeKind::Polyline(path) => path.remap(old, frame),
        ShapeKind::Group(group) => {
            let sx = if old.width() > f64::EPSILON { frame.width() / old.width() } else { 1.0 };
            let sy = if old.height() > f64::EPSILON { frame.height() / old.height() } else { 1.0 };
            let map = |p: Point| {
                Point::new(
                    frame.x0 + (p.x - old.x0) * sx,
                    frame.y0 + (p.y - old.y0) * sy,
                )
            };
            for child in &mut group.children {
                if let ShapeKind::Connector(connector) = &mut child.kind {
                    map_free_ends(connector, map);
                    child.sync_frame();
                    continue;
                }
                let child_frame = shape_bounds(child);
                let center = map(child_frame.center());
                let size = kurbo::Size::new(child_frame.width() * sx, child_frame.height() * sy);
                set_shape_frame(child, Rect::from_center_size(center, size));
            }
        }
        _ => {
            shape.position = frame.origin();
            shape.width = frame.width();
            shape.height = frame.height();
            return;
        }
    }
    shape.sync_frame();
}

fn map_free_ends(connector: &mut Connector, f: impl Fn(Point) -> Point) {
    for end in [ConnectorEnd::Start, ConnectorEnd::End] {
        if let Endpoint::Free { point } = connector.endpoint_mut(end) {
            *point = f(*point);
            let p = *point;
            connector.set_point(end, p);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::Shape;

    fn approx(a: Point, b: Point) -> bool {
        (a - b).hypot() < 1e-9
    }

    #[test]
    fn test_transform_scales_before_rotating() {
        let c = Point::new(0.0, 0.0);
        let p = transform_point(Point::new(10.0, 0.0), c, 90.0, 2.0);
        assert!(approx(p, Point::new(0.0, 20.0)));
    }

    #[test]
    fn test_inverse_transform_roundtrip() {
        let c = Point::new(40.0, -15.0);
        let p = Point::new(3.0, 7.5);
        let world = transform_point(p, c, 37.0, 1.7);
        assert!(approx(inverse_transform_point(world, c, 37.0, 1.7), p));
    }

    #[test]
    fn test_port_roundtrip_for_every_kind() {
        let mut shapes = vec![
            Shape::rectangle(Point::new(10.0, 20.0), 80.0, 40.0),
            Shape::circle(Point::new(-30.0, 5.0), 60.0, 30.0),
            Shape::triangle(Point::new(0.0, 0.0), 50.0, 70.0),
            Shape::polyline(vec![
                Point::new(0.0, 0.0),
                Point::new(30.0, 40.0),
                Point::new(70.0, 10.0),
            ]),
        ];
        for (i, shape) in shapes.iter_mut().enumerate() {
            shape.rotation = 30.0 * (i as f64 + 1.0);
            shape.scale = 0.5 + i as f64 * 0.4;
            shape.flip_x = i % 2 == 1;
        }
        for shape in &shapes {
            for port in ports_for_shape(shape) {
                let world = port_position_by_id(shape, &port.id).unwrap();
                assert!(approx(world_to_local(shape, world), port.position()));
            }
        }
    }

    #[test]
    fn test_unknown_port_is_none() {
        let rect = Shape::rectangle(Point::ZERO, 10.0, 10.0);
        assert!(port_position_by_id(&rect, "start").is_none());
        assert_eq!(ports_for_shape(&rect).len(), 8);
        let line = Shape::line(Point::ZERO, Point::new(10.0, 0.0));
        assert_eq!(ports_for_shape(&line).len(), 2);
        let tri = Shape::triangle(Point::ZERO, 10.0, 10.0);
        assert_eq!(ports_for_shape(&tri).len(), 6);
    }

    #[test]
    fn test_rotated_bounds_swap_dimensions() {
        let mut rect = Shape::rectangle(Point::new(0.0, 0.0), 100.0, 40.0);
        rect.rotation = 90.0;
        let b = transformed_bounds(&rect);
        assert!((b.width() - 40.0).abs() < 1e-9);
        assert!((b.height() - 100.0).abs() < 1e-9);
        assert!(approx(b.center(), Point::new(50.0, 20.0)));
    }

    #[test]
    fn test_hit_test_rotated_rectangle() {
        let mut rect = Shape::rectangle(Point::new(0.0, 0.0), 100.0, 10.0);
        assert!(!hit_test(&rect, Point::new(50.0, 40.0), 0.0));
        rect.rotation = 90.0;
        assert!(hit_test(&rect, Point::new(50.0, 40.0), 0.0));
        assert!(!hit_test(&rect, Point::new(90.0, 5.0), 0.0));
    }

    #[test]
    fn test_hit_test_circle_and_triangle() {
        let circle = Shape::circle(Point::new(0.0, 0.0), 100.0, 100.0);
        assert!(hit_test(&circle, Point::new(50.0, 50.0), 0.0));
        assert!(!hit_test(&circle, Point::new(2.0, 2.0), 0.0));

        let tri = Shape::triangle(Point::new(0.0, 0.0), 100.0, 100.0);
        assert!(hit_test(&tri, Point::new(50.0, 80.0), 0.0));
        assert!(!hit_test(&tri, Point::new(5.0, 5.0), 0.0));
    }

    #[test]
    fn test_hit_test_line_uses_tolerance() {
        let line = Shape::line(Point::new(0.0, 0.0), Point::new(100.0, 0.0));
        assert!(hit_test(&line, Point::new(50.0, 3.0), 4.0));
        assert!(!hit_test(&line, Point::new(50.0, 20.0), 4.0));
    }

    #[test]
    fn test_auto_ports_face_each_other() {
        let a = Shape::rectangle(Point::new(0.0, 0.0), 50.0, 50.0);
        let b = Shape::rectangle(Point::new(200.0, 0.0), 50.0, 50.0);
        let mut connector = Connector::new(
            Endpoint::attached(a.id(), None),
            Endpoint::attached(b.id(), None),
        );
        let shapes = [a, b];
        let missing =
            update_connector_points(&mut connector, |id| shapes.iter().find(|s| s.id() == id));
        assert!(missing.is_empty());
        assert!(approx(connector.start, Point::new(50.0, 25.0)));
        assert!(approx(connector.end, Point::new(200.0, 25.0)));
    }

    #[test]
    fn test_missing_shape_keeps_last_point() {
        let a = Shape::rectangle(Point::new(0.0, 0.0), 50.0, 50.0);
        let mut connector = Connector::new(
            Endpoint::attached(a.id(), Some("right".into())),
            Endpoint::attached(uuid::Uuid::new_v4(), None),
        );
        connector.end = Point::new(300.0, 300.0);
        let missing = update_connector_points(&mut connector, |id| (id == a.id()).then_some(&a));
        assert_eq!(missing, vec![ConnectorEnd::End]);
        assert!(approx(connector.start, Point::new(50.0, 25.0)));
        assert!(approx(connector.end, Point::new(300.0, 300.0)));
    }

    #[test]
    fn test_flip_about_own_center_keeps_frame() {
        let mut rect = Shape::rectangle(Point::new(10.0, 10.0), 40.0, 20.0);
        rect.rotation = 30.0;
        let before = transformed_bounds(&rect);
        let old_corners = transformed_corners(&rect);
        let c = shape_center(&rect);
        flip_shape_about(&mut rect, c, true);
        assert!(rect.flip_x);
        assert!((rect.rotation - 330.0).abs() < 1e-9);
        let after = transformed_bounds(&rect);
        assert!(approx(before.origin(), after.origin()));
        // every local point lands on the mirror image of where it was
        for (old, new) in old_corners.iter().zip(transformed_corners(&rect)) {
            assert!(approx(Point::new(2.0 * c.x - old.x, old.y), new));
        }
    }

    #[test]
    fn test_rotate_group_bakes_into_children() {
        let a = Shape::rectangle(Point::new(0.0, 0.0), 10.0, 10.0);
        let b = Shape::rectangle(Point::new(90.0, 0.0), 10.0, 10.0);
        let mut group = Shape::group(vec![a, b]);
        let pivot = shape_center(&group);
        rotate_shape_about(&mut group, pivot, 90.0);
        let frame = shape_bounds(&group);
        assert!((frame.width() - 10.0).abs() < 1e-9);
        assert!((frame.height() - 100.0).abs() < 1e-9);
        assert!((group.rotation - 90.0).abs() < 1e-9);
        // groups carry no transform of their own
        assert_eq!(shape_transform(&group), Affine::IDENTITY);
    }

    #[test]
    fn test_shape_transform_matches_point_chain() {
        let mut rect = Shape::rectangle(Point::new(5.0, 5.0), 30.0, 10.0);
        rect.rotation = 45.0;
        rect.scale = 2.0;
        rect.flip_y = true;
        let p = Point::new(7.0, 9.0);
        assert!(approx(shape_transform(&rect) * p, local_to_world(&rect, p)));
    }
}
