//! Shape definitions for the diagram.

mod connector;
mod group;
mod polyline;
mod text;

pub use connector::{Connector, ConnectorEnd, Endpoint};
pub use group::Group;
pub use polyline::Polyline;
pub use text::{FontWeight, TextAlign, TextContent};

use kurbo::{Point, Rect, Size, Vec2};
use peniko::Color;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for shapes.
pub type ShapeId = Uuid;

/// Identifier of a port on a shape (`"top"`, `"bottom-left"`, `"start"`, ...).
pub type PortId = String;

/// Serializable color representation (RGBA8).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializableColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl SerializableColor {
    pub fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn black() -> Self {
        Self::new(0, 0, 0, 255)
    }

    pub fn white() -> Self {
        Self::new(255, 255, 255, 255)
    }

    pub fn transparent() -> Self {
        Self::new(0, 0, 0, 0)
    }

    /// Parse `#rgb`, `#rrggbb` or `#rrggbbaa`. Returns `None` for anything else.
    pub fn from_hex(color: &str) -> Option<Self> {
        if color.eq_ignore_ascii_case("transparent") || color.eq_ignore_ascii_case("none") {
            return Some(Self::transparent());
        }
        let hex = color.trim().strip_prefix('#')?;
        if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        let channel = |s: &str| u8::from_str_radix(s, 16).ok();
        match hex.len() {
            3 => Some(Self::new(
                channel(&hex[0..1])? * 17,
                channel(&hex[1..2])? * 17,
                channel(&hex[2..3])? * 17,
                255,
            )),
            6 => Some(Self::new(
                channel(&hex[0..2])?,
                channel(&hex[2..4])?,
                channel(&hex[4..6])?,
                255,
            )),
            8 => Some(Self::new(
                channel(&hex[0..2])?,
                channel(&hex[2..4])?,
                channel(&hex[4..6])?,
                channel(&hex[6..8])?,
            )),
            _ => None,
        }
    }

    /// Format as `#rrggbb` (alpha is emitted separately as an opacity).
    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// Alpha as a 0..1 opacity.
    pub fn alpha(&self) -> f64 {
        self.a as f64 / 255.0
    }
}

impl From<Color> for SerializableColor {
    fn from(color: Color) -> Self {
        let rgba = color.to_rgba8();
        Self {
            r: rgba.r,
            g: rgba.g,
            b: rgba.b,
            a: rgba.a,
        }
    }
}

impl From<SerializableColor> for Color {
    fn from(color: SerializableColor) -> Self {
        Color::from_rgba8(color.r, color.g, color.b, color.a)
    }
}

/// Which ends of a line-like shape carry an arrowhead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArrowMode {
    #[default]
    None,
    Start,
    End,
    Both,
}

impl ArrowMode {
    pub fn has_start(self) -> bool {
        matches!(self, ArrowMode::Start | ArrowMode::Both)
    }

    pub fn has_end(self) -> bool {
        matches!(self, ArrowMode::End | ArrowMode::Both)
    }
}

/// Style properties for shapes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShapeStyle {
    /// Fill color (None = no fill).
    #[serde(default)]
    pub fill: Option<SerializableColor>,
    /// Stroke color.
    pub stroke: SerializableColor,
    /// Stroke width.
    pub stroke_width: f64,
    /// Overall opacity (0.0 = fully transparent, 1.0 = fully opaque).
    #[serde(default = "default_opacity")]
    pub opacity: f64,
    /// Arrowheads for lines, polylines and connectors.
    #[serde(default)]
    pub arrow: ArrowMode,
}

fn default_opacity() -> f64 {
    1.0
}

fn default_scale() -> f64 {
    1.0
}

impl ShapeStyle {
    /// Get the stroke color as a peniko Color.
    pub fn stroke_color(&self) -> Color {
        self.stroke.into()
    }

    /// Get the fill color as a peniko Color.
    pub fn fill_color(&self) -> Option<Color> {
        self.fill.map(|c| c.into())
    }

    /// Style used for connectors: no fill, arrow at the target end.
    pub fn connector() -> Self {
        Self {
            fill: None,
            arrow: ArrowMode::End,
            ..Self::default()
        }
    }
}

impl Default for ShapeStyle {
    fn default() -> Self {
        Self {
            fill: Some(SerializableColor::white()),
            stroke: SerializableColor::black(),
            stroke_width: 2.0,
            opacity: 1.0,
            arrow: ArrowMode::None,
        }
    }
}

/// Shape type without type-specific data, used by "add shape of type" commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ShapeType {
    Rectangle,
    RoundedRect,
    Circle,
    Triangle,
    Line,
    Connector,
    Text,
    Icon,
    Polyline,
    Group,
}

impl ShapeType {
    /// Default size for a newly placed shape of this type.
    pub fn default_size(self) -> Size {
        match self {
            ShapeType::Rectangle | ShapeType::RoundedRect => Size::new(120.0, 80.0),
            ShapeType::Circle | ShapeType::Triangle => Size::new(100.0, 100.0),
            ShapeType::Line | ShapeType::Polyline => Size::new(120.0, 60.0),
            ShapeType::Text => Size::new(120.0, 24.0),
            ShapeType::Icon => Size::new(48.0, 48.0),
            ShapeType::Connector | ShapeType::Group => Size::ZERO,
        }
    }

    /// Build a default shape of this type with its frame's top-left at `position`.
    /// Connectors and groups need references to other shapes and return `None`.
    pub fn default_shape(self, position: Point, style: &ShapeStyle) -> Option<Shape> {
        let size = self.default_size();
        let mut shape = match self {
            ShapeType::Rectangle => Shape::rectangle(position, size.width, size.height),
            ShapeType::RoundedRect => Shape::rounded_rect(position, size.width, size.height, 12.0),
            ShapeType::Circle => Shape::circle(position, size.width, size.height),
            ShapeType::Triangle => Shape::triangle(position, size.width, size.height),
            ShapeType::Line => Shape::line(position, position + Vec2::new(size.width, 0.0)),
            ShapeType::Polyline => Shape::polyline(vec![
                position,
                position + Vec2::new(size.width / 2.0, size.height),
                position + Vec2::new(size.width, 0.0),
            ]),
            ShapeType::Text => Shape::text(position, TextContent::new("Text")),
            ShapeType::Icon => Shape::icon(position, size.width, size.height, String::new()),
            ShapeType::Connector | ShapeType::Group => return None,
        };
        shape.style = style.clone();
        if matches!(self, ShapeType::Line | ShapeType::Polyline | ShapeType::Text) {
            shape.style.fill = None;
        }
        Some(shape)
    }
}

/// Type-specific shape data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ShapeKind {
    Rectangle,
    #[serde(rename_all = "camelCase")]
    RoundedRect { corner_radius: f64 },
    /// Ellipse inscribed in the frame.
    Circle,
    /// Apex at the top centre of the frame.
    Triangle,
    Line(Polyline),
    Connector(Connector),
    Text(TextContent),
    Icon { href: String },
    Polyline(Polyline),
    Group(Group),
}

/// A diagram element.
///
/// Box-like kinds own their frame (`position`, `width`, `height`). Line-like kinds,
/// connectors and groups derive their frame from their data; the stored frame is
/// refreshed by [`Shape::sync_frame`] after every edit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Shape {
    pub(crate) id: ShapeId,
    pub kind: ShapeKind,
    /// Top-left corner of the unrotated frame.
    pub position: Point,
    pub width: f64,
    pub height: f64,
    /// Rotation in degrees, clockwise in y-down space, around the frame centre.
    #[serde(default)]
    pub rotation: f64,
    /// Uniform scale around the frame centre (applied before rotation).
    #[serde(default = "default_scale")]
    pub scale: f64,
    #[serde(default)]
    pub flip_x: bool,
    #[serde(default)]
    pub flip_y: bool,
    pub style: ShapeStyle,
}

impl Shape {
    /// Create a shape of the given kind with an explicit frame.
    pub fn new(kind: ShapeKind, position: Point, width: f64, height: f64) -> Self {
        let mut shape = Self {
            id: Uuid::new_v4(),
            kind,
            position,
            width,
            height,
            rotation: 0.0,
            scale: 1.0,
            flip_x: false,
            flip_y: false,
            style: ShapeStyle::default(),
        };
        shape.sync_frame();
        shape
    }

    pub fn rectangle(position: Point, width: f64, height: f64) -> Self {
        Self::new(ShapeKind::Rectangle, position, width, height)
    }

    pub fn rounded_rect(position: Point, width: f64, height: f64, corner_radius: f64) -> Self {
        Self::new(ShapeKind::RoundedRect { corner_radius }, position, width, height)
    }

    pub fn circle(position: Point, width: f64, height: f64) -> Self {
        Self::new(ShapeKind::Circle, position, width, height)
    }

    pub fn triangle(position: Point, width: f64, height: f64) -> Self {
        Self::new(ShapeKind::Triangle, position, width, height)
    }

    pub fn line(start: Point, end: Point) -> Self {
        let mut shape = Self::new(
            ShapeKind::Line(Polyline::new(vec![start, end])),
            start,
            0.0,
            0.0,
        );
        shape.style.fill = None;
        shape
    }

    pub fn polyline(points: Vec<Point>) -> Self {
        let first = points.first().copied().unwrap_or(Point::ZERO);
        let mut shape = Self::new(ShapeKind::Polyline(Polyline::new(points)), first, 0.0, 0.0);
        shape.style.fill = None;
        shape
    }

    pub fn text(position: Point, content: TextContent) -> Self {
        let size = content.measure();
        let mut shape = Self::new(ShapeKind::Text(content), position, size.width, size.height);
        shape.style.fill = None;
        shape
    }

    pub fn icon(position: Point, width: f64, height: f64, href: String) -> Self {
        Self::new(ShapeKind::Icon { href }, position, width, height)
    }

    pub fn connector(connector: Connector) -> Self {
        let start = connector.start;
        let mut shape = Self::new(ShapeKind::Connector(connector), start, 0.0, 0.0);
        shape.style = ShapeStyle::connector();
        shape
    }

    pub fn group(children: Vec<Shape>) -> Self {
        let mut shape = Self::new(ShapeKind::Group(Group::new(children)), Point::ZERO, 0.0, 0.0);
        shape.style.fill = None;
        shape
    }

    pub fn id(&self) -> ShapeId {
        self.id
    }

    /// The shape's type tag.
    pub fn shape_type(&self) -> ShapeType {
        match &self.kind {
            ShapeKind::Rectangle => ShapeType::Rectangle,
            ShapeKind::RoundedRect { .. } => ShapeType::RoundedRect,
            ShapeKind::Circle => ShapeType::Circle,
            ShapeKind::Triangle => ShapeType::Triangle,
            ShapeKind::Line(_) => ShapeType::Line,
            ShapeKind::Connector(_) => ShapeType::Connector,
            ShapeKind::Text(_) => ShapeType::Text,
            ShapeKind::Icon { .. } => ShapeType::Icon,
            ShapeKind::Polyline(_) => ShapeType::Polyline,
            ShapeKind::Group(_) => ShapeType::Group,
        }
    }

    /// The unrotated, unscaled frame in local space.
    pub fn frame(&self) -> Rect {
        Rect::from_origin_size(self.position, Size::new(self.width, self.height))
    }

    /// Recompute the stored frame for kinds whose geometry lives in their data.
    pub fn sync_frame(&mut self) {
        let derived = match &self.kind {
            ShapeKind::Line(path) | ShapeKind::Polyline(path) => Some(path.bounds()),
            ShapeKind::Connector(connector) => Some(connector.bounds()),
            ShapeKind::Group(group) => group.bounds(),
            _ => None,
        };
        if let Some(rect) = derived {
            self.position = rect.origin();
            self.width = rect.width();
            self.height = rect.height();
        }
    }

    /// Move the shape by `delta` in local space.
    pub fn translate(&mut self, delta: Vec2) {
        match &mut self.kind {
            ShapeKind::Line(path) | ShapeKind::Polyline(path) => path.translate(delta),
            ShapeKind::Connector(connector) => connector.translate(delta),
            ShapeKind::Group(group) => {
                for child in &mut group.children {
                    child.translate(delta);
                }
            }
            _ => self.position += delta,
        }
        self.sync_frame();
    }

    /// Regenerate this shape's ID (and the IDs of any group children).
    /// Used when duplicating or pasting shapes.
    pub fn regenerate_id(&mut self) {
        self.id = Uuid::new_v4();
        if let ShapeKind::Group(group) = &mut self.kind {
            for child in &mut group.children {
                child.regenerate_id();
            }
        }
    }

    /// This shape's ID followed by the IDs of all nested group children.
    pub fn all_ids(&self) -> Vec<ShapeId> {
        let mut ids = vec![self.id];
        if let ShapeKind::Group(group) = &self.kind {
            for child in &group.children {
                ids.extend(child.all_ids());
            }
        }
        ids
    }

    pub fn is_connector(&self) -> bool {
        matches!(self.kind, ShapeKind::Connector(_))
    }

    pub fn as_connector(&self) -> Option<&Connector> {
        match &self.kind {
            ShapeKind::Connector(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_connector_mut(&mut self) -> Option<&mut Connector> {
        match &mut self.kind {
            ShapeKind::Connector(c) => Some(c),
            _ => None,
        }
    }

    pub fn is_group(&self) -> bool {
        matches!(self.kind, ShapeKind::Group(_))
    }

    pub fn as_group(&self) -> Option<&Group> {
        match &self.kind {
            ShapeKind::Group(g) => Some(g),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&TextContent> {
        match &self.kind {
            ShapeKind::Text(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_text_mut(&mut self) -> Option<&mut TextContent> {
        match &mut self.kind {
            ShapeKind::Text(t) => Some(t),
            _ => None,
        }
    }

    /// Points of a line or polyline.
    pub fn path(&self) -> Option<&Polyline> {
        match &self.kind {
            ShapeKind::Line(p) | ShapeKind::Polyline(p) => Some(p),
            _ => None,
        }
    }

    pub fn path_mut(&mut self) -> Option<&mut Polyline> {
        match &mut self.kind {
            ShapeKind::Line(p) | ShapeKind::Polyline(p) => Some(p),
            _ => None,
        }
    }

    /// Connectors follow their endpoints and cannot be rotated, scaled or flipped.
    pub fn supports_transform(&self) -> bool {
        !self.is_connector()
    }

    /// Whether the frame can be resized with corner/edge handles.
    pub fn supports_resize(&self) -> bool {
        !matches!(
            self.kind,
            ShapeKind::Connector(_) | ShapeKind::Line(_) | ShapeKind::Polyline(_)
        )
    }

    /// Set the rotation (degrees), normalized to `[0, 360)`.
    pub fn set_rotation(&mut self, degrees: f64) {
        if self.supports_transform() {
            self.rotation = normalize_degrees(degrees);
        }
    }
}

/// Normalize an angle in degrees to `[0, 360)`.
pub fn normalize_degrees(degrees: f64) -> f64 {
    let normalized = degrees.rem_euclid(360.0);
    // rem_euclid can return 360.0 for tiny negative inputs
    if normalized >= 360.0 { 0.0 } else { normalized }
}

/// Distance from a point to a line segment (a→b).
pub fn point_to_segment_dist(point: Point, a: Point, b: Point) -> f64 {
    let seg = b - a;
    let pv = point - a;
    let len_sq = seg.hypot2();
    if len_sq < f64::EPSILON {
        return pv.hypot();
    }
    let t = (pv.dot(seg) / len_sq).clamp(0.0, 1.0);
    let proj = a + seg * t;
    (point - proj).hypot()
}

/// Minimum distance from a point to a polyline (sequence of connected segments).
pub fn point_to_polyline_dist(point: Point, points: &[Point]) -> f64 {
    if points.len() == 1 {
        return (point - points[0]).hypot();
    }
    points
        .windows(2)
        .map(|w| point_to_segment_dist(point, w[0], w[1]))
        .fold(f64::INFINITY, f64::min)
}
