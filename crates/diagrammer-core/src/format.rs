//! JSON document format.

use crate::error::{EditorError, EditorResult};
use crate::shapes::{Endpoint, Shape, ShapeId, ShapeKind, ShapeStyle};
use kurbo::Point;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Current document format version.
pub const FORMAT_VERSION: u32 = 1;

/// A serialized diagram: ordered shape list (back to front) plus the style
/// applied to newly created shapes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagramDocument {
    pub version: u32,
    pub shapes: Vec<Shape>,
    #[serde(default)]
    pub style_defaults: ShapeStyle,
}

impl DiagramDocument {
    pub fn new(shapes: Vec<Shape>, style_defaults: ShapeStyle) -> Self {
        Self {
            version: FORMAT_VERSION,
            shapes,
            style_defaults,
        }
    }

    pub fn to_json(&self) -> EditorResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| EditorError::Export(e.to_string()))
    }

    /// Parse and validate. Never returns a partially valid document.
    pub fn from_json(json: &str) -> EditorResult<Self> {
        let document: Self = serde_json::from_str(json)?;
        document.validate()?;
        Ok(document)
    }

    /// Check the structural rules the editor relies on.
    pub fn validate(&self) -> EditorResult<()> {
        if self.version != FORMAT_VERSION {
            return Err(malformed(format!("unsupported version {}", self.version)));
        }
        let mut ids = HashSet::new();
        for shape in &self.shapes {
            for id in shape.all_ids() {
                if !ids.insert(id) {
                    return Err(malformed(format!("duplicate shape id {id}")));
                }
            }
        }
        check_style(&self.style_defaults, "styleDefaults")?;
        // connectors bind to shapes, never to other connectors
        let mut connectors = HashSet::new();
        collect_connectors(&self.shapes, &mut connectors);
        let targets: HashSet<ShapeId> = ids.difference(&connectors).copied().collect();
        for shape in &self.shapes {
            check_shape(shape, &targets)?;
        }
        Ok(())
    }
}

fn malformed(message: String) -> EditorError {
    EditorError::MalformedDocument(message)
}

fn check_finite(value: f64, what: &str, id: ShapeId) -> EditorResult<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(malformed(format!("{what} of shape {id} is not finite")))
    }
}

fn check_point(point: Point, what: &str, id: ShapeId) -> EditorResult<()> {
    check_finite(point.x, what, id)?;
    check_finite(point.y, what, id)
}

fn check_style(style: &ShapeStyle, owner: &str) -> EditorResult<()> {
    if !style.stroke_width.is_finite() || style.stroke_width < 0.0 {
        return Err(malformed(format!("invalid stroke width in {owner}")));
    }
    if !style.opacity.is_finite() {
        return Err(malformed(format!("invalid opacity in {owner}")));
    }
    Ok(())
}

fn collect_connectors(shapes: &[Shape], out: &mut HashSet<ShapeId>) {
    for shape in shapes {
        match &shape.kind {
            ShapeKind::Connector(_) => {
                out.insert(shape.id());
            }
            ShapeKind::Group(group) => collect_connectors(&group.children, out),
            _ => {}
        }
    }
}

/// `targets` holds every id a connector endpoint may attach to.
fn check_shape(shape: &Shape, targets: &HashSet<ShapeId>) -> EditorResult<()> {
    let id = shape.id();
    check_point(shape.position, "position", id)?;
    check_finite(shape.width, "width", id)?;
    check_finite(shape.height, "height", id)?;
    check_finite(shape.rotation, "rotation", id)?;
    check_finite(shape.scale, "scale", id)?;
    if shape.width < 0.0 || shape.height < 0.0 {
        return Err(malformed(format!("shape {id} has a negative size")));
    }
    if shape.scale <= 0.0 {
        return Err(malformed(format!("shape {id} has a non-positive scale")));
    }
    check_style(&shape.style, &format!("shape {id}"))?;

    match &shape.kind {
        ShapeKind::Line(path) | ShapeKind::Polyline(path) => {
            if path.points.len() < 2 {
                return Err(malformed(format!("path {id} has fewer than 2 points")));
            }
            for point in &path.points {
                check_point(*point, "point", id)?;
            }
        }
        ShapeKind::Connector(connector) => {
            check_point(connector.start, "start", id)?;
            check_point(connector.end, "end", id)?;
            for endpoint in [&connector.from, &connector.to] {
                match endpoint {
                    Endpoint::Attached { shape_id, .. } => {
                        if !targets.contains(shape_id) {
                            return Err(malformed(format!(
                                "connector {id} cannot attach to {shape_id}"
                            )));
                        }
                    }
                    Endpoint::Free { point } => check_point(*point, "endpoint", id)?,
                }
            }
        }
        ShapeKind::Text(text) => {
            if !text.font_size.is_finite() || text.font_size <= 0.0 {
                return Err(malformed(format!("text {id} has an invalid font size")));
            }
        }
        ShapeKind::RoundedRect { corner_radius } => {
            if !corner_radius.is_finite() || *corner_radius < 0.0 {
                return Err(malformed(format!("shape {id} has an invalid corner radius")));
            }
        }
        ShapeKind::Group(group) => {
            if group.children.is_empty() {
                return Err(malformed(format!("group {id} is empty")));
            }
            for child in &group.children {
                check_shape(child, targets)?;
            }
        }
        ShapeKind::Rectangle | ShapeKind::Circle | ShapeKind::Triangle | ShapeKind::Icon { .. } => {}
    }
    Ok(())
}
