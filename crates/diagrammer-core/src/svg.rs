//! SVG serialization of a shape list.

use crate::geometry;
use crate::shapes::{ArrowMode, SerializableColor, Shape, ShapeKind, ShapeStyle, TextAlign};
use kurbo::{Point, Rect};
use std::collections::BTreeSet;

/// Options for [`render_svg`].
#[derive(Debug, Clone, PartialEq)]
pub struct SvgOptions {
    /// Margin around the content bounds, in diagram units.
    pub padding: f64,
    pub background: Option<SerializableColor>,
}

impl Default for SvgOptions {
    fn default() -> Self {
        Self {
            padding: 20.0,
            background: Some(SerializableColor::white()),
        }
    }
}

/// Render shapes (back to front) into a standalone SVG document whose viewBox
/// is the padded content bounds.
pub fn render_svg<'a>(shapes: impl IntoIterator<Item = &'a Shape>, options: &SvgOptions) -> String {
    let shapes: Vec<&Shape> = shapes.into_iter().collect();
    let content = geometry::union_bounds(shapes.iter().copied()).unwrap_or(Rect::ZERO);
    let view = content.inflate(options.padding, options.padding);
    let width = view.width().max(1.0);
    let height = view.height().max(1.0);

    let mut svg = String::new();
    svg.push_str(&format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{}\" height=\"{}\" viewBox=\"{} {} {} {}\">",
        num(width),
        num(height),
        num(view.x0),
        num(view.y0),
        num(width),
        num(height)
    ));
    if let Some(background) = options.background {
        svg.push_str(&format!(
            "<rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" {}/>",
            num(view.x0),
            num(view.y0),
            num(width),
            num(height),
            paint("fill", background)
        ));
    }

    let mut marker_colors = BTreeSet::new();
    for shape in &shapes {
        collect_marker_colors(shape, &mut marker_colors);
    }
    if !marker_colors.is_empty() {
        svg.push_str("<defs>");
        for hex in &marker_colors {
            svg.push_str(&format!(
                "<marker id=\"{}\" viewBox=\"0 0 10 10\" refX=\"10\" refY=\"5\" markerWidth=\"6\" markerHeight=\"6\" orient=\"auto-start-reverse\"><path d=\"M 0 0 L 10 5 L 0 10 z\" fill=\"{hex}\"/></marker>",
                marker_id(hex)
            ));
        }
        svg.push_str("</defs>");
    }

    for shape in shapes {
        write_shape(&mut svg, shape);
    }
    svg.push_str("</svg>");
    svg
}

pub fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

fn num(value: f64) -> String {
    let s = format!("{value:.2}");
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s == "-0" { "0".to_string() } else { s.to_string() }
}

fn paint(attr: &str, color: SerializableColor) -> String {
    let mut out = format!("{attr}=\"{}\"", color.to_hex());
    if color.a < 255 {
        out.push_str(&format!(" {attr}-opacity=\"{}\"", num(color.alpha())));
    }
    out
}

fn marker_id(hex: &str) -> String {
    format!("arrow-{}", hex.trim_start_matches('#'))
}

fn collect_marker_colors(shape: &Shape, colors: &mut BTreeSet<String>) {
    if let ShapeKind::Group(group) = &shape.kind {
        for child in &group.children {
            collect_marker_colors(child, colors);
        }
    } else if shape.style.arrow != ArrowMode::None && has_arrows(shape) {
        colors.insert(shape.style.stroke.to_hex());
    }
}

fn has_arrows(shape: &Shape) -> bool {
    matches!(
        shape.kind,
        ShapeKind::Line(_) | ShapeKind::Polyline(_) | ShapeKind::Connector(_)
    )
}

/// `transform` attribute reproducing flip, then scale, then rotation about
/// the frame centre. Empty for identity.
fn transform_attr(shape: &Shape) -> String {
    let rotated = shape.rotation.abs() > f64::EPSILON;
    let scaled = (shape.scale - 1.0).abs() > f64::EPSILON || shape.flip_x || shape.flip_y;
    if !shape.supports_transform() || shape.is_group() || (!rotated && !scaled) {
        return String::new();
    }
    let c = geometry::shape_center(shape);
    let mut parts = Vec::new();
    if rotated {
        parts.push(format!("rotate({} {} {})", num(shape.rotation), num(c.x), num(c.y)));
    }
    if scaled {
        let sx = if shape.flip_x { -shape.scale } else { shape.scale };
        let sy = if shape.flip_y { -shape.scale } else { shape.scale };
        parts.push(format!("translate({} {})", num(c.x), num(c.y)));
        parts.push(format!("scale({} {})", num(sx), num(sy)));
        parts.push(format!("translate({} {})", num(-c.x), num(-c.y)));
    }
    format!(" transform=\"{}\"", parts.join(" "))
}

fn style_attrs(style: &ShapeStyle, filled: bool) -> String {
    let mut out = match style.fill {
        Some(fill) if filled => paint("fill", fill),
        _ => "fill=\"none\"".to_string(),
    };
    out.push(' ');
    out.push_str(&paint("stroke", style.stroke));
    out.push_str(&format!(" stroke-width=\"{}\"", num(style.stroke_width)));
    if style.opacity < 1.0 {
        out.push_str(&format!(" opacity=\"{}\"", num(style.opacity)));
    }
    out
}

fn marker_attrs(style: &ShapeStyle) -> String {
    let id = marker_id(&style.stroke.to_hex());
    let mut out = String::new();
    if style.arrow.has_start() {
        out.push_str(&format!(" marker-start=\"url(#{id})\""));
    }
    if style.arrow.has_end() {
        out.push_str(&format!(" marker-end=\"url(#{id})\""));
    }
    out
}

fn points_attr(points: &[Point]) -> String {
    points
        .iter()
        .map(|p| format!("{},{}", num(p.x), num(p.y)))
        .collect::<Vec<_>>()
        .join(" ")
}

fn write_shape(svg: &mut String, shape: &Shape) {
    let r = shape.frame();
    let transform = transform_attr(shape);
    let style = &shape.style;
    match &shape.kind {
        ShapeKind::Rectangle => svg.push_str(&format!(
            "<rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" {}{transform}/>",
            num(r.x0),
            num(r.y0),
            num(r.width()),
            num(r.height()),
            style_attrs(style, true)
        )),
        ShapeKind::RoundedRect { corner_radius } => {
            let radius = corner_radius.min(r.width() / 2.0).min(r.height() / 2.0).max(0.0);
            svg.push_str(&format!(
                "<rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" rx=\"{}\" ry=\"{}\" {}{transform}/>",
                num(r.x0),
                num(r.y0),
                num(r.width()),
                num(r.height()),
                num(radius),
                num(radius),
                style_attrs(style, true)
            ))
        }
        ShapeKind::Circle => {
            let c = r.center();
            svg.push_str(&format!(
                "<ellipse cx=\"{}\" cy=\"{}\" rx=\"{}\" ry=\"{}\" {}{transform}/>",
                num(c.x),
                num(c.y),
                num(r.width() / 2.0),
                num(r.height() / 2.0),
                style_attrs(style, true)
            ))
        }
        ShapeKind::Triangle => {
            let points = [
                Point::new(r.center().x, r.y0),
                Point::new(r.x1, r.y1),
                Point::new(r.x0, r.y1),
            ];
            svg.push_str(&format!(
                "<polygon points=\"{}\" {}{transform}/>",
                points_attr(&points),
                style_attrs(style, true)
            ))
        }
        ShapeKind::Line(path) | ShapeKind::Polyline(path) => svg.push_str(&format!(
            "<polyline points=\"{}\" {}{}{transform}/>",
            points_attr(&path.points),
            style_attrs(style, false),
            marker_attrs(style)
        )),
        ShapeKind::Connector(connector) => svg.push_str(&format!(
            "<line x1=\"{}\" y1=\"{}\" x2=\"{}\" y2=\"{}\" {}{}/>",
            num(connector.start.x),
            num(connector.start.y),
            num(connector.end.x),
            num(connector.end.y),
            style_attrs(style, false),
            marker_attrs(style)
        )),
        ShapeKind::Text(text) => {
            let x = match text.align {
                TextAlign::Left => r.x0,
                TextAlign::Center => r.center().x,
                TextAlign::Right => r.x1,
            };
            let mut opacity = String::new();
            if style.opacity < 1.0 {
                opacity = format!(" opacity=\"{}\"", num(style.opacity));
            }
            svg.push_str(&format!(
                "<text x=\"{}\" y=\"{}\" text-anchor=\"{}\" font-family=\"{}\" font-size=\"{}\" font-weight=\"{}\" {}{opacity}{transform}>",
                num(x),
                num(r.y0),
                text.align.text_anchor(),
                escape_xml(&text.font_family),
                num(text.font_size),
                text.font_weight.css_value(),
                paint("fill", style.stroke)
            ));
            for (i, line) in text.lines().iter().enumerate() {
                // first baseline sits one font size below the top edge
                let dy = if i == 0 { text.font_size } else { text.line_height() };
                svg.push_str(&format!(
                    "<tspan x=\"{}\" dy=\"{}\">{}</tspan>",
                    num(x),
                    num(dy),
                    escape_xml(line)
                ));
            }
            svg.push_str("</text>");
        }
        ShapeKind::Icon { href } if !href.is_empty() => svg.push_str(&format!(
            "<image href=\"{}\" x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\"{transform}/>",
            escape_xml(href),
            num(r.x0),
            num(r.y0),
            num(r.width()),
            num(r.height())
        )),
        ShapeKind::Icon { .. } => svg.push_str(&format!(
            "<rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" {}{transform}/>",
            num(r.x0),
            num(r.y0),
            num(r.width()),
            num(r.height()),
            style_attrs(style, false)
        )),
        ShapeKind::Group(group) => {
            svg.push_str("<g>");
            for child in &group.children {
                write_shape(svg, child);
            }
            svg.push_str("</g>");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::{Connector, Endpoint, TextContent};

    #[test]
    fn test_escape_xml() {
        assert_eq!(escape_xml("a < b & \"c\""), "a &lt; b &amp; &quot;c&quot;");
    }

    #[test]
    fn test_view_box_is_padded_content() {
        let rect = Shape::rectangle(Point::new(100.0, 100.0), 50.0, 50.0);
        let svg = render_svg([&rect], &SvgOptions::default());
        assert!(svg.starts_with("<svg"));
        assert!(svg.contains("viewBox=\"80 80 90 90\""));
        assert!(svg.contains("<rect x=\"100\" y=\"100\" width=\"50\" height=\"50\""));
        assert!(svg.ends_with("</svg>"));
    }

    #[test]
    fn test_transform_matches_chain() {
        let mut rect = Shape::rectangle(Point::new(0.0, 0.0), 100.0, 50.0);
        rect.rotation = 90.0;
        rect.scale = 2.0;
        let svg = render_svg([&rect], &SvgOptions::default());
        assert!(svg.contains("transform=\"rotate(90 50 25) translate(50 25) scale(2 2) translate(-50 -25)\""));

        let plain = Shape::rectangle(Point::new(0.0, 0.0), 10.0, 10.0);
        assert!(!render_svg([&plain], &SvgOptions::default()).contains("transform"));
    }

    #[test]
    fn test_connector_arrow_markers() {
        let mut link = Shape::connector(Connector::new(
            Endpoint::free(Point::new(0.0, 0.0)),
            Endpoint::free(Point::new(100.0, 0.0)),
        ));
        link.style.arrow = ArrowMode::Both;
        let svg = render_svg([&link], &SvgOptions::default());
        assert!(svg.contains("<marker id=\"arrow-000000\""));
        assert!(svg.contains("marker-start=\"url(#arrow-000000)\""));
        assert!(svg.contains("marker-end=\"url(#arrow-000000)\""));
    }

    #[test]
    fn test_text_lines_are_escaped() {
        let text = Shape::text(Point::ZERO, TextContent::new("a<b\nsecond"));
        let svg = render_svg([&text], &SvgOptions::default());
        assert!(svg.contains(">a&lt;b</tspan>"));
        assert!(svg.contains(">second</tspan>"));
    }
}
