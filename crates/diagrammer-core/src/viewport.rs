//! Viewport: zoom, virtual page grid, pan offset and pointer mapping.

use crate::config::EditorConfig;
use kurbo::{Point, Rect, Size, Vec2};
use serde::{Deserialize, Serialize};

/// Result of resizing the page grid to fit content.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageGridChange {
    pub pages_x: f64,
    pub pages_y: f64,
    pub offset_x: f64,
    pub offset_y: f64,
    /// Host scroll correction (surface pixels) pending for the next frame.
    pub scroll_compensation: Vec2,
}

/// Page grid and view state of the drawing surface.
///
/// The view box spans `pages_x × pages_y` pages starting `offset_x/offset_y`
/// pages from the origin (offsets are ≤ 0 when content extends before it),
/// shifted by `pan`. Zoom only scales rendering; it never enters the
/// client-to-diagram mapping.
#[derive(Debug, Clone, PartialEq)]
pub struct Viewport {
    page_size: Size,
    pages_x: f64,
    pages_y: f64,
    offset_x: f64,
    offset_y: f64,
    pan: Vec2,
    zoom: f64,
    min_zoom: f64,
    max_zoom: f64,
    page_step: f64,
    content_padding: f64,
    /// On-screen rectangle of the host surface (client coordinates).
    surface: Rect,
    /// Page offset at the last scroll-compensation flush.
    flushed_offset: (f64, f64),
    pending_scroll: Option<Vec2>,
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(&EditorConfig::default())
    }
}

impl Viewport {
    pub fn new(config: &EditorConfig) -> Self {
        Self {
            page_size: Size::new(config.page_width, config.page_height),
            pages_x: 1.0,
            pages_y: 1.0,
            offset_x: 0.0,
            offset_y: 0.0,
            pan: Vec2::ZERO,
            zoom: 1.0,
            min_zoom: config.min_zoom,
            max_zoom: config.max_zoom,
            page_step: if config.page_step > 0.0 { config.page_step } else { 0.5 },
            content_padding: config.content_padding.max(0.0),
            surface: Rect::ZERO,
            flushed_offset: (0.0, 0.0),
            pending_scroll: None,
        }
    }

    pub fn page_size(&self) -> Size {
        self.page_size
    }

    pub fn pages(&self) -> (f64, f64) {
        (self.pages_x, self.pages_y)
    }

    pub fn page_offset(&self) -> (f64, f64) {
        (self.offset_x, self.offset_y)
    }

    pub fn pan(&self) -> Vec2 {
        self.pan
    }

    /// Diagram-space rectangle currently mapped onto the surface.
    pub fn view_box(&self) -> Rect {
        let min = Point::new(
            self.offset_x * self.page_size.width + self.pan.x,
            self.offset_y * self.page_size.height + self.pan.y,
        );
        Rect::from_origin_size(
            min,
            Size::new(
                self.pages_x * self.page_size.width,
                self.pages_y * self.page_size.height,
            ),
        )
    }

    /// Rendered size of the surface in host pixels.
    pub fn surface_size(&self) -> Size {
        let vb = self.view_box();
        Size::new(vb.width() * self.zoom, vb.height() * self.zoom)
    }

    /// Record where the host surface currently sits on screen.
    pub fn set_surface_rect(&mut self, rect: Rect) {
        self.surface = rect;
    }

    pub fn surface_rect(&self) -> Rect {
        self.surface
    }

    /// Map a client (pointer-device) coordinate into diagram space.
    ///
    /// Returns the origin when the surface has not been measured yet or the
    /// input is not finite.
    pub fn pointer_position(&self, client: Point) -> Point {
        let rect = self.surface;
        if !client.is_finite() || rect.width() <= 0.0 || rect.height() <= 0.0 {
            return Point::ZERO;
        }
        let vb = self.view_box();
        let sx = vb.width() / rect.width();
        let sy = vb.height() / rect.height();
        Point::new(
            vb.x0 + (client.x - rect.x0) * sx,
            vb.y0 + (client.y - rect.y0) * sy,
        )
    }

    /// Diagram units per client pixel, `None` when the surface is unmeasured.
    pub fn client_scale(&self) -> Option<Vec2> {
        let rect = self.surface;
        if rect.width() <= 0.0 || rect.height() <= 0.0 {
            return None;
        }
        let vb = self.view_box();
        Some(Vec2::new(vb.width() / rect.width(), vb.height() / rect.height()))
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    /// Set the zoom, clamped to the configured range. Non-finite values are ignored.
    pub fn set_zoom(&mut self, zoom: f64) -> f64 {
        if zoom.is_finite() {
            self.zoom = zoom.clamp(self.min_zoom, self.max_zoom);
        }
        self.zoom
    }

    pub fn zoom_by(&mut self, factor: f64) -> f64 {
        self.set_zoom(self.zoom * factor)
    }

    /// Pan by a drag delta in client pixels (content follows the pointer).
    pub fn pan_by_client(&mut self, delta: Vec2) {
        if let Some(scale) = self.client_scale() {
            self.pan -= Vec2::new(delta.x * scale.x, delta.y * scale.y);
        }
    }

    /// Pan by a delta in diagram units.
    pub fn pan_by(&mut self, delta: Vec2) {
        self.pan += delta;
    }

    pub fn reset_pan(&mut self) {
        self.pan = Vec2::ZERO;
    }

    /// Grow or shrink the page grid so `content` plus padding fits, in
    /// `page_step` increments. Always keeps at least one page at the origin.
    /// Returns `None` when the grid did not change.
    pub fn fit_pages_to_content(&mut self, content: Option<Rect>) -> Option<PageGridChange> {
        let (w, h) = (self.page_size.width, self.page_size.height);
        let (offset_x, pages_x, offset_y, pages_y) = match content {
            Some(c) if w > 0.0 && h > 0.0 => {
                let (ox, ex) = self.span(c.x0, c.x1, w);
                let (oy, ey) = self.span(c.y0, c.y1, h);
                (ox, ex - ox, oy, ey - oy)
            }
            _ => (0.0, 1.0, 0.0, 1.0),
        };

        let unchanged = offset_x == self.offset_x
            && offset_y == self.offset_y
            && pages_x == self.pages_x
            && pages_y == self.pages_y;
        if unchanged {
            return None;
        }
        log::debug!(
            "Page grid {}x{} at ({}, {}) -> {}x{} at ({}, {})",
            self.pages_x, self.pages_y, self.offset_x, self.offset_y,
            pages_x, pages_y, offset_x, offset_y
        );
        self.offset_x = offset_x;
        self.offset_y = offset_y;
        self.pages_x = pages_x;
        self.pages_y = pages_y;

        // Total offset change since the last flush; replaces any pending value.
        let compensation = Vec2::new(
            (self.flushed_offset.0 - offset_x) * w * self.zoom,
            (self.flushed_offset.1 - offset_y) * h * self.zoom,
        );
        self.pending_scroll = (compensation != Vec2::ZERO).then_some(compensation);

        Some(PageGridChange {
            pages_x,
            pages_y,
            offset_x,
            offset_y,
            scroll_compensation: compensation,
        })
    }

    /// Snap a padded content span (diagram units) to page steps. The grid only
    /// extends before the origin when content does: start ≤ 0, end ≥ 1 page.
    fn span(&self, min: f64, max: f64, page: f64) -> (f64, f64) {
        let step = self.page_step;
        let pad = self.content_padding * page;
        let start = if min < 0.0 {
            (((min - pad) / page) / step).floor() * step
        } else {
            0.0
        };
        let end = (((max + pad) / page) / step).ceil() * step;
        (start.min(0.0), end.max(1.0))
    }

    /// Scroll correction the host should apply on its next frame, if any.
    pub fn pending_scroll_compensation(&self) -> Option<Vec2> {
        self.pending_scroll
    }

    /// Take the pending scroll correction, marking the current grid as flushed.
    pub fn take_scroll_compensation(&mut self) -> Option<Vec2> {
        self.flushed_offset = (self.offset_x, self.offset_y);
        self.pending_scroll.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn measured() -> Viewport {
        let mut viewport = Viewport::default();
        viewport.set_surface_rect(Rect::new(10.0, 20.0, 10.0 + 397.0, 20.0 + 561.5));
        viewport
    }

    #[test]
    fn test_default_view_box() {
        let viewport = Viewport::default();
        assert_eq!(viewport.view_box(), Rect::new(0.0, 0.0, 794.0, 1123.0));
    }

    #[test]
    fn test_pointer_position_scales_client_coordinates() {
        let viewport = measured();
        let p = viewport.pointer_position(Point::new(10.0 + 100.0, 20.0 + 50.0));
        assert!((p.x - 200.0).abs() < 1e-9);
        assert!((p.y - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_pointer_position_ignores_zoom() {
        let mut viewport = measured();
        viewport.pan_by(Vec2::new(-30.0, 15.0));
        viewport.set_zoom(2.0);
        let p = viewport.pointer_position(Point::new(10.0, 20.0));
        let vb = viewport.view_box();
        assert_eq!(p, Point::new(vb.x0, vb.y0));
    }

    #[test]
    fn test_pointer_position_degenerate_inputs() {
        let viewport = Viewport::default();
        assert_eq!(viewport.pointer_position(Point::new(5.0, 5.0)), Point::ZERO);
        let viewport = measured();
        assert_eq!(viewport.pointer_position(Point::new(f64::NAN, 5.0)), Point::ZERO);
    }

    #[test]
    fn test_zoom_clamp() {
        let mut viewport = Viewport::default();
        assert!((viewport.set_zoom(0.001) - 0.1).abs() < f64::EPSILON);
        assert!((viewport.zoom_by(1000.0) - 5.0).abs() < f64::EPSILON);
        assert!((viewport.set_zoom(f64::NAN) - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_pan_by_client_follows_pointer() {
        let mut viewport = measured();
        viewport.pan_by_client(Vec2::new(10.0, 0.0));
        // 2 diagram units per client pixel
        assert!((viewport.pan().x + 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_fit_grows_in_half_pages() {
        let mut viewport = Viewport::default();
        assert!(viewport.fit_pages_to_content(Some(Rect::new(10.0, 10.0, 100.0, 100.0))).is_none());

        let change = viewport
            .fit_pages_to_content(Some(Rect::new(10.0, 10.0, 900.0, 100.0)))
            .unwrap();
        // 900 + 79.4 padding = 979.4 → 1.5 pages
        assert!((change.pages_x - 1.5).abs() < f64::EPSILON);
        assert!((change.pages_y - 1.0).abs() < f64::EPSILON);
        assert_eq!(change.scroll_compensation, Vec2::ZERO);

        let change = viewport.fit_pages_to_content(None).unwrap();
        assert!((change.pages_x - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_negative_content_prepends_pages_with_compensation() {
        let mut viewport = Viewport::default();
        viewport.set_zoom(2.0);
        let change = viewport
            .fit_pages_to_content(Some(Rect::new(-100.0, 10.0, 100.0, 100.0)))
            .unwrap();
        assert!((change.offset_x + 0.5).abs() < f64::EPSILON);
        assert!((change.pages_x - 1.5).abs() < f64::EPSILON);
        assert!(viewport.view_box().x0 < -100.0);
        assert_eq!(change.scroll_compensation, Vec2::new(794.0, 0.0));
        assert_eq!(viewport.pending_scroll_compensation(), Some(Vec2::new(794.0, 0.0)));
    }

    #[test]
    fn test_second_change_supersedes_pending_compensation() {
        let mut viewport = Viewport::default();
        viewport.fit_pages_to_content(Some(Rect::new(-100.0, 0.0, 100.0, 100.0)));
        viewport.fit_pages_to_content(Some(Rect::new(-500.0, 0.0, 100.0, 100.0)));
        // total since last flush: one full page, not 0.5 + 1.0
        assert_eq!(viewport.take_scroll_compensation(), Some(Vec2::new(794.0, 0.0)));
        assert_eq!(viewport.take_scroll_compensation(), None);

        viewport.fit_pages_to_content(Some(Rect::new(-100.0, 0.0, 100.0, 100.0)));
        assert_eq!(viewport.take_scroll_compensation(), Some(Vec2::new(-397.0, 0.0)));
    }
}
