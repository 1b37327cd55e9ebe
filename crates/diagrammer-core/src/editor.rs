//! The editor facade: owns every engine component and exposes the command
//! surface used by host adapters.
//!
//! Commands mutate the document synchronously, commit at most one history
//! snapshot each, and notify subscribers before returning.

use crate::canvas::{CanvasDocument, ShapePatch, ZOrder};
use crate::clipboard::{self, ClipboardManager};
use crate::config::EditorConfig;
use crate::connection::ConnectionManager;
use crate::error::{EditorError, EditorResult};
use crate::events::{EditorEvent, EventBus, SubscriptionId};
use crate::export::{ExportFormat, ExportedImage, Rasterizer};
use crate::format::DiagramDocument;
use crate::geometry;
use crate::history::{HistorySnapshot, HistoryStack};
use crate::interaction::{InteractionMode, InteractionState};
use crate::selection::Selection;
use crate::shapes::{
    ArrowMode, Connector, Endpoint, PortId, SerializableColor, Shape, ShapeId, ShapeKind,
    ShapeStyle, ShapeType,
};
use crate::svg::{self, SvgOptions};
use crate::viewport::Viewport;
use kurbo::{Point, Rect, Size, Vec2};

/// Placement options for [`Editor::add_icon`].
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct IconOptions {
    /// Top-left corner; defaults to centring the icon in the view.
    pub position: Option<Point>,
    pub size: Option<Size>,
}

/// Where the host surface sits and what it shows.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Surface {
    pub client_rect: Rect,
    pub view_box: Rect,
    pub zoom: f64,
}

/// Framework-agnostic diagram editor.
pub struct Editor {
    pub(crate) config: EditorConfig,
    pub(crate) document: CanvasDocument,
    pub(crate) selection: Selection,
    pub(crate) history: HistoryStack,
    pub(crate) connections: ConnectionManager,
    pub(crate) viewport: Viewport,
    pub(crate) clipboard: ClipboardManager,
    pub(crate) interaction: InteractionState,
    style_defaults: ShapeStyle,
    events: EventBus,
    rasterizer: Option<Box<dyn Rasterizer>>,
    ready: bool,
}

impl std::fmt::Debug for Editor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Editor")
            .field("shapes", &self.document.len())
            .field("selection", &self.selection)
            .field("history_index", &self.history.index())
            .field("mode", &self.interaction.mode)
            .finish()
    }
}

impl Default for Editor {
    fn default() -> Self {
        Self::new(EditorConfig::default())
    }
}

impl Editor {
    pub fn new(config: EditorConfig) -> Self {
        Self {
            document: CanvasDocument::new(),
            selection: Selection::new(),
            history: HistoryStack::new(config.history_limit),
            connections: ConnectionManager::new(&config),
            viewport: Viewport::new(&config),
            clipboard: ClipboardManager::new(),
            interaction: InteractionState::default(),
            style_defaults: ShapeStyle::default(),
            events: EventBus::new(),
            rasterizer: None,
            ready: false,
            config,
        }
    }

    // --- accessors ---

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn document(&self) -> &CanvasDocument {
        &self.document
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn history(&self) -> &HistoryStack {
        &self.history
    }

    pub fn connections(&self) -> &ConnectionManager {
        &self.connections
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn viewport_mut(&mut self) -> &mut Viewport {
        &mut self.viewport
    }

    pub fn mode(&self) -> &InteractionMode {
        &self.interaction.mode
    }

    pub fn style_defaults(&self) -> &ShapeStyle {
        &self.style_defaults
    }

    pub fn set_style_defaults(&mut self, style: ShapeStyle) {
        self.style_defaults = style;
    }

    pub fn set_rasterizer(&mut self, rasterizer: Box<dyn Rasterizer>) {
        self.rasterizer = Some(rasterizer);
    }

    // --- events ---

    pub fn subscribe(&mut self, listener: impl FnMut(&EditorEvent) + 'static) -> SubscriptionId {
        self.events.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.events.unsubscribe(id)
    }

    pub(crate) fn emit(&mut self, event: EditorEvent) {
        self.events.emit(&event);
    }

    pub(crate) fn report_error(&mut self, error: &EditorError) {
        log::warn!("{error}");
        self.emit(EditorEvent::Error(error.to_string()));
    }

    // --- surface ---

    /// Record the host surface's on-screen rectangle. The first call with a
    /// measured surface emits `Ready`.
    pub fn attach_surface(&mut self, client_rect: Rect) {
        self.viewport.set_surface_rect(client_rect);
        if !self.ready && client_rect.width() > 0.0 && client_rect.height() > 0.0 {
            self.ready = true;
            log::info!("Editor ready");
            self.emit(EditorEvent::Ready);
        }
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    pub fn surface(&self) -> Surface {
        Surface {
            client_rect: self.viewport.surface_rect(),
            view_box: self.viewport.view_box(),
            zoom: self.viewport.zoom(),
        }
    }

    /// Client coordinate to diagram coordinate.
    pub fn pointer_position(&self, client: Point) -> Point {
        self.viewport.pointer_position(client)
    }

    // --- checkpoints ---

    pub(crate) fn snapshot(&self) -> HistorySnapshot {
        HistorySnapshot {
            shapes: self.document.snapshot(),
            selected_ids: self.selection.ids().to_vec(),
        }
    }

    /// Close a semantically complete change: prune the selection, refresh
    /// markers, save one snapshot and notify.
    pub(crate) fn commit(&mut self) {
        if self.checkpoint() {
            self.notify_selection();
        }
    }

    /// Commit a command that also changed the selection. `ShapeSelected` is
    /// emitted once.
    pub(crate) fn commit_selection(&mut self) {
        self.checkpoint();
        self.notify_selection();
    }

    /// Returns whether ids of removed shapes were pruned from the selection.
    fn checkpoint(&mut self) -> bool {
        let pruned = self.selection.retain_existing(&self.document);
        self.connections.refresh(&self.document);
        self.history.save(self.snapshot());
        self.emit(EditorEvent::CanvasChanged);
        self.sync_bounds();
        pruned
    }

    pub(crate) fn sync_bounds(&mut self) {
        let bounds = self.document.bounds();
        self.viewport.fit_pages_to_content(bounds);
        self.emit(EditorEvent::BoundsChanged(bounds));
    }

    /// Emit `ShapeSelected` and keep connector endpoint handles in step with
    /// the selection.
    pub(crate) fn notify_selection(&mut self) {
        self.connections.hide_all_connector_handles();
        let single = self
            .selection
            .single()
            .and_then(|id| self.document.get_shape(id))
            .cloned();
        if let Some(shape) = single.as_ref().filter(|s| s.is_connector()) {
            self.connections.show_connector_handles(&self.document, shape.id());
        }
        self.emit(EditorEvent::ShapeSelected(single));
    }

    fn restore_snapshot(&mut self, snapshot: HistorySnapshot) {
        self.cancel_interaction();
        self.document.restore(snapshot.shapes);
        self.selection.select_multiple(snapshot.selected_ids);
        self.selection.retain_existing(&self.document);
        self.connections.refresh(&self.document);
        self.emit(EditorEvent::CanvasChanged);
        self.sync_bounds();
        self.notify_selection();
    }

    fn view_center(&self) -> Point {
        let surface = self.viewport.surface_rect();
        if surface.width() > 0.0 && surface.height() > 0.0 {
            self.viewport.pointer_position(surface.center())
        } else {
            self.viewport.view_box().center()
        }
    }

    // --- adding shapes ---

    /// Add a shape on top of the z-order, select it and commit.
    pub fn add_shape(&mut self, shape: Shape) -> ShapeId {
        let id = self.document.add_shape(shape);
        self.document.refresh_connectors(self.config.dangling_connectors);
        log::debug!("Added shape {id}");
        self.selection.select_single(id);
        self.commit_selection();
        id
    }

    /// Add a default shape of `shape_type` centred in the current view.
    pub fn add_shape_of_type(&mut self, shape_type: ShapeType) -> EditorResult<ShapeId> {
        let size = shape_type.default_size();
        let center = self.view_center();
        self.add_shape_at(
            shape_type,
            center - Vec2::new(size.width / 2.0, size.height / 2.0),
        )
    }

    /// Add a default shape of `shape_type` with its frame's top-left at `position`.
    pub fn add_shape_at(&mut self, shape_type: ShapeType, position: Point) -> EditorResult<ShapeId> {
        if !position.is_finite() {
            return Err(EditorError::DegenerateGeometry("non-finite position".into()));
        }
        let shape = shape_type
            .default_shape(position, &self.style_defaults)
            .ok_or(EditorError::UnsupportedShapeType(shape_type))?;
        Ok(self.add_shape(shape))
    }

    pub fn add_icon(&mut self, href: impl Into<String>, options: IconOptions) -> ShapeId {
        let size = options
            .size
            .filter(|s| s.width > 0.0 && s.height > 0.0)
            .unwrap_or_else(|| ShapeType::Icon.default_size());
        let position = options
            .position
            .unwrap_or_else(|| self.view_center() - Vec2::new(size.width / 2.0, size.height / 2.0));
        let mut icon = Shape::icon(position, size.width, size.height, href.into());
        icon.style = self.style_defaults.clone();
        icon.style.fill = None;
        self.add_shape(icon)
    }

    /// Create a connector between two shapes. Missing shapes or ports are
    /// reported, never silently ignored.
    pub fn connect_shapes(
        &mut self,
        from: ShapeId,
        to: ShapeId,
        from_port: Option<PortId>,
        to_port: Option<PortId>,
    ) -> EditorResult<ShapeId> {
        let result = self.validate_connection(from, to, &from_port, &to_port);
        if let Err(error) = result {
            self.report_error(&error);
            return Err(error);
        }
        self.connections.cancel_connection();
        if matches!(self.interaction.mode, InteractionMode::DrawingConnector { .. }) {
            self.interaction.reset();
        }
        Ok(self.add_connector(
            Endpoint::attached(from, from_port),
            Endpoint::attached(to, to_port),
        ))
    }

    fn validate_connection(
        &self,
        from: ShapeId,
        to: ShapeId,
        from_port: &Option<PortId>,
        to_port: &Option<PortId>,
    ) -> EditorResult<()> {
        for (id, port) in [(from, from_port), (to, to_port)] {
            let shape = self
                .document
                .find_shape(id)
                .ok_or(EditorError::InvalidReference(id))?;
            if shape.is_connector() {
                return Err(EditorError::InvalidReference(id));
            }
            if let Some(port) = port {
                if geometry::port_position_by_id(shape, port).is_none() {
                    return Err(EditorError::UnknownPort {
                        shape_id: id,
                        port: port.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    pub(crate) fn add_connector(&mut self, from: Endpoint, to: Endpoint) -> ShapeId {
        let mut shape = Shape::connector(Connector::new(from, to));
        shape.style = ShapeStyle {
            stroke: self.style_defaults.stroke,
            stroke_width: self.style_defaults.stroke_width,
            ..ShapeStyle::connector()
        };
        self.add_shape(shape)
    }

    // --- selection ---

    /// Select one shape. Stale IDs are ignored.
    pub fn select_shape(&mut self, id: ShapeId) -> bool {
        if self.document.get_shape(id).is_none() {
            return false;
        }
        self.selection.select_single(id);
        self.notify_selection();
        true
    }

    pub fn select_shapes(&mut self, ids: &[ShapeId]) {
        self.selection.select_multiple(
            ids.iter()
                .copied()
                .filter(|&id| self.document.get_shape(id).is_some()),
        );
        self.notify_selection();
    }

    pub fn select_all(&mut self) {
        self.selection.select_all(self.document.z_order().to_vec());
        self.notify_selection();
    }

    pub fn clear_selection(&mut self) {
        if self.selection.is_empty() {
            return;
        }
        self.selection.clear();
        self.notify_selection();
    }

    /// The shape with `id`, or the first selected shape.
    pub fn get_selected_shape(&self, id: Option<ShapeId>) -> Option<&Shape> {
        match id {
            Some(id) => self.document.find_shape(id),
            None => self
                .selection
                .ids()
                .first()
                .and_then(|&id| self.document.get_shape(id)),
        }
    }

    pub fn get_selection_count(&self) -> usize {
        self.selection.len()
    }

    // --- structure ---

    /// Group the selection. Needs at least two selected shapes.
    pub fn combine_selected(&mut self) -> Option<ShapeId> {
        let group_id = self.document.group_shapes(self.selection.ids())?;
        log::debug!("Grouped {} shapes into {group_id}", self.selection.len());
        self.selection.select_single(group_id);
        self.commit_selection();
        Some(group_id)
    }

    /// Dissolve every selected group, selecting the released children.
    pub fn ungroup_selected(&mut self) -> Vec<ShapeId> {
        let groups: Vec<ShapeId> = self
            .selection
            .ids()
            .iter()
            .copied()
            .filter(|&id| self.document.get_shape(id).is_some_and(Shape::is_group))
            .collect();
        let mut released = Vec::new();
        for group_id in groups {
            if let Some(children) = self
                .document
                .ungroup_shape(group_id, self.config.dangling_connectors)
            {
                released.extend(children);
            }
        }
        if released.is_empty() {
            return released;
        }
        self.selection.select_multiple(released.iter().copied());
        self.commit_selection();
        released
    }

    /// Delete the selection. Returns the number of shapes removed.
    pub fn delete_selected(&mut self) -> usize {
        let ids = self.selection.ids().to_vec();
        let mut removed = 0;
        for id in ids {
            if let Some(removal) = self.document.remove_shape(id, self.config.dangling_connectors) {
                removed += 1 + removal.removed_connectors.len();
            }
        }
        self.selection.clear();
        if removed > 0 {
            log::debug!("Deleted {removed} shape(s)");
            self.commit_selection();
        } else {
            self.notify_selection();
        }
        removed
    }

    pub fn clear_canvas(&mut self) {
        if self.document.is_empty() {
            return;
        }
        self.cancel_interaction();
        self.document.clear();
        self.selection.clear();
        self.connections.clear();
        log::info!("Canvas cleared");
        self.commit_selection();
    }

    /// Clone the selection offset by `duplicate_offset` and select the copies.
    pub fn duplicate_selected(&mut self) -> Vec<ShapeId> {
        let originals: Vec<Shape> = self
            .document
            .shapes_ordered()
            .filter(|s| self.selection.contains(s.id()))
            .cloned()
            .collect();
        if originals.is_empty() {
            return Vec::new();
        }
        let offset = self.config.duplicate_offset;
        let copies = clipboard::clone_with_new_ids(&originals, Vec2::new(offset, offset));
        let ids = self.insert_shapes(copies);
        self.commit_selection();
        ids
    }

    /// Add shapes, refresh connectors and select them. Does not commit.
    fn insert_shapes(&mut self, shapes: Vec<Shape>) -> Vec<ShapeId> {
        let ids: Vec<ShapeId> = shapes
            .into_iter()
            .map(|shape| self.document.add_shape(shape))
            .collect();
        self.document.refresh_connectors(self.config.dangling_connectors);
        self.selection.select_multiple(ids.iter().copied());
        ids
    }

    /// Merge a partial update into one shape and commit.
    pub fn update_shape(&mut self, id: ShapeId, patch: &ShapePatch) -> EditorResult<()> {
        self.document
            .update_shape(id, patch, self.config.dangling_connectors)?;
        if self.checkpoint() || self.selection.contains(id) {
            self.notify_selection();
        }
        Ok(())
    }

    // --- z-order ---

    pub fn bring_to_front(&mut self) -> bool {
        self.reorder_selected(ZOrder::Front)
    }

    pub fn send_to_back(&mut self) -> bool {
        self.reorder_selected(ZOrder::Back)
    }

    pub fn move_forward(&mut self) -> bool {
        self.reorder_selected(ZOrder::Forward)
    }

    pub fn move_backward(&mut self) -> bool {
        self.reorder_selected(ZOrder::Backward)
    }

    /// Reorder every selected shape, keeping their relative order.
    pub fn reorder_selected(&mut self, direction: ZOrder) -> bool {
        let mut ids: Vec<ShapeId> = self
            .document
            .z_order()
            .iter()
            .copied()
            .filter(|&id| self.selection.contains(id))
            .collect();
        if matches!(direction, ZOrder::Back | ZOrder::Forward) {
            ids.reverse();
        }
        let mut changed = false;
        for id in ids {
            changed |= self.document.reorder(id, direction);
        }
        if changed {
            self.commit();
        }
        changed
    }

    // --- transforms ---

    fn transform_selected(&mut self, mut apply: impl FnMut(&mut Shape, Point)) -> bool {
        let ids = self.selection.ids().to_vec();
        let mut changed = false;
        for id in ids {
            if let Some(shape) = self.document.get_shape_mut(id) {
                if !shape.supports_transform() {
                    continue;
                }
                let center = geometry::shape_center(shape);
                let before = shape.clone();
                apply(shape, center);
                changed |= *shape != before;
            }
        }
        if changed {
            self.document.refresh_connectors(self.config.dangling_connectors);
            self.commit_selection();
        }
        changed
    }

    /// Set the absolute rotation (degrees) of each selected shape.
    pub fn rotate_selected(&mut self, degrees: f64) -> bool {
        if !degrees.is_finite() {
            return false;
        }
        self.transform_selected(|shape, center| {
            let delta = degrees - shape.rotation;
            geometry::rotate_shape_about(shape, center, delta);
        })
    }

    /// Rotate each selected shape about its own centre.
    pub fn rotate_selected_by(&mut self, delta: f64) -> bool {
        if !delta.is_finite() || delta == 0.0 {
            return false;
        }
        self.transform_selected(|shape, center| geometry::rotate_shape_about(shape, center, delta))
    }

    pub fn flip_horizontal(&mut self) -> bool {
        self.transform_selected(|shape, center| geometry::flip_shape_about(shape, center, true))
    }

    pub fn flip_vertical(&mut self) -> bool {
        self.transform_selected(|shape, center| geometry::flip_shape_about(shape, center, false))
    }

    /// Multiply each selected shape's scale by `factor`.
    pub fn scale_selected(&mut self, factor: f64) -> EditorResult<bool> {
        if !factor.is_finite() || factor <= 0.0 {
            return Err(EditorError::DegenerateGeometry(format!(
                "invalid scale factor {factor}"
            )));
        }
        Ok(self.transform_selected(|shape, center| geometry::scale_shape_about(shape, center, factor)))
    }

    // --- style ---

    /// Apply a style edit to the selection (recursing into groups), or to the
    /// defaults for new shapes when nothing is selected.
    fn apply_style(&mut self, edit: impl Fn(&mut ShapeStyle)) -> bool {
        if self.selection.is_empty() {
            edit(&mut self.style_defaults);
            return false;
        }
        let ids = self.selection.ids().to_vec();
        let mut changed = false;
        for id in ids {
            if let Some(shape) = self.document.get_shape_mut(id) {
                let before = shape.clone();
                style_recursive(shape, &edit);
                changed |= *shape != before;
            }
        }
        if changed {
            self.commit_selection();
        }
        changed
    }

    pub fn set_fill(&mut self, fill: Option<SerializableColor>) -> bool {
        self.apply_style(|style| style.fill = fill)
    }

    pub fn set_stroke(&mut self, stroke: SerializableColor) -> bool {
        self.apply_style(|style| style.stroke = stroke)
    }

    pub fn set_stroke_width(&mut self, width: f64) -> EditorResult<bool> {
        if !width.is_finite() || width < 0.0 {
            return Err(EditorError::DegenerateGeometry(format!(
                "invalid stroke width {width}"
            )));
        }
        Ok(self.apply_style(|style| style.stroke_width = width))
    }

    pub fn set_arrow_mode(&mut self, arrow: ArrowMode) -> bool {
        self.apply_style(|style| style.arrow = arrow)
    }

    /// Opacity is clamped to `[0, 1]`; non-finite values are ignored.
    pub fn set_opacity(&mut self, opacity: f64) -> bool {
        if !opacity.is_finite() {
            return false;
        }
        let opacity = opacity.clamp(0.0, 1.0);
        self.apply_style(|style| style.opacity = opacity)
    }

    // --- history ---

    pub fn undo(&mut self) -> bool {
        match self.history.undo() {
            Ok(snapshot) => {
                let snapshot = snapshot.clone();
                log::debug!("Undo to {}", self.history.index());
                self.restore_snapshot(snapshot);
                true
            }
            Err(error) => {
                log::debug!("{error}");
                false
            }
        }
    }

    pub fn redo(&mut self) -> bool {
        match self.history.redo() {
            Ok(snapshot) => {
                let snapshot = snapshot.clone();
                log::debug!("Redo to {}", self.history.index());
                self.restore_snapshot(snapshot);
                true
            }
            Err(error) => {
                log::debug!("{error}");
                false
            }
        }
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    // --- zoom ---

    pub fn set_zoom(&mut self, zoom: f64) -> f64 {
        self.viewport.set_zoom(zoom)
    }

    pub fn zoom_by(&mut self, factor: f64) -> f64 {
        self.viewport.zoom_by(factor)
    }

    pub fn get_zoom(&self) -> f64 {
        self.viewport.zoom()
    }

    // --- clipboard ---

    pub fn copy_selection(&mut self) -> bool {
        let copied = self.clipboard.copy(&self.document, self.selection.ids());
        if copied {
            self.emit(EditorEvent::ClipboardChanged(true));
        }
        copied
    }

    /// Copy then delete the selection, as one history entry.
    pub fn cut_selection(&mut self) -> bool {
        if !self.copy_selection() {
            return false;
        }
        self.delete_selected() > 0
    }

    /// Paste the clipboard, select the new shapes and commit.
    pub fn paste_clipboard(&mut self) -> Vec<ShapeId> {
        let shapes = self.clipboard.paste_shapes(self.config.paste_offset);
        if shapes.is_empty() {
            return Vec::new();
        }
        let ids = self.insert_shapes(shapes);
        log::debug!("Pasted {} shape(s)", ids.len());
        self.commit_selection();
        ids
    }

    pub fn has_clipboard(&self) -> bool {
        self.clipboard.has_clipboard()
    }

    // --- export / import ---

    pub fn export_svg(&self) -> String {
        svg::render_svg(self.document.shapes_ordered(), &SvgOptions::default())
    }

    pub fn export(&self, format: ExportFormat) -> EditorResult<ExportedImage> {
        let svg = self.export_svg();
        let data = match format {
            ExportFormat::Svg => svg.into_bytes(),
            ExportFormat::Png | ExportFormat::Jpg => {
                let rasterizer = self
                    .rasterizer
                    .as_ref()
                    .ok_or_else(|| EditorError::UnsupportedExport(format.extension().to_string()))?;
                rasterizer.rasterize(&svg, format)?
            }
        };
        Ok(ExportedImage { format, data })
    }

    pub fn to_document(&self) -> DiagramDocument {
        DiagramDocument::new(self.document.snapshot(), self.style_defaults.clone())
    }

    pub fn export_json(&self) -> EditorResult<String> {
        self.to_document().to_json()
    }

    /// Replace the document. Invalid input leaves the editor untouched and
    /// emits `Error`. History restarts from the imported state.
    pub fn import_json(&mut self, json: &str) -> EditorResult<()> {
        match DiagramDocument::from_json(json) {
            Ok(document) => {
                self.load_document(document);
                Ok(())
            }
            Err(error) => {
                self.report_error(&error);
                Err(error)
            }
        }
    }

    pub fn load_document(&mut self, document: DiagramDocument) {
        self.cancel_interaction();
        self.connections.clear();
        self.document.restore(document.shapes);
        self.document.refresh_connectors(self.config.dangling_connectors);
        self.style_defaults = document.style_defaults;
        self.selection.clear();
        self.history.reset(self.snapshot());
        log::info!("Loaded document with {} shape(s)", self.document.len());
        self.emit(EditorEvent::CanvasChanged);
        self.sync_bounds();
        self.notify_selection();
    }
}

fn style_recursive(shape: &mut Shape, edit: &impl Fn(&mut ShapeStyle)) {
    edit(&mut shape.style);
    if let ShapeKind::Group(group) = &mut shape.kind {
        for child in &mut group.children {
            style_recursive(child, edit);
        }
    }
}
