//! Pointer and keyboard interaction state machine.
//!
//! Hosts forward raw input to [`Editor::pointer_down`], [`Editor::pointer_move`],
//! [`Editor::pointer_up`], [`Editor::double_click`], [`Editor::key_down`] and
//! [`Editor::key_up`]. Intermediate frames mutate the document live; the
//! gesture's pointer-up commits one history entry, and only if something
//! actually changed.

use crate::canvas::ShapePatch;
use crate::config::TextCommit;
use crate::editor::Editor;
use crate::error::{EditorError, EditorResult};
use crate::geometry;
use crate::input::{ClickTracker, Key, KeyInput, MouseButton, PointerInput};
use crate::selection::{self, HandleKind};
use crate::shapes::{ConnectorEnd, Endpoint, PortId, Shape, ShapeId};
use kurbo::{Point, Rect};

/// Top-level interaction mode. Each variant carries its gesture's scratch state.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum InteractionMode {
    #[default]
    Idle,
    MarqueeSelecting {
        start: Point,
        current: Point,
        /// Shift held: the marquee adds to `base`.
        additive: bool,
        base: Vec<ShapeId>,
    },
    DraggingShapes {
        ids: Vec<ShapeId>,
        last: Point,
    },
    Resizing {
        shape_id: ShapeId,
        handle: HandleKind,
        original: Shape,
    },
    Rotating {
        shape_id: ShapeId,
        original: Shape,
        center: Point,
        start_angle: f64,
    },
    DrawingConnector {
        from_shape: ShapeId,
        from_port: Option<PortId>,
        /// End of the preview line.
        preview: Point,
        /// Snap target under the pointer.
        hover: Option<(ShapeId, Option<PortId>)>,
        /// Set once the pointer moved while pressed.
        dragged: bool,
        /// The next pointer-up finishes the connector.
        armed: bool,
    },
    DraggingConnectorEndpoint {
        connector_id: ShapeId,
        end: ConnectorEnd,
        hover: Option<(ShapeId, PortId)>,
    },
    DraggingPolylineVertex {
        shape_id: ShapeId,
        index: usize,
        original: Shape,
    },
    EditingText {
        shape_id: ShapeId,
        draft: String,
    },
    Panning {
        last_client: Point,
    },
}

impl InteractionMode {
    pub fn is_idle(&self) -> bool {
        matches!(self, InteractionMode::Idle)
    }

    /// Preview line of a connector being drawn.
    pub fn connector_preview(&self, editor: &Editor) -> Option<(Point, Point)> {
        let InteractionMode::DrawingConnector {
            from_shape,
            from_port,
            preview,
            ..
        } = self
        else {
            return None;
        };
        let lookup = |id| editor.document.find_shape(id);
        let start = geometry::resolve_endpoint(
            &Endpoint::attached(*from_shape, from_port.clone()),
            *preview,
            &lookup,
        )?;
        Some((start, *preview))
    }

    /// Rubber-band rectangle of an active marquee.
    pub fn marquee_rect(&self) -> Option<Rect> {
        match self {
            InteractionMode::MarqueeSelecting { start, current, .. } => {
                Some(Rect::from_points(*start, *current))
            }
            _ => None,
        }
    }
}

/// Controller state held by the editor: the mode plus host-facing flags.
#[derive(Debug, Clone, Default)]
pub struct InteractionState {
    pub mode: InteractionMode,
    /// Space is held; drags pan instead of selecting.
    pub pan_mode: bool,
    /// The host should swallow the click event that follows this gesture.
    pub suppress_next_click: bool,
    /// Document at gesture start, restored by Escape.
    origin: Option<Vec<Shape>>,
    clicks: ClickTracker,
}

impl InteractionState {
    pub fn reset(&mut self) {
        self.mode = InteractionMode::Idle;
        self.origin = None;
    }
}

impl Editor {
    fn begin_gesture(&mut self, mode: InteractionMode) {
        self.interaction.origin = Some(self.document.snapshot());
        self.interaction.mode = mode;
    }

    /// Leave the current gesture; commit once if the document changed.
    fn finish_gesture(&mut self) {
        let origin = self.interaction.origin.take();
        self.interaction.mode = InteractionMode::Idle;
        self.connections.clear_highlight();
        let changed = origin.is_some_and(|before| before != self.document.snapshot());
        if changed {
            self.interaction.suppress_next_click = true;
            self.commit_selection();
        } else {
            self.connections.refresh(&self.document);
        }
    }

    /// Abort any gesture without committing, restoring pre-gesture geometry.
    pub fn cancel_interaction(&mut self) {
        if let Some(origin) = self.interaction.origin.take() {
            self.document.restore(origin);
            self.selection.retain_existing(&self.document);
        }
        self.interaction.reset();
        self.connections.cancel_connection();
        self.connections.hide_all_ports();
        self.connections.refresh(&self.document);
    }

    /// Whether the host should ignore the click that follows the last gesture.
    /// Reading the flag clears it.
    pub fn take_suppress_click(&mut self) -> bool {
        std::mem::take(&mut self.interaction.suppress_next_click)
    }

    pub fn pan_mode(&self) -> bool {
        self.interaction.pan_mode
    }

    pub fn set_pan_mode(&mut self, enabled: bool) {
        self.interaction.pan_mode = enabled;
    }

    /// Begin a connector from a shape (and optional port). The next pointer-up
    /// over a valid target completes it; anything else cancels.
    pub fn start_connection(&mut self, from: ShapeId, port: Option<PortId>) -> EditorResult<()> {
        if let Err(error) = self
            .connections
            .start_connection(&self.document, from, port.clone())
        {
            self.report_error(&error);
            return Err(error);
        }
        let preview = self
            .document
            .find_shape(from)
            .map(|s| geometry::local_to_world(s, geometry::shape_center(s)))
            .unwrap_or_default();
        self.interaction.reset();
        self.interaction.mode = InteractionMode::DrawingConnector {
            from_shape: from,
            from_port: port,
            preview,
            hover: None,
            dragged: false,
            armed: true,
        };
        self.connections.show_ports(&self.document, from);
        Ok(())
    }

    // --- pointer ---

    pub fn pointer_down(&mut self, input: PointerInput) {
        let p = self.viewport.pointer_position(input.client);

        if let InteractionMode::EditingText { shape_id, .. } = &self.interaction.mode {
            let inside = self
                .document
                .get_shape(*shape_id)
                .is_some_and(|s| geometry::hit_test(s, p, self.config.hit_tolerance));
            if inside {
                return;
            }
            self.commit_text_edit();
        }

        if let InteractionMode::DrawingConnector { preview, .. } = &mut self.interaction.mode {
            *preview = p;
            return;
        }
        if !self.interaction.mode.is_idle() {
            log::debug!("Pointer down during {:?}, ignored", self.interaction.mode);
            return;
        }

        if input.button == MouseButton::Left
            && self.interaction.clicks.register(input.client)
            && self.double_click(input)
        {
            return;
        }

        if input.button == MouseButton::Middle || (self.interaction.pan_mode && input.button == MouseButton::Left) {
            self.interaction.mode = InteractionMode::Panning {
                last_client: input.client,
            };
            return;
        }
        if input.button != MouseButton::Left {
            return;
        }

        if self.try_begin_handle_gesture(p) {
            return;
        }

        if let Some((shape_id, port)) = self
            .connections
            .hit_visible_port(p, self.config.port_hit_radius)
        {
            if self
                .connections
                .start_connection(&self.document, shape_id, Some(port.clone()))
                .is_ok()
            {
                self.interaction.mode = InteractionMode::DrawingConnector {
                    from_shape: shape_id,
                    from_port: Some(port),
                    preview: p,
                    hover: None,
                    dragged: false,
                    armed: false,
                };
                return;
            }
        }

        match self.document.topmost_at(p, self.config.hit_tolerance) {
            Some(id) if input.modifiers.shift => {
                self.selection.toggle(id);
                self.notify_selection();
            }
            Some(id) => {
                if !self.selection.contains(id) {
                    self.selection.select_single(id);
                    self.notify_selection();
                }
                let ids = self.selection.ids().to_vec();
                self.begin_gesture(InteractionMode::DraggingShapes { ids, last: p });
            }
            None => {
                let additive = input.modifiers.shift;
                if !additive {
                    self.clear_selection();
                }
                self.interaction.mode = InteractionMode::MarqueeSelecting {
                    start: p,
                    current: p,
                    additive,
                    base: self.selection.ids().to_vec(),
                };
            }
        }
    }

    /// Resize, rotate, vertex and endpoint handles of a single selection take
    /// precedence over shape bodies.
    fn try_begin_handle_gesture(&mut self, p: Point) -> bool {
        let Some(shape) = self
            .selection
            .single()
            .and_then(|id| self.document.get_shape(id))
        else {
            return false;
        };
        let Some(handle) = selection::hit_test_handles(shape, p, self.config.handle_hit_tolerance)
        else {
            return false;
        };
        let shape_id = shape.id();
        let original = shape.clone();
        let mode = match handle {
            HandleKind::Corner(_) | HandleKind::Edge(_) if original.supports_resize() => {
                InteractionMode::Resizing {
                    shape_id,
                    handle,
                    original,
                }
            }
            HandleKind::Rotate if original.supports_transform() => {
                let center = geometry::local_to_world(&original, geometry::shape_center(&original));
                InteractionMode::Rotating {
                    shape_id,
                    start_angle: selection::pointer_angle(center, p),
                    center,
                    original,
                }
            }
            HandleKind::Vertex(index) => InteractionMode::DraggingPolylineVertex {
                shape_id,
                index,
                original,
            },
            HandleKind::ConnectorEnd(end) => InteractionMode::DraggingConnectorEndpoint {
                connector_id: shape_id,
                end,
                hover: None,
            },
            _ => return false,
        };
        log::debug!("Handle gesture {handle:?} on {shape_id}");
        self.begin_gesture(mode);
        true
    }

    pub fn pointer_move(&mut self, input: PointerInput) {
        let p = self.viewport.pointer_position(input.client);
        let policy = self.config.dangling_connectors;
        let mode = std::mem::take(&mut self.interaction.mode);
        self.interaction.mode = match mode {
            InteractionMode::Idle => {
                self.update_hover_ports(p, None);
                InteractionMode::Idle
            }
            InteractionMode::Panning { last_client } => {
                self.viewport.pan_by_client(input.client - last_client);
                InteractionMode::Panning {
                    last_client: input.client,
                }
            }
            InteractionMode::MarqueeSelecting {
                start,
                additive,
                base,
                ..
            } => {
                let hits = self.document.shapes_in_rect(Rect::from_points(start, p));
                let mut ids = if additive { base.clone() } else { Vec::new() };
                ids.extend(hits);
                if ids.as_slice() != self.selection.ids() {
                    self.selection.select_multiple(ids);
                    self.notify_selection();
                }
                InteractionMode::MarqueeSelecting {
                    start,
                    current: p,
                    additive,
                    base,
                }
            }
            InteractionMode::DraggingShapes { ids, last } => {
                self.document.translate_shapes(&ids, p - last, policy);
                self.connections.refresh(&self.document);
                InteractionMode::DraggingShapes { ids, last: p }
            }
            InteractionMode::Resizing {
                shape_id,
                handle,
                original,
            } => {
                let resized = selection::apply_resize(
                    &original,
                    handle,
                    p,
                    self.config.min_shape_size,
                    input.modifiers.shift,
                );
                self.replace_live(shape_id, resized);
                InteractionMode::Resizing {
                    shape_id,
                    handle,
                    original,
                }
            }
            InteractionMode::Rotating {
                shape_id,
                original,
                center,
                start_angle,
            } => {
                let rotated =
                    selection::apply_rotation(&original, center, start_angle, p, input.modifiers.shift);
                self.replace_live(shape_id, rotated);
                InteractionMode::Rotating {
                    shape_id,
                    original,
                    center,
                    start_angle,
                }
            }
            InteractionMode::DraggingPolylineVertex {
                shape_id,
                index,
                original,
            } => {
                let moved = selection::apply_vertex_move(&original, index, p);
                self.replace_live(shape_id, moved);
                InteractionMode::DraggingPolylineVertex {
                    shape_id,
                    index,
                    original,
                }
            }
            InteractionMode::DrawingConnector {
                from_shape,
                from_port,
                armed,
                ..
            } => {
                let hover = self.snap_target(p, Some(from_shape));
                InteractionMode::DrawingConnector {
                    from_shape,
                    from_port,
                    preview: p,
                    hover,
                    dragged: true,
                    armed,
                }
            }
            InteractionMode::DraggingConnectorEndpoint {
                connector_id, end, ..
            } => {
                let hover = self
                    .snap_target(p, None)
                    .and_then(|(id, port)| port.map(|port| (id, port)));
                if let Some(connector) = self
                    .document
                    .get_shape_mut(connector_id)
                    .and_then(Shape::as_connector_mut)
                {
                    *connector.endpoint_mut(end) = Endpoint::free(p);
                    connector.set_point(end, p);
                }
                self.document.refresh_connectors(policy);
                self.connections.refresh(&self.document);
                InteractionMode::DraggingConnectorEndpoint {
                    connector_id,
                    end,
                    hover,
                }
            }
            editing @ InteractionMode::EditingText { .. } => editing,
        };
    }

    /// Swap a shape for its live gesture state and refresh what depends on it.
    fn replace_live(&mut self, shape_id: ShapeId, shape: Shape) {
        let Some(slot) = self.document.get_shape_mut(shape_id) else {
            // deleted underneath the gesture
            self.cancel_interaction();
            return;
        };
        *slot = shape;
        self.document.refresh_connectors(self.config.dangling_connectors);
        self.connections.refresh(&self.document);
    }

    /// Show ports of the shape under the pointer (or of the snap target) and
    /// highlight the snapped port.
    fn update_hover_ports(&mut self, p: Point, snapped: Option<&(ShapeId, PortId)>) {
        let hovered = snapped.map(|(id, _)| *id).or_else(|| {
            self.document
                .shapes_at_point(p, self.config.hit_tolerance)
                .into_iter()
                .find(|&id| self.document.get_shape(id).is_some_and(|s| !s.is_connector()))
        });
        let pending_from = self.connections.pending().map(|pc| pc.from_shape);
        let shown: Vec<ShapeId> = self
            .document
            .z_order()
            .iter()
            .copied()
            .filter(|&id| self.connections.ports_visible(id))
            .collect();
        for id in shown {
            if Some(id) != hovered && Some(id) != pending_from {
                self.connections.hide_ports(id);
            }
        }
        if let Some(id) = hovered {
            if !self.connections.ports_visible(id) {
                self.connections.show_ports(&self.document, id);
            }
        }
        self.connections.set_highlight(snapped.cloned());
    }

    /// Port within snap tolerance, else the body of a shape under the pointer.
    fn snap_target(&mut self, p: Point, exclude: Option<ShapeId>) -> Option<(ShapeId, Option<PortId>)> {
        let port_hit = self.connections.find_nearest_port(
            &self.document,
            p,
            self.connections.snap_tolerance(),
            exclude,
        );
        let snapped = port_hit.map(|hit| (hit.shape_id, hit.port));
        self.update_hover_ports(p, snapped.as_ref());
        if let Some((id, port)) = snapped {
            return Some((id, Some(port)));
        }
        self.document
            .shapes_at_point(p, self.config.hit_tolerance)
            .into_iter()
            .find(|&id| {
                Some(id) != exclude && self.document.get_shape(id).is_some_and(|s| !s.is_connector())
            })
            .map(|id| (id, None))
    }

    pub fn pointer_up(&mut self, input: PointerInput) {
        let p = self.viewport.pointer_position(input.client);
        let mode = std::mem::take(&mut self.interaction.mode);
        match mode {
            InteractionMode::Idle | InteractionMode::Panning { .. } => {}
            InteractionMode::MarqueeSelecting { .. } => {
                log::debug!("Marquee selected {} shape(s)", self.selection.len());
            }
            InteractionMode::DrawingConnector {
                from_shape,
                from_port,
                hover,
                dragged,
                armed,
                ..
            } => {
                if !armed && !dragged {
                    // a click on a port: keep the connector pending
                    self.interaction.mode = InteractionMode::DrawingConnector {
                        from_shape,
                        from_port,
                        preview: p,
                        hover,
                        dragged,
                        armed: true,
                    };
                    return;
                }
                let target = hover.or_else(|| self.snap_target(p, Some(from_shape)));
                self.finish_connector(from_shape, from_port, target);
            }
            InteractionMode::DraggingConnectorEndpoint {
                connector_id,
                end,
                hover,
            } => {
                if let Some((shape_id, port)) = hover {
                    if let Some(connector) = self
                        .document
                        .get_shape_mut(connector_id)
                        .and_then(Shape::as_connector_mut)
                    {
                        *connector.endpoint_mut(end) = Endpoint::attached(shape_id, Some(port));
                    }
                    self.document.refresh_connectors(self.config.dangling_connectors);
                }
                self.connections.hide_all_ports();
                self.finish_gesture();
            }
            InteractionMode::DraggingShapes { .. }
            | InteractionMode::Resizing { .. }
            | InteractionMode::Rotating { .. }
            | InteractionMode::DraggingPolylineVertex { .. } => self.finish_gesture(),
            editing @ InteractionMode::EditingText { .. } => self.interaction.mode = editing,
        }
    }

    fn finish_connector(
        &mut self,
        from_shape: ShapeId,
        from_port: Option<PortId>,
        target: Option<(ShapeId, Option<PortId>)>,
    ) {
        self.connections.take_pending();
        self.connections.clear_highlight();
        self.connections.hide_all_ports();
        self.interaction.reset();
        match target {
            Some((to_shape, to_port)) if self.document.contains(from_shape) => {
                let id = self.add_connector(
                    Endpoint::attached(from_shape, from_port),
                    Endpoint::attached(to_shape, to_port),
                );
                log::debug!("Connector {id} drawn from {from_shape} to {to_shape}");
            }
            _ => log::debug!("Connector cancelled"),
        }
    }

    /// Enter text editing on a text shape under the pointer.
    pub fn double_click(&mut self, input: PointerInput) -> bool {
        let p = self.viewport.pointer_position(input.client);
        match self.document.topmost_at(p, self.config.hit_tolerance) {
            Some(id) => self.begin_text_edit(id),
            None => false,
        }
    }

    // --- text editing ---

    pub fn begin_text_edit(&mut self, shape_id: ShapeId) -> bool {
        let Some(text) = self.document.get_shape(shape_id).and_then(Shape::as_text) else {
            return false;
        };
        let draft = text.text.clone();
        if !self.interaction.mode.is_idle() {
            self.cancel_interaction();
        }
        self.interaction.mode = InteractionMode::EditingText { shape_id, draft };
        if self.selection.single() != Some(shape_id) {
            self.selection.select_single(shape_id);
            self.notify_selection();
        }
        true
    }

    pub fn text_draft(&self) -> Option<&str> {
        match &self.interaction.mode {
            InteractionMode::EditingText { draft, .. } => Some(draft),
            _ => None,
        }
    }

    pub fn set_text_draft(&mut self, text: impl Into<String>) -> bool {
        match &mut self.interaction.mode {
            InteractionMode::EditingText { draft, .. } => {
                *draft = text.into();
                true
            }
            _ => false,
        }
    }

    /// Apply the draft (one history entry) and resize the box. Empty drafts
    /// remove the shape when `remove_empty_text` is set.
    pub fn commit_text_edit(&mut self) -> bool {
        let InteractionMode::EditingText { shape_id, draft } = &self.interaction.mode else {
            return false;
        };
        let (shape_id, draft) = (*shape_id, draft.clone());
        self.interaction.mode = InteractionMode::Idle;
        let Some(current) = self.document.get_shape(shape_id).and_then(Shape::as_text) else {
            log::warn!("{}", EditorError::InvalidReference(shape_id));
            return false;
        };
        if draft.trim().is_empty() && self.config.remove_empty_text {
            self.document.remove_shape(shape_id, self.config.dangling_connectors);
            self.selection.remove(shape_id);
            self.commit_selection();
            return true;
        }
        if current.text == draft {
            return false;
        }
        let patch = ShapePatch {
            text: Some(draft),
            ..ShapePatch::default()
        };
        match self.update_shape(shape_id, &patch) {
            Ok(()) => true,
            Err(error) => {
                self.report_error(&error);
                false
            }
        }
    }

    pub fn cancel_text_edit(&mut self) {
        if matches!(self.interaction.mode, InteractionMode::EditingText { .. }) {
            self.interaction.mode = InteractionMode::Idle;
        }
    }

    // --- keyboard ---

    /// Handle a key press. Returns true if the editor consumed it.
    pub fn key_down(&mut self, input: KeyInput) -> bool {
        if matches!(self.interaction.mode, InteractionMode::EditingText { .. }) {
            let enter_commits =
                self.config.text_commit == TextCommit::Enter && !input.modifiers.shift;
            match input.key {
                Key::Escape => self.cancel_text_edit(),
                Key::Enter if enter_commits => {
                    self.commit_text_edit();
                }
                Key::Enter => {
                    if let InteractionMode::EditingText { draft, .. } = &mut self.interaction.mode {
                        draft.push('\n');
                    }
                }
                // character input goes through `set_text_draft`
                _ => return false,
            }
            return true;
        }

        let command = input.modifiers.command();
        match input.key {
            Key::Space => {
                self.interaction.pan_mode = true;
                true
            }
            Key::Escape => {
                if self.interaction.mode.is_idle() {
                    self.clear_selection();
                } else {
                    self.cancel_interaction();
                }
                true
            }
            Key::Delete | Key::Backspace => {
                if self.selection.is_empty() || !self.interaction.mode.is_idle() {
                    return false;
                }
                self.delete_selected();
                true
            }
            Key::Enter => match self.selection.single() {
                Some(id) => self.begin_text_edit(id),
                None => false,
            },
            Key::Character(c) if command => match c {
                'c' => self.copy_selection(),
                'a' => {
                    self.select_all();
                    true
                }
                // the rest commit, so they wait for the gesture to end
                _ if !self.interaction.mode.is_idle() => false,
                'x' => self.cut_selection(),
                'v' => !self.paste_clipboard().is_empty(),
                'd' => !self.duplicate_selected().is_empty(),
                'z' if input.modifiers.shift => self.redo(),
                'z' => self.undo(),
                'y' => self.redo(),
                'g' if input.modifiers.shift => !self.ungroup_selected().is_empty(),
                'g' => self.combine_selected().is_some(),
                _ => false,
            },
            _ => false,
        }
    }

    pub fn key_up(&mut self, input: KeyInput) -> bool {
        if input.key == Key::Space {
            self.interaction.pan_mode = false;
            if matches!(self.interaction.mode, InteractionMode::Panning { .. }) {
                self.interaction.mode = InteractionMode::Idle;
            }
            return true;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::Modifiers;
    use crate::shapes::TextContent;

    /// Editor with a surface mapping client pixels 1:1 to diagram units.
    fn editor() -> Editor {
        let mut editor = Editor::default();
        let page = editor.viewport().page_size();
        editor.attach_surface(Rect::new(0.0, 0.0, page.width, page.height));
        editor
    }

    fn at(x: f64, y: f64) -> PointerInput {
        PointerInput::new(Point::new(x, y))
    }

    fn drag(editor: &mut Editor, from: (f64, f64), to: (f64, f64)) {
        editor.pointer_down(at(from.0, from.1));
        editor.pointer_move(at((from.0 + to.0) / 2.0, (from.1 + to.1) / 2.0));
        editor.pointer_move(at(to.0, to.1));
        editor.pointer_up(at(to.0, to.1));
    }

    #[test]
    fn test_drag_moves_and_commits_once() {
        let mut editor = editor();
        let id = editor.add_shape(Shape::rectangle(Point::new(100.0, 100.0), 50.0, 50.0));
        let history = editor.history().len();

        drag(&mut editor, (120.0, 120.0), (170.0, 140.0));
        let shape = editor.document().get_shape(id).unwrap();
        assert_eq!(shape.position, Point::new(150.0, 120.0));
        assert_eq!(editor.history().len(), history + 1);
        assert!(editor.mode().is_idle());
        assert!(editor.take_suppress_click());
        assert!(!editor.take_suppress_click());
    }

    #[test]
    fn test_click_without_move_saves_nothing() {
        let mut editor = editor();
        editor.add_shape(Shape::rectangle(Point::new(100.0, 100.0), 50.0, 50.0));
        let history = editor.history().len();
        editor.pointer_down(at(120.0, 120.0));
        editor.pointer_up(at(120.0, 120.0));
        assert_eq!(editor.history().len(), history);
    }

    #[test]
    fn test_marquee_selects_intersecting() {
        let mut editor = editor();
        let a = editor.add_shape(Shape::rectangle(Point::new(100.0, 100.0), 50.0, 50.0));
        let b = editor.add_shape(Shape::rectangle(Point::new(300.0, 100.0), 50.0, 50.0));
        editor.clear_selection();

        editor.pointer_down(at(50.0, 50.0));
        editor.pointer_move(at(120.0, 120.0));
        assert_eq!(
            editor.mode().marquee_rect(),
            Some(Rect::new(50.0, 50.0, 120.0, 120.0))
        );
        editor.pointer_up(at(120.0, 120.0));
        assert_eq!(editor.selection().ids(), &[a]);

        editor.pointer_down(at(250.0, 50.0).with_modifiers(Modifiers::shift()));
        editor.pointer_move(at(320.0, 120.0).with_modifiers(Modifiers::shift()));
        editor.pointer_up(at(320.0, 120.0));
        assert_eq!(editor.selection().ids(), &[a, b]);
    }

    #[test]
    fn test_shift_click_toggles() {
        let mut editor = editor();
        let a = editor.add_shape(Shape::rectangle(Point::new(100.0, 100.0), 50.0, 50.0));
        let b = editor.add_shape(Shape::rectangle(Point::new(300.0, 100.0), 50.0, 50.0));
        let shift = Modifiers::shift();
        editor.pointer_down(at(120.0, 120.0).with_modifiers(shift));
        editor.pointer_up(at(120.0, 120.0));
        assert_eq!(editor.selection().ids(), &[b, a]);
        editor.pointer_down(at(320.0, 120.0).with_modifiers(shift));
        editor.pointer_up(at(320.0, 120.0));
        assert_eq!(editor.selection().ids(), &[a]);
    }

    #[test]
    fn test_resize_clamps_to_min_size() {
        let mut editor = editor();
        let id = editor.add_shape(Shape::rectangle(Point::new(100.0, 100.0), 50.0, 50.0));
        // bottom-right handle dragged past the top-left corner
        drag(&mut editor, (150.0, 150.0), (20.0, 20.0));
        let shape = editor.document().get_shape(id).unwrap();
        let min = editor.config().min_shape_size;
        assert!((shape.width - min).abs() < 1e-9);
        assert!((shape.height - min).abs() < 1e-9);
        assert_eq!(shape.position, Point::new(100.0, 100.0));
    }

    #[test]
    fn test_rotate_handle_snaps_with_shift() {
        let mut editor = editor();
        let id = editor.add_shape(Shape::rectangle(Point::new(100.0, 100.0), 100.0, 100.0));
        // rotate handle sits 25 above the top edge centre
        editor.pointer_down(at(150.0, 75.0));
        editor.pointer_move(at(260.0, 140.0).with_modifiers(Modifiers::shift()));
        editor.pointer_up(at(260.0, 140.0));
        let rotation = editor.document().get_shape(id).unwrap().rotation;
        assert!((rotation / 15.0 - (rotation / 15.0).round()).abs() < 1e-9);
        assert!(rotation > 0.0);
    }

    #[test]
    fn test_escape_restores_geometry() {
        let mut editor = editor();
        let id = editor.add_shape(Shape::rectangle(Point::new(100.0, 100.0), 50.0, 50.0));
        let history = editor.history().len();
        editor.pointer_down(at(120.0, 120.0));
        editor.pointer_move(at(300.0, 300.0));
        assert!(editor.key_down(KeyInput::new(Key::Escape)));
        editor.pointer_up(at(300.0, 300.0));
        assert_eq!(editor.document().get_shape(id).unwrap().position, Point::new(100.0, 100.0));
        assert_eq!(editor.history().len(), history);
    }

    #[test]
    fn test_draw_connector_from_port_to_shape() {
        let mut editor = editor();
        let a = editor.add_shape(Shape::rectangle(Point::new(100.0, 100.0), 50.0, 50.0));
        let b = editor.add_shape(Shape::rectangle(Point::new(300.0, 100.0), 50.0, 50.0));
        editor.clear_selection();

        // hovering shows A's ports; press on its right port and drag to B
        editor.pointer_move(at(125.0, 125.0));
        assert!(editor.connections().ports_visible(a));
        editor.pointer_down(at(150.0, 125.0));
        assert!(matches!(editor.mode(), InteractionMode::DrawingConnector { .. }));
        editor.pointer_move(at(298.0, 126.0));
        let (start, end) = editor.mode().connector_preview(&editor).unwrap();
        assert_eq!(start, Point::new(150.0, 125.0));
        assert_eq!(end, Point::new(298.0, 126.0));
        assert_eq!(
            editor.connections().highlighted(),
            Some(&(b, "left".to_string()))
        );
        editor.pointer_up(at(298.0, 126.0));

        assert_eq!(editor.document().len(), 3);
        let link = editor.selection().single().unwrap();
        let connector = editor.document().get_shape(link).unwrap().as_connector().unwrap();
        assert_eq!(connector.from_shape_id(), Some(a));
        assert_eq!(connector.to_shape_id(), Some(b));
        assert_eq!(connector.end, Point::new(300.0, 125.0));
        assert!(editor.connections().highlighted().is_none());
    }

    #[test]
    fn test_connector_over_empty_space_cancels() {
        let mut editor = editor();
        let a = editor.add_shape(Shape::rectangle(Point::new(100.0, 100.0), 50.0, 50.0));
        let history = editor.history().len();
        editor.start_connection(a, None).unwrap();
        editor.pointer_down(at(600.0, 600.0));
        editor.pointer_up(at(600.0, 600.0));
        assert_eq!(editor.document().len(), 1);
        assert_eq!(editor.history().len(), history);
        assert!(editor.mode().is_idle());
        assert!(editor.connections().pending().is_none());
    }

    #[test]
    fn test_click_on_port_keeps_connector_pending() {
        let mut editor = editor();
        let a = editor.add_shape(Shape::rectangle(Point::new(100.0, 100.0), 50.0, 50.0));
        let b = editor.add_shape(Shape::rectangle(Point::new(300.0, 100.0), 50.0, 50.0));
        editor.clear_selection();
        editor.pointer_move(at(125.0, 125.0));
        editor.pointer_down(at(150.0, 125.0));
        editor.pointer_up(at(150.0, 125.0));
        assert!(matches!(editor.mode(), InteractionMode::DrawingConnector { armed: true, .. }));

        editor.pointer_move(at(325.0, 125.0));
        editor.pointer_down(at(325.0, 125.0));
        editor.pointer_up(at(325.0, 125.0));
        let link = editor.selection().single().unwrap();
        let connector = editor.document().get_shape(link).unwrap().as_connector().unwrap();
        assert_eq!(connector.to_shape_id(), Some(b));
        assert_eq!(connector.from_shape_id(), Some(a));
    }

    #[test]
    fn test_drag_connector_endpoint_rebinds() {
        let mut editor = editor();
        let a = editor.add_shape(Shape::rectangle(Point::new(100.0, 100.0), 50.0, 50.0));
        let b = editor.add_shape(Shape::rectangle(Point::new(300.0, 100.0), 50.0, 50.0));
        let c = editor.add_shape(Shape::rectangle(Point::new(300.0, 400.0), 50.0, 50.0));
        let link = editor.connect_shapes(a, b, None, None).unwrap();
        let end = editor.document().get_shape(link).unwrap().as_connector().unwrap().end;

        editor.pointer_down(PointerInput::new(end));
        editor.pointer_move(at(330.0, 380.0));
        editor.pointer_move(at(325.0, 402.0));
        editor.pointer_up(at(325.0, 402.0));

        let connector = editor.document().get_shape(link).unwrap().as_connector().unwrap();
        assert_eq!(connector.to, Endpoint::attached(c, Some("top".to_string())));
        assert_eq!(connector.end, Point::new(325.0, 400.0));
    }

    #[test]
    fn test_vertex_drag() {
        let mut editor = editor();
        let id = editor.add_shape(Shape::polyline(vec![
            Point::new(100.0, 100.0),
            Point::new(200.0, 200.0),
            Point::new(300.0, 100.0),
        ]));
        drag(&mut editor, (200.0, 200.0), (200.0, 260.0));
        let path = editor.document().get_shape(id).unwrap().path().unwrap();
        assert_eq!(path.points[1], Point::new(200.0, 260.0));
        assert_eq!(path.points[0], Point::new(100.0, 100.0));
    }

    #[test]
    fn test_text_edit_commit_and_cancel() {
        let mut editor = editor();
        let id = editor.add_shape(Shape::text(Point::new(100.0, 100.0), TextContent::new("Hi")));
        let history = editor.history().len();

        assert!(editor.double_click(at(105.0, 105.0)));
        assert_eq!(editor.text_draft(), Some("Hi"));
        editor.set_text_draft("Hello world");
        assert!(editor.key_down(KeyInput::new(Key::Enter)));
        assert!(editor.mode().is_idle());
        let shape = editor.document().get_shape(id).unwrap();
        assert_eq!(shape.as_text().unwrap().text, "Hello world");
        assert!((shape.width - 11.0 * 16.0 * 0.6).abs() < 1e-9);
        assert_eq!(editor.history().len(), history + 1);

        editor.begin_text_edit(id);
        editor.set_text_draft("discarded");
        editor.key_down(KeyInput::new(Key::Escape));
        assert_eq!(editor.document().get_shape(id).unwrap().as_text().unwrap().text, "Hello world");
    }

    #[test]
    fn test_two_quick_presses_edit_text() {
        let mut editor = editor();
        editor.add_shape(Shape::text(Point::new(100.0, 100.0), TextContent::new("Hi")));
        editor.pointer_down(at(105.0, 105.0));
        editor.pointer_up(at(105.0, 105.0));
        editor.pointer_down(at(106.0, 105.0));
        assert_eq!(editor.text_draft(), Some("Hi"));
    }

    #[test]
    fn test_shift_enter_inserts_newline() {
        let mut editor = editor();
        let id = editor.add_shape(Shape::text(Point::new(100.0, 100.0), TextContent::new("a")));
        editor.begin_text_edit(id);
        editor.key_down(KeyInput::new(Key::Enter).with_modifiers(Modifiers::shift()));
        assert_eq!(editor.text_draft(), Some("a\n"));
    }

    #[test]
    fn test_empty_text_is_removed() {
        let mut editor = editor();
        let id = editor.add_shape(Shape::text(Point::new(100.0, 100.0), TextContent::new("a")));
        editor.begin_text_edit(id);
        editor.set_text_draft("");
        assert!(editor.commit_text_edit());
        assert!(!editor.document().contains(id));
    }

    #[test]
    fn test_double_click_on_rectangle_does_not_edit() {
        let mut editor = editor();
        editor.add_shape(Shape::rectangle(Point::new(100.0, 100.0), 50.0, 50.0));
        assert!(!editor.double_click(at(120.0, 120.0)));
        assert!(editor.mode().is_idle());
    }

    #[test]
    fn test_space_pans() {
        let mut editor = editor();
        editor.key_down(KeyInput::new(Key::Space));
        assert!(editor.pan_mode());
        drag(&mut editor, (400.0, 400.0), (350.0, 380.0));
        assert_eq!(editor.viewport().pan(), kurbo::Vec2::new(50.0, 20.0));
        editor.key_up(KeyInput::new(Key::Space));
        assert!(!editor.pan_mode());
    }

    #[test]
    fn test_keyboard_shortcuts() {
        let mut editor = editor();
        editor.add_shape(Shape::rectangle(Point::new(100.0, 100.0), 50.0, 50.0));
        let ctrl = Modifiers::ctrl();
        assert!(editor.key_down(KeyInput::new(Key::Character('c')).with_modifiers(ctrl)));
        assert!(editor.key_down(KeyInput::new(Key::Character('v')).with_modifiers(ctrl)));
        assert_eq!(editor.document().len(), 2);
        assert!(editor.key_down(KeyInput::new(Key::Character('z')).with_modifiers(ctrl)));
        assert_eq!(editor.document().len(), 1);
        let redo = Modifiers { shift: true, ..ctrl };
        assert!(editor.key_down(KeyInput::new(Key::Character('z')).with_modifiers(redo)));
        assert_eq!(editor.document().len(), 2);
        assert!(editor.key_down(KeyInput::new(Key::Delete)));
        assert_eq!(editor.document().len(), 1);
    }

    #[test]
    fn test_undo_clears_active_gesture() {
        let mut editor = editor();
        editor.add_shape(Shape::rectangle(Point::new(100.0, 100.0), 50.0, 50.0));
        editor.pointer_down(at(120.0, 120.0));
        editor.pointer_move(at(150.0, 150.0));
        assert!(editor.undo());
        assert!(editor.mode().is_idle());
        assert!(editor.document().is_empty());
    }
}
