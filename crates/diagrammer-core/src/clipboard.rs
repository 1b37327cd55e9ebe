//! Copy buffer for cut/copy/paste.

use crate::canvas::CanvasDocument;
use crate::shapes::{ConnectorEnd, Endpoint, Shape, ShapeId, ShapeKind};
use kurbo::Vec2;
use std::collections::HashMap;
use uuid::Uuid;

/// Deep copy of the shapes selected at copy time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClipboardBuffer {
    pub ids: Vec<ShapeId>,
    pub shapes: Vec<Shape>,
}

/// Holds the copy buffer and counts successive pastes for offsetting.
#[derive(Debug, Clone, Default)]
pub struct ClipboardManager {
    buffer: Option<ClipboardBuffer>,
    paste_count: u32,
}

impl ClipboardManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy the given top-level shapes in z-order. Returns false (and keeps
    /// the previous buffer) when none of them exist.
    pub fn copy(&mut self, doc: &CanvasDocument, ids: &[ShapeId]) -> bool {
        let shapes: Vec<Shape> = doc
            .shapes_ordered()
            .filter(|s| ids.contains(&s.id()))
            .cloned()
            .collect();
        if shapes.is_empty() {
            return false;
        }
        log::debug!("Copied {} shape(s)", shapes.len());
        self.buffer = Some(ClipboardBuffer {
            ids: shapes.iter().map(Shape::id).collect(),
            shapes,
        });
        self.paste_count = 0;
        true
    }

    pub fn has_clipboard(&self) -> bool {
        self.buffer.is_some()
    }

    pub fn buffer(&self) -> Option<&ClipboardBuffer> {
        self.buffer.as_ref()
    }

    pub fn clear(&mut self) {
        self.buffer = None;
        self.paste_count = 0;
    }

    /// Fresh copies of the buffer, ready to add to a document.
    ///
    /// IDs are regenerated; connector ends bound inside the copied set follow
    /// the new IDs, ends bound outside it are detached. Each paste is offset
    /// by one more `offset` step than the last.
    pub fn paste_shapes(&mut self, offset: f64) -> Vec<Shape> {
        let Some(buffer) = &self.buffer else {
            return Vec::new();
        };
        self.paste_count += 1;
        let delta = Vec2::new(offset, offset) * self.paste_count as f64;
        clone_with_new_ids(&buffer.shapes, delta)
    }
}

/// Clone `shapes` with new IDs, remapping internal connector references and
/// translating everything by `delta`.
pub fn clone_with_new_ids(shapes: &[Shape], delta: Vec2) -> Vec<Shape> {
    let mut map = HashMap::new();
    let mut copies: Vec<Shape> = shapes
        .iter()
        .map(|shape| {
            let mut copy = shape.clone();
            assign_new_ids(&mut copy, &mut map);
            copy
        })
        .collect();
    for copy in &mut copies {
        remap_connectors(copy, &map);
        copy.translate(delta);
    }
    copies
}

fn assign_new_ids(shape: &mut Shape, map: &mut HashMap<ShapeId, ShapeId>) {
    let new_id = Uuid::new_v4();
    map.insert(shape.id, new_id);
    shape.id = new_id;
    if let ShapeKind::Group(group) = &mut shape.kind {
        for child in &mut group.children {
            assign_new_ids(child, map);
        }
    }
}

fn remap_connectors(shape: &mut Shape, map: &HashMap<ShapeId, ShapeId>) {
    match &mut shape.kind {
        ShapeKind::Connector(connector) => {
            for end in [ConnectorEnd::Start, ConnectorEnd::End] {
                let cached = connector.point(end);
                let endpoint = connector.endpoint_mut(end);
                if let Endpoint::Attached { shape_id, port } = endpoint {
                    match map.get(shape_id) {
                        Some(&new_id) => {
                            *endpoint = Endpoint::Attached {
                                shape_id: new_id,
                                port: port.clone(),
                            }
                        }
                        None => *endpoint = Endpoint::free(cached),
                    }
                }
            }
        }
        ShapeKind::Group(group) => {
            for child in &mut group.children {
                remap_connectors(child, map);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::Connector;
    use kurbo::Point;

    #[test]
    fn test_copy_is_independent_of_originals() {
        let mut doc = CanvasDocument::new();
        let id = doc.add_shape(Shape::rectangle(Point::new(0.0, 0.0), 10.0, 10.0));
        let mut clipboard = ClipboardManager::new();
        assert!(!clipboard.has_clipboard());
        assert!(clipboard.copy(&doc, &[id]));

        doc.get_shape_mut(id).unwrap().position = Point::new(500.0, 500.0);
        let buffer = clipboard.buffer().unwrap();
        assert_eq!(buffer.ids, vec![id]);
        assert_eq!(buffer.shapes[0].position, Point::ZERO);
    }

    #[test]
    fn test_copy_nothing_keeps_buffer() {
        let doc = CanvasDocument::new();
        let mut clipboard = ClipboardManager::new();
        assert!(!clipboard.copy(&doc, &[Uuid::new_v4()]));
        assert!(!clipboard.has_clipboard());
    }

    #[test]
    fn test_successive_pastes_offset_further() {
        let mut doc = CanvasDocument::new();
        let id = doc.add_shape(Shape::rectangle(Point::new(0.0, 0.0), 10.0, 10.0));
        let mut clipboard = ClipboardManager::new();
        clipboard.copy(&doc, &[id]);

        let first = clipboard.paste_shapes(20.0);
        let second = clipboard.paste_shapes(20.0);
        assert_ne!(first[0].id(), id);
        assert_ne!(first[0].id(), second[0].id());
        assert_eq!(first[0].position, Point::new(20.0, 20.0));
        assert_eq!(second[0].position, Point::new(40.0, 40.0));
    }

    #[test]
    fn test_paste_remaps_internal_connectors_and_detaches_external() {
        let mut doc = CanvasDocument::new();
        let a = doc.add_shape(Shape::rectangle(Point::new(0.0, 0.0), 50.0, 50.0));
        let b = doc.add_shape(Shape::rectangle(Point::new(200.0, 0.0), 50.0, 50.0));
        let outside = doc.add_shape(Shape::rectangle(Point::new(0.0, 300.0), 50.0, 50.0));
        let inner = doc.add_shape(Shape::connector(Connector::new(
            Endpoint::attached(a, None),
            Endpoint::attached(b, None),
        )));
        let outer = doc.add_shape(Shape::connector(Connector::new(
            Endpoint::attached(a, None),
            Endpoint::attached(outside, None),
        )));
        doc.refresh_connectors(Default::default());

        let mut clipboard = ClipboardManager::new();
        clipboard.copy(&doc, &[a, b, inner, outer]);
        let pasted = clipboard.paste_shapes(10.0);
        let new_a = pasted[0].id();
        let new_b = pasted[1].id();

        let inner_copy = pasted[2].as_connector().unwrap();
        assert_eq!(inner_copy.from_shape_id(), Some(new_a));
        assert_eq!(inner_copy.to_shape_id(), Some(new_b));

        let outer_copy = pasted[3].as_connector().unwrap();
        assert_eq!(outer_copy.from_shape_id(), Some(new_a));
        // was bound to `outside` at its top port (25, 300), now free and offset
        assert_eq!(outer_copy.to, Endpoint::free(Point::new(35.0, 310.0)));
    }
}
