//! Group shape for combining multiple shapes.

use super::{Shape, ShapeId};
use crate::geometry;
use kurbo::Rect;
use serde::{Deserialize, Serialize};

/// A group of shapes that can be manipulated as a single unit.
/// Groups can contain other groups.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    /// Child shapes in z-order (bottom first).
    pub children: Vec<Shape>,
}

impl Group {
    pub fn new(children: Vec<Shape>) -> Self {
        Self { children }
    }

    /// Dissolve this group and return its children.
    pub fn ungroup(self) -> Vec<Shape> {
        self.children
    }

    /// Union of the children's transformed bounds, `None` when empty.
    pub fn bounds(&self) -> Option<Rect> {
        self.children
            .iter()
            .map(geometry::transformed_bounds)
            .reduce(|acc, r| acc.union(r))
    }

    /// Find a shape by ID within this group (including nested groups).
    pub fn find_shape(&self, id: ShapeId) -> Option<&Shape> {
        for child in &self.children {
            if child.id() == id {
                return Some(child);
            }
            if let Some(found) = child.as_group().and_then(|g| g.find_shape(id)) {
                return Some(found);
            }
        }
        None
    }
}
