//! Change notifications for host adapters.

use crate::shapes::Shape;
use kurbo::Rect;

/// Events emitted by the editor after a mutation has been applied.
#[derive(Debug, Clone, PartialEq)]
pub enum EditorEvent {
    /// Editor initialised with a live surface.
    Ready,
    /// Selection changed; carries the shape when exactly one is selected.
    ShapeSelected(Option<Shape>),
    /// A change was committed to the document.
    CanvasChanged,
    /// Union bounds of all content, `None` when empty.
    BoundsChanged(Option<Rect>),
    ClipboardChanged(bool),
    Error(String),
}

/// Handle returned by [`EventBus::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Box<dyn FnMut(&EditorEvent)>;

/// Synchronous listener registry.
#[derive(Default)]
pub struct EventBus {
    listeners: Vec<(SubscriptionId, Listener)>,
    next_id: u64,
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&EditorEvent) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Returns false if the id was not registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(sid, _)| *sid != id);
        self.listeners.len() != before
    }

    pub fn emit(&mut self, event: &EditorEvent) {
        for (_, listener) in &mut self.listeners {
            listener(event);
        }
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_subscribe_and_unsubscribe() {
        let mut bus = EventBus::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        let id = bus.subscribe(move |e| sink.borrow_mut().push(e.clone()));

        bus.emit(&EditorEvent::CanvasChanged);
        assert!(bus.unsubscribe(id));
        assert!(!bus.unsubscribe(id));
        bus.emit(&EditorEvent::Ready);

        assert_eq!(*seen.borrow(), vec![EditorEvent::CanvasChanged]);
        assert!(bus.is_empty());
    }
}
