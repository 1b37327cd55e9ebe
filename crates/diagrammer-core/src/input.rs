//! Host-neutral pointer and keyboard input types.

use kurbo::Point;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Mouse button identifiers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MouseButton {
    #[default]
    Left,
    Right,
    Middle,
}

/// Modifier keys state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Self = Self {
        shift: false,
        ctrl: false,
        alt: false,
        meta: false,
    };

    pub fn shift() -> Self {
        Self {
            shift: true,
            ..Self::NONE
        }
    }

    pub fn ctrl() -> Self {
        Self {
            ctrl: true,
            ..Self::NONE
        }
    }

    /// Ctrl on most platforms, Cmd on macOS.
    pub fn command(&self) -> bool {
        self.ctrl || self.meta
    }
}

/// A pointer event in host client coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointerInput {
    pub client: Point,
    pub button: MouseButton,
    pub modifiers: Modifiers,
}

impl PointerInput {
    pub fn new(client: Point) -> Self {
        Self {
            client,
            button: MouseButton::Left,
            modifiers: Modifiers::NONE,
        }
    }

    pub fn with_button(mut self, button: MouseButton) -> Self {
        self.button = button;
        self
    }

    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }
}

/// Keys the editor reacts to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Key {
    Delete,
    Backspace,
    Escape,
    Enter,
    Space,
    Character(char),
    Other(String),
}

impl Key {
    /// Parse a DOM-style key name (`"Escape"`, `" "`, `"z"`).
    pub fn from_name(name: &str) -> Self {
        match name {
            "Delete" => Key::Delete,
            "Backspace" => Key::Backspace,
            "Escape" | "Esc" => Key::Escape,
            "Enter" => Key::Enter,
            " " | "Space" | "Spacebar" => Key::Space,
            other => {
                let mut chars = other.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Key::Character(c.to_ascii_lowercase()),
                    _ => Key::Other(other.to_string()),
                }
            }
        }
    }
}

/// A key press or release.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyInput {
    pub key: Key,
    pub modifiers: Modifiers,
}

impl KeyInput {
    pub fn new(key: Key) -> Self {
        Self {
            key,
            modifiers: Modifiers::NONE,
        }
    }

    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }
}

/// Double-click detection constants.
const DOUBLE_CLICK_TIME: Duration = Duration::from_millis(500);
const DOUBLE_CLICK_DISTANCE: f64 = 5.0;

/// Turns a stream of presses into double-click notifications for hosts
/// that do not report click counts themselves.
#[derive(Debug, Clone, Default)]
pub struct ClickTracker {
    last: Option<(Instant, Point)>,
}

impl ClickTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a press now; true when it completes a double-click.
    pub fn register(&mut self, position: Point) -> bool {
        self.register_at(position, Instant::now())
    }

    pub fn register_at(&mut self, position: Point, at: Instant) -> bool {
        if let Some((time, last_pos)) = self.last {
            let close = at.saturating_duration_since(time) < DOUBLE_CLICK_TIME
                && (position - last_pos).hypot() < DOUBLE_CLICK_DISTANCE;
            if close {
                // reset so a triple click is not a second double click
                self.last = None;
                return true;
            }
        }
        self.last = Some((at, position));
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_names() {
        assert_eq!(Key::from_name("Escape"), Key::Escape);
        assert_eq!(Key::from_name(" "), Key::Space);
        assert_eq!(Key::from_name("Z"), Key::Character('z'));
        assert_eq!(Key::from_name("ArrowLeft"), Key::Other("ArrowLeft".to_string()));
    }

    #[test]
    fn test_command_modifier() {
        assert!(Modifiers::ctrl().command());
        assert!(Modifiers { meta: true, ..Modifiers::NONE }.command());
        assert!(!Modifiers::shift().command());
    }

    #[test]
    fn test_double_click_detection() {
        let mut tracker = ClickTracker::new();
        let start = Instant::now();
        let pos = Point::new(100.0, 100.0);

        assert!(!tracker.register_at(pos, start));
        assert!(tracker.register_at(pos, start + Duration::from_millis(200)));
        // third click starts a new sequence
        assert!(!tracker.register_at(pos, start + Duration::from_millis(300)));
    }

    #[test]
    fn test_double_click_too_far_or_slow() {
        let mut tracker = ClickTracker::new();
        let start = Instant::now();

        tracker.register_at(Point::new(100.0, 100.0), start);
        assert!(!tracker.register_at(Point::new(120.0, 100.0), start + Duration::from_millis(100)));
        assert!(!tracker.register_at(Point::new(120.0, 100.0), start + Duration::from_millis(900)));
    }
}
