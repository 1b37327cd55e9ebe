//! Diagrammer Core Library
//!
//! Framework-agnostic state and interaction engine for a 2D diagram editor.
//! Hosts own the surface: they forward pointer and keyboard input to an
//! [`Editor`], subscribe to [`EditorEvent`]s and draw the document (or the
//! SVG produced by [`svg::render_svg`]).

pub mod canvas;
pub mod clipboard;
pub mod config;
pub mod connection;
pub mod editor;
pub mod error;
pub mod events;
pub mod export;
pub mod format;
pub mod geometry;
pub mod history;
pub mod input;
pub mod interaction;
pub mod selection;
pub mod shapes;
pub mod svg;
pub mod viewport;

pub use canvas::{CanvasDocument, ShapePatch, ZOrder};
pub use clipboard::ClipboardManager;
pub use config::{DanglingConnectorPolicy, EditorConfig, TextCommit};
pub use connection::ConnectionManager;
pub use editor::{Editor, IconOptions, Surface};
pub use error::{EditorError, EditorResult};
pub use events::{EditorEvent, SubscriptionId};
pub use export::{ExportFormat, ExportedImage, Rasterizer};
pub use format::DiagramDocument;
pub use history::HistoryStack;
pub use input::{Key, KeyInput, Modifiers, MouseButton, PointerInput};
pub use interaction::InteractionMode;
pub use selection::{Handle, HandleKind, Selection};
pub use shapes::{
    ArrowMode, Connector, Endpoint, PortId, SerializableColor, Shape, ShapeId, ShapeKind, ShapeStyle,
    ShapeType, TextContent,
};
pub use viewport::Viewport;
