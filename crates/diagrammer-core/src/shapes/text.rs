//! Text content and approximate text metrics.

use kurbo::Size;
use serde::{Deserialize, Serialize};

/// Font weight options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontWeight {
    Light,
    #[default]
    Regular,
    Bold,
}

impl FontWeight {
    /// CSS `font-weight` value.
    pub fn css_value(&self) -> u16 {
        match self {
            FontWeight::Light => 300,
            FontWeight::Regular => 400,
            FontWeight::Bold => 700,
        }
    }
}

/// Horizontal text alignment within the text box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
}

impl TextAlign {
    /// SVG `text-anchor` value.
    pub fn text_anchor(&self) -> &'static str {
        match self {
            TextAlign::Left => "start",
            TextAlign::Center => "middle",
            TextAlign::Right => "end",
        }
    }
}

/// Content and font of a text shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextContent {
    pub text: String,
    pub font_size: f64,
    pub font_family: String,
    #[serde(default)]
    pub font_weight: FontWeight,
    #[serde(default)]
    pub align: TextAlign,
}

impl TextContent {
    pub const DEFAULT_FONT_SIZE: f64 = 16.0;
    pub const DEFAULT_FONT_FAMILY: &'static str = "sans-serif";

    /// Average glyph advance as a fraction of the font size.
    const ADVANCE_EM: f64 = 0.6;
    /// Line height as a fraction of the font size.
    const LINE_HEIGHT_EM: f64 = 1.2;

    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            font_size: Self::DEFAULT_FONT_SIZE,
            font_family: Self::DEFAULT_FONT_FAMILY.to_string(),
            font_weight: FontWeight::default(),
            align: TextAlign::default(),
        }
    }

    pub fn with_font_size(mut self, size: f64) -> Self {
        self.font_size = size;
        self
    }

    pub fn line_height(&self) -> f64 {
        self.font_size * Self::LINE_HEIGHT_EM
    }

    /// Lines of the content. A trailing newline starts an empty last line.
    pub fn lines(&self) -> Vec<&str> {
        self.text.split('\n').collect()
    }

    /// Approximate box size. An empty string still measures one glyph wide so
    /// the box stays hittable while being edited.
    pub fn measure(&self) -> Size {
        let lines = self.lines();
        let widest = lines
            .iter()
            .map(|line| line.chars().count())
            .max()
            .unwrap_or(0)
            .max(1);
        Size::new(
            widest as f64 * self.font_size * Self::ADVANCE_EM,
            lines.len() as f64 * self.line_height(),
        )
    }
}

impl Default for TextContent {
    fn default() -> Self {
        Self::new(String::new())
    }
}
