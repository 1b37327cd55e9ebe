//! Export formats and the rasterizer seam.

use crate::error::{EditorError, EditorResult};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Svg,
    Png,
    Jpg,
}

impl ExportFormat {
    pub fn mime(self) -> &'static str {
        match self {
            ExportFormat::Svg => "image/svg+xml",
            ExportFormat::Png => "image/png",
            ExportFormat::Jpg => "image/jpeg",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Svg => "svg",
            ExportFormat::Png => "png",
            ExportFormat::Jpg => "jpg",
        }
    }

    /// Parse a format name or file extension.
    pub fn from_name(name: &str) -> EditorResult<Self> {
        match name.to_ascii_lowercase().as_str() {
            "svg" => Ok(ExportFormat::Svg),
            "png" => Ok(ExportFormat::Png),
            "jpg" | "jpeg" => Ok(ExportFormat::Jpg),
            other => Err(EditorError::UnsupportedExport(other.to_string())),
        }
    }
}

/// A serialized rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedImage {
    pub format: ExportFormat,
    pub data: Vec<u8>,
}

impl ExportedImage {
    pub fn mime(&self) -> &'static str {
        self.format.mime()
    }

    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime(), STANDARD.encode(&self.data))
    }
}

/// Turns an SVG document into raster bytes. Installed by the host.
pub trait Rasterizer {
    fn rasterize(&self, svg: &str, format: ExportFormat) -> EditorResult<Vec<u8>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_url() {
        let image = ExportedImage {
            format: ExportFormat::Svg,
            data: b"<svg/>".to_vec(),
        };
        assert_eq!(image.to_data_url(), "data:image/svg+xml;base64,PHN2Zy8+");
    }

    #[test]
    fn test_format_names() {
        assert_eq!(ExportFormat::from_name("JPEG").unwrap(), ExportFormat::Jpg);
        assert_eq!(ExportFormat::Png.extension(), "png");
        assert!(matches!(
            ExportFormat::from_name("gif"),
            Err(EditorError::UnsupportedExport(_))
        ));
    }
}
