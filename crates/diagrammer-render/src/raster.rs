//! SVG to PNG/JPG rasterization with resvg.

use diagrammer_core::{EditorError, EditorResult, ExportFormat, Rasterizer};
use image::ExtendedColorType;
use image::codecs::jpeg::JpegEncoder;
use resvg::tiny_skia::{Color, Pixmap, Transform};
use thiserror::Error;

/// Rasterization errors.
#[derive(Debug, Error)]
pub enum RasterError {
    #[error("Failed to parse SVG: {0}")]
    Parse(#[from] usvg::Error),
    #[error("Cannot allocate a {width}x{height} pixmap")]
    Allocation { width: u32, height: u32 },
    #[error("Failed to encode {format}: {message}")]
    Encode { format: &'static str, message: String },
    #[error("{0} is not a raster format")]
    NotRaster(&'static str),
}

impl From<RasterError> for EditorError {
    fn from(err: RasterError) -> Self {
        EditorError::Export(err.to_string())
    }
}

pub type RasterResult<T> = Result<T, RasterError>;

/// Renders exported SVG into PNG or JPG bytes.
#[derive(Debug, Clone)]
pub struct ResvgRasterizer {
    /// Output pixels per diagram unit.
    pub scale: f32,
    pub jpeg_quality: u8,
    /// Load installed fonts so text shapes render.
    pub system_fonts: bool,
}

impl Default for ResvgRasterizer {
    fn default() -> Self {
        Self {
            scale: 2.0,
            jpeg_quality: 90,
            system_fonts: true,
        }
    }
}

impl ResvgRasterizer {
    pub fn new(scale: f32) -> Self {
        Self {
            scale,
            ..Self::default()
        }
    }

    fn render(&self, svg: &str, background: Option<Color>) -> RasterResult<Pixmap> {
        let mut options = usvg::Options::default();
        if self.system_fonts {
            options.fontdb_mut().load_system_fonts();
        }
        let tree = usvg::Tree::from_str(svg, &options)?;

        let scale = if self.scale.is_finite() && self.scale > 0.0 { self.scale } else { 1.0 };
        let size = tree.size();
        let width = (size.width() * scale).ceil().max(1.0) as u32;
        let height = (size.height() * scale).ceil().max(1.0) as u32;
        let mut pixmap = Pixmap::new(width, height).ok_or(RasterError::Allocation { width, height })?;
        if let Some(color) = background {
            pixmap.fill(color);
        }
        resvg::render(&tree, Transform::from_scale(scale, scale), &mut pixmap.as_mut());
        log::debug!("Rasterized SVG to {width}x{height}");
        Ok(pixmap)
    }

    pub fn to_png(&self, svg: &str) -> RasterResult<Vec<u8>> {
        let pixmap = self.render(svg, None)?;
        pixmap.encode_png().map_err(|e| RasterError::Encode {
            format: "PNG",
            message: e.to_string(),
        })
    }

    /// JPG has no alpha, so the drawing is composited onto white.
    pub fn to_jpeg(&self, svg: &str) -> RasterResult<Vec<u8>> {
        let pixmap = self.render(svg, Some(Color::WHITE))?;
        let rgb: Vec<u8> = pixmap
            .data()
            .chunks_exact(4)
            .flat_map(|px| [px[0], px[1], px[2]])
            .collect();

        let mut out = Vec::new();
        JpegEncoder::new_with_quality(&mut out, self.jpeg_quality)
            .encode(&rgb, pixmap.width(), pixmap.height(), ExtendedColorType::Rgb8)
            .map_err(|e| RasterError::Encode {
                format: "JPG",
                message: e.to_string(),
            })?;
        Ok(out)
    }
}

impl Rasterizer for ResvgRasterizer {
    fn rasterize(&self, svg: &str, format: ExportFormat) -> EditorResult<Vec<u8>> {
        let bytes = match format {
            ExportFormat::Png => self.to_png(svg)?,
            ExportFormat::Jpg => self.to_jpeg(svg)?,
            ExportFormat::Svg => return Err(RasterError::NotRaster("SVG").into()),
        };
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SQUARE: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" width="10" height="10" viewBox="0 0 10 10"><rect width="10" height="10" fill="black"/></svg>"#;

    fn rasterizer() -> ResvgRasterizer {
        ResvgRasterizer {
            scale: 1.0,
            system_fonts: false,
            ..ResvgRasterizer::default()
        }
    }

    #[test]
    fn test_png_signature_and_size() {
        let bytes = rasterizer().to_png(SQUARE).unwrap();
        assert!(bytes.starts_with(b"\x89PNG\r\n\x1a\n"));
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (10, 10));
    }

    #[test]
    fn test_scale_multiplies_pixels() {
        let bytes = ResvgRasterizer { scale: 3.0, ..rasterizer() }.to_png(SQUARE).unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!(decoded.width(), 30);
    }

    #[test]
    fn test_jpeg_signature() {
        let bytes = rasterizer().to_jpeg(SQUARE).unwrap();
        assert!(bytes.starts_with(&[0xFF, 0xD8, 0xFF]));
    }

    #[test]
    fn test_invalid_svg() {
        let result = rasterizer().rasterize("not svg", ExportFormat::Png);
        assert!(matches!(result, Err(EditorError::Export(_))));
    }

    #[test]
    fn test_svg_is_not_rasterized() {
        assert!(rasterizer().rasterize(SQUARE, ExportFormat::Svg).is_err());
    }
}
