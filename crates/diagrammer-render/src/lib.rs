//! Diagrammer Render Library
//!
//! Raster export for Diagrammer documents. [`ResvgRasterizer`] implements the
//! core's [`Rasterizer`](diagrammer_core::Rasterizer) seam, so an
//! [`Editor`](diagrammer_core::Editor) can export PNG and JPG once it is
//! installed with `Editor::set_rasterizer`.

mod raster;

pub use raster::{RasterError, RasterResult, ResvgRasterizer};
