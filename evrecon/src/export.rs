//! Frame export.
//!
//! The scheduler hands the intensity field to a [`FrameExporter`] at every
//! window boundary. Exporters are trait objects so the pipeline does not care
//! whether frames end up on disk or in a test's memory.
//!
//! # Value mapping
//!
//! [`PngFrameExporter`] maps the log-domain field linearly from
//! `[u_min, u_max]` onto `[0, 255]`, rounding to the nearest level. Values
//! outside the bounds saturate. The mapping is fixed for the lifetime of the
//! exporter so consecutive frames are directly comparable.

use std::path::PathBuf;

use image::{GrayImage, ImageFormat, Luma};

use crate::error::{ReconstructError, ReconstructResult};
use crate::grid::Grid;

/// Serializes one intensity frame.
pub trait FrameExporter: Send + Sync {
    /// Write the frame for the window ending at `window_end`.
    ///
    /// Returns the location of the written artifact.
    fn export(&self, field: &Grid<f32>, window_end: u64) -> ReconstructResult<PathBuf>;

    /// File extension of exported frames, without the dot.
    fn extension(&self) -> &str;

    /// Human-readable exporter name.
    fn name(&self) -> &str;
}

/// Linear map from the field's log-domain range to 8-bit gray levels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntensityMapping {
    u_min: f32,
    u_max: f32,
}

impl IntensityMapping {
    /// Create a mapping for `[u_min, u_max]`.
    ///
    /// Callers validate `u_min < u_max` through the solver configuration.
    pub fn new(u_min: f32, u_max: f32) -> Self {
        Self { u_min, u_max }
    }

    /// Gray level of a field value.
    #[inline]
    pub fn to_gray(&self, value: f32) -> u8 {
        let t = ((value - self.u_min) / (self.u_max - self.u_min)).clamp(0.0, 1.0);
        (t * 255.0).round() as u8
    }
}

/// Writes each frame as an 8-bit grayscale PNG named `<window_end>.png`.
#[derive(Debug, Clone)]
pub struct PngFrameExporter {
    out_dir: PathBuf,
    mapping: IntensityMapping,
}

impl PngFrameExporter {
    /// Create an exporter writing into `out_dir`.
    pub fn new(out_dir: impl Into<PathBuf>, mapping: IntensityMapping) -> Self {
        Self {
            out_dir: out_dir.into(),
            mapping,
        }
    }

    /// Path the frame for `window_end` is written to.
    pub fn frame_path(&self, window_end: u64) -> PathBuf {
        self.out_dir
            .join(format!("{}.{}", window_end, self.extension()))
    }

    /// Render the field to a grayscale image, row for row.
    pub fn render(&self, field: &Grid<f32>) -> GrayImage {
        let width = field.width();
        let values = field.as_slice();
        GrayImage::from_fn(field.width() as u32, field.height() as u32, |x, y| {
            let value = values[y as usize * width + x as usize];
            Luma([self.mapping.to_gray(value)])
        })
    }
}

impl FrameExporter for PngFrameExporter {
    fn export(&self, field: &Grid<f32>, window_end: u64) -> ReconstructResult<PathBuf> {
        let path = self.frame_path(window_end);
        self.render(field)
            .save_with_format(&path, ImageFormat::Png)
            .map_err(|e| ReconstructError::Export {
                path: path.clone(),
                message: e.to_string(),
            })?;
        Ok(path)
    }

    fn extension(&self) -> &str {
        "png"
    }

    fn name(&self) -> &str {
        "PNG (8-bit gray)"
    }
}
