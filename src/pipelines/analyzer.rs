// SPDX-License-Identifier: GPL-3.0-only

//! Per-frame analysis: convert → filter → orient
//!
//! A [`FrameAnalyzer`] is built for one filter selection and owns the scratch
//! rasters it writes into. The pipeline replaces the analyzer whenever the
//! selection changes, so scratch state never outlives the filter it served.

use super::filters::{Filter, FilterKind, FilterParams};
use crate::backends::camera::types::CameraFrame;
use crate::errors::FrameResult;
use crate::media::orientation::Orientation;
use crate::media::yuv_convert::{LumaView, convert_to_rgba};
use image::RgbaImage;
use std::time::Instant;
use tracing::{debug, trace};

/// One analyzed frame, ready for display
#[derive(Debug, Clone)]
pub struct AnalysisResult {
    /// Filtered, upright raster
    pub filtered: RgbaImage,
    /// Unfiltered, upright raster (possibly a thumbnail)
    pub reference: RgbaImage,
    /// Filter that produced `filtered`
    pub filter: FilterKind,
    /// Sequence number of the source frame
    pub sequence: u64,
    /// When the source frame was captured
    pub captured_at: Instant,
}

/// Everything an analyzer is built from
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnalyzerSettings {
    pub filter: FilterKind,
    pub params: FilterParams,
    pub orientation: Orientation,
    /// Longest edge of the reference raster; `None` keeps full size
    pub thumbnail_max_edge: Option<u32>,
}

impl Default for AnalyzerSettings {
    fn default() -> Self {
        Self {
            filter: FilterKind::default(),
            params: FilterParams::default(),
            orientation: Orientation::default(),
            thumbnail_max_edge: None,
        }
    }
}

/// Analyzer lifecycle stage for the frame currently being processed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalyzerState {
    Idle,
    Converting,
    Filtering,
    Orienting,
    Published,
}

/// Runs one frame at a time through conversion, filtering and orientation
pub struct FrameAnalyzer {
    filter: Filter,
    orientation: Orientation,
    thumbnail_max_edge: Option<u32>,
    state: AnalyzerState,
    // Scratch rasters, reused while the frame geometry stays the same
    converted: RgbaImage,
    filtered: RgbaImage,
    oriented_filtered: RgbaImage,
    oriented_reference: RgbaImage,
}

impl FrameAnalyzer {
    pub fn new(settings: &AnalyzerSettings) -> Self {
        debug!(
            filter = %settings.filter,
            rotation = %settings.orientation.rotation,
            mirror = settings.orientation.mirror,
            "Creating frame analyzer"
        );

        Self {
            filter: Filter::new(settings.filter, &settings.params),
            orientation: settings.orientation,
            thumbnail_max_edge: settings.thumbnail_max_edge.filter(|&edge| edge > 0),
            state: AnalyzerState::Idle,
            converted: RgbaImage::new(0, 0),
            filtered: RgbaImage::new(0, 0),
            oriented_filtered: RgbaImage::new(0, 0),
            oriented_reference: RgbaImage::new(0, 0),
        }
    }

    pub fn filter_kind(&self) -> FilterKind {
        self.filter.kind()
    }

    pub fn state(&self) -> AnalyzerState {
        self.state
    }

    fn transition(&mut self, next: AnalyzerState, sequence: u64) {
        trace!(sequence, from = ?self.state, to = ?next, "Analyzer state");
        self.state = next;
    }

    /// Analyze one frame
    ///
    /// The frame is released as soon as its pixels have been read, whether
    /// conversion succeeded or not.
    pub fn analyze(&mut self, frame: CameraFrame) -> FrameResult<AnalysisResult> {
        let sequence = frame.sequence;
        let captured_at = frame.captured_at;

        self.transition(AnalyzerState::Converting, sequence);
        let converted = self.convert(&frame);
        frame.release();
        let luma_filtered = match converted {
            Ok(luma_filtered) => luma_filtered,
            Err(e) => {
                self.transition(AnalyzerState::Idle, sequence);
                return Err(e);
            }
        };

        self.transition(AnalyzerState::Filtering, sequence);
        if !luma_filtered {
            self.filter.apply_into(&self.converted, &mut self.filtered);
        }

        self.transition(AnalyzerState::Orienting, sequence);
        self.orientation
            .apply_into(&self.filtered, &mut self.oriented_filtered);
        match self.thumbnail_max_edge {
            Some(max_edge) => {
                let (width, height) = self.converted.dimensions();
                let (thumb_w, thumb_h) = thumbnail_dimensions(width, height, max_edge);
                if (thumb_w, thumb_h) == (width, height) {
                    self.orientation
                        .apply_into(&self.converted, &mut self.oriented_reference);
                } else {
                    let thumb = image::imageops::thumbnail(&self.converted, thumb_w, thumb_h);
                    self.orientation
                        .apply_into(&thumb, &mut self.oriented_reference);
                }
            }
            None => self
                .orientation
                .apply_into(&self.converted, &mut self.oriented_reference),
        }

        let result = AnalysisResult {
            filtered: self.oriented_filtered.clone(),
            reference: self.oriented_reference.clone(),
            filter: self.filter.kind(),
            sequence,
            captured_at,
        };
        self.transition(AnalyzerState::Published, sequence);
        self.transition(AnalyzerState::Idle, sequence);
        Ok(result)
    }

    /// Decode the frame into scratch
    ///
    /// Returns `true` when the filtered raster was already produced from the
    /// luma plane and the filter stage can be skipped.
    fn convert(&mut self, frame: &CameraFrame) -> FrameResult<bool> {
        let buffer = frame.buffer();
        convert_to_rgba(buffer, &mut self.converted)?;

        if self.filter == Filter::Grayscale {
            LumaView::new(buffer)?.expand_into_rgba(&mut self.filtered);
            return Ok(true);
        }
        Ok(false)
    }
}

/// Size of a thumbnail whose longest edge is at most `max_edge`
pub fn thumbnail_dimensions(width: u32, height: u32, max_edge: u32) -> (u32, u32) {
    let longest = width.max(height);
    if longest <= max_edge || longest == 0 {
        return (width, height);
    }

    let scale = |edge: u32| ((edge as u64 * max_edge as u64) / longest as u64).max(1) as u32;
    (scale(width), scale(height))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::camera::types::{PixelBuffer, PixelFormat, SensorRotation};
    use crate::errors::FrameError;
    use crate::media::yuv_convert::encode_rgba;
    use image::Rgba;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn nv21_frame(width: u32, height: u32, colour: [u8; 3], sequence: u64) -> CameraFrame {
        let src = RgbaImage::from_pixel(width, height, Rgba([colour[0], colour[1], colour[2], 255]));
        let mut data = Vec::new();
        encode_rgba(&src, PixelFormat::Nv21, &mut data).unwrap();
        CameraFrame::new(PixelBuffer::new(width, height, PixelFormat::Nv21, data), sequence)
    }

    fn settings(filter: FilterKind, orientation: Orientation) -> AnalyzerSettings {
        AnalyzerSettings {
            filter,
            orientation,
            ..AnalyzerSettings::default()
        }
    }

    #[test]
    fn test_identity_result_matches_reference() {
        let mut analyzer = FrameAnalyzer::new(&settings(FilterKind::Identity, Orientation::default()));
        let result = analyzer.analyze(nv21_frame(4, 4, [90, 140, 200], 3)).unwrap();

        assert_eq!(result.sequence, 3);
        assert_eq!(result.filter, FilterKind::Identity);
        assert_eq!(result.filtered, result.reference);
        assert_eq!(analyzer.state(), AnalyzerState::Idle);
    }

    #[test]
    fn test_rotation_swaps_output_dimensions() {
        let orientation = Orientation::new(SensorRotation::Rotate90, false);
        let mut analyzer = FrameAnalyzer::new(&settings(FilterKind::Sepia, orientation));
        let result = analyzer.analyze(nv21_frame(8, 4, [255, 0, 0], 0)).unwrap();

        assert_eq!(result.filtered.dimensions(), (4, 8));
        assert_eq!(result.reference.dimensions(), (4, 8));
    }

    #[test]
    fn test_grayscale_uses_luma_plane() {
        let mut analyzer = FrameAnalyzer::new(&settings(FilterKind::Grayscale, Orientation::default()));
        let result = analyzer.analyze(nv21_frame(4, 4, [30, 200, 90], 0)).unwrap();

        for px in result.filtered.pixels() {
            let [r, g, b, a] = px.0;
            assert_eq!(r, g);
            assert_eq!(g, b);
            assert_eq!(a, 255);
        }
        assert_ne!(result.filtered, result.reference);
    }

    #[test]
    fn test_malformed_frame_is_released_and_rejected() {
        let released = Arc::new(AtomicUsize::new(0));
        let released_clone = Arc::clone(&released);
        let frame = CameraFrame::new(PixelBuffer::new(4, 4, PixelFormat::Nv21, vec![0; 10]), 1)
            .with_release_hook(move |_, _| {
                released_clone.fetch_add(1, Ordering::SeqCst);
            });

        let mut analyzer = FrameAnalyzer::new(&AnalyzerSettings::default());
        let err = analyzer.analyze(frame).unwrap_err();

        assert!(matches!(err, FrameError::BufferSizeMismatch { .. }));
        assert_eq!(released.load(Ordering::SeqCst), 1);
        assert_eq!(analyzer.state(), AnalyzerState::Idle);
    }

    #[test]
    fn test_reference_is_downscaled_to_thumbnail() {
        let mut analyzer = FrameAnalyzer::new(&AnalyzerSettings {
            thumbnail_max_edge: Some(4),
            ..AnalyzerSettings::default()
        });
        let result = analyzer.analyze(nv21_frame(16, 8, [10, 10, 10], 0)).unwrap();

        assert_eq!(result.filtered.dimensions(), (16, 8));
        assert_eq!(result.reference.dimensions(), (4, 2));
    }

    #[test]
    fn test_thumbnail_dimensions() {
        assert_eq!(thumbnail_dimensions(640, 480, 160), (160, 120));
        assert_eq!(thumbnail_dimensions(100, 50, 200), (100, 50));
        assert_eq!(thumbnail_dimensions(1000, 1, 10), (10, 1));
    }
}
