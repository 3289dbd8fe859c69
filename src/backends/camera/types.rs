// SPDX-License-Identifier: GPL-3.0-only
// Shared types for frame sources and the analysis pipeline

//! Frame and pixel buffer types

use crate::errors::{FrameError, FrameResult};
use std::time::Instant;

/// Pixel format tag for a [`PixelBuffer`]
///
/// The planar 4:2:0 variants are what camera sensors hand out; `Rgba` and
/// `Gray8` are the interleaved rasters the pipeline produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    /// NV21 - Semi-planar 4:2:0 (Y plane + interleaved VU plane)
    /// Default output of mobile camera sensors
    Nv21,
    /// NV12 - Semi-planar 4:2:0 (Y plane + interleaved UV plane)
    Nv12,
    /// I420 - Planar 4:2:0 (separate Y, U, V planes)
    I420,
    /// RGBA - 32-bit with alpha (4 bytes per pixel)
    Rgba,
    /// Gray8 - 8-bit grayscale (single channel)
    Gray8,
}

impl PixelFormat {
    /// Check if this is a sensor-native planar luma/chroma layout
    pub fn is_planar(&self) -> bool {
        matches!(self, Self::Nv21 | Self::Nv12 | Self::I420)
    }

    /// Average bytes per pixel (accounting for chroma subsampling)
    pub fn bytes_per_pixel(&self) -> f32 {
        match self {
            Self::Rgba => 4.0,
            Self::Nv21 | Self::Nv12 | Self::I420 => 1.5,
            Self::Gray8 => 1.0,
        }
    }

    /// Smallest valid row stride of the first plane for a given width
    pub fn min_stride(&self, width: u32) -> usize {
        match self {
            Self::Rgba => width as usize * 4,
            Self::Nv21 | Self::Nv12 | Self::I420 | Self::Gray8 => width as usize,
        }
    }

    /// Total byte length of a frame with the given geometry
    pub fn frame_size(&self, stride: usize, height: u32) -> usize {
        let h = height as usize;
        match self {
            Self::Rgba | Self::Gray8 => stride * h,
            Self::Nv21 | Self::Nv12 => stride * h + stride * (h / 2),
            Self::I420 => stride * h + 2 * (stride / 2) * (h / 2),
        }
    }

    /// Short name used in logs and on the command line
    pub fn name(&self) -> &'static str {
        match self {
            Self::Nv21 => "NV21",
            Self::Nv12 => "NV12",
            Self::I420 => "I420",
            Self::Rgba => "RGBA",
            Self::Gray8 => "GRAY8",
        }
    }

    /// Parse a format name (case-insensitive, common aliases accepted)
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_uppercase().as_str() {
            "NV21" => Some(Self::Nv21),
            "NV12" => Some(Self::Nv12),
            "I420" | "YUV420P" => Some(Self::I420),
            "RGBA" | "RGBX" => Some(Self::Rgba),
            "GRAY8" | "GREY" | "Y8" => Some(Self::Gray8),
            _ => None,
        }
    }
}

impl std::fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Byte offsets needed to sample a planar 4:2:0 buffer
///
/// The U sample for chroma block `(cx, cy)` lives at
/// `u_offset + cy * chroma_stride + cx * chroma_step`, likewise for V.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct YuvPlanes {
    /// Y plane row stride in bytes
    pub y_stride: usize,
    /// Offset of the first U sample
    pub u_offset: usize,
    /// Offset of the first V sample
    pub v_offset: usize,
    /// Bytes per chroma row
    pub chroma_stride: usize,
    /// Distance between horizontally adjacent samples of one chroma channel
    pub chroma_step: usize,
}

/// Raw pixel memory plus the format and geometry needed to interpret it
#[derive(Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    pub width: u32,
    pub height: u32,
    /// Row stride of the first plane in bytes (may include padding)
    pub stride: u32,
    pub format: PixelFormat,
    pub data: Vec<u8>,
}

impl PixelBuffer {
    /// Create a buffer with tightly packed rows
    pub fn new(width: u32, height: u32, format: PixelFormat, data: Vec<u8>) -> Self {
        let stride = format.min_stride(width) as u32;
        Self::with_stride(width, height, stride, format, data)
    }

    /// Create a buffer whose rows are `stride` bytes apart
    pub fn with_stride(
        width: u32,
        height: u32,
        stride: u32,
        format: PixelFormat,
        data: Vec<u8>,
    ) -> Self {
        Self {
            width,
            height,
            stride,
            format,
            data,
        }
    }

    /// Byte length this buffer must have for its declared geometry
    pub fn expected_len(&self) -> usize {
        self.format.frame_size(self.stride as usize, self.height)
    }

    /// Check geometry and byte length against the declared format
    pub fn validate(&self) -> FrameResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(FrameError::UnsupportedFormat(format!(
                "zero-sized {} buffer ({}x{})",
                self.format, self.width, self.height
            )));
        }

        let stride = self.stride as usize;
        if stride < self.format.min_stride(self.width) {
            return Err(FrameError::UnsupportedFormat(format!(
                "{} stride {} is smaller than the minimum {} for width {}",
                self.format,
                stride,
                self.format.min_stride(self.width),
                self.width
            )));
        }

        if self.format.is_planar() && (self.width % 2 != 0 || self.height % 2 != 0) {
            return Err(FrameError::UnsupportedFormat(format!(
                "{} requires even dimensions, got {}x{}",
                self.format, self.width, self.height
            )));
        }

        if self.format == PixelFormat::I420 && stride % 2 != 0 {
            return Err(FrameError::UnsupportedFormat(format!(
                "I420 requires an even stride, got {}",
                stride
            )));
        }

        let expected = self.expected_len();
        if self.data.len() != expected {
            return Err(FrameError::BufferSizeMismatch {
                expected,
                actual: self.data.len(),
            });
        }

        Ok(())
    }

    /// Plane layout for planar formats
    ///
    /// Fails with `UnsupportedFormat` for interleaved buffers. Does not check
    /// the byte length; call [`validate`](Self::validate) first.
    pub fn yuv_planes(&self) -> FrameResult<YuvPlanes> {
        let stride = self.stride as usize;
        let chroma_base = stride * self.height as usize;

        match self.format {
            PixelFormat::Nv21 => Ok(YuvPlanes {
                y_stride: stride,
                u_offset: chroma_base + 1,
                v_offset: chroma_base,
                chroma_stride: stride,
                chroma_step: 2,
            }),
            PixelFormat::Nv12 => Ok(YuvPlanes {
                y_stride: stride,
                u_offset: chroma_base,
                v_offset: chroma_base + 1,
                chroma_stride: stride,
                chroma_step: 2,
            }),
            PixelFormat::I420 => {
                let chroma_stride = stride / 2;
                Ok(YuvPlanes {
                    y_stride: stride,
                    u_offset: chroma_base,
                    v_offset: chroma_base + chroma_stride * (self.height as usize / 2),
                    chroma_stride,
                    chroma_step: 1,
                })
            }
            PixelFormat::Rgba | PixelFormat::Gray8 => Err(FrameError::UnsupportedFormat(format!(
                "{} is not a planar luma/chroma format",
                self.format
            ))),
        }
    }
}

impl std::fmt::Debug for PixelBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PixelBuffer")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("stride", &self.stride)
            .field("format", &self.format)
            .field("data", &format_args!("{} bytes", self.data.len()))
            .finish()
    }
}

/// Callback handing a frame's byte region back to the frame source
pub type ReleaseHook = Box<dyn FnOnce(u64, Vec<u8>) + Send + 'static>;

/// A single sensor-native frame borrowed from a frame source
///
/// The frame owns its byte region only until it is dropped. Dropping it, or
/// calling [`release`](Self::release), runs the source's release hook with the
/// byte region exactly once. Since the hook runs from `Drop`, every exit path
/// (including errors and unwinding) hands the memory back.
pub struct CameraFrame {
    buffer: PixelBuffer,
    /// Source-assigned, monotonically increasing frame number
    pub sequence: u64,
    /// Timestamp when the frame was captured (for latency diagnostics)
    pub captured_at: Instant,
    release: Option<ReleaseHook>,
}

impl CameraFrame {
    /// Wrap a buffer without a release hook (tests, owned data)
    pub fn new(buffer: PixelBuffer, sequence: u64) -> Self {
        Self {
            buffer,
            sequence,
            captured_at: Instant::now(),
            release: None,
        }
    }

    /// Attach the hook that returns the byte region to its source
    pub fn with_release_hook<F>(mut self, hook: F) -> Self
    where
        F: FnOnce(u64, Vec<u8>) + Send + 'static,
    {
        self.release = Some(Box::new(hook));
        self
    }

    /// Read access to the pixel data
    pub fn buffer(&self) -> &PixelBuffer {
        &self.buffer
    }

    pub fn width(&self) -> u32 {
        self.buffer.width
    }

    pub fn height(&self) -> u32 {
        self.buffer.height
    }

    pub fn format(&self) -> PixelFormat {
        self.buffer.format
    }

    /// Give the byte region back to the source now
    pub fn release(self) {
        drop(self);
    }
}

impl Drop for CameraFrame {
    fn drop(&mut self) {
        if let Some(hook) = self.release.take() {
            let data = std::mem::take(&mut self.buffer.data);
            hook(self.sequence, data);
        }
    }
}

impl std::fmt::Debug for CameraFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CameraFrame")
            .field("sequence", &self.sequence)
            .field("buffer", &self.buffer)
            .field("has_release_hook", &self.release.is_some())
            .finish()
    }
}

/// Sensor rotation in degrees (clockwise)
///
/// Camera sensors may be physically mounted at various angles relative to the device.
/// This is common on mobile devices where sensors are rotated 90° or 270° relative
/// to the display orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SensorRotation {
    /// No rotation (sensor is oriented correctly)
    #[default]
    None,
    /// 90 degrees clockwise
    Rotate90,
    /// 180 degrees (upside down)
    Rotate180,
    /// 270 degrees clockwise (90 degrees counter-clockwise)
    Rotate270,
}

impl SensorRotation {
    /// Create rotation from an integer degree value (normalised to 0-360).
    ///
    /// Returns `None` for angles that are not a multiple of 90.
    pub fn from_degrees_int(degrees: i32) -> Option<Self> {
        match degrees.rem_euclid(360) {
            0 => Some(SensorRotation::None),
            90 => Some(SensorRotation::Rotate90),
            180 => Some(SensorRotation::Rotate180),
            270 => Some(SensorRotation::Rotate270),
            _ => None,
        }
    }

    /// Parse rotation from a string value (degrees)
    pub fn from_degrees(degrees: &str) -> Option<Self> {
        match degrees.trim() {
            "" => Some(SensorRotation::None),
            other => other.parse::<i32>().ok().and_then(Self::from_degrees_int),
        }
    }

    /// Get the rotation in degrees
    pub fn degrees(&self) -> u32 {
        match self {
            SensorRotation::None => 0,
            SensorRotation::Rotate90 => 90,
            SensorRotation::Rotate180 => 180,
            SensorRotation::Rotate270 => 270,
        }
    }

    /// Check if rotation swaps width and height
    pub fn swaps_dimensions(&self) -> bool {
        matches!(self, SensorRotation::Rotate90 | SensorRotation::Rotate270)
    }

    /// Rotation that undoes this one
    pub fn inverse(&self) -> Self {
        match self {
            SensorRotation::None => SensorRotation::None,
            SensorRotation::Rotate90 => SensorRotation::Rotate270,
            SensorRotation::Rotate180 => SensorRotation::Rotate180,
            SensorRotation::Rotate270 => SensorRotation::Rotate90,
        }
    }
}

impl std::fmt::Display for SensorRotation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}°", self.degrees())
    }
}
