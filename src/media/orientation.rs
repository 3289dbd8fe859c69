// SPDX-License-Identifier: GPL-3.0-only
//! Right-angle rotation and mirroring of rasters
//!
//! Sensors are usually mounted rotated relative to the display, so every
//! analyzed frame is turned upright before it is published. Each output pixel
//! is fetched from its source coordinate under the inverse transform; there
//! is no resampling, so the transform is exact and reversible.

use crate::backends::camera::types::SensorRotation;
use crate::media::yuv_convert::ensure_dimensions;
use image::{ImageBuffer, Pixel};

/// Geometric correction applied to analyzed frames
///
/// The rotation is applied first, then the optional horizontal flip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Orientation {
    /// Clockwise rotation from sensor to display
    pub rotation: SensorRotation,
    /// Mirror horizontally after rotating (front-facing cameras)
    pub mirror: bool,
}

impl Orientation {
    pub fn new(rotation: SensorRotation, mirror: bool) -> Self {
        Self { rotation, mirror }
    }

    /// Whether applying this orientation leaves rasters unchanged
    pub fn is_identity(&self) -> bool {
        self.rotation == SensorRotation::None && !self.mirror
    }

    /// Transform that undoes this one
    ///
    /// A flip after a rotation equals the opposite rotation after a flip, so a
    /// mirrored orientation is its own inverse.
    pub fn inverse(&self) -> Self {
        if self.mirror {
            *self
        } else {
            Self::new(self.rotation.inverse(), false)
        }
    }

    /// Output dimensions for a `width` x `height` input
    pub fn output_dimensions(&self, width: u32, height: u32) -> (u32, u32) {
        if self.rotation.swaps_dimensions() {
            (height, width)
        } else {
            (width, height)
        }
    }

    /// Source pixel that lands on output pixel `(ox, oy)`
    fn source_coordinate(&self, ox: u32, oy: u32, width: u32, height: u32) -> (u32, u32) {
        let (out_w, _) = self.output_dimensions(width, height);
        let ox = if self.mirror { out_w - 1 - ox } else { ox };

        match self.rotation {
            SensorRotation::None => (ox, oy),
            SensorRotation::Rotate90 => (oy, height - 1 - ox),
            SensorRotation::Rotate180 => (width - 1 - ox, height - 1 - oy),
            SensorRotation::Rotate270 => (width - 1 - oy, ox),
        }
    }

    /// Write the transformed `src` into `dst`, resizing `dst` if needed
    pub fn apply_into<P>(&self, src: &ImageBuffer<P, Vec<u8>>, dst: &mut ImageBuffer<P, Vec<u8>>)
    where
        P: Pixel<Subpixel = u8>,
    {
        let (width, height) = src.dimensions();
        let (out_w, out_h) = self.output_dimensions(width, height);
        ensure_dimensions(dst, out_w, out_h);

        if self.is_identity() {
            dst.copy_from_slice(src.as_raw());
            return;
        }

        let channels = P::CHANNEL_COUNT as usize;
        let src_raw = src.as_raw();
        let dst_raw: &mut [u8] = &mut **dst;

        for oy in 0..out_h {
            for ox in 0..out_w {
                let (sx, sy) = self.source_coordinate(ox, oy, width, height);
                let s = (sy as usize * width as usize + sx as usize) * channels;
                let d = (oy as usize * out_w as usize + ox as usize) * channels;
                dst_raw[d..d + channels].copy_from_slice(&src_raw[s..s + channels]);
            }
        }
    }

    /// Allocating variant of [`apply_into`](Self::apply_into)
    pub fn apply<P>(&self, src: &ImageBuffer<P, Vec<u8>>) -> ImageBuffer<P, Vec<u8>>
    where
        P: Pixel<Subpixel = u8>,
    {
        let mut dst = ImageBuffer::new(0, 0);
        self.apply_into(src, &mut dst);
        dst
    }
}

/// Rotate a raster clockwise by a right angle
pub fn rotate<P>(src: &ImageBuffer<P, Vec<u8>>, rotation: SensorRotation) -> ImageBuffer<P, Vec<u8>>
where
    P: Pixel<Subpixel = u8>,
{
    Orientation::new(rotation, false).apply(src)
}
