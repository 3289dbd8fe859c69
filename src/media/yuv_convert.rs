// SPDX-License-Identifier: GPL-3.0-only
//! CPU YUV ⇄ RGBA conversion for planar 4:2:0 camera frames
//!
//! Supported sensor layouts:
//! - NV21: Semi-planar 4:2:0, VU interleaved (mobile sensor default)
//! - NV12: Semi-planar 4:2:0, UV interleaved
//! - I420: Planar 4:2:0
//!
//! Decoding uses the BT.601 full-range matrix. Every 2x2 block of luma samples
//! shares one chroma pair. Output rasters are caller-owned so the analyzer can
//! reuse them from frame to frame.

use crate::backends::camera::types::{PixelBuffer, PixelFormat, YuvPlanes};
use crate::errors::{FrameError, FrameResult};
use image::{GrayImage, ImageBuffer, Pixel, RgbaImage};

/// Borrowed view of a frame's luma plane
///
/// This is the zero-copy path: consumers that only need brightness read the
/// Y plane in place instead of decoding the full colour frame.
#[derive(Debug, Clone, Copy)]
pub struct LumaView<'a> {
    data: &'a [u8],
    width: u32,
    height: u32,
    stride: usize,
}

impl<'a> LumaView<'a> {
    /// Borrow the luma plane of a planar buffer (or the only plane of `Gray8`)
    pub fn new(buffer: &'a PixelBuffer) -> FrameResult<Self> {
        if !(buffer.format.is_planar() || buffer.format == PixelFormat::Gray8) {
            return Err(FrameError::UnsupportedFormat(format!(
                "{} has no luma plane",
                buffer.format
            )));
        }
        buffer.validate()?;

        let stride = buffer.stride as usize;
        Ok(Self {
            data: &buffer.data[..stride * buffer.height as usize],
            width: buffer.width,
            height: buffer.height,
            stride,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Luma samples of one row, without stride padding
    pub fn row(&self, y: u32) -> &'a [u8] {
        let start = y as usize * self.stride;
        &self.data[start..start + self.width as usize]
    }

    /// Copy the plane into a single-channel raster
    pub fn copy_into_gray(&self, out: &mut GrayImage) {
        ensure_dimensions(out, self.width, self.height);
        let width = self.width as usize;
        let raw: &mut [u8] = &mut **out;

        for (y, dst) in raw.chunks_exact_mut(width).enumerate() {
            dst.copy_from_slice(self.row(y as u32));
        }
    }

    /// Expand the plane into an RGBA raster with R = G = B = Y
    pub fn expand_into_rgba(&self, out: &mut RgbaImage) {
        ensure_dimensions(out, self.width, self.height);
        let width = self.width as usize;
        let pixels: &mut [[u8; 4]] = bytemuck::cast_slice_mut(&mut **out);

        for (y, dst) in pixels.chunks_exact_mut(width).enumerate() {
            for (px, &luma) in dst.iter_mut().zip(self.row(y as u32)) {
                *px = [luma, luma, luma, 255];
            }
        }
    }
}

/// Decode a planar sensor frame into an interleaved RGBA raster
///
/// `out` is resized only when the frame geometry changed since the last call.
/// On error `out` is left untouched.
pub fn convert_to_rgba(input: &PixelBuffer, out: &mut RgbaImage) -> FrameResult<()> {
    if !input.format.is_planar() {
        return Err(FrameError::UnsupportedFormat(format!(
            "expected a planar YUV frame, got {}",
            input.format
        )));
    }
    input.validate()?;
    let planes = input.yuv_planes()?;

    ensure_dimensions(out, input.width, input.height);
    let width = input.width as usize;
    let data = input.data.as_slice();
    let pixels: &mut [[u8; 4]] = bytemuck::cast_slice_mut(&mut **out);

    for (y, dst) in pixels.chunks_exact_mut(width).enumerate() {
        let y_row = &data[y * planes.y_stride..][..width];
        let chroma_row = (y / 2) * planes.chroma_stride;

        for (x, px) in dst.iter_mut().enumerate() {
            let chroma = chroma_row + (x / 2) * planes.chroma_step;
            let u = data[planes.u_offset + chroma];
            let v = data[planes.v_offset + chroma];
            let [r, g, b] = yuv_to_rgb(y_row[x], u, v);
            *px = [r, g, b, 255];
        }
    }

    Ok(())
}

/// Encode an RGBA raster into a tightly packed planar frame
///
/// Chroma is the average of each 2x2 block. The raster must have even
/// dimensions. `out` is cleared and refilled so pooled buffers keep their
/// allocation.
pub fn encode_rgba(src: &RgbaImage, format: PixelFormat, out: &mut Vec<u8>) -> FrameResult<()> {
    if !format.is_planar() {
        return Err(FrameError::UnsupportedFormat(format!(
            "cannot encode into {}",
            format
        )));
    }

    let (width, height) = src.dimensions();
    if width == 0 || height == 0 || width % 2 != 0 || height % 2 != 0 {
        return Err(FrameError::UnsupportedFormat(format!(
            "{} encoding requires non-zero even dimensions, got {}x{}",
            format, width, height
        )));
    }

    let stride = format.min_stride(width);
    out.clear();
    out.resize(format.frame_size(stride, height), 0);

    let layout = PixelBuffer::new(width, height, format, Vec::new()).yuv_planes()?;
    write_planes(src, &layout, out);
    Ok(())
}

fn write_planes(src: &RgbaImage, planes: &YuvPlanes, out: &mut [u8]) {
    let (width, height) = src.dimensions();

    for (x, y, px) in src.enumerate_pixels() {
        let [r, g, b, _] = px.0;
        out[y as usize * planes.y_stride + x as usize] = to_u8(luma(r, g, b));
    }

    for cy in 0..height / 2 {
        for cx in 0..width / 2 {
            let mut sum_u = 0.0;
            let mut sum_v = 0.0;
            for (dx, dy) in [(0, 0), (1, 0), (0, 1), (1, 1)] {
                let [r, g, b, _] = src.get_pixel(cx * 2 + dx, cy * 2 + dy).0;
                let (_, u, v) = rgb_to_yuv(r, g, b);
                sum_u += u;
                sum_v += v;
            }

            let chroma = cy as usize * planes.chroma_stride + cx as usize * planes.chroma_step;
            out[planes.u_offset + chroma] = to_u8(sum_u / 4.0);
            out[planes.v_offset + chroma] = to_u8(sum_v / 4.0);
        }
    }
}

/// YUV to RGB conversion (BT.601 full range)
#[inline]
pub fn yuv_to_rgb(y: u8, u: u8, v: u8) -> [u8; 3] {
    let y = y as f32;
    let u = u as f32 - 128.0;
    let v = v as f32 - 128.0;

    let r = y + 1.402 * v;
    let g = y - 0.344_136 * u - 0.714_136 * v;
    let b = y + 1.772 * u;
    [to_u8(r), to_u8(g), to_u8(b)]
}

/// RGB to YUV conversion (BT.601 full range), unrounded
#[inline]
fn rgb_to_yuv(r: u8, g: u8, b: u8) -> (f32, f32, f32) {
    let y = luma(r, g, b);
    let (r, g, b) = (r as f32, g as f32, b as f32);
    let u = -0.168_736 * r - 0.331_264 * g + 0.5 * b + 128.0;
    let v = 0.5 * r - 0.418_688 * g - 0.081_312 * b + 128.0;
    (y, u, v)
}

#[inline]
fn luma(r: u8, g: u8, b: u8) -> f32 {
    0.299 * r as f32 + 0.587 * g as f32 + 0.114 * b as f32
}

/// Round and saturate to the 8-bit channel range
#[inline]
pub(crate) fn to_u8(value: f32) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}

/// Reallocate `img` only if its dimensions differ from the requested ones
pub(crate) fn ensure_dimensions<P>(img: &mut ImageBuffer<P, Vec<u8>>, width: u32, height: u32)
where
    P: Pixel<Subpixel = u8>,
{
    if img.dimensions() != (width, height) {
        *img = ImageBuffer::new(width, height);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn solid_nv21(width: u32, height: u32, y: u8, u: u8, v: u8) -> PixelBuffer {
        let luma = (width * height) as usize;
        let mut data = vec![y; luma];
        for _ in 0..luma / 4 {
            data.push(v);
            data.push(u);
        }
        PixelBuffer::new(width, height, PixelFormat::Nv21, data)
    }

    #[test]
    fn test_neutral_chroma_decodes_to_gray() {
        let input = solid_nv21(4, 2, 128, 128, 128);
        let mut out = RgbaImage::new(0, 0);
        convert_to_rgba(&input, &mut out).unwrap();

        assert_eq!(out.dimensions(), (4, 2));
        for px in out.pixels() {
            assert_eq!(*px, Rgba([128, 128, 128, 255]));
        }
    }

    #[test]
    fn test_nv21_reads_v_before_u() {
        // V = 255 pushes red up; U = 128 leaves blue at luma
        let input = solid_nv21(2, 2, 128, 128, 255);
        let mut out = RgbaImage::new(0, 0);
        convert_to_rgba(&input, &mut out).unwrap();

        let [r, _, b, _] = out.get_pixel(0, 0).0;
        assert_eq!(r, 255);
        assert_eq!(b, 128);
    }

    #[test]
    fn test_rgba_input_is_unsupported() {
        let input = PixelBuffer::new(2, 2, PixelFormat::Rgba, vec![0; 16]);
        let mut out = RgbaImage::new(1, 1);
        assert!(matches!(
            convert_to_rgba(&input, &mut out),
            Err(FrameError::UnsupportedFormat(_))
        ));
        // Untouched on failure
        assert_eq!(out.dimensions(), (1, 1));
    }

    #[test]
    fn test_truncated_buffer_fails_fast() {
        let mut input = solid_nv21(4, 4, 10, 128, 128);
        input.data.truncate(20);
        let mut out = RgbaImage::new(0, 0);
        assert_eq!(
            convert_to_rgba(&input, &mut out),
            Err(FrameError::BufferSizeMismatch {
                expected: 24,
                actual: 20
            })
        );
    }

    #[test]
    fn test_padded_stride_is_skipped() {
        // 2x2 NV12 with 4-byte rows: padding bytes must not leak into pixels
        let data = vec![
            50, 50, 255, 255, // Y row 0 + padding
            50, 50, 255, 255, // Y row 1 + padding
            128, 128, 255, 255, // UV row + padding
        ];
        let input = PixelBuffer::with_stride(2, 2, 4, PixelFormat::Nv12, data);
        let mut out = RgbaImage::new(0, 0);
        convert_to_rgba(&input, &mut out).unwrap();
        assert!(out.pixels().all(|px| *px == Rgba([50, 50, 50, 255])));
    }

    #[test]
    fn test_luma_view_expands_without_decoding_chroma() {
        let input = solid_nv21(4, 2, 77, 0, 255);
        let view = LumaView::new(&input).unwrap();

        let mut gray = GrayImage::new(0, 0);
        view.copy_into_gray(&mut gray);
        assert!(gray.pixels().all(|px| px.0 == [77]));

        let mut rgba = RgbaImage::new(0, 0);
        view.expand_into_rgba(&mut rgba);
        assert!(rgba.pixels().all(|px| px.0 == [77, 77, 77, 255]));
    }

    #[test]
    fn test_encode_then_decode_solid_colours() {
        for format in [PixelFormat::Nv21, PixelFormat::Nv12, PixelFormat::I420] {
            for colour in [[200u8, 30, 60], [10, 220, 90], [120, 120, 240]] {
                let src = RgbaImage::from_pixel(4, 4, Rgba([colour[0], colour[1], colour[2], 255]));
                let mut encoded = Vec::new();
                encode_rgba(&src, format, &mut encoded).unwrap();

                let buffer = PixelBuffer::new(4, 4, format, encoded);
                let mut decoded = RgbaImage::new(0, 0);
                convert_to_rgba(&buffer, &mut decoded).unwrap();

                for px in decoded.pixels() {
                    for c in 0..3 {
                        let diff = (px.0[c] as i16 - colour[c] as i16).abs();
                        assert!(diff <= 2, "{format}: channel {c} off by {diff}");
                    }
                }
            }
        }
    }

    #[test]
    fn test_scratch_is_reused_for_same_geometry() {
        let input = solid_nv21(4, 2, 128, 128, 128);
        let mut out = RgbaImage::new(4, 2);
        let before = out.as_raw().as_ptr();
        convert_to_rgba(&input, &mut out).unwrap();
        assert_eq!(before, out.as_raw().as_ptr());
    }
}
