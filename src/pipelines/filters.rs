// SPDX-License-Identifier: MPL-2.0

//! CPU filter implementations for analyzed frames
//!
//! Every filter maps an RGBA raster to an RGBA raster of the same size. The
//! set is closed: [`FilterKind`] names the variants the user can pick and
//! [`Filter`] carries the tuning each variant needs.

use crate::constants::filter::{
    DEFAULT_SEPIA_TINT_WEIGHT, DEFAULT_VIGNETTE_STRENGTH, DEFAULT_VINTAGE_FADE,
    LUMA_WEIGHTS_FIXED, SEPIA_MATRIX, SEPIA_TINT, VIGNETTE_INNER_RADIUS, VIGNETTE_OUTER_RADIUS,
};
use crate::media::yuv_convert::{ensure_dimensions, to_u8};
use image::RgbaImage;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Filters selectable from the filter strip
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterKind {
    /// No filter applied (displays as "Normal")
    #[default]
    Identity,
    /// Black & white using Rec.601 luma
    Grayscale,
    /// Sepia tone (warm brownish tint)
    Sepia,
    /// Sepia with faded tones and darkened corners
    Vintage,
}

impl FilterKind {
    /// All filters in strip order
    pub const ALL: [FilterKind; 4] = [
        FilterKind::Identity,
        FilterKind::Grayscale,
        FilterKind::Sepia,
        FilterKind::Vintage,
    ];

    /// Label shown under the filter bubble
    pub fn label(&self) -> &'static str {
        match self {
            FilterKind::Identity => "Normal",
            FilterKind::Grayscale => "Gray",
            FilterKind::Sepia => "Sepia",
            FilterKind::Vintage => "Vintage",
        }
    }

    /// Identifier used in configuration files and on the command line
    pub fn name(&self) -> &'static str {
        match self {
            FilterKind::Identity => "identity",
            FilterKind::Grayscale => "grayscale",
            FilterKind::Sepia => "sepia",
            FilterKind::Vintage => "vintage",
        }
    }

    fn index(&self) -> usize {
        Self::ALL.iter().position(|k| k == self).unwrap_or(0)
    }

    /// Next filter in strip order, wrapping around
    pub fn next(&self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    /// Previous filter in strip order, wrapping around
    pub fn previous(&self) -> Self {
        Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

impl std::fmt::Display for FilterKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for FilterKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "identity" | "normal" | "none" | "original" => Ok(FilterKind::Identity),
            "grayscale" | "gray" | "grey" | "mono" => Ok(FilterKind::Grayscale),
            "sepia" => Ok(FilterKind::Sepia),
            "vintage" => Ok(FilterKind::Vintage),
            other => Err(format!(
                "unknown filter '{}' (expected one of: identity, grayscale, sepia, vintage)",
                other
            )),
        }
    }
}

/// Tuning shared by the filters that need it
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterParams {
    /// Weight of the warm tint blended over sepia output (0.0..=1.0)
    pub sepia_tint_weight: f32,
    /// Vintage fade amount (0.0..=0.5)
    pub vintage_fade: f32,
    /// Vintage vignette strength (0.0..=1.0)
    pub vignette_strength: f32,
}

impl Default for FilterParams {
    fn default() -> Self {
        Self {
            sepia_tint_weight: DEFAULT_SEPIA_TINT_WEIGHT,
            vintage_fade: DEFAULT_VINTAGE_FADE,
            vignette_strength: DEFAULT_VIGNETTE_STRENGTH,
        }
    }
}

/// A configured filter, ready to apply
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Filter {
    Identity,
    Grayscale,
    Sepia {
        tint_weight: f32,
    },
    Vintage {
        tint_weight: f32,
        fade: f32,
        vignette_strength: f32,
    },
}

impl Filter {
    pub fn new(kind: FilterKind, params: &FilterParams) -> Self {
        match kind {
            FilterKind::Identity => Filter::Identity,
            FilterKind::Grayscale => Filter::Grayscale,
            FilterKind::Sepia => Filter::Sepia {
                tint_weight: params.sepia_tint_weight,
            },
            FilterKind::Vintage => Filter::Vintage {
                tint_weight: params.sepia_tint_weight,
                fade: params.vintage_fade,
                vignette_strength: params.vignette_strength,
            },
        }
    }

    pub fn kind(&self) -> FilterKind {
        match self {
            Filter::Identity => FilterKind::Identity,
            Filter::Grayscale => FilterKind::Grayscale,
            Filter::Sepia { .. } => FilterKind::Sepia,
            Filter::Vintage { .. } => FilterKind::Vintage,
        }
    }

    /// Apply the filter, returning `(filtered, reference)`
    ///
    /// The reference raster is the unfiltered source, kept for side-by-side
    /// comparison in the preview.
    pub fn apply(&self, src: &RgbaImage) -> (RgbaImage, RgbaImage) {
        let mut filtered = RgbaImage::new(0, 0);
        self.apply_into(src, &mut filtered);
        (filtered, src.clone())
    }

    /// Filter `src` into `dst`, reallocating `dst` only on a size change
    pub fn apply_into(&self, src: &RgbaImage, dst: &mut RgbaImage) {
        let (width, height) = src.dimensions();
        ensure_dimensions(dst, width, height);

        let input: &[[u8; 4]] = bytemuck::cast_slice(src.as_raw());
        let output: &mut [[u8; 4]] = bytemuck::cast_slice_mut(&mut **dst);

        match *self {
            Filter::Identity => output.copy_from_slice(input),
            Filter::Grayscale => {
                for (out, px) in output.iter_mut().zip(input) {
                    *out = grayscale_pixel(*px);
                }
            }
            Filter::Sepia { tint_weight } => {
                for (out, px) in output.iter_mut().zip(input) {
                    *out = sepia_pixel(*px, tint_weight);
                }
            }
            Filter::Vintage {
                tint_weight,
                fade,
                vignette_strength,
            } => {
                let vignette = Vignette::new(width, height, vignette_strength);
                for (i, (out, px)) in output.iter_mut().zip(input).enumerate() {
                    let x = i as u32 % width;
                    let y = i as u32 / width;
                    *out = vintage_pixel(*px, tint_weight, fade, vignette.factor(x, y));
                }
            }
        }
    }
}

/// Rec.601 luma in 8-bit fixed point, written to all three colour channels
///
/// The weights sum to 256, so a pixel that is already gray maps to itself.
#[inline]
pub fn grayscale_pixel([r, g, b, a]: [u8; 4]) -> [u8; 4] {
    let [wr, wg, wb] = LUMA_WEIGHTS_FIXED;
    let luma = ((wr * r as u32 + wg * g as u32 + wb * b as u32 + 128) >> 8) as u8;
    [luma, luma, luma, a]
}

/// Sepia matrix on normalized channels, optionally blended with the warm tint
///
/// Every result saturates at 255; bright inputs exceed 1.0 before scaling.
#[inline]
pub fn sepia_pixel(px: [u8; 4], tint_weight: f32) -> [u8; 4] {
    let [r, g, b] = sepia_normalized(px);
    let blend = |value: f32, tint: u8| -> u8 {
        let scaled = value * 255.0;
        to_u8(scaled * (1.0 - tint_weight) + tint as f32 * tint_weight)
    };

    [
        blend(r, SEPIA_TINT[0]),
        blend(g, SEPIA_TINT[1]),
        blend(b, SEPIA_TINT[2]),
        px[3],
    ]
}

#[inline]
fn sepia_normalized([r, g, b, _]: [u8; 4]) -> [f32; 3] {
    let rgb = [r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0];
    SEPIA_MATRIX.map(|row| row[0] * rgb[0] + row[1] * rgb[1] + row[2] * rgb[2])
}

#[inline]
fn vintage_pixel(px: [u8; 4], tint_weight: f32, fade: f32, vignette: f32) -> [u8; 4] {
    let [r, g, b, a] = sepia_pixel(px, tint_weight);
    let mut rgb = [r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0];

    // Lift the blacks toward a light gray
    for c in rgb.iter_mut() {
        *c = *c * (1.0 - fade) + fade * 0.66;
    }

    // Mute saturation toward luma
    let luma = 0.299 * rgb[0] + 0.587 * rgb[1] + 0.114 * rgb[2];
    let saturation = (1.0 - 2.0 * fade).max(0.0);
    for c in rgb.iter_mut() {
        *c = (luma + (*c - luma) * saturation) * vignette;
    }

    [
        to_u8(rgb[0] * 255.0),
        to_u8(rgb[1] * 255.0),
        to_u8(rgb[2] * 255.0),
        a,
    ]
}

/// Radial darkening from the raster centre
struct Vignette {
    width: f32,
    height: f32,
    strength: f32,
}

impl Vignette {
    fn new(width: u32, height: u32, strength: f32) -> Self {
        Self {
            width: width as f32,
            height: height as f32,
            strength,
        }
    }

    /// Brightness multiplier for pixel `(x, y)`, 1.0 inside the inner radius
    fn factor(&self, x: u32, y: u32) -> f32 {
        // Normalized 0-1 coordinates of the pixel centre
        let dx = (x as f32 + 0.5) / self.width - 0.5;
        let dy = (y as f32 + 0.5) / self.height - 0.5;
        let dist = (dx * dx + dy * dy).sqrt();
        1.0 - self.strength * smoothstep(VIGNETTE_INNER_RADIUS, VIGNETTE_OUTER_RADIUS, dist)
    }
}

/// Smoothstep function for vignette
#[inline]
fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn gradient(width: u32, height: u32) -> RgbaImage {
        RgbaImage::from_fn(width, height, |x, y| {
            Rgba([(x * 37 % 256) as u8, (y * 53 % 256) as u8, ((x + y) * 19 % 256) as u8, 255])
        })
    }

    #[test]
    fn test_identity_is_pixel_identical() {
        let src = gradient(7, 5);
        let (filtered, reference) = Filter::Identity.apply(&src);
        assert_eq!(filtered, src);
        assert_eq!(reference, src);
    }

    #[test]
    fn test_grayscale_weights() {
        assert_eq!(grayscale_pixel([255, 0, 0, 255]), [77, 77, 77, 255]);
        assert_eq!(grayscale_pixel([0, 255, 0, 9]), [149, 149, 149, 9]);
        assert_eq!(grayscale_pixel([255, 255, 255, 255]), [255, 255, 255, 255]);
    }

    #[test]
    fn test_grayscale_is_idempotent() {
        let once = Filter::Grayscale.apply(&gradient(16, 9)).0;
        let twice = Filter::Grayscale.apply(&once).0;
        assert_eq!(once, twice);
    }

    #[test]
    fn test_sepia_red_matches_matrix() {
        assert_eq!(sepia_pixel([255, 0, 0, 255], 0.0), [100, 89, 69, 255]);
    }

    #[test]
    fn test_sepia_saturates_white() {
        // Row sums exceed 1.0 for R' and G'; they must clamp, not wrap
        assert_eq!(sepia_pixel([255, 255, 255, 255], 0.0), [255, 255, 239, 255]);
    }

    #[test]
    fn test_sepia_full_tint_weight_is_tint() {
        let [r, g, b, _] = sepia_pixel([12, 34, 56, 255], 1.0);
        assert_eq!([r, g, b], SEPIA_TINT);
    }

    #[test]
    fn test_vintage_differs_from_sepia_and_grayscale() {
        let src = gradient(32, 32);
        let params = FilterParams::default();
        let vintage = Filter::new(FilterKind::Vintage, &params).apply(&src).0;
        let sepia = Filter::new(FilterKind::Sepia, &params).apply(&src).0;
        let gray = Filter::Grayscale.apply(&src).0;

        assert_ne!(vintage, sepia);
        assert_ne!(vintage, gray);
    }

    #[test]
    fn test_vintage_darkens_corners() {
        let src = RgbaImage::from_pixel(64, 64, Rgba([200, 200, 200, 255]));
        let out = Filter::new(FilterKind::Vintage, &FilterParams::default())
            .apply(&src)
            .0;
        let centre = out.get_pixel(32, 32).0[0];
        let corner = out.get_pixel(0, 0).0[0];
        assert!(corner < centre, "corner {corner} should be darker than centre {centre}");
    }

    #[test]
    fn test_filter_kind_cycle_and_parse() {
        assert_eq!(FilterKind::Vintage.next(), FilterKind::Identity);
        assert_eq!(FilterKind::Identity.previous(), FilterKind::Vintage);
        assert_eq!("Gray".parse::<FilterKind>(), Ok(FilterKind::Grayscale));
        assert_eq!("normal".parse::<FilterKind>(), Ok(FilterKind::Identity));
        assert!("emboss".parse::<FilterKind>().is_err());
        for kind in FilterKind::ALL {
            assert_eq!(kind.name().parse::<FilterKind>(), Ok(kind));
            assert_eq!(Filter::new(kind, &FilterParams::default()).kind(), kind);
        }
    }
}
