// SPDX-License-Identifier: MPL-2.0

//! Colour conversion and geometric correction for camera frames
//!
//! # Color Space Conversion
//!
//! Camera sensors hand out planar YUV 4:2:0 (NV21, NV12 or I420), which must
//! be converted to RGBA before filtering and display. The [`yuv_convert`]
//! module decodes into caller-owned rasters and exposes the luma plane
//! directly for consumers that only need brightness.
//!
//! # Orientation
//!
//! Sensors are often mounted rotated relative to the display. The
//! [`orientation`] module rotates by right angles and mirrors, exactly.

pub mod orientation;
pub mod yuv_convert;

// Re-export commonly used types
pub use orientation::{Orientation, rotate};
pub use yuv_convert::{LumaView, convert_to_rgba, encode_rgba};
