// SPDX-License-Identifier: GPL-3.0-only

//! Application-wide constants

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Capture resolution presets for the frame source
///
/// Analysis cost grows with the pixel count, so the preview favours modest
/// sensor modes over full-resolution ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CapturePreset {
    /// 320x240 - cheapest analysis, blocky preview
    Low,
    /// 640x480 - balanced preview quality and latency (default)
    #[default]
    Medium,
    /// 1280x720 - sharpest preview, may shed frames on slow machines
    High,
}

impl CapturePreset {
    /// Get all preset variants for iteration
    pub const ALL: [CapturePreset; 3] = [
        CapturePreset::Low,
        CapturePreset::Medium,
        CapturePreset::High,
    ];

    /// Get display name for the preset
    pub fn display_name(&self) -> &'static str {
        match self {
            CapturePreset::Low => "Low",
            CapturePreset::Medium => "Medium",
            CapturePreset::High => "High",
        }
    }

    /// Sensor-native (landscape) resolution for this preset
    pub fn resolution(&self) -> (u32, u32) {
        match self {
            CapturePreset::Low => (320, 240),
            CapturePreset::Medium => (640, 480),
            CapturePreset::High => (1280, 720),
        }
    }
}

impl std::str::FromStr for CapturePreset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|preset| preset.display_name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown preset '{}' (expected low, medium or high)", s))
    }
}

/// Default capture width in pixels (sensor orientation)
pub const DEFAULT_WIDTH: u32 = 640;

/// Default capture height in pixels (sensor orientation)
pub const DEFAULT_HEIGHT: u32 = 480;

/// Default capture framerate
pub const DEFAULT_FRAMERATE: u32 = 30;

/// Clockwise mount offset of the sensor relative to the display, in degrees
pub const DEFAULT_SENSOR_ROTATION: u32 = 90;

/// Number of frame buffers the synthetic camera cycles through
pub const DEFAULT_BUFFER_POOL_SIZE: usize = 3;

/// Results buffered between the analysis worker and the display thread
pub const RESULT_CHANNEL_CAPACITY: usize = 1;

/// Filter tuning constants
pub mod filter {
    /// Sepia matrix rows (R', G', B') applied to normalized (R, G, B)
    pub const SEPIA_MATRIX: [[f32; 3]; 3] = [
        [0.393, 0.769, 0.189],
        [0.349, 0.686, 0.168],
        [0.272, 0.534, 0.131],
    ];

    /// Warm tint optionally blended over the sepia result (R, G, B)
    pub const SEPIA_TINT: [u8; 3] = [255, 204, 153];

    /// Default sepia tint blend weight (0.0 = pure matrix output)
    pub const DEFAULT_SEPIA_TINT_WEIGHT: f32 = 0.0;

    /// Rec.601 luma weights in 8-bit fixed point; they sum to 256
    pub const LUMA_WEIGHTS_FIXED: [u32; 3] = [77, 150, 29];

    /// Default vintage fade amount (0.0 = none, 1.0 = fully washed out)
    pub const DEFAULT_VINTAGE_FADE: f32 = 0.15;

    /// Default vintage vignette strength (0.0 = none, 1.0 = black corners)
    pub const DEFAULT_VIGNETTE_STRENGTH: f32 = 0.8;

    /// Normalized distance from centre where the vignette starts
    pub const VIGNETTE_INNER_RADIUS: f32 = 0.3;

    /// Normalized distance from centre where the vignette reaches full strength
    pub const VIGNETTE_OUTER_RADIUS: f32 = 0.9;
}

/// Timing constants
pub mod timing {
    use super::Duration;

    /// Terminal input poll interval (also bounds the preview redraw rate)
    pub const TERMINAL_POLL_INTERVAL: Duration = Duration::from_millis(16);

    /// Interval between progress lines in headless mode
    pub const HEADLESS_REPORT_INTERVAL: Duration = Duration::from_millis(500);
}

/// Application information utilities
pub mod app_info {
    /// Get the application version from build-time environment
    pub fn version() -> &'static str {
        env!("GIT_VERSION")
    }
}

/// Frame interval for a framerate, clamped to at least 1 fps
pub fn frame_interval(framerate: u32) -> Duration {
    Duration::from_secs_f64(1.0 / framerate.max(1) as f64)
}
