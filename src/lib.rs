// SPDX-License-Identifier: MPL-2.0

//! Camera Filter - real-time filtered camera preview
//!
//! This library turns sensor-native camera frames into filtered, upright RGBA
//! rasters fast enough for a live preview, without ever queueing more than
//! the most recent frame.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`backends`]: Frame types, the frame source trait and a synthetic camera
//! - [`media`]: YUV to RGBA conversion and orientation correction
//! - [`pipelines`]: Filters, the per-frame analyzer and the analysis pipeline
//! - [`config`]: User configuration handling
//! - [`terminal`]: Side-by-side terminal preview
//!
//! # Example
//!
//! ```ignore
//! let (sink, receiver) = channel_sink(1);
//! let pipeline = AnalysisPipeline::new(AnalyzerSettings::default(), sink)?;
//! let mut camera = SyntheticCamera::new(SyntheticCameraConfig::default())?;
//! camera.start(pipeline.submitter())?;
//! pipeline.set_filter(FilterKind::Sepia);
//! ```

pub mod backends;
pub mod config;
pub mod constants;
pub mod errors;
pub mod media;
pub mod pipelines;
pub mod terminal;

// Re-export commonly used types
pub use backends::camera::{CameraFrame, FrameSource, PixelBuffer, PixelFormat, SensorRotation};
pub use backends::virtual_camera::{SourceStats, SyntheticCamera, SyntheticCameraConfig};
pub use config::Config;
pub use constants::CapturePreset;
pub use errors::{AppError, AppResult, FrameError, FrameResult};
pub use media::Orientation;
pub use pipelines::{
    AnalysisPipeline, AnalysisResult, AnalyzerSettings, FilterKind, FrameSubmitter,
    PipelineStats, ResultSink, channel_sink,
};
