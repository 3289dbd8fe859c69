// SPDX-License-Identifier: MPL-2.0

//! Frame analysis pipeline
//!
//! Frames from a source are decoded, filtered and turned upright on a single
//! worker thread. The preview never waits on analysis and analysis never
//! queues more than one frame.
//!
//! # Pipeline Architecture
//!
//! ```text
//! ┌──────────────┐     ┌───────────────────┐     ┌──────────────┐
//! │ Camera Frame │ ──▶ │ AnalysisPipeline  │ ──▶ │  ResultSink  │
//! │   (NV21)     │     │  - NV21→RGBA      │     │  (filtered + │
//! │              │     │  - Filter         │     │   reference) │
//! │              │     │  - Orientation    │     │              │
//! └──────────────┘     └───────────────────┘     └──────────────┘
//! ```
//!
//! # Design Principles
//!
//! 1. **Keep only latest**: A busy worker makes the source's frames replace each other
//! 2. **Release early**: Sensor buffers go back as soon as they are decoded
//! 3. **Single writer**: Scratch rasters belong to one analyzer on one thread
//!
//! # Modules
//!
//! - [`filters`]: Filter variants and their CPU implementations
//! - [`analyzer`]: Per-frame convert → filter → orient
//! - [`analysis`]: Worker thread, pending slot and result sinks

pub mod analysis;
pub mod analyzer;
pub mod filters;

pub use analysis::{AnalysisPipeline, FrameSubmitter, PipelineStats, ResultSink, channel_sink};
pub use analyzer::{AnalysisResult, AnalyzerSettings, FrameAnalyzer};
pub use filters::{Filter, FilterKind, FilterParams};
