// SPDX-License-Identifier: MPL-2.0

//! Frame source abstraction
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │              AnalysisPipeline                │
//! └────────────────────┬────────────────────────┘
//!                      │ FrameSubmitter
//! ┌────────────────────┴────────────────────────┐
//! │              Backend Layer                   │
//! │  ┌──────────────────────────────────────┐   │
//! │  │  FrameSource trait (camera)          │   │
//! │  └──────────────────────────────────────┘   │
//! │  ┌──────────────────────────────────────┐   │
//! │  │  SyntheticCamera (virtual_camera)    │   │
//! │  └──────────────────────────────────────┘   │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`camera`]: Frame types, the source trait and the capture thread helper
//! - [`virtual_camera`]: Test-pattern camera with a fixed buffer pool

pub mod camera;
pub mod virtual_camera;
