// SPDX-License-Identifier: MPL-2.0

//! Camera frame source abstraction
//!
//! A source owns the sensor buffers. It lends each frame to the pipeline
//! together with a release hook and only reuses the buffer once the hook has
//! run. When every buffer is lent out, the source drops new frames itself.

pub mod frame_loop;
pub mod types;

pub use frame_loop::{FrameLoopController, LoopAction};
pub use types::*;

use crate::errors::AppResult;
use crate::pipelines::FrameSubmitter;

/// Something that produces camera frames on its own thread
pub trait FrameSource: Send {
    /// Begin delivering frames to `submitter`
    ///
    /// Fails if the source is already running or cannot start its thread.
    fn start(&mut self, submitter: FrameSubmitter) -> AppResult<()>;

    /// Stop delivering frames and join the capture thread
    ///
    /// Frames already handed out stay valid; their buffers return through
    /// the release hook whenever the consumer lets go of them.
    fn stop(&mut self);

    /// Check if the capture thread is running
    fn is_running(&self) -> bool;
}
