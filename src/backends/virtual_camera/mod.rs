// SPDX-License-Identifier: GPL-3.0-only

//! Synthetic camera producing test-pattern frames
//!
//! Stands in for a real capture session. It behaves like one where it matters
//! to the pipeline:
//!
//! ```text
//! ┌──────────────────┐   lend    ┌──────────────────┐
//! │ Buffer pool (N)  │ ────────▶ │ CameraFrame      │ ──▶ FrameSubmitter
//! │                  │ ◀──────── │ (release hook)   │
//! └──────────────────┘  release  └──────────────────┘
//! ```
//!
//! - frames are sensor-native planar YUV (NV21 by default)
//! - a buffer is reused only after its frame has been released
//! - when every buffer is lent out, the frame is dropped at the source

use crate::backends::camera::FrameSource;
use crate::backends::camera::frame_loop::{FrameLoopController, LoopAction};
use crate::backends::camera::types::{CameraFrame, PixelBuffer, PixelFormat};
use crate::constants::{
    DEFAULT_BUFFER_POOL_SIZE, DEFAULT_FRAMERATE, DEFAULT_HEIGHT, DEFAULT_WIDTH, frame_interval,
};
use crate::errors::{AppError, AppResult};
use crate::media::yuv_convert::encode_rgba;
use crate::pipelines::FrameSubmitter;
use image::{Rgba, RgbaImage};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;
use tracing::{debug, info, trace, warn};

/// Synthetic camera settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyntheticCameraConfig {
    pub width: u32,
    pub height: u32,
    pub framerate: u32,
    /// Number of frame buffers that can be lent out at once
    pub pool_size: usize,
    /// Planar output format
    pub format: PixelFormat,
}

impl Default for SyntheticCameraConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            framerate: DEFAULT_FRAMERATE,
            pool_size: DEFAULT_BUFFER_POOL_SIZE,
            format: PixelFormat::Nv21,
        }
    }
}

/// Buffer pool counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SourceStats {
    /// Frames handed out
    pub produced: u64,
    /// Frames dropped because no buffer was free
    pub source_dropped: u64,
    /// Buffers returned through the release hook
    pub released: u64,
    /// Buffers currently lent out
    pub outstanding: usize,
}

struct Pool {
    free: Vec<Vec<u8>>,
    stats: SourceStats,
}

struct SourceShared {
    pool: Mutex<Pool>,
    renderer: Mutex<PatternRenderer>,
    next_sequence: AtomicU64,
    config: SyntheticCameraConfig,
}

impl SourceShared {
    fn pool(&self) -> MutexGuard<'_, Pool> {
        self.pool.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn give_back(&self, sequence: u64, data: Vec<u8>) {
        let mut pool = self.pool();
        pool.free.push(data);
        pool.stats.released += 1;
        pool.stats.outstanding = pool.stats.outstanding.saturating_sub(1);
        trace!(sequence, free = pool.free.len(), "Buffer returned to pool");
    }

    /// Take a free buffer and render the next frame into it
    fn capture(self: &Arc<Self>) -> Option<CameraFrame> {
        let mut data = {
            let mut pool = self.pool();
            match pool.free.pop() {
                Some(data) => {
                    pool.stats.outstanding += 1;
                    data
                }
                None => {
                    pool.stats.source_dropped += 1;
                    debug!(
                        dropped = pool.stats.source_dropped,
                        "No free buffer, dropping frame at source"
                    );
                    return None;
                }
            }
        };

        let sequence = self.next_sequence.fetch_add(1, Ordering::SeqCst);
        let rendered = self
            .renderer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .render(sequence, &mut data);

        if let Err(e) = rendered {
            warn!(sequence, error = %e, "Failed to render test pattern");
            let mut pool = self.pool();
            pool.free.push(data);
            pool.stats.outstanding = pool.stats.outstanding.saturating_sub(1);
            return None;
        }

        self.pool().stats.produced += 1;

        let config = &self.config;
        let buffer = PixelBuffer::new(config.width, config.height, config.format, data);
        let shared = Arc::clone(self);
        Some(
            CameraFrame::new(buffer, sequence)
                .with_release_hook(move |sequence, data| shared.give_back(sequence, data)),
        )
    }
}

/// Moving colour pattern encoded into the configured planar format
struct PatternRenderer {
    scratch: RgbaImage,
    format: PixelFormat,
}

impl PatternRenderer {
    fn new(config: &SyntheticCameraConfig) -> Self {
        Self {
            scratch: RgbaImage::new(config.width, config.height),
            format: config.format,
        }
    }

    fn render(&mut self, frame_index: u64, out: &mut Vec<u8>) -> AppResult<()> {
        let (width, height) = self.scratch.dimensions();
        let shift = (frame_index * 4) as u32;

        for (x, y, px) in self.scratch.enumerate_pixels_mut() {
            // Horizontal hue ramp scrolling right, vertical brightness ramp
            let band = (x * 6 / width.max(1) + shift / 64) % 6;
            let ramp = ((x * 255 / width.max(1) + shift) % 256) as u8;
            let level = (64 + y * 191 / height.max(1)) as u8;
            let [r, g, b] = match band {
                0 => [level, ramp, 0],
                1 => [ramp, level, 0],
                2 => [0, level, ramp],
                3 => [0, ramp, level],
                4 => [ramp, 0, level],
                _ => [level, 0, ramp],
            };
            *px = Rgba([r, g, b, 255]);
        }

        encode_rgba(&self.scratch, self.format, out)?;
        Ok(())
    }
}

/// Test-pattern camera with a fixed buffer pool
pub struct SyntheticCamera {
    shared: Arc<SourceShared>,
    capture_loop: Option<FrameLoopController>,
}

impl SyntheticCamera {
    /// Create the camera and allocate its buffer pool
    pub fn new(config: SyntheticCameraConfig) -> AppResult<Self> {
        if !config.format.is_planar() {
            return Err(AppError::Source(format!(
                "synthetic camera produces planar frames, not {}",
                config.format
            )));
        }
        if config.width == 0 || config.height == 0 || config.width % 2 != 0 || config.height % 2 != 0
        {
            return Err(AppError::Source(format!(
                "synthetic camera needs non-zero even dimensions, got {}x{}",
                config.width, config.height
            )));
        }
        if config.pool_size == 0 {
            return Err(AppError::Source("buffer pool must not be empty".into()));
        }

        let frame_size = config
            .format
            .frame_size(config.format.min_stride(config.width), config.height);
        let free = (0..config.pool_size).map(|_| vec![0u8; frame_size]).collect();

        info!(
            width = config.width,
            height = config.height,
            format = %config.format,
            pool_size = config.pool_size,
            "Created synthetic camera"
        );

        Ok(Self {
            shared: Arc::new(SourceShared {
                pool: Mutex::new(Pool {
                    free,
                    stats: SourceStats::default(),
                }),
                renderer: Mutex::new(PatternRenderer::new(&config)),
                next_sequence: AtomicU64::new(0),
                config,
            }),
            capture_loop: None,
        })
    }

    pub fn config(&self) -> &SyntheticCameraConfig {
        &self.shared.config
    }

    /// Produce one frame on the calling thread
    ///
    /// Returns `None` when every pool buffer is lent out; the drop is counted.
    pub fn capture_frame(&self) -> Option<CameraFrame> {
        self.shared.capture()
    }

    /// Snapshot of the pool counters
    pub fn stats(&self) -> SourceStats {
        self.shared.pool().stats
    }

    /// Buffers currently available for new frames
    pub fn free_buffers(&self) -> usize {
        self.shared.pool().free.len()
    }
}

impl FrameSource for SyntheticCamera {
    fn start(&mut self, submitter: FrameSubmitter) -> AppResult<()> {
        if self.capture_loop.is_some() {
            return Err(AppError::Source("synthetic camera already running".into()));
        }

        let shared = Arc::clone(&self.shared);
        let interval = frame_interval(shared.config.framerate);

        let controller = FrameLoopController::start("synthetic-capture", move || {
            let started = Instant::now();
            if let Some(frame) = shared.capture() {
                submitter.submit(frame);
            }
            if let Some(remaining) = interval.checked_sub(started.elapsed()) {
                std::thread::sleep(remaining);
            }
            LoopAction::Continue
        })
        .map_err(|e| AppError::Source(format!("Failed to spawn capture thread: {}", e)))?;

        self.capture_loop = Some(controller);
        Ok(())
    }

    fn stop(&mut self) {
        if let Some(mut controller) = self.capture_loop.take() {
            controller.stop();
            let stats = self.stats();
            info!(
                produced = stats.produced,
                source_dropped = stats.source_dropped,
                outstanding = stats.outstanding,
                "Synthetic camera stopped"
            );
        }
    }

    fn is_running(&self) -> bool {
        self.capture_loop
            .as_ref()
            .map(FrameLoopController::is_running)
            .unwrap_or(false)
    }
}

impl Drop for SyntheticCamera {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_camera(pool_size: usize) -> SyntheticCamera {
        SyntheticCamera::new(SyntheticCameraConfig {
            width: 8,
            height: 6,
            pool_size,
            ..SyntheticCameraConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn test_frames_are_valid_nv21() {
        let camera = small_camera(2);
        let frame = camera.capture_frame().unwrap();
        assert_eq!(frame.format(), PixelFormat::Nv21);
        assert!(frame.buffer().validate().is_ok());
        assert_eq!(frame.sequence, 0);
    }

    #[test]
    fn test_empty_pool_drops_at_source() {
        let camera = small_camera(2);
        let first = camera.capture_frame().unwrap();
        let second = camera.capture_frame().unwrap();
        assert!(camera.capture_frame().is_none());

        let stats = camera.stats();
        assert_eq!(stats.produced, 2);
        assert_eq!(stats.source_dropped, 1);
        assert_eq!(stats.outstanding, 2);

        drop(first);
        second.release();
        assert_eq!(camera.free_buffers(), 2);
        assert_eq!(camera.stats().released, 2);
        assert_eq!(camera.stats().outstanding, 0);
    }

    #[test]
    fn test_released_buffer_is_reused() {
        let camera = small_camera(1);
        let frame = camera.capture_frame().unwrap();
        let ptr = frame.buffer().data.as_ptr();
        frame.release();

        let again = camera.capture_frame().unwrap();
        assert_eq!(again.buffer().data.as_ptr(), ptr);
        assert_eq!(again.sequence, 1);
    }

    #[test]
    fn test_rejects_bad_geometry() {
        let odd = SyntheticCamera::new(SyntheticCameraConfig {
            width: 7,
            ..SyntheticCameraConfig::default()
        });
        assert!(matches!(odd, Err(AppError::Source(_))));

        let rgba = SyntheticCamera::new(SyntheticCameraConfig {
            format: PixelFormat::Rgba,
            ..SyntheticCameraConfig::default()
        });
        assert!(rgba.is_err());
    }
}
