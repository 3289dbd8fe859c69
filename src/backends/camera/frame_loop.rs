// SPDX-License-Identifier: GPL-3.0-only
//! Thread lifecycle management for frame loops
//!
//! Both the capture thread of a frame source and the analysis worker are
//! "call this closure until told to stop" threads. This module gives them a
//! common controller so start, stop and join behave the same everywhere.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use tracing::{debug, info, warn};

/// Action returned by the loop callback to control loop behavior
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopAction {
    /// Continue running the loop
    Continue,
    /// Stop the loop gracefully
    Stop,
}

/// Controller for a frame loop running in a separate named thread
///
/// # Example
///
/// ```ignore
/// let controller = FrameLoopController::start("synthetic-capture", move || {
///     produce_frame();
///     LoopAction::Continue
/// })?;
///
/// // Later, stop the loop and wait for the thread
/// controller.stop();
/// ```
pub struct FrameLoopController {
    /// Thread handle for joining
    thread_handle: Option<JoinHandle<()>>,
    /// Signal to stop the loop
    stop_signal: Arc<AtomicBool>,
    /// Name for logging (also used as the thread name)
    name: String,
}

impl FrameLoopController {
    /// Start a new loop in a separate thread
    ///
    /// The closure is called repeatedly until it returns `LoopAction::Stop`
    /// or the controller's `stop()` method is called.
    pub fn start<F>(name: &str, mut loop_fn: F) -> std::io::Result<Self>
    where
        F: FnMut() -> LoopAction + Send + 'static,
    {
        Self::start_with_init(name, || Ok(()), move |_: &mut ()| loop_fn())
    }

    /// Start a loop with initialization
    ///
    /// The `init_fn` is called once on the new thread to set up state owned
    /// by that thread. If initialization fails, the thread exits immediately.
    pub fn start_with_init<S, I, F>(name: &str, init_fn: I, mut loop_fn: F) -> std::io::Result<Self>
    where
        S: 'static,
        I: FnOnce() -> Result<S, String> + Send + 'static,
        F: FnMut(&mut S) -> LoopAction + Send + 'static,
    {
        let stop_signal = Arc::new(AtomicBool::new(false));
        let stop_signal_clone = Arc::clone(&stop_signal);
        let name_clone = name.to_string();

        info!(name = %name, "Starting frame loop");

        let thread_handle = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || {
                debug!(name = %name_clone, "Frame loop thread started, initializing...");

                let mut state = match init_fn() {
                    Ok(s) => s,
                    Err(e) => {
                        warn!(name = %name_clone, error = %e, "Initialization failed");
                        return;
                    }
                };

                loop {
                    if stop_signal_clone.load(Ordering::SeqCst) {
                        debug!(name = %name_clone, "Stop signal received");
                        break;
                    }

                    match loop_fn(&mut state) {
                        LoopAction::Continue => {}
                        LoopAction::Stop => {
                            debug!(name = %name_clone, "Loop requested stop");
                            break;
                        }
                    }
                }

                info!(name = %name_clone, "Frame loop thread exiting");
            })?;

        Ok(Self {
            thread_handle: Some(thread_handle),
            stop_signal,
            name: name.to_string(),
        })
    }

    /// Check if the loop is still running
    pub fn is_running(&self) -> bool {
        self.thread_handle
            .as_ref()
            .map(|h| !h.is_finished())
            .unwrap_or(false)
    }

    /// Signal the loop to stop (non-blocking)
    ///
    /// The flag is checked between iterations; a loop blocked inside its
    /// closure must be woken by its owner.
    pub fn request_stop(&self) {
        debug!(name = %self.name, "Requesting frame loop stop");
        self.stop_signal.store(true, Ordering::SeqCst);
    }

    /// Stop the loop and wait for the thread to finish
    pub fn stop(&mut self) {
        self.request_stop();
        self.join();
    }

    /// Wait for the thread to finish without sending stop signal
    pub fn join(&mut self) {
        if let Some(handle) = self.thread_handle.take() {
            debug!(name = %self.name, "Waiting for frame loop thread to finish");
            if let Err(e) = handle.join() {
                warn!(name = %self.name, "Frame loop thread panicked: {:?}", e);
            } else {
                debug!(name = %self.name, "Frame loop thread finished");
            }
        }
    }
}

impl Drop for FrameLoopController {
    fn drop(&mut self) {
        if self.thread_handle.is_some() {
            debug!(name = %self.name, "FrameLoopController dropped, stopping loop");
            self.stop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use std::time::Duration;

    const TIMEOUT: Duration = Duration::from_secs(5);

    #[test]
    fn test_init_state_survives_between_iterations() {
        let (done_tx, done_rx) = mpsc::channel();

        // Mirrors the analysis worker: state built on the thread, reused per frame
        let mut controller = FrameLoopController::start_with_init(
            "sequence-collector",
            || Ok(Vec::<u64>::with_capacity(4)),
            move |seen: &mut Vec<u64>| {
                seen.push(seen.len() as u64);
                if seen.len() < 4 {
                    return LoopAction::Continue;
                }
                let _ = done_tx.send(seen.clone());
                LoopAction::Stop
            },
        )
        .unwrap();

        assert_eq!(done_rx.recv_timeout(TIMEOUT).unwrap(), vec![0, 1, 2, 3]);
        controller.join();
        assert!(!controller.is_running());
    }

    #[test]
    fn test_blocked_loop_exits_once_woken_after_stop_request() {
        let (wake_tx, wake_rx) = mpsc::channel::<()>();
        let (tick_tx, tick_rx) = mpsc::channel();

        let mut controller = FrameLoopController::start("parked-worker", move || {
            let _ = tick_tx.send(());
            match wake_rx.recv_timeout(TIMEOUT) {
                Ok(()) => LoopAction::Continue,
                Err(_) => LoopAction::Stop,
            }
        })
        .unwrap();

        tick_rx.recv_timeout(TIMEOUT).unwrap();
        controller.request_stop();
        assert!(controller.is_running());

        wake_tx.send(()).unwrap();
        controller.join();
        assert!(!controller.is_running());
        // The flag was seen before a second iteration could start
        assert!(tick_rx.try_recv().is_err());
    }

    #[test]
    fn test_drop_stops_free_running_loop() {
        let (tick_tx, tick_rx) = mpsc::channel();

        let controller = FrameLoopController::start("free-running", move || {
            if tick_tx.send(()).is_err() {
                return LoopAction::Stop;
            }
            thread::sleep(Duration::from_millis(1));
            LoopAction::Continue
        })
        .unwrap();

        tick_rx.recv_timeout(TIMEOUT).unwrap();
        drop(controller);

        // The closure and its sender are gone once the thread is joined
        while tick_rx.try_recv().is_ok() {}
        assert_eq!(tick_rx.try_recv(), Err(mpsc::TryRecvError::Disconnected));
    }

    #[test]
    fn test_failed_init_skips_loop_and_drops_closure() {
        let (tick_tx, tick_rx) = mpsc::channel::<()>();

        let mut controller = FrameLoopController::start_with_init(
            "no-device",
            || Err::<(), _>("no buffers".to_string()),
            move |_: &mut ()| {
                let _ = tick_tx.send(());
                LoopAction::Continue
            },
        )
        .unwrap();

        controller.join();
        assert_eq!(tick_rx.try_recv(), Err(mpsc::TryRecvError::Disconnected));
    }
}
