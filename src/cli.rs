// SPDX-License-Identifier: GPL-3.0-only

//! CLI commands that run without the terminal preview
//!
//! This module provides command-line functionality for:
//! - Running the pipeline headless and reporting statistics
//! - Listing the available filters

use camera_filter::constants::timing;
use camera_filter::{
    AnalysisPipeline, AnalysisResult, Config, FilterKind, FrameSource, ResultSink, SyntheticCamera,
};
use std::io::Write;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Feed synthetic frames through the pipeline for `seconds` and print statistics
pub fn run_headless(config: &Config, seconds: u64) -> Result<(), Box<dyn std::error::Error>> {
    let received = Arc::new(AtomicU64::new(0));
    let latency_us = Arc::new(AtomicU64::new(0));

    let sink: ResultSink = {
        let received = Arc::clone(&received);
        let latency_us = Arc::clone(&latency_us);
        Box::new(move |result: AnalysisResult| {
            received.fetch_add(1, Ordering::Relaxed);
            latency_us.fetch_add(result.captured_at.elapsed().as_micros() as u64, Ordering::Relaxed);
        })
    };

    let mut pipeline = AnalysisPipeline::new(config.analyzer_settings()?, sink)?;
    let mut camera = SyntheticCamera::new(config.camera_config())?;

    println!(
        "Running {} filter on {}x{} @ {} fps for {}s",
        config.default_filter.label(),
        config.width,
        config.height,
        config.framerate,
        seconds
    );

    // Set up Ctrl+C handler
    let stop_flag = Arc::new(AtomicBool::new(false));
    let stop_flag_clone = Arc::clone(&stop_flag);
    ctrlc::set_handler(move || {
        stop_flag_clone.store(true, Ordering::SeqCst);
    })?;

    camera.start(pipeline.submitter())?;

    let start = Instant::now();
    let target_duration = Duration::from_secs(seconds);

    while start.elapsed() < target_duration {
        if stop_flag.load(Ordering::SeqCst) {
            println!();
            println!("Stopping early...");
            break;
        }

        let stats = pipeline.stats();
        print!(
            "\rElapsed: {:>5.1}s | published {} of {}",
            start.elapsed().as_secs_f32(),
            stats.published,
            stats.submitted
        );
        std::io::stdout().flush()?;

        std::thread::sleep(timing::HEADLESS_REPORT_INTERVAL);
    }
    println!();

    camera.stop();
    pipeline.shutdown();

    let stats = pipeline.stats();
    let source = camera.stats();
    let received = received.load(Ordering::Relaxed);
    let elapsed = start.elapsed().as_secs_f64();

    println!(
        "Source:   produced {}, dropped at source {}, buffers outstanding {}",
        source.produced, source.source_dropped, source.outstanding
    );
    println!(
        "Pipeline: submitted {}, analyzed {}, published {}, superseded {}, cancelled {}, failed {}, stale {}",
        stats.submitted,
        stats.analyzed,
        stats.published,
        stats.superseded,
        stats.cancelled,
        stats.failed,
        stats.stale
    );
    println!("Max in flight: {}", stats.max_in_flight);
    if received > 0 {
        println!(
            "Throughput: {:.1} results/s, mean latency {:.2} ms",
            received as f64 / elapsed,
            latency_us.load(Ordering::Relaxed) as f64 / received as f64 / 1000.0
        );
    }

    Ok(())
}

/// List the filters in strip order
pub fn list_filters() -> Result<(), Box<dyn std::error::Error>> {
    println!("Available filters:");
    println!();
    for (index, filter) in FilterKind::ALL.iter().enumerate() {
        println!("  [{}] {:<10} ({})", index, filter.name(), filter.label());
    }
    Ok(())
}
