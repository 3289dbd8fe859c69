// SPDX-License-Identifier: GPL-3.0-only

use camera_filter::constants::app_info;
use camera_filter::{CapturePreset, Config, FilterKind, SensorRotation};
use clap::{Parser, Subcommand};

mod cli;

#[derive(Parser)]
#[command(name = "camera-filter")]
#[command(about = "Live camera filter preview")]
#[command(version = app_info::version())]
#[command(subcommand_required = false)]
struct Cli {
    /// Filter to start with (identity, grayscale, sepia, vintage)
    #[arg(short, long, global = true)]
    filter: Option<FilterKind>,

    /// Clockwise sensor rotation in degrees (0, 90, 180, 270)
    #[arg(short, long, global = true, allow_hyphen_values = true)]
    rotation: Option<i32>,

    /// Mirror the preview horizontally
    #[arg(short, long, global = true)]
    mirror: bool,

    /// Capture resolution preset (low, medium, high)
    #[arg(short, long, global = true)]
    preset: Option<CapturePreset>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the filtered preview in the terminal (default)
    Preview,

    /// Run the pipeline without a display and print statistics
    Run {
        /// How long to run, in seconds
        #[arg(short, long, default_value = "5")]
        seconds: u64,
    },

    /// List available filters
    Filters,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    // Set RUST_LOG environment variable to control log level
    // Examples: RUST_LOG=debug, RUST_LOG=camera_filter=trace, RUST_LOG=info
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .init();

    let cli = Cli::parse();

    let mut config = Config::load()?;
    if let Some(filter) = cli.filter {
        config.default_filter = filter;
    }
    if let Some(degrees) = cli.rotation {
        if SensorRotation::from_degrees_int(degrees).is_none() {
            return Err(format!("Rotation must be a multiple of 90, got {}", degrees).into());
        }
        config.sensor_rotation = degrees;
    }
    if cli.mirror {
        config.mirror_preview = true;
    }
    if let Some(preset) = cli.preset {
        (config.width, config.height) = preset.resolution();
    }
    config.validate()?;

    match cli.command {
        Some(Commands::Preview) | None => camera_filter::terminal::run(&config)?,
        Some(Commands::Run { seconds }) => cli::run_headless(&config, seconds)?,
        Some(Commands::Filters) => cli::list_filters()?,
    }
    Ok(())
}
