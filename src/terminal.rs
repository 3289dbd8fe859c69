// SPDX-License-Identifier: GPL-3.0-only

//! Terminal-based filter preview
//!
//! Renders the reference and filtered rasters side by side using Unicode
//! half-block characters for improved vertical resolution.

use crate::backends::camera::FrameSource;
use crate::backends::virtual_camera::SyntheticCamera;
use crate::config::Config;
use crate::constants::{RESULT_CHANNEL_CAPACITY, timing};
use crate::errors::{AppError, AppResult};
use crate::media::orientation::Orientation;
use crate::pipelines::{AnalysisPipeline, AnalysisResult, FilterKind, PipelineStats, channel_sink};

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use futures::channel::mpsc;
use image::RgbaImage;
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    buffer::Buffer,
    layout::{Constraint, Layout, Rect},
    style::{Color, Style},
    widgets::Widget,
};
use std::io::{self, stdout};
use tracing::{error, info};

fn terminal_error(err: io::Error) -> AppError {
    AppError::Terminal(err.to_string())
}

/// Run the terminal preview
pub fn run(config: &Config) -> AppResult<()> {
    // Set up terminal
    enable_raw_mode().map_err(terminal_error)?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen).map_err(terminal_error)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).map_err(terminal_error)?;

    // Run the app
    let result = run_app(&mut terminal, config);

    // Restore terminal
    disable_raw_mode().map_err(terminal_error)?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen).map_err(terminal_error)?;
    terminal.show_cursor().map_err(terminal_error)?;

    result
}

/// Camera, pipeline and the receiving end of the result channel
struct PreviewSession {
    camera: SyntheticCamera,
    pipeline: AnalysisPipeline,
    receiver: mpsc::Receiver<AnalysisResult>,
}

impl PreviewSession {
    fn new(config: &Config) -> AppResult<Self> {
        let (sink, receiver) = channel_sink(RESULT_CHANNEL_CAPACITY);
        let pipeline = AnalysisPipeline::new(config.analyzer_settings()?, sink)?;
        let mut camera = SyntheticCamera::new(config.camera_config())?;
        camera.start(pipeline.submitter())?;

        Ok(Self {
            camera,
            pipeline,
            receiver,
        })
    }

    fn try_get_result(&mut self) -> Option<AnalysisResult> {
        // Non-blocking receive
        self.receiver.try_recv().ok()
    }

    fn shutdown(mut self) {
        // Source first so no frame arrives at a stopped pipeline
        self.camera.stop();
        self.pipeline.shutdown();
    }
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    config: &Config,
) -> AppResult<()> {
    let mut session = PreviewSession::new(config)?;
    info!(filter = %config.default_filter, "Terminal preview started");

    let mut reference_widget = FrameWidget::new("Original");
    let mut filtered_widget = FrameWidget::new(config.default_filter.label());
    let mut show_help = false;

    loop {
        // Drain all available results to get the latest
        while let Some(result) = session.try_get_result() {
            filtered_widget.title = result.filter.label();
            reference_widget.update(result.reference);
            filtered_widget.update(result.filtered);
        }

        let settings = session.pipeline.settings();
        let status_message = if show_help {
            build_help_message(&session.pipeline.stats())
        } else {
            build_status_message(settings.filter, settings.orientation)
        };

        terminal.draw(|f| {
            let area = f.area();
            let [preview_area, status_area] =
                Layout::vertical([Constraint::Min(1), Constraint::Length(1)]).areas(area);
            let [left, right] =
                Layout::horizontal([Constraint::Percentage(50), Constraint::Percentage(50)])
                    .areas(preview_area);

            f.render_widget(&reference_widget, left);
            f.render_widget(&filtered_widget, right);
            f.render_widget(
                StatusBar {
                    message: &status_message,
                },
                status_area,
            );
        })
        .map_err(terminal_error)?;

        // Handle input with timeout for frame updates
        if event::poll(timing::TERMINAL_POLL_INTERVAL).map_err(terminal_error)?
            && let Event::Key(key) = event::read().map_err(terminal_error)?
            && key.kind == KeyEventKind::Press
        {
            match key.code {
                KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => break,
                KeyCode::Char('q') => break,
                KeyCode::Right => {
                    show_help = false;
                    session.pipeline.set_filter(settings.filter.next());
                }
                KeyCode::Left => {
                    show_help = false;
                    session.pipeline.set_filter(settings.filter.previous());
                }
                KeyCode::Char('m') => {
                    show_help = false;
                    let orientation = Orientation {
                        mirror: !settings.orientation.mirror,
                        ..settings.orientation
                    };
                    session.pipeline.set_orientation(orientation);
                }
                KeyCode::Char('h') => show_help = !show_help,
                _ => {}
            }
        }
    }

    let stats = session.pipeline.stats();
    if stats.failed > 0 {
        error!(failed = stats.failed, "Some frames failed analysis");
    }
    session.shutdown();
    Ok(())
}

fn build_status_message(filter: FilterKind, orientation: Orientation) -> String {
    format!(
        "{} | rotation {}{} | ←/→ filter | 'm' mirror | 'h' help | 'q' quit",
        filter.label(),
        orientation.rotation,
        if orientation.mirror { " mirrored" } else { "" }
    )
}

fn build_help_message(stats: &PipelineStats) -> String {
    format!(
        "←/→: Cycle filters | m: Toggle mirror | h: Toggle help | q/Ctrl+C: Quit | \
         published {} of {} (superseded {}, failed {})",
        stats.published, stats.submitted, stats.superseded, stats.failed
    )
}

/// Widget that renders a raster using half-block characters
struct FrameWidget {
    title: &'static str,
    frame: Option<RgbaImage>,
}

impl FrameWidget {
    fn new(title: &'static str) -> Self {
        Self { title, frame: None }
    }

    fn update(&mut self, frame: RgbaImage) {
        self.frame = Some(frame);
    }
}

impl Widget for &FrameWidget {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.height < 2 || area.width == 0 {
            return;
        }

        // Top line carries the title
        buf.set_string(area.x, area.y, self.title, Style::default().fg(Color::Gray));
        let area = Rect {
            y: area.y + 1,
            height: area.height - 1,
            ..area
        };

        let Some(frame) = self.frame.as_ref().filter(|f| f.width() > 0 && f.height() > 0) else {
            // No frame yet - show placeholder
            let msg = "Waiting for camera...";
            let x = area.x + (area.width.saturating_sub(msg.len() as u16)) / 2;
            let y = area.y + area.height / 2;
            if y < area.y + area.height && x < area.x + area.width {
                buf.set_string(x, y, msg, Style::default());
            }
            return;
        };

        // Calculate display dimensions maintaining aspect ratio
        // Each terminal cell displays 2 vertical pixels using half-block characters
        let frame_aspect = frame.width() as f64 / frame.height() as f64;
        let term_width = area.width as f64;
        let term_height = (area.height * 2) as f64;

        let (display_width, display_height) = if term_width / term_height > frame_aspect {
            // Terminal is wider - fit to height
            let h = term_height;
            ((h * frame_aspect) as u16, (h / 2.0) as u16)
        } else {
            // Terminal is taller - fit to width
            let w = term_width;
            (w as u16, (w / frame_aspect / 2.0) as u16)
        };
        if display_width == 0 || display_height == 0 {
            return;
        }

        // Center the image
        let x_offset = area.x + (area.width.saturating_sub(display_width)) / 2;
        let y_offset = area.y + (area.height.saturating_sub(display_height)) / 2;

        let x_scale = frame.width() as f64 / display_width as f64;
        let y_scale = frame.height() as f64 / (display_height * 2) as f64;

        // Upper half (▀) colored with fg, lower half with bg
        for ty in 0..display_height {
            for tx in 0..display_width {
                let src_x = (tx as f64 * x_scale) as u32;
                let src_y_top = (ty as f64 * 2.0 * y_scale) as u32;
                let src_y_bottom = ((ty as f64 * 2.0 + 1.0) * y_scale) as u32;

                if let Some(cell) = buf.cell_mut((x_offset + tx, y_offset + ty)) {
                    cell.set_char('▀');
                    cell.set_fg(sample_pixel(frame, src_x, src_y_top));
                    cell.set_bg(sample_pixel(frame, src_x, src_y_bottom));
                }
            }
        }
    }
}

fn sample_pixel(frame: &RgbaImage, x: u32, y: u32) -> Color {
    let x = x.min(frame.width() - 1);
    let y = y.min(frame.height() - 1);
    let [r, g, b, _] = frame.get_pixel(x, y).0;
    Color::Rgb(r, g, b)
}

/// Status bar widget
struct StatusBar<'a> {
    message: &'a str,
}

impl Widget for StatusBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        // Fill background
        for x in area.x..area.x + area.width {
            if let Some(cell) = buf.cell_mut((x, area.y)) {
                cell.set_char(' ');
                cell.set_bg(Color::DarkGray);
            }
        }

        // Truncate on a character boundary; the message contains arrows
        let text: String = self.message.chars().take(area.width as usize).collect();

        buf.set_string(
            area.x,
            area.y,
            text,
            Style::default().fg(Color::White).bg(Color::DarkGray),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_is_terminal_error() {
        let err = terminal_error(io::Error::new(io::ErrorKind::BrokenPipe, "tty gone"));
        assert_eq!(err, AppError::Terminal("tty gone".into()));
    }

    #[test]
    fn test_status_message_shows_mirroring() {
        let mirrored = Orientation {
            mirror: true,
            ..Orientation::default()
        };
        let message = build_status_message(FilterKind::Vintage, mirrored);
        assert!(message.starts_with("Vintage | rotation "));
        assert!(message.contains(" mirrored |"));
        let upright = build_status_message(FilterKind::Vintage, Orientation::default());
        assert!(!upright.contains("mirrored"));
    }
}
