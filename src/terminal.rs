// SPDX-License-Identifier: GPL-3.0-only

//! Terminal scanner screen
//!
//! Renders the camera feed to the terminal using Unicode half-block
//! characters, with the scanned result and the instruction drawn on top.

use crate::app::{ResultOverlay, ScreenView, SessionRuntime};
use crate::backends::camera::types::{CameraFormat, CameraFrame, PixelFormat};
use crate::backends::create_backend;
use crate::config::Config;
use crate::constants::timing;
use crate::fl;

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    buffer::Buffer,
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::Line,
    widgets::{Block, Borders, Clear, Paragraph, Widget, Wrap},
};
use std::io::{self, stdout};
use std::path::PathBuf;
use tracing::{info, warn};

/// Run the terminal scanner until the user quits
///
/// `source` switches from the system cameras to still images.
pub fn run(source: Option<PathBuf>, config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    let uses_camera = source.is_none();
    let mut session =
        SessionRuntime::new(create_backend(source.as_deref()), config, runtime.handle().clone());
    session.start();

    // Set up terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, &mut session);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    session.shutdown();
    if uses_camera {
        remember_camera(session.config().last_camera_path.clone());
    }

    result
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    session: &mut SessionRuntime,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut frame_widget = FrameWidget::new(fl!("waiting-for-camera"));
    let mut show_help = false;

    loop {
        session.pump();
        frame_widget.update_frame(session.latest_frame());
        let view = session.view();
        let status_message = if show_help {
            build_help_message()
        } else {
            build_status_message(&view, session.backend_name(), session.capture_format())
        };

        terminal.draw(|f| {
            let area = f.area();

            // Reserve bottom line for status
            let screen_area = Rect {
                height: area.height.saturating_sub(1),
                ..area
            };
            draw_view(f.buffer_mut(), screen_area, &view, &frame_widget);

            let status_area = Rect {
                x: area.x,
                y: area.y + area.height.saturating_sub(1),
                width: area.width,
                height: 1,
            };
            f.render_widget(
                StatusBar {
                    message: &status_message,
                },
                status_area,
            );
        })?;

        // Handle input with timeout for frame updates
        if event::poll(timing::INPUT_POLL)?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
        {
            // Ctrl+C to quit
            if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
                break;
            }

            // 'h' to toggle help
            if key.code == KeyCode::Char('h') {
                show_help = !show_help;
            }

            // 'q' also quits
            if key.code == KeyCode::Char('q') {
                break;
            }
        }
    }

    Ok(())
}

/// Draw one of the three screens
fn draw_view(buf: &mut Buffer, area: Rect, view: &ScreenView, frame_widget: &FrameWidget) {
    match view {
        ScreenView::PermissionRequest { message } | ScreenView::NoDevice { message } => {
            MessageWidget { message }.render(area, buf);
        }
        ScreenView::LiveCapture {
            overlay,
            instruction,
            ..
        } => {
            frame_widget.render(area, buf);
            if let Some(overlay) = overlay {
                ResultWidget { overlay }.render(area, buf);
            }
            InstructionWidget { instruction }.render(area, buf);
        }
    }
}

fn build_status_message(
    view: &ScreenView,
    backend: &str,
    format: Option<CameraFormat>,
) -> String {
    match view {
        ScreenView::LiveCapture {
            device_name,
            is_active,
            ..
        } => {
            let state = if *is_active { "scanning" } else { "paused" };
            let source = match format {
                Some(format) => format!("{} {}", backend, format),
                None => backend.to_string(),
            };
            format!("{} ({}, {}) | 'h' help | 'q' quit", device_name, source, state)
        }
        _ => "'h' help | 'q' quit".to_string(),
    }
}

fn build_help_message() -> String {
    String::from("h: Toggle help | q/Ctrl+C: Quit")
}

/// Store the camera used this run as the preferred one for the next
fn remember_camera(path: Option<String>) {
    let Some(path) = path else {
        return;
    };

    let mut stored = Config::load();
    if stored.last_camera_path.as_deref() == Some(path.as_str()) {
        return;
    }
    stored.last_camera_path = Some(path);
    match stored.save() {
        Ok(file) => info!(path = %file.display(), "Saved last used camera"),
        Err(e) => warn!(error = %e, "Failed to save last used camera"),
    }
}

/// Rectangle of `width` x `height` centered in `area`, clipped to it
fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

/// Widget that renders a camera frame using half-block characters
struct FrameWidget {
    frame: Option<CameraFrame>,
    placeholder: String,
}

impl FrameWidget {
    fn new(placeholder: impl Into<String>) -> Self {
        Self {
            frame: None,
            placeholder: placeholder.into(),
        }
    }

    fn update_frame(&mut self, frame: Option<CameraFrame>) {
        self.frame = frame;
    }
}

impl Widget for &FrameWidget {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let Some(frame) = self.frame.as_ref().filter(|f| f.width > 0 && f.height > 0) else {
            // No frame yet - show placeholder
            let msg = self.placeholder.as_str();
            let width = msg.chars().count() as u16;
            let x = area.x + (area.width.saturating_sub(width)) / 2;
            let y = area.y + area.height / 2;
            if y < area.y + area.height && x < area.x + area.width {
                buf.set_string(x, y, msg, Style::default());
            }
            return;
        };

        // Calculate display dimensions maintaining aspect ratio
        // Each terminal cell displays 2 vertical pixels using half-block characters
        let frame_aspect = frame.width as f64 / frame.height as f64;
        let term_width = area.width as f64;
        let term_height = (area.height * 2) as f64;

        let (display_width, display_height) = if term_width / term_height > frame_aspect {
            // Terminal is wider - fit to height
            let h = term_height;
            let w = h * frame_aspect;
            (w as u16, (h / 2.0) as u16)
        } else {
            // Terminal is taller - fit to width
            let w = term_width;
            let h = w / frame_aspect;
            (w as u16, (h / 2.0) as u16)
        };
        if display_width == 0 || display_height == 0 {
            return;
        }

        // Center the image
        let x_offset = area.x + (area.width.saturating_sub(display_width)) / 2;
        let y_offset = area.y + (area.height.saturating_sub(display_height)) / 2;

        let x_scale = frame.width as f64 / display_width as f64;
        let y_scale = frame.height as f64 / (display_height * 2) as f64;

        // Upper half (▀) colored with fg, lower half with bg
        for ty in 0..display_height {
            for tx in 0..display_width {
                let term_x = x_offset + tx;
                let term_y = y_offset + ty;

                if term_x >= area.x + area.width || term_y >= area.y + area.height {
                    continue;
                }

                let src_x = (tx as f64 * x_scale) as u32;
                let src_y_top = (ty as f64 * 2.0 * y_scale) as u32;
                let src_y_bottom = ((ty as f64 * 2.0 + 1.0) * y_scale) as u32;

                let top_color = sample_pixel(frame, src_x, src_y_top);
                let bottom_color = sample_pixel(frame, src_x, src_y_bottom);

                if let Some(cell) = buf.cell_mut((term_x, term_y)) {
                    cell.set_char('▀');
                    cell.set_fg(top_color);
                    cell.set_bg(bottom_color);
                }
            }
        }
    }
}

fn sample_pixel(frame: &CameraFrame, x: u32, y: u32) -> Color {
    let (r, g, b) = sample_pixel_rgb(frame, x, y);
    Color::Rgb(r, g, b)
}

fn sample_pixel_rgb(frame: &CameraFrame, x: u32, y: u32) -> (u8, u8, u8) {
    let x = x.min(frame.width.saturating_sub(1));
    let y = y.min(frame.height.saturating_sub(1));
    let data = &frame.data;

    match frame.format {
        PixelFormat::RGBA => {
            let idx = (y * frame.stride + x * 4) as usize;
            if idx + 2 < data.len() {
                (data[idx], data[idx + 1], data[idx + 2])
            } else {
                (0, 0, 0)
            }
        }
        PixelFormat::Gray8 => {
            let idx = (y * frame.stride + x) as usize;
            match data.get(idx) {
                Some(&v) => (v, v, v),
                None => (0, 0, 0),
            }
        }
    }
}

/// Full-screen centered message (permission / no device)
struct MessageWidget<'a> {
    message: &'a str,
}

impl Widget for MessageWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let width = (self.message.chars().count() as u16 + 4).min(area.width);
        let box_area = centered(area, width, 3);
        Paragraph::new(self.message)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .block(Block::default().borders(Borders::ALL))
            .render(box_area, buf);
    }
}

/// Decoded value and symbology, near the top of the preview
struct ResultWidget<'a> {
    overlay: &'a ResultOverlay,
}

impl Widget for ResultWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let text_width = self
            .overlay
            .value_line
            .chars()
            .count()
            .max(self.overlay.type_line.chars().count()) as u16;
        let width = (text_width + 4).min(area.width);
        let box_area = Rect {
            x: area.x + (area.width - width) / 2,
            y: area.y + 1.min(area.height),
            width,
            height: 4.min(area.height.saturating_sub(1)),
        };

        Clear.render(box_area, buf);
        Paragraph::new(vec![
            Line::from(self.overlay.value_line.as_str())
                .style(Style::default().add_modifier(Modifier::BOLD)),
            Line::from(self.overlay.type_line.as_str()),
        ])
        .alignment(Alignment::Center)
        .style(Style::default().fg(Color::White).bg(Color::Black))
        .block(Block::default().borders(Borders::ALL))
        .render(box_area, buf);
    }
}

/// Static instruction at the bottom of the preview
struct InstructionWidget<'a> {
    instruction: &'a str,
}

impl Widget for InstructionWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.height < 2 {
            return;
        }
        let width = (self.instruction.chars().count() as u16 + 2).min(area.width);
        let line_area = Rect {
            x: area.x + (area.width - width) / 2,
            y: area.y + area.height - 2,
            width,
            height: 1,
        };
        Paragraph::new(self.instruction)
            .alignment(Alignment::Center)
            .style(Style::default().fg(Color::White).bg(Color::Black))
            .render(line_area, buf);
    }
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
    use crate::app::render_decision;
    use crate::backends::camera::{CameraDevice, CameraPosition};

    fn buffer_text(buf: &Buffer) -> String {
        let area = buf.area;
        let mut text = String::new();
        for y in area.y..area.y + area.height {
            for x in area.x..area.x + area.width {
                text.push_str(buf[(x, y)].symbol());
            }
            text.push('\n');
        }
        text
    }

    #[test]
    fn test_permission_screen_shows_message() {
        let area = Rect::new(0, 0, 60, 10);
        let mut buf = Buffer::empty(area);
        let view = render_decision(false, None, None, true);
        draw_view(&mut buf, area, &view, &FrameWidget::new("..."));
        assert!(buffer_text(&buf).contains("Precisamos de permissão"));
    }

    #[test]
    fn test_live_screen_shows_instruction_without_frame() {
        let area = Rect::new(0, 0, 60, 12);
        let mut buf = Buffer::empty(area);
        let device = CameraDevice {
            name: "Cam".to_string(),
            path: "/dev/video0".to_string(),
            position: CameraPosition::Back,
            device_info: None,
        };
        let view = render_decision(true, Some(&device), None, true);
        draw_view(&mut buf, area, &view, &FrameWidget::new("Aguardando"));
        let text = buffer_text(&buf);
        assert!(text.contains("Aguardando"));
        assert!(text.contains("Aponte a câmera"));
    }

    #[test]
    fn test_frame_widget_paints_half_blocks() {
        let area = Rect::new(0, 0, 4, 2);
        let mut buf = Buffer::empty(area);
        let mut widget = FrameWidget::new("...");
        widget.update_frame(Some(CameraFrame::from_gray(8, 8, vec![200; 64])));
        (&widget).render(area, &mut buf);
        assert_eq!(buf[(0, 0)].symbol(), "▀");
        assert_eq!(buf[(0, 0)].fg, Color::Rgb(200, 200, 200));
    }

    #[test]
    fn test_status_shows_capture_format() {
        let device = CameraDevice {
            name: "Cam".to_string(),
            path: "/dev/video0".to_string(),
            position: CameraPosition::Back,
            device_info: None,
        };
        let view = render_decision(true, Some(&device), None, true);
        let format = CameraFormat {
            width: 1280,
            height: 720,
            pixel_format: "YUYV".to_string(),
        };
        let status = build_status_message(&view, "v4l2", Some(format.clone()));
        assert!(status.starts_with("Cam (v4l2 "));
        assert!(status.contains(&format.to_string()));

        let status = build_status_message(&view, "images", None);
        assert!(status.starts_with("Cam (images, scanning)"));
    }

    #[test]
    fn test_centered_clips_to_area() {
        let rect = centered(Rect::new(0, 0, 10, 4), 20, 3);
        assert_eq!(rect, Rect::new(0, 0, 10, 3));
    }
}
