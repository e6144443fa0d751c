//! Terminal view of a Strata run
//!
//! Shows: the viewed generation (two pixel rows per character via
//! half-blocks), the generation cursor, brush radius, population, and a
//! status line for errors and export summaries.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use strata_core::error::StrataError;
use strata_core::frame::Frame as PixelFrame;

/// Snapshot of the run for one draw
#[derive(Default, Clone)]
pub struct RunView {
    pub current_generation: u32,
    pub viewed_generation: u32,
    pub capacity: u32,
    pub brush_radius: f32,
    pub population: usize,
    pub backend: &'static str,
}

/// Main visualizer state
pub struct StrataVisualizer {
    /// Composited pixels of the viewed generation, sized to the grid panel
    pub pixels: PixelFrame,
    pub view: RunView,
    status: Option<(String, Color)>,
}

impl StrataVisualizer {
    pub fn new() -> Self {
        Self {
            pixels: PixelFrame::new(0, 0),
            view: RunView::default(),
            status: None,
        }
    }

    /// Split the terminal the same way `draw` does
    pub fn layout(area: Rect) -> [Rect; 3] {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .margin(0)
            .constraints([
                Constraint::Length(2), // Header
                Constraint::Min(3),    // Grid
                Constraint::Length(3), // Status + help
            ])
            .split(area);
        [chunks[0], chunks[1], chunks[2]]
    }

    /// Inside of the bordered grid panel
    pub fn grid_inner(area: Rect) -> Rect {
        Block::default().borders(Borders::ALL).inner(Self::layout(area)[1])
    }

    /// Resize the pixel surface for a grid panel, keeping it if unchanged
    pub fn fit_pixels(&mut self, inner: Rect) {
        let (w, h) = (inner.width as u32, inner.height as u32 * 2);
        if self.pixels.width() != w || self.pixels.height() != h {
            self.pixels = PixelFrame::new(w, h);
        }
    }

    pub fn info(&mut self, msg: impl Into<String>) {
        self.status = Some((msg.into(), Color::Green));
    }

    pub fn error(&mut self, e: &StrataError) {
        let msg = if e.is_capacity() {
            "history limit reached".to_string()
        } else {
            e.to_string()
        };
        self.status = Some((msg, Color::Red));
    }

    pub fn draw(&self, frame: &mut Frame) {
        let [header, grid, footer] = Self::layout(frame.area());
        self.draw_header(frame, header);
        self.draw_grid(frame, grid);
        self.draw_footer(frame, footer);
    }

    fn draw_header(&self, frame: &mut Frame, area: Rect) {
        let v = &self.view;
        let at_head = v.viewed_generation == v.current_generation;
        let cursor_color = if at_head { Color::Green } else { Color::Yellow };

        let header = Paragraph::new(Line::from(vec![
            Span::styled(
                " ▦ STRATA ",
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            ),
            Span::raw(" │  "),
            Span::styled("Viewing: ", Style::default().fg(Color::DarkGray)),
            Span::styled(format!("{}", v.viewed_generation), Style::default().fg(cursor_color)),
            Span::styled(
                format!(" / {} (max {})", v.current_generation, v.capacity.saturating_sub(1)),
                Style::default().fg(Color::DarkGray),
            ),
            Span::raw("  │  "),
            Span::styled(format!("Alive: {}", v.population), Style::default().fg(Color::Magenta)),
            Span::raw("  │  "),
            Span::styled(format!("Brush: {:.1}", v.brush_radius), Style::default().fg(Color::Cyan)),
            Span::raw("  │  "),
            Span::styled(v.backend, Style::default().fg(Color::DarkGray)),
        ]))
        .block(
            Block::default()
                .borders(Borders::BOTTOM)
                .border_style(Style::default().fg(Color::DarkGray)),
        );

        frame.render_widget(header, area);
    }

    fn draw_grid(&self, frame: &mut Frame, area: Rect) {
        let title = if self.view.viewed_generation == self.view.current_generation {
            " Generation (head) ".to_string()
        } else {
            format!(" Generation {} (history) ", self.view.viewed_generation)
        };
        let grid = Paragraph::new(half_block_lines(&self.pixels)).block(
            Block::default()
                .title(Span::styled(title, Style::default().fg(Color::Cyan)))
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::DarkGray)),
        );
        frame.render_widget(grid, area);
    }

    fn draw_footer(&self, frame: &mut Frame, area: Rect) {
        let status = match &self.status {
            Some((msg, color)) => {
                Line::from(Span::styled(format!(" {}", msg), Style::default().fg(*color)))
            }
            None => Line::from(Span::styled(
                " Drag to paint",
                Style::default().fg(Color::DarkGray),
            )),
        };
        let help = Line::from(vec![
            Span::styled(" space", Style::default().fg(Color::Green)),
            Span::raw(" step  "),
            Span::styled("←/→", Style::default().fg(Color::Green)),
            Span::raw(" scrub  "),
            Span::styled("home/end", Style::default().fg(Color::Green)),
            Span::raw(" first/last  "),
            Span::styled("[/]", Style::default().fg(Color::Green)),
            Span::raw(" brush  "),
            Span::styled("r", Style::default().fg(Color::Green)),
            Span::raw(" random  "),
            Span::styled("e", Style::default().fg(Color::Green)),
            Span::raw(" export  "),
            Span::styled("q", Style::default().fg(Color::DarkGray)),
            Span::raw(" quit"),
        ]);

        let footer = Paragraph::new(vec![status, help]).block(
            Block::default()
                .borders(Borders::TOP)
                .border_style(Style::default().fg(Color::DarkGray)),
        );
        frame.render_widget(footer, area);
    }
}

/// Two pixel rows per line: upper pixel is the foreground of '▀', lower the background
pub fn half_block_lines(pixels: &PixelFrame) -> Vec<Line<'static>> {
    let grey = |v: u8| Color::Rgb(v, v, v);
    (0..pixels.height() / 2)
        .map(|row| {
            let spans: Vec<Span> = (0..pixels.width())
                .map(|x| {
                    let top = pixels.luma(x, row * 2);
                    let bottom = pixels.luma(x, row * 2 + 1);
                    Span::styled("▀", Style::default().fg(grey(top)).bg(grey(bottom)))
                })
                .collect();
            Line::from(spans)
        })
        .collect()
}

/// Normalized grid position under a terminal cell, if it lies in the grid panel
pub fn pointer_position(inner: Rect, column: u16, row: u16) -> Option<(f32, f32)> {
    if inner.width == 0 || inner.height == 0 {
        return None;
    }
    if column < inner.x || row < inner.y || column >= inner.right() || row >= inner.bottom() {
        return None;
    }
    let x = (column - inner.x) as f32 + 0.5;
    let y = (row - inner.y) as f32 + 0.5;
    Some((x / inner.width as f32, y / inner.height as f32))
}

/// One line describing an exported history
pub fn summarize_export(populations: &[usize], bytes: usize) -> String {
    const SHOWN: usize = 8;
    let mut counts: Vec<String> = populations.iter().take(SHOWN).map(|p| p.to_string()).collect();
    if populations.len() > SHOWN {
        counts.push("…".to_string());
    }
    format!(
        "Exported {} generations ({} bytes), alive per generation: {}",
        populations.len(),
        bytes,
        counts.join(", ")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pointer_position_inside_and_outside() {
        let inner = Rect::new(1, 3, 10, 5);
        assert_eq!(pointer_position(inner, 1, 3), Some((0.05, 0.1)));
        assert_eq!(pointer_position(inner, 0, 3), None);
        assert_eq!(pointer_position(inner, 11, 3), None);
        assert_eq!(pointer_position(inner, 5, 8), None);
    }

    #[test]
    fn test_half_blocks_pair_rows() {
        let mut pixels = PixelFrame::new(2, 4);
        pixels.pixels_mut()[0..4].copy_from_slice(&[255, 255, 255, 255]);
        let lines = half_block_lines(&pixels);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].spans.len(), 2);
        assert_eq!(lines[0].spans[0].style.fg, Some(Color::Rgb(255, 255, 255)));
        assert_eq!(lines[0].spans[0].style.bg, Some(Color::Rgb(0, 0, 0)));
    }

    #[test]
    fn test_export_summary_truncates() {
        let summary = summarize_export(&[1, 2, 3], 300);
        assert_eq!(summary, "Exported 3 generations (300 bytes), alive per generation: 1, 2, 3");

        let long: Vec<usize> = (0..20).collect();
        assert!(summarize_export(&long, 0).ends_with("6, 7, …"));
    }

    #[test]
    fn test_capacity_error_message() {
        let mut vis = StrataVisualizer::new();
        vis.error(&StrataError::CapacityExceeded { generation: 5, capacity: 5 });
        assert_eq!(vis.status.as_ref().map(|(m, _)| m.as_str()), Some("history limit reached"));
    }
}
