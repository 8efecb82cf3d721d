use std::io;
use tui::backend::CrosstermBackend;
use tui::layout::Rect;
use tui::style::{Color, Style};
use tui::symbols::Marker;
use tui::widgets::canvas::{Canvas, Points};
use tui::widgets::{Block, Borders};
use tui::Terminal;

use crate::framebuffer::{Framebuffer, DISPLAY_HEIGHT, DISPLAY_WIDTH};

/// Display is used by the interpreter to show the framebuffer. It should
/// abstract the implementation details, so a variety of kinds of screen would
/// work.
pub trait Display {
    /// present one frame
    fn render(&mut self, frame: &Framebuffer) -> Result<(), io::Error>;

    /// give the screen back
    fn shutdown(&mut self) -> Result<(), io::Error> {
        Ok(())
    }
}

// store useful metadata about the terminal
struct Resolution(usize, usize);

impl Resolution {
    fn x_bounds(&self) -> [f64; 2] {
        [0.0, (self.0 - 1) as f64]
    }

    fn y_bounds(&self) -> [f64; 2] {
        [-1.0 * (self.1 - 1) as f64, 0.0]
    }

    /// canvas coordinates of every pixel that's `lit`. tui's y axis points
    /// up, so rows go negative
    fn points_from_frame(&self, frame: &Framebuffer, lit: bool) -> Vec<(f64, f64)> {
        let w = self.0;
        frame
            .pixels()
            .iter()
            .enumerate()
            .filter(|&(_, &p)| p == lit)
            .map(|(n, _)| (
                (n % w) as f64,        // x
                -1.0 * (n / w) as f64, // y
            ))
            .collect()
    }
}

/// monochrome display in a terminal, rendered using TUI and crossterm
pub struct MonoTermDisplay {
    terminal: Terminal<CrosstermBackend<io::Stdout>>,
    resolution: Resolution,
    render_every: u32,
    pending: u32,
    last: Option<Framebuffer>,
}

impl MonoTermDisplay {
    /// only every `render_every`th changed frame actually gets painted;
    /// repainting the terminal on every instruction flickers and crawls
    pub fn new(render_every: u32) -> Result<MonoTermDisplay, io::Error> {
        let backend = CrosstermBackend::new(io::stdout());
        let mut terminal = Terminal::new(backend)?;
        terminal.clear()?;
        terminal.hide_cursor()?;
        Ok(MonoTermDisplay {
            terminal,
            resolution: Resolution(DISPLAY_WIDTH, DISPLAY_HEIGHT),
            render_every: render_every.max(1),
            pending: 0,
            last: None,
        })
    }

    fn paint(&mut self, frame: &Framebuffer) -> Result<(), io::Error> {
        let resolution = &self.resolution;
        let dark = resolution.points_from_frame(frame, false);
        let lit = resolution.points_from_frame(frame, true);

        // for now this assumes a 1:1 ratio between terminal, chip8 and the
        // internal TUI canvas
        self.terminal.draw(|f| {
            let size = Rect::new(
                0,
                0,
                2 + resolution.0 as u16,
                2 + resolution.1 as u16,
            );

            let canvas = Canvas::default()
                .block(
                    Block::default()
                        .title("CHIP-8")
                        .borders(Borders::ALL)
                        .style(Style::default().bg(Color::Black)),
                )
                .x_bounds(resolution.x_bounds())
                .y_bounds(resolution.y_bounds())
                .marker(Marker::Block)
                .paint(|ctx| {
                    ctx.draw(&Points {
                        coords: &dark,
                        color: Color::Black,
                    });
                    ctx.draw(&Points {
                        coords: &lit,
                        color: Color::White,
                    });
                });
            f.render_widget(canvas, size);
        })?;
        Ok(())
    }
}

impl Display for MonoTermDisplay {
    fn render(&mut self, frame: &Framebuffer) -> Result<(), io::Error> {
        if self.last.as_ref() == Some(frame) {
            return Ok(());
        }
        self.pending += 1;
        if self.pending < self.render_every {
            return Ok(());
        }
        self.pending = 0;
        self.paint(frame)?;
        self.last = Some(frame.clone());
        Ok(())
    }

    fn shutdown(&mut self) -> Result<(), io::Error> {
        self.terminal.show_cursor()?;
        // leave the cursor below the canvas so the shell doesn't scribble over the last frame
        self.terminal
            .set_cursor(0, DISPLAY_HEIGHT as u16 + 2)
    }
}

/// useful for testing non-display routines; remembers what it was shown
#[derive(Default)]
pub struct DummyDisplay {
    pub frames: usize,
    pub last: Option<Framebuffer>,
    pub shut_down: bool,
}

impl DummyDisplay {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Display for DummyDisplay {
    fn render(&mut self, frame: &Framebuffer) -> Result<(), io::Error> {
        self.frames += 1;
        self.last = Some(frame.clone());
        Ok(())
    }

    fn shutdown(&mut self) -> Result<(), io::Error> {
        self.shut_down = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Resolution tests
    #[test]
    fn test_x_bounds() {
        let r = Resolution(64, 32);
        assert_eq!(r.x_bounds(), [0.0, 63.0]);
    }

    #[test]
    fn test_y_bounds() {
        let r = Resolution(64, 32);
        assert_eq!(r.y_bounds(), [-31.0, 0.0]);
    }

    #[test]
    fn test_points_split_by_colour() {
        let r = Resolution(64, 32);
        let mut fb = Framebuffer::new();
        fb.draw_sprite(1, 2, &[0x80]);
        let lit = r.points_from_frame(&fb, true);
        assert_eq!(lit, vec![(1.0, -2.0)]);
        assert_eq!(r.points_from_frame(&fb, false).len(), 2047);
    }

    #[test]
    fn test_blank_frame_is_all_dark() {
        let r = Resolution(64, 32);
        let fb = Framebuffer::new();
        assert!(r.points_from_frame(&fb, true).is_empty());
        assert_eq!(r.points_from_frame(&fb, false).len(), 2048);
    }

    // DummyDisplay tests
    #[test]
    fn test_dummy_records_frames() -> Result<(), io::Error> {
        let mut d = DummyDisplay::new();
        let mut fb = Framebuffer::new();
        d.render(&fb)?;
        fb.draw_sprite(0, 0, &[0xff]);
        d.render(&fb)?;
        assert_eq!(d.frames, 2);
        assert_eq!(d.last.as_ref().map(Framebuffer::lit_count), Some(8));
        d.shutdown()?;
        assert!(d.shut_down);
        Ok(())
    }

    #[test]
    #[ignore]
    // NB. figure out how to stop rendering during tests
    fn test_term_display_renders() -> Result<(), io::Error> {
        let mut d = MonoTermDisplay::new(1)?;
        d.render(&Framebuffer::new())?;
        d.shutdown()
    }
}
