use crate::render::{Frame, Renderer, begin_frame, draw_chrome, finish_frame};
use std::io::{self, Write};

const UPPER_HALF: char = '\u{2580}';

/// Colours currently set on the terminal; unchanged ones are not re-sent.
#[derive(Default)]
struct Pen {
    fg: Option<[u8; 3]>,
    bg: Option<[u8; 3]>,
}

impl Pen {
    /// One cell: the top pixel is the glyph, the bottom pixel the background.
    fn cell(&mut self, out: &mut dyn Write, top: &[u8], bottom: &[u8]) -> io::Result<()> {
        let fg = [top[0], top[1], top[2]];
        let bg = [bottom[0], bottom[1], bottom[2]];
        if self.fg != Some(fg) {
            write!(out, "\x1b[38;2;{};{};{}m", fg[0], fg[1], fg[2])?;
            self.fg = Some(fg);
        }
        if self.bg != Some(bg) {
            write!(out, "\x1b[48;2;{};{};{}m", bg[0], bg[1], bg[2])?;
            self.bg = Some(bg);
        }
        write!(out, "{UPPER_HALF}")
    }
}

/// Truecolor text renderer: each cell shows two stacked shader pixels.
#[derive(Debug, Default, Clone, Copy)]
pub struct HalfBlockRenderer;

impl HalfBlockRenderer {
    pub fn new() -> Self {
        Self
    }
}

impl Renderer for HalfBlockRenderer {
    fn name(&self) -> &'static str {
        "halfblock"
    }

    fn render(&mut self, frame: &Frame<'_>, out: &mut dyn Write) -> anyhow::Result<()> {
        let cols = frame.term_cols as usize;
        let rows = frame.visual_rows as usize;
        if cols == 0 || rows == 0 {
            return Ok(());
        }
        // Surface and terminal disagree for one frame after a resize.
        if (frame.pixel_width, frame.pixel_height) != (cols, rows * 2) {
            return Ok(());
        }
        let Some(rgba) = frame.rgba() else {
            return report_short_buffer(out, frame);
        };

        begin_frame(out, frame.sync_updates)?;
        // Autowrap off, or writing the last column scrolls the screen.
        out.write_all(b"\x1b[H\x1b[0m\x1b[?7l")?;

        let stride = cols * 4;
        let mut pen = Pen::default();
        for pair in rgba.chunks_exact(stride * 2) {
            let (top, bottom) = pair.split_at(stride);
            for (t, b) in top.chunks_exact(4).zip(bottom.chunks_exact(4)) {
                pen.cell(out, t, b)?;
            }
            out.write_all(b"\r\n")?;
        }

        draw_chrome(out, frame)?;
        out.write_all(b"\x1b[?7h")?;
        finish_frame(out, frame.sync_updates)
    }
}

fn report_short_buffer(out: &mut dyn Write, frame: &Frame<'_>) -> anyhow::Result<()> {
    begin_frame(out, frame.sync_updates)?;
    write!(
        out,
        "\x1b[H\x1b[0m\x1b[2Jpixel buffer too small for {}x{} ({} bytes)",
        frame.pixel_width,
        frame.pixel_height,
        frame.pixels_rgba.len()
    )?;
    finish_frame(out, frame.sync_updates)
}
