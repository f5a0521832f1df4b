mod halfblock;
mod kitty;

pub use halfblock::HalfBlockRenderer;
pub use kitty::KittyRenderer;

use crate::config::RendererMode;
use std::io::Write;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayAnchor {
    /// Centred box over a dark full-screen backdrop.
    Center,
    /// Box on the right edge; the image stays visible around it.
    Right,
}

pub struct Overlay<'a> {
    pub text: &'a str,
    pub anchor: OverlayAnchor,
}

pub struct Frame<'a> {
    pub term_cols: u16,
    pub term_rows: u16,
    pub visual_rows: u16,
    pub pixel_width: usize,
    pub pixel_height: usize,
    pub pixels_rgba: &'a [u8],
    pub hud: &'a str,
    pub hud_rows: u16,
    /// FPS samples drawn as a sparkline at the right end of the first HUD row.
    pub fps_history: &'a [f64],
    pub overlay: Option<Overlay<'a>>,
    pub sync_updates: bool,
}

impl Frame<'_> {
    /// Exactly the pixel bytes the frame size calls for, or `None` when the
    /// buffer is shorter.
    pub fn rgba(&self) -> Option<&[u8]> {
        let need = self
            .pixel_width
            .checked_mul(self.pixel_height)?
            .checked_mul(4)?;
        self.pixels_rgba.get(..need)
    }
}

pub trait Renderer {
    fn name(&self) -> &'static str;
    fn render(&mut self, frame: &Frame<'_>, out: &mut dyn Write) -> anyhow::Result<()>;
}

pub fn make_renderer(mode: RendererMode) -> Box<dyn Renderer> {
    match mode {
        RendererMode::HalfBlock => Box::new(HalfBlockRenderer::new()),
        RendererMode::Kitty => Box::new(KittyRenderer::new()),
    }
}

pub(crate) fn begin_frame(out: &mut dyn Write, sync: bool) -> anyhow::Result<()> {
    if sync {
        out.write_all(b"\x1b[?2026h")?;
    }
    Ok(())
}

pub(crate) fn finish_frame(out: &mut dyn Write, sync: bool) -> anyhow::Result<()> {
    if sync {
        out.write_all(b"\x1b[?2026l")?;
    }
    out.flush()?;
    Ok(())
}

/// HUD rows, then the overlay box over everything.
pub(crate) fn draw_chrome(out: &mut dyn Write, frame: &Frame<'_>) -> anyhow::Result<()> {
    write_hud(out, frame)?;
    if let Some(overlay) = &frame.overlay {
        draw_overlay_popup(out, frame.term_cols, frame.term_rows, overlay)?;
    }
    Ok(())
}

/// Writes one HUD row (1-based terminal row), clipped to `cols` characters.
pub(crate) fn write_hud_line(
    out: &mut dyn Write,
    row: usize,
    cols: usize,
    line: Option<&str>,
) -> anyhow::Result<()> {
    write!(out, "\x1b[{};1H\x1b[0m\x1b[2K", row)?;
    if let Some(line) = line {
        let clipped: String = line.chars().take(cols).collect();
        write!(out, "{clipped}")?;
    }
    Ok(())
}

pub(crate) fn write_hud(out: &mut dyn Write, frame: &Frame<'_>) -> anyhow::Result<()> {
    let cols = frame.term_cols as usize;
    let visual_rows = frame.visual_rows as usize;
    let mut lines = frame.hud.lines();
    for i in 0..(frame.hud_rows as usize) {
        write_hud_line(out, visual_rows + i + 1, cols, lines.next())?;
    }
    if frame.hud_rows > 0 {
        write_sparkline(out, visual_rows + 1, cols, frame.fps_history)?;
    }
    Ok(())
}

const SPARK_LEVELS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];
const SPARK_MAX_FPS: f64 = 120.0;

pub fn spark_color(fps: f64) -> (u8, u8, u8) {
    if fps > 55.0 {
        (0, 255, 136)
    } else if fps > 30.0 {
        (255, 235, 59)
    } else {
        (255, 87, 34)
    }
}

pub fn spark_char(fps: f64) -> char {
    let level = ((fps / SPARK_MAX_FPS).clamp(0.0, 1.0) * (SPARK_LEVELS.len() - 1) as f64).round();
    SPARK_LEVELS[level as usize]
}

/// Colour-coded FPS bars, right-aligned on `row`.
fn write_sparkline(
    out: &mut dyn Write,
    row: usize,
    cols: usize,
    history: &[f64],
) -> anyhow::Result<()> {
    if history.is_empty() || cols < 24 {
        return Ok(());
    }
    let width = history.len().min(cols / 3);
    let samples = &history[history.len() - width..];
    let start_col = cols - width + 1;
    write!(out, "\x1b[{};{}H", row, start_col)?;
    let mut last = None;
    for &fps in samples {
        let c = spark_color(fps);
        if last != Some(c) {
            write!(out, "\x1b[38;2;{};{};{}m", c.0, c.1, c.2)?;
            last = Some(c);
        }
        write!(out, "{}", spark_char(fps))?;
    }
    out.write_all(b"\x1b[0m")?;
    Ok(())
}

fn wrap_overlay_lines(text: &str, max_inner_w: usize) -> Vec<String> {
    let mut lines: Vec<String> = Vec::new();
    for raw in text.lines() {
        if raw.is_empty() {
            lines.push(String::new());
            continue;
        }
        let mut cur = String::new();
        let mut cur_len = 0usize;
        for ch in raw.chars() {
            cur.push(ch);
            cur_len += 1;
            if cur_len >= max_inner_w {
                lines.push(cur);
                cur = String::new();
                cur_len = 0;
            }
        }
        if !cur.is_empty() {
            lines.push(cur);
        }
    }
    lines
}

pub fn draw_overlay_popup(
    out: &mut dyn Write,
    term_cols: u16,
    term_rows: u16,
    overlay: &Overlay<'_>,
) -> anyhow::Result<()> {
    if overlay.text.trim().is_empty() {
        return Ok(());
    }

    let cols = term_cols as usize;
    let rows = term_rows as usize;
    if cols < 8 || rows < 4 {
        return Ok(());
    }

    let max_inner_w = match overlay.anchor {
        OverlayAnchor::Center => cols.saturating_sub(6).max(1),
        OverlayAnchor::Right => (cols / 2).saturating_sub(4).max(1),
    };
    let lines = wrap_overlay_lines(overlay.text, max_inner_w);
    if lines.is_empty() {
        return Ok(());
    }

    let inner_w = lines
        .iter()
        .map(|l| l.chars().count())
        .max()
        .unwrap_or(0)
        .min(max_inner_w)
        .max(1);

    let box_w = (inner_w + 4).min(cols.saturating_sub(2)).max(4);
    let inner_w = box_w.saturating_sub(4);
    let max_body = rows.saturating_sub(3).max(1);
    let body_h = lines.len().min(max_body);
    let box_h = (body_h + 2).min(rows.saturating_sub(1)).max(3);

    let (start_col, start_row) = match overlay.anchor {
        OverlayAnchor::Center => (
            (cols.saturating_sub(box_w)) / 2 + 1,
            (rows.saturating_sub(box_h)) / 2 + 1,
        ),
        OverlayAnchor::Right => (cols.saturating_sub(box_w) + 1, 1),
    };

    if overlay.anchor == OverlayAnchor::Center {
        // Full-screen backdrop so the text stays readable over bright frames.
        out.write_all(b"\x1b[0m\x1b[38;2;220;228;242m\x1b[48;2;2;4;10m")?;
        for row in 1..=rows {
            write!(out, "\x1b[{};1H\x1b[2K", row)?;
        }
    }

    let horiz = "-".repeat(box_w.saturating_sub(2));
    let blank = " ".repeat(inner_w);
    out.write_all(b"\x1b[0m\x1b[38;2;236;242;255m\x1b[48;2;10;14;24m")?;
    write!(out, "\x1b[{};{}H+{}+", start_row, start_col, horiz)?;

    for (i, line) in lines.iter().take(body_h).enumerate() {
        let row = start_row + 1 + i;
        write!(out, "\x1b[{};{}H| {} |", row, start_col, blank)?;
        let line: String = line.chars().take(inner_w).collect();
        if i == 0 {
            write!(
                out,
                "\x1b[{};{}H\x1b[1m\x1b[38;2;255;236;160m{}\x1b[22m\x1b[38;2;236;242;255m",
                row,
                start_col + 2,
                line
            )?;
        } else {
            write!(out, "\x1b[{};{}H{}", row, start_col + 2, line)?;
        }
    }

    write!(out, "\x1b[{};{}H+{}+", start_row + box_h - 1, start_col, horiz)?;
    out.write_all(b"\x1b[0m")?;
    Ok(())
}
