use crate::render::{
    Frame, OverlayAnchor, Renderer, begin_frame, draw_chrome, draw_overlay_popup, finish_frame,
    write_hud,
};
use anyhow::Context;
use base64::Engine;
use std::io::Write;

/// Kitty graphics protocol renderer. Frames are sent inline (`t=d`) as
/// base64 RGBA chunks and placed under the text layer so the HUD and
/// side panels draw on top of the image.
pub struct KittyRenderer {
    image_id: u32,
    placement_id: u32,
    b64_buf: Vec<u8>,
    overlay_visible_last: bool,
    last_hud_rows: u16,
}

impl Default for KittyRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl KittyRenderer {
    pub fn new() -> Self {
        Self {
            image_id: 1,
            placement_id: 1,
            b64_buf: Vec::new(),
            overlay_visible_last: false,
            last_hud_rows: 0,
        }
    }
}

impl Renderer for KittyRenderer {
    fn name(&self) -> &'static str {
        "kitty"
    }

    fn render(&mut self, frame: &Frame<'_>, out: &mut dyn Write) -> anyhow::Result<()> {
        let cols = frame.term_cols as usize;
        let visual_rows = frame.visual_rows as usize;
        if cols == 0 || visual_rows == 0 || frame.pixel_width == 0 || frame.pixel_height == 0 {
            return Ok(());
        }
        let Some(rgba) = frame.rgba() else {
            return Ok(());
        };

        begin_frame(out, frame.sync_updates)?;

        let centred_overlay = frame
            .overlay
            .as_ref()
            .filter(|o| o.anchor == OverlayAnchor::Center);
        if let Some(overlay) = centred_overlay {
            // Help screen hides the image entirely.
            write!(out, "\x1b_Ga=d,d=I,i={}\x1b\\", self.image_id)?;
            clear_visual_text_layer(out, frame.term_rows as usize)?;
            write_hud(out, frame)?;
            draw_overlay_popup(out, frame.term_cols, frame.term_rows, overlay)?;
            self.overlay_visible_last = true;
            self.last_hud_rows = frame.hud_rows;
            return finish_frame(out, frame.sync_updates);
        }

        if frame.hud_rows != self.last_hud_rows || self.overlay_visible_last {
            clear_visual_text_layer(out, frame.term_rows as usize)?;
        }

        out.write_all(b"\x1b[H")?;
        write_kitty_direct_rgba(
            out,
            rgba,
            frame.pixel_width,
            frame.pixel_height,
            cols,
            visual_rows,
            self.image_id,
            self.placement_id,
            &mut self.b64_buf,
        )?;

        draw_chrome(out, frame)?;
        // Side panels leave stale text behind when they close.
        self.overlay_visible_last = frame.overlay.is_some();
        self.last_hud_rows = frame.hud_rows;
        finish_frame(out, frame.sync_updates)
    }
}

#[allow(clippy::too_many_arguments)]
fn write_kitty_direct_rgba(
    out: &mut dyn Write,
    rgba: &[u8],
    w: usize,
    h: usize,
    cols: usize,
    rows: usize,
    image_id: u32,
    placement_id: u32,
    b64_buf: &mut Vec<u8>,
) -> anyhow::Result<()> {
    // 3072 raw bytes encode to exactly 4096 base64 bytes, the protocol's chunk cap.
    const RAW_CHUNK: usize = 3 * 1024;

    if rgba.is_empty() {
        return Ok(());
    }

    let len = rgba.len();
    let mut off = 0usize;
    let mut first = true;
    while off < len {
        let end = (off + RAW_CHUNK).min(len);
        let chunk = &rgba[off..end];
        let b64_len = chunk.len().div_ceil(3) * 4;
        if b64_buf.len() < b64_len {
            b64_buf.resize(b64_len, 0);
        }

        let written = base64::engine::general_purpose::STANDARD
            .encode_slice(chunk, &mut b64_buf[..b64_len])
            .context("base64 encode pixels")?;

        let more = u8::from(end < len);
        if first {
            write!(
                out,
                "\x1b_Ga=T,f=32,s={},v={},t=d,i={},p={},c={},r={},C=1,q=2,z=-1,m={};",
                w, h, image_id, placement_id, cols, rows, more
            )?;
            first = false;
        } else {
            write!(out, "\x1b_Gm={};", more)?;
        }

        out.write_all(&b64_buf[..written])?;
        out.write_all(b"\x1b\\")?;

        off = end;
    }

    Ok(())
}

fn clear_visual_text_layer(out: &mut dyn Write, rows: usize) -> anyhow::Result<()> {
    for row in 1..=rows {
        write!(out, "\x1b[{};1H\x1b[0m\x1b[2K", row)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direct_transport_splits_into_continuation_chunks() {
        let rgba = vec![7u8; 4 * 2000];
        let mut out = Vec::new();
        let mut buf = Vec::new();
        write_kitty_direct_rgba(&mut out, &rgba, 40, 50, 20, 12, 1, 1, &mut buf).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("\x1b_Ga=T,f=32,s=40,v=50,t=d,i=1,p=1,c=20,r=12"));
        assert!(text.contains("m=1;"));
        assert!(text.contains("\x1b_Gm=1;"));
        assert!(text.contains("\x1b_Gm=0;"));
        assert_eq!(text.matches("\x1b\\").count(), 8000usize.div_ceil(3072));
    }

    #[test]
    fn single_chunk_is_final() {
        let rgba = vec![0u8; 16];
        let mut out = Vec::new();
        let mut buf = Vec::new();
        write_kitty_direct_rgba(&mut out, &rgba, 2, 2, 1, 1, 3, 4, &mut buf).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("i=3,p=4"));
        assert!(text.contains("m=0;"));
        assert!(!text.contains("\x1b_Gm="));
    }
}
