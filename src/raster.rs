use crate::params::ParameterSet;
use crate::shader::{ClampPolicy, TermToggles, Vec2, compute_color_with};
use rayon::prelude::*;

/// RGBA8 image, rows top to bottom.
#[derive(Debug, Clone, Default)]
pub struct PixelBuffer {
    pub width: usize,
    pub height: usize,
    pub pixels: Vec<u8>,
}

impl PixelBuffer {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            pixels: vec![0u8; width.saturating_mul(height).saturating_mul(4)],
        }
    }

    pub fn resize(&mut self, width: usize, height: usize) {
        self.width = width;
        self.height = height;
        self.pixels
            .resize(width.saturating_mul(height).saturating_mul(4), 0);
    }

    pub fn pixel(&self, x: usize, y: usize) -> [u8; 4] {
        let i = (y * self.width + x) * 4;
        [
            self.pixels[i],
            self.pixels[i + 1],
            self.pixels[i + 2],
            self.pixels[i + 3],
        ]
    }
}

/// Shader-space coordinate of a buffer pixel: pixel centres, origin at the
/// bottom-left corner as in fragment coordinates.
pub fn frag_coord(x: usize, row: usize, height: usize) -> Vec2 {
    let y = height.saturating_sub(row + 1);
    Vec2::new(x as f64 + 0.5, y as f64 + 0.5)
}

/// Evaluates the pixel function for every pixel of `buf`. Rows are
/// independent, so they are spread across the rayon pool.
pub fn rasterize(
    buf: &mut PixelBuffer,
    time: f64,
    params: &ParameterSet,
    terms: TermToggles,
    clamp: ClampPolicy,
) {
    let w = buf.width;
    let h = buf.height;
    if w == 0 || h == 0 {
        return;
    }
    let resolution = Vec2::new(w as f64, h as f64);

    buf.pixels
        .par_chunks_mut(w * 4)
        .enumerate()
        .for_each(|(row, line)| {
            for (x, px) in line.chunks_exact_mut(4).enumerate() {
                let color = compute_color_with(frag_coord(x, row, h), resolution, time, params, terms);
                px.copy_from_slice(&clamp.apply(color).to_rgba8());
            }
        });
}

/// Nearest-neighbour resample of `src` into a `dst_w` x `dst_h` buffer.
pub fn resample_nearest(src: &PixelBuffer, dst_w: usize, dst_h: usize, dst: &mut Vec<u8>) {
    dst.clear();
    dst.resize(dst_w.saturating_mul(dst_h).saturating_mul(4), 0);
    if src.width == 0 || src.height == 0 || dst_w == 0 || dst_h == 0 {
        return;
    }

    dst.par_chunks_mut(dst_w * 4)
        .enumerate()
        .for_each(|(dy, line)| {
            let sy = (dy * src.height / dst_h).min(src.height - 1);
            for (dx, px) in line.chunks_exact_mut(4).enumerate() {
                let sx = (dx * src.width / dst_w).min(src.width - 1);
                let si = (sy * src.width + sx) * 4;
                px.copy_from_slice(&src.pixels[si..si + 4]);
            }
        });
}
