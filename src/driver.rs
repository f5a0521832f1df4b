use crate::params::{MAX_RESOLUTION_SCALE, ParameterStore};
use crate::raster::{PixelBuffer, rasterize, resample_nearest};
use crate::shader::{ClampPolicy, TermToggles};
use std::collections::VecDeque;
use std::time::{Duration, Instant};

pub const FPS_HISTORY_LEN: usize = 80;
/// Largest shader surface edge in pixels.
pub const MAX_SHADER_DIM: usize = 16384;
/// Largest absolute shader time accepted from manual input.
pub const MAX_MANUAL_TIME: f64 = 1e9;
const FPS_WINDOW: Duration = Duration::from_millis(1000);

/// Shader time source.
///
/// While playing, shader time advances by wall-clock delta times the current
/// time speed, so changing the speed never makes time jump. Paused time holds
/// still. Manual mode pins time to an explicit value until play resumes.
#[derive(Debug, Clone)]
pub struct ShaderClock {
    playing: bool,
    manual: bool,
    manual_time: f64,
    time: f64,
    last: Option<Instant>,
}

impl ShaderClock {
    pub fn new(playing: bool) -> Self {
        Self {
            playing,
            manual: false,
            manual_time: 0.0,
            time: 0.0,
            last: None,
        }
    }

    pub fn advance(&mut self, now: Instant, time_speed: f64) -> f64 {
        if self.playing && !self.manual {
            if let Some(last) = self.last {
                let dt = now.saturating_duration_since(last).as_secs_f64();
                self.time += dt * time_speed;
            }
        }
        self.last = Some(now);
        self.time()
    }

    pub fn time(&self) -> f64 {
        if self.manual {
            self.manual_time
        } else {
            self.time
        }
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn is_manual(&self) -> bool {
        self.manual
    }

    /// Resuming leaves manual mode and continues from the live time.
    pub fn toggle_play(&mut self, now: Instant) {
        self.playing = !self.playing;
        if self.playing {
            self.manual = false;
            self.last = Some(now);
        }
    }

    pub fn reset(&mut self) {
        self.time = 0.0;
        self.manual_time = 0.0;
    }

    pub fn set_manual_time(&mut self, t: f64) {
        self.manual_time = t;
        self.manual = true;
        self.playing = false;
    }

    pub fn label(&self) -> &'static str {
        if self.manual {
            "manual"
        } else if self.playing {
            "playing"
        } else {
            "paused"
        }
    }
}

/// Rolling frame statistics for display. Not used for control.
#[derive(Debug, Clone)]
pub struct FrameStats {
    window_start: Option<Instant>,
    frames: u32,
    fps: f64,
    frame_ms: f64,
    history: VecDeque<f64>,
}

impl Default for FrameStats {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameStats {
    pub fn new() -> Self {
        Self {
            window_start: None,
            frames: 0,
            fps: 0.0,
            frame_ms: 0.0,
            history: VecDeque::with_capacity(FPS_HISTORY_LEN),
        }
    }

    pub fn record(&mut self, now: Instant, frame_ms: f64) {
        self.frame_ms = frame_ms;
        let Some(start) = self.window_start else {
            self.window_start = Some(now);
            self.frames = 1;
            return;
        };
        self.frames += 1;
        let dt = now.saturating_duration_since(start);
        if dt >= FPS_WINDOW {
            self.fps = (self.frames as f64 / dt.as_secs_f64()).round();
            self.frames = 0;
            self.window_start = Some(now);
            if self.history.len() == FPS_HISTORY_LEN {
                self.history.pop_front();
            }
            self.history.push_back(self.fps);
        }
    }

    pub fn fps(&self) -> f64 {
        self.fps
    }

    pub fn frame_ms(&self) -> f64 {
        self.frame_ms
    }

    pub fn history(&self) -> impl Iterator<Item = f64> + '_ {
        self.history.iter().copied()
    }
}

/// Shader surface size for an output surface and resolution scale. Each
/// axis stays within `1..=MAX_SHADER_DIM`.
pub fn shader_resolution(width: usize, height: usize, scale: f64) -> (usize, usize) {
    let s = if scale.is_finite() && scale > 0.0 {
        scale.min(MAX_RESOLUTION_SCALE)
    } else {
        1.0
    };
    let axis = |n: usize| ((n as f64 * s).round() as usize).clamp(1, MAX_SHADER_DIM);
    (axis(width), axis(height))
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameReport {
    pub time: f64,
    pub shader_width: usize,
    pub shader_height: usize,
    pub render_ms: f64,
}

/// Owns the surfaces and advances one frame per call to [`FrameDriver::tick`].
pub struct FrameDriver {
    out_w: usize,
    out_h: usize,
    scale: f64,
    shader: PixelBuffer,
    output: Vec<u8>,
    pub clock: ShaderClock,
    pub stats: FrameStats,
    pub terms: TermToggles,
    pub clamp: ClampPolicy,
}

impl FrameDriver {
    pub fn new(clock: ShaderClock, terms: TermToggles, clamp: ClampPolicy) -> Self {
        Self {
            out_w: 0,
            out_h: 0,
            scale: 1.0,
            shader: PixelBuffer::default(),
            output: Vec::new(),
            clock,
            stats: FrameStats::new(),
            terms,
            clamp,
        }
    }

    /// New output surface size. The shader surface follows before the next tick.
    pub fn resize(&mut self, width: usize, height: usize) {
        self.out_w = width;
        self.out_h = height;
        self.sync_shader_surface();
    }

    fn set_scale(&mut self, scale: f64) {
        if scale != self.scale {
            self.scale = scale;
            self.sync_shader_surface();
        }
    }

    fn sync_shader_surface(&mut self) {
        let (w, h) = shader_resolution(self.out_w, self.out_h, self.scale);
        if (w, h) != (self.shader.width, self.shader.height) {
            log::debug!(
                "shader surface {}x{} (output {}x{}, scale {:.2})",
                w,
                h,
                self.out_w,
                self.out_h,
                self.scale
            );
            self.shader.resize(w, h);
        }
    }

    pub fn output_size(&self) -> (usize, usize) {
        (self.out_w, self.out_h)
    }

    pub fn shader_size(&self) -> (usize, usize) {
        (self.shader.width, self.shader.height)
    }

    /// One display refresh: snapshot parameters, advance time, evaluate every
    /// pixel, scale to the output surface.
    pub fn tick(&mut self, now: Instant, store: &ParameterStore) -> FrameReport {
        let params = store.snapshot();
        self.set_scale(params.resolution_scale);
        let time = self.clock.advance(now, params.time_speed);

        let start = Instant::now();
        if self.out_w > 0 && self.out_h > 0 {
            rasterize(&mut self.shader, time, &params, self.terms, self.clamp);
            resample_nearest(&self.shader, self.out_w, self.out_h, &mut self.output);
        }
        let render_ms = start.elapsed().as_secs_f64() * 1000.0;
        self.stats.record(now, render_ms);

        FrameReport {
            time,
            shader_width: self.shader.width,
            shader_height: self.shader.height,
            render_ms,
        }
    }

    /// Last frame at output size.
    pub fn output(&self) -> &[u8] {
        &self.output
    }

    /// Last frame at shader resolution.
    pub fn shader_frame(&self) -> &PixelBuffer {
        &self.shader
    }
}
