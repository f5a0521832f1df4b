//! The per-pixel colour recurrence.
//!
//! Everything here is pure: the same pixel, resolution, time and parameters
//! always produce the same colour. Every division that can reach zero is
//! guarded, so the functions have no error channel and never return NaN or
//! infinity for a parameter set the store accepts.

pub mod math;
pub mod terms;

use crate::params::ParameterSet;
use clap::ValueEnum;

pub use math::{Vec2, Vec4};
pub use terms::{Term, TermToggleError, TermToggles};

/// Floor for `0.5 - dot(u, u)` in the sine-field frequency.
pub const RADIAL_EPS: f64 = 1e-3;
/// Floor for the magnitude term the accumulator is divided by.
pub const MAGNITUDE_EPS: f64 = 1e-4;
/// Floor for the tone-map divisors.
pub const TONE_EPS: f64 = 1e-6;
/// Cap on the energy-nudge exponent; `exp(700)` is still finite in f64.
pub const ENERGY_EXP_CAP: f64 = 700.0;
/// Per-component bound on `u` after each step. Drift grows `u` geometrically
/// at high iteration counts; past this bound the picture is noise anyway.
pub const COORD_CAP: f64 = 1e6;

const ACC_INIT: Vec4 = Vec4::new(1.0, 2.0, 3.0, 0.0);
const ROTATION_PHASE: Vec4 = Vec4::new(0.0, 11.0, 33.0, 0.0);
const LUMA: [f64; 3] = [0.299, 0.587, 0.114];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgba {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    pub a: f64,
}

impl Rgba {
    pub const fn new(r: f64, g: f64, b: f64, a: f64) -> Self {
        Self { r, g, b, a }
    }

    pub fn clamped(self) -> Self {
        Self::new(
            self.r.clamp(0.0, 1.0),
            self.g.clamp(0.0, 1.0),
            self.b.clamp(0.0, 1.0),
            self.a.clamp(0.0, 1.0),
        )
    }

    pub fn is_finite(&self) -> bool {
        self.r.is_finite() && self.g.is_finite() && self.b.is_finite() && self.a.is_finite()
    }

    /// 8-bit quantization. Saturates, so out-of-range channels clip the way a
    /// display surface would.
    pub fn to_rgba8(self) -> [u8; 4] {
        [
            quantize(self.r),
            quantize(self.g),
            quantize(self.b),
            quantize(self.a),
        ]
    }
}

fn quantize(v: f64) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// What happens to the colour before it leaves the pixel function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ClampPolicy {
    /// Clamp every channel to [0, 1].
    Clamp,
    /// Hand the raw graded value on; the output surface clips on quantization.
    #[default]
    Unclamped,
}

impl ClampPolicy {
    pub fn apply(self, c: Rgba) -> Rgba {
        match self {
            Self::Clamp => c.clamped(),
            Self::Unclamped => c,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Clamp => "clamp",
            Self::Unclamped => "unclamped",
        }
    }
}

/// Colour of one pixel with every term enabled.
pub fn compute_color(pixel: Vec2, resolution: Vec2, time: f64, params: &ParameterSet) -> Rgba {
    compute_color_with(pixel, resolution, time, params, TermToggles::default())
}

/// Peel-back variant: each toggle short-circuits exactly one sub-step.
pub fn compute_color_with(
    pixel: Vec2,
    resolution: Vec2,
    time: f64,
    params: &ParameterSet,
    terms: TermToggles,
) -> Rgba {
    let (o, u) = run_recurrence(pixel, resolution, time, params, terms);

    let o = if terms.tone_map { tone_map(o, u) } else { o };
    let (r, g, b) = if terms.grading {
        grade(o.x, o.y, o.z, params)
    } else {
        (o.x, o.y, o.z)
    };
    Rgba::new(r, g, b, 1.0)
}

/// Normalized shader coordinates of a pixel: centred, aspect-corrected by the
/// surface height, then scaled by `coord_scale`.
pub fn normalize_coords(pixel: Vec2, resolution: Vec2, coord_scale: f64) -> Vec2 {
    // Surfaces are at least one pixel tall.
    let height = resolution.y.max(1.0);
    (pixel + pixel - resolution) * coord_scale / height
}

fn run_recurrence(
    pixel: Vec2,
    resolution: Vec2,
    time: f64,
    params: &ParameterSet,
    terms: TermToggles,
) -> (Vec4, Vec2) {
    let mut u = normalize_coords(pixel, resolution, params.coord_scale);
    let mut v = resolution;

    let z = ACC_INIT;
    let mut o = z;

    let mut a = 0.5f64;
    let mut t = if terms.freeze_time {
        0.0
    } else {
        time * params.rotation_speed
    };
    let mut i = 0.0f64;
    let wave = 1.5 * params.wave_freq;

    while i < params.iterations {
        let sfield = if terms.sine_field {
            let radial = if terms.radial_denominator {
                math::floor_signed(0.5 - u.dot(u), RADIAL_EPS)
            } else {
                1.0
            };
            (u * wave / radial - u.yx() * 9.0 + t).map(f64::sin)
        } else {
            Vec2::splat(1.0)
        };

        let den = (sfield * (1.0 + i * v.dot(v))).length().max(MAGNITUDE_EPS);

        if terms.accumulate {
            o = o + z.map(|c| (1.0 + (c + t).cos()) / den);
        }

        if terms.vector_field {
            // `a^i` overflows after a few hundred steps; an infinite phase reads as zero.
            let p = a.powf(i);
            let phase = |c: f64| {
                let x = 7.0 * c * p;
                if x.is_finite() { x } else { 0.0 }
            };
            v = Vec2::new(
                (t + 1.0 - phase(u.x)).cos() - 5.0 * u.x,
                (t + 1.0 - phase(u.y)).cos() - 5.0 * u.y,
            );
        }

        if terms.rotation {
            let base = i + 0.02 * t;
            let m = ROTATION_PHASE.map(|c| (base - c).cos());
            u = Vec2::new(m.x * u.x + m.y * u.y, m.z * u.x + m.w * u.y);
        }

        // Damping, drift and nudge all read the same post-rotation `u`.
        let damping = if terms.tanh_damping {
            let s = params.stabilization * u.dot(u);
            Vec2::new(
                (s * (100.0 * u.y + t).cos()).tanh() / 200.0,
                (s * (100.0 * u.x + t).cos()).tanh() / 200.0,
            )
        } else {
            Vec2::ZERO
        };
        let drift = if terms.drift { u * (0.2 * a) } else { Vec2::ZERO };
        let nudge = if terms.energy_nudge {
            let energy = (o.dot(o) / 100.0).min(ENERGY_EXP_CAP);
            (4.0 / energy.exp() + t).cos() / 300.0
        } else {
            0.0
        };
        u = (u + ((damping + drift) + nudge)).map(|c| c.clamp(-COORD_CAP, COORD_CAP));

        a += 0.03;
        t += 0.5;
        i += 1.0;
    }

    (o, u)
}

fn tone_map(o: Vec4, u: Vec2) -> Vec4 {
    let falloff = u.dot(u) / 250.0;
    o.map(|c| {
        let den = c.min(13.0) + 164.0 / math::floor_signed(c, TONE_EPS);
        25.6 / math::floor_signed(den, TONE_EPS) - falloff
    })
}

/// Brightness, per-channel gain, then saturation around Rec.601 luminance.
pub fn grade(r: f64, g: f64, b: f64, params: &ParameterSet) -> (f64, f64, f64) {
    let [cr, cg, cb] = params.color_channels;
    let r = r * params.brightness * cr;
    let g = g * params.brightness * cg;
    let b = b * params.brightness * cb;
    let luminance = r * LUMA[0] + g * LUMA[1] + b * LUMA[2];
    let s = params.saturation;
    (
        math::mix(luminance, r, s),
        math::mix(luminance, g, s),
        math::mix(luminance, b, s),
    )
}
