//! Math overlay: the recurrence written out with live values, and a probe
//! that reports what the shader sees at one surface position.

use crate::params::ParameterSet;
use crate::shader::Vec2;
use std::f64::consts::PI;
use std::fmt::Write as _;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProbeAnalysis {
    pub time: f64,
    pub coords: Vec2,
    pub iteration: u32,
    pub iteration_count: u32,
    pub rotation_deg: f64,
    pub distance: f64,
}

/// Shader coordinates for a normalized surface position (`0..1` on both
/// axes, y up).
pub fn transform_coordinates(pos: Vec2, width: f64, height: f64, coord_scale: f64) -> Vec2 {
    let h = height.max(1.0);
    let px = pos.x * width;
    let py = pos.y * height;
    Vec2::new(
        coord_scale * (px + px - width) / h,
        coord_scale * (py + py - height) / h,
    )
}

pub fn analyze(pos: Vec2, width: f64, height: f64, time: f64, params: &ParameterSet) -> ProbeAnalysis {
    let coords = transform_coordinates(pos, width, height, params.coord_scale);
    let iteration_count = params.iterations.max(0.0).floor() as u32;
    // Which loop step "is running" is a display convention: ten steps per second.
    let iteration = if params.iterations >= 1.0 {
        (time * 10.0).rem_euclid(params.iterations).floor() as u32
    } else {
        0
    };
    let rotation_deg = (iteration as f64 + 0.02 * time) * 180.0 / PI;
    ProbeAnalysis {
        time,
        coords,
        iteration,
        iteration_count,
        rotation_deg,
        distance: coords.length(),
    }
}

impl ProbeAnalysis {
    pub fn lines(&self) -> Vec<String> {
        vec![
            format!("time      {:.3}s", self.time),
            format!("coords    ({:.3}, {:.3})", self.coords.x, self.coords.y),
            format!("iteration {}/{}", self.iteration, self.iteration_count),
            format!("rotation  {:.2} deg", self.rotation_deg),
            format!("distance  {:.3}", self.distance),
        ]
    }
}

/// The loop as it currently runs, with parameter values substituted.
pub fn formula_text(params: &ParameterSet) -> String {
    let mut s = String::new();
    let _ = writeln!(s, "u = {:.2}*(u+u-v)/v.y", params.coord_scale);
    let _ = writeln!(
        s,
        "for (i=0; i<{}; i++) {{",
        params.iterations.max(0.0).floor() as u32
    );
    let _ = writeln!(
        s,
        "  // rotation (speed {:.2}x)",
        params.rotation_speed
    );
    let _ = writeln!(s, "  u *= mat2(cos(i + .02*t - vec4(0,11,33,0)))");
    let _ = writeln!(s, "  // stabilization (strength {})", params.stabilization);
    let _ = writeln!(
        s,
        "  u += tanh({}*dot(u,u)*cos(1e2*u.yx + t))/2e2",
        params.stabilization
    );
    let _ = writeln!(s, "  // wave frequency {:.2}x", params.wave_freq);
    let _ = writeln!(s, "  o += (1+cos(z+t)) / length(sin(...))");
    s.push('}');
    s
}

/// Overlay body: formula plus probe readout.
pub fn overlay_text(probe: &ProbeAnalysis, params: &ParameterSet) -> String {
    let mut s = String::from("Math overlay\n");
    s.push_str(&formula_text(params));
    s.push_str("\n\nprobe\n");
    s.push_str(&probe.lines().join("\n"));
    s
}
