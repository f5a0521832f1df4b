use cosmic_shader::driver::MAX_MANUAL_TIME;
use cosmic_shader::params::{
    MAX_GAIN, MAX_ITERATIONS, MAX_MAGNITUDE, MAX_RESOLUTION_SCALE, ParameterSet, ParameterStore,
};
use cosmic_shader::presets::Preset;
use cosmic_shader::raster::{PixelBuffer, rasterize};
use cosmic_shader::shader::{
    ClampPolicy, Rgba, Term, TermToggles, Vec2, compute_color, compute_color_with, grade,
};

const RES: Vec2 = Vec2 { x: 800.0, y: 600.0 };
const CENTRE: Vec2 = Vec2 { x: 400.0, y: 300.0 };

fn assert_close(actual: Rgba, expected: [f64; 3], tol: f64) {
    let got = [actual.r, actual.g, actual.b];
    for (c, (g, e)) in got.iter().zip(expected.iter()).enumerate() {
        assert!(
            (g - e).abs() <= tol,
            "channel {c}: got {g}, expected {e} (tol {tol})"
        );
    }
    assert_eq!(actual.a, 1.0);
}

/// Pixels, times and resolutions that cover the centre, the edges and odd
/// aspect ratios.
fn sample_points() -> Vec<(Vec2, Vec2, f64)> {
    let mut pts = Vec::new();
    for &(w, h) in &[(800.0, 600.0), (1.0, 1.0), (37.0, 211.0), (1920.0, 1080.0)] {
        for &fx in &[0.0, 0.13, 0.5, 0.77, 1.0] {
            for &fy in &[0.0, 0.31, 0.5, 0.9, 1.0] {
                for &t in &[0.0, 1.7, 42.0, 1234.5] {
                    pts.push((Vec2::new(fx * w, fy * h), Vec2::new(w, h), t));
                }
            }
        }
    }
    pts
}

#[test]
fn golden_default_centre_at_time_zero() {
    let c = compute_color(CENTRE, RES, 0.0, &ParameterSet::default());
    assert_close(
        c,
        [1.9675475718799922, 1.9649166798200237, 1.7622004767416928],
        1e-9,
    );
}

#[test]
fn golden_off_centre_pixel() {
    let c = compute_color(Vec2::new(123.5, 456.5), RES, 3.25, &ParameterSet::default());
    assert_close(
        c,
        [0.3631904297793054, 0.5600970948282852, 0.6669419476098398],
        1e-9,
    );
}

#[test]
fn zero_iterations_ignore_time_and_coord_scale() {
    let mut p = ParameterSet::default();
    p.iterations = 0.0;
    let expected = [0.15515151515151515, 0.3047619047619048, 0.44393063583815034];
    for &t in &[0.0, 5.0, 99.9] {
        for &cs in &[0.05, 0.2, 0.7] {
            p.coord_scale = cs;
            assert_close(compute_color(CENTRE, RES, t, &p), expected, 1e-12);
        }
    }
}

#[test]
fn output_is_finite_for_presets_and_extremes() {
    let mut sets: Vec<ParameterSet> = Preset::all()
        .into_iter()
        .map(|preset| {
            let mut p = ParameterSet::default();
            preset.apply_to(&mut p);
            p
        })
        .collect();
    sets.push(ParameterSet {
        iterations: MAX_ITERATIONS,
        coord_scale: 5.0,
        rotation_speed: 50.0,
        stabilization: 1000.0,
        wave_freq: 20.0,
        brightness: 10.0,
        saturation: 5.0,
        color_channels: [10.0, 0.0, 3.0],
        resolution_scale: 2.0,
        time_speed: 10.0,
    });
    sets.push(ParameterSet {
        iterations: 1.0,
        coord_scale: 1e-6,
        rotation_speed: 0.0,
        stabilization: 0.0,
        wave_freq: 0.0,
        brightness: 0.0,
        saturation: 0.0,
        color_channels: [0.0, 0.0, 0.0],
        resolution_scale: 0.1,
        time_speed: 0.0,
    });

    for p in &sets {
        for (pixel, res, t) in sample_points() {
            let c = compute_color(pixel, res, t, p);
            assert!(c.is_finite(), "{c:?} at {pixel:?} {res:?} t={t} for {p:?}");
        }
    }
}

/// The largest and most negative values the store accepts.
fn boundary_sets() -> Vec<ParameterSet> {
    let top = ParameterSet {
        iterations: MAX_ITERATIONS,
        coord_scale: MAX_MAGNITUDE,
        rotation_speed: MAX_MAGNITUDE,
        stabilization: MAX_MAGNITUDE,
        wave_freq: MAX_MAGNITUDE,
        brightness: MAX_GAIN,
        saturation: MAX_GAIN,
        color_channels: [MAX_GAIN; 3],
        resolution_scale: MAX_RESOLUTION_SCALE,
        time_speed: MAX_MAGNITUDE,
    };
    let bottom = ParameterSet {
        coord_scale: -MAX_MAGNITUDE,
        rotation_speed: -MAX_MAGNITUDE,
        stabilization: -MAX_MAGNITUDE,
        wave_freq: -MAX_MAGNITUDE,
        color_channels: [MAX_GAIN, 0.0, MAX_GAIN],
        time_speed: -MAX_MAGNITUDE,
        ..top
    };
    vec![top, bottom]
}

#[test]
fn output_is_finite_at_the_accepted_bounds() {
    for p in boundary_sets() {
        // Anything the store lets through must render.
        ParameterStore::with_params(p).unwrap();
        for (pixel, res, t) in sample_points() {
            let c = compute_color(pixel, res, t, &p);
            assert!(c.is_finite(), "{c:?} at {pixel:?} {res:?} t={t} for {p:?}");
        }
        for t in [MAX_MANUAL_TIME, -MAX_MANUAL_TIME] {
            let c = compute_color(Vec2::new(17.0, 333.0), RES, t, &p);
            assert!(c.is_finite(), "{c:?} at t={t}");
        }
    }
}

#[test]
fn huge_gains_never_reach_the_shader() {
    let mut store = ParameterStore::new();
    assert!(store.set_brightness("1e200").is_err());
    assert!(store.set_color_channels("1e200", "1", "1").is_err());
    let c = compute_color(CENTRE, RES, 0.0, store.params());
    assert!(c.is_finite());
}

#[test]
fn every_single_peel_back_stays_finite() {
    let p = ParameterSet::default();
    for term in Term::all() {
        let mut terms = TermToggles::default();
        terms.toggle(term);
        for (pixel, res, t) in sample_points() {
            let c = compute_color_with(pixel, res, t, &p, terms);
            assert!(c.is_finite(), "{} gave {c:?} at {pixel:?}", term.as_str());
        }
    }
}

#[test]
fn radial_singularity_ring_is_guarded() {
    // dot(u, u) == 0.5 exactly on this pixel: u = (0.5, 0.5).
    let mut p = ParameterSet::default();
    p.coord_scale = 1.0;
    let res = Vec2::new(4.0, 4.0);
    let c = compute_color(Vec2::new(3.0, 3.0), res, 0.0, &p);
    assert!(c.is_finite());
}

#[test]
fn saturation_zero_is_grayscale_and_one_is_identity() {
    let mut p = ParameterSet::default();
    p.color_channels = [1.2, 0.8, 1.1];
    p.saturation = 0.0;
    let (r, g, b) = grade(0.3, 0.6, 0.9, &p);
    let lum = 0.3 * 1.2 * 0.299 + 0.6 * 0.8 * 0.587 + 0.9 * 1.1 * 0.114;
    for v in [r, g, b] {
        assert!((v - lum).abs() < 1e-12);
    }

    p.saturation = 1.0;
    let (r, g, b) = grade(0.3, 0.6, 0.9, &p);
    assert!((r - 0.36).abs() < 1e-12);
    assert!((g - 0.48).abs() < 1e-12);
    assert!((b - 0.99).abs() < 1e-12);
}

#[test]
fn doubling_brightness_doubles_rgb() {
    let mut p = ParameterSet::default();
    let pixel = Vec2::new(211.0, 97.0);
    let base = compute_color(pixel, RES, 2.5, &p);
    p.brightness *= 2.0;
    let doubled = compute_color(pixel, RES, 2.5, &p);
    assert!((doubled.r - 2.0 * base.r).abs() < 1e-9);
    assert!((doubled.g - 2.0 * base.g).abs() < 1e-9);
    assert!((doubled.b - 2.0 * base.b).abs() < 1e-9);
}

#[test]
fn repeated_calls_are_bit_identical() {
    let p = ParameterSet::default();
    for (pixel, res, t) in sample_points().into_iter().take(50) {
        let a = compute_color(pixel, res, t, &p);
        let b = compute_color(pixel, res, t, &p);
        assert_eq!(a.r.to_bits(), b.r.to_bits());
        assert_eq!(a.g.to_bits(), b.g.to_bits());
        assert_eq!(a.b.to_bits(), b.b.to_bits());
    }
}

#[test]
fn freeze_time_ignores_time() {
    let p = ParameterSet::default();
    let terms = TermToggles::parse("freeze_time").unwrap();
    let pixel = Vec2::new(150.0, 420.0);
    let a = compute_color_with(pixel, RES, 0.0, &p, terms);
    let b = compute_color_with(pixel, RES, 77.7, &p, terms);
    assert_eq!(a, b);
}

#[test]
fn disabling_grading_returns_tone_mapped_accumulator() {
    let mut p = ParameterSet::default();
    p.brightness = 3.0;
    p.saturation = 0.0;
    let terms = TermToggles::parse("-grading").unwrap();
    let graded_off = compute_color_with(CENTRE, RES, 0.0, &p, terms);
    let defaults = compute_color(CENTRE, RES, 0.0, &ParameterSet::default());
    assert_eq!(graded_off, defaults);
}

#[test]
fn clamp_policy_only_differs_out_of_range() {
    let c = Rgba::new(1.7, -0.2, 0.5, 1.0);
    assert_eq!(ClampPolicy::Unclamped.apply(c), c);
    assert_eq!(ClampPolicy::Clamp.apply(c), Rgba::new(1.0, 0.0, 0.5, 1.0));
    // Quantization saturates either way.
    assert_eq!(c.to_rgba8(), [255, 0, 128, 255]);
}

#[test]
fn rasterized_rows_are_y_flipped() {
    let p = ParameterSet::default();
    let mut buf = PixelBuffer::new(8, 6);
    rasterize(&mut buf, 1.0, &p, TermToggles::default(), ClampPolicy::Unclamped);
    assert_eq!(buf.pixels.len(), 8 * 6 * 4);

    let res = Vec2::new(8.0, 6.0);
    let bottom_left = compute_color(Vec2::new(0.5, 0.5), res, 1.0, &p).to_rgba8();
    let top_left = compute_color(Vec2::new(0.5, 5.5), res, 1.0, &p).to_rgba8();
    assert_eq!(buf.pixel(0, 5), bottom_left);
    assert_eq!(buf.pixel(0, 0), top_left);
}
