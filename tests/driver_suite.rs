use std::time::{Duration, Instant};

use cosmic_shader::driver::{
    FPS_HISTORY_LEN, FrameDriver, FrameStats, MAX_SHADER_DIM, ShaderClock, shader_resolution,
};
use cosmic_shader::params::{MAX_RESOLUTION_SCALE, ParameterStore};
use cosmic_shader::shader::{ClampPolicy, TermToggles};

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

#[test]
fn clock_integrates_speed_without_jumps() {
    let t0 = Instant::now();
    let mut clock = ShaderClock::new(true);
    assert_eq!(clock.advance(t0, 1.0), 0.0);
    assert!((clock.advance(t0 + ms(1000), 1.0) - 1.0).abs() < 1e-9);
    // Speed change only affects time from here on.
    assert!((clock.advance(t0 + ms(1000), 3.0) - 1.0).abs() < 1e-9);
    assert!((clock.advance(t0 + ms(1500), 3.0) - 2.5).abs() < 1e-9);
}

#[test]
fn paused_clock_holds_and_resumes_without_catch_up() {
    let t0 = Instant::now();
    let mut clock = ShaderClock::new(true);
    clock.advance(t0, 1.0);
    clock.advance(t0 + ms(500), 1.0);

    clock.toggle_play(t0 + ms(500));
    assert!(!clock.is_playing());
    assert_eq!(clock.label(), "paused");
    assert!((clock.advance(t0 + ms(4000), 1.0) - 0.5).abs() < 1e-9);

    clock.toggle_play(t0 + ms(4000));
    assert!((clock.advance(t0 + ms(4250), 1.0) - 0.75).abs() < 1e-9);
}

#[test]
fn starting_paused_keeps_time_at_zero() {
    let t0 = Instant::now();
    let mut clock = ShaderClock::new(false);
    clock.advance(t0, 1.0);
    assert_eq!(clock.advance(t0 + ms(2000), 1.0), 0.0);
}

#[test]
fn manual_time_pauses_and_play_returns_to_live_time() {
    let t0 = Instant::now();
    let mut clock = ShaderClock::new(true);
    clock.advance(t0, 1.0);
    clock.advance(t0 + ms(2000), 1.0);

    clock.set_manual_time(10.0);
    assert!(clock.is_manual());
    assert_eq!(clock.label(), "manual");
    assert_eq!(clock.advance(t0 + ms(3000), 1.0), 10.0);

    clock.toggle_play(t0 + ms(3000));
    assert!(!clock.is_manual());
    assert!((clock.advance(t0 + ms(3500), 1.0) - 2.5).abs() < 1e-9);
}

#[test]
fn reset_returns_time_to_zero() {
    let t0 = Instant::now();
    let mut clock = ShaderClock::new(true);
    clock.advance(t0, 1.0);
    clock.advance(t0 + ms(1200), 2.0);
    clock.reset();
    assert_eq!(clock.time(), 0.0);
    assert!((clock.advance(t0 + ms(1700), 2.0) - 1.0).abs() < 1e-9);
}

#[test]
fn fps_is_counted_over_one_second_windows() {
    let t0 = Instant::now();
    let mut stats = FrameStats::new();
    stats.record(t0, 4.0);
    assert_eq!(stats.fps(), 0.0);
    for i in 1..=30u64 {
        stats.record(t0 + ms(i * 1000 / 30), 5.0);
    }
    assert_eq!(stats.fps(), 31.0);
    assert_eq!(stats.frame_ms(), 5.0);
    assert_eq!(stats.history().collect::<Vec<_>>(), vec![31.0]);
}

#[test]
fn fps_history_is_capped() {
    let t0 = Instant::now();
    let mut stats = FrameStats::new();
    stats.record(t0, 1.0);
    for i in 1..=(FPS_HISTORY_LEN as u64 + 20) {
        stats.record(t0 + ms(i * 1000), 1.0);
    }
    assert_eq!(stats.history().count(), FPS_HISTORY_LEN);
}

#[test]
fn shader_resolution_rounds_and_never_collapses() {
    assert_eq!(shader_resolution(800, 600, 1.0), (800, 600));
    assert_eq!(shader_resolution(800, 600, 0.5), (400, 300));
    assert_eq!(shader_resolution(801, 601, 0.5), (401, 301));
    assert_eq!(shader_resolution(3, 3, 0.1), (1, 1));
    assert_eq!(shader_resolution(10, 10, f64::NAN), (10, 10));
}

#[test]
fn shader_resolution_is_capped() {
    assert_eq!(shader_resolution(160, 96, 1e9), (640, 384));
    assert_eq!(shader_resolution(100_000, 3, 4.0), (MAX_SHADER_DIM, 12));
}

#[test]
fn driver_ticks_at_the_largest_accepted_scale() {
    let t0 = Instant::now();
    let mut store = ParameterStore::new();
    store.set_resolution_scale("4").unwrap();
    assert!(store.set_resolution_scale("1e9").is_err());
    assert_eq!(store.params().resolution_scale, MAX_RESOLUTION_SCALE);

    let mut driver = FrameDriver::new(
        ShaderClock::new(true),
        TermToggles::default(),
        ClampPolicy::Unclamped,
    );
    driver.resize(160, 96);
    let report = driver.tick(t0, &store);
    assert_eq!((report.shader_width, report.shader_height), (640, 384));
    assert_eq!(driver.shader_frame().pixels.len(), 640 * 384 * 4);
    assert_eq!(driver.output().len(), 160 * 96 * 4);
}

#[test]
fn driver_renders_at_scaled_size_and_outputs_full_size() {
    let t0 = Instant::now();
    let mut store = ParameterStore::new();
    store.set_resolution_scale("0.5").unwrap();

    let mut driver = FrameDriver::new(
        ShaderClock::new(true),
        TermToggles::default(),
        ClampPolicy::Unclamped,
    );
    driver.resize(40, 24);
    let report = driver.tick(t0, &store);
    assert_eq!((report.shader_width, report.shader_height), (20, 12));
    assert_eq!(driver.shader_size(), (20, 12));
    assert_eq!(driver.shader_frame().pixels.len(), 20 * 12 * 4);
    assert_eq!(driver.output().len(), 40 * 24 * 4);
    assert!(driver.output().chunks_exact(4).all(|px| px[3] == 255));

    store.set_resolution_scale("2").unwrap();
    let report = driver.tick(t0 + ms(16), &store);
    assert_eq!((report.shader_width, report.shader_height), (80, 48));
    assert_eq!(driver.output_size(), (40, 24));
    assert_eq!(driver.output().len(), 40 * 24 * 4);
}

#[test]
fn driver_time_follows_time_speed() {
    let t0 = Instant::now();
    let mut store = ParameterStore::new();
    store.set_time_speed("2").unwrap();
    let mut driver = FrameDriver::new(
        ShaderClock::new(true),
        TermToggles::default(),
        ClampPolicy::Clamp,
    );
    driver.resize(4, 4);
    driver.tick(t0, &store);
    let report = driver.tick(t0 + ms(250), &store);
    assert!((report.time - 0.5).abs() < 1e-9);
}
