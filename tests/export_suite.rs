use clap::Parser;
#[path = "../src/bin/render_still.rs"]
#[allow(dead_code)]
mod render_still;

use std::path::PathBuf;

use cosmic_shader::export::{
    ExportError, export_settings, import_settings, parse_settings, save_png, save_screenshot,
    screenshot_file_name, settings_file_name, settings_json,
};
use cosmic_shader::params::{ParamError, ParamKey, ParameterSet};
use cosmic_shader::presets::{Preset, QualityTier};
use cosmic_shader::raster::PixelBuffer;
use cosmic_shader::shader::{ClampPolicy, Term};

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "cosmic-shader-{}-{}",
        name,
        std::process::id()
    ));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).expect("create scratch dir");
    dir
}

#[test]
fn export_record_has_flat_camel_case_keys() {
    let json = settings_json(&ParameterSet::default()).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    let obj = value.as_object().unwrap();
    for key in [
        "iterations",
        "coordScale",
        "rotationSpeed",
        "stabilization",
        "waveFreq",
        "brightness",
        "saturation",
        "colorChannels",
        "resolutionScale",
        "timeSpeed",
    ] {
        assert!(obj.contains_key(key), "missing {key} in {json}");
    }
    assert_eq!(obj.len(), 10);
    assert_eq!(value["colorChannels"], serde_json::json!([1.0, 1.0, 1.0]));
    // Pretty-printed.
    assert!(json.contains('\n'));
}

#[test]
fn export_then_import_round_trips() {
    let dir = scratch_dir("roundtrip");
    let mut params = ParameterSet::default();
    Preset::Chaotic.apply_to(&mut params);
    QualityTier::High.apply_to(&mut params);
    params.time_speed = 0.25;

    let path = export_settings(&dir, &params).unwrap();
    let name = path.file_name().unwrap().to_string_lossy().to_string();
    assert!(name.starts_with("cosmic-shader-settings-"));
    assert!(name.ends_with(".json"));

    assert_eq!(import_settings(&path).unwrap(), params);
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn import_fills_missing_keys_with_defaults() {
    let params = parse_settings(r#"{ "iterations": 7, "brightness": 1.5 }"#).unwrap();
    assert_eq!(params.iterations, 7.0);
    assert_eq!(params.brightness, 1.5);
    assert_eq!(params.coord_scale, ParameterSet::default().coord_scale);
}

#[test]
fn import_rejects_invalid_records() {
    assert!(matches!(
        parse_settings("{ not json"),
        Err(ExportError::Json(_))
    ));
    assert!(matches!(
        parse_settings(r#"{ "iterations": "many" }"#),
        Err(ExportError::Json(_))
    ));
    assert_eq!(
        parse_settings(r#"{ "resolutionScale": 0 }"#).unwrap_err(),
        ExportError::Invalid(ParamError::OutOfRange {
            key: ParamKey::ResolutionScale,
            value: 0.0,
            reason: "must be > 0",
        })
    );
    assert!(matches!(
        parse_settings(r#"{ "resolutionScale": 1e9 }"#),
        Err(ExportError::Invalid(ParamError::OutOfRange { .. }))
    ));
    assert!(matches!(
        import_settings(std::path::Path::new("/definitely/not/here.json")),
        Err(ExportError::Io(_))
    ));
}

#[test]
fn file_names_carry_the_timestamp() {
    assert_eq!(
        settings_file_name(1_700_000_000_123),
        "cosmic-shader-settings-1700000000123.json"
    );
    assert_eq!(
        screenshot_file_name(1_700_000_000_123),
        "cosmic-shader-1700000000123.png"
    );
}

#[test]
fn screenshot_is_a_png_of_the_frame_size() {
    let dir = scratch_dir("shot");
    let mut frame = PixelBuffer::new(7, 5);
    for (i, px) in frame.pixels.chunks_exact_mut(4).enumerate() {
        px.copy_from_slice(&[i as u8, 10, 200, 255]);
    }

    let path = save_screenshot(&dir, &frame).unwrap();
    let bytes = std::fs::read(&path).unwrap();
    assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");

    let decoded = image::open(&path).unwrap().to_rgba8();
    assert_eq!(decoded.dimensions(), (7, 5));
    assert_eq!(decoded.get_pixel(3, 0).0, [3, 10, 200, 255]);
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn save_png_rejects_mismatched_buffer() {
    let dir = scratch_dir("mismatch");
    let frame = PixelBuffer {
        width: 4,
        height: 4,
        pixels: vec![0; 10],
    };
    assert!(matches!(
        save_png(&dir.join("bad.png"), &frame),
        Err(ExportError::Image(_))
    ));
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn render_still_cli_defaults() {
    let args = render_still::Cli::try_parse_from(["render_still"]).expect("defaults parse");
    assert_eq!(args.width, 800);
    assert_eq!(args.height, 600);
    assert_eq!(args.time, 0.0);
    assert_eq!(args.preset, None);
    assert_eq!(args.clamp, ClampPolicy::Unclamped);
    assert!(args.terms.is_default());
    assert!(args.out.is_none());
    render_still::validate_args(&args).expect("defaults are valid");
}

#[test]
fn render_still_cli_overrides() {
    let args = render_still::Cli::try_parse_from([
        "render_still",
        "--width",
        "64",
        "--height",
        "48",
        "--time",
        "2.5",
        "--preset",
        "chaotic",
        "--quality",
        "low",
        "--terms",
        "-drift,freeze_time",
        "--clamp",
        "clamp",
        "--set",
        "brightness=1.4",
        "--out",
        "still.png",
    ])
    .expect("overrides parse");
    assert_eq!(args.preset, Some(Preset::Chaotic));
    assert_eq!(args.quality, Some(QualityTier::Low));
    assert!(!args.terms.get(Term::Drift));
    assert!(args.terms.get(Term::FreezeTime));
    assert_eq!(args.clamp, ClampPolicy::Clamp);

    let store = render_still::build_store(&args).unwrap();
    assert_eq!(store.params().iterations, 8.0);
    assert_eq!(store.params().brightness, 1.4);

    let frame = render_still::render(&args, &store);
    assert_eq!((frame.width, frame.height), (64, 48));
    assert_eq!(frame.pixels.len(), 64 * 48 * 4);
}

#[test]
fn render_still_validation_rejects_bad_sizes() {
    let args = render_still::Cli::try_parse_from(["render_still", "--width", "0"]).unwrap();
    assert!(render_still::validate_args(&args).is_err());

    let args = render_still::Cli::try_parse_from(["render_still", "--set", "warp=1"]).unwrap();
    assert!(render_still::build_store(&args).is_err());

    assert!(render_still::Cli::try_parse_from(["render_still", "--terms", "sparkle"]).is_err());

    let args =
        render_still::Cli::try_parse_from(["render_still", "--set", "resolution-scale=1e9"]).unwrap();
    assert!(render_still::build_store(&args).is_err());

    let args = render_still::Cli::try_parse_from(["render_still", "--time", "1e300"]).unwrap();
    assert!(render_still::validate_args(&args).is_err());
}
