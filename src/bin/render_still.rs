use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Parser;
use cosmic_shader::config::parse_terms;
use cosmic_shader::driver::{MAX_MANUAL_TIME, MAX_SHADER_DIM, shader_resolution};
use cosmic_shader::export;
use cosmic_shader::params::{ParamKey, ParameterStore};
use cosmic_shader::presets::{Preset, QualityTier};
use cosmic_shader::raster::{PixelBuffer, rasterize, resample_nearest};
use cosmic_shader::shader::{ClampPolicy, TermToggles};

const MAX_DIMENSION: usize = MAX_SHADER_DIM;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "render_still",
    version,
    about = "Render one shader frame to a PNG without a terminal"
)]
pub(crate) struct Cli {
    #[arg(long, default_value_t = 800)]
    pub(crate) width: usize,

    #[arg(long, default_value_t = 600)]
    pub(crate) height: usize,

    /// Shader time in seconds.
    #[arg(long, default_value_t = 0.0)]
    pub(crate) time: f64,

    #[arg(long, value_enum)]
    pub(crate) preset: Option<Preset>,

    #[arg(long, value_enum)]
    pub(crate) quality: Option<QualityTier>,

    #[arg(long, value_name = "JSON")]
    pub(crate) settings: Option<PathBuf>,

    /// `name=value` overrides applied last, e.g. `--set iterations=30`.
    #[arg(long = "set", value_name = "KEY=VALUE")]
    pub(crate) overrides: Vec<String>,

    #[arg(long, value_name = "TERMS", value_parser = parse_terms, default_value = "all")]
    pub(crate) terms: TermToggles,

    #[arg(long, value_enum, default_value_t = ClampPolicy::Unclamped)]
    pub(crate) clamp: ClampPolicy,

    /// Output file; defaults to a timestamped name in the working directory.
    #[arg(long, value_name = "PNG")]
    pub(crate) out: Option<PathBuf>,
}

pub(crate) fn validate_args(args: &Cli) -> Result<()> {
    if args.width == 0 || args.width > MAX_DIMENSION {
        bail!("--width must be in 1..={MAX_DIMENSION}");
    }
    if args.height == 0 || args.height > MAX_DIMENSION {
        bail!("--height must be in 1..={MAX_DIMENSION}");
    }
    if !args.time.is_finite() || args.time.abs() > MAX_MANUAL_TIME {
        bail!("--time must be a number within ±{MAX_MANUAL_TIME:e}");
    }
    Ok(())
}

/// Same layering as the interactive app: settings file, preset, quality tier,
/// then per-key overrides.
pub(crate) fn build_store(args: &Cli) -> Result<ParameterStore> {
    let mut store = match &args.settings {
        Some(path) => {
            let params = export::import_settings(path)
                .with_context(|| format!("load settings from {}", path.display()))?;
            ParameterStore::with_params(params)?
        }
        None => ParameterStore::new(),
    };
    if let Some(preset) = args.preset {
        store.load_preset(preset);
    }
    if let Some(tier) = args.quality {
        store.apply_quality(tier);
    }
    for item in &args.overrides {
        let Some((name, raw)) = item.split_once('=') else {
            bail!("--set expects KEY=VALUE, got '{item}'");
        };
        let key = ParamKey::parse(name).with_context(|| format!("unknown parameter '{name}'"))?;
        store.set(key, raw)?;
    }
    Ok(store)
}

/// Shader surface follows the resolution scale and is then resampled to the
/// requested size, exactly as the live view does.
pub(crate) fn render(args: &Cli, store: &ParameterStore) -> PixelBuffer {
    let params = store.snapshot();
    let (sw, sh) = shader_resolution(args.width, args.height, params.resolution_scale);
    let mut shader = PixelBuffer::new(sw, sh);
    rasterize(&mut shader, args.time, &params, args.terms, args.clamp);

    let mut out = PixelBuffer {
        width: args.width,
        height: args.height,
        pixels: Vec::new(),
    };
    resample_nearest(&shader, args.width, args.height, &mut out.pixels);
    out
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Cli::parse();
    validate_args(&args)?;
    let store = build_store(&args)?;

    let started = std::time::Instant::now();
    let frame = render(&args, &store);
    log::info!(
        "rendered {}x{} at t={} in {:.1} ms (terms={})",
        frame.width,
        frame.height,
        args.time,
        started.elapsed().as_secs_f64() * 1000.0,
        args.terms.describe()
    );

    let path = args
        .out
        .clone()
        .unwrap_or_else(|| PathBuf::from(export::screenshot_file_name(export::unix_millis())));
    export::save_png(&path, &frame).with_context(|| format!("write {}", path.display()))?;
    println!("{}", path.display());
    Ok(())
}
