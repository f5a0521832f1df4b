use crate::presets::{Preset, QualityTier};
use crate::shader::{ClampPolicy, TermToggles};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "cosmic-shader",
    version,
    about = "Real-time fractal/plasma shader visualizer for truecolor terminals"
)]
pub struct Config {
    #[arg(long, value_enum, default_value_t = RendererMode::HalfBlock)]
    pub renderer: RendererMode,

    #[arg(long, default_value_t = 60)]
    pub fps: u32,

    #[arg(long, value_enum)]
    pub preset: Option<Preset>,

    #[arg(long, value_enum)]
    pub quality: Option<QualityTier>,

    /// Exported settings JSON to start from (applied before --preset/--quality).
    #[arg(long, value_name = "JSON")]
    pub settings: Option<PathBuf>,

    /// Peel-back term list, e.g. `-rotation,-drift,freeze_time`.
    #[arg(long, value_name = "TERMS", value_parser = parse_terms, default_value = "all")]
    pub terms: TermToggles,

    /// Overrides the time speed after preset and quality are applied.
    #[arg(long, value_name = "X")]
    pub time_speed: Option<f64>,

    #[arg(long, value_enum, default_value_t = ClampPolicy::Unclamped)]
    pub clamp: ClampPolicy,

    #[arg(long, default_value_t = false)]
    pub paused: bool,

    /// Directory for screenshots and exported settings.
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub output_dir: PathBuf,

    /// Log destination; the terminal itself is occupied by the image.
    #[arg(long, value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    pub auto_probe: bool,

    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    pub sync_updates: bool,

    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    pub hud: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RendererMode {
    #[value(name = "half-block", alias = "halfblock", alias = "half_block", alias = "hb")]
    HalfBlock,
    Kitty,
}

impl RendererMode {
    /// Shader pixels per terminal cell, `(columns, rows)`.
    pub fn cell_pixels(self) -> (usize, usize) {
        match self {
            Self::HalfBlock => (1, 2),
            Self::Kitty => (2, 4),
        }
    }
}

/// `all` (or empty) means the default set.
pub fn parse_terms(s: &str) -> Result<TermToggles, String> {
    let trimmed = s.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("all") {
        return Ok(TermToggles::default());
    }
    TermToggles::parse(trimmed).map_err(|e| e.to_string())
}
