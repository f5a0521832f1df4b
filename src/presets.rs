use crate::params::ParameterSet;
use clap::ValueEnum;

/// Named parameter bundles, applied atomically. They never touch
/// `resolution_scale` or `time_speed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Preset {
    Default,
    Slow,
    #[value(
        name = "high-detail",
        alias = "high_detail",
        alias = "highdetail",
        alias = "detail"
    )]
    HighDetail,
    Chaotic,
    Minimal,
}

struct PresetValues {
    iterations: f64,
    coord_scale: f64,
    rotation_speed: f64,
    stabilization: f64,
    wave_freq: f64,
    brightness: f64,
    saturation: f64,
    color_channels: [f64; 3],
}

impl Preset {
    pub const fn all() -> [Self; 5] {
        [
            Self::Default,
            Self::Slow,
            Self::HighDetail,
            Self::Chaotic,
            Self::Minimal,
        ]
    }

    /// Case-insensitive lookup through the same names and aliases the CLI
    /// accepts.
    pub fn parse(s: &str) -> Option<Self> {
        <Self as ValueEnum>::from_str(s.trim(), true).ok()
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Slow => "slow",
            Self::HighDetail => "high-detail",
            Self::Chaotic => "chaotic",
            Self::Minimal => "minimal",
        }
    }

    fn values(self) -> PresetValues {
        match self {
            Self::Default => PresetValues {
                iterations: 19.0,
                coord_scale: 0.2,
                rotation_speed: 1.0,
                stabilization: 40.0,
                wave_freq: 1.0,
                brightness: 1.0,
                saturation: 1.0,
                color_channels: [1.0, 1.0, 1.0],
            },
            Self::Slow => PresetValues {
                iterations: 19.0,
                coord_scale: 0.2,
                rotation_speed: 0.3,
                stabilization: 40.0,
                wave_freq: 1.0,
                brightness: 1.0,
                saturation: 1.0,
                color_channels: [1.0, 1.0, 1.0],
            },
            Self::HighDetail => PresetValues {
                iterations: 35.0,
                coord_scale: 0.15,
                rotation_speed: 1.0,
                stabilization: 60.0,
                wave_freq: 1.5,
                brightness: 1.2,
                saturation: 1.2,
                color_channels: [1.0, 1.0, 1.0],
            },
            Self::Chaotic => PresetValues {
                iterations: 25.0,
                coord_scale: 0.3,
                rotation_speed: 2.0,
                stabilization: 20.0,
                wave_freq: 2.0,
                brightness: 0.8,
                saturation: 1.5,
                color_channels: [1.2, 0.8, 1.1],
            },
            Self::Minimal => PresetValues {
                iterations: 10.0,
                coord_scale: 0.25,
                rotation_speed: 0.8,
                stabilization: 30.0,
                wave_freq: 0.8,
                brightness: 1.0,
                saturation: 0.8,
                color_channels: [1.0, 1.0, 1.0],
            },
        }
    }

    pub fn apply_to(self, p: &mut ParameterSet) {
        let v = self.values();
        p.iterations = v.iterations;
        p.coord_scale = v.coord_scale;
        p.rotation_speed = v.rotation_speed;
        p.stabilization = v.stabilization;
        p.wave_freq = v.wave_freq;
        p.brightness = v.brightness;
        p.saturation = v.saturation;
        p.color_channels = v.color_channels;
    }
}

/// Render-cost tiers. Each sets iteration count, resolution scale and
/// stabilization together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum QualityTier {
    Low,
    #[value(alias = "med")]
    Medium,
    High,
    Ultra,
}

impl QualityTier {
    pub const fn all() -> [Self; 4] {
        [Self::Low, Self::Medium, Self::High, Self::Ultra]
    }

    pub fn parse(s: &str) -> Option<Self> {
        <Self as ValueEnum>::from_str(s.trim(), true).ok()
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Ultra => "ultra",
        }
    }

    /// `(iterations, resolution_scale, stabilization)`.
    pub fn settings(self) -> (f64, f64, f64) {
        match self {
            Self::Low => (8.0, 0.5, 20.0),
            Self::Medium => (19.0, 1.0, 40.0),
            Self::High => (30.0, 1.5, 60.0),
            Self::Ultra => (50.0, 2.0, 80.0),
        }
    }

    pub fn apply_to(self, p: &mut ParameterSet) {
        let (iterations, resolution_scale, stabilization) = self.settings();
        p.iterations = iterations;
        p.resolution_scale = resolution_scale;
        p.stabilization = stabilization;
    }
}
