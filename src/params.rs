use crate::presets::{Preset, QualityTier};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const PARAM_KEY_COUNT: usize = 12;

/// Upper bound on the loop trip count. Anything larger stalls the frame loop
/// without adding visible detail.
pub const MAX_ITERATIONS: f64 = 1000.0;
/// Upper bound on `resolution_scale`; the shader surface is at most four
/// times the output surface per axis.
pub const MAX_RESOLUTION_SCALE: f64 = 4.0;
/// Upper bound on brightness, saturation and the colour gains. Keeps the
/// graded product finite for any tone-mapped input.
pub const MAX_GAIN: f64 = 100.0;
/// Magnitude bound on the remaining signed parameters.
pub const MAX_MAGNITUDE: f64 = 1000.0;

/// Tunable constants read once per frame by the pixel function. Serializes to
/// the flat export record; keys missing on import keep their defaults.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ParameterSet {
    pub iterations: f64,
    pub coord_scale: f64,
    pub rotation_speed: f64,
    pub stabilization: f64,
    pub wave_freq: f64,
    pub brightness: f64,
    pub saturation: f64,
    pub color_channels: [f64; 3],
    pub resolution_scale: f64,
    pub time_speed: f64,
}

impl Default for ParameterSet {
    fn default() -> Self {
        Self {
            iterations: 19.0,
            coord_scale: 0.2,
            rotation_speed: 1.0,
            stabilization: 40.0,
            wave_freq: 1.0,
            brightness: 1.0,
            saturation: 1.0,
            color_channels: [1.0, 1.0, 1.0],
            resolution_scale: 1.0,
            time_speed: 1.0,
        }
    }
}

impl ParameterSet {
    pub fn get(&self, key: ParamKey) -> f64 {
        match key {
            ParamKey::Iterations => self.iterations,
            ParamKey::CoordScale => self.coord_scale,
            ParamKey::RotationSpeed => self.rotation_speed,
            ParamKey::Stabilization => self.stabilization,
            ParamKey::WaveFreq => self.wave_freq,
            ParamKey::Brightness => self.brightness,
            ParamKey::Saturation => self.saturation,
            ParamKey::ColorR => self.color_channels[0],
            ParamKey::ColorG => self.color_channels[1],
            ParamKey::ColorB => self.color_channels[2],
            ParamKey::ResolutionScale => self.resolution_scale,
            ParamKey::TimeSpeed => self.time_speed,
        }
    }

    fn slot_mut(&mut self, key: ParamKey) -> &mut f64 {
        match key {
            ParamKey::Iterations => &mut self.iterations,
            ParamKey::CoordScale => &mut self.coord_scale,
            ParamKey::RotationSpeed => &mut self.rotation_speed,
            ParamKey::Stabilization => &mut self.stabilization,
            ParamKey::WaveFreq => &mut self.wave_freq,
            ParamKey::Brightness => &mut self.brightness,
            ParamKey::Saturation => &mut self.saturation,
            ParamKey::ColorR => &mut self.color_channels[0],
            ParamKey::ColorG => &mut self.color_channels[1],
            ParamKey::ColorB => &mut self.color_channels[2],
            ParamKey::ResolutionScale => &mut self.resolution_scale,
            ParamKey::TimeSpeed => &mut self.time_speed,
        }
    }

    /// Checks every invariant; reports the first violation.
    pub fn validate(&self) -> Result<(), ParamError> {
        for key in ParamKey::all() {
            validate_value(key, self.get(key))?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamKey {
    Iterations,
    CoordScale,
    RotationSpeed,
    Stabilization,
    WaveFreq,
    Brightness,
    Saturation,
    ColorR,
    ColorG,
    ColorB,
    ResolutionScale,
    TimeSpeed,
}

/// Slider range and step of a control; used for keyboard nudging.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SliderRange {
    pub min: f64,
    pub max: f64,
    pub step: f64,
}

impl ParamKey {
    pub const fn all() -> [Self; PARAM_KEY_COUNT] {
        [
            Self::Iterations,
            Self::CoordScale,
            Self::RotationSpeed,
            Self::Stabilization,
            Self::WaveFreq,
            Self::Brightness,
            Self::Saturation,
            Self::ColorR,
            Self::ColorG,
            Self::ColorB,
            Self::ResolutionScale,
            Self::TimeSpeed,
        ]
    }

    /// Accepts the export name (`coordScale`), the control id (`coord-scale`)
    /// and snake case (`coord_scale`).
    pub fn parse(s: &str) -> Option<Self> {
        let norm = s.trim().to_ascii_lowercase().replace(['-', '_'], "");
        match norm.as_str() {
            "iterations" | "iter" => Some(Self::Iterations),
            "coordscale" | "scale" => Some(Self::CoordScale),
            "rotationspeed" | "rotation" => Some(Self::RotationSpeed),
            "stabilization" | "stab" => Some(Self::Stabilization),
            "wavefreq" | "wave" => Some(Self::WaveFreq),
            "brightness" => Some(Self::Brightness),
            "saturation" => Some(Self::Saturation),
            "colorr" | "red" => Some(Self::ColorR),
            "colorg" | "green" => Some(Self::ColorG),
            "colorb" | "blue" => Some(Self::ColorB),
            "resolutionscale" | "resolution" => Some(Self::ResolutionScale),
            "timespeed" => Some(Self::TimeSpeed),
            _ => None,
        }
    }

    /// Name used in exported snapshots.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Iterations => "iterations",
            Self::CoordScale => "coordScale",
            Self::RotationSpeed => "rotationSpeed",
            Self::Stabilization => "stabilization",
            Self::WaveFreq => "waveFreq",
            Self::Brightness => "brightness",
            Self::Saturation => "saturation",
            Self::ColorR => "colorR",
            Self::ColorG => "colorG",
            Self::ColorB => "colorB",
            Self::ResolutionScale => "resolutionScale",
            Self::TimeSpeed => "timeSpeed",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Iterations => "Iterations",
            Self::CoordScale => "Coord scale",
            Self::RotationSpeed => "Rotation speed",
            Self::Stabilization => "Stabilization",
            Self::WaveFreq => "Wave frequency",
            Self::Brightness => "Brightness",
            Self::Saturation => "Saturation",
            Self::ColorR => "Red gain",
            Self::ColorG => "Green gain",
            Self::ColorB => "Blue gain",
            Self::ResolutionScale => "Resolution scale",
            Self::TimeSpeed => "Time speed",
        }
    }

    pub fn slider(self) -> SliderRange {
        let (min, max, step) = match self {
            Self::Iterations => (1.0, 64.0, 1.0),
            Self::CoordScale => (0.05, 1.0, 0.01),
            Self::RotationSpeed => (0.0, 5.0, 0.05),
            Self::Stabilization => (0.0, 100.0, 1.0),
            Self::WaveFreq => (0.1, 5.0, 0.05),
            Self::Brightness => (0.0, 3.0, 0.05),
            Self::Saturation => (0.0, 3.0, 0.05),
            Self::ColorR | Self::ColorG | Self::ColorB => (0.0, 2.0, 0.05),
            Self::ResolutionScale => (0.25, 2.0, 0.05),
            Self::TimeSpeed => (0.0, 5.0, 0.05),
        };
        SliderRange { min, max, step }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ParamError {
    UnknownKey(String),
    NotANumber { key: ParamKey, raw: String },
    NonFinite { key: ParamKey },
    OutOfRange { key: ParamKey, value: f64, reason: &'static str },
}

impl fmt::Display for ParamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownKey(key) => write!(f, "unknown parameter '{key}'"),
            Self::NotANumber { key, raw } => {
                write!(f, "{}: '{}' is not a number", key.as_str(), raw)
            }
            Self::NonFinite { key } => write!(f, "{}: value must be finite", key.as_str()),
            Self::OutOfRange { key, value, reason } => {
                write!(f, "{}: {} {}", key.as_str(), value, reason)
            }
        }
    }
}

impl std::error::Error for ParamError {}

fn validate_value(key: ParamKey, value: f64) -> Result<(), ParamError> {
    if !value.is_finite() {
        return Err(ParamError::NonFinite { key });
    }
    let reason = match key {
        ParamKey::Iterations if value < 0.0 => "must be >= 0",
        ParamKey::Iterations if value > MAX_ITERATIONS => "must be <= 1000",
        ParamKey::Iterations => return Ok(()),
        ParamKey::ResolutionScale if value <= 0.0 => "must be > 0",
        ParamKey::ResolutionScale if value > MAX_RESOLUTION_SCALE => "must be <= 4",
        ParamKey::ResolutionScale => return Ok(()),
        ParamKey::Brightness
        | ParamKey::Saturation
        | ParamKey::ColorR
        | ParamKey::ColorG
        | ParamKey::ColorB => {
            if value < 0.0 {
                "must be >= 0"
            } else if value > MAX_GAIN {
                "must be <= 100"
            } else {
                return Ok(());
            }
        }
        ParamKey::CoordScale
        | ParamKey::RotationSpeed
        | ParamKey::Stabilization
        | ParamKey::WaveFreq
        | ParamKey::TimeSpeed => {
            if value.abs() > MAX_MAGNITUDE {
                "must be within -1000..=1000"
            } else {
                return Ok(());
            }
        }
    };
    Err(ParamError::OutOfRange { key, value, reason })
}

/// Parses a control value the way the numeric inputs deliver it: surrounding
/// whitespace is ignored, anything else that is not a float is rejected.
pub fn parse_value(key: ParamKey, raw: &str) -> Result<f64, ParamError> {
    let value = raw
        .trim()
        .parse::<f64>()
        .map_err(|_| ParamError::NotANumber {
            key,
            raw: raw.to_string(),
        })?;
    validate_value(key, value)?;
    Ok(value)
}

/// The single writer of the parameter set. Invalid input leaves the previous
/// value in place.
#[derive(Debug, Clone, Default)]
pub struct ParameterStore {
    params: ParameterSet,
}

impl ParameterStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_params(params: ParameterSet) -> Result<Self, ParamError> {
        params.validate()?;
        Ok(Self { params })
    }

    pub fn params(&self) -> &ParameterSet {
        &self.params
    }

    /// Copy for export or for one frame's worth of rendering.
    pub fn snapshot(&self) -> ParameterSet {
        self.params
    }

    pub fn get(&self, key: ParamKey) -> f64 {
        self.params.get(key)
    }

    pub fn set(&mut self, key: ParamKey, raw: &str) -> Result<f64, ParamError> {
        let value = parse_value(key, raw)?;
        *self.params.slot_mut(key) = value;
        Ok(value)
    }

    pub fn set_value(&mut self, key: ParamKey, value: f64) -> Result<f64, ParamError> {
        validate_value(key, value)?;
        *self.params.slot_mut(key) = value;
        Ok(value)
    }

    /// Setter lookup by name, for command input.
    pub fn set_by_name(&mut self, name: &str, raw: &str) -> Result<(ParamKey, f64), ParamError> {
        let key = ParamKey::parse(name).ok_or_else(|| ParamError::UnknownKey(name.to_string()))?;
        self.set(key, raw).map(|v| (key, v))
    }

    pub fn set_iterations(&mut self, raw: &str) -> Result<f64, ParamError> {
        self.set(ParamKey::Iterations, raw)
    }

    pub fn set_coord_scale(&mut self, raw: &str) -> Result<f64, ParamError> {
        self.set(ParamKey::CoordScale, raw)
    }

    pub fn set_rotation_speed(&mut self, raw: &str) -> Result<f64, ParamError> {
        self.set(ParamKey::RotationSpeed, raw)
    }

    pub fn set_stabilization(&mut self, raw: &str) -> Result<f64, ParamError> {
        self.set(ParamKey::Stabilization, raw)
    }

    pub fn set_wave_freq(&mut self, raw: &str) -> Result<f64, ParamError> {
        self.set(ParamKey::WaveFreq, raw)
    }

    pub fn set_brightness(&mut self, raw: &str) -> Result<f64, ParamError> {
        self.set(ParamKey::Brightness, raw)
    }

    pub fn set_saturation(&mut self, raw: &str) -> Result<f64, ParamError> {
        self.set(ParamKey::Saturation, raw)
    }

    /// All three gains at once; nothing changes unless all three parse.
    pub fn set_color_channels(&mut self, r: &str, g: &str, b: &str) -> Result<[f64; 3], ParamError> {
        let rgb = [
            parse_value(ParamKey::ColorR, r)?,
            parse_value(ParamKey::ColorG, g)?,
            parse_value(ParamKey::ColorB, b)?,
        ];
        self.params.color_channels = rgb;
        Ok(rgb)
    }

    pub fn set_resolution_scale(&mut self, raw: &str) -> Result<f64, ParamError> {
        self.set(ParamKey::ResolutionScale, raw)
    }

    pub fn set_time_speed(&mut self, raw: &str) -> Result<f64, ParamError> {
        self.set(ParamKey::TimeSpeed, raw)
    }

    /// Moves a value by whole slider steps, clamped to the slider range.
    pub fn nudge(&mut self, key: ParamKey, steps: i32) -> f64 {
        let range = key.slider();
        let cur = self.get(key);
        let next = (cur + range.step * steps as f64).clamp(range.min, range.max);
        // Snap to the step grid so repeated nudges do not drift.
        let snapped = range.min + ((next - range.min) / range.step).round() * range.step;
        let value = snapped.clamp(range.min, range.max);
        *self.params.slot_mut(key) = value;
        value
    }

    /// Whole-record replacement; rejected records leave the store untouched.
    pub fn replace(&mut self, params: ParameterSet) -> Result<(), ParamError> {
        params.validate()?;
        self.params = params;
        Ok(())
    }

    pub fn load_preset(&mut self, preset: Preset) {
        let mut next = self.params;
        preset.apply_to(&mut next);
        self.params = next;
    }

    pub fn apply_quality(&mut self, tier: QualityTier) {
        let mut next = self.params;
        tier.apply_to(&mut next);
        self.params = next;
    }
}
