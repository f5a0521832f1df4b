use std::fmt;

pub const TERM_COUNT: usize = 11;

/// One switch per sub-step of the recurrence, for peel-back inspection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Term {
    Accumulate,
    SineField,
    RadialDenominator,
    VectorField,
    Rotation,
    TanhDamping,
    Drift,
    EnergyNudge,
    ToneMap,
    Grading,
    FreezeTime,
}

impl Term {
    pub const fn all() -> [Self; TERM_COUNT] {
        [
            Self::Accumulate,
            Self::SineField,
            Self::RadialDenominator,
            Self::VectorField,
            Self::Rotation,
            Self::TanhDamping,
            Self::Drift,
            Self::EnergyNudge,
            Self::ToneMap,
            Self::Grading,
            Self::FreezeTime,
        ]
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "accumulate" | "acc" => Some(Self::Accumulate),
            "sine_field" | "sine" => Some(Self::SineField),
            "radial_denominator" | "radial" => Some(Self::RadialDenominator),
            "vector_field" | "vfield" => Some(Self::VectorField),
            "rotation" | "rot" => Some(Self::Rotation),
            "tanh_damping" | "tanh" | "damping" => Some(Self::TanhDamping),
            "drift" => Some(Self::Drift),
            "energy_nudge" | "nudge" => Some(Self::EnergyNudge),
            "tone_map" | "tonemap" => Some(Self::ToneMap),
            "grading" | "grade" => Some(Self::Grading),
            "freeze_time" | "freeze" => Some(Self::FreezeTime),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Accumulate => "accumulate",
            Self::SineField => "sine_field",
            Self::RadialDenominator => "radial_denominator",
            Self::VectorField => "vector_field",
            Self::Rotation => "rotation",
            Self::TanhDamping => "tanh_damping",
            Self::Drift => "drift",
            Self::EnergyNudge => "energy_nudge",
            Self::ToneMap => "tone_map",
            Self::Grading => "grading",
            Self::FreezeTime => "freeze_time",
        }
    }
}

/// Struct-of-booleans passed next to the parameter set. Every recurrence term
/// defaults to on; `freeze_time` defaults to off.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TermToggles {
    pub accumulate: bool,
    pub sine_field: bool,
    pub radial_denominator: bool,
    pub vector_field: bool,
    pub rotation: bool,
    pub tanh_damping: bool,
    pub drift: bool,
    pub energy_nudge: bool,
    pub tone_map: bool,
    pub grading: bool,
    pub freeze_time: bool,
}

impl Default for TermToggles {
    fn default() -> Self {
        Self {
            accumulate: true,
            sine_field: true,
            radial_denominator: true,
            vector_field: true,
            rotation: true,
            tanh_damping: true,
            drift: true,
            energy_nudge: true,
            tone_map: true,
            grading: true,
            freeze_time: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TermToggleError {
    UnknownTerm(String),
}

impl fmt::Display for TermToggleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownTerm(name) => write!(f, "unknown shader term '{name}'"),
        }
    }
}

impl std::error::Error for TermToggleError {}

impl TermToggles {
    pub fn get(&self, term: Term) -> bool {
        match term {
            Term::Accumulate => self.accumulate,
            Term::SineField => self.sine_field,
            Term::RadialDenominator => self.radial_denominator,
            Term::VectorField => self.vector_field,
            Term::Rotation => self.rotation,
            Term::TanhDamping => self.tanh_damping,
            Term::Drift => self.drift,
            Term::EnergyNudge => self.energy_nudge,
            Term::ToneMap => self.tone_map,
            Term::Grading => self.grading,
            Term::FreezeTime => self.freeze_time,
        }
    }

    pub fn set(&mut self, term: Term, on: bool) {
        let slot = match term {
            Term::Accumulate => &mut self.accumulate,
            Term::SineField => &mut self.sine_field,
            Term::RadialDenominator => &mut self.radial_denominator,
            Term::VectorField => &mut self.vector_field,
            Term::Rotation => &mut self.rotation,
            Term::TanhDamping => &mut self.tanh_damping,
            Term::Drift => &mut self.drift,
            Term::EnergyNudge => &mut self.energy_nudge,
            Term::ToneMap => &mut self.tone_map,
            Term::Grading => &mut self.grading,
            Term::FreezeTime => &mut self.freeze_time,
        };
        *slot = on;
    }

    pub fn toggle(&mut self, term: Term) {
        let on = self.get(term);
        self.set(term, !on);
    }

    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }

    /// Parses a comma-separated list applied on top of the defaults:
    /// `name` switches a term on, `-name` (or `!name`) switches it off.
    pub fn parse(spec: &str) -> Result<Self, TermToggleError> {
        let mut toggles = Self::default();
        for raw in spec.split(',') {
            let token = raw.trim();
            if token.is_empty() {
                continue;
            }
            let (on, name) = match token.strip_prefix(['-', '!']) {
                Some(rest) => (false, rest),
                None => (true, token),
            };
            let term =
                Term::parse(name).ok_or_else(|| TermToggleError::UnknownTerm(name.to_string()))?;
            toggles.set(term, on);
        }
        Ok(toggles)
    }

    /// Differences from the defaults, in the same syntax [`TermToggles::parse`] reads.
    pub fn describe(&self) -> String {
        let defaults = Self::default();
        let changed = Term::all()
            .into_iter()
            .filter(|&t| self.get(t) != defaults.get(t))
            .map(|t| {
                if self.get(t) {
                    t.as_str().to_string()
                } else {
                    format!("-{}", t.as_str())
                }
            })
            .collect::<Vec<_>>();
        if changed.is_empty() {
            "all".to_string()
        } else {
            changed.join(",")
        }
    }
}
