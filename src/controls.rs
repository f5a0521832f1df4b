//! Control surface plumbing: control ids, key bindings and prompt commands.
//! Nothing here owns state; callers hand in the store and clock to mutate.

use crate::driver::{MAX_MANUAL_TIME, ShaderClock};
use crate::params::{ParamError, ParamKey, ParameterStore};
use crate::presets::{Preset, QualityTier};
use crate::shader::{Term, TermToggles};
use crossterm::event::{KeyCode, KeyModifiers};
use std::fmt;

/// Identifiers of the original control panel inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlId {
    Param(ParamKey),
    ManualTime,
}

impl ControlId {
    pub fn parse(s: &str) -> Option<Self> {
        let norm = s.trim().to_ascii_lowercase().replace('_', "-");
        if norm == "manual-time" || norm == "time" {
            return Some(Self::ManualTime);
        }
        ParamKey::parse(&norm).map(Self::Param)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::ManualTime => "manual-time",
            Self::Param(key) => match key {
                ParamKey::Iterations => "iterations",
                ParamKey::CoordScale => "coord-scale",
                ParamKey::RotationSpeed => "rotation-speed",
                ParamKey::Stabilization => "stabilization",
                ParamKey::WaveFreq => "wave-freq",
                ParamKey::Brightness => "brightness",
                ParamKey::Saturation => "saturation",
                ParamKey::ColorR => "color-r",
                ParamKey::ColorG => "color-g",
                ParamKey::ColorB => "color-b",
                ParamKey::ResolutionScale => "resolution-scale",
                ParamKey::TimeSpeed => "time-speed",
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ControlError {
    Param(ParamError),
    UnknownControl(String),
    BadTime(String),
    UnknownCommand(String),
    MissingArgument(&'static str),
    UnknownPreset(String),
    UnknownQuality(String),
    UnknownTerm(String),
}

impl fmt::Display for ControlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Param(err) => write!(f, "{err}"),
            Self::UnknownControl(id) => write!(f, "unknown control '{id}'"),
            Self::BadTime(raw) => write!(f, "manual-time: '{raw}' is not a number within ±1e9"),
            Self::UnknownCommand(cmd) => write!(f, "unknown command '{cmd}'"),
            Self::MissingArgument(what) => write!(f, "missing argument: {what}"),
            Self::UnknownPreset(name) => write!(f, "unknown preset '{name}'"),
            Self::UnknownQuality(name) => write!(f, "unknown quality tier '{name}'"),
            Self::UnknownTerm(name) => write!(f, "unknown shader term '{name}'"),
        }
    }
}

impl std::error::Error for ControlError {}

impl From<ParamError> for ControlError {
    fn from(err: ParamError) -> Self {
        Self::Param(err)
    }
}

/// Routes one control input to its setter. Rejected input changes nothing.
pub fn apply_control(
    id: ControlId,
    raw: &str,
    store: &mut ParameterStore,
    clock: &mut ShaderClock,
) -> Result<f64, ControlError> {
    match id {
        ControlId::Param(key) => Ok(store.set(key, raw)?),
        ControlId::ManualTime => {
            let t = raw
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|t| t.is_finite() && t.abs() <= MAX_MANUAL_TIME)
                .ok_or_else(|| ControlError::BadTime(raw.to_string()))?;
            clock.set_manual_time(t);
            Ok(t)
        }
    }
}

/// A line typed at the `:` prompt.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Set { id: ControlId, raw: String },
    Preset(Preset),
    Quality(QualityTier),
    Toggle(Term),
    Terms(TermToggles),
    Export,
    Screenshot,
    Reset,
    Play,
    Quit,
}

impl Command {
    pub fn parse(line: &str) -> Result<Self, ControlError> {
        let line = line.trim().trim_start_matches(':').trim();
        let mut parts = line.split_whitespace();
        let Some(verb) = parts.next() else {
            return Err(ControlError::MissingArgument("command"));
        };
        match verb.to_ascii_lowercase().as_str() {
            "set" => {
                let name = parts.next().ok_or(ControlError::MissingArgument("control id"))?;
                let id = ControlId::parse(name)
                    .ok_or_else(|| ControlError::UnknownControl(name.to_string()))?;
                let raw = parts.collect::<Vec<_>>().join(" ");
                if raw.is_empty() {
                    return Err(ControlError::MissingArgument("value"));
                }
                Ok(Self::Set { id, raw })
            }
            "preset" | "p" => {
                let name = parts.next().ok_or(ControlError::MissingArgument("preset name"))?;
                Preset::parse(name)
                    .map(Self::Preset)
                    .ok_or_else(|| ControlError::UnknownPreset(name.to_string()))
            }
            "quality" | "q" => {
                let name = parts.next().ok_or(ControlError::MissingArgument("quality tier"))?;
                QualityTier::parse(name)
                    .map(Self::Quality)
                    .ok_or_else(|| ControlError::UnknownQuality(name.to_string()))
            }
            "toggle" | "t" => {
                let name = parts.next().ok_or(ControlError::MissingArgument("term name"))?;
                Term::parse(name)
                    .map(Self::Toggle)
                    .ok_or_else(|| ControlError::UnknownTerm(name.to_string()))
            }
            "terms" => {
                let rest = parts.collect::<Vec<_>>().join(",");
                if rest.trim().is_empty() || rest.eq_ignore_ascii_case("all") {
                    return Ok(Self::Terms(TermToggles::default()));
                }
                TermToggles::parse(&rest)
                    .map(Self::Terms)
                    .map_err(|e| ControlError::UnknownTerm(e.to_string()))
            }
            "export" | "e" => Ok(Self::Export),
            "shot" | "screenshot" | "s" => Ok(Self::Screenshot),
            "reset" | "r" => Ok(Self::Reset),
            "play" | "pause" => Ok(Self::Play),
            "quit" | "exit" => Ok(Self::Quit),
            // Bare `<control> <value>` is shorthand for `set`.
            other => match (ControlId::parse(other), parts.next()) {
                (Some(id), Some(v)) => Ok(Self::Set {
                    id,
                    raw: v.to_string(),
                }),
                _ => Err(ControlError::UnknownCommand(other.to_string())),
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Quit,
    Back,
    TogglePlay,
    ResetTime,
    ToggleFullscreen,
    ToggleMath,
    ToggleHelp,
    TogglePanel,
    Screenshot,
    Export,
    Preset(Preset),
    Quality(QualityTier),
    OpenPrompt,
    PanelUp,
    PanelDown,
    PanelInc,
    PanelDec,
    PanelIncFast,
    PanelDecFast,
    /// Moves the math overlay probe by whole steps on each axis.
    Probe(i8, i8),
}

/// Global key bindings. Arrow keys drive the panel while it is open and the
/// math probe otherwise.
pub fn map_key(code: KeyCode, mods: KeyModifiers, panel_open: bool) -> Option<Action> {
    if mods.contains(KeyModifiers::CONTROL) {
        return match code {
            KeyCode::Char('c') => Some(Action::Quit),
            KeyCode::Char('s') => Some(Action::Screenshot),
            KeyCode::Char('e') => Some(Action::Export),
            _ => None,
        };
    }

    match code {
        KeyCode::Esc => Some(Action::Back),
        KeyCode::Char('q') | KeyCode::Char('Q') => Some(Action::Quit),
        KeyCode::Char(' ') => Some(Action::TogglePlay),
        KeyCode::Char('r') | KeyCode::Char('R') => Some(Action::ResetTime),
        KeyCode::Char('f') | KeyCode::Char('F') => Some(Action::ToggleFullscreen),
        KeyCode::Char('m') | KeyCode::Char('M') => Some(Action::ToggleMath),
        KeyCode::Char('c') | KeyCode::Char('C') => Some(Action::TogglePanel),
        KeyCode::Char('S') => Some(Action::Screenshot),
        KeyCode::Char('E') => Some(Action::Export),
        KeyCode::Char('?') | KeyCode::Char('h') | KeyCode::F(1) => Some(Action::ToggleHelp),
        KeyCode::Char(':') => Some(Action::OpenPrompt),
        KeyCode::Char('1') => Some(Action::Preset(Preset::Default)),
        KeyCode::Char('2') => Some(Action::Preset(Preset::Slow)),
        KeyCode::Char('3') => Some(Action::Preset(Preset::HighDetail)),
        KeyCode::Char('4') => Some(Action::Preset(Preset::Chaotic)),
        KeyCode::Char('5') => Some(Action::Preset(Preset::Minimal)),
        KeyCode::F(5) => Some(Action::Quality(QualityTier::Low)),
        KeyCode::F(6) => Some(Action::Quality(QualityTier::Medium)),
        KeyCode::F(7) => Some(Action::Quality(QualityTier::High)),
        KeyCode::F(8) => Some(Action::Quality(QualityTier::Ultra)),
        KeyCode::Up if panel_open => Some(Action::PanelUp),
        KeyCode::Down if panel_open => Some(Action::PanelDown),
        KeyCode::Right if panel_open => Some(Action::PanelInc),
        KeyCode::Left if panel_open => Some(Action::PanelDec),
        KeyCode::PageUp if panel_open => Some(Action::PanelIncFast),
        KeyCode::PageDown if panel_open => Some(Action::PanelDecFast),
        KeyCode::Up => Some(Action::Probe(0, 1)),
        KeyCode::Down => Some(Action::Probe(0, -1)),
        KeyCode::Right => Some(Action::Probe(1, 0)),
        KeyCode::Left => Some(Action::Probe(-1, 0)),
        _ => None,
    }
}

/// One line of the control panel: a numeric parameter or a shader term.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelRow {
    Param(ParamKey),
    Term(Term),
}

pub fn panel_rows() -> Vec<PanelRow> {
    ParamKey::all()
        .into_iter()
        .map(PanelRow::Param)
        .chain(Term::all().into_iter().map(PanelRow::Term))
        .collect()
}
