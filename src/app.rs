use crate::analysis;
use crate::capability::{SurfaceInfo, probe_surface};
use crate::config::Config;
use crate::controls::{Action, Command, ControlId, PanelRow, apply_control, map_key, panel_rows};
use crate::driver::{FrameDriver, ShaderClock};
use crate::export;
use crate::params::{ParamKey, ParameterStore};
use crate::presets::{Preset, QualityTier};
use crate::render::{Frame, Overlay, OverlayAnchor, make_renderer};
use crate::shader::Vec2;
use crate::terminal::TerminalGuard;
use anyhow::Context;
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use std::fmt::{Display, Write as _};
use std::path::PathBuf;
use std::time::{Duration, Instant};

const PROBE_STEP: f64 = 0.05;
const FAST_NUDGE: i32 = 10;
const IDLE_HINT: &str = "? help | c controls | m math | : command | q quit";

pub fn run(cfg: Config) -> anyhow::Result<()> {
    let report = probe_surface(cfg.renderer, cfg.auto_probe, SurfaceInfo::detect());
    if let Some(reason) = &report.fatal {
        anyhow::bail!("{reason}");
    }
    for note in report.notes() {
        log::info!("capability: {note}");
    }

    let mut state = AppState::from_config(&cfg)?;
    if report.changed() {
        state.status = report.status_label();
    }
    let mode = report.renderer;
    log::info!(
        "starting: renderer={:?} fps={} terms={} clamp={}",
        mode,
        cfg.fps,
        state.driver.terms.describe(),
        state.driver.clamp.label()
    );

    let mut term = TerminalGuard::enter()?;
    let mut renderer = make_renderer(mode);
    let (px_w_mul, px_h_mul) = mode.cell_pixels();
    let target = Duration::from_secs_f64(1.0 / cfg.fps.max(1) as f64);
    let mut last_size = crossterm::terminal::size().context("get terminal size")?;

    loop {
        let now = Instant::now();

        // Drain input events (non-blocking).
        while event::poll(Duration::from_millis(0))? {
            match event::read()? {
                Event::Key(k) if k.kind != KeyEventKind::Release => {
                    state.handle_key(k.code, k.modifiers, now);
                }
                Event::Resize(c, r) => last_size = (c, r),
                _ => {}
            }
        }
        if state.quit {
            log::info!("quit requested");
            return Ok(());
        }

        // Resize events can be missed in some terminals.
        let sz = crossterm::terminal::size()?;
        if sz != last_size {
            last_size = sz;
        }
        let (term_cols, term_rows) = last_size;

        let hud = if state.hud_visible() {
            state.hud_text(term_cols as usize, renderer.name())
        } else {
            String::new()
        };
        let hud_rows = hud_rows_for_text(term_rows, state.hud_visible(), &hud);
        let visual_rows = term_rows.saturating_sub(hud_rows).max(1);
        let w = (term_cols as usize).saturating_mul(px_w_mul);
        let h = (visual_rows as usize).saturating_mul(px_h_mul);
        if state.driver.output_size() != (w, h) {
            state.driver.resize(w, h);
            term.wipe()?;
        }

        let tick = state.driver.tick(now, &state.store);
        let overlay = state.overlay_text(tick.time, term_rows);
        let history: Vec<f64> = state.driver.stats.history().collect();

        let frame = Frame {
            term_cols,
            term_rows,
            visual_rows,
            pixel_width: w,
            pixel_height: h,
            pixels_rgba: state.driver.output(),
            hud: &hud,
            hud_rows,
            fps_history: &history,
            overlay: overlay.as_ref().map(|(text, anchor)| Overlay {
                text,
                anchor: *anchor,
            }),
            sync_updates: cfg.sync_updates,
        };
        renderer.render(&frame, term.out())?;

        // Frame pacing.
        let elapsed = now.elapsed();
        if elapsed < target {
            std::thread::sleep(target - elapsed);
        }
    }
}

/// Everything the interactive loop mutates, kept apart from the terminal so
/// key handling can be driven directly.
pub struct AppState {
    pub store: ParameterStore,
    pub driver: FrameDriver,
    pub output_dir: PathBuf,
    /// Last preset loaded; cleared once any parameter is edited by hand.
    pub preset: Option<Preset>,
    pub quality: Option<QualityTier>,
    pub show_hud: bool,
    pub show_help: bool,
    pub show_math: bool,
    pub panel_open: bool,
    pub panel_cursor: usize,
    pub fullscreen: bool,
    pub prompt: Option<String>,
    /// Math overlay probe, normalized surface position with y up.
    pub probe: Vec2,
    pub status: String,
    pub quit: bool,
}

impl AppState {
    /// Startup order: settings file, then preset, then quality tier, then
    /// the explicit time speed.
    pub fn from_config(cfg: &Config) -> anyhow::Result<Self> {
        let mut store = ParameterStore::new();
        if let Some(path) = &cfg.settings {
            let params = export::import_settings(path)
                .with_context(|| format!("load settings from {}", path.display()))?;
            store
                .replace(params)
                .with_context(|| format!("apply settings from {}", path.display()))?;
            log::info!("loaded settings from {}", path.display());
        }
        if let Some(preset) = cfg.preset {
            store.load_preset(preset);
        }
        if let Some(tier) = cfg.quality {
            store.apply_quality(tier);
        }
        if let Some(speed) = cfg.time_speed {
            store
                .set_value(ParamKey::TimeSpeed, speed)
                .context("apply --time-speed")?;
        }

        let clock = ShaderClock::new(!cfg.paused);
        Ok(Self {
            store,
            driver: FrameDriver::new(clock, cfg.terms, cfg.clamp),
            output_dir: cfg.output_dir.clone(),
            preset: cfg.preset,
            quality: cfg.quality,
            show_hud: cfg.hud,
            show_help: false,
            show_math: false,
            panel_open: false,
            panel_cursor: 0,
            fullscreen: false,
            prompt: None,
            probe: Vec2::splat(0.5),
            status: String::new(),
            quit: false,
        })
    }

    pub fn hud_visible(&self) -> bool {
        self.show_hud && !self.fullscreen
    }

    pub fn handle_key(&mut self, code: KeyCode, mods: KeyModifiers, now: Instant) {
        if self.prompt.is_some() {
            self.handle_prompt_key(code, mods, now);
            return;
        }
        if let Some(action) = map_key(code, mods, self.panel_open) {
            self.handle_action(action, now);
        }
    }

    fn handle_prompt_key(&mut self, code: KeyCode, mods: KeyModifiers, now: Instant) {
        if mods.contains(KeyModifiers::CONTROL) && code == KeyCode::Char('c') {
            self.quit = true;
            return;
        }
        let Some(buf) = self.prompt.as_mut() else {
            return;
        };
        match code {
            KeyCode::Esc => self.prompt = None,
            KeyCode::Backspace => {
                buf.pop();
            }
            KeyCode::Char(c) => buf.push(c),
            KeyCode::Enter => {
                let line = self.prompt.take().unwrap_or_default();
                if line.trim().is_empty() {
                    return;
                }
                match Command::parse(&line) {
                    Ok(cmd) => self.execute(cmd, now),
                    Err(err) => self.report_error("command", err),
                }
            }
            _ => {}
        }
    }

    pub fn handle_action(&mut self, action: Action, now: Instant) {
        match action {
            Action::Quit => self.quit = true,
            Action::Back => {
                if self.show_help {
                    self.show_help = false;
                } else if self.panel_open {
                    self.panel_open = false;
                } else if self.show_math {
                    self.show_math = false;
                } else if self.fullscreen {
                    self.fullscreen = false;
                } else {
                    self.quit = true;
                }
            }
            Action::TogglePlay => {
                self.driver.clock.toggle_play(now);
                self.status = format!("time {}", self.driver.clock.label());
            }
            Action::ResetTime => {
                self.driver.clock.reset();
                self.status = "time reset".to_string();
            }
            Action::ToggleFullscreen => {
                self.fullscreen = !self.fullscreen;
                if self.fullscreen {
                    self.panel_open = false;
                }
            }
            Action::ToggleMath => self.show_math = !self.show_math,
            Action::ToggleHelp => self.show_help = !self.show_help,
            Action::TogglePanel => {
                self.panel_open = !self.panel_open;
                if self.panel_open {
                    self.fullscreen = false;
                    self.show_help = false;
                }
            }
            Action::Screenshot => self.screenshot(),
            Action::Export => self.export(),
            Action::Preset(preset) => self.load_preset(preset),
            Action::Quality(tier) => self.apply_quality(tier),
            Action::OpenPrompt => self.prompt = Some(String::new()),
            Action::PanelUp => self.move_panel_cursor(-1),
            Action::PanelDown => self.move_panel_cursor(1),
            Action::PanelInc => self.adjust_panel_row(1),
            Action::PanelDec => self.adjust_panel_row(-1),
            Action::PanelIncFast => self.adjust_panel_row(FAST_NUDGE),
            Action::PanelDecFast => self.adjust_panel_row(-FAST_NUDGE),
            Action::Probe(dx, dy) => {
                if self.show_math {
                    self.probe = Vec2::new(
                        (self.probe.x + dx as f64 * PROBE_STEP).clamp(0.0, 1.0),
                        (self.probe.y + dy as f64 * PROBE_STEP).clamp(0.0, 1.0),
                    );
                }
            }
        }
    }

    pub fn execute(&mut self, cmd: Command, now: Instant) {
        match cmd {
            Command::Set { id, raw } => {
                match apply_control(id, &raw, &mut self.store, &mut self.driver.clock) {
                    Ok(value) => {
                        if matches!(id, ControlId::Param(_)) {
                            self.preset = None;
                        }
                        self.status = format!("{} = {}", id.as_str(), value);
                    }
                    Err(err) => self.report_error(id.as_str(), err),
                }
            }
            Command::Preset(preset) => self.load_preset(preset),
            Command::Quality(tier) => self.apply_quality(tier),
            Command::Toggle(term) => {
                self.driver.terms.toggle(term);
                self.status = format!("terms: {}", self.driver.terms.describe());
            }
            Command::Terms(terms) => {
                self.driver.terms = terms;
                self.status = format!("terms: {}", terms.describe());
            }
            Command::Export => self.export(),
            Command::Screenshot => self.screenshot(),
            Command::Reset => self.handle_action(Action::ResetTime, now),
            Command::Play => self.handle_action(Action::TogglePlay, now),
            Command::Quit => self.quit = true,
        }
    }

    fn load_preset(&mut self, preset: Preset) {
        self.store.load_preset(preset);
        self.preset = Some(preset);
        self.status = format!("preset {}", preset.name());
        log::info!("preset {}", preset.name());
    }

    fn apply_quality(&mut self, tier: QualityTier) {
        self.store.apply_quality(tier);
        self.quality = Some(tier);
        self.status = format!("quality {}", tier.name());
        log::info!("quality {}", tier.name());
    }

    fn screenshot(&mut self) {
        match export::save_screenshot(&self.output_dir, self.driver.shader_frame()) {
            Ok(path) => self.status = format!("saved {}", path.display()),
            Err(err) => self.report_error("screenshot", err),
        }
    }

    fn export(&mut self) {
        match export::export_settings(&self.output_dir, self.store.params()) {
            Ok(path) => self.status = format!("exported {}", path.display()),
            Err(err) => self.report_error("export", err),
        }
    }

    fn report_error(&mut self, what: &str, err: impl Display) {
        log::warn!("{what}: {err}");
        self.status = format!("{what}: {err}");
    }

    fn move_panel_cursor(&mut self, delta: isize) {
        let n = panel_rows().len() as isize;
        self.panel_cursor = (self.panel_cursor as isize + delta).rem_euclid(n) as usize;
    }

    fn adjust_panel_row(&mut self, steps: i32) {
        let Some(row) = panel_rows().get(self.panel_cursor).copied() else {
            return;
        };
        match row {
            PanelRow::Param(key) => {
                let value = self.store.nudge(key, steps);
                self.preset = None;
                self.status = format!("{} = {}", key.label(), format_value(key, value));
            }
            PanelRow::Term(term) => {
                self.driver.terms.toggle(term);
                self.status = format!("terms: {}", self.driver.terms.describe());
            }
        }
    }

    pub fn hud_text(&self, cols: usize, renderer_name: &str) -> String {
        let params = self.store.params();
        let (sw, sh) = self.driver.shader_size();
        let clock = &self.driver.clock;
        let logical_lines = vec![
            format!(
                "FPS: {:>3.0} | {:>5.1} ms | t={:.2}s ({}) x{:.2} | Res: {}x{} | Renderer: {}",
                self.driver.stats.fps(),
                self.driver.stats.frame_ms(),
                clock.time(),
                clock.label(),
                params.time_speed,
                sw,
                sh,
                renderer_name,
            ),
            format!(
                "Preset: {} | Quality: {} | Iter: {} | Scale: {:.2} | Terms: {} | Clamp: {}",
                self.preset.map(Preset::name).unwrap_or("custom"),
                self.quality.map(QualityTier::name).unwrap_or("-"),
                params.iterations,
                params.coord_scale,
                self.driver.terms.describe(),
                self.driver.clamp.label(),
            ),
            match &self.prompt {
                Some(buf) => format!(":{buf}_"),
                None if !self.status.is_empty() => self.status.clone(),
                None => IDLE_HINT.to_string(),
            },
        ];

        wrap_hud_lines(cols, &logical_lines).join("\n")
    }

    /// Help wins over the panel, which wins over the math overlay.
    pub fn overlay_text(&self, time: f64, term_rows: u16) -> Option<(String, OverlayAnchor)> {
        if self.show_help {
            return Some((help_popup_text().to_string(), OverlayAnchor::Center));
        }
        if self.panel_open {
            return Some((self.panel_text(term_rows), OverlayAnchor::Right));
        }
        if self.show_math {
            let (sw, sh) = self.driver.shader_size();
            let params = self.store.params();
            let probe = analysis::analyze(self.probe, sw as f64, sh as f64, time, params);
            return Some((analysis::overlay_text(&probe, params), OverlayAnchor::Right));
        }
        None
    }

    fn panel_text(&self, term_rows: u16) -> String {
        let rows = panel_rows();
        let window = (term_rows as usize).saturating_sub(4).max(1);
        let start = centered_window_start(self.panel_cursor, rows.len(), window);
        let mut s = String::from("Controls  up/down select, left/right adjust");
        for (i, row) in rows.iter().enumerate().skip(start).take(window) {
            let marker = if i == self.panel_cursor { '>' } else { ' ' };
            let _ = match *row {
                PanelRow::Param(key) => write!(
                    s,
                    "\n{marker} {:<18} {:>8}",
                    key.label(),
                    format_value(key, self.store.get(key))
                ),
                PanelRow::Term(term) => write!(
                    s,
                    "\n{marker} {:<18} {:>8}",
                    term.as_str(),
                    if self.driver.terms.get(term) { "on" } else { "off" }
                ),
            };
        }
        s
    }
}

fn format_value(key: ParamKey, value: f64) -> String {
    if key.slider().step >= 1.0 {
        format!("{value:.0}")
    } else {
        format!("{value:.2}")
    }
}

fn centered_window_start(cursor: usize, total: usize, window: usize) -> usize {
    if total <= window {
        return 0;
    }
    cursor.saturating_sub(window / 2).min(total - window)
}

fn hud_rows_for_text(term_rows: u16, show_hud: bool, hud: &str) -> u16 {
    if !show_hud {
        return 0;
    }
    let max_rows = term_rows.saturating_sub(1);
    let wanted = hud.lines().count() as u16;
    wanted.min(max_rows)
}

fn wrap_hud_lines(cols: usize, lines: &[String]) -> Vec<String> {
    let width = cols.max(1);
    let mut out = Vec::new();
    for line in lines {
        out.extend(hard_wrap_line(line, width));
    }
    out
}

fn hard_wrap_line(line: &str, width: usize) -> Vec<String> {
    if line.is_empty() {
        return vec![String::new()];
    }

    let mut out = Vec::new();
    let mut cur = String::new();
    let mut cur_len = 0usize;
    for ch in line.chars() {
        cur.push(ch);
        cur_len += 1;
        if cur_len >= width {
            out.push(cur);
            cur = String::new();
            cur_len = 0;
        }
    }
    if !cur.is_empty() {
        out.push(cur);
    }
    out
}

fn help_popup_text() -> &'static str {
    "Cosmic Shader Hotkeys\n\
space  play/pause\n\
r  reset time\n\
f  fullscreen (hide HUD and panel)\n\
m  math overlay (arrows move the probe)\n\
c  control panel\n\
  up/down  select row\n\
  left/right  adjust value or toggle term\n\
  pgup/pgdn  adjust by ten steps\n\
1..5  presets: default/slow/high-detail/chaotic/minimal\n\
F5..F8  quality: low/medium/high/ultra\n\
S or ctrl+s  screenshot (PNG)\n\
E or ctrl+e  export settings (JSON)\n\
:  command prompt\n\
  set <control> <value> | preset <name> | quality <tier>\n\
  toggle <term> | terms <list> | export | shot | reset | play\n\
? or h or F1  toggle this help\n\
esc  close panel/overlay, quit when nothing is open\n\
q  quit"
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn state(args: &[&str]) -> AppState {
        let mut argv = vec!["cosmic-shader"];
        argv.extend_from_slice(args);
        let cfg = Config::try_parse_from(argv).unwrap();
        AppState::from_config(&cfg).unwrap()
    }

    fn press(s: &mut AppState, code: KeyCode) {
        s.handle_key(code, KeyModifiers::NONE, Instant::now());
    }

    #[test]
    fn startup_applies_preset_then_quality() {
        let s = state(&["--preset", "chaotic", "--quality", "low"]);
        let p = s.store.params();
        assert_eq!(p.iterations, 8.0);
        assert_eq!(p.resolution_scale, 0.5);
        assert_eq!(p.stabilization, 20.0);
        assert_eq!(p.coord_scale, 0.3);
        assert_eq!(p.rotation_speed, 2.0);
    }

    #[test]
    fn prompt_sets_parameter_and_keeps_old_value_on_garbage() {
        let mut s = state(&[]);
        press(&mut s, KeyCode::Char(':'));
        for c in "set iterations 42".chars() {
            press(&mut s, KeyCode::Char(c));
        }
        press(&mut s, KeyCode::Enter);
        assert_eq!(s.store.params().iterations, 42.0);
        assert!(s.prompt.is_none());

        press(&mut s, KeyCode::Char(':'));
        for c in "iterations abc".chars() {
            press(&mut s, KeyCode::Char(c));
        }
        press(&mut s, KeyCode::Enter);
        assert_eq!(s.store.params().iterations, 42.0);
        assert!(s.status.starts_with("iterations"));
    }

    #[test]
    fn escape_closes_layers_before_quitting() {
        let mut s = state(&[]);
        press(&mut s, KeyCode::Char('m'));
        press(&mut s, KeyCode::Char('c'));
        assert!(s.panel_open && s.show_math);
        press(&mut s, KeyCode::Esc);
        assert!(!s.panel_open && s.show_math);
        press(&mut s, KeyCode::Esc);
        assert!(!s.show_math && !s.quit);
        press(&mut s, KeyCode::Esc);
        assert!(s.quit);
    }

    #[test]
    fn panel_nudges_selected_parameter() {
        let mut s = state(&[]);
        press(&mut s, KeyCode::Char('c'));
        let before = s.store.params().iterations;
        press(&mut s, KeyCode::Right);
        assert_eq!(s.store.params().iterations, before + 1.0);
        assert!(s.preset.is_none());
    }

    #[test]
    fn fullscreen_hides_hud() {
        let mut s = state(&[]);
        assert!(s.hud_visible());
        press(&mut s, KeyCode::Char('f'));
        assert!(!s.hud_visible());
    }

    #[test]
    fn hud_wraps_to_width() {
        let s = state(&[]);
        let hud = s.hud_text(20, "halfblock");
        assert!(hud.lines().all(|l| l.chars().count() <= 20));
        assert!(hud.lines().count() > 3);
    }

    #[test]
    fn window_start_keeps_cursor_visible() {
        assert_eq!(centered_window_start(0, 23, 10), 0);
        assert_eq!(centered_window_start(22, 23, 10), 13);
        assert_eq!(centered_window_start(3, 5, 10), 0);
    }
}
