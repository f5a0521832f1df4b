use crate::config::RendererMode;

/// Smallest terminal that still leaves room for an image.
pub const MIN_COLS: u16 = 4;
pub const MIN_ROWS: u16 = 2;

#[derive(Debug, Clone)]
pub struct CapabilityReport {
    pub auto_probe: bool,
    pub requested_renderer: RendererMode,
    pub renderer: RendererMode,
    /// Why the surface cannot be drawn at all, if it cannot.
    pub fatal: Option<String>,
    notes: Vec<String>,
}

impl CapabilityReport {
    pub fn changed(&self) -> bool {
        self.renderer != self.requested_renderer
    }

    pub fn notes(&self) -> &[String] {
        &self.notes
    }

    pub fn push_note(&mut self, note: impl Into<String>) {
        self.notes.push(note.into());
    }

    pub fn status_label(&self) -> String {
        if !self.auto_probe {
            return format!("off (renderer={:?})", self.renderer);
        }
        if self.changed() {
            return format!(
                "fallback ren {:?}->{:?}",
                self.requested_renderer, self.renderer
            );
        }
        format!("ok ren={:?}", self.renderer)
    }
}

/// Terminal facts the probe works from; gathered by the caller so the probe
/// itself stays testable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceInfo {
    pub is_tty: bool,
    pub size: Option<(u16, u16)>,
    pub kitty_graphics: bool,
}

impl SurfaceInfo {
    pub fn detect() -> Self {
        use crossterm::tty::IsTty;
        Self {
            is_tty: std::io::stdout().is_tty(),
            size: crossterm::terminal::size().ok(),
            kitty_graphics: kitty_graphics_available(),
        }
    }
}

pub fn probe_surface(
    requested_renderer: RendererMode,
    auto_probe: bool,
    info: SurfaceInfo,
) -> CapabilityReport {
    let mut report = CapabilityReport {
        auto_probe,
        requested_renderer,
        renderer: requested_renderer,
        fatal: None,
        notes: Vec::new(),
    };

    if !info.is_tty {
        report.fatal = Some(
            "stdout is not a terminal; run interactively or use `render_still` for image output"
                .to_string(),
        );
        return report;
    }
    match info.size {
        None => {
            report.fatal = Some("could not query terminal size".to_string());
            return report;
        }
        Some((cols, rows)) if cols < MIN_COLS || rows < MIN_ROWS => {
            report.fatal = Some(format!(
                "terminal too small (need at least {MIN_COLS}x{MIN_ROWS}, got {cols}x{rows})"
            ));
            return report;
        }
        Some(_) => {}
    }

    if !auto_probe {
        report.push_note("capability probe disabled by --auto-probe=false");
        return report;
    }

    if requested_renderer == RendererMode::Kitty && !info.kitty_graphics {
        report.renderer = RendererMode::HalfBlock;
        report.push_note(
            "kitty graphics unavailable in this terminal; falling back to half-block renderer",
        );
    }

    if report.notes.is_empty() {
        report.push_note("probe selected requested renderer with no fallback");
    }

    report
}

fn kitty_graphics_available() -> bool {
    if let Ok(v) = std::env::var("COSMIC_FORCE_KITTY") {
        let s = v.trim().to_ascii_lowercase();
        if s == "1" || s == "true" || s == "yes" || s == "on" {
            return true;
        }
        if s == "0" || s == "false" || s == "no" || s == "off" {
            return false;
        }
    }

    if std::env::var("KITTY_WINDOW_ID").is_ok() {
        return true;
    }

    let term = std::env::var("TERM")
        .unwrap_or_default()
        .to_ascii_lowercase();
    if term.contains("kitty") {
        return true;
    }

    let term_program = std::env::var("TERM_PROGRAM")
        .unwrap_or_default()
        .to_ascii_lowercase();
    term_program.contains("ghostty") || term_program.contains("kitty")
}
