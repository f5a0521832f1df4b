use anyhow::Context;
use crossterm::{
    cursor, execute,
    terminal::{self, ClearType},
};
use std::io::{BufWriter, Stdout, Write, stdout};

/// Deletes every kitty image, then blanks the text layer.
const WIPE: &[u8] = b"\x1b_Ga=d,d=A\x1b\\\x1b[0m\x1b[2J";
/// Undoes synchronized output, disabled autowrap and colours left by a frame
/// that was cut short.
const RESET_MODES: &[u8] = b"\x1b[?2026l\x1b[?7h\x1b[0m";

/// The interactive session on stdout: raw mode, alternate screen, hidden
/// cursor. Owns the buffered writer frames are rendered into and puts the
/// terminal back on drop, including after a failed setup step.
pub struct TerminalGuard {
    out: BufWriter<Stdout>,
    active: bool,
}

impl TerminalGuard {
    pub fn enter() -> anyhow::Result<Self> {
        let mut guard = Self {
            out: BufWriter::new(stdout()),
            active: false,
        };
        terminal::enable_raw_mode().context("enable raw mode")?;
        guard.active = true;

        execute!(
            guard.out,
            terminal::EnterAlternateScreen,
            terminal::Clear(ClearType::All),
            cursor::Hide
        )
        .context("enter alternate screen")?;
        log::debug!("terminal: raw mode and alternate screen entered");
        Ok(guard)
    }

    pub fn out(&mut self) -> &mut BufWriter<Stdout> {
        &mut self.out
    }

    /// Clears the previous layout before the surface changes size.
    pub fn wipe(&mut self) -> anyhow::Result<()> {
        self.out.write_all(WIPE)?;
        self.out.flush()?;
        Ok(())
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        if !self.active {
            return;
        }
        let _ = self.out.write_all(RESET_MODES);
        let _ = execute!(self.out, cursor::Show, terminal::LeaveAlternateScreen);
        let _ = terminal::disable_raw_mode();
        log::debug!("terminal: restored");
    }
}
