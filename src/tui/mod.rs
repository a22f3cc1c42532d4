#![forbid(unsafe_code)]

pub mod app;

use std::io::{self, IsTerminal as _};

use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;

use crate::error::KanbanError;

type Backend = CrosstermBackend<io::Stdout>;

#[must_use]
pub fn is_tty() -> bool {
    io::stdout().is_terminal() && io::stdin().is_terminal()
}

fn term_err(what: &str) -> impl FnOnce(io::Error) -> KanbanError + '_ {
    move |e| KanbanError::Other(format!("failed to {what}: {e}"))
}

/// Runs `undo` on drop unless disarmed. Unwinds a half-finished setup.
struct Rollback<F: FnOnce()> {
    undo: Option<F>,
}

impl<F: FnOnce()> Rollback<F> {
    fn new(undo: F) -> Self {
        Self { undo: Some(undo) }
    }

    fn disarm(mut self) {
        self.undo = None;
    }
}

impl<F: FnOnce()> Drop for Rollback<F> {
    fn drop(&mut self) {
        if let Some(undo) = self.undo.take() {
            undo();
        }
    }
}

/// Owns the raw-mode alternate screen for the lifetime of the board.
pub struct TerminalGuard {
    terminal: Terminal<Backend>,
}

impl TerminalGuard {
    /// Switches to raw mode and the alternate screen. Any step that fails
    /// undoes the ones before it.
    pub fn enter() -> Result<Self, KanbanError> {
        enable_raw_mode().map_err(term_err("enable raw mode"))?;
        let raw = Rollback::new(|| {
            let _ = disable_raw_mode();
        });

        let mut stdout = io::stdout();
        crossterm::execute!(stdout, EnterAlternateScreen)
            .map_err(term_err("enter alternate screen"))?;
        let screen = Rollback::new(|| {
            let _ = crossterm::execute!(io::stdout(), LeaveAlternateScreen);
        });

        let terminal =
            Terminal::new(CrosstermBackend::new(stdout)).map_err(term_err("create terminal"))?;

        screen.disarm();
        raw.disarm();
        Ok(Self { terminal })
    }

    pub fn terminal_mut(&mut self) -> &mut Terminal<Backend> {
        &mut self.terminal
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = crossterm::execute!(self.terminal.backend_mut(), LeaveAlternateScreen);
        let _ = self.terminal.show_cursor();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn failed_setup_step_runs_rollback() {
        let undone = Cell::new(false);
        let attempt = || -> Result<(), KanbanError> {
            let _raw = Rollback::new(|| undone.set(true));
            Err(term_err("enter alternate screen")(io::Error::other("boom")))
        };
        let err = attempt().unwrap_err();
        assert!(err.to_string().contains("enter alternate screen"));
        assert!(undone.get());
    }

    #[test]
    fn completed_setup_keeps_its_state() {
        let undone = Cell::new(false);
        let raw = Rollback::new(|| undone.set(true));
        raw.disarm();
        assert!(!undone.get());
    }
}
