use std::io::{self, Stdout};

use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Frame;
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;

use crate::error::{AppError, AppResult};

/// Raw-mode alternate-screen guard around the ratatui terminal. `restore`
/// is idempotent and also runs on drop, so a panic or an early return
/// still puts the terminal back.
pub(crate) struct TerminalSession {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    active: bool,
}

impl TerminalSession {
    pub(crate) fn enter() -> AppResult<Self> {
        enable_raw_mode().map_err(|err| AppError::terminal(format!("enable raw mode: {err}")))?;

        let mut stdout = io::stdout();
        if let Err(err) = execute!(stdout, EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(AppError::terminal(format!(
                "enter alternate screen: {err}"
            )));
        }

        let mut terminal = match Terminal::new(CrosstermBackend::new(stdout)) {
            Ok(terminal) => terminal,
            Err(err) => {
                abandon_alternate_screen();
                return Err(AppError::terminal(format!("initialize terminal: {err}")));
            }
        };
        if let Err(err) = terminal.clear() {
            abandon_alternate_screen();
            return Err(AppError::terminal(format!("clear terminal: {err}")));
        }

        Ok(Self {
            terminal,
            active: true,
        })
    }

    pub(crate) fn draw<F>(&mut self, render: F) -> AppResult<()>
    where
        F: FnOnce(&mut Frame<'_>),
    {
        self.terminal
            .draw(render)
            .map(|_| ())
            .map_err(|err| AppError::terminal(format!("draw frame: {err}")))
    }

    pub(crate) fn restore(&mut self) -> AppResult<()> {
        if !self.active {
            return Ok(());
        }

        disable_raw_mode().map_err(|err| AppError::terminal(format!("disable raw mode: {err}")))?;
        execute!(self.terminal.backend_mut(), LeaveAlternateScreen)
            .map_err(|err| AppError::terminal(format!("leave alternate screen: {err}")))?;
        self.terminal
            .show_cursor()
            .map_err(|err| AppError::terminal(format!("show cursor: {err}")))?;
        self.active = false;
        Ok(())
    }
}

impl Drop for TerminalSession {
    fn drop(&mut self) {
        let _ = self.restore();
    }
}

fn abandon_alternate_screen() {
    let mut stdout = io::stdout();
    let _ = execute!(stdout, LeaveAlternateScreen);
    let _ = disable_raw_mode();
}
