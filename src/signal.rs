use std::io;

use anyhow::Result;
use ratatui::crossterm::{
    cursor::Show,
    event::DisableMouseCapture,
    execute,
    terminal::{disable_raw_mode, LeaveAlternateScreen},
};

/// Leave the alternate screen and hand the terminal back to the shell.
pub fn restore_terminal() -> io::Result<()> {
    execute!(io::stdout(), LeaveAlternateScreen, DisableMouseCapture, Show)?;
    disable_raw_mode()
}

pub fn set_signal_handler() -> Result<()> {
    ctrlc::set_handler(|| {
        if let Err(err) = restore_terminal() {
            eprintln!("failed to restore terminal: {}", err);
        }

        std::process::exit(0);
    })?;

    Ok(())
}
