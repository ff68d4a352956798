use std::collections::VecDeque;
use std::io::{self, Stdout};
use std::time::Duration;

use crossterm::event::{DisableMouseCapture, EnableMouseCapture, Event};
use crossterm::terminal::{EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{execute, terminal};
use ratatui::backend::CrosstermBackend;

use super::utils::KeyboardNormalizer;
use super::{InputDriver, OutputDriver, TerminalOutput};
use crate::compositor::DisplayBuffer;

/// Reads the controlling terminal through crossterm.
pub struct ConsoleInputDriver {
    normalizer: KeyboardNormalizer,
    pending: VecDeque<Event>,
}

impl Default for ConsoleInputDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl ConsoleInputDriver {
    pub fn new() -> Self {
        Self {
            normalizer: KeyboardNormalizer::new(),
            pending: VecDeque::new(),
        }
    }

    fn read_normalized(&mut self) -> io::Result<Event> {
        loop {
            let evt = crossterm::event::read()?;
            if let Some(normalized) = self.normalizer.normalize(evt) {
                return Ok(normalized);
            }
        }
    }
}

impl InputDriver for ConsoleInputDriver {
    fn poll(&mut self, timeout: Duration) -> io::Result<bool> {
        if !self.pending.is_empty() {
            return Ok(true);
        }
        crossterm::event::poll(timeout)
    }

    fn read(&mut self) -> io::Result<Event> {
        if let Some(evt) = self.pending.pop_front() {
            return Ok(evt);
        }
        self.read_normalized()
    }

    fn set_mouse_capture(&mut self, enabled: bool) -> io::Result<()> {
        if enabled {
            execute!(io::stdout(), EnableMouseCapture)
        } else {
            execute!(io::stdout(), DisableMouseCapture)
        }
    }
}

/// Alternate-screen, raw-mode terminal output on stdout.
pub struct ConsoleOutputDriver {
    inner: TerminalOutput<CrosstermBackend<Stdout>>,
    entered: bool,
}

impl ConsoleOutputDriver {
    pub fn new() -> io::Result<Self> {
        let inner = TerminalOutput::new(CrosstermBackend::new(io::stdout()))?;
        Ok(Self {
            inner,
            entered: false,
        })
    }
}

impl OutputDriver for ConsoleOutputDriver {
    fn enter(&mut self) -> io::Result<()> {
        if self.entered {
            return Ok(());
        }
        execute!(self.inner.backend_mut(), EnterAlternateScreen, EnableMouseCapture)?;
        terminal::enable_raw_mode()?;
        self.inner.terminal_mut().hide_cursor()?;
        self.entered = true;
        Ok(())
    }

    fn exit(&mut self) -> io::Result<()> {
        if !self.entered {
            return Ok(());
        }
        terminal::disable_raw_mode()?;
        execute!(
            self.inner.backend_mut(),
            DisableMouseCapture,
            LeaveAlternateScreen
        )?;
        self.inner.terminal_mut().show_cursor()?;
        self.entered = false;
        Ok(())
    }

    fn size(&mut self) -> io::Result<(u16, u16)> {
        terminal::size()
    }

    fn flush(
        &mut self,
        buffer: &DisplayBuffer,
        full: bool,
        cursor: Option<(u16, u16)>,
    ) -> io::Result<()> {
        self.inner.flush(buffer, full, cursor)
    }
}

impl Drop for ConsoleOutputDriver {
    fn drop(&mut self) {
        let _ = self.exit();
    }
}
