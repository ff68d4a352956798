use std::io;

use ratatui::Terminal;
use ratatui::backend::Backend;

use crate::compositor::DisplayBuffer;

/// Terminal backend the compositor flushes into.
pub trait OutputDriver {
    fn enter(&mut self) -> io::Result<()> {
        Ok(())
    }

    fn exit(&mut self) -> io::Result<()> {
        Ok(())
    }

    /// Physical size as `(columns, rows)`.
    fn size(&mut self) -> io::Result<(u16, u16)>;

    /// Copy `buffer` to the terminal. `full` bypasses incremental diffing.
    fn flush(
        &mut self,
        buffer: &DisplayBuffer,
        full: bool,
        cursor: Option<(u16, u16)>,
    ) -> io::Result<()>;
}

/// `OutputDriver` over any ratatui backend. Ratatui diffs frames, so an
/// incremental flush only emits cells that actually changed.
pub struct TerminalOutput<B: Backend> {
    terminal: Terminal<B>,
}

fn backend_error(err: impl std::fmt::Display) -> io::Error {
    io::Error::other(err.to_string())
}

impl<B: Backend> TerminalOutput<B> {
    pub fn new(backend: B) -> io::Result<Self> {
        let terminal = Terminal::new(backend).map_err(backend_error)?;
        Ok(Self { terminal })
    }

    pub fn backend(&self) -> &B {
        self.terminal.backend()
    }

    pub fn backend_mut(&mut self) -> &mut B {
        self.terminal.backend_mut()
    }

    pub fn terminal_mut(&mut self) -> &mut Terminal<B> {
        &mut self.terminal
    }
}

impl<B: Backend> OutputDriver for TerminalOutput<B> {
    fn size(&mut self) -> io::Result<(u16, u16)> {
        let size = self.terminal.size().map_err(backend_error)?;
        Ok((size.width, size.height))
    }

    fn flush(
        &mut self,
        buffer: &DisplayBuffer,
        full: bool,
        cursor: Option<(u16, u16)>,
    ) -> io::Result<()> {
        if full {
            self.terminal.clear().map_err(backend_error)?;
        }
        self.terminal
            .draw(|frame| {
                {
                    let out = frame.buffer_mut();
                    for (y, row) in buffer.rows().enumerate() {
                        for (x, cell) in row.iter().enumerate() {
                            if let Some(target) = out.cell_mut((x as u16, y as u16)) {
                                target.set_char(cell.ch);
                                target.set_style(cell.style);
                            }
                        }
                    }
                }
                if let Some(position) = cursor {
                    frame.set_cursor_position(position);
                }
            })
            .map(|_| ())
            .map_err(backend_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::window::WindowId;
    use ratatui::backend::TestBackend;
    use ratatui::style::{Color, Style};

    #[test]
    fn flush_copies_characters_and_styles() {
        let mut output = TerminalOutput::new(TestBackend::new(4, 2)).unwrap();
        let mut buffer = DisplayBuffer::new(4, 2);
        let style = Style::default().fg(Color::Red);
        buffer.set(1, 1, 'x', style, WindowId::from_raw(1));
        output.flush(&buffer, true, None).unwrap();

        let screen = output.backend().buffer();
        assert_eq!(screen[(1, 1)].symbol(), "x");
        assert_eq!(screen[(1, 1)].fg, Color::Red);
        assert_eq!(screen[(0, 0)].symbol(), " ");
    }

    #[test]
    fn size_reports_backend_dimensions() {
        let mut output = TerminalOutput::new(TestBackend::new(12, 3)).unwrap();
        assert_eq!(output.size().unwrap(), (12, 3));
        output.backend_mut().resize(20, 5);
        assert_eq!(output.size().unwrap(), (20, 5));
    }
}
