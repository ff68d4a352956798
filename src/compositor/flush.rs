use std::io;
use std::sync::{Arc, Mutex};

use super::{SharedDisplay, lock_display};
use crate::drivers::OutputDriver;

/// Pairs the shared display buffer with the terminal output so any thread
/// may force a synchronous flush.
///
/// Locks are always taken buffer first, then output.
pub struct ScreenFlusher<O> {
    display: SharedDisplay,
    output: Arc<Mutex<O>>,
}

impl<O> Clone for ScreenFlusher<O> {
    fn clone(&self) -> Self {
        Self {
            display: Arc::clone(&self.display),
            output: Arc::clone(&self.output),
        }
    }
}

impl<O: OutputDriver> ScreenFlusher<O> {
    pub fn new(display: SharedDisplay, output: O) -> Self {
        Self {
            display,
            output: Arc::new(Mutex::new(output)),
        }
    }

    pub fn display(&self) -> &SharedDisplay {
        &self.display
    }

    /// Run `f` with exclusive access to the output driver.
    pub fn with_output<R>(&self, f: impl FnOnce(&mut O) -> R) -> R {
        let mut output = self
            .output
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&mut output)
    }

    /// Copy the buffer to the terminal if anything changed since the last
    /// flush. Returns whether a flush happened.
    pub fn flush(&self, cursor: Option<(u16, u16)>) -> io::Result<bool> {
        let mut buffer = lock_display(&self.display);
        if !buffer.needs_flush() {
            return Ok(false);
        }
        let full = buffer.take_flush_flags();
        self.with_output(|output| output.flush(&buffer, full, cursor))?;
        tracing::trace!(full, "flushed display buffer");
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compositor::DisplayBuffer;
    use crate::drivers::TerminalOutput;
    use crate::window::WindowId;
    use ratatui::backend::TestBackend;
    use ratatui::style::Style;
    use std::thread;

    #[test]
    fn flush_only_when_buffer_changed() {
        let display = Arc::new(Mutex::new(DisplayBuffer::new(3, 1)));
        let output = TerminalOutput::new(TestBackend::new(3, 1)).unwrap();
        let flusher = ScreenFlusher::new(Arc::clone(&display), output);

        assert!(flusher.flush(None).unwrap());
        assert!(!flusher.flush(None).unwrap());

        lock_display(&display).set(2, 0, 'k', Style::default(), WindowId::from_raw(1));
        assert!(flusher.flush(None).unwrap());
        flusher.with_output(|out| {
            assert_eq!(out.backend().buffer()[(2, 0)].symbol(), "k");
        });
    }

    #[test]
    fn background_thread_can_force_flush() {
        let display = Arc::new(Mutex::new(DisplayBuffer::new(2, 1)));
        let output = TerminalOutput::new(TestBackend::new(2, 1)).unwrap();
        let flusher = ScreenFlusher::new(Arc::clone(&display), output);
        let remote = flusher.clone();
        let flushed = thread::spawn(move || remote.flush(None).unwrap())
            .join()
            .unwrap();
        assert!(flushed);
        assert!(!lock_display(&display).needs_flush());
    }
}
