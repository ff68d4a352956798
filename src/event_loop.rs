use std::io;
use std::time::Duration;

use crate::compositor::{ScreenFlusher, lock_display};
use crate::desktop::Desktop;
use crate::drivers::OutputDriver;
use crate::message::HandlerResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlFlow {
    Continue,
    Quit,
}

/// The dispatch loop that drives the desktop on the main thread.
///
/// Raw input arrives through the desktop's queue from the input thread, so
/// this loop only ever blocks on the queue. Each turn it:
/// 1. Follows the terminal size, resizing the desktop when it changed.
/// 2. Waits up to the poll interval for a queue item, then drains the burst.
/// 3. Flushes the display once the queue is idle and something was drawn.
pub struct EventLoop<O> {
    flusher: ScreenFlusher<O>,
    poll_interval: Duration,
}

impl<O: OutputDriver> EventLoop<O> {
    pub fn new(flusher: ScreenFlusher<O>, poll_interval: Duration) -> Self {
        Self {
            flusher,
            poll_interval,
        }
    }

    pub fn flusher(&self) -> &ScreenFlusher<O> {
        &self.flusher
    }

    /// Run one turn of the loop.
    pub fn step(&mut self, desktop: &mut Desktop) -> io::Result<ControlFlow> {
        let (width, height) = self.flusher.with_output(|output| output.size())?;
        desktop.resize_screen(width, height);

        if let Some(item) = desktop.queue().pop_timeout(self.poll_interval) {
            // Drain bursts (drags, pastes) before drawing so the screen does
            // not fall behind the input stream.
            if desktop.handle_item(item) == HandlerResult::Exit
                || desktop.pump() == HandlerResult::Exit
            {
                return Ok(ControlFlow::Quit);
            }
        }
        if desktop.exit_requested() {
            return Ok(ControlFlow::Quit);
        }

        if desktop.queue().is_empty() {
            let requested = desktop.take_flush_request();
            if requested || lock_display(desktop.display()).needs_flush() {
                self.flusher.flush(desktop.screen_cursor())?;
            }
        }
        Ok(ControlFlow::Continue)
    }

    /// Take over the current thread until a handler or key binding asks to
    /// exit. The output driver is entered first and always exited.
    pub fn run(&mut self, desktop: &mut Desktop) -> io::Result<()> {
        self.flusher.with_output(|output| output.enter())?;
        let result = loop {
            match self.step(desktop) {
                Ok(ControlFlow::Continue) => {}
                Ok(ControlFlow::Quit) => break Ok(()),
                Err(err) => break Err(err),
            }
        };
        tracing::debug!(ok = result.is_ok(), "dispatch loop finished");
        let exited = self.flusher.with_output(|output| output.exit());
        result.and(exited)
    }
}
