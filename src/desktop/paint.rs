use std::fmt;

use ratatui::style::Style;

use super::Desktop;
use crate::compositor::{DisplayBuffer, lock_display, visible};
use crate::error::Result;
use crate::geometry::Rect;
use crate::state::RenderState;
use crate::window::{WindowId, WindowTree};

const TAB_WIDTH: u16 = 8;

/// Occlusion-checked write of one cell at window-local `(lx, ly)`.
#[allow(clippy::too_many_arguments)]
fn admit(
    tree: &WindowTree,
    buffer: &mut DisplayBuffer,
    id: WindowId,
    abs: Rect,
    lx: i32,
    ly: i32,
    ch: char,
    style: Style,
) -> bool {
    visible(tree, buffer, id, lx, ly) && buffer.set(abs.x + lx, abs.y + ly, ch, style, id)
}

impl Desktop {
    /// Write a cell at `(x, y)` relative to the window's own rectangle, so
    /// decorations can reach the border. Returns whether the cell was taken.
    pub fn draw_cell(&self, id: WindowId, x: i32, y: i32, ch: char, style: Style) -> bool {
        let Some(abs) = self.tree.get(id).map(|w| w.abs) else {
            return false;
        };
        let mut buffer = lock_display(&self.display);
        admit(&self.tree, &mut buffer, id, abs, x, y, ch, style)
    }

    /// Horizontal run of [`Desktop::draw_cell`]. Returns the cells written.
    pub fn draw_text(&self, id: WindowId, x: i32, y: i32, text: &str, style: Style) -> usize {
        let Some(abs) = self.tree.get(id).map(|w| w.abs) else {
            return 0;
        };
        let mut buffer = lock_display(&self.display);
        let mut written = 0;
        for (i, ch) in text.chars().enumerate() {
            if admit(&self.tree, &mut buffer, id, abs, x + i as i32, y, ch, style) {
                written += 1;
            }
        }
        written
    }

    /// Blank the whole window rectangle in its current colors and home the
    /// text cursor.
    pub fn erase_background(&mut self, id: WindowId) {
        let Some(window) = self.tree.get(id) else {
            return;
        };
        let (abs, style) = (window.abs, window.render.style());
        {
            let mut buffer = lock_display(&self.display);
            for ly in 0..abs.height as i32 {
                for lx in 0..abs.width as i32 {
                    admit(&self.tree, &mut buffer, id, abs, lx, ly, ' ', style);
                }
            }
        }
        if let Some(window) = self.tree.get_mut(id) {
            window.render.cursor = (0, 0);
        }
    }

    pub fn putc(&mut self, id: WindowId, ch: char) -> Result<()> {
        let mut utf8 = [0u8; 4];
        self.putstring(id, ch.encode_utf8(&mut utf8))
    }

    /// Write `text` at the window's text cursor inside its client area.
    /// Cells that are clipped or occluded are skipped but still advance the
    /// cursor.
    pub fn putstring(&mut self, id: WindowId, text: &str) -> Result<()> {
        let window = self.tree.try_get(id)?;
        let (abs, client, style) = (window.abs, window.client, window.render.style());
        let (mut cx, mut cy) = window.render.cursor;
        {
            let mut buffer = lock_display(&self.display);
            for ch in text.chars() {
                match ch {
                    '\n' => {
                        cx = 0;
                        cy = cy.saturating_add(1);
                    }
                    '\r' => cx = 0,
                    '\t' => cx = (cx / TAB_WIDTH + 1).saturating_mul(TAB_WIDTH),
                    _ => {
                        let (ax, ay) = (client.x + cx as i32, client.y + cy as i32);
                        if client.contains(ax, ay) {
                            admit(&self.tree, &mut buffer, id, abs, ax - abs.x, ay - abs.y, ch, style);
                        }
                        cx = cx.saturating_add(1);
                    }
                }
            }
        }
        if let Some(window) = self.tree.get_mut(id) {
            window.render.cursor = (cx, cy);
        }
        Ok(())
    }

    /// `printf` for windows: `desktop.print_fmt(id, format_args!("{n} items"))`.
    pub fn print_fmt(&mut self, id: WindowId, args: fmt::Arguments<'_>) -> Result<()> {
        match args.as_str() {
            Some(text) => self.putstring(id, text),
            None => self.putstring(id, &args.to_string()),
        }
    }

    /// Move the client-relative text cursor.
    pub fn move_cursor(&mut self, id: WindowId, x: u16, y: u16) -> Result<()> {
        self.try_window_mut(id)?.render.cursor = (x, y);
        Ok(())
    }

    pub fn cursor(&self, id: WindowId) -> Option<(u16, u16)> {
        self.tree.get(id).map(|w| w.render.cursor)
    }

    /// Overlay `style` on the window's colors; unset channels are kept.
    pub fn set_colors(&mut self, id: WindowId, style: Style) -> Result<()> {
        let window = self.try_window_mut(id)?;
        window.render = window.render.with_style(style);
        Ok(())
    }

    pub fn render_state(&self, id: WindowId) -> Option<RenderState> {
        self.tree.get(id).map(|w| w.render)
    }

    pub fn show_cursor(&mut self, id: WindowId, shown: bool) -> Result<()> {
        self.try_window_mut(id)?.cursor_hidden = !shown;
        Ok(())
    }

    /// Run `f` with the window's colors and cursor saved, restoring them on
    /// the way out however `f` exits, unwinding included.
    pub fn with_saved_state<R>(
        &mut self,
        id: WindowId,
        f: impl FnOnce(&mut Desktop) -> R,
    ) -> Result<R> {
        let saved = self.tree.try_get(id)?.render;
        self.states.push(id, saved)?;
        let mut guard = SavedState { desktop: self };
        Ok(f(&mut *guard.desktop))
    }

    /// Terminal cursor position: the focused window's text cursor, when
    /// shown and on screen.
    pub fn screen_cursor(&self) -> Option<(u16, u16)> {
        let window = self.tree.get(self.focused())?;
        if window.cursor_hidden {
            return None;
        }
        let x = window.client.x + window.render.cursor.0 as i32;
        let y = window.client.y + window.render.cursor.1 as i32;
        if !window.client.contains(x, y) {
            return None;
        }
        let (width, height) = self.screen_size();
        let on_screen = (0..width as i32).contains(&x) && (0..height as i32).contains(&y);
        on_screen.then_some((x as u16, y as u16))
    }
}

/// Pops the saved render state back onto its window when dropped.
struct SavedState<'a> {
    desktop: &'a mut Desktop,
}

impl Drop for SavedState<'_> {
    fn drop(&mut self) {
        if let Ok((owner, state)) = self.desktop.states.pop()
            && let Some(window) = self.desktop.tree.get_mut(owner)
        {
            window.render = state;
        }
    }
}
