//! Keyboard-driven move and resize.
//!
//! Entering a mode installs a transient key handler at the front of the
//! window's key-down chain. Arrow keys nudge the window one cell at a time,
//! Enter or Esc return to normal, and every other key is passed to the
//! parent untouched.

use crossterm::event::{KeyCode, KeyEvent};

use crate::desktop::Desktop;
use crate::geometry::{Rect, WindowFlags};
use crate::message::{Handler, HandlerResult, MessageKind};
use crate::window::{InteractionMode, WindowId};

impl Desktop {
    /// Enter `mode` on `id`. Requires a border, and for resizing also the
    /// resizable flag. Returns whether the mode was entered.
    pub fn begin_mode(&mut self, id: WindowId, mode: InteractionMode) -> bool {
        let Some(window) = self.tree.get(id) else {
            return false;
        };
        let allowed = match mode {
            InteractionMode::Normal => false,
            InteractionMode::Reposition => window.flags.contains(WindowFlags::BORDER),
            InteractionMode::Resize => window
                .flags
                .contains(WindowFlags::BORDER | WindowFlags::RESIZABLE),
        };
        if !allowed {
            tracing::debug!(window = %id, ?mode, "mode change rejected");
            return false;
        }
        if window.mode != InteractionMode::Normal {
            self.end_mode(id);
        }
        let handler = match self.prepend_handler(id, MessageKind::KeyDown, Handler::on_key(modal_key)) {
            Ok(handler) => handler,
            Err(_) => return false,
        };
        if let Some(window) = self.tree.get_mut(id) {
            window.mode = mode;
            window.modal_handler = Some(handler);
        }
        tracing::debug!(window = %id, ?mode, "entered interaction mode");
        self.invalidate(id);
        true
    }

    /// Return `id` to normal mode and drop the transient key handler.
    pub fn end_mode(&mut self, id: WindowId) -> bool {
        let Some(window) = self.tree.get_mut(id) else {
            return false;
        };
        if window.mode == InteractionMode::Normal {
            return false;
        }
        window.mode = InteractionMode::Normal;
        if let Some(handler) = window.modal_handler.take() {
            window.handler_chain_mut(MessageKind::KeyDown).remove(handler);
        }
        tracing::debug!(window = %id, "left interaction mode");
        self.invalidate(id);
        true
    }
}

fn modal_key(desktop: &mut Desktop, id: WindowId, key: &KeyEvent) -> HandlerResult {
    let Some(window) = desktop.tree.get(id) else {
        return HandlerResult::PassToParent;
    };
    let mode = window.mode;
    let rect = window.rect;
    if matches!(key.code, KeyCode::Enter | KeyCode::Esc) {
        desktop.end_mode(id);
        return HandlerResult::Stop;
    }
    let Some(next) = nudge(rect, mode, key.code) else {
        return HandlerResult::PassToParent;
    };
    if let Some(window) = desktop.tree.get_mut(id) {
        window.maximized = false;
    }
    desktop.reposition(id, next);
    HandlerResult::Stop
}

fn nudge(rect: Rect, mode: InteractionMode, code: KeyCode) -> Option<Rect> {
    let mut next = rect;
    match (mode, code) {
        (InteractionMode::Reposition, KeyCode::Left) => next.x -= 1,
        (InteractionMode::Reposition, KeyCode::Right) => next.x += 1,
        (InteractionMode::Reposition, KeyCode::Up) => next.y -= 1,
        (InteractionMode::Reposition, KeyCode::Down) => next.y += 1,
        // Never shrink below the border itself.
        (InteractionMode::Resize, KeyCode::Left) => next.width = next.width.saturating_sub(1).max(2),
        (InteractionMode::Resize, KeyCode::Right) => next.width = next.width.saturating_add(1),
        (InteractionMode::Resize, KeyCode::Up) => next.height = next.height.saturating_sub(1).max(2),
        (InteractionMode::Resize, KeyCode::Down) => next.height = next.height.saturating_add(1),
        _ => return None,
    }
    Some(next)
}
