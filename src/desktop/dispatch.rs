use std::time::{Duration, Instant};

use crossterm::event::{Event, KeyEvent, KeyEventKind, MouseButton, MouseEvent, MouseEventKind};

use super::Desktop;
use crate::constants::DOUBLE_CLICK_MS;
use crate::geometry::Rect;
use crate::keybindings::Action;
use crate::message::{Handler, HandlerResult, Message, MessageKind, MouseAction, MousePoint, Payload};
use crate::queue::QueueItem;
use crate::window::{InteractionMode, WindowId};

impl Desktop {
    /// Enqueue `msg` for the dispatch loop.
    pub fn post(&self, msg: Message) {
        self.queue.push(QueueItem::Message(msg));
    }

    /// Dispatch `msg` immediately on the calling (dispatch) thread.
    pub fn send(&mut self, msg: Message) -> HandlerResult {
        self.dispatch(msg)
    }

    /// Queue erase-background then display for `id` and every descendant,
    /// parents first, followed by one update-screen for `id`.
    pub fn invalidate(&mut self, id: WindowId) {
        if !self.tree.contains(id) {
            return;
        }
        for window in self.tree.subtree_pre_order(id) {
            self.post(Message::new(window, MessageKind::EraseBackground));
            self.post(Message::new(window, MessageKind::Display));
        }
        self.post(Message::new(id, MessageKind::UpdateScreen));
    }

    /// Handlers for `kind` on `id`: the window's own chain when it has one,
    /// otherwise the nearest class chain.
    fn resolve_handlers(&self, id: WindowId, kind: MessageKind) -> Vec<Handler> {
        let Some(window) = self.tree.get(id) else {
            return Vec::new();
        };
        if let Some(chain) = window.handler_chain(kind) {
            return chain.snapshot();
        }
        self.classes
            .resolve(window.class, kind)
            .map(|chain| chain.snapshot())
            .unwrap_or_default()
    }

    pub(crate) fn dispatch(&mut self, mut msg: Message) -> HandlerResult {
        loop {
            if !self.tree.contains(msg.target) {
                tracing::debug!(window = %msg.target, kind = %msg.kind, "dropping message for missing window");
                return HandlerResult::Ok;
            }

            let mut pass = false;
            for handler in self.resolve_handlers(msg.target, msg.kind) {
                match handler.call(self, &msg) {
                    HandlerResult::Ok => {}
                    HandlerResult::Stop => return HandlerResult::Stop,
                    HandlerResult::PassToParent => {
                        pass = true;
                        break;
                    }
                    HandlerResult::Exit => {
                        self.exit_requested = true;
                        return HandlerResult::Exit;
                    }
                }
            }

            if !pass {
                self.default_action(&msg);
                return HandlerResult::Ok;
            }
            match self.tree.get(msg.target).and_then(|w| w.parent) {
                Some(parent) => {
                    tracing::trace!(from = %msg.target, to = %parent, kind = %msg.kind, "passing to parent");
                    msg.target = parent;
                }
                None => return HandlerResult::PassToParent,
            }
        }
    }

    fn default_action(&mut self, msg: &Message) {
        let id = msg.target;
        match msg.kind {
            MessageKind::Display => {
                let decorator = self.decorator.clone();
                decorator.decorate(self, id);
            }
            MessageKind::EraseBackground => self.erase_background(id),
            MessageKind::UpdateScreen => self.flush_pending = true,
            MessageKind::KeyDown => {
                if let Payload::Key(key) = &msg.payload {
                    self.default_key(id, key);
                }
            }
            MessageKind::Close => {
                self.destroy_window(id);
            }
            MessageKind::ParentRepositioned => {
                if self.tree.get(id).is_some_and(|w| w.maximized) {
                    self.fill_parent(id);
                }
            }
            MessageKind::Mouse(_, MouseAction::Down) => {
                self.set_focus(id);
            }
            MessageKind::Destroy
            | MessageKind::Mouse(..)
            | MessageKind::ScrollUp
            | MessageKind::ScrollDown => {}
        }
    }

    fn fill_parent(&mut self, id: WindowId) {
        let Some(client) = self
            .tree
            .get(id)
            .and_then(|w| w.parent)
            .and_then(|p| self.tree.get(p))
            .map(|p| p.client)
        else {
            return;
        };
        self.reposition(id, Rect::new(0, 0, client.width, client.height));
    }

    fn default_key(&mut self, id: WindowId, key: &KeyEvent) {
        let Some(action) = self.bindings.action_for_key(key) else {
            return;
        };
        tracing::debug!(window = %id, %action, "key binding");
        let scope = self.tree.get(id).and_then(|w| w.parent).unwrap_or(id);
        match action {
            Action::Quit => self.exit_requested = true,
            Action::FocusNext => {
                self.next_focus(scope);
            }
            Action::FocusPrev => {
                self.prev_focus(scope);
            }
            Action::Close => self.post(Message::new(id, MessageKind::Close)),
            Action::ToggleMaximize => {
                self.toggle_maximize(id);
            }
            Action::Reposition => {
                self.begin_mode(id, InteractionMode::Reposition);
            }
            Action::Resize => {
                self.begin_mode(id, InteractionMode::Resize);
            }
        }
    }

    /// Process one queue item on the dispatch thread.
    pub fn handle_item(&mut self, item: QueueItem) -> HandlerResult {
        match item {
            QueueItem::Message(msg) => self.dispatch(msg),
            QueueItem::Input(event) => self.handle_input(event),
        }
    }

    /// Translate raw terminal input into targeted messages.
    pub fn handle_input(&mut self, event: Event) -> HandlerResult {
        match event {
            Event::Key(key) if key.kind != KeyEventKind::Release => {
                let target = self.focused();
                self.dispatch(Message::key(target, key))
            }
            Event::Mouse(mouse) => self.handle_mouse(mouse, Instant::now()),
            Event::Resize(width, height) => {
                self.resize_screen(width, height);
                HandlerResult::Ok
            }
            _ => HandlerResult::Ok,
        }
    }

    pub(crate) fn handle_mouse(&mut self, mouse: MouseEvent, now: Instant) -> HandlerResult {
        let kind = match mouse.kind {
            MouseEventKind::Down(button) => {
                let action = self.classify_press(button, mouse.column, mouse.row, now);
                MessageKind::Mouse(button, action)
            }
            MouseEventKind::Up(button) => MessageKind::Mouse(button, MouseAction::Up),
            MouseEventKind::Drag(button) => MessageKind::Mouse(button, MouseAction::Drag),
            MouseEventKind::ScrollUp => MessageKind::ScrollUp,
            MouseEventKind::ScrollDown => MessageKind::ScrollDown,
            _ => return HandlerResult::Ok,
        };
        let (x, y) = (mouse.column as i32, mouse.row as i32);
        let Some(target) = self.tree.hit_test(x, y) else {
            return HandlerResult::Ok;
        };
        let Some(abs) = self.tree.get(target).map(|w| w.abs) else {
            return HandlerResult::Ok;
        };
        let point = MousePoint {
            x: x - abs.x,
            y: y - abs.y,
            column: mouse.column,
            row: mouse.row,
            modifiers: mouse.modifiers,
        };
        self.dispatch(Message::with_payload(target, kind, Payload::Mouse(point)))
    }

    /// A second press of the same button on the same cell inside the
    /// double-click window becomes a double click and resets the tracker.
    fn classify_press(&mut self, button: MouseButton, column: u16, row: u16, now: Instant) -> MouseAction {
        let window = Duration::from_millis(DOUBLE_CLICK_MS);
        if let Some((last_button, last_col, last_row, at)) = self.last_click
            && last_button == button
            && (last_col, last_row) == (column, row)
            && now.saturating_duration_since(at) <= window
        {
            self.last_click = None;
            return MouseAction::DoubleClick;
        }
        self.last_click = Some((button, column, row, now));
        MouseAction::Down
    }

    /// Whether an update-screen was dispatched since the last call.
    pub fn take_flush_request(&mut self) -> bool {
        std::mem::take(&mut self.flush_pending)
    }

    /// Drain the queue without blocking. Stops early on exit.
    pub fn pump(&mut self) -> HandlerResult {
        while let Some(item) = self.queue.try_pop() {
            if self.handle_item(item) == HandlerResult::Exit || self.exit_requested {
                return HandlerResult::Exit;
            }
        }
        HandlerResult::Ok
    }
}
