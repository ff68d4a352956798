//! Typed messages, handler return codes and handler chains.
//!
//! The set of message kinds is closed: every kind maps to exactly one
//! handler-chain slot on a window or class, and names are resolved through
//! [`MessageKind::from_str`] when widgets register handlers by name.

use std::any::Any;
use std::fmt;
use std::rc::Rc;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};

use crossterm::event::{KeyEvent, KeyModifiers, MouseButton};

use crate::desktop::Desktop;
use crate::error::WmError;
use crate::geometry::Rect;
use crate::window::WindowId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseAction {
    Down,
    Up,
    DoubleClick,
    Drag,
}

impl MouseAction {
    fn as_str(self) -> &'static str {
        match self {
            MouseAction::Down => "down",
            MouseAction::Up => "up",
            MouseAction::DoubleClick => "double",
            MouseAction::Drag => "drag",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    Display,
    EraseBackground,
    UpdateScreen,
    KeyDown,
    Destroy,
    Close,
    ParentRepositioned,
    Mouse(MouseButton, MouseAction),
    ScrollUp,
    ScrollDown,
}

impl MessageKind {
    /// Every handler-chain slot, in a stable order.
    pub fn all() -> Vec<MessageKind> {
        let mut kinds = vec![
            MessageKind::Display,
            MessageKind::EraseBackground,
            MessageKind::UpdateScreen,
            MessageKind::KeyDown,
            MessageKind::Destroy,
            MessageKind::Close,
            MessageKind::ParentRepositioned,
        ];
        for button in [MouseButton::Left, MouseButton::Right, MouseButton::Middle] {
            for action in [
                MouseAction::Down,
                MouseAction::Up,
                MouseAction::DoubleClick,
                MouseAction::Drag,
            ] {
                kinds.push(MessageKind::Mouse(button, action));
            }
        }
        kinds.push(MessageKind::ScrollUp);
        kinds.push(MessageKind::ScrollDown);
        kinds
    }

    pub fn is_mouse(self) -> bool {
        matches!(
            self,
            MessageKind::Mouse(..) | MessageKind::ScrollUp | MessageKind::ScrollDown
        )
    }
}

fn button_name(button: MouseButton) -> &'static str {
    match button {
        MouseButton::Left => "left",
        MouseButton::Right => "right",
        MouseButton::Middle => "middle",
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageKind::Display => f.write_str("display"),
            MessageKind::EraseBackground => f.write_str("erase_background"),
            MessageKind::UpdateScreen => f.write_str("update_screen"),
            MessageKind::KeyDown => f.write_str("key_down"),
            MessageKind::Destroy => f.write_str("destroy"),
            MessageKind::Close => f.write_str("close"),
            MessageKind::ParentRepositioned => f.write_str("parent_repositioned"),
            MessageKind::Mouse(button, action) => {
                write!(f, "mouse_{}_{}", button_name(*button), action.as_str())
            }
            MessageKind::ScrollUp => f.write_str("mouse_scroll_up"),
            MessageKind::ScrollDown => f.write_str("mouse_scroll_down"),
        }
    }
}

impl FromStr for MessageKind {
    type Err = WmError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        MessageKind::all()
            .into_iter()
            .find(|kind| kind.to_string() == name)
            .ok_or_else(|| WmError::UnknownMessage(name.to_string()))
    }
}

/// Mouse position delivered to a window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MousePoint {
    /// Window-local column.
    pub x: i32,
    /// Window-local row.
    pub y: i32,
    pub column: u16,
    pub row: u16,
    pub modifiers: KeyModifiers,
}

#[derive(Debug, Default)]
pub enum Payload {
    #[default]
    None,
    Key(KeyEvent),
    Mouse(MousePoint),
    /// Old and new absolute rectangles of the parent.
    Reposition { old: Rect, new: Rect },
    Custom(Box<dyn Any + Send>),
}

#[derive(Debug)]
pub struct Message {
    pub target: WindowId,
    pub kind: MessageKind,
    pub payload: Payload,
}

impl Message {
    pub fn new(target: WindowId, kind: MessageKind) -> Self {
        Self {
            target,
            kind,
            payload: Payload::None,
        }
    }

    pub fn with_payload(target: WindowId, kind: MessageKind, payload: Payload) -> Self {
        Self {
            target,
            kind,
            payload,
        }
    }

    pub fn key(target: WindowId, key: KeyEvent) -> Self {
        Self::with_payload(target, MessageKind::KeyDown, Payload::Key(key))
    }
}

/// What a handler wants the dispatcher to do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerResult {
    /// Run the next handler, then the default action.
    Ok,
    /// Handled; skip the remaining handlers and the default action.
    Stop,
    /// Re-dispatch the same message to the target's parent.
    PassToParent,
    /// Unwind the dispatch loop.
    Exit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandlerId(u64);

impl HandlerId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        HandlerId(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

type HandlerFn = dyn Fn(&mut Desktop, &Message) -> HandlerResult;

/// A message handler plus the adapter that unpacks its payload.
#[derive(Clone)]
pub struct Handler {
    func: Rc<HandlerFn>,
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handler").finish_non_exhaustive()
    }
}

impl Handler {
    /// Raw handler that sees the whole message.
    pub fn new<F>(func: F) -> Self
    where
        F: Fn(&mut Desktop, &Message) -> HandlerResult + 'static,
    {
        Self {
            func: Rc::new(func),
        }
    }

    /// Handler for payload-less messages (paint, close, destroy, ...).
    pub fn on_window<F>(func: F) -> Self
    where
        F: Fn(&mut Desktop, WindowId) -> HandlerResult + 'static,
    {
        Self::new(move |desktop, msg| func(desktop, msg.target))
    }

    pub fn on_key<F>(func: F) -> Self
    where
        F: Fn(&mut Desktop, WindowId, &KeyEvent) -> HandlerResult + 'static,
    {
        Self::new(move |desktop, msg| match &msg.payload {
            Payload::Key(key) => func(desktop, msg.target, key),
            _ => HandlerResult::Ok,
        })
    }

    pub fn on_mouse<F>(func: F) -> Self
    where
        F: Fn(&mut Desktop, WindowId, MousePoint) -> HandlerResult + 'static,
    {
        Self::new(move |desktop, msg| match msg.payload {
            Payload::Mouse(point) => func(desktop, msg.target, point),
            _ => HandlerResult::Ok,
        })
    }

    pub fn on_reposition<F>(func: F) -> Self
    where
        F: Fn(&mut Desktop, WindowId, Rect, Rect) -> HandlerResult + 'static,
    {
        Self::new(move |desktop, msg| match msg.payload {
            Payload::Reposition { old, new } => func(desktop, msg.target, old, new),
            _ => HandlerResult::Ok,
        })
    }

    pub(crate) fn call(&self, desktop: &mut Desktop, msg: &Message) -> HandlerResult {
        (self.func)(desktop, msg)
    }
}

/// Ordered handlers for one message kind, consulted front to back.
#[derive(Debug, Clone, Default)]
pub struct HandlerChain {
    entries: Vec<(HandlerId, Handler)>,
}

impl HandlerChain {
    pub fn push_back(&mut self, handler: Handler) -> HandlerId {
        let id = HandlerId::next();
        self.entries.push((id, handler));
        id
    }

    pub fn push_front(&mut self, handler: Handler) -> HandlerId {
        let id = HandlerId::next();
        self.entries.insert(0, (id, handler));
        id
    }

    pub fn remove(&mut self, id: HandlerId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(entry, _)| *entry != id);
        before != self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn contains(&self, id: HandlerId) -> bool {
        self.entries.iter().any(|(entry, _)| *entry == id)
    }

    /// Cloned handlers so the chain can be run while the desktop is borrowed.
    pub(crate) fn snapshot(&self) -> Vec<Handler> {
        self.entries.iter().map(|(_, h)| h.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip_for_every_slot() {
        for kind in MessageKind::all() {
            let parsed: MessageKind = kind.to_string().parse().unwrap();
            assert_eq!(parsed, kind);
        }
        assert_eq!(
            "mouse_left_double".parse::<MessageKind>().unwrap(),
            MessageKind::Mouse(MouseButton::Left, MouseAction::DoubleClick)
        );
    }

    #[test]
    fn unknown_name_is_rejected() {
        let err = "key_up".parse::<MessageKind>().unwrap_err();
        assert!(matches!(err, WmError::UnknownMessage(name) if name == "key_up"));
    }

    #[test]
    fn chain_front_insert_and_remove() {
        let mut chain = HandlerChain::default();
        let back = chain.push_back(Handler::on_window(|_, _| HandlerResult::Ok));
        let front = chain.push_front(Handler::on_window(|_, _| HandlerResult::Stop));
        assert_eq!(chain.len(), 2);
        assert_eq!(chain.entries[0].0, front);
        assert!(chain.remove(front));
        assert!(!chain.remove(front));
        assert!(chain.contains(back));
    }
}
