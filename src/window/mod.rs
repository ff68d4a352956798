pub mod decorator;

mod tree;

use std::collections::HashMap;
use std::fmt;

use slotmap::Key;

pub use tree::WindowTree;

use crate::class::ClassId;
use crate::geometry::{Insets, Rect, WindowFlags};
use crate::message::{HandlerChain, HandlerId, MessageKind};
use crate::state::RenderState;

slotmap::new_key_type! {
    /// Generation-checked handle into the window tree.
    ///
    /// A handle outlives the window it names without dangling: once the slot is
    /// reused the version no longer matches and lookups return `None`.
    pub struct WindowId;
}

impl fmt::Display for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.data())
    }
}

#[cfg(test)]
impl WindowId {
    pub(crate) fn from_raw(index: u32) -> Self {
        slotmap::KeyData::from_ffi(u64::from(index) | (1 << 32)).into()
    }
}

/// Interactive geometry mode driven by the keyboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InteractionMode {
    #[default]
    Normal,
    Reposition,
    Resize,
}

#[derive(Debug)]
pub struct Window {
    pub(crate) serial: u64,
    pub(crate) title: String,
    pub(crate) name: Option<String>,
    pub(crate) flags: WindowFlags,
    pub(crate) class: ClassId,

    pub(crate) parent: Option<WindowId>,
    // paint order
    pub(crate) first_child: Option<WindowId>,
    pub(crate) last_child: Option<WindowId>,
    pub(crate) next: Option<WindowId>,
    pub(crate) prev: Option<WindowId>,
    // z order; the head is the front-most child and doubles as the focus child
    pub(crate) z_head: Option<WindowId>,
    pub(crate) lower: Option<WindowId>,
    pub(crate) z: u32,
    pub(crate) child_count: u32,

    pub(crate) rect: Rect,
    pub(crate) abs: Rect,
    pub(crate) client: Rect,
    // bumped each time a reposition re-places this window
    pub(crate) placement: u64,

    pub(crate) render: RenderState,
    pub(crate) cursor_hidden: bool,
    pub(crate) mode: InteractionMode,
    pub(crate) maximized: bool,
    pub(crate) restore_rect: Option<Rect>,
    pub(crate) modal_handler: Option<HandlerId>,
    pub(crate) handlers: HashMap<MessageKind, HandlerChain>,
}

impl Window {
    pub(crate) fn new(serial: u64, rect: Rect, flags: WindowFlags, class: ClassId) -> Self {
        Self {
            serial,
            title: String::new(),
            name: None,
            flags,
            class,
            parent: None,
            first_child: None,
            last_child: None,
            next: None,
            prev: None,
            z_head: None,
            lower: None,
            z: 0,
            child_count: 0,
            rect,
            abs: rect,
            client: rect.inset(Insets::for_flags(flags)),
            placement: 0,
            render: RenderState::default(),
            cursor_hidden: true,
            mode: InteractionMode::Normal,
            maximized: false,
            restore_rect: None,
            modal_handler: None,
            handlers: HashMap::new(),
        }
    }

    /// Monotonically assigned creation number.
    pub fn serial(&self) -> u64 {
        self.serial
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn flags(&self) -> WindowFlags {
        self.flags
    }

    pub fn class(&self) -> ClassId {
        self.class
    }

    pub fn parent(&self) -> Option<WindowId> {
        self.parent
    }

    /// Front-most child, which is also the focus child.
    pub fn focus_child(&self) -> Option<WindowId> {
        self.z_head
    }

    pub fn z_value(&self) -> u32 {
        self.z
    }

    pub fn child_count(&self) -> usize {
        self.child_count as usize
    }

    /// Rectangle relative to the parent's client origin.
    pub fn rect(&self) -> Rect {
        self.rect
    }

    /// Absolute screen rectangle.
    pub fn abs_rect(&self) -> Rect {
        self.abs
    }

    /// Absolute client rectangle.
    pub fn client_rect(&self) -> Rect {
        self.client
    }

    pub fn render_state(&self) -> RenderState {
        self.render
    }

    pub fn cursor_hidden(&self) -> bool {
        self.cursor_hidden
    }

    pub fn mode(&self) -> InteractionMode {
        self.mode
    }

    pub fn is_maximized(&self) -> bool {
        self.maximized
    }

    pub fn is_root(&self) -> bool {
        self.flags.contains(WindowFlags::ROOT)
    }

    pub fn has_border(&self) -> bool {
        self.flags.contains(WindowFlags::BORDER)
    }

    pub(crate) fn handler_chain(&self, kind: MessageKind) -> Option<&HandlerChain> {
        self.handlers.get(&kind).filter(|chain| !chain.is_empty())
    }

    pub(crate) fn handler_chain_mut(&mut self, kind: MessageKind) -> &mut HandlerChain {
        self.handlers.entry(kind).or_default()
    }

    /// Re-derive absolute and client rectangles from a parent client origin.
    pub(crate) fn place(&mut self, origin_x: i32, origin_y: i32) {
        self.abs = self.rect.offset(origin_x, origin_y);
        self.client = self.abs.inset(Insets::for_flags(self.flags));
    }
}
