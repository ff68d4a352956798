//! The desktop: one explicitly constructed context owning the window tree,
//! the display buffer, the message queue and the class registry.
//!
//! Only the dispatch thread ever holds a `Desktop`. Other threads reach it
//! through a [`MessageSender`] and, for forced flushes, through the shared
//! display buffer.

mod dispatch;
mod paint;
mod style;

use std::collections::HashMap;
use std::rc::Rc;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use crossterm::event::MouseButton;

use crate::class::{ClassId, ClassRegistry};
use crate::compositor::{DisplayBuffer, SharedDisplay, lock_display};
use crate::config::ConfigStore;
use crate::error::{Result, WmError};
use crate::geometry::{Rect, WindowFlags};
use crate::keybindings::KeyBindings;
use crate::message::{Handler, HandlerId, Message, MessageKind, Payload};
use crate::queue::{MessageQueue, MessageSender};
use crate::state::RenderStateStack;
use crate::window::decorator::{BoxDecorator, WindowDecorator};
use crate::window::{InteractionMode, Window, WindowId, WindowTree};

pub struct Desktop {
    pub(crate) root: WindowId,
    pub(crate) tree: WindowTree,
    pub(crate) display: SharedDisplay,
    pub(crate) queue: MessageQueue,
    pub(crate) classes: ClassRegistry,
    pub(crate) states: RenderStateStack,
    pub(crate) config: ConfigStore,
    pub(crate) bindings: KeyBindings,
    pub(crate) decorator: Rc<dyn WindowDecorator>,
    pub(crate) exit_requested: bool,
    pub(crate) flush_pending: bool,
    pub(crate) last_click: Option<(MouseButton, u16, u16, Instant)>,
}

impl std::fmt::Debug for Desktop {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Desktop")
            .field("windows", &self.tree.len())
            .field("focused", &self.tree.focused())
            .field("queued", &self.queue.len())
            .field("exit_requested", &self.exit_requested)
            .finish_non_exhaustive()
    }
}

impl Desktop {
    /// Create a desktop for a `width` x `height` screen with its root window.
    pub fn new(width: u16, height: u16) -> Result<Self> {
        Self::with_config(width, height, ConfigStore::new())
    }

    pub fn with_config(width: u16, height: u16, config: ConfigStore) -> Result<Self> {
        let bindings = KeyBindings::from_config(&config)?;
        let mut tree = WindowTree::new();
        let root = tree.create(
            None,
            Rect::new(0, 0, width, height),
            WindowFlags::ROOT,
            ClassId::BASE,
        )?;
        Ok(Self {
            root,
            tree,
            display: Arc::new(Mutex::new(DisplayBuffer::new(width, height))),
            queue: MessageQueue::new(),
            classes: ClassRegistry::new(),
            states: RenderStateStack::new(),
            config,
            bindings,
            decorator: Rc::new(BoxDecorator),
            exit_requested: false,
            flush_pending: false,
            last_click: None,
        })
    }

    pub fn root(&self) -> WindowId {
        self.root
    }

    pub fn tree(&self) -> &WindowTree {
        &self.tree
    }

    pub fn window(&self, id: WindowId) -> Option<&Window> {
        self.tree.get(id)
    }

    pub fn focused(&self) -> WindowId {
        self.tree.focused().unwrap_or(self.root)
    }

    pub fn display(&self) -> &SharedDisplay {
        &self.display
    }

    /// Snapshot of the display buffer, mostly for tests and diagnostics.
    pub fn screen(&self) -> DisplayBuffer {
        lock_display(&self.display).clone()
    }

    pub fn screen_size(&self) -> (u16, u16) {
        let buffer = lock_display(&self.display);
        (buffer.width(), buffer.height())
    }

    pub fn classes(&self) -> &ClassRegistry {
        &self.classes
    }

    pub fn classes_mut(&mut self) -> &mut ClassRegistry {
        &mut self.classes
    }

    pub fn config(&self) -> &ConfigStore {
        &self.config
    }

    pub fn bindings(&self) -> &KeyBindings {
        &self.bindings
    }

    pub fn set_bindings(&mut self, bindings: KeyBindings) {
        self.bindings = bindings;
    }

    pub fn set_decorator(&mut self, decorator: impl WindowDecorator + 'static) {
        self.decorator = Rc::new(decorator);
    }

    pub fn sender(&self) -> MessageSender {
        self.queue.sender()
    }

    pub fn queue(&self) -> &MessageQueue {
        &self.queue
    }

    pub fn exit_requested(&self) -> bool {
        self.exit_requested
    }

    pub fn request_exit(&mut self) {
        self.exit_requested = true;
    }

    fn try_window_mut(&mut self, id: WindowId) -> Result<&mut Window> {
        self.tree.get_mut(id).ok_or(WmError::UnknownWindow(id))
    }

    // ---- lifecycle ----

    /// Create a window of the base class. `rect` is relative to the parent's
    /// client origin. Nothing is painted until the window is invalidated.
    pub fn create_window(
        &mut self,
        parent: impl Into<Option<WindowId>>,
        rect: Rect,
        flags: WindowFlags,
    ) -> Result<WindowId> {
        self.tree.create(parent.into(), rect, flags, ClassId::BASE)
    }

    pub fn create_window_with_class(
        &mut self,
        parent: impl Into<Option<WindowId>>,
        rect: Rect,
        flags: WindowFlags,
        class: &str,
    ) -> Result<WindowId> {
        let class_id = self
            .classes
            .lookup(class)
            .ok_or_else(|| WmError::UnknownClass(class.to_string()))?;
        self.tree.create(parent.into(), rect, flags, class_id)
    }

    pub fn set_title(&mut self, id: WindowId, title: impl Into<String>) -> Result<()> {
        self.try_window_mut(id)?.title = title.into();
        Ok(())
    }

    /// Name used for `window.<name>.*` config lookups.
    pub fn set_name(&mut self, id: WindowId, name: impl Into<String>) -> Result<()> {
        self.try_window_mut(id)?.name = Some(name.into());
        Ok(())
    }

    /// Tear down `id` and its subtree. Every window receives `Destroy`
    /// (children first) while still attached. The root cannot be destroyed.
    pub fn destroy_window(&mut self, id: WindowId) -> bool {
        let Some(window) = self.tree.get(id) else {
            return false;
        };
        let Some(parent) = window.parent else {
            return false;
        };
        for victim in self.tree.subtree_post_order(id) {
            if self.tree.contains(victim) {
                self.send(Message::new(victim, MessageKind::Destroy));
            }
        }
        let removed = self.tree.remove(id);
        tracing::debug!(window = %id, removed = removed.len(), "destroyed window");
        self.invalidate(parent);
        !removed.is_empty()
    }

    // ---- handlers ----

    /// Append an instance handler. Instance chains shadow class chains.
    pub fn add_handler(
        &mut self,
        id: WindowId,
        kind: MessageKind,
        handler: Handler,
    ) -> Result<HandlerId> {
        Ok(self
            .try_window_mut(id)?
            .handler_chain_mut(kind)
            .push_back(handler))
    }

    pub fn prepend_handler(
        &mut self,
        id: WindowId,
        kind: MessageKind,
        handler: Handler,
    ) -> Result<HandlerId> {
        Ok(self
            .try_window_mut(id)?
            .handler_chain_mut(kind)
            .push_front(handler))
    }

    pub fn remove_handler(&mut self, id: WindowId, kind: MessageKind, handler: HandlerId) -> bool {
        self.tree
            .get_mut(id)
            .is_some_and(|w| w.handler_chain_mut(kind).remove(handler))
    }

    // ---- geometry ----

    /// Move and resize `id`. Descendants are re-placed at once and then told
    /// through `ParentRepositioned`, parents before children; finally the
    /// parent is invalidated so uncovered cells are repainted (the window
    /// itself for the root).
    pub fn reposition(&mut self, id: WindowId, rect: Rect) -> bool {
        if !self.tree.contains(id) {
            return false;
        }
        let moved: HashMap<WindowId, (Rect, Rect)> = self
            .tree
            .reposition(id, rect)
            .into_iter()
            .map(|(window, old, new)| (window, (old, new)))
            .collect();
        tracing::debug!(window = %id, ?rect, subtree = moved.len(), "repositioned window");
        self.notify_children(id, &moved);

        let target = self.tree.get(id).and_then(|w| w.parent).unwrap_or(id);
        self.invalidate(target);
        true
    }

    /// Send `ParentRepositioned` to the children of `parent`, walking the
    /// live tree. A subtree whose root was placed again by a handler has
    /// already been told by that nested reposition and is skipped.
    fn notify_children(&mut self, parent: WindowId, moved: &HashMap<WindowId, (Rect, Rect)>) {
        let Some(&(old, new)) = moved.get(&parent) else {
            return;
        };
        let Some(stamp) = self.tree.placement(parent) else {
            return;
        };
        for child in self.tree.children(parent) {
            if self.tree.placement(parent) != Some(stamp) {
                return;
            }
            if !moved.contains_key(&child) {
                continue;
            }
            let before = self.tree.placement(child);
            self.send(Message::with_payload(
                child,
                MessageKind::ParentRepositioned,
                Payload::Reposition { old, new },
            ));
            if before.is_some() && self.tree.placement(child) == before {
                self.notify_children(child, moved);
            }
        }
    }

    /// Maximize `id` to its parent's client area, or restore the saved
    /// rectangle. No-op on the root and on windows that are not maximizable.
    pub fn toggle_maximize(&mut self, id: WindowId) -> bool {
        let Some(window) = self.tree.get(id) else {
            return false;
        };
        if window.is_root() || !window.flags.contains(WindowFlags::MAXIMIZABLE) {
            return false;
        }
        let Some(parent_client) = window
            .parent
            .and_then(|p| self.tree.get(p))
            .map(|p| p.client)
        else {
            return false;
        };
        let in_mode = window.mode != InteractionMode::Normal;
        let current = window.rect;

        let Ok(window) = self.try_window_mut(id) else {
            return false;
        };
        if in_mode {
            window.maximized = false;
        }
        let target = if window.maximized {
            window.maximized = false;
            window.restore_rect.take().unwrap_or(current)
        } else {
            window.restore_rect = Some(current);
            window.maximized = true;
            Rect::new(0, 0, parent_client.width, parent_client.height)
        };
        tracing::debug!(window = %id, maximized = window.maximized, "toggled maximize");
        self.reposition(id, target)
    }

    // ---- focus ----

    /// Raise `id` and its ancestors and make the new leaf the focused window.
    pub fn set_focus(&mut self, id: WindowId) -> bool {
        self.refocus(|tree| tree.set_focus(id).then_some(id))
            .is_some()
    }

    pub fn next_focus(&mut self, parent: WindowId) -> Option<WindowId> {
        self.refocus(|tree| tree.next_focus(parent))
    }

    pub fn prev_focus(&mut self, parent: WindowId) -> Option<WindowId> {
        self.refocus(|tree| tree.prev_focus(parent))
    }

    /// Apply a focus change and repaint the branches whose stacking or
    /// decoration changed: the raised branch and the one that lost focus.
    fn refocus(
        &mut self,
        change: impl FnOnce(&mut WindowTree) -> Option<WindowId>,
    ) -> Option<WindowId> {
        let before = self.tree.focused().map(|leaf| self.tree.chain(leaf));
        let result = change(&mut self.tree)?;
        let after = self.tree.focused().map(|leaf| self.tree.chain(leaf));
        let (Some(before), Some(after)) = (before, after) else {
            return Some(result);
        };
        if before == after {
            return Some(result);
        }
        let shared = before
            .iter()
            .zip(after.iter())
            .take_while(|(a, b)| a == b)
            .count();
        if let Some(lost) = before.get(shared)
            && self.tree.contains(*lost)
        {
            self.invalidate(*lost);
        }
        if let Some(raised) = after.get(shared) {
            self.invalidate(*raised);
        }
        Some(result)
    }

    /// React to a new terminal size: reallocate the buffer and re-place the
    /// whole tree. Returns whether the size actually changed.
    pub fn resize_screen(&mut self, width: u16, height: u16) -> bool {
        if self.screen_size() == (width, height) {
            return false;
        }
        lock_display(&self.display).resize(width, height);
        tracing::debug!(width, height, "screen resized");
        let root = self.root();
        self.reposition(root, Rect::new(0, 0, width, height))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::HandlerResult;
    use std::cell::RefCell;

    fn desktop() -> (Desktop, WindowId) {
        let desktop = Desktop::new(80, 24).unwrap();
        let root = desktop.root();
        (desktop, root)
    }

    #[test]
    fn new_desktop_has_focused_root() {
        let (desktop, root) = desktop();
        assert_eq!(desktop.focused(), root);
        assert!(desktop.window(root).unwrap().is_root());
        assert_eq!(desktop.screen_size(), (80, 24));
    }

    #[test]
    fn second_root_is_rejected() {
        let (mut desktop, _) = desktop();
        let err = desktop
            .create_window(None, Rect::new(0, 0, 5, 5), WindowFlags::ROOT)
            .unwrap_err();
        assert!(matches!(err, WmError::MissingParent));
    }

    #[test]
    fn unknown_class_fails_without_attaching() {
        let (mut desktop, root) = desktop();
        let err = desktop
            .create_window_with_class(root, Rect::new(0, 0, 5, 5), WindowFlags::BORDER, "nope")
            .unwrap_err();
        assert!(matches!(err, WmError::UnknownClass(_)));
        assert_eq!(desktop.tree().children(root), Vec::<WindowId>::new());
    }

    #[test]
    fn destroy_notifies_children_first_and_refocuses() {
        let (mut desktop, root) = desktop();
        let a = desktop
            .create_window(root, Rect::new(0, 0, 10, 5), WindowFlags::BORDER)
            .unwrap();
        let b = desktop
            .create_window(root, Rect::new(5, 0, 10, 5), WindowFlags::BORDER)
            .unwrap();
        let inner = desktop
            .create_window(b, Rect::new(0, 0, 3, 2), WindowFlags::empty())
            .unwrap();
        let log = Rc::new(RefCell::new(Vec::new()));
        for id in [b, inner] {
            let log = Rc::clone(&log);
            desktop
                .add_handler(
                    id,
                    MessageKind::Destroy,
                    Handler::on_window(move |_, target| {
                        log.borrow_mut().push(target);
                        HandlerResult::Ok
                    }),
                )
                .unwrap();
        }
        assert!(desktop.destroy_window(b));
        assert_eq!(*log.borrow(), vec![inner, b]);
        assert!(desktop.window(b).is_none());
        assert!(desktop.window(inner).is_none());
        assert_eq!(desktop.focused(), a);
        assert!(!desktop.destroy_window(root));
    }

    #[test]
    fn reposition_notifies_descendants_with_parent_rects() {
        let (mut desktop, root) = desktop();
        let frame = desktop
            .create_window(root, Rect::new(0, 0, 20, 10), WindowFlags::BORDER)
            .unwrap();
        let child = desktop
            .create_window(frame, Rect::new(1, 1, 5, 3), WindowFlags::BORDER)
            .unwrap();
        let grandchild = desktop
            .create_window(child, Rect::new(0, 0, 2, 1), WindowFlags::empty())
            .unwrap();
        let seen = Rc::new(RefCell::new(Vec::new()));
        for id in [child, grandchild] {
            let seen = Rc::clone(&seen);
            desktop
                .add_handler(
                    id,
                    MessageKind::ParentRepositioned,
                    Handler::on_reposition(move |_, target, old, new| {
                        seen.borrow_mut().push((target, old, new));
                        HandlerResult::Ok
                    }),
                )
                .unwrap();
        }
        assert!(desktop.reposition(frame, Rect::new(10, 5, 20, 10)));
        let seen = seen.borrow();
        assert_eq!(seen.len(), 2);
        assert_eq!(
            seen[0],
            (child, Rect::new(0, 0, 20, 10), Rect::new(10, 5, 20, 10))
        );
        assert_eq!(
            seen[1],
            (grandchild, Rect::new(2, 2, 5, 3), Rect::new(12, 7, 5, 3))
        );
        assert_eq!(
            desktop.window(grandchild).unwrap().abs_rect(),
            Rect::new(13, 8, 2, 1)
        );
    }

    #[test]
    fn maximize_round_trip_and_rejections() {
        let (mut desktop, root) = desktop();
        let plain = desktop
            .create_window(root, Rect::new(3, 3, 10, 5), WindowFlags::BORDER)
            .unwrap();
        assert!(!desktop.toggle_maximize(plain));
        assert!(!desktop.toggle_maximize(root));

        let w = desktop
            .create_window(root, Rect::new(3, 3, 10, 5), WindowFlags::frame())
            .unwrap();
        assert!(desktop.toggle_maximize(w));
        assert!(desktop.window(w).unwrap().is_maximized());
        assert_eq!(desktop.window(w).unwrap().rect(), Rect::new(0, 0, 80, 24));
        assert!(desktop.toggle_maximize(w));
        assert!(!desktop.window(w).unwrap().is_maximized());
        assert_eq!(desktop.window(w).unwrap().rect(), Rect::new(3, 3, 10, 5));
    }

    #[test]
    fn maximized_window_follows_screen_resize() {
        let (mut desktop, root) = desktop();
        let w = desktop
            .create_window(root, Rect::new(3, 3, 10, 5), WindowFlags::frame())
            .unwrap();
        desktop.toggle_maximize(w);
        assert!(desktop.resize_screen(100, 30));
        assert!(!desktop.resize_screen(100, 30));
        assert_eq!(desktop.window(w).unwrap().rect(), Rect::new(0, 0, 100, 30));
        assert_eq!(desktop.screen().width(), 100);
    }

    #[test]
    fn children_of_a_refilled_window_are_told_once_with_its_final_rect() {
        let (mut desktop, root) = desktop();
        let w = desktop
            .create_window(root, Rect::new(3, 3, 10, 5), WindowFlags::frame())
            .unwrap();
        let child = desktop
            .create_window(w, Rect::new(1, 1, 4, 2), WindowFlags::empty())
            .unwrap();
        desktop.toggle_maximize(w);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        desktop
            .add_handler(
                child,
                MessageKind::ParentRepositioned,
                Handler::on_reposition(move |_, _, old, new| {
                    sink.borrow_mut().push((old, new));
                    HandlerResult::Ok
                }),
            )
            .unwrap();

        assert!(desktop.resize_screen(100, 30));
        let frame = desktop.window(w).unwrap().abs_rect();
        assert_eq!(frame, Rect::new(0, 0, 100, 30));
        assert_eq!(*seen.borrow(), vec![(Rect::new(0, 0, 80, 24), frame)]);
    }

    #[test]
    fn set_focus_queues_repaint_of_both_branches() {
        let (mut desktop, root) = desktop();
        let a = desktop
            .create_window(root, Rect::new(0, 0, 10, 5), WindowFlags::BORDER)
            .unwrap();
        let b = desktop
            .create_window(root, Rect::new(5, 0, 10, 5), WindowFlags::BORDER)
            .unwrap();
        while desktop.queue.try_pop().is_some() {}

        assert!(desktop.set_focus(a));
        let mut displayed = Vec::new();
        while let Some(crate::queue::QueueItem::Message(msg)) = desktop.queue.try_pop() {
            if msg.kind == MessageKind::Display {
                displayed.push(msg.target);
            }
        }
        assert_eq!(displayed, vec![b, a]);

        // Focusing the already focused window changes nothing.
        assert!(desktop.set_focus(a));
        assert!(desktop.queue.is_empty());
    }

    #[test]
    fn custom_payload_reaches_raw_handler() {
        let (mut desktop, root) = desktop();
        let got = Rc::new(RefCell::new(None));
        let sink = Rc::clone(&got);
        desktop
            .add_handler(
                root,
                MessageKind::Display,
                Handler::new(move |_, msg| {
                    if let Payload::Custom(value) = &msg.payload {
                        *sink.borrow_mut() = value.downcast_ref::<u32>().copied();
                    }
                    HandlerResult::Stop
                }),
            )
            .unwrap();
        desktop.send(Message::with_payload(
            root,
            MessageKind::Display,
            Payload::Custom(Box::new(7u32)),
        ));
        assert_eq!(*got.borrow(), Some(7));
    }
}
