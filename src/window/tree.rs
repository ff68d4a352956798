use slotmap::SlotMap;

use super::{Window, WindowId};
use crate::class::ClassId;
use crate::error::{Result, WmError};
use crate::geometry::{Rect, WindowFlags};

/// Slot-map window tree with paint-order sibling lists, per-parent
/// z-chains and the global focus leaf.
#[derive(Debug, Default)]
pub struct WindowTree {
    windows: SlotMap<WindowId, Window>,
    root: Option<WindowId>,
    focused: Option<WindowId>,
    next_serial: u64,
    placements: u64,
}

impl WindowTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn root(&self) -> Option<WindowId> {
        self.root
    }

    /// Leaf reached by following focus children from the root.
    pub fn focused(&self) -> Option<WindowId> {
        self.focused
    }

    pub fn get(&self, id: WindowId) -> Option<&Window> {
        self.windows.get(id)
    }

    pub(crate) fn get_mut(&mut self, id: WindowId) -> Option<&mut Window> {
        self.windows.get_mut(id)
    }

    pub(crate) fn try_get(&self, id: WindowId) -> Result<&Window> {
        self.windows.get(id).ok_or(WmError::UnknownWindow(id))
    }

    pub fn contains(&self, id: WindowId) -> bool {
        self.windows.get(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.len() == 0
    }

    pub fn ids(&self) -> Vec<WindowId> {
        self.windows.keys().collect()
    }

    /// Insert a window. `rect` is relative to the parent's client origin.
    ///
    /// The new window goes to the tail of the parent's paint order and the
    /// head of its z-chain, so it starts out as the parent's focus child.
    pub fn create(
        &mut self,
        parent: Option<WindowId>,
        rect: Rect,
        mut flags: WindowFlags,
        class: ClassId,
    ) -> Result<WindowId> {
        let origin = match parent {
            Some(parent_id) => {
                let parent = self.try_get(parent_id)?;
                flags.remove(WindowFlags::ROOT);
                (parent.client.x, parent.client.y)
            }
            None if self.root.is_none() && flags.contains(WindowFlags::ROOT) => (0, 0),
            None => return Err(WmError::MissingParent),
        };

        let serial = self.next_serial;
        self.next_serial += 1;
        let mut window = Window::new(serial, rect, flags, class);
        window.parent = parent;
        window.place(origin.0, origin.1);
        let id = self.windows.insert(window);

        match parent {
            Some(parent_id) => self.link_child(parent_id, id),
            None => self.root = Some(id),
        }
        self.refresh_focus();
        tracing::debug!(window = %id, serial, ?parent, ?rect, "created window");
        Ok(id)
    }

    fn link_child(&mut self, parent_id: WindowId, id: WindowId) {
        let (last, head, count) = match self.windows.get(parent_id) {
            Some(parent) => (parent.last_child, parent.z_head, parent.child_count),
            None => return,
        };
        if let Some(last) = last
            && let Some(prev) = self.windows.get_mut(last)
        {
            prev.next = Some(id);
        }
        if let Some(window) = self.windows.get_mut(id) {
            window.prev = last;
            window.next = None;
            window.lower = head;
            window.z = count;
        }
        if let Some(parent) = self.windows.get_mut(parent_id) {
            if parent.first_child.is_none() {
                parent.first_child = Some(id);
            }
            parent.last_child = Some(id);
            parent.z_head = Some(id);
            parent.child_count += 1;
        }
    }

    fn unlink_child(&mut self, id: WindowId) {
        let Some(window) = self.windows.get(id) else {
            return;
        };
        let (parent_id, prev, next, z) = match window.parent {
            Some(parent_id) => (parent_id, window.prev, window.next, window.z),
            None => return,
        };

        if let Some(prev) = prev.and_then(|p| self.windows.get_mut(p)) {
            prev.next = next;
        }
        if let Some(next) = next.and_then(|n| self.windows.get_mut(n)) {
            next.prev = prev;
        }
        self.splice_out_of_z_chain(parent_id, id);
        for sibling in self.children(parent_id) {
            if let Some(sibling) = self.windows.get_mut(sibling)
                && sibling.z > z
            {
                sibling.z -= 1;
            }
        }
        if let Some(parent) = self.windows.get_mut(parent_id) {
            if parent.first_child == Some(id) {
                parent.first_child = next;
            }
            if parent.last_child == Some(id) {
                parent.last_child = prev;
            }
            parent.child_count = parent.child_count.saturating_sub(1);
        }
    }

    fn splice_out_of_z_chain(&mut self, parent_id: WindowId, id: WindowId) {
        let lower = self.windows.get(id).and_then(|w| w.lower);
        let head = self.windows.get(parent_id).and_then(|p| p.z_head);
        if head == Some(id) {
            if let Some(parent) = self.windows.get_mut(parent_id) {
                parent.z_head = lower;
            }
        } else {
            let mut cursor = head;
            while let Some(current) = cursor {
                let next = self.windows.get(current).and_then(|w| w.lower);
                if next == Some(id) {
                    if let Some(window) = self.windows.get_mut(current) {
                        window.lower = lower;
                    }
                    break;
                }
                cursor = next;
            }
        }
        if let Some(window) = self.windows.get_mut(id) {
            window.lower = None;
        }
    }

    /// Remove `id` and its whole subtree. Returns the removed ids,
    /// children before parents. The root cannot be removed.
    pub fn remove(&mut self, id: WindowId) -> Vec<WindowId> {
        if !self.contains(id) || self.root == Some(id) {
            return Vec::new();
        }
        let doomed = self.subtree_post_order(id);
        self.unlink_child(id);
        for victim in &doomed {
            self.windows.remove(*victim);
        }
        self.refresh_focus();
        tracing::debug!(window = %id, removed = doomed.len(), "removed window subtree");
        doomed
    }

    /// Children in paint (insertion) order.
    pub fn children(&self, id: WindowId) -> Vec<WindowId> {
        let mut out = Vec::new();
        let mut cursor = self.windows.get(id).and_then(|w| w.first_child);
        while let Some(child) = cursor {
            out.push(child);
            cursor = self.windows.get(child).and_then(|w| w.next);
        }
        out
    }

    /// Children front to back.
    pub fn z_order(&self, id: WindowId) -> Vec<WindowId> {
        let mut out = Vec::new();
        let mut cursor = self.windows.get(id).and_then(|w| w.z_head);
        while let Some(child) = cursor {
            out.push(child);
            cursor = self.windows.get(child).and_then(|w| w.lower);
        }
        out
    }

    /// `id` followed by its descendants, parents before children.
    pub fn subtree_pre_order(&self, id: WindowId) -> Vec<WindowId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if !self.contains(current) {
                continue;
            }
            out.push(current);
            let mut children = self.children(current);
            children.reverse();
            stack.extend(children);
        }
        out
    }

    pub fn subtree_post_order(&self, id: WindowId) -> Vec<WindowId> {
        let mut out = Vec::new();
        for child in self.children(id) {
            out.extend(self.subtree_post_order(child));
        }
        if self.contains(id) {
            out.push(id);
        }
        out
    }

    /// Ancestor chain indexed by depth: `[root, .., id]`.
    pub fn chain(&self, id: WindowId) -> Vec<WindowId> {
        let mut out = Vec::new();
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            let Some(window) = self.windows.get(current) else {
                break;
            };
            out.push(current);
            cursor = window.parent;
        }
        out.reverse();
        out
    }

    pub fn is_ancestor(&self, ancestor: WindowId, id: WindowId) -> bool {
        let mut cursor = self.windows.get(id).and_then(|w| w.parent);
        while let Some(current) = cursor {
            if current == ancestor {
                return true;
            }
            cursor = self.windows.get(current).and_then(|w| w.parent);
        }
        false
    }

    /// Whether `id` lies on the root-to-focus-leaf chain.
    pub fn on_focus_chain(&self, id: WindowId) -> bool {
        self.focused
            .is_some_and(|leaf| leaf == id || self.is_ancestor(id, leaf))
    }

    /// Move and resize `id`. Returns `(window, old_abs, new_abs)` for every
    /// window in the subtree, parents first.
    pub fn reposition(&mut self, id: WindowId, rect: Rect) -> Vec<(WindowId, Rect, Rect)> {
        let origin = match self.windows.get(id) {
            Some(window) => match window.parent.and_then(|p| self.windows.get(p)) {
                Some(parent) => (parent.client.x, parent.client.y),
                None => (0, 0),
            },
            None => return Vec::new(),
        };
        if let Some(window) = self.windows.get_mut(id) {
            window.rect = rect;
        }
        self.placements += 1;
        let mut moved = Vec::new();
        self.place_subtree(id, origin, self.placements, &mut moved);
        moved
    }

    fn place_subtree(
        &mut self,
        id: WindowId,
        origin: (i32, i32),
        stamp: u64,
        moved: &mut Vec<(WindowId, Rect, Rect)>,
    ) {
        let Some(window) = self.windows.get_mut(id) else {
            return;
        };
        let old = window.abs;
        window.place(origin.0, origin.1);
        window.placement = stamp;
        let client_origin = (window.client.x, window.client.y);
        moved.push((id, old, window.abs));
        for child in self.children(id) {
            self.place_subtree(child, client_origin, stamp, moved);
        }
    }

    /// Stamp of the last reposition that placed `id`.
    pub(crate) fn placement(&self, id: WindowId) -> Option<u64> {
        self.windows.get(id).map(|w| w.placement)
    }

    /// Bring `id` to the front of its siblings, raise each ancestor the same
    /// way, then recompute the global focus leaf.
    pub fn set_focus(&mut self, id: WindowId) -> bool {
        if !self.contains(id) {
            return false;
        }
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            let parent = self.windows.get(current).and_then(|w| w.parent);
            if let Some(parent) = parent {
                self.raise(parent, current);
            }
            cursor = parent;
        }
        self.refresh_focus();
        tracing::debug!(window = %id, focused = ?self.focused, "set focus");
        true
    }

    fn raise(&mut self, parent_id: WindowId, id: WindowId) {
        let Some(parent) = self.windows.get(parent_id) else {
            return;
        };
        if parent.z_head == Some(id) {
            return;
        }
        let top = parent.child_count.saturating_sub(1);
        let z = self.windows.get(id).map(|w| w.z).unwrap_or(0);
        for sibling in self.children(parent_id) {
            if let Some(sibling) = self.windows.get_mut(sibling)
                && sibling.z > z
            {
                sibling.z -= 1;
            }
        }
        self.splice_out_of_z_chain(parent_id, id);
        let head = self.windows.get(parent_id).and_then(|p| p.z_head);
        if let Some(window) = self.windows.get_mut(id) {
            window.z = top;
            window.lower = head;
        }
        if let Some(parent) = self.windows.get_mut(parent_id) {
            parent.z_head = Some(id);
        }
    }

    /// Focus the paint-order sibling after the parent's current focus child.
    pub fn next_focus(&mut self, parent: WindowId) -> Option<WindowId> {
        self.cycle_focus(parent, true)
    }

    pub fn prev_focus(&mut self, parent: WindowId) -> Option<WindowId> {
        self.cycle_focus(parent, false)
    }

    fn cycle_focus(&mut self, parent: WindowId, forward: bool) -> Option<WindowId> {
        let order = self.children(parent);
        if order.is_empty() {
            return None;
        }
        let current = self.windows.get(parent).and_then(|p| p.z_head);
        let idx = current
            .and_then(|c| order.iter().position(|id| *id == c))
            .unwrap_or(0);
        let step = if forward { 1isize } else { -1isize };
        let next = (idx as isize + step).rem_euclid(order.len() as isize) as usize;
        let target = order[next];
        self.set_focus(target);
        Some(target)
    }

    pub(crate) fn refresh_focus(&mut self) -> Option<WindowId> {
        let mut cursor = self.root;
        let mut leaf = self.root;
        while let Some(current) = cursor {
            leaf = Some(current);
            cursor = self.windows.get(current).and_then(|w| w.z_head);
        }
        self.focused = leaf;
        leaf
    }

    /// Front-most window containing the absolute point, descending from the
    /// root along each parent's z-chain.
    pub fn hit_test(&self, x: i32, y: i32) -> Option<WindowId> {
        let root = self.root?;
        if !self.windows.get(root)?.abs.contains(x, y) {
            return None;
        }
        let mut current = root;
        'descend: loop {
            let Some(window) = self.windows.get(current) else {
                break;
            };
            let client = window.client;
            for child in self.z_order(current) {
                let Some(candidate) = self.windows.get(child) else {
                    continue;
                };
                let clipped = !candidate.flags.contains(WindowFlags::UNCLIPPED);
                if candidate.abs.contains(x, y) && (!clipped || client.contains(x, y)) {
                    current = child;
                    continue 'descend;
                }
            }
            break;
        }
        Some(current)
    }
}
