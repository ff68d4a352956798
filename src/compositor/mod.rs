//! Display buffer and the occlusion test that arbitrates every cell write.
//!
//! Windows never clip against each other up front. Instead each write asks
//! [`visible`] whether the calling window may own the target cell, given the
//! window's own rectangle, every ancestor's client rectangle and the window
//! that currently owns the cell. Ownership between two live windows is
//! settled by their ancestor chains: a descendant always beats its ancestor,
//! otherwise the more-front branch at the first diverging depth wins.

mod buffer;
mod flush;

use std::sync::{Arc, Mutex, MutexGuard};

pub use buffer::{Cell, DisplayBuffer};
pub use flush::ScreenFlusher;

use crate::geometry::WindowFlags;
use crate::window::{WindowId, WindowTree};

pub type SharedDisplay = Arc<Mutex<DisplayBuffer>>;

/// Lock the display buffer. A panicked writer leaves at worst a partially
/// drawn frame, so a poisoned lock is recovered rather than propagated.
pub fn lock_display(display: &SharedDisplay) -> MutexGuard<'_, DisplayBuffer> {
    display.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// May window `id` write the cell at window-local `(local_x, local_y)`?
pub fn visible(
    tree: &WindowTree,
    buffer: &DisplayBuffer,
    id: WindowId,
    local_x: i32,
    local_y: i32,
) -> bool {
    let Some(window) = tree.get(id) else {
        return false;
    };
    let x = window.abs.x + local_x;
    let y = window.abs.y + local_y;

    if !window.abs.contains(x, y) || !buffer.area().contains(x, y) {
        return false;
    }

    if !window.flags.contains(WindowFlags::UNCLIPPED) {
        let mut cursor = window.parent;
        while let Some(ancestor_id) = cursor {
            let Some(ancestor) = tree.get(ancestor_id) else {
                break;
            };
            if !ancestor.client.contains(x, y) {
                return false;
            }
            cursor = ancestor.parent;
        }
    }

    let owner = match buffer.owner(x, y) {
        None => return true,
        Some(owner) if owner == id => return true,
        Some(owner) => owner,
    };

    // A tag whose window is gone, or no longer covers the cell, is stale.
    // This also hides any drift between tree geometry and buffer tags.
    let Some(other) = tree.get(owner) else {
        return true;
    };
    if !other.abs.contains(x, y) {
        return true;
    }

    front_most(tree, id, owner) == id
}

/// Which of two windows wins a contested cell.
pub fn front_most(tree: &WindowTree, a: WindowId, b: WindowId) -> WindowId {
    let chain_a = tree.chain(a);
    let chain_b = tree.chain(b);
    let shared = chain_a
        .iter()
        .zip(chain_b.iter())
        .take_while(|(x, y)| x == y)
        .count();

    if shared == chain_a.len() {
        // `a` is an ancestor of `b` (or the same window).
        return b;
    }
    if shared == chain_b.len() {
        return a;
    }
    let z_a = tree.get(chain_a[shared]).map(|w| w.z).unwrap_or(0);
    let z_b = tree.get(chain_b[shared]).map(|w| w.z).unwrap_or(0);
    if z_a > z_b { a } else { b }
}
