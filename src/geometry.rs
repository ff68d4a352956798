use bitflags::bitflags;

use crate::constants::{BORDER_INSET, CAPTION_INSET};

bitflags! {
    /// Capability flags fixed at window construction.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct WindowFlags: u8 {
        const BORDER = 1 << 0;
        const CAPTION = 1 << 1;
        const MAXIMIZABLE = 1 << 2;
        const RESIZABLE = 1 << 3;
        const ROOT = 1 << 4;
        /// Skip ancestor client clipping (popups that may overhang their parent).
        const UNCLIPPED = 1 << 5;
    }
}

impl WindowFlags {
    /// Bordered, captioned window that can be moved, resized and maximized.
    pub fn frame() -> Self {
        Self::BORDER | Self::CAPTION | Self::MAXIMIZABLE | Self::RESIZABLE
    }
}

/// Signed origin with unsigned size, so windows may hang off any edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: u16,
    pub height: u16,
}

impl Rect {
    pub const fn new(x: i32, y: i32, width: u16, height: u16) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Exclusive right edge.
    pub fn right(&self) -> i32 {
        self.x + self.width as i32
    }

    /// Exclusive bottom edge.
    pub fn bottom(&self) -> i32 {
        self.y + self.height as i32
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.x && x < self.right() && y >= self.y && y < self.bottom()
    }

    pub fn contains_rect(&self, other: &Rect) -> bool {
        other.is_empty()
            || (other.x >= self.x
                && other.y >= self.y
                && other.right() <= self.right()
                && other.bottom() <= self.bottom())
    }

    pub fn offset(&self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            ..*self
        }
    }

    /// Shrink by `insets`, collapsing to an empty rect anchored inside `self`
    /// when the insets do not fit.
    pub fn inset(&self, insets: Insets) -> Self {
        let horizontal = insets.left.saturating_add(insets.right);
        let vertical = insets.top.saturating_add(insets.bottom);
        let left = insets.left.min(self.width);
        let top = insets.top.min(self.height);
        Self {
            x: self.x + left as i32,
            y: self.y + top as i32,
            width: self.width.saturating_sub(horizontal),
            height: self.height.saturating_sub(vertical),
        }
    }

    pub fn intersection(&self, other: &Rect) -> Rect {
        let x0 = self.x.max(other.x);
        let y0 = self.y.max(other.y);
        let x1 = self.right().min(other.right());
        let y1 = self.bottom().min(other.bottom());
        if x1 <= x0 || y1 <= y0 {
            return Rect::new(x0, y0, 0, 0);
        }
        Rect::new(x0, y0, (x1 - x0) as u16, (y1 - y0) as u16)
    }
}

/// Decoration insets between a window rectangle and its client rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Insets {
    pub left: u16,
    pub top: u16,
    pub right: u16,
    pub bottom: u16,
}

impl Insets {
    pub fn for_flags(flags: WindowFlags) -> Self {
        if flags.contains(WindowFlags::BORDER) {
            Self {
                left: BORDER_INSET,
                top: BORDER_INSET,
                right: BORDER_INSET,
                bottom: BORDER_INSET,
            }
        } else if flags.contains(WindowFlags::CAPTION) {
            Self {
                top: CAPTION_INSET,
                ..Self::default()
            }
        } else {
            Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn border_insets_shrink_every_side() {
        let rect = Rect::new(2, 3, 10, 5);
        let client = rect.inset(Insets::for_flags(WindowFlags::BORDER));
        assert_eq!(client, Rect::new(3, 4, 8, 3));
        assert!(rect.contains_rect(&client));
    }

    #[test]
    fn caption_inset_only_takes_top_row() {
        let rect = Rect::new(0, 0, 10, 5);
        let client = rect.inset(Insets::for_flags(WindowFlags::CAPTION));
        assert_eq!(client, Rect::new(0, 1, 10, 4));
    }

    #[test]
    fn tiny_window_collapses_client_inside_rect() {
        let rect = Rect::new(5, 5, 1, 1);
        let client = rect.inset(Insets::for_flags(WindowFlags::BORDER));
        assert!(client.is_empty());
        assert!(rect.contains_rect(&client));
    }

    #[test]
    fn contains_uses_exclusive_edges() {
        let rect = Rect::new(-2, 0, 4, 2);
        assert!(rect.contains(-2, 0));
        assert!(rect.contains(1, 1));
        assert!(!rect.contains(2, 1));
        assert!(!rect.contains(0, 2));
    }

    #[test]
    fn intersection_of_disjoint_is_empty() {
        let a = Rect::new(0, 0, 5, 5);
        let b = Rect::new(10, 10, 5, 5);
        assert!(a.intersection(&b).is_empty());
        assert_eq!(
            a.intersection(&Rect::new(3, 3, 5, 5)),
            Rect::new(3, 3, 2, 2)
        );
    }
}
