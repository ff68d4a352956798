use ratatui::style::Style;

use super::{InteractionMode, WindowId};
use crate::desktop::Desktop;
use crate::geometry::WindowFlags;
use crate::theme;

/// Paints window decorations as the default `Display` action. Every cell
/// goes through the desktop's occlusion test.
pub trait WindowDecorator: std::fmt::Debug {
    fn decorate(&self, desktop: &mut Desktop, id: WindowId);
}

struct Glyphs {
    top_left: char,
    top_right: char,
    bottom_left: char,
    bottom_right: char,
    horizontal: char,
    vertical: char,
}

const SINGLE: Glyphs = Glyphs {
    top_left: '┌',
    top_right: '┐',
    bottom_left: '└',
    bottom_right: '┘',
    horizontal: '─',
    vertical: '│',
};

// Shown while the window is being moved or resized from the keyboard.
const DOUBLE: Glyphs = Glyphs {
    top_left: '╔',
    top_right: '╗',
    bottom_left: '╚',
    bottom_right: '╝',
    horizontal: '═',
    vertical: '║',
};

/// Box-drawing border with the title centered on the top edge, or a
/// caption bar for caption-only windows.
///
/// Styles come from the `border`, `border_focused`, `caption` and
/// `caption_focused` settings, falling back to the theme defaults.
#[derive(Debug, Default, Clone, Copy)]
pub struct BoxDecorator;

impl BoxDecorator {
    fn styles(desktop: &Desktop, id: WindowId, focused: bool) -> (Style, Style) {
        let (border_key, caption_key) = if focused {
            ("border_focused", "caption_focused")
        } else {
            ("border", "caption")
        };
        let border = desktop.style_setting(id, border_key).unwrap_or_else(|| {
            if focused {
                theme::decorator_border_focused()
            } else {
                theme::decorator_border()
            }
        });
        let caption = desktop.style_setting(id, caption_key).unwrap_or_else(|| {
            if focused {
                theme::decorator_header_focused()
            } else {
                theme::decorator_header()
            }
        });
        (border, caption)
    }
}

/// `" title "` clipped to `room` cells, with its centered start column.
fn centered_label(title: &str, room: i32) -> Option<(i32, String)> {
    if title.is_empty() || room <= 0 {
        return None;
    }
    let label: String = format!(" {title} ").chars().take(room as usize).collect();
    let len = label.chars().count() as i32;
    Some(((room - len) / 2, label))
}

impl WindowDecorator for BoxDecorator {
    fn decorate(&self, desktop: &mut Desktop, id: WindowId) {
        let Some(window) = desktop.window(id) else {
            return;
        };
        let flags = window.flags();
        let (w, h) = (window.abs_rect().width as i32, window.abs_rect().height as i32);
        let title = window.title().to_string();
        let glyphs = match window.mode() {
            InteractionMode::Normal => &SINGLE,
            _ => &DOUBLE,
        };
        if w == 0 || h == 0 {
            return;
        }
        let focused = desktop.tree().on_focus_chain(id);
        let (border, caption) = Self::styles(desktop, id, focused);

        if flags.contains(WindowFlags::BORDER) {
            for x in 0..w {
                let (top, bottom) = match x {
                    0 => (glyphs.top_left, glyphs.bottom_left),
                    x if x == w - 1 => (glyphs.top_right, glyphs.bottom_right),
                    _ => (glyphs.horizontal, glyphs.horizontal),
                };
                desktop.draw_cell(id, x, 0, top, border);
                desktop.draw_cell(id, x, h - 1, bottom, border);
            }
            for y in 1..h - 1 {
                desktop.draw_cell(id, 0, y, glyphs.vertical, border);
                desktop.draw_cell(id, w - 1, y, glyphs.vertical, border);
            }
            if let Some((offset, label)) = centered_label(&title, w - 2) {
                let style = if flags.contains(WindowFlags::CAPTION) {
                    caption
                } else {
                    border
                };
                desktop.draw_text(id, 1 + offset, 0, &label, style);
            }
        } else if flags.contains(WindowFlags::CAPTION) {
            for x in 0..w {
                desktop.draw_cell(id, x, 0, ' ', caption);
            }
            if let Some((offset, label)) = centered_label(&title, w) {
                desktop.draw_text(id, offset, 0, &label, caption);
            }
        }
    }
}
