use ratatui::style::{Color, Modifier, Style};

use crate::constants::MAX_STATE_DEPTH;
use crate::error::{Result, WmError};
use crate::window::WindowId;

/// Colors, attributes and text cursor a window draws with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderState {
    pub fg: Color,
    pub bg: Color,
    pub attr: Modifier,
    /// Client-relative text cursor.
    pub cursor: (u16, u16),
}

impl Default for RenderState {
    fn default() -> Self {
        Self {
            fg: Color::Reset,
            bg: Color::Reset,
            attr: Modifier::empty(),
            cursor: (0, 0),
        }
    }
}

impl RenderState {
    pub fn style(&self) -> Style {
        Style::default()
            .fg(self.fg)
            .bg(self.bg)
            .add_modifier(self.attr)
    }

    pub fn with_style(mut self, style: Style) -> Self {
        if let Some(fg) = style.fg {
            self.fg = fg;
        }
        if let Some(bg) = style.bg {
            self.bg = bg;
        }
        self.attr = (self.attr | style.add_modifier) - style.sub_modifier;
        self
    }
}

/// Bounded stack of render-state snapshots, only touched by the dispatch thread.
#[derive(Debug, Default)]
pub struct RenderStateStack {
    saved: Vec<(WindowId, RenderState)>,
}

impl RenderStateStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, window: WindowId, state: RenderState) -> Result<()> {
        if self.saved.len() >= MAX_STATE_DEPTH {
            return Err(WmError::StateStackOverflow);
        }
        self.saved.push((window, state));
        Ok(())
    }

    pub fn pop(&mut self) -> Result<(WindowId, RenderState)> {
        self.saved.pop().ok_or(WmError::StateStackUnderflow)
    }

    pub fn depth(&self) -> usize {
        self.saved.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stack_is_bounded_and_lifo() {
        let id = WindowId::from_raw(0);
        let mut stack = RenderStateStack::new();
        for depth in 0..MAX_STATE_DEPTH {
            let state = RenderState {
                cursor: (depth as u16, 0),
                ..RenderState::default()
            };
            stack.push(id, state).unwrap();
        }
        assert!(matches!(
            stack.push(id, RenderState::default()),
            Err(WmError::StateStackOverflow)
        ));
        let (_, top) = stack.pop().unwrap();
        assert_eq!(top.cursor, (MAX_STATE_DEPTH as u16 - 1, 0));
        assert_eq!(stack.depth(), MAX_STATE_DEPTH - 1);
    }

    #[test]
    fn pop_on_empty_stack_errors() {
        let mut stack = RenderStateStack::new();
        assert!(matches!(stack.pop(), Err(WmError::StateStackUnderflow)));
    }

    #[test]
    fn with_style_overlays_only_set_fields() {
        let base = RenderState {
            fg: Color::White,
            bg: Color::Blue,
            attr: Modifier::BOLD,
            cursor: (3, 4),
        };
        let next = base.with_style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::UNDERLINED)
                .remove_modifier(Modifier::BOLD),
        );
        assert_eq!(next.fg, Color::Yellow);
        assert_eq!(next.bg, Color::Blue);
        assert_eq!(next.attr, Modifier::UNDERLINED);
        assert_eq!(next.cursor, (3, 4));
    }
}
