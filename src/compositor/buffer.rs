use ratatui::style::Style;

use crate::geometry::Rect;
use crate::window::WindowId;

/// One character cell of the terminal image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    pub ch: char,
    pub style: Style,
    /// Window that last validly wrote the cell. The handle goes stale when
    /// that window is destroyed.
    pub owner: Option<WindowId>,
}

impl Default for Cell {
    fn default() -> Self {
        Self {
            ch: ' ',
            style: Style::default(),
            owner: None,
        }
    }
}

/// Shared grid of cells sized to the terminal.
#[derive(Debug, Clone)]
pub struct DisplayBuffer {
    width: u16,
    height: u16,
    cells: Vec<Cell>,
    dirty: bool,
    changed: bool,
}

impl DisplayBuffer {
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            width,
            height,
            cells: vec![Cell::default(); width as usize * height as usize],
            dirty: true,
            changed: false,
        }
    }

    /// Reallocate for a new terminal size. Everything is cleared and the
    /// next flush redraws every cell.
    pub fn resize(&mut self, width: u16, height: u16) {
        *self = Self::new(width, height);
        tracing::debug!(width, height, "display buffer reallocated");
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn height(&self) -> u16 {
        self.height
    }

    pub fn area(&self) -> Rect {
        Rect::new(0, 0, self.width, self.height)
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return None;
        }
        Some(y as usize * self.width as usize + x as usize)
    }

    pub fn cell(&self, x: i32, y: i32) -> Option<&Cell> {
        self.index(x, y).map(|idx| &self.cells[idx])
    }

    pub fn owner(&self, x: i32, y: i32) -> Option<WindowId> {
        self.cell(x, y).and_then(|cell| cell.owner)
    }

    /// Write a cell and tag it with `owner`. Out-of-range writes are dropped.
    pub fn set(&mut self, x: i32, y: i32, ch: char, style: Style, owner: WindowId) -> bool {
        let Some(idx) = self.index(x, y) else {
            return false;
        };
        let cell = &mut self.cells[idx];
        if cell.ch != ch || cell.style != style || cell.owner != Some(owner) {
            cell.ch = ch;
            cell.style = style;
            cell.owner = Some(owner);
            self.changed = true;
        }
        true
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn needs_flush(&self) -> bool {
        self.dirty || self.changed
    }

    /// Clear both flags, returning whether a full redraw was requested.
    pub(crate) fn take_flush_flags(&mut self) -> bool {
        let dirty = self.dirty;
        self.dirty = false;
        self.changed = false;
        dirty
    }

    pub fn rows(&self) -> impl Iterator<Item = &[Cell]> {
        self.cells.chunks(self.width.max(1) as usize)
    }

    /// Characters of row `y`, for diagnostics and tests.
    pub fn row_text(&self, y: u16) -> String {
        if y >= self.height {
            return String::new();
        }
        let start = y as usize * self.width as usize;
        self.cells[start..start + self.width as usize]
            .iter()
            .map(|cell| cell.ch)
            .collect()
    }
}
