//! Virtual viewport over a buffer.
//!
//! The viewport materialises only the lines a renderer needs: a window of
//! `rows` lines starting at `top_line`, each truncated to `columns` bytes for
//! display. Truncation is display-only; the buffer is never touched. Even
//! with a million lines in the document, one redraw touches only the visible
//! window.

use crate::storage::PieceTable;

/// A clamped window onto a buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    top_line: usize,
    rows: usize,
    columns: usize,
}

impl Viewport {
    /// A viewport showing `rows` lines of `columns` bytes each.
    pub fn new(rows: usize, columns: usize) -> Self {
        Self {
            top_line: 0,
            rows,
            columns,
        }
    }

    /// First visible line.
    pub fn top_line(&self) -> usize {
        self.top_line
    }

    /// Number of lines the viewport shows.
    pub fn visible_line_count(&self) -> usize {
        self.rows
    }

    /// Number of byte columns the viewport shows.
    pub fn visible_column_count(&self) -> usize {
        self.columns
    }

    /// Resize the window.
    pub fn resize(&mut self, rows: usize, columns: usize) {
        self.rows = rows;
        self.columns = columns;
    }

    /// Reset to the top of a (new) document.
    pub fn reset(&mut self) {
        self.top_line = 0;
    }

    /// Scroll up by `lines`, stopping at the top.
    pub fn scroll_up(&mut self, lines: usize) {
        self.top_line = self.top_line.saturating_sub(lines);
    }

    /// Scroll down by `lines`, clamped to the document.
    pub fn scroll_down(&mut self, lines: usize, doc: &PieceTable) {
        self.top_line = self.top_line.saturating_add(lines);
        self.clamp(doc);
    }

    /// Scroll so `line` becomes the top line, clamped to the document.
    pub fn scroll_to(&mut self, line: usize, doc: &PieceTable) {
        self.top_line = line;
        self.clamp(doc);
    }

    fn clamp(&mut self, doc: &PieceTable) {
        let max_top = doc.line_count().saturating_sub(self.rows);
        if self.top_line > max_top {
            self.top_line = max_top;
        }
    }

    /// Copies of the visible lines, clipped to the document and truncated to
    /// the viewport width.
    pub fn visible_lines(&self, doc: &PieceTable) -> Vec<Vec<u8>> {
        let mut lines = doc.lines_range(self.top_line, self.rows);
        for line in &mut lines {
            line.truncate(self.columns);
        }
        lines
    }
}
