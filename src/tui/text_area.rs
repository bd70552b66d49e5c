//! Multi-line text region with a cursor.

use std::cell::Cell;

use unicode_width::UnicodeWidthStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Cursor {
    pub row: usize,
    /// Column in chars, not bytes.
    pub col: usize,
}

/// Text buffer backing one editor region.
///
/// The exact text is preserved: `set_text(t)` followed by `text()` yields `t`,
/// trailing newline included or not.
#[derive(Debug, Clone)]
pub struct TextArea {
    lines: Vec<String>,
    cursor: Cursor,
    /// First visible row and column, adjusted while rendering.
    top: Cell<usize>,
    left: Cell<usize>,
}

impl Default for TextArea {
    fn default() -> Self {
        Self {
            lines: vec![String::new()],
            cursor: Cursor::default(),
            top: Cell::new(0),
            left: Cell::new(0),
        }
    }
}

impl TextArea {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(&self) -> String {
        self.lines.join("\n")
    }

    /// Replace the whole content and move the cursor to the start.
    pub fn set_text(&mut self, text: &str) {
        self.lines = text.split('\n').map(str::to_string).collect();
        self.cursor = Cursor::default();
        self.top.set(0);
        self.left.set(0);
    }

    pub fn clear(&mut self) {
        self.set_text("");
    }

    pub fn is_empty(&self) -> bool {
        self.lines.len() == 1 && self.lines[0].is_empty()
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    fn line_chars(&self, row: usize) -> usize {
        self.lines[row].chars().count()
    }

    fn byte_index(line: &str, col: usize) -> usize {
        line.char_indices()
            .nth(col)
            .map(|(i, _)| i)
            .unwrap_or(line.len())
    }

    pub fn insert_char(&mut self, c: char) {
        if c == '\n' {
            self.insert_newline();
            return;
        }
        let Cursor { row, col } = self.cursor;
        let at = Self::byte_index(&self.lines[row], col);
        self.lines[row].insert(at, c);
        self.cursor.col += 1;
    }

    /// Insert possibly multi-line text at the cursor (paste).
    pub fn insert_str(&mut self, s: &str) {
        let normalized = s.replace("\r\n", "\n").replace('\r', "\n");
        for c in normalized.chars() {
            self.insert_char(c);
        }
    }

    pub fn insert_newline(&mut self) {
        let Cursor { row, col } = self.cursor;
        let at = Self::byte_index(&self.lines[row], col);
        let tail = self.lines[row].split_off(at);
        self.lines.insert(row + 1, tail);
        self.cursor = Cursor { row: row + 1, col: 0 };
    }

    pub fn insert_tab(&mut self) {
        for _ in 0..4 {
            self.insert_char(' ');
        }
    }

    pub fn backspace(&mut self) {
        let Cursor { row, col } = self.cursor;
        if col > 0 {
            let at = Self::byte_index(&self.lines[row], col - 1);
            self.lines[row].remove(at);
            self.cursor.col -= 1;
        } else if row > 0 {
            let current = self.lines.remove(row);
            let prev_len = self.line_chars(row - 1);
            self.lines[row - 1].push_str(&current);
            self.cursor = Cursor { row: row - 1, col: prev_len };
        }
    }

    pub fn delete(&mut self) {
        let Cursor { row, col } = self.cursor;
        if col < self.line_chars(row) {
            let at = Self::byte_index(&self.lines[row], col);
            self.lines[row].remove(at);
        } else if row + 1 < self.lines.len() {
            let next = self.lines.remove(row + 1);
            self.lines[row].push_str(&next);
        }
    }

    pub fn move_left(&mut self) {
        if self.cursor.col > 0 {
            self.cursor.col -= 1;
        } else if self.cursor.row > 0 {
            self.cursor.row -= 1;
            self.cursor.col = self.line_chars(self.cursor.row);
        }
    }

    pub fn move_right(&mut self) {
        if self.cursor.col < self.line_chars(self.cursor.row) {
            self.cursor.col += 1;
        } else if self.cursor.row + 1 < self.lines.len() {
            self.cursor.row += 1;
            self.cursor.col = 0;
        }
    }

    pub fn move_up(&mut self) {
        if self.cursor.row > 0 {
            self.cursor.row -= 1;
            self.clamp_col();
        }
    }

    pub fn move_down(&mut self) {
        if self.cursor.row + 1 < self.lines.len() {
            self.cursor.row += 1;
            self.clamp_col();
        }
    }

    pub fn move_home(&mut self) {
        self.cursor.col = 0;
    }

    pub fn move_end(&mut self) {
        self.cursor.col = self.line_chars(self.cursor.row);
    }

    pub fn page_up(&mut self, rows: usize) {
        self.cursor.row = self.cursor.row.saturating_sub(rows.max(1));
        self.clamp_col();
    }

    pub fn page_down(&mut self, rows: usize) {
        self.cursor.row = (self.cursor.row + rows.max(1)).min(self.lines.len() - 1);
        self.clamp_col();
    }

    fn clamp_col(&mut self) {
        self.cursor.col = self.cursor.col.min(self.line_chars(self.cursor.row));
    }

    /// Scroll so the cursor is inside a `width` x `height` viewport and
    /// return the `(top, left)` offsets.
    pub fn viewport(&self, width: usize, height: usize) -> (usize, usize) {
        let height = height.max(1);
        let width = width.max(1);
        let mut top = self.top.get();
        if self.cursor.row < top {
            top = self.cursor.row;
        } else if self.cursor.row >= top + height {
            top = self.cursor.row + 1 - height;
        }

        let x = self.cursor_display_col();
        let mut left = self.left.get();
        if x < left {
            left = x;
        } else if x >= left + width {
            left = x + 1 - width;
        }

        self.top.set(top);
        self.left.set(left);
        (top, left)
    }

    /// Terminal column of the cursor within its line.
    pub fn cursor_display_col(&self) -> usize {
        let line = &self.lines[self.cursor.row];
        let at = Self::byte_index(line, self.cursor.col);
        UnicodeWidthStr::width(&line[..at])
    }
}
