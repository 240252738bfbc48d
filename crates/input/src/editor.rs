//! Multi-line input editor with wrapped-line cursor movement.

use crate::types::{EditMode, MAX_INPUT_LINES};
use crate::wrap::{locate, offset_of, wrap_segments, Segment};

/// Char before the cursor that turns Enter into a newline.
pub const LINE_CONTINUATION: char = '\\';

/// Text buffer plus cursor, in chars.
///
/// The cursor is always a valid insertion point (`0..=len`). `width` is the
/// wrap width of the pane the buffer is drawn into.
#[derive(Debug, Clone)]
pub struct InputEditor {
    buf: Vec<char>,
    cursor: usize,
    mode: EditMode,
    width: usize,
}

impl InputEditor {
    pub fn new(width: usize) -> Self {
        Self {
            buf: Vec::new(),
            cursor: 0,
            mode: EditMode::Insert,
            width: width.max(1),
        }
    }

    pub fn text(&self) -> String {
        self.buf.iter().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn mode(&self) -> EditMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: EditMode) {
        self.mode = mode;
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn set_width(&mut self, width: usize) {
        self.width = width.max(1);
    }

    pub fn set_text(&mut self, text: &str) {
        self.buf = text.chars().collect();
        self.cursor = self.buf.len();
    }

    /// Place the cursor, clamped to the buffer.
    pub fn set_cursor(&mut self, cursor: usize) {
        self.cursor = cursor.min(self.buf.len());
    }

    pub fn segments(&self) -> Vec<Segment> {
        wrap_segments(&self.buf, self.width)
    }

    pub fn visual_lines(&self) -> Vec<String> {
        self.segments()
            .iter()
            .map(|seg| self.buf[seg.start..seg.end].iter().collect())
            .collect()
    }

    pub fn line_count(&self) -> usize {
        self.segments().len()
    }

    /// Rows the input pane needs, capped so the chat pane keeps room.
    pub fn visible_height(&self) -> usize {
        self.line_count().clamp(1, MAX_INPUT_LINES)
    }

    pub fn offset_to_line_col(&self, offset: usize) -> (usize, usize) {
        locate(&self.segments(), offset.min(self.buf.len()))
    }

    pub fn line_col_to_offset(&self, line: usize, col: usize) -> usize {
        offset_of(&self.segments(), line, col)
    }

    pub fn cursor_line_col(&self) -> (usize, usize) {
        self.offset_to_line_col(self.cursor)
    }

    pub fn insert_char(&mut self, c: char) {
        self.buf.insert(self.cursor, c);
        self.cursor += 1;
    }

    pub fn insert_str(&mut self, s: &str) {
        for c in s.chars() {
            self.insert_char(c);
        }
    }

    /// Backspace. Returns whether anything was removed.
    pub fn delete_before(&mut self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        self.cursor -= 1;
        self.buf.remove(self.cursor);
        true
    }

    /// Delete. Returns whether anything was removed.
    pub fn delete_at(&mut self) -> bool {
        if self.cursor >= self.buf.len() {
            return false;
        }
        self.buf.remove(self.cursor);
        true
    }

    pub fn move_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_right(&mut self) {
        self.cursor = (self.cursor + 1).min(self.buf.len());
    }

    pub fn move_up(&mut self) {
        let segments = self.segments();
        let (line, col) = locate(&segments, self.cursor);
        if line > 0 {
            self.cursor = offset_of(&segments, line - 1, col);
        }
    }

    pub fn move_down(&mut self) {
        let segments = self.segments();
        let (line, col) = locate(&segments, self.cursor);
        if line + 1 < segments.len() {
            self.cursor = offset_of(&segments, line + 1, col);
        }
    }

    pub fn move_to_line_start(&mut self) {
        let segments = self.segments();
        let (line, _) = locate(&segments, self.cursor);
        self.cursor = offset_of(&segments, line, 0);
    }

    pub fn move_to_line_end(&mut self) {
        let segments = self.segments();
        let (line, _) = locate(&segments, self.cursor);
        self.cursor = offset_of(&segments, line, usize::MAX);
    }

    /// Enter in INSERT mode.
    ///
    /// A `\` right before the cursor becomes a newline; otherwise the buffer is
    /// submitted through [`Self::take_submission`].
    pub fn enter(&mut self) -> Option<String> {
        if self.cursor > 0 && self.buf[self.cursor - 1] == LINE_CONTINUATION {
            self.buf[self.cursor - 1] = '\n';
            return None;
        }
        self.take_submission()
    }

    /// Take the buffer and clear it; blank buffers are left alone.
    pub fn take_submission(&mut self) -> Option<String> {
        if self.buf.iter().all(|c| c.is_whitespace()) {
            return None;
        }
        let text = self.text();
        self.clear();
        Some(text)
    }

    pub fn clear(&mut self) {
        self.buf.clear();
        self.cursor = 0;
    }
}
