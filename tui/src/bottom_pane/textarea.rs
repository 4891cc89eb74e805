//! Multi-line text buffer with a byte-offset cursor, soft wrapping, and terminal rendering.
//!
//! Cursor motion is grapheme-aware; columns are measured in display width so CJK and emoji
//! line up with what the terminal draws.

use std::ops::Range;

use crossterm::event::KeyCode;
use crossterm::event::KeyEvent;
use crossterm::event::KeyEventKind;
use crossterm::event::KeyModifiers;
use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::Style;
use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

use super::word_boundary::beginning_of_previous_word;
use super::word_boundary::end_of_next_word;
use crate::key_hint::has_ctrl_or_alt;

#[derive(Debug, Default, Clone)]
pub struct TextArea {
    text: String,
    cursor: usize,
}

/// Render-time state: the first visible wrapped row.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TextAreaState {
    pub scroll: u16,
}

impl TextArea {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    #[cfg(test)]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Replace the whole buffer and move the cursor to the end.
    pub fn set_text(&mut self, text: &str) {
        self.text = text.to_string();
        self.cursor = self.text.len();
    }

    #[cfg(test)]
    pub fn set_cursor(&mut self, pos: usize) {
        self.cursor = self.clamp_to_boundary(pos);
    }

    pub fn insert_str(&mut self, s: &str) {
        self.text.insert_str(self.cursor, s);
        self.cursor += s.len();
    }

    pub fn replace_range(&mut self, range: Range<usize>, replacement: &str) {
        let start = self.clamp_to_boundary(range.start);
        let end = self.clamp_to_boundary(range.end.max(start));
        self.text.replace_range(start..end, replacement);
        self.cursor = if self.cursor >= end {
            self.cursor - (end - start) + replacement.len()
        } else if self.cursor > start {
            start + replacement.len()
        } else {
            self.cursor
        };
    }

    /// Apply an editing key. Returns true when the buffer or cursor changed.
    pub fn input(&mut self, event: KeyEvent) -> bool {
        if event.kind == KeyEventKind::Release {
            return false;
        }
        let before = (self.text.len(), self.cursor);
        let word = has_ctrl_or_alt(event.modifiers);
        match event.code {
            KeyCode::Char(c) if event.modifiers.contains(KeyModifiers::CONTROL) => match c {
                'a' => self.cursor = self.line_start(self.cursor),
                'e' => self.cursor = self.line_end(self.cursor),
                'u' => {
                    let start = self.line_start(self.cursor);
                    self.replace_range(start..self.cursor, "");
                }
                'k' => {
                    let end = self.line_end(self.cursor);
                    self.replace_range(self.cursor..end, "");
                }
                'w' => self.delete_backward_word(),
                _ => return false,
            },
            KeyCode::Char(c) if !event.modifiers.contains(KeyModifiers::ALT) => {
                let mut tmp = [0u8; 4];
                self.insert_str(c.encode_utf8(&mut tmp));
            }
            KeyCode::Tab => self.insert_str("\t"),
            KeyCode::Enter => self.insert_str("\n"),
            KeyCode::Backspace if word => self.delete_backward_word(),
            KeyCode::Backspace => {
                let prev = self.prev_grapheme_boundary(self.cursor);
                self.replace_range(prev..self.cursor, "");
            }
            KeyCode::Delete if word => {
                let end = end_of_next_word(&self.text, self.cursor);
                self.replace_range(self.cursor..end, "");
            }
            KeyCode::Delete => {
                let next = self.next_grapheme_boundary(self.cursor);
                self.replace_range(self.cursor..next, "");
            }
            KeyCode::Left if word => {
                self.cursor = beginning_of_previous_word(&self.text, self.cursor);
            }
            KeyCode::Left => self.cursor = self.prev_grapheme_boundary(self.cursor),
            KeyCode::Right if word => self.cursor = end_of_next_word(&self.text, self.cursor),
            KeyCode::Right => self.cursor = self.next_grapheme_boundary(self.cursor),
            KeyCode::Up => self.move_vertically(-1),
            KeyCode::Down => self.move_vertically(1),
            KeyCode::Home => self.cursor = self.line_start(self.cursor),
            KeyCode::End => self.cursor = self.line_end(self.cursor),
            _ => return false,
        }
        before != (self.text.len(), self.cursor) || matches!(event.code, KeyCode::Char(_))
    }

    fn delete_backward_word(&mut self) {
        let start = beginning_of_previous_word(&self.text, self.cursor);
        self.replace_range(start..self.cursor, "");
    }

    fn line_start(&self, pos: usize) -> usize {
        self.text[..pos].rfind('\n').map_or(0, |idx| idx + 1)
    }

    fn line_end(&self, pos: usize) -> usize {
        self.text[pos..]
            .find('\n')
            .map_or(self.text.len(), |idx| pos + idx)
    }

    /// Move to the previous/next logical line, keeping the display column where possible.
    fn move_vertically(&mut self, direction: i8) {
        let start = self.line_start(self.cursor);
        let column = self.text[start..self.cursor].width();
        let target_start = if direction < 0 {
            if start == 0 {
                self.cursor = 0;
                return;
            }
            self.line_start(start - 1)
        } else {
            let end = self.line_end(self.cursor);
            if end == self.text.len() {
                self.cursor = end;
                return;
            }
            end + 1
        };
        let target_end = self.line_end(target_start);

        let mut pos = target_start;
        let mut width = 0;
        for (idx, grapheme) in self.text[target_start..target_end].grapheme_indices(true) {
            let w = grapheme.width();
            if width + w > column {
                break;
            }
            width += w;
            pos = target_start + idx + grapheme.len();
        }
        self.cursor = pos;
    }

    fn prev_grapheme_boundary(&self, pos: usize) -> usize {
        self.text[..pos]
            .grapheme_indices(true)
            .next_back()
            .map_or(0, |(idx, _)| idx)
    }

    fn next_grapheme_boundary(&self, pos: usize) -> usize {
        self.text[pos..]
            .graphemes(true)
            .next()
            .map_or(self.text.len(), |g| pos + g.len())
    }

    fn clamp_to_boundary(&self, pos: usize) -> usize {
        let mut pos = pos.min(self.text.len());
        while pos > 0 && !self.text.is_char_boundary(pos) {
            pos -= 1;
        }
        pos
    }

    /// Byte ranges of each visual row after soft wrapping to `width` columns.
    fn wrapped_rows(&self, width: u16) -> Vec<Range<usize>> {
        let width = usize::from(width.max(1));
        let mut rows = Vec::new();
        let mut line_start = 0;
        for line in self.text.split('\n') {
            let mut row_start = line_start;
            let mut row_width = 0;
            for (idx, grapheme) in line.grapheme_indices(true) {
                let w = grapheme.width();
                if row_width + w > width && row_width > 0 {
                    rows.push(row_start..line_start + idx);
                    row_start = line_start + idx;
                    row_width = 0;
                }
                row_width += w;
            }
            rows.push(row_start..line_start + line.len());
            line_start += line.len() + 1;
        }
        rows
    }

    fn cursor_row_col(&self, width: u16) -> (usize, u16) {
        let rows = self.wrapped_rows(width);
        let row = rows
            .iter()
            .rposition(|r| r.start <= self.cursor)
            .unwrap_or_default();
        let start = rows.get(row).map_or(0, |r| r.start);
        let col = self.text[start..self.cursor].width();
        (row, u16::try_from(col).unwrap_or(u16::MAX))
    }

    pub fn desired_height(&self, width: u16) -> u16 {
        u16::try_from(self.wrapped_rows(width).len()).unwrap_or(u16::MAX)
    }

    /// Scroll offset that keeps the cursor row inside a viewport of `area.height` rows.
    fn effective_scroll(&self, area: Rect, state: TextAreaState) -> u16 {
        let (row, _) = self.cursor_row_col(area.width);
        let row = u16::try_from(row).unwrap_or(u16::MAX);
        let height = area.height.max(1);
        if row < state.scroll {
            row
        } else if row >= state.scroll.saturating_add(height) {
            row + 1 - height
        } else {
            state.scroll
        }
    }

    pub fn cursor_pos_with_state(&self, area: Rect, state: TextAreaState) -> Option<(u16, u16)> {
        if area.is_empty() {
            return None;
        }
        let scroll = self.effective_scroll(area, state);
        let (row, col) = self.cursor_row_col(area.width);
        let row = u16::try_from(row).unwrap_or(u16::MAX).saturating_sub(scroll);
        let col = col.min(area.width.saturating_sub(1));
        Some((area.x + col, area.y + row))
    }

    pub fn render_with_state(
        &self,
        area: Rect,
        buf: &mut Buffer,
        state: &mut TextAreaState,
        style: Style,
    ) {
        if area.is_empty() {
            return;
        }
        state.scroll = self.effective_scroll(area, *state);
        let rows = self.wrapped_rows(area.width);
        for (offset, row) in rows
            .iter()
            .skip(usize::from(state.scroll))
            .take(usize::from(area.height))
            .enumerate()
        {
            let y = area.y + u16::try_from(offset).unwrap_or(u16::MAX);
            let line = self.text[row.clone()].replace('\t', " ");
            buf.set_stringn(area.x, y, line, usize::from(area.width), style);
        }
    }
}
