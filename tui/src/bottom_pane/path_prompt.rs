//! Single-line prompt asking for the path of an attachment.

use std::path::PathBuf;

use crossterm::event::KeyCode;
use crossterm::event::KeyEvent;
use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::style::Stylize;
use ratatui::text::Line;
use ratatui::text::Span;
use ratatui::widgets::WidgetRef;
use unicode_width::UnicodeWidthStr;

use super::textarea::TextArea;
use super::textarea::TextAreaState;
use crate::image_attach::normalize_pasted_path;
use crate::render::renderable::Renderable;

/// Which pipeline a confirmed path is routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachKind {
    /// Decode, resize, and embed in the next message.
    Image,
    /// Upload to the server as a generic attachment.
    File,
}

impl AttachKind {
    fn title(self) -> &'static str {
        match self {
            AttachKind::Image => "Attach image: ",
            AttachKind::File => "Attach file: ",
        }
    }
}

#[derive(Debug, PartialEq)]
pub enum PathPromptResult {
    Pending,
    Cancelled,
    Confirmed(AttachKind, PathBuf),
}

pub struct PathPrompt {
    kind: AttachKind,
    input: TextArea,
}

impl PathPrompt {
    pub fn new(kind: AttachKind) -> Self {
        Self {
            kind,
            input: TextArea::new(),
        }
    }

    pub fn handle_key_event(&mut self, key_event: KeyEvent) -> PathPromptResult {
        match key_event.code {
            KeyCode::Esc => PathPromptResult::Cancelled,
            KeyCode::Enter => match normalize_pasted_path(self.input.text()) {
                Some(path) => PathPromptResult::Confirmed(self.kind, path),
                None => PathPromptResult::Pending,
            },
            _ => {
                self.input.input(key_event);
                PathPromptResult::Pending
            }
        }
    }

    pub fn handle_paste(&mut self, pasted: &str) {
        // Paths never span lines; drop the trailing newline some terminals append.
        self.input.insert_str(pasted.trim_end_matches(['\r', '\n']));
    }

    fn input_area(&self, area: Rect) -> Rect {
        let title_width = u16::try_from(self.kind.title().width()).unwrap_or(u16::MAX);
        Rect {
            x: area.x.saturating_add(title_width),
            width: area.width.saturating_sub(title_width),
            height: area.height.min(1),
            ..area
        }
    }
}

impl Renderable for PathPrompt {
    fn render(&self, area: Rect, buf: &mut Buffer) {
        if area.is_empty() {
            return;
        }
        Line::from(vec![Span::from(self.kind.title()).bold()]).render_ref(area, buf);
        let mut state = TextAreaState::default();
        self.input
            .render_with_state(self.input_area(area), buf, &mut state, Style::default());
    }

    fn desired_height(&self, _width: u16) -> u16 {
        1
    }

    fn cursor_pos(&self, area: Rect) -> Option<(u16, u16)> {
        self.input
            .cursor_pos_with_state(self.input_area(area), TextAreaState::default())
    }
}
