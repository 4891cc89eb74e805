//! Blocking alert shown above the composer until the user dismisses it.

use crossterm::event::KeyCode;
use crossterm::event::KeyEvent;
use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::Stylize;
use ratatui::text::Line;
use ratatui::widgets::Block;
use ratatui::widgets::Paragraph;
use ratatui::widgets::Widget;
use ratatui::widgets::Wrap;
use unicode_width::UnicodeWidthStr;

use crate::render::renderable::Renderable;

pub struct AlertPopup {
    message: String,
}

impl AlertPopup {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns true when the key dismisses the alert. Every other key is swallowed.
    pub fn handle_key_event(&mut self, key_event: KeyEvent) -> bool {
        matches!(
            key_event.code,
            KeyCode::Enter | KeyCode::Esc | KeyCode::Char(' ')
        )
    }
}

impl Renderable for AlertPopup {
    fn render(&self, area: Rect, buf: &mut Buffer) {
        Paragraph::new(Line::from(self.message.as_str()))
            .wrap(Wrap { trim: true })
            .block(Block::bordered().red())
            .render(area, buf);
    }

    fn desired_height(&self, width: u16) -> u16 {
        let inner = usize::from(width.saturating_sub(2).max(1));
        let lines = self.message.width().div_ceil(inner).max(1);
        u16::try_from(lines).unwrap_or(u16::MAX).saturating_add(2)
    }
}
