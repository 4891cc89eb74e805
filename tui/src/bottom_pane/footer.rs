//! The bottom-pane footer renders key hints under the composer.
//!
//! The footer is pure rendering: it formats `FooterProps` into a `Line` without mutating any
//! state. Which mode is shown is decided by the `ChatComposer`.
use crate::key_hint;
use crate::key_hint::KeyBinding;
use crate::ui_consts::FOOTER_INDENT_COLS;
use crossterm::event::KeyCode;
use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::Stylize;
use ratatui::text::Line;
use ratatui::text::Span;
use ratatui::widgets::Paragraph;
use ratatui::widgets::Widget;

/// The rendering inputs for the footer area under the composer.
#[derive(Clone, Copy, Debug)]
pub struct FooterProps {
    pub mode: FooterMode,
    /// Whether pressing Enter would send right now (not disabled, non-blank text).
    pub send_enabled: bool,
    /// Which key the user must press again to quit.
    pub quit_shortcut_key: KeyBinding,
}

/// Selects which footer content is rendered.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FooterMode {
    /// Transient "press again to quit" reminder (Ctrl+C).
    QuitShortcutReminder,
    ShortcutSummary,
    /// An attachment path prompt is open.
    PathPrompt,
    /// A blocking alert is waiting to be dismissed.
    Alert,
}

pub fn footer_height(_props: FooterProps) -> u16 {
    1
}

pub fn render_footer(area: Rect, buf: &mut Buffer, props: FooterProps) {
    let mut spans = vec![Span::from(" ".repeat(FOOTER_INDENT_COLS))];
    spans.extend(footer_line(props).spans);
    Paragraph::new(Line::from(spans)).render(area, buf);
}

fn footer_line(props: FooterProps) -> Line<'static> {
    match props.mode {
        FooterMode::QuitShortcutReminder => {
            Line::from(vec![props.quit_shortcut_key.into(), " again to quit".into()]).dim()
        }
        FooterMode::ShortcutSummary => shortcut_summary_line(props.send_enabled),
        FooterMode::PathPrompt => hints_line(vec![
            (key_hint::plain(KeyCode::Enter), "attach"),
            (key_hint::plain(KeyCode::Esc), "cancel"),
        ]),
        FooterMode::Alert => hints_line(vec![(key_hint::plain(KeyCode::Enter), "dismiss")]),
    }
}

fn shortcut_summary_line(send_enabled: bool) -> Line<'static> {
    let send_label = if send_enabled {
        Span::from(" send").bold()
    } else {
        Span::from(" send").dim()
    };
    let mut spans = vec![key_hint::plain(KeyCode::Enter).into(), send_label];
    for (key, label) in [
        (key_hint::shift(KeyCode::Enter), "newline"),
        (key_hint::ctrl(KeyCode::Char('o')), "attach image"),
        (key_hint::ctrl(KeyCode::Char('f')), "attach file"),
    ] {
        spans.push("   ".into());
        spans.push(key.into());
        spans.push(Span::from(format!(" {label}")).dim());
    }
    Line::from(spans)
}

fn hints_line(items: Vec<(KeyBinding, &'static str)>) -> Line<'static> {
    let mut spans = Vec::with_capacity(items.len() * 3);
    for (idx, (key, label)) in items.into_iter().enumerate() {
        if idx > 0 {
            spans.push("   ".into());
        }
        spans.push(key.into());
        spans.push(Span::from(format!(" {label}")).dim());
    }
    Line::from(spans)
}
