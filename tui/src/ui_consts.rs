//! Shared layout constants for the composer UI.

/// Columns reserved on the left of the text area for the `›` prompt glyph.
pub(crate) const LIVE_PREFIX_COLS: u16 = 2;

/// Indent of footer hint rows, aligned with the text after the prompt glyph.
pub(crate) const FOOTER_INDENT_COLS: usize = LIVE_PREFIX_COLS as usize;
