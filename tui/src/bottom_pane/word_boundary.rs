//! Word-boundary helpers used by the composer for word-wise navigation and deletion.
//!
//! Boundaries come from Unicode word segmentation (UAX #29), with runs of ASCII punctuation
//! split off as their own words so `foo.bar` jumps in two steps.

use std::ops::Range;

use unicode_segmentation::UnicodeSegmentation;

/// ASCII punctuation treated as word separators in addition to UAX #29 boundaries.
pub const WORD_SEPARATORS: &str = "`~!@#$%^&*()-=+[{]}\\|;:'\",.<>/?";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Segment {
    start: usize,
    end: usize,
    is_whitespace: bool,
}

/// Return the byte index of the start of the previous word.
pub fn beginning_of_previous_word(text: &str, cursor_pos: usize) -> usize {
    let cursor_pos = clamp_pos_to_char_boundary(text, cursor_pos);
    if cursor_pos == 0 {
        return 0;
    }

    let segments = segments(text);
    let Some((probe_idx, _)) = text[..cursor_pos].char_indices().next_back() else {
        return 0;
    };
    let Some(mut segment_idx) = find_segment_containing(&segments, probe_idx) else {
        return 0;
    };

    while segments[segment_idx].is_whitespace {
        if segment_idx == 0 {
            return 0;
        }
        segment_idx -= 1;
    }

    segments[segment_idx].start
}

/// Return the byte index of the end of the next word.
pub fn end_of_next_word(text: &str, cursor_pos: usize) -> usize {
    let cursor_pos = clamp_pos_to_char_boundary(text, cursor_pos);
    if cursor_pos >= text.len() {
        return text.len();
    }

    let segments = segments(text);
    let Some(mut segment_idx) = segments.iter().position(|s| s.end > cursor_pos) else {
        return text.len();
    };

    while segments[segment_idx].is_whitespace {
        segment_idx += 1;
        if segment_idx >= segments.len() {
            return text.len();
        }
    }

    segments[segment_idx].end
}

fn clamp_pos_to_char_boundary(text: &str, pos: usize) -> usize {
    let mut pos = pos.min(text.len());
    while pos > 0 && !text.is_char_boundary(pos) {
        pos -= 1;
    }
    pos
}

fn segments(text: &str) -> Vec<Segment> {
    let mut out: Vec<Segment> = Vec::new();
    for (start, word) in text.split_word_bound_indices() {
        let range = start..start + word.len();
        if word.chars().all(char::is_whitespace) {
            // Adjacent whitespace bounds (e.g. "\n" followed by spaces) merge into one run.
            if let Some(last) = out.last_mut()
                && last.is_whitespace
                && last.end == range.start
            {
                last.end = range.end;
                continue;
            }
            out.push(Segment {
                start: range.start,
                end: range.end,
                is_whitespace: true,
            });
        } else {
            split_by_word_separators(text, range, &mut out);
        }
    }
    out
}

fn split_by_word_separators(text: &str, range: Range<usize>, out: &mut Vec<Segment>) {
    let slice = &text[range.clone()];
    let mut seg_start = range.start;
    let mut current_is_separator = None;

    for (idx, ch) in slice.char_indices() {
        let is_separator = WORD_SEPARATORS.contains(ch);
        match current_is_separator {
            None => current_is_separator = Some(is_separator),
            Some(prev) if prev != is_separator => {
                out.push(Segment {
                    start: seg_start,
                    end: range.start + idx,
                    is_whitespace: false,
                });
                seg_start = range.start + idx;
                current_is_separator = Some(is_separator);
            }
            Some(_) => {}
        }
    }

    out.push(Segment {
        start: seg_start,
        end: range.end,
        is_whitespace: false,
    });
}

fn find_segment_containing(segments: &[Segment], pos: usize) -> Option<usize> {
    segments.iter().position(|s| pos >= s.start && pos < s.end)
}
