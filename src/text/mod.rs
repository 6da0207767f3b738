//! # Text Fitting
//!
//! Word-trimmed text measurement: how much of a string fits inside a
//! bounding box, and how big the fitted block is.
//!
//! Lines break greedily at UAX#14 opportunities. A word is never split
//! across lines: if a word is wider than the box on its own, fitting stops
//! in front of it. Only whole lines count, so a line that would cross the
//! bottom of the box is not fitted at all. This is the contract the
//! printers rely on for carry-over: `chars_fitted` is always a line
//! boundary, and the remainder starts at the next line's first character.

use unicode_linebreak::{linebreaks, BreakOpportunity};

use crate::font::FontContext;
use crate::style::Font;

/// One fitted line.
#[derive(Debug, Clone, PartialEq)]
pub struct FittedLine {
    /// Char index of the first character of the line.
    pub start: usize,
    /// Char index one past the last consumed character, including trailing
    /// whitespace and the line terminator.
    pub end: usize,
    /// Visible text (trailing whitespace and terminator removed).
    pub text: String,
    /// Visible width in points.
    pub width: f64,
}

/// Result of fitting a string into a box.
#[derive(Debug, Clone, PartialEq)]
pub struct TextFit {
    /// Number of characters (not bytes) that fit.
    pub chars_fitted: usize,
    pub lines: Vec<FittedLine>,
    /// Widest fitted line.
    pub width: f64,
    /// Total height of the fitted lines.
    pub height: f64,
    pub line_height: f64,
}

/// A run of text ending at a break opportunity.
struct Segment<'a> {
    text: &'a str,
    start_char: usize,
    char_len: usize,
    hard_break: bool,
}

fn is_line_terminator(ch: char) -> bool {
    matches!(ch, '\n' | '\r' | '\u{2028}' | '\u{2029}')
}

/// Split `text` at every UAX#14 break opportunity. `linebreaks` yields the
/// byte offset *after* each segment; the final entry is always the end of
/// the text.
fn segments(text: &str) -> Vec<Segment<'_>> {
    let mut out = Vec::new();
    let mut prev = 0;
    let mut start_char = 0;
    for (offset, opportunity) in linebreaks(text) {
        if offset == prev {
            continue;
        }
        let slice = &text[prev..offset];
        let char_len = slice.chars().count();
        let hard_break = opportunity == BreakOpportunity::Mandatory
            && slice.chars().last().is_some_and(is_line_terminator);
        out.push(Segment {
            text: slice,
            start_char,
            char_len,
            hard_break,
        });
        start_char += char_len;
        prev = offset;
    }
    out
}

struct OpenLine {
    start: usize,
    end: usize,
    visible: String,
    width: f64,
    /// Trailing whitespace, which becomes interior once another word joins.
    tail: String,
    tail_width: f64,
}

impl OpenLine {
    fn finish(self) -> FittedLine {
        FittedLine {
            start: self.start,
            end: self.end,
            text: self.visible,
            width: self.width,
        }
    }
}

/// Fit `text` into a `max_width` × `max_height` box (points).
pub fn fit_text(
    fonts: &FontContext,
    text: &str,
    font: &Font,
    max_width: f64,
    max_height: f64,
) -> TextFit {
    let line_height = fonts.line_height(font);
    let mut lines: Vec<FittedLine> = Vec::new();
    let mut open: Option<OpenLine> = None;
    // Tolerate float noise when a box was sized to an exact multiple
    let fits_lines = |n: usize| n as f64 * line_height <= max_height + 1e-6;

    for seg in segments(text) {
        let body = seg.text.trim_end_matches(is_line_terminator);
        let visible = body.trim_end();
        let tail = &body[visible.len()..];
        let visible_width = fonts.measure_string(visible, font);
        let tail_width = fonts.measure_string(tail, font);
        let seg_end = seg.start_char + seg.char_len;

        if let Some(mut line) = open.take() {
            if line.width + line.tail_width + visible_width <= max_width {
                line.visible.push_str(&line.tail);
                line.visible.push_str(visible);
                line.width += line.tail_width + visible_width;
                line.tail = tail.to_string();
                line.tail_width = tail_width;
                line.end = seg_end;
                if seg.hard_break {
                    lines.push(line.finish());
                } else {
                    open = Some(line);
                }
                continue;
            }
            lines.push(line.finish());
        }

        if visible_width > max_width || !fits_lines(lines.len() + 1) {
            break;
        }
        let line = OpenLine {
            start: seg.start_char,
            end: seg_end,
            visible: visible.to_string(),
            width: visible_width,
            tail: tail.to_string(),
            tail_width,
        };
        if seg.hard_break {
            lines.push(line.finish());
        } else {
            open = Some(line);
        }
    }
    if let Some(line) = open.take() {
        lines.push(line.finish());
    }

    let chars_fitted = lines.last().map_or(0, |l| l.end);
    let width = lines.iter().map(|l| l.width).fold(0.0, f64::max);
    let height = lines.len() as f64 * line_height;
    TextFit {
        chars_fitted,
        lines,
        width,
        height,
        line_height,
    }
}

/// Split `text` after `n` characters.
pub fn split_at_char(text: &str, n: usize) -> (&str, &str) {
    match text.char_indices().nth(n) {
        Some((byte, _)) => text.split_at(byte),
        None => (text, ""),
    }
}

/// Width of `text` on a single unbounded line.
pub fn single_line_width(fonts: &FontContext, text: &str, font: &Font) -> f64 {
    text.split(is_line_terminator)
        .map(|line| fonts.measure_string(line, font))
        .fold(0.0, f64::max)
}
