//! Plain text and label printers.
//!
//! Both draw the part of the pending text that fits, then carry the rest
//! over to the next page. They differ only in what they report once
//! everything fits: a label is done, while a plain text field flagged as a
//! page number stays pending so it is redrawn on every page.

use crate::error::PaginateError;
use crate::geometry::{aligned_rect, Rect};
use crate::model::{Field, TextContent};
use crate::surface::{draw_text_lossy, Surface, TextFormat};
use crate::text::split_at_char;

use super::PrintContext;

pub const PAGE_NUMBER_TOKEN: &str = "[pn]";
pub const PAGE_COUNT_TOKEN: &str = "[pc]";

/// Replace the page tokens in `text`.
pub fn substitute_page_tokens(text: &str, ctx: &PrintContext) -> String {
    text.replace(PAGE_NUMBER_TOKEN, &ctx.current_page.to_string())
        .replace(PAGE_COUNT_TOKEN, &ctx.page_count.to_string())
}

/// Outcome of one carry-over step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Settle {
    /// Part of the text is left for the next page.
    Remaining,
    /// Nothing could be consumed; the rest is dropped.
    Stalled,
    /// Everything was drawn.
    Drained,
}

/// Remaining text of a reflowing text field.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct TextCursor {
    /// `None` means the declared text.
    pending: Option<String>,
    previous: Option<String>,
}

impl TextCursor {
    /// Text to lay out on this call. Page-number fields always start over
    /// from the declared text, since the tokens change every page.
    pub(crate) fn current(&self, content: &TextContent, ctx: &PrintContext) -> String {
        if content.is_page_number {
            substitute_page_tokens(&content.text, ctx)
        } else {
            self.pending.clone().unwrap_or_else(|| content.text.clone())
        }
    }

    pub(crate) fn pending(&self) -> Option<&str> {
        self.pending.as_deref()
    }

    /// Record that `fitted` characters of `text` were drawn.
    pub(crate) fn settle(&mut self, text: &str, fitted: usize, one_page_only: bool) -> Settle {
        if fitted < text.chars().count() && !one_page_only {
            let (_, rest) = split_at_char(text, fitted);
            if rest == text {
                log::warn!(
                    "text cannot fit a single word, dropping {} characters: {:?}",
                    rest.chars().count(),
                    truncate_for_log(rest)
                );
                self.pending = None;
                self.previous = None;
                return Settle::Stalled;
            }
            self.previous = Some(text.to_string());
            self.pending = Some(rest.to_string());
            Settle::Remaining
        } else {
            self.pending = None;
            self.previous = None;
            Settle::Drained
        }
    }
}

fn truncate_for_log(text: &str) -> &str {
    split_at_char(text, 40).0
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextVariant {
    Plain,
    Label,
}

#[derive(Debug, Clone)]
pub struct TextPrinter {
    variant: TextVariant,
    cursor: TextCursor,
}

impl TextPrinter {
    pub fn new(variant: TextVariant) -> Self {
        Self {
            variant,
            cursor: TextCursor::default(),
        }
    }

    /// Unconsumed text carried to the next call, if any.
    pub fn pending(&self) -> Option<&str> {
        self.cursor.pending()
    }

    pub fn print(
        &mut self,
        field: &Field,
        content: &TextContent,
        surface: &mut dyn Surface,
        bounds: Rect,
        ctx: &PrintContext,
    ) -> Result<bool, PaginateError> {
        let style = &field.style;
        let text = self.cursor.current(content, ctx);
        let format = TextFormat::new(style.align, style.right_to_left);

        let measured = surface.measure_text(&text, &style.font, bounds.size(), &format);
        let (fitted, _) = split_at_char(&text, measured.chars_fitted);

        let mut rect = aligned_rect(measured.size, bounds, style.align, 0, 0);
        if content.fit_max_height {
            rect.y = bounds.y;
            rect.height = bounds.height;
        }
        if content.fit_max_width {
            rect.x = bounds.x;
            rect.width = bounds.width;
        }

        surface.fill_rect(rect, style.back_color)?;
        if style.border.is_visible() {
            surface.stroke_rect(rect, &style.border)?;
        }
        if !fitted.is_empty() {
            draw_text_lossy(surface, fitted, &style.font, style.fore_color, rect, &format);
        }

        let done = match self.cursor.settle(&text, measured.chars_fitted, field.one_page_only) {
            Settle::Remaining => false,
            Settle::Stalled => true,
            Settle::Drained => match self.variant {
                TextVariant::Label => true,
                TextVariant::Plain => !content.is_page_number,
            },
        };
        log::trace!(
            "{:?} text at {bounds:?}: {} of {} chars, done={done}",
            self.variant,
            measured.chars_fitted,
            text.chars().count()
        );
        Ok(done)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Alignment, Size};
    use crate::model::FieldKind;
    use crate::style::{Color, Pen};
    use crate::surface::testing::{ScriptedSurface, GLYPH, LINE};
    use crate::surface::DrawCommand;

    fn field(content: TextContent) -> Field {
        Field::new(Rect::new(0, 0, 100, 100), FieldKind::Text(content))
    }

    fn print(
        printer: &mut TextPrinter,
        field: &Field,
        surface: &mut ScriptedSurface,
        bounds: Rect,
        ctx: &PrintContext,
    ) -> bool {
        let content = match &field.kind {
            FieldKind::Text(c) | FieldKind::Label(c) => c.clone(),
            _ => unreachable!(),
        };
        printer.print(field, &content, surface, bounds, ctx).unwrap()
    }

    #[test]
    fn text_that_fits_completes_and_resets() {
        let f = field(TextContent::new("hello world"));
        let mut p = TextPrinter::new(TextVariant::Plain);
        let mut s = ScriptedSurface::new();
        assert!(print(&mut p, &f, &mut s, Rect::new(0, 0, 200, 100), &PrintContext::default()));
        assert_eq!(s.texts(), vec!["hello world"]);
        assert_eq!(p.pending(), None);
    }

    #[test]
    fn overflowing_text_carries_the_remainder() {
        // One 20-unit line of 50 units: "one " fits, then "two ", then "three"
        let f = field(TextContent::new("one two three"));
        let mut p = TextPrinter::new(TextVariant::Plain);
        let mut s = ScriptedSurface::new();
        let bounds = Rect::new(0, 0, 5 * GLYPH, LINE);
        let ctx = PrintContext::default();

        assert!(!print(&mut p, &f, &mut s, bounds, &ctx));
        assert_eq!(s.texts(), vec!["one "]);
        assert_eq!(p.pending(), Some("two three"));

        assert!(!print(&mut p, &f, &mut s, bounds, &ctx));
        assert_eq!(p.pending(), Some("three"));

        assert!(print(&mut p, &f, &mut s, bounds, &ctx));
        assert_eq!(s.texts(), vec!["one ", "two ", "three"]);
        assert_eq!(p.pending(), None);
    }

    #[test]
    fn word_wider_than_the_box_completes_on_the_first_call() {
        let f = field(TextContent::new("unbreakable"));
        let mut p = TextPrinter::new(TextVariant::Label);
        let mut s = ScriptedSurface::new();
        assert!(print(&mut p, &f, &mut s, Rect::new(0, 0, 30, 100), &PrintContext::default()));
        assert!(s.texts().is_empty());
        assert_eq!(p.pending(), None);
    }

    #[test]
    fn stall_after_partial_progress_completes_within_two_calls() {
        let f = field(TextContent::new("ok unbreakable"));
        let mut p = TextPrinter::new(TextVariant::Plain);
        let mut s = ScriptedSurface::new();
        let bounds = Rect::new(0, 0, 30, 100);
        let ctx = PrintContext::default();
        assert!(!print(&mut p, &f, &mut s, bounds, &ctx));
        assert!(print(&mut p, &f, &mut s, bounds, &ctx));
    }

    #[test]
    fn one_page_only_truncates() {
        let mut f = field(TextContent::new("one two three"));
        f.one_page_only = true;
        let mut p = TextPrinter::new(TextVariant::Plain);
        let mut s = ScriptedSurface::new();
        assert!(print(&mut p, &f, &mut s, Rect::new(0, 0, 50, 20), &PrintContext::default()));
        assert_eq!(s.texts(), vec!["one "]);
        assert_eq!(p.pending(), None);
    }

    #[test]
    fn uncounted_total_renders_as_zero() {
        let ctx = PrintContext {
            page_count: 0,
            ..Default::default()
        };
        assert_eq!(substitute_page_tokens("[pn] / [pc]", &ctx), "1 / 0");
    }

    #[test]
    fn page_number_tokens_use_the_context() {
        let content = TextContent {
            text: "Page [pn] of [pc]".to_string(),
            is_page_number: true,
            ..Default::default()
        };
        let ctx = PrintContext {
            current_page: 2,
            page_count: 5,
            ..Default::default()
        };
        let f = Field::new(Rect::new(0, 0, 300, 40), FieldKind::Label(content.clone()));
        let mut label = TextPrinter::new(TextVariant::Label);
        let mut s = ScriptedSurface::new();
        assert!(label.print(&f, &content, &mut s, f.bounds, &ctx).unwrap());
        assert_eq!(s.texts(), vec!["Page 2 of 5"]);

        // The plain text printer keeps a fitting page-number field pending
        let mut plain = TextPrinter::new(TextVariant::Plain);
        assert!(!plain.print(&f, &content, &mut s, f.bounds, &ctx).unwrap());
        let next = PrintContext {
            current_page: 3,
            ..ctx
        };
        plain.print(&f, &content, &mut s, f.bounds, &next).unwrap();
        assert_eq!(s.texts().last(), Some(&"Page 3 of 5"));
    }

    #[test]
    fn alignment_and_fit_flags_shape_the_rect() {
        let content = TextContent {
            text: "abc".to_string(),
            fit_max_width: false,
            fit_max_height: false,
            ..Default::default()
        };
        let mut f = Field::new(Rect::new(10, 10, 100, 100), FieldKind::Text(content.clone()));
        f.style.align = Alignment::BottomRight;
        f.style.back_color = Color::WHITE;
        f.style.border = Pen::solid(2);
        let mut p = TextPrinter::new(TextVariant::Plain);
        let mut s = ScriptedSurface::new();
        p.print(&f, &content, &mut s, f.bounds, &PrintContext::default()).unwrap();

        let tight = Rect::new(80, 90, 30, 20);
        assert_eq!(s.fills(), vec![(tight, Color::WHITE)]);
        assert!(s.commands.contains(&DrawCommand::StrokeRect {
            rect: tight,
            pen: Pen::solid(2)
        }));
        assert_eq!(s.text_rects(), vec![tight]);

        let full = TextContent {
            fit_max_width: true,
            fit_max_height: true,
            ..content
        };
        let mut s = ScriptedSurface::new();
        p.print(&f, &full, &mut s, f.bounds, &PrintContext::default()).unwrap();
        assert_eq!(s.text_rects(), vec![f.bounds]);
        assert_eq!(s.text_rects()[0].size(), Size::new(100, 100));
    }

    #[test]
    fn failed_text_draw_is_swallowed() {
        let f = field(TextContent::new("hello"));
        let mut p = TextPrinter::new(TextVariant::Label);
        let mut s = ScriptedSurface::new();
        s.fail_text = true;
        assert!(print(&mut p, &f, &mut s, f.bounds, &PrintContext::default()));
    }

    #[test]
    fn failed_fill_propagates() {
        let f = field(TextContent::new("hello"));
        let content = TextContent::new("hello");
        let mut p = TextPrinter::new(TextVariant::Label);
        let mut s = ScriptedSurface::new();
        s.fail_fill = true;
        let err = p.print(&f, &content, &mut s, f.bounds, &PrintContext::default());
        assert!(matches!(err, Err(PaginateError::Draw(_))));
    }

    #[test]
    fn empty_text_completes() {
        let f = field(TextContent::new(""));
        let mut p = TextPrinter::new(TextVariant::Plain);
        let mut s = ScriptedSurface::new();
        assert!(print(&mut p, &f, &mut s, f.bounds, &PrintContext::default()));
    }
}
