//! Vertical label printer: text rotated 270°, reading bottom to top.
//!
//! Layout happens in the rotated ("logical") frame, where the field's
//! height is the line length and its width is the room for lines.

use crate::error::PaginateError;
use crate::geometry::{aligned_rect, Rect, Size};
use crate::model::{Field, TextContent};
use crate::surface::{draw_text_lossy, Surface, TextFormat};
use crate::text::split_at_char;

use super::text::{Settle, TextCursor};
use super::PrintContext;

#[derive(Debug, Clone, Default)]
pub struct VerticalLabelPrinter {
    cursor: TextCursor,
}

impl VerticalLabelPrinter {
    pub fn new() -> Self {
        Self::default()
    }

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

        let logical = Size::new(bounds.height, bounds.width);
        let measured = surface.measure_text(&text, &style.font, logical, &format);
        let (fitted, _) = split_at_char(&text, measured.chars_fitted);

        let upright = Size::new(measured.size.height, measured.size.width);
        let mut rect = aligned_rect(upright, bounds, style.align, 0, 0);
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
            surface.translate(rect.x, rect.bottom());
            surface.rotate(270.0);
            draw_text_lossy(
                surface,
                fitted,
                &style.font,
                style.fore_color,
                Rect::new(0, 0, rect.height, rect.width),
                &format,
            );
            surface.reset_transform();
        }

        let done = !matches!(
            self.cursor.settle(&text, measured.chars_fitted, field.one_page_only),
            Settle::Remaining
        );
        log::trace!(
            "vertical label at {bounds:?}: {} of {} chars, done={done}",
            measured.chars_fitted,
            text.chars().count()
        );
        Ok(done)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::FieldKind;
    use crate::surface::testing::{ScriptedSurface, LINE};
    use crate::surface::DrawCommand;

    fn label(text: &str, bounds: Rect) -> (Field, TextContent) {
        let content = TextContent::new(text);
        (
            Field::new(bounds, FieldKind::VerticalLabel(content.clone())),
            content,
        )
    }

    #[test]
    fn draws_rotated_in_logical_space() {
        let (f, content) = label("up", Rect::new(10, 20, 30, 100));
        let mut p = VerticalLabelPrinter::new();
        let mut s = ScriptedSurface::new();
        assert!(p.print(&f, &content, &mut s, f.bounds, &PrintContext::default()).unwrap());

        let transforms: Vec<&DrawCommand> = s
            .commands
            .iter()
            .filter(|c| !matches!(c, DrawCommand::Text { .. } | DrawCommand::FillRect { .. }))
            .collect();
        assert_eq!(
            transforms,
            vec![
                &DrawCommand::Translate { dx: 10, dy: 120 },
                &DrawCommand::Rotate { degrees: 270.0 },
                &DrawCommand::ResetTransform,
            ]
        );
        assert_eq!(s.texts(), vec!["up"]);
        assert_eq!(s.text_rects(), vec![Rect::new(0, 0, 100, 30)]);
    }

    #[test]
    fn measures_line_length_along_the_height() {
        // 30 wide: room for one 20-unit line. 100 tall: 10 glyphs per line.
        let (f, content) = label("aaaa bbbb cccc", Rect::new(0, 0, 30, 100));
        let mut p = VerticalLabelPrinter::new();
        let mut s = ScriptedSurface::new();
        let ctx = PrintContext::default();
        assert!(!p.print(&f, &content, &mut s, f.bounds, &ctx).unwrap());
        assert_eq!(s.texts(), vec!["aaaa bbbb "]);
        assert_eq!(p.pending(), Some("cccc"));
        assert!(p.print(&f, &content, &mut s, f.bounds, &ctx).unwrap());
        assert_eq!(p.pending(), None);
    }

    #[test]
    fn empty_text_completes_without_transform() {
        let (f, content) = label("", Rect::new(0, 0, 30, 100));
        let mut p = VerticalLabelPrinter::new();
        let mut s = ScriptedSurface::new();
        assert!(p.print(&f, &content, &mut s, f.bounds, &PrintContext::default()).unwrap());
        assert!(!s.commands.iter().any(|c| matches!(c, DrawCommand::Rotate { .. })));
    }

    #[test]
    fn tight_rect_is_upright_extent_of_the_text() {
        let content = TextContent {
            text: "abc".to_string(),
            fit_max_width: false,
            fit_max_height: false,
            ..Default::default()
        };
        let f = Field::new(Rect::new(0, 0, 50, 100), FieldKind::VerticalLabel(content.clone()));
        let mut p = VerticalLabelPrinter::new();
        let mut s = ScriptedSurface::new();
        p.print(&f, &content, &mut s, f.bounds, &PrintContext::default()).unwrap();
        // Logical 30 x 20 becomes 20 wide, 30 tall on the page
        assert!(s.commands.contains(&DrawCommand::Translate { dx: 0, dy: 30 }));
        assert_eq!(s.text_rects(), vec![Rect::new(0, 0, 30, LINE)]);
    }
}
