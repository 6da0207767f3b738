//! A predictable surface for unit tests.
//!
//! Every glyph is [`GLYPH`] units wide and every line [`LINE`] units
//! tall, whatever the font. Words break at spaces and newlines only.

use std::sync::Arc;

use crate::error::DrawError;
use crate::geometry::{Point, Rect, Size};
use crate::image_loader::SourceImage;
use crate::style::{Color, Font, Pen};

use super::{DrawCommand, MeasuredText, Surface, TextFormat};

pub const GLYPH: i32 = 10;
pub const LINE: i32 = 20;

#[derive(Default)]
pub struct ScriptedSurface {
    pub commands: Vec<DrawCommand>,
    /// Make every `draw_text` fail.
    pub fail_text: bool,
    /// Make every fill fail.
    pub fail_fill: bool,
}

impl ScriptedSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn texts(&self) -> Vec<&str> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                DrawCommand::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn text_rects(&self) -> Vec<Rect> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                DrawCommand::Text { rect, .. } => Some(*rect),
                _ => None,
            })
            .collect()
    }

    pub fn fills(&self) -> Vec<(Rect, Color)> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                DrawCommand::FillRect { rect, color } => Some((*rect, *color)),
                _ => None,
            })
            .collect()
    }

    pub fn lines(&self) -> Vec<(Point, Point, Pen)> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                DrawCommand::Line { from, to, pen } => Some((*from, *to, *pen)),
                _ => None,
            })
            .collect()
    }

    pub fn clear(&mut self) {
        self.commands.clear();
    }
}

impl Surface for ScriptedSurface {
    fn measure_text(
        &self,
        text: &str,
        _font: &Font,
        bounds: Size,
        _format: &TextFormat,
    ) -> MeasuredText {
        let chars: Vec<char> = text.chars().collect();
        let max_lines = if bounds.height < 0 { 0 } else { (bounds.height / LINE) as usize };
        let mut start = 0;
        let mut lines = 0;
        let mut widest = 0;
        let mut fitted = 0;

        while start < chars.len() && lines < max_lines {
            let mut word_start = start;
            let mut visible_end = start;
            let mut consumed = start;
            loop {
                let mut k = word_start;
                while k < chars.len() && chars[k] != ' ' && chars[k] != '\n' {
                    k += 1;
                }
                if (k - start) as i32 * GLYPH > bounds.width {
                    break;
                }
                visible_end = k;
                let mut m = k;
                while m < chars.len() && chars[m] == ' ' {
                    m += 1;
                }
                consumed = m;
                if m < chars.len() && chars[m] == '\n' {
                    consumed = m + 1;
                    break;
                }
                if m >= chars.len() {
                    break;
                }
                word_start = m;
            }
            if consumed == start {
                break;
            }
            lines += 1;
            widest = widest.max((visible_end - start) as i32 * GLYPH);
            fitted = consumed;
            start = consumed;
        }

        MeasuredText {
            chars_fitted: fitted,
            lines,
            size: Size::new(widest, lines as i32 * LINE),
            line_height: LINE,
        }
    }

    fn fill_rect(&mut self, rect: Rect, color: Color) -> Result<(), DrawError> {
        if self.fail_fill {
            return Err(DrawError::Backend("fill refused".to_string()));
        }
        self.commands.push(DrawCommand::FillRect { rect, color });
        Ok(())
    }

    fn stroke_rect(&mut self, rect: Rect, pen: &Pen) -> Result<(), DrawError> {
        self.commands.push(DrawCommand::StrokeRect { rect, pen: *pen });
        Ok(())
    }

    fn draw_line(&mut self, from: Point, to: Point, pen: &Pen) -> Result<(), DrawError> {
        self.commands.push(DrawCommand::Line {
            from,
            to,
            pen: *pen,
        });
        Ok(())
    }

    fn draw_text(
        &mut self,
        text: &str,
        font: &Font,
        color: Color,
        rect: Rect,
        format: &TextFormat,
    ) -> Result<(), DrawError> {
        if self.fail_text {
            return Err(DrawError::Text("glyph cache exploded".to_string()));
        }
        self.commands.push(DrawCommand::Text {
            text: text.to_string(),
            font: font.clone(),
            color,
            rect,
            format: *format,
        });
        Ok(())
    }

    fn draw_image(&mut self, image: &Arc<SourceImage>, rect: Rect) -> Result<(), DrawError> {
        self.commands.push(DrawCommand::Image {
            rect,
            image: Arc::clone(image),
        });
        Ok(())
    }

    fn translate(&mut self, dx: i32, dy: i32) {
        self.commands.push(DrawCommand::Translate { dx, dy });
    }

    fn rotate(&mut self, degrees: f64) {
        self.commands.push(DrawCommand::Rotate { degrees });
    }

    fn reset_transform(&mut self) {
        self.commands.push(DrawCommand::ResetTransform);
    }
}

#[test]
fn scripted_measurement_breaks_at_words() {
    let s = ScriptedSurface::new();
    let fmt = TextFormat::default();
    let font = Font::default();
    // "aaa bbb" is 70 wide, so 50 gives two lines
    let m = s.measure_text("aaa bbb", &font, Size::new(50, 100), &fmt);
    assert_eq!((m.chars_fitted, m.lines), (7, 2));
    assert_eq!(m.size, Size::new(30, 40));
    // one line of room
    let m = s.measure_text("aaa bbb", &font, Size::new(50, 39), &fmt);
    assert_eq!(m.chars_fitted, 4);
    // a word wider than the box fits nothing
    let m = s.measure_text("aaaaaa", &font, Size::new(50, 100), &fmt);
    assert_eq!(m.chars_fitted, 0);
    let m = s.measure_text("a\nb", &font, Size::new(50, 100), &fmt);
    assert_eq!((m.chars_fitted, m.lines), (3, 2));
}
