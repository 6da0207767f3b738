//! An in-memory surface that records what was drawn, page by page.

use std::sync::Arc;

use serde::Serialize;

use crate::error::DrawError;
use crate::font::FontContext;
use crate::geometry::{Point, Rect, Size};
use crate::image_loader::SourceImage;
use crate::style::{Color, Font, Pen};
use crate::text::fit_text;

use super::{check_image_rect, MeasuredText, Surface, TextFormat};

/// A single drawing operation in device units.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum DrawCommand {
    FillRect {
        rect: Rect,
        color: Color,
    },
    StrokeRect {
        rect: Rect,
        pen: Pen,
    },
    Line {
        from: Point,
        to: Point,
        pen: Pen,
    },
    Text {
        text: String,
        font: Font,
        color: Color,
        rect: Rect,
        format: TextFormat,
    },
    Image {
        rect: Rect,
        #[serde(skip)]
        image: Arc<SourceImage>,
    },
    Translate {
        dx: i32,
        dy: i32,
    },
    Rotate {
        degrees: f64,
    },
    ResetTransform,
}

/// Everything drawn on one physical page.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RecordedPage {
    pub size: Size,
    pub commands: Vec<DrawCommand>,
}

impl RecordedPage {
    /// Text strings in draw order.
    pub fn texts(&self) -> Vec<&str> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                DrawCommand::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }
}

/// Measures with a [`FontContext`] and records draw commands.
///
/// Call [`RecordingSurface::begin_page`] before each page is printed.
/// Commands issued before the first page start one implicitly.
pub struct RecordingSurface {
    fonts: FontContext,
    page_size: Size,
    pages: Vec<RecordedPage>,
}

impl RecordingSurface {
    pub fn new(fonts: FontContext, page_size: Size) -> Self {
        Self {
            fonts,
            page_size,
            pages: Vec::new(),
        }
    }

    pub fn fonts(&self) -> &FontContext {
        &self.fonts
    }

    /// Start a new page. Later pages may differ in size.
    pub fn begin_page(&mut self, size: Size) {
        self.page_size = size;
        self.pages.push(RecordedPage {
            size,
            commands: Vec::new(),
        });
    }

    pub fn pages(&self) -> &[RecordedPage] {
        &self.pages
    }

    pub fn into_parts(self) -> (FontContext, Vec<RecordedPage>) {
        (self.fonts, self.pages)
    }

    fn push(&mut self, command: DrawCommand) {
        if self.pages.is_empty() {
            self.begin_page(self.page_size);
        }
        if let Some(page) = self.pages.last_mut() {
            page.commands.push(command);
        }
    }
}

impl Surface for RecordingSurface {
    fn measure_text(
        &self,
        text: &str,
        font: &Font,
        bounds: Size,
        _format: &TextFormat,
    ) -> MeasuredText {
        let fit = fit_text(
            &self.fonts,
            text,
            font,
            bounds.width as f64,
            bounds.height as f64,
        );
        MeasuredText {
            chars_fitted: fit.chars_fitted,
            lines: fit.lines.len(),
            size: Size::new(fit.width.ceil() as i32, fit.height.ceil() as i32),
            line_height: fit.line_height.ceil() as i32,
        }
    }

    fn fill_rect(&mut self, rect: Rect, color: Color) -> Result<(), DrawError> {
        if color.is_visible() && rect.width > 0 && rect.height > 0 {
            self.push(DrawCommand::FillRect { rect, color });
        }
        Ok(())
    }

    fn stroke_rect(&mut self, rect: Rect, pen: &Pen) -> Result<(), DrawError> {
        if pen.is_visible() {
            self.push(DrawCommand::StrokeRect { rect, pen: *pen });
        }
        Ok(())
    }

    fn draw_line(&mut self, from: Point, to: Point, pen: &Pen) -> Result<(), DrawError> {
        if pen.is_visible() {
            self.push(DrawCommand::Line {
                from,
                to,
                pen: *pen,
            });
        }
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
        if !text.is_empty() {
            self.push(DrawCommand::Text {
                text: text.to_string(),
                font: font.clone(),
                color,
                rect,
                format: *format,
            });
        }
        Ok(())
    }

    fn draw_image(&mut self, image: &Arc<SourceImage>, rect: Rect) -> Result<(), DrawError> {
        check_image_rect(rect)?;
        self.push(DrawCommand::Image {
            rect,
            image: Arc::clone(image),
        });
        Ok(())
    }

    fn translate(&mut self, dx: i32, dy: i32) {
        self.push(DrawCommand::Translate { dx, dy });
    }

    fn rotate(&mut self, degrees: f64) {
        self.push(DrawCommand::Rotate { degrees });
    }

    fn reset_transform(&mut self) {
        self.push(DrawCommand::ResetTransform);
    }
}
