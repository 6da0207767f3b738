//! # Drawing Surfaces
//!
//! The paginator never talks to a concrete backend. Printers measure and
//! draw through the [`Surface`] trait, in device units with y growing
//! downward.
//!
//! Two implementations ship with the crate: [`RecordingSurface`], which
//! measures with real font metrics and keeps a list of draw commands per
//! page (the PDF writer consumes these), and [`MeasureOnly`], which wraps
//! any surface for the silent discovery pass.

pub mod recording;
#[cfg(test)]
pub(crate) mod testing;

use std::sync::Arc;

use serde::Serialize;

use crate::error::DrawError;
use crate::geometry::{Alignment, Point, Rect, Size};
use crate::image_loader::SourceImage;
use crate::style::{Color, Font, Pen};

pub use recording::{DrawCommand, RecordedPage, RecordingSurface};

/// How a string is laid out inside its rectangle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TextFormat {
    pub align: Alignment,
    /// Right-to-left reading order.
    pub rtl: bool,
}

impl TextFormat {
    pub fn new(align: Alignment, rtl: bool) -> Self {
        Self { align, rtl }
    }
}

/// Result of a word-trimmed measurement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MeasuredText {
    /// Characters (not bytes) that fit.
    pub chars_fitted: usize,
    pub lines: usize,
    /// Tight size of the fitted text.
    pub size: Size,
    /// Height of a single line in this font.
    pub line_height: i32,
}

/// Measurement and drawing primitives consumed by the printers.
pub trait Surface {
    /// Fit as much of `text` as possible into `bounds`, breaking only at
    /// word boundaries.
    fn measure_text(&self, text: &str, font: &Font, bounds: Size, format: &TextFormat)
        -> MeasuredText;

    fn fill_rect(&mut self, rect: Rect, color: Color) -> Result<(), DrawError>;

    fn stroke_rect(&mut self, rect: Rect, pen: &Pen) -> Result<(), DrawError>;

    fn draw_line(&mut self, from: Point, to: Point, pen: &Pen) -> Result<(), DrawError>;

    /// Draw `text` wrapped inside `rect`.
    fn draw_text(
        &mut self,
        text: &str,
        font: &Font,
        color: Color,
        rect: Rect,
        format: &TextFormat,
    ) -> Result<(), DrawError>;

    /// Draw `image` stretched to `rect`.
    fn draw_image(&mut self, image: &Arc<SourceImage>, rect: Rect) -> Result<(), DrawError>;

    fn translate(&mut self, dx: i32, dy: i32);

    /// Rotate the coordinate system clockwise by `degrees`.
    fn rotate(&mut self, degrees: f64);

    fn reset_transform(&mut self);
}

/// Draw a string, logging and swallowing any failure.
///
/// Returns whether the text was drawn.
pub fn draw_text_lossy(
    surface: &mut dyn Surface,
    text: &str,
    font: &Font,
    color: Color,
    rect: Rect,
    format: &TextFormat,
) -> bool {
    match surface.draw_text(text, font, color, rect, format) {
        Ok(()) => true,
        Err(e) => {
            log::warn!("skipping text at {rect:?}: {e}");
            false
        }
    }
}

/// Images cannot be drawn into an empty rectangle.
pub(crate) fn check_image_rect(rect: Rect) -> Result<(), DrawError> {
    if rect.width <= 0 || rect.height <= 0 {
        return Err(DrawError::Backend(format!(
            "cannot draw an image into an empty rectangle {rect:?}"
        )));
    }
    Ok(())
}

/// A surface that measures like `inner` and draws nothing. Image
/// placement is still checked, so both print passes fail alike.
pub struct MeasureOnly<'a> {
    inner: &'a dyn Surface,
}

impl<'a> MeasureOnly<'a> {
    pub fn new(inner: &'a dyn Surface) -> Self {
        Self { inner }
    }
}

impl Surface for MeasureOnly<'_> {
    fn measure_text(
        &self,
        text: &str,
        font: &Font,
        bounds: Size,
        format: &TextFormat,
    ) -> MeasuredText {
        self.inner.measure_text(text, font, bounds, format)
    }

    fn fill_rect(&mut self, _rect: Rect, _color: Color) -> Result<(), DrawError> {
        Ok(())
    }

    fn stroke_rect(&mut self, _rect: Rect, _pen: &Pen) -> Result<(), DrawError> {
        Ok(())
    }

    fn draw_line(&mut self, _from: Point, _to: Point, _pen: &Pen) -> Result<(), DrawError> {
        Ok(())
    }

    fn draw_text(
        &mut self,
        _text: &str,
        _font: &Font,
        _color: Color,
        _rect: Rect,
        _format: &TextFormat,
    ) -> Result<(), DrawError> {
        Ok(())
    }

    fn draw_image(&mut self, _image: &Arc<SourceImage>, rect: Rect) -> Result<(), DrawError> {
        check_image_rect(rect)
    }

    fn translate(&mut self, _dx: i32, _dy: i32) {}

    fn rotate(&mut self, _degrees: f64) {}

    fn reset_transform(&mut self) {}
}
