//! Image printer. Images are never split, so this always completes.

use crate::error::PaginateError;
use crate::geometry::{aligned_rect, Rect, Size};
use crate::model::{Field, ImageContent};
use crate::surface::Surface;

use super::PrintContext;

fn rounded(v: f64) -> i32 {
    v.round_ties_even() as i32
}

/// Shrink `source` to fit within `max`, keeping its aspect ratio.
///
/// When both sides overflow, the side that overflows by more units decides
/// the ratio. Equal overflow gives a square of the larger limit. Images
/// that already fit are returned unchanged; nothing is ever enlarged.
pub fn fit_image_size(source: Size, max: Size) -> Size {
    let (w, h) = (source.width, source.height);
    let dw = w - max.width;
    let dh = h - max.height;
    let by_width = || Size::new(max.width, rounded(max.width as f64 / w as f64 * h as f64));
    let by_height = || Size::new(rounded(max.height as f64 / h as f64 * w as f64), max.height);

    let fitted = if dw > 0 && dh > 0 {
        if dw > dh {
            by_width()
        } else if dh > dw {
            by_height()
        } else {
            let side = max.width.max(max.height);
            Size::new(side, side)
        }
    } else if dw > 0 {
        by_width()
    } else if dh > 0 {
        by_height()
    } else {
        return source;
    };
    Size::new(fitted.width.max(1), fitted.height.max(1))
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ImagePrinter;

impl ImagePrinter {
    pub fn print(
        &mut self,
        field: &Field,
        content: &ImageContent,
        surface: &mut dyn Surface,
        bounds: Rect,
        ctx: &PrintContext,
    ) -> Result<bool, PaginateError> {
        let Some(image) = &content.image else {
            return Ok(true);
        };

        let size = if content.resize_to_fit {
            let source = Size::new(
                i32::try_from(image.width).unwrap_or(i32::MAX),
                i32::try_from(image.height).unwrap_or(i32::MAX),
            );
            fit_image_size(source, bounds.size())
        } else {
            Size::new(bounds.width.max(1), bounds.height.max(1))
        };

        let margin = content.margin.unwrap_or(ctx.image_margin);
        let rect = aligned_rect(size, bounds, field.style.align, margin, 0);
        surface.draw_image(image, rect)?;

        if field.style.border.is_visible() {
            surface.stroke_rect(rect, &field.style.border)?;
        }
        log::trace!("image {}x{} placed at {rect:?}", image.width, image.height);
        Ok(true)
    }
}
