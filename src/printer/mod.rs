//! # Field Printers
//!
//! One printer per field kind. A printer draws as much of its field as
//! fits into the rectangle it is given and reports whether the field is
//! drained: `Ok(true)` removes the field from the pending queue, `Ok(false)`
//! keeps it for the next page. Overflow is never an error.
//!
//! Printers own the reflow cursor of one field (remaining text, table
//! position) and nothing else. Everything shared across fields comes in
//! through [`PrintContext`].

pub mod image;
pub mod table;
pub mod text;
pub mod vertical;

use crate::error::PaginateError;
use crate::geometry::Rect;
use crate::model::{Field, FieldKind};
use crate::surface::Surface;

pub use self::image::{fit_image_size, ImagePrinter};
pub use self::table::TablePrinter;
pub use self::text::{TextPrinter, TextVariant};
pub use self::vertical::VerticalLabelPrinter;

/// Read-only print-run state handed to every printer call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PrintContext {
    /// 1-based physical page number.
    pub current_page: usize,
    /// Total pages. Zero while the discovery pass is still counting, so
    /// `[pc]` renders as `0` there. A page-number field whose fit depends
    /// on the width of the total can therefore break differently in the
    /// two passes; the real pass then reports `PageCountMismatch`.
    pub page_count: usize,
    pub scale_x: f64,
    pub scale_y: f64,
    /// Vertical margin for images that do not set their own.
    pub image_margin: i32,
}

impl Default for PrintContext {
    fn default() -> Self {
        Self {
            current_page: 1,
            page_count: 1,
            scale_x: 1.0,
            scale_y: 1.0,
            image_margin: 4,
        }
    }
}

/// Reflow state for one field, selected by its kind.
#[derive(Debug, Clone)]
pub enum FieldPrinter {
    Text(TextPrinter),
    VerticalLabel(VerticalLabelPrinter),
    Image(ImagePrinter),
    Table(TablePrinter),
}

impl FieldPrinter {
    pub fn for_field(field: &Field) -> Self {
        match &field.kind {
            FieldKind::Text(_) => FieldPrinter::Text(TextPrinter::new(TextVariant::Plain)),
            FieldKind::Label(_) => FieldPrinter::Text(TextPrinter::new(TextVariant::Label)),
            FieldKind::VerticalLabel(_) => FieldPrinter::VerticalLabel(VerticalLabelPrinter::new()),
            FieldKind::Image(_) => FieldPrinter::Image(ImagePrinter),
            FieldKind::Table(_) => FieldPrinter::Table(TablePrinter::new()),
        }
    }

    /// Print `field` into `bounds` (page space).
    pub fn print(
        &mut self,
        field: &Field,
        surface: &mut dyn Surface,
        bounds: Rect,
        ctx: &PrintContext,
    ) -> Result<bool, PaginateError> {
        match (self, &field.kind) {
            (FieldPrinter::Text(p), FieldKind::Text(content) | FieldKind::Label(content)) => {
                p.print(field, content, surface, bounds, ctx)
            }
            (FieldPrinter::VerticalLabel(p), FieldKind::VerticalLabel(content)) => {
                p.print(field, content, surface, bounds, ctx)
            }
            (FieldPrinter::Image(p), FieldKind::Image(content)) => {
                p.print(field, content, surface, bounds, ctx)
            }
            (FieldPrinter::Table(p), FieldKind::Table(content)) => {
                p.print(field, content, surface, bounds, ctx)
            }
            (printer, _) => {
                // Field kinds never change during a job; rebuild if they did
                *printer = FieldPrinter::for_field(field);
                printer.print(field, surface, bounds, ctx)
            }
        }
    }
}
