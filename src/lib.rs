//! # Pagewright
//!
//! A multi-pass report paginator.
//!
//! A report is a design surface of positioned fields (text, labels,
//! vertical labels, images, tables) grouped into sections. Pagewright
//! reflows it across fixed-size pages: text that does not fit carries over
//! to the next page, tables split by columns and by rows, and repeating
//! sections (headers, footers) are drawn on every page.
//!
//! Page numbers need the total before anything is drawn, so every job runs
//! twice: a silent discovery pass counts pages, then the real pass prints
//! them with `[pn]` / `[pc]` resolved.
//!
//! ## Architecture
//!
//! ```text
//! Input (JSON)
//!       ↓
//!   [model]     Report, sections, fields, page settings
//!       ↓
//!   [job]       Two-pass print loop, stages, scaling
//!       ↓
//!   [printer]   Per-kind reflow: text, vertical label, image, table
//!       ↓
//!   [surface]   Measure + draw primitives, recorded per page
//!       ↓
//!   [pdf]       Serialize recorded pages to PDF bytes
//! ```

pub mod error;
pub mod font;
pub mod geometry;
pub mod image_loader;
pub mod job;
pub mod model;
pub mod pdf;
pub mod printer;
pub mod style;
pub mod surface;
pub mod text;

pub use error::{DrawError, PaginateError};
pub use job::PrintJob;
pub use model::Report;

use font::FontContext;
use pdf::PdfWriter;
use surface::{RecordedPage, RecordingSurface};

/// Paginate a report and return what was drawn on each page.
pub fn render(report: &Report) -> Result<Vec<RecordedPage>, PaginateError> {
    let (_, pages) = render_with_fonts(report, FontContext::new())?;
    Ok(pages)
}

/// Paginate with a caller-supplied font context, e.g. one with custom
/// fonts registered. Returns the context alongside the pages so it can be
/// handed on to the PDF writer.
pub fn render_with_fonts(
    report: &Report,
    fonts: FontContext,
) -> Result<(FontContext, Vec<RecordedPage>), PaginateError> {
    let page_size = report.page.bounds().size();
    let mut surface = RecordingSurface::new(fonts, page_size);
    let mut job = PrintJob::new(report);

    job.begin_print(&surface)?;
    loop {
        job.query_page_settings(&report.page);
        surface.begin_page(job.settings().bounds().size());
        if !job.print_page(&mut surface)? {
            break;
        }
    }
    job.end_print()?;

    Ok(surface.into_parts())
}

/// Render a report to PDF bytes.
///
/// This is the primary entry point.
pub fn render_pdf(report: &Report) -> Result<Vec<u8>, PaginateError> {
    let (fonts, pages) = render_with_fonts(report, FontContext::new())?;
    Ok(PdfWriter::new().write(&pages, &fonts))
}

/// Render a report described as JSON to PDF bytes.
pub fn render_json(json: &str) -> Result<Vec<u8>, PaginateError> {
    let report = Report::from_json(json)?;
    render_pdf(&report)
}
