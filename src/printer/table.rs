//! # Table Printer
//!
//! Paginates along two axes at once. Each call prints one block: a span of
//! columns that fits the available width and a span of rows that fits the
//! available height, with the header repeated on top. Column spans advance
//! first; once the last column has been printed the row cursor moves on
//! and the columns start over.
//!
//! ```text
//!   call 1: cols 0..=1, rows 0..=k     call 2: cols 2..=3, rows 0..=k
//!   call 3: cols 0..=1, rows k+1..     ...
//! ```
//!
//! Widths are in device units. The surplus of a wide page is spread over
//! the first column span only, so continuation spans keep their natural
//! widths.

use crate::error::PaginateError;
use crate::geometry::{aligned_rect, Alignment, HAlign, Point, Rect, Size, VAlign};
use crate::model::{Field, Row, TableContent};
use crate::style::{Color, Font};
use crate::surface::{draw_text_lossy, Surface, TextFormat};

use super::PrintContext;

/// Padding applied to measured text widths when auto-sizing columns.
const AUTO_WIDTH_PADDING: f64 = 1.15;
/// Measured header height multiplier.
const HEADER_HEIGHT_FACTOR: f64 = 1.5;
/// Measured data row height multiplier.
const ROW_HEIGHT_FACTOR: f64 = 1.2;

const UNBOUNDED: Size = Size::new(i32::MAX, i32::MAX);

fn rounded(v: f64) -> i32 {
    v.round_ties_even() as i32
}

/// Last column (inclusive) of the span starting at `start` that fits in
/// `available`.
///
/// A table that fits as a whole is always printed in one span. Otherwise
/// columns are added until the running width exceeds `available`, then
/// the overflowing column is dropped again. A span always holds at least
/// one column.
pub fn column_span_end(widths: &[i32], available: i32, start: usize) -> usize {
    let last = widths.len().saturating_sub(1);
    if widths.iter().sum::<i32>() <= available {
        return last;
    }
    let mut used = 0;
    for (i, w) in widths.iter().enumerate().skip(start) {
        used += w;
        if used > available {
            return if i > start { i - 1 } else { start };
        }
    }
    last
}

/// Last row (inclusive) of the span starting at `start`, given the header
/// height, every row's height and the available height.
///
/// When the whole table fits it is taken in one span. Otherwise rows are
/// added while the block stays strictly shorter than `available`, on
/// continuation pages too. A span
/// always holds at least one row. Returns `None` when there are no rows
/// left.
pub fn row_span_end(header: i32, rows: &[i32], available: i32, start: usize) -> Option<usize> {
    if start >= rows.len() {
        return None;
    }
    if header + rows.iter().sum::<i32>() <= available {
        return Some(rows.len() - 1);
    }
    let mut used = header;
    let mut end = start;
    for (i, h) in rows.iter().enumerate().skip(start) {
        if used + h >= available {
            break;
        }
        used += h;
        end = i;
    }
    if end == start && header + rows[start] >= available {
        log::warn!(
            "table row {start} ({} units with header) is taller than the {available} units available",
            header + rows[start]
        );
    }
    Some(end)
}

/// Spread `surplus` over `widths[from..=to]` in proportion to each width.
/// Rounding drift lands on the last column, so the span grows by exactly
/// `surplus`. A span of zero total width gives everything to its last
/// column.
pub fn split_width(widths: &mut [i32], from: usize, to: usize, surplus: i32) {
    let Some(span) = widths.get_mut(from..=to) else {
        return;
    };
    let total: i32 = span.iter().sum();
    if total > 0 {
        for w in span.iter_mut() {
            *w += rounded(surplus as f64 * *w as f64 / total as f64);
        }
    }
    let drift = total + surplus - span.iter().sum::<i32>();
    if let Some(last) = span.last_mut() {
        *last += drift;
    }
}

/// The laid-out block for one call.
struct Block<'a> {
    rect: Rect,
    /// Column indices in drawing order (left to right on the page).
    columns: Vec<usize>,
    widths: Vec<i32>,
    header_height: i32,
    rows: Vec<(&'a Row, i32)>,
}

/// Reflow state of one table field.
#[derive(Debug, Clone, Default)]
pub struct TablePrinter {
    row_cursor: usize,
    column_cursor: usize,
    /// Cursor after the previous call, for the no-progress check.
    last_cursor: Option<(usize, usize)>,
    /// Cursor at which the previous call declined to draw.
    deferred: Option<(usize, usize)>,
}

impl TablePrinter {
    pub fn new() -> Self {
        Self::default()
    }

    /// `(row, column)` the next call resumes at.
    pub fn cursor(&self) -> (usize, usize) {
        (self.row_cursor, self.column_cursor)
    }

    pub fn print(
        &mut self,
        field: &Field,
        content: &TableContent,
        surface: &mut dyn Surface,
        bounds: Rect,
        _ctx: &PrintContext,
    ) -> Result<bool, PaginateError> {
        if content.columns.is_empty() {
            return Ok(true);
        }
        let rows = content.visible_rows();
        let header_font = content.header_font.as_ref().unwrap_or(&field.style.font);
        let last_column = content.columns.len() - 1;

        let mut widths = column_widths(content, &rows, header_font, &field.style.font, surface);
        let from = self.column_cursor.min(last_column);
        let to = column_span_end(&widths, bounds.width, from);

        let header_height = header_height(content, header_font, &widths, from, to, surface);
        let row_heights: Vec<i32> = rows
            .iter()
            .map(|row| row_height(content, row, &field.style.font, &widths, from, to, surface))
            .collect();

        let natural: i32 = widths[from..=to].iter().sum();
        let mut width = natural;
        if content.fit_max_width && from == 0 {
            if bounds.width > natural {
                split_width(&mut widths, from, to, bounds.width - natural);
            }
            width = bounds.width;
        }

        let row_end = row_span_end(header_height, &row_heights, bounds.height, self.row_cursor);
        let drawn_rows: Vec<(&Row, i32)> = match row_end {
            Some(end) => (self.row_cursor..=end)
                .map(|i| (rows[i], row_heights[i]))
                .collect(),
            None => Vec::new(),
        };
        let height = if content.fit_max_height {
            bounds.height
        } else {
            header_height + drawn_rows.iter().map(|(_, h)| h).sum::<i32>()
        };

        let rtl = field.style.right_to_left;
        let mut align = field.style.align;
        if from > 0 {
            let h = if rtl { HAlign::Right } else { HAlign::Left };
            align = Alignment::compose(h, align.vertical());
        }
        let rect = aligned_rect(Size::new(width, height), bounds, align, 0, 0);

        let cursor = self.cursor();
        if rect.bottom() > bounds.bottom() && !field.one_page_only {
            if self.deferred != Some(cursor) {
                log::debug!("table block {rect:?} overflows {bounds:?}, deferring");
                self.deferred = Some(cursor);
                return Ok(false);
            }
            log::warn!("table block {rect:?} cannot fit {bounds:?} on a fresh page, drawing it anyway");
        }
        self.deferred = None;

        let mut columns: Vec<usize> = (from..=to).collect();
        if rtl {
            columns.reverse();
        }
        let block = Block {
            rect,
            columns,
            widths,
            header_height,
            rows: drawn_rows,
        };
        draw_block(surface, field, content, header_font, &block)?;

        self.column_cursor = to + 1;
        if to >= last_column {
            self.column_cursor = 0;
            if let Some(end) = row_end {
                self.row_cursor = end + 1;
            }
        }
        let rows_done = row_end.map_or(true, |end| end + 1 >= rows.len());
        let complete = (rows_done && to >= last_column) || field.one_page_only;
        log::trace!(
            "table printed columns {from}..={to}, rows {:?}..={row_end:?}, complete={complete}",
            cursor.0
        );
        if complete {
            self.row_cursor = 0;
            self.column_cursor = 0;
            self.last_cursor = None;
            return Ok(true);
        }

        if self.last_cursor == Some(self.cursor()) {
            log::warn!("table made no progress at {:?}, dropping the rest", self.cursor());
            self.row_cursor = 0;
            self.column_cursor = 0;
            self.last_cursor = None;
            return Ok(true);
        }
        self.last_cursor = Some(self.cursor());
        Ok(false)
    }
}

fn measure_width(surface: &dyn Surface, text: &str, font: &Font) -> i32 {
    let m = surface.measure_text(text, font, UNBOUNDED, &TextFormat::default());
    rounded(m.size.width as f64 * AUTO_WIDTH_PADDING)
}

fn measure_height(surface: &dyn Surface, text: &str, font: &Font, width: i32) -> i32 {
    let m = surface.measure_text(text, font, Size::new(width, i32::MAX), &TextFormat::default());
    m.size.height.max(m.line_height)
}

fn line_height(surface: &dyn Surface, font: &Font) -> i32 {
    surface
        .measure_text("", font, UNBOUNDED, &TextFormat::default())
        .line_height
}

fn cell_font<'a>(row: &'a Row, index: usize, fallback: &'a Font) -> &'a Font {
    let own = if row.use_row_style {
        None
    } else {
        row.cells.get(index).and_then(|c| c.font.as_ref())
    };
    own.or(row.font.as_ref()).unwrap_or(fallback)
}

fn cell_fore_color(row: &Row, index: usize) -> Color {
    if row.use_row_style {
        return row.fore_color;
    }
    row.cells
        .get(index)
        .and_then(|c| c.fore_color)
        .unwrap_or(row.fore_color)
}

fn column_widths(
    content: &TableContent,
    rows: &[&Row],
    header_font: &Font,
    body_font: &Font,
    surface: &dyn Surface,
) -> Vec<i32> {
    content
        .columns
        .iter()
        .enumerate()
        .map(|(i, column)| {
            if !content.auto_size {
                return column.width;
            }
            let header = measure_width(surface, &column.text, header_font);
            rows.iter()
                .filter_map(|row| {
                    let cell = row.cells.get(i)?;
                    Some(measure_width(surface, &cell.text, cell_font(row, i, body_font)))
                })
                .fold(header, i32::max)
        })
        .collect()
}

fn header_height(
    content: &TableContent,
    font: &Font,
    widths: &[i32],
    from: usize,
    to: usize,
    surface: &dyn Surface,
) -> i32 {
    if content.header_height > 0 {
        return content.header_height;
    }
    let tallest = (from..=to)
        .map(|i| measure_height(surface, &content.columns[i].text, font, widths[i]))
        .max()
        .unwrap_or(0);
    rounded(tallest as f64 * HEADER_HEIGHT_FACTOR)
}

fn row_height(
    content: &TableContent,
    row: &Row,
    body_font: &Font,
    widths: &[i32],
    from: usize,
    to: usize,
    surface: &dyn Surface,
) -> i32 {
    if content.row_height > 0 {
        return content.row_height;
    }
    let tallest = (from..=to)
        .filter_map(|i| {
            let cell = row.cells.get(i)?;
            Some(measure_height(surface, &cell.text, cell_font(row, i, body_font), widths[i]))
        })
        .max()
        .unwrap_or_else(|| line_height(surface, body_font));
    rounded(tallest as f64 * ROW_HEIGHT_FACTOR)
}

fn text_format(content: &TableContent, column: usize, rtl: bool) -> TextFormat {
    let h = if column == 0 {
        content.first_column_align
    } else {
        content.columns[column].align
    };
    TextFormat::new(Alignment::compose(h, VAlign::Middle), rtl)
}

fn draw_block(
    surface: &mut dyn Surface,
    field: &Field,
    content: &TableContent,
    header_font: &Font,
    block: &Block<'_>,
) -> Result<(), PaginateError> {
    let rect = block.rect;
    let header_bottom = rect.y + block.header_height;
    let rtl = field.style.right_to_left;

    surface.fill_rect(
        Rect::new(rect.x, rect.y, rect.width, block.header_height),
        content.header_color,
    )?;

    // Row backgrounds
    let mut y = header_bottom;
    for &(row, h) in &block.rows {
        if h <= 0 {
            continue;
        }
        if row.use_row_style {
            surface.fill_rect(Rect::new(rect.x, y, rect.width, h), row.back_color)?;
        } else {
            let mut x = rect.x;
            for &j in &block.columns {
                let w = block.widths[j];
                if let Some(cell) = row.cells.get(j) {
                    let color = cell.back_color.unwrap_or(Color::TRANSPARENT);
                    surface.fill_rect(Rect::new(x, y, w, h), color)?;
                }
                x += w;
            }
        }
        y += h;
    }

    // Border and the rule under the header
    if content.border.is_visible() {
        surface.stroke_rect(rect, &content.border)?;
        let pen = if content.use_border_style_for_header {
            &content.border
        } else {
            &content.h_grid
        };
        surface.draw_line(
            Point::new(rect.x, header_bottom),
            Point::new(rect.right(), header_bottom),
            pen,
        )?;
    }

    // Vertical grid
    if content.v_grid.is_visible() {
        let mut x = rect.x;
        for &j in &block.columns {
            x += block.widths[j];
            surface.draw_line(Point::new(x, rect.y), Point::new(x, rect.bottom()), &content.v_grid)?;
        }
        if content.use_border_style_for_header && content.border.is_visible() {
            let mut x = rect.x;
            for &j in &block.columns {
                x += block.widths[j];
                surface.draw_line(
                    Point::new(x, rect.y),
                    Point::new(x, header_bottom),
                    &content.border,
                )?;
            }
        }
    }

    // Horizontal grid, then filler rules down to the bottom of the block
    if content.h_grid.is_visible() {
        let mut y = header_bottom;
        for &(_, h) in &block.rows {
            if h <= 0 {
                continue;
            }
            y += h;
            if y < rect.bottom() {
                surface.draw_line(Point::new(rect.x, y), Point::new(rect.right(), y), &content.h_grid)?;
            }
        }
        let step = content.row_height;
        if step > 0 {
            while rect.bottom() - y >= step * 2 {
                y += step;
                surface.draw_line(Point::new(rect.x, y), Point::new(rect.right(), y), &content.h_grid)?;
            }
        }
    }

    // Header text
    let mut x = rect.x;
    for &j in &block.columns {
        let w = block.widths[j];
        draw_text_lossy(
            surface,
            &content.columns[j].text,
            header_font,
            content.header_fore_color,
            Rect::new(x, rect.y, w, block.header_height),
            &text_format(content, j, rtl),
        );
        x += w;
    }

    // Cell text
    let mut y = header_bottom;
    for &(row, h) in &block.rows {
        if h <= 0 {
            continue;
        }
        let mut x = rect.x;
        for &j in &block.columns {
            let w = block.widths[j];
            if let Some(cell) = row.cells.get(j) {
                if !cell.text.is_empty() {
                    draw_text_lossy(
                        surface,
                        &cell.text,
                        cell_font(row, j, &field.style.font),
                        cell_fore_color(row, j),
                        Rect::new(x, y, w, h),
                        &text_format(content, j, rtl),
                    );
                }
            }
            x += w;
        }
        y += h;
    }
    Ok(())
}
