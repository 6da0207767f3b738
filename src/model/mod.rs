//! # Report Model
//!
//! The input to the paginator: a report surface made of sections, each
//! holding positioned fields. Everything here is plain data, deserialized
//! from JSON with serde. Pagination never mutates it; all reflow state of
//! a print run lives in [`crate::job::PrintJob`].
//!
//! Coordinates are integer device units. On the paper side these are PDF
//! points (1/72 inch); on the design side they are whatever unit the
//! report was drawn in, and [`crate::job`] scales between the two.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::PaginateError;
use crate::geometry::{Alignment, HAlign, Point, Rect};
use crate::image_loader::{self, SourceImage};
use crate::style::{Color, Font, Pen};

fn default_true() -> bool {
    true
}

/// A complete report: the design surface plus the paper it prints on.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    /// Logical width of the design surface.
    pub width: i32,
    /// Logical height of the design surface.
    pub height: i32,

    /// Scale into the paper minus its margins instead of the full sheet,
    /// and offset every field by the left/top margin.
    #[serde(default)]
    pub margin_bounds: bool,

    #[serde(default)]
    pub page: PageSettings,

    #[serde(default)]
    pub sections: Vec<Section>,

    #[serde(default)]
    pub options: JobOptions,
}

impl Report {
    /// Parse a report and load every image it references.
    pub fn from_json(json: &str) -> Result<Self, PaginateError> {
        let mut report: Report = serde_json::from_str(json)?;
        report.load_images()?;
        Ok(report)
    }

    /// Resolve `src` of every image field that has not been loaded yet.
    pub fn load_images(&mut self) -> Result<(), PaginateError> {
        for section in &mut self.sections {
            for field in &mut section.fields {
                if let FieldKind::Image(content) = &mut field.kind {
                    if content.image.is_none() {
                        if let Some(src) = &content.src {
                            content.image = Some(Arc::new(image_loader::load_image(src)?));
                        }
                    }
                }
            }
        }
        Ok(())
    }

    /// Look up a field by id.
    pub fn field(&self, id: FieldId) -> Option<&Field> {
        self.sections.get(id.section)?.fields.get(id.field)
    }
}

/// Settings that control pagination itself rather than what is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct JobOptions {
    /// Upper bound on pages in one pass. Content that can never drain
    /// (e.g. a page-number text field in a normal section) stops here.
    pub max_pages: usize,
    /// Default vertical margin around aligned images.
    pub image_margin: i32,
}

impl Default for JobOptions {
    fn default() -> Self {
        Self {
            max_pages: 1000,
            image_margin: 4,
        }
    }
}

/// Physical paper description. Sizes are in points.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PageSettings {
    pub size: PageSize,
    pub margins: Edges,
    pub landscape: bool,
}

impl PageSettings {
    /// The full sheet, oriented.
    pub fn bounds(&self) -> Rect {
        let (w, h) = self.size.dimensions();
        let (w, h) = (w.round() as i32, h.round() as i32);
        if self.landscape {
            Rect::new(0, 0, h, w)
        } else {
            Rect::new(0, 0, w, h)
        }
    }

    /// The sheet minus its margins.
    pub fn margin_bounds(&self) -> Rect {
        let b = self.bounds();
        let m = self.margins;
        Rect::new(
            b.x + m.left,
            b.y + m.top,
            b.width - m.horizontal(),
            b.height - m.vertical(),
        )
    }
}

/// Standard page sizes in points (1/72 inch).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum PageSize {
    #[default]
    A4,
    A3,
    A5,
    Letter,
    Legal,
    Tabloid,
    Custom {
        width: f64,
        height: f64,
    },
}

impl PageSize {
    /// Returns (width, height) in points, portrait.
    pub fn dimensions(&self) -> (f64, f64) {
        match self {
            PageSize::A4 => (595.28, 841.89),
            PageSize::A3 => (841.89, 1190.55),
            PageSize::A5 => (419.53, 595.28),
            PageSize::Letter => (612.0, 792.0),
            PageSize::Legal => (612.0, 1008.0),
            PageSize::Tabloid => (792.0, 1224.0),
            PageSize::Custom { width, height } => (*width, *height),
        }
    }
}

/// Paper margins in points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Edges {
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
    pub left: i32,
}

impl Default for Edges {
    /// One inch all round.
    fn default() -> Self {
        Self::uniform(72)
    }
}

impl Edges {
    pub fn uniform(v: i32) -> Self {
        Self {
            top: v,
            right: v,
            bottom: v,
            left: v,
        }
    }

    pub fn symmetric(vertical: i32, horizontal: i32) -> Self {
        Self {
            top: vertical,
            right: horizontal,
            bottom: vertical,
            left: horizontal,
        }
    }

    pub fn horizontal(&self) -> i32 {
        self.left + self.right
    }

    pub fn vertical(&self) -> i32 {
        self.top + self.bottom
    }
}

/// Identifies a field within its report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldId {
    pub section: usize,
    pub field: usize,
}

/// A group of fields. Repeating sections (headers, footers) are redrawn on
/// every page; normal sections are consumed across pages.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    #[serde(default)]
    pub repeating: bool,
    /// Added to every field's location.
    #[serde(default)]
    pub offset: Point,
    #[serde(default)]
    pub fields: Vec<Field>,
}

/// Fields sharing a stage index, in print order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stage {
    pub stage_index: i32,
    /// Indices into [`Section::fields`].
    pub fields: Vec<usize>,
}

impl Section {
    /// Group fields by stage index, each group ordered by print index.
    /// Equal keys keep insertion order.
    pub fn stages(&self) -> Vec<Stage> {
        let mut order: Vec<usize> = (0..self.fields.len()).collect();
        order.sort_by_key(|&i| (self.fields[i].stage_index, self.fields[i].print_index));

        let mut stages: Vec<Stage> = Vec::new();
        for i in order {
            let stage_index = self.fields[i].stage_index;
            match stages.last_mut() {
                Some(stage) if stage.stage_index == stage_index => stage.fields.push(i),
                _ => stages.push(Stage {
                    stage_index,
                    fields: vec![i],
                }),
            }
        }
        stages
    }
}

/// A positioned, styled element of the report.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    /// Design-space rectangle, relative to the section.
    pub bounds: Rect,
    #[serde(default)]
    pub stage_index: i32,
    #[serde(default)]
    pub print_index: i32,
    #[serde(default = "default_true")]
    pub scale_horizontal: bool,
    #[serde(default = "default_true")]
    pub scale_vertical: bool,
    /// Draw what fits on the first page and drop the rest.
    #[serde(default)]
    pub one_page_only: bool,
    #[serde(default)]
    pub style: FieldStyle,
    pub kind: FieldKind,
}

impl Field {
    pub fn new(bounds: Rect, kind: FieldKind) -> Self {
        Self {
            bounds,
            stage_index: 0,
            print_index: 0,
            scale_horizontal: true,
            scale_vertical: true,
            one_page_only: false,
            style: FieldStyle::default(),
            kind,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FieldStyle {
    pub align: Alignment,
    pub border: Pen,
    pub back_color: Color,
    pub fore_color: Color,
    pub font: Font,
    pub right_to_left: bool,
}

impl Default for FieldStyle {
    fn default() -> Self {
        Self {
            align: Alignment::TopLeft,
            border: Pen::default(),
            back_color: Color::TRANSPARENT,
            fore_color: Color::BLACK,
            font: Font::default(),
            right_to_left: false,
        }
    }
}

/// What a field shows. Each kind has its own printer.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum FieldKind {
    Text(TextContent),
    Label(TextContent),
    VerticalLabel(TextContent),
    Image(ImageContent),
    Table(TableContent),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TextContent {
    pub text: String,
    /// Substitute `[pn]` / `[pc]` in `text` on every page.
    pub is_page_number: bool,
    pub fit_max_width: bool,
    pub fit_max_height: bool,
}

impl Default for TextContent {
    fn default() -> Self {
        Self {
            text: String::new(),
            is_page_number: false,
            fit_max_width: true,
            fit_max_height: true,
        }
    }
}

impl TextContent {
    pub fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ImageContent {
    /// Data URI, file path or bare base64. See [`image_loader::load_image`].
    pub src: Option<String>,
    #[serde(skip)]
    pub image: Option<Arc<SourceImage>>,
    /// Keep the aspect ratio and only shrink. Otherwise stretch to the bounds.
    pub resize_to_fit: bool,
    /// Overrides [`JobOptions::image_margin`].
    pub margin: Option<i32>,
}

impl ImageContent {
    pub fn with_image(image: SourceImage) -> Self {
        Self {
            image: Some(Arc::new(image)),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TableContent {
    pub columns: Vec<Column>,
    pub rows: Vec<Row>,
    /// Size columns to their widest text instead of the design width.
    pub auto_size: bool,
    /// Print only rows marked `selected`.
    pub print_selection: bool,
    pub fit_max_width: bool,
    pub fit_max_height: bool,
    /// Fixed data row height, 0 to measure.
    pub row_height: i32,
    /// Fixed header height, 0 to measure.
    pub header_height: i32,
    /// Defaults to the field font.
    pub header_font: Option<Font>,
    pub header_color: Color,
    pub header_fore_color: Color,
    pub first_column_align: HAlign,
    pub use_border_style_for_header: bool,
    pub border: Pen,
    pub v_grid: Pen,
    pub h_grid: Pen,
}

impl Default for TableContent {
    fn default() -> Self {
        Self {
            columns: Vec::new(),
            rows: Vec::new(),
            auto_size: false,
            print_selection: false,
            fit_max_width: true,
            fit_max_height: true,
            row_height: 30,
            header_height: 30,
            header_font: None,
            header_color: Color::WHITE,
            header_fore_color: Color::BLACK,
            first_column_align: HAlign::Left,
            use_border_style_for_header: true,
            border: Pen::solid(1),
            v_grid: Pen::solid(1),
            h_grid: Pen::solid(1),
        }
    }
}

impl TableContent {
    /// Rows that take part in printing.
    pub fn visible_rows(&self) -> Vec<&Row> {
        self.rows
            .iter()
            .filter(|row| !self.print_selection || row.selected)
            .collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Column {
    pub text: String,
    pub width: i32,
    pub align: HAlign,
}

impl Column {
    pub fn new(text: &str, width: i32) -> Self {
        Self {
            text: text.to_string(),
            width,
            align: HAlign::Left,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Row {
    pub cells: Vec<Cell>,
    /// Paint the whole row with the row colours instead of per-cell ones.
    pub use_row_style: bool,
    pub back_color: Color,
    pub fore_color: Color,
    pub font: Option<Font>,
    pub selected: bool,
}

impl Default for Row {
    fn default() -> Self {
        Self {
            cells: Vec::new(),
            use_row_style: false,
            back_color: Color::TRANSPARENT,
            fore_color: Color::BLACK,
            font: None,
            selected: false,
        }
    }
}

impl Row {
    pub fn new(cells: &[&str]) -> Self {
        Self {
            cells: cells.iter().map(|text| Cell::new(text)).collect(),
            ..Default::default()
        }
    }
}

/// One table cell. Deserializes from a bare string or a styled object.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(from = "CellRepr")]
pub struct Cell {
    pub text: String,
    pub back_color: Option<Color>,
    pub fore_color: Option<Color>,
    pub font: Option<Font>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CellRepr {
    Plain(String),
    #[serde(rename_all = "camelCase")]
    Styled {
        #[serde(default)]
        text: String,
        #[serde(default)]
        back_color: Option<Color>,
        #[serde(default)]
        fore_color: Option<Color>,
        #[serde(default)]
        font: Option<Font>,
    },
}

impl From<CellRepr> for Cell {
    fn from(repr: CellRepr) -> Self {
        match repr {
            CellRepr::Plain(text) => Cell {
                text,
                ..Default::default()
            },
            CellRepr::Styled {
                text,
                back_color,
                fore_color,
                font,
            } => Cell {
                text,
                back_color,
                fore_color,
                font,
            },
        }
    }
}

impl Cell {
    pub fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_field(stage: i32, print: i32) -> Field {
        let mut f = Field::new(Rect::new(0, 0, 10, 10), FieldKind::Text(TextContent::new("x")));
        f.stage_index = stage;
        f.print_index = print;
        f
    }

    #[test]
    fn stages_group_and_order_fields() {
        let section = Section {
            fields: vec![
                text_field(1, 0),
                text_field(0, 2),
                text_field(0, 1),
                text_field(1, 0),
                text_field(0, 1),
            ],
            ..Default::default()
        };
        let stages = section.stages();
        assert_eq!(
            stages,
            vec![
                Stage {
                    stage_index: 0,
                    fields: vec![2, 4, 1]
                },
                Stage {
                    stage_index: 1,
                    fields: vec![0, 3]
                },
            ]
        );
    }

    #[test]
    fn empty_section_has_no_stages() {
        assert!(Section::default().stages().is_empty());
    }

    #[test]
    fn landscape_swaps_paper_bounds() {
        let mut page = PageSettings {
            size: PageSize::Letter,
            margins: Edges::symmetric(36, 18),
            landscape: false,
        };
        assert_eq!(page.bounds(), Rect::new(0, 0, 612, 792));
        assert_eq!(page.margin_bounds(), Rect::new(18, 36, 576, 720));
        page.landscape = true;
        assert_eq!(page.bounds(), Rect::new(0, 0, 792, 612));
    }

    #[test]
    fn report_json_defaults() {
        let report = Report::from_json(
            r##"{
                "width": 400, "height": 600,
                "sections": [{
                    "repeating": true,
                    "fields": [{
                        "bounds": { "x": 1, "y": 2, "width": 30, "height": 40 },
                        "kind": { "type": "label", "text": "Title" }
                    }, {
                        "bounds": { "x": 0, "y": 50, "width": 300, "height": 100 },
                        "kind": {
                            "type": "table",
                            "columns": [{ "text": "Name", "width": 100 }],
                            "rows": [{ "cells": ["Ada", { "text": "x", "backColor": "#ff0000" }] }]
                        }
                    }]
                }]
            }"##,
        )
        .unwrap();
        assert_eq!(report.page.size, PageSize::A4);
        assert_eq!(report.options, JobOptions::default());
        let section = &report.sections[0];
        assert!(section.repeating);
        let label = &section.fields[0];
        assert!(label.scale_horizontal && label.scale_vertical && !label.one_page_only);
        match &label.kind {
            FieldKind::Label(t) => {
                assert_eq!(t.text, "Title");
                assert!(t.fit_max_width && t.fit_max_height && !t.is_page_number);
            }
            other => panic!("expected label, got {other:?}"),
        }
        match &section.fields[1].kind {
            FieldKind::Table(t) => {
                assert_eq!(t.row_height, 30);
                assert_eq!(t.header_color, Color::WHITE);
                assert_eq!(t.border, Pen::solid(1));
                assert_eq!(t.rows[0].cells[0].text, "Ada");
                assert_eq!(t.rows[0].cells[1].back_color, Some(Color::rgb(1.0, 0.0, 0.0)));
            }
            other => panic!("expected table, got {other:?}"),
        }
    }

    #[test]
    fn bad_image_source_is_a_load_error() {
        let err = Report::from_json(
            r#"{ "width": 10, "height": 10, "sections": [{ "fields": [{
                "bounds": { "x": 0, "y": 0, "width": 5, "height": 5 },
                "kind": { "type": "image", "src": "data:image/png;base64" }
            }] }] }"#,
        )
        .unwrap_err();
        assert!(matches!(err, PaginateError::Image(_)));
    }

    #[test]
    fn print_selection_filters_rows() {
        let mut table = TableContent {
            rows: vec![Row::new(&["a"]), Row::new(&["b"])],
            ..Default::default()
        };
        table.rows[1].selected = true;
        assert_eq!(table.visible_rows().len(), 2);
        table.print_selection = true;
        let rows = table.visible_rows();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].cells[0].text, "b");
    }
}
