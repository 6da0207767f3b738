//! # Print Job
//!
//! Drives a report through a host print loop:
//!
//! ```text
//! begin_print ─► (query_page_settings ─► print_page)* ─► end_print
//! ```
//!
//! [`PrintJob::begin_print`] runs a silent discovery pass over a
//! measure-only view of the host surface to count pages, so page-number
//! fields know the total before the first real page is drawn. Both passes
//! run the same code; only the surface and `page_count` differ.
//!
//! Each section keeps a working copy: its stages, each holding the fields
//! still pending. Fields leave the copy once their printer reports them
//! drained. A stage with pending fields holds back the later stages of its
//! section. Repeating sections (headers, footers) get a fresh copy every
//! time their last section drains; normal sections are consumed once.

use std::collections::HashMap;

use crate::error::PaginateError;
use crate::geometry::{scale_rect, Point, Rect, Size};
use crate::model::{FieldId, PageSettings, Report, Section};
use crate::printer::{FieldPrinter, PrintContext};
use crate::surface::{MeasureOnly, Surface};

/// Pending fields of one section, grouped by stage in print order.
#[derive(Debug, Clone, PartialEq)]
struct WorkingSection {
    section: usize,
    stages: Vec<Vec<usize>>,
}

fn working_copies(report: &Report, repeating: bool) -> Vec<WorkingSection> {
    report
        .sections
        .iter()
        .enumerate()
        .filter(|(_, s)| s.repeating == repeating)
        .map(|(section, s)| WorkingSection {
            section,
            stages: s.stages().into_iter().map(|stage| stage.fields).collect(),
        })
        .collect()
}

/// Maps design rectangles onto the page.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Placement {
    scale_x: f64,
    scale_y: f64,
    /// Left/top paper margin when fields are placed inside the margins.
    origin: Point,
}

impl Placement {
    fn field_rect(&self, section: &Section, bounds: Rect, scale_h: bool, scale_v: bool) -> Rect {
        let design = bounds.offset(section.offset.x, section.offset.y);
        let sx = if scale_h { self.scale_x } else { 1.0 };
        let sy = if scale_v { self.scale_y } else { 1.0 };
        scale_rect(design, sx, sy).offset(self.origin.x, self.origin.y)
    }
}

fn ratio(design: i32, paper: i32) -> f64 {
    if paper <= 0 || design <= 0 {
        log::warn!("degenerate scale {design}/{paper}, printing unscaled");
        return 1.0;
    }
    design as f64 / paper as f64
}

/// One print run over a borrowed report. All reflow state lives here, so
/// independent jobs over the same report never interfere.
pub struct PrintJob<'r> {
    report: &'r Report,
    settings: PageSettings,
    /// Design size used for scaling, after the landscape adjustment.
    design: Size,
    scale: (f64, f64),
    current_page: usize,
    page_count: usize,
    started: bool,
    printers: HashMap<FieldId, FieldPrinter>,
    repeating: Vec<WorkingSection>,
    normal: Vec<WorkingSection>,
}

impl<'r> PrintJob<'r> {
    pub fn new(report: &'r Report) -> Self {
        Self {
            report,
            settings: report.page,
            design: Size::new(report.width, report.height),
            scale: (1.0, 1.0),
            current_page: 0,
            page_count: 0,
            started: false,
            printers: HashMap::new(),
            repeating: Vec::new(),
            normal: Vec::new(),
        }
    }

    /// Pages counted by the discovery pass.
    pub fn page_count(&self) -> usize {
        self.page_count
    }

    /// Pages printed so far in the current pass.
    pub fn current_page(&self) -> usize {
        self.current_page
    }

    /// Design units per paper unit, `(x, y)`.
    pub fn scale(&self) -> (f64, f64) {
        self.scale
    }

    pub fn settings(&self) -> &PageSettings {
        &self.settings
    }

    /// Normal-section fields still waiting to be printed.
    pub fn pending_fields(&self) -> Vec<FieldId> {
        self.normal
            .iter()
            .flat_map(|ws| {
                ws.stages.iter().flatten().map(move |&field| FieldId {
                    section: ws.section,
                    field,
                })
            })
            .collect()
    }

    /// Page rectangle of a field under the current scale.
    pub fn field_rect(&self, id: FieldId) -> Option<Rect> {
        let section = self.report.sections.get(id.section)?;
        let field = section.fields.get(id.field)?;
        Some(self.placement().field_rect(
            section,
            field.bounds,
            field.scale_horizontal,
            field.scale_vertical,
        ))
    }

    fn placement(&self) -> Placement {
        let origin = if self.report.margin_bounds {
            Point::new(self.settings.margins.left, self.settings.margins.top)
        } else {
            Point::new(0, 0)
        };
        Placement {
            scale_x: self.scale.0,
            scale_y: self.scale.1,
            origin,
        }
    }

    fn rescale(&mut self) {
        let printable = if self.report.margin_bounds {
            self.settings.margin_bounds()
        } else {
            self.settings.bounds()
        };
        self.scale = (
            ratio(self.design.width, printable.width),
            ratio(self.design.height, printable.height),
        );
        log::debug!(
            "scale {:.4} x {:.4} (design {}x{}, printable {}x{})",
            self.scale.0,
            self.scale.1,
            self.design.width,
            self.design.height,
            printable.width,
            printable.height
        );
    }

    fn reset(&mut self) {
        self.current_page = 0;
        self.printers.clear();
        self.repeating = working_copies(self.report, true);
        self.normal = working_copies(self.report, false);
    }

    /// Compute the scale, count pages on a measure-only view of `host`,
    /// then rewind everything for the real pass.
    pub fn begin_print(&mut self, host: &dyn Surface) -> Result<(), PaginateError> {
        self.design = Size::new(self.report.width, self.report.height);
        if self.settings.landscape {
            // Kept as the width := height behaviour existing layouts rely on
            self.design.width = self.report.height;
        }
        self.rescale();

        self.reset();
        self.page_count = 0;
        self.started = true;

        let limit = self.report.options.max_pages;
        let mut discovery = MeasureOnly::new(host);
        let mut pages = 0;
        loop {
            pages += 1;
            if pages > limit {
                self.started = false;
                return Err(PaginateError::PageLimit { limit });
            }
            if !self.print_next(&mut discovery)? {
                break;
            }
        }
        log::debug!("discovery pass counted {pages} page(s)");

        self.page_count = pages;
        self.reset();
        Ok(())
    }

    /// The host is about to print the next page with `settings`.
    pub fn query_page_settings(&mut self, settings: &PageSettings) {
        self.settings = *settings;
        self.rescale();
    }

    /// Print the next physical page. Returns whether another page follows.
    pub fn print_page(&mut self, surface: &mut dyn Surface) -> Result<bool, PaginateError> {
        if !self.started {
            return Err(PaginateError::NotStarted);
        }
        if self.current_page >= self.page_count {
            log::error!(
                "page {} requested but discovery counted {}",
                self.current_page + 1,
                self.page_count
            );
            return Err(PaginateError::PageCountMismatch {
                discovered: self.page_count,
                printed: self.current_page + 1,
            });
        }
        self.print_next(surface)
    }

    /// Finish the run. Fails if the real pass printed a different number
    /// of pages than discovery counted.
    pub fn end_print(&mut self) -> Result<(), PaginateError> {
        let printed = self.current_page;
        self.started = false;
        self.printers.clear();
        self.repeating.clear();
        self.normal.clear();
        if printed != self.page_count {
            log::error!(
                "printed {printed} page(s) but discovery counted {}",
                self.page_count
            );
            return Err(PaginateError::PageCountMismatch {
                discovered: self.page_count,
                printed,
            });
        }
        Ok(())
    }

    fn print_next(&mut self, surface: &mut dyn Surface) -> Result<bool, PaginateError> {
        self.current_page += 1;
        let ctx = PrintContext {
            current_page: self.current_page,
            page_count: self.page_count,
            scale_x: self.scale.0,
            scale_y: self.scale.1,
            image_margin: self.report.options.image_margin,
        };
        let placement = self.placement();
        let report = self.report;
        let mut pass = Pass {
            report,
            printers: &mut self.printers,
            surface,
            ctx,
            placement,
        };

        let last_repeating = self.repeating.len().checked_sub(1);
        let mut renew = false;
        for (k, ws) in self.repeating.iter_mut().enumerate() {
            let drained = pass.print_section(ws)?;
            if drained && Some(k) == last_repeating {
                renew = true;
            }
        }
        if renew {
            self.repeating = working_copies(report, true);
        }

        let mut has_more = false;
        for ws in self.normal.iter_mut() {
            if !pass.print_section(ws)? {
                has_more = true;
            }
        }
        log::trace!("page {} done, more={has_more}", self.current_page);
        Ok(has_more)
    }
}

/// Borrowed state for printing one page.
struct Pass<'a, 's> {
    report: &'a Report,
    printers: &'a mut HashMap<FieldId, FieldPrinter>,
    surface: &'a mut (dyn Surface + 's),
    ctx: PrintContext,
    placement: Placement,
}

impl Pass<'_, '_> {
    /// Print the stages of `ws` in order, stopping at the first stage that
    /// still has pending fields. Returns whether every stage drained.
    fn print_section(&mut self, ws: &mut WorkingSection) -> Result<bool, PaginateError> {
        let Some(section) = self.report.sections.get(ws.section) else {
            return Ok(true);
        };
        for stage in ws.stages.iter_mut() {
            self.print_stage(ws.section, section, stage)?;
            if !stage.is_empty() {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn print_stage(
        &mut self,
        section_index: usize,
        section: &Section,
        pending: &mut Vec<usize>,
    ) -> Result<(), PaginateError> {
        let mut i = pending.len();
        while i > 0 {
            i -= 1;
            let index = pending[i];
            let Some(field) = section.fields.get(index) else {
                pending.remove(i);
                continue;
            };
            let id = FieldId {
                section: section_index,
                field: index,
            };
            let rect = self.placement.field_rect(
                section,
                field.bounds,
                field.scale_horizontal,
                field.scale_vertical,
            );
            let printer = self
                .printers
                .entry(id)
                .or_insert_with(|| FieldPrinter::for_field(field));
            if printer.print(field, &mut *self.surface, rect, &self.ctx)? {
                pending.remove(i);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Edges, Field, FieldKind, PageSize, TextContent};
    use crate::surface::testing::ScriptedSurface;

    fn settings(width: f64, height: f64) -> PageSettings {
        PageSettings {
            size: PageSize::Custom { width, height },
            margins: Edges::uniform(0),
            landscape: false,
        }
    }

    fn text(bounds: Rect, s: &str, stage: i32, print: i32) -> Field {
        let mut f = Field::new(bounds, FieldKind::Text(TextContent::new(s)));
        f.stage_index = stage;
        f.print_index = print;
        f
    }

    fn label(bounds: Rect, s: &str) -> Field {
        Field::new(bounds, FieldKind::Label(TextContent::new(s)))
    }

    fn report(sections: Vec<Section>) -> Report {
        Report {
            width: 200,
            height: 100,
            margin_bounds: false,
            page: settings(200.0, 100.0),
            sections,
            options: Default::default(),
        }
    }

    fn section(repeating: bool, fields: Vec<Field>) -> Section {
        Section {
            repeating,
            offset: Point::new(0, 0),
            fields,
        }
    }

    /// Run a whole job and return the text drawn on each page.
    fn run(report: &Report) -> Vec<Vec<String>> {
        let mut job = PrintJob::new(report);
        let mut surface = ScriptedSurface::new();
        job.begin_print(&surface).unwrap();
        let mut pages = Vec::new();
        loop {
            job.query_page_settings(&report.page);
            surface.clear();
            let more = job.print_page(&mut surface).unwrap();
            pages.push(surface.texts().iter().map(|s| s.to_string()).collect());
            if !more {
                break;
            }
        }
        job.end_print().unwrap();
        pages
    }

    #[test]
    fn scale_uses_the_printable_area() {
        let mut r = report(vec![]);
        r.width = 400;
        r.height = 150;
        let mut job = PrintJob::new(&r);
        job.begin_print(&ScriptedSurface::new()).unwrap();
        assert_eq!(job.scale(), (2.0, 1.5));

        let mut r = r.clone();
        r.margin_bounds = true;
        r.page.margins = Edges::symmetric(25, 50);
        let mut job = PrintJob::new(&r);
        job.begin_print(&ScriptedSurface::new()).unwrap();
        // printable 100 x 50
        assert_eq!(job.scale(), (4.0, 3.0));
    }

    #[test]
    fn landscape_scales_width_by_the_design_height() {
        let mut r = report(vec![]);
        r.width = 300;
        r.height = 100;
        r.page = settings(100.0, 200.0);
        r.page.landscape = true;
        let mut job = PrintJob::new(&r);
        job.begin_print(&ScriptedSurface::new()).unwrap();
        // landscape paper is 200 x 100; the design width counts as 100
        assert_eq!(job.scale(), (0.5, 1.0));
    }

    #[test]
    fn field_rect_scales_opted_in_axes_and_adds_margins() {
        let mut f = label(Rect::new(20, 10, 40, 20), "x");
        f.scale_vertical = false;
        let mut s = section(false, vec![f]);
        s.offset = Point::new(20, 0);
        let mut r = report(vec![s]);
        r.width = 400;
        r.height = 200;
        r.margin_bounds = true;
        r.page = settings(220.0, 120.0);
        r.page.margins = Edges::uniform(10);
        let mut job = PrintJob::new(&r);
        job.begin_print(&ScriptedSurface::new()).unwrap();
        let rect = job.field_rect(FieldId { section: 0, field: 0 }).unwrap();
        // (40, 10, 40, 20) scaled by (2, 1) then moved by the margin
        assert_eq!(rect, Rect::new(30, 20, 20, 20));
    }

    #[test]
    fn discovery_counts_pages_and_real_pass_matches() {
        // 20 glyphs per line, one line per page
        let long = "aaaa bbbb cccc dddd eeee ffff";
        let r = report(vec![section(false, vec![text(Rect::new(0, 0, 100, 20), long, 0, 0)])]);
        let mut job = PrintJob::new(&r);
        job.begin_print(&ScriptedSurface::new()).unwrap();
        assert_eq!(job.page_count(), 3);
        assert_eq!(job.current_page(), 0);

        let pages = run(&r);
        assert_eq!(
            pages,
            vec![
                vec!["aaaa bbbb "],
                vec!["cccc dddd "],
                vec!["eeee ffff"]
            ]
        );
    }

    #[test]
    fn discovery_is_repeatable() {
        let r = report(vec![section(
            false,
            vec![text(Rect::new(0, 0, 100, 20), "aaaa bbbb cccc", 0, 0)],
        )]);
        let mut job = PrintJob::new(&r);
        let host = ScriptedSurface::new();
        job.begin_print(&host).unwrap();
        let first = job.page_count();
        job.begin_print(&host).unwrap();
        assert_eq!(job.page_count(), first);
        assert_eq!(job.pending_fields(), vec![FieldId { section: 0, field: 0 }]);
        assert!(host.commands.is_empty());
    }

    #[test]
    fn later_stages_wait_for_earlier_ones() {
        let r = report(vec![section(
            false,
            vec![
                text(Rect::new(0, 40, 100, 20), "late", 1, 0),
                text(Rect::new(0, 0, 100, 20), "aaaa bbbb cccc", 0, 0),
            ],
        )]);
        let pages = run(&r);
        assert_eq!(pages, vec![vec!["aaaa bbbb "], vec!["cccc", "late"]]);
    }

    #[test]
    fn fields_in_a_stage_print_in_reverse_print_order() {
        let r = report(vec![section(
            false,
            vec![
                text(Rect::new(0, 0, 100, 20), "first", 0, 0),
                text(Rect::new(0, 20, 100, 20), "second", 0, 1),
            ],
        )]);
        assert_eq!(run(&r), vec![vec!["second", "first"]]);
    }

    #[test]
    fn repeating_sections_renew_every_page() {
        let r = report(vec![
            section(true, vec![label(Rect::new(0, 80, 100, 20), "header")]),
            section(
                false,
                vec![text(Rect::new(0, 0, 100, 20), "aaaa bbbb cccc", 0, 0)],
            ),
        ]);
        let pages = run(&r);
        assert_eq!(pages.len(), 2);
        assert!(pages.iter().all(|p| p[0] == "header"));
    }

    #[test]
    fn page_number_labels_see_the_total() {
        let mut footer = TextContent::new("Page [pn] of [pc]");
        footer.is_page_number = true;
        let footer = Field::new(Rect::new(0, 80, 200, 20), FieldKind::Label(footer));
        let body = "aaaa bbbb cccc dddd eeee ffff gggg hhhh iiii jjjj";
        let r = report(vec![
            section(true, vec![footer]),
            section(false, vec![text(Rect::new(0, 0, 100, 20), body, 0, 0)]),
        ]);
        let pages = run(&r);
        assert_eq!(pages.len(), 5);
        assert_eq!(pages[1][0], "Page 2 of 5");
        assert_eq!(pages[4][0], "Page 5 of 5");
    }

    #[test]
    fn undrainable_content_hits_the_page_limit() {
        let mut content = TextContent::new("[pn]");
        content.is_page_number = true;
        let f = Field::new(Rect::new(0, 0, 100, 20), FieldKind::Text(content));
        let mut r = report(vec![section(false, vec![f])]);
        r.options.max_pages = 5;
        let mut job = PrintJob::new(&r);
        let err = job.begin_print(&ScriptedSurface::new()).unwrap_err();
        assert!(matches!(err, PaginateError::PageLimit { limit: 5 }));
    }

    #[test]
    fn protocol_violations_are_errors() {
        let r = report(vec![section(false, vec![label(Rect::new(0, 0, 100, 20), "x")])]);
        let mut job = PrintJob::new(&r);
        let mut s = ScriptedSurface::new();
        assert!(matches!(job.print_page(&mut s), Err(PaginateError::NotStarted)));

        job.begin_print(&s).unwrap();
        assert!(!job.print_page(&mut s).unwrap());
        assert!(matches!(
            job.print_page(&mut s),
            Err(PaginateError::PageCountMismatch { discovered: 1, printed: 2 })
        ));

        job.begin_print(&s).unwrap();
        assert!(matches!(
            job.end_print(),
            Err(PaginateError::PageCountMismatch { discovered: 1, printed: 0 })
        ));
    }

    #[test]
    fn empty_report_prints_one_blank_page() {
        let r = report(vec![]);
        assert_eq!(run(&r), vec![Vec::<String>::new()]);
    }
}
