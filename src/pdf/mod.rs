//! # PDF Serializer
//!
//! Writes recorded pages as a PDF 1.7 file.
//!
//! Recorded commands are in device units with y growing downward, so every
//! content stream starts by flipping the page (`1 0 0 -1 0 H cm`) and
//! writes coordinates unchanged. Text matrices flip glyphs back upright.
//!
//! ## PDF Structure (simplified)
//!
//! ```text
//! %PDF-1.7            <- header
//! 1 0 obj ... endobj  <- catalog, page tree, fonts, images, pages
//! ...
//! xref                <- byte offsets of each object
//! trailer             <- points to the root object
//! %%EOF
//! ```
//!
//! Only the standard Type1 fonts are referenced. Registered TrueType fonts
//! are measured with their real metrics but drawn with Helvetica.

use std::collections::HashMap;
use std::fmt::Write as FmtWrite;
use std::io::Write as IoWrite;
use std::sync::Arc;

use miniz_oxide::deflate::compress_to_vec_zlib;
use unicode_bidi::{BidiInfo, Level};

use crate::font::{FontContext, FontData, FontKey, StandardFont};
use crate::geometry::{HAlign, Point, Rect, VAlign};
use crate::image_loader::{ImagePixels, SourceImage};
use crate::style::{Color, Font, Pen};
use crate::surface::{DrawCommand, RecordedPage, TextFormat};
use crate::text::{fit_text, split_at_char};

/// Baseline position within the font size, from the top of the em box.
const ASCENT: f64 = 0.8;

#[derive(Debug, Clone, Copy, Default)]
pub struct PdfWriter;

struct PdfObject {
    data: Vec<u8>,
}

/// Objects shared by every page.
struct Resources {
    fonts: HashMap<FontKey, usize>,
    /// Font object ids in resource order (`/F0`, `/F1`, ...).
    font_objects: Vec<usize>,
    images: Vec<(Arc<SourceImage>, usize)>,
}

impl Resources {
    fn font_index(&self, font: &Font) -> usize {
        self.fonts.get(&font_key(font)).copied().unwrap_or(0)
    }

    fn image_index(&self, image: &Arc<SourceImage>) -> Option<usize> {
        self.images.iter().position(|(known, _)| Arc::ptr_eq(known, image))
    }
}

fn font_key(font: &Font) -> FontKey {
    FontKey {
        family: font.family.clone(),
        weight: if font.is_bold() { 700 } else { 400 },
        italic: font.italic,
    }
}

fn base_font_name(font: StandardFont, italic: bool) -> &'static str {
    match (font, italic) {
        (StandardFont::Helvetica, true) => "Helvetica-Oblique",
        (StandardFont::HelveticaBold, true) => "Helvetica-BoldOblique",
        (StandardFont::Courier, true) => "Courier-Oblique",
        (StandardFont::CourierBold, true) => "Courier-BoldOblique",
        (font, false) => font.pdf_name(),
    }
}

/// Format a number with at most four decimals, integers without any.
fn num(v: f64) -> String {
    if (v - v.round()).abs() < 1e-9 {
        format!("{}", v.round() as i64)
    } else {
        format!("{:.4}", v)
    }
}

/// Encode a string as a WinAnsi PDF literal body. Characters outside
/// Latin-1 become `?`.
fn encode_text(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '(' | ')' | '\\' => {
                out.push('\\');
                out.push(ch);
            }
            c if c.is_ascii() && !c.is_ascii_control() => out.push(c),
            c if (0xA0..0x100).contains(&(c as u32)) => {
                let _ = write!(out, "\\{:03o}", c as u32);
            }
            _ => out.push('?'),
        }
    }
    out
}

/// Reorder a logical line for display.
fn visual_order(text: &str, rtl: bool) -> String {
    let level = if rtl { Some(Level::rtl()) } else { None };
    let info = BidiInfo::new(text, level);
    if !rtl && !info.has_rtl() {
        return text.to_string();
    }
    info.paragraphs
        .iter()
        .map(|para| info.reorder_line(para, para.range.clone()))
        .collect()
}

/// Break `text` into lines no wider than `width` where possible. A word
/// wider than `width` gets a line of its own.
fn layout_lines(fonts: &FontContext, text: &str, font: &Font, width: f64) -> Vec<(String, f64)> {
    let mut lines = Vec::new();
    let mut rest = text;
    while !rest.is_empty() {
        let fit = fit_text(fonts, rest, font, width, f64::INFINITY);
        lines.extend(fit.lines.iter().map(|l| (l.text.clone(), l.width)));
        if fit.chars_fitted > 0 {
            rest = split_at_char(rest, fit.chars_fitted).1;
            continue;
        }
        let first = rest.chars().next().map_or(1, char::len_utf8);
        let end = rest.find(char::is_whitespace).unwrap_or(rest.len()).max(first);
        let (word, after) = rest.split_at(end);
        lines.push((word.to_string(), fonts.measure_string(word, font)));
        let after = after.trim_start_matches([' ', '\t']);
        rest = after
            .strip_prefix("\r\n")
            .or_else(|| after.strip_prefix('\n'))
            .unwrap_or(after);
    }
    lines
}

impl PdfWriter {
    pub fn new() -> Self {
        Self
    }

    /// Write recorded pages to a PDF byte vector.
    pub fn write(&self, pages: &[RecordedPage], fonts: &FontContext) -> Vec<u8> {
        // 0 = placeholder (PDF objects are 1-indexed), 1 = Catalog, 2 = Pages
        let mut objects: Vec<PdfObject> = (0..3).map(|_| PdfObject { data: Vec::new() }).collect();

        let resources = self.register_resources(&mut objects, pages, fonts);

        let mut page_ids = Vec::with_capacity(pages.len());
        for page in pages {
            let content = self.content_stream(page, &resources, fonts);
            let compressed = compress_to_vec_zlib(content.as_bytes(), 6);

            let content_id = objects.len();
            let mut data: Vec<u8> = Vec::new();
            let _ = write!(
                data,
                "<< /Length {} /Filter /FlateDecode >>\nstream\n",
                compressed.len()
            );
            data.extend_from_slice(&compressed);
            data.extend_from_slice(b"\nendstream");
            objects.push(PdfObject { data });

            let font_dict = resources
                .font_objects
                .iter()
                .enumerate()
                .map(|(i, id)| format!("/F{} {} 0 R", i, id))
                .collect::<Vec<_>>()
                .join(" ");
            let xobjects = self.page_images(page, &resources);
            let xobject_dict = if xobjects.is_empty() {
                String::new()
            } else {
                format!(" /XObject << {} >>", xobjects)
            };

            let page_id = objects.len();
            let page_dict = format!(
                "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {} {}] \
                 /Contents {} 0 R /Resources << /Font << {} >>{} >> >>",
                page.size.width, page.size.height, content_id, font_dict, xobject_dict
            );
            objects.push(PdfObject {
                data: page_dict.into_bytes(),
            });
            page_ids.push(page_id);
        }

        objects[1].data = b"<< /Type /Catalog /Pages 2 0 R >>".to_vec();
        let kids = page_ids
            .iter()
            .map(|id| format!("{} 0 R", id))
            .collect::<Vec<_>>()
            .join(" ");
        objects[2].data =
            format!("<< /Type /Pages /Kids [{}] /Count {} >>", kids, page_ids.len()).into_bytes();

        let info_id = objects.len();
        objects.push(PdfObject {
            data: b"<< /Producer (pagewright) /Creator (pagewright) >>".to_vec(),
        });

        log::debug!("pdf: {} page(s), {} object(s)", pages.len(), objects.len() - 1);
        self.serialize(&objects, info_id)
    }

    /// Create font and image objects for everything the pages reference.
    fn register_resources(
        &self,
        objects: &mut Vec<PdfObject>,
        pages: &[RecordedPage],
        fonts: &FontContext,
    ) -> Resources {
        let fallback = Font::default();
        let mut requested: Vec<&Font> = Vec::new();
        let mut images: Vec<(Arc<SourceImage>, usize)> = Vec::new();
        for command in pages.iter().flat_map(|p| &p.commands) {
            match command {
                DrawCommand::Text { font, .. } => requested.push(font),
                DrawCommand::Image { image, .. } => {
                    if !images.iter().any(|(known, _)| Arc::ptr_eq(known, image)) {
                        let id = Self::write_image_xobject(objects, image);
                        images.push((Arc::clone(image), id));
                    }
                }
                _ => {}
            }
        }

        // Deterministic order, Helvetica always present as /F0
        let mut keyed: Vec<(FontKey, &Font)> = requested.into_iter().map(|f| (font_key(f), f)).collect();
        keyed.sort_by(|a, b| {
            a.0.family
                .cmp(&b.0.family)
                .then(a.0.weight.cmp(&b.0.weight))
                .then(a.0.italic.cmp(&b.0.italic))
        });
        keyed.dedup_by(|a, b| a.0 == b.0);
        keyed.insert(0, (font_key(&fallback), &fallback));

        let mut font_map = HashMap::new();
        let mut font_objects = Vec::new();
        for (key, font) in keyed {
            if font_map.contains_key(&key) {
                continue;
            }
            let base = match fonts.resolve(font) {
                FontData::Standard(standard) => base_font_name(*standard, key.italic),
                FontData::Custom { .. } => {
                    log::debug!("font '{}' is drawn with Helvetica", key.family);
                    let standard = if key.weight >= 700 {
                        StandardFont::HelveticaBold
                    } else {
                        StandardFont::Helvetica
                    };
                    base_font_name(standard, key.italic)
                }
            };
            let id = objects.len();
            objects.push(PdfObject {
                data: format!(
                    "<< /Type /Font /Subtype /Type1 /BaseFont /{} /Encoding /WinAnsiEncoding >>",
                    base
                )
                .into_bytes(),
            });
            font_map.insert(key, font_objects.len());
            font_objects.push(id);
        }

        Resources {
            fonts: font_map,
            font_objects,
            images,
        }
    }

    /// Write an image as one XObject, plus an SMask for alpha.
    fn write_image_xobject(objects: &mut Vec<PdfObject>, image: &SourceImage) -> usize {
        match &image.pixels {
            ImagePixels::Jpeg { data, grayscale } => {
                let color_space = if *grayscale { "/DeviceGray" } else { "/DeviceRGB" };
                let mut obj: Vec<u8> = Vec::new();
                let _ = write!(
                    obj,
                    "<< /Type /XObject /Subtype /Image /Width {} /Height {} \
                     /ColorSpace {} /BitsPerComponent 8 /Filter /DCTDecode /Length {} >>\nstream\n",
                    image.width,
                    image.height,
                    color_space,
                    data.len()
                );
                obj.extend_from_slice(data);
                obj.extend_from_slice(b"\nendstream");
                objects.push(PdfObject { data: obj });
                objects.len() - 1
            }
            ImagePixels::Rgb { rgb, alpha } => {
                let smask = alpha.as_ref().map(|alpha| {
                    let compressed = compress_to_vec_zlib(alpha, 6);
                    let mut obj: Vec<u8> = Vec::new();
                    let _ = write!(
                        obj,
                        "<< /Type /XObject /Subtype /Image /Width {} /Height {} \
                         /ColorSpace /DeviceGray /BitsPerComponent 8 /Filter /FlateDecode /Length {} >>\nstream\n",
                        image.width,
                        image.height,
                        compressed.len()
                    );
                    obj.extend_from_slice(&compressed);
                    obj.extend_from_slice(b"\nendstream");
                    objects.push(PdfObject { data: obj });
                    objects.len() - 1
                });

                let compressed = compress_to_vec_zlib(rgb, 6);
                let smask_ref = smask
                    .map(|id| format!(" /SMask {} 0 R", id))
                    .unwrap_or_default();
                let mut obj: Vec<u8> = Vec::new();
                let _ = write!(
                    obj,
                    "<< /Type /XObject /Subtype /Image /Width {} /Height {} \
                     /ColorSpace /DeviceRGB /BitsPerComponent 8 /Filter /FlateDecode /Length {}{} >>\nstream\n",
                    image.width,
                    image.height,
                    compressed.len(),
                    smask_ref
                );
                obj.extend_from_slice(&compressed);
                obj.extend_from_slice(b"\nendstream");
                objects.push(PdfObject { data: obj });
                objects.len() - 1
            }
        }
    }

    fn page_images(&self, page: &RecordedPage, resources: &Resources) -> String {
        let mut used: Vec<usize> = page
            .commands
            .iter()
            .filter_map(|c| match c {
                DrawCommand::Image { image, .. } => resources.image_index(image),
                _ => None,
            })
            .collect();
        used.sort_unstable();
        used.dedup();
        used.iter()
            .map(|&i| format!("/Im{} {} 0 R", i, resources.images[i].1))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Build the content stream of one page.
    fn content_stream(&self, page: &RecordedPage, resources: &Resources, fonts: &FontContext) -> String {
        let mut stream = String::new();
        let _ = writeln!(stream, "1 0 0 -1 0 {} cm", page.size.height);
        let mut transformed = false;

        for command in &page.commands {
            match command {
                DrawCommand::FillRect { rect, color } => {
                    if color.is_visible() {
                        let _ = write!(
                            stream,
                            "q\n{} rg\n{} {} {} {} re\nf\nQ\n",
                            rgb(color),
                            rect.x,
                            rect.y,
                            rect.width,
                            rect.height
                        );
                    }
                }
                DrawCommand::StrokeRect { rect, pen } => {
                    if pen.is_visible() {
                        stream.push_str("q\n");
                        write_pen(&mut stream, pen);
                        let _ = write!(
                            stream,
                            "{} {} {} {} re\nS\nQ\n",
                            rect.x, rect.y, rect.width, rect.height
                        );
                    }
                }
                DrawCommand::Line { from, to, pen } => {
                    if pen.is_visible() {
                        stream.push_str("q\n");
                        write_pen(&mut stream, pen);
                        write_segment(&mut stream, *from, *to);
                        stream.push_str("Q\n");
                    }
                }
                DrawCommand::Text {
                    text,
                    font,
                    color,
                    rect,
                    format,
                } => {
                    self.write_text(&mut stream, fonts, resources, text, font, *color, *rect, format);
                }
                DrawCommand::Image { rect, image } => {
                    if let Some(index) = resources.image_index(image) {
                        let _ = write!(
                            stream,
                            "q\n{} 0 0 {} {} {} cm\n/Im{} Do\nQ\n",
                            rect.width,
                            -rect.height,
                            rect.x,
                            rect.bottom(),
                            index
                        );
                    }
                }
                DrawCommand::Translate { dx, dy } => {
                    if !transformed {
                        stream.push_str("q\n");
                        transformed = true;
                    }
                    let _ = writeln!(stream, "1 0 0 1 {} {} cm", dx, dy);
                }
                DrawCommand::Rotate { degrees } => {
                    if !transformed {
                        stream.push_str("q\n");
                        transformed = true;
                    }
                    let (sin, cos) = degrees.to_radians().sin_cos();
                    let _ = writeln!(
                        stream,
                        "{} {} {} {} 0 0 cm",
                        num(cos),
                        num(sin),
                        num(-sin),
                        num(cos)
                    );
                }
                DrawCommand::ResetTransform => {
                    if transformed {
                        stream.push_str("Q\n");
                        transformed = false;
                    }
                }
            }
        }
        if transformed {
            stream.push_str("Q\n");
        }
        stream
    }

    #[allow(clippy::too_many_arguments)]
    fn write_text(
        &self,
        stream: &mut String,
        fonts: &FontContext,
        resources: &Resources,
        text: &str,
        font: &Font,
        color: Color,
        rect: Rect,
        format: &TextFormat,
    ) {
        let lines = layout_lines(fonts, text, font, rect.width as f64);
        if lines.is_empty() || !color.is_visible() {
            return;
        }
        let line_height = fonts.line_height(font);
        let total = lines.len() as f64 * line_height;
        let (x0, y0) = (rect.x as f64, rect.y as f64);
        let (w, h) = (rect.width as f64, rect.height as f64);

        let top = match format.align.vertical() {
            VAlign::Top => y0,
            VAlign::Middle => y0 + (h - total) / 2.0,
            VAlign::Bottom => y0 + h - total,
        };
        // Right-to-left text starts at the right edge
        let horizontal = match (format.align.horizontal(), format.rtl) {
            (HAlign::Left, true) => HAlign::Right,
            (HAlign::Right, true) => HAlign::Left,
            (other, _) => other,
        };

        let _ = write!(
            stream,
            "BT\n{} rg\n/F{} {} Tf\n",
            rgb(&color),
            resources.font_index(font),
            num(font.size)
        );
        for (n, (line, width)) in lines.iter().enumerate() {
            let x = match horizontal {
                HAlign::Left => x0,
                HAlign::Center => x0 + (w - width) / 2.0,
                HAlign::Right => x0 + w - width,
            };
            let baseline =
                top + n as f64 * line_height + (line_height - font.size) / 2.0 + font.size * ASCENT;
            let visual = visual_order(line, format.rtl);
            let _ = write!(
                stream,
                "1 0 0 -1 {:.2} {:.2} Tm\n({}) Tj\n",
                x,
                baseline,
                encode_text(&visual)
            );
        }
        stream.push_str("ET\n");
    }

    /// Serialize all objects into the final PDF byte stream.
    fn serialize(&self, objects: &[PdfObject], info_id: usize) -> Vec<u8> {
        let mut output: Vec<u8> = Vec::new();
        let mut offsets: Vec<usize> = vec![0; objects.len()];

        output.extend_from_slice(b"%PDF-1.7\n");
        output.extend_from_slice(b"%\xe2\xe3\xcf\xd3\n");

        for (i, obj) in objects.iter().enumerate().skip(1) {
            offsets[i] = output.len();
            let _ = write!(output, "{} 0 obj\n", i);
            output.extend_from_slice(&obj.data);
            output.extend_from_slice(b"\nendobj\n\n");
        }

        let xref_offset = output.len();
        let _ = write!(output, "xref\n0 {}\n", objects.len());
        let _ = write!(output, "0000000000 65535 f \n");
        for offset in offsets.iter().skip(1) {
            let _ = write!(output, "{:010} 00000 n \n", offset);
        }
        let _ = write!(
            output,
            "trailer\n<< /Size {} /Root 1 0 R /Info {} 0 R >>\nstartxref\n{}\n%%EOF\n",
            objects.len(),
            info_id,
            xref_offset
        );
        output
    }
}

fn rgb(color: &Color) -> String {
    format!("{:.3} {:.3} {:.3}", color.r, color.g, color.b)
}

fn write_pen(stream: &mut String, pen: &Pen) {
    let _ = write!(stream, "{} RG\n{} w\n", rgb(&pen.color), pen.width);
    let pattern = pen.style.pattern();
    if !pattern.is_empty() {
        let dashes = pattern
            .iter()
            .map(|p| num(p * pen.width as f64))
            .collect::<Vec<_>>()
            .join(" ");
        let _ = writeln!(stream, "[{}] 0 d", dashes);
    }
}

fn write_segment(stream: &mut String, from: Point, to: Point) {
    let _ = write!(stream, "{} {} m\n{} {} l\nS\n", from.x, from.y, to.x, to.y);
}
