//! # Font Management
//!
//! Font resolution and advance widths for text measurement.
//!
//! The standard PDF fonts (Helvetica, Helvetica-Bold, Courier) are
//! built in. Custom TrueType/OpenType fonts can be registered and are
//! measured with their real `hmtx` metrics via ttf-parser. Unknown
//! families fall back to Helvetica.

pub mod metrics;

use std::collections::HashMap;

use crate::style::Font;
pub use metrics::StandardFontMetrics;

/// Line height as a multiple of the font size for the standard fonts.
pub const STANDARD_LINE_HEIGHT: f64 = 1.15;

#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub struct FontKey {
    pub family: String,
    pub weight: u32,
    pub italic: bool,
}

impl FontKey {
    fn snapped(family: &str, weight: u32, italic: bool) -> Self {
        Self {
            family: family.to_string(),
            weight: if weight >= 600 { 700 } else { 400 },
            italic,
        }
    }
}

#[derive(Debug, Clone)]
pub enum FontData {
    /// One of the standard PDF fonts. No embedding needed.
    Standard(StandardFont),
    /// A registered TrueType/OpenType font.
    Custom {
        data: Vec<u8>,
        metrics: Option<CustomFontMetrics>,
    },
}

/// Parsed metrics from a TrueType/OpenType font via ttf-parser.
#[derive(Debug, Clone)]
pub struct CustomFontMetrics {
    pub units_per_em: u16,
    pub advance_widths: HashMap<char, u16>,
    pub default_advance: u16,
    pub ascender: i16,
    pub descender: i16,
    pub line_gap: i16,
}

impl CustomFontMetrics {
    /// Get the advance width of a character in points.
    pub fn char_width(&self, ch: char, font_size: f64) -> f64 {
        let w = self
            .advance_widths
            .get(&ch)
            .copied()
            .unwrap_or(self.default_advance);
        (w as f64 / self.units_per_em as f64) * font_size
    }

    pub fn line_height(&self, font_size: f64) -> f64 {
        let extent = self.ascender as f64 - self.descender as f64 + self.line_gap as f64;
        extent / self.units_per_em as f64 * font_size
    }

    /// Parse metrics from font data using ttf-parser.
    pub fn from_font_data(data: &[u8]) -> Option<Self> {
        let face = ttf_parser::Face::parse(data, 0).ok()?;
        let units_per_em = face.units_per_em();

        let mut advance_widths = HashMap::new();
        let mut default_advance = 0u16;

        // Basic Multilingual Plane is enough for report text
        for code in 32u32..=0xFFFF {
            if let Some(ch) = char::from_u32(code) {
                if let Some(glyph_id) = face.glyph_index(ch) {
                    let advance = face.glyph_hor_advance(glyph_id).unwrap_or(0);
                    advance_widths.insert(ch, advance);
                    if ch == ' ' {
                        default_advance = advance;
                    }
                }
            }
        }

        if default_advance == 0 {
            default_advance = units_per_em / 2;
        }

        Some(CustomFontMetrics {
            units_per_em,
            advance_widths,
            default_advance,
            ascender: face.ascender(),
            descender: face.descender(),
            line_gap: face.line_gap(),
        })
    }
}

/// The built-in standard fonts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StandardFont {
    Helvetica,
    HelveticaBold,
    Courier,
    CourierBold,
}

impl StandardFont {
    /// The PDF base font name.
    pub fn pdf_name(&self) -> &'static str {
        match self {
            Self::Helvetica => "Helvetica",
            Self::HelveticaBold => "Helvetica-Bold",
            Self::Courier => "Courier",
            Self::CourierBold => "Courier-Bold",
        }
    }

    pub fn metrics(&self) -> &'static StandardFontMetrics {
        match self {
            Self::Helvetica => &metrics::HELVETICA_METRICS,
            Self::HelveticaBold => &metrics::HELVETICA_BOLD_METRICS,
            Self::Courier | Self::CourierBold => &metrics::COURIER_METRICS,
        }
    }
}

/// A font registry that maps family + weight + style to font data.
pub struct FontRegistry {
    fonts: HashMap<FontKey, FontData>,
}

impl Default for FontRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl FontRegistry {
    pub fn new() -> Self {
        let mut fonts = HashMap::new();
        let standard_mappings = [
            ("Helvetica", 400, StandardFont::Helvetica),
            ("Helvetica", 700, StandardFont::HelveticaBold),
            ("Arial", 400, StandardFont::Helvetica),
            ("Arial", 700, StandardFont::HelveticaBold),
            ("Courier", 400, StandardFont::Courier),
            ("Courier", 700, StandardFont::CourierBold),
        ];
        for (family, weight, font) in standard_mappings {
            // Italic shares advance widths with the upright face
            for italic in [false, true] {
                fonts.insert(FontKey::snapped(family, weight, italic), FontData::Standard(font));
            }
        }
        Self { fonts }
    }

    /// Look up a font, falling back to Helvetica of the same weight.
    pub fn resolve(&self, family: &str, weight: u32, italic: bool) -> &FontData {
        let exact = FontKey {
            family: family.to_string(),
            weight,
            italic,
        };
        if let Some(font) = self.fonts.get(&exact) {
            return font;
        }
        if let Some(font) = self.fonts.get(&FontKey::snapped(family, weight, italic)) {
            return font;
        }
        if weight >= 600 {
            &HELVETICA_BOLD_DATA
        } else {
            &HELVETICA_DATA
        }
    }

    /// Register a custom font.
    pub fn register(&mut self, family: &str, weight: u32, italic: bool, data: Vec<u8>) {
        let metrics = CustomFontMetrics::from_font_data(&data);
        if metrics.is_none() {
            log::warn!("font '{family}' could not be parsed, Helvetica metrics will be used");
        }
        self.fonts.insert(
            FontKey {
                family: family.to_string(),
                weight,
                italic,
            },
            FontData::Custom { data, metrics },
        );
    }
}

static HELVETICA_DATA: FontData = FontData::Standard(StandardFont::Helvetica);
static HELVETICA_BOLD_DATA: FontData = FontData::Standard(StandardFont::HelveticaBold);

/// Shared font context used by measurement and PDF serialization.
pub struct FontContext {
    registry: FontRegistry,
}

impl Default for FontContext {
    fn default() -> Self {
        Self::new()
    }
}

impl FontContext {
    pub fn new() -> Self {
        Self {
            registry: FontRegistry::new(),
        }
    }

    /// Get the advance width of a single character in points.
    pub fn char_width(&self, ch: char, font: &Font) -> f64 {
        match self.registry.resolve(&font.family, font.weight, font.italic) {
            FontData::Standard(std_font) => std_font.metrics().char_width(ch, font.size),
            FontData::Custom {
                metrics: Some(m), ..
            } => m.char_width(ch, font.size),
            FontData::Custom { metrics: None, .. } => {
                StandardFont::Helvetica.metrics().char_width(ch, font.size)
            }
        }
    }

    /// Measure the width of a string in points.
    pub fn measure_string(&self, text: &str, font: &Font) -> f64 {
        text.chars().map(|ch| self.char_width(ch, font)).sum()
    }

    /// Distance between consecutive baselines in points.
    pub fn line_height(&self, font: &Font) -> f64 {
        match self.registry.resolve(&font.family, font.weight, font.italic) {
            FontData::Custom {
                metrics: Some(m), ..
            } => m.line_height(font.size),
            _ => font.size * STANDARD_LINE_HEIGHT,
        }
    }

    /// Resolve a font to its data.
    pub fn resolve(&self, font: &Font) -> &FontData {
        self.registry.resolve(&font.family, font.weight, font.italic)
    }

    pub fn registry_mut(&mut self) -> &mut FontRegistry {
        &mut self.registry
    }
}
