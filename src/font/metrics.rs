//! Advance widths for the standard Type1 fonts, in 1/1000 em.
//!
//! Only printable ASCII is tabulated; everything else uses the font's
//! default advance.

/// Widths for one standard font.
#[derive(Debug)]
pub struct StandardFontMetrics {
    /// Widths for U+0020 ..= U+007E.
    ascii: &'static [u16; 95],
    default_advance: u16,
    pub ascender: i16,
    pub descender: i16,
}

impl StandardFontMetrics {
    /// Advance width of `ch` in points.
    pub fn char_width(&self, ch: char, font_size: f64) -> f64 {
        let code = ch as u32;
        let w = if (0x20..=0x7E).contains(&code) {
            self.ascii[(code - 0x20) as usize]
        } else {
            self.default_advance
        };
        w as f64 / 1000.0 * font_size
    }

    pub fn measure_string(&self, text: &str, font_size: f64) -> f64 {
        text.chars().map(|ch| self.char_width(ch, font_size)).sum()
    }
}

#[rustfmt::skip]
static HELVETICA: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556,
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556,
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556,
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584,
];

#[rustfmt::skip]
static HELVETICA_BOLD: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611,
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556,
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611,
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584,
];

static COURIER: [u16; 95] = [600; 95];

pub static HELVETICA_METRICS: StandardFontMetrics = StandardFontMetrics {
    ascii: &HELVETICA,
    default_advance: 556,
    ascender: 718,
    descender: -207,
};

pub static HELVETICA_BOLD_METRICS: StandardFontMetrics = StandardFontMetrics {
    ascii: &HELVETICA_BOLD,
    default_advance: 611,
    ascender: 718,
    descender: -207,
};

pub static COURIER_METRICS: StandardFontMetrics = StandardFontMetrics {
    ascii: &COURIER,
    default_advance: 600,
    ascender: 629,
    descender: -157,
};
