//! # Style Primitives
//!
//! Colours, fonts and pens shared by the report model, the printers and
//! the drawing backends. Field-level style (alignment, border, colours)
//! lives in [`crate::model::FieldStyle`]; this module only holds the
//! values it is built from.

use serde::{Deserialize, Serialize};

/// An RGBA colour with components in 0.0 - 1.0.
///
/// Deserializes from `{ "r", "g", "b", "a" }` objects as well as from
/// `"#rrggbb"` / `"#rgb"` strings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "ColorRepr")]
pub struct Color {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    pub a: f64,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ColorRepr {
    Hex(String),
    Rgba {
        r: f64,
        g: f64,
        b: f64,
        #[serde(default = "opaque")]
        a: f64,
    },
}

fn opaque() -> f64 {
    1.0
}

impl From<ColorRepr> for Color {
    fn from(repr: ColorRepr) -> Self {
        match repr {
            ColorRepr::Hex(hex) => Color::hex(&hex),
            ColorRepr::Rgba { r, g, b, a } => Color { r, g, b, a },
        }
    }
}

impl Color {
    pub const BLACK: Color = Color {
        r: 0.0,
        g: 0.0,
        b: 0.0,
        a: 1.0,
    };
    pub const WHITE: Color = Color {
        r: 1.0,
        g: 1.0,
        b: 1.0,
        a: 1.0,
    };
    pub const TRANSPARENT: Color = Color {
        r: 0.0,
        g: 0.0,
        b: 0.0,
        a: 0.0,
    };

    pub fn rgb(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub fn hex(hex: &str) -> Self {
        let hex = hex.trim_start_matches('#');
        let channel = |s: &str| u8::from_str_radix(s, 16).unwrap_or(0);
        let (r, g, b) = match hex.len() {
            3 => (
                channel(&hex[0..1].repeat(2)),
                channel(&hex[1..2].repeat(2)),
                channel(&hex[2..3].repeat(2)),
            ),
            6 => (channel(&hex[0..2]), channel(&hex[2..4]), channel(&hex[4..6])),
            _ => (0, 0, 0),
        };
        Self {
            r: r as f64 / 255.0,
            g: g as f64 / 255.0,
            b: b as f64 / 255.0,
            a: 1.0,
        }
    }

    /// Fully transparent colours are never painted.
    pub fn is_visible(&self) -> bool {
        self.a > 0.0
    }
}

impl Default for Color {
    fn default() -> Self {
        Color::BLACK
    }
}

/// A font request. Resolution to real metrics happens in
/// [`crate::font::FontContext`], which falls back to Helvetica.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Font {
    pub family: String,
    /// Size in points.
    pub size: f64,
    /// 100 - 900, snapped to regular/bold for the standard fonts.
    pub weight: u32,
    pub italic: bool,
}

impl Default for Font {
    fn default() -> Self {
        Self {
            family: "Helvetica".to_string(),
            size: 9.0,
            weight: 400,
            italic: false,
        }
    }
}

impl Font {
    pub fn new(family: &str, size: f64) -> Self {
        Self {
            family: family.to_string(),
            size,
            ..Default::default()
        }
    }

    pub fn bold(mut self) -> Self {
        self.weight = 700;
        self
    }

    pub fn is_bold(&self) -> bool {
        self.weight >= 600
    }
}

/// Line pattern for borders and grid lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DashStyle {
    #[default]
    Solid,
    Dash,
    Dot,
    DashDot,
    DashDotDot,
}

impl DashStyle {
    /// On/off lengths as multiples of the pen width. Empty means solid.
    pub fn pattern(&self) -> &'static [f64] {
        match self {
            DashStyle::Solid => &[],
            DashStyle::Dash => &[3.0, 1.0],
            DashStyle::Dot => &[1.0, 1.0],
            DashStyle::DashDot => &[3.0, 1.0, 1.0, 1.0],
            DashStyle::DashDotDot => &[3.0, 1.0, 1.0, 1.0, 1.0, 1.0],
        }
    }
}

/// A stroke: width in device units, colour and dash pattern.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Pen {
    pub width: i32,
    pub color: Color,
    pub style: DashStyle,
}

impl Default for Pen {
    fn default() -> Self {
        Self {
            width: 0,
            color: Color::BLACK,
            style: DashStyle::Solid,
        }
    }
}

impl Pen {
    pub fn new(width: i32, color: Color, style: DashStyle) -> Self {
        Self {
            width,
            color,
            style,
        }
    }

    pub fn solid(width: i32) -> Self {
        Self::new(width, Color::BLACK, DashStyle::Solid)
    }

    /// A zero-width pen draws nothing.
    pub fn is_visible(&self) -> bool {
        self.width > 0
    }
}
