//! # Geometry
//!
//! Integer device geometry and the two placement rules every printer uses:
//! aligning a content box inside a container, and rescaling a design
//! rectangle into printable space.
//!
//! All coordinates are y-down. Rounding in [`scale_rect`] is half-to-even so
//! a value sitting exactly between two device units always lands on the
//! same side no matter which direction it is scaled from.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Size {
    pub width: i32,
    pub height: i32,
}

impl Size {
    pub const fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }
}

/// An axis-aligned rectangle. `right` and `bottom` are exclusive edges.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn from_parts(location: Point, size: Size) -> Self {
        Self::new(location.x, location.y, size.width, size.height)
    }

    pub fn location(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    pub fn right(&self) -> i32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.height
    }

    pub fn offset(&self, dx: i32, dy: i32) -> Self {
        Self::new(self.x + dx, self.y + dy, self.width, self.height)
    }
}

/// Horizontal component of an [`Alignment`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum HAlign {
    #[default]
    Left,
    Center,
    Right,
}

/// Vertical component of an [`Alignment`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VAlign {
    Top,
    Middle,
    Bottom,
}

/// Nine-way content alignment (a 3×3 grid).
///
/// The discriminants are the classic content-alignment bit values, so a
/// layout produced by a designer that stores alignments numerically can be
/// read with [`Alignment::from_bits`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Alignment {
    #[default]
    TopLeft = 1,
    TopCenter = 2,
    TopRight = 4,
    MiddleLeft = 16,
    MiddleCenter = 32,
    MiddleRight = 64,
    BottomLeft = 256,
    BottomCenter = 512,
    BottomRight = 1024,
}

impl Alignment {
    /// Decode a bit value. Anything outside the nine known values is
    /// treated as top-left.
    pub fn from_bits(bits: u32) -> Self {
        match bits {
            1 => Self::TopLeft,
            2 => Self::TopCenter,
            4 => Self::TopRight,
            16 => Self::MiddleLeft,
            32 => Self::MiddleCenter,
            64 => Self::MiddleRight,
            256 => Self::BottomLeft,
            512 => Self::BottomCenter,
            1024 => Self::BottomRight,
            _ => Self::TopLeft,
        }
    }

    pub fn bits(self) -> u32 {
        self as u32
    }

    pub fn horizontal(self) -> HAlign {
        match self.bits() {
            1 | 16 | 256 => HAlign::Left,
            2 | 32 | 512 => HAlign::Center,
            4 | 64 | 1024 => HAlign::Right,
            _ => HAlign::Left,
        }
    }

    pub fn vertical(self) -> VAlign {
        match self.bits() {
            1 | 2 | 4 => VAlign::Top,
            16 | 32 | 64 => VAlign::Middle,
            256 | 512 | 1024 => VAlign::Bottom,
            _ => VAlign::Top,
        }
    }

    /// Recombine independent components into one of the nine values.
    pub fn compose(h: HAlign, v: VAlign) -> Self {
        match (v, h) {
            (VAlign::Top, HAlign::Left) => Self::TopLeft,
            (VAlign::Top, HAlign::Center) => Self::TopCenter,
            (VAlign::Top, HAlign::Right) => Self::TopRight,
            (VAlign::Middle, HAlign::Left) => Self::MiddleLeft,
            (VAlign::Middle, HAlign::Center) => Self::MiddleCenter,
            (VAlign::Middle, HAlign::Right) => Self::MiddleRight,
            (VAlign::Bottom, HAlign::Left) => Self::BottomLeft,
            (VAlign::Bottom, HAlign::Center) => Self::BottomCenter,
            (VAlign::Bottom, HAlign::Right) => Self::BottomRight,
        }
    }
}

/// Place a box of `content` size inside `container`.
///
/// Left/top placement adds the margin; center/middle adds the margin plus
/// half the free space; right/bottom subtracts the margin from the far
/// edge. Halving truncates toward zero, so an oversized content box is
/// shifted up/left by the truncated half of the (negative) free space.
pub fn aligned_rect(
    content: Size,
    container: Rect,
    align: Alignment,
    v_margin: i32,
    h_margin: i32,
) -> Rect {
    let x = match align.horizontal() {
        HAlign::Left => container.x + h_margin,
        HAlign::Center => container.x + h_margin + (container.width - content.width) / 2,
        HAlign::Right => container.x + container.width - content.width - h_margin,
    };
    let y = match align.vertical() {
        VAlign::Top => container.y + v_margin,
        VAlign::Middle => container.y + v_margin + (container.height - content.height) / 2,
        VAlign::Bottom => container.y + container.height - content.height - v_margin,
    };
    Rect::new(x, y, content.width, content.height)
}

/// Divide every component of `rect` by the matching scale factor.
///
/// Results are rounded half-to-even. Factors must be positive.
pub fn scale_rect(rect: Rect, sx: f64, sy: f64) -> Rect {
    let scale = |v: i32, s: f64| (v as f64 / s).round_ties_even() as i32;
    Rect::new(
        scale(rect.x, sx),
        scale(rect.y, sy),
        scale(rect.width, sx),
        scale(rect.height, sy),
    )
}
