//! Per-page layout primitives.
//!
//! A [`PageLayout`] is the immutable snapshot of one page that every
//! detection strategy reads: positioned glyphs, ruling lines, and rectangles,
//! all in top-left origin coordinates.

use std::cmp::Ordering;

use crate::error::{PdfError, StrategyError};
use crate::geometry::{BBox, Orientation};

/// A single positioned character.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Glyph {
    /// The text content of this glyph (usually one character).
    pub text: String,
    /// Left x coordinate.
    pub x0: f64,
    /// Top y coordinate (distance from top of page).
    pub top: f64,
    /// Advance width.
    pub width: f64,
    /// Glyph box height.
    pub height: f64,
}

impl Glyph {
    pub fn new(text: impl Into<String>, x0: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            text: text.into(),
            x0,
            top,
            width,
            height,
        }
    }

    /// Right edge.
    pub fn x1(&self) -> f64 {
        self.x0 + self.width
    }

    /// Bottom edge.
    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    pub fn bbox(&self) -> BBox {
        BBox::new(self.x0, self.top, self.x1(), self.bottom())
    }

    /// Whether the glyph renders as whitespace.
    pub fn is_blank(&self) -> bool {
        self.text.chars().all(char::is_whitespace)
    }
}

/// An axis-aligned stroked line segment.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Ruling {
    pub x0: f64,
    pub top: f64,
    pub x1: f64,
    pub bottom: f64,
    pub orientation: Orientation,
}

impl Ruling {
    /// Horizontal ruling at `y` spanning `x0..x1` (order-insensitive).
    pub fn horizontal(x0: f64, y: f64, x1: f64) -> Self {
        Self {
            x0: x0.min(x1),
            top: y,
            x1: x0.max(x1),
            bottom: y,
            orientation: Orientation::Horizontal,
        }
    }

    /// Vertical ruling at `x` spanning `top..bottom` (order-insensitive).
    pub fn vertical(x: f64, top: f64, bottom: f64) -> Self {
        Self {
            x0: x,
            top: top.min(bottom),
            x1: x,
            bottom: top.max(bottom),
            orientation: Orientation::Vertical,
        }
    }

    pub fn bbox(&self) -> BBox {
        BBox::new(self.x0, self.top, self.x1, self.bottom)
    }
}

/// An axis-aligned rectangle from a painted path.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RectShape {
    pub x0: f64,
    pub top: f64,
    pub x1: f64,
    pub bottom: f64,
}

impl RectShape {
    pub fn new(x0: f64, top: f64, x1: f64, bottom: f64) -> Self {
        Self {
            x0: x0.min(x1),
            top: top.min(bottom),
            x1: x0.max(x1),
            bottom: top.max(bottom),
        }
    }

    pub fn width(&self) -> f64 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f64 {
        self.bottom - self.top
    }

    pub fn bbox(&self) -> BBox {
        BBox::new(self.x0, self.top, self.x1, self.bottom)
    }
}

/// Everything the detectors know about one page.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PageLayout {
    /// 1-based page number.
    pub page_number: usize,
    pub width: f64,
    pub height: f64,
    pub glyphs: Vec<Glyph>,
    pub rulings: Vec<Ruling>,
    pub rects: Vec<RectShape>,
}

impl PageLayout {
    /// An empty page of the given size.
    pub fn new(page_number: usize, width: f64, height: f64) -> Self {
        Self {
            page_number,
            width,
            height,
            ..Self::default()
        }
    }

    pub fn with_glyphs(mut self, glyphs: Vec<Glyph>) -> Self {
        self.glyphs = glyphs;
        self
    }

    pub fn with_rulings(mut self, rulings: Vec<Ruling>) -> Self {
        self.rulings = rulings;
        self
    }

    pub fn with_rects(mut self, rects: Vec<RectShape>) -> Self {
        self.rects = rects;
        self
    }

    /// Fail when any glyph carries a non-finite coordinate.
    pub fn check_glyphs(&self) -> Result<(), StrategyError> {
        for (i, g) in self.glyphs.iter().enumerate() {
            if !(g.bbox().is_finite()) {
                return Err(StrategyError::MalformedGeometry(format!(
                    "glyph {i} ({:?}) has a non-finite coordinate",
                    g.text
                )));
            }
        }
        Ok(())
    }

    /// Fail when any glyph, ruling, or rect carries a non-finite coordinate.
    pub fn check_geometry(&self) -> Result<(), StrategyError> {
        self.check_glyphs()?;
        if let Some(i) = self.rulings.iter().position(|r| !r.bbox().is_finite()) {
            return Err(StrategyError::MalformedGeometry(format!(
                "ruling {i} has a non-finite coordinate"
            )));
        }
        if let Some(i) = self.rects.iter().position(|r| !r.bbox().is_finite()) {
            return Err(StrategyError::MalformedGeometry(format!(
                "rect {i} has a non-finite coordinate"
            )));
        }
        Ok(())
    }
}

/// Compare two positions in reading order (top first, then x0).
pub fn reading_order(a_top: f64, a_x0: f64, b_top: f64, b_x0: f64) -> Ordering {
    a_top.total_cmp(&b_top).then_with(|| a_x0.total_cmp(&b_x0))
}

/// An opened document that can produce page layouts.
///
/// Implemented by the PDF backend. The pipeline only iterates pages through
/// this trait and never opens files itself.
pub trait LayoutSource {
    /// Number of pages in the document.
    fn page_count(&self) -> usize;

    /// Build the layout of the page at 0-based `index`.
    fn page_layout(&self, index: usize) -> Result<PageLayout, PdfError>;
}

impl<T: LayoutSource + ?Sized> LayoutSource for &T {
    fn page_count(&self) -> usize {
        (**self).page_count()
    }

    fn page_layout(&self, index: usize) -> Result<PageLayout, PdfError> {
        (**self).page_layout(index)
    }
}

/// In-memory layouts, mostly for tests and callers with their own extractor.
impl LayoutSource for [PageLayout] {
    fn page_count(&self) -> usize {
        self.len()
    }

    fn page_layout(&self, index: usize) -> Result<PageLayout, PdfError> {
        self.get(index).cloned().ok_or(PdfError::PageOutOfRange {
            index,
            page_count: self.len(),
        })
    }
}

impl LayoutSource for Vec<PageLayout> {
    fn page_count(&self) -> usize {
        self.len()
    }

    fn page_layout(&self, index: usize) -> Result<PageLayout, PdfError> {
        self.as_slice().page_layout(index)
    }
}
