//! Callback seam between the content stream interpreter and layout building.
//!
//! The interpreter reports glyphs and painted paths in PDF user space; a
//! [`ContentHandler`] decides what to keep. [`LayoutCollector`] is the one
//! that builds a [`PageLayout`].

use pdf2sheet_core::{Glyph, PageLayout, RectShape, Ruling};

use crate::page_geometry::PageGeometry;
use crate::shapes::{Point, Subpath, classify_path};
use crate::text_state::UserBox;

/// How a path was painted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaintOp {
    Stroke,
    Fill,
    FillAndStroke,
}

impl PaintOp {
    pub fn strokes(&self) -> bool {
        matches!(self, PaintOp::Stroke | PaintOp::FillAndStroke)
    }
}

/// A shown glyph in user space.
#[derive(Debug, Clone, PartialEq)]
pub struct GlyphEvent {
    pub text: String,
    pub bbox: UserBox,
}

/// A painted path in user space (CTM already applied).
#[derive(Debug, Clone, PartialEq)]
pub struct PathEvent {
    pub subpaths: Vec<Subpath>,
    pub paint: PaintOp,
}

/// Receives interpreter output. Both methods default to no-ops.
pub trait ContentHandler {
    fn on_glyph(&mut self, _event: GlyphEvent) {}
    fn on_path(&mut self, _event: PathEvent) {}
}

/// Builds a [`PageLayout`] from interpreter events.
///
/// Coordinates are flipped to a top-left origin relative to the visible page
/// area. Glyphs entirely outside that area are dropped.
#[derive(Debug)]
pub struct LayoutCollector {
    geometry: PageGeometry,
    glyphs: Vec<Glyph>,
    rulings: Vec<Ruling>,
    rects: Vec<RectShape>,
}

impl LayoutCollector {
    pub fn new(geometry: PageGeometry) -> Self {
        Self {
            geometry,
            glyphs: Vec::new(),
            rulings: Vec::new(),
            rects: Vec::new(),
        }
    }

    fn to_page(&self, p: Point) -> Point {
        let (x, y) = self.geometry.to_page(p.x, p.y);
        Point { x, y }
    }

    fn visible(&self, x0: f64, top: f64, x1: f64, bottom: f64) -> bool {
        x1 >= 0.0 && x0 <= self.geometry.width() && bottom >= 0.0 && top <= self.geometry.height()
    }

    /// Finish the page.
    pub fn into_layout(self, page_number: usize) -> PageLayout {
        PageLayout::new(page_number, self.geometry.width(), self.geometry.height())
            .with_glyphs(self.glyphs)
            .with_rulings(self.rulings)
            .with_rects(self.rects)
    }
}

impl ContentHandler for LayoutCollector {
    fn on_glyph(&mut self, event: GlyphEvent) {
        let (x0, top) = self.geometry.to_page(event.bbox.x0, event.bbox.y1);
        let (x1, bottom) = self.geometry.to_page(event.bbox.x1, event.bbox.y0);
        if !self.visible(x0, top, x1, bottom) {
            return;
        }
        self.glyphs
            .push(Glyph::new(event.text, x0, top, x1 - x0, bottom - top));
    }

    fn on_path(&mut self, event: PathEvent) {
        for subpath in &event.subpaths {
            let points: Vec<Point> = subpath.points.iter().map(|&p| self.to_page(p)).collect();
            let page_path = Subpath {
                points,
                closed: subpath.closed,
            };
            let (rulings, rects) = classify_path(&page_path, event.paint);
            self.rulings.extend(rulings);
            self.rects.extend(rects);
        }
    }
}
