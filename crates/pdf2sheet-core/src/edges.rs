//! Edge derivation from page geometry.
//!
//! Edges are the axis-aligned segments the table finder reasons about. They
//! come from ruling lines, from rectangle sides, or are synthesized from text
//! alignment.

use crate::geometry::Orientation;
use crate::layout::{PageLayout, RectShape, Ruling};

/// Where an edge was derived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeSource {
    /// A stroked ruling line.
    Line,
    /// Top side of a rect.
    RectTop,
    /// Bottom side of a rect.
    RectBottom,
    /// Left side of a rect.
    RectLeft,
    /// Right side of a rect.
    RectRight,
    /// Synthesized from text alignment or text lines.
    Text,
}

/// An axis-aligned segment used for table detection.
#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    pub x0: f64,
    pub top: f64,
    pub x1: f64,
    pub bottom: f64,
    pub orientation: Orientation,
    pub source: EdgeSource,
}

impl Edge {
    /// Horizontal edge at `y` spanning `x0..x1`.
    pub fn horizontal(x0: f64, y: f64, x1: f64, source: EdgeSource) -> Self {
        Self {
            x0,
            top: y,
            x1,
            bottom: y,
            orientation: Orientation::Horizontal,
            source,
        }
    }

    /// Vertical edge at `x` spanning `top..bottom`.
    pub fn vertical(x: f64, top: f64, bottom: f64, source: EdgeSource) -> Self {
        Self {
            x0: x,
            top,
            x1: x,
            bottom,
            orientation: Orientation::Vertical,
            source,
        }
    }

    /// Length along the primary axis.
    pub fn length(&self) -> f64 {
        match self.orientation {
            Orientation::Horizontal => self.x1 - self.x0,
            Orientation::Vertical => self.bottom - self.top,
        }
    }

    pub fn is_finite(&self) -> bool {
        self.x0.is_finite() && self.top.is_finite() && self.x1.is_finite() && self.bottom.is_finite()
    }
}

/// Derive an edge from a ruling line.
pub fn edge_from_ruling(ruling: &Ruling) -> Edge {
    Edge {
        x0: ruling.x0,
        top: ruling.top,
        x1: ruling.x1,
        bottom: ruling.bottom,
        orientation: ruling.orientation,
        source: EdgeSource::Line,
    }
}

/// Derive the four sides of a rect.
pub fn edges_from_rect(rect: &RectShape) -> [Edge; 4] {
    [
        Edge::horizontal(rect.x0, rect.top, rect.x1, EdgeSource::RectTop),
        Edge::horizontal(rect.x0, rect.bottom, rect.x1, EdgeSource::RectBottom),
        Edge::vertical(rect.x0, rect.top, rect.bottom, EdgeSource::RectLeft),
        Edge::vertical(rect.x1, rect.top, rect.bottom, EdgeSource::RectRight),
    ]
}

/// All ruling and rect edges of a page, rulings first.
pub fn derive_edges(page: &PageLayout) -> Vec<Edge> {
    let mut edges: Vec<Edge> = page.rulings.iter().map(edge_from_ruling).collect();
    for rect in &page.rects {
        edges.extend(edges_from_rect(rect));
    }
    edges
}
