//! Page box resolution and the flip into top-left page coordinates.

/// A raw PDF rectangle `[x0 y0 x1 y1]`, bottom-left origin, normalized so
/// that `x0 <= x1` and `y0 <= y1`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PdfRect {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

impl PdfRect {
    pub fn new(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        Self {
            x0: x0.min(x1),
            y0: y0.min(y1),
            x1: x0.max(x1),
            y1: y0.max(y1),
        }
    }

    pub fn width(&self) -> f64 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f64 {
        self.y1 - self.y0
    }

    fn intersect(&self, other: &PdfRect) -> Option<PdfRect> {
        let r = PdfRect {
            x0: self.x0.max(other.x0),
            y0: self.y0.max(other.y0),
            x1: self.x1.min(other.x1),
            y1: self.y1.min(other.y1),
        };
        (r.x1 > r.x0 && r.y1 > r.y0).then_some(r)
    }
}

/// Maps PDF user space onto the visible page area with a top-left origin.
///
/// The visible area is the CropBox clipped to the MediaBox; a missing or
/// disjoint CropBox falls back to the MediaBox.
///
/// ```
/// use pdf2sheet_parse::page_geometry::{PageGeometry, PdfRect};
///
/// let geo = PageGeometry::new(PdfRect::new(0.0, 0.0, 612.0, 792.0), None);
/// assert_eq!(geo.to_page(72.0, 720.0), (72.0, 72.0));
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    visible: PdfRect,
}

impl PageGeometry {
    pub fn new(media_box: PdfRect, crop_box: Option<PdfRect>) -> Self {
        let visible = crop_box
            .and_then(|crop| crop.intersect(&media_box))
            .unwrap_or(media_box);
        Self { visible }
    }

    pub fn width(&self) -> f64 {
        self.visible.width()
    }

    pub fn height(&self) -> f64 {
        self.visible.height()
    }

    /// PDF user-space point to page coordinates (y grows downward).
    pub fn to_page(&self, x: f64, y: f64) -> (f64, f64) {
        (x - self.visible.x0, self.visible.y1 - y)
    }
}
