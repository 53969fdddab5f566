//! Path construction and the reduction of painted paths to rulings and rects.

use pdf2sheet_core::geometry::Ctm;
use pdf2sheet_core::{RectShape, Ruling};

use crate::handler::PaintOp;

/// Largest off-axis drift for a segment to still count as axis-aligned.
const AXIS_TOLERANCE: f64 = 0.5;
/// A rect no thicker than this is a rule drawn as a filled bar.
const THIN_RECT: f64 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Subpath {
    pub points: Vec<Point>,
    pub closed: bool,
}

/// Collects `m l c v y re h` into subpaths, transforming by the CTM as each
/// point is added.
#[derive(Debug, Default)]
pub struct PathBuilder {
    subpaths: Vec<Subpath>,
    current: Subpath,
}

impl PathBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    fn flush(&mut self) {
        let current = std::mem::take(&mut self.current);
        if !current.points.is_empty() {
            self.subpaths.push(current);
        }
    }

    fn point(ctm: &Ctm, x: f64, y: f64) -> Point {
        let (x, y) = ctm.transform_point(x, y);
        Point { x, y }
    }

    /// `m`
    pub fn move_to(&mut self, ctm: &Ctm, x: f64, y: f64) {
        self.flush();
        self.current.points.push(Self::point(ctm, x, y));
    }

    /// `l`
    pub fn line_to(&mut self, ctm: &Ctm, x: f64, y: f64) {
        self.current.points.push(Self::point(ctm, x, y));
    }

    /// `c`, `v`, `y`: a curve breaks the straight run; only its end point is kept.
    pub fn curve_to(&mut self, ctm: &Ctm, x: f64, y: f64) {
        self.flush();
        self.current.points.push(Self::point(ctm, x, y));
    }

    /// `re`
    pub fn rect(&mut self, ctm: &Ctm, x: f64, y: f64, w: f64, h: f64) {
        self.flush();
        self.subpaths.push(Subpath {
            points: vec![
                Self::point(ctm, x, y),
                Self::point(ctm, x + w, y),
                Self::point(ctm, x + w, y + h),
                Self::point(ctm, x, y + h),
            ],
            closed: true,
        });
    }

    /// `h`
    pub fn close(&mut self) {
        if !self.current.points.is_empty() {
            self.current.closed = true;
            let start = self.current.points[0];
            self.flush();
            self.current.points.push(start);
        }
    }

    /// Take the finished subpaths, resetting the builder (any painting op or `n`).
    pub fn take(&mut self) -> Vec<Subpath> {
        self.flush();
        std::mem::take(&mut self.subpaths)
    }
}

fn is_horizontal(a: Point, b: Point) -> bool {
    (a.y - b.y).abs() <= AXIS_TOLERANCE && (a.x - b.x).abs() > AXIS_TOLERANCE
}

fn is_vertical(a: Point, b: Point) -> bool {
    (a.x - b.x).abs() <= AXIS_TOLERANCE && (a.y - b.y).abs() > AXIS_TOLERANCE
}

fn segment_ruling(a: Point, b: Point) -> Option<Ruling> {
    if is_horizontal(a, b) {
        Some(Ruling::horizontal(a.x, (a.y + b.y) / 2.0, b.x))
    } else if is_vertical(a, b) {
        Some(Ruling::vertical((a.x + b.x) / 2.0, a.y, b.y))
    } else {
        None
    }
}

/// Corners of an axis-aligned four-point loop, if the subpath is one.
fn as_rect(subpath: &Subpath) -> Option<RectShape> {
    let mut points = subpath.points.clone();
    points.dedup();
    if points.len() == 5 && points[0] == points[4] {
        points.pop();
    }
    if points.len() != 4 || !(subpath.closed || subpath.points.len() == 5) {
        return None;
    }
    let aligned = (0..4).all(|i| {
        let (a, b) = (points[i], points[(i + 1) % 4]);
        (a.x - b.x).abs() <= AXIS_TOLERANCE || (a.y - b.y).abs() <= AXIS_TOLERANCE
    });
    if !aligned {
        return None;
    }
    let xs = points.iter().map(|p| p.x);
    let ys = points.iter().map(|p| p.y);
    Some(RectShape::new(
        xs.clone().fold(f64::INFINITY, f64::min),
        ys.clone().fold(f64::INFINITY, f64::min),
        xs.fold(f64::NEG_INFINITY, f64::max),
        ys.fold(f64::NEG_INFINITY, f64::max),
    ))
}

/// Reduce one painted subpath (page coordinates) to rulings and rects.
///
/// Rect loops become rects, or a ruling along their long side when thinner
/// than two units. Otherwise stroked axis-aligned segments become rulings;
/// diagonal segments and unstroked open paths contribute nothing.
pub fn classify_path(subpath: &Subpath, paint: PaintOp) -> (Vec<Ruling>, Vec<RectShape>) {
    if let Some(rect) = as_rect(subpath) {
        let (w, h) = (rect.width(), rect.height());
        if h <= THIN_RECT && w > h {
            let y = (rect.top + rect.bottom) / 2.0;
            return (vec![Ruling::horizontal(rect.x0, y, rect.x1)], Vec::new());
        }
        if w <= THIN_RECT && h > w {
            let x = (rect.x0 + rect.x1) / 2.0;
            return (vec![Ruling::vertical(x, rect.top, rect.bottom)], Vec::new());
        }
        return (Vec::new(), vec![rect]);
    }

    if !paint.strokes() {
        return (Vec::new(), Vec::new());
    }
    let points = &subpath.points;
    let mut rulings: Vec<Ruling> = points
        .windows(2)
        .filter_map(|pair| segment_ruling(pair[0], pair[1]))
        .collect();
    if subpath.closed && points.len() > 2 {
        if let (Some(&last), Some(&first)) = (points.last(), points.first()) {
            rulings.extend(segment_ruling(last, first));
        }
    }
    (rulings, Vec::new())
}
