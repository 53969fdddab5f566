//! Geometric table detection.
//!
//! One pipeline, two configurations: ruling lines on both axes
//! ([`TableSettings::lines`]) or rule-or-text verticals with text-line
//! horizontals ([`TableSettings::text_gaps`]).
//!
//! Pipeline: select edges → filter by length → snap → join → intersections →
//! cells → tables → text assignment → rectangular grid.

use std::collections::BTreeMap;

use crate::edges::{Edge, EdgeSource, derive_edges};
use crate::error::StrategyError;
use crate::geometry::{BBox, Orientation};
use crate::layout::{Glyph, PageLayout};
use crate::words::{Word, WordExtractor, WordOptions, group_lines, lines_to_text};

/// Rows of cell text, top-to-bottom, left-to-right.
pub type Grid = Vec<Vec<String>>;

/// Where the boundaries along one axis come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum EdgeStrategy {
    /// Ruling lines and rect sides.
    #[default]
    Lines,
    /// Text alignment (verticals) or text lines (horizontals).
    Text,
    /// Ruling lines when the page has any on this axis, text otherwise.
    LinesOrText,
}

/// Configuration for one geometric detection mode.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct TableSettings {
    /// Source of column boundaries.
    pub vertical_strategy: EdgeStrategy,
    /// Source of row boundaries.
    pub horizontal_strategy: EdgeStrategy,
    /// Snap tolerance for vertical edges (clustered by x).
    pub snap_x_tolerance: f64,
    /// Snap tolerance for horizontal edges (clustered by y).
    pub snap_y_tolerance: f64,
    /// Join tolerance for horizontal edges (gap along x).
    pub join_x_tolerance: f64,
    /// Join tolerance for vertical edges (gap along y).
    pub join_y_tolerance: f64,
    /// Minimum edge length considered at all.
    pub edge_min_length: f64,
    /// Minimum number of words sharing an x0 or x1 to infer a column boundary.
    pub min_words_vertical: usize,
    /// Word grouping tolerance along x.
    pub text_x_tolerance: f64,
    /// Word and text-line grouping tolerance along y.
    pub text_y_tolerance: f64,
    pub intersection_x_tolerance: f64,
    pub intersection_y_tolerance: f64,
    /// Smallest accepted grid height.
    pub min_rows: usize,
    /// Smallest accepted grid width.
    pub min_cols: usize,
    /// Drop grid rows in which every cell is empty.
    pub drop_empty_rows: bool,
}

impl Default for TableSettings {
    fn default() -> Self {
        Self::lines()
    }
}

impl TableSettings {
    /// Ruled tables: ruling lines on both axes, tight tolerances.
    pub fn lines() -> Self {
        Self {
            vertical_strategy: EdgeStrategy::Lines,
            horizontal_strategy: EdgeStrategy::Lines,
            snap_x_tolerance: 3.0,
            snap_y_tolerance: 3.0,
            join_x_tolerance: 3.0,
            join_y_tolerance: 3.0,
            edge_min_length: 3.0,
            min_words_vertical: 3,
            text_x_tolerance: 3.0,
            text_y_tolerance: 3.0,
            intersection_x_tolerance: 3.0,
            intersection_y_tolerance: 3.0,
            min_rows: 1,
            min_cols: 1,
            drop_empty_rows: false,
        }
    }

    /// Text-aligned tables: rule-or-text columns, text-line rows, looser tolerances.
    pub fn text_gaps() -> Self {
        Self {
            vertical_strategy: EdgeStrategy::LinesOrText,
            horizontal_strategy: EdgeStrategy::Text,
            snap_x_tolerance: 5.0,
            snap_y_tolerance: 5.0,
            join_x_tolerance: 5.0,
            join_y_tolerance: 5.0,
            intersection_x_tolerance: 5.0,
            intersection_y_tolerance: 5.0,
            min_rows: 2,
            min_cols: 2,
            drop_empty_rows: true,
            ..Self::lines()
        }
    }

    /// Set both snap tolerances.
    pub fn with_snap_tolerance(mut self, tolerance: f64) -> Self {
        self.snap_x_tolerance = tolerance;
        self.snap_y_tolerance = tolerance;
        self
    }

    fn validate(&self) -> Result<(), StrategyError> {
        let tolerances = [
            ("snap_x_tolerance", self.snap_x_tolerance),
            ("snap_y_tolerance", self.snap_y_tolerance),
            ("join_x_tolerance", self.join_x_tolerance),
            ("join_y_tolerance", self.join_y_tolerance),
            ("edge_min_length", self.edge_min_length),
            ("text_x_tolerance", self.text_x_tolerance),
            ("text_y_tolerance", self.text_y_tolerance),
            ("intersection_x_tolerance", self.intersection_x_tolerance),
            ("intersection_y_tolerance", self.intersection_y_tolerance),
        ];
        for (name, value) in tolerances {
            if !value.is_finite() || value < 0.0 {
                return Err(StrategyError::InvalidSettings(format!(
                    "{name} must be a non-negative number, got {value}"
                )));
            }
        }
        Ok(())
    }

    fn word_options(&self) -> WordOptions {
        WordOptions {
            x_tolerance: self.text_x_tolerance,
            y_tolerance: self.text_y_tolerance,
        }
    }
}

/// A detected table cell.
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    pub bbox: BBox,
    /// Text content within the cell, if any.
    pub text: Option<String>,
}

/// A detected table.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    /// Bounding box enclosing the entire table.
    pub bbox: BBox,
    /// All cells in the table.
    pub cells: Vec<Cell>,
}

impl Table {
    /// Lay the cells out on the table's full set of column and row boundaries.
    ///
    /// Every row gets the same number of columns; positions without a cell
    /// become empty strings.
    pub fn to_grid(&self) -> Grid {
        let mut xs: Vec<i64> = Vec::new();
        let mut ys: Vec<i64> = Vec::new();
        for cell in &self.cells {
            xs.push(float_key(cell.bbox.x0));
            xs.push(float_key(cell.bbox.x1));
            ys.push(float_key(cell.bbox.top));
            ys.push(float_key(cell.bbox.bottom));
        }
        xs.sort_unstable();
        xs.dedup();
        ys.sort_unstable();
        ys.dedup();

        let cols = xs.len().saturating_sub(1);
        let rows = ys.len().saturating_sub(1);
        let mut grid = vec![vec![String::new(); cols]; rows];

        for cell in &self.cells {
            let (Ok(r), Ok(c)) = (
                ys.binary_search(&float_key(cell.bbox.top)),
                xs.binary_search(&float_key(cell.bbox.x0)),
            ) else {
                continue;
            };
            if r < rows && c < cols {
                grid[r][c] = cell.text.clone().unwrap_or_default();
            }
        }
        grid
    }
}

/// Snap nearby parallel edges to aligned positions.
///
/// Horizontal edges cluster by y within `snap_y_tolerance`, vertical edges by
/// x within `snap_x_tolerance`; each cluster moves to its mean. Edges are not
/// merged here.
pub fn snap_edges(edges: Vec<Edge>, snap_x_tolerance: f64, snap_y_tolerance: f64) -> Vec<Edge> {
    let (mut horizontals, mut verticals): (Vec<Edge>, Vec<Edge>) = edges
        .into_iter()
        .partition(|e| e.orientation == Orientation::Horizontal);

    snap_group(
        &mut horizontals,
        snap_y_tolerance,
        |e| e.top,
        |e, v| {
            e.top = v;
            e.bottom = v;
        },
    );
    snap_group(
        &mut verticals,
        snap_x_tolerance,
        |e| e.x0,
        |e, v| {
            e.x0 = v;
            e.x1 = v;
        },
    );

    horizontals.extend(verticals);
    horizontals
}

/// Cluster edges along a single axis and snap each cluster to its mean.
fn snap_group<F, G>(edges: &mut [Edge], tolerance: f64, key: F, mut set: G)
where
    F: Fn(&Edge) -> f64,
    G: FnMut(&mut Edge, f64),
{
    if edges.is_empty() {
        return;
    }

    edges.sort_by(|a, b| key(a).total_cmp(&key(b)));

    let mut cluster_start = 0;
    for i in 1..=edges.len() {
        let end_of_cluster =
            i == edges.len() || (key(&edges[i]) - key(&edges[cluster_start])).abs() > tolerance;
        if end_of_cluster {
            let sum: f64 = (cluster_start..i).map(|j| key(&edges[j])).sum();
            let mean = sum / (i - cluster_start) as f64;
            for edge in &mut edges[cluster_start..i] {
                set(edge, mean);
            }
            cluster_start = i;
        }
    }
}

/// Merge overlapping or nearly touching collinear segments.
///
/// Horizontal segments on the same y merge when the gap along x is within
/// `join_x_tolerance`; vertical segments on the same x merge when the gap
/// along y is within `join_y_tolerance`.
pub fn join_edge_group(
    edges: Vec<Edge>,
    join_x_tolerance: f64,
    join_y_tolerance: f64,
) -> Vec<Edge> {
    let (horizontals, verticals): (Vec<Edge>, Vec<Edge>) = edges
        .into_iter()
        .partition(|e| e.orientation == Orientation::Horizontal);

    let mut result = join_collinear(
        horizontals,
        |e| e.top,
        |e| (e.x0, e.x1),
        |proto, start, end| Edge::horizontal(start, proto.top, end, proto.source),
        join_x_tolerance,
    );
    result.extend(join_collinear(
        verticals,
        |e| e.x0,
        |e| (e.top, e.bottom),
        |proto, start, end| Edge::vertical(proto.x0, start, end, proto.source),
        join_y_tolerance,
    ));
    result
}

fn join_collinear<K, S, B>(
    mut edges: Vec<Edge>,
    key: K,
    span: S,
    build: B,
    tolerance: f64,
) -> Vec<Edge>
where
    K: Fn(&Edge) -> f64,
    S: Fn(&Edge) -> (f64, f64),
    B: Fn(&Edge, f64, f64) -> Edge,
{
    if edges.is_empty() {
        return Vec::new();
    }

    edges.sort_by(|a, b| {
        key(a)
            .total_cmp(&key(b))
            .then_with(|| span(a).0.total_cmp(&span(b).0))
    });

    let mut result = Vec::new();
    let mut i = 0;

    while i < edges.len() {
        // exact match after snapping
        let group_key = key(&edges[i]);
        let mut j = i + 1;
        while j < edges.len() && (key(&edges[j]) - group_key).abs() < 1e-9 {
            j += 1;
        }

        let (mut cur_start, mut cur_end) = span(&edges[i]);
        let mut proto_idx = i;

        for k in (i + 1)..j {
            let (s, e) = span(&edges[k]);
            if s <= cur_end + tolerance {
                cur_end = cur_end.max(e);
            } else {
                result.push(build(&edges[proto_idx], cur_start, cur_end));
                cur_start = s;
                cur_end = e;
                proto_idx = k;
            }
        }
        result.push(build(&edges[proto_idx], cur_start, cur_end));

        i = j;
    }

    result
}

/// A crossing between horizontal and vertical edges.
#[derive(Debug, Clone, PartialEq)]
pub struct Intersection {
    pub x: f64,
    pub y: f64,
    /// Indices of the horizontal edges passing through this point.
    pub horizontals: Vec<usize>,
    /// Indices of the vertical edges passing through this point.
    pub verticals: Vec<usize>,
}

/// Find all crossings between horizontal and vertical edges.
///
/// A crossing exists when a vertical edge's x lies within a horizontal edge's
/// x-span (± `x_tolerance`) and the horizontal's y lies within the vertical's
/// y-span (± `y_tolerance`). Points at the same location are merged and keep
/// the indices of every edge through them. Output is sorted by x, then y.
pub fn edges_to_intersections(
    edges: &[Edge],
    x_tolerance: f64,
    y_tolerance: f64,
) -> Vec<Intersection> {
    let mut points: BTreeMap<(i64, i64), Intersection> = BTreeMap::new();

    for (hi, h) in edges.iter().enumerate() {
        if h.orientation != Orientation::Horizontal {
            continue;
        }
        for (vi, v) in edges.iter().enumerate() {
            if v.orientation != Orientation::Vertical {
                continue;
            }
            let (x, y) = (v.x0, h.top);
            if x >= h.x0 - x_tolerance
                && x <= h.x1 + x_tolerance
                && y >= v.top - y_tolerance
                && y <= v.bottom + y_tolerance
            {
                let point = points
                    .entry((float_key(x), float_key(y)))
                    .or_insert_with(|| Intersection {
                        x,
                        y,
                        horizontals: Vec::new(),
                        verticals: Vec::new(),
                    });
                if !point.horizontals.contains(&hi) {
                    point.horizontals.push(hi);
                }
                if !point.verticals.contains(&vi) {
                    point.verticals.push(vi);
                }
            }
        }
    }

    points.into_values().collect()
}

/// Build cells from intersection points.
///
/// For every point, the smallest rectangle is searched whose other three
/// corners are also intersections and whose four sides each run along a
/// shared edge. `intersections` must be sorted by x, then y, as
/// [`edges_to_intersections`] returns them.
pub fn intersections_to_cells(intersections: &[Intersection]) -> Vec<Cell> {
    let index: BTreeMap<(i64, i64), usize> = intersections
        .iter()
        .enumerate()
        .map(|(i, p)| ((float_key(p.x), float_key(p.y)), i))
        .collect();

    let shares_horizontal = |a: &Intersection, b: &Intersection| {
        a.horizontals.iter().any(|h| b.horizontals.contains(h))
    };
    let shares_vertical =
        |a: &Intersection, b: &Intersection| a.verticals.iter().any(|v| b.verticals.contains(v));

    let mut cells = Vec::new();

    for (i, pt) in intersections.iter().enumerate() {
        let rest = &intersections[i + 1..];
        let below: Vec<&Intersection> = rest
            .iter()
            .filter(|p| float_key(p.x) == float_key(pt.x))
            .collect();
        let right: Vec<&Intersection> = rest
            .iter()
            .filter(|p| float_key(p.y) == float_key(pt.y))
            .collect();

        'search: for below_pt in &below {
            if !shares_vertical(pt, below_pt) {
                continue;
            }
            for right_pt in &right {
                if !shares_horizontal(pt, right_pt) {
                    continue;
                }
                let corner = index
                    .get(&(float_key(right_pt.x), float_key(below_pt.y)))
                    .map(|&k| &intersections[k]);
                if let Some(corner) = corner {
                    if shares_vertical(corner, right_pt) && shares_horizontal(corner, below_pt) {
                        cells.push(Cell {
                            bbox: BBox::new(pt.x, pt.y, corner.x, corner.y),
                            text: None,
                        });
                        break 'search;
                    }
                }
            }
        }
    }

    cells
}

/// Group cells that share a boundary into distinct tables.
///
/// Uses union-find over shared edges. Tables come back ordered top-to-bottom,
/// then left-to-right; rows within a table are keyed by `top`.
pub fn cells_to_tables(cells: Vec<Cell>) -> Vec<Table> {
    if cells.is_empty() {
        return Vec::new();
    }

    let n = cells.len();
    let mut parent: Vec<usize> = (0..n).collect();

    fn find(parent: &mut [usize], mut i: usize) -> usize {
        while parent[i] != i {
            parent[i] = parent[parent[i]];
            i = parent[i];
        }
        i
    }

    fn union(parent: &mut [usize], a: usize, b: usize) {
        let ra = find(parent, a);
        let rb = find(parent, b);
        if ra != rb {
            parent[rb] = ra;
        }
    }

    for i in 0..n {
        for j in (i + 1)..n {
            if cells_share_edge(&cells[i], &cells[j]) {
                union(&mut parent, i, j);
            }
        }
    }

    let mut groups: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for i in 0..n {
        let root = find(&mut parent, i);
        groups.entry(root).or_default().push(i);
    }

    let mut tables: Vec<Table> = groups
        .into_values()
        .map(|indices| {
            let group_cells: Vec<Cell> = indices.iter().map(|&i| cells[i].clone()).collect();

            let mut bbox = group_cells[0].bbox;
            for cell in &group_cells[1..] {
                bbox = bbox.union(&cell.bbox);
            }

            Table {
                bbox,
                cells: group_cells,
            }
        })
        .collect();

    tables.sort_by(|a, b| {
        a.bbox
            .top
            .total_cmp(&b.bbox.top)
            .then_with(|| a.bbox.x0.total_cmp(&b.bbox.x0))
    });

    tables
}

fn cells_share_edge(a: &Cell, b: &Cell) -> bool {
    let eps = 1e-6;

    let shared_vertical = ((a.bbox.x1 - b.bbox.x0).abs() < eps
        || (a.bbox.x0 - b.bbox.x1).abs() < eps)
        && a.bbox.top < b.bbox.bottom + eps
        && b.bbox.top < a.bbox.bottom + eps;

    let shared_horizontal = ((a.bbox.bottom - b.bbox.top).abs() < eps
        || (a.bbox.top - b.bbox.bottom).abs() < eps)
        && a.bbox.x0 < b.bbox.x1 + eps
        && b.bbox.x0 < a.bbox.x1 + eps;

    shared_vertical || shared_horizontal
}

/// Integer grouping key with three decimal places.
fn float_key(v: f64) -> i64 {
    (v * 1000.0).round() as i64
}

/// Fill each cell with the text of the glyphs whose center lies inside it.
///
/// Glyphs are grouped into words, words into lines; words are joined with
/// spaces and lines with newlines. Cells without glyphs get `None`.
pub fn extract_text_for_cells(cells: &mut [Cell], glyphs: &[Glyph], options: &WordOptions) {
    for cell in cells.iter_mut() {
        let inside = glyphs.iter().filter(|g| {
            let (cx, cy) = g.bbox().center();
            cell.bbox.contains_point(cx, cy)
        });
        let words = WordExtractor::extract(inside, options);
        cell.text = if words.is_empty() {
            None
        } else {
            Some(lines_to_text(&group_lines(&words, options.y_tolerance)))
        };
    }
}

/// Infer column boundaries from word alignment.
///
/// Words sharing an x0 or an x1 (within `tolerance`, at least `min_words` of
/// them) produce a vertical edge at the cluster mean. When any cluster exists,
/// two bounding edges are added at the outer extent of the words, and all
/// edges span the full vertical extent of the clustered words. With no
/// cluster, no edges are produced.
///
/// A cluster whose position cuts through a word within its vertical extent is
/// discarded, so every boundary sits in whitespace on each line it spans.
pub fn text_vertical_edges(words: &[Word], tolerance: f64, min_words: usize) -> Vec<Edge> {
    let mut clusters = cluster_positions(words, |w| w.bbox.x0, tolerance, min_words);
    clusters.extend(cluster_positions(words, |w| w.bbox.x1, tolerance, min_words));
    clusters.retain(|c| !crosses_word(words, c.position, c.top, c.bottom, tolerance));
    if clusters.is_empty() {
        return Vec::new();
    }

    let top = clusters
        .iter()
        .map(|c| c.top)
        .fold(f64::INFINITY, f64::min);
    let bottom = clusters
        .iter()
        .map(|c| c.bottom)
        .fold(f64::NEG_INFINITY, f64::max);
    let left = words.iter().map(|w| w.bbox.x0).fold(f64::INFINITY, f64::min);
    let right = words
        .iter()
        .map(|w| w.bbox.x1)
        .fold(f64::NEG_INFINITY, f64::max);

    // edges span the union of the clusters, which may cover more lines
    let mut edges: Vec<Edge> = clusters
        .iter()
        .filter(|c| !crosses_word(words, c.position, top, bottom, tolerance))
        .map(|c| Edge::vertical(c.position, top, bottom, EdgeSource::Text))
        .collect();
    edges.push(Edge::vertical(left, top, bottom, EdgeSource::Text));
    edges.push(Edge::vertical(right, top, bottom, EdgeSource::Text));
    edges
}

/// Whether `x` lies strictly inside a word that overlaps `top..bottom`.
fn crosses_word(words: &[Word], x: f64, top: f64, bottom: f64, tolerance: f64) -> bool {
    words.iter().any(|w| {
        w.bbox.top < bottom
            && top < w.bbox.bottom
            && w.bbox.x0 + tolerance < x
            && x < w.bbox.x1 - tolerance
    })
}

struct PositionCluster {
    position: f64,
    top: f64,
    bottom: f64,
}

fn cluster_positions<F>(words: &[Word], key: F, tolerance: f64, min_words: usize) -> Vec<PositionCluster>
where
    F: Fn(&Word) -> f64,
{
    if words.is_empty() || min_words == 0 {
        return Vec::new();
    }

    let mut sorted: Vec<&Word> = words.iter().collect();
    sorted.sort_by(|a, b| key(*a).total_cmp(&key(*b)));

    let mut clusters = Vec::new();
    let mut start = 0;
    for i in 1..=sorted.len() {
        let end_of_cluster =
            i == sorted.len() || (key(sorted[i]) - key(sorted[start])).abs() > tolerance;
        if end_of_cluster {
            let members = &sorted[start..i];
            if members.len() >= min_words {
                let sum: f64 = members.iter().map(|w| key(*w)).sum();
                clusters.push(PositionCluster {
                    position: sum / members.len() as f64,
                    top: members
                        .iter()
                        .map(|w| w.bbox.top)
                        .fold(f64::INFINITY, f64::min),
                    bottom: members
                        .iter()
                        .map(|w| w.bbox.bottom)
                        .fold(f64::NEG_INFINITY, f64::max),
                });
            }
            start = i;
        }
    }
    clusters
}

/// Row boundaries from text lines: the top and bottom of every line.
///
/// Each edge spans horizontally from `left` to `right`.
pub fn text_horizontal_edges(words: &[Word], y_tolerance: f64, left: f64, right: f64) -> Vec<Edge> {
    let mut edges = Vec::new();
    for line in group_lines(words, y_tolerance) {
        let top = line.iter().map(|w| w.bbox.top).fold(f64::INFINITY, f64::min);
        let bottom = line
            .iter()
            .map(|w| w.bbox.bottom)
            .fold(f64::NEG_INFINITY, f64::max);
        edges.push(Edge::horizontal(left, top, right, EdgeSource::Text));
        edges.push(Edge::horizontal(left, bottom, right, EdgeSource::Text));
    }
    edges
}

/// Runs the detection pipeline for one page under one [`TableSettings`].
pub struct TableFinder<'a> {
    page: &'a PageLayout,
    settings: &'a TableSettings,
}

impl<'a> TableFinder<'a> {
    pub fn new(page: &'a PageLayout, settings: &'a TableSettings) -> Self {
        Self { page, settings }
    }

    /// Select the edges for both axes according to the settings.
    pub fn edges(&self, words: &[Word]) -> Vec<Edge> {
        let min_len = self.settings.edge_min_length;
        let (line_h, line_v): (Vec<Edge>, Vec<Edge>) = derive_edges(self.page)
            .into_iter()
            .filter(|e| e.length() >= min_len)
            .partition(|e| e.orientation == Orientation::Horizontal);

        let verticals = match self.settings.vertical_strategy {
            EdgeStrategy::Lines => line_v,
            EdgeStrategy::Text => self.text_verticals(words),
            EdgeStrategy::LinesOrText if !line_v.is_empty() => line_v,
            EdgeStrategy::LinesOrText => self.text_verticals(words),
        };

        let horizontals = match self.settings.horizontal_strategy {
            EdgeStrategy::Lines => line_h,
            EdgeStrategy::LinesOrText if !line_h.is_empty() => line_h,
            EdgeStrategy::Text | EdgeStrategy::LinesOrText => {
                if verticals.is_empty() {
                    Vec::new()
                } else {
                    let (left, right) = horizontal_span(&verticals, words);
                    text_horizontal_edges(words, self.settings.text_y_tolerance, left, right)
                }
            }
        };

        let mut edges = verticals;
        edges.extend(horizontals);
        edges
    }

    fn text_verticals(&self, words: &[Word]) -> Vec<Edge> {
        text_vertical_edges(
            words,
            self.settings.text_x_tolerance,
            self.settings.min_words_vertical,
        )
    }

    /// Detect tables and assign cell text.
    pub fn find_tables(&self) -> Result<Vec<Table>, StrategyError> {
        self.settings.validate()?;
        self.page.check_geometry()?;

        let options = self.settings.word_options();
        let words = WordExtractor::extract(&self.page.glyphs, &options);

        let edges = self.edges(&words);
        if edges.is_empty() {
            return Ok(Vec::new());
        }
        let edges = snap_edges(
            edges,
            self.settings.snap_x_tolerance,
            self.settings.snap_y_tolerance,
        );
        let edges = join_edge_group(
            edges,
            self.settings.join_x_tolerance,
            self.settings.join_y_tolerance,
        );
        let intersections = edges_to_intersections(
            &edges,
            self.settings.intersection_x_tolerance,
            self.settings.intersection_y_tolerance,
        );
        let mut cells = intersections_to_cells(&intersections);
        extract_text_for_cells(&mut cells, &self.page.glyphs, &options);
        Ok(cells_to_tables(cells))
    }

    /// Detect tables and return the accepted ones as rectangular grids.
    ///
    /// A grid is rejected when it is a single cell, when it is smaller than
    /// `min_rows` × `min_cols`, or when every cell is empty.
    pub fn find_grids(&self) -> Result<Vec<Grid>, StrategyError> {
        let grids = self
            .find_tables()?
            .iter()
            .map(Table::to_grid)
            .map(|grid| {
                if self.settings.drop_empty_rows {
                    grid.into_iter()
                        .filter(|row| row.iter().any(|c| !c.trim().is_empty()))
                        .collect()
                } else {
                    grid
                }
            })
            .filter(|grid| self.accepts(grid))
            .collect();
        Ok(grids)
    }

    fn accepts(&self, grid: &Grid) -> bool {
        let rows = grid.len();
        let cols = grid.first().map_or(0, Vec::len);
        let single_cell = rows == 1 && cols == 1;
        let has_text = grid.iter().flatten().any(|c| !c.trim().is_empty());
        !single_cell && rows >= self.settings.min_rows && cols >= self.settings.min_cols && has_text
    }
}

fn horizontal_span(verticals: &[Edge], words: &[Word]) -> (f64, f64) {
    let left = verticals
        .iter()
        .map(|e| e.x0)
        .chain(words.iter().map(|w| w.bbox.x0))
        .fold(f64::INFINITY, f64::min);
    let right = verticals
        .iter()
        .map(|e| e.x1)
        .chain(words.iter().map(|w| w.bbox.x1))
        .fold(f64::NEG_INFINITY, f64::max);
    (left, right)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{RectShape, Ruling};

    fn make_h_edge(x0: f64, y: f64, x1: f64) -> Edge {
        Edge::horizontal(x0, y, x1, EdgeSource::Line)
    }

    fn make_v_edge(x: f64, top: f64, bottom: f64) -> Edge {
        Edge::vertical(x, top, bottom, EdgeSource::Line)
    }

    fn assert_approx(a: f64, b: f64) {
        assert!(
            (a - b).abs() < 1e-6,
            "expected {b}, got {a}, diff={}",
            (a - b).abs()
        );
    }

    /// Glyphs for `text` starting at `x0`, 5 units wide each, 10 high.
    fn word_glyphs(text: &str, x0: f64, top: f64) -> Vec<Glyph> {
        text.chars()
            .enumerate()
            .map(|(i, ch)| Glyph::new(ch.to_string(), x0 + 5.0 * i as f64, top, 5.0, 10.0))
            .collect()
    }

    /// A ruled grid with the given column and row boundaries.
    fn ruled_page(xs: &[f64], ys: &[f64]) -> PageLayout {
        let (left, right) = (xs[0], xs[xs.len() - 1]);
        let (top, bottom) = (ys[0], ys[ys.len() - 1]);
        let mut rulings: Vec<Ruling> = ys
            .iter()
            .map(|&y| Ruling::horizontal(left, y, right))
            .collect();
        rulings.extend(xs.iter().map(|&x| Ruling::vertical(x, top, bottom)));
        PageLayout::new(1, 612.0, 792.0).with_rulings(rulings)
    }

    // --- settings ---

    #[test]
    fn test_lines_settings_defaults() {
        let s = TableSettings::default();
        assert_eq!(s, TableSettings::lines());
        assert_eq!(s.vertical_strategy, EdgeStrategy::Lines);
        assert_eq!(s.snap_x_tolerance, 3.0);
        assert_eq!(s.min_words_vertical, 3);
        assert!(!s.drop_empty_rows);
    }

    #[test]
    fn test_text_gap_settings_are_looser() {
        let lines = TableSettings::lines();
        let text = TableSettings::text_gaps();
        assert!(text.snap_x_tolerance > lines.snap_x_tolerance);
        assert!(text.join_y_tolerance > lines.join_y_tolerance);
        assert_eq!(text.horizontal_strategy, EdgeStrategy::Text);
        assert_eq!(text.vertical_strategy, EdgeStrategy::LinesOrText);
    }

    #[test]
    fn test_negative_tolerance_is_invalid() {
        let settings = TableSettings::lines().with_snap_tolerance(-1.0);
        let page = ruled_page(&[0.0, 10.0], &[0.0, 10.0]);
        let err = TableFinder::new(&page, &settings).find_tables().unwrap_err();
        assert!(matches!(err, StrategyError::InvalidSettings(_)));
    }

    // --- snap / join ---

    #[test]
    fn test_snap_nearby_horizontal_lines() {
        let edges = vec![make_h_edge(0.0, 50.0, 100.0), make_h_edge(0.0, 51.5, 100.0)];
        let result = snap_edges(edges, 3.0, 3.0);
        assert_eq!(result.len(), 2);
        assert_approx(result[0].top, 50.75);
        assert_approx(result[1].bottom, 50.75);
    }

    #[test]
    fn test_snap_far_apart_unchanged() {
        let edges = vec![make_v_edge(100.0, 0.0, 10.0), make_v_edge(110.0, 0.0, 10.0)];
        let result = snap_edges(edges, 3.0, 3.0);
        assert_approx(result[0].x0, 100.0);
        assert_approx(result[1].x0, 110.0);
    }

    #[test]
    fn test_join_adjacent_horizontal_segments() {
        let edges = vec![
            make_h_edge(0.0, 50.0, 40.0),
            make_h_edge(42.0, 50.0, 100.0),
            make_h_edge(200.0, 50.0, 300.0),
        ];
        let result = join_edge_group(edges, 3.0, 3.0);
        assert_eq!(result.len(), 2);
        assert_approx(result[0].x0, 0.0);
        assert_approx(result[0].x1, 100.0);
        assert_approx(result[1].x0, 200.0);
    }

    #[test]
    fn test_join_overlapping_vertical_segments() {
        let edges = vec![make_v_edge(10.0, 0.0, 60.0), make_v_edge(10.0, 50.0, 90.0)];
        let result = join_edge_group(edges, 3.0, 3.0);
        assert_eq!(result.len(), 1);
        assert_approx(result[0].bottom, 90.0);
    }

    // --- intersections / cells ---

    #[test]
    fn test_intersections_simple_cross() {
        let edges = vec![make_h_edge(0.0, 50.0, 100.0), make_v_edge(50.0, 0.0, 100.0)];
        let points = edges_to_intersections(&edges, 3.0, 3.0);
        assert_eq!(points.len(), 1);
        assert_eq!((points[0].x, points[0].y), (50.0, 50.0));
        assert_eq!(points[0].horizontals, vec![0]);
        assert_eq!(points[0].verticals, vec![1]);
    }

    #[test]
    fn test_intersections_within_tolerance() {
        let edges = vec![make_h_edge(0.0, 50.0, 100.0), make_v_edge(102.0, 0.0, 100.0)];
        assert_eq!(edges_to_intersections(&edges, 3.0, 3.0).len(), 1);
        assert!(edges_to_intersections(&edges, 1.0, 1.0).is_empty());
    }

    #[test]
    fn test_intersections_to_cells_grid() {
        let edges = vec![
            make_h_edge(0.0, 0.0, 200.0),
            make_h_edge(0.0, 50.0, 200.0),
            make_h_edge(0.0, 100.0, 200.0),
            make_v_edge(0.0, 0.0, 100.0),
            make_v_edge(100.0, 0.0, 100.0),
            make_v_edge(200.0, 0.0, 100.0),
        ];
        let points = edges_to_intersections(&edges, 3.0, 3.0);
        assert_eq!(points.len(), 9);
        let cells = intersections_to_cells(&points);
        assert_eq!(cells.len(), 4);
        assert!(cells.iter().any(|c| c.bbox == BBox::new(100.0, 50.0, 200.0, 100.0)));
    }

    #[test]
    fn test_missing_interior_line_yields_spanning_cell() {
        // Middle vertical only spans the first row.
        let edges = vec![
            make_h_edge(0.0, 0.0, 200.0),
            make_h_edge(0.0, 50.0, 200.0),
            make_h_edge(0.0, 100.0, 200.0),
            make_v_edge(0.0, 0.0, 100.0),
            make_v_edge(100.0, 0.0, 50.0),
            make_v_edge(200.0, 0.0, 100.0),
        ];
        let cells = intersections_to_cells(&edges_to_intersections(&edges, 0.5, 0.5));
        assert_eq!(cells.len(), 3);
        assert!(cells.iter().any(|c| c.bbox == BBox::new(0.0, 50.0, 200.0, 100.0)));
    }

    #[test]
    fn test_cells_to_tables_separates_disjoint_groups() {
        let cells = vec![
            Cell {
                bbox: BBox::new(0.0, 300.0, 50.0, 320.0),
                text: None,
            },
            Cell {
                bbox: BBox::new(0.0, 0.0, 50.0, 20.0),
                text: None,
            },
            Cell {
                bbox: BBox::new(50.0, 0.0, 100.0, 20.0),
                text: None,
            },
        ];
        let tables = cells_to_tables(cells);
        assert_eq!(tables.len(), 2);
        assert_eq!(tables[0].cells.len(), 2);
        assert_approx(tables[0].bbox.top, 0.0);
        assert_approx(tables[0].bbox.x1, 100.0);
        assert_approx(tables[1].bbox.top, 300.0);
    }

    #[test]
    fn test_to_grid_pads_missing_positions() {
        let table = Table {
            bbox: BBox::new(0.0, 0.0, 100.0, 40.0),
            cells: vec![
                Cell {
                    bbox: BBox::new(0.0, 0.0, 50.0, 20.0),
                    text: Some("a".into()),
                },
                Cell {
                    bbox: BBox::new(50.0, 0.0, 100.0, 20.0),
                    text: Some("b".into()),
                },
                Cell {
                    bbox: BBox::new(0.0, 20.0, 50.0, 40.0),
                    text: Some("c".into()),
                },
            ],
        };
        assert_eq!(
            table.to_grid(),
            vec![vec!["a".to_string(), "b".to_string()], vec!["c".to_string(), String::new()]]
        );
    }

    #[test]
    fn test_extract_text_by_glyph_center() {
        let mut cells = vec![Cell {
            bbox: BBox::new(0.0, 0.0, 50.0, 20.0),
            text: None,
        }];
        let mut glyphs = word_glyphs("ab", 5.0, 5.0);
        glyphs.extend(word_glyphs("zz", 48.0, 5.0));
        extract_text_for_cells(&mut cells, &glyphs, &WordOptions::default());
        assert_eq!(cells[0].text.as_deref(), Some("ab"));
    }

    // --- finder ---

    #[test]
    fn test_ruled_grid_is_rectangular() {
        let mut page = ruled_page(&[100.0, 200.0, 300.0], &[100.0, 120.0, 140.0, 160.0]);
        for (row, (left, right)) in [("Name", "Age"), ("Ann", "30"), ("Bo", "41")]
            .into_iter()
            .enumerate()
        {
            let top = 105.0 + 20.0 * row as f64;
            page.glyphs.extend(word_glyphs(left, 110.0, top));
            page.glyphs.extend(word_glyphs(right, 210.0, top));
        }
        let settings = TableSettings::lines();
        let grids = TableFinder::new(&page, &settings).find_grids().unwrap();
        assert_eq!(grids.len(), 1);
        assert_eq!(
            grids[0],
            vec![vec!["Name", "Age"], vec!["Ann", "30"], vec!["Bo", "41"]]
        );
        assert!(grids[0].iter().all(|row| row.len() == 2));
    }

    #[test]
    fn test_rect_edges_form_cells() {
        let mut page = PageLayout::new(1, 612.0, 792.0).with_rects(vec![
            RectShape::new(0.0, 0.0, 50.0, 20.0),
            RectShape::new(50.0, 0.0, 100.0, 20.0),
        ]);
        page.glyphs.extend(word_glyphs("x", 10.0, 5.0));
        let settings = TableSettings::lines();
        let grids = TableFinder::new(&page, &settings).find_grids().unwrap();
        assert_eq!(grids, vec![vec![vec!["x".to_string(), String::new()]]]);
    }

    #[test]
    fn test_single_cell_rejected_as_noise() {
        let mut page = ruled_page(&[0.0, 100.0], &[0.0, 50.0]);
        page.glyphs.extend(word_glyphs("boxed", 10.0, 10.0));
        let settings = TableSettings::lines();
        assert!(TableFinder::new(&page, &settings).find_grids().unwrap().is_empty());
    }

    #[test]
    fn test_empty_grid_rejected() {
        let page = ruled_page(&[0.0, 50.0, 100.0], &[0.0, 20.0, 40.0]);
        let settings = TableSettings::lines();
        assert!(TableFinder::new(&page, &settings).find_grids().unwrap().is_empty());
    }

    #[test]
    fn test_nan_ruling_is_malformed() {
        let page = PageLayout::new(1, 612.0, 792.0)
            .with_rulings(vec![Ruling::vertical(f64::NAN, 0.0, 10.0)]);
        let settings = TableSettings::lines();
        assert!(matches!(
            TableFinder::new(&page, &settings).find_tables(),
            Err(StrategyError::MalformedGeometry(_))
        ));
    }

    #[test]
    fn test_text_gaps_from_alignment() {
        let mut page = PageLayout::new(1, 612.0, 792.0);
        for (row, (left, right)) in [("Name", "Age"), ("Ann", "30"), ("Bo", "41")]
            .into_iter()
            .enumerate()
        {
            let top = 100.0 + 20.0 * row as f64;
            page.glyphs.extend(word_glyphs(left, 72.0, top));
            page.glyphs.extend(word_glyphs(right, 200.0, top));
        }
        let settings = TableSettings::text_gaps();
        let grids = TableFinder::new(&page, &settings).find_grids().unwrap();
        assert_eq!(grids.len(), 1);
        assert_eq!(
            grids[0],
            vec![vec!["Name", "Age"], vec!["Ann", "30"], vec!["Bo", "41"]]
        );
    }

    #[test]
    fn test_text_gaps_use_vertical_rules_when_present() {
        let mut page = PageLayout::new(1, 612.0, 792.0).with_rulings(vec![
            Ruling::vertical(60.0, 95.0, 135.0),
            Ruling::vertical(150.0, 95.0, 135.0),
            Ruling::vertical(250.0, 95.0, 135.0),
        ]);
        page.glyphs.extend(word_glyphs("left", 70.0, 100.0));
        page.glyphs.extend(word_glyphs("right", 160.0, 100.0));
        page.glyphs.extend(word_glyphs("one", 70.0, 120.0));
        page.glyphs.extend(word_glyphs("two", 160.0, 120.0));
        let settings = TableSettings::text_gaps();
        let grids = TableFinder::new(&page, &settings).find_grids().unwrap();
        assert_eq!(grids, vec![vec![vec!["left", "right"], vec!["one", "two"]]]);
    }

    #[test]
    fn test_text_vertical_edges_skip_boundaries_inside_words() {
        let mut glyphs = Vec::new();
        for row in 0..3 {
            let top = 100.0 + 15.0 * row as f64;
            glyphs.extend(word_glyphs("aa", 72.0, top));
            glyphs.extend(word_glyphs("bb", 200.0, top));
        }
        // 180..215 straddles the x0 = 200 column
        glyphs.extend(word_glyphs("wrapped", 180.0, 145.0));
        let words = WordExtractor::extract(glyphs.iter(), &WordOptions::default());

        let edges = text_vertical_edges(&words, 3.0, 3);
        assert!(!edges.is_empty());
        assert!(edges.iter().all(|e| (e.x0 - 200.0).abs() > 1.0));
        assert!(edges.iter().any(|e| (e.x0 - 72.0).abs() < 1e-6));
    }

    #[test]
    fn test_text_gaps_single_column_prose_rejected() {
        let mut page = PageLayout::new(1, 612.0, 792.0);
        for (i, line) in ["first", "second", "third"].iter().enumerate() {
            page.glyphs.extend(word_glyphs(line, 72.0, 100.0 + 15.0 * i as f64));
        }
        let settings = TableSettings::text_gaps();
        assert!(TableFinder::new(&page, &settings).find_grids().unwrap().is_empty());
    }
}
