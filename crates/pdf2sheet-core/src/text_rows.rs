//! Row/column reconstruction from bare glyph coordinates.
//!
//! Used when a page has no detectable table. Glyphs are bucketed into rows by
//! rounded `top`, then each row is split into columns wherever the horizontal
//! gap between neighbouring glyphs exceeds `column_gap`.

use std::collections::BTreeMap;

use crate::error::StrategyError;
use crate::layout::{Glyph, PageLayout};
use crate::table::Grid;

/// Tuning for [`reconstruct_rows`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct TextRowSettings {
    /// Decimal places `top` is rounded to when forming row keys.
    pub row_precision: u32,
    /// Gap (layout units) above which a new column starts.
    pub column_gap: f64,
    /// Fewest non-empty rows for the result to count as structure.
    pub min_text_rows: usize,
}

impl Default for TextRowSettings {
    fn default() -> Self {
        Self {
            row_precision: 1,
            column_gap: 10.0,
            min_text_rows: 2,
        }
    }
}

/// Integer row key for `top` rounded to `precision` decimals.
pub fn row_key(top: f64, precision: u32) -> i64 {
    let scale = 10f64.powi(precision.min(6) as i32);
    (top * scale).round() as i64
}

/// Bucket glyphs into rows keyed by rounded `top`, each row sorted by `x0`.
///
/// Rows come back top-of-page first.
pub fn group_rows(glyphs: &[Glyph], precision: u32) -> Vec<Vec<&Glyph>> {
    let mut rows: BTreeMap<i64, Vec<&Glyph>> = BTreeMap::new();
    for glyph in glyphs {
        rows.entry(row_key(glyph.top, precision))
            .or_default()
            .push(glyph);
    }
    rows.into_values()
        .map(|mut row| {
            row.sort_by(|a, b| a.x0.total_cmp(&b.x0));
            row
        })
        .collect()
}

/// Split one sorted row into trimmed column texts.
///
/// A gap equal to `column_gap` keeps the glyphs together; only a strictly
/// larger gap closes the column.
pub fn split_columns(row: &[&Glyph], column_gap: f64) -> Vec<String> {
    let mut columns = Vec::new();
    let mut current = String::new();
    let mut previous: Option<&Glyph> = None;

    for &glyph in row {
        if let Some(prev) = previous {
            if glyph.x0 - prev.x1() > column_gap {
                columns.push(current.trim().to_string());
                current.clear();
            }
        }
        current.push_str(&glyph.text);
        previous = Some(glyph);
    }
    if previous.is_some() {
        columns.push(current.trim().to_string());
    }
    columns
}

/// Rebuild rows and columns from glyph positions alone.
///
/// Rows whose columns are all empty are dropped. Returns `Ok(None)` when fewer
/// than `min_text_rows` rows remain.
pub fn reconstruct_rows(
    page: &PageLayout,
    settings: &TextRowSettings,
) -> Result<Option<Grid>, StrategyError> {
    if !settings.column_gap.is_finite() || settings.column_gap < 0.0 {
        return Err(StrategyError::InvalidSettings(format!(
            "column_gap must be a non-negative number, got {}",
            settings.column_gap
        )));
    }
    page.check_glyphs()?;

    let grid: Grid = group_rows(&page.glyphs, settings.row_precision)
        .iter()
        .map(|row| split_columns(row, settings.column_gap))
        .filter(|columns| columns.iter().any(|c| !c.is_empty()))
        .collect();

    if grid.len() < settings.min_text_rows.max(1) {
        return Ok(None);
    }
    Ok(Some(grid))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn glyph(text: &str, x0: f64, top: f64, width: f64) -> Glyph {
        Glyph::new(text, x0, top, width, 10.0)
    }

    fn text_line(text: &str, x0: f64, top: f64) -> Vec<Glyph> {
        text.chars()
            .enumerate()
            .map(|(i, ch)| glyph(&ch.to_string(), x0 + 6.0 * i as f64, top, 6.0))
            .collect()
    }

    #[test]
    fn gap_equal_to_threshold_stays_in_column() {
        let a = glyph("a", 0.0, 0.0, 10.0);
        let b = glyph("b", 20.0, 0.0, 10.0);
        assert_eq!(split_columns(&[&a, &b], 10.0), vec!["ab"]);
    }

    #[test]
    fn gap_above_threshold_starts_column() {
        let a = glyph("a", 0.0, 0.0, 10.0);
        let b = glyph("b", 20.5, 0.0, 10.0);
        assert_eq!(split_columns(&[&a, &b], 10.0), vec!["a", "b"]);
    }

    #[test]
    fn columns_are_trimmed() {
        let glyphs = vec![
            glyph(" ", 0.0, 0.0, 3.0),
            glyph("x", 3.0, 0.0, 5.0),
            glyph(" ", 8.0, 0.0, 3.0),
        ];
        let row: Vec<&Glyph> = glyphs.iter().collect();
        assert_eq!(split_columns(&row, 10.0), vec!["x"]);
    }

    #[test]
    fn rows_group_by_rounded_top() {
        let glyphs = vec![
            glyph("b", 10.0, 100.04, 5.0),
            glyph("a", 0.0, 99.96, 5.0),
            glyph("c", 0.0, 120.0, 5.0),
        ];
        let rows = group_rows(&glyphs, 1);
        assert_eq!(rows.len(), 2);
        let first: String = rows[0].iter().map(|g| g.text.as_str()).collect();
        assert_eq!(first, "ab");
    }

    #[test]
    fn precision_zero_merges_nearby_tops() {
        assert_eq!(row_key(100.4, 0), row_key(99.6, 0));
        assert_ne!(row_key(100.4, 1), row_key(99.6, 1));
    }

    #[test]
    fn reconstruct_two_rows_with_columns() {
        let mut glyphs = text_line("Item", 72.0, 100.0);
        glyphs.extend(text_line("Qty", 200.0, 100.0));
        glyphs.extend(text_line("Pen", 72.0, 115.0));
        glyphs.extend(text_line("2", 200.0, 115.0));
        let page = PageLayout::new(1, 612.0, 792.0).with_glyphs(glyphs);

        let grid = reconstruct_rows(&page, &TextRowSettings::default())
            .unwrap()
            .unwrap();
        assert_eq!(grid, vec![vec!["Item", "Qty"], vec!["Pen", "2"]]);
    }

    #[test]
    fn single_line_is_rejected() {
        let page = PageLayout::new(1, 612.0, 792.0).with_glyphs(text_line("Invoice", 72.0, 100.0));
        assert_eq!(
            reconstruct_rows(&page, &TextRowSettings::default()).unwrap(),
            None
        );
    }

    #[test]
    fn blank_rows_are_dropped_before_acceptance() {
        let mut glyphs = text_line("Only", 72.0, 100.0);
        glyphs.push(glyph(" ", 72.0, 130.0, 3.0));
        let page = PageLayout::new(1, 612.0, 792.0).with_glyphs(glyphs);
        assert_eq!(
            reconstruct_rows(&page, &TextRowSettings::default()).unwrap(),
            None
        );
    }

    #[test]
    fn non_finite_glyph_is_malformed() {
        let page =
            PageLayout::new(1, 612.0, 792.0).with_glyphs(vec![glyph("x", f64::INFINITY, 0.0, 1.0)]);
        assert!(matches!(
            reconstruct_rows(&page, &TextRowSettings::default()),
            Err(StrategyError::MalformedGeometry(_))
        ));
    }
}
