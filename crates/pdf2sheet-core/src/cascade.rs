//! The per-page strategy cascade.
//!
//! Strategies run in priority order and the first one that produces content
//! wins. A strategy error counts as "nothing found". The cascade always ends
//! in [`diagnose`], which cannot fail, so every page yields a result.

use std::fmt;

use tracing::debug;

use crate::error::StrategyError;
use crate::layout::PageLayout;
use crate::settings::ExtractionSettings;
use crate::table::{Grid, TableFinder};
use crate::text_rows::{group_rows, reconstruct_rows};

/// Which strategy produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum StrategyTag {
    /// Ruling-line grid detection.
    LinesEdges,
    /// Text-alignment grid detection.
    TextGaps,
    /// Coordinate-only row reconstruction.
    TextStructure,
    /// Diagnostic fallback.
    Info,
    /// The page could not be processed.
    Error,
}

impl StrategyTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyTag::LinesEdges => "lines_edges",
            StrategyTag::TextGaps => "text_gaps",
            StrategyTag::TextStructure => "text_structure",
            StrategyTag::Info => "info",
            StrategyTag::Error => "error",
        }
    }
}

impl fmt::Display for StrategyTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the diagnostic fallback knows about a page.
#[derive(Debug, Clone, PartialEq)]
pub struct DiagnosticInfo {
    pub width: f64,
    pub height: f64,
    /// Raw text lines of the page, top to bottom; empty when the page has no text.
    pub text_lines: Vec<String>,
}

/// Content found by a strategy.
#[derive(Debug, Clone, PartialEq)]
pub enum Detection {
    /// One grid per independent table on the page.
    Tables(Vec<Grid>),
    /// Rows reconstructed from text positions.
    TextLines(Grid),
    Diagnostic(DiagnosticInfo),
}

/// A strategy's result together with the strategy that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectionResult {
    pub method: StrategyTag,
    pub detection: Detection,
}

/// A fallible detection strategy. `Ok(None)` means nothing was found.
pub type StrategyFn =
    fn(&PageLayout, &ExtractionSettings) -> Result<Option<DetectionResult>, StrategyError>;

/// Ruled tables from ruling lines and rect sides.
pub fn detect_lines_edges(
    page: &PageLayout,
    settings: &ExtractionSettings,
) -> Result<Option<DetectionResult>, StrategyError> {
    detect_grids(page, &settings.lines, StrategyTag::LinesEdges)
}

/// Tables whose rows come from text lines and columns from rules or alignment.
pub fn detect_text_gaps(
    page: &PageLayout,
    settings: &ExtractionSettings,
) -> Result<Option<DetectionResult>, StrategyError> {
    detect_grids(page, &settings.text_gaps, StrategyTag::TextGaps)
}

fn detect_grids(
    page: &PageLayout,
    table_settings: &crate::table::TableSettings,
    method: StrategyTag,
) -> Result<Option<DetectionResult>, StrategyError> {
    let grids = TableFinder::new(page, table_settings).find_grids()?;
    if grids.is_empty() {
        return Ok(None);
    }
    Ok(Some(DetectionResult {
        method,
        detection: Detection::Tables(grids),
    }))
}

/// Rows and columns from glyph coordinates alone.
pub fn detect_text_structure(
    page: &PageLayout,
    settings: &ExtractionSettings,
) -> Result<Option<DetectionResult>, StrategyError> {
    Ok(reconstruct_rows(page, &settings.text_rows)?.map(|grid| DetectionResult {
        method: StrategyTag::TextStructure,
        detection: Detection::TextLines(grid),
    }))
}

/// The terminal fallback: page size plus whatever raw text lines exist.
pub fn diagnose(page: &PageLayout, settings: &ExtractionSettings) -> DetectionResult {
    let text_lines = group_rows(&page.glyphs, settings.text_rows.row_precision)
        .iter()
        .map(|row| {
            row.iter()
                .map(|g| g.text.as_str())
                .collect::<String>()
                .trim()
                .to_string()
        })
        .filter(|line| !line.is_empty())
        .collect();

    DetectionResult {
        method: StrategyTag::Info,
        detection: Detection::Diagnostic(DiagnosticInfo {
            width: page.width,
            height: page.height,
            text_lines,
        }),
    }
}

/// Ordered, short-circuiting list of strategies.
#[derive(Debug, Clone)]
pub struct Cascade {
    strategies: Vec<(StrategyTag, StrategyFn)>,
}

impl Default for Cascade {
    fn default() -> Self {
        Self::standard()
    }
}

impl Cascade {
    /// Lines+Edges, then text gaps, then text structure.
    pub fn standard() -> Self {
        Self::with_strategies(vec![
            (StrategyTag::LinesEdges, detect_lines_edges as StrategyFn),
            (StrategyTag::TextGaps, detect_text_gaps as StrategyFn),
            (StrategyTag::TextStructure, detect_text_structure as StrategyFn),
        ])
    }

    /// A cascade over a custom ordered list; the diagnostic terminal is implicit.
    pub fn with_strategies(strategies: Vec<(StrategyTag, StrategyFn)>) -> Self {
        Self { strategies }
    }

    /// Drop the strategy with the given tag.
    pub fn without(mut self, tag: StrategyTag) -> Self {
        self.strategies.retain(|(t, _)| *t != tag);
        self
    }

    /// Tags of the fallible strategies, in the order they run.
    pub fn tags(&self) -> Vec<StrategyTag> {
        self.strategies.iter().map(|(tag, _)| *tag).collect()
    }

    /// Run the strategies in order and return the first result.
    pub fn detect(&self, page: &PageLayout, settings: &ExtractionSettings) -> DetectionResult {
        self.strategies
            .iter()
            .find_map(|(tag, strategy)| match strategy(page, settings) {
                Ok(Some(result)) => {
                    debug!(page = page.page_number, strategy = %tag, "strategy succeeded");
                    Some(result)
                }
                Ok(None) => None,
                Err(err) => {
                    debug!(page = page.page_number, strategy = %tag, error = %err, "strategy failed");
                    None
                }
            })
            .unwrap_or_else(|| diagnose(page, settings))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{Glyph, Ruling};

    fn text_line(text: &str, x0: f64, top: f64) -> Vec<Glyph> {
        text.chars()
            .enumerate()
            .map(|(i, ch)| Glyph::new(ch.to_string(), x0 + 6.0 * i as f64, top, 6.0, 10.0))
            .collect()
    }

    fn failing(_: &PageLayout, _: &ExtractionSettings) -> Result<Option<DetectionResult>, StrategyError> {
        Err(StrategyError::MalformedGeometry("boom".into()))
    }

    #[test]
    fn empty_page_ends_at_diagnostic() {
        let page = PageLayout::new(1, 612.0, 792.0);
        let result = Cascade::standard().detect(&page, &ExtractionSettings::default());
        assert_eq!(result.method, StrategyTag::Info);
        assert_eq!(
            result.detection,
            Detection::Diagnostic(DiagnosticInfo {
                width: 612.0,
                height: 792.0,
                text_lines: Vec::new(),
            })
        );
    }

    #[test]
    fn single_sentence_ends_at_diagnostic_with_text() {
        let page = PageLayout::new(1, 612.0, 792.0)
            .with_glyphs(text_line("Invoice Total: 42", 72.0, 100.0));
        let result = Cascade::standard().detect(&page, &ExtractionSettings::default());
        assert_eq!(result.method, StrategyTag::Info);
        match result.detection {
            Detection::Diagnostic(info) => {
                assert_eq!(info.text_lines, vec!["Invoice Total: 42"]);
            }
            other => panic!("expected diagnostic, got {other:?}"),
        }
    }

    #[test]
    fn two_prose_lines_use_text_structure() {
        let mut glyphs = text_line("first line", 72.0, 100.0);
        glyphs.extend(text_line("second line", 72.0, 115.0));
        let page = PageLayout::new(1, 612.0, 792.0).with_glyphs(glyphs);
        let result = Cascade::standard().detect(&page, &ExtractionSettings::default());
        assert_eq!(result.method, StrategyTag::TextStructure);
        assert_eq!(
            result.detection,
            Detection::TextLines(vec![
                vec!["first line".to_string()],
                vec!["second line".to_string()]
            ])
        );
    }

    #[test]
    fn justified_prose_is_not_a_table() {
        let lines = [
            "The board met on Monday to review the",
            "budget and agreed that the numbers were",
            "sound and that work can start in May.",
            "on the progress of the new site plans.",
        ];
        let mut glyphs = Vec::new();
        for (i, line) in lines.iter().enumerate() {
            glyphs.extend(text_line(line, 72.0, 100.0 + 14.0 * i as f64));
        }
        let page = PageLayout::new(1, 612.0, 792.0).with_glyphs(glyphs);
        let settings = ExtractionSettings::default();

        assert_eq!(detect_text_gaps(&page, &settings).unwrap(), None);
        let result = Cascade::standard().detect(&page, &settings);
        assert_eq!(result.method, StrategyTag::TextStructure);
        let expected: Vec<Vec<String>> = lines.iter().map(|l| vec![l.to_string()]).collect();
        assert_eq!(result.detection, Detection::TextLines(expected));
    }

    #[test]
    fn ruled_table_wins_first() {
        let mut page = PageLayout::new(1, 612.0, 792.0).with_rulings(vec![
            Ruling::horizontal(100.0, 100.0, 300.0),
            Ruling::horizontal(100.0, 120.0, 300.0),
            Ruling::horizontal(100.0, 140.0, 300.0),
            Ruling::vertical(100.0, 100.0, 140.0),
            Ruling::vertical(200.0, 100.0, 140.0),
            Ruling::vertical(300.0, 100.0, 140.0),
        ]);
        page.glyphs.extend(text_line("a", 110.0, 105.0));
        page.glyphs.extend(text_line("b", 210.0, 125.0));
        let result = Cascade::standard().detect(&page, &ExtractionSettings::default());
        assert_eq!(result.method, StrategyTag::LinesEdges);
        assert_eq!(
            result.detection,
            Detection::Tables(vec![vec![
                vec!["a".to_string(), String::new()],
                vec![String::new(), "b".to_string()]
            ]])
        );
    }

    #[test]
    fn strategy_error_falls_through() {
        let cascade = Cascade::with_strategies(vec![
            (StrategyTag::LinesEdges, failing as StrategyFn),
            (StrategyTag::TextStructure, detect_text_structure as StrategyFn),
        ]);
        let mut glyphs = text_line("one", 72.0, 100.0);
        glyphs.extend(text_line("two", 72.0, 120.0));
        let page = PageLayout::new(1, 612.0, 792.0).with_glyphs(glyphs);
        let result = cascade.detect(&page, &ExtractionSettings::default());
        assert_eq!(result.method, StrategyTag::TextStructure);
    }

    #[test]
    fn malformed_glyphs_reach_diagnostic() {
        let page = PageLayout::new(1, 612.0, 792.0).with_glyphs(vec![
            Glyph::new("x", f64::NAN, 10.0, 5.0, 10.0),
            Glyph::new("y", 10.0, 30.0, 5.0, 10.0),
        ]);
        let result = Cascade::standard().detect(&page, &ExtractionSettings::default());
        assert_eq!(result.method, StrategyTag::Info);
    }

    #[test]
    fn without_removes_strategy() {
        let cascade = Cascade::standard().without(StrategyTag::TextGaps);
        assert_eq!(
            cascade.tags(),
            vec![StrategyTag::LinesEdges, StrategyTag::TextStructure]
        );
    }

    #[test]
    fn tag_labels() {
        assert_eq!(StrategyTag::LinesEdges.to_string(), "lines_edges");
        assert_eq!(StrategyTag::Info.as_str(), "info");
    }
}
