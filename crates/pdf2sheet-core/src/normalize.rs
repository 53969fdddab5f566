//! Turns cascade results into sheet-ready blocks.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use unicode_normalization::UnicodeNormalization;

use crate::cascade::{Detection, DetectionResult, DiagnosticInfo, StrategyTag};
use crate::layout::PageLayout;
use crate::table::Grid;

/// Marker row of a diagnostic block for a page with no text.
pub const NO_CONTENT: &str = "No content detected";
/// First row of an error block.
pub const PAGE_FAILED: &str = "Page could not be processed";

/// What a block holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum BlockKind {
    Table,
    TextLines,
    Diagnostic,
    Error,
}

impl BlockKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BlockKind::Table => "table",
            BlockKind::TextLines => "text_lines",
            BlockKind::Diagnostic => "diagnostic",
            BlockKind::Error => "error",
        }
    }
}

impl fmt::Display for BlockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Width and height of the source page.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PageSize {
    pub width: f64,
    pub height: f64,
}

/// One unit of output; each block becomes one sheet.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ExtractedBlock {
    /// 1-based page number.
    pub page: usize,
    pub kind: BlockKind,
    pub rows: Grid,
    pub method: StrategyTag,
    /// Absent for error blocks.
    pub page_size: Option<PageSize>,
}

impl ExtractedBlock {
    /// A block standing in for a page that could not be read.
    pub fn error(page: usize, message: impl Into<String>) -> Self {
        Self {
            page,
            kind: BlockKind::Error,
            rows: vec![vec![PAGE_FAILED.to_string()], vec![message.into()]],
            method: StrategyTag::Error,
            page_size: None,
        }
    }

    /// Number of columns of the widest row.
    pub fn width(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }
}

/// Wrap a detection result into blocks for the given page.
///
/// Every grid is padded to its widest row.
/// With `normalize_text`, cell text is NFKC-normalized and whitespace runs
/// are collapsed.
pub fn normalize(
    result: DetectionResult,
    page: &PageLayout,
    normalize_text: bool,
) -> Vec<ExtractedBlock> {
    let method = result.method;
    let page_size = Some(PageSize {
        width: page.width,
        height: page.height,
    });
    let block = |kind: BlockKind, rows: Grid| ExtractedBlock {
        page: page.page_number,
        kind,
        rows: finish_rows(rows, normalize_text),
        method,
        page_size,
    };

    match result.detection {
        Detection::Tables(grids) => grids
            .into_iter()
            .map(|grid| block(BlockKind::Table, grid))
            .collect(),
        Detection::TextLines(grid) => vec![block(BlockKind::TextLines, grid)],
        Detection::Diagnostic(info) => vec![block(BlockKind::Diagnostic, diagnostic_rows(info))],
    }
}

fn diagnostic_rows(info: DiagnosticInfo) -> Grid {
    if !info.text_lines.is_empty() {
        return info.text_lines.into_iter().map(|line| vec![line]).collect();
    }
    vec![
        vec![NO_CONTENT.to_string()],
        vec!["Page width".to_string(), format_dimension(info.width)],
        vec!["Page height".to_string(), format_dimension(info.height)],
    ]
}

fn format_dimension(value: f64) -> String {
    let rounded = (value * 100.0).round() / 100.0;
    format!("{rounded}")
}

fn finish_rows(rows: Grid, normalize_text: bool) -> Grid {
    let width = rows.iter().map(Vec::len).max().unwrap_or(0);
    rows.into_iter()
        .map(|row| {
            let mut row: Vec<String> = if normalize_text {
                row.iter().map(|cell| clean_text(cell)).collect()
            } else {
                row
            };
            row.resize(width, String::new());
            row
        })
        .collect()
}

/// NFKC-normalize and collapse whitespace runs to single spaces.
///
/// Ligatures like `ﬁ` expand to `fi`; leading and trailing whitespace is removed.
pub fn clean_text(text: &str) -> String {
    let normalized: String = text.nfkc().collect();
    normalized.split_whitespace().collect::<Vec<_>>().join(" ")
}

static NUMBER_RE: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"^-?(?:0|[1-9]\d{0,2}(?:,\d{3})+|[1-9]\d*)(?:\.\d+)?$|^-?0?\.\d+$").ok()
});

/// Digits a spreadsheet number holds exactly; longer values stay text.
const MAX_SIGNIFICANT_DIGITS: usize = 15;

fn significant_digits(number: &str) -> usize {
    number
        .chars()
        .filter(char::is_ascii_digit)
        .skip_while(|&c| c == '0')
        .count()
}

/// A typed cell value.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue<'a> {
    Empty,
    Number(f64),
    Text(&'a str),
}

impl<'a> CellValue<'a> {
    /// Classify a cell. Plain decimals and comma-grouped thousands are numbers.
    /// Values with leading zeros (`007`), a leading `+`, or more than 15
    /// significant digits stay text.
    pub fn classify(cell: &'a str) -> Self {
        let trimmed = cell.trim();
        if trimmed.is_empty() {
            return CellValue::Empty;
        }
        if NUMBER_RE.as_ref().is_some_and(|re| re.is_match(trimmed))
            && significant_digits(trimmed) <= MAX_SIGNIFICANT_DIGITS
        {
            if let Ok(n) = trimmed.replace(',', "").parse::<f64>() {
                if n.is_finite() {
                    return CellValue::Number(n);
                }
            }
        }
        CellValue::Text(cell)
    }
}
