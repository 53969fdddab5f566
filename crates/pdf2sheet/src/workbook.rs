//! Rendering extracted blocks into an `.xlsx` workbook.
//!
//! Each block becomes one worksheet named `{prefix}p{page}_t{n}`. When any
//! block came from a fallback strategy, a `detection_info` sheet listing how
//! every sheet was produced is placed first.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use std::str::FromStr;

use pdf2sheet_core::normalize::NO_CONTENT;
use pdf2sheet_core::{CellValue, ExtractedBlock, StrategyTag};
use rust_xlsxwriter::{Workbook, Worksheet, XlsxError};
use thiserror::Error;
use tracing::debug;

/// Excel's limit on sheet name length, in characters.
pub const MAX_SHEET_NAME_LEN: usize = 31;
/// Name of the metadata sheet.
pub const METADATA_SHEET_NAME: &str = "detection_info";
/// Name of the only sheet of a workbook with no blocks.
pub const EMPTY_SHEET_NAME: &str = "empty";

const FORBIDDEN_SHEET_CHARS: &[char] = &['[', ']', ':', '*', '?', '/', '\\'];
const MAX_CELL_CHARS: usize = 32_767;
const METADATA_HEADER: [&str; 6] = ["sheet", "page", "kind", "method", "page_width", "page_height"];

#[derive(Debug, Error)]
pub enum WorkbookError {
    #[error("xlsx error: {0}")]
    Xlsx(#[from] XlsxError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// When to include the `detection_info` sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MetadataSheet {
    /// Only when some block did not come from ruled-table detection.
    #[default]
    Auto,
    Always,
    Never,
}

impl FromStr for MetadataSheet {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "auto" => Ok(MetadataSheet::Auto),
            "always" => Ok(MetadataSheet::Always),
            "never" => Ok(MetadataSheet::Never),
            other => Err(format!("unknown metadata mode '{other}' (expected auto, always or never)")),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WorkbookSettings {
    /// Prepended to every generated sheet name.
    pub sheet_prefix: String,
    /// Upper bound on auto-fitted column widths, in characters.
    pub max_column_width: f64,
    /// Write numeric-looking cells as numbers instead of strings.
    pub numeric_cells: bool,
    pub metadata_sheet: MetadataSheet,
}

impl Default for WorkbookSettings {
    fn default() -> Self {
        Self {
            sheet_prefix: String::new(),
            max_column_width: 50.0,
            numeric_cells: true,
            metadata_sheet: MetadataSheet::Auto,
        }
    }
}

/// Replace characters Excel rejects and cut to [`MAX_SHEET_NAME_LEN`].
pub fn sanitize_sheet_name(name: &str) -> String {
    let mut out: String = name
        .chars()
        .map(|c| if FORBIDDEN_SHEET_CHARS.contains(&c) { '_' } else { c })
        .take(MAX_SHEET_NAME_LEN)
        .collect();
    // a name may not begin or end with an apostrophe
    if out.starts_with('\'') {
        out.replace_range(..1, "_");
    }
    if out.ends_with('\'') {
        out.pop();
        out.push('_');
    }
    out
}

/// Hands out sheet names that are unique ignoring case.
#[derive(Debug, Default)]
struct SheetNamer {
    taken: HashSet<String>,
}

impl SheetNamer {
    fn claim(&mut self, base: &str) -> String {
        let name = sanitize_sheet_name(base);
        if self.taken.insert(name.to_lowercase()) {
            return name;
        }
        let mut counter = 2usize;
        loop {
            let suffix = format!("~{counter}");
            let keep = MAX_SHEET_NAME_LEN - suffix.chars().count();
            let mut candidate: String = name.chars().take(keep).collect();
            candidate.push_str(&suffix);
            if self.taken.insert(candidate.to_lowercase()) {
                return candidate;
            }
            counter += 1;
        }
    }
}

/// Sheet name for each block, in block order.
///
/// `n` in `p{page}_t{n}` counts blocks within a page starting at 1.
/// Names that collide ignoring case (usually after truncation of a long
/// prefix) get `~2`, `~3`, ... suffixes.
pub fn sheet_names(blocks: &[ExtractedBlock], prefix: &str) -> Vec<String> {
    sheet_names_with(&mut SheetNamer::default(), blocks, prefix)
}

fn sheet_names_with(namer: &mut SheetNamer, blocks: &[ExtractedBlock], prefix: &str) -> Vec<String> {
    let mut per_page: BTreeMap<usize, usize> = BTreeMap::new();
    blocks
        .iter()
        .map(|block| {
            let n = per_page.entry(block.page).or_insert(0);
            *n += 1;
            namer.claim(&format!("{prefix}p{}_t{}", block.page, n))
        })
        .collect()
}

fn column_width(max_chars: usize, cap: f64) -> f64 {
    (max_chars as f64 + 2.0).min(cap)
}

fn clip_cell(text: &str) -> &str {
    match text.char_indices().nth(MAX_CELL_CHARS) {
        Some((byte, _)) => &text[..byte],
        None => text,
    }
}

fn cell_pos(row: usize, col: usize) -> Result<(u32, u16), XlsxError> {
    let row = u32::try_from(row).map_err(|_| XlsxError::RowColumnLimitError)?;
    let col = u16::try_from(col).map_err(|_| XlsxError::RowColumnLimitError)?;
    Ok((row, col))
}

/// Renders blocks into a workbook.
#[derive(Debug, Clone, Default)]
pub struct WorkbookSynthesizer {
    settings: WorkbookSettings,
}

impl WorkbookSynthesizer {
    pub fn new(settings: WorkbookSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &WorkbookSettings {
        &self.settings
    }

    /// Whether the `detection_info` sheet will be written for these blocks.
    pub fn wants_metadata(&self, blocks: &[ExtractedBlock]) -> bool {
        match self.settings.metadata_sheet {
            MetadataSheet::Always => true,
            MetadataSheet::Never => false,
            MetadataSheet::Auto => blocks.iter().any(|b| b.method != StrategyTag::LinesEdges),
        }
    }

    /// Build the workbook in memory.
    ///
    /// An empty block list gives a single `empty` sheet.
    pub fn build(&self, blocks: &[ExtractedBlock]) -> Result<Workbook, WorkbookError> {
        let mut workbook = Workbook::new();

        if blocks.is_empty() {
            let sheet = workbook.add_worksheet();
            sheet.set_name(EMPTY_SHEET_NAME)?;
            sheet.write_string(0, 0, NO_CONTENT)?;
            sheet.set_column_width(0, column_width(NO_CONTENT.len(), self.settings.max_column_width))?;
            return Ok(workbook);
        }

        let mut namer = SheetNamer::default();
        let with_metadata = self.wants_metadata(blocks);
        if with_metadata {
            namer.claim(METADATA_SHEET_NAME);
        }
        let names = sheet_names_with(&mut namer, blocks, &self.settings.sheet_prefix);

        if with_metadata {
            let sheet = workbook.add_worksheet();
            sheet.set_name(METADATA_SHEET_NAME)?;
            self.write_metadata(sheet, blocks, &names)?;
        }

        for (block, name) in blocks.iter().zip(&names) {
            let sheet = workbook.add_worksheet();
            sheet.set_name(name.as_str())?;
            self.write_block(sheet, block)?;
            debug!(sheet = %name, page = block.page, method = %block.method, "sheet written");
        }
        Ok(workbook)
    }

    /// Render to `.xlsx` bytes.
    pub fn to_bytes(&self, blocks: &[ExtractedBlock]) -> Result<Vec<u8>, WorkbookError> {
        let mut workbook = self.build(blocks)?;
        Ok(workbook.save_to_buffer()?)
    }

    /// Render and write to `path`.
    pub fn save(&self, blocks: &[ExtractedBlock], path: impl AsRef<Path>) -> Result<(), WorkbookError> {
        let bytes = self.to_bytes(blocks)?;
        std::fs::write(path, bytes)?;
        Ok(())
    }

    fn write_block(&self, sheet: &mut Worksheet, block: &ExtractedBlock) -> Result<(), WorkbookError> {
        let mut widths: Vec<usize> = vec![0; block.width()];
        for (r, row) in block.rows.iter().enumerate() {
            for (c, cell) in row.iter().enumerate() {
                let text = clip_cell(cell);
                widths[c] = widths[c].max(text.chars().count());
                let (row_num, col_num) = cell_pos(r, c)?;
                match CellValue::classify(text) {
                    CellValue::Empty => {}
                    CellValue::Number(n) if self.settings.numeric_cells => {
                        sheet.write_number(row_num, col_num, n)?;
                    }
                    _ => {
                        sheet.write_string(row_num, col_num, text)?;
                    }
                }
            }
        }
        self.fit_columns(sheet, &widths)
    }

    fn write_metadata(
        &self,
        sheet: &mut Worksheet,
        blocks: &[ExtractedBlock],
        names: &[String],
    ) -> Result<(), WorkbookError> {
        let mut widths: Vec<usize> = METADATA_HEADER.iter().map(|h| h.len()).collect();
        for (c, header) in METADATA_HEADER.iter().enumerate() {
            let (_, col) = cell_pos(0, c)?;
            sheet.write_string(0, col, *header)?;
        }

        for (i, (block, name)) in blocks.iter().zip(names).enumerate() {
            let (row, _) = cell_pos(i + 1, 0)?;
            let page = block.page.to_string();
            let texts = [name.as_str(), page.as_str(), block.kind.as_str(), block.method.as_str()];
            for (c, text) in texts.iter().enumerate() {
                widths[c] = widths[c].max(text.chars().count());
            }
            sheet.write_string(row, 0, name.as_str())?;
            sheet.write_number(row, 1, block.page as f64)?;
            sheet.write_string(row, 2, block.kind.as_str())?;
            sheet.write_string(row, 3, block.method.as_str())?;
            if let Some(size) = block.page_size {
                sheet.write_number(row, 4, size.width)?;
                sheet.write_number(row, 5, size.height)?;
            }
        }
        self.fit_columns(sheet, &widths)
    }

    fn fit_columns(&self, sheet: &mut Worksheet, widths: &[usize]) -> Result<(), WorkbookError> {
        for (c, &chars) in widths.iter().enumerate() {
            let (_, col) = cell_pos(0, c)?;
            sheet.set_column_width(col, column_width(chars, self.settings.max_column_width))?;
        }
        Ok(())
    }
}
