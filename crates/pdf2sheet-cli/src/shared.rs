use std::path::Path;

use pdf2sheet::{Cascade, Document, ExtractionSettings, StrategyTag};
use tracing_subscriber::EnvFilter;

use crate::cli::ExtractionArgs;
use crate::page_range::parse_page_range;

/// Install the stderr log subscriber. `RUST_LOG` wins over `-v`.
pub fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .try_init();
}

/// Open a PDF file with user-friendly error messages.
pub fn open_document(file: &Path) -> Result<Document, i32> {
    if !file.exists() {
        eprintln!("Error: file not found: {}", file.display());
        return Err(1);
    }

    Document::open_file(file).map_err(|e| {
        eprintln!("Error: failed to open PDF: {e}");
        1
    })
}

/// Resolve an optional page range into 0-based indices; `None` means all pages.
pub fn resolve_pages(pages: Option<&str>, page_count: usize) -> Result<Vec<usize>, i32> {
    match pages {
        Some(range) => parse_page_range(range, page_count).map_err(|e| {
            eprintln!("Error: {e}");
            1
        }),
        None => Ok((0..page_count).collect()),
    }
}

/// Settings from `--config` (if any) with flag overrides applied.
pub fn build_settings(args: &ExtractionArgs) -> Result<ExtractionSettings, i32> {
    let mut settings = match &args.config {
        Some(path) => load_config(path)?,
        None => ExtractionSettings::default(),
    };

    if let Some(gap) = args.column_gap {
        settings.text_rows.column_gap = gap;
    }
    if let Some(precision) = args.row_precision {
        settings.text_rows.row_precision = precision;
    }
    if let Some(min_rows) = args.min_rows {
        settings.text_rows.min_text_rows = min_rows;
    }
    if let Some(tolerance) = args.snap_tolerance {
        settings.lines = settings.lines.with_snap_tolerance(tolerance);
    }
    Ok(settings)
}

fn load_config(path: &Path) -> Result<ExtractionSettings, i32> {
    let text = std::fs::read_to_string(path).map_err(|e| {
        eprintln!("Error: failed to read config {}: {e}", path.display());
        1
    })?;
    serde_json::from_str(&text).map_err(|e| {
        eprintln!("Error: invalid config {}: {e}", path.display());
        1
    })
}

pub fn build_cascade(args: &ExtractionArgs) -> Cascade {
    let cascade = Cascade::standard();
    if args.no_text_gaps {
        cascade.without(StrategyTag::TextGaps)
    } else {
        cascade
    }
}
