use std::path::Path;

use pdf2sheet::{ExtractedBlock, convert_with, sheet_names};

use crate::cli::{BlockFormat, ExtractionArgs};
use crate::shared::{build_cascade, build_settings, open_document, resolve_pages};

pub fn run(file: &Path, extraction: &ExtractionArgs, format: BlockFormat) -> Result<(), i32> {
    let settings = build_settings(extraction)?;
    let cascade = build_cascade(extraction);
    let doc = open_document(file)?;
    let pages = resolve_pages(extraction.pages.as_deref(), doc.page_count())?;

    let blocks = convert_with(&doc, &pages, &cascade, &settings);

    match format {
        BlockFormat::Text => print!("{}", render_text(&blocks)),
        BlockFormat::Json => {
            let json = serde_json::to_string_pretty(&blocks).map_err(|e| {
                eprintln!("Error: failed to serialize blocks: {e}");
                1
            })?;
            println!("{json}");
        }
    }
    Ok(())
}

/// One header line per block followed by its rows, cells separated by ` | `.
fn render_text(blocks: &[ExtractedBlock]) -> String {
    let mut out = String::new();
    for (block, name) in blocks.iter().zip(sheet_names(blocks, "")) {
        out.push_str(&format!(
            "--- {name}: page {} {} ({}) ---\n",
            block.page, block.kind, block.method
        ));
        for row in &block.rows {
            out.push_str(&row.join(" | "));
            out.push('\n');
        }
    }
    out
}
