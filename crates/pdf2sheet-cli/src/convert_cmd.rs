use std::path::{Path, PathBuf};

use pdf2sheet::{MetadataSheet, WorkbookSettings, WorkbookSynthesizer, convert_with};

use crate::cli::{ExtractionArgs, MetadataArg};
use crate::shared::{build_cascade, build_settings, open_document, resolve_pages};

pub struct ConvertOptions<'a> {
    pub output: Option<&'a Path>,
    pub extraction: &'a ExtractionArgs,
    pub no_numbers: bool,
    pub sheet_prefix: &'a str,
    pub metadata: MetadataArg,
}

pub fn run(file: &Path, opts: ConvertOptions<'_>) -> Result<(), i32> {
    let settings = build_settings(opts.extraction)?;
    let cascade = build_cascade(opts.extraction);
    let doc = open_document(file)?;
    let pages = resolve_pages(opts.extraction.pages.as_deref(), doc.page_count())?;

    let blocks = convert_with(&doc, &pages, &cascade, &settings);

    let synthesizer = WorkbookSynthesizer::new(WorkbookSettings {
        sheet_prefix: opts.sheet_prefix.to_string(),
        numeric_cells: !opts.no_numbers,
        metadata_sheet: match opts.metadata {
            MetadataArg::Auto => MetadataSheet::Auto,
            MetadataArg::Always => MetadataSheet::Always,
            MetadataArg::Never => MetadataSheet::Never,
        },
        ..WorkbookSettings::default()
    });

    let output = output_path(file, opts.output);
    synthesizer.save(&blocks, &output).map_err(|e| {
        eprintln!("Error: failed to write {}: {e}", output.display());
        1
    })?;

    println!(
        "Wrote {} block(s) from {} page(s) to {}",
        blocks.len(),
        pages.len(),
        output.display()
    );
    Ok(())
}

/// `-o` when given, otherwise the input path with an `.xlsx` extension.
fn output_path(file: &Path, output: Option<&Path>) -> PathBuf {
    match output {
        Some(path) => path.to_path_buf(),
        None => file.with_extension("xlsx"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_output_next_to_input() {
        assert_eq!(
            output_path(Path::new("/tmp/report.pdf"), None),
            PathBuf::from("/tmp/report.xlsx")
        );
        assert_eq!(
            output_path(Path::new("scan"), None),
            PathBuf::from("scan.xlsx")
        );
    }

    #[test]
    fn explicit_output_wins() {
        assert_eq!(
            output_path(Path::new("a.pdf"), Some(Path::new("b/out.xlsx"))),
            PathBuf::from("b/out.xlsx")
        );
    }
}
