//! Page iteration: layout, cascade, normalization.

use pdf2sheet_core::{
    BlockKind, Cascade, ExtractedBlock, ExtractionSettings, LayoutSource, StrategyTag, normalize,
};
use tracing::{info, warn};

/// A layout source the pipeline can iterate.
#[cfg(feature = "parallel")]
pub trait PageSource: LayoutSource + Sync {}
#[cfg(feature = "parallel")]
impl<T: LayoutSource + Sync + ?Sized> PageSource for T {}

/// A layout source the pipeline can iterate; with the `parallel` feature it
/// must also be shareable across threads.
#[cfg(not(feature = "parallel"))]
pub trait PageSource: LayoutSource {}
#[cfg(not(feature = "parallel"))]
impl<T: LayoutSource + ?Sized> PageSource for T {}

/// Convert every page of `source` with the standard cascade.
///
/// Always returns at least one block per page; a page whose layout cannot be
/// read becomes an error block and the remaining pages still run.
pub fn convert<S>(source: &S, settings: &ExtractionSettings) -> Vec<ExtractedBlock>
where
    S: PageSource + ?Sized,
{
    let pages: Vec<usize> = (0..source.page_count()).collect();
    convert_with(source, &pages, &Cascade::standard(), settings)
}

/// Convert the pages at the given 0-based indices, in the given order.
pub fn convert_pages<S>(source: &S, pages: &[usize], settings: &ExtractionSettings) -> Vec<ExtractedBlock>
where
    S: PageSource + ?Sized,
{
    convert_with(source, pages, &Cascade::standard(), settings)
}

/// Convert selected pages with a custom cascade.
pub fn convert_with<S>(
    source: &S,
    pages: &[usize],
    cascade: &Cascade,
    settings: &ExtractionSettings,
) -> Vec<ExtractedBlock>
where
    S: PageSource + ?Sized,
{
    #[cfg(feature = "parallel")]
    let per_page: Vec<Vec<ExtractedBlock>> = {
        use rayon::prelude::*;
        pages
            .par_iter()
            .map(|&index| process_page(source, index, cascade, settings))
            .collect()
    };
    #[cfg(not(feature = "parallel"))]
    let per_page: Vec<Vec<ExtractedBlock>> = pages
        .iter()
        .map(|&index| process_page(source, index, cascade, settings))
        .collect();

    let blocks: Vec<ExtractedBlock> = per_page.into_iter().flatten().collect();
    info!(
        pages = pages.len(),
        blocks = blocks.len(),
        tables = blocks.iter().filter(|b| b.kind == BlockKind::Table).count(),
        failed = blocks.iter().filter(|b| b.method == StrategyTag::Error).count(),
        "conversion finished"
    );
    blocks
}

/// Run one page through the cascade and wrap the result.
pub fn process_page<S>(
    source: &S,
    index: usize,
    cascade: &Cascade,
    settings: &ExtractionSettings,
) -> Vec<ExtractedBlock>
where
    S: LayoutSource + ?Sized,
{
    let page_number = index + 1;
    match source.page_layout(index) {
        Ok(layout) => {
            let result = cascade.detect(&layout, settings);
            normalize(result, &layout, settings.normalize_text)
        }
        Err(err) => {
            warn!(page = page_number, error = %err, "page could not be processed");
            vec![ExtractedBlock::error(page_number, err.to_string())]
        }
    }
}
