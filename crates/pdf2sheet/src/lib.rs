//! pdf2sheet: reconstruct tables from PDF pages and write them to `.xlsx`.
//!
//! This is the public API facade. It opens documents through
//! `pdf2sheet-parse`, runs each page through the detection cascade of
//! `pdf2sheet-core`, and renders the resulting blocks with
//! [`WorkbookSynthesizer`].
//!
//! # Architecture
//!
//! - **pdf2sheet-core**: layout types, the strategy cascade, table detection
//! - **pdf2sheet-parse**: lopdf backend and content stream interpreter
//! - **pdf2sheet** (this crate): page iteration and workbook output
//!
//! # Example
//!
//! ```ignore
//! use pdf2sheet::{Document, ExtractionSettings, WorkbookSynthesizer, convert};
//!
//! let doc = Document::open_file("statement.pdf")?;
//! let blocks = convert(&doc, &ExtractionSettings::default());
//! WorkbookSynthesizer::default().save(&blocks, "statement.xlsx")?;
//! ```

mod document;
mod pipeline;
pub mod workbook;

pub use document::Document;
pub use pipeline::{PageSource, convert, convert_pages, convert_with, process_page};
pub use workbook::{
    MetadataSheet, WorkbookError, WorkbookSettings, WorkbookSynthesizer, sanitize_sheet_name,
    sheet_names,
};

pub use pdf2sheet_core;
pub use pdf2sheet_core::{
    BlockKind, Cascade, DetectionResult, EdgeStrategy, ExtractedBlock, ExtractionSettings,
    LayoutSource, PageLayout, PageSize, PdfError, StrategyTag, TableSettings, TextRowSettings,
};
pub use pdf2sheet_parse;
