//! pdf2sheet-core: Backend-independent layout types and table reconstruction.
//!
//! This crate provides the page primitives (glyphs, rulings, rects), the
//! geometric table detector, the text-row reconstructor, and the strategy
//! cascade that picks between them. It never reads PDF bytes; a backend
//! implements [`LayoutSource`] and hands over [`PageLayout`] snapshots.

pub mod cascade;
pub mod edges;
pub mod error;
pub mod geometry;
pub mod layout;
pub mod normalize;
pub mod settings;
pub mod table;
pub mod text_rows;
pub mod words;

pub use cascade::{
    Cascade, Detection, DetectionResult, DiagnosticInfo, StrategyFn, StrategyTag, diagnose,
};
pub use edges::{Edge, EdgeSource, derive_edges};
pub use error::{PdfError, StrategyError};
pub use geometry::{BBox, Ctm, Orientation};
pub use layout::{Glyph, LayoutSource, PageLayout, RectShape, Ruling};
pub use normalize::{BlockKind, CellValue, ExtractedBlock, PageSize, clean_text, normalize};
pub use settings::ExtractionSettings;
pub use table::{Cell, EdgeStrategy, Grid, Table, TableFinder, TableSettings};
pub use text_rows::{TextRowSettings, reconstruct_rows};
pub use words::{Word, WordExtractor, WordOptions};
