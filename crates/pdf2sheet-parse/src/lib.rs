//! PDF layout extraction for pdf2sheet.
//!
//! Reads a PDF with [lopdf](https://crates.io/crates/lopdf), interprets page
//! content streams, and produces [`PageLayout`](pdf2sheet_core::PageLayout)s:
//! positioned glyphs, rulings and rectangles in top-left page coordinates.
//! [`LopdfDocument`] is the [`LayoutSource`](pdf2sheet_core::LayoutSource)
//! consumed by the pipeline.

pub mod error;
pub mod fonts;
pub mod handler;
pub mod interpreter;
pub mod lopdf_backend;
mod objects;
pub mod page_geometry;
pub mod shapes;
pub mod text_state;

pub use error::BackendError;
pub use fonts::FontInfo;
pub use handler::{ContentHandler, GlyphEvent, LayoutCollector, PaintOp, PathEvent};
pub use interpreter::{InterpreterState, MAX_FORM_DEPTH, interpret_content};
pub use lopdf_backend::LopdfDocument;
pub use page_geometry::{PageGeometry, PdfRect};
pub use pdf2sheet_core;
