//! Opening PDF documents.

use std::path::Path;

use pdf2sheet_core::{LayoutSource, PageLayout, PdfError};
use pdf2sheet_parse::LopdfDocument;

/// A PDF document opened for conversion.
///
/// The whole file is read into memory when opened; no file handle is held
/// while pages are processed.
///
/// # Example
///
/// ```ignore
/// let doc = Document::open_file("report.pdf")?;
/// let blocks = pdf2sheet::convert(&doc, &ExtractionSettings::default());
/// ```
#[derive(Debug)]
pub struct Document {
    inner: LopdfDocument,
}

impl Document {
    /// Parse a PDF held in memory.
    ///
    /// # Errors
    ///
    /// [`PdfError::ParseError`] for malformed input and
    /// [`PdfError::PasswordRequired`] for encrypted documents.
    pub fn open(bytes: &[u8]) -> Result<Self, PdfError> {
        let inner = LopdfDocument::open(bytes).map_err(PdfError::from)?;
        Ok(Self { inner })
    }

    /// Read and parse a PDF file.
    pub fn open_file(path: impl AsRef<Path>) -> Result<Self, PdfError> {
        let bytes = std::fs::read(path.as_ref())?;
        Self::open(&bytes)
    }

    pub fn page_count(&self) -> usize {
        self.inner.page_count()
    }

    /// The lopdf-backed layout source.
    pub fn backend(&self) -> &LopdfDocument {
        &self.inner
    }
}

impl LayoutSource for Document {
    fn page_count(&self) -> usize {
        self.inner.page_count()
    }

    fn page_layout(&self, index: usize) -> Result<PageLayout, PdfError> {
        self.inner.page_layout(index)
    }
}
