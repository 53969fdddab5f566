//! Error types for pdf2sheet.
//!
//! [`PdfError`] covers document- and page-level failures raised by a layout
//! source. [`StrategyError`] is local to a single detection strategy and is
//! absorbed by the cascade.

use std::fmt;

use thiserror::Error;

/// Document- or page-level error from a layout source.
#[derive(Debug, Clone, PartialEq)]
pub enum PdfError {
    /// Error parsing PDF structure or syntax.
    ParseError(String),
    /// I/O error reading PDF data.
    IoError(String),
    /// Error resolving font or encoding information.
    FontError(String),
    /// Error during content stream interpretation.
    InterpreterError(String),
    /// The PDF is encrypted and requires a password to open.
    PasswordRequired,
    /// A page index outside `0..page_count` was requested.
    PageOutOfRange { index: usize, page_count: usize },
}

impl fmt::Display for PdfError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PdfError::ParseError(msg) => write!(f, "parse error: {msg}"),
            PdfError::IoError(msg) => write!(f, "I/O error: {msg}"),
            PdfError::FontError(msg) => write!(f, "font error: {msg}"),
            PdfError::InterpreterError(msg) => write!(f, "interpreter error: {msg}"),
            PdfError::PasswordRequired => write!(f, "PDF is encrypted and requires a password"),
            PdfError::PageOutOfRange { index, page_count } => {
                write!(f, "page index {index} out of range (0..{page_count})")
            }
        }
    }
}

impl std::error::Error for PdfError {}

impl From<std::io::Error> for PdfError {
    fn from(err: std::io::Error) -> Self {
        PdfError::IoError(err.to_string())
    }
}

/// Recoverable failure of one detection strategy on one page.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StrategyError {
    /// A primitive carried a NaN or infinite coordinate.
    #[error("malformed geometry: {0}")]
    MalformedGeometry(String),
    /// The strategy was handed settings it cannot work with.
    #[error("invalid settings: {0}")]
    InvalidSettings(String),
}
