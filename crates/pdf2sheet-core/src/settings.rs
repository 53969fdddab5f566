//! Pipeline-wide configuration.

use crate::table::TableSettings;
use crate::text_rows::TextRowSettings;

/// Tunables for every strategy in the cascade.
///
/// All fields have defaults, so a partial JSON document (with the `serde`
/// feature) overrides only what it names.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct ExtractionSettings {
    /// Ruled-table detection.
    pub lines: TableSettings,
    /// Text-aligned table detection.
    #[cfg_attr(feature = "serde", serde(default = "TableSettings::text_gaps"))]
    pub text_gaps: TableSettings,
    /// Coordinate-only row reconstruction.
    pub text_rows: TextRowSettings,
    /// NFKC-normalize cell text and collapse whitespace runs.
    pub normalize_text: bool,
}

impl Default for ExtractionSettings {
    fn default() -> Self {
        Self {
            lines: TableSettings::lines(),
            text_gaps: TableSettings::text_gaps(),
            text_rows: TextRowSettings::default(),
            normalize_text: true,
        }
    }
}
