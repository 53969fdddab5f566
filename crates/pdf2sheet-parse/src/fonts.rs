//! Font widths and text decoding.
//!
//! Only what glyph placement needs: an advance width per character code and
//! the Unicode text the code stands for. Simple fonts decode through
//! Windows-1252 (WinAnsi); Type0 fonts take 2-byte codes as UTF-16BE.

use encoding_rs::{UTF_16BE, WINDOWS_1252};

use crate::error::BackendError;
use crate::objects::{number, resolve};

/// Width used when nothing better is known, in glyph units.
pub const DEFAULT_WIDTH: f64 = 600.0;
/// `/DW` default for Type0 descendant fonts.
const DEFAULT_CID_WIDTH: f64 = 1000.0;
/// Highest code a 2-byte Type0 string can carry.
const MAX_CID: u32 = 0xFFFF;

/// Standard-14 advance widths for codes 32..=126 (Adobe AFM).
#[rustfmt::skip]
static HELVETICA: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556,
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556,
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556,
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584,
];

#[rustfmt::skip]
static HELVETICA_BOLD: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611,
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556,
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611,
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584,
];

/// Built-in metrics of a standard font.
#[derive(Debug, Clone, Copy, PartialEq)]
enum StandardMetrics {
    /// Proportional table plus the width used outside it.
    Table(&'static [u16; 95], f64),
    Monospace(f64),
}

impl StandardMetrics {
    /// Match a base font name, subset prefix already stripped.
    ///
    /// Times has no table of its own and borrows Helvetica's proportions.
    fn lookup(base_font: &str) -> Option<Self> {
        let bold = base_font.contains("Bold");
        if base_font.starts_with("Courier") {
            Some(StandardMetrics::Monospace(600.0))
        } else if base_font.starts_with("Helvetica")
            || base_font.starts_with("Arial")
            || base_font.starts_with("Times")
        {
            let table = if bold { &HELVETICA_BOLD } else { &HELVETICA };
            Some(StandardMetrics::Table(table, 556.0))
        } else {
            None
        }
    }

    fn width(&self, code: u32) -> f64 {
        match *self {
            StandardMetrics::Monospace(w) => w,
            StandardMetrics::Table(table, fallback) => (32..=126)
                .contains(&code)
                .then(|| f64::from(table[(code - 32) as usize]))
                .unwrap_or(fallback),
        }
    }
}

/// Remove a `ABCDEF+` subset tag from a base font name.
pub fn strip_subset_prefix(name: &str) -> &str {
    match name.split_once('+') {
        Some((tag, rest)) if tag.len() == 6 && tag.bytes().all(|b| b.is_ascii_uppercase()) => {
            rest
        }
        _ => name,
    }
}

#[derive(Debug, Clone, PartialEq)]
enum FontKind {
    /// One byte per code.
    Simple {
        first_char: u32,
        widths: Vec<f64>,
        missing_width: Option<f64>,
        standard: Option<StandardMetrics>,
    },
    /// Two bytes per code (Type0).
    Composite {
        widths: Vec<CidRange>,
        default_width: f64,
    },
}

/// One decoded character code.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedChar {
    pub code: u32,
    pub text: String,
    /// Number of source bytes; word spacing applies only to the 1-byte code 32.
    pub byte_len: usize,
}

/// Widths and decoding for one font resource.
#[derive(Debug, Clone, PartialEq)]
pub struct FontInfo {
    base_font: String,
    kind: FontKind,
}

impl FontInfo {
    /// A simple font known only by name.
    pub fn standard(base_font: &str) -> Self {
        let base_font = strip_subset_prefix(base_font).to_string();
        let standard = StandardMetrics::lookup(&base_font);
        Self {
            base_font,
            kind: FontKind::Simple {
                first_char: 0,
                widths: Vec::new(),
                missing_width: None,
                standard,
            },
        }
    }

    /// Placeholder for a font name missing from the resources.
    pub fn unknown() -> Self {
        Self::standard("")
    }

    /// Load from a font dictionary.
    pub fn from_dict(doc: &lopdf::Document, dict: &lopdf::Dictionary) -> Result<Self, BackendError> {
        let base_font = dict
            .get(b"BaseFont")
            .ok()
            .and_then(|o| resolve(doc, o).as_name().ok())
            .map(|n| String::from_utf8_lossy(n).into_owned())
            .unwrap_or_default();

        let subtype = dict
            .get(b"Subtype")
            .ok()
            .and_then(|o| o.as_name().ok())
            .unwrap_or(b"Type1".as_slice());

        if subtype == b"Type0" {
            return Self::composite(doc, dict, base_font);
        }

        let mut font = Self::standard(&base_font);
        if let FontKind::Simple {
            first_char,
            widths,
            missing_width,
            ..
        } = &mut font.kind
        {
            *first_char = dict
                .get(b"FirstChar")
                .ok()
                .and_then(|o| number(resolve(doc, o)))
                .map_or(0, |n| n.max(0.0) as u32);
            if let Some(array) = dict
                .get(b"Widths")
                .ok()
                .and_then(|o| resolve(doc, o).as_array().ok())
            {
                *widths = array
                    .iter()
                    .map(|w| number(resolve(doc, w)).unwrap_or(0.0))
                    .collect();
            }
            *missing_width = dict
                .get(b"FontDescriptor")
                .ok()
                .and_then(|o| resolve(doc, o).as_dict().ok())
                .and_then(|fd| fd.get(b"MissingWidth").ok())
                .and_then(|o| number(resolve(doc, o)));
        }
        Ok(font)
    }

    fn composite(
        doc: &lopdf::Document,
        dict: &lopdf::Dictionary,
        base_font: String,
    ) -> Result<Self, BackendError> {
        let descendant = dict
            .get(b"DescendantFonts")
            .ok()
            .and_then(|o| resolve(doc, o).as_array().ok())
            .and_then(|a| a.first())
            .map(|o| resolve(doc, o))
            .ok_or_else(|| {
                BackendError::Font(format!("Type0 font {base_font} has no DescendantFonts"))
            })?
            .as_dict()
            .map_err(|e| BackendError::Font(format!("descendant font is not a dictionary: {e}")))?;

        let default_width = descendant
            .get(b"DW")
            .ok()
            .and_then(|o| number(resolve(doc, o)))
            .unwrap_or(DEFAULT_CID_WIDTH);
        let widths = descendant
            .get(b"W")
            .ok()
            .and_then(|o| resolve(doc, o).as_array().ok())
            .map(|w| parse_cid_widths(doc, w))
            .unwrap_or_default();

        Ok(Self {
            base_font: strip_subset_prefix(&base_font).to_string(),
            kind: FontKind::Composite {
                widths,
                default_width,
            },
        })
    }

    pub fn base_font(&self) -> &str {
        &self.base_font
    }

    pub fn is_composite(&self) -> bool {
        matches!(self.kind, FontKind::Composite { .. })
    }

    /// Advance width of a code in glyph units (1/1000 of the font size).
    pub fn width(&self, code: u32) -> f64 {
        match &self.kind {
            FontKind::Simple {
                first_char,
                widths,
                missing_width,
                standard,
            } => code
                .checked_sub(*first_char)
                .and_then(|i| widths.get(i as usize).copied())
                .or(*missing_width)
                .or_else(|| standard.map(|s| s.width(code)))
                .unwrap_or(DEFAULT_WIDTH),
            FontKind::Composite {
                widths,
                default_width,
            } => widths
                .iter()
                .rev()
                .find(|r| (r.first..=r.last).contains(&code))
                .map_or(*default_width, |r| r.width),
        }
    }

    /// Split a shown string into character codes with their text.
    pub fn decode(&self, bytes: &[u8]) -> Vec<DecodedChar> {
        match self.kind {
            FontKind::Simple { .. } => bytes
                .iter()
                .map(|&b| {
                    let byte = [b];
                    let (text, _) = WINDOWS_1252.decode_without_bom_handling(&byte);
                    DecodedChar {
                        code: u32::from(b),
                        text: text.into_owned(),
                        byte_len: 1,
                    }
                })
                .collect(),
            FontKind::Composite { .. } => decode_utf16_codes(bytes),
        }
    }
}

fn decode_utf16_codes(bytes: &[u8]) -> Vec<DecodedChar> {
    let mut chars = Vec::new();
    let mut i = 0;
    while i + 1 < bytes.len() {
        let unit = u16::from_be_bytes([bytes[i], bytes[i + 1]]);
        let is_pair = (0xD800..0xDC00).contains(&unit)
            && bytes
                .get(i + 2..i + 4)
                .map(|next| u16::from_be_bytes([next[0], next[1]]))
                .is_some_and(|low| (0xDC00..0xE000).contains(&low));
        let len = if is_pair { 4 } else { 2 };
        let (text, _) = UTF_16BE.decode_without_bom_handling(&bytes[i..i + len]);
        chars.push(DecodedChar {
            code: u32::from(unit),
            text: text.into_owned(),
            byte_len: len,
        });
        i += len;
    }
    chars
}

/// Codes `first..=last` sharing one width; later ranges override earlier ones.
#[derive(Debug, Clone, Copy, PartialEq)]
struct CidRange {
    first: u32,
    last: u32,
    width: f64,
}

/// Parse a CIDFont `/W` array: `c [w1 w2 ...]` and `c_first c_last w` forms.
///
/// Codes beyond the 2-byte range are dropped and ranges are clamped to it.
fn parse_cid_widths(doc: &lopdf::Document, array: &[lopdf::Object]) -> Vec<CidRange> {
    let mut widths = Vec::new();
    let mut i = 0;
    while i < array.len() {
        let Some(start) = number(resolve(doc, &array[i])).and_then(cid) else {
            break;
        };
        match array.get(i + 1).map(|o| resolve(doc, o)) {
            Some(lopdf::Object::Array(list)) => {
                for (offset, w) in list.iter().enumerate() {
                    let code = u32::try_from(offset)
                        .ok()
                        .and_then(|offset| start.checked_add(offset))
                        .filter(|&code| code <= MAX_CID);
                    let Some(code) = code else {
                        break;
                    };
                    if let Some(w) = number(resolve(doc, w)) {
                        widths.push(CidRange {
                            first: code,
                            last: code,
                            width: w,
                        });
                    }
                }
                i += 2;
            }
            Some(end) => {
                let (Some(end), Some(w)) = (
                    number(end),
                    array.get(i + 2).and_then(|o| number(resolve(doc, o))),
                ) else {
                    break;
                };
                let last = end.clamp(0.0, f64::from(MAX_CID)) as u32;
                if start <= last {
                    widths.push(CidRange {
                        first: start,
                        last,
                        width: w,
                    });
                }
                i += 3;
            }
            None => break,
        }
    }
    widths
}

/// A `/W` start code, or `None` when it is outside the 2-byte range.
fn cid(value: f64) -> Option<u32> {
    let code = value.max(0.0);
    (code <= f64::from(MAX_CID)).then_some(code as u32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::{Document, Object, dictionary};

    #[test]
    fn subset_prefix_stripped() {
        assert_eq!(strip_subset_prefix("ABCDEF+Helvetica"), "Helvetica");
        assert_eq!(strip_subset_prefix("Helvetica"), "Helvetica");
        assert_eq!(strip_subset_prefix("abc+Font"), "abc+Font");
    }

    #[test]
    fn helvetica_standard_widths() {
        let font = FontInfo::standard("Helvetica");
        assert_eq!(font.width(u32::from(b' ')), 278.0);
        assert_eq!(font.width(u32::from(b'A')), 667.0);
        assert_eq!(font.width(u32::from(b'i')), 222.0);
        assert_eq!(font.width(0xE9), 556.0);
    }

    #[test]
    fn bold_and_courier_widths() {
        assert_eq!(FontInfo::standard("Helvetica-Bold").width(u32::from(b'b')), 611.0);
        assert_eq!(FontInfo::standard("Courier-Oblique").width(u32::from(b'i')), 600.0);
    }

    #[test]
    fn unknown_font_uses_default_width() {
        assert_eq!(FontInfo::unknown().width(65), DEFAULT_WIDTH);
        assert_eq!(FontInfo::standard("Garamond").width(65), DEFAULT_WIDTH);
    }

    #[test]
    fn widths_array_then_missing_width() {
        let mut doc = Document::with_version("1.5");
        let descriptor = doc.add_object(dictionary! {
            "Type" => "FontDescriptor",
            "MissingWidth" => 250,
        });
        let font_dict = dictionary! {
            "Type" => "Font",
            "Subtype" => "TrueType",
            "BaseFont" => "XYZABC+Custom",
            "FirstChar" => 65,
            "Widths" => vec![Object::Integer(700), Object::Real(710.5)],
            "FontDescriptor" => descriptor,
        };
        let font = FontInfo::from_dict(&doc, &font_dict).unwrap();
        assert_eq!(font.base_font(), "Custom");
        assert_eq!(font.width(65), 700.0);
        assert_eq!(font.width(66), 710.5);
        assert_eq!(font.width(67), 250.0);
        assert_eq!(font.width(10), 250.0);
    }

    #[test]
    fn widths_array_falls_back_to_standard_metrics() {
        let doc = Document::with_version("1.5");
        let font_dict = dictionary! {
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
            "FirstChar" => 65,
            "Widths" => vec![Object::Integer(700)],
        };
        let font = FontInfo::from_dict(&doc, &font_dict).unwrap();
        assert_eq!(font.width(65), 700.0);
        assert_eq!(font.width(u32::from(b'B')), 667.0);
    }

    #[test]
    fn winansi_decoding() {
        let font = FontInfo::standard("Helvetica");
        let decoded = font.decode(b"A\x80\xe9");
        let texts: Vec<&str> = decoded.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["A", "€", "é"]);
        assert_eq!(decoded[1].code, 0x80);
        assert!(decoded.iter().all(|c| c.byte_len == 1));
    }

    fn type0_font(doc: &mut Document) -> lopdf::Dictionary {
        let descendant = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "CIDFontType2",
            "BaseFont" => "Noto",
            "DW" => 900,
            "W" => vec![
                Object::Integer(65),
                Object::Array(vec![Object::Integer(500), Object::Integer(520)]),
                Object::Integer(100),
                Object::Integer(102),
                Object::Integer(300),
            ],
        });
        dictionary! {
            "Type" => "Font",
            "Subtype" => "Type0",
            "BaseFont" => "Noto",
            "Encoding" => "Identity-H",
            "DescendantFonts" => vec![Object::Reference(descendant)],
        }
    }

    #[test]
    fn type0_widths() {
        let mut doc = Document::with_version("1.5");
        let dict = type0_font(&mut doc);
        let font = FontInfo::from_dict(&doc, &dict).unwrap();
        assert!(font.is_composite());
        assert_eq!(font.width(65), 500.0);
        assert_eq!(font.width(66), 520.0);
        assert_eq!(font.width(101), 300.0);
        assert_eq!(font.width(200), 900.0);
    }

    fn cid_widths(w: Vec<Object>) -> Vec<CidRange> {
        parse_cid_widths(&Document::with_version("1.5"), &w)
    }

    #[test]
    fn cid_widths_past_code_space_are_dropped() {
        let widths = cid_widths(vec![
            Object::Integer(4_294_967_295),
            Object::Array(vec![Object::Integer(500), Object::Integer(500)]),
        ]);
        assert!(widths.is_empty());

        let widths = cid_widths(vec![
            Object::Integer(0xFFFE),
            Object::Array(vec![
                Object::Integer(400),
                Object::Integer(410),
                Object::Integer(420),
            ]),
        ]);
        assert_eq!(widths.len(), 2);
        assert_eq!(widths[1].first, 0xFFFF);
    }

    #[test]
    fn cid_width_range_is_stored_as_interval() {
        let widths = cid_widths(vec![
            Object::Integer(0),
            Object::Integer(50_000_000),
            Object::Integer(500),
            Object::Integer(10),
            Object::Array(vec![Object::Integer(250)]),
        ]);
        assert_eq!(
            widths[0],
            CidRange {
                first: 0,
                last: MAX_CID,
                width: 500.0
            }
        );
        let font = FontInfo {
            base_font: "Noto".into(),
            kind: FontKind::Composite {
                widths,
                default_width: 1000.0,
            },
        };
        assert_eq!(font.width(10), 250.0);
        assert_eq!(font.width(0xFFFF), 500.0);
        assert_eq!(font.width(0x1_0000), 1000.0);
    }

    #[test]
    fn type0_decodes_utf16() {
        let mut doc = Document::with_version("1.5");
        let dict = type0_font(&mut doc);
        let font = FontInfo::from_dict(&doc, &dict).unwrap();
        let decoded = font.decode(&[0x00, 0x41, 0x4E, 0x2D, 0xD8, 0x3D, 0xDE, 0x00]);
        let texts: Vec<&str> = decoded.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["A", "中", "😀"]);
        assert_eq!(decoded[2].byte_len, 4);
    }

    #[test]
    fn type0_without_descendant_is_font_error() {
        let doc = Document::with_version("1.5");
        let dict = dictionary! { "Subtype" => "Type0", "BaseFont" => "Broken" };
        assert!(matches!(
            FontInfo::from_dict(&doc, &dict),
            Err(BackendError::Font(_))
        ));
    }
}
