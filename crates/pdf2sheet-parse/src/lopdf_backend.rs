//! lopdf-based layout source.
//!
//! [`LopdfDocument`] opens a PDF held in memory and turns each page into a
//! [`PageLayout`] by running the content stream interpreter with a
//! [`LayoutCollector`].

use std::sync::LazyLock;

use lopdf::{Dictionary, Document, Object, ObjectId};
use pdf2sheet_core::{LayoutSource, PageLayout, PdfError};

use crate::error::BackendError;
use crate::handler::LayoutCollector;
use crate::interpreter::{InterpreterState, interpret_content, stream_content};
use crate::objects::{rect_from_array, resolve};
use crate::page_geometry::{PageGeometry, PdfRect};

/// A parsed PDF document backed by lopdf.
pub struct LopdfDocument {
    inner: Document,
    /// Page object ids in page order.
    page_ids: Vec<ObjectId>,
}

impl std::fmt::Debug for LopdfDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LopdfDocument")
            .field("page_count", &self.page_ids.len())
            .finish_non_exhaustive()
    }
}

impl LopdfDocument {
    /// Parse a PDF from bytes.
    ///
    /// Encrypted documents are rejected with [`PdfError::PasswordRequired`].
    pub fn open(bytes: &[u8]) -> Result<Self, BackendError> {
        let inner = Document::load_mem(bytes)
            .map_err(|e| BackendError::Parse(format!("failed to parse PDF: {e}")))?;

        if inner.is_encrypted() {
            return Err(BackendError::Core(PdfError::PasswordRequired));
        }

        // get_pages is keyed by 1-based page number
        let page_ids = inner.get_pages().values().copied().collect();
        Ok(Self { inner, page_ids })
    }

    /// Access the underlying lopdf document.
    pub fn inner(&self) -> &Document {
        &self.inner
    }

    fn page_id(&self, index: usize) -> Result<ObjectId, BackendError> {
        self.page_ids.get(index).copied().ok_or(BackendError::Core(
            PdfError::PageOutOfRange {
                index,
                page_count: self.page_ids.len(),
            },
        ))
    }

    /// Visible area of the page at `index`.
    pub fn page_geometry(&self, index: usize) -> Result<PageGeometry, BackendError> {
        let page_id = self.page_id(index)?;
        let media_box = page_box(&self.inner, page_id, b"MediaBox")?
            .ok_or_else(|| BackendError::Parse("MediaBox not found on page or ancestors".into()))?;
        let crop_box = page_box(&self.inner, page_id, b"CropBox")?;
        Ok(PageGeometry::new(media_box, crop_box))
    }

    /// Extract glyphs, rulings and rects of the page at 0-based `index`.
    pub fn extract_page(&self, index: usize) -> Result<PageLayout, BackendError> {
        let page_id = self.page_id(index)?;
        let geometry = self.page_geometry(index)?;
        let page_dict = self
            .inner
            .get_object(page_id)
            .and_then(|o| o.as_dict())
            .map_err(|e| BackendError::Parse(format!("failed to get page dictionary: {e}")))?;
        let content = page_content_bytes(&self.inner, page_dict)?;
        let resources = page_resources(&self.inner, page_id)?;

        let mut collector = LayoutCollector::new(geometry);
        let mut state = InterpreterState::new();
        interpret_content(&self.inner, &content, resources, &mut collector, &mut state, 0)?;
        let layout = collector.into_layout(index + 1);

        #[cfg(feature = "tracing")]
        tracing::debug!(
            page = index + 1,
            glyphs = layout.glyphs.len(),
            rulings = layout.rulings.len(),
            rects = layout.rects.len(),
            "page layout extracted"
        );
        Ok(layout)
    }
}

impl LayoutSource for LopdfDocument {
    fn page_count(&self) -> usize {
        self.page_ids.len()
    }

    fn page_layout(&self, index: usize) -> Result<PageLayout, PdfError> {
        self.extract_page(index).map_err(PdfError::from)
    }
}

/// Look up a key on the page, walking up the page tree through `/Parent`.
fn resolve_inherited<'a>(
    doc: &'a Document,
    page_id: ObjectId,
    key: &[u8],
) -> Result<Option<&'a Object>, BackendError> {
    let mut current_id = page_id;
    // a malformed tree can loop; no real tree is this deep
    for _ in 0..64 {
        let dict = doc
            .get_object(current_id)
            .and_then(|o| o.as_dict())
            .map_err(|e| BackendError::Parse(format!("failed to get page dictionary: {e}")))?;

        if let Ok(value) = dict.get(key) {
            return Ok(Some(resolve(doc, value)));
        }

        match dict.get(b"Parent") {
            Ok(parent) => {
                current_id = parent
                    .as_reference()
                    .map_err(|e| BackendError::Parse(format!("invalid /Parent reference: {e}")))?;
            }
            Err(_) => return Ok(None),
        }
    }
    Err(BackendError::Parse("page tree /Parent chain too deep".into()))
}

fn page_box(doc: &Document, page_id: ObjectId, key: &[u8]) -> Result<Option<PdfRect>, BackendError> {
    let Some(obj) = resolve_inherited(doc, page_id, key)? else {
        return Ok(None);
    };
    let array = obj.as_array().map_err(|e| {
        BackendError::Parse(format!("{} is not an array: {e}", String::from_utf8_lossy(key)))
    })?;
    rect_from_array(doc, array).map(Some)
}

/// Content stream bytes of a page. Arrays of streams are joined with a space.
fn page_content_bytes(doc: &Document, page_dict: &Dictionary) -> Result<Vec<u8>, BackendError> {
    let Ok(contents) = page_dict.get(b"Contents") else {
        return Ok(Vec::new());
    };

    match resolve(doc, contents) {
        Object::Stream(stream) => stream_content(stream),
        Object::Array(items) => {
            let mut content = Vec::new();
            for item in items {
                let stream = resolve(doc, item).as_stream().map_err(|e| {
                    BackendError::Parse(format!("/Contents array item is not a stream: {e}"))
                })?;
                let bytes = stream_content(stream)?;
                if !content.is_empty() {
                    content.push(b' ');
                }
                content.extend_from_slice(&bytes);
            }
            Ok(content)
        }
        _ => Err(BackendError::Parse(
            "/Contents is not a stream or array".to_string(),
        )),
    }
}

fn page_resources(doc: &Document, page_id: ObjectId) -> Result<&Dictionary, BackendError> {
    static EMPTY: LazyLock<Dictionary> = LazyLock::new(Dictionary::new);
    match resolve_inherited(doc, page_id, b"Resources")? {
        Some(obj) => obj
            .as_dict()
            .map_err(|_| BackendError::Parse("/Resources is not a dictionary".to_string())),
        None => Ok(&EMPTY),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::{Stream, dictionary};

    /// One page per content stream, Helvetica as /F1, US Letter.
    fn build_pdf(pages: &[&[u8]]) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });

        let mut kids: Vec<Object> = Vec::new();
        for content in pages {
            let content_id = doc.add_object(Stream::new(dictionary! {}, content.to_vec()));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            });
            kids.push(page_id.into());
        }

        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => pages.len() as i64,
                "Resources" => resources_id,
                "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut buf = Vec::new();
        doc.save_to(&mut buf).expect("failed to save test PDF");
        buf
    }

    fn single_page(page: Dictionary) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let mut page = page;
        page.set("Type", "Page");
        page.set("Parent", pages_id);
        let page_id = doc.add_object(page);
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![Object::from(page_id)],
                "Count" => 1i64,
                "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        let mut buf = Vec::new();
        doc.save_to(&mut buf).expect("failed to save test PDF");
        buf
    }

    #[test]
    fn open_counts_pages() {
        let doc = LopdfDocument::open(&build_pdf(&[b"", b"", b""])).unwrap();
        assert_eq!(doc.page_count(), 3);
        assert!(format!("{doc:?}").contains("page_count: 3"));
    }

    #[test]
    fn garbage_is_parse_error() {
        let err = LopdfDocument::open(b"not a pdf").unwrap_err();
        assert!(matches!(err, BackendError::Parse(_)));
    }

    #[test]
    fn media_box_is_inherited() {
        let doc = LopdfDocument::open(&single_page(dictionary! {})).unwrap();
        let layout = doc.page_layout(0).unwrap();
        assert_eq!(layout.width, 595.0);
        assert_eq!(layout.height, 842.0);
        assert!(layout.glyphs.is_empty());
    }

    #[test]
    fn crop_box_bounds_visible_area() {
        let doc = LopdfDocument::open(&single_page(dictionary! {
            "CropBox" => vec![
                Object::Real(36.0),
                Object::Real(36.0),
                Object::Real(576.0),
                Object::Real(756.0),
            ],
        }))
        .unwrap();
        let layout = doc.page_layout(0).unwrap();
        assert_eq!(layout.width, 540.0);
        assert_eq!(layout.height, 720.0);
    }

    #[test]
    fn out_of_range_page() {
        let doc = LopdfDocument::open(&build_pdf(&[b""])).unwrap();
        assert_eq!(
            doc.page_layout(5).unwrap_err(),
            PdfError::PageOutOfRange {
                index: 5,
                page_count: 1
            }
        );
    }

    #[test]
    fn text_positions_are_top_left() {
        let doc = LopdfDocument::open(&build_pdf(&[b"BT /F1 10 Tf 100 700 Td (Hello) Tj ET"])).unwrap();
        let layout = doc.page_layout(0).unwrap();
        assert_eq!(layout.page_number, 1);
        let text: String = layout.glyphs.iter().map(|g| g.text.as_str()).collect();
        assert_eq!(text, "Hello");
        let h = &layout.glyphs[0];
        assert!((h.x0 - 100.0).abs() < 1e-6);
        assert!((h.top - 84.5).abs() < 1e-6);
        assert!((h.bottom() - 94.5).abs() < 1e-6);
    }

    #[test]
    fn ruled_grid_gives_rulings() {
        let content = b"1 w 100 700 m 300 700 l S 100 650 m 300 650 l S \
                        100 700 m 100 650 l S 300 700 m 300 650 l S";
        let doc = LopdfDocument::open(&build_pdf(&[content])).unwrap();
        let layout = doc.page_layout(0).unwrap();
        assert_eq!(layout.rulings.len(), 4);
        assert!(layout.rects.is_empty());
    }

    #[test]
    fn array_contents_are_joined() {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let a = doc.add_object(Stream::new(dictionary! {}, b"10 10 50 20 re".to_vec()));
        let b = doc.add_object(Stream::new(dictionary! {}, b"f".to_vec()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            "Contents" => vec![Object::from(a), Object::from(b)],
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![Object::from(page_id)],
                "Count" => 1i64,
            }),
        );
        let catalog_id = doc.add_object(dictionary! { "Type" => "Catalog", "Pages" => pages_id });
        doc.trailer.set("Root", catalog_id);
        let mut buf = Vec::new();
        doc.save_to(&mut buf).unwrap();

        let layout = LopdfDocument::open(&buf).unwrap().page_layout(0).unwrap();
        assert_eq!(layout.rects.len(), 1);
    }

    #[test]
    fn broken_content_is_page_error() {
        let doc = LopdfDocument::open(&build_pdf(&[b"", b"/Missing Do"])).unwrap();
        assert!(doc.page_layout(0).is_ok());
        assert!(matches!(
            doc.page_layout(1).unwrap_err(),
            PdfError::InterpreterError(_)
        ));
    }
}
