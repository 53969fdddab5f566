//! Small helpers over lopdf objects.

use lopdf::{Document, Object};

use crate::error::BackendError;
use crate::page_geometry::PdfRect;

/// Follow an indirect reference; anything else, or a dangling reference,
/// comes back unchanged.
pub(crate) fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> &'a Object {
    match obj {
        Object::Reference(id) => doc.get_object(*id).unwrap_or(obj),
        other => other,
    }
}

/// Integer or real as `f64`.
pub(crate) fn number(obj: &Object) -> Option<f64> {
    match obj {
        Object::Integer(i) => Some(*i as f64),
        Object::Real(f) => Some(f64::from(*f)),
        _ => None,
    }
}

/// A `[x0 y0 x1 y1]` box.
pub(crate) fn rect_from_array(doc: &Document, array: &[Object]) -> Result<PdfRect, BackendError> {
    if array.len() != 4 {
        return Err(BackendError::Parse(format!(
            "expected 4-element array for box, got {}",
            array.len()
        )));
    }
    let mut values = [0.0; 4];
    for (slot, obj) in values.iter_mut().zip(array) {
        *slot = number(resolve(doc, obj))
            .ok_or_else(|| BackendError::Parse(format!("expected number, got {obj:?}")))?;
    }
    Ok(PdfRect::new(values[0], values[1], values[2], values[3]))
}
