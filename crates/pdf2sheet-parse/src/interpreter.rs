//! Content stream interpreter.
//!
//! Decodes operations with lopdf, tracks the graphics and text state, and
//! reports glyphs and painted paths to a [`ContentHandler`]. Form XObjects
//! are entered through `Do` up to [`MAX_FORM_DEPTH`] levels deep.

use std::collections::HashMap;

use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, Stream};
use pdf2sheet_core::geometry::Ctm;

use crate::error::BackendError;
use crate::fonts::FontInfo;
use crate::handler::{ContentHandler, GlyphEvent, PaintOp, PathEvent};
use crate::objects::{number, resolve};
use crate::shapes::PathBuilder;
use crate::text_state::{TextParams, TextState};

/// Deepest Form XObject nesting that is still interpreted.
pub const MAX_FORM_DEPTH: usize = 8;

/// Graphics state carried across one page, including nested forms.
#[derive(Debug, Default)]
pub struct InterpreterState {
    ctm: Ctm,
    stack: Vec<(Ctm, TextParams)>,
    pub text: TextState,
    path: PathBuilder,
}

impl InterpreterState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ctm(&self) -> &Ctm {
        &self.ctm
    }

    /// `q`
    pub fn save(&mut self) {
        self.stack.push((self.ctm, self.text.params.clone()));
    }

    /// `Q`; an unbalanced `Q` is ignored.
    pub fn restore(&mut self) {
        if let Some((ctm, params)) = self.stack.pop() {
            self.ctm = ctm;
            self.text.params = params;
        }
    }

    /// `cm`: the new matrix applies before the current CTM.
    pub fn concat(&mut self, m: Ctm) {
        self.ctm = m.concat(&self.ctm);
    }
}

fn operand_f64(operands: &[Object], index: usize) -> Option<f64> {
    operands.get(index).and_then(number)
}

fn operand_matrix(operands: &[Object]) -> Option<Ctm> {
    if operands.len() < 6 {
        return None;
    }
    let mut m = [0.0; 6];
    for (slot, obj) in m.iter_mut().zip(operands) {
        *slot = number(obj)?;
    }
    Some(Ctm::from_array(m))
}

fn operand_name(operands: &[Object], index: usize) -> Option<&[u8]> {
    operands.get(index).and_then(|o| o.as_name().ok())
}

fn operand_string(operands: &[Object], index: usize) -> Option<&[u8]> {
    match operands.get(index) {
        Some(Object::String(bytes, _)) => Some(bytes),
        _ => None,
    }
}

/// Decompress a stream when it carries a `/Filter`.
pub(crate) fn stream_content(stream: &Stream) -> Result<Vec<u8>, BackendError> {
    if stream.dict.get(b"Filter").is_ok() {
        stream
            .decompressed_content()
            .map_err(|e| BackendError::Parse(format!("failed to decompress content stream: {e}")))
    } else {
        Ok(stream.content.clone())
    }
}

/// Fonts of one resource dictionary, loaded on first use.
struct FontCache<'a> {
    doc: &'a Document,
    resources: &'a Dictionary,
    fonts: HashMap<Vec<u8>, FontInfo>,
    unknown: FontInfo,
}

impl<'a> FontCache<'a> {
    fn new(doc: &'a Document, resources: &'a Dictionary) -> Self {
        Self {
            doc,
            resources,
            fonts: HashMap::new(),
            unknown: FontInfo::unknown(),
        }
    }

    fn load(&self, name: &[u8]) -> Option<FontInfo> {
        let font_dict = self
            .resources
            .get(b"Font")
            .ok()
            .and_then(|o| resolve(self.doc, o).as_dict().ok())?
            .get(name)
            .ok()
            .and_then(|o| resolve(self.doc, o).as_dict().ok())?;
        match FontInfo::from_dict(self.doc, font_dict) {
            Ok(font) => Some(font),
            Err(_err) => {
                #[cfg(feature = "tracing")]
                tracing::warn!(font = %String::from_utf8_lossy(name), error = %_err, "unusable font");
                None
            }
        }
    }

    fn get(&mut self, name: &str) -> &FontInfo {
        let key = name.as_bytes();
        if !self.fonts.contains_key(key) {
            match self.load(key) {
                Some(font) => {
                    self.fonts.insert(key.to_vec(), font);
                }
                None => {
                    #[cfg(feature = "tracing")]
                    tracing::debug!(font = name, "font not found in resources, using default widths");
                    return &self.unknown;
                }
            }
        }
        self.fonts.get(key).unwrap_or(&self.unknown)
    }
}

/// Interpret one content stream against `resources`.
///
/// `depth` is 0 for the page itself and grows by one per Form XObject.
pub fn interpret_content(
    doc: &Document,
    content: &[u8],
    resources: &Dictionary,
    handler: &mut dyn ContentHandler,
    state: &mut InterpreterState,
    depth: usize,
) -> Result<(), BackendError> {
    let content = Content::decode(content)
        .map_err(|e| BackendError::Interpreter(format!("failed to decode content stream: {e}")))?;
    let mut fonts = FontCache::new(doc, resources);

    for op in &content.operations {
        apply_operation(doc, resources, handler, state, &mut fonts, op, depth)?;
    }
    Ok(())
}

fn apply_operation(
    doc: &Document,
    resources: &Dictionary,
    handler: &mut dyn ContentHandler,
    state: &mut InterpreterState,
    fonts: &mut FontCache<'_>,
    op: &Operation,
    depth: usize,
) -> Result<(), BackendError> {
    let operands = op.operands.as_slice();
    match op.operator.as_str() {
        // --- graphics state ---
        "q" => state.save(),
        "Q" => state.restore(),
        "cm" => {
            if let Some(m) = operand_matrix(operands) {
                state.concat(m);
            }
        }

        // --- text objects and state ---
        "BT" => state.text.begin_text(),
        "ET" => {}
        "Tf" => {
            if let (Some(name), Some(size)) = (operand_name(operands, 0), operand_f64(operands, 1)) {
                state.text.params.font_name = String::from_utf8_lossy(name).into_owned();
                state.text.params.font_size = size;
            }
        }
        "Tm" => {
            if let Some(m) = operand_matrix(operands) {
                state.text.set_text_matrix(m);
            }
        }
        "Td" => {
            if let (Some(tx), Some(ty)) = (operand_f64(operands, 0), operand_f64(operands, 1)) {
                state.text.move_text_position(tx, ty);
            }
        }
        "TD" => {
            if let (Some(tx), Some(ty)) = (operand_f64(operands, 0), operand_f64(operands, 1)) {
                state.text.move_text_position_and_set_leading(tx, ty);
            }
        }
        "T*" => state.text.move_to_next_line(),
        "Tc" => set_param(operands, &mut state.text.params.char_spacing),
        "Tw" => set_param(operands, &mut state.text.params.word_spacing),
        "Tz" => set_param(operands, &mut state.text.params.h_scaling),
        "TL" => set_param(operands, &mut state.text.params.leading),
        "Ts" => set_param(operands, &mut state.text.params.rise),

        // --- text showing ---
        "Tj" => {
            if let Some(bytes) = operand_string(operands, 0) {
                show_string(state, fonts, handler, bytes);
            }
        }
        "'" => {
            state.text.move_to_next_line();
            if let Some(bytes) = operand_string(operands, 0) {
                show_string(state, fonts, handler, bytes);
            }
        }
        "\"" => {
            if let (Some(aw), Some(ac)) = (operand_f64(operands, 0), operand_f64(operands, 1)) {
                state.text.params.word_spacing = aw;
                state.text.params.char_spacing = ac;
            }
            state.text.move_to_next_line();
            if let Some(bytes) = operand_string(operands, 2) {
                show_string(state, fonts, handler, bytes);
            }
        }
        "TJ" => {
            if let Some(Object::Array(items)) = operands.first() {
                for item in items {
                    match item {
                        Object::String(bytes, _) => show_string(state, fonts, handler, bytes),
                        other => {
                            if let Some(amount) = number(other) {
                                state.text.adjust(amount);
                            }
                        }
                    }
                }
            }
        }

        // --- path construction ---
        "m" | "l" => {
            if let (Some(x), Some(y)) = (operand_f64(operands, 0), operand_f64(operands, 1)) {
                let ctm = state.ctm;
                if op.operator == "m" {
                    state.path.move_to(&ctm, x, y);
                } else {
                    state.path.line_to(&ctm, x, y);
                }
            }
        }
        "c" | "v" | "y" => {
            let n = operands.len();
            if n >= 2 {
                if let (Some(x), Some(y)) = (operand_f64(operands, n - 2), operand_f64(operands, n - 1)) {
                    let ctm = state.ctm;
                    state.path.curve_to(&ctm, x, y);
                }
            }
        }
        "re" => {
            let values: Option<Vec<f64>> = (0..4).map(|i| operand_f64(operands, i)).collect();
            if let Some(v) = values {
                let ctm = state.ctm;
                state.path.rect(&ctm, v[0], v[1], v[2], v[3]);
            }
        }
        "h" => state.path.close(),

        // --- path painting ---
        "S" => paint(state, handler, PaintOp::Stroke, false),
        "s" => paint(state, handler, PaintOp::Stroke, true),
        "f" | "F" | "f*" => paint(state, handler, PaintOp::Fill, false),
        "B" | "B*" => paint(state, handler, PaintOp::FillAndStroke, false),
        "b" | "b*" => paint(state, handler, PaintOp::FillAndStroke, true),
        "n" => {
            state.path.take();
        }

        // --- XObjects ---
        "Do" => {
            if let Some(name) = operand_name(operands, 0) {
                run_xobject(doc, resources, handler, state, name, depth)?;
            }
        }

        _ => {}
    }
    Ok(())
}

fn set_param(operands: &[Object], slot: &mut f64) {
    if let Some(v) = operand_f64(operands, 0) {
        *slot = v;
    }
}

fn show_string(
    state: &mut InterpreterState,
    fonts: &mut FontCache<'_>,
    handler: &mut dyn ContentHandler,
    bytes: &[u8],
) {
    let font = fonts.get(&state.text.params.font_name);
    for ch in font.decode(bytes) {
        let width = font.width(ch.code);
        let bbox = state.text.glyph_box(&state.ctm, width);
        let is_space = ch.byte_len == 1 && ch.code == 32;
        handler.on_glyph(GlyphEvent {
            text: ch.text,
            bbox,
        });
        state.text.advance_glyph(width, is_space);
    }
}

fn paint(state: &mut InterpreterState, handler: &mut dyn ContentHandler, op: PaintOp, close: bool) {
    if close {
        state.path.close();
    }
    let subpaths = state.path.take();
    if !subpaths.is_empty() {
        handler.on_path(PathEvent {
            subpaths,
            paint: op,
        });
    }
}

fn run_xobject(
    doc: &Document,
    resources: &Dictionary,
    handler: &mut dyn ContentHandler,
    state: &mut InterpreterState,
    name: &[u8],
    depth: usize,
) -> Result<(), BackendError> {
    let xobject_name = String::from_utf8_lossy(name);
    let stream = resources
        .get(b"XObject")
        .ok()
        .and_then(|o| resolve(doc, o).as_dict().ok())
        .and_then(|xobjects| xobjects.get(name).ok())
        .map(|o| resolve(doc, o))
        .ok_or_else(|| BackendError::Interpreter(format!("XObject /{xobject_name} not found in resources")))?
        .as_stream()
        .map_err(|e| BackendError::Interpreter(format!("XObject /{xobject_name} is not a stream: {e}")))?;

    let is_form = stream
        .dict
        .get(b"Subtype")
        .ok()
        .and_then(|o| o.as_name().ok())
        .is_some_and(|s| s == b"Form");
    if !is_form {
        return Ok(());
    }
    if depth >= MAX_FORM_DEPTH {
        #[cfg(feature = "tracing")]
        tracing::warn!(xobject = %xobject_name, depth, "Form XObject nested too deep, skipped");
        return Ok(());
    }

    let content = stream_content(stream)?;
    let form_resources = stream
        .dict
        .get(b"Resources")
        .ok()
        .and_then(|o| resolve(doc, o).as_dict().ok())
        .unwrap_or(resources);

    state.save();
    if let Some(m) = stream
        .dict
        .get(b"Matrix")
        .ok()
        .and_then(|o| resolve(doc, o).as_array().ok())
        .and_then(|a| operand_matrix(a))
    {
        state.concat(m);
    }
    let result = interpret_content(doc, &content, form_resources, handler, state, depth + 1);
    state.restore();
    result
}
