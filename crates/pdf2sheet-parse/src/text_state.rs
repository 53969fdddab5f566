//! Text state: the parameters set by `Tc Tw Tz TL Tf Ts` and the text and
//! line matrices driven by `BT Tm Td TD T*` and glyph advances.

use pdf2sheet_core::geometry::Ctm;

/// Glyph-space ascent, per mille of the font size.
pub const ASCENT: f64 = 750.0;
/// Glyph-space descent, per mille of the font size.
pub const DESCENT: f64 = -250.0;

/// Text parameters that belong to the graphics state and follow `q`/`Q`.
#[derive(Debug, Clone, PartialEq)]
pub struct TextParams {
    pub char_spacing: f64,
    pub word_spacing: f64,
    /// Horizontal scaling in percent.
    pub h_scaling: f64,
    pub leading: f64,
    /// Resource name of the current font (the operand of `Tf`).
    pub font_name: String,
    pub font_size: f64,
    pub rise: f64,
}

impl Default for TextParams {
    fn default() -> Self {
        Self {
            char_spacing: 0.0,
            word_spacing: 0.0,
            h_scaling: 100.0,
            leading: 0.0,
            font_name: String::new(),
            font_size: 0.0,
            rise: 0.0,
        }
    }
}

/// A glyph box in PDF user space (bottom-left origin).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UserBox {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

#[derive(Debug, Clone, Default)]
pub struct TextState {
    pub params: TextParams,
    text_matrix: Ctm,
    line_matrix: Ctm,
}

impl TextState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text_matrix(&self) -> &Ctm {
        &self.text_matrix
    }

    /// `BT`
    pub fn begin_text(&mut self) {
        self.text_matrix = Ctm::identity();
        self.line_matrix = Ctm::identity();
    }

    /// `Tm`: replaces both matrices.
    pub fn set_text_matrix(&mut self, m: Ctm) {
        self.text_matrix = m;
        self.line_matrix = m;
    }

    /// `Td`
    pub fn move_text_position(&mut self, tx: f64, ty: f64) {
        self.line_matrix = Ctm::new(1.0, 0.0, 0.0, 1.0, tx, ty).concat(&self.line_matrix);
        self.text_matrix = self.line_matrix;
    }

    /// `TD`: sets leading to `-ty`, then `Td`.
    pub fn move_text_position_and_set_leading(&mut self, tx: f64, ty: f64) {
        self.params.leading = -ty;
        self.move_text_position(tx, ty);
    }

    /// `T*`
    pub fn move_to_next_line(&mut self) {
        let leading = self.params.leading;
        self.move_text_position(0.0, -leading);
    }

    fn h_scale(&self) -> f64 {
        self.params.h_scaling / 100.0
    }

    /// Text rendering matrix for the current glyph: `[size·Th 0 0 size 0 rise] × Tm × CTM`.
    pub fn rendering_matrix(&self, ctm: &Ctm) -> Ctm {
        let p = &self.params;
        Ctm::new(p.font_size * self.h_scale(), 0.0, 0.0, p.font_size, 0.0, p.rise)
            .concat(&self.text_matrix)
            .concat(ctm)
    }

    /// Box of a glyph of `width` glyph units at the current position.
    pub fn glyph_box(&self, ctm: &Ctm, width: f64) -> UserBox {
        let trm = self.rendering_matrix(ctm);
        let corners = [
            trm.transform_point(0.0, DESCENT / 1000.0),
            trm.transform_point(width / 1000.0, DESCENT / 1000.0),
            trm.transform_point(0.0, ASCENT / 1000.0),
            trm.transform_point(width / 1000.0, ASCENT / 1000.0),
        ];
        let fold = |init: f64, pick: fn(&(f64, f64)) -> f64, f: fn(f64, f64) -> f64| {
            corners.iter().map(pick).fold(init, f)
        };
        UserBox {
            x0: fold(f64::INFINITY, |p| p.0, f64::min),
            y0: fold(f64::INFINITY, |p| p.1, f64::min),
            x1: fold(f64::NEG_INFINITY, |p| p.0, f64::max),
            y1: fold(f64::NEG_INFINITY, |p| p.1, f64::max),
        }
    }

    /// Move past a shown glyph: `(w0/1000·size + Tc + Tw·[space]) · Th`.
    pub fn advance_glyph(&mut self, width: f64, is_space: bool) {
        let p = &self.params;
        let word = if is_space { p.word_spacing } else { 0.0 };
        let tx = (width / 1000.0 * p.font_size + p.char_spacing + word) * self.h_scale();
        self.translate(tx);
    }

    /// Apply a `TJ` number (thousandths of text space, subtracted).
    pub fn adjust(&mut self, amount: f64) {
        let tx = -(amount / 1000.0) * self.params.font_size * self.h_scale();
        self.translate(tx);
    }

    fn translate(&mut self, tx: f64) {
        self.text_matrix = Ctm::new(1.0, 0.0, 0.0, 1.0, tx, 0.0).concat(&self.text_matrix);
    }
}
