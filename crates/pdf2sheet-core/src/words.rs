//! Word and text-line grouping over glyphs.
//!
//! Glyphs are walked in reading order; a word ends at a blank glyph, at a
//! horizontal gap wider than `x_tolerance`, or when the baseline moves by more
//! than `y_tolerance`.

use crate::geometry::BBox;
use crate::layout::{Glyph, reading_order};

/// Options for [`WordExtractor`].
#[derive(Debug, Clone)]
pub struct WordOptions {
    /// Maximum horizontal gap between glyphs of the same word.
    pub x_tolerance: f64,
    /// Maximum vertical drift between glyphs of the same word.
    pub y_tolerance: f64,
}

impl Default for WordOptions {
    fn default() -> Self {
        Self {
            x_tolerance: 3.0,
            y_tolerance: 3.0,
        }
    }
}

/// A run of adjacent non-blank glyphs.
#[derive(Debug, Clone, PartialEq)]
pub struct Word {
    pub text: String,
    pub bbox: BBox,
}

pub struct WordExtractor;

impl WordExtractor {
    /// Group glyphs into words in reading order.
    pub fn extract<'a, I>(glyphs: I, options: &WordOptions) -> Vec<Word>
    where
        I: IntoIterator<Item = &'a Glyph>,
    {
        let mut sorted: Vec<&Glyph> = glyphs.into_iter().collect();
        sorted.sort_by(|a, b| reading_order(a.top, a.x0, b.top, b.x0));

        let mut words = Vec::new();
        let mut current: Vec<&Glyph> = Vec::new();

        for glyph in sorted {
            if glyph.is_blank() {
                if !current.is_empty() {
                    words.push(Self::make_word(&current));
                    current.clear();
                }
                continue;
            }

            if let Some(last) = current.last() {
                if Self::should_split(last, glyph, options) {
                    words.push(Self::make_word(&current));
                    current.clear();
                }
            }
            current.push(glyph);
        }

        if !current.is_empty() {
            words.push(Self::make_word(&current));
        }
        words
    }

    fn should_split(last: &Glyph, current: &Glyph, options: &WordOptions) -> bool {
        let x_gap = current.x0 - last.x1();
        let y_diff = (current.top - last.top).abs();
        x_gap > options.x_tolerance || x_gap < -options.x_tolerance || y_diff > options.y_tolerance
    }

    fn make_word(glyphs: &[&Glyph]) -> Word {
        let text: String = glyphs.iter().map(|g| g.text.as_str()).collect();
        let mut bbox = glyphs[0].bbox();
        for g in &glyphs[1..] {
            bbox = bbox.union(&g.bbox());
        }
        Word { text, bbox }
    }
}

/// Group words into text lines by `top` proximity.
///
/// Lines come back top-to-bottom with words left-to-right. A word joins the
/// current line when its top is within `y_tolerance` of the line's first word.
pub fn group_lines<'a>(words: &'a [Word], y_tolerance: f64) -> Vec<Vec<&'a Word>> {
    let mut sorted: Vec<&Word> = words.iter().collect();
    sorted.sort_by(|a, b| reading_order(a.bbox.top, a.bbox.x0, b.bbox.top, b.bbox.x0));

    let mut lines: Vec<Vec<&Word>> = Vec::new();
    for word in sorted {
        let same_line = lines
            .last()
            .is_some_and(|line| (word.bbox.top - line[0].bbox.top).abs() <= y_tolerance);
        match lines.last_mut() {
            Some(line) if same_line => line.push(word),
            _ => lines.push(vec![word]),
        }
    }
    for line in &mut lines {
        line.sort_by(|a, b| a.bbox.x0.total_cmp(&b.bbox.x0));
    }
    lines
}

/// Join lines of words: spaces within a line, newlines between lines.
pub fn lines_to_text(lines: &[Vec<&Word>]) -> String {
    lines
        .iter()
        .map(|line| {
            line.iter()
                .map(|w| w.text.as_str())
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect::<Vec<_>>()
        .join("\n")
}
