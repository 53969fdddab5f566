//! PDF fixtures generated in-test with lopdf.
//!
//! Every page is US Letter with Helvetica available as `/F1`.

#![allow(dead_code)]

use std::fmt::Write as _;

use lopdf::{Document, Object, Stream, dictionary};

/// Build a PDF with one page per content stream.
pub fn build_pdf(pages: &[Vec<u8>]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });

    let mut kids: Vec<Object> = Vec::new();
    for content in pages {
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.clone()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            "Contents" => content_id,
            "Resources" => dictionary! {
                "Font" => dictionary! { "F1" => Object::Reference(font_id) },
            },
        });
        kids.push(page_id.into());
    }

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => pages.len() as i64,
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

/// Escape a string for a PDF literal.
fn literal(text: &str) -> String {
    text.replace('\\', "\\\\").replace('(', "\\(").replace(')', "\\)")
}

/// `BT ... ET` showing `text` at baseline `(x, y)` in 10pt Helvetica.
pub fn text_at(text: &str, x: f64, y: f64) -> String {
    format!("BT /F1 10 Tf {x} {y} Td ({}) Tj ET\n", literal(text))
}

/// A fully bordered table. `rows` are laid out top-down from `(left, top)`
/// in PDF coordinates with 150pt columns and 20pt rows.
pub fn bordered_table(rows: &[&[&str]], left: f64, top: f64) -> Vec<u8> {
    let cols = rows.iter().map(|r| r.len()).max().unwrap_or(0);
    let (col_w, row_h) = (150.0, 20.0);
    let right = left + cols as f64 * col_w;
    let bottom = top - rows.len() as f64 * row_h;

    let mut content = String::from("0.5 w\n");
    for i in 0..=rows.len() {
        let y = top - i as f64 * row_h;
        let _ = writeln!(content, "{left} {y} m {right} {y} l S");
    }
    for j in 0..=cols {
        let x = left + j as f64 * col_w;
        let _ = writeln!(content, "{x} {top} m {x} {bottom} l S");
    }
    for (i, row) in rows.iter().enumerate() {
        let baseline = top - (i as f64 + 1.0) * row_h + 6.0;
        for (j, cell) in row.iter().enumerate() {
            content.push_str(&text_at(cell, left + j as f64 * col_w + 5.0, baseline));
        }
    }
    content.into_bytes()
}

/// Lines of plain text, one per entry, 14pt apart, starting at `(x, top)`.
pub fn text_lines(lines: &[&str], x: f64, top: f64) -> Vec<u8> {
    lines
        .iter()
        .enumerate()
        .map(|(i, line)| text_at(line, x, top - i as f64 * 14.0))
        .collect::<String>()
        .into_bytes()
}
