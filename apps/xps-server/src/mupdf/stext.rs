//! Text and pixel helpers
//!
//! Conversions from MuPDF page output into backend-neutral values.

use mupdf::{Page, Quad, TextPageOptions};

use crate::document::{DocumentError, Result, TextInstance};

/// Plain text of a page in reading order, one line per text line
pub fn extract_plain_text(page: &Page) -> Result<String> {
    let text_page = page
        .to_text_page(TextPageOptions::empty())
        .map_err(|e| DocumentError::TextExtraction(e.to_string()))?;
    text_page
        .to_text()
        .map_err(|e| DocumentError::TextExtraction(e.to_string()))
}

/// Case-sensitive search of a page, returning one rectangle per hit.
///
/// Characters are compared exactly as extracted, with no case or whitespace
/// folding. A hit never spans two text lines.
pub fn search_text(page: &Page, needle: &str) -> Result<Vec<TextInstance>> {
    let needle: Vec<char> = needle.chars().collect();
    if needle.is_empty() {
        return Ok(Vec::new());
    }

    let text_page = page
        .to_text_page(TextPageOptions::empty())
        .map_err(|e| DocumentError::Search(e.to_string()))?;

    let mut hits = Vec::new();
    // Image blocks yield no lines
    for block in text_page.blocks() {
        for line in block.lines() {
            let glyphs: Vec<(char, TextInstance)> = line
                .chars()
                .map(|c| {
                    (
                        c.char().unwrap_or(char::REPLACEMENT_CHARACTER),
                        quad_to_instance(&c.quad()),
                    )
                })
                .collect();
            hits.extend(find_exact(&glyphs, &needle));
        }
    }
    Ok(hits)
}

/// Non-overlapping occurrences of `needle` in a line of positioned glyphs,
/// left to right, each as the bounds of its glyphs
fn find_exact(glyphs: &[(char, TextInstance)], needle: &[char]) -> Vec<TextInstance> {
    let mut hits = Vec::new();
    if needle.is_empty() {
        return hits;
    }

    let mut start = 0;
    while start + needle.len() <= glyphs.len() {
        let window = &glyphs[start..start + needle.len()];
        if window.iter().map(|(c, _)| c).eq(needle.iter()) {
            hits.push(bounds(window.iter().map(|(_, rect)| rect)));
            start += needle.len();
        } else {
            start += 1;
        }
    }
    hits
}

fn bounds<'a>(rects: impl Iterator<Item = &'a TextInstance>) -> TextInstance {
    rects.fold(
        TextInstance::new(f32::INFINITY, f32::INFINITY, f32::NEG_INFINITY, f32::NEG_INFINITY),
        |acc, r| {
            TextInstance::new(
                acc.x0.min(r.x0),
                acc.y0.min(r.y0),
                acc.x1.max(r.x1),
                acc.y1.max(r.y1),
            )
        },
    )
}

pub fn quad_to_instance(quad: &Quad) -> TextInstance {
    corners_to_instance(
        [quad.ul.x, quad.ur.x, quad.ll.x, quad.lr.x],
        [quad.ul.y, quad.ur.y, quad.ll.y, quad.lr.y],
    )
}

/// Axis-aligned bounds of four corner points
pub(super) fn corners_to_instance(xs: [f32; 4], ys: [f32; 4]) -> TextInstance {
    let min = |v: [f32; 4]| v.into_iter().fold(f32::INFINITY, f32::min);
    let max = |v: [f32; 4]| v.into_iter().fold(f32::NEG_INFINITY, f32::max);
    TextInstance::new(min(xs), min(ys), max(xs), max(ys))
}

/// Repack pixmap samples with `n` components per pixel into tight RGB
pub fn rgb_samples(samples: &[u8], width: u32, height: u32, n: usize) -> Vec<u8> {
    let pixels = width as usize * height as usize;
    if n == 3 && samples.len() == pixels * 3 {
        return samples.to_vec();
    }

    let mut rgb = Vec::with_capacity(pixels * 3);
    for pixel in 0..pixels {
        let offset = pixel * n;
        if n >= 3 {
            for channel in 0..3 {
                rgb.push(samples.get(offset + channel).copied().unwrap_or(0));
            }
        } else {
            // Gray (optionally with alpha)
            let gray = samples.get(offset).copied().unwrap_or(0);
            rgb.extend_from_slice(&[gray, gray, gray]);
        }
    }
    rgb
}
