//! Text overlay for saved PDFs
//!
//! MuPDF removes the redacted text but has no text-insertion API, so
//! replacement text is queued and drawn into the saved file with lopdf.

use std::collections::BTreeMap;
use std::path::Path;

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream, StringFormat};

use crate::document::{DocumentError, Result, TextStyle};

/// Resource name of the overlay font
const OVERLAY_FONT: &str = "XpsOverlay";

/// US Letter, used when no MediaBox can be found
const DEFAULT_MEDIA_BOX: [f32; 4] = [0.0, 0.0, 612.0, 792.0];

/// Text waiting to be drawn on a page at save time.
///
/// `x`/`y` are in page space (top-left origin, y down) and mark the baseline
/// start of the text.
#[derive(Debug, Clone, PartialEq)]
pub struct TextInsertion {
    pub page: usize,
    pub x: f32,
    pub y: f32,
    pub text: String,
    pub style: TextStyle,
}

/// Draw `insertions` into the PDF at `path`, rewriting it in place.
pub fn apply_insertions(path: &Path, insertions: &[TextInsertion]) -> Result<()> {
    if insertions.is_empty() {
        return Ok(());
    }

    let mut doc = Document::load(path)?;
    let pages = doc.get_pages();

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });

    let mut by_page: BTreeMap<usize, Vec<&TextInsertion>> = BTreeMap::new();
    for insertion in insertions {
        by_page.entry(insertion.page).or_default().push(insertion);
    }

    for (index, page_insertions) in by_page {
        let page_id = *pages
            .get(&(index as u32 + 1))
            .ok_or(DocumentError::PageOutOfRange {
                index,
                count: pages.len(),
            })?;
        overlay_page(&mut doc, page_id, font_id, &page_insertions)?;
    }

    doc.save(path)?;
    tracing::debug!(
        "Drew {} text insertion(s) into {}",
        insertions.len(),
        path.display()
    );
    Ok(())
}

fn overlay_page(
    doc: &mut Document,
    page_id: ObjectId,
    font_id: ObjectId,
    insertions: &[&TextInsertion],
) -> Result<()> {
    let media_box = media_box(doc, page_id);
    let mut resources = page_resources(doc, page_id)?;
    let existing = page_contents(doc, page_id)?;

    let mut fonts = match resources.get(b"Font") {
        Ok(Object::Dictionary(fonts)) => fonts.clone(),
        Ok(Object::Reference(id)) => doc.get_dictionary(*id)?.clone(),
        _ => Dictionary::new(),
    };
    fonts.set(OVERLAY_FONT, Object::Reference(font_id));
    resources.set("Font", Object::Dictionary(fonts));

    // Isolate the existing content so its graphics state cannot leak into the overlay
    let save_id = doc.add_object(Stream::new(Dictionary::new(), b"q\n".to_vec()));
    let restore_id = doc.add_object(Stream::new(Dictionary::new(), b"\nQ\n".to_vec()));
    let overlay = overlay_content(insertions, media_box).encode()?;
    let overlay_id = doc.add_object(Stream::new(Dictionary::new(), overlay));

    let mut contents = Vec::with_capacity(existing.len() + 3);
    contents.push(Object::Reference(save_id));
    contents.extend(existing);
    contents.push(Object::Reference(restore_id));
    contents.push(Object::Reference(overlay_id));

    let page = doc.get_object_mut(page_id)?.as_dict_mut()?;
    page.set("Resources", Object::Dictionary(resources));
    page.set("Contents", Object::Array(contents));
    Ok(())
}

fn overlay_content(insertions: &[&TextInsertion], media_box: [f32; 4]) -> Content {
    let mut operations = Vec::new();

    for insertion in insertions {
        let TextStyle { font_size, color } = insertion.style;
        let x = media_box[0] + insertion.x;
        let y = media_box[3] - insertion.y;

        operations.push(Operation::new("BT", vec![]));
        operations.push(Operation::new(
            "Tf",
            vec![Object::Name(OVERLAY_FONT.as_bytes().to_vec()), Object::Real(font_size)],
        ));
        operations.push(Operation::new(
            "rg",
            vec![Object::Real(color.r), Object::Real(color.g), Object::Real(color.b)],
        ));
        operations.push(Operation::new("Td", vec![Object::Real(x), Object::Real(y)]));
        operations.push(Operation::new(
            "Tj",
            vec![Object::String(
                encode_win_ansi(&insertion.text),
                StringFormat::Literal,
            )],
        ));
        operations.push(Operation::new("ET", vec![]));
    }

    Content { operations }
}

/// Look up a page attribute, following the Parent chain for inherited keys
fn inherited<'a>(doc: &'a Document, page_id: ObjectId, key: &[u8]) -> Option<&'a Object> {
    let mut current = doc.get_dictionary(page_id).ok()?;
    // Bounded walk; malformed files can contain Parent cycles
    for _ in 0..64 {
        if let Ok(value) = current.get(key) {
            return Some(value);
        }
        let parent = current.get(b"Parent").ok()?.as_reference().ok()?;
        current = doc.get_dictionary(parent).ok()?;
    }
    None
}

fn media_box(doc: &Document, page_id: ObjectId) -> [f32; 4] {
    let array = match inherited(doc, page_id, b"MediaBox") {
        Some(Object::Array(array)) => array,
        Some(Object::Reference(id)) => match doc.get_object(*id) {
            Ok(Object::Array(array)) => array,
            _ => return DEFAULT_MEDIA_BOX,
        },
        _ => return DEFAULT_MEDIA_BOX,
    };

    let values: Vec<f32> = array.iter().filter_map(number).collect();
    match values.as_slice() {
        [x0, y0, x1, y1] => [x0.min(*x1), y0.min(*y1), x0.max(*x1), y0.max(*y1)],
        _ => DEFAULT_MEDIA_BOX,
    }
}

fn number(object: &Object) -> Option<f32> {
    match object {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r as f32),
        _ => None,
    }
}

/// Resolved copy of the page's (possibly inherited) resource dictionary
fn page_resources(doc: &Document, page_id: ObjectId) -> Result<Dictionary> {
    match inherited(doc, page_id, b"Resources") {
        Some(Object::Dictionary(resources)) => Ok(resources.clone()),
        Some(Object::Reference(id)) => Ok(doc.get_dictionary(*id)?.clone()),
        _ => Ok(Dictionary::new()),
    }
}

/// Existing content stream references, in drawing order
fn page_contents(doc: &Document, page_id: ObjectId) -> Result<Vec<Object>> {
    let page = doc.get_dictionary(page_id)?;
    let contents = match page.get(b"Contents") {
        Ok(Object::Reference(id)) => match doc.get_object(*id)? {
            Object::Array(array) => array.clone(),
            _ => vec![Object::Reference(*id)],
        },
        Ok(Object::Array(array)) => array.clone(),
        _ => Vec::new(),
    };
    Ok(contents)
}

/// Encode for the WinAnsi base font. Characters outside Latin-1 become `?`.
fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c as u32 {
            code @ (0x20..=0x7E | 0xA0..=0xFF) => code as u8,
            _ => b'?',
        })
        .collect()
}
