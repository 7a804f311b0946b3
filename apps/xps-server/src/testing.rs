//! In-memory document backend for tests
//!
//! Documents are JSON files. Text sits on a fixed character grid: column `c`
//! of line `r` occupies `[c*CELL_WIDTH, (c+1)*CELL_WIDTH) x [r*LINE_HEIGHT,
//! (r+1)*LINE_HEIGHT)` in page space, so search hits, redactions and
//! insertions can be checked exactly. Saving writes the edited document back
//! as JSON, which lets tests reopen "PDF" output with the same backend.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::document::{
    DocumentBackend, DocumentError, DocumentHandle, DocumentMetadata, RasterPage, Result,
    TextInstance, TextStyle,
};

pub const CELL_WIDTH: f32 = 6.0;
pub const LINE_HEIGHT: f32 = 12.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FakePage {
    pub lines: Vec<String>,
    pub width: u32,
    pub height: u32,
}

impl FakePage {
    /// Page sized to fit `text`
    pub fn from_text(text: &str) -> Self {
        let lines: Vec<String> = text.split('\n').map(str::to_string).collect();
        let columns = lines.iter().map(|l| l.chars().count()).max().unwrap_or(0);
        Self {
            width: ((columns as f32 * CELL_WIDTH) as u32).max(8),
            height: ((lines.len() as f32 * LINE_HEIGHT) as u32).max(8),
            lines,
        }
    }

    fn text(&self) -> String {
        self.lines.join("\n")
    }

    fn cell(row: usize, col: usize) -> TextInstance {
        TextInstance::new(
            col as f32 * CELL_WIDTH,
            row as f32 * LINE_HEIGHT,
            (col + 1) as f32 * CELL_WIDTH,
            (row + 1) as f32 * LINE_HEIGHT,
        )
    }

    fn search(&self, needle: &str) -> Vec<TextInstance> {
        let needle: Vec<char> = needle.chars().collect();
        let mut hits = Vec::new();

        for (row, line) in self.lines.iter().enumerate() {
            let chars: Vec<char> = line.chars().collect();
            let mut col = 0;
            while col + needle.len() <= chars.len() {
                if chars[col..col + needle.len()] == needle[..] {
                    let first = Self::cell(row, col);
                    let last = Self::cell(row, col + needle.len() - 1);
                    hits.push(TextInstance::new(first.x0, first.y0, last.x1, last.y1));
                    col += needle.len();
                } else {
                    col += 1;
                }
            }
        }
        hits
    }

    /// Blank every character cell overlapping `area`
    fn redact(&mut self, area: &TextInstance) {
        for (row, line) in self.lines.iter_mut().enumerate() {
            *line = line
                .chars()
                .enumerate()
                .map(|(col, c)| {
                    if Self::cell(row, col).intersects(area) {
                        ' '
                    } else {
                        c
                    }
                })
                .collect();
        }
    }

    /// Write `text` over the grid starting at the cell containing `(x, y)`
    fn insert(&mut self, x: f32, y: f32, text: &str) {
        let row = (y / LINE_HEIGHT).floor().max(0.0) as usize;
        let col = (x / CELL_WIDTH).floor().max(0.0) as usize;
        while self.lines.len() <= row {
            self.lines.push(String::new());
        }

        let mut chars: Vec<char> = self.lines[row].chars().collect();
        if chars.len() < col {
            chars.resize(col, ' ');
        }
        for (offset, c) in text.chars().enumerate() {
            match chars.get_mut(col + offset) {
                Some(slot) => *slot = c,
                None => chars.push(c),
            }
        }
        self.lines[row] = chars.into_iter().collect();
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FakeDocument {
    pub pages: Vec<FakePage>,
    #[serde(default)]
    pub metadata: DocumentMetadata,
    /// `save` writes a partial file and then fails
    #[serde(default)]
    pub fail_on_save: bool,
    #[serde(default)]
    pub panic_on_rasterize: bool,
}

impl FakeDocument {
    pub fn new(pages: Vec<FakePage>) -> Self {
        Self {
            pages,
            metadata: DocumentMetadata {
                format: "XPS".to_string(),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        serde_json::to_vec(self).expect("fake document serializes")
    }

    pub fn write_to(&self, path: &Path) -> std::io::Result<()> {
        std::fs::write(path, self.to_bytes())
    }
}

/// Backend over [`FakeDocument`] files; counts open attempts
#[derive(Debug, Clone, Default)]
pub struct FakeBackend {
    opens: Arc<AtomicUsize>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open_count(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }
}

impl DocumentBackend for FakeBackend {
    fn name(&self) -> &'static str {
        "fake"
    }

    fn open(&self, path: &Path) -> Result<Box<dyn DocumentHandle>> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        let bytes = std::fs::read(path).map_err(|e| DocumentError::Open(e.to_string()))?;
        let doc: FakeDocument =
            serde_json::from_slice(&bytes).map_err(|e| DocumentError::Open(e.to_string()))?;
        Ok(Box::new(FakeHandle { doc }))
    }
}

struct FakeHandle {
    doc: FakeDocument,
}

impl FakeHandle {
    fn page(&self, index: usize) -> Result<&FakePage> {
        self.doc.pages.get(index).ok_or(DocumentError::PageOutOfRange {
            index,
            count: self.doc.pages.len(),
        })
    }
}

impl DocumentHandle for FakeHandle {
    fn page_count(&self) -> usize {
        self.doc.pages.len()
    }

    fn metadata(&self) -> Result<DocumentMetadata> {
        Ok(self.doc.metadata.clone())
    }

    fn extract_text(&self, index: usize) -> Result<String> {
        Ok(self.page(index)?.text())
    }

    fn rasterize(&self, index: usize) -> Result<RasterPage> {
        if self.doc.panic_on_rasterize {
            panic!("rasterizer crashed");
        }
        let page = self.page(index)?;
        Ok(RasterPage {
            width: page.width,
            height: page.height,
            samples: vec![255; (page.width * page.height * 3) as usize],
        })
    }

    fn search(&self, index: usize, needle: &str) -> Result<Vec<TextInstance>> {
        let page = self.page(index)?;
        if needle.is_empty() {
            return Ok(Vec::new());
        }
        Ok(page.search(needle))
    }

    fn redact_and_insert(
        &mut self,
        index: usize,
        instance: &TextInstance,
        text: &str,
        _style: &TextStyle,
    ) -> Result<()> {
        let count = self.doc.pages.len();
        let page = self
            .doc
            .pages
            .get_mut(index)
            .ok_or(DocumentError::PageOutOfRange { index, count })?;
        page.redact(instance);
        let (x, y) = instance.anchor();
        page.insert(x, y, text);
        Ok(())
    }

    fn save(&mut self, path: &Path) -> Result<()> {
        if self.doc.fail_on_save {
            std::fs::write(path, b"partial")?;
            return Err(DocumentError::Save("disk full".to_string()));
        }
        self.doc.write_to(path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_reports_cell_rectangles() {
        let page = FakePage::from_text("a Draft\nDraft");
        let hits = page.search("Draft");
        assert_eq!(
            hits,
            vec![
                TextInstance::new(12.0, 0.0, 42.0, 12.0),
                TextInstance::new(0.0, 12.0, 30.0, 24.0),
            ]
        );
    }

    #[test]
    fn test_redact_then_insert() {
        let mut page = FakePage::from_text("Draft report");
        let hit = page.search("Draft")[0];
        page.redact(&hit);
        assert_eq!(page.text(), "      report");

        page.insert(hit.x0, hit.y0, "Final");
        assert_eq!(page.text(), "Final report");
    }

    #[test]
    fn test_out_of_range_page() {
        let handle = FakeHandle {
            doc: FakeDocument::new(vec![FakePage::from_text("x")]),
        };
        assert!(matches!(
            handle.extract_text(4),
            Err(DocumentError::PageOutOfRange { index: 4, count: 1 })
        ));
    }
}
