//! MuPDF document backend
//!
//! MuPDF reads XPS natively. Edits need the PDF object model, so the first
//! edit (or save) converts the document to an in-memory PDF and all later
//! work happens on that rendition.

use std::path::Path;

use mupdf::pdf::{PdfAnnotationType, PdfDocument, PdfObject, PdfPage};
use mupdf::{Colorspace, Document, Matrix, MetadataName, Page};

use crate::document::{
    DocumentBackend, DocumentError, DocumentHandle, DocumentMetadata, RasterPage, Result,
    TextInstance, TextStyle,
};

use super::overlay::{apply_insertions, TextInsertion};
use super::stext::{corners_to_instance, extract_plain_text, rgb_samples, search_text};

/// Backend that opens documents through MuPDF
#[derive(Debug, Default, Clone, Copy)]
pub struct MuPdfBackend;

impl MuPdfBackend {
    pub fn new() -> Self {
        Self
    }
}

impl DocumentBackend for MuPdfBackend {
    fn name(&self) -> &'static str {
        "mupdf"
    }

    fn open(&self, path: &Path) -> Result<Box<dyn DocumentHandle>> {
        let path_str = path.to_string_lossy();
        let source =
            Document::open(&*path_str).map_err(|e| DocumentError::Open(e.to_string()))?;
        let page_count = source
            .page_count()
            .map_err(|e| DocumentError::Open(e.to_string()))?;

        tracing::debug!("Opened {} ({} pages)", path.display(), page_count);

        Ok(Box::new(MuPdfDocument {
            source,
            pdf: None,
            page_count: page_count.max(0) as usize,
            pending: Vec::new(),
        }))
    }
}

/// An opened document plus its lazily created PDF rendition
pub struct MuPdfDocument {
    source: Document,
    pdf: Option<PdfDocument>,
    page_count: usize,
    /// Replacement text drawn at save time
    pending: Vec<TextInsertion>,
}

impl MuPdfDocument {
    /// The document reads go to: the PDF rendition once it exists
    fn reader(&self) -> &Document {
        match &self.pdf {
            Some(pdf) => &**pdf,
            None => &self.source,
        }
    }

    fn check_index(&self, index: usize) -> Result<()> {
        if index >= self.page_count {
            return Err(DocumentError::PageOutOfRange {
                index,
                count: self.page_count,
            });
        }
        Ok(())
    }

    fn load_page(&self, index: usize) -> Result<Page> {
        self.check_index(index)?;
        Ok(self.reader().load_page(index as i32)?)
    }

    fn pdf_mut(&mut self) -> Result<&mut PdfDocument> {
        if self.pdf.is_none() {
            let pdf = if self.page_count == 0 {
                PdfDocument::new()
            } else {
                self.source
                    .convert_to_pdf(0, self.page_count as i32 - 1, 0)
                    .map_err(|e| DocumentError::Save(format!("PDF conversion: {}", e)))?
            };
            self.pdf = Some(pdf);
        }
        self.pdf
            .as_mut()
            .ok_or_else(|| DocumentError::Save("PDF rendition unavailable".to_string()))
    }

    fn meta(&self, name: MetadataName) -> String {
        self.source.metadata(name).unwrap_or_default()
    }
}

impl DocumentHandle for MuPdfDocument {
    fn page_count(&self) -> usize {
        self.page_count
    }

    fn metadata(&self) -> Result<DocumentMetadata> {
        Ok(DocumentMetadata {
            format: self.meta(MetadataName::Format),
            title: self.meta(MetadataName::Title),
            author: self.meta(MetadataName::Author),
            subject: self.meta(MetadataName::Subject),
            keywords: self.meta(MetadataName::Keywords),
            creator: self.meta(MetadataName::Creator),
            producer: self.meta(MetadataName::Producer),
            creation_date: self.meta(MetadataName::CreationDate),
            mod_date: self.meta(MetadataName::ModDate),
            // Not exposed by MuPDF's metadata keys
            trapped: String::new(),
            encryption: self.meta(MetadataName::Encryption),
        })
    }

    fn extract_text(&self, index: usize) -> Result<String> {
        let page = self.load_page(index)?;
        extract_plain_text(&page)
    }

    fn rasterize(&self, index: usize) -> Result<RasterPage> {
        let page = self.load_page(index)?;

        // Identity transform: 72 dpi
        let matrix = Matrix::new_scale(1.0, 1.0);
        let colorspace = Colorspace::device_rgb();
        let pixmap = page
            .to_pixmap(&matrix, &colorspace, false, true)
            .map_err(|e| DocumentError::Render(e.to_string()))?;

        let width = pixmap.width() as u32;
        let height = pixmap.height() as u32;
        let samples = rgb_samples(pixmap.samples(), width, height, pixmap.n() as usize);

        Ok(RasterPage {
            width,
            height,
            samples,
        })
    }

    fn search(&self, index: usize, needle: &str) -> Result<Vec<TextInstance>> {
        if needle.is_empty() {
            return Ok(Vec::new());
        }
        let page = self.load_page(index)?;
        search_text(&page, needle)
    }

    fn redact_and_insert(
        &mut self,
        index: usize,
        instance: &TextInstance,
        text: &str,
        style: &TextStyle,
    ) -> Result<()> {
        self.check_index(index)?;
        let pdf = self.pdf_mut()?;
        redact_area(pdf, index, instance).map_err(|e| DocumentError::Edit(e.to_string()))?;

        // Drawn after the final save, so a later redaction on this page cannot
        // remove text inserted by an earlier replacement
        let (x, y) = instance.anchor();
        self.pending.push(TextInsertion {
            page: index,
            x,
            y,
            text: text.to_string(),
            style: *style,
        });
        Ok(())
    }

    fn save(&mut self, path: &Path) -> Result<()> {
        let path_str = path.to_string_lossy().into_owned();
        self.pdf_mut()?
            .save(&path_str)
            .map_err(|e| DocumentError::Save(e.to_string()))?;

        let pending = std::mem::take(&mut self.pending);
        apply_insertions(path, &pending)?;

        tracing::debug!("Saved PDF to {}", path.display());
        Ok(())
    }
}

/// Mark `instance` for redaction and apply it, removing the covered content
fn redact_area(
    pdf: &mut PdfDocument,
    index: usize,
    instance: &TextInstance,
) -> std::result::Result<(), mupdf::Error> {
    let page = pdf.load_page(index as i32)?;
    let mut pdf_page = PdfPage::try_from(page)?;

    // Annotation rectangles are stored in PDF user space
    let area = transform_bounds(instance, &invert(&pdf_page.ctm()?));
    let mut rect = pdf.new_array()?;
    for value in [area.x0, area.y0, area.x1, area.y1] {
        rect.array_push(PdfObject::new_real(value)?)?;
    }

    // New annotations are appended to /Annots
    pdf_page.create_annotation(PdfAnnotationType::Redact)?;
    let annots = pdf_page
        .object()
        .get_dict("Annots")?
        .ok_or(mupdf::Error::UnexpectedNullPtr)?;
    let last = annots.len()? as i32 - 1;
    let mut annot = annots
        .get_array(last)?
        .ok_or(mupdf::Error::UnexpectedNullPtr)?;
    annot.dict_put("Rect", rect)?;

    pdf_page.redact()?;
    Ok(())
}

/// Inverse of an affine transform; identity when singular
fn invert(m: &Matrix) -> Matrix {
    let det = m.a * m.d - m.b * m.c;
    if det.abs() <= f32::EPSILON {
        return Matrix::IDENTITY;
    }
    let (a, b, c, d) = (m.d / det, -m.b / det, -m.c / det, m.a / det);
    Matrix::new(a, b, c, d, -(m.e * a + m.f * c), -(m.e * b + m.f * d))
}

/// Axis-aligned bounds of `rect` after applying `m`
fn transform_bounds(rect: &TextInstance, m: &Matrix) -> TextInstance {
    let apply = |x: f32, y: f32| (x * m.a + y * m.c + m.e, x * m.b + y * m.d + m.f);
    let corners = [
        apply(rect.x0, rect.y0),
        apply(rect.x1, rect.y0),
        apply(rect.x0, rect.y1),
        apply(rect.x1, rect.y1),
    ];
    corners_to_instance(corners.map(|p| p.0), corners.map(|p| p.1))
}
