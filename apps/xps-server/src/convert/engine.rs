//! Conversion pipelines
//!
//! Pure functions over an opened [`DocumentHandle`]. They run inside a
//! blocking job and never touch the async runtime.

use std::fs::File;
use std::io::{Cursor, Write};
use std::path::Path;

use docx_rs::{BreakType, Docx, Paragraph, Run};
use image::{DynamicImage, RgbImage};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::document::{DocumentError, DocumentHandle, RasterPage, Result, TextStyle};
use crate::storage::StorageManager;

use super::artifact::{Artifact, ConversionKind, DocumentSummary, PDF_MEDIA_TYPE};

/// Appended after the text of every page, the last one included
pub const PAGE_SEPARATOR: &str = "\n\n--- Page Break ---\n\n";

pub const IMAGES_ARCHIVE_NAME: &str = "images.zip";
pub const PREVIEW_ARCHIVE_NAME: &str = "preview_pages.zip";
pub const EDITED_PREFIX: &str = "edited_";

/// Save the document as PDF in the result area
pub fn to_pdf(doc: &mut dyn DocumentHandle, storage: &StorageManager) -> Result<Artifact> {
    let (path, filename) = storage.allocate_output_path(ConversionKind::Pdf.extension());
    save_or_discard(storage, &path, |path| doc.save(path))?;

    tracing::info!("Wrote PDF {} ({} pages)", filename, doc.page_count());
    Ok(Artifact::File {
        path,
        filename,
        media_type: PDF_MEDIA_TYPE,
    })
}

/// Rasterize every page into a ZIP of `page_{n}.png` entries
pub fn to_images(doc: &dyn DocumentHandle, archive_name: &str) -> Result<Artifact> {
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));

    for index in 0..doc.page_count() {
        let raster = doc.rasterize(index)?;
        let png = encode_png(raster)?;

        zip.start_file(format!("page_{}.png", index + 1), options)?;
        zip.write_all(&png)?;
    }

    let bytes = zip.finish()?.into_inner();
    tracing::info!(
        "Built {} with {} page(s), {} bytes",
        archive_name,
        doc.page_count(),
        bytes.len()
    );

    Ok(Artifact::Archive {
        bytes,
        filename: archive_name.to_string(),
    })
}

/// Export page text into a Word document, one paragraph per page
pub fn to_docx(doc: &dyn DocumentHandle, storage: &StorageManager) -> Result<Artifact> {
    let page_count = doc.page_count();
    let mut texts = Vec::with_capacity(page_count);
    for index in 0..page_count {
        texts.push(doc.extract_text(index)?);
    }

    let (path, filename) = storage.allocate_output_path(ConversionKind::Docx.extension());
    save_or_discard(storage, &path, |path| write_docx(&texts, path))?;

    tracing::info!("Wrote DOCX {} ({} paragraphs)", filename, page_count);
    Ok(Artifact::File {
        path,
        filename,
        media_type: ConversionKind::Docx.media_type(),
    })
}

/// Concatenated page text plus the information dictionary
pub fn extract_text_and_metadata(doc: &dyn DocumentHandle) -> Result<DocumentSummary> {
    let metadata = doc.metadata()?;
    let page_count = doc.page_count();

    let mut text = String::new();
    for index in 0..page_count {
        text.push_str(&doc.extract_text(index)?);
        text.push_str(PAGE_SEPARATOR);
    }

    Ok(DocumentSummary {
        metadata,
        page_count,
        text,
    })
}

/// Replace every occurrence of `old_text` with `new_text` and save as PDF.
///
/// Each hit is redacted, then `new_text` is drawn at the hit's top-left
/// corner in 11pt black. An empty `old_text` matches nothing.
pub fn replace_text(
    doc: &mut dyn DocumentHandle,
    old_text: &str,
    new_text: &str,
    storage: &StorageManager,
) -> Result<Artifact> {
    let style = TextStyle::default();
    let mut replaced = 0;

    if !old_text.is_empty() {
        for index in 0..doc.page_count() {
            let instances = doc.search(index, old_text)?;
            for instance in &instances {
                doc.redact_and_insert(index, instance, new_text, &style)?;
            }
            replaced += instances.len();
        }
    }

    let (path, filename) = storage.allocate_named_output(EDITED_PREFIX, ".pdf");
    save_or_discard(storage, &path, |path| doc.save(path))?;

    tracing::info!("Wrote {} ({} replacement(s))", filename, replaced);
    Ok(Artifact::File {
        path,
        filename,
        media_type: PDF_MEDIA_TYPE,
    })
}

/// Run `write`, removing whatever it left at `path` if it fails
fn save_or_discard<F>(storage: &StorageManager, path: &Path, write: F) -> Result<()>
where
    F: FnOnce(&Path) -> Result<()>,
{
    write(path).inspect_err(|_| {
        if let Err(e) = storage.remove(path) {
            tracing::warn!("Failed to remove partial output {}: {}", path.display(), e);
        }
    })
}

fn encode_png(raster: RasterPage) -> Result<Vec<u8>> {
    let RasterPage {
        width,
        height,
        samples,
    } = raster;
    let img = RgbImage::from_raw(width, height, samples).ok_or_else(|| {
        DocumentError::Image(format!("sample buffer does not match {}x{}", width, height))
    })?;

    let mut output = Vec::new();
    DynamicImage::ImageRgb8(img).write_to(&mut Cursor::new(&mut output), image::ImageFormat::Png)?;
    Ok(output)
}

fn write_docx(texts: &[String], path: &Path) -> Result<()> {
    let mut docx = Docx::new();

    for (index, text) in texts.iter().enumerate() {
        let mut paragraph = Paragraph::new().add_run(text_run(text));
        if index + 1 < texts.len() {
            paragraph = paragraph.add_run(Run::new().add_break(BreakType::Page));
        }
        docx = docx.add_paragraph(paragraph);
    }

    let file = File::create(path)?;
    docx.build()
        .pack(file)
        .map_err(|e| DocumentError::Docx(e.to_string()))?;
    Ok(())
}

/// A run with the text's lines separated by line breaks
fn text_run(text: &str) -> Run {
    let mut run = Run::new();
    for (index, line) in text.split('\n').enumerate() {
        if index > 0 {
            run = run.add_break(BreakType::TextWrapping);
        }
        let clean: String = line
            .chars()
            .filter(|c| *c == '\t' || !c.is_control())
            .collect();
        if !clean.is_empty() {
            run = run.add_text(clean);
        }
    }
    run
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StorageConfig;
    use crate::document::DocumentBackend;
    use crate::testing::{FakeBackend, FakeDocument, FakePage};
    use std::io::Read;
    use tempfile::TempDir;

    fn storage(temp_dir: &TempDir) -> StorageManager {
        StorageManager::new(&StorageConfig {
            upload_dir: temp_dir.path().join("uploads"),
            result_dir: temp_dir.path().join("results"),
        })
        .unwrap()
    }

    fn open(temp_dir: &TempDir, doc: &FakeDocument) -> Box<dyn DocumentHandle> {
        let path = temp_dir.path().join("input.xps");
        doc.write_to(&path).unwrap();
        FakeBackend::new().open(&path).unwrap()
    }

    fn three_pages() -> FakeDocument {
        FakeDocument::new(vec![
            FakePage::from_text("Cover"),
            FakePage::from_text("Draft report\nsecond line"),
            FakePage::from_text("Appendix"),
        ])
    }

    fn file_path(artifact: &Artifact) -> &Path {
        match artifact {
            Artifact::File { path, .. } => path,
            other => panic!("expected a file artifact, got {:?}", other),
        }
    }

    #[test]
    fn test_to_images_entries_in_order() {
        let temp_dir = TempDir::new().unwrap();
        let doc = open(&temp_dir, &three_pages());

        let artifact = to_images(doc.as_ref(), IMAGES_ARCHIVE_NAME).unwrap();
        let Artifact::Archive { bytes, filename } = artifact else {
            panic!("expected an archive");
        };
        assert_eq!(filename, "images.zip");

        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        assert_eq!(archive.len(), 3);
        for index in 0..3 {
            let mut entry = archive.by_index(index).unwrap();
            assert_eq!(entry.name(), format!("page_{}.png", index + 1));

            let mut png = Vec::new();
            entry.read_to_end(&mut png).unwrap();
            let decoded = image::load_from_memory(&png).unwrap();
            let raster = doc.rasterize(index).unwrap();
            assert_eq!((decoded.width(), decoded.height()), (raster.width, raster.height));
        }
    }

    #[test]
    fn test_to_images_empty_document() {
        let temp_dir = TempDir::new().unwrap();
        let doc = open(&temp_dir, &FakeDocument::new(vec![]));

        let Artifact::Archive { bytes, .. } = to_images(doc.as_ref(), PREVIEW_ARCHIVE_NAME).unwrap()
        else {
            panic!("expected an archive");
        };
        let archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        assert_eq!(archive.len(), 0);
    }

    #[test]
    fn test_encode_png_rejects_short_buffer() {
        let raster = RasterPage {
            width: 4,
            height: 4,
            samples: vec![0; 5],
        };
        assert!(matches!(encode_png(raster), Err(DocumentError::Image(_))));
    }

    #[test]
    fn test_extract_text_and_metadata() {
        let temp_dir = TempDir::new().unwrap();
        let mut fake = three_pages();
        fake.metadata.title = "Quarterly".to_string();
        let doc = open(&temp_dir, &fake);

        let summary = extract_text_and_metadata(doc.as_ref()).unwrap();
        assert_eq!(summary.page_count, 3);
        assert_eq!(summary.metadata.title, "Quarterly");

        let expected: String = (0..3)
            .map(|i| doc.extract_text(i).unwrap() + PAGE_SEPARATOR)
            .collect();
        assert_eq!(summary.text, expected);
        assert!(summary.text.ends_with(PAGE_SEPARATOR));
    }

    #[test]
    fn test_extract_text_empty_document() {
        let temp_dir = TempDir::new().unwrap();
        let doc = open(&temp_dir, &FakeDocument::new(vec![]));

        let summary = extract_text_and_metadata(doc.as_ref()).unwrap();
        assert_eq!(summary.page_count, 0);
        assert_eq!(summary.text, "");
    }

    #[test]
    fn test_to_docx_paragraphs_and_breaks() {
        let temp_dir = TempDir::new().unwrap();
        let storage = storage(&temp_dir);
        let doc = open(&temp_dir, &three_pages());

        let artifact = to_docx(doc.as_ref(), &storage).unwrap();
        assert_eq!(artifact.media_type(), ConversionKind::Docx.media_type());
        let path = file_path(&artifact);
        assert!(path.starts_with(storage.result_dir()));
        assert_eq!(path.extension().unwrap(), "docx");

        let mut archive = zip::ZipArchive::new(File::open(path).unwrap()).unwrap();
        let mut xml = String::new();
        archive
            .by_name("word/document.xml")
            .unwrap()
            .read_to_string(&mut xml)
            .unwrap();

        assert_eq!(xml.matches("<w:p>").count() + xml.matches("<w:p ").count(), 3);
        assert_eq!(xml.matches("w:type=\"page\"").count(), 2);
        assert!(xml.contains("Draft report"));
        assert!(xml.contains("second line"));
    }

    #[test]
    fn test_text_run_strips_control_characters() {
        let mut docx = Vec::new();
        let run = text_run("a\u{0}b\tc");
        Docx::new()
            .add_paragraph(Paragraph::new().add_run(run))
            .build()
            .pack(Cursor::new(&mut docx))
            .unwrap();
        let mut archive = zip::ZipArchive::new(Cursor::new(docx)).unwrap();
        let mut xml = String::new();
        archive
            .by_name("word/document.xml")
            .unwrap()
            .read_to_string(&mut xml)
            .unwrap();
        assert!(xml.contains("ab\tc"));
    }

    #[test]
    fn test_to_pdf_round_trip_keeps_page_count() {
        let temp_dir = TempDir::new().unwrap();
        let storage = storage(&temp_dir);
        let mut doc = open(&temp_dir, &three_pages());

        let artifact = to_pdf(doc.as_mut(), &storage).unwrap();
        let Artifact::File { path, filename, media_type } = &artifact else {
            panic!("expected a file artifact");
        };
        assert_eq!(*media_type, "application/pdf");
        assert!(filename.ends_with(".pdf"));

        let reopened = FakeBackend::new().open(path).unwrap();
        assert_eq!(reopened.page_count(), 3);
    }

    #[test]
    fn test_replace_text_only_touches_matching_pages() {
        let temp_dir = TempDir::new().unwrap();
        let storage = storage(&temp_dir);
        let mut doc = open(&temp_dir, &three_pages());

        let artifact = replace_text(doc.as_mut(), "Draft", "Final", &storage).unwrap();
        let Artifact::File { path, filename, .. } = &artifact else {
            panic!("expected a file artifact");
        };
        assert!(filename.starts_with("edited_"));
        assert!(filename.ends_with(".pdf"));

        let edited = FakeBackend::new().open(path).unwrap();
        assert_eq!(edited.extract_text(0).unwrap(), "Cover");
        let page_two = edited.extract_text(1).unwrap();
        assert!(page_two.contains("Final"));
        assert!(!page_two.contains("Draft"));
        assert_eq!(edited.extract_text(2).unwrap(), "Appendix");
    }

    #[test]
    fn test_replace_text_without_matches_keeps_text() {
        let temp_dir = TempDir::new().unwrap();
        let storage = storage(&temp_dir);
        let mut doc = open(&temp_dir, &three_pages());
        let before: Vec<String> = (0..3).map(|i| doc.extract_text(i).unwrap()).collect();

        for old_text in ["Missing", ""] {
            let artifact = replace_text(doc.as_mut(), old_text, "Final", &storage).unwrap();
            let edited = FakeBackend::new().open(file_path(&artifact)).unwrap();
            let after: Vec<String> = (0..3).map(|i| edited.extract_text(i).unwrap()).collect();
            assert_eq!(after, before);
        }
    }

    #[test]
    fn test_failed_save_leaves_no_output() {
        let temp_dir = TempDir::new().unwrap();
        let storage = storage(&temp_dir);
        let mut fake = three_pages();
        fake.fail_on_save = true;
        let mut doc = open(&temp_dir, &fake);

        assert!(to_pdf(doc.as_mut(), &storage).is_err());
        assert_eq!(std::fs::read_dir(storage.result_dir()).unwrap().count(), 0);
    }
}
