//! Extractor: recover the leading images and paragraphs of a document.
//!
//! Two passes over the opened document:
//!
//! 1. **Images.** Pages in order, images in stored order, each decoded only
//!    when reached. The first [`MAX_IMAGES`] are normalised, PNG-encoded and
//!    written as `image1.png`, `image2.png`. Traversal stops the moment the
//!    cap is hit; later pages are never asked for their images.
//! 2. **Text.** Every page's text, joined with a single newline, segmented
//!    into paragraphs and cut to the first [`MAX_PARAGRAPHS`].
//!
//! Only the images are persisted here. Writing `paragraphs.json` is up to
//! the caller (see [`crate::harvest`]).

use crate::artifacts;
use crate::error::HarvestError;
use crate::output::ExtractionResult;
use crate::pipeline::backend::{Document, DocumentBackend, ExtractedImage};
use crate::pipeline::{encode, paragraphs};
use crate::progress::HarvestProgressCallback;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Hard cap on images saved per document.
pub const MAX_IMAGES: usize = 2;

/// Hard cap on paragraphs returned per document.
pub const MAX_PARAGRAPHS: usize = 4;

/// Extract up to two images and four paragraphs from `document_path`.
///
/// `output_dir` is created if missing. On error nothing is returned; images
/// written before the failure stay on disk.
pub fn extract(
    backend: &dyn DocumentBackend,
    document_path: &Path,
    output_dir: &Path,
) -> Result<ExtractionResult, HarvestError> {
    extract_with_progress(backend, document_path, output_dir, None)
}

/// [`extract`] with stage events reported to `progress`.
pub fn extract_with_progress(
    backend: &dyn DocumentBackend,
    document_path: &Path,
    output_dir: &Path,
    progress: Option<&dyn HarvestProgressCallback>,
) -> Result<ExtractionResult, HarvestError> {
    let document = backend.open(document_path)?;

    std::fs::create_dir_all(output_dir).map_err(|source| HarvestError::CreateDirFailed {
        path: output_dir.to_path_buf(),
        source,
    })?;

    if let Some(cb) = progress {
        cb.on_extraction_start(document_path);
    }

    let images = save_leading_images(document.as_ref(), output_dir, progress)?;
    let text = document_text(document.as_ref())?;
    let paragraphs = paragraphs::leading_paragraphs(&text, MAX_PARAGRAPHS);

    info!(
        "Extracted {} images and {} paragraphs from {} ({} pages)",
        images.len(),
        paragraphs.len(),
        document_path.display(),
        document.page_count()
    );

    Ok(ExtractionResult { images, paragraphs })
}

fn save_leading_images(
    document: &dyn Document,
    output_dir: &Path,
    progress: Option<&dyn HarvestProgressCallback>,
) -> Result<Vec<PathBuf>, HarvestError> {
    let mut saved = Vec::with_capacity(MAX_IMAGES);

    'pages: for page in document.pages() {
        let page = page?;
        for image in page.images() {
            let n = saved.len() + 1;
            let path = output_dir.join(artifacts::image_file_name(n));
            save_image(image?, &path, page.number(), n)?;

            if let Some(cb) = progress {
                cb.on_image_saved(n, &path);
            }
            saved.push(path);

            if saved.len() == MAX_IMAGES {
                debug!("Image cap reached on page {}", page.number());
                break 'pages;
            }
        }
    }

    Ok(saved)
}

fn save_image(
    image: ExtractedImage,
    path: &Path,
    page: usize,
    n: usize,
) -> Result<(), HarvestError> {
    let img = encode::normalize(image).map_err(|e| HarvestError::ImageDecode {
        page,
        index: n,
        detail: e.to_string(),
    })?;

    let png = encode::encode_png(&img).map_err(|source| HarvestError::ImageEncode {
        path: path.to_path_buf(),
        source,
    })?;

    std::fs::write(path, &png).map_err(|source| HarvestError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    })?;

    debug!("Saved {} ({} bytes) from page {}", path.display(), png.len(), page);
    Ok(())
}

fn document_text(document: &dyn Document) -> Result<String, HarvestError> {
    let mut texts = Vec::with_capacity(document.page_count());
    for page in document.pages() {
        texts.push(page?.text()?);
    }
    Ok(paragraphs::join_pages(&texts))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::pipeline::backend::{MemoryBackend, MemoryPage, PixelLayout};
    use tempfile::TempDir;

    fn rgb(seed: u8) -> ExtractedImage {
        ExtractedImage::new(2, 2, PixelLayout::Rgb, vec![seed; 12]).unwrap()
    }

    /// Opening always fails, as a corrupt document would.
    struct BrokenBackend;

    impl DocumentBackend for BrokenBackend {
        fn open<'a>(&'a self, path: &Path) -> Result<Box<dyn Document + 'a>, HarvestError> {
            Err(HarvestError::CorruptPdf {
                path: path.to_path_buf(),
                detail: "trailer not found".into(),
            })
        }
    }

    #[test]
    fn stops_decoding_at_cap() {
        let dir = TempDir::new().unwrap();
        let backend = MemoryBackend::new(vec![
            MemoryPage::new(vec![rgb(1)], "a"),
            MemoryPage::new(vec![rgb(2), rgb(3), rgb(4)], "b"),
            MemoryPage::new(vec![rgb(5)], "c"),
        ]);

        let result = extract(&backend, Path::new("doc.pdf"), dir.path()).unwrap();

        assert_eq!(
            result.images,
            vec![dir.path().join("image1.png"), dir.path().join("image2.png")]
        );
        assert_eq!(backend.decoded_images(), 2);
        assert!(!dir.path().join("image3.png").exists());
    }

    #[test]
    fn text_read_from_every_page_after_cap() {
        let dir = TempDir::new().unwrap();
        let backend = MemoryBackend::new(vec![
            MemoryPage::new(vec![rgb(1), rgb(2)], "first\n"),
            MemoryPage::new(vec![], "second\n"),
            MemoryPage::new(vec![], "third"),
        ]);

        let result = extract(&backend, Path::new("doc.pdf"), dir.path()).unwrap();
        assert_eq!(result.paragraphs, vec!["first", "second", "third"]);
    }

    #[test]
    fn creates_missing_output_dir() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("nested/out");
        let backend = MemoryBackend::new(vec![MemoryPage::new(vec![rgb(9)], "")]);

        let result = extract(&backend, Path::new("doc.pdf"), &out).unwrap();
        assert_eq!(result.images.len(), 1);
        assert!(out.join("image1.png").is_file());
        assert!(result.paragraphs.is_empty());
    }

    #[test]
    fn open_failure_is_parse_error_and_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("out");
        let err = extract(&BrokenBackend, Path::new("doc.pdf"), &out).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parse);
        assert!(!out.exists());
    }

    #[test]
    fn progress_sees_each_saved_image() {
        use std::sync::Mutex;

        #[derive(Default)]
        struct Recorder(Mutex<Vec<usize>>);
        impl HarvestProgressCallback for Recorder {
            fn on_image_saved(&self, index: usize, _path: &Path) {
                self.0.lock().unwrap().push(index);
            }
        }

        let dir = TempDir::new().unwrap();
        let backend = MemoryBackend::new(vec![MemoryPage::new(vec![rgb(1), rgb(2), rgb(3)], "")]);
        let recorder = Recorder::default();

        extract_with_progress(&backend, Path::new("doc.pdf"), dir.path(), Some(&recorder))
            .unwrap();
        assert_eq!(*recorder.0.lock().unwrap(), vec![1, 2]);
    }
}
