//! pdfium-render implementation of the document capability traits.
//!
//! pdfium is not async-safe; everything here is blocking and is driven from
//! `tokio::task::spawn_blocking` by [`crate::harvest`].
//!
//! Image objects are found by walking the page's content objects depth
//! first, descending into form XObjects where they are drawn. pdfium hands
//! out neither XObject numbers nor an inline-image flag, so repeated draws
//! are recognised by their decoded stream data and inline images cannot be
//! told apart from image XObjects.

use crate::error::HarvestError;
use crate::pipeline::backend::{
    content_key, Document, DocumentBackend, ExtractedImage, ImageIter, Page, PageIter, SeenImages,
};
use pdfium_render::prelude::*;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

/// Environment variable naming an explicit pdfium library file.
pub const PDFIUM_LIB_PATH_ENV: &str = "PDFIUM_LIB_PATH";

/// Bind to a pdfium library.
///
/// Resolution order: `library` if given, else `PDFIUM_LIB_PATH`, else a
/// library in the current directory, else the system library paths.
pub fn bind_pdfium(library: Option<&str>) -> Result<Pdfium, HarvestError> {
    let explicit = library
        .map(str::to_string)
        .or_else(|| std::env::var(PDFIUM_LIB_PATH_ENV).ok())
        .filter(|p| !p.is_empty());

    let bindings = match explicit {
        Some(path) => Pdfium::bind_to_library(&path)
            .map_err(|e| HarvestError::PdfiumBindingFailed(format!("{path}: {e:?}")))?,
        None => Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
            .or_else(|_| Pdfium::bind_to_system_library())
            .map_err(|e| HarvestError::PdfiumBindingFailed(format!("{e:?}")))?,
    };

    debug!("pdfium library bound");
    Ok(Pdfium::new(bindings))
}

/// Opens PDFs through pdfium.
pub struct PdfiumBackend {
    pdfium: Pdfium,
    password: Option<String>,
}

impl PdfiumBackend {
    /// Bind pdfium (see [`bind_pdfium`]) and remember the document password.
    pub fn bind(library: Option<&str>, password: Option<String>) -> Result<Self, HarvestError> {
        Ok(Self {
            pdfium: bind_pdfium(library)?,
            password,
        })
    }

    /// Wrap an already bound pdfium instance.
    pub fn with_pdfium(pdfium: Pdfium, password: Option<String>) -> Self {
        Self { pdfium, password }
    }
}

impl DocumentBackend for PdfiumBackend {
    fn open<'a>(&'a self, path: &Path) -> Result<Box<dyn Document + 'a>, HarvestError> {
        check_pdf_magic(path)?;

        let password = self.password.as_deref();
        let document = self
            .pdfium
            .load_pdf_from_file(path, password)
            .map_err(|e| {
                let err_str = format!("{:?}", e);
                if err_str.contains("Password") || err_str.contains("password") {
                    if password.is_some() {
                        HarvestError::WrongPassword {
                            path: path.to_path_buf(),
                        }
                    } else {
                        HarvestError::PasswordRequired {
                            path: path.to_path_buf(),
                        }
                    }
                } else {
                    HarvestError::CorruptPdf {
                        path: path.to_path_buf(),
                        detail: err_str,
                    }
                }
            })?;

        info!("PDF loaded: {} pages", document.pages().len());
        Ok(Box::new(PdfiumDocument { document }))
    }
}

/// Reject files that do not start with `%PDF` before handing them to pdfium.
fn check_pdf_magic(path: &Path) -> Result<(), HarvestError> {
    let mut f = std::fs::File::open(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => HarvestError::FileNotFound {
            path: path.to_path_buf(),
        },
        _ => HarvestError::CorruptPdf {
            path: path.to_path_buf(),
            detail: e.to_string(),
        },
    })?;

    let mut magic = [0u8; 4];
    if f.read_exact(&mut magic).is_ok() && &magic != b"%PDF" {
        return Err(HarvestError::NotAPdf {
            path: path.to_path_buf(),
            magic: magic.to_vec(),
        });
    }
    Ok(())
}

struct PdfiumDocument<'a> {
    document: PdfDocument<'a>,
}

impl Document for PdfiumDocument<'_> {
    fn page_count(&self) -> usize {
        self.document.pages().len() as usize
    }

    fn pages(&self) -> PageIter<'_> {
        let pages = self.document.pages().iter().enumerate().map(|(idx, page)| {
            let page: Box<dyn Page + '_> = Box::new(PdfiumPage {
                page,
                number: idx + 1,
            });
            Ok::<_, HarvestError>(page)
        });
        Box::new(pages)
    }
}

struct PdfiumPage<'a> {
    page: PdfPage<'a>,
    number: usize,
}

impl Page for PdfiumPage<'_> {
    fn number(&self) -> usize {
        self.number
    }

    fn images(&self) -> ImageIter<'_> {
        let objects = self.page.objects();
        Box::new(ImageWalk {
            objects,
            page: self.number,
            stack: vec![Level {
                next: 0,
                len: objects.len(),
            }],
            seen: SeenImages::default(),
            yielded: 0,
        })
    }

    fn text(&self) -> Result<String, HarvestError> {
        let text = self
            .page
            .text()
            .map_err(|e| HarvestError::PageUnreadable {
                page: self.number,
                detail: format!("{e:?}"),
            })?;
        Ok(text.all())
    }
}

// ── Image walk ───────────────────────────────────────────────────────────

/// One open object list: the page's, or a form XObject's.
struct Level {
    next: usize,
    len: usize,
}

enum Visited {
    Image { key: Option<u64> },
    Form { len: usize },
    Other,
}

/// Depth-first walk over a page's image objects.
///
/// pdfium's form objects borrow their parent, so the walk keeps only index
/// paths and re-resolves the current object from the page on each step.
struct ImageWalk<'s, 'a> {
    objects: &'s PdfPageObjects<'a>,
    page: usize,
    stack: Vec<Level>,
    seen: SeenImages,
    yielded: usize,
}

impl ImageWalk<'_, '_> {
    fn with_object<R>(
        &self,
        path: &[usize],
        f: impl FnOnce(&PdfPageObject<'_>) -> R,
    ) -> Result<R, HarvestError> {
        let unreadable = |detail: String| HarvestError::PageUnreadable {
            page: self.page,
            detail,
        };
        let (&first, rest) = path
            .split_first()
            .ok_or_else(|| unreadable("empty object path".into()))?;
        let object = self
            .objects
            .get(first)
            .map_err(|e| unreadable(format!("{e:?}")))?;
        descend(&object, rest, f).map_err(unreadable)
    }

    fn decode(&mut self, path: &[usize]) -> Result<ExtractedImage, HarvestError> {
        self.yielded += 1;
        let (page, index) = (self.page, self.yielded);
        let decode_err = |detail: String| HarvestError::ImageDecode {
            page,
            index,
            detail,
        };

        let raw = self
            .with_object(path, |object| {
                object
                    .as_image_object()
                    .map(|image| image.get_raw_image().map_err(|e| format!("{e:?}")))
            })?
            .ok_or_else(|| decode_err("object is not an image".into()))?
            .map_err(decode_err)?;

        debug!(
            "Decoded image {} on page {} ({}x{})",
            index,
            page,
            raw.width(),
            raw.height()
        );
        Ok(ExtractedImage::from(raw))
    }
}

/// Follow `rest` through nested form XObjects below `object`, then apply `f`.
fn descend<R>(
    object: &PdfPageObject<'_>,
    rest: &[usize],
    f: impl FnOnce(&PdfPageObject<'_>) -> R,
) -> Result<R, String> {
    match rest.split_first() {
        None => Ok(f(object)),
        Some((&index, rest)) => {
            let form = object
                .as_x_object_form_object()
                .ok_or_else(|| "object is not a form XObject".to_string())?;
            let child = form.get(index).map_err(|e| format!("{e:?}"))?;
            descend(&child, rest, f)
        }
    }
}

fn visit(object: &PdfPageObject<'_>) -> Visited {
    if let Some(image) = object.as_image_object() {
        let key = image.get_raw_image_data().ok().map(|data| {
            let size = (image.width().ok(), image.height().ok());
            content_key((size, data))
        });
        Visited::Image { key }
    } else if let Some(form) = object.as_x_object_form_object() {
        Visited::Form { len: form.len() }
    } else {
        Visited::Other
    }
}

impl Iterator for ImageWalk<'_, '_> {
    type Item = Result<ExtractedImage, HarvestError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let level = self.stack.last_mut()?;
            if level.next >= level.len {
                self.stack.pop();
                continue;
            }
            let path: Vec<usize> = self.stack.iter().map(|l| l.next).collect();
            if let Some(level) = self.stack.last_mut() {
                level.next += 1;
            }

            match self.with_object(&path, visit) {
                Err(e) => return Some(Err(e)),
                Ok(Visited::Form { len }) => self.stack.push(Level { next: 0, len }),
                Ok(Visited::Image { key: Some(key) }) if !self.seen.first_sighting(key) => {
                    debug!("Skipping repeated image draw on page {}", self.page);
                }
                Ok(Visited::Image { .. }) => return Some(self.decode(&path)),
                Ok(Visited::Other) => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn magic_check_rejects_html() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("source.pdf");
        std::fs::write(&path, b"<!doctype html>").unwrap();

        let err = check_pdf_magic(&path).unwrap_err();
        assert!(matches!(err, HarvestError::NotAPdf { ref magic, .. } if magic == b"<!do"));
    }

    #[test]
    fn magic_check_accepts_pdf_header() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("source.pdf");
        std::fs::write(&path, b"%PDF-1.7\n").unwrap();
        assert!(check_pdf_magic(&path).is_ok());
    }

    #[test]
    fn magic_check_missing_file() {
        let err = check_pdf_magic(Path::new("/nonexistent/source.pdf")).unwrap_err();
        assert!(matches!(err, HarvestError::FileNotFound { .. }));
    }
}
