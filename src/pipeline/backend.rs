//! Document capability interface.
//!
//! The extractor never talks to a PDF library directly. It sees only:
//!
//! ```text
//! DocumentBackend::open(path) ──▶ Document::pages() ──▶ Page::images()
//!                                                   └─▶ Page::text()
//! ```
//!
//! Pages and images are produced lazily, so a consumer that stops early
//! never pays for decoding what it did not look at. Closing is `Drop`: the
//! boxed document and page handles release their library resources on every
//! exit path, including `?` returns.
//!
//! [`crate::pipeline::pdfium::PdfiumBackend`] is the production
//! implementation; [`MemoryBackend`] serves pre-decoded content and fakes.

use crate::error::HarvestError;
use image::DynamicImage;
use std::collections::hash_map::DefaultHasher;
use std::collections::HashSet;
use std::hash::{Hash, Hasher};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use thiserror::Error;
use tracing::debug;

/// Lazily produced pages, in document order.
pub type PageIter<'a> = Box<dyn Iterator<Item = Result<Box<dyn Page + 'a>, HarvestError>> + 'a>;

/// Lazily decoded images of one page, in stored order.
pub type ImageIter<'a> = Box<dyn Iterator<Item = Result<ExtractedImage, HarvestError>> + 'a>;

/// Opens documents for read-only structured access.
pub trait DocumentBackend {
    /// Open the document at `path`.
    ///
    /// Fails with a parse-kind [`HarvestError`] when the file is missing or
    /// not a readable document of the expected format.
    fn open<'a>(&'a self, path: &Path) -> Result<Box<dyn Document + 'a>, HarvestError>;
}

/// An opened document. Dropping it closes it.
pub trait Document {
    fn page_count(&self) -> usize;

    /// Pages in document order.
    fn pages(&self) -> PageIter<'_>;
}

/// A read-only view of a single page.
pub trait Page {
    /// 1-indexed page number.
    fn number(&self) -> usize;

    /// Embedded raster images, decoded on demand.
    ///
    /// Images drawn through form XObjects are included at the point the
    /// form is drawn. An image XObject drawn more than once on the page is
    /// yielded once. Inline (`BI … EI`) images are not embedded images and
    /// are not yielded.
    fn images(&self) -> ImageIter<'_>;

    /// Raw text of the page as the library lays it out.
    fn text(&self) -> Result<String, HarvestError>;
}

// ── ExtractedImage ───────────────────────────────────────────────────────

/// Channel layout of an [`ExtractedImage`]. Samples are always 8-bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelLayout {
    Luma,
    LumaAlpha,
    Rgb,
    Rgba,
    Cmyk,
    CmykAlpha,
}

impl PixelLayout {
    pub fn channels(self) -> usize {
        match self {
            PixelLayout::Luma => 1,
            PixelLayout::LumaAlpha => 2,
            PixelLayout::Rgb => 3,
            PixelLayout::Rgba => 4,
            PixelLayout::Cmyk => 4,
            PixelLayout::CmykAlpha => 5,
        }
    }

    /// Whether the layout must be converted to RGB before saving.
    ///
    /// Only the gray and RGB families (with or without alpha) are written
    /// as stored; every subtractive layout is converted.
    pub fn needs_rgb_conversion(self) -> bool {
        matches!(self, PixelLayout::Cmyk | PixelLayout::CmykAlpha)
    }
}

/// Sample buffer length does not match `width × height × channels`.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("expected {expected} samples for {width}x{height} {layout:?}, got {actual}")]
pub struct InvalidSamples {
    pub width: u32,
    pub height: u32,
    pub layout: PixelLayout,
    pub expected: usize,
    pub actual: usize,
}

/// A decoded raster image, alive only until it is normalised and saved.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ExtractedImage {
    width: u32,
    height: u32,
    layout: PixelLayout,
    samples: Vec<u8>,
}

impl ExtractedImage {
    /// Wrap interleaved 8-bit samples, validating the buffer length.
    pub fn new(
        width: u32,
        height: u32,
        layout: PixelLayout,
        samples: Vec<u8>,
    ) -> Result<Self, InvalidSamples> {
        let expected = width as usize * height as usize * layout.channels();
        if samples.len() != expected {
            return Err(InvalidSamples {
                width,
                height,
                layout,
                expected,
                actual: samples.len(),
            });
        }
        Ok(Self {
            width,
            height,
            layout,
            samples,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn layout(&self) -> PixelLayout {
        self.layout
    }

    pub fn channels(&self) -> usize {
        self.layout.channels()
    }

    pub fn samples(&self) -> &[u8] {
        &self.samples
    }

    pub fn into_samples(self) -> Vec<u8> {
        self.samples
    }
}

impl From<DynamicImage> for ExtractedImage {
    fn from(img: DynamicImage) -> Self {
        let (width, height) = (img.width(), img.height());
        let (layout, samples) = match img {
            DynamicImage::ImageLuma8(buf) => (PixelLayout::Luma, buf.into_raw()),
            DynamicImage::ImageLumaA8(buf) => (PixelLayout::LumaAlpha, buf.into_raw()),
            DynamicImage::ImageRgb8(buf) => (PixelLayout::Rgb, buf.into_raw()),
            DynamicImage::ImageRgba8(buf) => (PixelLayout::Rgba, buf.into_raw()),
            // 16-bit and float variants are narrowed to 8 bits per sample.
            other if other.color().has_alpha() => (PixelLayout::Rgba, other.to_rgba8().into_raw()),
            other => (PixelLayout::Rgb, other.to_rgb8().into_raw()),
        };
        Self {
            width,
            height,
            layout,
            samples,
        }
    }
}

/// Per-page record of image XObjects already yielded.
#[derive(Debug, Default)]
pub(crate) struct SeenImages(HashSet<u64>);

impl SeenImages {
    /// `true` the first time `key` is offered on this page.
    pub(crate) fn first_sighting(&mut self, key: u64) -> bool {
        self.0.insert(key)
    }
}

/// Stable key for image content, used to recognise repeated draws.
pub(crate) fn content_key(parts: impl Hash) -> u64 {
    let mut hasher = DefaultHasher::new();
    parts.hash(&mut hasher);
    hasher.finish()
}

// ── MemoryBackend ────────────────────────────────────────────────────────

/// A page content object of a [`MemoryPage`].
#[derive(Debug, Clone)]
pub enum MemoryObject {
    /// An image XObject. Draws sharing an `id` are the same XObject.
    Image { id: u64, image: ExtractedImage },
    /// An image written inline in the content stream.
    InlineImage(ExtractedImage),
    /// A form XObject and its content objects, in stored order.
    Form(Vec<MemoryObject>),
}

/// One page of a [`MemoryBackend`] document.
#[derive(Debug, Clone, Default)]
pub struct MemoryPage {
    pub objects: Vec<MemoryObject>,
    pub text: String,
}

impl MemoryPage {
    /// A page drawing each of `images` once, as distinct XObjects.
    pub fn new(images: Vec<ExtractedImage>, text: impl Into<String>) -> Self {
        let objects = images
            .into_iter()
            .enumerate()
            .map(|(id, image)| MemoryObject::Image {
                id: id as u64,
                image,
            })
            .collect();
        Self::with_objects(objects, text)
    }

    pub fn with_objects(objects: Vec<MemoryObject>, text: impl Into<String>) -> Self {
        Self {
            objects,
            text: text.into(),
        }
    }

    /// Image XObjects in drawing order, forms expanded, repeats dropped.
    fn image_xobjects(&self) -> Vec<&ExtractedImage> {
        fn walk<'a>(
            objects: &'a [MemoryObject],
            seen: &mut SeenImages,
            out: &mut Vec<&'a ExtractedImage>,
        ) {
            for object in objects {
                match object {
                    MemoryObject::Image { id, image } => {
                        if seen.first_sighting(*id) {
                            out.push(image);
                        }
                    }
                    MemoryObject::InlineImage(_) => {}
                    MemoryObject::Form(children) => walk(children, seen, out),
                }
            }
        }

        let mut out = Vec::new();
        walk(&self.objects, &mut SeenImages::default(), &mut out);
        out
    }
}

/// A document held entirely in memory.
///
/// `open` ignores the path: every open yields the same pages. The backend
/// counts how many images were handed out, which lets callers observe that
/// traversal stopped early.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    pages: Vec<MemoryPage>,
    decoded: AtomicUsize,
}

impl MemoryBackend {
    pub fn new(pages: Vec<MemoryPage>) -> Self {
        Self {
            pages,
            decoded: AtomicUsize::new(0),
        }
    }

    /// Total images produced by `Page::images()` so far.
    pub fn decoded_images(&self) -> usize {
        self.decoded.load(Ordering::SeqCst)
    }
}

impl DocumentBackend for MemoryBackend {
    fn open<'a>(&'a self, path: &Path) -> Result<Box<dyn Document + 'a>, HarvestError> {
        debug!(
            "Opening in-memory document ({} pages) for {}",
            self.pages.len(),
            path.display()
        );
        Ok(Box::new(MemoryDocument { backend: self }))
    }
}

struct MemoryDocument<'a> {
    backend: &'a MemoryBackend,
}

impl Document for MemoryDocument<'_> {
    fn page_count(&self) -> usize {
        self.backend.pages.len()
    }

    fn pages(&self) -> PageIter<'_> {
        let decoded = &self.backend.decoded;
        let pages = self.backend.pages.iter().enumerate().map(move |(idx, page)| {
            let page: Box<dyn Page + '_> = Box::new(MemoryPageView {
                page,
                number: idx + 1,
                decoded,
            });
            Ok::<_, HarvestError>(page)
        });
        Box::new(pages)
    }
}

struct MemoryPageView<'a> {
    page: &'a MemoryPage,
    number: usize,
    decoded: &'a AtomicUsize,
}

impl Page for MemoryPageView<'_> {
    fn number(&self) -> usize {
        self.number
    }

    fn images(&self) -> ImageIter<'_> {
        let decoded = self.decoded;
        Box::new(self.page.image_xobjects().into_iter().map(move |img| {
            decoded.fetch_add(1, Ordering::SeqCst);
            Ok::<_, HarvestError>(img.clone())
        }))
    }

    fn text(&self) -> Result<String, HarvestError> {
        Ok(self.page.text.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    #[test]
    fn sample_length_validated() {
        let err = ExtractedImage::new(2, 2, PixelLayout::Rgb, vec![0; 11]).unwrap_err();
        assert_eq!(err.expected, 12);
        assert_eq!(err.actual, 11);
        assert!(ExtractedImage::new(2, 2, PixelLayout::Cmyk, vec![0; 16]).is_ok());
    }

    #[test]
    fn only_subtractive_layouts_convert() {
        assert!(!PixelLayout::Luma.needs_rgb_conversion());
        assert!(!PixelLayout::Rgba.needs_rgb_conversion());
        assert!(PixelLayout::Cmyk.needs_rgb_conversion());
        assert!(PixelLayout::CmykAlpha.needs_rgb_conversion());
        assert_eq!(PixelLayout::CmykAlpha.channels(), 5);
    }

    #[test]
    fn from_dynamic_image_keeps_layout() {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(3, 2, Rgba([1, 2, 3, 4])));
        let extracted = ExtractedImage::from(img);
        assert_eq!(extracted.layout(), PixelLayout::Rgba);
        assert_eq!((extracted.width(), extracted.height()), (3, 2));
        assert_eq!(extracted.samples().len(), 24);
    }

    #[test]
    fn from_sixteen_bit_narrows() {
        let img = DynamicImage::new_rgb16(2, 2);
        let extracted = ExtractedImage::from(img);
        assert_eq!(extracted.layout(), PixelLayout::Rgb);
        assert_eq!(extracted.samples().len(), 12);
    }

    #[test]
    fn memory_backend_is_lazy() {
        let img = ExtractedImage::new(1, 1, PixelLayout::Luma, vec![7]).unwrap();
        let backend = MemoryBackend::new(vec![
            MemoryPage::new(vec![img.clone(), img.clone()], "first"),
            MemoryPage::new(vec![img], "second"),
        ]);

        let doc = backend.open(Path::new("mem.pdf")).unwrap();
        assert_eq!(doc.page_count(), 2);
        assert_eq!(backend.decoded_images(), 0);

        let first = doc.pages().next().unwrap().unwrap();
        assert_eq!(first.number(), 1);
        assert_eq!(first.text().unwrap(), "first");
        let _ = first.images().next();
        assert_eq!(backend.decoded_images(), 1);
    }

    fn luma(v: u8) -> ExtractedImage {
        ExtractedImage::new(1, 1, PixelLayout::Luma, vec![v]).unwrap()
    }

    fn page_images(page: MemoryPage) -> Vec<ExtractedImage> {
        let backend = MemoryBackend::new(vec![page]);
        let doc = backend.open(Path::new("mem.pdf")).unwrap();
        let page = doc.pages().next().unwrap().unwrap();
        let images = page.images().collect::<Result<Vec<_>, _>>().unwrap();
        images
    }

    #[test]
    fn form_children_yielded_in_drawing_order() {
        let page = MemoryPage::with_objects(
            vec![
                MemoryObject::Image { id: 1, image: luma(1) },
                MemoryObject::Form(vec![
                    MemoryObject::Image { id: 2, image: luma(2) },
                    MemoryObject::Form(vec![MemoryObject::Image { id: 3, image: luma(3) }]),
                ]),
                MemoryObject::Image { id: 4, image: luma(4) },
            ],
            "",
        );
        assert_eq!(page_images(page), vec![luma(1), luma(2), luma(3), luma(4)]);
    }

    #[test]
    fn repeated_xobject_yielded_once() {
        let page = MemoryPage::with_objects(
            vec![
                MemoryObject::Image { id: 7, image: luma(7) },
                MemoryObject::Form(vec![MemoryObject::Image { id: 7, image: luma(7) }]),
                MemoryObject::Image { id: 7, image: luma(7) },
                MemoryObject::Image { id: 8, image: luma(8) },
            ],
            "",
        );
        assert_eq!(page_images(page), vec![luma(7), luma(8)]);
    }

    #[test]
    fn inline_images_skipped() {
        let page = MemoryPage::with_objects(
            vec![
                MemoryObject::InlineImage(luma(1)),
                MemoryObject::Form(vec![MemoryObject::InlineImage(luma(2))]),
                MemoryObject::Image { id: 3, image: luma(3) },
            ],
            "",
        );
        assert_eq!(page_images(page), vec![luma(3)]);
    }

    #[test]
    fn content_key_tracks_content() {
        let mut seen = SeenImages::default();
        assert!(seen.first_sighting(content_key(&luma(1))));
        assert!(!seen.first_sighting(content_key(&luma(1))));
        assert!(seen.first_sighting(content_key(&luma(2))));
    }
}
