//! Progress-callback trait for stage-level harvest events.
//!
//! Inject an [`Arc<dyn HarvestProgressCallback>`] via
//! [`crate::config::HarvestConfigBuilder::progress_callback`] to be told when
//! the download starts and finishes, when extraction begins, as each image is
//! written, and when the run completes. The CLI drives its spinner from these
//! hooks; library users can forward them anywhere.
//!
//! # Example
//!
//! ```rust
//! use pdfharvest::{HarvestConfig, HarvestProgressCallback};
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! struct Printer;
//!
//! impl HarvestProgressCallback for Printer {
//!     fn on_image_saved(&self, index: usize, path: &Path) {
//!         eprintln!("image {index} → {}", path.display());
//!     }
//! }
//!
//! let config = HarvestConfig::builder()
//!     .progress_callback(Arc::new(Printer))
//!     .build()
//!     .unwrap();
//! ```

use std::path::Path;
use std::sync::Arc;

/// Called by the pipeline at each stage boundary.
///
/// The extraction stage runs on a blocking worker thread, so implementations
/// must be `Send + Sync`. Every method defaults to a no-op.
pub trait HarvestProgressCallback: Send + Sync {
    /// Called right before the HTTP GET is issued.
    fn on_download_start(&self, url: &str) {
        let _ = url;
    }

    /// Called once the document has been committed to disk.
    ///
    /// # Arguments
    /// * `bytes`: size of the downloaded body
    fn on_download_complete(&self, bytes: u64) {
        let _ = bytes;
    }

    /// Called when the extractor opens the local document.
    fn on_extraction_start(&self, document: &Path) {
        let _ = document;
    }

    /// Called after each accepted image is written.
    ///
    /// # Arguments
    /// * `index`: 1-indexed image number (matches `imageN.png`)
    /// * `path`: where the image was written
    fn on_image_saved(&self, index: usize, path: &Path) {
        let _ = (index, path);
    }

    /// Called once after `paragraphs.json` has been written.
    fn on_harvest_complete(&self, images: usize, paragraphs: usize) {
        let _ = (images, paragraphs);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl HarvestProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::HarvestConfig`].
pub type ProgressCallback = Arc<dyn HarvestProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

    #[derive(Default)]
    struct TrackingCallback {
        downloaded: AtomicU64,
        images: AtomicUsize,
        completed_paragraphs: AtomicUsize,
    }

    impl HarvestProgressCallback for TrackingCallback {
        fn on_download_complete(&self, bytes: u64) {
            self.downloaded.store(bytes, Ordering::SeqCst);
        }

        fn on_image_saved(&self, _index: usize, _path: &Path) {
            self.images.fetch_add(1, Ordering::SeqCst);
        }

        fn on_harvest_complete(&self, _images: usize, paragraphs: usize) {
            self.completed_paragraphs.store(paragraphs, Ordering::SeqCst);
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_download_start("https://example.com/a.pdf");
        cb.on_download_complete(1024);
        cb.on_extraction_start(Path::new("source.pdf"));
        cb.on_image_saved(1, Path::new("image1.png"));
        cb.on_harvest_complete(2, 4);
    }

    #[test]
    fn tracking_callback_receives_events() {
        let tracker = Arc::new(TrackingCallback::default());
        let cb: ProgressCallback = tracker.clone();

        cb.on_download_complete(2048);
        cb.on_image_saved(1, Path::new("image1.png"));
        cb.on_image_saved(2, Path::new("image2.png"));
        cb.on_harvest_complete(2, 3);

        assert_eq!(tracker.downloaded.load(Ordering::SeqCst), 2048);
        assert_eq!(tracker.images.load(Ordering::SeqCst), 2);
        assert_eq!(tracker.completed_paragraphs.load(Ordering::SeqCst), 3);
    }
}
