//! # pdfharvest
//!
//! Download a PDF, pull out its first two images and first four paragraphs,
//! and serve the result through a small web view.
//!
//! ## Pipeline Overview
//!
//! ```text
//! URL
//!  │
//!  ├─ 1. Fetch    single HTTP GET (timeout, no retries) → source.pdf
//!  ├─ 2. Open     pdfium via the DocumentBackend trait (spawn_blocking)
//!  ├─ 3. Images   first 2 in page order, CMYK → RGB → image1.png, image2.png
//!  ├─ 4. Text     pages joined, blank-line split, first 4 → paragraphs.json
//!  └─ 5. View     axum: GET / and GET /images/{file}
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdfharvest::{harvest, HarvestConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = HarvestConfig::builder().output_dir("output").build()?;
//!     let output = harvest("https://example.com/report.pdf", &config).await?;
//!     for p in &output.result.paragraphs {
//!         println!("{p}");
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdfharvest` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! ## PDFium
//!
//! The native pdfium library is located at run time: an explicit path from
//! the config, then `PDFIUM_LIB_PATH`, then the current directory, then the
//! system library paths.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod artifacts;
pub mod config;
pub mod error;
pub mod harvest;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod view;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{HarvestConfig, HarvestConfigBuilder};
pub use error::{ErrorKind, HarvestError};
pub use harvest::{
    extract_file, extract_file_with_backend, harvest, harvest_sync, harvest_with_backend,
};
pub use output::{ExtractionResult, HarvestOutput, HarvestStats};
pub use pipeline::backend::{
    DocumentBackend, ExtractedImage, MemoryBackend, MemoryObject, MemoryPage, PixelLayout,
};
pub use pipeline::extract::{extract, MAX_IMAGES, MAX_PARAGRAPHS};
pub use pipeline::fetch::fetch;
pub use pipeline::pdfium::PdfiumBackend;
pub use progress::{HarvestProgressCallback, NoopProgressCallback, ProgressCallback};
pub use view::ViewConfig;
