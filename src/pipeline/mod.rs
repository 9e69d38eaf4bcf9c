//! Pipeline stages for download-and-extract.
//!
//! ## Data Flow
//!
//! ```text
//! fetch ──▶ backend.open ──▶ extract ──▶ (caller) paragraphs.json
//! (HTTP)    (pdfium)         images + paragraphs
//! ```
//!
//! 1. [`fetch`]      single HTTP GET with a timeout, atomic write to disk
//! 2. [`backend`]    narrow document interface (open / pages / images / text)
//! 3. [`pdfium`]     pdfium-render implementation of that interface
//! 4. [`encode`]     CMYK → RGB normalisation and PNG encoding
//! 5. [`paragraphs`] blank-line paragraph segmentation
//! 6. [`extract`]    the two-image / four-paragraph extraction pass

pub mod backend;
pub mod encode;
pub mod extract;
pub mod fetch;
pub mod paragraphs;
pub mod pdfium;
