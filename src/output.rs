//! Result types returned by the extractor and the end-to-end pipeline.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// What the extractor produced for one document.
///
/// `images` holds at most two paths and `paragraphs` at most four entries,
/// both in document order. Fewer entries only mean the document had fewer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionResult {
    /// Paths of the saved images (`image1.png`, `image2.png`).
    pub images: Vec<PathBuf>,
    /// Trimmed, non-empty, blank-line-delimited text blocks.
    pub paragraphs: Vec<String>,
}

/// Timing and size counters for a harvest run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HarvestStats {
    /// Size of the downloaded document body. Zero when no download happened.
    pub downloaded_bytes: u64,
    pub images_saved: usize,
    pub paragraphs_found: usize,
    pub download_duration_ms: u64,
    pub extract_duration_ms: u64,
    pub total_duration_ms: u64,
}

/// Everything a completed run leaves behind.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HarvestOutput {
    pub result: ExtractionResult,
    /// The raw document (`source.pdf`), or the local input for `extract_file`.
    pub source_path: PathBuf,
    /// The `paragraphs.json` artifact.
    pub paragraphs_path: PathBuf,
    pub stats: HarvestStats,
}
