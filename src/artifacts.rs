//! On-disk artifact layout shared by the pipeline and the view.
//!
//! ```text
//! <output_dir>/
//!   source.pdf        raw fetched document
//!   image1.png        first accepted image (if any)
//!   image2.png        second accepted image (if any)
//!   paragraphs.json   JSON array of 0–4 strings, document order
//! ```
//!
//! `paragraphs.json` is the only contract the view depends on, so it is
//! written atomically: a temp file in the same directory is renamed over
//! the final name.

use crate::error::HarvestError;
use once_cell::sync::Lazy;
use regex::Regex;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::debug;

/// File name of the downloaded document inside the output directory.
pub const SOURCE_FILE: &str = "source.pdf";

/// File name of the paragraph artifact.
pub const PARAGRAPHS_FILE: &str = "paragraphs.json";

/// Extension every extracted image is saved with.
pub const IMAGE_EXTENSION: &str = "png";

static RE_IMAGE_FILE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^image([0-9]+)\.(?:png|jpe?g)$").unwrap());

/// `image{n}.png` for the 1-indexed image `n`.
pub fn image_file_name(n: usize) -> String {
    format!("image{n}.{IMAGE_EXTENSION}")
}

/// Serialise `paragraphs` as pretty-printed UTF-8 JSON into
/// `<dir>/paragraphs.json`, replacing any previous file.
pub fn write_paragraphs(dir: &Path, paragraphs: &[String]) -> Result<PathBuf, HarvestError> {
    let path = dir.join(PARAGRAPHS_FILE);
    let write_err = |source: std::io::Error| HarvestError::OutputWriteFailed {
        path: path.clone(),
        source,
    };

    let mut tmp = NamedTempFile::new_in(dir).map_err(write_err)?;
    serde_json::to_writer_pretty(&mut tmp, paragraphs)
        .map_err(|e| write_err(std::io::Error::other(e)))?;
    tmp.flush().map_err(write_err)?;
    tmp.persist(&path).map_err(|e| write_err(e.error))?;

    debug!("Wrote {} paragraphs to {}", paragraphs.len(), path.display());
    Ok(path)
}

/// Read `<dir>/paragraphs.json`.
///
/// Returns `Ok(None)` only when the file does not exist. A file that exists
/// but is unreadable or not a JSON array of strings is an error.
pub async fn load_paragraphs(dir: &Path) -> Result<Option<Vec<String>>, HarvestError> {
    let path = dir.join(PARAGRAPHS_FILE);
    let bytes = match tokio::fs::read(&path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(source) => return Err(HarvestError::ArtifactReadFailed { path, source }),
    };

    serde_json::from_slice(&bytes)
        .map(Some)
        .map_err(|source| HarvestError::MalformedArtifact { path, source })
}

/// File names of the `imageN.<ext>` artifacts in `dir`, ordered by `N`.
///
/// A missing directory yields an empty list.
pub async fn list_images(dir: &Path) -> Result<Vec<String>, HarvestError> {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(source) => {
            return Err(HarvestError::ArtifactReadFailed {
                path: dir.to_path_buf(),
                source,
            })
        }
    };

    let mut found: Vec<(u64, String)> = Vec::new();
    loop {
        let entry = entries
            .next_entry()
            .await
            .map_err(|source| HarvestError::ArtifactReadFailed {
                path: dir.to_path_buf(),
                source,
            })?;
        let Some(entry) = entry else { break };

        let name = entry.file_name().to_string_lossy().into_owned();
        if let Some(caps) = RE_IMAGE_FILE.captures(&name) {
            if let Ok(n) = caps[1].parse::<u64>() {
                found.push((n, name));
            }
        }
    }

    found.sort();
    Ok(found.into_iter().map(|(_, name)| name).collect())
}
