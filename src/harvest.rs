//! End-to-end entry points: fetch a document, extract it, persist paragraphs.
//!
//! The download is async (reqwest). Everything touching the document runs on
//! a blocking worker via `tokio::task::spawn_blocking`, because pdfium is a
//! synchronous C library and must not stall the runtime.

use crate::artifacts;
use crate::config::HarvestConfig;
use crate::error::HarvestError;
use crate::output::{ExtractionResult, HarvestOutput, HarvestStats};
use crate::pipeline::backend::DocumentBackend;
use crate::pipeline::{extract, fetch, pdfium::PdfiumBackend};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::info;

/// Download `url` and extract its leading images and paragraphs into
/// `config.output_dir`.
///
/// On success the directory holds `source.pdf`, zero to two `imageN.png`
/// files and `paragraphs.json`.
///
/// # Errors
/// Any fetch failure is returned before extraction starts, so no image or
/// paragraph artifact is produced. Parse and I/O failures during extraction
/// abort the run; `paragraphs.json` is then left untouched.
pub async fn harvest(url: &str, config: &HarvestConfig) -> Result<HarvestOutput, HarvestError> {
    let library = config.pdfium_library.clone();
    let password = config.password.clone();
    run(url, config, move || PdfiumBackend::bind(library.as_deref(), password)).await
}

/// [`harvest`] with a caller-supplied document backend.
pub async fn harvest_with_backend<B>(
    url: &str,
    config: &HarvestConfig,
    backend: B,
) -> Result<HarvestOutput, HarvestError>
where
    B: DocumentBackend + Send + 'static,
{
    run(url, config, move || Ok(backend)).await
}

/// Synchronous wrapper around [`harvest`].
///
/// Creates a temporary tokio runtime internally.
pub fn harvest_sync(url: &str, config: &HarvestConfig) -> Result<HarvestOutput, HarvestError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| HarvestError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(harvest(url, config))
}

/// Extract an already-local document into `config.output_dir`.
///
/// Same as [`harvest`] minus the download; `source.pdf` is not written.
pub async fn extract_file(
    path: impl AsRef<Path>,
    config: &HarvestConfig,
) -> Result<HarvestOutput, HarvestError> {
    let library = config.pdfium_library.clone();
    let password = config.password.clone();
    run_local(path.as_ref(), config, move || {
        PdfiumBackend::bind(library.as_deref(), password)
    })
    .await
}

/// [`extract_file`] with a caller-supplied document backend.
pub async fn extract_file_with_backend<B>(
    path: impl AsRef<Path>,
    config: &HarvestConfig,
    backend: B,
) -> Result<HarvestOutput, HarvestError>
where
    B: DocumentBackend + Send + 'static,
{
    run_local(path.as_ref(), config, move || Ok(backend)).await
}

// ── Internal helpers ─────────────────────────────────────────────────────

async fn run<B, F>(
    url: &str,
    config: &HarvestConfig,
    make_backend: F,
) -> Result<HarvestOutput, HarvestError>
where
    B: DocumentBackend,
    F: FnOnce() -> Result<B, HarvestError> + Send + 'static,
{
    let total_start = Instant::now();
    info!("Starting harvest: {}", url);

    tokio::fs::create_dir_all(&config.output_dir)
        .await
        .map_err(|source| HarvestError::CreateDirFailed {
            path: config.output_dir.clone(),
            source,
        })?;

    // ── Step 1: Fetch ────────────────────────────────────────────────────
    if let Some(ref cb) = config.progress_callback {
        cb.on_download_start(url);
    }
    let source_path = config.output_dir.join(artifacts::SOURCE_FILE);
    let download_start = Instant::now();
    let downloaded_bytes = fetch::fetch(url, &source_path, config.download_timeout_secs).await?;
    let download_duration_ms = download_start.elapsed().as_millis() as u64;
    if let Some(ref cb) = config.progress_callback {
        cb.on_download_complete(downloaded_bytes);
    }

    // ── Step 2: Extract + persist ────────────────────────────────────────
    let (result, paragraphs_path, extract_duration_ms) =
        extract_blocking(make_backend, source_path.clone(), config).await?;

    Ok(finish(
        config,
        result,
        source_path,
        paragraphs_path,
        HarvestStats {
            downloaded_bytes,
            download_duration_ms,
            extract_duration_ms,
            total_duration_ms: total_start.elapsed().as_millis() as u64,
            ..Default::default()
        },
    ))
}

async fn run_local<B, F>(
    path: &Path,
    config: &HarvestConfig,
    make_backend: F,
) -> Result<HarvestOutput, HarvestError>
where
    B: DocumentBackend,
    F: FnOnce() -> Result<B, HarvestError> + Send + 'static,
{
    let total_start = Instant::now();
    info!("Starting local extraction: {}", path.display());

    let (result, paragraphs_path, extract_duration_ms) =
        extract_blocking(make_backend, path.to_path_buf(), config).await?;

    Ok(finish(
        config,
        result,
        path.to_path_buf(),
        paragraphs_path,
        HarvestStats {
            extract_duration_ms,
            total_duration_ms: total_start.elapsed().as_millis() as u64,
            ..Default::default()
        },
    ))
}

/// Run extraction and the `paragraphs.json` write on a blocking worker.
async fn extract_blocking<B, F>(
    make_backend: F,
    document: PathBuf,
    config: &HarvestConfig,
) -> Result<(ExtractionResult, PathBuf, u64), HarvestError>
where
    B: DocumentBackend,
    F: FnOnce() -> Result<B, HarvestError> + Send + 'static,
{
    let output_dir = config.output_dir.clone();
    let progress = config.progress_callback.clone();

    tokio::task::spawn_blocking(move || {
        let start = Instant::now();
        let backend = make_backend()?;
        let result = extract::extract_with_progress(
            &backend,
            &document,
            &output_dir,
            progress.as_deref(),
        )?;
        let paragraphs_path = artifacts::write_paragraphs(&output_dir, &result.paragraphs)?;
        Ok::<_, HarvestError>((result, paragraphs_path, start.elapsed().as_millis() as u64))
    })
    .await
    .map_err(|e| HarvestError::Internal(format!("spawn_blocking panicked: {}", e)))?
}

fn finish(
    config: &HarvestConfig,
    result: ExtractionResult,
    source_path: PathBuf,
    paragraphs_path: PathBuf,
    mut stats: HarvestStats,
) -> HarvestOutput {
    stats.images_saved = result.images.len();
    stats.paragraphs_found = result.paragraphs.len();

    if let Some(ref cb) = config.progress_callback {
        cb.on_harvest_complete(stats.images_saved, stats.paragraphs_found);
    }
    info!(
        "Harvest complete: {} images, {} paragraphs in {}ms",
        stats.images_saved, stats.paragraphs_found, stats.total_duration_ms
    );

    HarvestOutput {
        result,
        source_path,
        paragraphs_path,
        stats,
    }
}
