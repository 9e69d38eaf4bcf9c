//! Fetcher: download a remote document to a local file.
//!
//! One GET, one timeout, no retries. The status is checked before a single
//! byte touches the disk, so a 404 leaves nothing behind. The body is then
//! written to `<destination>.part` and renamed over `destination`, which
//! means a reader never observes a half-written document.

use crate::error::HarvestError;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// Check if the input string looks like an HTTP(S) URL.
///
/// The scheme is matched case-insensitively and leading whitespace is
/// ignored.
pub fn is_url(input: &str) -> bool {
    let input = input.trim_start();
    ["http://", "https://"].iter().any(|scheme| {
        input
            .get(..scheme.len())
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case(scheme))
    })
}

/// Download `url` into `destination`, overwriting any existing file.
///
/// Returns the number of bytes written.
pub async fn fetch(url: &str, destination: &Path, timeout_secs: u64) -> Result<u64, HarvestError> {
    let url = url.trim_start();
    if url.trim().is_empty() || !is_url(url) {
        return Err(HarvestError::InvalidUrl {
            url: url.to_string(),
        });
    }

    info!("Downloading PDF from: {}", url);

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| HarvestError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| transport_error(url, timeout_secs, e))?;

    let status = response.status();
    if !status.is_success() {
        return Err(HarvestError::HttpStatus {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| transport_error(url, timeout_secs, e))?;
    debug!("Received {} bytes (HTTP {})", bytes.len(), status);

    let part = part_path(destination);
    if let Err(source) = tokio::fs::write(&part, &bytes).await {
        let _ = tokio::fs::remove_file(&part).await;
        return Err(HarvestError::OutputWriteFailed {
            path: destination.to_path_buf(),
            source,
        });
    }

    if let Err(source) = tokio::fs::rename(&part, destination).await {
        let _ = tokio::fs::remove_file(&part).await;
        return Err(HarvestError::OutputWriteFailed {
            path: destination.to_path_buf(),
            source,
        });
    }

    info!("Downloaded to: {}", destination.display());
    Ok(bytes.len() as u64)
}

fn transport_error(url: &str, timeout_secs: u64, e: reqwest::Error) -> HarvestError {
    if e.is_timeout() {
        HarvestError::DownloadTimeout {
            url: url.to_string(),
            secs: timeout_secs,
        }
    } else {
        HarvestError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        }
    }
}

/// Sibling temp path the body is staged in before the rename.
fn part_path(destination: &Path) -> PathBuf {
    let mut name = destination
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "download".into());
    name.push(".part");
    destination.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_url() {
        assert!(is_url("https://example.com/doc.pdf"));
        assert!(is_url("http://example.com/doc.pdf"));
        assert!(!is_url("/tmp/doc.pdf"));
        assert!(!is_url("ftp://example.com/doc.pdf"));
        assert!(!is_url(""));
    }

    #[test]
    fn scheme_case_and_leading_space_tolerated() {
        assert!(is_url("HTTP://example.com/doc.pdf"));
        assert!(is_url("Https://example.com/doc.pdf"));
        assert!(is_url("  https://example.com/doc.pdf"));
        assert!(is_url("\thttp://example.com/doc.pdf"));
        assert!(!is_url("HTTPS:/example.com"));
        assert!(!is_url("htt"));
    }

    #[test]
    fn part_path_is_sibling() {
        assert_eq!(
            part_path(Path::new("out/source.pdf")),
            PathBuf::from("out/source.pdf.part")
        );
    }

    #[tokio::test]
    async fn empty_url_rejected_without_io() {
        let dir = tempfile::TempDir::new().unwrap();
        let dest = dir.path().join("source.pdf");
        let err = fetch("", &dest, 30).await.unwrap_err();
        assert!(matches!(err, HarvestError::InvalidUrl { .. }));
        assert!(!dest.exists());
    }

    #[tokio::test]
    async fn unreachable_host_is_fetch_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let dest = dir.path().join("source.pdf");
        // Port 9 (discard) on loopback is closed on any sane test host.
        let err = fetch("http://127.0.0.1:9/doc.pdf", &dest, 5)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Fetch);
        assert!(!dest.exists());
    }
}
