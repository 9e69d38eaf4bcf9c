//! Configuration for a harvest run.
//!
//! All pipeline knobs live in [`HarvestConfig`], built via
//! [`HarvestConfig::builder()`] or taken from [`HarvestConfig::default()`].
//! The image and paragraph caps are deliberately not here: they are fixed
//! by [`crate::pipeline::extract::MAX_IMAGES`] and
//! [`crate::pipeline::extract::MAX_PARAGRAPHS`].

use crate::error::HarvestError;
use crate::progress::ProgressCallback;
use std::fmt;
use std::path::PathBuf;

/// Default HTTP timeout for the single download attempt, in seconds.
pub const DEFAULT_DOWNLOAD_TIMEOUT_SECS: u64 = 30;

/// Configuration for a download-and-extract run.
///
/// # Example
/// ```rust
/// use pdfharvest::HarvestConfig;
///
/// let config = HarvestConfig::builder()
///     .output_dir("artifacts")
///     .download_timeout_secs(10)
///     .build()
///     .unwrap();
/// assert_eq!(config.download_timeout_secs, 10);
/// ```
#[derive(Clone)]
pub struct HarvestConfig {
    /// Directory receiving `source.pdf`, the images and `paragraphs.json`.
    /// Created if absent. Default: `output`.
    pub output_dir: PathBuf,

    /// Timeout for the single HTTP GET, in seconds. Default: 30.
    pub download_timeout_secs: u64,

    /// PDF user password for encrypted documents.
    pub password: Option<String>,

    /// Explicit path to the pdfium shared library.
    ///
    /// When `None`, `PDFIUM_LIB_PATH`, the current directory and the system
    /// library paths are tried in that order.
    pub pdfium_library: Option<String>,

    /// Optional observer for stage-level events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("output"),
            download_timeout_secs: DEFAULT_DOWNLOAD_TIMEOUT_SECS,
            password: None,
            pdfium_library: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for HarvestConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HarvestConfig")
            .field("output_dir", &self.output_dir)
            .field("download_timeout_secs", &self.download_timeout_secs)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("pdfium_library", &self.pdfium_library)
            .field(
                "progress_callback",
                &self
                    .progress_callback
                    .as_ref()
                    .map(|_| "<dyn HarvestProgressCallback>"),
            )
            .finish()
    }
}

impl HarvestConfig {
    /// Create a new builder for `HarvestConfig`.
    pub fn builder() -> HarvestConfigBuilder {
        HarvestConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`HarvestConfig`].
#[derive(Debug)]
pub struct HarvestConfigBuilder {
    config: HarvestConfig,
}

impl HarvestConfigBuilder {
    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.output_dir = dir.into();
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    pub fn pdfium_library(mut self, path: impl Into<String>) -> Self {
        self.config.pdfium_library = Some(path.into());
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<HarvestConfig, HarvestError> {
        let c = &self.config;
        if c.download_timeout_secs == 0 {
            return Err(HarvestError::InvalidConfig(
                "Download timeout must be at least 1 second".into(),
            ));
        }
        if c.output_dir.as_os_str().is_empty() {
            return Err(HarvestError::InvalidConfig(
                "Output directory must not be empty".into(),
            ));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let c = HarvestConfig::default();
        assert_eq!(c.output_dir, PathBuf::from("output"));
        assert_eq!(c.download_timeout_secs, 30);
        assert!(c.password.is_none());
    }

    #[test]
    fn zero_timeout_rejected() {
        let err = HarvestConfig::builder()
            .download_timeout_secs(0)
            .build()
            .unwrap_err();
        assert!(matches!(err, HarvestError::InvalidConfig(_)));
    }

    #[test]
    fn debug_redacts_password() {
        let c = HarvestConfig::builder().password("hunter2").build().unwrap();
        let dbg = format!("{c:?}");
        assert!(!dbg.contains("hunter2"));
        assert!(dbg.contains("<redacted>"));
    }
}
