//! CLI binary for pdfharvest.
//!
//! A thin shim over the library crate: `extract` maps flags to
//! `HarvestConfig` and runs the pipeline, `serve` starts the web view.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use pdfharvest::view::{self, ViewConfig};
use pdfharvest::{harvest, HarvestConfig, HarvestProgressCallback, ProgressCallback};
use std::io;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Spinner that follows the pipeline stages.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        bar.set_style(style);
        bar.set_prefix("Preparing");
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }

    /// Take the spinner off the terminal after a failed run.
    fn clear(&self) {
        if !self.bar.is_finished() {
            self.bar.finish_and_clear();
        }
    }
}

impl HarvestProgressCallback for CliProgressCallback {
    fn on_download_start(&self, url: &str) {
        self.bar.set_prefix("Downloading");
        self.bar.set_message(url.to_string());
    }

    fn on_download_complete(&self, bytes: u64) {
        self.bar
            .println(format!("  {} Downloaded {}", green("✓"), dim(&format!("{bytes} bytes"))));
    }

    fn on_extraction_start(&self, document: &Path) {
        self.bar.set_prefix("Extracting");
        self.bar.set_message(document.display().to_string());
    }

    fn on_image_saved(&self, index: usize, path: &Path) {
        self.bar.println(format!(
            "  {} Image {}  {}",
            green("✓"),
            index,
            dim(&path.display().to_string())
        ));
    }

    fn on_harvest_complete(&self, images: usize, paragraphs: usize) {
        self.bar.finish_and_clear();
        eprintln!(
            "{} {} images, {} paragraphs",
            green("✔"),
            bold(&images.to_string()),
            bold(&paragraphs.to_string())
        );
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Download and extract into ./output
  pdfharvest extract --url https://example.com/report.pdf

  # Custom directory, machine-readable result
  pdfharvest extract --url https://example.com/report.pdf -o artifacts --json

  # Browse the result at http://127.0.0.1:5000/
  pdfharvest serve -o artifacts

ENVIRONMENT VARIABLES:
  PDFIUM_LIB_PATH         Path to an existing libpdfium
  RUST_LOG                Overrides the log filter
"#;

/// Extract the leading images and paragraphs of a remote PDF.
#[derive(Parser, Debug)]
#[command(
    name = "pdfharvest",
    version,
    about = "Extract the first images and paragraphs of a remote PDF and browse them",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Download a PDF and write image1.png, image2.png and paragraphs.json.
    Extract(ExtractArgs),
    /// Serve the contents of an output directory over HTTP.
    Serve(ServeArgs),
}

#[derive(Args, Debug)]
struct ExtractArgs {
    /// HTTP/HTTPS URL of the PDF.
    #[arg(long, env = "PDFHARVEST_URL")]
    url: String,

    /// Directory for source.pdf and the extracted artifacts.
    #[arg(short, long, env = "PDFHARVEST_OUTPUT_DIR", default_value = "output")]
    output_dir: PathBuf,

    /// HTTP download timeout in seconds.
    #[arg(long, env = "PDFHARVEST_DOWNLOAD_TIMEOUT", default_value_t = 30)]
    download_timeout: u64,

    /// PDF user password for encrypted documents.
    #[arg(long, env = "PDFHARVEST_PASSWORD")]
    password: Option<String>,

    /// Path to the pdfium shared library.
    #[arg(long, env = "PDFHARVEST_PDFIUM_LIB")]
    pdfium_lib: Option<String>,

    /// Output structured JSON (HarvestOutput) instead of a summary.
    #[arg(long, env = "PDFHARVEST_JSON")]
    json: bool,

    /// Disable the progress spinner.
    #[arg(long, env = "PDFHARVEST_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PDFHARVEST_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "PDFHARVEST_QUIET")]
    quiet: bool,
}

#[derive(Args, Debug)]
struct ServeArgs {
    /// Directory to read artifacts from.
    #[arg(short, long, env = "PDFHARVEST_OUTPUT_DIR", default_value = "output")]
    output_dir: PathBuf,

    /// Address to listen on.
    #[arg(long, env = "PDFHARVEST_BIND", default_value = "127.0.0.1:5000")]
    bind: SocketAddr,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PDFHARVEST_VERBOSE")]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Extract(args) => run_extract(args).await,
        Command::Serve(args) => run_serve(args).await,
    }
}

fn init_logging(filter: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();
}

async fn run_extract(args: ExtractArgs) -> Result<()> {
    // ── Logging setup ────────────────────────────────────────────────────
    // The spinner replaces INFO logs while it is on screen.
    let show_progress = !args.quiet && !args.no_progress && !args.json;
    let filter = if args.verbose {
        "debug"
    } else if args.quiet || show_progress {
        "error"
    } else {
        "info"
    };
    init_logging(filter);

    // ── Build config ─────────────────────────────────────────────────────
    let spinner = show_progress.then(CliProgressCallback::new);
    let progress_cb = spinner
        .clone()
        .map(|cb| cb as Arc<dyn HarvestProgressCallback>);
    let config = build_config(&args, progress_cb)?;

    // ── Run ──────────────────────────────────────────────────────────────
    let output = harvest(&args.url, &config)
        .await
        .inspect_err(|_| {
            if let Some(cb) = &spinner {
                cb.clear();
            }
        })
        .with_context(|| format!("Failed to harvest {}", args.url))?;

    if args.json {
        let json = serde_json::to_string_pretty(&output).context("Failed to serialise output")?;
        println!("{json}");
        return Ok(());
    }

    if !args.quiet {
        for image in &output.result.images {
            println!("{}", image.display());
        }
        println!("{}", output.paragraphs_path.display());
        eprintln!(
            "{}  {}ms total  {}",
            dim(&format!("{} bytes downloaded", output.stats.downloaded_bytes)),
            output.stats.total_duration_ms,
            bold(&config.output_dir.display().to_string()),
        );
    }
    Ok(())
}

/// Map CLI args to `HarvestConfig`.
fn build_config(args: &ExtractArgs, progress: Option<ProgressCallback>) -> Result<HarvestConfig> {
    let mut builder = HarvestConfig::builder()
        .output_dir(&args.output_dir)
        .download_timeout_secs(args.download_timeout);

    if let Some(ref pwd) = args.password {
        builder = builder.password(pwd);
    }
    if let Some(ref lib) = args.pdfium_lib {
        builder = builder.pdfium_library(lib);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

async fn run_serve(args: ServeArgs) -> Result<()> {
    init_logging(if args.verbose { "debug" } else { "info" });

    let app = view::router(ViewConfig::new(&args.output_dir));
    let listener = tokio::net::TcpListener::bind(args.bind)
        .await
        .with_context(|| format!("Failed to bind {}", args.bind))?;

    tracing::info!(
        "Serving {} on http://{}",
        args.output_dir.display(),
        args.bind
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        tracing::info!("Shutting down");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clear_finishes_spinner() {
        let cb = CliProgressCallback { bar: ProgressBar::hidden() };
        cb.on_download_start("https://example.com/a.pdf");
        assert!(!cb.bar.is_finished());

        cb.clear();
        assert!(cb.bar.is_finished());
        // a second clear is harmless
        cb.clear();
    }
}
