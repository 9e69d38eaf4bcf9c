//! Read-only web view over an output directory.
//!
//! | Route                    | Serves                                        |
//! |--------------------------|-----------------------------------------------|
//! | `GET /`                  | HTML page: every image plus the paragraphs    |
//! | `GET /images/{filename}` | raw files from the output directory           |
//!
//! The view only reads what the pipeline left on disk. A missing
//! `paragraphs.json` renders placeholders; a corrupt one is a server error.

use crate::artifacts;
use crate::error::HarvestError;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use std::fmt::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::error;

/// Text shown in place of each paragraph when none were extracted.
pub const PLACEHOLDER_PARAGRAPH: &str = "No paragraphs found";

/// Where the view reads its artifacts from.
#[derive(Debug, Clone)]
pub struct ViewConfig {
    pub output_dir: PathBuf,
}

impl ViewConfig {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }
}

/// Four copies of [`PLACEHOLDER_PARAGRAPH`].
pub fn placeholder_paragraphs() -> Vec<String> {
    vec![PLACEHOLDER_PARAGRAPH.to_string(); crate::pipeline::extract::MAX_PARAGRAPHS]
}

/// Build the view's router.
///
/// `/images` is backed by `ServeDir`, which refuses any path with a `..`
/// component, so nothing outside `output_dir` is reachable.
pub fn router(config: ViewConfig) -> Router {
    let images = ServeDir::new(&config.output_dir);
    Router::new()
        .route("/", get(index))
        .nest_service("/images", images)
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(config))
}

struct ViewError(HarvestError);

impl IntoResponse for ViewError {
    fn into_response(self) -> Response {
        error!("View error: {}", self.0);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Failed to load artifacts: {}", self.0),
        )
            .into_response()
    }
}

impl From<HarvestError> for ViewError {
    fn from(e: HarvestError) -> Self {
        Self(e)
    }
}

async fn index(State(config): State<Arc<ViewConfig>>) -> Result<Html<String>, ViewError> {
    let paragraphs = artifacts::load_paragraphs(&config.output_dir)
        .await?
        .unwrap_or_else(placeholder_paragraphs);
    let images = artifacts::list_images(&config.output_dir).await?;
    Ok(Html(render_index(&images, &paragraphs)))
}

fn render_index(images: &[String], paragraphs: &[String]) -> String {
    let mut html = String::from(
        "<!doctype html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>Extracted content</title>\n</head>\n<body>\n<main>\n",
    );

    html.push_str("<section class=\"images\">\n");
    for name in images {
        let src = html_escape::encode_double_quoted_attribute(name);
        let _ = writeln!(html, "<img src=\"/images/{src}\" alt=\"{src}\">");
    }
    html.push_str("</section>\n<section class=\"paragraphs\">\n");
    for (i, paragraph) in paragraphs.iter().enumerate() {
        let _ = writeln!(
            html,
            "<p id=\"paragraph-{}\">{}</p>",
            i + 1,
            html_escape::encode_text(paragraph)
        );
    }
    html.push_str("</section>\n</main>\n</body>\n</html>\n");
    html
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholders_fill_every_slot() {
        let p = placeholder_paragraphs();
        assert_eq!(p.len(), 4);
        assert!(p.iter().all(|s| s == PLACEHOLDER_PARAGRAPH));
    }

    #[test]
    fn render_escapes_text() {
        let html = render_index(
            &["image1.png".to_string()],
            &["<b>bold</b> & co".to_string()],
        );
        assert!(html.contains("<img src=\"/images/image1.png\""));
        assert!(html.contains("&lt;b&gt;bold&lt;/b&gt; &amp; co"));
        assert!(!html.contains("<b>bold</b>"));
    }

    #[test]
    fn render_without_images() {
        let html = render_index(&[], &["only text".to_string()]);
        assert!(!html.contains("<img"));
        assert!(html.contains("<p id=\"paragraph-1\">only text</p>"));
    }
}
