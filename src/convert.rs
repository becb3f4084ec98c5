//! The local conversion pipeline behind a process-wide facade.
//!
//! A single [`Converter`] is constructed at startup and shared across
//! requests; it carries the OCR options and the extraction timeout so
//! every upload is converted under the same pipeline configuration.
//! The facade keeps handlers thin: they hand over a scratch path and a
//! filename and get back assembled, cleaned Markdown or a per-file
//! [`ConvertError`].

use crate::config::OcrOptions;
use crate::error::ConvertError;
use crate::pipeline::{extract, markdown};
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info};

/// Converts scratch artifacts to Markdown.
///
/// Cheap to share behind an `Arc`; holds no per-request state.
pub struct Converter {
    ocr: OcrOptions,
    extract_timeout_secs: u64,
}

/// Output of one conversion call.
#[derive(Debug, Clone)]
pub struct ConvertedDocument {
    /// Assembled, cleaned Markdown.
    pub markdown: String,
    /// Page count, where the source format knows one.
    pub page_count: Option<usize>,
    /// Wall-clock duration of the conversion.
    pub duration_ms: u64,
}

impl ConvertedDocument {
    /// Whether the output carries an image placeholder — the hint that
    /// one or more pages had no extractable text.
    pub fn has_image_placeholder(&self) -> bool {
        self.markdown.contains(markdown::IMAGE_PLACEHOLDER)
    }
}

impl Converter {
    /// Build a converter with the given pipeline options.
    pub fn new(ocr: OcrOptions, extract_timeout_secs: u64) -> Self {
        debug!(
            "Converter initialised (ocr: {}, force_full_page: {}, timeout: {}s)",
            ocr.enabled, ocr.force_full_page, extract_timeout_secs
        );
        Self {
            ocr,
            extract_timeout_secs,
        }
    }

    /// Convert the artifact at `path` to Markdown.
    ///
    /// `filename` is the original upload name; its extension selects the
    /// extractor. Extraction runs under `spawn_blocking` because the
    /// underlying libraries are synchronous.
    pub async fn convert(
        &self,
        path: &Path,
        filename: &str,
    ) -> Result<ConvertedDocument, ConvertError> {
        let start = Instant::now();
        let path = path.to_path_buf();
        let filename_owned = filename.to_string();
        let ocr = self.ocr.clone();
        let timeout_secs = self.extract_timeout_secs;

        let extracted = tokio::task::spawn_blocking(move || {
            extract::extract(&path, &filename_owned, &ocr, timeout_secs)
        })
        .await
        .map_err(|e| ConvertError::Extraction {
            detail: format!("extraction task panicked: {}", e),
        })??;

        let markdown = markdown::clean_markdown(&markdown::to_markdown(&extracted));
        let page_count = match &extracted {
            extract::Extracted::Prose { page_count, .. } => *page_count,
            _ => None,
        };

        let duration_ms = start.elapsed().as_millis() as u64;
        info!(
            "Converted '{}' to Markdown ({} bytes, {}ms)",
            filename,
            markdown.len(),
            duration_ms
        );

        Ok(ConvertedDocument {
            markdown,
            page_count,
            duration_ms,
        })
    }
}
