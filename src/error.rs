//! Error types for the docmill service.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`DocmillError`] — **Fatal**: the request cannot proceed at all
//!   (malformed multipart body, cloud parser unreachable, chat model not
//!   configured). Returned as `Err(DocmillError)` from handlers and mapped
//!   to an HTTP status via `IntoResponse`.
//!
//! * [`ConvertError`] — **Non-fatal**: a single file failed (unsupported
//!   format, extraction glitch, OCR unavailable) but the rest of the batch
//!   is fine. Stringified into that file's result record so callers can
//!   inspect partial success rather than losing the whole batch to one bad
//!   upload.
//!
//! The separation lets each endpoint decide its own tolerance: the local
//! conversion endpoints log and continue, the cloud endpoint aborts on the
//! first upstream failure.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the docmill service.
///
/// Per-file failures use [`ConvertError`] and are embedded in result
/// records rather than propagated here.
#[derive(Debug, Error)]
pub enum DocmillError {
    // ── Request errors ────────────────────────────────────────────────────
    /// The multipart body could not be parsed.
    #[error("Malformed multipart body: {message}")]
    Multipart { message: String },

    // ── Cloud parsing errors ──────────────────────────────────────────────
    /// An external service is not configured (missing API key etc.).
    #[error("{service} is not configured.\n{hint}")]
    NotConfigured { service: String, hint: String },

    /// The cloud parsing service rejected or failed a job.
    #[error("Cloud parse failed for '{filename}': {detail}")]
    CloudParse { filename: String, detail: String },

    /// The cloud parsing job did not finish within the polling budget.
    #[error("Cloud parse timed out for '{filename}' after {attempts} polls")]
    CloudParseTimeout { filename: String, attempts: u32 },

    // ── Chat errors ───────────────────────────────────────────────────────
    /// The chat completion API returned an error.
    #[error("Chat completion failed: {detail}")]
    Chat { detail: String },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Server lifecycle errors ───────────────────────────────────────────
    /// Could not bind the listen address.
    #[error("Failed to bind {addr}: {source}")]
    BindFailed {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for DocmillError {
    fn into_response(self) -> Response {
        let (status, error_type) = match &self {
            DocmillError::Multipart { .. } => (StatusCode::BAD_REQUEST, "bad_request"),
            DocmillError::NotConfigured { .. } => {
                (StatusCode::SERVICE_UNAVAILABLE, "not_configured")
            }
            DocmillError::CloudParse { .. } => (StatusCode::BAD_GATEWAY, "cloud_parse_error"),
            DocmillError::CloudParseTimeout { .. } => {
                (StatusCode::GATEWAY_TIMEOUT, "cloud_parse_timeout")
            }
            DocmillError::Chat { .. } => (StatusCode::BAD_GATEWAY, "chat_error"),
            DocmillError::InvalidConfig(_)
            | DocmillError::BindFailed { .. }
            | DocmillError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        };

        let body = Json(json!({
            "error": {
                "type": error_type,
                "message": self.to_string(),
            }
        }));

        (status, body).into_response()
    }
}

/// A non-fatal error for a single uploaded file.
///
/// Stored as the `error` field of a result record when a file fails.
/// The batch continues unless the request itself is malformed.
#[derive(Debug, Error)]
pub enum ConvertError {
    /// The filename extension maps to no known extractor.
    #[error("Unsupported file type: '{extension}'")]
    UnsupportedFormat { extension: String },

    /// The extraction library reported a failure.
    #[error("Extraction failed: {detail}")]
    Extraction { detail: String },

    /// Extraction did not finish within the blocking timeout.
    #[error("Extraction timed out after {secs}s")]
    Timeout { secs: u64 },

    /// OCR was requested but the configured backend cannot run.
    #[error("OCR unavailable: {hint}")]
    OcrUnavailable { hint: String },

    /// OCR is disabled in the pipeline options but the format requires it.
    #[error("File requires OCR but OCR is disabled")]
    OcrDisabled,

    /// Could not read or write the scratch artifact.
    #[error("Scratch I/O failed for '{path}': {source}")]
    ScratchIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_configured_display() {
        let e = DocmillError::NotConfigured {
            service: "Cloud parser".into(),
            hint: "Set LLAMA_CLOUD_API_KEY.".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("Cloud parser"), "got: {msg}");
        assert!(msg.contains("LLAMA_CLOUD_API_KEY"));
    }

    #[test]
    fn cloud_parse_maps_to_bad_gateway() {
        let e = DocmillError::CloudParse {
            filename: "report.pdf".into(),
            detail: "HTTP 500".into(),
        };
        let resp = e.into_response();
        assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn multipart_maps_to_bad_request() {
        let e = DocmillError::Multipart {
            message: "missing boundary".into(),
        };
        let resp = e.into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn unsupported_format_display() {
        let e = ConvertError::UnsupportedFormat {
            extension: "xyz".into(),
        };
        assert!(e.to_string().contains("xyz"));
    }

    #[test]
    fn timeout_display() {
        let e = ConvertError::Timeout { secs: 60 };
        assert!(e.to_string().contains("60s"));
    }
}
