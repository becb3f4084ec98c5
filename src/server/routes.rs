//! Request handlers for the upload endpoints.
//!
//! Each upload handler follows the same shape: drain the multipart
//! batch field by field, process every file independently, and answer
//! 200 with one result record per file in input order. A failure on one
//! file never aborts the rest of the batch — the scratch artifact guard
//! guarantees cleanup on every exit path, success or error.

use crate::error::DocmillError;
use crate::response::{AnalyzeOutcome, ConvertOutcome, ParsedRecord, ResultsEnvelope};
use crate::scratch::ScratchFile;
use crate::server::state::AppState;
use axum::{
    extract::{Multipart, State},
    Json,
};
use serde_json::{json, Value};
use tracing::{error, info, warn};
use uuid::Uuid;

/// `GET /hi` — liveness probe.
pub async fn hi() -> Json<Value> {
    Json(json!({ "results": "hi" }))
}

/// One drained multipart file: original filename plus its bytes.
struct UploadedFile {
    filename: String,
    bytes: Vec<u8>,
}

/// Drain the multipart body into memory, preserving input order.
///
/// Parts without a filename get a generated one so every part still
/// yields a result record. A malformed body is fatal to the request.
async fn drain_multipart(mut multipart: Multipart) -> Result<Vec<UploadedFile>, DocmillError> {
    let mut files = Vec::new();

    while let Some(field) =
        multipart
            .next_field()
            .await
            .map_err(|e| DocmillError::Multipart {
                message: e.to_string(),
            })?
    {
        let filename = field
            .file_name()
            .map(str::to_string)
            .unwrap_or_else(|| format!("upload_{}.bin", Uuid::new_v4()));

        let bytes = field
            .bytes()
            .await
            .map_err(|e| DocmillError::Multipart {
                message: format!("failed to read '{}': {}", filename, e),
            })?
            .to_vec();

        files.push(UploadedFile { filename, bytes });
    }

    Ok(files)
}

/// `POST /upload/` — convert each file through the local pipeline.
pub async fn upload(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<ResultsEnvelope<ConvertOutcome>>, DocmillError> {
    info!("Received file upload request.");
    let files = drain_multipart(multipart).await?;
    let mut results = Vec::with_capacity(files.len());

    for file in files {
        info!("Processing file: {}", file.filename);
        results.push(convert_one(&state, &file).await);
    }

    info!("File upload request processing complete.");
    Ok(Json(ResultsEnvelope::new(results)))
}

/// Convert a single file; all failures collapse into a `Failed` record.
async fn convert_one(state: &AppState, file: &UploadedFile) -> ConvertOutcome {
    let scratch = match ScratchFile::write(
        state.config.scratch_dir.as_deref(),
        &file.filename,
        &file.bytes,
    )
    .await
    {
        Ok(scratch) => scratch,
        Err(e) => {
            error!("Error processing file {}: {}", file.filename, e);
            return ConvertOutcome::failed(&file.filename, e);
        }
    };

    match state.converter.convert(scratch.path(), &file.filename).await {
        Ok(doc) => {
            if doc.has_image_placeholder() {
                warn!(
                    "Image placeholder found in output for '{}' - OCR might have failed",
                    file.filename
                );
            }
            ConvertOutcome::converted(&file.filename, doc.markdown)
        }
        Err(e) => {
            error!("Error processing file {}: {}", file.filename, e);
            ConvertOutcome::failed(&file.filename, e)
        }
    }
    // `scratch` drops here: the artifact is removed whether conversion
    // succeeded, failed, or panicked.
}

/// `POST /upload/llama` — parse each file through the cloud service.
///
/// No scratch artifact: bytes go straight to the upstream API. Upstream
/// failures abort the request.
pub async fn upload_llama(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<ResultsEnvelope<ParsedRecord>>, DocmillError> {
    let files = drain_multipart(multipart).await?;
    let mut results = Vec::with_capacity(files.len());

    for file in files {
        info!("Parsing file via cloud service: {}", file.filename);
        let parsed_content = state.cloud.parse(&file.filename, file.bytes).await?;
        results.push(ParsedRecord {
            filename: file.filename,
            parsed_content,
        });
    }

    Ok(Json(ResultsEnvelope::new(results)))
}

/// `POST /upload/analyze` — convert each file locally, then ask the
/// chat model for an analysis of the Markdown.
pub async fn upload_analyze(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<ResultsEnvelope<AnalyzeOutcome>>, DocmillError> {
    let chat = state
        .chat
        .clone()
        .ok_or_else(|| DocmillError::NotConfigured {
            service: "Chat model".to_string(),
            hint: "Set OPENAI_API_KEY in the environment.".to_string(),
        })?;

    let files = drain_multipart(multipart).await?;
    let mut results = Vec::with_capacity(files.len());

    for file in files {
        info!("Analyzing file: {}", file.filename);
        let outcome = match convert_one(&state, &file).await {
            ConvertOutcome::Converted { content, .. } => match chat.analyze(&content).await {
                Ok(analysis) => AnalyzeOutcome::Analyzed {
                    filename: file.filename,
                    analysis,
                },
                Err(e) => {
                    error!("Error analyzing file {}: {}", file.filename, e);
                    AnalyzeOutcome::failed(&file.filename, e)
                }
            },
            ConvertOutcome::Failed { filename, error } => {
                AnalyzeOutcome::Failed { filename, error }
            }
        };
        results.push(outcome);
    }

    Ok(Json(ResultsEnvelope::new(results)))
}
