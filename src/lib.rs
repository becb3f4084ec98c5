//! # docmill
//!
//! An HTTP service that converts uploaded documents to Markdown.
//!
//! ## Why this crate?
//!
//! Teams that need "give me this file as Markdown" behind one POST
//! endpoint usually end up gluing a parser library, a scratch
//! directory, and an HTTP framework together by hand — and the glue is
//! where uploads leak temp files and one bad document kills a whole
//! batch. This crate is that glue done once: per-file isolation, scoped
//! scratch artifacts that cannot outlive a request, and a uniform
//! result-record contract whether parsing happens locally or in a
//! hosted service.
//!
//! ## Pipeline Overview
//!
//! ```text
//! multipart batch
//!  │
//!  ├─ 1. Drain    read each field into memory, keep input order
//!  ├─ 2. Scratch  write bytes under a per-upload temp dir (auto-removed)
//!  ├─ 3. Extract  per-format extraction (pdf-extract / docx-rs / csv / tesseract)
//!  ├─ 4. Markdown assembly + deterministic cleanup rules
//!  └─ 5. Shape    one {filename, content|error} record per file
//! ```
//!
//! The `/upload/llama` endpoint skips steps 2–4 and sends the bytes to
//! a hosted parsing API instead; `/upload/analyze` appends a chat-model
//! summary after step 4.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use docmill::{Server, ServiceConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ServiceConfig::builder().port(8000).build()?;
//!     Server::new(config)?.start().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Endpoints
//!
//! | Route | Method | Behaviour |
//! |-------|--------|-----------|
//! | `/hi` | GET | liveness probe, `{"results": "hi"}` |
//! | `/upload/` | POST | local conversion, per-file success or error |
//! | `/upload/llama` | POST | cloud parsing, fails fast on upstream errors |
//! | `/upload/analyze` | POST | local conversion + chat-model summary |
//!
//! Batch semantics on `/upload/` and `/upload/analyze`: files are
//! processed sequentially in input order, a failure on one file never
//! aborts the rest, and the response is HTTP 200 even when every file
//! failed — failures live in the body, one record per file.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod llm;
pub mod pipeline;
pub mod remote;
pub mod response;
pub mod scratch;
pub mod server;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ChatConfig, CloudConfig, OcrOptions, ServiceConfig, ServiceConfigBuilder};
pub use convert::{ConvertedDocument, Converter};
pub use error::{ConvertError, DocmillError};
pub use llm::ChatClient;
pub use remote::CloudParser;
pub use response::{AnalyzeOutcome, ConvertOutcome, OcrStatus, ParsedRecord, ResultsEnvelope};
pub use scratch::ScratchFile;
pub use server::{build_router, AppState, Server};
