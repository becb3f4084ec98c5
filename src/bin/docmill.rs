//! CLI binary for docmill.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `ServiceConfig` and starts the server.

use anyhow::{Context, Result};
use clap::Parser;
use docmill::{ChatConfig, CloudConfig, OcrOptions, Server, ServiceConfig};
use std::io;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

const AFTER_HELP: &str = r#"EXAMPLES:
  # Serve on the default port
  docmill

  # Custom port and scratch directory
  docmill --port 3000 --scratch-dir /var/tmp/docmill

  # Disable OCR for image uploads
  docmill --no-ocr

  # Point the cloud endpoint at a self-hosted parser
  docmill --cloud-base-url http://localhost:9000

ENDPOINTS:
  GET  /hi              Liveness probe
  POST /upload/         Convert a multipart batch locally
  POST /upload/llama    Parse a multipart batch via the cloud service
  POST /upload/analyze  Convert locally, then summarise via the chat model

ENVIRONMENT VARIABLES:
  LLAMA_CLOUD_API_KEY   API key for the cloud parsing service
  OPENAI_API_KEY        API key for the chat model (enables /upload/analyze)
  RUST_LOG              Tracing filter override (e.g. docmill=debug)

  A .env file in the working directory is loaded at startup.

SETUP:
  1. Set keys:   export LLAMA_CLOUD_API_KEY=llx-... OPENAI_API_KEY=sk-...
  2. Serve:      docmill --port 8000
  3. Convert:    curl -F files=@document.pdf http://localhost:8000/upload/
"#;

/// Serve document-to-Markdown conversion over HTTP.
#[derive(Parser, Debug)]
#[command(
    name = "docmill",
    version,
    about = "HTTP service that converts uploaded documents to Markdown",
    long_about = "Serve document-to-Markdown conversion over HTTP: a local extraction \
pipeline with optional OCR, a cloud parsing passthrough, and chat-model analysis of \
converted documents.",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Listen host.
    #[arg(long, env = "DOCMILL_HOST", default_value = "0.0.0.0")]
    host: String,

    /// Listen port.
    #[arg(short, long, env = "DOCMILL_PORT", default_value_t = 8000)]
    port: u16,

    /// Root directory for scratch artifacts (default: system temp dir).
    #[arg(long, env = "DOCMILL_SCRATCH_DIR")]
    scratch_dir: Option<PathBuf>,

    /// Maximum multipart body size in bytes.
    #[arg(long, env = "DOCMILL_MAX_UPLOAD_BYTES", default_value_t = 50 * 1024 * 1024)]
    max_upload_bytes: usize,

    /// Blocking-extraction timeout in seconds.
    #[arg(long, env = "DOCMILL_EXTRACT_TIMEOUT", default_value_t = 60)]
    extract_timeout: u64,

    /// Disable OCR for image uploads.
    #[arg(long, env = "DOCMILL_NO_OCR")]
    no_ocr: bool,

    /// OCR only pages without a text layer instead of every page.
    #[arg(long, env = "DOCMILL_NO_FULL_PAGE_OCR")]
    no_full_page_ocr: bool,

    /// Tesseract language code.
    #[arg(long, env = "DOCMILL_OCR_LANGUAGE", default_value = "eng")]
    ocr_language: String,

    /// Base URL of the cloud parsing API.
    #[arg(
        long,
        env = "DOCMILL_CLOUD_BASE_URL",
        default_value = "https://api.cloud.llamaindex.ai"
    )]
    cloud_base_url: String,

    /// Chat model used by /upload/analyze.
    #[arg(long, env = "DOCMILL_CHAT_MODEL", default_value = "gpt-4o")]
    chat_model: String,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "DOCMILL_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "DOCMILL_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Environment first: flags with env fallbacks read it during parse.
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let filter = if cli.quiet {
        "error"
    } else if cli.verbose {
        "debug"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Build config ─────────────────────────────────────────────────────
    let ocr = OcrOptions {
        enabled: !cli.no_ocr,
        force_full_page: !cli.no_full_page_ocr,
        language: cli.ocr_language.clone(),
    };
    let cloud = CloudConfig {
        base_url: cli.cloud_base_url.trim_end_matches('/').to_string(),
        ..CloudConfig::default()
    };
    let chat = ChatConfig {
        model: cli.chat_model.clone(),
        ..ChatConfig::default()
    };

    let mut builder = ServiceConfig::builder()
        .host(cli.host)
        .port(cli.port)
        .max_upload_bytes(cli.max_upload_bytes)
        .extract_timeout_secs(cli.extract_timeout)
        .ocr(ocr)
        .cloud(cloud)
        .chat(chat);

    if let Some(dir) = cli.scratch_dir {
        builder = builder.scratch_dir(dir);
    }

    let config = builder.build().context("Invalid configuration")?;

    tracing::info!("Configuration loaded");
    tracing::info!("  - Listen address: {}", config.listen_addr());
    tracing::info!("  - OCR enabled: {}", config.ocr.enabled);
    tracing::info!(
        "  - Cloud parser: {}",
        if config.cloud.api_key.is_some() || std::env::var("LLAMA_CLOUD_API_KEY").is_ok() {
            "configured"
        } else {
            "not configured (POST /upload/llama will return 503)"
        }
    );
    tracing::info!(
        "  - Chat model: {}",
        if std::env::var("OPENAI_API_KEY").is_ok() {
            config.chat.model.as_str()
        } else {
            "not configured (POST /upload/analyze will return 503)"
        }
    );

    // ── Serve ────────────────────────────────────────────────────────────
    let server = Server::new(config).context("Failed to initialise server")?;
    server.start().await.context("Server failed")?;

    Ok(())
}
