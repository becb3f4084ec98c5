//! Configuration types for the docmill service.
//!
//! All service behaviour is controlled through [`ServiceConfig`], built via
//! its [`ServiceConfigBuilder`]. Keeping every knob in one struct makes it
//! trivial to share the config across handlers, serialise it for logging,
//! and diff two deployments to understand why their behaviour differs.
//!
//! # Design choice: builder over constructor
//! A dozen-field constructor is unreadable and breaks on every new field.
//! The builder lets callers set only what they care about and rely on
//! well-documented defaults for the rest.

use crate::error::DocmillError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Configuration for the docmill HTTP service.
///
/// Built via [`ServiceConfig::builder()`] or using
/// [`ServiceConfig::default()`].
///
/// # Example
/// ```rust
/// use docmill::ServiceConfig;
///
/// let config = ServiceConfig::builder()
///     .port(3000)
///     .max_upload_bytes(10 * 1024 * 1024)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct ServiceConfig {
    /// Listen host. Default: "0.0.0.0".
    pub host: String,

    /// Listen port. Default: 8000.
    pub port: u16,

    /// Maximum multipart body size in bytes. Default: 50 MiB.
    ///
    /// Applied per upload route via `DefaultBodyLimit`. Uploads above the
    /// limit are rejected by the framework before the handler runs, so a
    /// runaway client cannot exhaust memory with a single request.
    pub max_upload_bytes: usize,

    /// Root directory for scratch artifacts. Default: the system temp dir.
    ///
    /// Each upload gets its own temporary directory underneath this root,
    /// so two concurrent requests carrying the same filename can never
    /// collide on a scratch path.
    pub scratch_dir: Option<PathBuf>,

    /// Blocking-extraction timeout in seconds. Default: 60.
    ///
    /// Some PDFs with pathological font tables make text extraction hang.
    /// The extraction thread is abandoned after this budget and the file
    /// is reported failed instead of wedging the whole batch.
    pub extract_timeout_secs: u64,

    /// OCR pipeline options.
    pub ocr: OcrOptions,

    /// Cloud parsing client settings.
    pub cloud: CloudConfig,

    /// Chat completion settings.
    pub chat: ChatConfig,
}

/// OCR options for the local conversion pipeline.
///
/// The OCR engine itself is the system `tesseract` binary; these options
/// control whether and how the pipeline reaches for it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcrOptions {
    /// Run OCR for image uploads. Default: true.
    pub enabled: bool,

    /// Force OCR over every page rather than only pages without a text
    /// layer. Default: true, matching the upstream pipeline defaults.
    pub force_full_page: bool,

    /// Tesseract language code. Default: "eng".
    pub language: String,
}

impl Default for OcrOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            force_full_page: true,
            language: "eng".to_string(),
        }
    }
}

/// Settings for the cloud parsing client.
#[derive(Clone)]
pub struct CloudConfig {
    /// Base URL of the parsing API. Default: `https://api.cloud.llamaindex.ai`.
    pub base_url: String,

    /// Bearer token. `None` leaves the cloud endpoint unconfigured; requests
    /// to it fail with a 503 rather than reaching the network.
    pub api_key: Option<String>,

    /// Per-request timeout in seconds. Default: 120.
    pub timeout_secs: u64,

    /// Delay between job-status polls in milliseconds. Default: 1000.
    pub poll_interval_ms: u64,

    /// Maximum number of status polls before giving up. Default: 120.
    pub max_poll_attempts: u32,

    /// Maximum retry attempts on a transient upload failure. Default: 3.
    ///
    /// Most 5xx and timeout errors are transient. Permanent errors (bad
    /// API key, 4xx) are not retried and surface immediately.
    pub max_retries: u32,

    /// Initial retry delay in milliseconds (exponential backoff). Default: 500.
    ///
    /// Doubles after each attempt: 500 ms → 1 s → 2 s, so N concurrent
    /// uploads retrying at once do not hammer a recovering endpoint.
    pub retry_backoff_ms: u64,
}

impl Default for CloudConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.cloud.llamaindex.ai".to_string(),
            api_key: None,
            timeout_secs: 120,
            poll_interval_ms: 1000,
            max_poll_attempts: 120,
            max_retries: 3,
            retry_backoff_ms: 500,
        }
    }
}

/// Settings for the chat completion client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Model identifier. Default: "gpt-4o".
    pub model: String,

    /// Maximum tokens the model may generate per analysis. Default: 1024.
    pub max_tokens: u32,

    /// Sampling temperature. Default: 0.3.
    ///
    /// Low temperature keeps the analysis faithful to the document rather
    /// than creative.
    pub temperature: f32,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4o".to_string(),
            max_tokens: 1024,
            temperature: 0.3,
        }
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            max_upload_bytes: 50 * 1024 * 1024,
            scratch_dir: None,
            extract_timeout_secs: 60,
            ocr: OcrOptions::default(),
            cloud: CloudConfig::default(),
            chat: ChatConfig::default(),
        }
    }
}

impl fmt::Debug for ServiceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("max_upload_bytes", &self.max_upload_bytes)
            .field("scratch_dir", &self.scratch_dir)
            .field("extract_timeout_secs", &self.extract_timeout_secs)
            .field("ocr", &self.ocr)
            .field("cloud_base_url", &self.cloud.base_url)
            .field(
                "cloud_api_key",
                &self.cloud.api_key.as_ref().map(|_| "<redacted>"),
            )
            .field("chat", &self.chat)
            .finish()
    }
}

impl ServiceConfig {
    /// Create a new builder for `ServiceConfig`.
    pub fn builder() -> ServiceConfigBuilder {
        ServiceConfigBuilder {
            config: Self::default(),
        }
    }

    /// The socket address string this service listens on.
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Builder for [`ServiceConfig`].
#[derive(Debug)]
pub struct ServiceConfigBuilder {
    config: ServiceConfig,
}

impl ServiceConfigBuilder {
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.host = host.into();
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    pub fn max_upload_bytes(mut self, bytes: usize) -> Self {
        self.config.max_upload_bytes = bytes;
        self
    }

    pub fn scratch_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.scratch_dir = Some(dir.into());
        self
    }

    pub fn extract_timeout_secs(mut self, secs: u64) -> Self {
        self.config.extract_timeout_secs = secs.max(1);
        self
    }

    pub fn ocr(mut self, ocr: OcrOptions) -> Self {
        self.config.ocr = ocr;
        self
    }

    pub fn cloud(mut self, cloud: CloudConfig) -> Self {
        self.config.cloud = cloud;
        self
    }

    pub fn chat(mut self, chat: ChatConfig) -> Self {
        self.config.chat = chat;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ServiceConfig, DocmillError> {
        let c = &self.config;
        if c.host.is_empty() {
            return Err(DocmillError::InvalidConfig("Host must not be empty".into()));
        }
        if c.max_upload_bytes == 0 {
            return Err(DocmillError::InvalidConfig(
                "Upload size limit must be ≥ 1 byte".into(),
            ));
        }
        if c.cloud.max_poll_attempts == 0 {
            return Err(DocmillError::InvalidConfig(
                "Cloud poll attempts must be ≥ 1".into(),
            ));
        }
        Ok(self.config)
    }
}
