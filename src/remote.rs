//! Cloud parsing client: upload bytes, poll the job, fetch Markdown.
//!
//! The cloud service runs its own parsing pipeline behind a three-step
//! REST flow: a multipart upload that returns a job id, a status
//! endpoint to poll, and a result endpoint that serves the extracted
//! Markdown once the job reports success.
//!
//! ## Retry Strategy
//!
//! HTTP 5xx and transport errors on the upload are transient and
//! frequent under load. Exponential backoff (`retry_backoff_ms *
//! 2^attempt`) avoids thundering-herd: with 500 ms base and 3 retries
//! the wait sequence is 500 ms → 1 s → 2 s. 4xx responses are permanent
//! (bad key, bad payload) and surface immediately.

use crate::config::CloudConfig;
use crate::error::DocmillError;
use serde::Deserialize;
use tokio::time::{sleep, Duration};
use tracing::{debug, info, warn};

/// Client for the hosted document-parsing API.
pub struct CloudParser {
    client: reqwest::Client,
    config: CloudConfig,
}

#[derive(Debug, Deserialize)]
struct ParseJob {
    id: String,
}

#[derive(Debug, Deserialize)]
struct JobStatus {
    status: String,
}

#[derive(Debug, Deserialize)]
struct MarkdownResult {
    markdown: String,
}

impl CloudParser {
    /// Build the client from configuration.
    pub fn new(config: CloudConfig) -> Result<Self, DocmillError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| DocmillError::Internal(format!("http client: {}", e)))?;

        Ok(Self { client, config })
    }

    /// Whether an API key is present.
    pub fn is_configured(&self) -> bool {
        self.config.api_key.is_some()
    }

    /// Parse `bytes` through the cloud service and return Markdown.
    ///
    /// `filename` is forwarded as upload metadata so the service can
    /// pick its own parser by extension.
    pub async fn parse(&self, filename: &str, bytes: Vec<u8>) -> Result<String, DocmillError> {
        let api_key = self.config.api_key.as_deref().ok_or_else(|| {
            DocmillError::NotConfigured {
                service: "Cloud parser".to_string(),
                hint: "Set LLAMA_CLOUD_API_KEY in the environment.".to_string(),
            }
        })?;

        let job_id = self.upload(filename, bytes, api_key).await?;
        debug!("Cloud parse job {} started for '{}'", job_id, filename);

        self.wait_for_job(filename, &job_id, api_key).await?;
        let markdown = self.fetch_markdown(filename, &job_id, api_key).await?;

        info!(
            "Cloud parse complete for '{}' ({} bytes of Markdown)",
            filename,
            markdown.len()
        );
        Ok(markdown)
    }

    /// Upload the file, retrying transient failures with backoff.
    async fn upload(
        &self,
        filename: &str,
        bytes: Vec<u8>,
        api_key: &str,
    ) -> Result<String, DocmillError> {
        let url = format!("{}/api/parsing/upload", self.config.base_url);
        let mut last_err: Option<String> = None;

        for attempt in 0..=self.config.max_retries {
            if attempt > 0 {
                let backoff = self.config.retry_backoff_ms * 2u64.pow(attempt - 1);
                warn!(
                    "'{}': upload retry {}/{} after {}ms",
                    filename, attempt, self.config.max_retries, backoff
                );
                sleep(Duration::from_millis(backoff)).await;
            }

            let form = reqwest::multipart::Form::new().part(
                "file",
                reqwest::multipart::Part::bytes(bytes.clone()).file_name(filename.to_string()),
            );

            let response = self
                .client
                .post(&url)
                .bearer_auth(api_key)
                .multipart(form)
                .send()
                .await;

            match response {
                Ok(resp) if resp.status().is_success() => {
                    let job: ParseJob =
                        resp.json().await.map_err(|e| DocmillError::CloudParse {
                            filename: filename.to_string(),
                            detail: format!("malformed upload response: {}", e),
                        })?;
                    return Ok(job.id);
                }
                Ok(resp) if resp.status().is_client_error() => {
                    // Permanent: retrying a 4xx will not help.
                    let status = resp.status();
                    let body = resp.text().await.unwrap_or_default();
                    return Err(DocmillError::CloudParse {
                        filename: filename.to_string(),
                        detail: format!("HTTP {}: {}", status, body),
                    });
                }
                Ok(resp) => {
                    last_err = Some(format!("HTTP {}", resp.status()));
                }
                Err(e) => {
                    last_err = Some(e.to_string());
                }
            }
        }

        Err(DocmillError::CloudParse {
            filename: filename.to_string(),
            detail: last_err.unwrap_or_else(|| "unknown upload error".to_string()),
        })
    }

    /// Poll the job until it reports success, failure, or the polling
    /// budget runs out.
    async fn wait_for_job(
        &self,
        filename: &str,
        job_id: &str,
        api_key: &str,
    ) -> Result<(), DocmillError> {
        let url = format!("{}/api/parsing/job/{}", self.config.base_url, job_id);

        for attempt in 0..self.config.max_poll_attempts {
            if attempt > 0 {
                sleep(Duration::from_millis(self.config.poll_interval_ms)).await;
            }

            let status: JobStatus = self
                .client
                .get(&url)
                .bearer_auth(api_key)
                .send()
                .await
                .map_err(|e| DocmillError::CloudParse {
                    filename: filename.to_string(),
                    detail: format!("status poll: {}", e),
                })?
                .json()
                .await
                .map_err(|e| DocmillError::CloudParse {
                    filename: filename.to_string(),
                    detail: format!("malformed status response: {}", e),
                })?;

            match status.status.to_uppercase().as_str() {
                "SUCCESS" | "COMPLETED" => return Ok(()),
                "ERROR" | "FAILED" | "CANCELLED" => {
                    return Err(DocmillError::CloudParse {
                        filename: filename.to_string(),
                        detail: format!("job {} finished with status {}", job_id, status.status),
                    })
                }
                other => debug!("job {} status: {}", job_id, other),
            }
        }

        Err(DocmillError::CloudParseTimeout {
            filename: filename.to_string(),
            attempts: self.config.max_poll_attempts,
        })
    }

    /// Fetch the Markdown result of a finished job.
    async fn fetch_markdown(
        &self,
        filename: &str,
        job_id: &str,
        api_key: &str,
    ) -> Result<String, DocmillError> {
        let url = format!(
            "{}/api/parsing/job/{}/result/markdown",
            self.config.base_url, job_id
        );

        let result: MarkdownResult = self
            .client
            .get(&url)
            .bearer_auth(api_key)
            .send()
            .await
            .map_err(|e| DocmillError::CloudParse {
                filename: filename.to_string(),
                detail: format!("result fetch: {}", e),
            })?
            .error_for_status()
            .map_err(|e| DocmillError::CloudParse {
                filename: filename.to_string(),
                detail: e.to_string(),
            })?
            .json()
            .await
            .map_err(|e| DocmillError::CloudParse {
                filename: filename.to_string(),
                detail: format!("malformed result response: {}", e),
            })?;

        Ok(result.markdown)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unconfigured_parser() -> CloudParser {
        CloudParser::new(CloudConfig::default()).unwrap()
    }

    #[test]
    fn missing_api_key_reports_unconfigured() {
        assert!(!unconfigured_parser().is_configured());
    }

    #[tokio::test]
    async fn parse_without_key_fails_before_any_network_io() {
        let err = unconfigured_parser()
            .parse("doc.pdf", b"%PDF-1.4".to_vec())
            .await
            .unwrap_err();
        assert!(matches!(err, DocmillError::NotConfigured { .. }));
    }
}
