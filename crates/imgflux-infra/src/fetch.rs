//! Source image fetching with bounded retry.
//!
//! Every failed attempt (transport error, non-2xx status, oversized body) is retried after
//! a fixed delay until the attempt budget is spent. There is no delay after the last attempt.

use anyhow::{anyhow, bail, Context, Result};
use bytes::{Bytes, BytesMut};
use imgflux_core::{AppError, AppResult, FetchConfig};
use reqwest::header::CONTENT_TYPE;
use url::Url;

pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Body and declared content type of a fetched source image
#[derive(Debug, Clone, PartialEq)]
pub struct FetchResult {
    pub bytes: Bytes,
    /// `Content-Type` header as sent by the origin
    pub content_type: String,
}

#[derive(Clone)]
pub struct SourceFetcher {
    client: reqwest::Client,
    config: FetchConfig,
}

impl SourceFetcher {
    pub fn new(config: FetchConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client, config })
    }

    /// Download `url`, retrying failed attempts.
    pub async fn fetch(&self, url: &Url) -> AppResult<FetchResult> {
        let max_attempts = self.config.max_retries.max(1);
        let mut last_error = String::new();

        for attempt in 1..=max_attempts {
            match self.fetch_once(url).await {
                Ok(result) => {
                    tracing::debug!(
                        url = %url,
                        attempt = attempt,
                        bytes = result.bytes.len(),
                        content_type = %result.content_type,
                        "Fetched source image"
                    );
                    return Ok(result);
                }
                Err(e) => {
                    last_error = format!("{:#}", e);
                    tracing::warn!(
                        url = %url,
                        attempt = attempt,
                        max_attempts = max_attempts,
                        error = %last_error,
                        "Source fetch attempt failed"
                    );
                }
            }

            if attempt < max_attempts {
                tokio::time::sleep(self.config.retry_delay).await;
            }
        }

        Err(AppError::FetchFailed {
            attempts: max_attempts,
            message: last_error,
        })
    }

    async fn fetch_once(&self, url: &Url) -> Result<FetchResult> {
        let mut response = self
            .client
            .get(url.clone())
            .send()
            .await
            .context("request failed")?;

        let status = response.status();
        if !status.is_success() {
            bail!("Failed to download image: {}", status);
        }

        let limit = self.config.max_source_bytes;
        if let Some(length) = response.content_length() {
            if length > limit as u64 {
                bail!("source is {} bytes, limit is {} bytes", length, limit);
            }
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string())
            .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string());

        let mut body = BytesMut::new();
        while let Some(chunk) = response.chunk().await.context("failed to read body")? {
            if body.len() + chunk.len() > limit {
                return Err(anyhow!("source exceeds the {} byte limit", limit));
            }
            body.extend_from_slice(&chunk);
        }

        Ok(FetchResult {
            bytes: body.freeze(),
            content_type,
        })
    }
}
