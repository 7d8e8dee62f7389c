//! Request orchestration: parse the query, fetch the source, hand the job to the worker pool.

use bytes::Bytes;
use imgflux_core::{params, AppResult};
use imgflux_infra::SourceFetcher;
use imgflux_worker::{TransformExecutor, TransformJob};
use std::sync::Arc;

/// Encoded image ready to be written to the client
#[derive(Debug, Clone, PartialEq)]
pub struct TransformResponse {
    pub bytes: Bytes,
    pub content_type: String,
}

#[derive(Clone)]
pub struct TransformService {
    fetcher: SourceFetcher,
    executor: Arc<dyn TransformExecutor>,
}

impl TransformService {
    pub fn new(fetcher: SourceFetcher, executor: Arc<dyn TransformExecutor>) -> Self {
        Self { fetcher, executor }
    }

    /// Run one transform request described by the raw query string.
    ///
    /// Parameters are validated before anything is fetched. Without a `format` the origin's
    /// content type is passed through unchanged.
    pub async fn handle(&self, raw_query: &str) -> AppResult<TransformResponse> {
        let request = params::parse(raw_query)?;

        tracing::debug!(
            url = %request.source_url,
            operations = ?request.operations,
            "Transform request parsed"
        );

        let fetched = self.fetcher.fetch(&request.source_url).await?;
        let source_len = fetched.bytes.len();

        let output = self
            .executor
            .execute(TransformJob::new(fetched.bytes, request.operations))
            .await?;

        tracing::info!(
            url = %request.source_url,
            source_bytes = source_len,
            output_bytes = output.bytes.len(),
            "Transform completed"
        );

        Ok(TransformResponse {
            bytes: output.bytes,
            content_type: output.content_type.unwrap_or(fetched.content_type),
        })
    }
}
