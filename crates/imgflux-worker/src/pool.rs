//! Transform worker pool.
//!
//! Jobs run on tokio's blocking thread pool, never on the async workers that accept
//! requests. A semaphore caps how many run at once. Each job gets a one-shot reply
//! channel; a worker that dies before replying is detected through its join handle.

use std::any::Any;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use imgflux_core::{AppError, AppResult, WorkerConfig};
use imgflux_processing::{TransformEngine, TransformOutput};
use tokio::sync::{oneshot, Semaphore};

use crate::job::{TransformJob, WorkerReply};

/// Function a worker runs for each job
pub type JobHandler = Arc<dyn Fn(TransformJob) -> anyhow::Result<TransformOutput> + Send + Sync>;

/// Runs a transform job somewhere other than the calling task
#[async_trait]
pub trait TransformExecutor: Send + Sync {
    async fn execute(&self, job: TransformJob) -> AppResult<TransformOutput>;
}

#[derive(Clone, Debug)]
pub struct TransformPoolConfig {
    pub max_workers: usize,
    /// Round-trip limit per job; `None` waits indefinitely
    pub timeout: Option<Duration>,
}

impl Default for TransformPoolConfig {
    fn default() -> Self {
        let worker = WorkerConfig::default();
        Self {
            max_workers: worker.max_workers,
            timeout: worker.timeout,
        }
    }
}

impl From<&WorkerConfig> for TransformPoolConfig {
    fn from(config: &WorkerConfig) -> Self {
        Self {
            max_workers: config.max_workers.max(1),
            timeout: config.timeout,
        }
    }
}

pub struct TransformPool {
    permits: Arc<Semaphore>,
    config: TransformPoolConfig,
    handler: JobHandler,
}

impl TransformPool {
    /// Pool that runs the image transformation engine
    pub fn new(config: TransformPoolConfig) -> Self {
        Self::with_handler(
            config,
            Arc::new(|job: TransformJob| TransformEngine::apply(&job.bytes, &job.operations)),
        )
    }

    pub fn with_handler(config: TransformPoolConfig, handler: JobHandler) -> Self {
        let max_workers = config.max_workers.max(1);
        tracing::info!(
            max_workers = max_workers,
            timeout_ms = ?config.timeout.map(|t| t.as_millis()),
            "Transform worker pool ready"
        );

        Self {
            permits: Arc::new(Semaphore::new(max_workers)),
            config,
            handler,
        }
    }

    /// Workers not currently running a job
    pub fn available_workers(&self) -> usize {
        self.permits.available_permits()
    }

    /// Stop accepting jobs. Running jobs finish; later submissions fail.
    pub fn close(&self) {
        self.permits.close();
    }

    async fn dispatch(&self, job: TransformJob) -> AppResult<TransformOutput> {
        let permit = self
            .permits
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| AppError::WorkerCommFailure("worker pool is closed".to_string()))?;

        let (reply_tx, reply_rx) = oneshot::channel::<WorkerReply>();
        let handler = Arc::clone(&self.handler);
        let input_bytes = job.bytes.len();

        let handle = tokio::task::spawn_blocking(move || {
            let reply = match handler(job) {
                Ok(output) => WorkerReply::Completed(output),
                Err(e) => WorkerReply::Failed {
                    message: format!("{:#}", e),
                },
            };
            // Free the slot before the caller can observe the reply.
            drop(permit);
            // The caller may have given up waiting.
            let _ = reply_tx.send(reply);
        });

        match reply_rx.await {
            Ok(WorkerReply::Completed(output)) => {
                tracing::debug!(
                    input_bytes = input_bytes,
                    output_bytes = output.bytes.len(),
                    "Transform job completed"
                );
                Ok(output)
            }
            Ok(WorkerReply::Failed { message }) => Err(AppError::TransformFailed(message)),
            Err(_) => match handle.await {
                Err(e) if e.is_panic() => Err(AppError::WorkerCrashed(panic_message(
                    e.into_panic(),
                ))),
                Err(e) => Err(AppError::WorkerCommFailure(e.to_string())),
                Ok(()) => Err(AppError::WorkerCommFailure(
                    "worker exited without replying".to_string(),
                )),
            },
        }
    }
}

#[async_trait]
impl TransformExecutor for TransformPool {
    async fn execute(&self, job: TransformJob) -> AppResult<TransformOutput> {
        match self.config.timeout {
            Some(limit) => tokio::time::timeout(limit, self.dispatch(job))
                .await
                .map_err(|_| {
                    tracing::warn!(timeout_ms = limit.as_millis() as u64, "Transform job timed out");
                    AppError::WorkerTimeout(limit)
                })?,
            None => self.dispatch(job).await,
        }
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "worker panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
    use imgflux_core::{FitMode, OperationSet, SizeSpec};
    use std::io::Cursor;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn png(width: u32, height: u32) -> Bytes {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(width, height, Rgba([1, 2, 3, 255])));
        let mut buffer = Vec::new();
        img.write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
            .unwrap();
        Bytes::from(buffer)
    }

    fn config(max_workers: usize, timeout: Option<Duration>) -> TransformPoolConfig {
        TransformPoolConfig {
            max_workers,
            timeout,
        }
    }

    fn job() -> TransformJob {
        TransformJob::new(png(8, 8), OperationSet::default())
    }

    #[tokio::test]
    async fn test_runs_engine() {
        let pool = TransformPool::new(config(2, Some(Duration::from_secs(10))));
        let operations = OperationSet {
            format: Some("png".to_string()),
            rotate: Some(90),
            ..OperationSet::default()
        };

        let output = pool
            .execute(TransformJob::new(png(6, 3), operations))
            .await
            .unwrap();

        assert_eq!(output.content_type.as_deref(), Some("image/png"));
        let decoded = image::load_from_memory(&output.bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (3, 6));
        assert_eq!(pool.available_workers(), 2);
    }

    #[tokio::test]
    async fn test_engine_failure_is_transform_failed() {
        let pool = TransformPool::new(config(1, None));
        let err = pool
            .execute(TransformJob::new(
                Bytes::from_static(b"not an image"),
                OperationSet::default(),
            ))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::TransformFailed(_)));
    }

    #[tokio::test]
    async fn test_oversized_resize_is_transform_failed() {
        let pool = TransformPool::new(config(1, Some(Duration::from_secs(10))));
        let operations = OperationSet {
            size: Some(SizeSpec::Exact {
                width: 16_384,
                height: 16_384,
            }),
            fit: Some(FitMode::Fill),
            ..OperationSet::default()
        };

        let err = pool
            .execute(TransformJob::new(png(4, 4), operations))
            .await
            .unwrap_err();

        match err {
            AppError::TransformFailed(message) => assert!(message.contains("pixel limit")),
            other => panic!("expected TransformFailed, got {:?}", other),
        }
        assert_eq!(pool.available_workers(), 1);
    }

    #[tokio::test]
    async fn test_panic_is_worker_crashed_and_pool_recovers() {
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        let handler: JobHandler = Arc::new(move |job: TransformJob| {
            if seen.fetch_add(1, Ordering::SeqCst) == 0 {
                panic!("decoder blew up");
            }
            Ok(TransformOutput {
                bytes: job.bytes,
                content_type: None,
            })
        });
        let pool = TransformPool::with_handler(config(1, None), handler);

        let err = pool.execute(job()).await.unwrap_err();
        match err {
            AppError::WorkerCrashed(message) => assert!(message.contains("decoder blew up")),
            other => panic!("expected WorkerCrashed, got {:?}", other),
        }

        assert!(pool.execute(job()).await.is_ok());
        assert_eq!(pool.available_workers(), 1);
    }

    #[tokio::test]
    async fn test_slow_job_times_out() {
        let handler: JobHandler = Arc::new(|job: TransformJob| {
            std::thread::sleep(Duration::from_millis(300));
            Ok(TransformOutput {
                bytes: job.bytes,
                content_type: None,
            })
        });
        let pool = TransformPool::with_handler(config(1, Some(Duration::from_millis(20))), handler);

        let err = pool.execute(job()).await.unwrap_err();
        assert!(matches!(err, AppError::WorkerTimeout(_)));
    }

    #[tokio::test]
    async fn test_closed_pool_is_comm_failure() {
        let pool = TransformPool::new(config(1, None));
        pool.close();

        let err = pool.execute(job()).await.unwrap_err();
        assert!(matches!(err, AppError::WorkerCommFailure(_)));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_concurrency_is_bounded() {
        let running = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let (r, p) = (Arc::clone(&running), Arc::clone(&peak));

        let handler: JobHandler = Arc::new(move |job: TransformJob| {
            let now = r.fetch_add(1, Ordering::SeqCst) + 1;
            p.fetch_max(now, Ordering::SeqCst);
            std::thread::sleep(Duration::from_millis(30));
            r.fetch_sub(1, Ordering::SeqCst);
            Ok(TransformOutput {
                bytes: job.bytes,
                content_type: None,
            })
        });
        let pool = Arc::new(TransformPool::with_handler(config(2, None), handler));

        let tasks: Vec<_> = (0..6)
            .map(|_| {
                let pool = Arc::clone(&pool);
                tokio::spawn(async move { pool.execute(job()).await })
            })
            .collect();
        for task in tasks {
            assert!(task.await.unwrap().is_ok());
        }

        assert!(peak.load(Ordering::SeqCst) <= 2);
    }
}
