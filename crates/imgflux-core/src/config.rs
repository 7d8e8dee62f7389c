//! Configuration module
//!
//! Settings are read once at startup from the process environment (after loading `.env`).
//! Unparseable numeric values fall back to their defaults; [`Config::validate`] rejects
//! values that would leave the service unable to work.

use std::env;
use std::time::Duration;

const SERVER_PORT: u16 = 8080;
const FETCH_MAX_RETRIES: u32 = 3;
const FETCH_RETRY_DELAY_MS: u64 = 250;
const FETCH_TIMEOUT_SECS: u64 = 30;
const MAX_SOURCE_SIZE_MB: usize = 25;
const TRANSFORM_TIMEOUT_SECS: u64 = 30;
const HTTP_CONCURRENCY_LIMIT: usize = 10_000;

/// Output format of the tracing subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl LogFormat {
    fn from_env_value(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "json" => LogFormat::Json,
            _ => LogFormat::Pretty,
        }
    }
}

/// Source fetcher settings
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FetchConfig {
    /// Total number of attempts, including the first
    pub max_retries: u32,
    pub retry_delay: Duration,
    pub request_timeout: Duration,
    pub max_source_bytes: usize,
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            max_retries: FETCH_MAX_RETRIES,
            retry_delay: Duration::from_millis(FETCH_RETRY_DELAY_MS),
            request_timeout: Duration::from_secs(FETCH_TIMEOUT_SECS),
            max_source_bytes: MAX_SOURCE_SIZE_MB * 1024 * 1024,
            user_agent: default_user_agent(),
        }
    }
}

fn default_user_agent() -> String {
    format!("imgflux/{}", env!("CARGO_PKG_VERSION"))
}

fn default_worker_count() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}

/// Transform worker pool settings
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WorkerConfig {
    pub max_workers: usize,
    /// Round-trip limit for one transform; `None` waits indefinitely
    pub timeout: Option<Duration>,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            max_workers: default_worker_count(),
            timeout: Some(Duration::from_secs(TRANSFORM_TIMEOUT_SECS)),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Config {
    server_port: u16,
    environment: String,
    log_format: LogFormat,
    http_concurrency_limit: usize,
    fetch: FetchConfig,
    worker: WorkerConfig,
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string());

        let server_port = env::var("PORT")
            .unwrap_or_else(|_| SERVER_PORT.to_string())
            .parse()
            .map_err(|_| anyhow::anyhow!("PORT must be a valid number"))?;

        let max_source_size_mb = env::var("MAX_SOURCE_SIZE_MB")
            .unwrap_or_else(|_| MAX_SOURCE_SIZE_MB.to_string())
            .parse::<usize>()
            .unwrap_or(MAX_SOURCE_SIZE_MB);

        let fetch = FetchConfig {
            max_retries: env::var("FETCH_MAX_RETRIES")
                .unwrap_or_else(|_| FETCH_MAX_RETRIES.to_string())
                .parse()
                .unwrap_or(FETCH_MAX_RETRIES),
            retry_delay: Duration::from_millis(
                env::var("FETCH_RETRY_DELAY_MS")
                    .unwrap_or_else(|_| FETCH_RETRY_DELAY_MS.to_string())
                    .parse()
                    .unwrap_or(FETCH_RETRY_DELAY_MS),
            ),
            request_timeout: Duration::from_secs(
                env::var("FETCH_TIMEOUT_SECS")
                    .unwrap_or_else(|_| FETCH_TIMEOUT_SECS.to_string())
                    .parse()
                    .unwrap_or(FETCH_TIMEOUT_SECS),
            ),
            max_source_bytes: max_source_size_mb.saturating_mul(1024 * 1024),
            user_agent: env::var("FETCH_USER_AGENT").unwrap_or_else(|_| default_user_agent()),
        };

        let transform_timeout_secs = env::var("TRANSFORM_TIMEOUT_SECS")
            .unwrap_or_else(|_| TRANSFORM_TIMEOUT_SECS.to_string())
            .parse::<u64>()
            .unwrap_or(TRANSFORM_TIMEOUT_SECS);

        let worker = WorkerConfig {
            max_workers: env::var("TRANSFORM_WORKERS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or_else(default_worker_count),
            timeout: (transform_timeout_secs > 0)
                .then(|| Duration::from_secs(transform_timeout_secs)),
        };

        let log_format = env::var("LOG_FORMAT")
            .map(|v| LogFormat::from_env_value(&v))
            .unwrap_or_default();

        let http_concurrency_limit = env::var("HTTP_CONCURRENCY_LIMIT")
            .ok()
            .and_then(|s| s.parse::<usize>().ok())
            .unwrap_or(HTTP_CONCURRENCY_LIMIT)
            .max(1);

        Ok(Config {
            server_port,
            environment,
            log_format,
            http_concurrency_limit,
            fetch,
            worker,
        })
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.fetch.max_retries == 0 {
            return Err(anyhow::anyhow!("FETCH_MAX_RETRIES must be at least 1"));
        }

        if self.fetch.max_source_bytes == 0 {
            return Err(anyhow::anyhow!("MAX_SOURCE_SIZE_MB must be at least 1"));
        }

        if self.worker.max_workers == 0 {
            return Err(anyhow::anyhow!("TRANSFORM_WORKERS must be at least 1"));
        }

        Ok(())
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let environment = self.environment.to_lowercase();
        environment == "production" || environment == "prod"
    }

    pub fn server_port(&self) -> u16 {
        self.server_port
    }

    pub fn environment(&self) -> &str {
        &self.environment
    }

    pub fn log_format(&self) -> LogFormat {
        self.log_format
    }

    pub fn http_concurrency_limit(&self) -> usize {
        self.http_concurrency_limit
    }

    pub fn fetch(&self) -> &FetchConfig {
        &self.fetch
    }

    pub fn worker(&self) -> &WorkerConfig {
        &self.worker
    }

    pub fn with_environment(mut self, environment: impl Into<String>) -> Self {
        self.environment = environment.into();
        self
    }

    pub fn with_fetch(mut self, fetch: FetchConfig) -> Self {
        self.fetch = fetch;
        self
    }

    pub fn with_worker(mut self, worker: WorkerConfig) -> Self {
        self.worker = worker;
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: SERVER_PORT,
            environment: "development".to_string(),
            log_format: LogFormat::default(),
            http_concurrency_limit: HTTP_CONCURRENCY_LIMIT,
            fetch: FetchConfig::default(),
            worker: WorkerConfig::default(),
        }
    }
}
