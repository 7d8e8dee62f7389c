//! Test helpers: build the router around a configurable worker pool.
//!
//! Run from workspace root: `cargo test -p imgflux-api`.

pub mod fixtures;

use axum_test::TestServer;
use imgflux_api::setup::{build_state, routes};
use imgflux_core::{Config, FetchConfig, WorkerConfig};
use imgflux_worker::{JobHandler, TransformExecutor, TransformPool, TransformPoolConfig};
use std::sync::Arc;
use std::time::Duration;

/// Config with a short retry delay so fetch failure tests stay fast.
pub fn test_config() -> Config {
    Config::default()
        .with_fetch(FetchConfig {
            max_retries: 3,
            retry_delay: Duration::from_millis(5),
            request_timeout: Duration::from_secs(5),
            ..FetchConfig::default()
        })
        .with_worker(WorkerConfig {
            max_workers: 2,
            timeout: Some(Duration::from_secs(10)),
        })
}

fn server_with_executor(config: Config, executor: Arc<dyn TransformExecutor>) -> TestServer {
    let state = build_state(config, executor).expect("build state");
    let router = routes::setup_routes(&state.config, state.clone());
    TestServer::new(router).expect("test server")
}

/// Server backed by the real transform engine.
pub fn setup_test_server() -> TestServer {
    let config = test_config();
    let pool = TransformPool::new(TransformPoolConfig::from(config.worker()));
    server_with_executor(config, Arc::new(pool))
}

/// Server whose worker pool runs `handler` instead of the engine.
pub fn setup_test_server_with_handler(timeout: Option<Duration>, handler: JobHandler) -> TestServer {
    setup_server_with_config_and_handler(test_config(), timeout, handler)
}

pub fn setup_server_with_config_and_handler(
    config: Config,
    timeout: Option<Duration>,
    handler: JobHandler,
) -> TestServer {
    let pool = TransformPool::with_handler(
        TransformPoolConfig {
            max_workers: 1,
            timeout,
        },
        handler,
    );
    server_with_executor(config, Arc::new(pool))
}

/// Source URL pointing at `path` on a mock origin.
pub fn source_url(server: &mockito::ServerGuard, path: &str) -> String {
    format!("{}{}", server.url(), path)
}
