//! Application setup and initialization

pub mod routes;
pub mod server;

use crate::services::TransformService;
use crate::state::AppState;
use anyhow::{Context, Result};
use imgflux_core::Config;
use imgflux_infra::SourceFetcher;
use imgflux_worker::{TransformExecutor, TransformPool, TransformPoolConfig};
use std::sync::Arc;

/// Validate config, install telemetry and assemble state and router.
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, axum::Router)> {
    config
        .validate()
        .context("Configuration validation failed")?;

    imgflux_infra::init_telemetry(config.log_format(), "imgflux-api", config.environment())
        .map_err(|e| anyhow::anyhow!("Failed to initialize telemetry: {}", e))?;

    tracing::info!("Configuration loaded and validated successfully");

    let pool = TransformPool::new(TransformPoolConfig::from(config.worker()));
    let state = build_state(config, Arc::new(pool))?;
    let router = routes::setup_routes(&state.config, state.clone());

    Ok((state, router))
}

/// Assemble [`AppState`] around an executor. Tests pass their own executor here.
pub fn build_state(config: Config, executor: Arc<dyn TransformExecutor>) -> Result<Arc<AppState>> {
    let fetcher = SourceFetcher::new(config.fetch().clone())?;

    Ok(Arc::new(AppState {
        transforms: TransformService::new(fetcher, executor),
        config,
    }))
}
