//! What-If Server - HTTP surface for the scenario pipeline
//!
//! Wires configuration, tracing, the scenario store and the completion
//! client into a [`ScenarioService`] and serves it over `warp`.

#![warn(unreachable_pub)]

pub mod config;
pub mod response;
pub mod routes;

pub use config::{ConfigError, ForecastSettings, ServerConfig};
pub use routes::{api, routes};

use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use whatif_core::{
    client_from_settings, BaselineProvider, CompletionError, JsonFileStore, MemoryStore,
    ScenarioService, ScenarioStore, StoreError,
};

/// Startup errors
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to open scenario store: {0}")]
    Store(#[from] StoreError),

    #[error("failed to build completion client: {0}")]
    Completion(#[from] CompletionError),
}

/// Install the global subscriber; `RUST_LOG` overrides the `info` default
pub fn init_tracing(log_json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    let result = if log_json {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .try_init()
    } else {
        registry.with(tracing_subscriber::fmt::layer()).try_init()
    };

    if result.is_err() {
        tracing::debug!("Tracing subscriber already installed");
    }
}

/// Scenario store selected by configuration
pub async fn build_store(config: &ServerConfig) -> Result<Arc<dyn ScenarioStore>, StoreError> {
    match &config.store_path {
        Some(path) => Ok(Arc::new(JsonFileStore::open(path.clone()).await?)),
        None => {
            tracing::info!("No store path configured; scenarios are kept in memory");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}

/// Scenario service for `config` with the default baseline
pub async fn build_service(config: &ServerConfig) -> Result<ScenarioService, StartupError> {
    let store = build_store(config).await?;
    let completion = client_from_settings(&config.completion)?;

    Ok(ScenarioService::new(
        BaselineProvider::default(),
        completion,
        store,
        config.completion.clone(),
    )
    .with_forecast_engine(config.forecast.engine()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn builds_memory_service_without_credentials() {
        let service = build_service(&ServerConfig::default()).await.unwrap();
        assert!(service.list_scenarios().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn builds_file_store_when_path_given() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data").join("scenarios.json");
        let config = ServerConfig::default().with_store_path(&path);

        let store = build_store(&config).await.unwrap();
        assert!(store.list().await.unwrap().is_empty());
        assert!(path.parent().unwrap().is_dir());
    }
}
