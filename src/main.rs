use std::sync::Arc;

use order_dispatch::api;
use order_dispatch::config::{Config, DistanceProvider, StoreBackend};
use order_dispatch::error::AppError;
use order_dispatch::geo::{DistanceMatrixClient, DistanceResolver, StraightLineResolver};
use order_dispatch::state::AppState;
use order_dispatch::store::{MemoryOrderStore, OrderStore, PgOrderStore};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let config = Config::from_env()?;

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(config.log_level.clone()))
        .with_target(false);
    if config.log_json {
        subscriber.json().init();
    } else {
        subscriber.compact().init();
    }

    let store: Arc<dyn OrderStore> = match (config.store, &config.database) {
        (StoreBackend::Postgres, Some(settings)) => Arc::new(PgOrderStore::connect(settings).await?),
        (StoreBackend::Postgres, None) => {
            return Err(AppError::Internal("database settings missing".to_string()));
        }
        (StoreBackend::Memory, _) => {
            tracing::warn!("using in-memory order store; orders are lost on restart");
            Arc::new(MemoryOrderStore::new())
        }
    };

    let resolver: Arc<dyn DistanceResolver> = match config.distance_provider {
        DistanceProvider::Google => {
            let api_key = config
                .maps_api_key
                .as_deref()
                .ok_or_else(|| AppError::Internal("MAPS_API_KEY must be set".to_string()))?;
            Arc::new(DistanceMatrixClient::new(
                &config.maps_base_url,
                api_key,
                config.maps_timeout,
            )?)
        }
        DistanceProvider::StraightLine => Arc::new(StraightLineResolver),
    };
    tracing::info!(provider = ?config.distance_provider, "distance resolver ready");

    let shared_state = Arc::new(AppState::new(store, resolver));
    let app = api::rest::router(shared_state);

    let bind_addr = format!("0.0.0.0:{}", config.http_port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .map_err(|err| AppError::Internal(format!("failed to bind {bind_addr}: {err}")))?;

    tracing::info!(http_port = config.http_port, "http server started");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|err| AppError::Internal(format!("server error: {err}")))?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
    }
}
