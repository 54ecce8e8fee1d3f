use anyhow::{Context, Result};
use axum::Router;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::{
    api::followiz::FollowizClient, app_state::AppState, config::AppConfig, routes,
    store::OrderStore,
};

/// Installs the global fmt subscriber. `RUST_LOG` overrides the default filter.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Loads variables from a `.env` file when one exists.
pub fn init_env() {
    if let Ok(path) = dotenvy::dotenv() {
        info!("Loaded environment from {}", path.display());
    }
}

/// Prepares storage and clients, then builds the router.
pub async fn build_app(config: AppConfig) -> Result<Router> {
    let store = OrderStore::new(config.database.path.clone());
    store
        .init()
        .await
        .context("Failed to prepare the orders table")?;

    let followiz =
        FollowizClient::new(&config.provider).context("Failed to build the Followiz client")?;
    if !followiz.has_api_key() {
        tracing::warn!("FOLLOWIZ_API_KEY is not set; status lookups will fail");
    }

    Ok(routes::app(AppState::new(config, store, followiz)))
}

/// Serves `app` until Ctrl-C or SIGTERM.
pub async fn serve(name: &str, bind_address: &str, app: Router) -> Result<()> {
    let listener = TcpListener::bind(bind_address)
        .await
        .with_context(|| format!("Failed to bind {}", bind_address))?;
    info!("{} listening on http://{}", name, listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("{} stopped", name);
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        if let Ok(mut signal) =
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
        {
            signal.recv().await;
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
