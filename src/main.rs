use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::{header, HeaderValue};
use tokio::sync::broadcast;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use up_or_down::config::Config;
use up_or_down::extractors::PLAYER_HEADER;
use up_or_down::game::pool::DefaultPool;
use up_or_down::game::registry::SessionRegistry;
use up_or_down::game::session::GameDeps;
use up_or_down::logging::{init_tracing, LogConfig};
use up_or_down::routes::build_router;
use up_or_down::services::reddit::RedditClient;
use up_or_down::state::AppState;
use up_or_down::store::Store;
use up_or_down::workers::WorkerManager;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let config = Config::from_env();
    if let Err(e) = init_tracing(&LogConfig::from(&config)) {
        eprintln!("failed to initialize logging: {e}");
        std::process::exit(1);
    }
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "Starting up-or-down");

    if let Err(e) = run(config).await {
        tracing::error!(error = %e, "Fatal startup error");
        std::process::exit(1);
    }
    tracing::info!("Shutdown complete");
}

async fn run(config: Config) -> Result<(), BoxError> {
    let store = Arc::new(Store::open(&config.sled_path)?);
    let defaults = Arc::new(DefaultPool::load(config.game.default_pool_path.as_deref())?);
    tracing::info!(communities = defaults.len(), "Default pool loaded");

    let reddit = Arc::new(RedditClient::new(&config.reddit));
    let (shutdown_tx, _) = broadcast::channel::<()>(8);

    let deps = GameDeps::new(reddit.clone(), store.clone(), defaults)
        .with_max_draw_attempts(config.game.max_draw_attempts);
    let registry = Arc::new(SessionRegistry::new(
        deps,
        reddit,
        config.game.rank_limits(),
        config.game.progress_tick(),
        shutdown_tx.clone(),
    ));

    let state = AppState::new(store.clone(), registry.clone(), &config, shutdown_tx.clone());

    if config.worker.is_leader {
        let worker_manager = WorkerManager::new(registry, shutdown_tx.subscribe(), &config.worker);
        // Worker panic 只记录，不影响 HTTP 服务
        tokio::spawn(async move {
            if let Err(e) = worker_manager.start().await {
                tracing::error!(error = %e, "Worker manager failed");
            }
        });
    }

    let app = build_router(state)
        .layer(build_cors_layer(&config)?)
        .layer(TraceLayer::new_for_http())
        .layer(CatchPanicLayer::new());

    let addr = SocketAddr::new(config.host, config.port);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "Listening");

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown_tx))
        .await;
    if let Err(e) = served {
        tracing::error!(error = %e, "HTTP server crashed");
    }

    tracing::info!("Flushing store before exit");
    if let Err(e) = store.flush() {
        tracing::error!(error = %e, "Failed to flush store before exit");
    }
    Ok(())
}

fn build_cors_layer(config: &Config) -> Result<CorsLayer, BoxError> {
    let headers = [header::CONTENT_TYPE, header::ACCEPT, PLAYER_HEADER];
    if config.cors_origin.trim() == "*" {
        return Ok(CorsLayer::new()
            .allow_origin(Any)
            .allow_headers(headers)
            .allow_methods(Any));
    }

    let origin = config
        .cors_origin
        .parse::<HeaderValue>()
        .map_err(|e| format!("invalid CORS_ORIGIN '{}': {e}", config.cors_origin))?;
    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_headers(headers)
        .allow_methods(Any))
}

async fn shutdown_signal(shutdown_tx: broadcast::Sender<()>) {
    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = sigterm.recv() => {},
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "SIGTERM handler unavailable, waiting for Ctrl-C");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }

    tracing::info!("Shutdown signal received");
    let _ = shutdown_tx.send(());
}
