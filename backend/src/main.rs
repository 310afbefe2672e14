use analysis_core::AnalysisService;
use backend::{api, config::Args};
use clap::Parser;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let settings = args.settings();
    let service = Arc::new(AnalysisService::from_settings(&settings)?);

    info!("Analysis engine starting up");
    info!(
        path = %settings.engine_path.display(),
        depth = settings.default_depth,
        threads = settings.engine_threads,
        hash_mb = settings.engine_hash_mb,
        "Stockfish settings"
    );
    match &settings.cache_url {
        Some(url) => info!(url = %url, ttl_secs = settings.cache_ttl_secs, "Using Redis cache"),
        None => info!(ttl_secs = settings.cache_ttl_secs, "Using in-memory cache"),
    }

    let app = api::app(service.clone(), &args.allowed_origins);
    let listener = TcpListener::bind(args.bind).await?;
    info!("API listening on {}", args.bind);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    service.shutdown().await;
    info!("Analysis engine stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutdown signal received");
}
