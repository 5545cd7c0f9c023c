//! Gava authentication API server binary.
//!
//! Reads configuration from the environment (and `.env`), connects the
//! account store and serves the HTTP API until Ctrl-C or SIGTERM.

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use gava_api::config::ApiConfig;
use gava_core::store::{AccountStore, MemoryAccountStore, PgAccountStore};
use sqlx::postgres::PgPoolOptions;
use tracing::{info, warn};

/// CLI arguments. Flags override the matching environment variables.
#[derive(Parser, Debug)]
#[command(name = "gava_api_server", about = "Gava authentication API server")]
struct Args {
    /// Address to listen on, e.g. `0.0.0.0:8080`.
    #[arg(long, env = "BIND_ADDR")]
    bind: Option<String>,

    /// PostgreSQL connection URL. Without one, accounts live in memory and
    /// are lost on exit.
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,

    /// Maximum number of database connections in the pool.
    #[arg(long, default_value_t = 5)]
    max_connections: u32,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,gava_api=debug,gava_core=debug".into()),
        )
        .init();

    let args = Args::parse();

    let mut config = ApiConfig::from_env()?;
    if let Some(bind) = args.bind {
        config.bind_addr = bind;
    }
    if args.database_url.is_some() {
        config.database_url = args.database_url;
    }

    info!(version = gava_core::version(), ?config, "starting gava_api_server");

    let store: Arc<dyn AccountStore> = match &config.database_url {
        Some(url) => {
            info!(max_connections = args.max_connections, "configuring connection pool");
            let pool = PgPoolOptions::new()
                .max_connections(args.max_connections)
                .acquire_timeout(Duration::from_secs(30))
                .connect(url)
                .await?;

            info!("running database migrations");
            gava_core::migrate::migrate(&pool).await?;
            Arc::new(PgAccountStore::new(pool))
        }
        None => {
            warn!("DATABASE_URL not set; using the in-memory account store");
            Arc::new(MemoryAccountStore::new())
        }
    };

    let state = gava_api::AppState::with_http_social(config.clone(), store)?;
    let app = gava_api::router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!(addr = %listener.local_addr()?, "REST API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("server stopped");
    Ok(())
}

/// Resolves on Ctrl-C, or SIGTERM on unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("failed to listen for Ctrl-C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!("failed to listen for SIGTERM: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
    info!("shutdown signal received");
}
