use std::sync::Arc;

use tracing::{info, warn};

use emberfall_api::AppStateInner;
use emberfall_api::token::TokenKeys;
use emberfall_db::Database;
use emberfall_server::config::Config;
use emberfall_server::init_logging;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    init_logging("emberfall=debug,emberfall_api=debug,emberfall_db=info,tower_http=debug");

    let config = Config::from_env()?;

    let db = Arc::new(Database::connect(&config.database_url, config.db_pool_size)?);

    let state = AppStateInner::new(
        db.clone(),
        TokenKeys::with_ttl(&config.jwt_secret, config.token_ttl),
        config.expose_errors(),
    );
    let app = emberfall_api::router(state);

    let addr = config.bind_addr()?;
    info!(
        "Emberfall server listening on {} ({:?})",
        addr, config.environment
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // The router (and every state clone) is gone once serve returns.
    match Arc::try_unwrap(db) {
        Ok(db) => db.close()?,
        Err(_) => warn!("Database still referenced at shutdown; leaving connections to drop"),
    }

    info!("Emberfall server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        let mut sigterm =
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
                .expect("failed to install SIGTERM handler");
        tokio::select! {
            _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
            _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        info!("Received Ctrl+C, shutting down...");
    }
}
