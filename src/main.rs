use qube_ops_api::{config::config, server, state::AppState};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, QUBE_AUTH_URL, etc.
    let _ = dotenvy::dotenv();

    let default_filter = if config().api.enable_request_logging {
        "qube_ops_api=debug,tower_http=debug"
    } else {
        "qube_ops_api=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)))
        .init();

    let config = config();
    tracing::info!("Starting Qube Ops API in {:?} mode", config.environment);
    if config.auth.force_local {
        tracing::warn!("Local authentication is forced; the hosted provider will not be used for sign-in");
    }

    let state = AppState::new(config.clone());
    let database = state.database.clone();
    if !database.is_configured() {
        tracing::warn!("DATABASE_URL is not set; profile lookups and /health will report the database as unavailable");
    }
    let app = server::app(state);

    let bind_addr = format!("0.0.0.0:{}", config.api.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .map_err(|e| anyhow::anyhow!("failed to bind {}: {}", bind_addr, e))?;

    tracing::info!("Qube Ops API listening on http://{}", bind_addr);

    axum::serve(listener, app).await?;
    database.close().await;
    Ok(())
}
