use anyhow::Context;
use clap::Parser;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use wa_dialog_gateway::config::{Args, Config};
use wa_dialog_gateway::rate_limit::{BLOCK_TIME, RATE_LIMIT};
use wa_dialog_gateway::router::build_router;
use wa_dialog_gateway::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // parse cli arguments, falling back to the environment
    let args = Args::parse();
    let config = Config::from_args(args).context("invalid configuration")?;

    let state = Arc::new(AppState::from_config(&config));
    let app = build_router(state);

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    tracing::info!("webhook listening on http://{}", listener.local_addr()?);
    tracing::info!(
        register_users = config.register_users,
        rate_limit_enabled = config.rate_limit_enabled,
        "rate limit: {} requests per {} seconds",
        RATE_LIMIT,
        BLOCK_TIME
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
        .context("server exited unexpectedly")?;
    Ok(())
}
