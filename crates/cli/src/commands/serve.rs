use std::sync::Arc;

use anyhow::Result;
use chantier_core::AppConfig;
use chantier_http::{AppState, create_router};

pub(crate) async fn run(config: AppConfig, port: u16, host: String) -> Result<()> {
    tracing::info!(config = ?config, "configuration loaded");
    let state = Arc::new(AppState::new(config)?);

    let router = create_router(state);
    let addr = format!("{host}:{port}");
    tracing::info!("Starting HTTP server on {}", addr);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, router).await?;

    Ok(())
}
