//! DoreX AI Gateway Server
//!
//! Serves the generation flows over HTTP, rotating through the configured
//! Gemini keys when one hits its quota

use anyhow::{Context, Result};
use dorex_gateway::{create_router, utils::logging::init_logging, version_info, Settings};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    // Load settings from environment (.env is honored)
    let settings = Settings::new().context("Failed to load server settings")?;

    // Initialize logging
    init_logging(&settings.logging);
    info!("{}", version_info());

    if settings.gemini.api_keys.is_empty() {
        warn!("No Gemini API keys configured; only requests carrying their own key will succeed");
    }

    // Create router
    let app = create_router(settings.clone()).await?;

    let addr = format!("{}:{}", settings.server.host, settings.server.port);

    // Start server
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("🚀 DoreX AI gateway started!");
    info!("📝 Health check: http://{}/health", addr);
    info!("🔄 Flow endpoint: http://{}/api/flows/{{name}}", addr);

    axum::serve(listener, app)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to start server: {}", e))?;

    Ok(())
}
