//! HTTP handlers module
//!
//! Contains all HTTP endpoint handling logic

pub mod flows;
pub mod health;

use crate::config::Settings;
use crate::middleware::request_logging_middleware;
use crate::providers::{GeminiProvider, Provider};
use crate::services::flows::{EditImage, Flow, FlowModels, FlowRunner, GenerateTags, HumanizeText, RemoveBackground};
use crate::services::{CredentialPool, GenerationGateway};
use anyhow::Result;
use axum::{
    extract::DefaultBodyLimit,
    http::HeaderValue,
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;

/// Application state
#[derive(Clone)]
pub struct AppState {
    pub settings: Settings,
    pub runner: FlowRunner,
}

/// Create application router backed by the Gemini provider
pub async fn create_router(settings: Settings) -> Result<Router> {
    let provider = Arc::new(GeminiProvider::new(&settings.gemini)?);
    create_router_with_provider(settings, provider).await
}

/// Create application router with an explicit provider
pub async fn create_router_with_provider(settings: Settings, provider: Arc<dyn Provider>) -> Result<Router> {
    let pool = CredentialPool::new(settings.gemini.api_keys.iter().cloned());
    info!(
        "Credential pool loaded with {} key(s) for provider {}",
        pool.size(),
        provider.name()
    );

    let gateway = GenerationGateway::new(provider, pool);
    let runner = FlowRunner::new(gateway, FlowModels::from(&settings.gemini));

    // Create application state
    let app_state = Arc::new(AppState {
        settings: settings.clone(),
        runner,
    });

    // Create middleware stack
    let middleware_stack = ServiceBuilder::new()
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(request_logging_middleware));

    // Create routes
    let router = Router::new()
        .route("/api/flows", get(flows::list_flows))
        .route(
            &format!("/api/flows/{}", RemoveBackground::NAME),
            post(flows::handle_flow::<RemoveBackground>),
        )
        .route(
            &format!("/api/flows/{}", EditImage::NAME),
            post(flows::handle_flow::<EditImage>),
        )
        .route(
            &format!("/api/flows/{}", GenerateTags::NAME),
            post(flows::handle_flow::<GenerateTags>),
        )
        .route(
            &format!("/api/flows/{}", HumanizeText::NAME),
            post(flows::handle_flow::<HumanizeText>),
        )
        .route("/health", get(health::health_check))
        .route("/health/live", get(health::liveness_check))
        .route("/health/ready", get(health::readiness_check))
        .fallback(flows::not_found)
        .with_state(app_state)
        .layer(DefaultBodyLimit::max(settings.request.max_request_size))
        .layer(middleware_stack);

    let router = if settings.security.cors_enabled {
        router.layer(cors_layer(&settings.security.allowed_origins))
    } else {
        router
    };

    Ok(router)
}

/// Build the CORS layer from configured origins
fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origin = if allowed_origins.iter().any(|o| o == "*") {
        AllowOrigin::any()
    } else {
        let origins: Vec<HeaderValue> = allowed_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods(Any)
        .allow_headers(Any)
}
