//! Health check handlers
//!
//! Provides application health status check endpoints

use crate::handlers::AppState;
use axum::{extract::State, http::StatusCode, response::Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

const SERVICE_NAME: &str = "DoreX AI Gateway";

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,
    /// Service name
    pub service: String,
    /// Version information
    pub version: String,
    /// Timestamp
    pub timestamp: String,
    /// Details (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<HealthDetails>,
}

/// Check result
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthDetails {
    /// Provider the gateway talks to
    pub provider: String,
    /// Number of pooled credentials
    pub credential_pool_size: usize,
    /// Uptime in seconds
    pub uptime_seconds: u64,
    /// Memory usage (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory_usage: Option<MemoryUsage>,
}

/// Process memory, read from `/proc/self/status`
#[derive(Debug, Serialize, Deserialize)]
pub struct MemoryUsage {
    /// Resident set size in bytes
    pub resident_bytes: u64,
    /// Peak resident set size in bytes
    pub peak_resident_bytes: u64,
}

fn details(state: &AppState) -> HealthDetails {
    let gateway = state.runner.gateway();
    HealthDetails {
        provider: gateway.provider_name().to_string(),
        credential_pool_size: gateway.pool().size(),
        uptime_seconds: get_uptime_seconds(),
        memory_usage: get_memory_usage(),
    }
}

fn response(status: &str, details: Option<HealthDetails>) -> HealthResponse {
    HealthResponse {
        status: status.to_string(),
        service: SERVICE_NAME.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        details,
    }
}

/// Basic health check
///
/// GET /health
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    debug!("Executing health check");
    Json(response("healthy", Some(details(&state))))
}

/// Readiness check
///
/// GET /health/ready
/// Ready once at least one pooled credential is configured. Requests that
/// carry their own key are still served when this reports 503.
pub async fn readiness_check(State(state): State<Arc<AppState>>) -> Result<Json<HealthResponse>, StatusCode> {
    debug!("Executing readiness check");

    let details = details(&state);
    if details.credential_pool_size == 0 {
        warn!("Readiness check failed: credential pool is empty");
        return Err(StatusCode::SERVICE_UNAVAILABLE);
    }

    Ok(Json(response("ready", Some(details))))
}

/// Liveness check
///
/// GET /health/live
/// Does not look at the credential pool
pub async fn liveness_check() -> Json<HealthResponse> {
    debug!("Executing liveness check");

    let details = HealthDetails {
        provider: "not_checked".to_string(),
        credential_pool_size: 0,
        uptime_seconds: get_uptime_seconds(),
        memory_usage: get_memory_usage(),
    };

    Json(response("alive", Some(details)))
}

/// Get service uptime in seconds
fn get_uptime_seconds() -> u64 {
    use std::sync::OnceLock;
    use std::time::{SystemTime, UNIX_EPOCH};

    static START_TIME: OnceLock<u64> = OnceLock::new();

    let start_time = *START_TIME.get_or_init(|| {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs()
    });

    let current_time = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();

    current_time.saturating_sub(start_time)
}

/// Get memory usage information (Linux only)
fn get_memory_usage() -> Option<MemoryUsage> {
    let status = std::fs::read_to_string("/proc/self/status").ok()?;
    parse_memory_usage(&status)
}

/// Extract `VmRSS` and `VmHWM` from a `/proc/<pid>/status` listing
fn parse_memory_usage(status: &str) -> Option<MemoryUsage> {
    let field_bytes = |name: &str| {
        status
            .lines()
            .find_map(|line| line.strip_prefix(name))
            .and_then(|rest| rest.split_whitespace().next())
            .and_then(|kb| kb.parse::<u64>().ok())
            .map(|kb| kb * 1024)
    };

    Some(MemoryUsage {
        resident_bytes: field_bytes("VmRSS:")?,
        peak_resident_bytes: field_bytes("VmHWM:")?,
    })
}
