//! Error handling module
//!
//! Maps flow, gateway and provider failures onto HTTP responses

use crate::providers::ProviderError;
use crate::services::flows::{FlowError, FlowResponse};
use crate::services::gateway::GatewayError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    /// Malformed caller-supplied key
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Flow failure (validation, gateway or output)
    #[error(transparent)]
    Flow(#[from] FlowError),

    /// No route for the requested path
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Request body over the configured size limit
    #[error("Request body exceeds the {0} byte limit")]
    PayloadTooLarge(usize),
}

impl AppError {
    /// Get HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Authentication(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::Flow(e) => flow_status_code(e),
        }
    }

    /// Get error type string
    pub fn error_type(&self) -> &'static str {
        match self {
            AppError::Authentication(_) => "authentication_error",
            AppError::NotFound(_) => "not_found_error",
            AppError::PayloadTooLarge(_) => "request_too_large",
            AppError::Flow(FlowError::Validation(_)) => "invalid_request_error",
            AppError::Flow(FlowError::NoOutput(_)) => "generation_error",
            AppError::Flow(FlowError::Gateway(e)) => match e {
                GatewayError::NoCredential => "credential_error",
                GatewayError::CallerQuotaExceeded | GatewayError::PoolExhausted => "rate_limit_error",
                GatewayError::Provider(ProviderError::RateLimited(_)) => "rate_limit_error",
                GatewayError::Provider(ProviderError::InvalidInput(_)) => "invalid_request_error",
                GatewayError::Provider(ProviderError::ProviderUnavailable(_)) => "overloaded_error",
                GatewayError::Provider(ProviderError::Unknown(_)) => "api_error",
            },
        }
    }

    /// Whether detailed error information should be logged
    pub fn should_log_details(&self) -> bool {
        matches!(self, AppError::Flow(FlowError::Gateway(_)) | AppError::Flow(FlowError::NoOutput(_)))
    }
}

/// HTTP status for a flow failure
fn flow_status_code(error: &FlowError) -> StatusCode {
    match error {
        FlowError::Validation(_) => StatusCode::BAD_REQUEST,
        FlowError::NoOutput(_) => StatusCode::BAD_GATEWAY,
        FlowError::Gateway(e) => match e {
            GatewayError::NoCredential => StatusCode::SERVICE_UNAVAILABLE,
            GatewayError::CallerQuotaExceeded | GatewayError::PoolExhausted => StatusCode::TOO_MANY_REQUESTS,
            GatewayError::Provider(ProviderError::RateLimited(_)) => StatusCode::TOO_MANY_REQUESTS,
            GatewayError::Provider(ProviderError::InvalidInput(_)) => StatusCode::BAD_REQUEST,
            GatewayError::Provider(ProviderError::ProviderUnavailable(_)) => StatusCode::SERVICE_UNAVAILABLE,
            GatewayError::Provider(ProviderError::Unknown(_)) => StatusCode::BAD_GATEWAY,
        },
    }
}

/// Implement IntoResponse trait to allow errors to be returned directly as HTTP responses
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // Log error
        if self.should_log_details() {
            tracing::error!("Application error: {} - Status code: {}", self, status);
        } else {
            tracing::warn!("Client error: {} - Status code: {}", self.error_type(), status);
        }

        let body = FlowResponse::<()>::err(self.to_string());
        (status, Json(body)).into_response()
    }
}

/// Result type alias
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn gateway(e: GatewayError) -> AppError {
        AppError::Flow(FlowError::Gateway(e))
    }

    #[test]
    fn test_error_status_codes() {
        assert_eq!(AppError::Authentication("test".to_string()).status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            AppError::Flow(FlowError::Validation("bad".to_string())).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(gateway(GatewayError::NoCredential).status_code(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(gateway(GatewayError::PoolExhausted).status_code(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(gateway(GatewayError::CallerQuotaExceeded).status_code(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(
            gateway(GatewayError::Provider(ProviderError::Unknown("x".to_string()))).status_code(),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn test_error_types() {
        assert_eq!(gateway(GatewayError::PoolExhausted).error_type(), "rate_limit_error");
        assert_eq!(gateway(GatewayError::NoCredential).error_type(), "credential_error");
        assert_eq!(AppError::Flow(FlowError::NoOutput("x")).error_type(), "generation_error");
    }

    #[test]
    fn test_request_level_errors() {
        assert_eq!(AppError::NotFound("/nope".to_string()).status_code(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::PayloadTooLarge(1024).status_code(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(
            AppError::PayloadTooLarge(1024).to_string(),
            "Request body exceeds the 1024 byte limit"
        );
        assert!(!AppError::NotFound("/nope".to_string()).should_log_details());
    }
}
