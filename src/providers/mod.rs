//! Provider module
//!
//! Defines the Provider trait, the classified provider error and the
//! provider implementations

pub mod gemini;

use crate::models::{GenerationRequest, GenerationResult};
use crate::services::credential_pool::Credential;
use async_trait::async_trait;
use thiserror::Error;

/// Provider failure, classified where the raw response is received
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    /// Credential exceeded its quota or rate limit
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// Provider rejected the request (bad prompt, unknown model, ...)
    #[error("Invalid request: {0}")]
    InvalidInput(String),

    /// Provider outage, 5xx or transport failure
    #[error("Provider unavailable: {0}")]
    ProviderUnavailable(String),

    /// Anything else
    #[error("Provider error: {0}")]
    Unknown(String),
}

impl ProviderError {
    /// Whether this failure is a quota/rate-limit signal
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, ProviderError::RateLimited(_))
    }

    /// Classify an HTTP status and the provider's canonical status string
    pub fn classify(http_status: u16, provider_status: &str, message: impl Into<String>) -> Self {
        let message = message.into();
        match (http_status, provider_status) {
            (429, _) | (_, "RESOURCE_EXHAUSTED") => ProviderError::RateLimited(message),
            (400, _) | (404, _) | (_, "INVALID_ARGUMENT") | (_, "FAILED_PRECONDITION") | (_, "NOT_FOUND") => {
                ProviderError::InvalidInput(message)
            }
            (500..=599, _) | (_, "UNAVAILABLE") | (_, "INTERNAL") => ProviderError::ProviderUnavailable(message),
            _ => ProviderError::Unknown(message),
        }
    }
}

/// Provider trait for upstream generative APIs
///
/// Implementations perform exactly one call with the given credential and
/// never retry; rotation belongs to the gateway.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Get the provider name
    fn name(&self) -> &str;

    /// Execute a generation request with `credential`
    async fn generate(
        &self,
        request: &GenerationRequest,
        credential: &Credential,
    ) -> Result<GenerationResult, ProviderError>;
}

pub use gemini::GeminiProvider;
