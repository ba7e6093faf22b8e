//! Generation gateway
//!
//! Executes generation requests against a [`Provider`], rotating through the
//! credential pool when the active key is rate limited. Caller-supplied keys
//! are never rotated.

use crate::models::{GenerationRequest, GenerationResult};
use crate::providers::{Provider, ProviderError};
use crate::services::credential_pool::CredentialPool;
use crate::utils::logging::create_request_log_summary;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Gateway failure
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    /// Empty pool and no caller key
    #[error("No API key available")]
    NoCredential,

    /// The caller's own key was rate limited
    #[error("Your provided API key has exceeded its quota")]
    CallerQuotaExceeded,

    /// Every pooled key was rate limited
    #[error("All API keys exhausted, please try again later")]
    PoolExhausted,

    /// Non-quota provider failure, passed through unchanged
    #[error(transparent)]
    Provider(#[from] ProviderError),
}

/// Result of one gateway execution with its rotation trace
#[derive(Debug)]
pub struct GatewayOutcome {
    pub result: Result<GenerationResult, GatewayError>,
    /// Provider calls made
    pub attempts: usize,
    /// Rotation index when the request finished
    pub cursor: usize,
}

/// Key-rotating wrapper around a provider
#[derive(Clone)]
pub struct GenerationGateway {
    provider: Arc<dyn Provider>,
    pool: CredentialPool,
}

impl GenerationGateway {
    pub fn new(provider: Arc<dyn Provider>, pool: CredentialPool) -> Self {
        Self { provider, pool }
    }

    pub fn pool(&self) -> &CredentialPool {
        &self.pool
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Execute a request and return only its result
    pub async fn generate(&self, request: &GenerationRequest) -> Result<GenerationResult, GatewayError> {
        self.execute(request).await.result
    }

    /// Execute a request, reporting attempts and the final rotation index
    pub async fn execute(&self, request: &GenerationRequest) -> GatewayOutcome {
        if let Ok(summary) = serde_json::to_string(&create_request_log_summary(request)) {
            debug!("Generation request: {}", summary);
        }

        let mut rotation = self.pool.rotation();
        rotation.reset();

        let caller = request.caller_credential.as_ref();
        let budget = if caller.is_some() { 1 } else { rotation.size() };
        let mut attempts = 0;

        // An empty pool gives a zero budget; still surface NoCredential
        if budget == 0 {
            return GatewayOutcome {
                result: Err(GatewayError::NoCredential),
                attempts,
                cursor: rotation.index(),
            };
        }

        while attempts < budget {
            let credential = match caller.or_else(|| rotation.current()) {
                Some(credential) => credential,
                None => {
                    return GatewayOutcome {
                        result: Err(GatewayError::NoCredential),
                        attempts,
                        cursor: rotation.index(),
                    }
                }
            };

            attempts += 1;
            debug!(
                "Attempt {}/{} for model {} using {} credential {}",
                attempts,
                budget,
                request.model,
                if caller.is_some() { "caller" } else { "pooled" },
                credential
            );

            match self.provider.generate(request, credential).await {
                Ok(result) => {
                    info!(
                        "Generation succeeded for model {} after {} attempt(s)",
                        request.model, attempts
                    );
                    return GatewayOutcome {
                        result: Ok(result),
                        attempts,
                        cursor: rotation.index(),
                    };
                }
                Err(e) if e.is_rate_limited() => {
                    if caller.is_some() {
                        warn!("Caller-supplied API key exceeded its quota");
                        return GatewayOutcome {
                            result: Err(GatewayError::CallerQuotaExceeded),
                            attempts,
                            cursor: rotation.index(),
                        };
                    }

                    if rotation.advance() {
                        warn!(
                            "Credential {} rate limited, rotating to next key ({}/{})",
                            credential,
                            rotation.index() + 1,
                            rotation.size()
                        );
                    } else {
                        warn!("Credential {} rate limited, no keys left in pool", credential);
                        break;
                    }
                }
                Err(e) => {
                    warn!("Provider request failed without retry: {}", e);
                    return GatewayOutcome {
                        result: Err(GatewayError::Provider(e)),
                        attempts,
                        cursor: rotation.index(),
                    };
                }
            }
        }

        warn!("All {} pooled API keys exhausted", rotation.size());
        GatewayOutcome {
            result: Err(GatewayError::PoolExhausted),
            attempts,
            cursor: rotation.index(),
        }
    }
}
