//! Flow definitions
//!
//! A flow is a stateless request/response contract: it validates its input,
//! renders a prompt, makes exactly one gateway call and unwraps the result.
//! Flows never retry; rotation lives in the gateway.

pub mod image;
pub mod text;

use crate::config::GeminiConfig;
use crate::models::{GenerationRequest, GenerationResult, MediaPart};
use crate::services::credential_pool::Credential;
use crate::services::gateway::{GatewayError, GenerationGateway};
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

pub use image::{EditImage, RemoveBackground};
pub use text::{GenerateTags, HumanizeText};

/// Names of all flows, as exposed over HTTP
pub const FLOW_NAMES: &[&str] = &[
    <RemoveBackground as Flow>::NAME,
    <EditImage as Flow>::NAME,
    <GenerateTags as Flow>::NAME,
    <HumanizeText as Flow>::NAME,
];

/// Flow failure; `Display` is the user-facing message
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FlowError {
    /// Input rejected before any provider call
    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    /// Provider answered but produced nothing usable
    #[error("{0}")]
    NoOutput(&'static str),
}

/// Model identifiers available to flows
#[derive(Debug, Clone)]
pub struct FlowModels {
    pub text: String,
    pub image: String,
}

impl From<&GeminiConfig> for FlowModels {
    fn from(config: &GeminiConfig) -> Self {
        Self {
            text: config.text_model.clone(),
            image: config.image_model.clone(),
        }
    }
}

/// A named request/response contract over the gateway
pub trait Flow: Default + Send + Sync + 'static {
    /// URL-safe flow name
    const NAME: &'static str;

    type Input: DeserializeOwned + Send + 'static;
    type Output: Serialize + Send + 'static;

    /// Check the input before anything is sent
    fn validate(&self, input: &Self::Input) -> Result<(), FlowError>;

    /// Render the generation request for a validated input
    fn build(&self, input: &Self::Input, models: &FlowModels) -> Result<GenerationRequest, FlowError>;

    /// Validate and unwrap the provider's result
    fn extract(&self, input: &Self::Input, result: GenerationResult) -> Result<Self::Output, FlowError>;
}

/// Runs flows against a shared gateway
#[derive(Clone)]
pub struct FlowRunner {
    gateway: GenerationGateway,
    models: FlowModels,
}

impl FlowRunner {
    pub fn new(gateway: GenerationGateway, models: FlowModels) -> Self {
        Self { gateway, models }
    }

    pub fn gateway(&self) -> &GenerationGateway {
        &self.gateway
    }

    /// Validate, render, generate once, extract
    pub async fn run<F: Flow>(
        &self,
        flow: &F,
        input: F::Input,
        caller_credential: Option<Credential>,
    ) -> Result<F::Output, FlowError> {
        debug!("Running flow {}", F::NAME);

        flow.validate(&input).map_err(|e| {
            warn!("Flow {} input rejected: {}", F::NAME, e);
            e
        })?;

        let request = flow
            .build(&input, &self.models)?
            .with_caller_credential(caller_credential);

        let result = self.gateway.generate(&request).await?;
        let output = flow.extract(&input, result)?;

        info!("Flow {} completed", F::NAME);
        Ok(output)
    }
}

/// Uniform flow response: `{"success": true, ...}` or `{"success": false, "error": ...}`
#[derive(Debug, Serialize)]
pub struct FlowResponse<T> {
    pub success: bool,
    #[serde(flatten)]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> FlowResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

impl<T> From<Result<T, FlowError>> for FlowResponse<T> {
    fn from(result: Result<T, FlowError>) -> Self {
        match result {
            Ok(data) => Self::ok(data),
            Err(e) => Self::err(e.to_string()),
        }
    }
}

/// Require a non-blank string no longer than `max_chars`
pub(crate) fn require_text(field: &str, value: &str, max_chars: usize) -> Result<(), FlowError> {
    if value.trim().is_empty() {
        return Err(FlowError::Validation(format!("{} cannot be empty", field)));
    }
    if value.chars().count() > max_chars {
        return Err(FlowError::Validation(format!(
            "{} cannot exceed {} characters",
            field, max_chars
        )));
    }
    Ok(())
}

/// Parse an image data URI
pub(crate) fn require_image(field: &str, value: &str) -> Result<MediaPart, FlowError> {
    let media = MediaPart::from_data_url(value)
        .map_err(|e| FlowError::Validation(format!("{}: {}", field, e)))?;

    if !media.content_type.starts_with("image/") {
        return Err(FlowError::Validation(format!("{} must be an image", field)));
    }
    Ok(media)
}
