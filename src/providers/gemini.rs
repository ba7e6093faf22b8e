//! Gemini Provider implementation
//!
//! Calls the Gemini `generateContent` endpoint and classifies failures into
//! [`ProviderError`] kinds

use super::{Provider, ProviderError};
use crate::config::settings::GeminiConfig;
use crate::models::gemini::*;
use crate::models::{GenerationConfig, GenerationRequest, GenerationResult, MediaPart, Part};
use crate::services::credential_pool::Credential;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, error, warn};

/// Gemini Provider
pub struct GeminiProvider {
    client: Client,
    base_url: String,
}

impl GeminiProvider {
    /// Create a provider from configuration
    pub fn new(config: &GeminiConfig) -> Result<Self> {
        Self::with_timeout(&config.base_url, config.timeout)
    }

    /// Create a provider with a custom base URL and timeout
    pub fn with_timeout(base_url: &str, timeout_secs: u64) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent(concat!("dorex-gateway/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Build the request URL
    fn build_url(&self, model: &str) -> String {
        format!("{}/models/{}:generateContent", self.base_url, model)
    }

    /// Convert a generation request to the Gemini wire format
    fn build_request(&self, request: &GenerationRequest) -> GeminiRequest {
        let parts = request.parts.iter().map(convert_part).collect();

        let system_instruction = request.config.system_instruction.as_ref().map(|text| GeminiContent {
            role: None,
            parts: vec![GeminiPart::Text { text: text.clone() }],
        });

        GeminiRequest {
            contents: vec![GeminiContent {
                role: Some("user".to_string()),
                parts,
            }],
            system_instruction,
            generation_config: convert_config(&request.config),
        }
    }

    /// Convert a Gemini response to a generation result
    fn convert_response(
        &self,
        response: GeminiResponse,
        config: &GenerationConfig,
    ) -> Result<GenerationResult, ProviderError> {
        if let Some(reason) = response.prompt_feedback.as_ref().and_then(|f| f.block_reason.as_ref()) {
            return Err(ProviderError::InvalidInput(format!("Prompt blocked: {}", reason)));
        }

        let parts = response
            .candidates
            .unwrap_or_default()
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content)
            .map(|content| content.parts)
            .unwrap_or_default();

        let mut text = String::new();
        let mut media = None;

        for part in parts {
            match part {
                GeminiPart::Text { text: chunk } => text.push_str(&chunk),
                GeminiPart::InlineData { inline_data } => {
                    if media.is_none() {
                        media = Some(MediaPart::from_base64(&inline_data.mime_type, &inline_data.data));
                    }
                }
                GeminiPart::FileData { file_data } => {
                    if media.is_none() {
                        media = Some(MediaPart::new(file_data.file_uri, file_data.mime_type));
                    }
                }
                GeminiPart::Other(_) => {}
            }
        }

        let structured = if config.expects_json() && !text.is_empty() {
            match serde_json::from_str::<serde_json::Value>(strip_code_fence(&text)) {
                Ok(value) => Some(value),
                Err(e) => {
                    warn!("Structured output is not valid JSON: {}", e);
                    None
                }
            }
        } else {
            None
        };

        Ok(GenerationResult {
            media,
            text: if text.is_empty() { None } else { Some(text) },
            structured,
        })
    }
}

/// Convert a prompt part
fn convert_part(part: &Part) -> GeminiPart {
    match part {
        Part::Text { text } => GeminiPart::Text { text: text.clone() },
        Part::Media(media) => match media.inline_data() {
            Some(data) => GeminiPart::InlineData {
                inline_data: GeminiBlob {
                    mime_type: media.content_type.clone(),
                    data: data.to_string(),
                },
            },
            None => GeminiPart::FileData {
                file_data: GeminiFileData {
                    mime_type: media.content_type.clone(),
                    file_uri: media.url.clone(),
                },
            },
        },
    }
}

/// Convert generation configuration; `None` when nothing is set
fn convert_config(config: &GenerationConfig) -> Option<GeminiGenerationConfig> {
    let modalities: Vec<String> = config
        .response_modalities
        .iter()
        .filter_map(|m| serde_json::to_value(m).ok())
        .filter_map(|v| v.as_str().map(str::to_string))
        .collect();

    let converted = GeminiGenerationConfig {
        response_modalities: if modalities.is_empty() { None } else { Some(modalities) },
        response_mime_type: config.response_mime_type.clone(),
        response_schema: config.response_schema.clone(),
        temperature: config.temperature,
    };

    if converted.response_modalities.is_none()
        && converted.response_mime_type.is_none()
        && converted.response_schema.is_none()
        && converted.temperature.is_none()
    {
        None
    } else {
        Some(converted)
    }
}

/// Strip a surrounding markdown code fence, which some models add around JSON
fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.strip_suffix("```"))
        .map(str::trim)
        .unwrap_or(trimmed)
}

/// Classify a transport-level failure
fn classify_transport_error(e: reqwest::Error) -> ProviderError {
    if e.is_timeout() || e.is_connect() {
        ProviderError::ProviderUnavailable(format!("Failed to reach Gemini API: {}", e.without_url()))
    } else {
        ProviderError::Unknown(format!("Failed to send request: {}", e.without_url()))
    }
}

#[async_trait]
impl Provider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn generate(
        &self,
        request: &GenerationRequest,
        credential: &Credential,
    ) -> Result<GenerationResult, ProviderError> {
        debug!("Sending Gemini generateContent request for model: {}", request.model);

        let url = self.build_url(&request.model);
        let body = self.build_request(request);

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", credential.expose())
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(classify_transport_error)?;

        let status = response.status();

        if status.is_success() {
            let gemini_response: GeminiResponse = response
                .json()
                .await
                .map_err(|e| ProviderError::Unknown(format!("Failed to parse Gemini response: {}", e.without_url())))?;

            debug!("Gemini request completed successfully");
            self.convert_response(gemini_response, &request.config)
        } else {
            let error_text = response.text().await.unwrap_or_default();

            let error = match serde_json::from_str::<GeminiErrorResponse>(&error_text) {
                Ok(error_response) => ProviderError::classify(
                    status.as_u16(),
                    &error_response.error.status,
                    error_response.error.message,
                ),
                Err(_) => ProviderError::classify(status.as_u16(), "", format!("{} - {}", status, error_text)),
            };

            if error.is_rate_limited() {
                warn!("Gemini API quota exceeded for credential {}", credential);
            } else {
                error!("Gemini API request failed: {} - {}", status, error);
            }
            Err(error)
        }
    }
}
