//! Generation data models
//!
//! Provider-neutral request and result types passed between flows, the
//! gateway and providers

use crate::services::credential_pool::Credential;
use serde::{Deserialize, Serialize};

/// A single piece of prompt content
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Part {
    /// Plain text
    Text { text: String },
    /// Inline or remote media
    Media(MediaPart),
}

impl Part {
    /// Create a text part
    pub fn text(text: impl Into<String>) -> Self {
        Part::Text { text: text.into() }
    }

    /// Create a media part
    pub fn media(media: MediaPart) -> Self {
        Part::Media(media)
    }
}

/// Media reference, either a `data:` URL or a remote URI
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaPart {
    /// Media location
    pub url: String,
    /// MIME type (e.g. "image/png")
    #[serde(rename = "contentType")]
    pub content_type: String,
}

impl MediaPart {
    /// Create a media part from a URL and content type
    pub fn new(url: impl Into<String>, content_type: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            content_type: content_type.into(),
        }
    }

    /// Build a `data:` URL media part from a MIME type and base64 payload
    pub fn from_base64(content_type: &str, data: &str) -> Self {
        Self {
            url: format!("data:{};base64,{}", content_type, data),
            content_type: content_type.to_string(),
        }
    }

    /// Parse a `data:<mime>;base64,<payload>` URL
    pub fn from_data_url(url: &str) -> Result<Self, String> {
        let (content_type, _) = split_data_url(url)?;
        Ok(Self {
            url: url.to_string(),
            content_type: content_type.to_string(),
        })
    }

    /// Whether the media is carried inline as a `data:` URL
    pub fn is_inline(&self) -> bool {
        self.url.starts_with("data:")
    }

    /// Base64 payload of an inline media part
    pub fn inline_data(&self) -> Option<&str> {
        split_data_url(&self.url).ok().map(|(_, data)| data)
    }
}

/// Split a data URL into MIME type and base64 payload
fn split_data_url(url: &str) -> Result<(&str, &str), String> {
    let rest = url
        .strip_prefix("data:")
        .ok_or_else(|| "Expected a data URI".to_string())?;
    let (header, data) = rest
        .split_once(',')
        .ok_or_else(|| "Malformed data URI".to_string())?;
    let content_type = header
        .strip_suffix(";base64")
        .ok_or_else(|| "Data URI must be base64 encoded".to_string())?;

    if content_type.is_empty() || !content_type.contains('/') {
        return Err("Data URI is missing a MIME type".to_string());
    }
    if data.is_empty() {
        return Err("Data URI has no content".to_string());
    }

    Ok((content_type, data))
}

/// Output modality requested from the provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Modality {
    Text,
    Image,
}

/// Generation configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Requested output modalities (empty means provider default)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub response_modalities: Vec<Modality>,
    /// Response MIME type (e.g. "application/json")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_mime_type: Option<String>,
    /// Structured output schema
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_schema: Option<serde_json::Value>,
    /// Sampling temperature
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    /// System instruction
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<String>,
}

impl GenerationConfig {
    pub fn with_modalities(mut self, modalities: &[Modality]) -> Self {
        self.response_modalities = modalities.to_vec();
        self
    }

    /// Request JSON output conforming to `schema`
    pub fn with_schema(mut self, schema: serde_json::Value) -> Self {
        self.response_mime_type = Some("application/json".to_string());
        self.response_schema = Some(schema);
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_system_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.system_instruction = Some(instruction.into());
        self
    }

    /// Whether structured (JSON) output was requested
    pub fn expects_json(&self) -> bool {
        self.response_schema.is_some()
            || self.response_mime_type.as_deref() == Some("application/json")
    }
}

/// A generation request
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    /// Target model identifier
    pub model: String,
    /// Ordered prompt content
    pub parts: Vec<Part>,
    /// Generation configuration
    pub config: GenerationConfig,
    /// Caller-supplied credential; bypasses the pool when present
    pub caller_credential: Option<Credential>,
}

impl GenerationRequest {
    pub fn new(model: impl Into<String>, parts: Vec<Part>) -> Self {
        Self {
            model: model.into(),
            parts,
            config: GenerationConfig::default(),
            caller_credential: None,
        }
    }

    pub fn with_config(mut self, config: GenerationConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_caller_credential(mut self, credential: Option<Credential>) -> Self {
        self.caller_credential = credential;
        self
    }
}

/// A successful generation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationResult {
    /// Produced media
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media: Option<MediaPart>,
    /// Produced text
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Structured output
    #[serde(skip_serializing_if = "Option::is_none")]
    pub structured: Option<serde_json::Value>,
}

impl GenerationResult {
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Default::default()
        }
    }

    pub fn from_media(media: MediaPart) -> Self {
        Self {
            media: Some(media),
            ..Default::default()
        }
    }
}
