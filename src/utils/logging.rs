//! Logging utilities
//!
//! Shared logging configuration and helper functions

use crate::config::settings::LoggingConfig;
use crate::models::{GenerationRequest, Part};

/// Set to true to include full prompt text in debug logs
/// Default is false to reduce log verbosity
pub const VERBOSE_REQUEST_LOGGING: bool = false;

/// Initialize the global tracing subscriber
pub fn init_logging(config: &LoggingConfig) {
    let subscriber: Box<dyn tracing::Subscriber + Send + Sync> = if config.format == "json" {
        // JSON format logs (production environment)
        Box::new(tracing_subscriber::fmt()
            .with_env_filter(config.level.as_str())
            .json()
            .with_current_span(false)
            .with_span_list(false)
            .finish())
    } else {
        // Human readable format (development environment)
        Box::new(tracing_subscriber::fmt()
            .with_env_filter(config.level.as_str())
            .with_target(false)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .finish())
    };

    if tracing::subscriber::set_global_default(subscriber).is_err() {
        eprintln!("Tracing subscriber already installed");
    }
}

/// Truncate a string with a note about original length
fn truncate_content(s: &str, max_len: usize) -> String {
    if s.chars().count() > max_len {
        let head: String = s.chars().take(max_len).collect();
        format!("{}... ({} chars truncated)", head, s.chars().count() - max_len)
    } else {
        s.to_string()
    }
}

/// Create a filtered version of a prompt part for logging
fn filter_part(part: &Part) -> serde_json::Value {
    match part {
        Part::Text { text } => {
            let text = if VERBOSE_REQUEST_LOGGING { text.clone() } else { truncate_content(text, 200) };
            serde_json::json!({"type": "text", "text": text})
        }
        Part::Media(media) => {
            let source = if media.is_inline() {
                format!("[inline, {} bytes]", media.url.len())
            } else {
                media.url.clone()
            };
            serde_json::json!({"type": "media", "content_type": media.content_type, "source": source})
        }
    }
}

/// Create a filtered summary of a generation request for logging
///
/// Media payloads are never logged and the caller credential is reduced to
/// a presence flag
pub fn create_request_log_summary(request: &GenerationRequest) -> serde_json::Value {
    let parts: Vec<serde_json::Value> = request.parts.iter().map(filter_part).collect();

    serde_json::json!({
        "model": request.model,
        "parts": parts,
        "modalities": request.config.response_modalities,
        "structured": request.config.response_schema.is_some(),
        "caller_key": request.caller_credential.is_some(),
    })
}
