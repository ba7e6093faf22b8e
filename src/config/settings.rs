//! Application configuration settings
//!
//! Defines all configuration structures and loading logic

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Upper bound on numbered `GEMINI_API_KEY_<n>` variables
const MAX_NUMBERED_KEYS: usize = 32;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Server configuration
    pub server: ServerConfig,
    /// Gemini API configuration
    pub gemini: GeminiConfig,
    /// Request configuration
    pub request: RequestConfig,
    /// Security configuration
    pub security: SecurityConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Listen host
    pub host: String,
    /// Listen port
    pub port: u16,
}

/// Gemini API configuration
#[derive(Clone, Serialize, Deserialize)]
pub struct GeminiConfig {
    /// Pooled API keys, in rotation order
    #[serde(skip_serializing)]
    pub api_keys: Vec<String>,
    /// API base URL
    pub base_url: String,
    /// Request timeout in seconds
    pub timeout: u64,
    /// Model used by text flows
    pub text_model: String,
    /// Model used by image flows
    pub image_model: String,
}

impl std::fmt::Debug for GeminiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiConfig")
            .field("api_keys", &format!("[{} keys]", self.api_keys.len()))
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("text_model", &self.text_model)
            .field("image_model", &self.image_model)
            .finish()
    }
}

/// Request configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestConfig {
    /// Maximum request size in bytes
    pub max_request_size: usize,
}

/// Security configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    /// Allowed origins for CORS
    pub allowed_origins: Vec<String>,
    /// Header carrying a caller-supplied Gemini key
    pub user_key_header: String,
    /// Whether CORS is enabled
    pub cors_enabled: bool,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    pub level: String,
    /// Log format (text/json)
    pub format: String,
}

impl Settings {
    /// Create a new configuration instance from the process environment
    pub fn new() -> Result<Self> {
        // Load .env file if it exists
        dotenv::dotenv().ok();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Create a configuration instance from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let settings = Self {
            server: ServerConfig {
                host: get("SERVER_HOST", "0.0.0.0"),
                port: get("SERVER_PORT", "8082")
                    .parse()
                    .context("Invalid port number")?,
            },
            gemini: GeminiConfig {
                api_keys: collect_api_keys(&lookup),
                base_url: get("GEMINI_BASE_URL", "https://generativelanguage.googleapis.com/v1beta"),
                timeout: get("GEMINI_TIMEOUT", "60")
                    .parse()
                    .context("Invalid timeout value")?,
                text_model: get("GEMINI_TEXT_MODEL", "gemini-2.0-flash"),
                image_model: get("GEMINI_IMAGE_MODEL", "gemini-2.0-flash-preview-image-generation"),
            },
            request: RequestConfig {
                max_request_size: get("MAX_REQUEST_SIZE", "20971520")
                    .parse()
                    .context("Invalid maximum request size")?,
            },
            security: SecurityConfig {
                allowed_origins: get("ALLOWED_ORIGINS", "*")
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect(),
                user_key_header: get("USER_KEY_HEADER", "X-Gemini-Api-Key"),
                cors_enabled: get("CORS_ENABLED", "true")
                    .parse()
                    .context("Invalid CORS enabled flag")?,
            },
            logging: LoggingConfig {
                level: get("RUST_LOG", "info"),
                format: get("LOG_FORMAT", "text"),
            },
        };

        // Validate configuration
        settings.validate()?;

        Ok(settings)
    }

    /// Validate configuration validity
    fn validate(&self) -> Result<()> {
        // Validate port range
        if self.server.port == 0 {
            anyhow::bail!("Port number cannot be 0");
        }

        for (i, key) in self.gemini.api_keys.iter().enumerate() {
            if key.contains(char::is_whitespace) {
                anyhow::bail!("Gemini API key #{} cannot contain whitespace characters", i);
            }
        }

        // Validate URL format
        if !self.gemini.base_url.starts_with("http") {
            anyhow::bail!("Invalid Gemini base URL format, should start with 'http'");
        }

        // Validate timeout values
        if self.gemini.timeout == 0 {
            anyhow::bail!("Timeout values cannot be 0");
        }

        if self.gemini.text_model.is_empty() || self.gemini.image_model.is_empty() {
            anyhow::bail!("Model names cannot be empty");
        }

        // Validate request size limit
        if self.request.max_request_size == 0 {
            anyhow::bail!("Maximum request size cannot be 0");
        }

        if self.security.user_key_header.is_empty() {
            anyhow::bail!("User key header name cannot be empty");
        }

        // Validate log level
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            anyhow::bail!("Invalid log level: {}", self.logging.level);
        }

        // Validate log format
        let valid_formats = ["text", "json"];
        if !valid_formats.contains(&self.logging.format.as_str()) {
            anyhow::bail!("Invalid log format: {}", self.logging.format);
        }

        Ok(())
    }
}

/// Collect pooled keys from `GEMINI_API_KEYS` (comma separated) followed by
/// `GEMINI_API_KEY`, `GEMINI_API_KEY_2`, `GEMINI_API_KEY_3`, ... up to the
/// first gap. Duplicates are dropped, keeping the first occurrence.
fn collect_api_keys<F>(lookup: &F) -> Vec<String>
where
    F: Fn(&str) -> Option<String>,
{
    let mut keys: Vec<String> = Vec::new();
    let mut push = |key: &str| {
        let key = key.trim();
        if !key.is_empty() && !keys.iter().any(|k| k == key) {
            keys.push(key.to_string());
        }
    };

    if let Some(list) = lookup("GEMINI_API_KEYS") {
        list.split(',').for_each(&mut push);
    }

    if let Some(first) = lookup("GEMINI_API_KEY") {
        push(&first);
    }

    for n in 2..=MAX_NUMBERED_KEYS {
        match lookup(&format!("GEMINI_API_KEY_{}", n)) {
            Some(key) => push(&key),
            None => break,
        }
    }

    keys
}
