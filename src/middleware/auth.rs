//! Caller key extraction
//!
//! Reads an optional caller-supplied Gemini key from the configured header
//! and validates its format before it reaches the gateway

use crate::handlers::AppState;
use crate::services::credential_pool::{validate_key_format, Credential};
use crate::utils::error::AppError;
use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, HeaderMap},
};
use std::sync::Arc;
use tracing::{debug, warn};

/// Optional caller-supplied credential; `None` means "use the pool"
#[derive(Debug, Clone)]
pub struct CallerKey(pub Option<Credential>);

#[async_trait]
impl FromRequestParts<Arc<AppState>> for CallerKey {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &Arc<AppState>) -> Result<Self, Self::Rejection> {
        extract_caller_key(&parts.headers, &state.settings.security.user_key_header).map(CallerKey)
    }
}

/// Extract and validate the caller key from `header_name`
///
/// A missing or blank header yields `None`; a present but malformed key is
/// rejected.
pub fn extract_caller_key(headers: &HeaderMap, header_name: &str) -> Result<Option<Credential>, AppError> {
    let raw = match headers.get(header_name) {
        Some(value) => value
            .to_str()
            .map_err(|_| AppError::Authentication("API key header is not valid text".to_string()))?,
        None => return Ok(None),
    };

    // Remove Bearer prefix if present
    let token = raw.strip_prefix("Bearer ").unwrap_or(raw).trim();

    if token.is_empty() {
        return Ok(None);
    }

    if !validate_key_format(token) {
        warn!("Rejected malformed caller API key");
        return Err(AppError::Authentication("Invalid API key format".to_string()));
    }

    debug!("Using caller-supplied API key");
    Ok(Some(Credential::caller(token)))
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "X-Gemini-Api-Key";

    #[test]
    fn test_missing_header() {
        let headers = HeaderMap::new();
        assert!(extract_caller_key(&headers, HEADER).unwrap().is_none());
    }

    #[test]
    fn test_blank_header() {
        let mut headers = HeaderMap::new();
        headers.insert(HEADER, "   ".parse().unwrap());
        assert!(extract_caller_key(&headers, HEADER).unwrap().is_none());
    }

    #[test]
    fn test_valid_key_with_and_without_bearer() {
        let mut headers = HeaderMap::new();
        headers.insert(HEADER, "AIzaSyUserKey1234".parse().unwrap());
        let key = extract_caller_key(&headers, HEADER).unwrap().unwrap();
        assert_eq!(key.expose(), "AIzaSyUserKey1234");

        headers.insert(HEADER, "Bearer AIzaSyUserKey1234".parse().unwrap());
        let key = extract_caller_key(&headers, HEADER).unwrap().unwrap();
        assert_eq!(key.expose(), "AIzaSyUserKey1234");
    }

    #[test]
    fn test_malformed_key_rejected() {
        let mut headers = HeaderMap::new();
        headers.insert(HEADER, "short".parse().unwrap());
        assert!(matches!(
            extract_caller_key(&headers, HEADER),
            Err(AppError::Authentication(_))
        ));

        headers.insert(HEADER, "key with spaces inside".parse().unwrap());
        assert!(extract_caller_key(&headers, HEADER).is_err());
    }
}
