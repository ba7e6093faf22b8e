//! Gateway rotation tests
//!
//! Drive the generation gateway with a scripted provider and check how it
//! walks the credential pool

use async_trait::async_trait;
use dorex_gateway::models::{GenerationRequest, GenerationResult, Part};
use dorex_gateway::providers::{Provider, ProviderError};
use dorex_gateway::services::{Credential, CredentialPool, GatewayError, GenerationGateway};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// How the scripted provider answers for a given key
#[derive(Clone)]
enum Reply {
    Text(&'static str),
    Quota,
    Fail(ProviderError),
}

/// Provider that answers per key and records every key it was called with
struct ScriptedProvider {
    replies: HashMap<String, Reply>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedProvider {
    fn new(replies: &[(&str, Reply)]) -> Arc<Self> {
        Arc::new(Self {
            replies: replies
                .iter()
                .map(|(key, reply)| (key.to_string(), reply.clone()))
                .collect(),
            calls: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn generate(
        &self,
        _request: &GenerationRequest,
        credential: &Credential,
    ) -> Result<GenerationResult, ProviderError> {
        self.calls.lock().unwrap().push(credential.expose().to_string());

        // Yield so concurrent requests interleave
        tokio::task::yield_now().await;

        match self.replies.get(credential.expose()) {
            Some(Reply::Text(text)) => Ok(GenerationResult::from_text(*text)),
            Some(Reply::Quota) => Err(ProviderError::RateLimited("quota exceeded".to_string())),
            Some(Reply::Fail(e)) => Err(e.clone()),
            None => Err(ProviderError::Unknown("unexpected key".to_string())),
        }
    }
}

fn gateway(provider: &Arc<ScriptedProvider>, keys: &[&str]) -> GenerationGateway {
    GenerationGateway::new(provider.clone(), CredentialPool::new(keys.iter().copied()))
}

fn request() -> GenerationRequest {
    GenerationRequest::new("gemini-2.0-flash", vec![Part::text("say hello")])
}

#[tokio::test]
async fn test_rotates_past_quota_failure() {
    let provider = ScriptedProvider::new(&[("keyA", Reply::Quota), ("keyB", Reply::Text("hello"))]);
    let gateway = gateway(&provider, &["keyA", "keyB"]);

    let outcome = gateway.execute(&request()).await;

    assert_eq!(outcome.result.unwrap().text.as_deref(), Some("hello"));
    assert_eq!(outcome.attempts, 2);
    assert_eq!(outcome.cursor, 1);
    assert_eq!(provider.calls(), vec!["keyA", "keyB"]);
}

#[tokio::test]
async fn test_last_key_succeeds_after_n_attempts() {
    let provider = ScriptedProvider::new(&[
        ("key-1", Reply::Quota),
        ("key-2", Reply::Quota),
        ("key-3", Reply::Quota),
        ("key-4", Reply::Text("done")),
    ]);
    let gateway = gateway(&provider, &["key-1", "key-2", "key-3", "key-4"]);

    let outcome = gateway.execute(&request()).await;

    assert!(outcome.result.is_ok());
    assert_eq!(outcome.attempts, 4);
    assert_eq!(outcome.cursor, 3);
}

#[tokio::test]
async fn test_all_keys_exhausted() {
    let provider = ScriptedProvider::new(&[
        ("key-1", Reply::Quota),
        ("key-2", Reply::Quota),
        ("key-3", Reply::Quota),
    ]);
    let gateway = gateway(&provider, &["key-1", "key-2", "key-3"]);

    let outcome = gateway.execute(&request()).await;

    assert_eq!(outcome.result.unwrap_err(), GatewayError::PoolExhausted);
    assert_eq!(outcome.attempts, 3);
    assert_eq!(outcome.cursor, 0);
    assert_eq!(provider.calls(), vec!["key-1", "key-2", "key-3"]);
}

#[tokio::test]
async fn test_empty_pool_makes_no_calls() {
    let provider = ScriptedProvider::new(&[]);
    let gateway = gateway(&provider, &[]);

    let outcome = gateway.execute(&request()).await;

    assert_eq!(outcome.result.unwrap_err(), GatewayError::NoCredential);
    assert_eq!(outcome.attempts, 0);
    assert!(provider.calls().is_empty());
    assert_eq!(
        GatewayError::NoCredential.to_string(),
        "No API key available"
    );
}

#[tokio::test]
async fn test_caller_key_quota_is_not_rotated() {
    let provider = ScriptedProvider::new(&[("keyA", Reply::Text("pooled")), ("userKey1", Reply::Quota)]);
    let gateway = gateway(&provider, &["keyA"]);

    let request = request().with_caller_credential(Some(Credential::caller("userKey1")));
    let outcome = gateway.execute(&request).await;

    let error = outcome.result.unwrap_err();
    assert_eq!(error, GatewayError::CallerQuotaExceeded);
    assert_eq!(error.to_string(), "Your provided API key has exceeded its quota");
    assert_eq!(outcome.attempts, 1);
    assert_eq!(provider.calls(), vec!["userKey1"]);
}

#[tokio::test]
async fn test_caller_key_used_even_with_empty_pool() {
    let provider = ScriptedProvider::new(&[("userKey1", Reply::Text("mine"))]);
    let gateway = gateway(&provider, &[]);

    let request = request().with_caller_credential(Some(Credential::caller("userKey1")));
    let result = gateway.generate(&request).await.unwrap();

    assert_eq!(result.text.as_deref(), Some("mine"));
    assert_eq!(provider.calls(), vec!["userKey1"]);
}

#[tokio::test]
async fn test_caller_key_non_quota_error_passes_through() {
    let original = ProviderError::InvalidInput("bad image".to_string());
    let provider = ScriptedProvider::new(&[("userKey1", Reply::Fail(original.clone()))]);
    let gateway = gateway(&provider, &["keyA", "keyB"]);

    let request = request().with_caller_credential(Some(Credential::caller("userKey1")));
    let outcome = gateway.execute(&request).await;

    assert_eq!(outcome.result.unwrap_err(), GatewayError::Provider(original));
    assert_eq!(outcome.attempts, 1);
}

#[tokio::test]
async fn test_non_quota_error_never_retries() {
    let failures = [
        ProviderError::InvalidInput("blocked".to_string()),
        ProviderError::ProviderUnavailable("503".to_string()),
        ProviderError::Unknown("odd".to_string()),
    ];

    for failure in failures {
        let provider = ScriptedProvider::new(&[
            ("keyA", Reply::Fail(failure.clone())),
            ("keyB", Reply::Text("unused")),
        ]);
        let gateway = gateway(&provider, &["keyA", "keyB"]);

        let outcome = gateway.execute(&request()).await;

        assert_eq!(outcome.result.unwrap_err(), GatewayError::Provider(failure));
        assert_eq!(outcome.attempts, 1);
        assert_eq!(provider.calls(), vec!["keyA"]);
    }
}

#[tokio::test]
async fn test_quota_then_non_quota_stops_rotation() {
    let provider = ScriptedProvider::new(&[
        ("keyA", Reply::Quota),
        ("keyB", Reply::Fail(ProviderError::ProviderUnavailable("down".to_string()))),
        ("keyC", Reply::Text("unused")),
    ]);
    let gateway = gateway(&provider, &["keyA", "keyB", "keyC"]);

    let outcome = gateway.execute(&request()).await;

    assert!(matches!(
        outcome.result,
        Err(GatewayError::Provider(ProviderError::ProviderUnavailable(_)))
    ));
    assert_eq!(outcome.attempts, 2);
    assert_eq!(outcome.cursor, 1);
}

#[tokio::test]
async fn test_sequential_requests_start_from_first_key() {
    let provider = ScriptedProvider::new(&[("keyA", Reply::Text("one")), ("keyB", Reply::Text("two"))]);
    let gateway = gateway(&provider, &["keyA", "keyB"]);

    let first = gateway.execute(&request()).await;
    let second = gateway.execute(&request()).await;

    assert_eq!(first.result.unwrap().text.as_deref(), Some("one"));
    assert_eq!(second.result.unwrap().text.as_deref(), Some("one"));
    assert_eq!((first.attempts, first.cursor), (1, 0));
    assert_eq!((second.attempts, second.cursor), (1, 0));
    assert_eq!(provider.calls(), vec!["keyA", "keyA"]);
}

#[tokio::test]
async fn test_rotation_after_exhaustion_does_not_leak() {
    let provider = ScriptedProvider::new(&[("keyA", Reply::Quota), ("keyB", Reply::Text("hello"))]);
    let gateway = gateway(&provider, &["keyA", "keyB"]);

    gateway.execute(&request()).await;
    let outcome = gateway.execute(&request()).await;

    // The second request tries keyA again instead of resuming at keyB
    assert_eq!(outcome.attempts, 2);
    assert_eq!(provider.calls(), vec!["keyA", "keyB", "keyA", "keyB"]);
}

#[tokio::test]
async fn test_concurrent_requests_rotate_independently() {
    let provider = ScriptedProvider::new(&[
        ("keyA", Reply::Quota),
        ("keyB", Reply::Quota),
        ("keyC", Reply::Text("hello")),
    ]);
    let gateway = gateway(&provider, &["keyA", "keyB", "keyC"]);

    let first_request = request();
    let second_request = request();
    let (first, second) = futures::join!(
        gateway.execute(&first_request),
        gateway.execute(&second_request)
    );

    for outcome in [first, second] {
        assert_eq!(outcome.result.unwrap().text.as_deref(), Some("hello"));
        assert_eq!(outcome.attempts, 3);
        assert_eq!(outcome.cursor, 2);
    }
    assert_eq!(provider.calls().len(), 6);
}
