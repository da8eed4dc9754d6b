//! Shared HTTP client for the hosted model providers
//!
//! One `reqwest::Client` per backend, with a connect timeout, a per-request
//! timeout capped by a global maximum, and bounded retry on 5xx and network
//! failures.

use crate::types::LlmInvocation;
use archsmith_utils::error::LlmError;
use archsmith_utils::logging::redact_error_message;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use std::time::Duration;
use tracing::{debug, warn};

/// Upper bound on any single HTTP request (5 minutes)
const DEFAULT_MAX_HTTP_TIMEOUT: Duration = Duration::from_secs(300);

const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Retries after the first attempt, for 5xx and network failures only
const MAX_RETRIES: u32 = 2;

/// Backoff unit; attempt `n` sleeps `n * INITIAL_BACKOFF`
const INITIAL_BACKOFF: Duration = Duration::from_secs(1);

/// Sampling parameters sent with every hosted-provider request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct HttpParams {
    pub max_tokens: u32,
    pub temperature: f32,
}

impl Default for HttpParams {
    fn default() -> Self {
        Self {
            max_tokens: 8192,
            temperature: 0.3,
        }
    }
}

impl HttpParams {
    /// Model and parameters for one call; invocation hints override the defaults.
    pub fn resolve(&self, default_model: &str, inv: &LlmInvocation) -> (String, HttpParams) {
        let model = if inv.model.is_empty() {
            default_model.to_string()
        } else {
            inv.model.clone()
        };
        let params = HttpParams {
            max_tokens: inv.max_tokens_hint().unwrap_or(self.max_tokens),
            temperature: inv.temperature_hint().unwrap_or(self.temperature),
        };
        (model, params)
    }
}

#[derive(Clone)]
pub(crate) struct HttpClient {
    client: Client,
    max_timeout: Duration,
}

impl HttpClient {
    /// # Errors
    ///
    /// Returns `LlmError::Misconfiguration` if the client cannot be constructed
    pub fn new() -> Result<Self, LlmError> {
        Self::with_max_timeout(DEFAULT_MAX_HTTP_TIMEOUT)
    }

    /// # Errors
    ///
    /// Returns `LlmError::Misconfiguration` if the client cannot be constructed
    pub fn with_max_timeout(max_timeout: Duration) -> Result<Self, LlmError> {
        let client = Client::builder()
            .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(10)
            .build()
            .map_err(|e| {
                LlmError::Misconfiguration(format!("Failed to build HTTP client: {e}"))
            })?;

        Ok(Self {
            client,
            max_timeout,
        })
    }

    pub fn post(&self, url: &str) -> RequestBuilder {
        self.client.post(url)
    }

    /// Execute a request with the timeout and retry policy.
    ///
    /// The effective timeout is `min(request_timeout, max_timeout)`. 4xx responses
    /// are never retried.
    ///
    /// # Errors
    ///
    /// - `LlmError::ProviderAuth` for 401/403
    /// - `LlmError::ProviderQuota` for 429
    /// - `LlmError::ProviderOutage` for 5xx after retries
    /// - `LlmError::Timeout` when the request times out
    /// - `LlmError::Transport` for network errors after retries and other 4xx
    pub async fn execute_with_retry(
        &self,
        request_builder: RequestBuilder,
        request_timeout: Duration,
        provider_name: &str,
    ) -> Result<Response, LlmError> {
        let effective_timeout = request_timeout.min(self.max_timeout);
        let mut attempt = 0;

        loop {
            attempt += 1;

            let request = request_builder
                .try_clone()
                .ok_or_else(|| {
                    LlmError::Transport("Failed to clone request for retry".to_string())
                })?
                .timeout(effective_timeout)
                .build()
                .map_err(|e| LlmError::Transport(format!("Failed to build request: {e}")))?;

            debug!(
                provider = provider_name,
                attempt,
                timeout_secs = effective_timeout.as_secs(),
                "Executing HTTP request"
            );

            match self.client.execute(request).await {
                Ok(response) => {
                    let status = response.status();

                    if status.is_client_error() {
                        return Err(map_client_error(status, provider_name));
                    }

                    if status.is_server_error() {
                        if attempt <= MAX_RETRIES {
                            warn!(
                                provider = provider_name,
                                attempt,
                                status = status.as_u16(),
                                "Server error, will retry"
                            );
                            tokio::time::sleep(INITIAL_BACKOFF * attempt).await;
                            continue;
                        }
                        return Err(LlmError::ProviderOutage(format!(
                            "{provider_name} returned server error: {status}"
                        )));
                    }

                    return Ok(response);
                }
                Err(e) => {
                    if e.is_timeout() {
                        return Err(LlmError::Timeout {
                            duration: effective_timeout,
                        });
                    }

                    let redacted = redact_error_message(&e.to_string());
                    if attempt <= MAX_RETRIES {
                        warn!(
                            provider = provider_name,
                            attempt,
                            error = %redacted,
                            "Network error, will retry"
                        );
                        tokio::time::sleep(INITIAL_BACKOFF * attempt).await;
                        continue;
                    }

                    return Err(LlmError::Transport(format!(
                        "{provider_name} request failed: {redacted}"
                    )));
                }
            }
        }
    }
}

/// 401/403 → auth, 429 → quota, anything else in 4xx → transport.
fn map_client_error(status: StatusCode, provider_name: &str) -> LlmError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            LlmError::ProviderAuth(format!("{provider_name} authentication failed: {status}"))
        }
        StatusCode::TOO_MANY_REQUESTS => {
            LlmError::ProviderQuota(format!("{provider_name} rate limit exceeded: {status}"))
        }
        _ => LlmError::Transport(format!("{provider_name} returned client error: {status}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_params_prefers_invocation_hints() {
        let defaults = HttpParams::default();
        let inv = LlmInvocation::new("s", "chat", "", Duration::from_secs(1), vec![])
            .with_max_tokens(256);
        let (model, params) = defaults.resolve("gemini-2.5-flash", &inv);
        assert_eq!(model, "gemini-2.5-flash");
        assert_eq!(params.max_tokens, 256);
        assert!((params.temperature - defaults.temperature).abs() < f32::EPSILON);

        let inv = LlmInvocation::new("s", "chat", "other-model", Duration::from_secs(1), vec![]);
        assert_eq!(defaults.resolve("gemini-2.5-flash", &inv).0, "other-model");
    }

    #[test]
    fn test_client_builds_with_defaults() {
        let client = HttpClient::new().unwrap();
        assert_eq!(client.max_timeout, DEFAULT_MAX_HTTP_TIMEOUT);
    }

    #[test]
    fn test_map_client_error_auth() {
        for status in [StatusCode::UNAUTHORIZED, StatusCode::FORBIDDEN] {
            let err = map_client_error(status, "gemini");
            assert!(matches!(err, LlmError::ProviderAuth(_)), "{status}");
        }
    }

    #[test]
    fn test_map_client_error_quota() {
        let err = map_client_error(StatusCode::TOO_MANY_REQUESTS, "anthropic");
        match err {
            LlmError::ProviderQuota(msg) => assert!(msg.contains("anthropic")),
            other => panic!("expected quota error, got {other:?}"),
        }
    }

    #[test]
    fn test_map_client_error_other_4xx_is_transport() {
        let err = map_client_error(StatusCode::BAD_REQUEST, "gemini");
        assert!(matches!(err, LlmError::Transport(_)));
        assert!(!matches!(
            map_client_error(StatusCode::NOT_FOUND, "gemini"),
            LlmError::ProviderAuth(_)
        ));
    }
}
