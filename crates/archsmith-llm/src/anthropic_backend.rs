//! Anthropic Messages API backend

use crate::http_client::{HttpClient, HttpParams};
use crate::types::{LlmBackend, LlmInvocation, LlmResult, Message, Role};
use archsmith_config::Config;
use archsmith_utils::error::LlmError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

const DEFAULT_BASE_URL: &str = "https://api.anthropic.com/v1/messages";

const ANTHROPIC_VERSION: &str = "2023-06-01";

pub(crate) struct AnthropicBackend {
    client: HttpClient,
    base_url: String,
    api_key: String,
    default_model: String,
    default_params: HttpParams,
}

impl AnthropicBackend {
    /// # Errors
    ///
    /// Returns `LlmError::Misconfiguration` if the HTTP client cannot be built
    pub fn new(
        api_key: String,
        base_url: Option<String>,
        default_model: String,
        default_params: HttpParams,
    ) -> Result<Self, LlmError> {
        Ok(Self {
            client: HttpClient::new()?,
            base_url: base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            api_key,
            default_model,
            default_params,
        })
    }

    /// Build from `[llm.anthropic]`, reading the key from the configured env var.
    ///
    /// # Errors
    ///
    /// Returns `LlmError::Misconfiguration` when the API key variable is unset or empty
    pub fn from_config(config: &Config) -> Result<Self, LlmError> {
        let provider = &config.llm.anthropic;
        let api_key = std::env::var(&provider.api_key_env)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                LlmError::Misconfiguration(format!(
                    "Anthropic API key not found in environment variable '{}'. \
                     Set this variable or configure a different api_key_env in [llm.anthropic].",
                    provider.api_key_env
                ))
            })?;

        let default_params = HttpParams {
            max_tokens: config.generation.max_output_tokens,
            temperature: config.generation.temperature,
        };

        Self::new(
            api_key,
            provider.base_url.clone(),
            provider.model.clone(),
            default_params,
        )
    }

    /// System messages become the top-level `system` field, joined by blank lines.
    fn convert_messages(messages: &[Message]) -> (Option<String>, Vec<AnthropicMessage>) {
        let mut system_prompt: Option<String> = None;
        let mut converted = Vec::new();

        for msg in messages {
            match msg.role {
                Role::System => match system_prompt.as_mut() {
                    Some(existing) => {
                        existing.push_str("\n\n");
                        existing.push_str(&msg.content);
                    }
                    None => system_prompt = Some(msg.content.clone()),
                },
                Role::User => converted.push(AnthropicMessage {
                    role: "user",
                    content: msg.content.clone(),
                }),
                Role::Assistant => converted.push(AnthropicMessage {
                    role: "assistant",
                    content: msg.content.clone(),
                }),
            }
        }

        (system_prompt, converted)
    }

    fn extract_text(response: &AnthropicResponse) -> String {
        response
            .content
            .iter()
            .filter(|block| block.content_type == "text")
            .filter_map(|block| block.text.as_deref())
            .collect::<String>()
    }
}

#[async_trait]
impl LlmBackend for AnthropicBackend {
    async fn invoke(&self, inv: LlmInvocation) -> Result<LlmResult, LlmError> {
        let (model, params) = self.default_params.resolve(&self.default_model, &inv);

        debug!(
            provider = "anthropic",
            session_id = %inv.session_id,
            task = %inv.task,
            model = %model,
            max_tokens = params.max_tokens,
            timeout_secs = inv.timeout.as_secs(),
            "Invoking Anthropic backend"
        );

        let (system, messages) = Self::convert_messages(&inv.messages);
        let body = AnthropicRequest {
            model: model.clone(),
            messages,
            max_tokens: params.max_tokens,
            temperature: params.temperature,
            system,
        };

        let request = self
            .client
            .post(&self.base_url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&body);

        let response = self
            .client
            .execute_with_retry(request, inv.timeout, "anthropic")
            .await?;

        let response_body: AnthropicResponse = response.json().await.map_err(|e| {
            LlmError::Transport(format!("Failed to parse Anthropic response: {e}"))
        })?;

        let content = Self::extract_text(&response_body);
        if content.is_empty() {
            return Err(LlmError::Transport(
                "Anthropic response missing text content".to_string(),
            ));
        }

        let mut result = LlmResult::new(content, "anthropic", model);
        if let Some(usage) = response_body.usage {
            result = result.with_tokens(usage.input_tokens, usage.output_tokens);
        }

        debug!(
            provider = "anthropic",
            tokens_input = ?result.tokens_input,
            tokens_output = ?result.tokens_output,
            "Anthropic invocation completed"
        );

        Ok(result)
    }
}

#[derive(Debug, Clone, Serialize)]
struct AnthropicMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Clone, Serialize)]
struct AnthropicRequest {
    model: String,
    messages: Vec<AnthropicMessage>,
    max_tokens: u32,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct AnthropicResponse {
    content: Vec<ContentBlock>,
    usage: Option<Usage>,
}

#[derive(Debug, Clone, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    content_type: String,
    text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct Usage {
    input_tokens: u64,
    output_tokens: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_convert_messages_lifts_system_prompt() {
        let messages = vec![
            Message::system("You are an architect."),
            Message::system("Answer in Markdown."),
            Message::user("Design a booking system"),
            Message::assistant("## Executive Summary"),
        ];
        let (system, converted) = AnthropicBackend::convert_messages(&messages);
        assert_eq!(
            system.as_deref(),
            Some("You are an architect.\n\nAnswer in Markdown.")
        );
        assert_eq!(converted.len(), 2);
        assert_eq!(converted[0].role, "user");
        assert_eq!(converted[1].role, "assistant");
    }

    #[test]
    fn test_request_omits_absent_system_field() {
        let body = AnthropicRequest {
            model: "m".to_string(),
            messages: vec![],
            max_tokens: 10,
            temperature: 0.0,
            system: None,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert!(json.get("system").is_none());
        assert_eq!(json["max_tokens"], 10);
    }

    #[test]
    fn test_extract_text_skips_non_text_blocks() {
        let response: AnthropicResponse = serde_json::from_value(serde_json::json!({
            "content": [
                {"type": "text", "text": "## Trade-offs\n"},
                {"type": "tool_use", "id": "x"},
                {"type": "text", "text": "### Key Trade-offs"}
            ],
            "usage": {"input_tokens": 12, "output_tokens": 34}
        }))
        .unwrap();
        assert_eq!(
            AnthropicBackend::extract_text(&response),
            "## Trade-offs\n### Key Trade-offs"
        );
        assert_eq!(response.usage.unwrap().output_tokens, 34);
    }

    #[test]
    #[serial]
    fn test_from_config_requires_api_key() {
        let mut config = Config::default();
        config.llm.anthropic.api_key_env = "ARCHSMITH_TEST_MISSING_ANTHROPIC_KEY".to_string();
        // SAFETY: serialized test; no other thread reads this variable.
        unsafe { std::env::remove_var("ARCHSMITH_TEST_MISSING_ANTHROPIC_KEY") };
        let err = AnthropicBackend::from_config(&config).err().unwrap();
        assert!(matches!(err, LlmError::Misconfiguration(msg) if msg.contains("[llm.anthropic]")));
    }
}
